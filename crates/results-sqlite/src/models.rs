use crawler_core::ScanReport;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertOutcome {
    Stored,
    AlreadyExists,
    Rejected,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub stored: usize,
    pub duplicates: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub run_id: Uuid,
    pub started_at: i64,
    pub tool_version: String,
    pub frontier_size: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    pub completed: i64,
    pub skipped: i64,
    pub timeouts: i64,
    pub empty_outputs: i64,
}

/// A row of the `runs` ledger. `finished_at` is unset for a run that never
/// got to record its totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunRecord {
    pub run_id: String,
    pub started_at: i64,
    pub finished_at: Option<i64>,
    pub tool_version: String,
    pub frontier_size: i64,
    #[serde(flatten)]
    pub totals: RunTotals,
}

/// One row of `combinedResults`: a flattened [`ScanReport`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub hidden_service: String,
    pub date_scanned: String,
    pub online: bool,
    pub performed_scans: String,
    pub web_detected: bool,
    pub tls_detected: bool,
    pub ssh_detected: bool,
    pub ricochet_detected: bool,
    pub irc_detected: bool,
    pub ftp_detected: bool,
    pub smtp_detected: bool,
    pub bitcoin_detected: bool,
    pub mongodb_detected: bool,
    pub vnc_detected: bool,
    pub xmpp_detected: bool,
    pub skynet_detected: bool,
    pub crawls: String,
    pub pgp_keys: String,
    pub certificates: String,
    pub bitcoin_services: String,
    pub ssh_key: String,
    pub ssh_banner: String,
    pub ftp_fingerprint: String,
    pub ftp_banner: String,
    pub smtp_fingerprint: String,
    pub smtp_banner: String,
    pub last_action: String,
    pub timed_out: bool,
    pub error: String,
    pub private_key_detected: bool,
    pub found_apache_mod_status: bool,
    pub found_apache_mod_info: bool,
    pub server_version: String,
    pub related_onion_services: String,
    pub related_onion_domains: String,
    pub ip_addresses: String,
    pub email_addresses: String,
    #[serde(rename = "analyticsIDs")]
    pub analytics_ids: String,
    pub bitcoin_addresses: String,
    pub linked_onions: String,
    pub open_directories: String,
    pub exif_images: String,
    pub risks: String,
}

// List and map columns hold JSON text. Keys and certificates are stored compact,
// everything else indented.
fn pretty<T: Serialize>(v: &T) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| "[]".to_string())
}

fn compact(v: &[Value]) -> String {
    serde_json::to_string(v).unwrap_or_else(|_| "[]".to_string())
}

impl ScanRecord {
    pub fn from_report(address: &str, r: &ScanReport) -> Self {
        let id = &r.identifier_report;
        ScanRecord {
            hidden_service: address.to_string(),
            date_scanned: r.date_scanned.clone(),
            online: r.online,
            performed_scans: pretty(&r.performed_scans),
            web_detected: r.web_detected,
            tls_detected: r.tls_detected,
            ssh_detected: r.ssh_detected,
            ricochet_detected: r.ricochet_detected,
            irc_detected: r.irc_detected,
            ftp_detected: r.ftp_detected,
            smtp_detected: r.smtp_detected,
            bitcoin_detected: r.bitcoin_detected,
            mongodb_detected: r.mongodb_detected,
            vnc_detected: r.vnc_detected,
            xmpp_detected: r.xmpp_detected,
            skynet_detected: r.skynet_detected,
            crawls: pretty(&r.crawls),
            pgp_keys: compact(&r.pgp_keys),
            certificates: compact(&r.certificates),
            bitcoin_services: pretty(&r.bitcoin_services),
            ssh_key: r.ssh_key.clone(),
            ssh_banner: r.ssh_banner.clone(),
            ftp_fingerprint: r.ftp_fingerprint.clone(),
            ftp_banner: r.ftp_banner.clone(),
            smtp_fingerprint: r.smtp_fingerprint.clone(),
            smtp_banner: r.smtp_banner.clone(),
            last_action: r.last_action.clone(),
            timed_out: r.timed_out,
            error: r.error_text(),
            private_key_detected: id.private_key_detected,
            found_apache_mod_status: id.found_apache_mod_status,
            found_apache_mod_info: id.found_apache_mod_info,
            server_version: id.server_version.clone(),
            related_onion_services: pretty(&id.related_onion_services),
            related_onion_domains: pretty(&id.related_onion_domains),
            ip_addresses: pretty(&id.ip_addresses),
            email_addresses: pretty(&id.email_addresses),
            analytics_ids: pretty(&id.analytics_ids),
            bitcoin_addresses: pretty(&id.bitcoin_addresses),
            linked_onions: pretty(&id.linked_onions),
            open_directories: pretty(&id.open_directories),
            exif_images: pretty(&id.exif_images),
            risks: pretty(&r.simple_report.risks),
        }
    }
}
