use crate::schema::RESULT_COLUMNS;
use crate::{Db, RunMeta, RunTotals, ScanRecord};
use anyhow::Result;
use rusqlite::params;
use uuid::Uuid;

impl Db {
    /// Write the row for `rec.hidden_service`, replacing any earlier scan wholesale.
    pub fn upsert_result(&self, rec: &ScanRecord) -> Result<()> {
        let placeholders = vec!["?"; RESULT_COLUMNS.len()].join(",");
        let sql = format!("INSERT OR REPLACE INTO combinedResults ({}) VALUES ({})", RESULT_COLUMNS.join(","), placeholders);
        self.conn.execute(
            &sql,
            params![
                rec.hidden_service, rec.date_scanned, rec.online, rec.performed_scans,
                rec.web_detected, rec.tls_detected, rec.ssh_detected, rec.ricochet_detected, rec.irc_detected, rec.ftp_detected,
                rec.smtp_detected, rec.bitcoin_detected, rec.mongodb_detected, rec.vnc_detected, rec.xmpp_detected, rec.skynet_detected,
                rec.crawls, rec.pgp_keys, rec.certificates, rec.bitcoin_services,
                rec.ssh_key, rec.ssh_banner, rec.ftp_fingerprint, rec.ftp_banner, rec.smtp_fingerprint, rec.smtp_banner,
                rec.last_action, rec.timed_out, rec.error,
                rec.private_key_detected, rec.found_apache_mod_status, rec.found_apache_mod_info, rec.server_version,
                rec.related_onion_services, rec.related_onion_domains, rec.ip_addresses, rec.email_addresses, rec.analytics_ids,
                rec.bitcoin_addresses, rec.linked_onions, rec.open_directories, rec.exif_images, rec.risks,
            ],
        )?;
        Ok(())
    }

    pub fn begin_run(&self, meta: &RunMeta) -> Result<Uuid> {
        self.conn.execute(
            "INSERT INTO runs(run_id, started_at, tool_version, frontier_size) VALUES (?,?,?,?)",
            params![meta.run_id.to_string(), meta.started_at, meta.tool_version, meta.frontier_size],
        )?;
        Ok(meta.run_id)
    }

    pub fn finish_run(&self, run_id: &Uuid, finished_at: i64, totals: &RunTotals) -> Result<()> {
        self.conn.execute(
            "UPDATE runs SET finished_at=?, completed=?, skipped=?, timeouts=?, empty_outputs=? WHERE run_id=?",
            params![finished_at, totals.completed, totals.skipped, totals.timeouts, totals.empty_outputs, run_id.to_string()],
        )?;
        Ok(())
    }
}
