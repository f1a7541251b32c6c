//! Typed view of the JSON report emitted by the probe tool.
//!
//! The tool marshals empty lists and maps as `null`, so every field goes
//! through [`nullable`] and a `null` lands on the same default as a missing key.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

fn nullable<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanReport {
    #[serde(deserialize_with = "nullable")]
    pub date_scanned: String,
    #[serde(deserialize_with = "nullable")]
    pub online: bool,
    #[serde(deserialize_with = "nullable")]
    pub performed_scans: Vec<String>,

    #[serde(deserialize_with = "nullable")]
    pub web_detected: bool,
    #[serde(deserialize_with = "nullable")]
    pub tls_detected: bool,
    #[serde(deserialize_with = "nullable")]
    pub ssh_detected: bool,
    #[serde(deserialize_with = "nullable")]
    pub ricochet_detected: bool,
    #[serde(deserialize_with = "nullable")]
    pub irc_detected: bool,
    #[serde(deserialize_with = "nullable")]
    pub ftp_detected: bool,
    #[serde(deserialize_with = "nullable")]
    pub smtp_detected: bool,
    #[serde(deserialize_with = "nullable")]
    pub bitcoin_detected: bool,
    #[serde(deserialize_with = "nullable")]
    pub mongodb_detected: bool,
    #[serde(deserialize_with = "nullable")]
    pub vnc_detected: bool,
    #[serde(deserialize_with = "nullable")]
    pub xmpp_detected: bool,
    #[serde(deserialize_with = "nullable")]
    pub skynet_detected: bool,

    #[serde(deserialize_with = "nullable")]
    pub crawls: Map<String, Value>,
    #[serde(deserialize_with = "nullable")]
    pub pgp_keys: Vec<Value>,
    #[serde(deserialize_with = "nullable")]
    pub certificates: Vec<Value>,
    #[serde(deserialize_with = "nullable")]
    pub bitcoin_services: Map<String, Value>,

    #[serde(deserialize_with = "nullable")]
    pub ssh_key: String,
    #[serde(deserialize_with = "nullable")]
    pub ssh_banner: String,
    #[serde(deserialize_with = "nullable")]
    pub ftp_fingerprint: String,
    #[serde(deserialize_with = "nullable")]
    pub ftp_banner: String,
    #[serde(deserialize_with = "nullable")]
    pub smtp_fingerprint: String,
    #[serde(deserialize_with = "nullable")]
    pub smtp_banner: String,

    #[serde(deserialize_with = "nullable")]
    pub last_action: String,
    #[serde(deserialize_with = "nullable")]
    pub timed_out: bool,
    /// Free-form: a string, `null`, or whatever structure the tool chose.
    pub error: Value,

    #[serde(deserialize_with = "nullable")]
    pub identifier_report: IdentifierReport,
    #[serde(deserialize_with = "nullable")]
    pub simple_report: SimpleReport,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentifierReport {
    #[serde(deserialize_with = "nullable")]
    pub private_key_detected: bool,
    #[serde(deserialize_with = "nullable")]
    pub found_apache_mod_status: bool,
    #[serde(deserialize_with = "nullable")]
    pub found_apache_mod_info: bool,
    #[serde(deserialize_with = "nullable")]
    pub server_version: String,
    #[serde(deserialize_with = "nullable")]
    pub related_onion_services: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub related_onion_domains: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub ip_addresses: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub email_addresses: Vec<String>,
    #[serde(rename = "analyticsIDs", deserialize_with = "nullable")]
    pub analytics_ids: Vec<Value>,
    #[serde(deserialize_with = "nullable")]
    pub bitcoin_addresses: Vec<Value>,
    #[serde(deserialize_with = "nullable")]
    pub linked_onions: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub open_directories: Vec<Value>,
    #[serde(deserialize_with = "nullable")]
    pub exif_images: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimpleReport {
    #[serde(deserialize_with = "nullable")]
    pub risks: Vec<Value>,
}

impl ScanReport {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Text form of the `error` field: the string itself, empty for `null`,
    /// compact JSON for anything else.
    pub fn error_text(&self) -> String {
        match &self.error {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_default() {
        let r = ScanReport::from_slice(br#"{"online": true}"#).unwrap();
        assert!(r.online);
        assert!(!r.web_detected);
        assert!(r.identifier_report.linked_onions.is_empty());
        assert!(r.simple_report.risks.is_empty());
        assert_eq!(r.error_text(), "");
    }

    #[test]
    fn nulls_are_defaults() {
        let r = ScanReport::from_slice(
            br#"{"performedScans": null, "crawls": null, "sshKey": null,
                 "identifierReport": {"linkedOnions": null, "serverVersion": null},
                 "simpleReport": null, "error": null}"#,
        )
        .unwrap();
        assert!(r.performed_scans.is_empty());
        assert!(r.crawls.is_empty());
        assert_eq!(r.ssh_key, "");
        assert!(r.identifier_report.linked_onions.is_empty());
        assert_eq!(r.identifier_report.server_version, "");
    }

    #[test]
    fn nested_fields_and_error_text() {
        let r = ScanReport::from_slice(
            br#"{"dateScanned": "2024-01-01T00:00:00Z", "webDetected": true,
                 "identifierReport": {"analyticsIDs": [{"id": "UA-1"}], "linkedOnions": ["x.onion"]},
                 "simpleReport": {"risks": [{"severity": 2}]},
                 "error": {"Op": "dial"}, "unknownField": 7}"#,
        )
        .unwrap();
        assert_eq!(r.date_scanned, "2024-01-01T00:00:00Z");
        assert!(r.web_detected);
        assert_eq!(r.identifier_report.analytics_ids.len(), 1);
        assert_eq!(r.identifier_report.linked_onions, vec!["x.onion".to_string()]);
        assert_eq!(r.simple_report.risks.len(), 1);
        assert_eq!(r.error_text(), r#"{"Op":"dial"}"#);
    }

    #[test]
    fn not_a_report() {
        assert!(ScanReport::from_slice(b"scan failed").is_err());
    }
}
