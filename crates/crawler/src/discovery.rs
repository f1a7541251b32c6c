//! Feeds onion addresses found inside a report back into the frontier.

use crawler_core::{ScanReport, ONION_SUFFIX};
use results_sqlite::{Db, InsertOutcome};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoverySummary {
    pub candidates: usize,
    pub stored: usize,
    pub existing: usize,
    pub rejected: usize,
    pub failed: usize,
}

/// Linked onions, related domains and related services that end in `.onion`.
/// Everything else (clearnet hosts, junk) is dropped.
pub fn candidates(report: &ScanReport) -> impl Iterator<Item = &str> {
    let id = &report.identifier_report;
    id.linked_onions
        .iter()
        .chain(&id.related_onion_domains)
        .chain(&id.related_onion_services)
        .map(String::as_str)
        .filter(|s| s.ends_with(ONION_SUFFIX))
}

/// Insert every candidate into the frontier. Storage errors are logged and
/// counted, never propagated: a lost discovery must not sink the scan.
pub fn feed(frontier: &Db, report: &ScanReport) -> DiscoverySummary {
    let mut s = DiscoverySummary::default();
    for onion in candidates(report) {
        s.candidates += 1;
        tracing::info!(onion, "discovered .onion");
        match frontier.insert_onion(onion) {
            Ok(InsertOutcome::Stored) => s.stored += 1,
            Ok(InsertOutcome::AlreadyExists) => s.existing += 1,
            Ok(InsertOutcome::Rejected) => s.rejected += 1,
            Err(e) => {
                tracing::error!(onion, error = %e, "failed to store discovered onion");
                s.failed += 1;
            }
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawler_core::OnionAddress;
    use results_sqlite::Store;

    const A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa.onion";
    const B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb.onion";
    const C: &str = "cccccccccccccccccccccccccccccccccccccccccccccccccccccccc.onion";

    fn report(json: &str) -> ScanReport {
        ScanReport::from_slice(json.as_bytes()).unwrap()
    }

    #[test]
    fn only_onion_suffixed_linked_addresses_are_inserted() {
        let db = Db::open_in_memory(Store::Frontier).unwrap();
        let r = report(&format!(r#"{{"identifierReport": {{"linkedOnions": ["{A}", "example.com"]}}}}"#));
        let s = feed(&db, &r);
        assert_eq!(s.candidates, 1);
        assert_eq!(s.stored, 1);
        assert_eq!(db.all_onions().unwrap(), vec![OnionAddress::parse(A).unwrap()]);
    }

    #[test]
    fn all_three_lists_are_scanned() {
        let r = report(&format!(
            r#"{{"identifierReport": {{
                "linkedOnions": ["{A}"],
                "relatedOnionDomains": ["{B}", "cdn.example.org"],
                "relatedOnionServices": ["{C}"]}}}}"#
        ));
        assert_eq!(candidates(&r).collect::<Vec<_>>(), vec![A, B, C]);
    }

    #[test]
    fn v2_and_duplicates_are_counted_not_stored() {
        let db = Db::open_in_memory(Store::Frontier).unwrap();
        db.insert_onion(A).unwrap();
        let r = report(&format!(r#"{{"identifierReport": {{"linkedOnions": ["{A}", "expyuzz4wqqyqhjn.onion"]}}}}"#));
        let s = feed(&db, &r);
        assert_eq!(s, DiscoverySummary { candidates: 2, stored: 0, existing: 1, rejected: 1, failed: 0 });
        assert_eq!(db.onion_count().unwrap(), 1);
    }

    #[test]
    fn missing_identifier_report_discovers_nothing() {
        assert_eq!(candidates(&report("{}")).count(), 0);
    }
}
