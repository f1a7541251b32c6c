use crate::schema::RESULT_COLUMNS;
use crate::{Db, RunRecord, RunTotals, ScanRecord};
use anyhow::Result;
use rusqlite::{OptionalExtension, Row};
use uuid::Uuid;

fn record_from_row(r: &Row) -> rusqlite::Result<ScanRecord> {
    // NULLs only appear in rows written by other tools; read them as empty
    let s = |i: usize| -> rusqlite::Result<String> { Ok(r.get::<_, Option<String>>(i)?.unwrap_or_default()) };
    let b = |i: usize| -> rusqlite::Result<bool> { Ok(r.get::<_, Option<i64>>(i)?.unwrap_or(0) != 0) };
    Ok(ScanRecord {
        hidden_service: s(0)?,
        date_scanned: s(1)?,
        online: b(2)?,
        performed_scans: s(3)?,
        web_detected: b(4)?,
        tls_detected: b(5)?,
        ssh_detected: b(6)?,
        ricochet_detected: b(7)?,
        irc_detected: b(8)?,
        ftp_detected: b(9)?,
        smtp_detected: b(10)?,
        bitcoin_detected: b(11)?,
        mongodb_detected: b(12)?,
        vnc_detected: b(13)?,
        xmpp_detected: b(14)?,
        skynet_detected: b(15)?,
        crawls: s(16)?,
        pgp_keys: s(17)?,
        certificates: s(18)?,
        bitcoin_services: s(19)?,
        ssh_key: s(20)?,
        ssh_banner: s(21)?,
        ftp_fingerprint: s(22)?,
        ftp_banner: s(23)?,
        smtp_fingerprint: s(24)?,
        smtp_banner: s(25)?,
        last_action: s(26)?,
        timed_out: b(27)?,
        error: s(28)?,
        private_key_detected: b(29)?,
        found_apache_mod_status: b(30)?,
        found_apache_mod_info: b(31)?,
        server_version: s(32)?,
        related_onion_services: s(33)?,
        related_onion_domains: s(34)?,
        ip_addresses: s(35)?,
        email_addresses: s(36)?,
        analytics_ids: s(37)?,
        bitcoin_addresses: s(38)?,
        linked_onions: s(39)?,
        open_directories: s(40)?,
        exif_images: s(41)?,
        risks: s(42)?,
    })
}

fn select_results() -> String {
    format!("SELECT {} FROM combinedResults", RESULT_COLUMNS.join(","))
}

impl Db {
    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let cnt: i64 = self.conn.query_row(
            "SELECT COUNT(1) FROM sqlite_master WHERE type='table' AND name=?",
            [name],
            |r| r.get(0),
        )?;
        Ok(cnt > 0)
    }

    pub fn has_result(&self, onion: &str) -> Result<bool> {
        let cnt: i64 = self.conn.query_row(
            "SELECT COUNT(1) FROM combinedResults WHERE hiddenService=?",
            [onion],
            |r| r.get(0),
        )?;
        Ok(cnt > 0)
    }

    pub fn get_result(&self, onion: &str) -> Result<Option<ScanRecord>> {
        let sql = format!("{} WHERE hiddenService=?", select_results());
        Ok(self.conn.query_row(&sql, [onion], record_from_row).optional()?)
    }

    pub fn all_results(&self) -> Result<Vec<ScanRecord>> {
        let sql = format!("{} ORDER BY hiddenService", select_results());
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], record_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn result_count(&self) -> Result<i64> {
        Ok(self.conn.query_row("SELECT COUNT(1) FROM combinedResults", [], |r| r.get(0))?)
    }

    /// Totals recorded for a run; `None` if the run id is unknown.
    pub fn run_totals(&self, run_id: &Uuid) -> Result<Option<RunTotals>> {
        Ok(self
            .conn
            .query_row(
                "SELECT completed, skipped, timeouts, empty_outputs FROM runs WHERE run_id=?",
                [run_id.to_string()],
                |r| Ok(RunTotals { completed: r.get(0)?, skipped: r.get(1)?, timeouts: r.get(2)?, empty_outputs: r.get(3)? }),
            )
            .optional()?)
    }

    /// Every ledger row, oldest first (run ids are time-ordered).
    pub fn runs(&self) -> Result<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, started_at, finished_at, tool_version, frontier_size, \
             completed, skipped, timeouts, empty_outputs FROM runs ORDER BY run_id",
        )?;
        let rows = stmt.query_map([], |r| {
            Ok(RunRecord {
                run_id: r.get(0)?,
                started_at: r.get(1)?,
                finished_at: r.get(2)?,
                tool_version: r.get(3)?,
                frontier_size: r.get(4)?,
                totals: RunTotals { completed: r.get(5)?, skipped: r.get(6)?, timeouts: r.get(7)?, empty_outputs: r.get(8)? },
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Db, RunMeta, RunTotals, ScanRecord, Store};
    use crawler_core::ScanReport;
    use uuid::Uuid;

    const ONION: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa.onion";

    #[test]
    fn each_store_gets_only_its_own_tables() {
        let results = Db::open_in_memory(Store::Results).unwrap();
        assert!(results.table_exists("combinedResults").unwrap());
        assert!(results.table_exists("runs").unwrap());
        assert!(!results.table_exists("onions").unwrap());

        let frontier = Db::open_in_memory(Store::Frontier).unwrap();
        assert!(frontier.table_exists("onions").unwrap());
        assert!(!frontier.table_exists("combinedResults").unwrap());
        assert!(!frontier.table_exists("runs").unwrap());
    }

    #[test]
    fn reopening_a_file_keeps_the_schema_split() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("onion_list.db");
        Db::open_or_create(&path, Store::Frontier).unwrap().close().unwrap();
        let db = Db::open_or_create(&path, Store::Frontier).unwrap();
        assert!(db.table_exists("onions").unwrap());
        assert!(!db.table_exists("combinedResults").unwrap());
    }

    #[test]
    fn upsert_then_read_back() {
        let db = Db::open_in_memory(Store::Results).unwrap();
        assert!(!db.has_result(ONION).unwrap());
        let report = ScanReport::from_slice(br#"{"online": true, "sshDetected": true, "sshBanner": "SSH-2.0-OpenSSH"}"#).unwrap();
        let rec = ScanRecord::from_report(ONION, &report);
        db.upsert_result(&rec).unwrap();
        assert!(db.has_result(ONION).unwrap());
        assert_eq!(db.get_result(ONION).unwrap(), Some(rec));
    }

    #[test]
    fn upsert_replaces_without_merging() {
        let db = Db::open_in_memory(Store::Results).unwrap();
        let first = ScanReport::from_slice(
            br#"{"online": true, "webDetected": true, "serverVersion": "x",
                 "identifierReport": {"serverVersion": "nginx", "linkedOnions": ["a.onion"]}}"#,
        )
        .unwrap();
        let second = ScanReport::from_slice(br#"{"online": false, "ftpDetected": true}"#).unwrap();
        db.upsert_result(&ScanRecord::from_report(ONION, &first)).unwrap();
        db.upsert_result(&ScanRecord::from_report(ONION, &second)).unwrap();

        let stored = db.get_result(ONION).unwrap().unwrap();
        assert_eq!(stored, ScanRecord::from_report(ONION, &second));
        assert!(!stored.web_detected);
        assert_eq!(stored.server_version, "");
        assert_eq!(db.result_count().unwrap(), 1);
    }

    #[test]
    fn run_ledger_records_totals() {
        let db = Db::open_in_memory(Store::Results).unwrap();
        let meta = RunMeta { run_id: Uuid::now_v7(), started_at: 1, tool_version: "0.1.0".into(), frontier_size: 4 };
        let id = db.begin_run(&meta).unwrap();
        assert_eq!(db.run_totals(&id).unwrap(), Some(RunTotals::default()));
        let totals = RunTotals { completed: 3, skipped: 1, timeouts: 2, empty_outputs: 0 };
        db.finish_run(&id, 2, &totals).unwrap();
        assert_eq!(db.run_totals(&id).unwrap(), Some(totals));
        assert_eq!(db.run_totals(&Uuid::now_v7()).unwrap(), None);

        let runs = db.runs().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].run_id, id.to_string());
        assert_eq!(runs[0].finished_at, Some(2));
        assert_eq!(runs[0].totals, totals);
    }

    #[test]
    fn unfinished_run_has_no_end_time() {
        let db = Db::open_in_memory(Store::Results).unwrap();
        let meta = RunMeta { run_id: Uuid::now_v7(), started_at: 7, tool_version: "0.1.0".into(), frontier_size: 1 };
        db.begin_run(&meta).unwrap();
        let runs = db.runs().unwrap();
        assert_eq!(runs[0].finished_at, None);
        assert_eq!(runs[0].frontier_size, 1);
    }
}
