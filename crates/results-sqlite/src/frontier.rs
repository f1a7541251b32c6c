//! Frontier store: the durable, deduplicated set of known onion addresses.

use crate::{Db, ImportSummary, InsertOutcome};
use anyhow::Result;
use crawler_core::{is_valid_v3_onion, OnionAddress};
use rusqlite::{params, Connection};
use std::io::BufRead;

fn insert_validated(conn: &Connection, onion: &str) -> Result<InsertOutcome> {
    if !is_valid_v3_onion(onion) {
        tracing::warn!(onion, "skipping invalid or v2 onion");
        return Ok(InsertOutcome::Rejected);
    }
    let n = conn.execute("INSERT OR IGNORE INTO onions (onion) VALUES (?)", params![onion])?;
    if n > 0 {
        tracing::info!(onion, "stored onion");
        Ok(InsertOutcome::Stored)
    } else {
        tracing::info!(onion, "onion already in frontier, skipping");
        Ok(InsertOutcome::AlreadyExists)
    }
}

impl Db {
    /// Validate and insert one address. Re-inserting is a no-op.
    pub fn insert_onion(&self, onion: &str) -> Result<InsertOutcome> {
        insert_validated(&self.conn, onion)
    }

    /// Every stored address. Rows another tool wrote that do not parse as v3
    /// are logged and left out.
    pub fn all_onions(&self) -> Result<Vec<OnionAddress>> {
        let mut stmt = self.conn.prepare("SELECT onion FROM onions")?;
        let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            match OnionAddress::parse(&row?) {
                Ok(onion) => out.push(onion),
                Err(e) => tracing::warn!(error = %e, "ignoring frontier row"),
            }
        }
        Ok(out)
    }

    pub fn onion_count(&self) -> Result<i64> {
        Ok(self.conn.query_row("SELECT COUNT(1) FROM onions", [], |r| r.get(0))?)
    }

    pub fn contains_onion(&self, onion: &str) -> Result<bool> {
        let n: i64 = self.conn.query_row("SELECT COUNT(1) FROM onions WHERE onion=?", [onion], |r| r.get(0))?;
        Ok(n > 0)
    }

    /// Bulk-load a newline-delimited address list (blank lines and `#` comments
    /// ignored) in one transaction, with the same checks as [`Db::insert_onion`].
    pub fn import_onions<R: BufRead>(&mut self, reader: R) -> Result<ImportSummary> {
        let tx = self.conn.transaction()?;
        let mut summary = ImportSummary::default();
        for line in reader.lines() {
            let line = line?;
            let onion = line.trim();
            if onion.is_empty() || onion.starts_with('#') { continue; }
            match insert_validated(&tx, onion)? {
                InsertOutcome::Stored => summary.stored += 1,
                InsertOutcome::AlreadyExists => summary.duplicates += 1,
                InsertOutcome::Rejected => summary.rejected += 1,
            }
        }
        tx.commit()?;
        Ok(summary)
    }
}
