use crate::schema::{MIG_FRONTIER_INIT, MIG_RESULTS_INIT};
use anyhow::Result;
use rusqlite::Connection;

/// Which of the two databases a connection holds. Each gets only its own tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Store {
    /// `onions`: the set of known addresses.
    Frontier,
    /// `combinedResults` plus the `runs` ledger.
    Results,
}

impl Store {
    fn tables(self) -> &'static [&'static str] {
        match self {
            Store::Frontier => &["onions"],
            Store::Results => &["combinedResults", "runs"],
        }
    }

    fn migration(self) -> &'static str {
        match self {
            Store::Frontier => MIG_FRONTIER_INIT,
            Store::Results => MIG_RESULTS_INIT,
        }
    }
}

pub struct Db {
    pub conn: Connection,
}

impl Db {
    pub fn open_or_create(path: impl AsRef<std::path::Path>, store: Store) -> Result<Self> {
        let conn = Connection::open(path)?;
        apply_pragmas(&conn)?;
        migrate(&conn, store)?;
        Ok(Db { conn })
    }

    pub fn open_in_memory(store: Store) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrate(&conn, store)?;
        Ok(Db { conn })
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e)?;
        Ok(())
    }
}

fn apply_pragmas(conn: &Connection) -> Result<()> {
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |r| r.get::<_, String>(0))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "busy_timeout", 5000i64)?;
    Ok(())
}

fn migrate(conn: &Connection, store: Store) -> Result<()> {
    // tables are created IF NOT EXISTS, so databases written by older
    // single-table tools pick up whatever they are missing
    let mut present = 0;
    for table in store.tables() {
        let n: i64 = conn.query_row(
            "SELECT COUNT(1) FROM sqlite_master WHERE type='table' AND name=?",
            [*table],
            |r| r.get(0),
        )?;
        present += n as usize;
    }
    if present < store.tables().len() {
        tracing::debug!(?store, "applying schema");
        conn.execute_batch(store.migration())?;
    }
    Ok(())
}
