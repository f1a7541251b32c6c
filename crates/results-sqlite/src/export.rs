use crate::Db;
use anyhow::Result;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Jsonl,
}

impl Db {
    /// Write every scan record to `out`. Returns the number of rows written.
    pub fn export_results<W: Write>(&self, out: W, format: ExportFormat) -> Result<usize> {
        let records = self.all_results()?;
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(out);
                for r in &records {
                    wtr.serialize(r)?;
                }
                wtr.flush()?;
            }
            ExportFormat::Jsonl => {
                let mut w = std::io::BufWriter::new(out);
                for r in &records {
                    serde_json::to_writer(&mut w, r)?;
                    w.write_all(b"\n")?;
                }
                w.flush()?;
            }
        }
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ScanRecord, Store};
    use crawler_core::ScanReport;

    fn seeded() -> Db {
        let db = Db::open_in_memory(Store::Results).unwrap();
        for c in ['b', 'a'] {
            let onion = format!("{}.onion", c.to_string().repeat(56));
            let report = ScanReport::from_slice(br#"{"online": true, "webDetected": true}"#).unwrap();
            db.upsert_result(&ScanRecord::from_report(&onion, &report)).unwrap();
        }
        db
    }

    #[test]
    fn csv_has_header_and_rows() {
        let db = seeded();
        let mut buf = Vec::new();
        assert_eq!(db.export_results(&mut buf, ExportFormat::Csv).unwrap(), 2);
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("hiddenService,dateScanned,online,"));
        assert!(header.contains("analyticsIDs"));
        assert!(header.ends_with(",risks"));
        assert!(lines.next().unwrap().starts_with("aaaa"));
    }

    #[test]
    fn jsonl_one_object_per_line() {
        let db = seeded();
        let mut buf = Vec::new();
        db.export_results(&mut buf, ExportFormat::Jsonl).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let rows: Vec<ScanRecord> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.online && r.web_detected));
    }
}
