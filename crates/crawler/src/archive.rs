//! Raw report archive, one `<onion>.json` per address. A file here marks the
//! address as done for every later run.

use anyhow::Result;
use crawler_core::OnionAddress;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_RESULTS_DIR: &str = "onionscan_results";

#[derive(Debug, Clone)]
pub struct ReportArchive {
    dir: PathBuf,
}

impl Default for ReportArchive {
    fn default() -> Self {
        ReportArchive::new(DEFAULT_RESULTS_DIR)
    }
}

impl ReportArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ReportArchive { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// A v3 address is base32 plus `.onion`, so it is always a plain file name.
    pub fn path_for(&self, onion: &OnionAddress) -> PathBuf {
        self.dir.join(format!("{onion}.json"))
    }

    pub fn exists(&self, onion: &OnionAddress) -> bool {
        self.path_for(onion).is_file()
    }

    /// Write the raw probe output byte-for-byte. Goes through a temp file and a
    /// rename so a crash never leaves a truncated marker behind.
    pub fn store(&self, onion: &OnionAddress, raw: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(onion);
        let tmp = self.dir.join(format!(".{onion}.json.tmp"));
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn onion() -> OnionAddress {
        OnionAddress::parse("zqktlwiuavvvqqt4ybvgvi7tyo4hjl5xgfuvpdf6otjiycgwqbym2qad.onion").unwrap()
    }

    #[test]
    fn store_creates_dir_and_marker() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = ReportArchive::new(tmp.path().join("results"));
        let a = onion();
        assert!(!archive.exists(&a));
        let path = archive.store(&a, b"{\"online\":true}").unwrap();
        assert!(archive.exists(&a));
        assert_eq!(fs::read(path).unwrap(), b"{\"online\":true}");
        // no temp file left behind
        assert_eq!(fs::read_dir(archive.dir()).unwrap().count(), 1);
    }

    #[test]
    fn marker_lives_directly_under_the_archive_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = ReportArchive::new(tmp.path());
        let path = archive.path_for(&onion());
        assert_eq!(path.parent(), Some(tmp.path()));
        assert_eq!(path.file_name().unwrap().to_str().unwrap(), format!("{}.json", onion()));
    }
}
