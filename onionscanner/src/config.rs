use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG: &str = "onionscanner.yaml";

#[derive(Debug, Default, Deserialize, Clone)]
pub struct CrawlConfig {
    pub probe: Option<String>,
    pub probe_args: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
    pub results_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct StorageConfig {
    pub frontier_db: Option<String>,
    pub results_db: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct TorConfig {
    pub control: Option<String>,
    pub control_password: Option<String>,
    /// Per-step deadline on the control connection.
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    pub crawl: Option<CrawlConfig>,
    pub storage: Option<StorageConfig>,
    pub tor: Option<TorConfig>,
}

impl Config {
    pub fn crawl(&self) -> CrawlConfig { self.crawl.clone().unwrap_or_default() }
    pub fn storage(&self) -> StorageConfig { self.storage.clone().unwrap_or_default() }
    pub fn tor(&self) -> TorConfig { self.tor.clone().unwrap_or_default() }
}

/// Explicit path must load; the default file is optional.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = Path::new(DEFAULT_CONFIG);
            if p.exists() { p.to_path_buf() } else { return Ok(Config::default()); }
        }
    };
    let s = fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("failed to read config {}: {}", path.display(), e))?;
    Ok(serde_yaml::from_str(&s)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_sections() {
        let cfg: Config = serde_yaml::from_str(
            "crawl:\n  timeout_secs: 120\n  probe_args: [\"--jsonReport\"]\ntor:\n  control: 127.0.0.1:9151\n  timeout_secs: 5\n",
        )
        .unwrap();
        assert_eq!(cfg.crawl().timeout_secs, Some(120));
        assert_eq!(cfg.crawl().probe_args, Some(vec!["--jsonReport".to_string()]));
        assert_eq!(cfg.tor().control.as_deref(), Some("127.0.0.1:9151"));
        assert_eq!(cfg.tor().timeout_secs, Some(5));
        assert!(cfg.storage().frontier_db.is_none());
    }

    #[test]
    fn empty_file_is_default() {
        let cfg: Config = serde_yaml::from_str("{}").unwrap();
        assert!(cfg.crawl.is_none() && cfg.tor.is_none());
    }
}
