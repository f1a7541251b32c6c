//! Runs the external onion scanner against one address under a hard deadline.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use crawler_core::{IdentityGate, OnionAddress, RotationTicket};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;

pub const DEFAULT_PROGRAM: &str = "onionscan";
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(300);

pub fn default_args() -> Vec<String> {
    ["--webport=0", "--jsonReport", "--simpleReport=false"].iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone)]
pub struct ProbeOptions {
    pub program: PathBuf,
    /// Arguments placed before the target address.
    pub args: Vec<String>,
    pub deadline: Duration,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        ProbeOptions { program: PathBuf::from(DEFAULT_PROGRAM), args: default_args(), deadline: DEFAULT_DEADLINE }
    }
}

#[derive(Debug)]
pub enum ProbeOutcome {
    /// Raw stdout of a probe that finished in time, possibly empty.
    Completed(Vec<u8>),
    /// The deadline fired: the gate is closed and the process has been killed.
    TimedOut(RotationTicket),
}

#[async_trait]
pub trait Probe {
    async fn run(&self, target: &OnionAddress, gate: &IdentityGate) -> Result<ProbeOutcome>;
}

#[derive(Debug, Clone, Default)]
pub struct OnionScan {
    opts: ProbeOptions,
}

impl OnionScan {
    pub fn new(opts: ProbeOptions) -> Self {
        OnionScan { opts }
    }
}

#[async_trait]
impl Probe for OnionScan {
    async fn run(&self, target: &OnionAddress, gate: &IdentityGate) -> Result<ProbeOutcome> {
        tracing::info!(onion = %target, "onionscanning");
        let mut child = Command::new(&self.opts.program)
            .args(&self.opts.args)
            .arg(target.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| anyhow!("failed to spawn {}: {}", self.opts.program.display(), e))?;
        let mut stdout = child.stdout.take().ok_or_else(|| anyhow!("probe stdout not captured"))?;
        let mut stderr = child.stderr.take().ok_or_else(|| anyhow!("probe stderr not captured"))?;

        let collect = async {
            let mut out = Vec::new();
            let mut err = Vec::new();
            let (o, e, status) = tokio::join!(stdout.read_to_end(&mut out), stderr.read_to_end(&mut err), child.wait());
            o?;
            e?;
            let status = status?;
            Ok::<_, std::io::Error>((out, err, status))
        };

        let finished = timeout(self.opts.deadline, collect).await;
        match finished {
            Ok(res) => {
                let (out, err, status) = res?;
                if !err.is_empty() {
                    tracing::debug!(onion = %target, stderr = %String::from_utf8_lossy(&err).trim_end(), "probe diagnostics");
                }
                tracing::debug!(onion = %target, %status, bytes = out.len(), "probe finished");
                Ok(ProbeOutcome::Completed(out))
            }
            Err(_) => {
                tracing::warn!(onion = %target, deadline_secs = self.opts.deadline.as_secs(), "probe timed out");
                let ticket = gate.close();
                // already exited is fine
                if child.kill().await.is_ok() {
                    tracing::warn!(onion = %target, "killed the probe process");
                }
                Ok(ProbeOutcome::TimedOut(ticket))
            }
        }
    }
}
