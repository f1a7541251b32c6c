use crate::archive::ReportArchive;
use crate::context::RunContext;
use crate::discovery;
use crawler_core::{GateError, IdentityGate, OnionAddress, ScanReport};
use probe::{Probe, ProbeOutcome};
use results_sqlite::{Db, RunMeta, RunTotals, ScanRecord};
use std::sync::Arc;
use time::OffsetDateTime;
use tor_control::{rotate, IdentityControl};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("no onions in the frontier; seed or migrate a list first")]
    EmptyFrontier,
    #[error(transparent)]
    Gate(#[from] GateError),
    #[error("probe failed: {0}")]
    Probe(anyhow::Error),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub completed: usize,
    pub skipped: usize,
    pub timeouts: usize,
    pub empty_outputs: usize,
    pub unparsable: usize,
    pub discovered: usize,
}

impl From<&RunSummary> for RunTotals {
    fn from(s: &RunSummary) -> Self {
        RunTotals {
            completed: s.completed as i64,
            skipped: s.skipped as i64,
            timeouts: s.timeouts as i64,
            empty_outputs: (s.empty_outputs + s.unparsable) as i64,
        }
    }
}

/// Drives one crawl run at a time over a frontier store and a result store.
pub struct Crawler<P, C> {
    frontier: Db,
    results: Db,
    archive: ReportArchive,
    probe: P,
    control: Arc<C>,
    gate: IdentityGate,
}

impl<P, C> Crawler<P, C>
where
    P: Probe,
    C: IdentityControl + 'static,
{
    pub fn new(frontier: Db, results: Db, archive: ReportArchive, probe: P, control: Arc<C>) -> Self {
        Crawler { frontier, results, archive, probe, control, gate: IdentityGate::new() }
    }

    pub fn frontier(&self) -> &Db { &self.frontier }
    pub fn results(&self) -> &Db { &self.results }
    pub fn archive(&self) -> &ReportArchive { &self.archive }
    pub fn probe(&self) -> &P { &self.probe }
    pub fn gate(&self) -> &IdentityGate { &self.gate }

    fn already_scanned(&self, onion: &OnionAddress) -> anyhow::Result<bool> {
        Ok(self.archive.exists(onion) || self.results.has_result(onion.as_str())?)
    }

    /// One pass over a shuffled snapshot of the frontier.
    ///
    /// Addresses that already have an archived report or a result row are
    /// skipped and counted. A timeout abandons the address for this run and
    /// hands the gate to a rotation task; the loop resumes once the gate
    /// reopens. Empty or undecodable output is left for a future run.
    ///
    /// The run is recorded in the results store's `runs` ledger. Its totals
    /// are written even when a failed rotation ends the run early.
    pub async fn run(&self) -> Result<RunSummary, CrawlError> {
        let onions = self.frontier.all_onions()?;
        if onions.is_empty() {
            tracing::warn!("no onions in frontier, nothing to scan");
            return Err(CrawlError::EmptyFrontier);
        }
        tracing::info!(total = onions.len(), "total v3 onions for scanning");

        let mut ctx = RunContext::new(onions, &mut rand::thread_rng());
        let mut summary = RunSummary { total: ctx.target(), ..RunSummary::default() };
        let run_id = self.results.begin_run(&RunMeta {
            run_id: Uuid::now_v7(),
            started_at: OffsetDateTime::now_utc().unix_timestamp(),
            tool_version: crawler_core::version().to_string(),
            frontier_size: ctx.target() as i64,
        })?;

        let scanned = self.scan(&mut ctx, &mut summary).await;
        let recorded = self.results.finish_run(&run_id, OffsetDateTime::now_utc().unix_timestamp(), &RunTotals::from(&summary));
        match &scanned {
            Ok(()) => tracing::info!(
                run_id = %run_id,
                completed = summary.completed,
                skipped = summary.skipped,
                timeouts = summary.timeouts,
                abandoned = ctx.discarded().len(),
                empty = summary.empty_outputs + summary.unparsable,
                discovered = summary.discovered,
                "run finished"
            ),
            Err(e) => tracing::error!(
                run_id = %run_id,
                completed = summary.completed,
                timeouts = summary.timeouts,
                error = %e,
                "run stopped early"
            ),
        }
        scanned?;
        recorded?;
        Ok(summary)
    }

    async fn scan(&self, ctx: &mut RunContext, summary: &mut RunSummary) -> Result<(), CrawlError> {
        while !ctx.is_done() {
            self.gate.wait_open().await?;
            tracing::info!(count = ctx.progress(), total = ctx.target(), remaining = ctx.remaining(), "running");
            let Some(onion) = ctx.pop() else { break };

            if self.already_scanned(&onion)? {
                tracing::info!(onion = %onion, "already retrieved, skipping");
                summary.skipped += 1;
                ctx.advance();
                continue;
            }

            match self.probe.run(&onion, &self.gate).await.map_err(CrawlError::Probe)? {
                ProbeOutcome::TimedOut(ticket) => {
                    summary.timeouts += 1;
                    ctx.discard(onion);
                    let control = Arc::clone(&self.control);
                    tokio::spawn(async move { rotate(control.as_ref(), ticket).await });
                }
                ProbeOutcome::Completed(raw) if raw.is_empty() => {
                    tracing::warn!(onion = %onion, "probe produced no output");
                    summary.empty_outputs += 1;
                }
                ProbeOutcome::Completed(raw) => match ScanReport::from_slice(&raw) {
                    Err(e) => {
                        tracing::warn!(onion = %onion, error = %e, "probe output is not a report");
                        summary.unparsable += 1;
                    }
                    Ok(report) => {
                        self.archive.store(&onion, &raw)?;
                        summary.discovered += discovery::feed(&self.frontier, &report).stored;
                        self.results.upsert_result(&ScanRecord::from_report(onion.as_str(), &report))?;
                        summary.completed += 1;
                        ctx.advance();
                    }
                },
            }
        }

        // a rotation spawned for the last address must finish before we report
        self.gate.wait_open().await?;
        Ok(())
    }

    pub fn close(self) -> anyhow::Result<()> {
        self.frontier.close()?;
        self.results.close()
    }
}
