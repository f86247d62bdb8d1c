// Work distribution: the unit of distributable work, its result, and the
// dispatcher seam.
//
// The Dispatcher trait has two interchangeable implementations — run every
// unit inline on the calling task (sync mode, the correctness reference) or
// fan units out to a pool of stateless workers through a task queue (async
// mode). Both must produce identical observable results; the normalizer and
// counter are deterministic, which is what makes the pool safe.

pub mod pool;
pub mod queue;
pub mod sync;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::warn;

use crate::config::AnalysisConfig;
use crate::count::{count_terms, TermCounts};
use crate::normalize::Normalizer;

pub use pool::PoolDispatcher;
pub use queue::{MemoryQueue, TaskQueue};
pub use sync::SyncDispatcher;

/// One document's worth of analysis work, self-contained: carries the text
/// and the full config so any worker reproduces identical output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkUnit {
    /// Unique within a run; results are deduplicated on it, so a unit
    /// redelivered by an at-least-once queue still contributes once.
    pub unit_id: String,
    /// Where the document came from (path or label), for reporting.
    pub source: String,
    /// The raw document text.
    pub text: String,
    pub config: AnalysisConfig,
}

/// What a single execution of a work unit produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkOutcome {
    Counts(TermCounts),
    Failed { reason: String },
}

/// The result of exactly one work unit execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkResult {
    pub unit_id: String,
    pub source: String,
    pub outcome: WorkOutcome,
}

/// Execute one work unit: normalize the text and tally its terms.
///
/// This is the entire worker body. It is pure and stateless — no cross-unit
/// cache, no shared mutable state — so any worker (or the calling thread)
/// can run it with the same outcome.
pub fn execute_unit(unit: &WorkUnit) -> WorkResult {
    let normalizer = Normalizer::new(&unit.config);
    let counts = count_terms(
        normalizer
            .sentences(&unit.text)
            .map(|sentence| normalizer.terms(sentence).collect::<Vec<_>>()),
    );
    WorkResult {
        unit_id: unit.unit_id.clone(),
        source: unit.source.clone(),
        outcome: WorkOutcome::Counts(counts),
    }
}

/// Completion progress, exposed so a UI layer can render a bar without the
/// dispatcher knowing anything about UIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

/// Dispatches work units for execution. Selected once at coordinator
/// construction; the rest of the pipeline never cares which mode is active.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Enqueue all units and return a handle for collecting their results.
    async fn submit(&self, units: Vec<WorkUnit>) -> Result<RunHandle>;
}

/// Handle to one submitted batch of work units.
///
/// `next_result` is the only suspension point in a run: it waits (non-busy)
/// for results to arrive, in no particular order. Dropping the handle tears
/// the workers down, so an aborted run never blocks on units that will
/// never complete.
pub struct RunHandle {
    total: usize,
    completed: Arc<AtomicUsize>,
    results: mpsc::Receiver<Vec<u8>>,
    workers: Vec<JoinHandle<()>>,
    deadline: Option<Instant>,
    timed_out: bool,
}

impl RunHandle {
    pub(crate) fn new(
        total: usize,
        completed: Arc<AtomicUsize>,
        results: mpsc::Receiver<Vec<u8>>,
        workers: Vec<JoinHandle<()>>,
        deadline: Option<Instant>,
    ) -> Self {
        Self {
            total,
            completed,
            results,
            workers,
            deadline,
            timed_out: false,
        }
    }

    /// The caller-visible progress signal: units completed so far vs total.
    pub fn progress(&self) -> Progress {
        Progress {
            completed: self.completed.load(Ordering::SeqCst).min(self.total),
            total: self.total,
        }
    }

    /// Await the next completed result.
    ///
    /// Returns `None` once every submitted unit has reported, or when the
    /// run deadline expires — check `timed_out()` to tell the two apart.
    /// Undecodable result payloads are logged and skipped; the missing unit
    /// surfaces through the timeout path instead of corrupting the run.
    pub async fn next_result(&mut self) -> Option<WorkResult> {
        loop {
            let received = match self.deadline {
                Some(deadline) => {
                    match tokio::time::timeout_at(deadline, self.results.recv()).await {
                        Ok(received) => received,
                        Err(_) => {
                            self.timed_out = true;
                            self.abort();
                            return None;
                        }
                    }
                }
                None => self.results.recv().await,
            };

            match received {
                Some(payload) => match serde_json::from_slice(&payload) {
                    Ok(result) => return Some(result),
                    Err(e) => {
                        warn!(error = %e, "Discarding undecodable result payload");
                        continue;
                    }
                },
                None => return None,
            }
        }
    }

    /// Whether collection stopped because the run deadline expired.
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    /// Stop waiting for further results and tear down the workers. Safe to
    /// call more than once.
    pub fn abort(&mut self) {
        for worker in &self.workers {
            worker.abort();
        }
        self.results.close();
    }
}

impl Drop for RunHandle {
    fn drop(&mut self) {
        self.abort();
    }
}
