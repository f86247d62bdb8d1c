// Run orchestration: one analysis run, end to end.
//
// Enumerated documents become work units sharing one AnalysisConfig, go
// through whichever dispatcher the config selects, and fold into the
// aggregate as results arrive. The aggregate state lives here and only
// here; workers never see it.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::aggregate::{AggregateState, FailedUnit, RankedTerm};
use crate::config::{AnalysisConfig, Settings};
use crate::corpus::Document;
use crate::dispatch::{
    Dispatcher, MemoryQueue, PoolDispatcher, Progress, SyncDispatcher, WorkOutcome, WorkResult,
    WorkUnit,
};

/// Terminal run failures. Per-unit failures are not here — those are
/// recovered locally (skipped and logged) and reported in the outcome.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("all {0} documents failed analysis")]
    AllUnitsFailed(usize),
}

/// What a completed run produced.
#[derive(Debug)]
pub struct RunOutcome {
    /// Count-descending, term-ascending ranked terms, already cut to top_n.
    pub ranking: Vec<RankedTerm>,
    pub documents_total: usize,
    /// Documents excluded from the ranking, with reasons.
    pub failed: Vec<FailedUnit>,
}

/// Owns the lifecycle of a single analysis run.
#[derive(Debug)]
pub struct Coordinator {
    config: AnalysisConfig,
    settings: Settings,
}

impl Coordinator {
    pub fn new(config: AnalysisConfig, settings: Settings) -> Result<Self, RunError> {
        if config.async_mode && settings.workers == 0 {
            return Err(RunError::Config(
                "async mode needs at least one worker (GLEANER_WORKERS)".to_string(),
            ));
        }
        Ok(Self { config, settings })
    }

    /// Run the analysis over `documents`, invoking `observe` as units
    /// complete so a UI can render progress.
    ///
    /// The run either returns one ranked output (with any skipped
    /// documents listed) or a terminal `RunError`. An empty corpus is a
    /// successful run with an empty ranking.
    pub async fn run(
        &self,
        documents: Vec<Document>,
        observe: impl FnMut(Progress),
    ) -> Result<RunOutcome, RunError> {
        let dispatcher: Box<dyn Dispatcher> = if self.config.async_mode {
            Box::new(PoolDispatcher::new(
                Arc::new(MemoryQueue::new(self.settings.queue_capacity)),
                self.settings.workers,
                self.settings.run_timeout,
            ))
        } else {
            Box::new(SyncDispatcher)
        };
        self.run_with(dispatcher, documents, observe).await
    }

    async fn run_with(
        &self,
        dispatcher: Box<dyn Dispatcher>,
        documents: Vec<Document>,
        mut observe: impl FnMut(Progress),
    ) -> Result<RunOutcome, RunError> {
        let documents_total = documents.len();
        let mut state = AggregateState::new();

        // Build work units, turning unreadable documents into failed
        // results up front. Their unit never reaches a dispatcher.
        let mut units = Vec::new();
        for (index, document) in documents.into_iter().enumerate() {
            let unit_id = format!("unit-{index:04}");
            match document.read() {
                Ok(text) => units.push(WorkUnit {
                    unit_id,
                    source: document.source,
                    text,
                    config: self.config.clone(),
                }),
                Err(e) => {
                    warn!(source = %document.source, error = %e, "Skipping unreadable document");
                    state.merge(WorkResult {
                        unit_id,
                        source: document.source,
                        outcome: WorkOutcome::Failed {
                            reason: e.to_string(),
                        },
                    });
                }
            }
        }

        info!(
            documents = documents_total,
            units = units.len(),
            async_mode = self.config.async_mode,
            "Starting analysis run"
        );

        let submitted = units.len();
        let mut outstanding: HashMap<String, String> = units
            .iter()
            .map(|u| (u.unit_id.clone(), u.source.clone()))
            .collect();

        let mut handle = dispatcher
            .submit(units)
            .await
            .map_err(|e| RunError::Transport(e.to_string()))?;

        while let Some(result) = handle.next_result().await {
            outstanding.remove(&result.unit_id);
            state.merge(result);
            observe(handle.progress());
        }

        if handle.timed_out() {
            warn!(
                outstanding = outstanding.len(),
                "Run deadline expired with units outstanding"
            );
            for (unit_id, source) in outstanding.drain() {
                state.merge(WorkResult {
                    unit_id,
                    source,
                    outcome: WorkOutcome::Failed {
                        reason: "timed out waiting for a worker".to_string(),
                    },
                });
            }
        } else if !outstanding.is_empty() {
            // The result channel closed with units unaccounted for and no
            // timeout: the transport dropped them.
            return Err(RunError::Transport(format!(
                "{} of {submitted} units never reported a result",
                outstanding.len()
            )));
        }

        if documents_total > 0 && state.succeeded() == 0 {
            return Err(RunError::AllUnitsFailed(documents_total));
        }

        let failed = state.failed().to_vec();
        let ranking = state.finalize(self.config.top_n);
        info!(
            ranked_terms = ranking.len(),
            failed = failed.len(),
            "Analysis run complete"
        );

        Ok(RunOutcome {
            ranking,
            documents_total,
            failed,
        })
    }
}
