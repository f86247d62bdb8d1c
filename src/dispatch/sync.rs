// Synchronous dispatcher: the correctness reference.
//
// Executes every unit immediately, in submission order, on the calling
// task. No concurrency, no suspension, no timeout — by the time `submit`
// returns, every result is already buffered in the handle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use super::{execute_unit, Dispatcher, RunHandle, WorkUnit};

pub struct SyncDispatcher;

#[async_trait]
impl Dispatcher for SyncDispatcher {
    async fn submit(&self, units: Vec<WorkUnit>) -> Result<RunHandle> {
        let total = units.len();
        // Capacity covers every result, so the sends below never block.
        let (tx, rx) = mpsc::channel(total.max(1));
        let completed = Arc::new(AtomicUsize::new(0));

        for unit in &units {
            debug!(unit_id = %unit.unit_id, "Executing work unit inline");
            let result = execute_unit(unit);
            let payload = serde_json::to_vec(&result)?;
            completed.fetch_add(1, Ordering::SeqCst);
            tx.send(payload)
                .await
                .map_err(|_| anyhow::anyhow!("result channel closed"))?;
        }

        Ok(RunHandle::new(total, completed, rx, Vec::new(), None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalysisConfig, Language};
    use crate::dispatch::WorkOutcome;

    fn units(texts: &[&str]) -> Vec<WorkUnit> {
        let config = AnalysisConfig::with_stopwords::<&str>(Language::English, false, &[], 10, false);
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| WorkUnit {
                unit_id: format!("unit-{i:04}"),
                source: format!("doc-{i}.txt"),
                text: text.to_string(),
                config: config.clone(),
            })
            .collect()
    }

    #[tokio::test]
    async fn results_arrive_in_submission_order() {
        let mut handle = SyncDispatcher
            .submit(units(&["alpha", "beta", "gamma"]))
            .await
            .unwrap();

        let mut seen = Vec::new();
        while let Some(result) = handle.next_result().await {
            seen.push(result.unit_id);
        }
        assert_eq!(seen, vec!["unit-0000", "unit-0001", "unit-0002"]);
    }

    #[tokio::test]
    async fn progress_is_complete_after_submit() {
        let handle = SyncDispatcher.submit(units(&["a", "b"])).await.unwrap();
        let progress = handle.progress();
        assert_eq!(progress.completed, 2);
        assert_eq!(progress.total, 2);
    }

    #[tokio::test]
    async fn empty_submission_yields_no_results() {
        let mut handle = SyncDispatcher.submit(Vec::new()).await.unwrap();
        assert!(handle.next_result().await.is_none());
        assert!(!handle.timed_out());
    }

    #[tokio::test]
    async fn counts_are_produced_inline() {
        let mut handle = SyncDispatcher.submit(units(&["cat cat dog"])).await.unwrap();
        let result = handle.next_result().await.unwrap();
        match result.outcome {
            WorkOutcome::Counts(counts) => assert_eq!(counts["cat"], 2),
            WorkOutcome::Failed { reason } => panic!("unexpected failure: {reason}"),
        }
    }
}
