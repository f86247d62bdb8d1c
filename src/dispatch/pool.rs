// Pool dispatcher: distributes work units across stateless workers.
//
// Units are serialized and pushed onto the task queue; each worker loops
// pull -> decode -> execute -> encode -> send. Workers share nothing and
// cache nothing between units, so which worker claims a unit cannot affect
// the result. Completion order is whatever it is — the aggregator is
// commutative, so nobody downstream cares.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, trace};

use super::queue::TaskQueue;
use super::{execute_unit, Dispatcher, RunHandle, WorkUnit, WorkResult};

/// Fans work units out to a pool of workers through a task queue.
///
/// One dispatcher services one run: `submit` closes the queue after the
/// last unit so the workers drain and exit.
pub struct PoolDispatcher {
    queue: Arc<dyn TaskQueue>,
    worker_count: usize,
    run_timeout: Duration,
}

impl PoolDispatcher {
    pub fn new(queue: Arc<dyn TaskQueue>, worker_count: usize, run_timeout: Duration) -> Self {
        Self {
            queue,
            worker_count,
            run_timeout,
        }
    }

    fn spawn_workers(
        &self,
        results: mpsc::Sender<Vec<u8>>,
        completed: Arc<AtomicUsize>,
    ) -> Vec<JoinHandle<()>> {
        (0..self.worker_count)
            .map(|worker_id| {
                let queue = self.queue.clone();
                let results = results.clone();
                let completed = completed.clone();
                tokio::spawn(async move {
                    debug!(worker_id, "Worker started");
                    while let Some(payload) = queue.pull().await {
                        let unit: WorkUnit = match serde_json::from_slice(&payload) {
                            Ok(unit) => unit,
                            Err(e) => {
                                // Transport damage; the unit surfaces through
                                // the run timeout, not a worker crash.
                                error!(worker_id, error = %e, "Discarding undecodable work unit payload");
                                continue;
                            }
                        };
                        trace!(worker_id, unit_id = %unit.unit_id, "Claimed work unit");

                        let result = execute_unit(&unit);
                        let payload = match serde_json::to_vec(&result) {
                            Ok(payload) => payload,
                            Err(e) => {
                                error!(worker_id, unit_id = %unit.unit_id, error = %e, "Failed to encode result");
                                continue;
                            }
                        };

                        completed.fetch_add(1, Ordering::SeqCst);
                        if results.send(payload).await.is_err() {
                            // Collector went away (run aborted); stop pulling.
                            debug!(worker_id, "Result channel closed, worker exiting");
                            break;
                        }
                    }
                    debug!(worker_id, "Worker drained queue and exited");
                })
            })
            .collect()
    }
}

#[async_trait]
impl Dispatcher for PoolDispatcher {
    async fn submit(&self, units: Vec<WorkUnit>) -> Result<RunHandle> {
        let total = units.len();
        let (tx, rx) = mpsc::channel(total.max(1));
        let completed = Arc::new(AtomicUsize::new(0));

        // Workers first, so pushing more units than the queue capacity
        // cannot deadlock against an empty consumer side.
        let workers = self.spawn_workers(tx, completed.clone());
        info!(
            workers = self.worker_count,
            units = total,
            "Dispatching work units to pool"
        );

        for unit in &units {
            let payload = serde_json::to_vec(unit)?;
            self.queue.push(payload).await?;
        }
        self.queue.close().await;

        let deadline = Instant::now() + self.run_timeout;
        Ok(RunHandle::new(
            total,
            completed,
            rx,
            workers,
            Some(deadline),
        ))
    }
}

/// Stateless execution of one serialized work unit, exposed for a remote
/// worker binary consuming a broker-backed queue: decode, execute, encode.
pub fn process_payload(payload: &[u8]) -> Result<Vec<u8>> {
    let unit: WorkUnit = serde_json::from_slice(payload)?;
    let result: WorkResult = execute_unit(&unit);
    Ok(serde_json::to_vec(&result)?)
}
