// The task queue seam between the coordinator and the worker pool.
//
// Modeled as a trait so the in-memory queue used here can be swapped for a
// broker-backed one without touching the dispatcher. The contract assumes
// at-least-once delivery: duplicates are tolerated downstream by unit_id
// deduplication, never by demanding exactly-once from the queue.

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

/// Transport for serialized work unit payloads.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Enqueue one serialized work unit. Fails if the queue is closed or
    /// unreachable.
    async fn push(&self, payload: Vec<u8>) -> Result<()>;

    /// Claim the next payload. Any worker may claim any payload. Returns
    /// `None` once the queue is closed and drained.
    async fn pull(&self) -> Option<Vec<u8>>;

    /// Signal that no more payloads will arrive, letting workers drain and
    /// exit.
    async fn close(&self);
}

/// In-memory, bounded task queue backed by a tokio channel.
///
/// Multiple workers pull from the shared receiver; whichever worker gets
/// the lock claims the payload, which mirrors how competing consumers
/// behave on a real broker.
pub struct MemoryQueue {
    sender: Mutex<Option<mpsc::Sender<Vec<u8>>>>,
    receiver: Mutex<mpsc::Receiver<Vec<u8>>>,
}

impl MemoryQueue {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            sender: Mutex::new(Some(sender)),
            receiver: Mutex::new(receiver),
        }
    }
}

#[async_trait]
impl TaskQueue for MemoryQueue {
    async fn push(&self, payload: Vec<u8>) -> Result<()> {
        let sender = self.sender.lock().await;
        match sender.as_ref() {
            Some(tx) => tx
                .send(payload)
                .await
                .map_err(|_| anyhow::anyhow!("task queue is closed")),
            None => anyhow::bail!("task queue is closed"),
        }
    }

    async fn pull(&self) -> Option<Vec<u8>> {
        self.receiver.lock().await.recv().await
    }

    async fn close(&self) {
        self.sender.lock().await.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn push_pull_fifo_for_single_consumer() {
        let queue = MemoryQueue::new(8);
        queue.push(b"one".to_vec()).await.unwrap();
        queue.push(b"two".to_vec()).await.unwrap();
        queue.close().await;

        assert_eq!(queue.pull().await.unwrap(), b"one".to_vec());
        assert_eq!(queue.pull().await.unwrap(), b"two".to_vec());
        assert_eq!(queue.pull().await, None);
    }

    #[tokio::test]
    async fn push_after_close_fails() {
        let queue = MemoryQueue::new(8);
        queue.close().await;
        assert!(queue.push(b"late".to_vec()).await.is_err());
    }
}
