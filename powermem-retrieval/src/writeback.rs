//! Bounded, fire-and-forget retention write-back (§5 concurrency model,
//! §4.8 step 7): reinforcement from a read should never make the caller
//! wait on a store write, and a slow consumer should never build unbounded
//! backlog.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::warn;

use powermem_core::memory::{MemoryId, RetentionBlock};
use powermem_core::traits::{UpdatePatch, VectorStore};

struct WriteBackJob {
    store: Arc<dyn VectorStore>,
    id: MemoryId,
    block: RetentionBlock,
}

/// Handle held by the retrieval engine; cloning is cheap (just the sender).
#[derive(Clone)]
pub struct RetentionWriteBack {
    sender: mpsc::Sender<WriteBackJob>,
}

impl RetentionWriteBack {
    /// Spawns the background consumer and returns a handle plus its
    /// `JoinHandle` (callers that care about graceful shutdown can await it
    /// after dropping every clone of the handle, which closes the channel).
    pub fn spawn(capacity: usize) -> (Self, tokio::task::JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::channel(capacity);
        let handle = tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                if let Err(err) = apply(job).await {
                    warn!(error = %err, "retention write-back failed, dropping");
                }
            }
        });
        (Self { sender }, handle)
    }

    /// Enqueues a reinforcement write-back. On a full channel the *new* job
    /// is dropped rather than blocking the caller — reinforcement is
    /// best-effort, so losing one under backpressure is an acceptable
    /// approximation of "drop the oldest pending write-back".
    pub fn enqueue(&self, store: Arc<dyn VectorStore>, id: MemoryId, block: RetentionBlock) {
        if self.sender.try_send(WriteBackJob { store, id, block }).is_err() {
            warn!(id = id.0, "retention write-back channel full, dropping reinforcement");
        }
    }
}

async fn apply(job: WriteBackJob) -> powermem_core::errors::PowerMemResult<()> {
    let Some(mut record) = job.store.get(job.id).await? else {
        return Ok(());
    };
    record.payload.insert(
        "retention".to_string(),
        serde_json::to_value(&job.block).expect("RetentionBlock always serializes"),
    );
    job.store
        .update(
            job.id,
            UpdatePatch {
                dense_embedding: None,
                sparse_embedding: None,
                payload: Some(record.payload),
            },
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use powermem_core::traits::InsertItem;
    use powermem_storage::InMemoryStore;
    use std::time::Duration;

    #[tokio::test]
    async fn enqueued_reinforcement_is_eventually_persisted() {
        let store: Arc<dyn VectorStore> = Arc::new(InMemoryStore::new());
        let ids = store
            .insert(vec![InsertItem {
                id: None,
                dense_embedding: vec![0.1],
                sparse_embedding: None,
                payload: serde_json::Map::new(),
            }])
            .await
            .unwrap();
        let id = ids[0];

        let (write_back, _handle) = RetentionWriteBack::spawn(8);
        let block = RetentionBlock::new_for_add(0.5, 0.82, 0.3, chrono::Utc::now());
        write_back.enqueue(store.clone(), id, block.clone());

        tokio::time::sleep(Duration::from_millis(50)).await;

        let record = store.get(id).await.unwrap().unwrap();
        assert!(record.payload.contains_key("retention"));
    }
}
