//! Batch reclassification sweep (§4.5 type promotion, driven off the
//! decay/review math in `powermem-retention`). Walks a store in pages,
//! recomputes each record's retention block, writes back promotions, and
//! reports which ids crossed into `should_forget` for the caller to delete.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use powermem_core::config::{ReclassificationConfig, RetentionConfig};
use powermem_core::errors::PowerMemResult;
use powermem_core::memory::{MemoryId, RetentionBlock};
use powermem_core::traits::{UpdatePatch, VectorStore};
use powermem_retention::{DecayContext, DecayEngine};

/// Summary of one sweep: how many records were examined, how many were
/// promoted to a different `memory_type`, and which ids are now due for
/// deletion. The sweep never deletes records itself — §3.4 (I5) only lets
/// `review_count`/`access_count` move forward, and actual removal is a
/// caller decision, typically behind a lower-rate confirmation step.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub examined: usize,
    pub promoted: usize,
    pub should_forget: Vec<MemoryId>,
}

pub struct ReclassificationSweep {
    store: Arc<dyn VectorStore>,
    engine: DecayEngine,
    config: ReclassificationConfig,
}

impl ReclassificationSweep {
    pub fn new(store: Arc<dyn VectorStore>, retention_config: RetentionConfig, config: ReclassificationConfig) -> Self {
        Self {
            store,
            engine: DecayEngine::new(retention_config),
            config,
        }
    }

    /// Runs one full sweep of the store's records in `batch_size`-sized
    /// pages, decaying and persisting each page before requesting the next.
    pub async fn run(&self, now: DateTime<Utc>) -> PowerMemResult<SweepReport> {
        if !self.config.enabled {
            return Ok(SweepReport::default());
        }

        let ctx = DecayContext::at(now);
        let mut report = SweepReport::default();
        let mut offset = 0usize;

        loop {
            let page = self.store.list(None, self.config.batch_size, offset).await?;
            if page.is_empty() {
                break;
            }
            let page_len = page.len();

            for mut record in page {
                let Some(mut block) = extract_block(&record) else {
                    continue;
                };
                report.examined += 1;
                let previous_type = block.memory_type;
                self.engine.process_one(&mut block, &ctx);
                if block.memory_type != previous_type {
                    report.promoted += 1;
                }
                if block.should_forget {
                    report.should_forget.push(record.id);
                }
                inject_block(&mut record.payload, &block);
                self.store
                    .update(
                        record.id,
                        UpdatePatch {
                            dense_embedding: None,
                            sparse_embedding: None,
                            payload: Some(record.payload),
                        },
                    )
                    .await?;
            }

            if page_len < self.config.batch_size {
                break;
            }
            offset += page_len;
        }

        Ok(report)
    }
}

fn extract_block(record: &powermem_core::traits::Record) -> Option<RetentionBlock> {
    record
        .payload
        .get("retention")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

fn inject_block(payload: &mut serde_json::Map<String, serde_json::Value>, block: &RetentionBlock) {
    payload.insert(
        "retention".to_string(),
        serde_json::to_value(block).expect("RetentionBlock always serializes"),
    );
}
