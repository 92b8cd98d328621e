//! Snowflake-style 64-bit memory IDs (§4.4): `id = (ms_since_epoch << 22) | (worker_id << 12) | seq`.
//!
//! 10 bits of worker id (≤1024 workers), 12 bits of per-millisecond sequence
//! (≤4096 ops/ms/worker), guaranteeing monotonic-within-process and
//! cross-process uniqueness as long as worker ids are assigned uniquely.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};

const SEQUENCE_BITS: u32 = 12;
const WORKER_BITS: u32 = 10;
const SEQUENCE_MASK: i64 = (1 << SEQUENCE_BITS) - 1;
const MAX_WORKER_ID: u16 = (1 << WORKER_BITS) - 1;

/// An opaque 64-bit memory identifier. Per the glossary, these must never
/// leak as a JSON number (precision loss past 2^53 in common JS/JSON
/// consumers) — `Serialize`/`Deserialize` always go through a decimal
/// string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemoryId(pub i64);

impl MemoryId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for MemoryId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for MemoryId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<i64>()
            .map(MemoryId)
            .map_err(serde::de::Error::custom)
    }
}

/// Per-process allocator. One instance is shared (behind an `Arc`, typically)
/// across all ingest call sites in a given worker process.
pub struct SnowflakeGenerator {
    worker_id: i64,
    /// Packs `(last_ms << 12) | seq` into one word so a single CAS loop
    /// handles both the millisecond rollover and the sequence bump.
    state: AtomicI64,
}

impl SnowflakeGenerator {
    pub fn new(worker_id: u16) -> Self {
        assert!(
            worker_id <= MAX_WORKER_ID,
            "worker_id must fit in {WORKER_BITS} bits"
        );
        Self {
            worker_id: worker_id as i64,
            state: AtomicI64::new(0),
        }
    }

    /// Allocate the next id, given the caller's current wall-clock
    /// millisecond (injected so ingest code stays testable under a fake
    /// clock rather than calling `SystemTime::now()` here).
    pub fn next_id(&self, now_ms: i64) -> MemoryId {
        loop {
            let prev = self.state.load(Ordering::Acquire);
            let prev_ms = prev >> SEQUENCE_BITS;
            let (ms, seq) = if now_ms > prev_ms {
                (now_ms, 0)
            } else {
                (prev_ms, (prev & SEQUENCE_MASK) + 1)
            };
            // Sequence exhausted within this millisecond: spin to the next one.
            if seq > SEQUENCE_MASK {
                continue;
            }
            let next = (ms << SEQUENCE_BITS) | seq;
            if self
                .state
                .compare_exchange(prev, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                let id = (ms << (WORKER_BITS + SEQUENCE_BITS))
                    | (self.worker_id << SEQUENCE_BITS)
                    | seq;
                return MemoryId(id);
            }
        }
    }
}
