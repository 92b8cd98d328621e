//! Shared test tooling for the workspace (§10.5): a fake clock, record and
//! sub-store config builders, and `proptest` strategies for the filter
//! algebra and record model. The scripted mock `Llm`/`Embedder` used across
//! crates' tests already live in `powermem-providers` (every crate that
//! needs them already depends on that crate for its real production
//! providers); they're re-exported here so a test only needs one import for
//! its whole fixture surface.

pub mod builders;
pub mod clock;
pub mod strategies;

pub use builders::{scope_keys, user_scope, MemoryRecordBuilder, SubStoreConfigBuilder};
pub use clock::FakeClock;
pub use powermem_providers::{BagOfWordsSparseEmbedder, DeterministicEmbedder, IdentityReranker, MockLlm};
