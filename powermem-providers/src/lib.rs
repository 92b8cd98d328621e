pub mod cache;
pub mod http;
pub mod mock;
pub mod registry;

pub use cache::{CacheHitTier, CachedEmbedder};
pub use http::HttpProvider;
pub use mock::{BagOfWordsSparseEmbedder, DeterministicEmbedder, IdentityReranker, MockLlm};
pub use registry::ProviderRegistry;
