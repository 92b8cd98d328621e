//! Providers that need no network access: a deterministic hash-based
//! embedder (always available, used as the default/degraded-mode
//! provider — the teacher's "tfidf" role) and a scripted mock LLM for
//! tests.

use async_trait::async_trait;

use powermem_core::errors::PowerMemResult;
use powermem_core::traits::{
    ChatMessage, ChatOptions, ChatResponse, EmbedAction, Embedder, Llm, RerankedHit, Reranker,
    SparseEmbedder, SparseVector,
};

/// Hashes the input text into a `dims`-length unit vector. Has no semantic
/// meaning but is deterministic, dependency-free, and always available —
/// the embedder of last resort when no real provider is configured.
pub struct DeterministicEmbedder {
    dims: usize,
}

impl DeterministicEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }
}

#[async_trait]
impl Embedder for DeterministicEmbedder {
    async fn embed(&self, text: &str, _action: EmbedAction) -> PowerMemResult<Vec<f32>> {
        let mut vec = vec![0.0f32; self.dims];
        let hash = blake3::hash(text.as_bytes());
        let bytes = hash.as_bytes();
        for (i, slot) in vec.iter_mut().enumerate() {
            let byte = bytes[i % bytes.len()];
            *slot = (byte as f32 / 255.0) * 2.0 - 1.0;
        }
        let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vec {
                *v /= norm;
            }
        }
        Ok(vec)
    }

    fn dims(&self) -> usize {
        self.dims
    }

    fn name(&self) -> &'static str {
        "deterministic"
    }
}

/// Scripted LLM for tests: returns responses from a queue, one per `chat`
/// call, repeating the last entry once the queue is drained so callers that
/// make more calls than were scripted don't panic.
pub struct MockLlm {
    responses: std::sync::Mutex<std::collections::VecDeque<String>>,
    last: std::sync::Mutex<String>,
}

impl MockLlm {
    /// A mock that always returns the same response.
    pub fn new(canned_response: impl Into<String>) -> Self {
        Self::sequence(vec![canned_response.into()])
    }

    /// A mock that returns each response in order, one per call, then
    /// repeats the final one for any calls beyond the scripted sequence.
    pub fn sequence(responses: Vec<impl Into<String>>) -> Self {
        let queue: std::collections::VecDeque<String> = responses.into_iter().map(Into::into).collect();
        let last = queue.back().cloned().unwrap_or_default();
        Self {
            responses: std::sync::Mutex::new(queue),
            last: std::sync::Mutex::new(last),
        }
    }
}

#[async_trait]
impl Llm for MockLlm {
    async fn chat(&self, _messages: &[ChatMessage], _options: &ChatOptions) -> PowerMemResult<ChatResponse> {
        let mut queue = self.responses.lock().unwrap();
        let text = match queue.pop_front() {
            Some(next) => {
                *self.last.lock().unwrap() = next.clone();
                next
            }
            None => self.last.lock().unwrap().clone(),
        };
        Ok(ChatResponse { text })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Bag-of-words sparse vector: token → term frequency. No IDF weighting
/// (that requires a corpus); adequate for exercising the sparse channel in
/// tests without a real model.
pub struct BagOfWordsSparseEmbedder;

#[async_trait]
impl SparseEmbedder for BagOfWordsSparseEmbedder {
    async fn embed_sparse(&self, text: &str) -> PowerMemResult<SparseVector> {
        let mut sparse = SparseVector::new();
        for token in text.split_whitespace() {
            let token_id = (blake3::hash(token.to_lowercase().as_bytes()).as_bytes()[0..4]
                .iter()
                .fold(0i32, |acc, &b| (acc << 8) | b as i32))
            .abs();
            *sparse.entry(token_id).or_insert(0.0) += 1.0;
        }
        Ok(sparse)
    }

    fn name(&self) -> &'static str {
        "bag-of-words"
    }
}

/// Reranker that leaves ordering untouched but still returns well-formed
/// scores — useful as the disabled-by-default `reranker.enabled = false`
/// placeholder and for tests that want to assert "rerank was a no-op".
pub struct IdentityReranker;

#[async_trait]
impl Reranker for IdentityReranker {
    async fn rerank(
        &self,
        _query: &str,
        docs: &[String],
        top_n: Option<usize>,
    ) -> PowerMemResult<Vec<RerankedHit>> {
        let n = top_n.unwrap_or(docs.len()).min(docs.len());
        Ok((0..n)
            .map(|i| RerankedHit {
                doc_index: i,
                score: 1.0 - (i as f64 * 1e-6),
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "identity"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deterministic_embedder_is_stable() {
        let embedder = DeterministicEmbedder::new(16);
        let a = embedder.embed("hello", EmbedAction::Add).await.unwrap();
        let b = embedder.embed("hello", EmbedAction::Search).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[tokio::test]
    async fn deterministic_embedder_differs_by_content() {
        let embedder = DeterministicEmbedder::new(16);
        let a = embedder.embed("hello", EmbedAction::Add).await.unwrap();
        let b = embedder.embed("goodbye", EmbedAction::Add).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn sparse_embedder_counts_repeated_tokens() {
        let embedder = BagOfWordsSparseEmbedder;
        let sparse = embedder.embed_sparse("milk milk bread").await.unwrap();
        assert_eq!(sparse.values().copied().sum::<f32>(), 3.0);
    }
}
