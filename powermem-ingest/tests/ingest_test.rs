use std::sync::Arc;

use powermem_core::config::{IngestConfig, RetentionConfig};
use powermem_core::errors::{IngestError, PowerMemError};
use powermem_core::memory::{MemoryId, ScopeKeys, SnowflakeGenerator};
use powermem_core::traits::{Embedder, Llm, VectorStore};
use powermem_ingest::{EventKind, IngestEngine, IngestRequest, MessageInput};
use powermem_providers::{DeterministicEmbedder, MockLlm};
use powermem_router::Router;
use powermem_storage::InMemoryStore;

fn engine(llm: impl Llm + 'static, config: IngestConfig, store: Arc<InMemoryStore>) -> IngestEngine {
    let embedder: Arc<dyn Embedder> = Arc::new(DeterministicEmbedder::new(16));
    let router = Arc::new(Router::new(store, Vec::new()));
    IngestEngine::new(
        router,
        embedder,
        None,
        Arc::new(llm),
        Arc::new(SnowflakeGenerator::new(1)),
        RetentionConfig::default(),
        config,
    )
}

fn pass_through_config() -> IngestConfig {
    IngestConfig {
        intelligent_mode: false,
        ..IngestConfig::default()
    }
}

#[tokio::test]
async fn pass_through_add_inserts_a_single_record() {
    let store = Arc::new(InMemoryStore::new());
    let engine = engine(MockLlm::new("unused"), pass_through_config(), store.clone());

    let response = engine
        .add(IngestRequest {
            messages: MessageInput::from("buy milk"),
            scope_keys: ScopeKeys {
                user_id: Some("u1".to_string()),
                ..Default::default()
            },
            metadata: Default::default(),
            infer: false,
            prompt_override: None,
        })
        .await
        .unwrap();

    assert_eq!(response.events.len(), 1);
    assert_eq!(response.events[0].event, EventKind::Add);
    assert_eq!(response.events[0].content, "buy milk");
    assert!(response.failures.is_empty());
    assert_eq!(store.count(None).await.unwrap(), 1);
}

#[tokio::test]
async fn pass_through_add_is_deduped_by_exact_content_hash() {
    let store = Arc::new(InMemoryStore::new());
    let engine = engine(MockLlm::new("unused"), pass_through_config(), store.clone());

    let scope = ScopeKeys {
        user_id: Some("u1".to_string()),
        ..Default::default()
    };

    let first = engine
        .add(IngestRequest {
            messages: MessageInput::from("buy milk"),
            scope_keys: scope.clone(),
            metadata: Default::default(),
            infer: false,
            prompt_override: None,
        })
        .await
        .unwrap();
    assert_eq!(first.events[0].event, EventKind::Add);

    let second = engine
        .add(IngestRequest {
            messages: MessageInput::from("  Buy   MILK  "),
            scope_keys: scope,
            metadata: Default::default(),
            infer: false,
            prompt_override: None,
        })
        .await
        .unwrap();

    assert_eq!(second.events.len(), 1);
    assert_eq!(second.events[0].event, EventKind::None);
    assert_eq!(second.events[0].id, first.events[0].id);
    assert_eq!(store.count(None).await.unwrap(), 1);
}

#[tokio::test]
async fn empty_content_is_rejected() {
    let store = Arc::new(InMemoryStore::new());
    let engine = engine(MockLlm::new("unused"), pass_through_config(), store);

    let err = engine
        .add(IngestRequest {
            messages: MessageInput::from("   "),
            scope_keys: ScopeKeys::default(),
            metadata: Default::default(),
            infer: false,
            prompt_override: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, PowerMemError::Ingest(IngestError::EmptyContent)));
}

#[tokio::test]
async fn intelligent_add_with_no_prior_hits_inserts_extracted_facts() {
    let store = Arc::new(InMemoryStore::new());
    let llm = MockLlm::new(r#"{"facts":[{"content":"likes coffee","importance_score":0.8}]}"#);
    let engine = engine(llm, IngestConfig::default(), store.clone());

    let response = engine
        .add(IngestRequest {
            messages: MessageInput::from("I really like coffee in the morning"),
            scope_keys: ScopeKeys {
                user_id: Some("u1".to_string()),
                ..Default::default()
            },
            metadata: Default::default(),
            infer: true,
            prompt_override: None,
        })
        .await
        .unwrap();

    assert_eq!(response.events.len(), 1);
    assert_eq!(response.events[0].event, EventKind::Add);
    assert_eq!(response.events[0].content, "likes coffee");
    assert_eq!(store.count(None).await.unwrap(), 1);
}

#[tokio::test]
async fn intelligent_update_rewrites_the_existing_record() {
    let store = Arc::new(InMemoryStore::new());
    let scope = ScopeKeys {
        user_id: Some("u1".to_string()),
        ..Default::default()
    };

    // Seed an existing memory via pass-through so we know its id.
    let seed_engine = engine(MockLlm::new("unused"), pass_through_config(), store.clone());
    let seeded = seed_engine
        .add(IngestRequest {
            messages: MessageInput::from("lives in Oslo"),
            scope_keys: scope.clone(),
            metadata: Default::default(),
            infer: false,
            prompt_override: None,
        })
        .await
        .unwrap();
    let existing_id = seeded.events[0].id;

    let llm = MockLlm::sequence(vec![
        r#"{"facts":[{"content":"now lives in Bergen","importance_score":0.7}]}"#.to_string(),
        format!(r#"{{"action":"update","existing_id":{},"new_text":"now lives in Bergen"}}"#, existing_id.get()),
    ]);
    let engine = engine(llm, IngestConfig::default(), store.clone());

    let response = engine
        .add(IngestRequest {
            messages: MessageInput::from("I moved to Bergen"),
            scope_keys: scope,
            metadata: Default::default(),
            infer: true,
            prompt_override: None,
        })
        .await
        .unwrap();

    assert_eq!(response.events.len(), 1);
    assert_eq!(response.events[0].event, EventKind::Update);
    assert_eq!(response.events[0].id, existing_id);
    assert_eq!(response.events[0].previous_memory.as_deref(), Some("lives in Oslo"));
    assert_eq!(store.count(None).await.unwrap(), 1);

    let updated = store.get(existing_id).await.unwrap().unwrap();
    assert_eq!(
        updated.payload.get("content").and_then(|v| v.as_str()),
        Some("now lives in Bergen")
    );
}

#[tokio::test]
async fn intelligent_delete_removes_the_existing_record() {
    let store = Arc::new(InMemoryStore::new());
    let scope = ScopeKeys {
        user_id: Some("u1".to_string()),
        ..Default::default()
    };

    let seed_engine = engine(MockLlm::new("unused"), pass_through_config(), store.clone());
    let seeded = seed_engine
        .add(IngestRequest {
            messages: MessageInput::from("owns a car"),
            scope_keys: scope.clone(),
            metadata: Default::default(),
            infer: false,
            prompt_override: None,
        })
        .await
        .unwrap();
    let existing_id = seeded.events[0].id;

    let llm = MockLlm::sequence(vec![
        r#"{"facts":[{"content":"sold the car","importance_score":0.6}]}"#.to_string(),
        format!(r#"{{"action":"delete","existing_id":{}}}"#, existing_id.get()),
    ]);
    let engine = engine(llm, IngestConfig::default(), store.clone());

    let response = engine
        .add(IngestRequest {
            messages: MessageInput::from("I sold my car"),
            scope_keys: scope,
            metadata: Default::default(),
            infer: true,
            prompt_override: None,
        })
        .await
        .unwrap();

    assert_eq!(response.events.len(), 1);
    assert_eq!(response.events[0].event, EventKind::Delete);
    assert_eq!(response.events[0].id, existing_id);
    assert_eq!(store.count(None).await.unwrap(), 0);
}

#[tokio::test]
async fn intelligent_none_decision_leaves_the_store_untouched() {
    let store = Arc::new(InMemoryStore::new());
    let scope = ScopeKeys {
        user_id: Some("u1".to_string()),
        ..Default::default()
    };

    let seed_engine = engine(MockLlm::new("unused"), pass_through_config(), store.clone());
    seed_engine
        .add(IngestRequest {
            messages: MessageInput::from("likes tea"),
            scope_keys: scope.clone(),
            metadata: Default::default(),
            infer: false,
            prompt_override: None,
        })
        .await
        .unwrap();

    let llm = MockLlm::sequence(vec![
        r#"{"facts":[{"content":"likes tea","importance_score":0.5}]}"#.to_string(),
        r#"{"action":"none"}"#.to_string(),
    ]);
    let engine = engine(llm, IngestConfig::default(), store.clone());

    let response = engine
        .add(IngestRequest {
            messages: MessageInput::from("I like tea"),
            scope_keys: scope,
            metadata: Default::default(),
            infer: true,
            prompt_override: None,
        })
        .await
        .unwrap();

    assert_eq!(response.events.len(), 1);
    assert_eq!(response.events[0].event, EventKind::None);
    assert_eq!(store.count(None).await.unwrap(), 1);
}

#[tokio::test]
async fn malformed_extraction_response_surfaces_a_typed_error() {
    let store = Arc::new(InMemoryStore::new());
    let llm = MockLlm::new("not json at all");
    let engine = engine(llm, IngestConfig::default(), store);

    let err = engine
        .add(IngestRequest {
            messages: MessageInput::from("anything"),
            scope_keys: ScopeKeys::default(),
            metadata: Default::default(),
            infer: true,
            prompt_override: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PowerMemError::Ingest(IngestError::MalformedExtraction(_))
    ));
}

#[allow(dead_code)]
fn assert_memory_id_usable(id: MemoryId) -> i64 {
    id.get()
}
