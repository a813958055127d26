// Integration tests for the query resolver
//
// Tests cover:
// - Memo correctness across case variants
// - Restart recovery from the JSON memory file
// - Bounded FIFO eviction
// - Single-flight resolution of concurrent identical queries
// - Persistence failure reporting

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use synapse::config::config::AppConfig;
use synapse::error::{AppError, Result};
use synapse::inference::{IntentClassifier, VectorEncoder};
use synapse::models::intent::{Intent, IntentSet};
use synapse::models::memory::MemoryRecord;
use synapse::models::model_document::ModelDocument;
use synapse::models::network::{Activation, Layer, Network};
use synapse::models::vocabulary::Vocabulary;
use synapse::observability::AppMetrics;
use synapse::services::{
    AnswerSource, ExternalResolver, MemoizationStore, Resolver, ResolverOptions,
};
use synapse::storage::{InMemoryRepository, JsonFileRepository, MemoryRepository};
use tempfile::TempDir;

/// Counts calls and answers slowly so concurrent requests overlap
struct SlowSearch {
    calls: AtomicUsize,
}

#[async_trait]
impl ExternalResolver for SlowSearch {
    async fn search(&self, query: &str) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(Some(format!("searched: {}", query.to_lowercase())))
    }
}

struct ReadOnlyDisk;

#[async_trait]
impl MemoryRepository for ReadOnlyDisk {
    async fn load(&self) -> Result<Vec<MemoryRecord>> {
        Ok(Vec::new())
    }

    async fn save(&self, _records: &[MemoryRecord]) -> Result<()> {
        Err(AppError::persistence("read-only file system"))
    }
}

fn classifier() -> Arc<IntentClassifier> {
    let vocabulary = Vocabulary::new(vec!["hello".into(), "bye".into()]).unwrap();
    let intents = IntentSet::new(vec![
        Intent::new("greeting", vec!["Hi!".into()]).unwrap(),
        Intent::new("goodbye", vec!["See you!".into()]).unwrap(),
    ])
    .unwrap();
    let layer = Layer::from_rows(
        vec![vec![5.0, 0.0], vec![0.0, 5.0]],
        vec![0.0, 0.0],
        Activation::Exp,
    )
    .unwrap();
    let network = Network::new(vec![layer]).unwrap();
    Arc::new(IntentClassifier::new(VectorEncoder::new(vocabulary), network, intents, 0.7).unwrap())
}

fn options() -> ResolverOptions {
    ResolverOptions {
        fallback_message: "not understood".into(),
        not_found_message: "no answer found".into(),
        max_concurrent_inferences: 2,
    }
}

async fn resolver(
    repository: Arc<dyn MemoryRepository>,
    capacity: Option<usize>,
    external: Option<Arc<dyn ExternalResolver>>,
) -> Resolver {
    let memory = Arc::new(MemoizationStore::open(repository, capacity).await.unwrap());
    Resolver::new(
        classifier(),
        memory,
        external,
        Arc::new(AppMetrics::default()),
        options(),
    )
}

#[tokio::test]
async fn test_repeat_query_is_a_memory_hit() {
    let repository = Arc::new(InMemoryRepository::new());
    let resolver = resolver(repository.clone(), None, None).await;

    let first = resolver.resolve("Hello").await.unwrap();
    let second = resolver.resolve("hELLO").await.unwrap();

    assert_eq!(first.source, AnswerSource::Model);
    assert_eq!(second.source, AnswerSource::Memory);
    assert_eq!(first.answer, second.answer);
    assert_eq!(repository.saved().await, vec![MemoryRecord::new("hello", "Hi!")]);
}

#[tokio::test]
async fn test_memory_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("memory.json");

    {
        let resolver = resolver(Arc::new(JsonFileRepository::new(&path)), None, None).await;
        resolver.resolve("Bye now").await.unwrap();
        resolver.resolve("who are you").await.unwrap();
    }

    let restarted = resolver(Arc::new(JsonFileRepository::new(&path)), None, None).await;
    let resolution = restarted.resolve("BYE NOW").await.unwrap();
    assert_eq!(resolution.source, AnswerSource::Memory);
    assert_eq!(resolution.answer, "See you!");

    let snapshot = restarted.memory().snapshot().await;
    assert_eq!(
        snapshot,
        vec![
            MemoryRecord::new("bye now", "See you!"),
            MemoryRecord::new("who are you", "not understood"),
        ]
    );
}

#[tokio::test]
async fn test_bounded_store_evicts_oldest_first() {
    let resolver = resolver(Arc::new(InMemoryRepository::new()), Some(2), None).await;

    for query in ["one", "two", "three"] {
        resolver.resolve(query).await.unwrap();
    }

    let memory = resolver.memory();
    assert_eq!(memory.len().await, 2);
    assert!(memory.lookup("one").await.is_none());
    assert!(memory.lookup("two").await.is_some());
    assert!(memory.lookup("three").await.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_identical_queries_resolve_once() {
    let search = Arc::new(SlowSearch {
        calls: AtomicUsize::new(0),
    });
    let repository = Arc::new(InMemoryRepository::new());
    let resolver = Arc::new(
        resolver(
            repository.clone(),
            None,
            Some(search.clone() as Arc<dyn ExternalResolver>),
        )
        .await,
    );

    let handles: Vec<_> = ["Capital of Peru", "capital of peru", "CAPITAL OF PERU", "Capital Of Peru"]
        .into_iter()
        .map(|query| {
            let resolver = resolver.clone();
            tokio::spawn(async move { resolver.resolve(query).await })
        })
        .collect();

    let mut answers = Vec::new();
    for handle in handles {
        answers.push(handle.await.unwrap().unwrap().answer);
    }

    assert_eq!(search.calls.load(Ordering::SeqCst), 1);
    assert!(answers.iter().all(|a| a == "searched: capital of peru"));
    assert_eq!(repository.saved().await.len(), 1);
}

#[tokio::test]
async fn test_persistence_failure_reports_answer_and_keeps_index() {
    let resolver = resolver(Arc::new(ReadOnlyDisk), None, None).await;

    let error = resolver.resolve("hello").await.unwrap_err();
    match error {
        AppError::Persistence { answer, .. } => assert_eq!(answer.as_deref(), Some("Hi!")),
        other => panic!("expected persistence error, got {:?}", other),
    }
    assert!(resolver.memory().is_empty().await);
}

#[tokio::test]
async fn test_empty_query_is_rejected() {
    let repository = Arc::new(InMemoryRepository::new());
    let resolver = resolver(repository.clone(), None, None).await;

    assert!(matches!(
        resolver.resolve("").await,
        Err(AppError::Validation(_))
    ));
    assert!(repository.saved().await.is_empty());
}

#[tokio::test]
async fn test_builtin_model_serves_with_random_weights() {
    let mut config = AppConfig::development().model;
    config.hidden_sizes = vec![16, 16];
    config.seed = Some(7);

    let document = ModelDocument::builtin().unwrap();
    let classifier = IntentClassifier::from_document(&document, &config).unwrap();
    let memory = Arc::new(
        MemoizationStore::open(Arc::new(InMemoryRepository::new()), None)
            .await
            .unwrap(),
    );
    let resolver = Resolver::new(
        Arc::new(classifier),
        memory,
        None,
        Arc::new(AppMetrics::default()),
        options(),
    );

    let first = resolver.resolve("hello, how are you?").await.unwrap();
    let second = resolver.resolve("Hello, how are you?").await.unwrap();
    assert_ne!(first.source, AnswerSource::Memory);
    assert_eq!(second.source, AnswerSource::Memory);
    assert_eq!(first.answer, second.answer);
}
