//! Full-pipeline tests for `LibrarianService`.
//!
//! Every external collaborator (embedder, vector index, title chooser) is
//! replaced with an in-process fake, so these cover validation, retrieval,
//! selection, and response assembly end to end without any network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use smart_librarian_api::models::BookRecord;
use smart_librarian_api::services::{
    CatalogStore, Embedder, InputValidator, LibrarianService, Retriever, ScoredEntry, Selector,
    TitleChooser, VectorIndex,
};
use smart_librarian_api::{ApiError, Result};

struct CountingEmbedder {
    calls: AtomicUsize,
}

impl CountingEmbedder {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for CountingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![0.1, 0.2, 0.3])
    }
}

struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(ApiError::ExternalService("embedding backend down".into()))
    }
}

struct StubIndex {
    entries: Vec<ScoredEntry>,
}

#[async_trait]
impl VectorIndex for StubIndex {
    async fn query(&self, _vector: &[f32], k: usize) -> Result<Vec<ScoredEntry>> {
        Ok(self.entries.iter().take(k).cloned().collect())
    }
}

struct ScriptedChooser {
    reply: String,
}

#[async_trait]
impl TitleChooser for ScriptedChooser {
    async fn choose(&self, _query: &str, _titles: &[String], _best_distance: f32) -> Result<String> {
        Ok(self.reply.clone())
    }
}

fn entry(id: &str, distance: f32) -> ScoredEntry {
    ScoredEntry {
        id: id.to_string(),
        document: format!("{} short", id),
        metadata: serde_json::json!({ "title": id, "full": format!("{} full", id) }),
        distance,
    }
}

fn catalog() -> CatalogStore {
    CatalogStore::from_records(vec![
        BookRecord {
            title: "The Hobbit".to_string(),
            short: "fantasy adventure".to_string(),
            full: "Bilbo goes there and back again.".to_string(),
        },
        BookRecord {
            title: "1984".to_string(),
            short: "dystopian surveillance".to_string(),
            full: "Winston rebels against the Party.".to_string(),
        },
    ])
}

fn librarian_with(
    embedder: Arc<dyn Embedder>,
    entries: Vec<ScoredEntry>,
    reply: &str,
) -> LibrarianService {
    let retriever = Retriever::new(embedder, Arc::new(StubIndex { entries }));
    let selector = Selector::new(
        Arc::new(ScriptedChooser {
            reply: reply.to_string(),
        }),
        0.75,
        3,
    );
    LibrarianService::new(
        InputValidator::new(vec!["idiot".to_string(), "stupid".to_string()]),
        retriever,
        selector,
        catalog(),
        6,
    )
}

fn librarian(entries: Vec<ScoredEntry>, reply: &str) -> LibrarianService {
    librarian_with(CountingEmbedder::new(), entries, reply)
}

fn shelf() -> Vec<ScoredEntry> {
    vec![
        entry("The Hobbit", 0.31),
        entry("1984", 0.52),
        entry("Dune", 0.64),
    ]
}

#[tokio::test]
async fn test_happy_path_returns_title_reason_and_summary() {
    let service = librarian(shelf(), "The Hobbit");

    let rec = service
        .recommend("a cozy adventure about dragons and loyalty")
        .await
        .unwrap();

    assert_eq!(rec.title, "The Hobbit");
    assert_eq!(
        rec.reason,
        "Selected based on theme similarity to your request: \"a cozy adventure about dragons and loyalty\"."
    );
    assert_eq!(rec.summary, "Bilbo goes there and back again.");
}

#[tokio::test]
async fn test_surrounding_whitespace_is_ignored() {
    let service = librarian(shelf(), "The Hobbit");

    let rec = service.recommend("  dragons and treasure  ").await.unwrap();
    assert_eq!(
        rec.reason,
        "Selected based on theme similarity to your request: \"dragons and treasure\"."
    );
}

#[tokio::test]
async fn test_blank_input_is_rejected() {
    let service = librarian(shelf(), "The Hobbit");
    let err = service.recommend("   ").await.unwrap_err();
    assert!(matches!(err, ApiError::EmptyInput));
}

#[tokio::test]
async fn test_invalid_input_never_reaches_the_embedder() {
    let embedder = CountingEmbedder::new();
    let service = librarian_with(embedder.clone(), shelf(), "The Hobbit");

    assert!(matches!(
        service.recommend("a stupid book").await.unwrap_err(),
        ApiError::InappropriateInput
    ));
    assert!(matches!(
        service.recommend("asdfghjkl").await.unwrap_err(),
        ApiError::GibberishInput
    ));
    assert_eq!(embedder.call_count(), 0);
}

#[tokio::test]
async fn test_empty_index_yields_no_candidates() {
    let service = librarian(vec![], "The Hobbit");
    let err = service
        .recommend("dark fantasy about loyalty")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NoCandidates));
}

#[tokio::test]
async fn test_short_query_with_far_match_abstains() {
    let service = librarian(vec![entry("The Hobbit", 0.9)], "The Hobbit");
    let err = service.recommend("cat").await.unwrap_err();
    assert!(matches!(err, ApiError::NoCloseMatch));
}

#[tokio::test]
async fn test_chooser_abstention_on_a_real_query_still_recommends() {
    // The query has substance, so the chooser runs; when it abstains the
    // closest candidate is used anyway.
    let service = librarian(shelf(), "ABSTAIN");
    let rec = service
        .recommend("obscure midnight poetry anthology")
        .await
        .unwrap();
    assert_eq!(rec.title, "The Hobbit");
}

#[tokio::test]
async fn test_backend_outage_is_not_a_rejection() {
    let service = librarian_with(Arc::new(FailingEmbedder), shelf(), "The Hobbit");
    let err = service
        .recommend("dark fantasy about loyalty")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ExternalService(_)));
}

#[tokio::test]
async fn test_title_missing_from_catalog_gets_fixed_summary() {
    // "Dune" is indexed but has no catalog record.
    let service = librarian(shelf(), "Dune");
    let rec = service
        .recommend("desert politics and prophecy")
        .await
        .unwrap();

    assert_eq!(rec.title, "Dune");
    assert_eq!(rec.summary, "I couldn't find a summary for \"Dune\".");
}

#[tokio::test]
async fn test_same_request_is_answered_identically() {
    let service = librarian(shelf(), "The Hobbit");

    let first = service.recommend("dragons and treasure").await.unwrap();
    let second = service.recommend("dragons and treasure").await.unwrap();

    assert_eq!(first.title, second.title);
    assert_eq!(first.reason, second.reason);
    assert_eq!(first.summary, second.summary);
}
