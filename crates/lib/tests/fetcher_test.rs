//! # Deduplicating Fetcher Tests

use rldwatch::errors::RetrievalError;
use rldwatch::fetcher::{DedupFetcher, DedupKeyMode, FetchDecision, LedgerKey, LedgerPolicy};
use rldwatch::retrieval::{HttpRetriever, RetryPolicy};
use rldwatch::types::{IngredientRecord, RldValue};
use rldwatch_test_utils::{setup_tracing, MockRetriever};
use std::time::Duration;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_same_raw_key_is_fetched_once() {
    // --- Arrange ---
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/PSG_12345.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pdf"))
        .expect(1)
        .mount(&server)
        .await;
    let retriever = HttpRetriever::new(Duration::from_secs(5), RetryPolicy::default()).unwrap();
    let dir = tempdir().unwrap();
    let url = format!("{}/PSG_12345.pdf", server.uri());
    let record = IngredientRecord::new(Some(&url), "12345 67890", Some("03/2024"));
    let mut fetcher = DedupFetcher::new(&retriever, LedgerPolicy::MarkOnAttempt, DedupKeyMode::Raw);

    // --- Act ---
    let first = fetcher.maybe_fetch(&record, dir.path()).await;
    let second = fetcher.maybe_fetch(&record, dir.path()).await;

    // --- Assert ---
    assert!(matches!(first, FetchDecision::Attempted(ref o) if o.is_saved()));
    assert!(matches!(second, FetchDecision::Skipped));
    assert!(fetcher.ledger().is_marked_raw(&RldValue::from("12345 67890")));
    assert_eq!(fetcher.ledger().len(), 1);
}

#[tokio::test]
async fn test_raw_keys_are_not_normalized() {
    setup_tracing();
    let retriever = MockRetriever::new();
    let dir = tempdir().unwrap();
    let mut fetcher = DedupFetcher::new(&retriever, LedgerPolicy::MarkOnAttempt, DedupKeyMode::Raw);
    let records = [
        IngredientRecord::new(Some("https://x.test/a.pdf"), "123 456", Some("03/2024")),
        IngredientRecord::new(Some("https://x.test/b.pdf"), "456 123", Some("03/2024")),
        IngredientRecord::new(Some("https://x.test/c.pdf"), 123, Some("03/2024")),
        IngredientRecord::new(Some("https://x.test/d.pdf"), "123", Some("03/2024")),
    ];

    for record in &records {
        fetcher.maybe_fetch(record, dir.path()).await;
    }

    assert_eq!(retriever.downloads().len(), 4);
    assert_eq!(fetcher.ledger().len(), 4);
}

#[tokio::test]
async fn test_token_keys_merge_reordered_cells() {
    setup_tracing();
    let retriever = MockRetriever::new();
    let dir = tempdir().unwrap();
    let mut fetcher =
        DedupFetcher::new(&retriever, LedgerPolicy::MarkOnAttempt, DedupKeyMode::Tokens);
    let first = IngredientRecord::new(Some("https://x.test/a.pdf"), "123 456", Some("03/2024"));
    let second = IngredientRecord::new(Some("https://x.test/b.pdf"), "456 123", Some("03/2024"));

    fetcher.maybe_fetch(&first, dir.path()).await;
    let decision = fetcher.maybe_fetch(&second, dir.path()).await;

    assert!(matches!(decision, FetchDecision::Skipped));
    assert_eq!(retriever.downloads(), vec!["https://x.test/a.pdf".to_string()]);
    assert!(fetcher
        .ledger()
        .is_marked(&LedgerKey::for_record(&second, DedupKeyMode::Tokens)));
}

#[tokio::test]
async fn test_failed_attempt_is_marked_by_default() {
    setup_tracing();
    let retriever = MockRetriever::new();
    retriever.fail_download("https://x.test/a.pdf");
    let dir = tempdir().unwrap();
    let mut fetcher = DedupFetcher::new(&retriever, LedgerPolicy::MarkOnAttempt, DedupKeyMode::Raw);
    let failing = IngredientRecord::new(Some("https://x.test/a.pdf"), 777, Some("03/2024"));
    let retry = IngredientRecord::new(Some("https://x.test/b.pdf"), 777, Some("03/2024"));

    let first = fetcher.maybe_fetch(&failing, dir.path()).await;
    let second = fetcher.maybe_fetch(&retry, dir.path()).await;

    assert!(matches!(first, FetchDecision::Attempted(ref o) if !o.is_saved()));
    assert!(matches!(second, FetchDecision::Skipped));
    assert_eq!(retriever.downloads().len(), 1);
}

#[tokio::test]
async fn test_mark_on_success_retries_a_failed_key() {
    setup_tracing();
    let retriever = MockRetriever::new();
    retriever.fail_download("https://x.test/a.pdf");
    let dir = tempdir().unwrap();
    let mut fetcher = DedupFetcher::new(&retriever, LedgerPolicy::MarkOnSuccess, DedupKeyMode::Raw);
    let failing = IngredientRecord::new(Some("https://x.test/a.pdf"), 777, Some("03/2024"));
    let retry = IngredientRecord::new(Some("https://x.test/b.pdf"), 777, Some("03/2024"));

    fetcher.maybe_fetch(&failing, dir.path()).await;
    assert!(!fetcher.ledger().is_marked_raw(&RldValue::Int(777)));
    let second = fetcher.maybe_fetch(&retry, dir.path()).await;

    assert!(matches!(second, FetchDecision::Attempted(ref o) if o.is_saved()));
    assert!(fetcher.ledger().is_marked_raw(&RldValue::Int(777)));
    assert!(dir.path().join("b.pdf").exists());
}

#[tokio::test]
async fn test_missing_url_fails_without_a_request() {
    setup_tracing();
    let retriever = MockRetriever::new();
    let dir = tempdir().unwrap();
    let mut fetcher = DedupFetcher::new(&retriever, LedgerPolicy::MarkOnAttempt, DedupKeyMode::Raw);
    let record = IngredientRecord::new(None, 555, Some("03/2024"));

    let decision = fetcher.maybe_fetch(&record, dir.path()).await;

    match decision {
        FetchDecision::Attempted(outcome) => {
            assert!(matches!(outcome.error(), Some(RetrievalError::MissingUrl)));
        }
        FetchDecision::Skipped => panic!("first sighting must be attempted"),
    }
    assert!(retriever.downloads().is_empty());
    assert!(fetcher.ledger().is_marked_raw(&RldValue::Int(555)));
}
