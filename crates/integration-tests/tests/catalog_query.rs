//! Integration tests for the catalog query engine against a stub backend.
//!
//! These run on the single-threaded test runtime on purpose: a spawned
//! debounce timer cannot make progress between two synchronous calls, which
//! makes the coalescing behavior deterministic.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use lunetier_integration_tests::StubBackend;
use lunetier_storefront::catalog::{
    CatalogFilters, DebouncePolicy, FetchOutcome, FilterChange, Phase, QuerySession,
};
use lunetier_storefront::marketplace::{MarketplaceClient, SortKey, SortOrder};

fn fast_policy() -> DebouncePolicy {
    DebouncePolicy {
        search: Duration::from_millis(40),
        structured: Duration::from_millis(20),
    }
}

async fn session_against(stub: &StubBackend) -> QuerySession {
    let client = MarketplaceClient::with_base_url(stub.base_url());
    QuerySession::with_policy(client, fast_policy())
}

fn scheduled_generation(outcome: FetchOutcome) -> u64 {
    match outcome {
        FetchOutcome::Scheduled(generation) => generation,
        FetchOutcome::Skipped => panic!("expected a scheduled fetch, got a skip"),
    }
}

#[tokio::test]
async fn test_first_apply_fetches_and_mirrors_pagination() {
    let stub = StubBackend::spawn().await;
    let mut session = session_against(&stub).await;

    let generation = scheduled_generation(session.apply(CatalogFilters::default(), 1));
    let state = session.settled(generation).await;

    assert_eq!(state.phase, Phase::Ready);
    assert_eq!(state.montures.len(), 1);
    assert_eq!(state.pagination.total, 25);
    assert_eq!(state.pagination.total_pages, 3);
    assert_eq!(stub.list_hits(), 1);

    let query = stub.last_query();
    assert_eq!(query.get("page").map(String::as_str), Some("1"));
    assert_eq!(query.get("limit").map(String::as_str), Some("12"));
    assert!(!query.contains_key("marque"));
}

#[tokio::test]
async fn test_identical_parameters_trigger_no_new_fetch() {
    let stub = StubBackend::spawn().await;
    let mut session = session_against(&stub).await;

    let generation = scheduled_generation(session.update_filter(FilterChange::Sort(SortKey::Prix, SortOrder::Asc)));
    session.settled(generation).await;
    assert_eq!(stub.list_hits(), 1);

    // same sort value a second time: suppressed entirely
    let outcome = session.update_filter(FilterChange::Sort(SortKey::Prix, SortOrder::Asc));
    assert!(outcome.is_skipped());

    // a full re-apply of the identical state is suppressed too
    let mut filters = CatalogFilters::default();
    filters.apply(FilterChange::Sort(SortKey::Prix, SortOrder::Asc));
    assert!(session.apply(filters, 1).is_skipped());

    assert_eq!(stub.list_hits(), 1);
}

#[tokio::test]
async fn test_rapid_changes_coalesce_into_one_fetch_with_last_params() {
    let stub = StubBackend::spawn().await;
    let mut session = session_against(&stub).await;

    // change A then immediately change B, well inside the debounce window:
    // A's timer is replaced before it can fire
    session.update_filter(FilterChange::Marque(Some("Persol".to_owned())));
    let generation = scheduled_generation(session.update_filter(FilterChange::Marque(Some("Ray-Ban".to_owned()))));

    let state = session.settled(generation).await;

    assert_eq!(state.phase, Phase::Ready);
    assert_eq!(stub.list_hits(), 1);
    assert_eq!(
        stub.last_query().get("marque").map(String::as_str),
        Some("Ray-Ban")
    );
}

#[tokio::test]
async fn test_go_to_page_bypasses_debounce_and_skips_current_page() {
    let stub = StubBackend::spawn().await;
    let mut session = session_against(&stub).await;

    let generation = scheduled_generation(session.apply(CatalogFilters::default(), 1));
    session.settled(generation).await;
    assert_eq!(stub.list_hits(), 1);

    // navigating to the current page is a no-op
    assert!(session.go_to_page(1).is_skipped());
    assert_eq!(stub.list_hits(), 1);

    let generation = scheduled_generation(session.go_to_page(2));
    let state = session.settled(generation).await;

    assert_eq!(stub.list_hits(), 2);
    assert_eq!(stub.last_query().get("page").map(String::as_str), Some("2"));
    assert_eq!(state.pagination.page, 2);
}

#[tokio::test]
async fn test_reset_filters_fetches_defaults_again() {
    let stub = StubBackend::spawn().await;
    let mut session = session_against(&stub).await;

    let generation = scheduled_generation(session.apply(CatalogFilters::default(), 1));
    session.settled(generation).await;

    let generation = scheduled_generation(session.update_filter(FilterChange::Genre(Some("femme".to_owned()))));
    session.settled(generation).await;
    assert_eq!(stub.list_hits(), 2);

    // reset restores defaults AND clears the dedupe memory, so the fetch
    // runs even though its parameters match the very first one
    let generation = scheduled_generation(session.reset_filters());
    let state = session.settled(generation).await;

    assert_eq!(stub.list_hits(), 3);
    assert!(!stub.last_query().contains_key("genre"));
    assert_eq!(state.phase, Phase::Ready);
    assert!(session.filters().genre.is_none());
}

#[tokio::test]
async fn test_failure_surfaces_backend_message_and_keeps_list() {
    let stub = StubBackend::spawn().await;
    let mut session = session_against(&stub).await;

    let generation = scheduled_generation(session.apply(CatalogFilters::default(), 1));
    let state = session.settled(generation).await;
    assert_eq!(state.montures.len(), 1);

    stub.set_fail_list(true);
    let generation = scheduled_generation(session.update_filter(FilterChange::Forme(Some("ronde".to_owned()))));
    let state = session.settled(generation).await;

    assert_eq!(state.phase, Phase::Failed);
    assert_eq!(
        state.error.as_deref(),
        Some("Panne générale du catalogue")
    );
    // the previous list stays on screen
    assert_eq!(state.montures.len(), 1);
}

#[tokio::test]
async fn test_superseded_in_flight_request_is_cancelled() {
    let stub = StubBackend::spawn().await;
    stub.set_list_delay(Duration::from_millis(150));
    let mut session = session_against(&stub).await;

    // let A's fetch actually go out (debounce 20ms < 60ms wait)...
    session.update_filter(FilterChange::Marque(Some("Persol".to_owned())));
    tokio::time::sleep(Duration::from_millis(60)).await;

    // ...then supersede it while the server is still holding the response
    let generation = scheduled_generation(session.update_filter(FilterChange::Marque(Some("Ray-Ban".to_owned()))));
    let state = session.settled(generation).await;

    // latest query wins; the aborted request is not an error
    assert_eq!(state.phase, Phase::Ready);
    assert!(state.error.is_none());
    assert_eq!(state.generation, generation);
    assert_eq!(
        stub.last_query().get("marque").map(String::as_str),
        Some("Ray-Ban")
    );
}

#[tokio::test]
async fn test_one_shot_fetches_populate_facets_and_stats() {
    let stub = StubBackend::spawn().await;
    let session = session_against(&stub).await;

    let mut rx = session.subscribe();
    let loaded = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let state = rx.borrow_and_update();
                if state.facets.is_some() && state.stats.is_some() {
                    break state.clone();
                }
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("facets and stats should arrive");

    let facets = loaded.facets.unwrap();
    assert_eq!(facets.marques, vec!["Lafont", "Ray-Ban"]);
    assert_eq!(loaded.stats.unwrap().total_montures, 25);
}
