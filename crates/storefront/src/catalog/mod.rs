//! Catalog query engine.
//!
//! Translates declarative filter/sort/page state into paginated requests
//! against the catalog list endpoint, with debouncing, single-flight
//! cancellation, and duplicate-fetch suppression. One [`QuerySession`]
//! exists per visitor; consumers observe it through a `watch` channel.
//!
//! # State machine
//!
//! ```text
//! Idle ──filter change──▶ Debouncing ──timer──▶ Loading ──▶ Ready
//!                              │                   │          │
//!                              │ superseding       │          └──▶ Failed
//!                              ▼ change            ▼
//!                         (timer replaced)   (request aborted)
//! ```
//!
//! Supersession is tracked by a monotonically increasing generation counter:
//! every scheduled fetch takes a generation, and a response whose generation
//! has been overtaken is discarded. Aborting a superseded task drops its
//! HTTP future mid-flight; cancellation is not an error and produces no
//! state transition.

mod filters;

pub use filters::{CatalogFilters, DebouncePolicy, FilterChange};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::marketplace::{
    FilterOptions, ListParams, MarketplaceClient, MarketplaceStats, Monture, Pagination,
};

/// Where a query session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// A filter changed; the debounce timer is running.
    Debouncing,
    /// A request is in flight.
    Loading,
    /// Last fetch succeeded.
    Ready,
    /// Last fetch failed; the previous list is kept on screen.
    Failed,
}

/// Observable snapshot of a query session.
#[derive(Debug, Clone, Default)]
pub struct CatalogState {
    pub phase: Phase,
    pub montures: Vec<Monture>,
    pub pagination: Pagination,
    /// Readable message for the UI when `phase == Failed`.
    pub error: Option<String>,
    /// Filter facets, populated once by the mount-time fetch.
    pub facets: Option<FilterOptions>,
    /// Marketplace stats, populated once by the mount-time fetch.
    pub stats: Option<MarketplaceStats>,
    /// Generation of the fetch that last touched this state.
    pub generation: u64,
}

/// What became of a requested fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A fetch was scheduled under this generation; await it with
    /// [`QuerySession::settled`].
    Scheduled(u64),
    /// The fetch was suppressed: parameters identical to the previous fetch,
    /// or navigation to the current page.
    Skipped,
}

impl FetchOutcome {
    #[must_use]
    pub const fn is_skipped(self) -> bool {
        matches!(self, Self::Skipped)
    }
}

struct Shared {
    client: MarketplaceClient,
    generation: AtomicU64,
    /// Parameters of the most recently dispatched fetch - the dedupe memory.
    last_params: std::sync::Mutex<Option<ListParams>>,
    tx: watch::Sender<CatalogState>,
}

impl Shared {
    fn last_params(&self) -> std::sync::MutexGuard<'_, Option<ListParams>> {
        self.last_params
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Dispatch one fetch. Runs inside the debounce task, after the timer.
    async fn fetch(&self, generation: u64, params: ListParams) {
        if !self.is_current(generation) {
            return;
        }

        *self.last_params() = Some(params.clone());
        self.tx.send_modify(|state| {
            state.phase = Phase::Loading;
            state.generation = generation;
        });

        match self.client.list_montures(&params).await {
            Ok(page) => {
                if self.is_current(generation) {
                    self.tx.send_modify(|state| {
                        state.phase = Phase::Ready;
                        state.montures = page.montures;
                        state.pagination = page.pagination;
                        state.error = None;
                        state.generation = generation;
                    });
                }
            }
            Err(err) => {
                if self.is_current(generation) {
                    tracing::warn!(error = %err, "catalog fetch failed");
                    self.tx.send_modify(|state| {
                        // keep the previous list on screen
                        state.phase = Phase::Failed;
                        state.error = Some(err.user_message());
                        state.generation = generation;
                    });
                }
            }
        }
    }
}

/// One visitor's catalog query session.
///
/// Owns the filter and page state, schedules fetches, and feeds results to
/// subscribers. Dropping the session aborts its timer and any in-flight or
/// auxiliary request.
pub struct QuerySession {
    shared: Arc<Shared>,
    rx: watch::Receiver<CatalogState>,
    filters: CatalogFilters,
    page: u32,
    policy: DebouncePolicy,
    debounce: Option<JoinHandle<()>>,
    aux: Vec<JoinHandle<()>>,
}

impl QuerySession {
    /// Create a session with the default debounce policy.
    #[must_use]
    pub fn new(client: MarketplaceClient) -> Self {
        Self::with_policy(client, DebouncePolicy::default())
    }

    /// Create a session with an explicit debounce policy (tests use short
    /// delays).
    #[must_use]
    pub fn with_policy(client: MarketplaceClient, policy: DebouncePolicy) -> Self {
        let (tx, rx) = watch::channel(CatalogState::default());
        let shared = Arc::new(Shared {
            client,
            generation: AtomicU64::new(0),
            last_params: std::sync::Mutex::new(None),
            tx,
        });

        // Mount-time one-shot fetches: facets and stats load concurrently,
        // independently of the filter lifecycle. Failures are logged only.
        let facets_task = tokio::spawn({
            let shared = Arc::clone(&shared);
            async move {
                match shared.client.filter_options().await {
                    Ok(facets) => shared.tx.send_modify(|state| state.facets = Some(facets)),
                    Err(err) => tracing::warn!(error = %err, "failed to load filter facets"),
                }
            }
        });
        let stats_task = tokio::spawn({
            let shared = Arc::clone(&shared);
            async move {
                match shared.client.stats().await {
                    Ok(stats) => shared.tx.send_modify(|state| state.stats = Some(stats)),
                    Err(err) => tracing::warn!(error = %err, "failed to load marketplace stats"),
                }
            }
        });

        Self {
            shared,
            rx,
            filters: CatalogFilters::default(),
            page: 1,
            policy,
            debounce: None,
            aux: vec![facets_task, stats_task],
        }
    }

    /// Current filter state.
    #[must_use]
    pub const fn filters(&self) -> &CatalogFilters {
        &self.filters
    }

    /// Current page pointer.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Latest observable state.
    #[must_use]
    pub fn snapshot(&self) -> CatalogState {
        self.rx.borrow().clone()
    }

    /// Subscribe to state updates.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CatalogState> {
        self.rx.clone()
    }

    /// Apply one filter-field update and schedule a debounced fetch.
    ///
    /// The delay comes from the policy table for the changed field. Filter
    /// changes reset the page pointer to 1.
    #[instrument(skip(self))]
    pub fn update_filter(&mut self, change: FilterChange) -> FetchOutcome {
        let delay = self.policy.delay_for(&change);
        self.filters.apply(change);
        self.page = 1;
        self.schedule(delay)
    }

    /// Navigate to a page, bypassing the debounce entirely.
    ///
    /// Still subject to dedupe and single-flight; navigating to the current
    /// page is a no-op.
    #[instrument(skip(self))]
    pub fn go_to_page(&mut self, page: u32) -> FetchOutcome {
        if page == self.page {
            return FetchOutcome::Skipped;
        }
        self.page = page;
        self.schedule(Duration::ZERO)
    }

    /// Restore all filters to their defaults and schedule a fetch.
    ///
    /// Clears the dedupe memory so the resulting fetch is never skipped,
    /// even if it matches a much earlier one.
    #[instrument(skip(self))]
    pub fn reset_filters(&mut self) -> FetchOutcome {
        self.filters = CatalogFilters::default();
        self.page = 1;
        *self.shared.last_params() = None;
        self.schedule(self.policy.structured)
    }

    /// Reconcile against a complete target state, as submitted by a catalog
    /// page request: same filters + same page collapses to a deduped fetch,
    /// a page move bypasses the debounce, a filter change debounces with the
    /// search delay only when the search text changed.
    pub fn apply(&mut self, filters: CatalogFilters, page: u32) -> FetchOutcome {
        if filters == self.filters {
            if page == self.page {
                // first render of a fresh session still needs a fetch;
                // afterwards dedupe makes this a no-op
                return self.schedule(Duration::ZERO);
            }
            return self.go_to_page(page);
        }

        let delay = if filters.search == self.filters.search {
            self.policy.structured
        } else {
            self.policy.search
        };
        self.filters = filters;
        self.page = 1;
        self.schedule(delay)
    }

    /// Wait until the fetch scheduled under `generation` (or any later one)
    /// settles, and return that state.
    ///
    /// Callers must not await a [`FetchOutcome::Skipped`] request - nothing
    /// will ever be emitted for it.
    pub async fn settled(&self, generation: u64) -> CatalogState {
        let mut rx = self.rx.clone();
        loop {
            {
                let state = rx.borrow_and_update();
                if state.generation >= generation
                    && matches!(state.phase, Phase::Ready | Phase::Failed)
                {
                    return state.clone();
                }
            }
            if rx.changed().await.is_err() {
                return self.rx.borrow().clone();
            }
        }
    }

    /// Schedule a fetch for the current filters and page.
    ///
    /// Dedupe first: identical resolved parameters to the previous fetch are
    /// skipped outright. Otherwise the previous timer (and with it any
    /// in-flight request) is aborted - only the most recent timer survives.
    fn schedule(&mut self, delay: Duration) -> FetchOutcome {
        let params = self.filters.resolve(self.page);
        if self.shared.last_params().as_ref() == Some(&params) {
            return FetchOutcome::Skipped;
        }

        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(timer) = self.debounce.take() {
            timer.abort();
        }

        self.shared.tx.send_modify(|state| {
            state.phase = if delay.is_zero() {
                Phase::Loading
            } else {
                Phase::Debouncing
            };
        });

        let shared = Arc::clone(&self.shared);
        self.debounce = Some(tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            shared.fetch(generation, params).await;
        }));

        FetchOutcome::Scheduled(generation)
    }
}

impl Drop for QuerySession {
    fn drop(&mut self) {
        // component teardown: abandon the timer, any in-flight request, and
        // the one-shot fetches
        if let Some(timer) = self.debounce.take() {
            timer.abort();
        }
        for task in self.aux.drain(..) {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // An address nothing listens on: aux fetches fail fast and get logged,
    // which is exactly the non-critical path we want out of the way here.
    // Network behavior is covered by the integration-tests crate.
    fn dead_client() -> MarketplaceClient {
        MarketplaceClient::with_base_url("http://127.0.0.1:9".to_owned())
    }

    fn fast_policy() -> DebouncePolicy {
        DebouncePolicy {
            search: Duration::from_millis(20),
            structured: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn test_initial_state_is_idle() {
        let session = QuerySession::with_policy(dead_client(), fast_policy());
        let state = session.snapshot();
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.montures.is_empty());
        assert_eq!(state.generation, 0);
    }

    #[tokio::test]
    async fn test_go_to_current_page_is_a_noop() {
        let mut session = QuerySession::with_policy(dead_client(), fast_policy());
        assert_eq!(session.page(), 1);
        assert!(session.go_to_page(1).is_skipped());
        // no state transition either
        assert_eq!(session.snapshot().phase, Phase::Idle);
    }

    #[tokio::test]
    async fn test_filter_change_enters_debouncing() {
        let mut session = QuerySession::with_policy(dead_client(), fast_policy());
        let outcome = session.update_filter(FilterChange::Marque(Some("Lafont".to_owned())));
        assert!(matches!(outcome, FetchOutcome::Scheduled(1)));
        assert_eq!(session.snapshot().phase, Phase::Debouncing);
    }

    #[tokio::test]
    async fn test_failed_fetch_surfaces_error_and_keeps_list() {
        let mut session = QuerySession::with_policy(dead_client(), fast_policy());
        let FetchOutcome::Scheduled(generation) =
            session.update_filter(FilterChange::Marque(Some("Lafont".to_owned())))
        else {
            panic!("expected a scheduled fetch");
        };

        let state = session.settled(generation).await;
        assert_eq!(state.phase, Phase::Failed);
        assert!(state.error.is_some());
        assert!(state.montures.is_empty());
    }

    #[tokio::test]
    async fn test_identical_params_are_deduped_after_dispatch() {
        let mut session = QuerySession::with_policy(dead_client(), fast_policy());
        let FetchOutcome::Scheduled(generation) =
            session.update_filter(FilterChange::Genre(Some("femme".to_owned())))
        else {
            panic!("expected a scheduled fetch");
        };
        session.settled(generation).await;

        // "updating" the field to its current value resolves to the same
        // parameters and must not fetch again
        let outcome = session.update_filter(FilterChange::Genre(Some("femme".to_owned())));
        assert!(outcome.is_skipped());
    }

    #[tokio::test]
    async fn test_reset_filters_clears_dedupe_memory() {
        let mut session = QuerySession::with_policy(dead_client(), fast_policy());

        // dispatch a fetch for the default parameters
        let FetchOutcome::Scheduled(generation) = session.apply(CatalogFilters::default(), 1)
        else {
            panic!("expected a scheduled fetch");
        };
        session.settled(generation).await;

        // same parameters again: suppressed
        assert!(session.apply(CatalogFilters::default(), 1).is_skipped());

        // reset wipes the memory, so the (identical) default fetch runs
        assert!(matches!(
            session.reset_filters(),
            FetchOutcome::Scheduled(_)
        ));
    }

    #[tokio::test]
    async fn test_filter_change_resets_page_pointer() {
        let mut session = QuerySession::with_policy(dead_client(), fast_policy());
        session.go_to_page(3);
        assert_eq!(session.page(), 3);

        session.update_filter(FilterChange::Search("ronde".to_owned()));
        assert_eq!(session.page(), 1);
    }
}
