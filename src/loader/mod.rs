//! # List loader
//!
//! `ListLoader` accumulates one remote list page by page. Each `load_initial`
//! (or `reset`) opens a new session with a fresh id; a fetch result is only
//! applied while its session is still current, so late responses from a
//! replaced query are dropped.
//!
//! State lives behind a short-lived lock that is never held across an
//! `.await`. Guards are checked and loading flags set before the first
//! suspension point, which is what keeps page fetches strictly sequential.

pub mod scroll;
pub mod state;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::auth::TokenProvider;
use crate::config::AppConfig;
use crate::error::LoadError;
use crate::models::{ListQuery, PageEnvelope, PageResult};
use crate::source::{PageRequest, PageSource, build_source};
use crate::telemetry;

pub use scroll::should_autoload;
pub use state::{ListPhase, ListState, LoadOutcome, PageFailure};

/// Loader tuning knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderSettings {
    /// Deadline for a single page fetch
    pub request_timeout: Duration,
    /// Rows before the end of the list at which `on_scroll` fetches more
    pub scroll_threshold: usize,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(20),
            scroll_threshold: 3,
        }
    }
}

impl LoaderSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            request_timeout: config.request_timeout(),
            scroll_threshold: config.scroll_threshold,
        }
    }
}

struct Session<T> {
    id: u64,
    query: Option<ListQuery>,
    state: ListState<T>,
    cancel: CancellationToken,
}

impl<T> Default for Session<T> {
    fn default() -> Self {
        Self {
            id: 0,
            query: None,
            state: ListState::default(),
            cancel: CancellationToken::new(),
        }
    }
}

/// Paginated loader for one list screen.
///
/// Cloning is cheap and clones share the same session.
pub struct ListLoader<T> {
    source: Arc<dyn PageSource>,
    tokens: Arc<dyn TokenProvider>,
    settings: LoaderSettings,
    session: Arc<Mutex<Session<T>>>,
}

impl<T> Clone for ListLoader<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            tokens: Arc::clone(&self.tokens),
            settings: self.settings,
            session: Arc::clone(&self.session),
        }
    }
}

enum RetryPlan {
    Initial(ListQuery),
    NextPage,
}

impl<T> ListLoader<T>
where
    T: DeserializeOwned + Clone + Send + 'static,
{
    pub fn new(
        source: Arc<dyn PageSource>,
        tokens: Arc<dyn TokenProvider>,
        settings: LoaderSettings,
    ) -> Self {
        Self {
            source,
            tokens,
            settings,
            session: Arc::new(Mutex::new(Session::default())),
        }
    }

    /// Loader over the source selected by configuration
    pub fn from_config(
        config: &AppConfig,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self, LoadError> {
        let source = build_source(config)?;
        Ok(Self::new(source, tokens, LoaderSettings::from_config(config)))
    }

    /// Snapshot of the current state
    pub fn state(&self) -> ListState<T> {
        self.lock().state.clone()
    }

    pub fn session_id(&self) -> u64 {
        self.lock().id
    }

    /// Query of the current session, if any
    pub fn query(&self) -> Option<ListQuery> {
        self.lock().query.clone()
    }

    /// Open a new session for `query` and fetch its first page.
    pub async fn load_initial(&self, query: ListQuery) -> LoadOutcome {
        let (session_id, cancel) = {
            let mut session = self.lock();
            session.cancel.cancel();
            session.id += 1;
            session.cancel = CancellationToken::new();
            session.query = Some(query.clone());
            session.state = ListState::initial_loading();
            (session.id, session.cancel.clone())
        };
        debug!(session = session_id, endpoint = %query.endpoint, "Starting list session");

        let result = self.fetch_page(session_id, &query, 1, &cancel).await;

        let mut session = self.lock();
        if session.id != session_id {
            return self.discard_stale(session_id, 1);
        }
        let Some(result) = result else {
            return LoadOutcome::Stale;
        };

        let state = &mut session.state;
        state.is_initial_loading = false;
        match result {
            Ok(page) => {
                let received = page.items.len();
                state.items = page.items;
                state.has_more = page.has_more;
                LoadOutcome::Loaded {
                    page: 1,
                    received,
                    has_more: state.has_more,
                }
            }
            Err(error) => {
                state.items.clear();
                state.has_more = false;
                state.error = Some(PageFailure {
                    page: 1,
                    error: error.clone(),
                });
                LoadOutcome::Failed { page: 1, error }
            }
        }
    }

    /// Fetch the page after `current_page` and append it.
    ///
    /// Returns `Skipped` without issuing a request while another fetch is in
    /// flight, when the server reported no more data, or before any query.
    pub async fn load_next_page(&self) -> LoadOutcome {
        let (session_id, query, page, cancel) = {
            let mut session = self.lock();
            let Some(query) = session.query.clone() else {
                return LoadOutcome::Skipped;
            };
            if !session.state.can_load_more() {
                return LoadOutcome::Skipped;
            }
            let state = &mut session.state;
            state.current_page += 1;
            state.is_loading_more = true;
            state.error = None;
            (
                session.id,
                query,
                session.state.current_page,
                session.cancel.clone(),
            )
        };

        let result = self.fetch_page(session_id, &query, page, &cancel).await;

        let mut session = self.lock();
        if session.id != session_id {
            return self.discard_stale(session_id, page);
        }
        let Some(result) = result else {
            return LoadOutcome::Stale;
        };

        let state = &mut session.state;
        state.is_loading_more = false;
        match result {
            Ok(fetched) => {
                let received = fetched.items.len();
                state.items.extend(fetched.items);
                state.has_more = fetched.has_more;
                LoadOutcome::Loaded {
                    page,
                    received,
                    has_more: state.has_more,
                }
            }
            Err(error) => {
                state.current_page = page.saturating_sub(1).max(1);
                state.has_more = false;
                state.error = Some(PageFailure {
                    page,
                    error: error.clone(),
                });
                LoadOutcome::Failed { page, error }
            }
        }
    }

    /// Discard the current session and start over with `new_query`.
    pub async fn reset(&self, new_query: ListQuery) -> LoadOutcome {
        info!(endpoint = %new_query.endpoint, "Resetting list session");
        self.load_initial(new_query).await
    }

    /// Re-run the operation that last failed.
    ///
    /// A failed first page reloads the session; a failed later page is
    /// requested again with the same page number.
    pub async fn retry(&self) -> LoadOutcome {
        let plan = {
            let mut session = self.lock();
            let Some(failed_page) = session.state.error.as_ref().map(|f| f.page) else {
                return LoadOutcome::Skipped;
            };
            if session.state.is_loading() {
                return LoadOutcome::Skipped;
            }
            if failed_page <= 1 {
                match session.query.clone() {
                    Some(query) => RetryPlan::Initial(query),
                    None => return LoadOutcome::Skipped,
                }
            } else {
                session.state.has_more = true;
                session.state.error = None;
                RetryPlan::NextPage
            }
        };

        match plan {
            RetryPlan::Initial(query) => self.load_initial(query).await,
            RetryPlan::NextPage => self.load_next_page().await,
        }
    }

    /// Reload the current query from the first page (pull-to-refresh).
    pub async fn refresh(&self) -> LoadOutcome {
        match self.query() {
            Some(query) => self.load_initial(query).await,
            None => LoadOutcome::Skipped,
        }
    }

    /// Autoload hook for the renderer: fetch more when `last_visible_index`
    /// is within the scroll threshold of the end.
    pub async fn on_scroll(&self, last_visible_index: usize) -> LoadOutcome {
        let len = self.lock().state.items.len();
        if !should_autoload(len, last_visible_index, self.settings.scroll_threshold) {
            return LoadOutcome::Skipped;
        }
        self.load_next_page().await
    }

    fn lock(&self) -> MutexGuard<'_, Session<T>> {
        self.session
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    fn discard_stale(&self, session_id: u64, page: u32) -> LoadOutcome {
        debug!(session = session_id, page, "Discarding result of replaced session");
        telemetry::record_stale_result(self.source.name());
        LoadOutcome::Stale
    }

    /// Fetch and decode one page. `None` when the session was cancelled.
    async fn fetch_page(
        &self,
        session_id: u64,
        query: &ListQuery,
        page: u32,
        cancel: &CancellationToken,
    ) -> Option<Result<PageResult<T>, LoadError>> {
        let source = self.source.name();
        let span = info_span!(
            "page_fetch",
            session = session_id,
            endpoint = %query.endpoint,
            page,
            source,
        );

        async move {
            let started = Instant::now();
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Page fetch cancelled by a newer session");
                    return None;
                }
                result = self.request_page(query, page) => result,
            };
            telemetry::record_fetch_duration(source, started.elapsed());

            match &result {
                Ok(fetched) => debug!(
                    received = fetched.items.len(),
                    has_more = fetched.has_more,
                    "Page loaded"
                ),
                Err(error) => {
                    telemetry::record_page_failure(source, error.kind());
                    warn!(
                        error = %error,
                        kind = error.kind().as_str(),
                        retryable = error.is_retryable(),
                        "Page fetch failed"
                    );
                }
            }
            Some(result)
        }
        .instrument(span)
        .await
    }

    async fn request_page(&self, query: &ListQuery, page: u32) -> Result<PageResult<T>, LoadError> {
        // Token lookup and fetch share one deadline.
        let deadline = self.settings.request_timeout;
        let envelope = tokio::time::timeout(deadline, self.resolve_and_fetch(query, page))
            .await
            .map_err(|_| LoadError::Timeout {
                after_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
            })??;

        envelope.into_page(query.page_size)
    }

    async fn resolve_and_fetch(
        &self,
        query: &ListQuery,
        page: u32,
    ) -> Result<PageEnvelope, LoadError> {
        // Resolved per request; a missing session never reaches the network.
        let token = self.tokens.current_token().await?;
        let request = PageRequest::for_query(query, page, token);
        debug!(request_id = %request.request_id, "Requesting page");
        telemetry::record_page_request(self.source.name());
        self.source.fetch_page(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenProvider;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves numbered items per endpoint after an optional delay
    struct ScriptedSource {
        calls: AtomicUsize,
        pages: HashMap<(String, u32), Result<PageEnvelope, LoadError>>,
        delays: HashMap<String, Duration>,
    }

    impl ScriptedSource {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                pages: HashMap::new(),
                delays: HashMap::new(),
            }
        }

        fn page(mut self, endpoint: &str, page: u32, ids: &[&str], has_more: bool) -> Self {
            let items = ids.iter().map(|id| json!({ "id": id })).collect();
            self.pages.insert(
                (endpoint.to_string(), page),
                Ok(PageEnvelope::success(items, has_more)),
            );
            self
        }

        fn failing(mut self, endpoint: &str, page: u32, error: LoadError) -> Self {
            self.pages.insert((endpoint.to_string(), page), Err(error));
            self
        }

        fn delay(mut self, endpoint: &str, delay: Duration) -> Self {
            self.delays.insert(endpoint.to_string(), delay);
            self
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn fetch_page(&self, request: PageRequest) -> Result<PageEnvelope, LoadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delays.get(&request.endpoint) {
                tokio::time::sleep(*delay).await;
            }
            self.pages
                .get(&(request.endpoint.clone(), request.page))
                .cloned()
                .unwrap_or_else(|| Err(LoadError::http(404, None)))
        }
    }

    #[derive(Debug, Clone, serde::Deserialize, PartialEq)]
    struct Item {
        id: String,
    }

    fn loader(source: Arc<ScriptedSource>) -> ListLoader<Item> {
        ListLoader::new(
            source,
            Arc::new(StaticTokenProvider::new("token")),
            LoaderSettings::default(),
        )
    }

    fn ids(state: &ListState<Item>) -> Vec<&str> {
        state.items.iter().map(|i| i.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_next_page_before_any_query_is_skipped() {
        let source = Arc::new(ScriptedSource::new());
        let loader = loader(source.clone());

        assert_eq!(loader.load_next_page().await, LoadOutcome::Skipped);
        assert_eq!(loader.refresh().await, LoadOutcome::Skipped);
        assert_eq!(loader.retry().await, LoadOutcome::Skipped);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pages_accumulate_in_order() {
        let source = Arc::new(
            ScriptedSource::new()
                .page("/items", 1, &["a", "b"], true)
                .page("/items", 2, &["c"], false),
        );
        let loader = loader(source.clone());

        let first = loader.load_initial(ListQuery::new("/items", 2)).await;
        assert!(first.is_loaded());
        let second = loader.load_next_page().await;
        assert_eq!(
            second,
            LoadOutcome::Loaded {
                page: 2,
                received: 1,
                has_more: false
            }
        );

        let state = loader.state();
        assert_eq!(ids(&state), vec!["a", "b", "c"]);
        assert_eq!(state.current_page, 2);
        assert!(!state.has_more);
        assert!(loader.load_next_page().await.is_skipped());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_next_page_issues_one_request() {
        let source = Arc::new(
            ScriptedSource::new()
                .page("/items", 1, &["a"], true)
                .page("/items", 2, &["b"], true)
                .delay("/items", Duration::from_millis(50)),
        );
        let loader = loader(source.clone());
        loader.load_initial(ListQuery::new("/items", 1)).await;

        let (first, second) = tokio::join!(loader.load_next_page(), loader.load_next_page());
        assert!(first.is_loaded());
        assert!(second.is_skipped());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_page_rolls_back_and_retries_same_page() {
        let source = Arc::new(
            ScriptedSource::new()
                .page("/items", 1, &["a"], true)
                .failing("/items", 2, LoadError::network("connection reset")),
        );
        let loader = loader(source.clone());
        loader.load_initial(ListQuery::new("/items", 1)).await;

        let outcome = loader.load_next_page().await;
        assert_eq!(outcome.error(), Some(&LoadError::network("connection reset")));

        let state = loader.state();
        assert_eq!(state.current_page, 1);
        assert!(!state.has_more);
        assert!(!state.is_loading_more);
        assert_eq!(state.error.as_ref().map(|f| f.page), Some(2));
        assert!(loader.load_next_page().await.is_skipped());

        let retried = loader.retry().await;
        assert!(matches!(retried, LoadOutcome::Failed { page: 2, .. }));
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_initial_failure_keeps_visible_error() {
        let source = Arc::new(ScriptedSource::new());
        let loader = loader(source);

        let outcome = loader.load_initial(ListQuery::new("/missing", 5)).await;
        assert!(matches!(outcome, LoadOutcome::Failed { page: 1, .. }));

        let state = loader.state();
        assert!(state.items.is_empty());
        assert!(!state.has_more);
        assert!(!state.is_initial_loading);
        assert_eq!(state.phase(), ListPhase::Error);
    }

    #[tokio::test]
    async fn test_reset_drops_old_session_result() {
        let source = Arc::new(
            ScriptedSource::new()
                .page("/slow", 1, &["old"], true)
                .delay("/slow", Duration::from_millis(200))
                .page("/fast", 1, &["new"], false),
        );
        let loader = loader(source);

        let old = tokio::spawn({
            let loader = loader.clone();
            async move { loader.load_initial(ListQuery::new("/slow", 1)).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let outcome = loader.reset(ListQuery::new("/fast", 1)).await;
        assert!(outcome.is_loaded());
        assert_eq!(old.await.unwrap(), LoadOutcome::Stale);

        let state = loader.state();
        assert_eq!(ids(&state), vec!["new"]);
        assert_eq!(loader.session_id(), 2);
    }

    #[tokio::test]
    async fn test_on_scroll_respects_threshold() {
        let source = Arc::new(
            ScriptedSource::new()
                .page("/items", 1, &["a", "b", "c", "d", "e", "f"], true)
                .page("/items", 2, &["g"], false),
        );
        let loader = loader(source.clone());
        loader.load_initial(ListQuery::new("/items", 6)).await;

        assert!(loader.on_scroll(1).await.is_skipped());
        assert!(loader.on_scroll(2).await.is_loaded());
        assert_eq!(loader.state().items.len(), 7);
    }

    #[tokio::test]
    async fn test_slow_source_times_out() {
        let source = Arc::new(
            ScriptedSource::new()
                .page("/items", 1, &["a"], false)
                .delay("/items", Duration::from_millis(500)),
        );
        let loader = ListLoader::<Item>::new(
            source,
            Arc::new(StaticTokenProvider::new("token")),
            LoaderSettings {
                request_timeout: Duration::from_millis(50),
                ..LoaderSettings::default()
            },
        );

        let outcome = loader.load_initial(ListQuery::new("/items", 1)).await;
        assert_eq!(outcome.error(), Some(&LoadError::Timeout { after_ms: 50 }));
        assert!(!loader.state().is_initial_loading);
    }

    struct SlowTokens {
        delay: Duration,
    }

    #[async_trait]
    impl TokenProvider for SlowTokens {
        async fn current_token(&self) -> Result<String, crate::auth::AuthError> {
            tokio::time::sleep(self.delay).await;
            Ok("late-token".to_string())
        }
    }

    #[tokio::test]
    async fn test_slow_token_provider_times_out() {
        let source = Arc::new(ScriptedSource::new().page("/items", 1, &["a"], true));
        let loader = ListLoader::<Item>::new(
            source.clone(),
            Arc::new(SlowTokens {
                delay: Duration::from_secs(3),
            }),
            LoaderSettings {
                request_timeout: Duration::from_millis(100),
                ..LoaderSettings::default()
            },
        );

        let started = Instant::now();
        let outcome = loader.load_initial(ListQuery::new("/items", 1)).await;
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(outcome.error(), Some(&LoadError::Timeout { after_ms: 100 }));

        let state = loader.state();
        assert!(!state.is_initial_loading);
        assert!(state.error.is_some());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }
}
