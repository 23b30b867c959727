//! Paginated, infinitely scrolling list screens.
//!
//! One controller serves the public feed, search results and the user's own
//! diaries; what differs is the [`ListSource`] it fetches from.
//!
//! ```text
//! Idle ──▶ Loading ──▶ Loaded
//!            ▲   └───▶ Errored
//!            └── refresh / load more / search
//! ```

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{PageQuery, PageResult};

/// Where a list gets its pages from.
#[async_trait]
pub trait ListSource: Send + Sync {
    type Item: Clone + Send;

    async fn fetch(&self, query: &PageQuery) -> Result<PageResult<Self::Item>>;
}

/// Lifecycle of a list screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListState {
    Idle,
    Loading,
    Loaded,
    Errored,
}

/// What started a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Refresh,
    LoadMore,
    Search,
}

/// Result of a refresh, load-more or search call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The page was stored
    Applied { received: usize, has_more: bool },
    /// Another fetch was already running for this trigger
    Suppressed,
    /// A newer fetch started meanwhile; this response was dropped
    Superseded,
    /// Nothing left to load
    Exhausted,
    /// The search term did not change
    Unchanged,
}

/// Whether another page exists after `page`.
///
/// Uses the item total when known, then the page count, and finally assumes
/// more when the page came back full.
pub fn has_more_pages(
    page: u32,
    page_size: u32,
    received: usize,
    total: Option<u64>,
    total_pages: Option<u32>,
) -> bool {
    if let Some(total) = total {
        return u64::from(page) * u64::from(page_size) < total;
    }
    if let Some(total_pages) = total_pages {
        return page < total_pages;
    }
    received >= page_size as usize && received > 0
}

struct Inner<T> {
    state: ListState,
    items: Vec<T>,
    page: u32,
    total: Option<u64>,
    has_more: bool,
    keyword: Option<String>,
    seq: u64,
    in_flight: Option<Trigger>,
    last_error: Option<String>,
}

/// Pagination bookkeeping for one list screen.
pub struct ListController<S: ListSource> {
    source: S,
    page_size: u32,
    inner: Mutex<Inner<S::Item>>,
}

impl<S: ListSource> ListController<S> {
    pub fn new(source: S, page_size: u32) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            inner: Mutex::new(Inner {
                state: ListState::Idle,
                items: Vec::new(),
                page: 0,
                total: None,
                has_more: true,
                keyword: None,
                seq: 0,
                in_flight: None,
                last_error: None,
            }),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner<S::Item>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn state(&self) -> ListState {
        self.inner().state
    }

    pub fn items(&self) -> Vec<S::Item> {
        self.inner().items.clone()
    }

    pub fn len(&self) -> usize {
        self.inner().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner().items.is_empty()
    }

    /// Last page loaded, 0 before the first load.
    pub fn page(&self) -> u32 {
        self.inner().page
    }

    pub fn total(&self) -> Option<u64> {
        self.inner().total
    }

    pub fn has_more(&self) -> bool {
        self.inner().has_more
    }

    pub fn keyword(&self) -> Option<String> {
        self.inner().keyword.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner().in_flight.is_some()
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner().last_error.clone()
    }

    /// Reload from page 1, replacing everything loaded so far.
    pub async fn refresh(&self) -> Result<LoadOutcome> {
        self.run(Trigger::Refresh, 1, false).await
    }

    /// Append the next page. From `Idle` this loads page 1.
    pub async fn load_more(&self) -> Result<LoadOutcome> {
        let (page, append) = {
            let inner = self.inner();
            if inner.state == ListState::Idle && inner.page == 0 {
                (1, false)
            } else if !inner.has_more {
                return Ok(LoadOutcome::Exhausted);
            } else {
                (inner.page + 1, true)
            }
        };
        self.run(Trigger::LoadMore, page, append).await
    }

    /// Change the search term and reload from page 1.
    pub async fn set_search(&self, term: &str) -> Result<LoadOutcome> {
        let term = term.trim();
        let keyword = (!term.is_empty()).then(|| term.to_string());
        {
            let mut inner = self.inner();
            if inner.keyword == keyword && inner.state != ListState::Idle {
                return Ok(LoadOutcome::Unchanged);
            }
            inner.keyword = keyword;
        }
        self.run(Trigger::Search, 1, false).await
    }

    async fn run(&self, trigger: Trigger, page: u32, append: bool) -> Result<LoadOutcome> {
        let Some((seq, query)) = self.begin(trigger, page) else {
            log::debug!("{:?} suppressed, a fetch is already running", trigger);
            return Ok(LoadOutcome::Suppressed);
        };

        let result = self.source.fetch(&query).await;
        self.complete(seq, page, append, result)
    }

    fn begin(&self, trigger: Trigger, page: u32) -> Option<(u64, PageQuery)> {
        let mut inner = self.inner();
        if let Some(running) = inner.in_flight {
            let blocked = match trigger {
                Trigger::LoadMore => true,
                Trigger::Refresh => running == Trigger::Refresh,
                Trigger::Search => false,
            };
            if blocked {
                return None;
            }
        }

        inner.seq += 1;
        inner.in_flight = Some(trigger);
        inner.state = ListState::Loading;

        let mut query = PageQuery::new(page, self.page_size);
        query.keyword = inner.keyword.clone();
        Some((inner.seq, query))
    }

    fn complete(
        &self,
        seq: u64,
        page: u32,
        append: bool,
        result: Result<PageResult<S::Item>>,
    ) -> Result<LoadOutcome> {
        let mut inner = self.inner();
        if seq != inner.seq {
            log::debug!("Dropping response #{} for page {}, #{} is newer", seq, page, inner.seq);
            return Ok(LoadOutcome::Superseded);
        }
        inner.in_flight = None;

        match result {
            Ok(result) => {
                let received = result.items.len();
                let has_more = has_more_pages(
                    page,
                    self.page_size,
                    received,
                    result.total,
                    result.total_pages,
                );
                if append {
                    inner.items.extend(result.items);
                } else {
                    inner.items = result.items;
                }
                inner.page = page;
                inner.total = result.total;
                inner.has_more = has_more;
                inner.state = ListState::Loaded;
                inner.last_error = None;
                Ok(LoadOutcome::Applied { received, has_more })
            }
            Err(e) => {
                log::warn!("Loading page {} failed: {}", page, e);
                inner.state = ListState::Errored;
                inner.last_error = Some(e.user_message());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Serves `total` numbered items, optionally holding back one keyword
    /// until released.
    struct NumberSource {
        total: u64,
        report_total: bool,
        calls: AtomicUsize,
        gate: Arc<Notify>,
        gated_keyword: Option<&'static str>,
        gate_all: bool,
        fail: bool,
    }

    impl NumberSource {
        fn new(total: u64) -> Self {
            Self {
                total,
                report_total: true,
                calls: AtomicUsize::new(0),
                gate: Arc::new(Notify::new()),
                gated_keyword: None,
                gate_all: false,
                fail: false,
            }
        }
    }

    #[async_trait]
    impl ListSource for NumberSource {
        type Item = String;

        async fn fetch(&self, query: &PageQuery) -> Result<PageResult<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let gated = self.gate_all
                || (self.gated_keyword.is_some() && query.keyword.as_deref() == self.gated_keyword);
            if gated {
                self.gate.notified().await;
            }
            if self.fail {
                return Err(AppError::network("connection refused"));
            }

            let prefix = query.keyword.clone().unwrap_or_default();
            let start = u64::from(query.page - 1) * u64::from(query.page_size);
            let end = (start + u64::from(query.page_size)).min(self.total);
            let items = (start..end).map(|i| format!("{prefix}{i}")).collect();
            Ok(PageResult::new(items, self.report_total.then_some(self.total)))
        }
    }

    #[tokio::test]
    async fn test_three_load_mores_exhaust_24_items() {
        let list = ListController::new(NumberSource::new(24), 8);
        assert_eq!(list.state(), ListState::Idle);

        let mut has_more = Vec::new();
        let mut counts = Vec::new();
        for _ in 0..3 {
            match list.load_more().await.unwrap() {
                LoadOutcome::Applied { has_more: more, .. } => has_more.push(more),
                other => panic!("unexpected {other:?}"),
            }
            counts.push(list.len());
        }

        assert_eq!(has_more, vec![true, true, false]);
        assert_eq!(counts, vec![8, 16, 24]);
        assert_eq!(list.page(), 3);
        assert_eq!(list.state(), ListState::Loaded);

        assert_eq!(list.load_more().await.unwrap(), LoadOutcome::Exhausted);
        assert_eq!(list.source().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_refresh_replaces_items() {
        let list = ListController::new(NumberSource::new(30), 10);
        list.load_more().await.unwrap();
        list.load_more().await.unwrap();
        assert_eq!(list.len(), 20);

        let outcome = list.refresh().await.unwrap();
        assert_eq!(
            outcome,
            LoadOutcome::Applied {
                received: 10,
                has_more: true
            }
        );
        assert_eq!(list.len(), 10);
        assert_eq!(list.page(), 1);
        assert_eq!(list.items()[0], "0");
    }

    #[tokio::test]
    async fn test_search_resets_and_replaces() {
        let list = ListController::new(NumberSource::new(30), 10);
        list.load_more().await.unwrap();
        list.load_more().await.unwrap();

        list.set_search("  k ").await.unwrap();
        assert_eq!(list.keyword().as_deref(), Some("k"));
        assert_eq!(list.page(), 1);
        assert_eq!(list.len(), 10);
        assert_eq!(list.items()[0], "k0");

        assert_eq!(list.set_search("k").await.unwrap(), LoadOutcome::Unchanged);

        list.set_search("").await.unwrap();
        assert_eq!(list.keyword(), None);
        assert_eq!(list.items()[0], "0");
    }

    #[tokio::test]
    async fn test_page_count_fallback_without_total() {
        let mut source = NumberSource::new(15);
        source.report_total = false;
        let list = ListController::new(source, 10);

        assert!(matches!(
            list.load_more().await.unwrap(),
            LoadOutcome::Applied { has_more: true, .. }
        ));
        assert!(matches!(
            list.load_more().await.unwrap(),
            LoadOutcome::Applied { has_more: false, received: 5 }
        ));
    }

    #[tokio::test]
    async fn test_failed_fetch_sets_errored_state() {
        let mut failing = NumberSource::new(30);
        failing.fail = true;
        let list = ListController::new(failing, 10);

        assert!(list.refresh().await.is_err());
        assert_eq!(list.state(), ListState::Errored);
        assert_eq!(
            list.last_error().as_deref(),
            Some("Network error, please try again later")
        );
        assert!(!list.is_loading());
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn test_load_more_suppressed_while_fetching() {
        let mut source = NumberSource::new(30);
        source.gate_all = true;
        let gate = Arc::clone(&source.gate);
        let list = ListController::new(source, 10);

        let first = list.refresh();
        let second = async {
            tokio::task::yield_now().await;
            let more = list.load_more().await.unwrap();
            let again = list.refresh().await.unwrap();
            gate.notify_one();
            (more, again)
        };
        let (first, (more, again)) = tokio::join!(first, second);

        assert!(matches!(first.unwrap(), LoadOutcome::Applied { .. }));
        assert_eq!(more, LoadOutcome::Suppressed);
        assert_eq!(again, LoadOutcome::Suppressed);
        assert_eq!(list.source().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_search_response_is_dropped() {
        let mut source = NumberSource::new(30);
        source.gated_keyword = Some("slow");
        let gate = Arc::clone(&source.gate);
        let list = ListController::new(source, 10);

        let slow = list.set_search("slow");
        let fast = async {
            tokio::task::yield_now().await;
            let outcome = list.set_search("fast").await.unwrap();
            gate.notify_one();
            outcome
        };
        let (slow, fast) = tokio::join!(slow, fast);

        assert!(matches!(fast, LoadOutcome::Applied { .. }));
        assert_eq!(slow.unwrap(), LoadOutcome::Superseded);
        assert_eq!(list.items()[0], "fast0");
        assert_eq!(list.keyword().as_deref(), Some("fast"));
        assert_eq!(list.state(), ListState::Loaded);
    }

    #[test]
    fn test_has_more_pages() {
        assert!(has_more_pages(1, 8, 8, Some(24), None));
        assert!(!has_more_pages(3, 8, 8, Some(24), None));
        assert!(has_more_pages(1, 8, 8, None, Some(3)));
        assert!(!has_more_pages(3, 8, 8, None, Some(3)));
        assert!(has_more_pages(1, 8, 8, None, None));
        assert!(!has_more_pages(1, 8, 3, None, None));
        assert!(!has_more_pages(1, 8, 0, Some(0), None));
    }
}
