//! Page walker
//!
//! Drives a traversal from an initial request to the last page, one
//! outstanding fetch at a time.

use super::types::{PageFetcher, PageResult};
use crate::decode::ResponseParser;
use crate::error::{Error, Result};
use crate::query::{PageRequest, PageToken};
use crate::types::Record;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Stream of records across all pages
pub type RecordStream = BoxStream<'static, Result<Record>>;

/// Stream of parsed pages
pub type PageStream = BoxStream<'static, Result<PageResult>>;

/// Lazily walks the pages of one query
///
/// Each call to [`PageWalker::pages`] or [`PageWalker::records`] starts a
/// fresh traversal from the initial request. Streams are independent and
/// may be dropped at any point to cancel.
#[derive(Clone)]
pub struct PageWalker {
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<dyn ResponseParser>,
    initial: PageRequest,
    max_pages: Option<usize>,
}

impl PageWalker {
    /// Create a walker
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        parser: Arc<dyn ResponseParser>,
        initial: PageRequest,
    ) -> Self {
        Self {
            fetcher,
            parser,
            initial,
            max_pages: None,
        }
    }

    /// Stop after this many pages
    ///
    /// A limit of 0 yields an empty stream without fetching.
    #[must_use]
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// The first request of every traversal
    pub fn initial_request(&self) -> &PageRequest {
        &self.initial
    }

    /// Walk the pages
    pub fn pages(&self) -> PageStream {
        let state = WalkState {
            fetcher: Arc::clone(&self.fetcher),
            parser: Arc::clone(&self.parser),
            next: (self.max_pages != Some(0)).then(|| self.initial.clone()),
            issued: HashSet::new(),
            max_pages: self.max_pages,
            pages: 0,
            records: 0,
        };

        stream::try_unfold(state, |mut state| async move {
            let Some(request) = state.next.take() else {
                return Ok::<_, Error>(None);
            };
            let page = state.step(request).await?;
            Ok(Some((page, state)))
        })
        .boxed()
    }

    /// Walk the records of all pages, in API order
    pub fn records(&self) -> RecordStream {
        self.pages()
            .map_ok(|page| stream::iter(page.records.into_iter().map(Ok)))
            .try_flatten()
            .boxed()
    }

    /// Collect every record into memory
    pub async fn collect(&self) -> Result<Vec<Record>> {
        self.records().try_collect().await
    }
}

impl std::fmt::Debug for PageWalker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageWalker")
            .field("initial", &self.initial)
            .field("max_pages", &self.max_pages)
            .finish_non_exhaustive()
    }
}

/// Per-traversal state; never shared between streams
///
/// Successors only differ in their token, so `issued` keeps tokens alone.
struct WalkState {
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<dyn ResponseParser>,
    next: Option<PageRequest>,
    issued: HashSet<PageToken>,
    max_pages: Option<usize>,
    pages: usize,
    records: usize,
}

impl WalkState {
    /// Fetch and parse one page, then work out the successor request
    async fn step(&mut self, request: PageRequest) -> Result<PageResult> {
        debug!(endpoint = %request.endpoint, request = %request, "Fetching page");
        self.issued.insert(request.token.clone());

        let body = match self.fetcher.fetch(&request).await {
            Ok(body) => body,
            Err(e) => return Err(Error::page_fetch(request, e)),
        };
        let page = self.parser.parse(&body, &request)?;

        self.pages += 1;
        self.records += page.len();
        debug!(
            endpoint = %request.endpoint,
            records = page.len(),
            has_next = page.has_next(),
            "Parsed page {}",
            self.pages
        );

        self.next = self.successor(&request, &page);
        if self.next.is_none() {
            info!(
                endpoint = %request.endpoint,
                pages = self.pages,
                records = self.records,
                "Finished walking endpoint"
            );
        }

        Ok(page)
    }

    fn successor(&self, request: &PageRequest, page: &PageResult) -> Option<PageRequest> {
        if page.is_empty() {
            return None;
        }
        if self.max_pages.is_some_and(|max| self.pages >= max) {
            debug!(endpoint = %request.endpoint, pages = self.pages, "Reached page limit");
            return None;
        }

        let next = request.advance(page.next.as_ref()?)?;
        if self.issued.contains(&next.token) {
            warn!(
                endpoint = %request.endpoint,
                request = %next,
                "Next page repeats an earlier request, stopping"
            );
            return None;
        }
        Some(next)
    }
}
