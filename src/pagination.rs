//! Offset pagination and lazy record streams.
//!
//! The datastore serves records in batches of at most `limit` rows starting
//! at `offset`. [`PageStream`] turns that into a single `Stream` of items:
//! it requests the page at offset 0, yields its items, and moves on to the
//! next offset until a page comes back shorter than the batch size or ends
//! at the total the server reported.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use serde::Serialize;

use crate::error::Result;

/// Default number of records requested per page.
pub const DEFAULT_BATCH_SIZE: u32 = 200;

/// A page of results from the API.
#[derive(Debug, Clone, Serialize)]
#[serde(bound = "T: Serialize")]
pub struct Page<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Offset of the first item.
    pub offset: u64,
    /// Number of items requested.
    pub limit: u32,
    /// Total number of items across all pages (if the server reports it).
    pub total: Option<u64>,
}

impl<T> Page<T> {
    /// Create a new page from items and pagination info.
    #[must_use]
    pub fn new(items: Vec<T>, offset: u64, limit: u32, total: Option<u64>) -> Self {
        Self {
            items,
            offset,
            limit,
            total,
        }
    }

    /// An empty page, as returned for "no data" responses.
    #[must_use]
    pub fn empty(offset: u64, limit: u32) -> Self {
        Self::new(Vec::new(), offset, limit, None)
    }

    /// Whether another page may follow. A short page is always the last,
    /// and so is a page that reaches the reported total.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.items.len() >= self.limit as usize && !self.reaches_total()
    }

    /// Returns true if the server reported a total and this page ends at or
    /// past it.
    #[must_use]
    pub fn reaches_total(&self) -> bool {
        self.total
            .is_some_and(|total| self.offset + self.items.len() as u64 >= total)
    }

    /// Offset of the page after this one, if any.
    #[must_use]
    pub fn next_offset(&self) -> Option<u64> {
        self.has_more().then(|| self.offset + u64::from(self.limit))
    }

    /// Returns true if this page has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Boxed future returned by page fetchers.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type FetchPage<'a, T> = Box<dyn Fn(u64, u32) -> BoxFuture<'a, Result<Page<T>>> + Send + Sync + 'a>;

/// A stream that lazily fetches pages by offset and yields their items.
///
/// Nothing is requested until the stream is first polled. Pages are fetched
/// one at a time, strictly in order. If a page request fails the error is
/// yielded once and the stream ends; items already yielded stay valid.
/// Dropping the stream stops all further requests.
///
/// # Example
///
/// ```no_run
/// use futures_util::StreamExt;
/// use emploi_store::{EmploiStoreClient, RecordQuery, Resource, Get};
///
/// # async fn example(client: EmploiStoreClient) -> emploi_store::Result<()> {
/// let resource = Resource::get(&client, "b7e3e4c1-resource-id".to_string()).await?;
/// let mut records = resource.records(&client, RecordQuery::default());
///
/// while let Some(record) = records.next().await {
///     let record = record?;
///     println!("{:?}", record);
/// }
/// # Ok(())
/// # }
/// ```
pub struct PageStream<'a, T> {
    fetch_page: FetchPage<'a, T>,
    batch_size: u32,
    buffered: VecDeque<T>,
    next_offset: Option<u64>,
    pending_fetch: Option<BoxFuture<'a, Result<Page<T>>>>,
    total: Option<u64>,
    pages_fetched: u32,
}

impl<'a, T> PageStream<'a, T> {
    /// Create a stream over pages of `batch_size` items.
    ///
    /// `fetch_page` receives the offset and batch size of the page to load.
    /// A batch size of 0 is treated as 1.
    pub fn new<F>(batch_size: u32, fetch_page: F) -> Self
    where
        F: Fn(u64, u32) -> BoxFuture<'a, Result<Page<T>>> + Send + Sync + 'a,
    {
        Self {
            fetch_page: Box::new(fetch_page),
            batch_size: batch_size.max(1),
            buffered: VecDeque::new(),
            next_offset: Some(0),
            pending_fetch: None,
            total: None,
            pages_fetched: 0,
        }
    }

    /// Number of items per requested page.
    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    /// Total reported by the server with the first page, once it is loaded.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Number of page requests completed so far.
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }
}

impl<T> Stream for PageStream<'_, T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        loop {
            if let Some(item) = this.buffered.pop_front() {
                return Poll::Ready(Some(Ok(item)));
            }

            if let Some(fut) = this.pending_fetch.as_mut() {
                match fut.as_mut().poll(cx) {
                    Poll::Ready(Ok(page)) => {
                        this.pending_fetch = None;
                        this.pages_fetched += 1;
                        if this.pages_fetched == 1 {
                            this.total = page.total;
                        }
                        // The server may cap the limit, so compare against
                        // what we asked for rather than what it echoes back.
                        let full = page.len() >= this.batch_size as usize;
                        this.next_offset = (full && !page.reaches_total())
                            .then(|| page.offset + u64::from(this.batch_size));
                        tracing::debug!(
                            offset = page.offset,
                            items = page.len(),
                            last = this.next_offset.is_none(),
                            "fetched page"
                        );
                        this.buffered.extend(page.items);
                        continue;
                    }
                    Poll::Ready(Err(e)) => {
                        this.pending_fetch = None;
                        this.next_offset = None;
                        return Poll::Ready(Some(Err(e)));
                    }
                    Poll::Pending => return Poll::Pending,
                }
            }

            match this.next_offset.take() {
                Some(offset) => {
                    this.pending_fetch = Some((this.fetch_page)(offset, this.batch_size));
                }
                None => return Poll::Ready(None),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let upper = if self.next_offset.is_none() && self.pending_fetch.is_none() {
            Some(self.buffered.len())
        } else {
            None
        };
        (self.buffered.len(), upper)
    }
}

impl<T> Unpin for PageStream<'_, T> {}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use futures_util::{StreamExt, TryStreamExt};

    use super::*;
    use crate::error::EmploiStoreError;

    fn counting_stream(
        total: u64,
        batch_size: u32,
        calls: Arc<AtomicU32>,
    ) -> PageStream<'static, u64> {
        PageStream::new(batch_size, move |offset, limit| {
            calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                let end = (offset + u64::from(limit)).min(total);
                let items: Vec<u64> = (offset..end).collect();
                Ok(Page::new(items, offset, limit, Some(total)))
            })
        })
    }

    #[test]
    fn test_page_has_more() {
        let full: Page<i32> = Page::new(vec![1; 100], 0, 100, None);
        assert!(full.has_more());
        assert_eq!(full.next_offset(), Some(100));

        let short: Page<i32> = Page::new(vec![1; 50], 100, 100, None);
        assert!(!short.has_more());
        assert_eq!(short.next_offset(), None);
    }

    #[test]
    fn test_page_reaching_total_is_last() {
        let last: Page<i32> = Page::new(vec![1; 100], 100, 100, Some(200));
        assert!(last.reaches_total());
        assert!(!last.has_more());
        assert_eq!(last.next_offset(), None);

        let middle: Page<i32> = Page::new(vec![1; 100], 0, 100, Some(200));
        assert!(!middle.reaches_total());
        assert_eq!(middle.next_offset(), Some(100));
    }

    #[tokio::test]
    async fn test_stream_yields_all_items_in_order() {
        let calls = Arc::new(AtomicU32::new(0));
        let stream = counting_stream(447, 200, calls.clone());

        let items: Vec<u64> = stream.try_collect().await.unwrap();
        assert_eq!(items.len(), 447);
        assert_eq!(items, (0..447).collect::<Vec<_>>());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exact_multiple_stops_at_reported_total() {
        let calls = Arc::new(AtomicU32::new(0));
        let stream = counting_stream(400, 200, calls.clone());

        let items: Vec<u64> = stream.try_collect().await.unwrap();
        assert_eq!(items.len(), 400);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exact_multiple_without_total_needs_trailing_empty_page() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let stream = PageStream::new(200, move |offset, limit| {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                let end = (offset + u64::from(limit)).min(400);
                let items: Vec<u64> = (offset..end).collect();
                Ok(Page::new(items, offset, limit, None))
            })
        });

        let items: Vec<u64> = stream.try_collect().await.unwrap();
        assert_eq!(items.len(), 400);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_source_makes_one_call() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut stream = counting_stream(0, 200, calls.clone());

        assert!(stream.next().await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(stream.pages_fetched(), 1);
    }

    #[tokio::test]
    async fn test_nothing_fetched_before_first_poll() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut stream = counting_stream(10, 200, calls.clone());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        stream.next().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(stream.total(), Some(10));
    }

    #[tokio::test]
    async fn test_error_mid_stream_is_yielded_then_ends() {
        let stream: PageStream<'static, u64> = PageStream::new(2, |offset, limit| {
            Box::pin(async move {
                if offset == 0 {
                    Ok(Page::new(vec![1, 2], offset, limit, None))
                } else {
                    Err(EmploiStoreError::ApiRequest {
                        status_code: 502,
                        body: "bad gateway".to_string(),
                    })
                }
            })
        });

        let results: Vec<Result<u64>> = stream.collect().await;
        assert_eq!(results.len(), 3);
        assert_eq!(*results[0].as_ref().unwrap(), 1);
        assert_eq!(*results[1].as_ref().unwrap(), 2);
        assert!(matches!(
            results[2],
            Err(EmploiStoreError::ApiRequest { status_code: 502, .. })
        ));
    }

    #[tokio::test]
    async fn test_zero_batch_size_is_clamped() {
        let calls = Arc::new(AtomicU32::new(0));
        let stream = counting_stream(3, 0, calls.clone());
        assert_eq!(stream.batch_size(), 1);

        let items: Vec<u64> = stream.try_collect().await.unwrap();
        assert_eq!(items, vec![0, 1, 2]);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
