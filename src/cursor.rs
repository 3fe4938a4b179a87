//! Cursor pagination
//!
//! A [`Cursor`] wraps a page fetcher. [`Cursor::first_page`] resolves page
//! one; every [`Cursor::next`] is chained off the previous link, so calling
//! it twice without awaiting still yields pages two then three.

use crate::error::Result;
use futures::future::{BoxFuture, Shared};
use futures::stream::{self, Stream};
use futures::{FutureExt, TryStreamExt};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

/// Pagination metadata of one fetched page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorState {
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub next_offset: Option<u64>,
    #[serde(default)]
    pub total: u64,
}

/// Data of one fetch plus the state that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub data: T,
    pub state: CursorState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPhase {
    Unstarted,
    Fetching,
    IdleWithMore,
    Exhausted,
    Failed,
}

type PageFetcher<T> = Arc<dyn Fn(Option<CursorState>) -> BoxFuture<'static, Result<Page<T>>> + Send + Sync>;
type FirstLink<T> = Shared<BoxFuture<'static, Result<Page<T>>>>;
type NextLink<T> = Shared<BoxFuture<'static, Result<Option<Page<T>>>>>;

pub struct Cursor<T> {
    fetch: PageFetcher<T>,
    first: FirstLink<T>,
    tail: Mutex<Option<NextLink<T>>>,
    phase: Arc<Mutex<CursorPhase>>,
}

impl<T> Cursor<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Build a cursor from a fetcher
    ///
    /// The fetcher gets `None` for the first page and the previous page's
    /// state afterwards; it reads `next_offset` from that state.
    pub fn new<F, Fut>(fetch: F) -> Self
    where
        F: Fn(Option<CursorState>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Page<T>>> + Send + 'static,
    {
        let fetch: PageFetcher<T> = Arc::new(move |state| fetch(state).boxed());
        let phase = Arc::new(Mutex::new(CursorPhase::Unstarted));
        let first = run_fetch(Arc::clone(&fetch), None, Arc::clone(&phase)).boxed().shared();

        Self {
            fetch,
            first,
            tail: Mutex::new(None),
            phase,
        }
    }

    /// Data of the first page; awaiting again returns the same page
    pub fn first_page(&self) -> impl Future<Output = Result<T>> + Send + 'static {
        self.first.clone().map(|page| page.map(|page| page.data))
    }

    /// Data of the page after the most recently requested one
    ///
    /// Resolves to `None` once the previous page had no `next_offset`.
    pub fn next(&self) -> impl Future<Output = Result<Option<T>>> + Send + 'static {
        let mut tail = self.tail.lock();

        let previous: BoxFuture<'static, Result<Option<Page<T>>>> = match tail.as_ref() {
            Some(link) => link.clone().boxed(),
            None => self.first.clone().map(|page| page.map(Some)).boxed(),
        };

        let fetch = Arc::clone(&self.fetch);
        let phase = Arc::clone(&self.phase);
        let link = async move {
            let state = match previous.await? {
                Some(page) if page.state.next_offset.is_some() => page.state,
                _ => return Ok(None),
            };
            run_fetch(fetch, Some(state), phase).await.map(Some)
        }
        .boxed()
        .shared();

        *tail = Some(link.clone());
        link.map(|page| page.map(|page| page.map(|page| page.data)))
    }

    pub fn phase(&self) -> CursorPhase {
        *self.phase.lock()
    }

    /// Lazy sequence of pages: the first page, then `next()` until it
    /// comes back empty. A failure ends the sequence after yielding it.
    pub fn into_stream(self) -> impl Stream<Item = Result<T>> + Send + 'static {
        enum Step {
            First,
            Next,
            Done,
        }

        stream::unfold((self, Step::First), |(cursor, step)| async move {
            let item = match step {
                Step::First => cursor.first_page().await.map(Some),
                Step::Next => cursor.next().await,
                Step::Done => return None,
            };

            match item {
                Ok(Some(data)) => Some((Ok(data), (cursor, Step::Next))),
                Ok(None) => None,
                Err(error) => Some((Err(error), (cursor, Step::Done))),
            }
        })
    }

    /// Every page's data, in order
    pub async fn collect_pages(self) -> Result<Vec<T>> {
        self.into_stream().try_collect().await
    }
}

impl<T> std::fmt::Debug for Cursor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor").field("phase", &*self.phase.lock()).finish()
    }
}

async fn run_fetch<T>(
    fetch: PageFetcher<T>,
    state: Option<CursorState>,
    phase: Arc<Mutex<CursorPhase>>,
) -> Result<Page<T>> {
    *phase.lock() = CursorPhase::Fetching;
    let result = fetch(state).await;
    *phase.lock() = match &result {
        Ok(page) if page.state.next_offset.is_some() => CursorPhase::IdleWithMore,
        Ok(_) => CursorPhase::Exhausted,
        Err(_) => CursorPhase::Failed,
    };
    result
}
