//! Lazily fetched, page-by-page result sequences.
//!
//! [`Pages`] wraps a "fetch page N" function and yields results one by one,
//! requesting the next page only once the current one is used up. An
//! optional limit stops iteration early, independent of the server page
//! size.
//!
//! ```
//! use caplena::pagination::{Page, Pages};
//!
//! let pages = Pages::new(
//!     |page| {
//!         let start = (page - 1) * 2;
//!         Ok(Page {
//!             results: vec![start, start + 1],
//!             has_next: page < 3,
//!             count: 6,
//!         })
//!     },
//!     Some(5),
//! );
//! let items: Vec<u32> = pages.collect::<Result<_, _>>().unwrap();
//! assert_eq!(items, vec![0, 1, 2, 3, 4]);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;

/// One page as returned by a list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub results: Vec<T>,
    /// Whether the server reported a next page.
    pub has_next: bool,
    /// Total number of results across all pages.
    pub count: u64,
}

type Fetcher<T> = Arc<dyn Fn(u32) -> Result<Page<T>> + Send + Sync>;

/// A lazily paginated sequence of results.
///
/// Iteration yields `Result<T>`; after a failed page fetch the sequence
/// yields the error once and then ends.
pub struct Pages<T> {
    fetcher: Fetcher<T>,
    limit: Option<usize>,
    current_page: u32,
    buffer: VecDeque<T>,
    yielded: usize,
    total_count: Option<u64>,
    has_next: bool,
    failed: bool,
}

impl<T> Pages<T> {
    pub fn new<F>(fetcher: F, limit: Option<usize>) -> Self
    where
        F: Fn(u32) -> Result<Page<T>> + Send + Sync + 'static,
    {
        Self {
            fetcher: Arc::new(fetcher),
            limit,
            current_page: 0,
            buffer: VecDeque::new(),
            yielded: 0,
            total_count: None,
            has_next: true,
            failed: false,
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// The number of the last fetched page, `0` before the first fetch.
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Total number of results on the server.
    ///
    /// Fetches the first page if nothing has been fetched yet.
    pub fn total_count(&mut self) -> Result<u64> {
        match self.total_count {
            Some(count) => Ok(count),
            None => {
                self.fetch_next()?;
                Ok(self.total_count.unwrap_or_default())
            }
        }
    }

    /// Number of results a full iteration yields: the count, capped by the
    /// limit. May fetch the first page, like [`total_count`](Self::total_count).
    pub fn capped_len(&mut self) -> Result<u64> {
        let count = self.total_count()?;
        Ok(match self.limit {
            Some(limit) => count.min(limit as u64),
            None => count,
        })
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.capped_len()? == 0)
    }

    fn fetch_next(&mut self) -> Result<()> {
        let page_number = self.current_page + 1;
        let page = (self.fetcher)(page_number)?;
        debug!(
            page = page_number,
            results = page.results.len(),
            has_next = page.has_next,
            count = page.count,
            "Fetched page"
        );
        self.current_page = page_number;
        self.buffer = page.results.into();
        self.total_count = Some(page.count);
        self.has_next = page.has_next;
        Ok(())
    }
}

impl<T: Clone> Pages<T> {
    /// An independent sequence that resumes where this one stands.
    ///
    /// The snapshot copies the not yet consumed part of the current page and
    /// continues with the following pages; its limit counts from zero.
    pub fn snapshot(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            limit: self.limit,
            current_page: self.current_page,
            buffer: self.buffer.clone(),
            yielded: 0,
            total_count: self.total_count,
            has_next: self.has_next,
            failed: self.failed,
        }
    }
}

impl<T> Iterator for Pages<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if self.limit.is_some_and(|limit| self.yielded >= limit) {
            return None;
        }
        loop {
            if let Some(item) = self.buffer.pop_front() {
                self.yielded += 1;
                return Some(Ok(item));
            }
            if !self.has_next {
                return None;
            }
            if let Err(err) = self.fetch_next() {
                self.failed = true;
                return Some(Err(err));
            }
        }
    }
}

impl<T> fmt::Debug for Pages<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pages")
            .field("limit", &self.limit)
            .field("current_page", &self.current_page)
            .field("buffered", &self.buffer.len())
            .field("yielded", &self.yielded)
            .field("total_count", &self.total_count)
            .field("has_next", &self.has_next)
            .finish()
    }
}
