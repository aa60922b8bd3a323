//! Cursor-driven pagination over a listing endpoint
//!
//! A [`Paginator`] is a lazy, non-restartable sequence of pages. It starts at
//! index 0 and advances only when a page arrives, to whatever `nextStart` that page
//! reported. A failed request leaves the cursor where it was, so the caller
//! decides between asking again ([`Paginator::next_page`] re-issues the same
//! request) and giving up ([`Paginator::abandon`]).
//!
//! The sequence ends when the server reports the end-of-listing sentinel; a
//! server that never does makes it infinite.

use crate::error::FetchError;
use crate::fetch::PageFetcher;
use crate::types::{Cursor, Page};

/// Lazy page sequence over one listing
pub struct Paginator<'f, U> {
    fetcher: &'f mut PageFetcher,
    url_for: U,
    cursor: Cursor,
    pages: usize,
}

impl<'f, U> Paginator<'f, U>
where
    U: Fn(u64) -> String,
{
    /// Paginate with `fetcher`, building each request URL from its start index
    pub fn new(fetcher: &'f mut PageFetcher, url_for: U) -> Self {
        Self {
            fetcher,
            url_for,
            cursor: Cursor::Next(0),
            pages: 0,
        }
    }

    /// Where the next request will start
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Pages received so far
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// URL of the request `next_page` would issue
    pub fn next_url(&self) -> Option<String> {
        match self.cursor {
            Cursor::Next(start) => Some((self.url_for)(start)),
            Cursor::End => None,
        }
    }

    /// Fetch the page at the cursor; `None` once the listing is exhausted
    pub async fn next_page(&mut self) -> Option<Result<Page, FetchError>> {
        let url = self.next_url()?;
        let result = self.fetcher.fetch(&url).await;
        if let Ok(page) = &result {
            self.cursor = page.next;
            self.pages += 1;
            tracing::trace!(
                url = %url,
                items = page.items.len(),
                total = page.total_count,
                next = ?page.next,
                "page received"
            );
        }
        Some(result)
    }

    /// Stop paginating; every further `next_page` returns `None`
    pub fn abandon(&mut self) {
        self.cursor = Cursor::End;
    }
}
