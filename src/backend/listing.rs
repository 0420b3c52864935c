//! Listing iterator
//!
//! Drives a paginated `list_objects` call to exhaustion, one page at a time.

use std::collections::VecDeque;

use super::{BackendError, ListQuery, ObjectBackend, ObjectInfo};

/// Iterator over every object matching a query
///
/// The next page is fetched only once the current one is drained. After an
/// error is yielded the iterator is finished.
pub struct Listing<'a> {
    backend: &'a dyn ObjectBackend,
    query: ListQuery,
    page_size: usize,
    buffered: VecDeque<ObjectInfo>,
    next_token: Option<String>,
    pages_fetched: u64,
    done: bool,
}

impl<'a> Listing<'a> {
    pub fn new(backend: &'a dyn ObjectBackend, query: ListQuery, page_size: usize) -> Self {
        Self {
            backend,
            query,
            page_size,
            buffered: VecDeque::new(),
            next_token: None,
            pages_fetched: 0,
            done: false,
        }
    }

    /// Number of pages requested so far
    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }

    fn fetch_page(&mut self) -> Result<(), BackendError> {
        let page = self.backend.list_objects(
            &self.query,
            self.next_token.as_deref(),
            self.page_size,
        )?;
        self.pages_fetched += 1;

        tracing::trace!(
            page = self.pages_fetched,
            objects = page.objects.len(),
            more = page.next_page_token.is_some(),
            "fetched listing page"
        );

        self.buffered.extend(page.objects);
        match page.next_page_token {
            Some(token) => self.next_token = Some(token),
            None => self.done = true,
        }
        Ok(())
    }
}

impl Iterator for Listing<'_> {
    type Item = Result<ObjectInfo, BackendError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(object) = self.buffered.pop_front() {
                return Some(Ok(object));
            }
            if self.done {
                return None;
            }
            if let Err(e) = self.fetch_page() {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}
