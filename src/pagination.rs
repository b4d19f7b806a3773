use crate::error::{Error, Result};
use crate::post::Post;
use crate::prismic::RawPage;
use std::cell::{Cell, Ref, RefCell};

/// Anything that can resolve a next-page cursor into a page of documents.
pub trait PageSource {
    fn fetch_page(&self, cursor: &str) -> Result<RawPage>;
}

/// Outcome of a successful [`Pagination::load_more`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMore {
    /// This many posts were appended.
    Loaded(usize),
    /// There was no cursor, nothing was fetched.
    Exhausted,
}

#[derive(Debug)]
struct State {
    results: Vec<Post>,
    next_cursor: Option<String>,
    /// Number of posts each fetched page contributed, in fetch order.
    page_lengths: Vec<usize>,
}

/// The post list plus the cursor to the page after it.
///
/// Posts are only ever appended. A `load_more` issued while another one is
/// still fetching is rejected with [`Error::InFlight`].
#[derive(Debug)]
pub struct Pagination {
    state: RefCell<State>,
    loading: Cell<bool>,
}

/// Clears the loading flag however `load_more` exits.
struct Loading<'a>(&'a Cell<bool>);

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

fn cursor(next_page: &Option<String>) -> Option<String> {
    next_page.clone().filter(|c| !c.is_empty())
}

impl Pagination {
    pub fn initialize(first_page: &RawPage) -> Self {
        let results: Vec<Post> = first_page.results.iter().map(Post::from_raw).collect();
        let state = State {
            page_lengths: vec![results.len()],
            results,
            next_cursor: cursor(&first_page.next_page),
        };
        Self {
            state: RefCell::new(state),
            loading: Cell::new(false),
        }
    }

    pub fn results(&self) -> Ref<'_, [Post]> {
        Ref::map(self.state.borrow(), |s| s.results.as_slice())
    }

    pub fn next_cursor(&self) -> Option<String> {
        self.state.borrow().next_cursor.clone()
    }

    pub fn has_more(&self) -> bool {
        self.state.borrow().next_cursor.is_some()
    }

    /// Posts grouped by the page they arrived with.
    pub fn pages(&self) -> Vec<Vec<Post>> {
        let state = self.state.borrow();
        let mut start = 0;
        state
            .page_lengths
            .iter()
            .map(|&len| {
                let page = state.results[start..start + len].to_vec();
                start += len;
                page
            })
            .collect()
    }

    /// Fetch the page behind the current cursor and append its posts.
    ///
    /// On error nothing is changed, so the call can simply be repeated.
    pub fn load_more<S: PageSource + ?Sized>(&self, source: &S) -> Result<LoadMore> {
        let Some(cursor_url) = self.next_cursor() else {
            return Ok(LoadMore::Exhausted);
        };
        if self.loading.replace(true) {
            return Err(Error::InFlight);
        }
        let _loading = Loading(&self.loading);

        tracing::debug!("Loading more posts from {}", cursor_url);
        let page = source.fetch_page(&cursor_url)?;
        let posts: Vec<Post> = page.results.iter().map(Post::from_raw).collect();
        let loaded = posts.len();

        let mut state = self.state.borrow_mut();
        state.results.extend(posts);
        state.page_lengths.push(loaded);
        state.next_cursor = cursor(&page.next_page);
        Ok(LoadMore::Loaded(loaded))
    }

    /// Keep loading until the cursor runs out or `max_pages` more pages were fetched.
    pub fn load_all<S: PageSource + ?Sized>(&self, source: &S, max_pages: usize) -> Result<usize> {
        let mut pages = 0;
        while pages < max_pages {
            match self.load_more(source)? {
                LoadMore::Loaded(_) => pages += 1,
                LoadMore::Exhausted => break,
            }
        }
        Ok(pages)
    }
}
