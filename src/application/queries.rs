//! Binding of catalog queries to the response cache.

use std::sync::Arc;

use async_trait::async_trait;

use super::cache::{Fetch, RemoteCache};
use crate::domain::entities::ImagePage;
use crate::domain::errors::ApiError;
use crate::domain::ports::CatalogPort;
use crate::domain::query::{PageSize, QueryKey};

/// The shared cache of catalog result pages.
pub type PageCache = RemoteCache<QueryKey, ImagePage>;

/// Dispatches a [`QueryKey`] to the matching catalog request.
pub struct PageFetcher {
    catalog: Arc<dyn CatalogPort>,
}

impl PageFetcher {
    /// Creates a fetcher over the catalog port.
    #[must_use]
    pub const fn new(catalog: Arc<dyn CatalogPort>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Fetch<QueryKey, ImagePage> for PageFetcher {
    async fn fetch(&self, key: &QueryKey) -> Result<ImagePage, ApiError> {
        match key {
            QueryKey::List { page, size } => self.catalog.list(*page, size.get()).await,
            QueryKey::Search { query, page, size } => {
                self.catalog.search(query, *page, size.get()).await
            }
            QueryKey::Similar { image_id, page, size } => {
                self.catalog.similar(image_id, *page, size.get()).await
            }
        }
    }
}

/// Builds the page cache for a catalog port.
#[must_use]
pub fn page_cache(catalog: Arc<dyn CatalogPort>) -> PageCache {
    RemoteCache::new(Arc::new(PageFetcher::new(catalog)))
}

/// Enablement of the pagination controls for one result page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageControls {
    /// Current 1-based page.
    pub page: u32,
    /// Whether a further page may exist.
    pub has_more: bool,
}

impl PageControls {
    /// Derives the controls from the current page of data.
    ///
    /// A full page implies more may follow; anything shorter is the end.
    #[must_use]
    pub fn from_page(page: u32, items: usize, page_size: PageSize) -> Self {
        Self {
            page,
            has_more: items == usize::from(page_size.get()),
        }
    }

    /// Controls for a view that has no data yet.
    #[must_use]
    pub const fn empty(page: u32) -> Self {
        Self { page, has_more: false }
    }

    /// Whether the next-page control is enabled.
    #[must_use]
    pub const fn next_enabled(&self) -> bool {
        self.has_more
    }

    /// Whether the previous-page control is enabled.
    #[must_use]
    pub const fn prev_enabled(&self) -> bool {
        self.page > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::mocks::MockCatalog;
    use crate::domain::query::QueryState;

    #[tokio::test(start_paused = true)]
    async fn test_full_page_enables_next_and_short_page_disables_it() {
        // 25 images: page 1 of 20 is full, page 2 holds the remaining 5.
        let catalog = Arc::new(MockCatalog::with_total(25));
        let cache = page_cache(catalog);

        let state = QueryState::list();
        let mut reader = cache.read(&state.key().unwrap());
        let page1 = reader.updated().await.value().cloned().unwrap();
        assert_eq!(page1.items.len(), 20);

        let controls = PageControls::from_page(state.page, page1.items.len(), state.page_size);
        assert!(controls.next_enabled());
        assert!(!controls.prev_enabled());

        let state = state.next_page();
        let mut reader = cache.read(&state.key().unwrap());
        let page2 = reader.updated().await.value().cloned().unwrap();
        assert_eq!(page2.items.len(), 5);

        let controls = PageControls::from_page(state.page, page2.items.len(), state.page_size);
        assert!(!controls.next_enabled());
        assert!(controls.prev_enabled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_views_get_distinct_entries() {
        let catalog = Arc::new(MockCatalog::with_total(40));
        let cache = page_cache(catalog.clone());

        let list_key = QueryState::list().key().unwrap();
        let search_key = QueryState::search("cats").key().unwrap();

        let mut list = cache.read(&list_key);
        let mut search = cache.read(&search_key);

        let listing = list.updated().await.value().cloned().unwrap();
        let results = search.updated().await.value().cloned().unwrap();

        assert!(listing.items.iter().all(|hit| hit.similarity.is_none()));
        assert!(results.items.iter().all(|hit| hit.similarity.is_some()));
        assert_eq!(catalog.list_calls(), 1);
    }
}
