//! View state for the catalog browsing screens and its binding to cache
//! keys.
//!
//! The current view is held as a URL-style location string (`gallery?page=2
//! &size=50`), persisted across runs. Every navigation re-derives a
//! [`QueryState`] from it, and the state's canonical [`QueryKey`] is what
//! the response cache is keyed by. Distinct states always serialize to
//! distinct keys; a search with blank text derives no key at all, so no
//! request is ever issued for it.

use url::form_urlencoded;

use super::entities::ImageId;

/// Page sizes the server-side views accept.
pub const PAGE_SIZE_OPTIONS: [u16; 4] = [10, 20, 50, 100];

/// Page size used when none is requested.
pub const DEFAULT_PAGE_SIZE: u16 = 20;

/// A page size constrained to [`PAGE_SIZE_OPTIONS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageSize(u16);

impl PageSize {
    /// Snaps an arbitrary value to the nearest allowed size, preferring the
    /// smaller option on ties.
    #[must_use]
    pub fn snap(raw: u16) -> Self {
        let nearest = PAGE_SIZE_OPTIONS
            .iter()
            .copied()
            .min_by_key(|option| (option.abs_diff(raw), *option))
            .unwrap_or(DEFAULT_PAGE_SIZE);
        Self(nearest)
    }

    /// Parses a query parameter, defaulting when absent or malformed.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse::<u16>().ok())
            .map_or_else(Self::default, Self::snap)
    }

    /// Returns the inner value.
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }

    /// The next larger allowed size, wrapping around.
    #[must_use]
    pub fn cycle(self) -> Self {
        let idx = PAGE_SIZE_OPTIONS.iter().position(|&o| o == self.0).unwrap_or(0);
        Self(PAGE_SIZE_OPTIONS[(idx + 1) % PAGE_SIZE_OPTIONS.len()])
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(DEFAULT_PAGE_SIZE)
    }
}

impl std::fmt::Display for PageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the user is browsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Browse {
    /// The plain gallery listing.
    List,
    /// Full-text / semantic search.
    Search {
        /// Raw query text as typed; trimmed when the key is derived.
        query: String,
    },
    /// Images similar to a source image.
    Similar {
        /// The source image.
        image_id: ImageId,
    },
}

/// The complete view state of a browsing screen.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryState {
    /// Current browse mode.
    pub browse: Browse,
    /// 1-based page number.
    pub page: u32,
    /// Snapped page size.
    pub page_size: PageSize,
}

impl Default for QueryState {
    fn default() -> Self {
        Self::list()
    }
}

impl QueryState {
    /// First page of the plain listing at the default size.
    #[must_use]
    pub fn list() -> Self {
        Self {
            browse: Browse::List,
            page: 1,
            page_size: PageSize::default(),
        }
    }

    /// First page of a search for `query`.
    #[must_use]
    pub fn search(query: impl Into<String>) -> Self {
        Self {
            browse: Browse::Search { query: query.into() },
            page: 1,
            page_size: PageSize::default(),
        }
    }

    /// First page of similar images for `image_id`.
    #[must_use]
    pub fn similar(image_id: ImageId) -> Self {
        Self {
            browse: Browse::Similar { image_id },
            page: 1,
            page_size: PageSize::default(),
        }
    }

    /// Moves to `page`, clamped to 1.
    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Changes the page size, which always resets to the first page.
    #[must_use]
    pub fn with_page_size(mut self, size: PageSize) -> Self {
        self.page_size = size;
        self.page = 1;
        self
    }

    /// Advances one page.
    #[must_use]
    pub fn next_page(self) -> Self {
        let page = self.page + 1;
        self.with_page(page)
    }

    /// Goes back one page, stopping at 1.
    #[must_use]
    pub fn prev_page(self) -> Self {
        let page = self.page.saturating_sub(1);
        self.with_page(page)
    }

    /// Derives the canonical cache key.
    ///
    /// Returns `None` for a search whose trimmed text is empty; callers must
    /// not issue a request in that case.
    #[must_use]
    pub fn key(&self) -> Option<QueryKey> {
        match &self.browse {
            Browse::List => Some(QueryKey::List {
                page: self.page,
                size: self.page_size,
            }),
            Browse::Search { query } => {
                let trimmed = query.trim();
                if trimmed.is_empty() {
                    return None;
                }
                Some(QueryKey::Search {
                    query: trimmed.to_owned(),
                    page: self.page,
                    size: self.page_size,
                })
            }
            Browse::Similar { image_id } => Some(QueryKey::Similar {
                image_id: image_id.clone(),
                page: self.page,
                size: self.page_size,
            }),
        }
    }

    /// Serializes into the persisted location string.
    #[must_use]
    pub fn to_location(&self) -> String {
        let (view, extra) = match &self.browse {
            Browse::List => ("gallery", None),
            Browse::Search { query } => ("search", Some(("q", query.as_str()))),
            Browse::Similar { image_id } => ("similar", Some(("id", image_id.as_str()))),
        };

        let mut pairs = form_urlencoded::Serializer::new(String::new());
        if let Some((name, value)) = extra {
            pairs.append_pair(name, value);
        }
        pairs.append_pair("page", &self.page.to_string());
        pairs.append_pair("size", &self.page_size.to_string());

        format!("{view}?{}", pairs.finish())
    }

    /// Parses a location string, falling back to the default listing for
    /// anything unrecognized.
    #[must_use]
    pub fn from_location(raw: &str) -> Self {
        let (view, query) = raw.split_once('?').unwrap_or((raw, ""));

        let mut page_raw = None;
        let mut size_raw = None;
        let mut q = None;
        let mut id = None;
        for (name, value) in form_urlencoded::parse(query.as_bytes()) {
            match name.as_ref() {
                "page" => page_raw = Some(value.into_owned()),
                "size" => size_raw = Some(value.into_owned()),
                "q" => q = Some(value.into_owned()),
                "id" => id = Some(value.into_owned()),
                _ => {}
            }
        }

        let page = page_raw
            .and_then(|p| p.parse::<u32>().ok())
            .map_or(1, |p| p.max(1));
        let page_size = PageSize::parse(size_raw.as_deref());

        let browse = match view {
            "search" => Browse::Search {
                query: q.unwrap_or_default(),
            },
            "similar" => match id {
                Some(id) => Browse::Similar {
                    image_id: ImageId::new(id),
                },
                None => Browse::List,
            },
            _ => Browse::List,
        };

        Self { browse, page, page_size }
    }
}

/// Canonical identifier of one distinct catalog query.
///
/// The `Display` form doubles as the request path and is the string the
/// response cache is keyed by. Encoding the search text keeps the mapping
/// injective: no crafted query text can collide with another key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// `/images/list`
    List {
        /// 1-based page number.
        page: u32,
        /// Page size.
        size: PageSize,
    },
    /// `/images/search`
    Search {
        /// Trimmed, non-empty query text.
        query: String,
        /// 1-based page number.
        page: u32,
        /// Page size.
        size: PageSize,
    },
    /// `/images/{id}/similar`
    Similar {
        /// Source image.
        image_id: ImageId,
        /// 1-based page number.
        page: u32,
        /// Page size.
        size: PageSize,
    },
}

impl QueryKey {
    /// The key invalidated after mutations that affect the gallery: first
    /// page of the listing at the default size.
    #[must_use]
    pub fn default_listing() -> Self {
        Self::List {
            page: 1,
            size: PageSize::default(),
        }
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::List { page, size } => {
                write!(f, "/images/list?page={page}&page_size={size}")
            }
            Self::Search { query, page, size } => {
                let encoded: String =
                    form_urlencoded::byte_serialize(query.as_bytes()).collect();
                write!(f, "/images/search?query={encoded}&page={page}&page_size={size}")
            }
            Self::Similar { image_id, page, size } => {
                write!(f, "/images/{image_id}/similar?page={page}&page_size={size}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use test_case::test_case;

    #[test_case(10, 10; "exact low")]
    #[test_case(20, 20; "exact default")]
    #[test_case(100, 100; "exact high")]
    #[test_case(1, 10; "below range")]
    #[test_case(25, 20; "nearest below")]
    #[test_case(40, 50; "nearest above")]
    #[test_case(15, 10; "tie prefers smaller")]
    #[test_case(u16::MAX, 100; "above range")]
    fn test_page_size_snap(raw: u16, expected: u16) {
        assert_eq!(PageSize::snap(raw).get(), expected);
    }

    #[test]
    fn test_page_size_parse_defaults() {
        assert_eq!(PageSize::parse(None).get(), DEFAULT_PAGE_SIZE);
        assert_eq!(PageSize::parse(Some("banana")).get(), DEFAULT_PAGE_SIZE);
        assert_eq!(PageSize::parse(Some("50")).get(), 50);
    }

    #[test]
    fn test_blank_search_yields_no_key() {
        assert_eq!(QueryState::search("").key(), None);
        assert_eq!(QueryState::search("   \t ").key(), None);
        assert!(QueryState::search(" cats ").key().is_some());
    }

    #[test]
    fn test_key_is_deterministic() {
        let state = QueryState::search("red car").with_page(3);
        let a = state.key().unwrap().to_string();
        let b = state.key().unwrap().to_string();
        assert_eq!(a, b);
        assert_eq!(a, "/images/search?query=red+car&page=3&page_size=20");
    }

    #[test]
    fn test_keys_are_injective() {
        let states = [
            QueryState::list(),
            QueryState::list().with_page(2),
            QueryState::list().with_page_size(PageSize::snap(50)),
            QueryState::search("a"),
            QueryState::search("a").with_page(2),
            QueryState::search("b"),
            // Encoding keeps metacharacters in the text from colliding
            // with another key's paging parameters.
            QueryState::search("a&page=9"),
            QueryState::similar(ImageId::new("x")),
            QueryState::similar(ImageId::new("y")),
            QueryState::similar(ImageId::new("x")).with_page(2),
        ];

        let keys: HashSet<String> = states
            .iter()
            .map(|s| s.key().unwrap().to_string())
            .collect();
        assert_eq!(keys.len(), states.len());
    }

    #[test]
    fn test_location_round_trip() {
        let states = [
            QueryState::list().with_page(4).with_page_size(PageSize::snap(100)).with_page(4),
            QueryState::search("sunset over mountains").with_page(2),
            QueryState::similar(ImageId::new("abc-123")),
        ];
        for state in states {
            let reparsed = QueryState::from_location(&state.to_location());
            assert_eq!(reparsed, state);
        }
    }

    #[test]
    fn test_location_parse_clamps_and_defaults() {
        let state = QueryState::from_location("gallery?page=0&size=37");
        assert_eq!(state.page, 1);
        assert_eq!(state.page_size.get(), 50);

        let junk = QueryState::from_location("nonsense?whatever=1");
        assert_eq!(junk, QueryState::list());

        // A similar view without a source image cannot be shown.
        let no_id = QueryState::from_location("similar?page=2");
        assert_eq!(no_id.browse, Browse::List);
    }

    #[test]
    fn test_page_size_change_resets_page() {
        let state = QueryState::list().with_page(5).with_page_size(PageSize::snap(10));
        assert_eq!(state.page, 1);
    }

    #[test]
    fn test_page_navigation_stops_at_one() {
        let state = QueryState::list().prev_page();
        assert_eq!(state.page, 1);
        assert_eq!(QueryState::list().next_page().page, 2);
    }

    #[test]
    fn test_page_size_cycle_wraps() {
        let mut size = PageSize::default();
        let mut seen = vec![size.get()];
        for _ in 0..PAGE_SIZE_OPTIONS.len() {
            size = size.cycle();
            seen.push(size.get());
        }
        assert_eq!(seen.first(), seen.last());
    }
}
