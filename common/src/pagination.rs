//! Abstractions for offset pagination.

/// Default number of items on a [`Page`].
pub const DEFAULT_LIMIT: u32 = 10;

/// Maximum number of items on a [`Page`].
pub const MAX_LIMIT: u32 = 100;

/// Pagination arguments.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Arguments {
    /// Number of the requested page, starting from `1`.
    page: u32,

    /// Maximum number of items on the requested page.
    limit: u32,
}

impl Default for Arguments {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Arguments {
    /// Creates new [`Arguments`] out of the optional client input.
    ///
    /// Missing values fall back to the first page of [`DEFAULT_LIMIT`] items.
    ///
    /// [`None`] is returned if the `page` or the `limit` is zero, or the
    /// `limit` exceeds [`MAX_LIMIT`].
    #[must_use]
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Option<Self> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        (page > 0 && limit > 0 && limit <= MAX_LIMIT)
            .then_some(Self { page, limit })
    }

    /// Returns the requested page number (starting from `1`).
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Returns the maximum number of items on the requested page.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns the number of items to skip before the requested page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

/// A page of items.
#[derive(Clone, Debug)]
pub struct Page<I> {
    /// Items on this [`Page`].
    pub items: Vec<I>,

    /// Total number of items across all pages.
    pub total: u64,

    /// [`Arguments`] this [`Page`] was selected with.
    pub arguments: Arguments,
}

impl<I> Page<I> {
    /// Creates a new [`Page`] out of the provided items.
    #[must_use]
    pub fn new(
        arguments: Arguments,
        items: impl IntoIterator<Item = impl Into<I>>,
        total: u64,
    ) -> Self {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            total,
            arguments,
        }
    }

    /// Returns total number of pages.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.arguments.limit))
    }

    /// Maps the items of this [`Page`] with the provided function.
    #[must_use]
    pub fn map<T>(self, f: impl FnMut(I) -> T) -> Page<T> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            arguments: self.arguments,
        }
    }
}

/// Pagination selector.
#[derive(Clone, Debug)]
pub struct Selector<F> {
    /// Pagination [`Arguments`].
    pub arguments: Arguments,

    /// Additional filter being applied to the result.
    pub filter: F,
}

/// Defines pagination types.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_pagination {
    ($node:ty, $filter:ty) => {
        #[doc = "A [`Page`] of items."]
        pub type Page = $crate::pagination::Page<$node>;

        #[doc = "Arguments for selecting a [`Page`]."]
        pub type Arguments = $crate::pagination::Arguments;

        #[doc = "[`Page`] selector."]
        pub type Selector = $crate::pagination::Selector<$filter>;
    };
}

#[cfg(test)]
mod spec {
    use super::{Arguments, Page, DEFAULT_LIMIT, MAX_LIMIT};

    #[test]
    fn defaults_to_first_page() {
        let args = Arguments::new(None, None).unwrap();

        assert_eq!(args.page(), 1);
        assert_eq!(args.limit(), DEFAULT_LIMIT);
        assert_eq!(args.offset(), 0);
        assert_eq!(args, Arguments::default());
    }

    #[test]
    fn computes_offset() {
        let args = Arguments::new(Some(3), Some(25)).unwrap();

        assert_eq!(args.offset(), 50);
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(Arguments::new(Some(0), None).is_none());
        assert!(Arguments::new(None, Some(0)).is_none());
        assert!(Arguments::new(None, Some(MAX_LIMIT + 1)).is_none());
        assert!(Arguments::new(None, Some(MAX_LIMIT)).is_some());
    }

    #[test]
    fn counts_pages() {
        let args = Arguments::new(Some(1), Some(10)).unwrap();

        assert_eq!(Page::<u8>::new(args, Vec::<u8>::new(), 0).total_pages(), 0);
        assert_eq!(Page::<u8>::new(args, [1u8], 10).total_pages(), 1);
        assert_eq!(Page::<u8>::new(args, [1u8], 11).total_pages(), 2);
    }
}
