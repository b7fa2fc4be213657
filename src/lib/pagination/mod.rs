//! Splitting an ordered listing into fixed-size pages.
//!
//! An empty listing still has one (empty) page, so every listing URL exists
//! even before the first post is published.

use std::num::NonZeroUsize;

use crate::error::IndexError;

/// `ceil(n / page_size)`, but never less than one.
pub fn total_pages(n: usize, page_size: NonZeroUsize) -> usize {
    n.div_ceil(page_size.get()).max(1)
}

/// Items on page `page_index` (zero-based).
pub fn page_slice<T>(
    items: &[T],
    page_index: usize,
    page_size: NonZeroUsize,
) -> Result<&[T], IndexError> {
    let total = total_pages(items.len(), page_size);
    if page_index >= total {
        return Err(IndexError {
            index: page_index,
            total,
        });
    }
    let start = page_index * page_size.get();
    let end = items.len().min(start + page_size.get());
    Ok(&items[start..end])
}

/// One page of a listing.
#[derive(Debug, PartialEq, Eq)]
pub struct Page<'a, T> {
    /// Zero-based.
    pub index: usize,
    pub total: usize,
    pub items: &'a [T],
}

impl<T> Page<'_, T> {
    /// One-based page number, as shown to readers.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.total
    }
}

/// Every page of `items`, in order.
pub fn paginate<T>(items: &[T], page_size: NonZeroUsize) -> impl Iterator<Item = Page<'_, T>> {
    let total = total_pages(items.len(), page_size);
    (0..total).map(move |index| {
        let start = (index * page_size.get()).min(items.len());
        let end = items.len().min(start + page_size.get());
        Page {
            index,
            total,
            items: &items[start..end],
        }
    })
}
