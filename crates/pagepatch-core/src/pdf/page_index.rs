//! Page index newtype for safe conversion between usize and i32.
//!
//! This module provides a strongly-typed wrapper around page indices to
//! ensure safe conversion between Rust's usize (used for indexing), mupdf's
//! i32, and the 1-based page numbers that appear at the API boundary.
//!
//! The 1-based to 0-based conversion happens here and only here: handlers
//! call [`PageIndex::from_page_number`] once at the entry point and pass the
//! resulting index inward, so a page can never be shifted twice.

use std::fmt;

use crate::error::Error;

/// A page index that can be safely used with mupdf.
///
/// This newtype wraps an i32 and provides safe conversion from usize,
/// centralizing the conversion logic in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageIndex(i32);

impl PageIndex {
    /// Create a new PageIndex from an i32 value.
    ///
    /// This should only be used when you already have a valid i32 page index.
    #[must_use]
    pub const fn new(index: i32) -> Self {
        Self(index)
    }

    /// Get the underlying i32 value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Get the index as usize for Rust collections.
    ///
    /// Returns 0 if somehow the index is negative, though this should never
    /// happen if the PageIndex was created through one of the checked
    /// constructors.
    #[must_use]
    #[allow(clippy::cast_sign_loss)] // Safe: we check for negative values
    pub const fn as_usize(self) -> usize {
        if self.0 < 0 { 0 } else { self.0 as usize }
    }

    /// Try to create a PageIndex from a 0-based usize page number.
    ///
    /// Returns an error if the page number is too large to fit in an i32
    /// or exceeds the total page count.
    pub fn try_from_page_num(page_num: usize, total_pages: usize) -> Result<Self, Error> {
        if page_num >= total_pages {
            return Err(Error::PdfInvalidPage {
                page: page_num,
                total: total_pages,
            });
        }

        let index = i32::try_from(page_num).map_err(|_| Error::PdfInvalidPage {
            page: page_num,
            total: total_pages,
        })?;

        Ok(Self(index))
    }

    /// Create a PageIndex from a 1-based page number as used at the API
    /// boundary.
    ///
    /// Rejects 0 and anything past the document's last page. This is the
    /// single place where user-facing page numbers become internal indices.
    pub fn from_page_number(page_number: usize, total_pages: usize) -> Result<Self, Error> {
        if page_number == 0 {
            return Err(Error::PdfInvalidPage {
                page: 0,
                total: total_pages,
            });
        }
        Self::try_from_page_num(page_number - 1, total_pages)
    }
}

impl TryFrom<usize> for PageIndex {
    type Error = Error;

    /// Convert a usize to a PageIndex.
    ///
    /// This conversion can fail if the value is too large to fit in an i32.
    /// For production use, prefer `try_from_page_num` which also validates
    /// against the document's page count.
    fn try_from(value: usize) -> Result<Self, Self::Error> {
        let index = i32::try_from(value).map_err(|_| Error::PdfInvalidPage {
            page: value,
            total: 0, // Unknown total when using raw conversion
        })?;
        Ok(Self(index))
    }
}

impl From<PageIndex> for i32 {
    fn from(index: PageIndex) -> Self {
        index.0
    }
}

impl fmt::Display for PageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_index_creation() {
        let idx = PageIndex::new(5);
        assert_eq!(idx.as_i32(), 5);
        assert_eq!(idx.as_usize(), 5);
    }

    #[test]
    fn test_try_from_usize() {
        let idx = PageIndex::try_from(10_usize).unwrap();
        assert_eq!(idx.as_i32(), 10);
    }

    #[test]
    fn test_try_from_page_num_valid() {
        let idx = PageIndex::try_from_page_num(5, 10).unwrap();
        assert_eq!(idx.as_i32(), 5);
    }

    #[test]
    fn test_try_from_page_num_out_of_range() {
        let result = PageIndex::try_from_page_num(10, 5);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_page_number_is_one_based() {
        let idx = PageIndex::from_page_number(1, 3).unwrap();
        assert_eq!(idx.as_usize(), 0);

        let idx = PageIndex::from_page_number(3, 3).unwrap();
        assert_eq!(idx.as_usize(), 2);
    }

    #[test]
    fn test_from_page_number_rejects_zero_and_past_end() {
        assert!(PageIndex::from_page_number(0, 3).is_err());
        assert!(PageIndex::from_page_number(4, 3).is_err());
    }

    #[test]
    fn test_into_i32() {
        let idx = PageIndex::new(42);
        let value: i32 = idx.into();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_display() {
        let idx = PageIndex::new(7);
        assert_eq!(format!("{idx}"), "7");
    }
}
