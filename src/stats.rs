//! Residency statistics for a single file or an aggregate of many.

use std::fmt;

/// Page cache coverage of a file, or of a set of files once combined.
///
/// `total_pages` is derived from `file_size` and `page_size` at construction.
/// The only exception is [`ResidencyStats::combine`], which sums the per-file
/// page counts (the sum of per-file ceilings is not the ceiling of the summed
/// size).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResidencyStats {
    file_size: u64,
    page_size: usize,
    cached_pages: u64,
    total_pages: u64,
}

impl ResidencyStats {
    /// Panics if `page_size` is zero.
    pub fn new(file_size: u64, page_size: usize, cached_pages: u64) -> Self {
        assert!(page_size > 0, "page size must be non-zero");
        let total_pages = file_size.div_ceil(page_size as u64);
        Self {
            file_size,
            page_size,
            cached_pages: cached_pages.min(total_pages),
            total_pages,
        }
    }

    /// Stats for a zero-byte file.
    pub fn empty(page_size: usize) -> Self {
        Self::new(0, page_size, 0)
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn cached_pages(&self) -> u64 {
        self.cached_pages
    }

    pub fn total_pages(&self) -> u64 {
        self.total_pages
    }

    /// Percentage of pages resident, rounded down. `0` when there are no pages.
    pub fn cached_percent(&self) -> u64 {
        if self.total_pages == 0 {
            0
        } else {
            self.cached_pages * 100 / self.total_pages
        }
    }

    /// Folds per-file stats into one aggregate.
    ///
    /// Returns `None` when there is nothing to combine, so callers can tell
    /// "no files" apart from "files with zero pages".
    pub fn combine<I>(stats: I) -> Option<Self>
    where
        I: IntoIterator<Item = ResidencyStats>,
    {
        let mut iter = stats.into_iter();
        let first = iter.next()?;
        Some(iter.fold(first, |agg, s| Self {
            file_size: agg.file_size + s.file_size,
            page_size: agg.page_size,
            cached_pages: agg.cached_pages + s.cached_pages,
            total_pages: agg.total_pages + s.total_pages,
        }))
    }
}

impl fmt::Display for ResidencyStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Page cache stats: [{}/{}] ({}%)",
            self.cached_pages,
            self.total_pages,
            self.cached_percent()
        )
    }
}
