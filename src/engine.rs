//! Page-residency engine: runs one operation against one regular file.

use std::fmt;
use std::fs::File;
use std::hint::black_box;
use std::path::Path;
use std::str::FromStr;

use crate::error::{PageCacheError, Result};
use crate::platform::{MappedRegion, Platform};
use crate::stats::ResidencyStats;

/// What to do with a file's pages before measuring residency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Fault every page into the cache.
    Touch,
    /// Ask the kernel to drop the file's cached pages.
    Evict,
    /// Measure only.
    Stats,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Touch => "touch",
            Operation::Evict => "evict",
            Operation::Stats => "stats",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = PageCacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "touch" => Ok(Operation::Touch),
            "evict" => Ok(Operation::Evict),
            "stats" => Ok(Operation::Stats),
            other => Err(PageCacheError::UnsupportedOperation(other.to_string())),
        }
    }
}

/// Runs operations against single files using the resolved platform primitives.
#[derive(Debug, Clone)]
pub struct Engine {
    platform: Platform,
}

impl Engine {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Run `operation` on the regular file at `path` and report its residency.
    ///
    /// Returns `None` when the file cannot be opened or mapped. Eviction and
    /// residency-query failures are logged and do not abort the file.
    pub fn run(&self, path: &Path, operation: Operation) -> Option<ResidencyStats> {
        let page_size = self.platform.page_size();

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!("Failed to open {}: {}", path.display(), e);
                return None;
            }
        };
        let file_size = match file.metadata() {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                tracing::warn!("Failed to stat {}: {}", path.display(), e);
                return None;
            }
        };

        if file_size == 0 {
            return Some(ResidencyStats::empty(page_size));
        }

        let Ok(len) = usize::try_from(file_size) else {
            tracing::warn!(
                "Failed to mmap {}: {} bytes exceeds the address space",
                path.display(),
                file_size
            );
            return None;
        };

        let region = match self.platform.map(&file, len) {
            Ok(region) => region,
            Err(e) => {
                tracing::warn!("Failed to mmap {}: {}", path.display(), e);
                return None;
            }
        };

        match operation {
            Operation::Touch => touch_pages(&region, page_size),
            Operation::Evict => {
                if let Err(e) = self.platform.evict(&region) {
                    tracing::warn!("{}: {} ({} bytes)", path.display(), e, len);
                }
            }
            Operation::Stats => {}
        }

        let cached_pages = self.platform.resident_pages(&region).unwrap_or_else(|e| {
            tracing::warn!("{}: {} ({} bytes)", path.display(), e, len);
            0
        });
        drop(region);

        tracing::debug!(
            path = %path.display(),
            %operation,
            file_size,
            cached_pages,
            "processed file"
        );

        Some(ResidencyStats::new(file_size, page_size, cached_pages))
    }
}

/// Read the first byte of every page, in order, to fault it into the cache.
fn touch_pages(region: &MappedRegion<'_>, page_size: usize) {
    for byte in region.as_slice().iter().step_by(page_size) {
        black_box(*byte);
    }
}
