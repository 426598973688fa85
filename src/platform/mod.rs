//! Platform syscall adapter.
//!
//! Resolves the host page size and eviction primitive once, then exposes
//! `mmap`, `mincore` and eviction as calls returning [`Result`].

mod fadvise;
mod mapping;
mod msync;
mod traits;

use std::fmt;
use std::fs::File;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{PageCacheError, Result};

pub use fadvise::FadviseEvictor;
pub use mapping::MappedRegion;
pub use msync::MsyncEvictor;
pub use traits::Evictor;

const HAS_FADVISE: bool = cfg!(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd"
));

const HAS_MSYNC_INVALIDATE: bool = cfg!(any(target_os = "macos", target_os = "ios"));

/// Which kernel call is used to drop a file's pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPrimitive {
    /// `posix_fadvise(fd, 0, len, POSIX_FADV_DONTNEED)`
    ByteRangeAdvisory,
    /// `msync(addr, len, MS_INVALIDATE)`
    InvalidateSync,
}

impl EvictionPrimitive {
    /// Pick the primitive for this host, preferring the byte-range advisory.
    pub fn detect() -> Result<Self> {
        if HAS_FADVISE {
            Ok(Self::ByteRangeAdvisory)
        } else if HAS_MSYNC_INVALIDATE {
            Ok(Self::InvalidateSync)
        } else {
            Err(PageCacheError::Configuration(format!(
                "unsupported platform '{}': neither posix_fadvise nor msync is available",
                std::env::consts::OS
            )))
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ByteRangeAdvisory => "byte-range-advisory",
            Self::InvalidateSync => "invalidate-sync",
        }
    }

    fn evictor(self) -> Result<Arc<dyn Evictor>> {
        match self {
            Self::ByteRangeAdvisory if !HAS_FADVISE => Err(PageCacheError::Configuration(
                format!("posix_fadvise is not available on '{}'", std::env::consts::OS),
            )),
            Self::ByteRangeAdvisory => Ok(Arc::new(FadviseEvictor)),
            Self::InvalidateSync => Ok(Arc::new(MsyncEvictor)),
        }
    }
}

impl fmt::Display for EvictionPrimitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EvictionPrimitive {
    type Err = PageCacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "byte-range-advisory" | "fadvise" => Ok(Self::ByteRangeAdvisory),
            "invalidate-sync" | "msync" => Ok(Self::InvalidateSync),
            other => Err(PageCacheError::Configuration(format!(
                "unknown eviction primitive '{}'. Available: byte-range-advisory, invalidate-sync",
                other
            ))),
        }
    }
}

/// The resolved set of kernel primitives for this host.
#[derive(Clone)]
pub struct Platform {
    page_size: usize,
    eviction: EvictionPrimitive,
    evictor: Arc<dyn Evictor>,
}

impl Platform {
    /// Resolve page size and eviction primitive for the running host.
    pub fn detect() -> Result<Self> {
        Self::with_eviction(EvictionPrimitive::detect()?)
    }

    /// Like [`Platform::detect`], with an explicitly chosen eviction primitive.
    pub fn with_eviction(eviction: EvictionPrimitive) -> Result<Self> {
        if !(HAS_FADVISE || HAS_MSYNC_INVALIDATE) {
            return Err(PageCacheError::Configuration(format!(
                "unsupported platform '{}'",
                std::env::consts::OS
            )));
        }

        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if page_size <= 0 {
            return Err(PageCacheError::Configuration(format!(
                "cannot determine page size: {}",
                std::io::Error::last_os_error()
            )));
        }

        let evictor = eviction.evictor()?;
        tracing::debug!(
            page_size,
            eviction = %eviction,
            call = evictor.name(),
            "resolved platform primitives"
        );

        Ok(Self {
            page_size: page_size as usize,
            eviction,
            evictor,
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn eviction(&self) -> EvictionPrimitive {
        self.eviction
    }

    /// Number of pages spanned by `len` bytes.
    pub fn num_pages(&self, len: usize) -> usize {
        len.div_ceil(self.page_size)
    }

    /// Map `len` bytes of `file` read-only and shared, from offset 0.
    pub fn map<'a>(&self, file: &'a File, len: usize) -> Result<MappedRegion<'a>> {
        MappedRegion::map(file, len)
    }

    /// Count the pages of `region` currently resident in the page cache.
    pub fn resident_pages(&self, region: &MappedRegion<'_>) -> Result<u64> {
        let mut vec = vec![0u8; self.num_pages(region.len())];
        let rv = unsafe { libc::mincore(region.as_ptr() as _, region.len(), vec.as_mut_ptr() as _) };
        if rv == -1 {
            return Err(PageCacheError::last_os_error("mincore"));
        }
        Ok(vec.iter().filter(|&&page| page & 1 == 1).count() as u64)
    }

    /// Ask the kernel to drop the cached pages backing `region`.
    pub fn evict(&self, region: &MappedRegion<'_>) -> Result<()> {
        self.evictor.evict(region)
    }
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform")
            .field("page_size", &self.page_size)
            .field("eviction", &self.eviction)
            .finish()
    }
}

impl PartialEq for Platform {
    fn eq(&self, other: &Self) -> bool {
        self.page_size == other.page_size && self.eviction == other.eviction
    }
}
