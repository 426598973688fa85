//! Byte-range advisory eviction via `posix_fadvise(POSIX_FADV_DONTNEED)`.

use crate::error::{PageCacheError, Result};

use super::mapping::MappedRegion;
use super::traits::Evictor;

pub struct FadviseEvictor;

impl Evictor for FadviseEvictor {
    fn name(&self) -> &'static str {
        "posix_fadvise"
    }

    #[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
    fn evict(&self, region: &MappedRegion<'_>) -> Result<()> {
        use std::os::unix::io::AsRawFd;

        let len = libc::off_t::try_from(region.len()).map_err(|_| PageCacheError::Syscall {
            call: self.name(),
            source: std::io::Error::from_raw_os_error(libc::EOVERFLOW),
        })?;

        // posix_fadvise returns the error number instead of setting errno.
        let rv = unsafe {
            libc::posix_fadvise(
                region.file().as_raw_fd(),
                0,
                len,
                libc::POSIX_FADV_DONTNEED,
            )
        };
        if rv != 0 {
            return Err(PageCacheError::Syscall {
                call: self.name(),
                source: std::io::Error::from_raw_os_error(rv),
            });
        }
        Ok(())
    }

    #[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
    fn evict(&self, _region: &MappedRegion<'_>) -> Result<()> {
        Err(PageCacheError::Syscall {
            call: self.name(),
            source: std::io::Error::from(std::io::ErrorKind::Unsupported),
        })
    }
}
