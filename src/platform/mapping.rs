//! Read-only shared memory mappings of whole files.

use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::ptr::{self, NonNull};

use crate::error::{PageCacheError, Result};

/// A read-only `MAP_SHARED` mapping of a file, unmapped on drop.
///
/// The region borrows the file it maps, so the descriptor stays open for as
/// long as the mapping exists.
#[derive(Debug)]
pub struct MappedRegion<'a> {
    addr: NonNull<libc::c_void>,
    len: usize,
    file: &'a File,
}

impl<'a> MappedRegion<'a> {
    /// Map the first `len` bytes of `file`. `len` must be non-zero.
    pub(crate) fn map(file: &'a File, len: usize) -> Result<Self> {
        if len == 0 {
            return Err(PageCacheError::Syscall {
                call: "mmap",
                source: std::io::Error::from_raw_os_error(libc::EINVAL),
            });
        }

        let addr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                0,
            )
        };
        if addr == libc::MAP_FAILED {
            return Err(PageCacheError::last_os_error("mmap"));
        }
        let addr = NonNull::new(addr).ok_or_else(|| PageCacheError::last_os_error("mmap"))?;

        Ok(Self { addr, len, file })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn file(&self) -> &File {
        self.file
    }

    pub(crate) fn as_ptr(&self) -> *mut libc::c_void {
        self.addr.as_ptr()
    }

    /// The mapped bytes. Reading an element faults its page in.
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: the mapping is PROT_READ, `len` bytes long and lives until drop.
        unsafe { std::slice::from_raw_parts(self.addr.as_ptr().cast::<u8>(), self.len) }
    }
}

impl Drop for MappedRegion<'_> {
    fn drop(&mut self) {
        let rv = unsafe { libc::munmap(self.addr.as_ptr(), self.len) };
        if rv == -1 {
            let err = PageCacheError::last_os_error("munmap");
            tracing::warn!("{} ({} bytes)", err, self.len);
        }
    }
}
