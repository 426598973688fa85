//! Whole-mapping eviction via `msync(MS_INVALIDATE)`.

use crate::error::{PageCacheError, Result};

use super::mapping::MappedRegion;
use super::traits::Evictor;

pub struct MsyncEvictor;

impl Evictor for MsyncEvictor {
    fn name(&self) -> &'static str {
        "msync"
    }

    fn evict(&self, region: &MappedRegion<'_>) -> Result<()> {
        let rv = unsafe { libc::msync(region.as_ptr(), region.len(), libc::MS_INVALIDATE) };
        if rv == -1 {
            return Err(PageCacheError::last_os_error(self.name()));
        }
        Ok(())
    }
}
