//! Eviction trait shared by the platform primitives.

use crate::error::Result;

use super::mapping::MappedRegion;

/// A kernel call that asks for a mapped file's pages to be dropped from the
/// page cache.
pub trait Evictor: Send + Sync {
    /// Returns the name of the underlying call, for diagnostics.
    fn name(&self) -> &'static str;

    /// Request eviction of every page backing `region`.
    fn evict(&self, region: &MappedRegion<'_>) -> Result<()>;
}
