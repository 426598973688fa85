//! Inspect, warm and evict kernel page cache residency for files and
//! directory trees.

pub mod cache;
pub mod engine;
pub mod error;
pub mod platform;
pub mod stats;

pub use cache::{walk_files, Aggregate, PageCache};
pub use engine::{Engine, Operation};
pub use error::{PageCacheError, Result};
pub use platform::{EvictionPrimitive, Platform};
pub use stats::ResidencyStats;
