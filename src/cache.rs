//! Page cache operations over files and directory trees.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::engine::{Engine, Operation};
use crate::error::{PageCacheError, Result};
use crate::platform::Platform;
use crate::stats::ResidencyStats;

/// Result of running an operation over a path, with per-file bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    /// Combined stats, or `None` when no file produced a result.
    pub stats: Option<ResidencyStats>,
    /// Files that produced a result.
    pub files: usize,
    /// Files that could not be opened or mapped.
    pub skipped: usize,
}

/// Entry point for touch, evict and stats on a file or directory.
#[derive(Debug, Clone)]
pub struct PageCache {
    engine: Engine,
}

impl PageCache {
    pub fn new(platform: Platform) -> Self {
        Self {
            engine: Engine::new(platform),
        }
    }

    pub fn platform(&self) -> &Platform {
        self.engine.platform()
    }

    /// Warm the page cache for every file under `path`.
    pub fn touch(&self, path: impl AsRef<Path>) -> Result<Option<ResidencyStats>> {
        self.run(path, Operation::Touch)
    }

    /// Drop every file under `path` from the page cache.
    pub fn evict(&self, path: impl AsRef<Path>) -> Result<Option<ResidencyStats>> {
        self.run(path, Operation::Evict)
    }

    /// Report page cache residency for every file under `path`.
    pub fn stats(&self, path: impl AsRef<Path>) -> Result<Option<ResidencyStats>> {
        self.run(path, Operation::Stats)
    }

    pub fn run(&self, path: impl AsRef<Path>, operation: Operation) -> Result<Option<ResidencyStats>> {
        Ok(self.run_detailed(path, operation)?.stats)
    }

    /// Like [`PageCache::run`], also counting processed and skipped files.
    pub fn run_detailed(&self, path: impl AsRef<Path>, operation: Operation) -> Result<Aggregate> {
        let path = path.as_ref();
        let metadata = fs::metadata(path).map_err(|source| PageCacheError::InvalidPath {
            path: path.to_path_buf(),
            source,
        })?;

        if metadata.is_file() {
            let stats = self.engine.run(path, operation);
            let files = usize::from(stats.is_some());
            return Ok(Aggregate {
                stats,
                files,
                skipped: 1 - files,
            });
        }

        if !metadata.is_dir() {
            return Err(PageCacheError::UnsupportedObjectType(path.to_path_buf()));
        }

        let mut results = Vec::new();
        let mut skipped = 0;
        for file in walk_files(path) {
            match self.engine.run(&file, operation) {
                Some(stats) => results.push(stats),
                None => skipped += 1,
            }
        }

        tracing::debug!(
            path = %path.display(),
            %operation,
            files = results.len(),
            skipped,
            "walked directory"
        );

        Ok(Aggregate {
            files: results.len(),
            stats: ResidencyStats::combine(results),
            skipped,
        })
    }
}

/// Every regular file under `dir`, recursively.
///
/// Symlinks to regular files are included; symlinked directories are not
/// descended into. Unreadable entries are logged and skipped.
pub fn walk_files(dir: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| {
            let file_type = entry.file_type();
            if file_type.is_file() {
                return true;
            }
            if file_type.is_symlink() {
                return fs::metadata(entry.path()).is_ok_and(|m| m.is_file());
            }
            if !file_type.is_dir() {
                tracing::debug!("Skipping non-regular file: {}", entry.path().display());
            }
            false
        })
        .map(|entry| entry.into_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn walk_files_recurses_and_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("a")).unwrap();
        fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        File::create(dir.path().join("sub/b")).unwrap();
        File::create(dir.path().join("sub/deeper/c")).unwrap();

        let mut names: Vec<_> = walk_files(dir.path())
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a"),
                PathBuf::from("sub/b"),
                PathBuf::from("sub/deeper/c")
            ]
        );
    }

    #[test]
    fn walk_files_follows_file_symlinks_only() {
        let dir = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        File::create(target.path().join("inside")).unwrap();
        File::create(dir.path().join("real")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();
        std::os::unix::fs::symlink(target.path(), dir.path().join("dirlink")).unwrap();

        let mut names: Vec<_> = walk_files(dir.path())
            .map(|p| p.file_name().unwrap().to_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["link", "real"]);
    }

    #[test]
    fn single_file_counts_as_one() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let cache = PageCache::new(Platform::detect().unwrap());
        let agg = cache.run_detailed(file.path(), Operation::Stats).unwrap();
        assert_eq!(agg.files, 1);
        assert_eq!(agg.skipped, 0);
        assert_eq!(agg.stats.unwrap().total_pages(), 0);
    }
}
