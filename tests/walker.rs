use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use pagecache::{Operation, PageCache, PageCacheError, Platform};

fn cache() -> PageCache {
    PageCache::new(Platform::detect().unwrap())
}

fn write_file(path: &Path, len: usize) {
    let mut file = File::create(path).unwrap();
    file.write_all(&vec![0x5a; len]).unwrap();
    file.sync_all().unwrap();
}

fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[test]
fn directory_aggregates_page_counts() {
    let cache = cache();
    let ps = cache.platform().page_size();
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir.path().join("empty"), 0);
    write_file(&dir.path().join("one"), ps);
    fs::create_dir(dir.path().join("nested")).unwrap();
    write_file(&dir.path().join("nested/two"), 2 * ps);

    let stats = cache.stats(dir.path()).unwrap().unwrap();
    assert_eq!(stats.total_pages(), 3);
    assert_eq!(stats.file_size(), (3 * ps) as u64);
    assert_eq!(stats.page_size(), ps);
    assert!(stats.cached_pages() <= 3);
}

#[test]
fn touch_then_stats_reports_full_residency() {
    let cache = cache();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warm");
    write_file(&path, cache.platform().page_size());

    cache.touch(&path).unwrap().unwrap();
    let stats = cache.stats(&path).unwrap().unwrap();
    assert_eq!(stats.cached_pages(), 1);
    assert_eq!(stats.total_pages(), 1);
    assert_eq!(stats.to_string(), "Page cache stats: [1/1] (100%)");
}

#[test]
fn evict_never_increases_residency() {
    let cache = cache();
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir.path().join("a"), 8 * cache.platform().page_size());
    write_file(&dir.path().join("b"), 3 * cache.platform().page_size() + 17);

    let before = cache.touch(dir.path()).unwrap().unwrap();
    let after = cache.evict(dir.path()).unwrap().unwrap();
    assert!(after.cached_pages() <= before.cached_pages());
    assert_eq!(after.total_pages(), before.total_pages());
}

#[test]
fn empty_directory_has_nothing_to_report() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("also-empty")).unwrap();
    assert_eq!(cache().stats(dir.path()).unwrap(), None);
}

#[test]
fn zero_byte_file_is_reported_not_absent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zero");
    write_file(&path, 0);

    let stats = cache().stats(&path).unwrap().unwrap();
    assert_eq!(stats.to_string(), "Page cache stats: [0/0] (0%)");
}

#[test]
fn missing_path_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let err = cache().stats(dir.path().join("nope")).unwrap_err();
    assert!(matches!(err, PageCacheError::InvalidPath { .. }));
    assert_eq!(err.os_error(), Some(libc::ENOENT));
}

#[test]
fn socket_is_unsupported_object_type() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sock");
    let _listener = std::os::unix::net::UnixListener::bind(&path).unwrap();

    let err = cache().run(&path, Operation::Stats).unwrap_err();
    assert!(matches!(err, PageCacheError::UnsupportedObjectType(p) if p == path));
}

#[test]
fn sockets_inside_directory_are_skipped() {
    let cache = cache();
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir.path().join("data"), cache.platform().page_size());
    let _listener = std::os::unix::net::UnixListener::bind(dir.path().join("sock")).unwrap();

    let agg = cache.run_detailed(dir.path(), Operation::Stats).unwrap();
    assert_eq!(agg.files, 1);
    assert_eq!(agg.skipped, 0);
    assert_eq!(agg.stats.unwrap().total_pages(), 1);
}

#[test]
fn unreadable_file_is_excluded_from_aggregate() {
    use std::os::unix::fs::PermissionsExt;

    if is_root() {
        eprintln!("skipping: permission checks do not apply to root");
        return;
    }

    let cache = cache();
    let ps = cache.platform().page_size();
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir.path().join("readable"), ps);
    let locked = dir.path().join("locked");
    write_file(&locked, 4 * ps);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    let agg = cache.run_detailed(dir.path(), Operation::Stats).unwrap();
    assert_eq!(agg.files, 1);
    assert_eq!(agg.skipped, 1);
    let stats = agg.stats.unwrap();
    assert_eq!(stats.total_pages(), 1);
    assert_eq!(stats.file_size(), ps as u64);
}

#[test]
fn all_files_unreadable_is_absent() {
    use std::os::unix::fs::PermissionsExt;

    if is_root() {
        eprintln!("skipping: permission checks do not apply to root");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let locked = dir.path().join("locked");
    write_file(&locked, 1024);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    assert_eq!(cache().stats(dir.path()).unwrap(), None);
    assert_eq!(cache().stats(&locked).unwrap(), None);
}
