use capdeck::cache::{CacheError, MetadataCache};
use filetime::FileTime;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_png(path: &Path, width: u32, height: u32) {
    image::RgbImage::from_pixel(width, height, image::Rgb([200, 100, 50]))
        .save(path)
        .unwrap();
}

#[test]
fn test_second_lookup_does_not_read_the_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cat.png");
    write_png(&path, 4, 3);

    let mut cache = MetadataCache::new(64);
    let first = cache.get_or_compute(&path).unwrap().clone();
    assert_eq!((first.width, first.height), (4, 3));

    // Replace the content with garbage of the same length and put the
    // modification time back. A re-read would fail to decode.
    let original = fs::metadata(&path).unwrap();
    let mtime = FileTime::from_last_modification_time(&original);
    fs::write(&path, vec![0u8; original.len() as usize]).unwrap();
    filetime::set_file_mtime(&path, mtime).unwrap();

    let second = cache.get_or_compute(&path).unwrap().clone();
    assert_eq!(second, first);

    let stats = cache.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
}

#[test]
fn test_mtime_change_recomputes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cat.png");
    write_png(&path, 4, 4);
    filetime::set_file_mtime(&path, FileTime::from_unix_time(1_600_000_000, 0)).unwrap();

    let mut cache = MetadataCache::new(64);
    assert_eq!(cache.get_or_compute(&path).unwrap().width, 4);

    write_png(&path, 8, 2);
    filetime::set_file_mtime(&path, FileTime::from_unix_time(1_600_000_100, 0)).unwrap();

    let entry = cache.get_or_compute(&path).unwrap();
    assert_eq!((entry.width, entry.height), (8, 2));
    assert_eq!(cache.stats().misses, 2);
    assert_eq!(cache.stats().hits, 0);
}

#[test]
fn test_save_caption_is_reflected_as_hit() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cat.png");
    write_png(&path, 2, 2);

    let mut cache = MetadataCache::new(64);
    assert_eq!(cache.get_or_compute(&path).unwrap().caption_text, "");

    cache.save_caption(&path, "  a small cat\n").unwrap();
    assert_eq!(
        fs::read_to_string(dir.path().join("cat.txt")).unwrap(),
        "  a small cat\n"
    );

    let entry = cache.get_or_compute(&path).unwrap();
    assert_eq!(entry.caption_text, "a small cat");
    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.caption_refreshes, 0);
}

#[test]
fn test_external_caption_edit_refreshes_caption_only() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cat.png");
    let sidecar = dir.path().join("cat.txt");
    write_png(&path, 2, 2);
    fs::write(&sidecar, "first").unwrap();
    filetime::set_file_mtime(&sidecar, FileTime::from_unix_time(1_600_000_000, 0)).unwrap();

    let mut cache = MetadataCache::new(64);
    assert_eq!(cache.get_or_compute(&path).unwrap().caption_text, "first");

    fs::write(&sidecar, "second edit").unwrap();
    filetime::set_file_mtime(&sidecar, FileTime::from_unix_time(1_600_000_500, 0)).unwrap();

    assert_eq!(cache.get_or_compute(&path).unwrap().caption_text, "second edit");
    let stats = cache.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.caption_refreshes, 1);
}

#[test]
fn test_removed_caption_clears_text() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cat.png");
    write_png(&path, 2, 2);
    fs::write(dir.path().join("cat.txt"), "a cat").unwrap();

    let mut cache = MetadataCache::new(64);
    assert!(cache.get_or_compute(&path).unwrap().has_caption());

    fs::remove_file(dir.path().join("cat.txt")).unwrap();
    let entry = cache.get_or_compute(&path).unwrap();
    assert!(!entry.has_caption());
    assert!(entry.caption_stamp.is_none());
}

#[test]
fn test_deleted_image_is_an_io_error_and_dropped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cat.png");
    write_png(&path, 2, 2);

    let mut cache = MetadataCache::new(64);
    cache.get_or_compute(&path).unwrap();
    fs::remove_file(&path).unwrap();

    let err = cache.get_or_compute(&path).unwrap_err();
    assert!(matches!(err, CacheError::Io { .. }));
    assert!(cache.peek(&path).is_none());
    assert!(cache.is_empty());
}

#[test]
fn test_corrupt_image_is_a_decode_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.png");
    fs::write(&path, b"definitely not a png").unwrap();

    let mut cache = MetadataCache::new(64);
    let err = cache.get_or_compute(&path).unwrap_err();
    assert!(err.is_decode());
    assert!(cache.is_empty());
}

#[test]
fn test_image_turning_corrupt_drops_entry() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cat.png");
    write_png(&path, 2, 2);
    filetime::set_file_mtime(&path, FileTime::from_unix_time(1_600_000_000, 0)).unwrap();

    let mut cache = MetadataCache::new(64);
    cache.get_or_compute(&path).unwrap();

    fs::write(&path, b"garbage").unwrap();
    let err = cache.get_or_compute(&path).unwrap_err();
    assert!(err.is_decode());
    assert!(cache.peek(&path).is_none());
}

#[test]
fn test_thumbnail_respects_configured_size() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wide.png");
    write_png(&path, 300, 100);

    let mut cache = MetadataCache::new(30);
    let entry = cache.get_or_compute(&path).unwrap();
    let thumb = image::load_from_memory(&entry.thumbnail_data).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (30, 10));
}
