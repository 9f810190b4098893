use capdeck::cache::{CacheStore, MetadataCache};
use capdeck::config::Config;
use capdeck::session::{CacheLocation, ListOptions, Session};
use filetime::FileTime;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_png(path: &Path, width: u32, height: u32) {
    image::RgbImage::from_pixel(width, height, image::Rgb([1, 2, 3]))
        .save(path)
        .unwrap();
}

#[test]
fn test_entries_survive_session_restart() {
    let data = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let db = cache_dir.path().join("nested").join("metadata.db");
    write_png(&data.path().join("a.png"), 3, 3);
    write_png(&data.path().join("b.png"), 5, 5);
    fs::write(data.path().join("b.txt"), "a blue square").unwrap();

    let mut session = Session::open(Config::default(), CacheLocation::File(db.clone())).unwrap();
    let listing = session
        .list(data.path(), &ListOptions::default(), None)
        .unwrap();
    assert_eq!(listing.len(), 2);
    assert_eq!(session.cache().stats().misses, 2);
    session.close().unwrap();
    assert!(db.exists());

    let mut session = Session::open(Config::default(), CacheLocation::File(db)).unwrap();
    assert!(session.cache().is_empty());
    assert_eq!(session.cache().store().unwrap().count().unwrap(), 2);
    let listing = session
        .list(data.path(), &ListOptions::default(), None)
        .unwrap();

    assert_eq!(listing.images[1].caption_text, "a blue square");
    let stats = session.cache().stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 0);
    session.close().unwrap();
}

#[test]
fn test_persisted_entry_is_still_validated() {
    let data = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let db = cache_dir.path().join("metadata.db");
    let image = data.path().join("a.png");
    write_png(&image, 3, 3);
    filetime::set_file_mtime(&image, FileTime::from_unix_time(1_600_000_000, 0)).unwrap();

    let mut cache = MetadataCache::with_store(CacheStore::open(&db).unwrap(), 64);
    cache.get_or_compute(&image).unwrap();
    cache.close().unwrap();

    // Changed while no session was running.
    write_png(&image, 7, 1);
    filetime::set_file_mtime(&image, FileTime::from_unix_time(1_600_000_900, 0)).unwrap();

    let mut cache = MetadataCache::with_store(CacheStore::open(&db).unwrap(), 64);
    let entry = cache.get_or_compute(&image).unwrap();
    assert_eq!((entry.width, entry.height), (7, 1));
    assert_eq!(cache.stats().misses, 1);

    let stored = cache.store().unwrap().get(&image).unwrap().unwrap();
    assert_eq!(stored.width, 7);
}

#[test]
fn test_saved_caption_is_persisted() {
    let data = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let db = cache_dir.path().join("metadata.db");
    let image = data.path().join("a.png");
    write_png(&image, 2, 2);

    let mut cache = MetadataCache::with_store(CacheStore::open(&db).unwrap(), 64);
    cache.get_or_compute(&image).unwrap();
    cache.save_caption(&image, "persisted caption").unwrap();
    cache.close().unwrap();

    let mut cache = MetadataCache::with_store(CacheStore::open(&db).unwrap(), 64);
    assert_eq!(
        cache.store().unwrap().get(&image).unwrap().unwrap().caption_text,
        "persisted caption"
    );
    let entry = cache.get_or_compute(&image).unwrap();
    assert_eq!(entry.caption_text, "persisted caption");
    assert_eq!(cache.stats().hits, 1);
}

#[test]
fn test_invalidate_removes_from_store() {
    let data = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let db = cache_dir.path().join("metadata.db");
    let image = data.path().join("a.png");
    write_png(&image, 2, 2);

    let mut cache = MetadataCache::with_store(CacheStore::open(&db).unwrap(), 64);
    cache.get_or_compute(&image).unwrap();
    assert_eq!(cache.store().unwrap().count().unwrap(), 1);

    assert!(cache.invalidate(&image));
    assert!(!cache.invalidate(&image));
    assert_eq!(cache.store().unwrap().count().unwrap(), 0);
    assert_eq!(cache.stats().invalidations, 1);
}

#[test]
fn test_garbage_file_is_not_a_cache() {
    let cache_dir = tempdir().unwrap();
    let db = cache_dir.path().join("metadata.db");
    fs::write(&db, vec![b'x'; 4096]).unwrap();

    assert!(CacheStore::open(&db).is_err());
    assert!(Session::open(Config::default(), CacheLocation::File(db)).is_err());
}

#[test]
fn test_clear_empties_memory_and_store() {
    let data = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let db = cache_dir.path().join("metadata.db");
    write_png(&data.path().join("a.png"), 2, 2);
    write_png(&data.path().join("b.png"), 2, 2);

    let mut session = Session::open(Config::default(), CacheLocation::File(db.clone())).unwrap();
    session
        .list(data.path(), &ListOptions::default(), None)
        .unwrap();
    assert_eq!(session.cache_mut().clear().unwrap(), 2);
    session.close().unwrap();

    let session = Session::open(Config::default(), CacheLocation::File(db)).unwrap();
    assert_eq!(session.cache().store().unwrap().count().unwrap(), 0);
}

#[test]
fn test_reopened_store_loads_only_requested_entries() {
    let other = tempdir().unwrap();
    let data = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let db = cache_dir.path().join("metadata.db");
    for i in 0..20 {
        write_png(&other.path().join(format!("img{i:02}.png")), 4, 4);
    }
    let image = data.path().join("target.png");
    write_png(&image, 6, 2);

    let mut session = Session::open(Config::default(), CacheLocation::File(db.clone())).unwrap();
    session
        .list(other.path(), &ListOptions::default(), None)
        .unwrap();
    session.entry(&image).unwrap();
    session.close().unwrap();

    let mut cache = MetadataCache::with_store(CacheStore::open(&db).unwrap(), 64);
    assert!(cache.is_empty());
    assert_eq!(cache.store().unwrap().count().unwrap(), 21);

    let entry = cache.get_or_compute(&image).unwrap();
    assert_eq!((entry.width, entry.height), (6, 2));
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.stats().hits, 1);
    assert_eq!(cache.stats().misses, 0);
}

#[test]
fn test_prune_reaches_entries_not_loaded() {
    let data = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let db = cache_dir.path().join("metadata.db");
    let keep = data.path().join("keep.png");
    let gone = data.path().join("gone.png");
    write_png(&keep, 2, 2);
    write_png(&gone, 2, 2);

    let mut cache = MetadataCache::with_store(CacheStore::open(&db).unwrap(), 64);
    cache.get_or_compute(&keep).unwrap();
    cache.get_or_compute(&gone).unwrap();
    cache.close().unwrap();
    fs::remove_file(&gone).unwrap();

    let mut cache = MetadataCache::with_store(CacheStore::open(&db).unwrap(), 64);
    assert_eq!(cache.prune(), 1);
    let store = cache.store().unwrap();
    assert_eq!(store.count().unwrap(), 1);
    assert!(store.get(&keep).unwrap().is_some());
}

#[test]
fn test_batched_listing_is_persisted() {
    let data = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let db = cache_dir.path().join("metadata.db");
    for i in 0..5 {
        write_png(&data.path().join(format!("img{i}.png")), 3, 3);
    }

    let mut session = Session::open(Config::default(), CacheLocation::File(db.clone())).unwrap();
    session
        .list(data.path(), &ListOptions::default(), None)
        .unwrap();
    session.close().unwrap();

    let store = CacheStore::open(&db).unwrap();
    assert_eq!(store.count().unwrap(), 5);
}
