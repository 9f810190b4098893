use capdeck::scanner::{Dataset, ScanError, SortKey, Walker, WalkerConfig};
use filetime::FileTime;
use std::fs;
use tempfile::tempdir;

fn names(dataset: &Dataset) -> Vec<String> {
    dataset
        .images()
        .iter()
        .map(|i| i.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_scan_only_images() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.png"), b"x").unwrap();
    fs::write(dir.path().join("a.txt"), b"caption").unwrap();
    fs::write(dir.path().join("b.JPEG"), b"x").unwrap();
    fs::write(dir.path().join("notes.md"), b"x").unwrap();

    let dataset = Dataset::scan(dir.path(), WalkerConfig::default()).unwrap();
    assert_eq!(names(&dataset), vec!["a.png", "b.JPEG"]);
}

#[test]
fn test_sort_by_size_then_path() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("small.png"), vec![0u8; 10]).unwrap();
    fs::write(dir.path().join("big.png"), vec![0u8; 100]).unwrap();
    fs::write(dir.path().join("also_small.png"), vec![0u8; 10]).unwrap();

    let mut dataset = Dataset::scan(dir.path(), WalkerConfig::default()).unwrap();
    dataset.sort(SortKey::Size);
    assert_eq!(
        names(&dataset),
        vec!["big.png", "also_small.png", "small.png"]
    );
}

#[test]
fn test_sort_by_modified() {
    let dir = tempdir().unwrap();
    for (name, secs) in [("a.png", 10), ("b.png", 30), ("c.png", 20)] {
        let path = dir.path().join(name);
        fs::write(&path, b"x").unwrap();
        filetime::set_file_mtime(&path, FileTime::from_unix_time(1_500_000_000 + secs, 0))
            .unwrap();
    }

    let mut dataset = Dataset::scan(dir.path(), WalkerConfig::default()).unwrap();
    dataset.sort(SortKey::Modified);
    assert_eq!(names(&dataset), vec!["b.png", "c.png", "a.png"]);

    dataset.sort(SortKey::Name);
    assert_eq!(names(&dataset), vec!["a.png", "b.png", "c.png"]);
}

#[test]
fn test_hidden_directories_skipped_recursively() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join(".thumbs")).unwrap();
    fs::create_dir(dir.path().join("set")).unwrap();
    fs::write(dir.path().join(".thumbs").join("x.png"), b"x").unwrap();
    fs::write(dir.path().join("set").join("y.png"), b"x").unwrap();

    let config = WalkerConfig {
        recursive: true,
        ..WalkerConfig::default()
    };
    let dataset = Dataset::scan(dir.path(), config).unwrap();
    assert_eq!(names(&dataset), vec!["y.png"]);
}

#[test]
fn test_bad_roots() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("a.png");
    fs::write(&file, b"x").unwrap();

    assert!(matches!(
        Dataset::scan(&dir.path().join("missing"), WalkerConfig::default()),
        Err(ScanError::NotFound(_))
    ));
    assert!(matches!(
        Dataset::scan(&file, WalkerConfig::default()),
        Err(ScanError::NotADirectory(_))
    ));
}

#[cfg(unix)]
#[test]
fn test_symlinks_only_when_following() {
    let dir = tempdir().unwrap();
    let outside = tempdir().unwrap();
    fs::write(outside.path().join("real.png"), b"x").unwrap();
    std::os::unix::fs::symlink(outside.path().join("real.png"), dir.path().join("link.png"))
        .unwrap();

    let skipped: Vec<_> = Walker::new(dir.path(), WalkerConfig::default())
        .walk()
        .filter_map(Result::ok)
        .collect();
    assert!(skipped.is_empty());

    let config = WalkerConfig {
        follow_symlinks: true,
        ..WalkerConfig::default()
    };
    let followed: Vec<_> = Walker::new(dir.path(), config)
        .walk()
        .filter_map(Result::ok)
        .collect();
    assert_eq!(followed.len(), 1);
}
