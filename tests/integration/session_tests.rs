use capdeck::actions::ActionError;
use capdeck::caption::{CaptionEdit, Scope};
use capdeck::config::Config;
use capdeck::progress::{ProgressCallback, PHASE_PROBING, PHASE_SCANNING};
use capdeck::scanner::SortKey;
use capdeck::session::{CacheLocation, ListOptions, Session};
use filetime::FileTime;
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_png(path: &Path, width: u32, height: u32) {
    image::RgbImage::from_pixel(width, height, image::Rgb([9, 9, 9]))
        .save(path)
        .unwrap();
}

fn memory_session() -> Session {
    Session::open(Config::default(), CacheLocation::Memory).unwrap()
}

#[derive(Default)]
struct Recorder {
    events: RefCell<Vec<String>>,
}

impl ProgressCallback for Recorder {
    fn on_phase_start(&self, phase: &str, total: usize) {
        self.events.borrow_mut().push(format!("start {phase} {total}"));
    }

    fn on_progress(&self, current: usize, _path: &str) {
        self.events.borrow_mut().push(format!("item {current}"));
    }

    fn on_phase_end(&self, phase: &str) {
        self.events.borrow_mut().push(format!("end {phase}"));
    }
}

#[test]
fn test_list_reports_progress_phases() {
    let dir = tempdir().unwrap();
    write_png(&dir.path().join("a.png"), 2, 2);
    write_png(&dir.path().join("b.png"), 2, 2);

    let recorder = Recorder::default();
    let mut session = memory_session();
    session
        .list(dir.path(), &ListOptions::default(), Some(&recorder))
        .unwrap();

    let events = recorder.events.borrow();
    assert_eq!(
        *events,
        vec![
            format!("start {PHASE_SCANNING} 0"),
            format!("end {PHASE_SCANNING}"),
            format!("start {PHASE_PROBING} 2"),
            "item 1".to_string(),
            "item 2".to_string(),
            format!("end {PHASE_PROBING}"),
        ]
    );
}

#[test]
fn test_list_sorted_by_modified_newest_first() {
    let dir = tempdir().unwrap();
    for (name, secs) in [("old.png", 1_000), ("new.png", 3_000), ("mid.png", 2_000)] {
        let path = dir.path().join(name);
        write_png(&path, 2, 2);
        filetime::set_file_mtime(&path, FileTime::from_unix_time(1_600_000_000 + secs, 0))
            .unwrap();
    }

    let mut session = memory_session();
    let options = ListOptions {
        sort: SortKey::Modified,
        ..ListOptions::default()
    };
    let listing = session.list(dir.path(), &options, None).unwrap();
    let names: Vec<String> = listing.images.iter().map(|e| e.file_name()).collect();
    assert_eq!(names, vec!["new.png", "mid.png", "old.png"]);
}

#[test]
fn test_list_recursive_option() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    write_png(&dir.path().join("a.png"), 2, 2);
    write_png(&dir.path().join("sub").join("b.png"), 2, 2);

    let mut session = memory_session();
    let flat = session
        .list(dir.path(), &ListOptions::default(), None)
        .unwrap();
    assert_eq!(flat.len(), 1);

    let options = ListOptions {
        recursive: true,
        ..ListOptions::default()
    };
    let deep = session.list(dir.path(), &options, None).unwrap();
    assert_eq!(deep.len(), 2);
}

#[test]
fn test_batch_append_to_captioned_only() {
    let dir = tempdir().unwrap();
    write_png(&dir.path().join("a.png"), 2, 2);
    write_png(&dir.path().join("b.png"), 2, 2);
    fs::write(dir.path().join("a.txt"), "a cat").unwrap();

    let mut session = memory_session();
    let result = session
        .apply_caption_edit(
            dir.path(),
            &ListOptions::default(),
            &CaptionEdit::Append(", photo".to_string()),
            Scope::Captioned,
        )
        .unwrap();

    assert_eq!(result.processed_count(), 1);
    assert!(result.all_succeeded());
    assert_eq!(
        fs::read_to_string(dir.path().join("a.txt")).unwrap(),
        "a cat, photo"
    );
    assert!(!dir.path().join("b.txt").exists());

    // The cache reflects the edit without decoding again.
    let entry = session.entry(&dir.path().join("a.png")).unwrap();
    assert_eq!(entry.caption_text, "a cat, photo");
    assert_eq!(session.cache().stats().misses, 2);
}

#[test]
fn test_batch_replace_ignoring_case() {
    let dir = tempdir().unwrap();
    write_png(&dir.path().join("a.png"), 2, 2);
    fs::write(dir.path().join("a.txt"), "Cat and CAT and cat.").unwrap();

    let mut session = memory_session();
    session
        .apply_caption_edit(
            dir.path(),
            &ListOptions::default(),
            &CaptionEdit::Replace {
                search: "cat".to_string(),
                replacement: "dog".to_string(),
                match_case: false,
            },
            Scope::All,
        )
        .unwrap();

    assert_eq!(
        fs::read_to_string(dir.path().join("a.txt")).unwrap(),
        "dog and dog and dog."
    );
}

#[test]
fn test_batch_respects_search_filter() {
    let dir = tempdir().unwrap();
    write_png(&dir.path().join("a.png"), 2, 2);
    write_png(&dir.path().join("b.png"), 2, 2);
    fs::write(dir.path().join("a.txt"), "a cat").unwrap();
    fs::write(dir.path().join("b.txt"), "a dog").unwrap();

    let mut session = memory_session();
    let result = session
        .apply_caption_edit(
            dir.path(),
            &ListOptions::default().with_search("DOG"),
            &CaptionEdit::Prepend("photo of ".to_string()),
            Scope::All,
        )
        .unwrap();

    assert_eq!(result.processed_count(), 1);
    assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "a cat");
    assert_eq!(
        fs::read_to_string(dir.path().join("b.txt")).unwrap(),
        "photo of a dog"
    );
}

#[test]
fn test_batch_reports_unreadable_images() {
    let dir = tempdir().unwrap();
    write_png(&dir.path().join("a.png"), 2, 2);
    fs::write(dir.path().join("broken.png"), b"nope").unwrap();

    let mut session = memory_session();
    let result = session
        .apply_caption_edit(
            dir.path(),
            &ListOptions::default(),
            &CaptionEdit::Set("x".to_string()),
            Scope::All,
        )
        .unwrap();

    assert_eq!(result.processed_count(), 1);
    assert_eq!(result.failure_count(), 1);
    assert!(result.failures[0].0.ends_with("broken.png"));
}

#[cfg(unix)]
#[test]
fn test_caption_write_failure_does_not_end_session() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let image = dir.path().join("a.png");
    write_png(&image, 2, 2);

    let mut session = memory_session();
    session.entry(&image).unwrap();

    fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o555)).unwrap();
    let result = session.save_caption(&image, "cannot write");
    fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o755)).unwrap();

    // Root ignores directory permissions; only check when the write was refused.
    if let Err(e) = result {
        assert!(e.to_string().contains("a.txt"));
        assert_eq!(session.entry(&image).unwrap().caption_text, "");
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
#[test]
fn test_open_with_resolves_configured_alias() {
    let dir = tempdir().unwrap();
    let image = dir.path().join("a.png");
    write_png(&image, 2, 2);

    let mut config = Config::default();
    config.apps.insert(
        "viewer".to_string(),
        "capdeck-no-such-viewer-0xbeef".to_string(),
    );
    let session = Session::open(config, CacheLocation::Memory).unwrap();

    match session.open_with(&image, "viewer").unwrap_err() {
        ActionError::LaunchFailed { app, .. } => assert_eq!(app, "capdeck-no-such-viewer-0xbeef"),
        other => panic!("unexpected error: {other}"),
    }
}
