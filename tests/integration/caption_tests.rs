use capdeck::caption::{caption_path, matches_query, read_caption, write_caption, CaptionEdit};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[test]
fn test_sidecar_next_to_image() {
    assert_eq!(
        caption_path(Path::new("/data/set/001.jpeg")),
        Path::new("/data/set/001.txt")
    );
    assert_eq!(
        caption_path(Path::new("shot.final.png")),
        Path::new("shot.final.txt")
    );
}

#[test]
fn test_write_then_read_trims() {
    let dir = tempdir().unwrap();
    let image = dir.path().join("a.png");

    let written = write_caption(&image, "\n  a cat on a mat \n").unwrap();
    assert_eq!(written, dir.path().join("a.txt"));
    assert_eq!(
        fs::read_to_string(&written).unwrap(),
        "\n  a cat on a mat \n"
    );
    assert_eq!(
        read_caption(&image).unwrap().as_deref(),
        Some("a cat on a mat")
    );
}

#[test]
fn test_missing_sidecar_is_none() {
    let dir = tempdir().unwrap();
    assert_eq!(read_caption(&dir.path().join("a.png")).unwrap(), None);
}

#[test]
fn test_invalid_utf8_is_an_error() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), [0xff, 0xfe, 0x00]).unwrap();
    assert!(read_caption(&dir.path().join("a.png")).is_err());
}

#[test]
fn test_search_is_case_insensitive() {
    assert!(matches_query("A Tabby Cat", "tabby"));
    assert!(matches_query("A Tabby Cat", ""));
    assert!(!matches_query("A Tabby Cat", "dog"));
}

#[test]
fn test_edits_compose() {
    let caption = CaptionEdit::Prepend("photo of ".to_string()).apply("a cat");
    let caption = CaptionEdit::Append(", outdoors".to_string()).apply(&caption);
    let caption = CaptionEdit::Replace {
        search: "CAT".to_string(),
        replacement: "dog".to_string(),
        match_case: true,
    }
    .apply(&caption);
    assert_eq!(caption, "photo of a cat, outdoors");

    let caption = CaptionEdit::Replace {
        search: "CAT".to_string(),
        replacement: "dog".to_string(),
        match_case: false,
    }
    .apply(&caption);
    assert_eq!(caption, "photo of a dog, outdoors");
}

#[test]
fn test_replace_treats_search_literally() {
    let edit = CaptionEdit::Replace {
        search: "a.b (c)".to_string(),
        replacement: "$1".to_string(),
        match_case: false,
    };
    assert_eq!(edit.apply("A.B (C) and axb c"), "$1 and axb c");
}
