use capdeck::cli::Cli;
use capdeck::config::Config;
use capdeck::error::ExitCode;
use capdeck::run_app;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn write_png(path: &Path) {
    image::RgbImage::from_pixel(3, 3, image::Rgb([40, 80, 120]))
        .save(path)
        .unwrap();
}

/// Run the app in memory-only cache mode with an isolated config file.
fn run(config_dir: &TempDir, args: &[&str]) -> anyhow::Result<ExitCode> {
    let config = config_dir.path().join("config.toml");
    let mut argv: Vec<String> = vec![
        "capdeck".to_string(),
        "--no-cache".to_string(),
        "--no-color".to_string(),
        "--config".to_string(),
        config.to_string_lossy().into_owned(),
    ];
    argv.extend(args.iter().map(|arg| arg.to_string()));
    run_app(Cli::try_parse_from(argv).unwrap())
}

fn arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[test]
fn test_list_empty_dir_is_no_images_and_reruns() {
    let config = tempdir().unwrap();
    let data = tempdir().unwrap();
    let dir = arg(data.path());

    // Logging is owned by main, so repeated runs in one process are fine.
    let first = run(&config, &["-q", "list", &dir]).unwrap();
    let second = run(&config, &["-q", "list", &dir]).unwrap();

    assert_eq!(first, ExitCode::NoImages);
    assert_eq!(second, ExitCode::NoImages);
    assert_eq!(first.as_i32(), 2);
}

#[test]
fn test_list_readable_images_is_success() {
    let config = tempdir().unwrap();
    let data = tempdir().unwrap();
    write_png(&data.path().join("a.png"));

    let code = run(&config, &["-q", "list", &arg(data.path()), "-o", "json"]).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert_eq!(code.as_i32(), 0);
}

#[test]
fn test_list_with_unreadable_image_is_partial() {
    let config = tempdir().unwrap();
    let data = tempdir().unwrap();
    write_png(&data.path().join("a.png"));
    fs::write(data.path().join("broken.png"), b"not an image").unwrap();

    let code = run(&config, &["-q", "list", &arg(data.path())]).unwrap();
    assert_eq!(code, ExitCode::PartialSuccess);
    assert_eq!(code.as_i32(), 3);
}

#[test]
fn test_copy_of_missing_image_is_general_error() {
    let config = tempdir().unwrap();
    let data = tempdir().unwrap();
    let dest = data.path().join("dest");
    fs::create_dir(&dest).unwrap();
    let missing = data.path().join("missing.png");

    let code = run(&config, &["-q", "copy", &arg(&dest), &arg(&missing)]).unwrap();
    assert_eq!(code, ExitCode::GeneralError);
    assert_eq!(code.as_i32(), 1);
}

#[test]
fn test_delete_requires_yes() {
    let config = tempdir().unwrap();
    let data = tempdir().unwrap();
    let image = data.path().join("a.png");
    write_png(&image);

    let err = run(&config, &["-q", "delete", "--permanent", &arg(&image)]).unwrap_err();
    assert!(err.to_string().contains("--yes"));
    assert!(image.exists());

    let code = run(&config, &["-q", "delete", "--permanent", "-y", &arg(&image)]).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(!image.exists());
}

#[test]
fn test_caption_set_on_missing_image_fails() {
    let config = tempdir().unwrap();
    let data = tempdir().unwrap();
    let missing = data.path().join("ghost.png");

    let err = run(&config, &["-q", "caption", "set", &arg(&missing), "a ghost"]).unwrap_err();
    assert!(err.to_string().contains("Image not found"));
    assert!(!data.path().join("ghost.txt").exists());
}

#[test]
fn test_caption_set_writes_sidecar() {
    let config = tempdir().unwrap();
    let data = tempdir().unwrap();
    let image = data.path().join("a.png");
    write_png(&image);

    let code = run(&config, &["-q", "caption", "set", &arg(&image), "a teal square"]).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert_eq!(
        fs::read_to_string(data.path().join("a.txt")).unwrap(),
        "a teal square"
    );
}

#[test]
fn test_no_cache_leaves_no_database() {
    let config = tempdir().unwrap();
    let data = tempdir().unwrap();
    write_png(&data.path().join("a.png"));

    assert_eq!(
        run(&config, &["-q", "list", &arg(data.path())]).unwrap(),
        ExitCode::Success
    );
    assert_eq!(
        run(&config, &["cache", "stats"]).unwrap(),
        ExitCode::Success
    );

    let names: Vec<PathBuf> = fs::read_dir(data.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(names, vec![data.path().join("a.png")]);
    assert!(!config.path().join("config.toml").exists());
}

#[test]
fn test_show_with_exif_flag() {
    let config = tempdir().unwrap();
    let data = tempdir().unwrap();
    let image = data.path().join("a.png");
    write_png(&image);

    let code = run(&config, &["show", "--exif", "-o", "json", &arg(&image)]).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_list_sort_flag_reaches_config() {
    let config = tempdir().unwrap();
    let data = tempdir().unwrap();
    fs::create_dir(data.path().join("nested")).unwrap();
    write_png(&data.path().join("nested").join("deep.png"));

    // Without -r the only image is out of reach.
    assert_eq!(
        run(&config, &["-q", "list", &arg(data.path())]).unwrap(),
        ExitCode::NoImages
    );
    assert_eq!(
        run(&config, &["-q", "list", "-r", "--sort", "size", &arg(data.path())]).unwrap(),
        ExitCode::Success
    );
}

#[test]
fn test_config_init_round_trips() {
    let config = tempdir().unwrap();
    let path = config.path().join("config.toml");

    assert_eq!(
        run(&config, &["-q", "config", "init"]).unwrap(),
        ExitCode::Success
    );
    let written = Config::load_from_path(&path).unwrap();
    assert_eq!(written.extensions, Config::default().extensions);
    assert!(written.apps.contains_key("krita"));

    let err = run(&config, &["-q", "config", "init"]).unwrap_err();
    assert!(err.to_string().contains("--force"));
    assert_eq!(
        run(&config, &["-q", "config", "init", "--force"]).unwrap(),
        ExitCode::Success
    );
}
