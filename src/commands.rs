//! Subcommand handlers.
//!
//! [`run_app`] wires configuration and the session (with its cache)
//! together and dispatches to one handler per subcommand. Handlers return
//! the process [`ExitCode`]; fatal problems are returned as `anyhow` errors
//! and reported by `main`. Logging is set up by the caller.

use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::actions::{BatchResult, DeleteMode, TransferMode};
use crate::caption::Scope;
use crate::cli::{
    BatchArgs, CacheCommand, CaptionCommand, Cli, Commands, ConfigCommand, DeleteArgs, ListArgs,
    OpenArgs, ShowArgs, TransferArgs,
};
use crate::config::{CliOverrides, Config};
use crate::error::ExitCode;
use crate::output::{CsvOutput, JsonImage, JsonOutput, OutputFormat, TextOutput};
use crate::progress::Progress;
use crate::session::{CacheLocation, ListOptions, Session};

/// Output settings shared by all handlers.
#[derive(Debug, Clone, Copy)]
struct Ui {
    quiet: bool,
    color: bool,
}

/// Run the application for parsed command-line arguments.
///
/// # Errors
///
/// Returns an error for failures that stop the command as a whole, such as
/// an unreadable dataset directory or a cache file that cannot be opened.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let ui = Ui {
        quiet: cli.quiet,
        color: !cli.no_color && io::stdout().is_terminal(),
    };

    let mut config = Config::load(cli.config.as_deref());
    config.merge_cli(&cli_overrides(&cli));

    if let Commands::Config(command) = &cli.command {
        return cmd_config(command, cli.config.as_deref(), &config, ui);
    }

    let location = CacheLocation::resolve(&config, cli.no_cache);
    let mut session = Session::open(config, location.clone()).with_context(|| match &location {
        CacheLocation::File(path) => format!("Failed to open metadata cache {}", path.display()),
        CacheLocation::Memory => "Failed to create metadata cache".to_string(),
    })?;

    let result = match cli.command {
        Commands::List(args) => cmd_list(&mut session, &args, ui),
        Commands::Show(args) => cmd_show(&mut session, &args, ui),
        Commands::Caption(command) => cmd_caption(&mut session, command, ui),
        Commands::Batch(args) => cmd_batch(&mut session, &args, ui),
        Commands::Move(args) => cmd_transfer(&mut session, &args, TransferMode::Move, ui),
        Commands::Copy(args) => cmd_transfer(&mut session, &args, TransferMode::Copy, ui),
        Commands::Delete(args) => cmd_delete(&mut session, &args, ui),
        Commands::Open(args) => cmd_open(&session, &args),
        Commands::Cache(command) => cmd_cache(&mut session, &command, &location, ui),
        Commands::Config(_) => Ok(ExitCode::Success),
    };

    if let Err(e) = session.close() {
        log::warn!("Failed to close metadata cache: {}", e);
    }
    result
}

/// Command-line values layered over the loaded configuration.
fn cli_overrides(cli: &Cli) -> CliOverrides {
    let mut overrides = CliOverrides {
        cache_path: cli.cache.clone(),
        ..CliOverrides::default()
    };
    match &cli.command {
        Commands::List(args) => {
            overrides.recursive = args.recursive;
            overrides.sort = args.sort;
        }
        Commands::Batch(args) => overrides.recursive = args.recursive,
        _ => {}
    }
    overrides
}

fn list_options(session: &Session, search: Option<&String>) -> ListOptions {
    let mut options = ListOptions::from_config(session.config());
    options.search = search.cloned();
    options
}

fn cmd_list(session: &mut Session, args: &ListArgs, ui: Ui) -> Result<ExitCode> {
    let options = list_options(session, args.search.as_ref());

    let progress = Progress::new(ui.quiet || args.output != OutputFormat::Text);
    let listing = session
        .list(&args.dir, &options, Some(&progress))
        .with_context(|| format!("Failed to list {}", args.dir.display()))?;

    let exit_code = if listing.is_empty() && listing.skipped.is_empty() {
        ExitCode::NoImages
    } else {
        ExitCode::from_failures(listing.skipped.len())
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.output {
        OutputFormat::Text => TextOutput::new(ui.color).write_listing(&listing, &mut out)?,
        OutputFormat::Json => JsonOutput::new(
            &listing,
            session.cache().stats(),
            exit_code,
            args.thumbnails,
        )
        .write_to(&mut out, true)?,
        OutputFormat::Csv => CsvOutput::new(&listing.images).write_to(&mut out)?,
    }
    out.flush()?;

    Ok(exit_code)
}

fn cmd_show(session: &mut Session, args: &ShowArgs, ui: Ui) -> Result<ExitCode> {
    let entry = session
        .entry(&args.image)
        .with_context(|| format!("Failed to read {}", args.image.display()))?
        .clone();

    if let Some(path) = &args.thumbnail_out {
        fs::write(path, &entry.thumbnail_data)
            .with_context(|| format!("Failed to write thumbnail {}", path.display()))?;
        log::info!("Wrote thumbnail to {}", path.display());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.output {
        OutputFormat::Text => {
            let text = TextOutput::new(ui.color);
            text.write_details(&entry, &mut out)?;
            if args.exif {
                text.write_exif(&entry, &mut out)?;
            }
        }
        OutputFormat::Json => {
            let mut image = JsonImage::from_entry(&entry, false);
            if args.exif {
                image = image.with_exif(&entry);
            }
            serde_json::to_writer_pretty(&mut out, &image)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => CsvOutput::new(std::slice::from_ref(&entry)).write_to(&mut out)?,
    }
    out.flush()?;

    Ok(ExitCode::Success)
}

fn cmd_caption(session: &mut Session, command: CaptionCommand, ui: Ui) -> Result<ExitCode> {
    match command {
        CaptionCommand::Get { image } => {
            let entry = session
                .entry(&image)
                .with_context(|| format!("Failed to read {}", image.display()))?;
            println!("{}", entry.caption_text);
            Ok(ExitCode::Success)
        }
        CaptionCommand::Set { image, text } => {
            if !image.is_file() {
                bail!("Image not found: {}", image.display());
            }
            session
                .save_caption(&image, &text)
                .with_context(|| format!("Failed to save caption for {}", image.display()))?;
            if !ui.quiet {
                println!("Saved caption for {}", image.display());
            }
            Ok(ExitCode::Success)
        }
        CaptionCommand::Clear { images } => {
            let mut result = BatchResult::default();
            for image in images {
                if !image.is_file() {
                    result.fail(&image, "image not found");
                    continue;
                }
                match session.save_caption(&image, "") {
                    Ok(()) => result.processed.push(image),
                    Err(e) => result.fail(&image, e),
                }
            }
            report(&result, "Cleared", ui)
        }
    }
}

fn cmd_batch(session: &mut Session, args: &BatchArgs, ui: Ui) -> Result<ExitCode> {
    for image in &args.selected {
        session.select(image);
    }
    if args.scope == Scope::Selected && session.selection().is_empty() {
        log::warn!("--scope selected without --select: nothing will be edited");
    }

    let options = list_options(session, args.search.as_ref());
    let edit = args.to_edit();
    let result = session
        .apply_caption_edit(&args.dir, &options, &edit, args.scope)
        .with_context(|| format!("Failed to edit captions in {}", args.dir.display()))?;

    if result.processed.is_empty() && result.unchanged.is_empty() && result.all_succeeded() {
        if !ui.quiet {
            println!("No images in scope");
        }
        return Ok(ExitCode::NoImages);
    }
    report(&result, "Updated", ui)
}

fn cmd_transfer(
    session: &mut Session,
    args: &TransferArgs,
    mode: TransferMode,
    ui: Ui,
) -> Result<ExitCode> {
    if !args.dest.is_dir() {
        bail!("Destination folder does not exist: {}", args.dest.display());
    }
    let result = session.transfer(&args.images, &args.dest, mode);
    report(&result, mode.verb(), ui)
}

fn cmd_delete(session: &mut Session, args: &DeleteArgs, ui: Ui) -> Result<ExitCode> {
    if !args.yes {
        bail!(
            "Refusing to delete {} image(s) without --yes",
            args.images.len()
        );
    }
    let result = session.delete(&args.images, DeleteMode::from_permanent(args.permanent));
    report(&result, "Deleted", ui)
}

fn cmd_open(session: &Session, args: &OpenArgs) -> Result<ExitCode> {
    session
        .open_with(&args.image, &args.app)
        .with_context(|| format!("Failed to open {}", args.image.display()))?;
    Ok(ExitCode::Success)
}

fn cmd_cache(
    session: &mut Session,
    command: &CacheCommand,
    location: &CacheLocation,
    ui: Ui,
) -> Result<ExitCode> {
    match command {
        CacheCommand::Stats => {
            let database = match location {
                CacheLocation::File(path) => path.display().to_string(),
                CacheLocation::Memory => "(in memory)".to_string(),
            };
            let entries = match session.cache().store() {
                Some(store) => store.count().context("Failed to count cached entries")?,
                None => session.cache().len(),
            };
            println!("Database: {}", database);
            println!("Entries:  {}", entries);
        }
        CacheCommand::Clear => {
            let removed = session
                .cache_mut()
                .clear()
                .context("Failed to clear metadata cache")?;
            if !ui.quiet {
                println!("Removed {} cached entr(ies)", removed);
            }
        }
        CacheCommand::Prune => {
            let removed = session.cache_mut().prune();
            if !ui.quiet {
                println!("Pruned {} entr(ies) for missing images", removed);
            }
        }
    }
    Ok(ExitCode::Success)
}

fn cmd_config(
    command: &ConfigCommand,
    explicit: Option<&Path>,
    config: &Config,
    ui: Ui,
) -> Result<ExitCode> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => Config::config_path()?,
    };

    match command {
        ConfigCommand::Path => println!("{}", path.display()),
        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                bail!(
                    "Configuration file already exists: {} (use --force to replace it)",
                    path.display()
                );
            }
            config.save_to_path(&path)?;
            if !ui.quiet {
                println!("Wrote {}", path.display());
            }
        }
    }
    Ok(ExitCode::Success)
}

/// Print a batch summary and failures, and pick the exit code.
fn report(result: &BatchResult, verb: &str, ui: Ui) -> Result<ExitCode> {
    if !ui.quiet {
        println!("{}", result.summary(verb));
    }
    for (path, reason) in &result.failures {
        eprintln!("  {}: {}", path.display(), reason);
    }

    if result.processed.is_empty() && result.unchanged.is_empty() && !result.all_succeeded() {
        return Ok(ExitCode::GeneralError);
    }
    Ok(ExitCode::from_failures(result.failure_count()))
}
