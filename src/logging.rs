//! Logging setup for capdeck.
//!
//! Uses the `log` facade with the `env_logger` backend. The level comes from
//! (highest priority first):
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (errors only) or `--verbose` (debug, `-vv` trace)
//! 3. Default: info
//!
//! Debug builds prefix each line with a timestamp, and with the module path
//! once `-v` is given. Release builds print level and message only.
//!
//! ```rust,no_run
//! use capdeck::logging::init_logging;
//!
//! init_logging(1, false);
//! log::debug!("visible with -v");
//! ```

use std::env;
use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Initialize the logger from CLI verbosity flags.
///
/// Call once, before any logging happens.
///
/// # Panics
///
/// Panics if a global logger has already been installed.
pub fn init_logging(verbose: u8, quiet: bool) {
    let rust_log = env::var("RUST_LOG").ok();

    let mut builder = Builder::new();
    match &rust_log {
        Some(_) => {
            builder.parse_default_env();
        }
        None => {
            builder.filter_level(determine_level(verbose, quiet));
        }
    }
    configure_format(&mut builder, verbose);
    builder.init();

    match rust_log {
        Some(spec) => log::debug!("Logging configured from RUST_LOG={}", spec),
        None => log::debug!("Logging initialized at level: {}", current_level_name()),
    }
}

/// Map CLI flags to a level filter. `quiet` wins over `verbose`.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

#[cfg(debug_assertions)]
fn configure_format(builder: &mut Builder, verbose: u8) {
    builder.format(move |buf, record| {
        let timestamp = buf.timestamp_seconds();
        let level = record.level();
        let style = buf.default_level_style(level);

        if verbose >= 1 {
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} [{}] {}",
                timestamp,
                level,
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else {
            writeln!(buf, "{} {style}{:<5}{style:#} {}", timestamp, level, record.args())
        }
    });
}

#[cfg(not(debug_assertions))]
fn configure_format(builder: &mut Builder, _verbose: u8) {
    builder.format(|buf, record| {
        let level = record.level();
        let style = buf.default_level_style(level);
        writeln!(buf, "{style}{:<5}{style:#} {}", level, record.args())
    });
}

/// Name of the currently active maximum log level.
#[must_use]
pub fn current_level_name() -> &'static str {
    match log::max_level() {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}
