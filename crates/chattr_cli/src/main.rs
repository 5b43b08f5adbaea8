//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `chattr_core` linkage and open the stores of one data directory.
//! - Start rolling file logs under `<data_dir>/logs`.
//! - Print a deterministic summary for quick local sanity checks.
//!
//! Usage: `chattr_cli [data_dir]` (defaults to `./data`).

use chattr_core::{init_logging, AppContext, CoreConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = match std::env::args().nth(1) {
        Some(data_dir) => CoreConfig::new(data_dir),
        None => CoreConfig::default(),
    };

    println!("chattr_core version={}", chattr_core::core_version());

    match config.log_dir() {
        Ok(log_dir) => {
            if let Err(err) = init_logging(&config.log_level, &log_dir.to_string_lossy()) {
                eprintln!("logging disabled: {err}");
            }
        }
        Err(err) => eprintln!("logging disabled: cannot resolve log directory: {err}"),
    }

    let context = match AppContext::open(config) {
        Ok(context) => context,
        Err(err) => {
            log::error!("event=cli_open module=cli status=error error={err}");
            eprintln!("failed to open data directory: {err}");
            return ExitCode::FAILURE;
        }
    };

    let decisions = context.decisions();
    println!(
        "decisions total={} proposed={} capacity={}",
        decisions.len(),
        decisions.count_proposed(),
        decisions.capacity()
    );
    if let Some(err) = decisions.load_error() {
        println!("decisions recovered_empty=true reason={err}");
    }

    let messages = context.messages();
    println!("messages total={}", messages.len());
    if let Some(err) = messages.load_error() {
        println!("messages recovered_empty=true reason={err}");
    }

    ExitCode::SUCCESS
}
