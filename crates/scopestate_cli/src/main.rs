//! Event replay entry point.
//!
//! # Responsibility
//! - Mount the theme/auth composition root from an optional JSON config.
//! - Replay UI events given on the command line and print one frame per step.

use clap::Parser;
use log::info;
use scopestate_core::{init_logging, AppEvent, AppRoot, RootConfig};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "scopestate",
    version,
    about = "Replay UI events against the theme/auth composition root"
)]
struct Cli {
    /// JSON file with initial values and provider order.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Absolute directory for rotated log files; stderr when omitted.
    #[arg(long, value_name = "DIR")]
    log_dir: Option<String>,

    /// Print each frame as a JSON snapshot line.
    #[arg(long)]
    json: bool,

    /// toggle-theme | toggle-theme@home | login | logout
    #[arg(value_name = "EVENT")]
    events: Vec<AppEvent>,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    init_logging(&cli.log_level, cli.log_dir.as_deref())?;
    info!(
        "event=cli_start module=cli version={}",
        scopestate_core::core_version()
    );

    let config = match &cli.config {
        Some(path) => RootConfig::load(path)?,
        None => RootConfig::default(),
    };
    let app = AppRoot::mount(&config)?;
    print_frame(&app, "mount", cli.json)?;

    for event in cli.events {
        app.handle_event(event)?;
        print_frame(&app, &event.to_string(), cli.json)?;
    }
    Ok(())
}

fn print_frame(app: &AppRoot, step: &str, json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        let line = serde_json::json!({ "step": step, "snapshot": app.snapshot() });
        println!("{}", serde_json::to_string(&line)?);
        return Ok(());
    }

    println!("== {step}");
    for line in app.render_lines() {
        println!("{line}");
    }
    Ok(())
}
