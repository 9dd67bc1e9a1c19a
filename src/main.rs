//! config-tree CLI
//!
//! Loads a configuration file or directory and prints it, or one value in it.

use anyhow::Result;
use clap::Parser;
use config_tree::cli::{Cli, execute};
use std::fs::OpenOptions;
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// Writer for a `--log` target and whether it takes ANSI colors.
/// `None` disables logging.
fn log_writer(target: &str) -> Result<Option<(BoxMakeWriter, bool)>> {
    let writer = match target {
        "0" | "off" => return Ok(None),
        "1" | "stdout" => (BoxMakeWriter::new(std::io::stdout), true),
        "2" | "stderr" => (BoxMakeWriter::new(std::io::stderr), true),
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            (BoxMakeWriter::new(file), false)
        }
    };
    Ok(Some(writer))
}

fn init_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let Some((writer, ansi)) = log_writer(&cli.log)? else {
        return Ok(());
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(writer)
        .with_ansi(ansi)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;
    debug!(command = ?cli.command, "running");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if !execute(&cli.command, &mut out)? {
        std::process::exit(1);
    }
    Ok(())
}
