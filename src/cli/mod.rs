//! CLI command definitions for config-tree
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use crate::config::Config;
use crate::format::OutputFormat;
use crate::options::{ConfigOptions, Selection};
use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

/// Compose and query configuration directories
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the composed configuration (or one key of it)
    Show(ShowArgs),

    /// Print the value at a key path; exits with status 1 if absent
    Get(KeyArgs),

    /// Print whether a key path exists
    Has(KeyArgs),
}

/// Arguments shared by every subcommand that loads a source
#[derive(Args, Debug, Clone)]
pub struct LoadArgs {
    /// Config file or directory
    pub path: PathBuf,

    /// Options file (YAML or JSON); flags below add to it
    #[arg(long, value_name = "FILE")]
    pub options: Option<PathBuf>,

    /// Active tag: a literal suffix, or /regex/ (repeatable)
    #[arg(short, long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Variant selection as name=choice (repeatable)
    #[arg(short, long = "select", value_name = "NAME=CHOICE")]
    pub selections: Vec<String>,

    /// Key path separator
    #[arg(long)]
    pub separator: Option<char>,

    /// Remove tagged keys after applying their overlays
    #[arg(long)]
    pub prune_tagged: bool,

    /// Maximum directory nesting
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,
}

/// Arguments for the show subcommand
#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    #[command(flatten)]
    pub load: LoadArgs,

    /// Only print the value at this key path
    #[arg(short, long)]
    pub key: Option<String>,

    /// Output format: json or yaml
    #[arg(short, long, default_value = "json")]
    pub format: String,
}

/// Arguments for the get and has subcommands
#[derive(Args, Debug, Clone)]
pub struct KeyArgs {
    #[command(flatten)]
    pub load: LoadArgs,

    /// Key path to look up
    pub key: String,

    /// Output format: json or yaml
    #[arg(short, long, default_value = "json")]
    pub format: String,
}

impl LoadArgs {
    /// Merge the options file (if any) with the command-line flags.
    pub fn options(&self) -> Result<ConfigOptions> {
        let mut options = match &self.options {
            Some(file) => ConfigOptions::from_file(file)
                .with_context(|| format!("Failed to read options from {}", file.display()))?,
            None => ConfigOptions::default(),
        };

        options.tags.extend(self.tags.iter().cloned());
        for spec in &self.selections {
            let selection = Selection::parse(spec)
                .ok_or_else(|| anyhow!("Invalid selection '{}', expected name=choice", spec))?;
            options.select.push(selection);
        }
        if let Some(separator) = self.separator {
            options.separator = separator;
        }
        if self.prune_tagged {
            options.prune_tagged = true;
        }
        if self.max_depth.is_some() {
            options.max_depth = self.max_depth;
        }
        Ok(options)
    }

    /// Build a config and load the source into it.
    pub fn load(&self) -> Result<Config> {
        let options = self.options()?;
        let mut config = Config::with_options(&options);
        config
            .load(&self.path)
            .with_context(|| format!("Failed to load {}", self.path.display()))?;
        Ok(config)
    }
}

fn parse_format(s: &str) -> Result<OutputFormat> {
    OutputFormat::from_str(s).ok_or_else(|| anyhow!("Unknown format '{}', use json or yaml", s))
}

/// Run a command, writing its output to `out`.
///
/// Returns `false` when the command should exit with a failure status
/// (a missing key for `get`).
pub fn execute(command: &Command, out: &mut impl Write) -> Result<bool> {
    match command {
        Command::Show(args) => {
            let format = parse_format(&args.format)?;
            let config = args.load.load()?;
            let value = match &args.key {
                Some(key) => config.get(key)?,
                None => config.into_value(),
            };
            writeln!(out, "{}", format.render(&value)?)?;
            Ok(true)
        }
        Command::Get(args) => {
            let format = parse_format(&args.format)?;
            let config = args.load.load()?;
            match config.try_get(&args.key) {
                Some(value) => {
                    writeln!(out, "{}", format.render(&value)?)?;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
        Command::Has(args) => {
            let config = args.load.load()?;
            writeln!(out, "{}", config.has(&args.key))?;
            Ok(true)
        }
    }
}
