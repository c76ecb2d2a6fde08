//! `cargo run -p mapcam-xtask -- <task>`: schema and options tooling.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mapcam::ControllerOptions;

#[derive(Parser)]
#[command(name = "xtask", about = "Developer tasks for mapcam")]
struct Cli {
    #[command(subcommand)]
    task: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Print the JSON Schema for `ControllerOptions`.
    Schema {
        /// Write to this file instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print the default options as TOML.
    DefaultOptions {
        /// Write to this file instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Parse an options file and report values that would be repaired.
    Check {
        /// TOML options file.
        path: PathBuf,
    },
}

fn emit(text: &str, out: Option<PathBuf>) -> Result<()> {
    match out {
        Some(path) => fs::write(&path, text)
            .with_context(|| format!("writing {}", path.display())),
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    match Cli::parse().task {
        Task::Schema { out } => {
            let schema = ControllerOptions::json_schema();
            emit(&serde_json::to_string_pretty(&schema)?, out)
        }
        Task::DefaultOptions { out } => {
            let text = toml::to_string_pretty(&ControllerOptions::default())?;
            emit(&text, out)
        }
        Task::Check { path } => {
            let options = ControllerOptions::load(&path)
                .with_context(|| format!("loading {}", path.display()))?;
            if options.sanitized() == options {
                println!("{}: ok", path.display());
            } else {
                println!("{}: some values are out of range and will be repaired", path.display());
            }
            Ok(())
        }
    }
}
