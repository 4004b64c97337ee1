//! `laserquote` command line.
//!
//! ```text
//! laserquote analyze drawing.svg
//! laserquote quote drawing.svg --config rates.toml --technology 1 --material 10 \
//!     --engrave-type 100 --thickness 3 --quantity 5 --output quote.json
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::commands;
use crate::error::AppError;
use crate::models::QuoteSelection;
use crate::pricing::TomlFileSource;
use crate::state::{AppState, SnapshotCache};
use crate::store::MemoryStore;

#[derive(Debug, Parser)]
#[command(name = "laserquote")]
#[command(about = "Analyze SVG drawings and price laser cutting/engraving jobs")]
#[command(version)]
pub struct Cli {
    /// Log to stderr instead of the log file
    #[arg(long, global = true)]
    pub log_stderr: bool,

    /// Owner recorded on analyses and quotes
    #[arg(long, global = true, default_value = "local")]
    pub owner: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Measure and classify a drawing; prints the analysis as JSON
    Analyze {
        /// SVG file to analyze
        svg: PathBuf,

        /// Write the JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Price a drawing; prints the price result as JSON
    Quote {
        /// SVG file to price
        svg: PathBuf,

        /// Rates and factors (TOML)
        #[arg(short, long)]
        config: PathBuf,

        #[arg(short, long)]
        technology: u32,

        #[arg(short, long)]
        material: u32,

        #[arg(short, long)]
        engrave_type: u32,

        /// Material thickness in mm (0 = generic)
        #[arg(long, default_value = "0")]
        thickness: f64,

        #[arg(short, long, default_value = "1")]
        quantity: u32,

        /// Include raw material in the price
        #[arg(long)]
        material_included: bool,

        /// Write the JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Command {
    pub fn output(&self) -> Option<&Path> {
        match self {
            Command::Analyze { output, .. } | Command::Quote { output, .. } => output.as_deref(),
        }
    }
}

/// Run one command and return its pretty-printed JSON.
pub async fn execute(owner: &str, command: &Command) -> Result<String, AppError> {
    match command {
        Command::Analyze { svg, .. } => {
            let raw = read_drawing(svg)?;
            let analysis = commands::parse_and_analyze(&raw)?;
            to_json(&analysis)
        }
        Command::Quote {
            svg,
            config,
            technology,
            material,
            engrave_type,
            thickness,
            quantity,
            material_included,
            ..
        } => {
            let raw = read_drawing(svg)?;
            let store = Arc::new(MemoryStore::new());
            let state = AppState::new(
                SnapshotCache::new(TomlFileSource::new(config.clone())),
                store.clone(),
                store,
            );

            let upload = commands::analyze_upload(owner, raw, state.analyses.as_ref()).await?;
            let selection = QuoteSelection {
                technology_id: *technology,
                material_id: *material,
                engrave_type_id: *engrave_type,
                thickness_mm: *thickness,
                quantity: *quantity,
                material_included: *material_included,
            };
            let quote = commands::create_quote(owner, upload.record.id, &selection, &state)?;
            to_json(&quote.result)
        }
    }
}

/// Execute `cli.command`, then print the JSON or write it to `--output`.
pub async fn run(cli: &Cli) -> Result<(), AppError> {
    let json = execute(&cli.owner, &cli.command).await?;
    match cli.command.output() {
        Some(path) => write_atomic(path, json.as_bytes()),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

fn read_drawing(path: &Path) -> Result<String, AppError> {
    if !path.exists() {
        return Err(AppError::FileNotFound);
    }
    Ok(std::fs::read_to_string(path)?)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(|e| AppError::Io(format!("cannot encode JSON: {e}")))
}

/// Write `bytes` to `<path>.tmp` in the same directory, then rename over
/// `path`. On any failure the temp file is removed and `path` is untouched.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    let file_name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();
    let tmp_path = path.with_file_name(format!("{file_name}.tmp"));

    if let Err(e) = std::fs::write(&tmp_path, bytes) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(AppError::Io(format!("cannot write {}: {e}", tmp_path.display())));
    }

    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        AppError::Io(format!("rename to final path failed: {e}"))
    })
}
