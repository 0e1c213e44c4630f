//! calzero - personal calendar extraction CLI
//!
//! Usage:
//!   calzero run calzero.toml            Merge all configured documents into the store
//!   calzero export calzero.toml         Write one JSON file per document
//!   calzero classify F59A00             Classify a fill token or `r,g,b` triple
//!   calzero parse-cell '9\n4 ЛИЧНЫЙ ДЕНЬ'  Parse a single cell text

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use calzero::{
    parse_cell_with_marker, CalendarStore, ExtractorBuilder, RawColor, RunConfig,
    PERSONAL_DAY_MARKER,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Export directory used when neither the config nor `--out` names one
const DEFAULT_EXPORT_DIR: &str = "json_output";

#[derive(Parser)]
#[command(name = "calzero")]
#[command(about = "Extract personal calendars from DOCX tables and PDF layout dumps")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge every configured document into the aggregate store
    Run {
        /// Run configuration (TOML)
        config: PathBuf,
        /// Aggregate store path (overrides `store` in the config)
        #[arg(long)]
        store: Option<PathBuf>,
    },
    /// Write one JSON export per configured document
    Export {
        /// Run configuration (TOML)
        config: PathBuf,
        /// Output directory (overrides `[export] dir` in the config)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Classify a fill color
    Classify {
        /// Hex token (`F59A00`) or comma-separated RGB components (`245,154,0`)
        color: String,
        /// Read the category table and tolerance from this configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Channel tolerance for RGB components
        #[arg(short, long)]
        tolerance: Option<u8>,
    },
    /// Parse a single day cell text (`\n` escapes are expanded)
    ParseCell {
        text: String,
        /// Marker phrase identifying day cells
        #[arg(short, long, default_value = PERSONAL_DAY_MARKER)]
        marker: String,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: &Path) -> Result<RunConfig> {
    RunConfig::load(path).with_context(|| format!("Failed to load config: {}", path.display()))
}

fn cmd_run(config_path: PathBuf, store_override: Option<PathBuf>) -> Result<()> {
    let config = load_config(&config_path)?;
    let extractor = config
        .extractor_builder()
        .and_then(|builder| builder.build())
        .context("Invalid extraction settings")?;
    let documents = config.documents().context("Invalid [[sources]] entries")?;

    let store_path = match store_override.or_else(|| config.store_path().map(PathBuf::from)) {
        Some(path) => path,
        None => bail!("No aggregate store configured; set `store` or pass --store"),
    };
    let mut store = CalendarStore::load(&store_path)
        .with_context(|| format!("Failed to load aggregate store: {}", store_path.display()))?;

    let report = calzero::run_aggregate(&extractor, &mut store, config.year, &documents);
    println!("{}", report);

    if !report.is_success() {
        bail!("No documents were processed; the store was left untouched");
    }

    store
        .save(&store_path)
        .with_context(|| format!("Failed to save aggregate store: {}", store_path.display()))?;
    println!("saved {}", store_path.display());
    Ok(())
}

fn cmd_export(config_path: PathBuf, out: Option<PathBuf>) -> Result<()> {
    let config = load_config(&config_path)?;
    let extractor = config
        .extractor_builder()
        .and_then(|builder| builder.build())
        .context("Invalid extraction settings")?;
    let documents = config.documents().context("Invalid [[sources]] entries")?;

    let output_dir = out
        .or_else(|| config.export_dir().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_DIR));
    let naming = config.export_naming();

    let report = calzero::run_export(&extractor, &output_dir, &naming, config.year, &documents);
    for path in &report.exports {
        println!("wrote {}", path.display());
    }
    println!("{}", report);

    if !report.is_success() {
        bail!("No documents were processed");
    }
    Ok(())
}

fn parse_color(input: &str) -> Result<RawColor> {
    if !input.contains(',') {
        return Ok(RawColor::token(input.trim()));
    }
    let components = input
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .with_context(|| format!("Invalid color component: '{}'", part.trim()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(RawColor::Components(components))
}

fn cmd_classify(color: &str, config: Option<PathBuf>, tolerance: Option<u8>) -> Result<()> {
    let mut builder = match config {
        Some(path) => load_config(&path)?.extractor_builder()?,
        None => ExtractorBuilder::new(),
    };
    if let Some(tolerance) = tolerance {
        builder = builder.with_tolerance(tolerance);
    }
    let extractor = builder.build().context("Invalid classifier settings")?;

    let raw = parse_color(color)?;
    let category = extractor.classify(&raw)?;
    println!("{}", category.map_or("unknown", |category| category.as_str()));
    Ok(())
}

fn cmd_parse_cell(text: &str, marker: &str) -> Result<()> {
    let text = text.replace("\\n", "\n").replace("\\t", "\t");
    match parse_cell_with_marker(&text, marker) {
        Ok(cell) => {
            println!("day: {}", cell.day);
            println!("personal_day: {}", cell.personal_day);
            Ok(())
        }
        Err(failure) => bail!("Not a day cell: {}", failure),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run { config, store } => cmd_run(config, store),
        Commands::Export { config, out } => cmd_export(config, out),
        Commands::Classify {
            color,
            config,
            tolerance,
        } => cmd_classify(&color, config, tolerance),
        Commands::ParseCell { text, marker } => cmd_parse_cell(&text, &marker),
    }
}
