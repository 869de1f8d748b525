//! CLI entry point for the fleet telematics reporter.
//!
//! Provides subcommands for rendering the metrics report, validating an
//! export, and writing the derived records back out as CSV.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use fleet_telematics::aggregate::{Filter, GroupBy};
use fleet_telematics::config::Settings;
use fleet_telematics::{fetch, loader, output, pipeline, presenter};
use std::ffi::OsStr;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "fleet_telematics")]
#[command(about = "Derive utilization, cost and maintenance risk from fleet odometer exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the fleet metrics report
    Report {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        filter: FilterArgs,

        /// Dimension to group by: asset, location, make, role, day, week, month
        #[arg(short, long, default_value = "asset")]
        group_by: GroupBy,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Utilization goal used to colour the report (overrides the config)
        #[arg(long)]
        goal: Option<f64>,

        /// Registry rows shown in text output
        #[arg(long, default_value_t = 25)]
        registry_limit: usize,

        /// Disable ANSI colour even on a terminal
        #[arg(long, default_value_t = false)]
        no_color: bool,

        /// Optional: also write the filtered derived records as CSV
        #[arg(long)]
        export: Option<PathBuf>,

        /// Gzip compress the exported CSV
        #[arg(long, default_value_t = false)]
        gzip: bool,

        /// Optional: also write the report as a JSON file
        #[arg(long, value_name = "PATH")]
        json_out: Option<PathBuf>,
    },
    /// Load an export and list rows that fail validation
    Validate {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Write the filtered derived records as CSV
    Export {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        filter: FilterArgs,

        /// CSV file to write
        #[arg(short, long = "output", default_value = "fleet_records.csv")]
        destination: PathBuf,

        /// Gzip compress the CSV
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Path or URL of the telematics CSV (optionally gzip-compressed)
    #[arg(value_name = "FILE_OR_URL")]
    source: String,

    /// JSON settings file (defaults to $FLEET_CONFIG when set)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Preamble lines before the header row (detected when omitted)
    #[arg(long)]
    skip_rows: Option<usize>,

    /// Reject the whole file on the first invalid row
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[derive(Args)]
struct FilterArgs {
    /// Only include these locations (repeatable)
    #[arg(short, long = "location", value_name = "LOCATION")]
    locations: Vec<String>,

    /// Only include these makes (repeatable)
    #[arg(short, long = "make", value_name = "MAKE")]
    makes: Vec<String>,

    /// Only include these assets, by plate or vehicle id (repeatable)
    #[arg(short, long = "asset", value_name = "ASSET")]
    assets: Vec<String>,

    /// First day to include (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,
}

impl From<FilterArgs> for Filter {
    fn from(args: FilterArgs) -> Self {
        Filter {
            locations: args.locations,
            makes: args.makes,
            assets: args.assets,
            from: args.from,
            to: args.to,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/fleet_telematics.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("fleet_telematics.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            source,
            filter,
            group_by,
            format,
            goal,
            registry_limit,
            no_color,
            export,
            gzip,
            json_out,
        } => {
            let mut settings = load_settings(&source)?;
            if let Some(goal) = goal {
                settings.utilization_goal = goal;
            }

            let bytes = fetch::read_source(&source.source)?;
            let table = loader::load_bytes(&bytes, &settings)?;
            let filter = Filter::from(filter);
            let outcome = pipeline::run(&table, &settings, &filter, group_by);

            if let Some(path) = export {
                let records = pipeline::derive_filtered(&table, &settings, &filter);
                output::export_records(&path, &records, gzip)?;
            }
            if let Some(path) = json_out {
                output::export_json(&path, &outcome)?;
            }

            let rendered = match format {
                Format::Json => presenter::render_json(&outcome)?,
                Format::Text => {
                    let color = !no_color && std::io::stdout().is_terminal();
                    let opts = presenter::RenderOptions {
                        registry_limit,
                        ..presenter::RenderOptions::from_settings(&settings).with_color(color)
                    };
                    presenter::render_text(&outcome, &opts)
                }
            };

            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", rendered.trim_end())?;
        }
        Commands::Validate { source } => {
            let settings = load_settings(&source)?;
            let bytes = fetch::read_source(&source.source)?;
            let table = loader::load_bytes(&bytes, &settings)?;

            for issue in &table.issues {
                warn!(line = issue.line, error = %issue.error, "Invalid row");
            }

            info!(
                rows = table.rows_read,
                valid = table.records.len(),
                skipped = table.issues.len(),
                "Validation summary"
            );

            let mut stdout = std::io::stdout().lock();
            writeln!(
                stdout,
                "{} row(s) read, {} valid, {} skipped",
                table.rows_read,
                table.records.len(),
                table.issues.len()
            )?;
            for issue in &table.issues {
                writeln!(stdout, "  line {}: {}", issue.line, issue.error)?;
            }
        }
        Commands::Export {
            source,
            filter,
            destination,
            gzip,
        } => {
            let settings = load_settings(&source)?;
            let bytes = fetch::read_source(&source.source)?;
            let table = loader::load_bytes(&bytes, &settings)?;
            let records = pipeline::derive_filtered(&table, &settings, &Filter::from(filter));

            if records.is_empty() {
                warn!("No records to export");
            }
            output::export_records(&destination, &records, gzip)?;
            info!(path = %destination.display(), count = records.len(), "Export complete");
        }
    }

    Ok(())
}

/// Builds settings from the config file, environment overrides and CLI flags,
/// in increasing precedence.
fn load_settings(args: &SourceArgs) -> Result<Settings> {
    let path = args
        .config
        .clone()
        .or_else(|| std::env::var_os("FLEET_CONFIG").map(PathBuf::from));

    let mut settings = match path {
        Some(path) => Settings::load(&path)?,
        None => Settings::default(),
    };
    settings.apply_overrides(|key| std::env::var(key).ok())?;

    if let Some(skip_rows) = args.skip_rows {
        settings.skip_rows = Some(skip_rows);
    }
    if args.strict {
        settings.strict = true;
    }

    Ok(settings)
}
