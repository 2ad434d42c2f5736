use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use ticket_reports::app::ports::ReportSink;
use ticket_reports::app::{ReportKind, ReportOptions, ReportUseCase};
use ticket_reports::config::Config;
use ticket_reports::infra::{JsonFileSink, JsonStdoutSink, TextStdoutSink};
use ticket_reports::pipeline::{Pipeline, SourceInput, SourceSelector, TimeWindow};
use ticket_reports::{logging, observability, Clock};

#[derive(Parser)]
#[command(name = "ticket_reports")]
#[command(about = "Service-desk ticket export ingestion and reporting")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to a TOML config file (defaults to $TICKET_REPORTS_CONFIG or ./config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print Prometheus metrics to stderr when the run finishes
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest ticket exports and summarize them
    Report {
        /// Spreadsheet or CSV exports to ingest
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Time window: "All Time", "Last 90 Days", "Last 30 Days", "Last 7 Days"
        #[arg(long)]
        window: Option<String>,
        /// Limit the report to one uploaded file, by file name
        #[arg(long)]
        source: Option<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Write JSON to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Include the filtered rows in the report
        #[arg(long)]
        include_rows: bool,
    },
    /// Compare uploaded files side by side
    Compare {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::load_or_default(cli.config.as_deref())?;
    logging::init_logging(&config.logging);
    if cli.metrics {
        observability::init_metrics();
    }

    let pipeline = Pipeline::from_config(&config);

    let (files, options, sink): (Vec<PathBuf>, ReportOptions, Box<dyn ReportSink>) = match cli.command {
        Commands::Report {
            files,
            window,
            source,
            format,
            output,
            include_rows,
        } => {
            let window: TimeWindow = match window {
                Some(label) => label.parse()?,
                None => config.report.time_window()?,
            };
            let source = match source {
                Some(label) => SourceSelector::from_label(&label),
                None => config.report.source_selector(),
            };
            let sink: Box<dyn ReportSink> = match (output, format) {
                (Some(path), _) => Box::new(JsonFileSink::new(path)),
                (None, OutputFormat::Json) => Box::new(JsonStdoutSink),
                (None, OutputFormat::Text) => Box::new(TextStdoutSink),
            };
            let options = ReportOptions {
                kind: ReportKind::Full,
                window,
                source,
                include_rows,
                clock: Some(Clock::System),
            };
            (files, options, sink)
        }
        Commands::Compare { files, format } => {
            let sink: Box<dyn ReportSink> = match format {
                OutputFormat::Json => Box::new(JsonStdoutSink),
                OutputFormat::Text => Box::new(TextStdoutSink),
            };
            let options = ReportOptions {
                kind: ReportKind::Comparison,
                ..Default::default()
            };
            (files, options, sink)
        }
    };

    let inputs: Vec<SourceInput> = files.into_iter().map(SourceInput::from_path).collect();
    info!("Ingesting {} file(s)", inputs.len());

    let outcome = pipeline.run(&inputs).context("ingestion failed")?;
    for skipped in &outcome.skipped {
        warn!("Skipped {}: {}", skipped.label, skipped.reason);
    }

    ReportUseCase::new(sink)
        .execute(&outcome, &options)
        .context("failed to publish report")?;

    if let Some(rendered) = observability::render() {
        eprintln!("{}", rendered);
    }

    Ok(())
}
