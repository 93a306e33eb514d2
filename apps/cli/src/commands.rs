//! CLI command definitions, routing, and tracing setup.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use entidades_browser::ChromeFactory;
use entidades_engine::orchestrator::{self, ProgressReporter, RunSummary};
use entidades_export::CsvSink;
use entidades_shared::{RunConfig, config_file_path, init_config, load_config, load_config_from};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// entidades — harvest the OSCE entity directory into a CSV.
#[derive(Parser)]
#[command(
    name = "entidades",
    version,
    about = "Harvest the OSCE entity directory and its detail pages into a CSV.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Harvest listing pages and detail pages into the output CSV.
    Run {
        /// Output CSV path (defaults to the configured value).
        #[arg(short, long)]
        output: Option<String>,

        /// Worker pool size.
        #[arg(short, long)]
        workers: Option<u32>,

        /// Harvest only the first N listing pages (reduced test run).
        #[arg(short, long)]
        pages: Option<u32>,

        /// Show browser windows instead of running headless.
        #[arg(long)]
        headful: bool,

        /// Config file path (defaults to ~/.entidades/entidades.toml).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "entidades=info",
        1 => "entidades=debug",
        _ => "entidades=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            output,
            workers,
            pages,
            headful,
            config,
        } => cmd_run(output.as_deref(), workers, pages, headful, config.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(
    output: Option<&str>,
    workers: Option<u32>,
    pages: Option<u32>,
    headful: bool,
    config_path: Option<&str>,
) -> Result<()> {
    let config = match config_path {
        Some(path) => load_config_from(Path::new(path))?,
        None => load_config()?,
    };

    let run_config = Arc::new(RunConfig::resolve(&config, workers, pages)?);
    let output = output.map(String::from).unwrap_or_else(|| config.run.output.clone());
    let headless = !headful && config.run.headless;

    info!(
        total_pages = run_config.total_pages,
        workers = run_config.worker_count,
        output = %output,
        "starting harvest"
    );

    let started = Instant::now();
    let mut sink = CsvSink::create(&output)?;
    let factory = Arc::new(ChromeFactory::new(headless));
    let reporter = CliProgress::new(run_config.worker_count);

    let summary = orchestrator::run(run_config, factory, &mut sink, &reporter).await?;

    // Print summary
    println!();
    println!("  Harvest complete!");
    println!("  Pages:   {}", summary.total_pages);
    println!("  Workers: {}", summary.worker_count);
    println!("  Records: {}", summary.total_records);
    println!("  Output:  {output}");
    println!("  Time:    {:.1}s", started.elapsed().as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Created config file at {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let path = config_file_path()?;
    let config = load_config()?;
    let rendered = toml::to_string_pretty(&config)?;

    println!("# {}", path.display());
    println!("{rendered}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Progress bar over settled workers, fed by the orchestrator.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new(worker_count: u32) -> Self {
        let bar = ProgressBar::new(u64::from(worker_count));
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} [{bar:30}] {pos}/{len} workers {msg}",
            )
            .unwrap()
            .progress_chars("=> "),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { bar }
    }
}

impl ProgressReporter for CliProgress {
    fn run_started(&self, total_pages: u32, _worker_count: u32) {
        self.bar.set_message(format!("{total_pages} pages"));
    }

    fn worker_finished(&self, records_so_far: usize, settled: u32, _total: u32) {
        self.bar.set_position(u64::from(settled));
        self.bar.set_message(format!("{records_so_far} records"));
    }

    fn done(&self, _summary: &RunSummary) {
        self.bar.finish_and_clear();
    }
}
