//! CLI command definitions, routing, and tracing setup.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use leadpipe_core::{
    EnrichmentReport, EnrichmentStage, Lead, MergeReport, NameStage, OpenerStage, Progress,
    merge_prospects, run_stage,
};
use leadpipe_http::{Client, ClientOptions};
use leadpipe_shared::{
    AppConfig, RateLimiter, ServiceConfig, init_config, load_config, require_api_key,
};
use leadpipe_sources::{MediaClient, OpenAiClient, ProspetyClient, TranscriptClient};
use leadpipe_table::Table;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// leadpipe: source, deduplicate and enrich outreach leads.
#[derive(Parser)]
#[command(
    name = "leadpipe",
    version,
    about = "Import prospects into the leads table and enrich them with AI-written names and openers.",
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
    /// Upload new prospects from every saved search as leads.
    Merge,

    /// Infer real names and niches for leads in `ready-name`.
    GenName {
        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Generate openers from the latest video of leads in `ready`.
    GenOpeners {
        #[command(flatten)]
        batch: BatchArgs,

        /// Maximum transcript characters sent to the model.
        #[arg(long)]
        transcript_budget: Option<usize>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options shared by the enrichment commands. Unset values fall back to the
/// `[enrichment]` config section.
#[derive(clap::Args)]
pub(crate) struct BatchArgs {
    /// Only enrich leads assigned to this user name.
    #[arg(long)]
    assignee: Option<String>,

    /// Maximum number of leads processed at once.
    #[arg(long)]
    max_in_flight: Option<usize>,
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
        0 => "leadpipe=info",
        1 => "leadpipe=debug",
        _ => "leadpipe=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Merge => cmd_merge().await,
        Command::GenName { batch } => cmd_gen_name(batch).await,
        Command::GenOpeners {
            batch,
            transcript_budget,
        } => cmd_gen_openers(batch, transcript_budget).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Composition root
// ---------------------------------------------------------------------------

/// Build a client for one service with its own limiter. The key is read
/// here so a missing credential fails before any request is made.
fn service_client(
    key_env: &str,
    host: Option<&str>,
    requests_per_second: u32,
    options: ClientOptions,
) -> Result<Client> {
    let api_key = require_api_key(key_env)?;
    let mut options =
        options.with_rate_limit(Arc::new(RateLimiter::per_second(requests_per_second)?));
    if let Some(host) = host {
        options = options.with_host(host)?;
    }
    Ok(Client::new(api_key, options)?)
}

/// Client for a collaborator section, honouring its key header and static
/// headers.
fn section_client(service: &ServiceConfig) -> Result<Client> {
    let mut options = ClientOptions::new();
    if let Some(name) = service.key_header() {
        options = options.with_api_key_header(name)?;
    }
    for (name, value) in &service.headers {
        options = options.with_header(name, value)?;
    }
    service_client(
        &service.api_key_env,
        Some(service.host.as_str()),
        service.requests_per_second,
        options,
    )
}

fn lead_table(config: &AppConfig) -> Result<Table<Lead>> {
    let airtable = &config.airtable;
    let client = service_client(
        &airtable.api_key_env,
        airtable.host.as_deref(),
        airtable.requests_per_second,
        ClientOptions::new(),
    )?;
    Ok(Table::new(client, &airtable.base_id, &airtable.lead_table_id))
}

fn openai(config: &AppConfig) -> Result<OpenAiClient> {
    let openai = &config.openai;
    let client = service_client(
        &openai.api_key_env,
        Some(openai.host.as_str()),
        openai.requests_per_second,
        ClientOptions::new(),
    )?;
    Ok(OpenAiClient::new(client, &openai.model))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_merge() -> Result<()> {
    let config = load_config()?;
    let table = lead_table(&config)?;
    let source = ProspetyClient::new(section_client(&config.prospety)?);

    info!("merging prospects into leads");
    let progress = CliProgress::new();
    let report = merge_prospects(&source, &table, &config.merge, &progress).await;
    progress.finish();
    print_merge_report(&report?);
    Ok(())
}

async fn cmd_gen_name(batch: BatchArgs) -> Result<()> {
    let config = load_config()?;
    let table = lead_table(&config)?;
    let assignee = batch.assignee.or(config.enrichment.assignee.clone());
    let stage = NameStage::new(openai(&config)?, assignee);

    let max_in_flight = batch.max_in_flight.or(config.enrichment.max_in_flight);
    run_enrichment(&table, stage, max_in_flight).await
}

async fn cmd_gen_openers(batch: BatchArgs, transcript_budget: Option<usize>) -> Result<()> {
    let config = load_config()?;
    let table = lead_table(&config)?;
    let media = MediaClient::new(section_client(&config.media)?);
    let transcripts = TranscriptClient::new(section_client(&config.transcript)?);

    let stage = OpenerStage::new(
        media,
        transcripts,
        openai(&config)?,
        batch.assignee.or(config.enrichment.assignee.clone()),
        transcript_budget.unwrap_or(config.enrichment.transcript_budget),
    );

    let max_in_flight = batch.max_in_flight.or(config.enrichment.max_in_flight);
    run_enrichment(&table, stage, max_in_flight).await
}

async fn run_enrichment<S: EnrichmentStage>(
    table: &Table<Lead>,
    stage: S,
    max_in_flight: Option<usize>,
) -> Result<()> {
    info!(stage = stage.name(), "starting enrichment");
    let progress = Arc::new(CliProgress::new());
    let report = run_stage(table, Arc::new(stage), max_in_flight, progress.clone()).await;
    progress.finish();
    print_enrichment_report(&report?);
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn print_merge_report(report: &MergeReport) {
    println!();
    println!("  Merge complete");
    println!("  Fetched:    {}", report.fetched);
    println!("  Skipped:    {}", report.skipped);
    println!("  Duplicates: {}", report.duplicates);
    println!("  Existing:   {}", report.existing);
    println!("  Created:    {}", report.created);
    println!();
}

fn print_enrichment_report(report: &EnrichmentReport) {
    println!();
    println!("  Stage {} complete", report.stage);
    println!("  Scanned:    {}", report.scanned);
    println!("  Candidates: {}", report.candidates);
    println!("  Succeeded:  {}", report.succeeded);
    println!("  Failed:     {}", report.failed);
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
    total: AtomicUsize,
    done: AtomicUsize,
    failed: AtomicUsize,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self {
            spinner,
            total: AtomicUsize::new(0),
            done: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl Progress for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn planned(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
    }

    fn record_done(&self, record_id: &str, succeeded: bool) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if !succeeded {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        let total = self.total.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        self.spinner
            .set_message(format!("Processing [{done}/{total}, {failed} failed] {record_id}"));
    }
}
