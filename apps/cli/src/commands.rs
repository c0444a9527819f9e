//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use trainingcatalog_core::contextualize::{self, JsonRenderer};
use trainingcatalog_core::pipeline::{self, ProgressReporter};
use trainingcatalog_core::{CatalogStats, catalog};
use trainingcatalog_shared::{
    AppConfig, Credentials, Settings, SkillDomain, ValidationReport, init_config, load_config,
    load_config_from, parse_domains,
};
use trainingcatalog_storage::CatalogStore;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Training catalog: curate free AI/ML training material into curricula.
#[derive(Parser)]
#[command(
    name = "trainingcatalog",
    version,
    about = "Discover, curate and organize free AI/ML training material into curricula.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.trainingcatalog/trainingcatalog.toml.
    #[arg(long, global = true, env = "TRAININGCATALOG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root all storage paths under this directory.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

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
    /// Search providers for training resources and add them to the catalog.
    Discover {
        /// Comma-separated skill domains (e.g. ml_basics,nlp). Defaults to all.
        #[arg(long)]
        domains: Option<String>,

        /// Max results per query per searcher.
        #[arg(long)]
        max_results: Option<usize>,
    },

    /// Scrape catalog resources, flag duplicates and refine categories.
    Ingest {
        /// Minimum quality score to ingest (defaults to the configured threshold).
        #[arg(long)]
        min_score: Option<f64>,

        /// Ingest only this resource id.
        #[arg(long)]
        resource_id: Option<String>,
    },

    /// Generate a curriculum from the catalog.
    Generate {
        /// Comma-separated skill domains. Defaults to all.
        #[arg(long)]
        domains: Option<String>,

        /// Custom curriculum title.
        #[arg(long)]
        title: Option<String>,

        /// Also write the curriculum JSON to this path.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Inspect or export the catalog.
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },

    /// Produce a rural-contextualized edition of a learning path.
    Contextualize {
        /// Partial, case-insensitive learning path title (default: "ml basics").
        #[arg(long)]
        path_title: Option<String>,

        /// Rendered output path.
        #[arg(long, default_value = "rural_course.json")]
        output: PathBuf,

        /// Also write raw JSON to this path.
        #[arg(long)]
        json_output: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Catalog subcommands.
#[derive(Subcommand)]
pub(crate) enum CatalogAction {
    /// List catalog resources, best first.
    List {
        /// Only resources tagged with this skill domain.
        #[arg(long)]
        domain: Option<String>,

        /// Minimum quality score (ignored with --domain).
        #[arg(long, default_value_t = 0.0)]
        min_score: f64,

        /// Max items to show.
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Show catalog statistics.
    Stats {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Export the catalog document.
    Export {
        #[arg(long, default_value = "catalog_export.json")]
        output: PathBuf,
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
        0 => "trainingcatalog=info",
        1 => "trainingcatalog=debug",
        _ => "trainingcatalog=trace",
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
    let Cli {
        config,
        data_dir,
        command,
        ..
    } = cli;
    let source = ConfigSource {
        path: config,
        data_dir,
    };

    match command {
        Command::Discover {
            domains,
            max_results,
        } => cmd_discover(&source, domains.as_deref(), max_results).await,
        Command::Ingest {
            min_score,
            resource_id,
        } => cmd_ingest(&source, min_score, resource_id.as_deref()).await,
        Command::Generate {
            domains,
            title,
            output,
        } => cmd_generate(&source, domains.as_deref(), title.as_deref(), output.as_deref()).await,
        Command::Catalog { action } => match action {
            CatalogAction::List {
                domain,
                min_score,
                limit,
            } => cmd_catalog_list(&source, domain.as_deref(), min_score, limit).await,
            CatalogAction::Stats { json } => cmd_catalog_stats(&source, json).await,
            CatalogAction::Export { output } => cmd_catalog_export(&source, &output).await,
        },
        Command::Contextualize {
            path_title,
            output,
            json_output,
        } => {
            cmd_contextualize(&source, path_title.as_deref(), &output, json_output.as_deref())
                .await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&source).await,
        },
    }
}

/// Where the config comes from, plus flag overrides.
struct ConfigSource {
    path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
}

impl ConfigSource {
    fn app_config(&self) -> Result<AppConfig> {
        let config = match &self.path {
            Some(path) => load_config_from(path)?,
            None => load_config()?,
        };
        config.validate()?;
        Ok(config)
    }

    fn settings(&self, config: &AppConfig) -> Settings {
        let settings = Settings::from(config);
        match &self.data_dir {
            Some(dir) => settings.with_data_dir(dir),
            None => settings,
        }
    }
}

/// Comma-separated domain names; empty means all domains.
fn domains_arg(raw: Option<&str>) -> Result<Vec<SkillDomain>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    let names: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    Ok(parse_domains(&names)?)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_discover(
    source: &ConfigSource,
    domains: Option<&str>,
    max_results: Option<usize>,
) -> Result<()> {
    let config = source.app_config()?;
    let settings = source.settings(&config);
    let credentials = Credentials::from_env(&config.search);
    let domains = domains_arg(domains)?;

    info!(
        domains = domains.len(),
        credentials = ?credentials,
        "discovering resources"
    );

    let reporter = CliProgress::new();
    let report =
        pipeline::discover(&settings, &credentials, &domains, max_results, &reporter).await;
    reporter.finish();
    let report = report?;

    println!();
    println!("  Discovery complete");
    println!("  Queries executed:  {}", report.queries_executed);
    println!("  Raw results:       {}", report.raw_results);
    println!("  Unique results:    {}", report.unique_results);
    println!("  New resources:     {}", report.new_resources);
    println!("  Updated resources: {}", report.updated_resources);
    println!("  Below threshold:   {}", report.below_threshold);
    print_errors(&report.errors);
    println!();
    Ok(())
}

async fn cmd_ingest(
    source: &ConfigSource,
    min_score: Option<f64>,
    resource_id: Option<&str>,
) -> Result<()> {
    let config = source.app_config()?;
    let settings = source.settings(&config);

    let reporter = CliProgress::new();
    let report = pipeline::ingest(&settings, min_score, resource_id, &reporter).await;
    reporter.finish();
    let report = report?;

    println!();
    println!("  Ingestion complete");
    println!("  Resources:          {}", report.total_resources);
    println!("  Scraped:            {}", report.scraped);
    println!("  Failed:             {}", report.failed);
    println!("  Duplicate groups:   {}", report.duplicate_groups);
    println!("  Duplicates flagged: {}", report.duplicates_flagged);
    println!("  Recategorized:      {}", report.recategorized);
    print_errors(&report.errors);
    println!();
    Ok(())
}

async fn cmd_generate(
    source: &ConfigSource,
    domains: Option<&str>,
    title: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let config = source.app_config()?;
    let settings = source.settings(&config);
    let domains = domains_arg(domains)?;

    let reporter = CliProgress::new();
    let outcome = pipeline::generate(&settings, &domains, title, output, &reporter).await;
    reporter.finish();
    let (curriculum, report) = outcome?;

    println!();
    println!("  Curriculum generated");
    println!("  ID:        {}", curriculum.id);
    println!("  Title:     {}", curriculum.title);
    println!("  Paths:     {}", curriculum.metadata.total_paths);
    println!("  Resources: {}", curriculum.metadata.total_resources);
    println!("  Hours:     {:.1}", curriculum.total_hours());
    for path in &curriculum.learning_paths {
        println!(
            "    - {} ({} modules, {:.1}h)",
            path.title,
            path.modules.len(),
            path.total_estimated_hours
        );
    }
    if let Some(output) = output {
        println!("  Written:   {}", output.display());
    }
    print_validation(&report);
    println!();
    Ok(())
}

async fn cmd_catalog_list(
    source: &ConfigSource,
    domain: Option<&str>,
    min_score: f64,
    limit: usize,
) -> Result<()> {
    let config = source.app_config()?;
    let settings = source.settings(&config);
    let domain = domain.map(str::parse::<SkillDomain>).transpose()?;

    let store = CatalogStore::open(&settings.catalog_path);
    let listing = catalog::list(&store, domain, min_score, limit).await?;

    if listing.resources.is_empty() {
        println!("No resources found.");
        return Ok(());
    }
    println!(
        "{:<16}  {:<48}  {:<12}  {:<20}  {:>5}",
        "ID", "TITLE", "PROVIDER", "TYPE", "SCORE"
    );
    for r in &listing.resources {
        println!(
            "{:<16}  {:<48}  {:<12}  {:<20}  {:>5.2}",
            r.id,
            clip(&r.title, 48),
            clip(&r.provider, 12),
            r.content_type,
            r.quality_score
        );
    }
    println!();
    println!(
        "Showing {} of {} resources",
        listing.resources.len(),
        listing.total_matches
    );
    Ok(())
}

async fn cmd_catalog_stats(source: &ConfigSource, json: bool) -> Result<()> {
    let config = source.app_config()?;
    let settings = source.settings(&config);
    let store = CatalogStore::open(&settings.catalog_path);
    let stats = catalog::stats(&store).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    print_stats(&stats);
    Ok(())
}

async fn cmd_catalog_export(source: &ConfigSource, output: &Path) -> Result<()> {
    let config = source.app_config()?;
    let settings = source.settings(&config);
    let store = CatalogStore::open(&settings.catalog_path);
    let count = catalog::export(&store, output).await?;
    println!("Exported {count} resources to {}", output.display());
    Ok(())
}

async fn cmd_contextualize(
    source: &ConfigSource,
    path_title: Option<&str>,
    output: &Path,
    json_output: Option<&Path>,
) -> Result<()> {
    let config = source.app_config()?;
    let settings = source.settings(&config);

    let result =
        contextualize::contextualize(&settings, path_title, &JsonRenderer, output, json_output)
            .await?;

    println!();
    println!("  {}", result.title);
    println!("  Modules:  {}", result.modules.len());
    println!("  Hours:    {:.1}", result.total_estimated_hours);
    println!("  Datasets: {}", result.rural_datasets.len());
    println!("  Written:  {}", output.display());
    if let Some(json_output) = json_output {
        println!("  JSON:     {}", json_output.display());
    }
    println!();
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(source: &ConfigSource) -> Result<()> {
    let config = source.app_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Output helpers
// ---------------------------------------------------------------------------

fn print_errors(errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    println!("  Errors:            {}", errors.len());
    for e in errors.iter().take(10) {
        println!("    - {e}");
    }
    if errors.len() > 10 {
        println!("    ... and {} more", errors.len() - 10);
    }
}

fn print_validation(report: &ValidationReport) {
    println!(
        "  Validation: {} errors, {} warnings, {} info",
        report.error_count(),
        report.warning_count(),
        report.info_count()
    );
    for issue in &report.issues {
        println!("    [{}] {}: {}", issue.severity, issue.rule, issue.message);
    }
}

fn print_stats(stats: &CatalogStats) {
    println!();
    println!("  Total resources: {}", stats.total);
    println!("  Active:          {}", stats.active);
    if stats.total == 0 {
        println!();
        return;
    }
    println!(
        "  Quality score:   avg {:.2}, min {:.2}, max {:.2}",
        stats.average_score, stats.min_score, stats.max_score
    );
    for (heading, counts) in [
        ("By domain", &stats.by_domain),
        ("By content type", &stats.by_content_type),
        ("By provider", &stats.by_provider),
    ] {
        println!();
        println!("  {heading}:");
        for (name, count) in counts {
            println!("    {name:<28} {count:>5}");
        }
    }
    println!();
}

/// Truncate to `max` characters, marking the cut with an ellipsis.
fn clip(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn item_done(&self, label: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("[{current}/{total}] {}", clip(label, 60)));
    }
}
