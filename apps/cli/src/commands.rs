//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use academiccv_core::coauthors::enrich_coauthors;
use academiccv_core::import::{import_collections, read_dump};
use academiccv_core::pipeline::{ProgressReporter, RenderOptions, render_cv};
use academiccv_scopus::{ScopusClient, ScopusOptions};
use academiccv_shared::{
    AppConfig, Collection, init_config, load_config, load_config_from, resolve_database_path,
    scopus_api_key,
};
use academiccv_storage::{SortOrder, Storage};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// academiccv: render an academic CV from structured records.
#[derive(Parser)]
#[command(
    name = "academiccv",
    version,
    about = "Render an academic CV from a local record store.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.academicdb/config.toml).
    #[arg(long, global = true, env = "ACADEMICCV_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database file (overrides ~/.academicdb/dbconfig.toml).
    #[arg(long, global = true, env = "ACADEMICCV_DB")]
    pub db: Option<PathBuf>,

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
    /// Render the CV document and typeset it.
    Render {
        /// Output .tex path.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// LaTeX header template.
        #[arg(long)]
        header: Option<PathBuf>,

        /// LaTeX footer template.
        #[arg(long)]
        footer: Option<PathBuf>,

        /// Write the document without running the typesetter.
        #[arg(long)]
        no_typeset: bool,

        /// Include the research funding section.
        #[arg(long)]
        include_funding: bool,

        /// Prefix each publication with its EID.
        #[arg(long)]
        debug_eids: bool,

        /// DOI to leave out of the publication list (repeatable).
        #[arg(long = "exclude-doi", value_name = "DOI")]
        exclude_dois: Vec<String>,
    },

    /// Rebuild the coauthors collection from Scopus author lookups.
    Coauthors,

    /// Import collections from a JSON dump.
    Import {
        /// JSON file mapping collection names to arrays of documents.
        file: PathBuf,

        /// Empty every collection before importing.
        #[arg(long)]
        overwrite: bool,
    },

    /// Print documents of a collection, or list collections.
    Show {
        /// Collection name; omit to list collections with counts.
        collection: Option<String>,

        /// Sort by a top-level field.
        #[arg(long, value_name = "FIELD")]
        sort: Option<String>,

        /// Sort descending.
        #[arg(long, requires = "sort")]
        desc: bool,

        /// Only documents whose field starts with a value.
        #[arg(long, value_name = "FIELD=VALUE", conflicts_with_all = ["contains", "sort"])]
        prefix: Option<String>,

        /// Only documents whose field contains a value.
        #[arg(long, value_name = "FIELD=VALUE", conflicts_with_all = ["prefix", "sort"])]
        contains: Option<String>,
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
        0 => "academiccv=info",
        1 => "academiccv=debug",
        _ => "academiccv=trace",
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
    let config_path = cli.config.as_deref();
    let db = cli.db.as_deref();

    match cli.command {
        Command::Render {
            output,
            header,
            footer,
            no_typeset,
            include_funding,
            debug_eids,
            exclude_dois,
        } => {
            let mut config = app_config(config_path)?;
            let render = &mut config.render;
            if let Some(p) = output {
                render.output = p.display().to_string();
            }
            if let Some(p) = header {
                render.header = p.display().to_string();
            }
            if let Some(p) = footer {
                render.footer = p.display().to_string();
            }
            render.include_funding |= include_funding;
            render.debug_eids |= debug_eids;
            render.exclude_dois.extend(exclude_dois);
            if no_typeset {
                config.typeset.enabled = false;
            }
            cmd_render(&config, db).await
        }
        Command::Coauthors => cmd_coauthors(&app_config(config_path)?, db).await,
        Command::Import { file, overwrite } => cmd_import(&file, overwrite, db).await,
        Command::Show {
            collection,
            sort,
            desc,
            prefix,
            contains,
        } => {
            let query = match (sort, prefix, contains) {
                (Some(field), _, _) => Query::Sorted {
                    field,
                    order: if desc {
                        SortOrder::Descending
                    } else {
                        SortOrder::Ascending
                    },
                },
                (None, Some(p), _) => {
                    let (field, value) = split_filter(&p)?;
                    Query::Prefix { field, value }
                }
                (None, None, Some(c)) => {
                    let (field, value) = split_filter(&c)?;
                    Query::Contains { field, value }
                }
                (None, None, None) => Query::All,
            };
            cmd_show(collection.as_deref(), query, db).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
    }
}

/// Load the config from `--config` or the default location.
fn app_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    })
}

/// `--db` wins over dbconfig.toml.
fn database_path(db: Option<&Path>) -> Result<PathBuf> {
    Ok(match db {
        Some(p) => p.to_path_buf(),
        None => resolve_database_path()?,
    })
}

fn split_filter(raw: &str) -> Result<(String, String)> {
    raw.split_once('=')
        .map(|(f, v)| (f.to_string(), v.to_string()))
        .ok_or_else(|| eyre!("invalid filter '{raw}': expected FIELD=VALUE"))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_render(config: &AppConfig, db: Option<&Path>) -> Result<()> {
    let db_path = database_path(db)?;
    let storage = Storage::open_readonly(&db_path).await?;
    let options = RenderOptions::from_config(config);

    info!(db = %db_path.display(), output = %options.render.output, "rendering CV");

    let reporter = CliProgress::new();
    let result = render_cv(&options, &storage, &reporter).await?;

    println!();
    println!("  CV rendered successfully!");
    println!("  Output:   {}", result.document.path.display());
    println!("  SHA-256:  {}", result.document.sha256);
    println!("  Sections: {}", result.sections.len());
    match &result.typeset {
        Some(outcome) => println!(
            "  Typeset:  {}",
            outcome
                .marker_line
                .as_deref()
                .unwrap_or("done (no output line reported)")
        ),
        None => println!("  Typeset:  skipped"),
    }
    println!("  Time:     {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_coauthors(config: &AppConfig, db: Option<&Path>) -> Result<()> {
    // Validate API key before touching the store
    let api_key = scopus_api_key(config)?;
    let client = ScopusClient::new(&ScopusOptions::from_config(&config.scopus, api_key))?;

    let db_path = database_path(db)?;
    let storage = Storage::open(&db_path).await?;

    info!(db = %db_path.display(), "enriching coauthors");

    let reporter = CliProgress::new();
    let summary = enrich_coauthors(&storage, &client, &reporter).await?;

    println!();
    println!("  Coauthors updated!");
    println!("  Publications: {}", summary.publications);
    println!("  Unique ids:   {}", summary.unique_ids);
    println!("  Resolved:     {}", summary.resolved);
    println!("  Unresolved:   {}", summary.unresolved);
    println!();

    Ok(())
}

async fn cmd_import(file: &Path, overwrite: bool, db: Option<&Path>) -> Result<()> {
    let dump = read_dump(file)?;
    let db_path = database_path(db)?;
    let storage = Storage::open(&db_path).await?;

    info!(file = %file.display(), db = %db_path.display(), overwrite, "importing records");

    let summary = import_collections(&storage, &dump, overwrite).await?;

    println!();
    for (collection, count) in &summary.counts {
        println!("  {:<14} {count}", collection.as_str());
    }
    println!("  {:<14} {}", "total", summary.total());
    println!();

    Ok(())
}

/// Query shape for `show`.
enum Query {
    All,
    Sorted { field: String, order: SortOrder },
    Prefix { field: String, value: String },
    Contains { field: String, value: String },
}

async fn cmd_show(collection: Option<&str>, query: Query, db: Option<&Path>) -> Result<()> {
    let db_path = database_path(db)?;
    let storage = Storage::open_readonly(&db_path).await?;

    let Some(name) = collection else {
        for (name, count) in storage.list_collections().await? {
            println!("{name:<14} {count}");
        }
        return Ok(());
    };

    let collection: Collection = name.parse()?;
    let docs = match query {
        Query::All => storage.find(collection).await?,
        Query::Sorted { field, order } => storage.find_sorted(collection, &field, order).await?,
        Query::Prefix { field, value } => storage.find_prefix(collection, &field, &value).await?,
        Query::Contains { field, value } => {
            storage.find_contains(collection, &field, &value).await?
        }
    };

    for doc in &docs {
        println!("{}", serde_json::to_string(doc)?);
    }
    info!(%collection, count = docs.len(), "documents shown");

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = app_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
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
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn item(&self, current: usize, total: usize, detail: &str) {
        self.spinner
            .set_message(format!("Looking up [{current}/{total}] {detail}"));
    }

    fn finish(&self, _message: &str) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        // Clear the spinner when a command fails before `finish`.
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
