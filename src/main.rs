//! # Country Atlas CLI (`atlas`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `atlas init` | Create the SQLite database, FTS index, and triggers |
//! | `atlas sync` | Create the schema and load countries if the store is empty |
//! | `atlas search` | Run a `/countries` query from the command line |
//! | `atlas serve` | Load if needed, then start the HTTP server |
//!
//! A missing `--config` file is fine; every setting has a default.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use country_atlas::config::{self, Config};
use country_atlas::loader::{self, LoadOutcome};
use country_atlas::query::{search_countries, CountryQuery};
use country_atlas::source::RestCountriesSource;
use country_atlas::{db, migrate, server};

/// Country Atlas: a searchable local copy of the REST Countries dataset.
#[derive(Parser)]
#[command(name = "atlas", version)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/atlas.toml`. Built-in defaults apply when the
    /// file does not exist.
    #[arg(long, global = true, default_value = "./config/atlas.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema. Idempotent.
    Init,

    /// Load countries from the configured source if the store is empty.
    Sync,

    /// Query the local store and print one JSON page.
    Search(SearchArgs),

    /// Start the HTTP server, loading data first if the store is empty.
    Serve,
}

/// Mirrors the `/countries` query parameters. Values go through the same
/// normalization as HTTP requests.
#[derive(Args)]
struct SearchArgs {
    /// Free-text query against names, capital, region, and languages.
    #[arg(long)]
    q: Option<String>,
    #[arg(long)]
    region: Option<String>,
    #[arg(long)]
    subregion: Option<String>,
    /// Substring of the languages list.
    #[arg(long)]
    lang: Option<String>,
    #[arg(long)]
    min_pop: Option<String>,
    #[arg(long)]
    max_pop: Option<String>,
    #[arg(long)]
    min_area: Option<String>,
    #[arg(long)]
    max_area: Option<String>,
    /// `name`, `population`, or `area`.
    #[arg(long)]
    sort: Option<String>,
    /// `asc` or `desc`.
    #[arg(long)]
    order: Option<String>,
    #[arg(long)]
    limit: Option<String>,
    #[arg(long)]
    offset: Option<String>,
}

impl SearchArgs {
    fn to_query(&self) -> CountryQuery {
        let pairs = [
            ("q", &self.q),
            ("region", &self.region),
            ("subregion", &self.subregion),
            ("lang", &self.lang),
            ("min_pop", &self.min_pop),
            ("max_pop", &self.max_pop),
            ("min_area", &self.min_area),
            ("max_area", &self.max_area),
            ("sort", &self.sort),
            ("order", &self.order),
            ("limit", &self.limit),
            ("offset", &self.offset),
        ];
        CountryQuery::from_pairs(
            pairs
                .into_iter()
                .filter_map(|(key, value)| value.as_deref().map(|v| (key, v))),
        )
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        config::load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::minimal())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let cfg = load_or_default(&cli.config)?;
    let pool = db::connect(&cfg.db).await?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&pool).await?;
            println!("Database initialized successfully.");
        }
        Commands::Sync => {
            let source = RestCountriesSource::new(&cfg.source);
            match loader::ensure_data(&pool, &source).await? {
                LoadOutcome::AlreadyLoaded(rows) => {
                    println!("already loaded: {} countries", rows);
                }
                LoadOutcome::Loaded(rows) => {
                    println!("loaded: {} countries", rows);
                }
            }
        }
        Commands::Search(args) => {
            migrate::run_migrations(&pool).await?;
            let page = search_countries(&pool, &args.to_query()).await?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        Commands::Serve => {
            let source = RestCountriesSource::new(&cfg.source);
            loader::ensure_data(&pool, &source).await?;
            server::run_server(&cfg, pool.clone()).await?;
        }
    }

    pool.close().await;
    Ok(())
}
