//! BFG list CLI
//!
//! Runs one list request against the database and prints the result as
//! JSON, or prints the SQL it would run with `--explain`.

use anyhow::Context;
use bfg_platform::db::{self, create_pool, PgListStore};
use bfg_platform::services::ListService;
use bfg_platform::{logging, Config, EntityKind};
use bfg_query::{join_sort_params, ListQuery, OffsetPage, PageLimits};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "bfg-list")]
#[command(about = "Query BFG admin lists with filter, sort, expand and search", long_about = None)]
#[command(version)]
struct Cli {
    /// Entity to list (accreditation, athlete, athletePhoto, club, clubCoach, user)
    #[arg(short, long)]
    entity: String,

    /// Filter expression, e.g. "year ge 2020 and status eq 'ACTIVE'"
    #[arg(short, long)]
    filter: Option<String>,

    /// Sort expression, e.g. "year_desc,accreditationNumber_asc"; repeatable
    #[arg(short, long)]
    sort: Vec<String>,

    /// Relations to expand, comma separated
    #[arg(short = 'x', long)]
    expand: Option<String>,

    /// Free-text search terms
    #[arg(long)]
    search: Option<String>,

    /// Rows to skip
    #[arg(long)]
    skip: Option<i64>,

    /// Page size
    #[arg(long)]
    top: Option<i64>,

    /// Zero-based page number, an alternative to --skip
    #[arg(long, conflicts_with = "skip")]
    page: Option<i64>,

    /// Print the SQL and bind values instead of running the query
    #[arg(long)]
    explain: bool,

    /// Do not compute facets
    #[arg(long)]
    no_facets: bool,
}

impl Cli {
    /// Merge repeated `--sort` values and resolve `--page` into a skip offset
    fn list_query(&self, limits: &PageLimits) -> anyhow::Result<ListQuery> {
        let skip = match self.page {
            Some(page) => Some(
                OffsetPage::from_request(None, self.top, limits)?
                    .with_page(page)?
                    .skip(),
            ),
            None => self.skip,
        };
        Ok(ListQuery {
            filter: self.filter.clone(),
            search: self.search.clone(),
            sort: Some(join_sort_params(&self.sort)).filter(|sort| !sort.is_empty()),
            expand: self.expand.clone(),
            skip,
            top: self.top,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;
    if cli.no_facets {
        config.query.facets_enabled = false;
    }

    let _logging_guard = logging::init_logging(&config.logging).context("Failed to initialize logging")?;

    let entity: EntityKind = cli.entity.parse()?;
    let query = cli.list_query(&config.query.limits())?;

    if cli.explain {
        let explain = db::explain(entity, &query, &config.query.limits())?;
        println!("{}", serde_json::to_string_pretty(&explain)?);
        return Ok(());
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        entity = %entity,
        "Running list query"
    );

    let pool = create_pool(&config.database)
        .await
        .context("Failed to connect to database")?;
    let service = ListService::new(PgListStore::new(pool), &config.query);

    let result = service
        .list(entity, &query)
        .await
        .map_err(|e| anyhow::anyhow!(e.public_message()))?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
