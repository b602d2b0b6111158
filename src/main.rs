use anyhow::Result;
use clap::{Parser, Subcommand};
use distro_catalog::cli::{self, catalog::ListConfig};
use distro_catalog::config::CatalogConfig;
use distro_catalog::enrich::parse_enrich_fields;
use distro_catalog::logging::init_tracing;
use distro_catalog::orchestrator::AugmentPlan;
use distro_catalog::query::{CatalogQuery, SortKey, SortOrder, DEFAULT_PAGE_SIZE};
use distro_catalog::util::env::init_env;

#[derive(Parser, Debug)]
#[command(name = "distro-catalog", version, about = "Distribution catalog ingestion pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Print a page of the catalog, served from cache when fresh
    List {
        /// Only this family (case-insensitive)
        #[arg(long)]
        family: Option<String>,
        #[arg(long, value_enum, default_value_t = SortKey::Name)]
        sort_by: SortKey,
        #[arg(long, value_enum, default_value_t = SortOrder::Asc)]
        order: SortOrder,
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// 1-100
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,
        /// Ignore the cached snapshot
        #[arg(long, default_value_t = false)]
        force_refresh: bool,
    },
    /// Print one distribution by id
    Show { id: String },
    /// Pull the sheet, optionally augment, and rewrite the cache
    Refresh {
        /// Scrape fields to fill (comma separated, or "all")
        #[arg(long, value_delimiter = ',')]
        scrape: Vec<String>,
        /// Enrichment fields to fill (comma separated, or "all")
        #[arg(long, value_delimiter = ',')]
        enrich: Vec<String>,
    },
    /// Drop the cached snapshot
    ClearCache,
    /// Scrape pages for the given ids
    Scrape {
        #[arg(required = true)]
        ids: Vec<String>,
        /// Ids are already in the target's scheme
        #[arg(long, default_value_t = false)]
        external: bool,
    },
    /// Ask the enrichment backend about the given names
    Enrich {
        #[arg(required = true)]
        names: Vec<String>,
        /// Fields to request (comma separated); defaults to the core set
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
        /// Desktop hint used for RAM plausibility
        #[arg(long)]
        desktop: Option<String>,
    },
    /// Translate an id between the catalog and scrape-target schemes
    MapId {
        id: String,
        /// Treat the input as a scrape-target id
        #[arg(long, default_value_t = false)]
        reverse: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_env();
    init_tracing("info")?;
    let cfg = CatalogConfig::from_env();
    cfg.log_snapshot();

    match args.command {
        Commands::List {
            family,
            sort_by,
            order,
            page,
            page_size,
            force_refresh,
        } => {
            let list = ListConfig {
                query: CatalogQuery {
                    family,
                    sort_by,
                    order,
                    page,
                    page_size,
                },
                force_refresh,
            };
            cli::catalog::run_list(&cfg, list).await
        }
        Commands::Show { id } => cli::catalog::run_show(&cfg, &id).await,
        Commands::Refresh { scrape, enrich } => {
            let plan = AugmentPlan::from_names(&scrape, &enrich);
            cli::catalog::run_refresh(&cfg, plan).await
        }
        Commands::ClearCache => cli::catalog::run_clear_cache(&cfg).await,
        Commands::Scrape { ids, external } => cli::tools::run_scrape(&cfg, &ids, external).await,
        Commands::Enrich {
            names,
            fields,
            desktop,
        } => {
            let fields = parse_enrich_fields(&fields);
            cli::tools::run_enrich(&cfg, &names, &fields, desktop).await
        }
        Commands::MapId { id, reverse } => cli::tools::run_map_id(&id, reverse),
    }
}
