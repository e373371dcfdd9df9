use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use yarn_scout::config::AppConfig;
use yarn_scout::orchestrator::{Orchestrator, TaskQueue};
use yarn_scout::session::ChromeSessionManager;
use yarn_scout::site::WollplatzSite;
use yarn_scout::store::ProductStore;
use yarn_scout::web::{self, AppState};

const DEFAULT_SEARCH_TERMS: &[&str] = &[
    "DMC Natura XL",
    "Drops Safran",
    "Drops Baby Merino Mix",
    "Hahn Alpacca Speciale",
    "Stylecraft Special double knit",
];

#[derive(Parser, Debug)]
#[command(name = "yarn-scout", version, about = "Scrapes yarn listings and serves them over HTTP")]
struct Cli {
    /// Search term to scrape (repeatable); defaults to the built-in seed list
    #[arg(long = "term")]
    terms: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("yarn_scout=debug".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    info!("Starting Yarn Scout...");

    let store = ProductStore::connect(&config.database).await?;
    let sessions = Arc::new(ChromeSessionManager::new(config.scraper.clone()));
    let site = Arc::new(WollplatzSite::new(&config.scraper)?);
    let orchestrator = Arc::new(Orchestrator::new(
        sessions,
        site,
        store.clone(),
        config.orchestrator.clone(),
    ));
    let (queue, worker) = TaskQueue::start(orchestrator, config.orchestrator.queue_capacity);

    let terms: Vec<String> = if cli.terms.is_empty() {
        DEFAULT_SEARCH_TERMS.iter().map(|s| s.to_string()).collect()
    } else {
        cli.terms
    };
    for term in terms {
        queue.enqueue(term).await?;
    }

    let state = AppState { store };
    tokio::select! {
        result = web::serve(&config.server, state) => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down..."),
    }

    drop(queue);
    worker.abort();

    Ok(())
}
