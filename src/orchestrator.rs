use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;

use crate::config::OrchestratorConfig;
use crate::page::PageDriver;
use crate::session::SessionManager;
use crate::site::SiteAdapter;
use crate::store::ProductStore;
use crate::{AppError, Result};

/// Wraps one search term's full pipeline (locate, then extract-all) as a
/// retryable unit of work.
pub struct Orchestrator {
    sessions: Arc<dyn SessionManager>,
    site: Arc<dyn SiteAdapter>,
    store: ProductStore,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        sessions: Arc<dyn SessionManager>,
        site: Arc<dyn SiteAdapter>,
        store: ProductStore,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            sessions,
            site,
            store,
            config,
        }
    }

    /// Run the pipeline for one search term, retrying the whole sequence
    /// from scratch on failure. Retries never resume partial progress; that
    /// is safe because persistence is an upsert.
    pub async fn run(&self, search_term: &str) -> Result<()> {
        let strategy = FixedInterval::new(self.config.retry_delay()).take(self.config.max_retries);

        Retry::spawn(strategy, || self.run_once(search_term)).await
    }

    async fn run_once(&self, search_term: &str) -> Result<()> {
        let mut session = self.sessions.acquire().await?;
        let page: &dyn PageDriver = session.as_ref();
        let found = self.site.find_products(page, search_term).await;
        session.close().await;
        let references = found?;

        if references.is_empty() {
            tracing::info!(search_term, "no products matched");
            return Ok(());
        }

        // detail fetches deliberately run in a second, fresh session
        let mut session = self.sessions.acquire().await?;
        let page: &dyn PageDriver = session.as_ref();

        let mut outcome = Ok(());
        for reference in &references {
            match self.site.fetch_details(page, reference).await {
                Ok(record) => self.store.upsert(&record).await,
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }
        session.close().await;

        outcome
    }
}

/// In-process stand-in for an external job broker: a bounded channel with a
/// single worker draining search terms through the orchestrator. Tasks for
/// different terms share nothing but the store.
pub struct TaskQueue {
    tx: mpsc::Sender<String>,
}

impl TaskQueue {
    pub fn start(orchestrator: Arc<Orchestrator>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<String>(capacity);

        let worker = tokio::spawn(async move {
            while let Some(search_term) = rx.recv().await {
                if let Err(e) = orchestrator.run(&search_term).await {
                    tracing::error!(%search_term, error = %e, "search task permanently failed");
                }
            }
        });

        (Self { tx }, worker)
    }

    pub async fn enqueue(&self, search_term: impl Into<String>) -> Result<()> {
        self.tx
            .send(search_term.into())
            .await
            .map_err(|_| AppError::QueueClosed)
    }
}
