use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ScraperConfig;
use crate::page::PageDriver;
use crate::{AppError, Result};

/// One live browser session. Closing is idempotent; dropping an unclosed
/// session tears the browser down as well, so release is guaranteed on every
/// exit path, including error propagation out of dependents.
#[async_trait]
pub trait Session: PageDriver {
    async fn close(&mut self);
}

#[async_trait]
pub trait SessionManager: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn Session>>;
}

pub struct ChromeSessionManager {
    config: ScraperConfig,
}

impl ChromeSessionManager {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionManager for ChromeSessionManager {
    async fn acquire(&self) -> Result<Box<dyn Session>> {
        let session = ChromeSession::launch(&self.config)?;
        Ok(Box::new(session))
    }
}

pub struct ChromeSession {
    browser: Option<Browser>,
    tab: Arc<Tab>,
}

impl ChromeSession {
    pub fn launch(config: &ScraperConfig) -> Result<Self> {
        let mut launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(false) // Often needed in containerized environments
            .args(vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-extensions"),
                // keeps navigator.webdriver from giving the session away
                OsStr::new("--disable-blink-features=AutomationControlled"),
                OsStr::new("--disable-infobars"),
                OsStr::new("--window-size=1920,1080"),
            ])
            .build()
            .map_err(|e| AppError::SessionStart(format!("invalid launch options: {}", e)))?;

        if let Some(chrome_path) = &config.chrome_path {
            launch_options.path = Some(std::path::PathBuf::from(chrome_path));
        }

        let browser =
            Browser::new(launch_options).map_err(|e| AppError::SessionStart(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| AppError::SessionStart(e.to_string()))?;
        tab.set_default_timeout(config.navigation_timeout());
        tab.set_user_agent(&config.user_agent, None, None)
            .map_err(|e| AppError::SessionStart(e.to_string()))?;

        tracing::info!(base_url = %config.base_url, "launched browser session");

        Ok(Self {
            browser: Some(browser),
            tab,
        })
    }

    fn tab(&self) -> Result<&Tab> {
        if self.browser.is_none() {
            return Err(AppError::SessionClosed);
        }
        Ok(&self.tab)
    }
}

#[async_trait]
impl PageDriver for ChromeSession {
    async fn goto(&self, url: &str) -> Result<()> {
        let tab = self.tab()?;
        tab.navigate_to(url).map_err(|e| AppError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        tab.wait_until_navigated().map_err(|e| AppError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()> {
        let tab = self.tab()?;
        tab.wait_for_element_with_custom_timeout(selector, timeout)
            .map(|_| ())
            .map_err(|_| AppError::SelectorTimeout {
                selector: selector.to_string(),
                url: tab.get_url(),
            })
    }

    async fn settle(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }

    async fn content(&self) -> Result<String> {
        let tab = self.tab()?;
        tab.get_content().map_err(|e| AppError::Navigation {
            url: tab.get_url(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl Session for ChromeSession {
    async fn close(&mut self) {
        if let Some(browser) = self.browser.take() {
            tracing::info!("closing browser session");
            // the Chrome process exits when the handle is dropped
            drop(browser);
        }
    }
}
