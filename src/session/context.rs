//! Session context
//!
//! A [`Session`] owns the configuration, the current driver and the options of the last page
//! load. It is cheap to clone; clones share the same browser.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::cdp_driver::CdpDriver;
use super::options::{PageOptions, WindowMode};
use super::traits::{Driver, LogEntry, WindowRect};
use crate::config::Config;
use crate::query::{Element, Findable, Finder, PollingExecutor, SearchRoot};
use crate::{Error, Result};

/// X position that moves the window off screen
const HIDDEN_WINDOW_X: i32 = -2000;

/// Schemes without an authority part
const OPAQUE_SCHEMES: &[&str] = &["about:", "data:"];

/// Widest window `mobile_window` produces
const MOBILE_MAX_WIDTH: u32 = 500;

/// Browser session
#[derive(Clone)]
pub struct Session {
    config: Arc<Config>,
    driver: Arc<RwLock<Option<Arc<dyn Driver>>>>,
    options: Arc<RwLock<PageOptions>>,
}

impl Session {
    /// Create a session without a browser
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            driver: Arc::new(RwLock::new(None)),
            options: Arc::new(RwLock::new(PageOptions::default())),
        }
    }

    /// Create a session driving `driver`
    pub fn with_driver(config: Config, driver: Arc<dyn Driver>) -> Self {
        Self {
            config: Arc::new(config),
            driver: Arc::new(RwLock::new(Some(driver))),
            options: Arc::new(RwLock::new(PageOptions::default())),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Open a tab on the configured DevTools endpoint
    ///
    /// Does nothing if a browser is already open, unless multiple browsers are allowed.
    /// A replaced browser is left running.
    #[instrument(skip(self))]
    pub async fn open_browser(&self) -> Result<()> {
        if !self.config.allow_multiple_browsers && self.is_browser_opened().await {
            debug!("Browser already opened");
            return Ok(());
        }

        let driver = CdpDriver::connect(&self.config.cdp_endpoint).await?;
        if self.driver.write().await.replace(Arc::new(driver)).is_some() {
            info!("Replaced the session browser, the previous one stays open");
        }
        Ok(())
    }

    /// Quit and forget the current browser
    #[instrument(skip(self))]
    pub async fn close_browser(&self) -> Result<()> {
        let driver = self
            .driver
            .write()
            .await
            .take()
            .ok_or(Error::BrowserNotOpened)?;
        driver.quit().await
    }

    pub async fn is_browser_opened(&self) -> bool {
        self.driver
            .read()
            .await
            .as_ref()
            .is_some_and(|driver| driver.is_open())
    }

    /// Current driver
    pub async fn driver(&self) -> Result<Arc<dyn Driver>> {
        self.driver
            .read()
            .await
            .clone()
            .ok_or(Error::BrowserNotOpened)
    }

    /// Absolute URL for `path`; values that already carry a scheme pass through
    pub fn build_url(&self, path: &str) -> String {
        if path.contains("://") || OPAQUE_SCHEMES.iter().any(|scheme| path.starts_with(scheme)) {
            return path.to_string();
        }
        format!(
            "{}://{}:{}{}",
            self.config.protocol, self.config.host, self.config.port, path
        )
    }

    /// Load a page and check it for console errors
    ///
    /// Skips navigation when the browser already shows the URL, unless
    /// `reload_page_on_each_test` is set.
    #[instrument(skip(self, options))]
    pub async fn load_page(&self, options: PageOptions, path: &str) -> Result<()> {
        let url = self.build_url(path);
        *self.options.write().await = options.clone();
        let driver = self.driver().await?;

        if !options.reload_page_on_each_test && driver.current_url().await? == url {
            debug!("Page already loaded: {}", url);
            return Ok(());
        }

        (options.before_page_loads)();
        driver.navigate(&url).await?;
        self.wait_for_page().await?;
        (options.after_page_loads)();

        if options.hide_browser {
            self.hide_browser().await?;
        }
        match options.mode {
            WindowMode::Desktop => self.desktop_window().await?,
            WindowMode::Mobile => self.mobile_window().await?,
            WindowMode::Default => {}
        }

        self.check_errors_in_logs().await
    }

    /// Navigate without hooks or checks
    pub async fn go(&self, path: &str) -> Result<()> {
        self.driver().await?.navigate(&self.build_url(path)).await
    }

    /// Resize to 16:9 keeping the current height
    pub async fn desktop_window(&self) -> Result<()> {
        self.resize(|height| height * 16 / 9).await
    }

    /// Resize to 9:16 keeping the current height
    pub async fn mobile_window(&self) -> Result<()> {
        self.resize(|height| (height * 9 / 16).min(MOBILE_MAX_WIDTH)).await
    }

    /// Move the window off screen
    pub async fn hide_browser(&self) -> Result<()> {
        let driver = self.driver().await?;
        let rect = driver.window_rect().await?;
        driver
            .set_window_rect(WindowRect {
                x: HIDDEN_WINDOW_X,
                y: 0,
                ..rect
            })
            .await
    }

    async fn resize<F: Fn(u32) -> u32>(&self, width_for_height: F) -> Result<()> {
        let driver = self.driver().await?;
        let rect = driver.window_rect().await?;
        driver
            .set_window_rect(WindowRect {
                width: width_for_height(rect.height),
                ..rect
            })
            .await
    }

    /// Wait until the document is ready
    pub async fn wait_for_page(&self) -> Result<()> {
        PollingExecutor::new(self).await.wait_for_page().await
    }

    /// Fail if the console logged entries the current logs filter keeps
    ///
    /// Drains the captured console either way.
    pub async fn check_errors_in_logs(&self) -> Result<()> {
        let filter = self.options.read().await.logs_filter.clone();
        let errors: Vec<LogEntry> = self
            .driver()
            .await?
            .console_logs()
            .await?
            .into_iter()
            .filter(|entry| filter(entry))
            .collect();

        if errors.is_empty() {
            return Ok(());
        }
        warn!("{} console errors", errors.len());
        Err(Error::ConsoleErrors(errors))
    }

    /// Wait budget for queries
    pub async fn timeout(&self) -> Duration {
        self.options
            .read()
            .await
            .timeout
            .unwrap_or_else(|| self.config.timeout())
    }

    /// Options of the last page load
    pub async fn options(&self) -> PageOptions {
        self.options.read().await.clone()
    }

    /// Move the pointer over `element`
    pub async fn move_to_element(&self, element: &Element) -> Result<()> {
        self.driver()
            .await?
            .move_pointer_to(element.native().as_ref())
            .await
    }

    /// Drag `from` onto `to`
    pub async fn drag_and_drop(&self, from: &Element, to: &Element) -> Result<()> {
        self.driver()
            .await?
            .drag_and_drop(from.native().as_ref(), to.native().as_ref())
            .await
    }
}

impl Findable for Session {
    fn find(&self) -> Finder {
        Finder::new(self.clone(), SearchRoot::Page)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
