//! Page-load options applied by [`Session::load_page`](super::Session::load_page)

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::traits::{LogEntry, LogLevel};

/// Hook run around page loads
pub type PageHook = Arc<dyn Fn() + Send + Sync>;

/// Predicate keeping the console entries that count as errors
pub type LogsFilter = Arc<dyn Fn(&LogEntry) -> bool + Send + Sync>;

/// Window geometry applied after a page load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowMode {
    /// Leave the window as it is
    #[default]
    Default,
    /// 16:9 window keeping the current height
    Desktop,
    /// 9:16 window keeping the current height, at most 500px wide
    Mobile,
}

/// Options for loading a page
#[derive(Clone)]
pub struct PageOptions {
    /// Navigate even if the browser already shows the URL
    pub reload_page_on_each_test: bool,
    /// Move the window off screen after loading
    pub hide_browser: bool,
    /// Window geometry
    pub mode: WindowMode,
    /// Overrides the configured wait budget for queries
    pub timeout: Option<Duration>,
    /// Runs before navigation
    pub before_page_loads: PageHook,
    /// Runs once the document is ready
    pub after_page_loads: PageHook,
    /// Console entries kept by this filter fail the page load
    pub logs_filter: LogsFilter,
}

impl PageOptions {
    /// Set the wait budget override
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the window mode
    pub fn with_mode(mut self, mode: WindowMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the hook run before navigation
    pub fn before_page_loads<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.before_page_loads = Arc::new(hook);
        self
    }

    /// Set the hook run after the document is ready
    pub fn after_page_loads<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.after_page_loads = Arc::new(hook);
        self
    }

    /// Set the console entry filter
    pub fn logs_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&LogEntry) -> bool + Send + Sync + 'static,
    {
        self.logs_filter = Arc::new(filter);
        self
    }
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            reload_page_on_each_test: false,
            hide_browser: false,
            mode: WindowMode::Default,
            timeout: None,
            before_page_loads: Arc::new(|| {}),
            after_page_loads: Arc::new(|| {}),
            logs_filter: Arc::new(|entry: &LogEntry| entry.level == LogLevel::Severe),
        }
    }
}

impl fmt::Debug for PageOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageOptions")
            .field("reload_page_on_each_test", &self.reload_page_on_each_test)
            .field("hide_browser", &self.hide_browser)
            .field("mode", &self.mode)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
