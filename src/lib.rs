//! Oxide-Finder: polling element queries for browser tests
//!
//! This library waits for elements over the Chrome DevTools Protocol: a query names a selector,
//! a visibility filter and the number of elements it expects, then waits until the page is
//! ready and the expectation holds.

pub mod error;
pub mod config;

pub mod cdp;
pub mod session;
pub mod query;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use query::{Element, Findable, Finder, Range, SelectionReport, Selector, Visibility};
pub use session::Session;

/// Oxide-Finder library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
