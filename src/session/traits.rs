//! Driver and element traits
//!
//! This module defines the abstract interfaces a browser driver exposes to the query layer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

use crate::query::Selector;

/// Element bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Center point of the box
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Browser window position and size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Browser console entry severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Severe,
    Warning,
    Info,
    Debug,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Severe => "SEVERE",
            LogLevel::Warning => "WARNING",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        };
        f.write_str(name)
    }
}

/// Browser console entry
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    /// Create an entry stamped with the current time
    pub fn new<S: Into<String>>(level: LogLevel, message: S) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}",
            self.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.level,
            self.message
        )
    }
}

/// Something elements can be searched under
#[async_trait]
pub trait SearchContext: Send + Sync {
    /// Point-in-time lookup of every element matching `selector`
    async fn find_elements(&self, selector: &Selector) -> Result<Vec<Arc<dyn NativeElement>>, crate::Error>;
}

/// Native element reference
///
/// Represents a DOM element held by the driver. References may go stale once the document
/// re-renders.
#[async_trait]
pub trait NativeElement: SearchContext + fmt::Debug {
    /// Get element ID
    fn id(&self) -> &str;

    /// Get element text as rendered
    async fn text(&self) -> Result<String, crate::Error>;

    /// Get lower-case tag name
    async fn tag_name(&self) -> Result<String, crate::Error>;

    /// Get element attribute
    async fn attribute(&self, name: &str) -> Result<Option<String>, crate::Error>;

    /// Get element DOM property as a string
    async fn property(&self, name: &str) -> Result<Option<String>, crate::Error>;

    /// Click element
    async fn click(&self) -> Result<(), crate::Error>;

    /// Type text into element
    async fn send_keys(&self, text: &str) -> Result<(), crate::Error>;

    /// Clear an editable element
    async fn clear(&self) -> Result<(), crate::Error>;

    /// Check if element is rendered and occupies layout
    async fn is_displayed(&self) -> Result<bool, crate::Error>;

    /// Check if element is enabled
    async fn is_enabled(&self) -> Result<bool, crate::Error>;

    /// Check if element is selected or checked
    async fn is_selected(&self) -> Result<bool, crate::Error>;

    /// Get element bounding box
    async fn bounding_box(&self) -> Result<BoundingBox, crate::Error>;

    /// Scroll element into view
    async fn scroll_into_view(&self) -> Result<(), crate::Error>;
}

/// Browser driver trait
///
/// One driver controls one browser tab. Its [`SearchContext`] root is the document.
#[async_trait]
pub trait Driver: SearchContext + fmt::Debug {
    /// Current `document.readyState`
    async fn ready_state(&self) -> Result<String, crate::Error>;

    /// Navigate to URL
    async fn navigate(&self, url: &str) -> Result<(), crate::Error>;

    /// Current document URL
    async fn current_url(&self) -> Result<String, crate::Error>;

    /// Move the pointer over an element
    async fn move_pointer_to(&self, element: &dyn NativeElement) -> Result<(), crate::Error>;

    /// Press on `from`, move to `to`, release
    async fn drag_and_drop(
        &self,
        from: &dyn NativeElement,
        to: &dyn NativeElement,
    ) -> Result<(), crate::Error>;

    /// Drain console entries captured since the last call
    async fn console_logs(&self) -> Result<Vec<LogEntry>, crate::Error>;

    /// Get window position and size
    async fn window_rect(&self) -> Result<WindowRect, crate::Error>;

    /// Set window position and size
    async fn set_window_rect(&self, rect: WindowRect) -> Result<(), crate::Error>;

    /// Close the tab and release the connection
    async fn quit(&self) -> Result<(), crate::Error>;

    /// Check if the driver is still usable
    fn is_open(&self) -> bool;
}
