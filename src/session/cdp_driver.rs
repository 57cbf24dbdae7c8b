//! Driver over the Chrome DevTools Protocol
//!
//! One [`CdpDriver`] owns one page target. Console output is captured in the background from
//! `Runtime` and `Log` events and drained by [`Driver::console_logs`].

use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::element::find_under;
use super::traits::{Driver, LogEntry, LogLevel, NativeElement, SearchContext, WindowRect};
use crate::cdp::traits::{CdpBrowser, CdpClient, CdpEvent};
use crate::cdp::types::{WindowBounds, WindowForTarget, WindowState};
use crate::cdp::CdpBrowserImpl;
use crate::query::Selector;
use crate::Error;

/// Page a fresh target starts on
const BLANK_PAGE: &str = "about:blank";

/// Browser driver backed by a CDP page target
pub struct CdpDriver {
    client: Arc<dyn CdpClient>,
    browser: Option<Arc<dyn CdpBrowser>>,
    logs: Arc<Mutex<Vec<LogEntry>>>,
    capture: Mutex<Option<JoinHandle<()>>>,
    open: AtomicBool,
}

impl CdpDriver {
    /// Open a new tab on the browser listening at `endpoint`
    pub async fn connect(endpoint: &str) -> Result<Self, Error> {
        Self::launch(Arc::new(CdpBrowserImpl::new(endpoint))).await
    }

    /// Open a new tab on `browser`
    #[instrument(skip(browser))]
    pub async fn launch(browser: Arc<dyn CdpBrowser>) -> Result<Self, Error> {
        let ws_url = browser.create_target(BLANK_PAGE).await?;
        let client = browser.create_client(&ws_url).await?;
        info!("Driver attached to {}", ws_url);

        let mut driver = Self::attach(client).await?;
        driver.browser = Some(browser);
        Ok(driver)
    }

    /// Drive the page `client` is connected to
    pub async fn attach(client: Arc<dyn CdpClient>) -> Result<Self, Error> {
        let logs = Arc::new(Mutex::new(Vec::new()));
        let mut events = client.subscribe_events("*").await?;

        let sink = Arc::clone(&logs);
        let capture = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if let Some(entry) = log_entry_from_event(&event) {
                    debug!("Console {}: {}", entry.level, entry.message);
                    sink.lock().await.push(entry);
                }
            }
        });

        Ok(Self {
            client,
            browser: None,
            logs,
            capture: Mutex::new(Some(capture)),
            open: AtomicBool::new(true),
        })
    }

    /// Underlying CDP client
    pub fn client(&self) -> &Arc<dyn CdpClient> {
        &self.client
    }

    async fn document_id(&self) -> Result<String, Error> {
        self.client
            .evaluate_handle("document")
            .await?
            .object_id
            .ok_or_else(|| Error::cdp("document has no remote object id"))
    }

    async fn window(&self) -> Result<WindowForTarget, Error> {
        let result = self
            .client
            .call_method("Browser.getWindowForTarget", json!({}))
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    async fn pointer_event(&self, event_type: &str, x: f64, y: f64, buttons: u8) -> Result<(), Error> {
        let mut params = json!({
            "type": event_type,
            "x": x,
            "y": y,
            "buttons": buttons,
        });
        if event_type != "mouseMoved" {
            params["button"] = json!("left");
            params["clickCount"] = json!(1);
        }

        self.client
            .call_method("Input.dispatchMouseEvent", params)
            .await?;
        Ok(())
    }

    async fn center_of(element: &dyn NativeElement) -> Result<(f64, f64), Error> {
        element.scroll_into_view().await?;
        Ok(element.bounding_box().await?.center())
    }
}

impl fmt::Debug for CdpDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CdpDriver")
            .field("client", &self.client)
            .field("open", &self.open.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SearchContext for CdpDriver {
    async fn find_elements(&self, selector: &Selector) -> Result<Vec<Arc<dyn NativeElement>>, Error> {
        let document = self.document_id().await?;
        let found = find_under(&self.client, &document, selector, "document").await;
        if let Err(e) = self.client.release_object(&document).await {
            debug!("Failed to release document handle: {}", e);
        }
        found
    }
}

#[async_trait]
impl Driver for CdpDriver {
    async fn ready_state(&self) -> Result<String, Error> {
        self.client
            .evaluate("document.readyState", false)
            .await?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::cdp("document.readyState is not a string"))
    }

    #[instrument(skip(self))]
    async fn navigate(&self, url: &str) -> Result<(), Error> {
        self.client.navigate(url).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, Error> {
        self.client
            .evaluate("window.location.href", false)
            .await?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::cdp("window.location.href is not a string"))
    }

    async fn move_pointer_to(&self, element: &dyn NativeElement) -> Result<(), Error> {
        let (x, y) = Self::center_of(element).await?;
        self.pointer_event("mouseMoved", x, y, 0).await
    }

    async fn drag_and_drop(
        &self,
        from: &dyn NativeElement,
        to: &dyn NativeElement,
    ) -> Result<(), Error> {
        let (from_x, from_y) = Self::center_of(from).await?;
        self.pointer_event("mouseMoved", from_x, from_y, 0).await?;
        self.pointer_event("mousePressed", from_x, from_y, 1).await?;

        let (to_x, to_y) = Self::center_of(to).await?;
        self.pointer_event("mouseMoved", to_x, to_y, 1).await?;
        self.pointer_event("mouseReleased", to_x, to_y, 0).await
    }

    async fn console_logs(&self) -> Result<Vec<LogEntry>, Error> {
        Ok(std::mem::take(&mut *self.logs.lock().await))
    }

    async fn window_rect(&self) -> Result<WindowRect, Error> {
        let bounds = self.window().await?.bounds;
        Ok(WindowRect {
            x: bounds.left.unwrap_or(0),
            y: bounds.top.unwrap_or(0),
            width: bounds.width.unwrap_or(0),
            height: bounds.height.unwrap_or(0),
        })
    }

    #[instrument(skip(self))]
    async fn set_window_rect(&self, rect: WindowRect) -> Result<(), Error> {
        let window = self.window().await?;

        // Bounds cannot change while minimized, maximized or fullscreen
        if window.bounds.window_state.is_some_and(|state| state != WindowState::Normal) {
            let normal = WindowBounds {
                window_state: Some(WindowState::Normal),
                ..Default::default()
            };
            self.client
                .call_method(
                    "Browser.setWindowBounds",
                    json!({ "windowId": window.window_id, "bounds": normal }),
                )
                .await?;
        }

        let bounds = WindowBounds {
            left: Some(rect.x),
            top: Some(rect.y),
            width: Some(rect.width),
            height: Some(rect.height),
            window_state: None,
        };
        self.client
            .call_method(
                "Browser.setWindowBounds",
                json!({ "windowId": window.window_id, "bounds": bounds }),
            )
            .await?;
        Ok(())
    }

    async fn quit(&self) -> Result<(), Error> {
        if !self.open.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        info!("Closing browser tab");

        if let Some(capture) = self.capture.lock().await.take() {
            capture.abort();
        }
        if let Err(e) = self.client.call_method("Page.close", json!({})).await {
            warn!("Page.close failed: {}", e);
        }
        self.client.connection().close().await?;
        if let Some(browser) = &self.browser {
            browser.close().await?;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst) && self.client.connection().is_active()
    }
}

/// Console entry carried by a CDP event, if any
pub(crate) fn log_entry_from_event(event: &CdpEvent) -> Option<LogEntry> {
    let params = &event.params;
    match event.method.as_str() {
        "Runtime.consoleAPICalled" => {
            let level = match params.get("type").and_then(Value::as_str)? {
                "error" | "assert" => LogLevel::Severe,
                "warning" => LogLevel::Warning,
                "debug" | "trace" => LogLevel::Debug,
                _ => LogLevel::Info,
            };
            let message = params
                .get("args")
                .and_then(Value::as_array)
                .map(|args| args.iter().map(describe_arg).collect::<Vec<_>>().join(" "))
                .unwrap_or_default();
            Some(LogEntry::new(level, message))
        }
        "Runtime.exceptionThrown" => {
            let details = params.get("exceptionDetails")?;
            let message = details
                .get("exception")
                .and_then(|e| e.get("description"))
                .or_else(|| details.get("text"))
                .and_then(Value::as_str)
                .unwrap_or("Uncaught exception");
            Some(LogEntry::new(LogLevel::Severe, message))
        }
        "Log.entryAdded" => {
            let entry = params.get("entry")?;
            let level = match entry.get("level").and_then(Value::as_str)? {
                "error" => LogLevel::Severe,
                "warning" => LogLevel::Warning,
                "verbose" => LogLevel::Debug,
                _ => LogLevel::Info,
            };
            let text = entry.get("text").and_then(Value::as_str).unwrap_or_default();
            Some(LogEntry::new(level, text))
        }
        _ => None,
    }
}

fn describe_arg(arg: &Value) -> String {
    match arg.get("value") {
        Some(Value::String(s)) => s.clone(),
        Some(value) => value.to_string(),
        None => arg
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_else(|| arg.get("type").and_then(Value::as_str).unwrap_or("undefined"))
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdp::mock::{MockCdpBrowser, MockCdpConnection};
    use std::time::Duration;

    fn event(method: &str, params: Value) -> CdpEvent {
        CdpEvent {
            method: method.to_string(),
            params,
            session_id: None,
        }
    }

    async fn launch() -> (CdpDriver, Arc<MockCdpConnection>) {
        let browser = Arc::new(MockCdpBrowser::new());
        let connection = browser.connection().clone();
        (CdpDriver::launch(browser).await.unwrap(), connection)
    }

    #[test]
    fn test_console_api_entry() {
        let entry = log_entry_from_event(&event(
            "Runtime.consoleAPICalled",
            json!({ "type": "error", "args": [
                { "type": "string", "value": "failed:" },
                { "type": "number", "value": 42 },
                { "type": "object", "description": "Object" }
            ]}),
        ))
        .unwrap();

        assert_eq!(entry.level, LogLevel::Severe);
        assert_eq!(entry.message, "failed: 42 Object");
    }

    #[test]
    fn test_exception_and_log_entries() {
        let exception = log_entry_from_event(&event(
            "Runtime.exceptionThrown",
            json!({ "exceptionDetails": { "text": "Uncaught", "exception": { "description": "TypeError: x is undefined" } } }),
        ))
        .unwrap();
        assert_eq!(exception.level, LogLevel::Severe);
        assert_eq!(exception.message, "TypeError: x is undefined");

        let warning = log_entry_from_event(&event(
            "Log.entryAdded",
            json!({ "entry": { "level": "warning", "text": "deprecated API" } }),
        ))
        .unwrap();
        assert_eq!(warning.level, LogLevel::Warning);

        assert!(log_entry_from_event(&event("Page.loadEventFired", json!({}))).is_none());
    }

    #[tokio::test]
    async fn test_ready_state_and_url() {
        let (driver, connection) = launch().await;
        connection
            .respond_once(
                "Runtime.evaluate",
                json!({ "result": { "type": "string", "value": "interactive" } }),
            )
            .await;
        connection
            .respond_once(
                "Runtime.evaluate",
                json!({ "result": { "type": "string", "value": "http://localhost:8080/login" } }),
            )
            .await;

        assert_eq!(driver.ready_state().await.unwrap(), "interactive");
        assert_eq!(driver.current_url().await.unwrap(), "http://localhost:8080/login");
    }

    #[tokio::test]
    async fn test_console_capture_drains() {
        let (driver, connection) = launch().await;

        connection
            .emit(
                "Log.entryAdded",
                json!({ "entry": { "level": "error", "text": "404 /favicon.ico" } }),
            )
            .await;

        let mut logs = Vec::new();
        for _ in 0..50 {
            logs = driver.console_logs().await.unwrap();
            if !logs.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].message, "404 /favicon.ico");
        assert!(driver.console_logs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_window_rect_restores_normal_state() {
        let (driver, connection) = launch().await;
        connection
            .respond(
                "Browser.getWindowForTarget",
                json!({ "windowId": 7, "bounds": { "left": 0, "top": 0, "width": 1200, "height": 900, "windowState": "maximized" } }),
            )
            .await;

        driver
            .set_window_rect(WindowRect { x: -2000, y: 0, width: 1600, height: 900 })
            .await
            .unwrap();

        let calls = connection.calls_to("Browser.setWindowBounds").await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0]["bounds"], json!({ "windowState": "normal" }));
        assert_eq!(
            calls[1]["bounds"],
            json!({ "left": -2000, "top": 0, "width": 1600, "height": 900 })
        );
        assert_eq!(calls[1]["windowId"], 7);
    }

    #[tokio::test]
    async fn test_window_rect() {
        let (driver, connection) = launch().await;
        connection
            .respond(
                "Browser.getWindowForTarget",
                json!({ "windowId": 1, "bounds": { "left": 10, "top": 20, "width": 800, "height": 600, "windowState": "normal" } }),
            )
            .await;

        assert_eq!(
            driver.window_rect().await.unwrap(),
            WindowRect { x: 10, y: 20, width: 800, height: 600 }
        );
    }

    #[tokio::test]
    async fn test_quit_closes_once() {
        let (driver, connection) = launch().await;
        assert!(driver.is_open());

        driver.quit().await.unwrap();
        driver.quit().await.unwrap();

        assert!(!driver.is_open());
        assert_eq!(connection.calls_to("Page.close").await.len(), 1);
    }
}
