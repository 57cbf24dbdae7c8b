//! CDP browser control implementation
//!
//! Browser-level operations go through the DevTools HTTP endpoints (`/json/*`); page-level
//! traffic goes through per-target WebSocket connections.

use super::client::CdpClientImpl;
use super::connection::CdpWebSocketConnection;
use super::traits::*;
use crate::Error;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// `/json/version` payload
#[derive(Debug, Deserialize)]
struct VersionInfo {
    #[serde(rename = "Protocol-Version", default)]
    protocol_version: Option<String>,
    #[serde(rename = "Browser", default)]
    browser: Option<String>,
    #[serde(rename = "User-Agent", default)]
    user_agent: Option<String>,
    #[serde(rename = "V8-Version", default)]
    v8_version: Option<String>,
}

/// `/json/list` and `/json/new` entry
#[derive(Debug, Deserialize)]
struct TargetEntry {
    id: String,
    #[serde(rename = "type")]
    target_type: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    attached: bool,
    #[serde(rename = "webSocketDebuggerUrl", default)]
    web_socket_debugger_url: Option<String>,
}

/// CDP browser implementation
#[derive(Debug)]
pub struct CdpBrowserImpl {
    /// Browser endpoint (e.g., "ws://localhost:9222")
    endpoint: String,
    http: reqwest::Client,
    /// Active connections (target_id -> connection)
    connections: Mutex<HashMap<String, Arc<dyn CdpConnection>>>,
}

impl CdpBrowserImpl {
    /// Create a new CDP browser controller
    ///
    /// # Arguments
    /// * `endpoint` - Browser endpoint (e.g., "ws://localhost:9222")
    pub fn new<S: Into<String>>(endpoint: S) -> Self {
        let endpoint = endpoint.into();
        debug!("Creating CDP browser controller for endpoint: {}", endpoint);
        Self {
            endpoint,
            http: reqwest::Client::new(),
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// HTTP base URL of the DevTools endpoint
    pub fn http_endpoint(&self) -> String {
        let base = self
            .endpoint
            .replacen("ws://", "http://", 1)
            .replacen("wss://", "https://", 1);
        base.trim_end_matches('/').to_string()
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = format!("{}{}", self.http_endpoint(), path);
        debug!("GET {}", url);

        self.http
            .get(&url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| Error::http(format!("{}: {}", url, e)))?
            .json()
            .await
            .map_err(|e| Error::http(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl CdpBrowser for CdpBrowserImpl {
    /// Connect to a target and enable the domains the driver relies on
    async fn create_client(&self, target_url: &str) -> Result<Arc<dyn CdpClient>, Error> {
        info!("Creating CDP client for target: {}", target_url);

        let connection = CdpWebSocketConnection::new(target_url).await?;

        let target_id = target_url.rsplit('/').next().unwrap_or(target_url).to_string();
        self.connections
            .lock()
            .await
            .insert(target_id, Arc::clone(&connection) as Arc<dyn CdpConnection>);

        let client = Arc::new(CdpClientImpl::new(connection));
        client.enable_domain("Page").await?;
        client.enable_domain("Runtime").await?;
        client.enable_domain("Log").await?;

        Ok(client)
    }

    async fn close(&self) -> Result<(), Error> {
        let mut connections = self.connections.lock().await;
        info!("Closing {} CDP connections to {}", connections.len(), self.endpoint);

        for (target_id, connection) in connections.drain() {
            if let Err(e) = connection.close().await {
                warn!("Failed to close connection to {}: {}", target_id, e);
            }
        }

        Ok(())
    }

    async fn get_version(&self) -> Result<BrowserVersion, Error> {
        let version: VersionInfo = self.get_json("/json/version").await?;
        let unknown = || "unknown".to_string();

        Ok(BrowserVersion {
            protocol_version: version.protocol_version.unwrap_or_else(unknown),
            product: version.browser.unwrap_or_else(unknown),
            user_agent: version.user_agent.unwrap_or_else(unknown),
            js_version: version.v8_version.unwrap_or_else(unknown),
        })
    }

    async fn get_targets(&self) -> Result<Vec<TargetInfo>, Error> {
        let entries: Vec<TargetEntry> = self.get_json("/json/list").await?;

        Ok(entries
            .into_iter()
            .map(|entry| TargetInfo {
                target_id: entry.id,
                target_type: entry.target_type,
                title: entry.title,
                url: entry.url,
                attached: entry.attached,
            })
            .collect())
    }

    /// Open a new tab through `/json/new`
    async fn create_target(&self, url: &str) -> Result<String, Error> {
        let new_url = format!("{}/json/new?{}", self.http_endpoint(), url);
        info!("Creating new target: {}", new_url);

        let entry: TargetEntry = self
            .http
            .put(&new_url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                Error::http(format!(
                    "Failed to reach the DevTools endpoint at {}; start Chrome with \
                     --remote-debugging-port=9222 ({})",
                    self.endpoint, e
                ))
            })?
            .json()
            .await
            .map_err(|e| Error::http(format!("Invalid /json/new response: {}", e)))?;

        entry
            .web_socket_debugger_url
            .ok_or_else(|| Error::http(format!("Target {} has no webSocketDebuggerUrl", entry.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_endpoint_conversion() {
        assert_eq!(
            CdpBrowserImpl::new("ws://localhost:9222").http_endpoint(),
            "http://localhost:9222"
        );
        assert_eq!(
            CdpBrowserImpl::new("wss://remote.example.com:9222/").http_endpoint(),
            "https://remote.example.com:9222"
        );
    }

    #[test]
    fn test_target_entry_parsing() {
        let entry: TargetEntry = serde_json::from_value(serde_json::json!({
            "id": "ABC",
            "type": "page",
            "title": "about:blank",
            "url": "about:blank",
            "webSocketDebuggerUrl": "ws://localhost:9222/devtools/page/ABC"
        }))
        .unwrap();

        assert_eq!(entry.id, "ABC");
        assert!(!entry.attached);
        assert_eq!(
            entry.web_socket_debugger_url.as_deref(),
            Some("ws://localhost:9222/devtools/page/ABC")
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_http_error() {
        let browser = CdpBrowserImpl::new("ws://127.0.0.1:1");

        let err = browser.create_target("about:blank").await.unwrap_err();

        assert!(matches!(err, Error::Http(msg) if msg.contains("remote-debugging-port")));
    }
}
