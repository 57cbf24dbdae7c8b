//! CDP (Chrome DevTools Protocol) layer traits
//!
//! This module defines the abstract interfaces for CDP communication.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::types::{CallArgument, PropertyDescriptor, RemoteObject};

/// CDP event representation
#[derive(Debug, Clone)]
pub struct CdpEvent {
    /// Event method (e.g., "Runtime.consoleAPICalled")
    pub method: String,
    /// Event parameters
    pub params: Value,
    /// Session ID (for multi-session targets)
    pub session_id: Option<String>,
}

/// CDP response representation
#[derive(Debug, Clone)]
pub struct CdpResponse {
    /// Response ID (matches request ID)
    pub id: u64,
    /// Response result
    pub result: Option<Value>,
    /// Error if any
    pub error: Option<CdpError>,
}

/// CDP error representation
#[derive(Debug, Clone)]
pub struct CdpError {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional error data
    pub data: Option<Value>,
}

/// CDP connection trait
///
/// Represents a WebSocket connection to a Chrome DevTools Protocol target.
#[async_trait]
pub trait CdpConnection: Send + Sync + std::fmt::Debug {
    /// Send a CDP command and wait for response
    async fn send_command(&self, method: &str, params: Value) -> Result<CdpResponse, crate::Error>;

    /// Subscribe to CDP events
    async fn listen_events(&self) -> Result<tokio::sync::mpsc::Receiver<CdpEvent>, crate::Error>;

    /// Close the connection
    async fn close(&self) -> Result<(), crate::Error>;

    /// Check if connection is active
    fn is_active(&self) -> bool;
}

/// CDP client trait
///
/// High-level CDP client that provides typed methods for the operations the driver needs.
#[async_trait]
pub trait CdpClient: Send + Sync + std::fmt::Debug {
    /// Get the underlying connection
    fn connection(&self) -> Arc<dyn CdpConnection>;

    /// Navigate to a URL
    async fn navigate(&self, url: &str) -> Result<NavigationResult, crate::Error>;

    /// Evaluate JavaScript in the page, returning the value
    async fn evaluate(&self, script: &str, await_promise: bool) -> Result<EvaluationResult, crate::Error>;

    /// Evaluate JavaScript in the page, returning a remote object handle
    async fn evaluate_handle(&self, script: &str) -> Result<RemoteObject, crate::Error>;

    /// Call a function with `this` bound to a remote object
    async fn call_function_on(
        &self,
        object_id: &str,
        function_declaration: &str,
        arguments: Vec<CallArgument>,
        return_by_value: bool,
    ) -> Result<RemoteObject, crate::Error>;

    /// Own properties of a remote object
    async fn get_properties(&self, object_id: &str) -> Result<Vec<PropertyDescriptor>, crate::Error>;

    /// Release a remote object handle
    async fn release_object(&self, object_id: &str) -> Result<(), crate::Error>;

    /// Enable a domain
    async fn enable_domain(&self, domain: &str) -> Result<(), crate::Error>;

    /// Call a raw CDP method (returns JSON Value)
    async fn call_method(&self, method: &str, params: Value) -> Result<Value, crate::Error>;

    /// Subscribe to events (returns a receiver)
    async fn subscribe_events(&self, event_type: &str) -> Result<tokio::sync::mpsc::Receiver<CdpEvent>, crate::Error>;
}

/// Navigation result
#[derive(Debug, Clone)]
pub struct NavigationResult {
    /// Frame ID
    pub frame_id: Option<String>,
    /// Loader ID, absent for same-document navigations
    pub loader_id: Option<String>,
    /// Requested URL
    pub url: String,
}

/// JavaScript evaluation result
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationResult {
    /// String value
    String(String),
    /// Number value
    Number(f64),
    /// Boolean value
    Bool(bool),
    /// Null value
    Null,
    /// Object/Array (as JSON)
    Object(Value),
}

impl EvaluationResult {
    /// Convert a JSON value
    pub fn from_value(value: Option<Value>) -> Self {
        match value {
            Some(Value::String(s)) => EvaluationResult::String(s),
            Some(Value::Number(n)) => EvaluationResult::Number(n.as_f64().unwrap_or(0.0)),
            Some(Value::Bool(b)) => EvaluationResult::Bool(b),
            Some(Value::Null) | None => EvaluationResult::Null,
            Some(other) => EvaluationResult::Object(other),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            EvaluationResult::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            EvaluationResult::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// CDP browser trait
///
/// Controls browser-level operations via CDP.
#[async_trait]
pub trait CdpBrowser: Send + Sync + std::fmt::Debug {
    /// Create a new CDP client for a target WebSocket URL
    async fn create_client(&self, target_url: &str) -> Result<Arc<dyn CdpClient>, crate::Error>;

    /// Close the browser
    async fn close(&self) -> Result<(), crate::Error>;

    /// Get browser version
    async fn get_version(&self) -> Result<BrowserVersion, crate::Error>;

    /// List all targets (pages, workers, etc.)
    async fn get_targets(&self) -> Result<Vec<TargetInfo>, crate::Error>;

    /// Create a new browser target (page)
    ///
    /// Returns the WebSocket URL of the newly created target.
    async fn create_target(&self, url: &str) -> Result<String, crate::Error>;
}

/// Browser version information
#[derive(Debug, Clone)]
pub struct BrowserVersion {
    /// Protocol version
    pub protocol_version: String,
    /// Product name
    pub product: String,
    /// User agent
    pub user_agent: String,
    /// JavaScript engine version
    pub js_version: String,
}

/// Target information (page, worker, etc.)
#[derive(Debug, Clone)]
pub struct TargetInfo {
    /// Target ID
    pub target_id: String,
    /// Target type
    pub target_type: String,
    /// Target title
    pub title: String,
    /// Target URL
    pub url: String,
    /// Whether target can be attached to
    pub attached: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluation_result_from_value() {
        assert_eq!(
            EvaluationResult::from_value(Some(serde_json::json!("complete"))).as_str(),
            Some("complete")
        );
        assert_eq!(
            EvaluationResult::from_value(Some(serde_json::json!(true))).as_bool(),
            Some(true)
        );
        assert_eq!(EvaluationResult::from_value(None), EvaluationResult::Null);
        assert!(matches!(
            EvaluationResult::from_value(Some(serde_json::json!([1, 2]))),
            EvaluationResult::Object(_)
        ));
    }
}
