//! CDP (Chrome DevTools Protocol) type definitions
//!
//! This module defines the core data structures for CDP communication.

use serde::{Deserialize, Serialize};

/// CDP JSON-RPC request
#[derive(Debug, Clone, Serialize)]
pub struct CdpRequest {
    /// Request ID
    pub id: u64,
    /// Method name (e.g., "Page.navigate")
    pub method: String,
    /// Method parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    /// Session ID for multi-session targets
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// CDP JSON-RPC notification (event)
#[derive(Debug, Clone, Deserialize)]
pub struct CdpNotification {
    /// Event method (e.g., "Runtime.consoleAPICalled")
    pub method: String,
    /// Event parameters
    #[serde(default)]
    pub params: serde_json::Value,
    /// Session ID for multi-session targets
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
}

/// CDP JSON-RPC response
#[derive(Debug, Clone, Deserialize)]
pub struct CdpRpcResponse {
    /// Response ID (matches request ID)
    pub id: u64,
    /// Response result
    #[serde(default)]
    pub result: serde_json::Value,
    /// Error if any
    #[serde(default)]
    pub error: Option<CdpErrorDetail>,
}

/// CDP error detail
#[derive(Debug, Clone, Deserialize)]
pub struct CdpErrorDetail {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional error data
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Page navigation parameters
#[derive(Debug, Clone, Serialize)]
pub struct NavigateParams {
    /// URL to navigate to
    pub url: String,
    /// Referrer URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

/// JavaScript evaluation parameters
#[derive(Debug, Clone, Serialize)]
pub struct EvaluateParams {
    /// JavaScript expression to evaluate
    pub expression: String,
    /// Whether to await promise
    #[serde(skip_serializing_if = "Option::is_none", rename = "awaitPromise")]
    pub await_promise: Option<bool>,
    /// Whether to return as value
    #[serde(skip_serializing_if = "Option::is_none", rename = "returnByValue")]
    pub return_by_value: Option<bool>,
}

/// Argument passed to `Runtime.callFunctionOn`
#[derive(Debug, Clone, Serialize, Default)]
pub struct CallArgument {
    /// Primitive or JSON value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    /// Remote object reference
    #[serde(skip_serializing_if = "Option::is_none", rename = "objectId")]
    pub object_id: Option<String>,
}

impl CallArgument {
    /// Argument carrying a JSON value
    pub fn value(value: serde_json::Value) -> Self {
        Self {
            value: Some(value),
            object_id: None,
        }
    }

    /// Argument referencing a remote object
    pub fn object<S: Into<String>>(object_id: S) -> Self {
        Self {
            value: None,
            object_id: Some(object_id.into()),
        }
    }
}

/// `Runtime.callFunctionOn` parameters
#[derive(Debug, Clone, Serialize)]
pub struct CallFunctionOnParams {
    /// Function source, invoked with `this` bound to the object
    #[serde(rename = "functionDeclaration")]
    pub function_declaration: String,
    /// Object the function is called on
    #[serde(rename = "objectId")]
    pub object_id: String,
    /// Call arguments
    pub arguments: Vec<CallArgument>,
    /// Whether to return as value
    #[serde(rename = "returnByValue")]
    pub return_by_value: bool,
    /// Whether to await promise
    #[serde(rename = "awaitPromise")]
    pub await_promise: bool,
}

/// Remote object (result of JavaScript evaluation)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RemoteObject {
    /// Object type
    #[serde(default)]
    pub r#type: String,
    /// Object subtype
    #[serde(default)]
    pub subtype: Option<String>,
    /// Object value
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    /// Object description
    #[serde(default)]
    pub description: Option<String>,
    /// Remote object ID for non-primitive results
    #[serde(rename = "objectId", default)]
    pub object_id: Option<String>,
}

/// Exception details
#[derive(Debug, Clone, Deserialize)]
pub struct ExceptionDetails {
    /// Exception text
    #[serde(default)]
    pub text: Option<String>,
    /// Exception object
    #[serde(default)]
    pub exception: Option<RemoteObject>,
}

impl ExceptionDetails {
    /// Best human-readable description of the exception
    pub fn describe(&self) -> String {
        self.exception
            .as_ref()
            .and_then(|e| e.description.clone())
            .or_else(|| self.text.clone())
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

/// Response shape shared by `Runtime.evaluate` and `Runtime.callFunctionOn`
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluateResponse {
    /// Evaluation result
    #[serde(default)]
    pub result: RemoteObject,
    /// Exception details if evaluation failed
    #[serde(rename = "exceptionDetails", default)]
    pub exception_details: Option<ExceptionDetails>,
}

/// Own property of a remote object
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyDescriptor {
    /// Property name
    pub name: String,
    /// Property value
    #[serde(default)]
    pub value: Option<RemoteObject>,
}

/// `Runtime.getProperties` response
#[derive(Debug, Clone, Deserialize)]
pub struct GetPropertiesResponse {
    /// Object properties
    #[serde(default)]
    pub result: Vec<PropertyDescriptor>,
}

/// Browser window bounds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct WindowBounds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(rename = "windowState", skip_serializing_if = "Option::is_none")]
    pub window_state: Option<WindowState>,
}

/// Browser window state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WindowState {
    Normal,
    Minimized,
    Maximized,
    Fullscreen,
}

/// `Browser.getWindowForTarget` response
#[derive(Debug, Clone, Deserialize)]
pub struct WindowForTarget {
    /// Browser window ID
    #[serde(rename = "windowId")]
    pub window_id: i64,
    /// Window bounds
    pub bounds: WindowBounds,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdp_request_serialization() {
        let request = CdpRequest {
            id: 1,
            method: "Page.navigate".to_string(),
            params: Some(serde_json::json!({ "url": "https://example.com" })),
            session_id: None,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"id\":1"));
        assert!(json.contains("\"method\":\"Page.navigate\""));
    }

    #[test]
    fn test_cdp_request_without_params() {
        let request = CdpRequest {
            id: 2,
            method: "Page.enable".to_string(),
            params: None,
            session_id: None,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("\"params\""));
    }

    #[test]
    fn test_call_function_on_params_serialization() {
        let params = CallFunctionOnParams {
            function_declaration: "function(a) { return a; }".to_string(),
            object_id: "obj-1".to_string(),
            arguments: vec![
                CallArgument::value(serde_json::json!("css")),
                CallArgument::object("obj-2"),
            ],
            return_by_value: false,
            await_promise: false,
        };

        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["objectId"], "obj-1");
        assert_eq!(json["arguments"][0]["value"], "css");
        assert_eq!(json["arguments"][1]["objectId"], "obj-2");
        assert!(json["arguments"][0].get("objectId").is_none());
    }

    #[test]
    fn test_evaluate_response_with_exception() {
        let response: EvaluateResponse = serde_json::from_value(serde_json::json!({
            "result": { "type": "object", "subtype": "error" },
            "exceptionDetails": {
                "text": "Uncaught",
                "exception": { "type": "object", "description": "SyntaxError: bad selector" }
            }
        }))
        .unwrap();

        let details = response.exception_details.unwrap();
        assert_eq!(details.describe(), "SyntaxError: bad selector");
    }

    #[test]
    fn test_window_bounds_skip_empty_fields() {
        let bounds = WindowBounds {
            left: Some(-2000),
            top: Some(0),
            ..Default::default()
        };

        let json = serde_json::to_value(bounds).unwrap();
        assert_eq!(json, serde_json::json!({ "left": -2000, "top": 0 }));
    }
}
