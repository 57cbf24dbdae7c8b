//! CDP client implementation
//!
//! This module provides a high-level CDP client with typed methods for common operations.

use super::traits::*;
use super::types::*;
use crate::Error;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// CDP client implementation
#[derive(Debug, Clone)]
pub struct CdpClientImpl {
    /// Underlying CDP connection
    connection: Arc<dyn CdpConnection>,
}

impl CdpClientImpl {
    /// Create a new CDP client
    ///
    /// # Arguments
    /// * `connection` - CDP connection instance
    pub fn new(connection: Arc<dyn CdpConnection>) -> Self {
        Self { connection }
    }

    /// Parse a `Runtime.evaluate` style response, turning exceptions into errors
    fn parse_evaluate_response(result: serde_json::Value) -> Result<RemoteObject, Error> {
        let response: EvaluateResponse = serde_json::from_value(result)?;
        match response.exception_details {
            Some(details) => Err(Error::script_execution_failed(details.describe())),
            None => Ok(response.result),
        }
    }

    /// Convert a remote object to an evaluation result
    fn parse_remote_object(obj: &RemoteObject) -> EvaluationResult {
        match obj.r#type.as_str() {
            "undefined" => EvaluationResult::Null,
            "object" | "function" if obj.value.is_none() => EvaluationResult::Null,
            _ => EvaluationResult::from_value(obj.value.clone()),
        }
    }
}

#[async_trait]
impl CdpClient for CdpClientImpl {
    fn connection(&self) -> Arc<dyn CdpConnection> {
        Arc::clone(&self.connection)
    }

    /// Navigate to a URL
    ///
    /// Returns once the browser has committed the navigation; readiness is the caller's concern.
    async fn navigate(&self, url: &str) -> Result<NavigationResult, Error> {
        info!("Navigating to {}", url);

        let params = NavigateParams {
            url: url.to_string(),
            referrer: None,
        };
        let result = self
            .call_method("Page.navigate", serde_json::to_value(params)?)
            .await?;

        if let Some(error_text) = result.get("errorText").and_then(|v| v.as_str()) {
            return Err(Error::navigation_failed(format!("{}: {}", url, error_text)));
        }

        Ok(NavigationResult {
            frame_id: result
                .get("frameId")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            loader_id: result
                .get("loaderId")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            url: url.to_string(),
        })
    }

    async fn evaluate(&self, script: &str, await_promise: bool) -> Result<EvaluationResult, Error> {
        debug!("Evaluating script: {}", script);

        let params = EvaluateParams {
            expression: script.to_string(),
            await_promise: Some(await_promise),
            return_by_value: Some(true),
        };
        let result = self
            .call_method("Runtime.evaluate", serde_json::to_value(params)?)
            .await?;

        Ok(Self::parse_remote_object(&Self::parse_evaluate_response(result)?))
    }

    async fn evaluate_handle(&self, script: &str) -> Result<RemoteObject, Error> {
        let params = EvaluateParams {
            expression: script.to_string(),
            await_promise: None,
            return_by_value: Some(false),
        };
        let result = self
            .call_method("Runtime.evaluate", serde_json::to_value(params)?)
            .await?;

        Self::parse_evaluate_response(result)
    }

    async fn call_function_on(
        &self,
        object_id: &str,
        function_declaration: &str,
        arguments: Vec<CallArgument>,
        return_by_value: bool,
    ) -> Result<RemoteObject, Error> {
        let params = CallFunctionOnParams {
            function_declaration: function_declaration.to_string(),
            object_id: object_id.to_string(),
            arguments,
            return_by_value,
            await_promise: false,
        };
        let result = self
            .call_method("Runtime.callFunctionOn", serde_json::to_value(params)?)
            .await?;

        Self::parse_evaluate_response(result)
    }

    async fn get_properties(&self, object_id: &str) -> Result<Vec<PropertyDescriptor>, Error> {
        let result = self
            .call_method(
                "Runtime.getProperties",
                serde_json::json!({ "objectId": object_id, "ownProperties": true }),
            )
            .await?;

        let response: GetPropertiesResponse = serde_json::from_value(result)?;
        Ok(response.result)
    }

    async fn release_object(&self, object_id: &str) -> Result<(), Error> {
        self.call_method(
            "Runtime.releaseObject",
            serde_json::json!({ "objectId": object_id }),
        )
        .await?;
        Ok(())
    }

    async fn enable_domain(&self, domain: &str) -> Result<(), Error> {
        info!("Enabling domain: {}", domain);

        self.call_method(&format!("{}.enable", domain), serde_json::json!({}))
            .await?;
        Ok(())
    }

    async fn call_method(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, Error> {
        debug!("Calling CDP method: {}", method);

        let response = self.connection.send_command(method, params).await?;

        response.result.ok_or_else(|| Error::cdp("No result in response"))
    }

    /// Subscribe to events of one type, or every event with `"*"`
    async fn subscribe_events(&self, event_type: &str) -> Result<tokio::sync::mpsc::Receiver<CdpEvent>, Error> {
        info!("Subscribing to events: {}", event_type);

        let mut event_receiver = self.connection.listen_events().await?;
        let (tx, rx) = tokio::sync::mpsc::channel(100);
        let filter_event_type = event_type.to_string();

        tokio::spawn(async move {
            while let Some(event) = event_receiver.recv().await {
                if (event.method == filter_event_type || filter_event_type == "*")
                    && tx.send(event).await.is_err()
                {
                    break;
                }
            }
        });

        Ok(rx)
    }
}
