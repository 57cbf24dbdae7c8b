//! Mock CDP implementation for testing
//!
//! [`MockCdpConnection`] answers commands from scripted responses and records every call, so
//! the real [`CdpClientImpl`](super::CdpClientImpl) and the CDP driver can be exercised without
//! a browser.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use crate::cdp::client::CdpClientImpl;
use crate::cdp::traits::*;
use crate::Error;

/// Scripted reply to a command
#[derive(Debug, Clone)]
enum Reply {
    Result(Value),
    Error(String),
}

#[derive(Debug, Default)]
struct Script {
    /// Consumed in order before falling back to `persistent`
    queued: HashMap<String, VecDeque<Reply>>,
    persistent: HashMap<String, Reply>,
}

/// Mock CDP connection
#[derive(Debug)]
pub struct MockCdpConnection {
    is_active: Arc<AtomicBool>,
    next_id: AtomicU64,
    script: Mutex<Script>,
    calls: Mutex<Vec<(String, Value)>>,
    subscribers: Mutex<Vec<mpsc::Sender<CdpEvent>>>,
}

impl MockCdpConnection {
    /// Create a new mock CDP connection
    pub fn new() -> Self {
        Self {
            is_active: Arc::new(AtomicBool::new(true)),
            next_id: AtomicU64::new(1),
            script: Mutex::new(Script::default()),
            calls: Mutex::new(Vec::new()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Answer every `method` call with `result`
    pub async fn respond(&self, method: &str, result: Value) {
        self.script
            .lock()
            .await
            .persistent
            .insert(method.to_string(), Reply::Result(result));
    }

    /// Answer the next `method` call with `result`
    pub async fn respond_once(&self, method: &str, result: Value) {
        self.script
            .lock()
            .await
            .queued
            .entry(method.to_string())
            .or_default()
            .push_back(Reply::Result(result));
    }

    /// Fail every `method` call with a protocol error
    pub async fn fail(&self, method: &str, message: &str) {
        self.script
            .lock()
            .await
            .persistent
            .insert(method.to_string(), Reply::Error(message.to_string()));
    }

    /// Fail the next `method` call with a protocol error
    pub async fn fail_once(&self, method: &str, message: &str) {
        self.script
            .lock()
            .await
            .queued
            .entry(method.to_string())
            .or_default()
            .push_back(Reply::Error(message.to_string()));
    }

    /// Deliver an event to every listener
    pub async fn emit(&self, method: &str, params: Value) {
        let event = CdpEvent {
            method: method.to_string(),
            params,
            session_id: None,
        };
        let subscribers = self.subscribers.lock().await.clone();
        for sender in subscribers {
            let _ = sender.send(event.clone()).await;
        }
    }

    /// Every command sent so far, with its parameters
    pub async fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().await.clone()
    }

    /// Commands sent so far with the given method
    pub async fn calls_to(&self, method: &str) -> Vec<Value> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, params)| params.clone())
            .collect()
    }

    async fn next_reply(&self, method: &str) -> Reply {
        let mut script = self.script.lock().await;
        if let Some(reply) = script.queued.get_mut(method).and_then(VecDeque::pop_front) {
            return reply;
        }
        script
            .persistent
            .get(method)
            .cloned()
            .unwrap_or_else(|| Reply::Result(serde_json::json!({})))
    }
}

impl Default for MockCdpConnection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CdpConnection for MockCdpConnection {
    async fn send_command(&self, method: &str, params: Value) -> Result<CdpResponse, Error> {
        if !self.is_active.load(Ordering::Relaxed) {
            return Err(Error::websocket("Connection is not active"));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.calls.lock().await.push((method.to_string(), params));

        match self.next_reply(method).await {
            Reply::Result(result) => Ok(CdpResponse {
                id,
                result: Some(result),
                error: None,
            }),
            Reply::Error(message) => Err(Error::cdp(format!("{} (code: -32000)", message))),
        }
    }

    async fn listen_events(&self) -> Result<mpsc::Receiver<CdpEvent>, Error> {
        if !self.is_active.load(Ordering::Relaxed) {
            return Err(Error::websocket("Connection is not active"));
        }

        let (tx, rx) = mpsc::channel(100);
        self.subscribers.lock().await.push(tx);
        Ok(rx)
    }

    async fn close(&self) -> Result<(), Error> {
        self.is_active.store(false, Ordering::Relaxed);
        self.subscribers.lock().await.clear();
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::Relaxed)
    }
}

/// Mock CDP browser
///
/// Hands out clients over one shared [`MockCdpConnection`].
#[derive(Debug)]
pub struct MockCdpBrowser {
    is_active: AtomicBool,
    connection: Arc<MockCdpConnection>,
}

impl MockCdpBrowser {
    /// Create a new mock CDP browser
    pub fn new() -> Self {
        Self::with_connection(Arc::new(MockCdpConnection::new()))
    }

    /// Create a browser whose clients talk to `connection`
    pub fn with_connection(connection: Arc<MockCdpConnection>) -> Self {
        Self {
            is_active: AtomicBool::new(true),
            connection,
        }
    }

    /// The shared connection
    pub fn connection(&self) -> &Arc<MockCdpConnection> {
        &self.connection
    }
}

impl Default for MockCdpBrowser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CdpBrowser for MockCdpBrowser {
    async fn create_client(&self, _target_url: &str) -> Result<Arc<dyn CdpClient>, Error> {
        if !self.is_active.load(Ordering::Relaxed) {
            return Err(Error::cdp("Browser is closed"));
        }

        Ok(Arc::new(CdpClientImpl::new(self.connection.clone())))
    }

    async fn close(&self) -> Result<(), Error> {
        self.is_active.store(false, Ordering::Relaxed);
        Ok(())
    }

    async fn get_version(&self) -> Result<BrowserVersion, Error> {
        Ok(BrowserVersion {
            protocol_version: "1.3".to_string(),
            product: "Chrome/120.0.0.0".to_string(),
            user_agent: "Mock Chrome/120.0.0.0".to_string(),
            js_version: "12.0.0.0".to_string(),
        })
    }

    async fn get_targets(&self) -> Result<Vec<TargetInfo>, Error> {
        Ok(vec![])
    }

    async fn create_target(&self, url: &str) -> Result<String, Error> {
        if !self.is_active.load(Ordering::Relaxed) {
            return Err(Error::cdp("Browser is closed"));
        }

        let target_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!("Mock: created target {} for {}", target_id, url);
        Ok(format!("ws://localhost:9222/devtools/page/{}", target_id))
    }
}
