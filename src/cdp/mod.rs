//! # Chrome DevTools Protocol (CDP) 层
//!
//! 提供 Chrome/Chromium 浏览器的 WebSocket 通信接口，查询层通过它操作页面和元素。
//!
//! ## 主要功能
//! - **WebSocket 连接管理**: 建立和维护与浏览器的 CDP WebSocket 连接
//! - **协议通信**: 发送 CDP 命令并按 id 匹配响应
//! - **事件订阅**: 监听浏览器事件（控制台日志、异常等）
//! - **远程对象**: 执行脚本、在元素对象上调用函数、释放对象
//! - **目标管理**: 通过 DevTools HTTP 接口查询版本、列出和创建标签页
//!
//! ## 模块结构
//! - `traits`: CDP 操作的核心 trait 定义
//! - `types`: CDP 协议相关的数据类型
//! - `connection`: WebSocket 连接实现
//! - `client`: CDP 客户端实现
//! - `browser`: 浏览器级别的操作
//! - `mock`: 用于测试的 Mock 实现
//!
//! ## 使用示例
//! ```rust,no_run
//! use oxide_finder::cdp::{CdpBrowser, CdpBrowserImpl, CdpClient};
//!
//! # async fn example() -> oxide_finder::Result<()> {
//! let browser = CdpBrowserImpl::new("ws://localhost:9222");
//! let target = browser.create_target("about:blank").await?;
//! let client = browser.create_client(&target).await?;
//!
//! let result = client.navigate("https://example.com").await?;
//! println!("Navigated to: {}", result.url);
//! # Ok(())
//! # }
//! ```

pub mod traits;
pub mod types;
pub mod connection;
pub mod client;
pub mod browser;
pub mod mock;

#[cfg(test)]
mod tests;

pub use traits::{
    CdpConnection, CdpClient, CdpBrowser, CdpEvent, CdpResponse, CdpError,
    NavigationResult, EvaluationResult, BrowserVersion, TargetInfo,
};

// Re-export implementation structs
pub use connection::CdpWebSocketConnection;
pub use client::CdpClientImpl;
pub use browser::CdpBrowserImpl;

// Re-export mocks for development/testing
pub use mock::{MockCdpBrowser, MockCdpConnection};
