//! # 会话层
//!
//! 管理浏览器驱动的生命周期、页面加载流程以及查询所依赖的驱动抽象。
//!
//! ## 主要功能
//! - **浏览器管理**: 通过 CDP 打开和关闭浏览器标签页
//! - **页面加载**: 构建 URL、导航、等待页面就绪、执行加载前后钩子
//! - **窗口控制**: 桌面 / 移动窗口尺寸以及隐藏窗口
//! - **控制台检查**: 收集浏览器控制台日志并按过滤器报告错误
//! - **手势操作**: 指针移动和拖放
//!
//! ## 核心概念
//! - **Session**: 会话上下文，可克隆，克隆之间共享同一个浏览器
//! - **Driver**: 浏览器驱动，提供就绪状态、元素查找、导航等能力
//! - **NativeElement**: 驱动持有的元素引用，文档重新渲染后可能失效
//!
//! ## 模块结构
//! - `traits`: 驱动与元素的核心 trait 定义
//! - `options`: 页面加载选项
//! - `context`: 会话实现
//! - `cdp_driver`: 基于 CDP 的驱动实现
//! - `element`: 基于 CDP 远程对象的元素实现
//! - `mock`: 基于内存 HTML 文档的 Mock 驱动，用于测试
//!
//! ## 使用示例
//! ```rust,no_run
//! use oxide_finder::session::{PageOptions, Session};
//! use oxide_finder::{Config, Findable};
//!
//! # async fn example() -> oxide_finder::Result<()> {
//! let session = Session::new(Config::from_env()?);
//! session.open_browser().await?;
//! session.load_page(PageOptions::default(), "/login").await?;
//!
//! let email = session.find_by_label("Email", "input").await?;
//! email.send_keys("user@example.com").await?;
//! # Ok(())
//! # }
//! ```

pub mod traits;
pub mod options;
pub mod context;
pub mod cdp_driver;
pub mod element;
pub mod mock;


pub use traits::{
    BoundingBox, Driver, LogEntry, LogLevel, NativeElement, SearchContext, WindowRect,
};
pub use options::{LogsFilter, PageHook, PageOptions, WindowMode};
pub use context::Session;

// Re-export implementation structs
pub use cdp_driver::CdpDriver;
pub use element::CdpElement;

// Re-export mock driver for testing
pub use mock::{MockAction, MockDriver, MockElement};
