//! # Oxide-Finder 命令行入口
//!
//! 连接到已启用远程调试的 Chrome，加载页面，执行一次元素查询并打印匹配的元素。
//!
//! ## 环境变量
//! - `FINDER_CDP_ENDPOINT`: CDP WebSocket 端点（默认: ws://localhost:9222）
//! - `FINDER_TIMEOUT_MS`: 查询等待时间（默认: 10000）
//! - `FINDER_LOG_LEVEL`: 日志级别（默认: info，`RUST_LOG` 优先）
//!
//! ## 示例
//! ```text
//! oxide-finder --url https://example.com --css "a" --min 1
//! oxide-finder --url http://localhost:8080/login --label Email --css input
//! ```

use anyhow::{bail, Context};
use clap::{ArgGroup, Parser};
use oxide_finder::{
    session::PageOptions, Config, Element, Findable, Range, Selector, Session, Visibility,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Run one element query against a live page
#[derive(Debug, Parser)]
#[command(name = "oxide-finder", version, about)]
#[command(group(ArgGroup::new("size").args(["count", "min", "max"])))]
#[command(group(ArgGroup::new("visibility").args(["displayed", "hidden"])))]
struct Cli {
    /// Page to load
    #[arg(long)]
    url: String,

    /// CSS selector
    #[arg(long)]
    css: Option<String>,

    /// XPath expression
    #[arg(long, conflicts_with_all = ["css", "label"])]
    xpath: Option<String>,

    /// Label text; `--css` then selects next to the label
    #[arg(long, requires = "css")]
    label: Option<String>,

    /// Keep only displayed elements
    #[arg(long)]
    displayed: bool,

    /// Keep only hidden elements
    #[arg(long)]
    hidden: bool,

    /// Exact number of elements
    #[arg(long)]
    count: Option<usize>,

    /// Minimum number of elements
    #[arg(long)]
    min: Option<usize>,

    /// Maximum number of elements
    #[arg(long)]
    max: Option<usize>,

    /// DevTools endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Wait budget in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<String>,
}

impl Cli {
    fn range(&self) -> Range {
        match (self.count, self.min, self.max) {
            (Some(n), _, _) => Range::exact(n),
            (_, Some(min), _) => Range::at_least(min),
            (_, _, Some(max)) => Range::at_most(max),
            _ => Range::at_least(1),
        }
    }

    fn visibility(&self) -> Visibility {
        if self.displayed {
            Visibility::Displayed
        } else if self.hidden {
            Visibility::Hidden
        } else {
            Visibility::All
        }
    }

    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::from_env()?,
        };
        if let Some(endpoint) = &self.endpoint {
            config.cdp_endpoint = endpoint.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        Ok(config)
    }
}

async fn run(cli: &Cli, session: &Session) -> anyhow::Result<()> {
    session
        .open_browser()
        .await
        .context("Failed to open browser")?;
    session
        .load_page(PageOptions::default(), &cli.url)
        .await
        .with_context(|| format!("Failed to load {}", cli.url))?;

    let range = cli.range();
    let visibility = cli.visibility();

    let elements = match (&cli.label, &cli.css, &cli.xpath) {
        (Some(label), Some(css), _) => {
            let label = session.find().by_text("label", label).displayed().one().await?;
            label
                .parent()
                .await?
                .find_all_with(Selector::css(css), range, visibility)
                .await?
        }
        (None, Some(css), _) => {
            session
                .find_all_with(Selector::css(css), range, visibility)
                .await?
        }
        (None, None, Some(xpath)) => {
            session
                .find_all_with(Selector::xpath(xpath), range, visibility)
                .await?
        }
        _ => bail!("one of --css or --xpath is required"),
    };

    print_elements(&elements).await?;
    info!("{} elements matched", elements.len());
    Ok(())
}

async fn print_elements(elements: &[Element]) -> anyhow::Result<()> {
    for element in elements {
        let tag = element.tag_name().await?;
        let text = element.text().await?;
        println!("{}\t{}\t{}", tag, element.id(), text.trim());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.config()?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    info!("Oxide-Finder v{}", oxide_finder::VERSION);

    let session = Session::new(config);
    let result = run(&cli, &session).await;

    if session.is_browser_opened().await {
        if let Err(e) = session.close_browser().await {
            error!("Failed to close browser: {}", e);
        }
    }

    result
}
