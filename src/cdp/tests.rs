//! CDP layer integration tests
//!
//! These tests require a running Chrome/Chromium instance with remote debugging enabled and
//! skip themselves otherwise.
//! Start Chrome with: chrome --remote-debugging-port=9222

use std::sync::Arc;

use super::browser::CdpBrowserImpl;
use super::traits::*;
use crate::config::Config;
use crate::query::{Findable, Selector};
use crate::session::{CdpDriver, Driver, Session};
use crate::Error;

const PAGE: &str = r#"<html><body>
    <ul id="list">
        <li class="item">One</li>
        <li class="item" style="display: none">Two</li>
        <li class="item">Three</li>
    </ul>
    <div class="field">
        <label>Email</label>
        <input type="email" name="email" value="a@b.c">
    </div>
</body></html>"#;

/// Test helper: Get Chrome debugging URL from environment or use default
fn get_chrome_url() -> String {
    std::env::var("CHROME_DEBUG_URL").unwrap_or_else(|_| "ws://localhost:9222".to_string())
}

/// Test helper: Check if Chrome is available
async fn is_chrome_available() -> bool {
    CdpBrowserImpl::new(get_chrome_url())
        .get_version()
        .await
        .is_ok()
}

fn data_url(html: &str) -> String {
    format!("data:text/html,{}", urlencoding::encode(html))
}

/// Test helper: Session on a fresh tab showing `PAGE`
async fn create_test_session() -> Session {
    let driver = CdpDriver::connect(&get_chrome_url())
        .await
        .expect("Failed to open a tab");
    let config = Config {
        timeout_ms: 2000,
        ..Default::default()
    };
    let session = Session::with_driver(config, Arc::new(driver));
    session.go(&data_url(PAGE)).await.expect("Failed to navigate");
    session
}

#[tokio::test]
async fn test_browser_get_version() {
    if !is_chrome_available().await {
        eprintln!("Skipping test: Chrome not available");
        return;
    }

    let version = CdpBrowserImpl::new(get_chrome_url())
        .get_version()
        .await
        .expect("Failed to get browser version");

    assert!(!version.protocol_version.is_empty());
    assert!(!version.product.is_empty());
}

#[tokio::test]
async fn test_evaluate_and_targets() {
    if !is_chrome_available().await {
        eprintln!("Skipping test: Chrome not available");
        return;
    }

    let driver = CdpDriver::connect(&get_chrome_url())
        .await
        .expect("Failed to open a tab");

    let result = driver
        .client()
        .evaluate("1 + 1", false)
        .await
        .expect("Failed to evaluate JavaScript");
    assert_eq!(result, EvaluationResult::Number(2.0));

    let targets = CdpBrowserImpl::new(get_chrome_url())
        .get_targets()
        .await
        .expect("Failed to get targets");
    assert!(targets.iter().any(|t| t.target_type == "page"));

    driver.quit().await.expect("Failed to quit");
    assert!(!driver.is_open());
}

#[tokio::test]
async fn test_query_on_live_page() {
    if !is_chrome_available().await {
        eprintln!("Skipping test: Chrome not available");
        return;
    }

    let session = create_test_session().await;

    let displayed = session
        .find_selector(".item")
        .displayed()
        .all(2)
        .await
        .expect("Failed to find displayed items");
    let hidden = session.find_selector(".item").hidden().one().await.unwrap();
    let by_xpath = session
        .find_by(Selector::xpath("//li[@class='item']"))
        .all(3)
        .await
        .unwrap();

    assert_eq!(displayed[0].text().await.unwrap(), "One");
    assert!(!hidden.is_displayed().await.unwrap());
    assert_eq!(by_xpath.len(), 3);

    let email = session.find_by_label("Email", "input").await.unwrap();
    assert_eq!(email.value().await.unwrap().as_deref(), Some("a@b.c"));

    session.close_browser().await.unwrap();
}

#[tokio::test]
async fn test_console_errors_captured() {
    if !is_chrome_available().await {
        eprintln!("Skipping test: Chrome not available");
        return;
    }

    let driver = CdpDriver::connect(&get_chrome_url())
        .await
        .expect("Failed to open a tab");

    driver
        .client()
        .evaluate("console.error('boom')", false)
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let logs = driver.console_logs().await.unwrap();
    assert!(logs
        .iter()
        .any(|entry| entry.level == crate::session::LogLevel::Severe && entry.message.contains("boom")));
    assert!(driver.console_logs().await.unwrap().is_empty());

    driver.quit().await.unwrap();
}

#[tokio::test]
async fn test_invalid_selector_on_live_page() {
    if !is_chrome_available().await {
        eprintln!("Skipping test: Chrome not available");
        return;
    }

    let session = create_test_session().await;

    let err = session.find_selector("li[").one().await.unwrap_err();

    assert!(matches!(err, Error::InvalidSelector(_)));
    session.close_browser().await.unwrap();
}
