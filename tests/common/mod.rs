//! Common test utilities
//!
//! Shared fixtures for the integration tests: a page with a list and a small form, and
//! sessions over the in-memory mock driver.

use oxide_finder::session::MockDriver;
use oxide_finder::{Config, Session};
use std::sync::Arc;

/// Base URL the test configuration builds page URLs from
pub const BASE_URL: &str = "http://localhost:8080";

/// Test page: three `.item` elements (the second hidden) and a labelled form
pub fn get_test_html() -> String {
    r#"
<!DOCTYPE html>
<html>
<head>
    <title>Test Page</title>
    <script>window.ready = true;</script>
</head>
<body>
    <h1 id="title">Hello World</h1>
    <ul id="list">
        <li class="item">One</li>
        <li class="item" style="display: none">Two</li>
        <li class="item">Three</li>
    </ul>
    <form id="login">
        <div class="field">
            <label>Email</label>
            <input type="email" name="email" />
        </div>
        <div class="field">
            <label>Password</label>
            <input type="password" name="password" />
        </div>
        <button id="submit" disabled>Sign in</button>
    </form>
</body>
</html>
    "#
    .to_string()
}

/// The test page as a data URL
pub fn get_test_url() -> String {
    "data:text/html;charset=utf-8,".to_string() + &urlencoding::encode(&get_test_html())
}

/// Configuration with a short wait budget
pub fn test_config(timeout_ms: u64) -> Config {
    Config {
        timeout_ms,
        poll_interval_ms: 50,
        ..Default::default()
    }
}

/// Session over a mock driver that serves the test page at `BASE_URL` + `path`
pub async fn setup_test_session(path: &str, timeout_ms: u64) -> (Session, MockDriver) {
    let driver = MockDriver::new();
    driver
        .add_page(&format!("{}{}", BASE_URL, path), get_test_html())
        .await;
    let session = Session::with_driver(test_config(timeout_ms), Arc::new(driver.clone()));
    (session, driver)
}
