//! End-to-end query flows through the public API
//!
//! Drives a [`Session`] over the in-memory mock driver the way a browser test would: load a
//! page, query it, interact, and check the diagnostics of failed queries.

mod common;

use common::{get_test_html, get_test_url, setup_test_session, test_config, BASE_URL};
use oxide_finder::session::{MockAction, MockDriver, PageOptions, WindowMode};
use oxide_finder::{Error, Findable, Range, Selector, Session, Visibility};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_login_form_flow() {
    let (session, driver) = setup_test_session("/login", 1000).await;

    assert_ok!(session.load_page(PageOptions::default(), "/login").await);

    let email = session
        .find_by_label("Email", "input[type=email]")
        .await
        .expect("Failed to find email field");
    let password = session
        .find_by_label("Password", "input")
        .await
        .expect("Failed to find password field");

    email.send_keys("user@example.com").await.unwrap();
    password.send_keys("secret").await.unwrap();

    assert_eq!(email.value().await.unwrap().as_deref(), Some("user@example.com"));
    assert_eq!(password.value().await.unwrap().as_deref(), Some("secret"));

    let submit = session.find_selector("#submit").displayed().one().await.unwrap();
    assert!(!submit.is_enabled().await.unwrap());

    let actions = driver.actions().await;
    assert_eq!(actions[0], MockAction::Navigate(format!("{}/login", BASE_URL)));
    assert!(actions.contains(&MockAction::SendKeys(
        email.id().to_string(),
        "user@example.com".to_string()
    )));
}

#[tokio::test]
async fn test_list_queries() {
    let (session, _driver) = setup_test_session("/list", 1000).await;
    session.load_page(PageOptions::default(), "/list").await.unwrap();

    let displayed = session.find_selector(".item").displayed().all(2).await.unwrap();
    let hidden = session.find_selector(".item").hidden().one().await.unwrap();

    assert_eq!(displayed[0].text().await.unwrap(), "One");
    assert_eq!(displayed[1].text().await.unwrap(), "Three");
    assert!(!hidden.is_displayed().await.unwrap());

    let list = session.find_selector("#list").one().await.unwrap();
    let nested = list
        .find_all_with(Selector::css("li"), Range::at_most(3), Visibility::All)
        .await
        .unwrap();
    assert_eq!(nested.len(), 3);

    let title = session.find_by(Selector::text("h1", " Hello   World ")).one().await.unwrap();
    assert_eq!(title.attribute("id").await.unwrap().as_deref(), Some("title"));
}

#[tokio::test(start_paused = true)]
async fn test_failed_query_diagnostics() {
    let (session, _driver) = setup_test_session("/list", 2000).await;
    session.load_page(PageOptions::default(), "/list").await.unwrap();

    let err = assert_err!(session.find_selector(".item").displayed().min(3).await);

    assert!(err.is_timeout());
    assert_eq!(
        err.to_string(),
        "Waited for 3.. displayed elements but was: 3 total elements (2 displayed and 1 hidden)"
    );

    let err = assert_err!(session.find_selector(".missing").at_least_one().await);
    match err {
        Error::ConditionTimeout(report) => {
            assert_eq!(report.total(), 0);
            assert_eq!(report.displayed(), 0);
            assert_eq!(report.hidden(), 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_page_rendered_after_navigation() {
    let driver = MockDriver::new();
    driver.queue_ready_states(["loading", "loading", "interactive"]).await;
    let session = Session::with_driver(test_config(1000), Arc::new(driver.clone()));

    let later = driver.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        later.set_html(get_test_html()).await;
    });

    session.go(&get_test_url()).await.unwrap();
    let items = session.find_all(".item", Range::at_least(2)).await.unwrap();

    assert_eq!(items.len(), 3);
}

#[tokio::test]
async fn test_mobile_page_load() {
    let (session, driver) = setup_test_session("/list", 1000).await;
    let options = PageOptions::default()
        .with_mode(WindowMode::Mobile)
        .with_timeout(Duration::from_millis(300));

    session.load_page(options, "/list").await.unwrap();

    assert_eq!(driver.window().await.width, 432);
    assert_eq!(session.timeout().await, Duration::from_millis(300));
}
