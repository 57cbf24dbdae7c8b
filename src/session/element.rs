//! CDP element reference
//!
//! Elements are `Runtime` remote objects. Every operation is a `Runtime.callFunctionOn` on
//! the object, guarded by an `isConnected` check so that references to nodes removed from the
//! document fail as stale instead of answering for a detached node.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::cdp::traits::CdpClient;
use crate::cdp::types::CallArgument;
use crate::query::Selector;
use crate::session::traits::{BoundingBox, NativeElement, SearchContext};
use crate::Error;

/// Thrown by the connectivity guard
const STALE_MARKER: &str = "oxide-finder: stale element reference";

const QUERY_CSS: &str = "function(selector) { return Array.from(this.querySelectorAll(selector)); }";

const QUERY_XPATH: &str = r#"function(expression) {
    const doc = this.ownerDocument || this;
    const snapshot = doc.evaluate(expression, this, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
    const nodes = [];
    for (let i = 0; i < snapshot.snapshotLength; i++) {
        const node = snapshot.snapshotItem(i);
        if (node.nodeType === Node.ELEMENT_NODE) nodes.push(node);
    }
    return nodes;
}"#;

const IS_DISPLAYED: &str = r#"function() {
    for (let el = this; el; el = el.parentElement) {
        const style = window.getComputedStyle(el);
        if (style.display === 'none') return false;
    }
    const style = window.getComputedStyle(this);
    if (style.visibility === 'hidden' || style.visibility === 'collapse') return false;
    return this.getClientRects().length > 0;
}"#;

const CLEAR: &str = r#"function() {
    if ('value' in this) {
        this.value = '';
        this.dispatchEvent(new Event('input', { bubbles: true }));
        this.dispatchEvent(new Event('change', { bubbles: true }));
    } else if (this.isContentEditable) {
        this.textContent = '';
    }
}"#;

/// Wrap `body` with the connectivity guard
fn guarded(body: &str) -> String {
    format!(
        "function(...args) {{ if (!this.isConnected) throw new Error('{}'); return ({}).apply(this, args); }}",
        STALE_MARKER, body
    )
}

/// Elements matching `selector` under the remote object `object_id`
pub(crate) async fn find_under(
    client: &Arc<dyn CdpClient>,
    object_id: &str,
    selector: &Selector,
    owner: &str,
) -> Result<Vec<Arc<dyn NativeElement>>, Error> {
    let (function, argument) = match selector {
        Selector::Css(css) => (QUERY_CSS, css.clone()),
        structured => match structured.to_xpath() {
            Some(xpath) => (QUERY_XPATH, xpath),
            None => return Err(Error::invalid_selector(structured.to_string())),
        },
    };

    let array = client
        .call_function_on(
            object_id,
            &guarded(function),
            vec![CallArgument::value(json!(argument))],
            false,
        )
        .await
        .map_err(|e| classify(e, owner, Some(selector)))?;

    let array_id = array
        .object_id
        .ok_or_else(|| Error::cdp(format!("Query for {} returned no array", selector)))?;
    let properties = client.get_properties(&array_id).await;
    if let Err(e) = client.release_object(&array_id).await {
        debug!("Failed to release query result {}: {}", array_id, e);
    }
    let properties = properties?;

    let mut indexed: Vec<(usize, String)> = properties
        .into_iter()
        .filter_map(|property| {
            let index = property.name.parse::<usize>().ok()?;
            let object_id = property.value?.object_id?;
            Some((index, object_id))
        })
        .collect();
    indexed.sort_by_key(|(index, _)| *index);

    Ok(indexed
        .into_iter()
        .map(|(_, object_id)| {
            Arc::new(CdpElement::new(object_id, Arc::clone(client))) as Arc<dyn NativeElement>
        })
        .collect())
}

/// Map script failures to element errors
fn classify(error: Error, owner: &str, selector: Option<&Selector>) -> Error {
    match error {
        Error::ScriptExecutionFailed(msg) if msg.contains(STALE_MARKER) => Error::stale_element(owner),
        Error::Cdp(msg) if msg.contains("Could not find object") => Error::stale_element(owner),
        Error::ScriptExecutionFailed(msg) if selector.is_some() && (msg.contains("SyntaxError") || msg.contains("not a valid")) => {
            Error::invalid_selector(format!("{}: {}", selector.map(|s| s.to_string()).unwrap_or_default(), msg))
        }
        other => other,
    }
}

#[derive(Debug, Deserialize)]
struct Rect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// Element backed by a `Runtime` remote object
pub struct CdpElement {
    id: String,
    object_id: String,
    client: Arc<dyn CdpClient>,
}

impl CdpElement {
    /// Wrap a remote object id
    pub fn new(object_id: String, client: Arc<dyn CdpClient>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            object_id,
            client,
        }
    }

    /// Remote object id
    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    /// Call `function` on this element and return its JSON result
    async fn call(&self, function: &str, arguments: Vec<Value>) -> Result<Value, Error> {
        let result = self
            .client
            .call_function_on(
                &self.object_id,
                &guarded(function),
                arguments.into_iter().map(CallArgument::value).collect(),
                true,
            )
            .await
            .map_err(|e| classify(e, &self.id, None))?;

        Ok(result.value.unwrap_or(Value::Null))
    }

    async fn call_bool(&self, function: &str) -> Result<bool, Error> {
        Ok(self.call(function, vec![]).await?.as_bool().unwrap_or(false))
    }

    async fn call_string(&self, function: &str, arguments: Vec<Value>) -> Result<Option<String>, Error> {
        Ok(self
            .call(function, arguments)
            .await?
            .as_str()
            .map(str::to_string))
    }

    async fn dispatch_mouse(&self, event_type: &str, x: f64, y: f64) -> Result<(), Error> {
        self.client
            .call_method(
                "Input.dispatchMouseEvent",
                json!({
                    "type": event_type,
                    "x": x,
                    "y": y,
                    "button": "left",
                    "clickCount": 1,
                }),
            )
            .await?;
        Ok(())
    }
}

impl fmt::Debug for CdpElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CdpElement")
            .field("id", &self.id)
            .field("object_id", &self.object_id)
            .finish()
    }
}

/// Frees the remote object once the last handle is gone
impl Drop for CdpElement {
    fn drop(&mut self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let client = Arc::clone(&self.client);
        let object_id = std::mem::take(&mut self.object_id);
        handle.spawn(async move {
            if let Err(e) = client.release_object(&object_id).await {
                debug!("Failed to release element {}: {}", object_id, e);
            }
        });
    }
}

#[async_trait]
impl SearchContext for CdpElement {
    async fn find_elements(&self, selector: &Selector) -> Result<Vec<Arc<dyn NativeElement>>, Error> {
        find_under(&self.client, &self.object_id, selector, &self.id).await
    }
}

#[async_trait]
impl NativeElement for CdpElement {
    fn id(&self) -> &str {
        &self.id
    }

    async fn text(&self) -> Result<String, Error> {
        Ok(self
            .call_string("function() { return this.innerText ?? this.textContent ?? ''; }", vec![])
            .await?
            .unwrap_or_default())
    }

    async fn tag_name(&self) -> Result<String, Error> {
        Ok(self
            .call_string("function() { return this.tagName.toLowerCase(); }", vec![])
            .await?
            .unwrap_or_default())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, Error> {
        self.call_string("function(name) { return this.getAttribute(name); }", vec![json!(name)])
            .await
    }

    async fn property(&self, name: &str) -> Result<Option<String>, Error> {
        self.call_string(
            "function(name) { const v = this[name]; return v === undefined || v === null ? null : String(v); }",
            vec![json!(name)],
        )
        .await
    }

    async fn click(&self) -> Result<(), Error> {
        self.scroll_into_view().await?;
        let (x, y) = self.bounding_box().await?.center();

        self.dispatch_mouse("mouseMoved", x, y).await?;
        self.dispatch_mouse("mousePressed", x, y).await?;
        self.dispatch_mouse("mouseReleased", x, y).await
    }

    async fn send_keys(&self, text: &str) -> Result<(), Error> {
        self.call("function() { this.focus(); }", vec![]).await?;

        for ch in text.chars() {
            self.client
                .call_method(
                    "Input.dispatchKeyEvent",
                    json!({
                        "type": "char",
                        "text": ch.to_string(),
                    }),
                )
                .await?;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), Error> {
        self.call(CLEAR, vec![]).await?;
        Ok(())
    }

    async fn is_displayed(&self) -> Result<bool, Error> {
        self.call_bool(IS_DISPLAYED).await
    }

    async fn is_enabled(&self) -> Result<bool, Error> {
        self.call_bool("function() { return !this.matches(':disabled'); }").await
    }

    async fn is_selected(&self) -> Result<bool, Error> {
        self.call_bool("function() { return !!(this.checked || this.selected); }")
            .await
    }

    async fn bounding_box(&self) -> Result<BoundingBox, Error> {
        let value = self
            .call(
                "function() { const r = this.getBoundingClientRect(); return { x: r.x, y: r.y, width: r.width, height: r.height }; }",
                vec![],
            )
            .await?;
        let rect: Rect = serde_json::from_value(value)?;

        Ok(BoundingBox {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        })
    }

    async fn scroll_into_view(&self) -> Result<(), Error> {
        self.call(
            "function() { this.scrollIntoView({ block: 'center', inline: 'center' }); }",
            vec![],
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdp::mock::MockCdpConnection;
    use crate::cdp::CdpClientImpl;

    fn element_on(connection: &Arc<MockCdpConnection>) -> CdpElement {
        let client: Arc<dyn CdpClient> = Arc::new(CdpClientImpl::new(connection.clone()));
        CdpElement::new("node-1".to_string(), client)
    }

    #[tokio::test]
    async fn test_element_text() {
        let connection = Arc::new(MockCdpConnection::new());
        connection
            .respond(
                "Runtime.callFunctionOn",
                json!({ "result": { "type": "string", "value": "Hello" } }),
            )
            .await;
        let element = element_on(&connection);

        assert_eq!(element.text().await.unwrap(), "Hello");

        let calls = connection.calls_to("Runtime.callFunctionOn").await;
        assert_eq!(calls[0]["objectId"], "node-1");
        assert_eq!(calls[0]["returnByValue"], true);
        assert!(calls[0]["functionDeclaration"]
            .as_str()
            .unwrap()
            .contains("isConnected"));
    }

    #[tokio::test]
    async fn test_missing_attribute_is_none() {
        let connection = Arc::new(MockCdpConnection::new());
        connection
            .respond(
                "Runtime.callFunctionOn",
                json!({ "result": { "type": "object", "subtype": "null", "value": null } }),
            )
            .await;
        let element = element_on(&connection);

        assert_eq!(element.attribute("href").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_detached_element_is_stale() {
        let connection = Arc::new(MockCdpConnection::new());
        connection
            .respond(
                "Runtime.callFunctionOn",
                json!({
                    "result": { "type": "object", "subtype": "error" },
                    "exceptionDetails": {
                        "text": "Uncaught",
                        "exception": { "type": "object", "description": format!("Error: {}", STALE_MARKER) }
                    }
                }),
            )
            .await;
        let element = element_on(&connection);

        let err = element.is_displayed().await.unwrap_err();

        assert!(err.is_transient());
        assert!(matches!(err, Error::StaleElement(id) if id == element.id()));
    }

    #[tokio::test]
    async fn test_released_object_is_stale() {
        let connection = Arc::new(MockCdpConnection::new());
        connection
            .fail("Runtime.callFunctionOn", "Could not find object with given id")
            .await;
        let element = element_on(&connection);

        assert!(matches!(element.text().await, Err(Error::StaleElement(_))));
    }

    #[tokio::test]
    async fn test_drop_releases_remote_object() {
        let connection = Arc::new(MockCdpConnection::new());
        let element = element_on(&connection);

        drop(element);

        let mut released = Vec::new();
        for _ in 0..10 {
            tokio::task::yield_now().await;
            released = connection.calls_to("Runtime.releaseObject").await;
            if !released.is_empty() {
                break;
            }
        }
        assert_eq!(released.len(), 1);
        assert_eq!(released[0]["objectId"], "node-1");
    }

    #[tokio::test]
    async fn test_find_under_orders_by_index() {
        let connection = Arc::new(MockCdpConnection::new());
        connection
            .respond(
                "Runtime.callFunctionOn",
                json!({ "result": { "type": "object", "subtype": "array", "objectId": "arr-1" } }),
            )
            .await;
        connection
            .respond(
                "Runtime.getProperties",
                json!({ "result": [
                    { "name": "1", "value": { "type": "object", "objectId": "second" } },
                    { "name": "length", "value": { "type": "number", "value": 2 } },
                    { "name": "0", "value": { "type": "object", "objectId": "first" } },
                    { "name": "__proto__", "value": { "type": "object", "objectId": "proto" } }
                ]}),
            )
            .await;
        let client: Arc<dyn CdpClient> = Arc::new(CdpClientImpl::new(connection.clone()));

        let found = find_under(&client, "doc", &Selector::css(".item"), "document")
            .await
            .unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(connection.calls_to("Runtime.releaseObject").await[0]["objectId"], "arr-1");
        let call = &connection.calls_to("Runtime.callFunctionOn").await[0];
        assert_eq!(call["arguments"][0]["value"], ".item");
        assert!(call["functionDeclaration"].as_str().unwrap().contains("querySelectorAll"));
    }

    #[tokio::test]
    async fn test_text_selector_uses_xpath() {
        let connection = Arc::new(MockCdpConnection::new());
        connection
            .respond(
                "Runtime.callFunctionOn",
                json!({ "result": { "type": "object", "subtype": "array", "objectId": "arr-1" } }),
            )
            .await;
        let element = element_on(&connection);

        let found = element
            .find_elements(&Selector::text("label", "Email"))
            .await
            .unwrap();

        assert!(found.is_empty());
        let call = &connection.calls_to("Runtime.callFunctionOn").await[0];
        assert_eq!(
            call["arguments"][0]["value"],
            ".//label[normalize-space() = 'Email']"
        );
        assert!(call["functionDeclaration"].as_str().unwrap().contains("XPathResult"));
    }

    #[tokio::test]
    async fn test_invalid_css_is_invalid_selector() {
        let connection = Arc::new(MockCdpConnection::new());
        connection
            .respond(
                "Runtime.callFunctionOn",
                json!({
                    "result": { "type": "object", "subtype": "error" },
                    "exceptionDetails": {
                        "exception": { "type": "object", "description": "SyntaxError: '##' is not a valid selector" }
                    }
                }),
            )
            .await;
        let element = element_on(&connection);

        let err = element.find_elements(&Selector::css("##")).await.unwrap_err();

        assert!(matches!(err, Error::InvalidSelector(_)));
    }

    #[tokio::test]
    async fn test_click_dispatches_at_center() {
        let connection = Arc::new(MockCdpConnection::new());
        connection
            .respond_once("Runtime.callFunctionOn", json!({ "result": { "type": "undefined" } }))
            .await;
        connection
            .respond_once(
                "Runtime.callFunctionOn",
                json!({ "result": { "type": "object", "value": { "x": 10.0, "y": 20.0, "width": 100.0, "height": 40.0 } } }),
            )
            .await;
        let element = element_on(&connection);

        element.click().await.unwrap();

        let events = connection.calls_to("Input.dispatchMouseEvent").await;
        assert_eq!(events.len(), 3);
        assert_eq!(events[1]["type"], "mousePressed");
        assert_eq!(events[1]["x"], 60.0);
        assert_eq!(events[1]["y"], 40.0);
    }
}
