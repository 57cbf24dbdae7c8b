//! Mock driver for testing
//!
//! [`MockDriver`] serves an in-memory HTML document parsed with `scraper`. It answers CSS,
//! text and parent selectors, derives display state from markup (`hidden`, inline
//! `display: none` / `visibility: hidden`, non-rendered tags) and records every action so
//! tests can assert on gestures, navigation and window changes.
//!
//! Elements are addressed by their child-index path from the document root. Replacing the
//! document bumps a generation counter and every element handed out before goes stale.

use async_trait::async_trait;
use scraper::{ElementRef, Html};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::traits::{BoundingBox, Driver, LogEntry, NativeElement, SearchContext, WindowRect};
use crate::query::{normalize_space, Selector};
use crate::Error;

/// Tags that never render
const NON_RENDERED_TAGS: &[&str] = &[
    "head", "script", "style", "template", "title", "meta", "link", "noscript",
];

/// Action recorded by the mock driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockAction {
    Navigate(String),
    Click(String),
    SendKeys(String, String),
    Clear(String),
    PointerMove(String),
    DragAndDrop { from: String, to: String },
    SetWindow(WindowRect),
    Quit,
}

#[derive(Debug)]
struct MockState {
    html: String,
    generation: u64,
    url: String,
    ready_state: String,
    /// Served one per call before falling back to `ready_state`
    ready_sequence: VecDeque<String>,
    /// Readiness checks left that fail as if navigation destroyed the page context
    lost_contexts: usize,
    connected: bool,
    /// Document replacements applied once this many document fetches happened
    scheduled: VecDeque<(usize, String)>,
    pages: HashMap<String, String>,
    values: HashMap<String, String>,
    logs: Vec<LogEntry>,
    actions: Vec<MockAction>,
    window: WindowRect,
    fetches: usize,
    open: bool,
}

impl MockState {
    fn replace_html(&mut self, html: String) {
        self.html = html;
        self.generation += 1;
        self.values.clear();
    }
}

/// In-memory browser driver
#[derive(Debug, Clone)]
pub struct MockDriver {
    inner: Arc<RwLock<MockState>>,
}

impl MockDriver {
    /// Create a driver showing an empty, ready document
    pub fn new() -> Self {
        Self::with_html("<html><head></head><body></body></html>")
    }

    /// Create a driver showing `html`
    pub fn with_html<S: Into<String>>(html: S) -> Self {
        Self {
            inner: Arc::new(RwLock::new(MockState {
                html: html.into(),
                generation: 0,
                url: "about:blank".to_string(),
                ready_state: "complete".to_string(),
                ready_sequence: VecDeque::new(),
                lost_contexts: 0,
                connected: true,
                scheduled: VecDeque::new(),
                pages: HashMap::new(),
                values: HashMap::new(),
                logs: Vec::new(),
                actions: Vec::new(),
                window: WindowRect {
                    x: 0,
                    y: 0,
                    width: 1024,
                    height: 768,
                },
                fetches: 0,
                open: true,
            })),
        }
    }

    /// Replace the document
    pub async fn set_html<S: Into<String>>(&self, html: S) {
        self.inner.write().await.replace_html(html.into());
    }

    /// Replace the document once `after_fetches` document-level lookups have happened
    pub async fn schedule_html<S: Into<String>>(&self, after_fetches: usize, html: S) {
        self.inner
            .write()
            .await
            .scheduled
            .push_back((after_fetches, html.into()));
    }

    /// Set the document ready state
    pub async fn set_ready_state(&self, state: &str) {
        self.inner.write().await.ready_state = state.to_string();
    }

    /// Serve these ready states, one per call, before the current one
    pub async fn queue_ready_states<I, S>(&self, states: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner
            .write()
            .await
            .ready_sequence
            .extend(states.into_iter().map(Into::into));
    }

    /// Fail the next `times` readiness checks with a destroyed execution context
    pub async fn lose_context(&self, times: usize) {
        self.inner.write().await.lost_contexts = times;
    }

    /// Drop the DevTools connection; readiness checks fail from now on
    pub async fn disconnect(&self) {
        self.inner.write().await.connected = false;
    }

    /// Serve `html` when navigating to `url`
    pub async fn add_page<S: Into<String>>(&self, url: &str, html: S) {
        self.inner
            .write()
            .await
            .pages
            .insert(url.to_string(), html.into());
    }

    /// Append a console entry
    pub async fn push_log(&self, entry: LogEntry) {
        self.inner.write().await.logs.push(entry);
    }

    /// Set the window geometry
    pub async fn set_window(&self, rect: WindowRect) {
        self.inner.write().await.window = rect;
    }

    /// Recorded actions, oldest first
    pub async fn actions(&self) -> Vec<MockAction> {
        self.inner.read().await.actions.clone()
    }

    /// Current window geometry
    pub async fn window(&self) -> WindowRect {
        self.inner.read().await.window
    }

    /// Number of document-level lookups so far
    pub async fn fetch_count(&self) -> usize {
        self.inner.read().await.fetches
    }

    fn element(&self, path: Vec<usize>, generation: u64) -> Arc<dyn NativeElement> {
        Arc::new(MockElement {
            id: element_id(generation, &path),
            path,
            generation,
            inner: Arc::clone(&self.inner),
        })
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchContext for MockDriver {
    async fn find_elements(&self, selector: &Selector) -> Result<Vec<Arc<dyn NativeElement>>, Error> {
        let (paths, generation) = {
            let mut state = self.inner.write().await;
            while let Some((after, _)) = state.scheduled.front() {
                if *after > state.fetches {
                    break;
                }
                if let Some((_, html)) = state.scheduled.pop_front() {
                    state.replace_html(html);
                }
            }
            state.fetches += 1;
            (select_paths(&state.html, None, selector)?, state.generation)
        };

        Ok(paths
            .into_iter()
            .map(|path| self.element(path, generation))
            .collect())
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn ready_state(&self) -> Result<String, Error> {
        let mut state = self.inner.write().await;
        if !state.connected {
            return Err(Error::websocket("Connection is not active"));
        }
        if state.lost_contexts > 0 {
            state.lost_contexts -= 1;
            return Err(Error::cdp("CDP error -32000: Execution context was destroyed."));
        }
        match state.ready_sequence.pop_front() {
            Some(ready_state) => Ok(ready_state),
            None => Ok(state.ready_state.clone()),
        }
    }

    async fn navigate(&self, url: &str) -> Result<(), Error> {
        let mut state = self.inner.write().await;
        state.actions.push(MockAction::Navigate(url.to_string()));
        state.url = url.to_string();
        if let Some(html) = state.pages.get(url).cloned() {
            state.replace_html(html);
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String, Error> {
        Ok(self.inner.read().await.url.clone())
    }

    async fn move_pointer_to(&self, element: &dyn NativeElement) -> Result<(), Error> {
        element.scroll_into_view().await?;
        self.inner
            .write()
            .await
            .actions
            .push(MockAction::PointerMove(element.id().to_string()));
        Ok(())
    }

    async fn drag_and_drop(
        &self,
        from: &dyn NativeElement,
        to: &dyn NativeElement,
    ) -> Result<(), Error> {
        from.scroll_into_view().await?;
        to.scroll_into_view().await?;
        self.inner.write().await.actions.push(MockAction::DragAndDrop {
            from: from.id().to_string(),
            to: to.id().to_string(),
        });
        Ok(())
    }

    async fn console_logs(&self) -> Result<Vec<LogEntry>, Error> {
        Ok(std::mem::take(&mut self.inner.write().await.logs))
    }

    async fn window_rect(&self) -> Result<WindowRect, Error> {
        Ok(self.inner.read().await.window)
    }

    async fn set_window_rect(&self, rect: WindowRect) -> Result<(), Error> {
        let mut state = self.inner.write().await;
        state.window = rect;
        state.actions.push(MockAction::SetWindow(rect));
        Ok(())
    }

    async fn quit(&self) -> Result<(), Error> {
        let mut state = self.inner.write().await;
        state.open = false;
        state.actions.push(MockAction::Quit);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.inner.try_read().map(|state| state.open).unwrap_or(true)
    }
}

/// Element of a [`MockDriver`] document
#[derive(Debug)]
pub struct MockElement {
    id: String,
    path: Vec<usize>,
    generation: u64,
    inner: Arc<RwLock<MockState>>,
}

/// Snapshot of one element, taken without holding the parsed document
#[derive(Debug, Default)]
struct ElementInfo {
    tag: String,
    text: String,
    attributes: HashMap<String, String>,
    hidden: bool,
}

impl MockElement {
    /// Child-index path from the document root
    pub fn path(&self) -> &[usize] {
        &self.path
    }

    fn stale(&self) -> Error {
        Error::stale_element(self.id.clone())
    }

    async fn info(&self) -> Result<ElementInfo, Error> {
        let state = self.inner.read().await;
        if state.generation != self.generation {
            return Err(self.stale());
        }
        element_info(&state.html, &self.path).ok_or_else(|| self.stale())
    }

    async fn record(&self, action: MockAction) -> Result<(), Error> {
        let mut state = self.inner.write().await;
        if state.generation != self.generation {
            return Err(self.stale());
        }
        state.actions.push(action);
        Ok(())
    }
}

#[async_trait]
impl SearchContext for MockElement {
    async fn find_elements(&self, selector: &Selector) -> Result<Vec<Arc<dyn NativeElement>>, Error> {
        let paths = {
            let state = self.inner.read().await;
            if state.generation != self.generation {
                return Err(self.stale());
            }
            select_paths(&state.html, Some(&self.path), selector)?
        };

        Ok(paths
            .into_iter()
            .map(|path| {
                Arc::new(MockElement {
                    id: element_id(self.generation, &path),
                    path,
                    generation: self.generation,
                    inner: Arc::clone(&self.inner),
                }) as Arc<dyn NativeElement>
            })
            .collect())
    }
}

#[async_trait]
impl NativeElement for MockElement {
    fn id(&self) -> &str {
        &self.id
    }

    async fn text(&self) -> Result<String, Error> {
        let info = self.info().await?;
        Ok(if info.hidden { String::new() } else { info.text })
    }

    async fn tag_name(&self) -> Result<String, Error> {
        Ok(self.info().await?.tag)
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, Error> {
        Ok(self.info().await?.attributes.get(name).cloned())
    }

    async fn property(&self, name: &str) -> Result<Option<String>, Error> {
        let info = self.info().await?;
        match name {
            "value" => {
                if let Some(value) = self.inner.read().await.values.get(&self.id) {
                    return Ok(Some(value.clone()));
                }
                Ok(match info.tag.as_str() {
                    "textarea" => Some(info.text),
                    "input" | "select" | "option" | "button" => {
                        Some(info.attributes.get("value").cloned().unwrap_or_default())
                    }
                    _ => None,
                })
            }
            "checked" | "selected" | "disabled" => {
                Ok(Some(info.attributes.contains_key(name).to_string()))
            }
            "tagName" => Ok(Some(info.tag.to_uppercase())),
            _ => Ok(info.attributes.get(name).cloned()),
        }
    }

    async fn click(&self) -> Result<(), Error> {
        self.record(MockAction::Click(self.id.clone())).await
    }

    async fn send_keys(&self, text: &str) -> Result<(), Error> {
        let current = self.property("value").await?.unwrap_or_default();
        self.record(MockAction::SendKeys(self.id.clone(), text.to_string()))
            .await?;
        self.inner
            .write()
            .await
            .values
            .insert(self.id.clone(), format!("{}{}", current, text));
        Ok(())
    }

    async fn clear(&self) -> Result<(), Error> {
        self.record(MockAction::Clear(self.id.clone())).await?;
        self.inner
            .write()
            .await
            .values
            .insert(self.id.clone(), String::new());
        Ok(())
    }

    async fn is_displayed(&self) -> Result<bool, Error> {
        Ok(!self.info().await?.hidden)
    }

    async fn is_enabled(&self) -> Result<bool, Error> {
        Ok(!self.info().await?.attributes.contains_key("disabled"))
    }

    async fn is_selected(&self) -> Result<bool, Error> {
        let info = self.info().await?;
        Ok(info.attributes.contains_key("checked") || info.attributes.contains_key("selected"))
    }

    /// Elements are laid out as 100x20 boxes stacked by document position
    async fn bounding_box(&self) -> Result<BoundingBox, Error> {
        let info = self.info().await?;
        if info.hidden {
            return Ok(BoundingBox {
                x: 0.0,
                y: 0.0,
                width: 0.0,
                height: 0.0,
            });
        }
        Ok(BoundingBox {
            x: 10.0 * self.path.len() as f64,
            y: 20.0 * self.path.iter().sum::<usize>() as f64,
            width: 100.0,
            height: 20.0,
        })
    }

    async fn scroll_into_view(&self) -> Result<(), Error> {
        self.info().await.map(|_| ())
    }
}

fn element_id(generation: u64, path: &[usize]) -> String {
    let path: Vec<String> = path.iter().map(usize::to_string).collect();
    format!("mock-{}-{}", generation, path.join("."))
}

/// Element at `path`, if the path still leads to one
fn resolve<'a>(document: &'a Html, path: &[usize]) -> Option<ElementRef<'a>> {
    let mut node = document.tree.root();
    for &index in path {
        node = node.children().nth(index)?;
    }
    ElementRef::wrap(node)
}

fn path_of(element: ElementRef<'_>) -> Vec<usize> {
    let mut path = Vec::new();
    let mut node = *element;
    while let Some(parent) = node.parent() {
        path.push(node.prev_siblings().count());
        node = parent;
    }
    path.reverse();
    path
}

/// Paths of the elements matching `selector` under `scope` (the whole document if `None`)
fn select_paths(
    html: &str,
    scope: Option<&[usize]>,
    selector: &Selector,
) -> Result<Vec<Vec<usize>>, Error> {
    let document = Html::parse_document(html);
    let scope = match scope {
        Some(path) => Some(resolve(&document, path).ok_or_else(|| {
            Error::stale_element(format!("no element at {:?}", path))
        })?),
        None => None,
    };

    let matches: Vec<ElementRef<'_>> = match selector {
        Selector::Css(css) => {
            let parsed = scraper::Selector::parse(css)
                .map_err(|e| Error::invalid_selector(format!("{}: {:?}", css, e)))?;
            match scope {
                Some(scope) => scope
                    .select(&parsed)
                    .filter(|element| element.id() != scope.id())
                    .collect(),
                None => document.select(&parsed).collect(),
            }
        }
        Selector::Text { tag, text } => {
            let wanted = normalize_space(text);
            let root = match scope {
                Some(scope) => *scope,
                None => document.tree.root(),
            };
            root.descendants()
                .skip(1)
                .filter_map(ElementRef::wrap)
                .filter(|element| element.value().name().eq_ignore_ascii_case(tag))
                .filter(|element| normalize_space(&element.text().collect::<String>()) == wanted)
                .collect()
        }
        Selector::Parent => scope
            .and_then(|scope| scope.parent())
            .and_then(ElementRef::wrap)
            .into_iter()
            .collect(),
        Selector::XPath(expression) => {
            return Err(Error::invalid_selector(format!(
                "XPath is not supported by the mock driver: {}",
                expression
            )))
        }
    };

    Ok(matches.into_iter().map(path_of).collect())
}

fn element_info(html: &str, path: &[usize]) -> Option<ElementInfo> {
    let document = Html::parse_document(html);
    let element = resolve(&document, path)?;

    Some(ElementInfo {
        tag: element.value().name().to_string(),
        text: normalize_space(&element.text().collect::<String>()),
        attributes: element
            .value()
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
        hidden: std::iter::successors(Some(element), |e| e.parent().and_then(ElementRef::wrap))
            .any(hides),
    })
}

/// Whether markup alone keeps `element` and its subtree from rendering
fn hides(element: ElementRef<'_>) -> bool {
    let value = element.value();
    if NON_RENDERED_TAGS.contains(&value.name()) || value.attr("hidden").is_some() {
        return true;
    }
    if value.name() == "input"
        && value
            .attr("type")
            .is_some_and(|kind| kind.eq_ignore_ascii_case("hidden"))
    {
        return true;
    }
    value.attr("style").is_some_and(|style| {
        let style: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        style.contains("display:none") || style.contains("visibility:hidden")
    })
}
