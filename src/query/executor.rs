//! Polling query executor
//!
//! Runs a query through the two-phase wait: page readiness first, then the element
//! condition (optionally checked twice back-to-back), then one final fetch validated against
//! the expected range.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use super::element::Element;
use super::finder::SearchRoot;
use super::range::Range;
use super::report::SelectionReport;
use super::selector::Selector;
use super::visibility::{self, Visibility};
use super::wait::poll_until;
use crate::session::{NativeElement, Session};
use crate::{Error, Result};

/// Document state the readiness wait is waiting for
const READY_STATE_COMPLETE: &str = "complete";

/// Executes queries against one session
pub(crate) struct PollingExecutor<'a> {
    session: &'a Session,
    timeout: Duration,
    poll_interval: Duration,
    stability_recheck: bool,
}

impl<'a> PollingExecutor<'a> {
    /// Create an executor using the session's current timeout
    pub(crate) async fn new(session: &'a Session) -> Self {
        let config = session.config();
        Self {
            session,
            timeout: session.timeout().await,
            poll_interval: config.poll_interval(),
            stability_recheck: config.stability_recheck,
        }
    }

    /// Wait for `range` elements and return them
    #[instrument(skip(self, root, selector, range), fields(selector = %selector, range = %range))]
    pub(crate) async fn find_all(
        &self,
        root: &SearchRoot,
        selector: &Selector,
        range: Range,
        visibility: Visibility,
    ) -> Result<Vec<Element>> {
        self.wait_for_page().await?;
        self.wait_for_elements(root, selector, range, visibility).await?;
        if self.stability_recheck {
            self.wait_for_elements(root, selector, range, visibility).await?;
        }

        let elements = self.fetch(root, selector, visibility).await?;
        if !range.contains(elements.len()) {
            let report = self.report(root, selector, range, visibility).await?;
            warn!("Selection changed after the wait: {}", report);
            return Err(Error::Selection(report));
        }

        debug!("Found {} elements", elements.len());
        Ok(elements)
    }

    /// Poll until the document reports `complete`
    ///
    /// Transient errors and a JavaScript context torn down by navigation count as "not ready
    /// yet"; any other driver error is returned at once.
    #[instrument(skip(self))]
    pub(crate) async fn wait_for_page(&self) -> Result<()> {
        let driver = self.session.driver().await?;
        let driver = &driver;

        let ready = poll_until(self.timeout, self.poll_interval, move || async move {
            match driver.ready_state().await {
                Ok(state) => Ok(state == READY_STATE_COMPLETE),
                Err(e) if e.is_context_lost() => {
                    debug!("Ready state unavailable: {}", e);
                    Ok(false)
                }
                Err(e) => Err(e),
            }
        })
        .await?;

        if ready {
            Ok(())
        } else {
            Err(Error::ReadinessTimeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            })
        }
    }

    /// Poll until the filtered element count lies within `range`
    async fn wait_for_elements(
        &self,
        root: &SearchRoot,
        selector: &Selector,
        range: Range,
        visibility: Visibility,
    ) -> Result<()> {
        let met = poll_until(self.timeout, self.poll_interval, move || async move {
            let elements = self.fetch(root, selector, visibility).await?;
            Ok(range.contains(elements.len()))
        })
        .await?;

        if met {
            return Ok(());
        }

        let report = self.report(root, selector, range, visibility).await?;
        debug!("Condition not met within {:?}: {}", self.timeout, report);
        Err(Error::ConditionTimeout(report))
    }

    /// One raw fetch, decorated and filtered
    async fn fetch(
        &self,
        root: &SearchRoot,
        selector: &Selector,
        visibility: Visibility,
    ) -> Result<Vec<Element>> {
        let elements = self
            .raw(root, selector)
            .await?
            .into_iter()
            .map(|native| Element::new(native, self.session.clone()))
            .collect();

        visibility::filter(elements, visibility).await
    }

    async fn raw(&self, root: &SearchRoot, selector: &Selector) -> Result<Vec<Arc<dyn NativeElement>>> {
        match root {
            SearchRoot::Page => self.session.driver().await?.find_elements(selector).await,
            SearchRoot::Element(element) => element.find_elements(selector).await,
        }
    }

    /// Diagnostics from a fresh, unfiltered fetch
    ///
    /// Elements that vanish while being inspected are left out of every count.
    async fn report(
        &self,
        root: &SearchRoot,
        selector: &Selector,
        range: Range,
        visibility: Visibility,
    ) -> Result<SelectionReport> {
        let elements = match self.raw(root, selector).await {
            Ok(elements) => elements,
            Err(e) if e.is_transient() => Vec::new(),
            Err(e) => return Err(e),
        };

        let (mut displayed, mut hidden) = (0, 0);
        for element in &elements {
            match element.is_displayed().await {
                Ok(true) => displayed += 1,
                Ok(false) => hidden += 1,
                Err(e) if e.is_transient() => {}
                Err(e) => return Err(e),
            }
        }

        Ok(SelectionReport::new(
            range,
            visibility,
            displayed + hidden,
            displayed,
            hidden,
        ))
    }
}
