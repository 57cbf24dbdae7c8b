//! Query builder
//!
//! A [`Finder`] collects a search root, exactly one selector and a visibility filter, then a
//! terminal operation hands them to the polling executor together with the expected
//! cardinality.
//!
//! The selector slot is tracked in the type: terminal operations only exist once a selector
//! is attached, and a selector can only be attached once.
//!
//! ```rust,no_run
//! use oxide_finder::{Config, Findable, Session};
//!
//! # async fn example() -> oxide_finder::Result<()> {
//! let session = Session::new(Config::default());
//! let items = session.find().by_selector(".item").displayed().all(2).await?;
//! assert_eq!(items.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! A query without a selector does not compile:
//!
//! ```rust,compile_fail
//! use oxide_finder::{Config, Findable, Session};
//!
//! # async fn example() -> oxide_finder::Result<()> {
//! let session = Session::new(Config::default());
//! let item = session.find().one().await?;
//! # Ok(())
//! # }
//! ```
//!
//! Neither does attaching a second selector:
//!
//! ```rust,compile_fail
//! use oxide_finder::{Config, Findable, Session};
//!
//! # async fn example() -> oxide_finder::Result<()> {
//! let session = Session::new(Config::default());
//! let item = session.find().by_selector("a").by_selector("b").one().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use super::element::Element;
use super::executor::PollingExecutor;
use super::range::Range;
use super::selector::Selector;
use super::visibility::Visibility;
use crate::session::{NativeElement, Session};
use crate::{Error, Result};

/// Where a query searches
#[derive(Debug, Clone)]
pub enum SearchRoot {
    /// The whole document of the session's current page
    Page,
    /// Descendants of an element
    Element(Arc<dyn NativeElement>),
}

/// Selector slot not filled yet
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbound;

/// Selector slot filled
#[derive(Debug, Clone)]
pub struct Bound(Selector);

/// Query builder
#[must_use]
#[derive(Debug, Clone)]
pub struct Finder<S = Unbound> {
    session: Session,
    root: SearchRoot,
    selector: S,
    visibility: Visibility,
}

impl Finder<Unbound> {
    /// Create a builder searching under `root`
    pub fn new(session: Session, root: SearchRoot) -> Self {
        Self {
            session,
            root,
            selector: Unbound,
            visibility: Visibility::All,
        }
    }

    /// Search under `element` instead of the current root
    pub fn within(mut self, element: &Element) -> Self {
        self.root = SearchRoot::Element(element.native().clone());
        self
    }

    /// Attach the selector
    pub fn by<T: Into<Selector>>(self, selector: T) -> Finder<Bound> {
        Finder {
            session: self.session,
            root: self.root,
            selector: Bound(selector.into()),
            visibility: self.visibility,
        }
    }

    /// Attach a CSS selector
    pub fn by_selector(self, css: &str) -> Finder<Bound> {
        self.by(Selector::css(css))
    }

    /// Attach an XPath selector
    pub fn by_xpath(self, expression: &str) -> Finder<Bound> {
        self.by(Selector::xpath(expression))
    }

    /// Attach an exact normalized-text selector for `tag`
    pub fn by_text(self, tag: &str, text: &str) -> Finder<Bound> {
        self.by(Selector::text(tag, text))
    }
}

impl<S> Finder<S> {
    /// Keep only displayed elements
    pub fn displayed(mut self) -> Self {
        self.visibility = Visibility::Displayed;
        self
    }

    /// Keep only hidden elements
    pub fn hidden(mut self) -> Self {
        self.visibility = Visibility::Hidden;
        self
    }

    /// Set the visibility filter
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn root(&self) -> &SearchRoot {
        &self.root
    }

    pub fn visibility_filter(&self) -> Visibility {
        self.visibility
    }
}

impl Finder<Bound> {
    pub fn selector(&self) -> &Selector {
        &self.selector.0
    }

    /// Elements whose count satisfies `size`; a bare number means exactly that many
    pub async fn all<R: Into<Range>>(self, size: R) -> Result<Vec<Element>> {
        PollingExecutor::new(&self.session)
            .await
            .find_all(&self.root, &self.selector.0, size.into(), self.visibility)
            .await
    }

    /// At least `min` elements
    pub async fn min(self, min: usize) -> Result<Vec<Element>> {
        self.all(Range::at_least(min)).await
    }

    /// At most `max` elements
    pub async fn max(self, max: usize) -> Result<Vec<Element>> {
        self.all(Range::at_most(max)).await
    }

    /// One or more elements
    pub async fn at_least_one(self) -> Result<Vec<Element>> {
        self.min(1).await
    }

    /// Exactly one element
    pub async fn one(self) -> Result<Element> {
        self.all(1)
            .await?
            .pop()
            .ok_or_else(|| Error::internal("selection of one element returned nothing"))
    }

    /// Exactly zero elements
    pub async fn none(self) -> Result<()> {
        self.all(0).await?;
        Ok(())
    }
}
