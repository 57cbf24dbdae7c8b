//! Entry point for queries on a session or an element

use async_trait::async_trait;

use super::element::Element;
use super::finder::{Bound, Finder};
use super::range::Range;
use super::selector::Selector;
use super::visibility::Visibility;
use crate::Result;

/// Tag whose text identifies a form field in label-relative lookups
const LABEL_TAG: &str = "label";

/// Something queries can start from
#[async_trait]
pub trait Findable: Send + Sync {
    /// Fresh query builder rooted here
    fn find(&self) -> Finder;

    /// Builder with a CSS selector attached
    fn find_selector(&self, css: &str) -> Finder<Bound> {
        self.find().by_selector(css)
    }

    /// Builder with `selector` attached
    fn find_by(&self, selector: Selector) -> Finder<Bound> {
        self.find().by(selector)
    }

    /// Exactly `size` elements matching `css`
    async fn find_all<R>(&self, css: &str, size: R) -> Result<Vec<Element>>
    where
        R: Into<Range> + Send,
    {
        self.find_selector(css).all(size).await
    }

    /// Elements matching `selector` and `visibility`, count within `size`
    async fn find_all_with<R>(
        &self,
        selector: Selector,
        size: R,
        visibility: Visibility,
    ) -> Result<Vec<Element>>
    where
        R: Into<Range> + Send,
    {
        self.find_by(selector).visibility(visibility).all(size).await
    }

    /// Single element matching `css` next to the displayed label reading `label`
    ///
    /// The label's parent is the scope for `css`.
    async fn find_by_label(&self, label: &str, css: &str) -> Result<Element> {
        let label = self.find().by_text(LABEL_TAG, label).displayed().one().await?;
        label.parent().await?.find_selector(css).one().await
    }

    /// Elements matching `css` next to the displayed label reading `label`
    async fn find_all_by_label<R>(&self, label: &str, css: &str, size: R) -> Result<Vec<Element>>
    where
        R: Into<Range> + Send,
    {
        let label = self.find().by_text(LABEL_TAG, label).displayed().one().await?;
        label.parent().await?.find_selector(css).all(size).await
    }
}
