//! Element handle returned by queries
//!
//! Wraps a native element reference together with the session it came from, so that nested
//! queries run through the same wait protocol.

use std::fmt;
use std::sync::Arc;

use super::findable::Findable;
use super::finder::{Finder, SearchRoot};
use super::selector::Selector;
use crate::session::{BoundingBox, NativeElement, Session};
use crate::{Error, Result};

/// Element handle
#[derive(Clone)]
pub struct Element {
    native: Arc<dyn NativeElement>,
    session: Session,
}

impl Element {
    /// Wrap a native element
    pub fn new(native: Arc<dyn NativeElement>, session: Session) -> Self {
        Self { native, session }
    }

    /// The wrapped native element
    pub fn native(&self) -> &Arc<dyn NativeElement> {
        &self.native
    }

    /// The owning session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Parent element
    ///
    /// Single lookup, no waiting: a parent exists as long as the element does.
    pub async fn parent(&self) -> Result<Element> {
        let mut parents = self.native.find_elements(&Selector::Parent).await?;
        if parents.is_empty() {
            return Err(Error::element_not_found(format!(
                "parent of element {}",
                self.native.id()
            )));
        }
        Ok(Element::new(parents.swap_remove(0), self.session.clone()))
    }

    /// Current value of a form control
    pub async fn value(&self) -> Result<Option<String>> {
        match self.native.property("value").await? {
            Some(value) => Ok(Some(value)),
            None => self.native.attribute("value").await,
        }
    }

    pub fn id(&self) -> &str {
        self.native.id()
    }

    pub async fn text(&self) -> Result<String> {
        self.native.text().await
    }

    pub async fn tag_name(&self) -> Result<String> {
        self.native.tag_name().await
    }

    pub async fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.native.attribute(name).await
    }

    pub async fn property(&self, name: &str) -> Result<Option<String>> {
        self.native.property(name).await
    }

    pub async fn click(&self) -> Result<()> {
        self.native.click().await
    }

    pub async fn send_keys(&self, text: &str) -> Result<()> {
        self.native.send_keys(text).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.native.clear().await
    }

    pub async fn is_displayed(&self) -> Result<bool> {
        self.native.is_displayed().await
    }

    pub async fn is_enabled(&self) -> Result<bool> {
        self.native.is_enabled().await
    }

    pub async fn is_selected(&self) -> Result<bool> {
        self.native.is_selected().await
    }

    pub async fn bounding_box(&self) -> Result<BoundingBox> {
        self.native.bounding_box().await
    }

    pub async fn scroll_into_view(&self) -> Result<()> {
        self.native.scroll_into_view().await
    }
}

impl Findable for Element {
    fn find(&self) -> Finder {
        Finder::new(self.session.clone(), SearchRoot::Element(self.native.clone()))
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element").field("native", &self.native).finish()
    }
}
