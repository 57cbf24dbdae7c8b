//! Element query layer
//!
//! Queries are built with [`Findable::find`] on a [`Session`](crate::Session) or an
//! [`Element`], given exactly one [`Selector`] and optionally a [`Visibility`] filter, and
//! finished by a terminal operation naming the expected cardinality. Every terminal operation
//! waits for the page to be ready and then for the cardinality to hold, failing with a
//! [`SelectionReport`] when it does not.

mod element;
mod executor;
mod findable;
mod finder;
mod range;
mod report;
mod selector;
mod visibility;
mod wait;


pub use element::Element;
pub use findable::Findable;
pub use finder::{Bound, Finder, SearchRoot, Unbound};
pub use range::Range;
pub use report::SelectionReport;
pub use selector::Selector;
pub use visibility::{filter, Visibility};

pub(crate) use executor::PollingExecutor;
pub(crate) use selector::normalize_space;
