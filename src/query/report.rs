//! Diagnostics attached to failed selections

use super::{Range, Visibility};
use std::fmt;

/// What a query expected and what the page actually held
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionReport {
    expected: Range,
    visibility: Visibility,
    total: usize,
    displayed: usize,
    hidden: usize,
}

impl SelectionReport {
    pub fn new(
        expected: Range,
        visibility: Visibility,
        total: usize,
        displayed: usize,
        hidden: usize,
    ) -> Self {
        Self {
            expected,
            visibility,
            total,
            displayed,
            hidden,
        }
    }

    pub fn expected(&self) -> Range {
        self.expected
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn displayed(&self) -> usize {
        self.displayed
    }

    pub fn hidden(&self) -> usize {
        self.hidden
    }
}

impl fmt::Display for SelectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Waited for {} {} elements but was: {} total elements ({} displayed and {} hidden)",
            self.expected, self.visibility, self.total, self.displayed, self.hidden
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_with_qualifier() {
        let report = SelectionReport::new(Range::exact(2), Visibility::Displayed, 3, 1, 2);
        assert_eq!(
            report.to_string(),
            "Waited for 2 displayed elements but was: 3 total elements (1 displayed and 2 hidden)"
        );
    }

    #[test]
    fn test_message_for_all_keeps_empty_qualifier() {
        let report = SelectionReport::new(Range::at_least(1), Visibility::All, 0, 0, 0);
        assert_eq!(
            report.to_string(),
            "Waited for 1..  elements but was: 0 total elements (0 displayed and 0 hidden)"
        );
    }
}
