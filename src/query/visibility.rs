//! Visibility post-filter applied after a raw element fetch

use super::element::Element;
use crate::Result;
use std::fmt;

/// Which elements of a fetch are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Keep every element
    #[default]
    All,
    /// Keep only rendered elements that occupy layout
    Displayed,
    /// Keep only elements that are not displayed
    Hidden,
}

impl Visibility {
    /// Whether an element with the given display state passes the filter
    pub fn matches(self, displayed: bool) -> bool {
        match self {
            Visibility::All => true,
            Visibility::Displayed => displayed,
            Visibility::Hidden => !displayed,
        }
    }

    /// Qualifier used in diagnostics; empty for `All`
    pub fn qualifier(self) -> &'static str {
        match self {
            Visibility::All => "",
            Visibility::Displayed => "displayed",
            Visibility::Hidden => "hidden",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.qualifier())
    }
}

/// Keep the elements matching `visibility`, preserving order
pub async fn filter(elements: Vec<Element>, visibility: Visibility) -> Result<Vec<Element>> {
    if visibility == Visibility::All {
        return Ok(elements);
    }

    let mut kept = Vec::with_capacity(elements.len());
    for element in elements {
        if visibility.matches(element.is_displayed().await?) {
            kept.push(element);
        }
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_table() {
        assert!(Visibility::All.matches(true));
        assert!(Visibility::All.matches(false));
        assert!(Visibility::Displayed.matches(true));
        assert!(!Visibility::Displayed.matches(false));
        assert!(!Visibility::Hidden.matches(true));
        assert!(Visibility::Hidden.matches(false));
    }

    #[test]
    fn test_displayed_and_hidden_are_complementary() {
        for displayed in [true, false] {
            assert_ne!(
                Visibility::Displayed.matches(displayed),
                Visibility::Hidden.matches(displayed)
            );
        }
    }

    #[test]
    fn test_qualifier() {
        assert_eq!(Visibility::default(), Visibility::All);
        assert_eq!(Visibility::All.to_string(), "");
        assert_eq!(Visibility::Displayed.to_string(), "displayed");
        assert_eq!(Visibility::Hidden.to_string(), "hidden");
    }
}
