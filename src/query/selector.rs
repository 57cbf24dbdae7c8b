//! Selector predicates handed to drivers
//!
//! The query engine never looks inside a [`Selector`]; drivers decide how to evaluate it.

use std::fmt;

/// Locator expression evaluated against a search root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// CSS selector
    Css(String),
    /// XPath expression, relative to the search root
    XPath(String),
    /// Descendant `tag` whose whitespace-normalized text equals `text` exactly
    Text { tag: String, text: String },
    /// The parent node of the search root
    Parent,
}

impl Selector {
    /// CSS selector
    pub fn css<S: Into<String>>(selector: S) -> Self {
        Selector::Css(selector.into())
    }

    /// XPath expression
    pub fn xpath<S: Into<String>>(expression: S) -> Self {
        Selector::XPath(expression.into())
    }

    /// Exact normalized-text match under `tag`
    pub fn text<T: Into<String>, S: Into<String>>(tag: T, text: S) -> Self {
        Selector::Text {
            tag: tag.into(),
            text: text.into(),
        }
    }

    /// Parent axis
    pub fn parent() -> Self {
        Selector::Parent
    }

    /// XPath form of the structured selectors; `None` for CSS
    pub fn to_xpath(&self) -> Option<String> {
        match self {
            Selector::Css(_) => None,
            Selector::XPath(expression) => Some(expression.clone()),
            Selector::Text { tag, text } => Some(format!(
                ".//{}[normalize-space() = {}]",
                tag,
                xpath_literal(&normalize_space(text))
            )),
            Selector::Parent => Some("./..".to_string()),
        }
    }
}

impl From<&str> for Selector {
    fn from(selector: &str) -> Self {
        Selector::css(selector)
    }
}

impl From<String> for Selector {
    fn from(selector: String) -> Self {
        Selector::Css(selector)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Css(selector) => write!(f, "css={}", selector),
            Selector::XPath(expression) => write!(f, "xpath={}", expression),
            Selector::Text { tag, text } => write!(f, "text={}:{:?}", tag, text),
            Selector::Parent => f.write_str("parent"),
        }
    }
}

/// Quote `value` as an XPath string literal
///
/// XPath 1.0 has no escape sequences, so values holding both quote kinds go through `concat()`.
pub(crate) fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{}'", value);
    }
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }

    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{}'", part))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

/// Collapse runs of whitespace and trim, like XPath `normalize-space()`
pub(crate) fn normalize_space(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
