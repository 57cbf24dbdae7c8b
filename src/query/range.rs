//! Cardinality range expected from a query

use crate::{Error, Result};
use std::fmt;

/// Inclusive `[min, max]` bound on the number of matched elements
///
/// `max == usize::MAX` stands for "unbounded".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    min: usize,
    max: usize,
}

impl Range {
    /// Create a range, failing when `min > max`
    pub fn new(min: usize, max: usize) -> Result<Self> {
        if min > max {
            return Err(Error::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Exactly `n` elements
    pub const fn exact(n: usize) -> Self {
        Self { min: n, max: n }
    }

    /// At least `n` elements
    pub const fn at_least(n: usize) -> Self {
        Self { min: n, max: usize::MAX }
    }

    /// At most `n` elements
    pub const fn at_most(n: usize) -> Self {
        Self { min: 0, max: n }
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn is_unbounded(&self) -> bool {
        self.max == usize::MAX
    }

    /// Whether `n` lies within the range
    pub fn contains(&self, n: usize) -> bool {
        self.min <= n && n <= self.max
    }
}

impl From<usize> for Range {
    fn from(n: usize) -> Self {
        Range::exact(n)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else if self.is_unbounded() {
            write!(f, "{}..", self.min)
        } else {
            write!(f, "{}..{}", self.min, self.max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_contains_only_n() {
        for n in [0usize, 1, 2, 7, 100] {
            let range = Range::exact(n);
            assert!(range.contains(n));
            assert!(!range.contains(n + 1));
            if n > 0 {
                assert!(!range.contains(n - 1));
            }
        }
    }

    #[test]
    fn test_new_contains_iff_between() {
        let range = Range::new(2, 5).unwrap();
        for x in 0..10 {
            assert_eq!(range.contains(x), (2..=5).contains(&x), "x = {}", x);
        }
    }

    #[test]
    fn test_new_rejects_inverted_bounds() {
        let result = Range::new(3, 2);
        assert!(matches!(result, Err(Error::InvalidRange { min: 3, max: 2 })));
    }

    #[test]
    fn test_new_accepts_zero_and_unbounded() {
        let range = Range::new(0, usize::MAX).unwrap();
        assert!(range.contains(0));
        assert!(range.contains(usize::MAX));
        assert!(range.is_unbounded());
    }

    #[test]
    fn test_factories() {
        assert_eq!(Range::at_least(1), Range::new(1, usize::MAX).unwrap());
        assert_eq!(Range::at_most(4), Range::new(0, 4).unwrap());
        assert_eq!(Range::from(3), Range::exact(3));
        assert!(!Range::at_least(1).contains(0));
        assert!(Range::at_most(4).contains(0));
        assert!(!Range::at_most(4).contains(5));
    }

    #[test]
    fn test_display() {
        assert_eq!(Range::exact(2).to_string(), "2");
        assert_eq!(Range::at_least(1).to_string(), "1..");
        assert_eq!(Range::at_most(3).to_string(), "0..3");
        assert_eq!(Range::new(2, 4).unwrap().to_string(), "2..4");
    }
}
