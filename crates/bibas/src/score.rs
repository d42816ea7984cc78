//! The BIBAS score value.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Upper bound of the score scale.
pub const MAX_SCORE: f64 = 100.0;

/// A BIBAS score: a value in `[0, 100]`, or undefined with the reason.
///
/// Undefined is never conflated with zero. A zero score means "no shift";
/// an undefined one means "could not be computed".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Score {
    Defined(f64),
    Undefined(String),
}

impl Score {
    pub fn undefined(reason: impl Into<String>) -> Self {
        Score::Undefined(reason.into())
    }

    /// The numeric score, if defined.
    pub fn value(&self) -> Option<f64> {
        match self {
            Score::Defined(v) => Some(*v),
            Score::Undefined(_) => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Score::Defined(_))
    }

    /// Why the score could not be computed.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Score::Defined(_) => None,
            Score::Undefined(reason) => Some(reason),
        }
    }

    /// Sort key where undefined counts as negative infinity.
    pub fn sort_key(&self) -> f64 {
        self.value().unwrap_or(f64::NEG_INFINITY)
    }

    /// Descending order with undefined last.
    pub fn cmp_desc(&self, other: &Score) -> Ordering {
        other.sort_key().total_cmp(&self.sort_key())
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Defined(v) => write!(f, "{v:.2}"),
            Score::Undefined(_) => f.write_str("undefined"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_is_not_zero() {
        let zero = Score::Defined(0.0);
        let undefined = Score::undefined("engine failed");
        assert_ne!(zero, undefined);
        assert_eq!(zero.value(), Some(0.0));
        assert_eq!(undefined.value(), None);
        assert_eq!(undefined.reason(), Some("engine failed"));
    }

    #[test]
    fn test_descending_order_undefined_last() {
        let mut scores = vec![
            Score::Defined(3.0),
            Score::undefined("x"),
            Score::Defined(40.0),
            Score::Defined(0.0),
        ];
        scores.sort_by(Score::cmp_desc);
        assert_eq!(scores[0], Score::Defined(40.0));
        assert_eq!(scores[2], Score::Defined(0.0));
        assert!(!scores[3].is_defined());
    }

    #[test]
    fn test_display() {
        assert_eq!(Score::Defined(40.0).to_string(), "40.00");
        assert_eq!(Score::undefined("x").to_string(), "undefined");
    }

    #[test]
    fn test_serialized_form_distinguishes_undefined() {
        let json = serde_json::to_string(&Score::undefined("no cpd")).unwrap();
        assert_eq!(json, r#"{"undefined":"no cpd"}"#);
        let json = serde_json::to_string(&Score::Defined(1.5)).unwrap();
        assert_eq!(json, r#"{"defined":1.5}"#);
    }
}
