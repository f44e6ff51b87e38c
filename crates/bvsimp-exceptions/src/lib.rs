// SPDX-License-Identifier: AGPL-3.0

//! Error types shared across the bvsimp workspace.
//!
//! Only *recoverable* conditions live here: asking a symbolic term for its
//! concrete value, evaluating a term with an unbound variable, and so on.
//! Malformed rewriter input (wrong arity, out-of-range extract bounds,
//! mismatched operand widths) is a contract violation by the caller and is
//! handled with assertions, never with these types.

use thiserror::Error;

/// Errors raised while inspecting or evaluating terms.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimpException {
    /// The term is not a numeral leaf.
    #[error("Value is not a numeral: {0}")]
    NotNumeral(String),

    /// The concrete value does not fit the requested machine type.
    #[error("Value does not fit in target type: {0}")]
    ValueTooLarge(String),

    /// Evaluation reached a variable with no assignment.
    #[error("Unbound variable: {0}")]
    UnboundVariable(String),

    /// Evaluation reached an uninterpreted operator (e.g. a divide-by-zero
    /// witness), which has no fixed semantics.
    #[error("Uninterpreted operator: {0}")]
    Uninterpreted(String),

    /// Unexpected internal condition.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for bvsimp operations.
pub type SimpResult<T> = Result<T, SimpException>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = SimpException::NotNumeral("x".to_string());
        assert_eq!(err.to_string(), "Value is not a numeral: x");

        let err = SimpException::UnboundVariable("y@8".to_string());
        assert_eq!(err.to_string(), "Unbound variable: y@8");
    }

    #[test]
    fn test_result_alias() {
        fn fails() -> SimpResult<u64> {
            Err(SimpException::ValueTooLarge("2^65".to_string()))
        }
        assert!(fails().is_err());
    }
}
