//! Error taxonomy shared by the keypad and voice pipelines.

use thiserror::Error;

/// Failures surfaced to the user by a calculator operation.
///
/// Every variant is terminal for the operation that produced it; nothing is
/// retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    /// Numeric evaluation rejected the buffer. The buffer is cleared.
    #[error("Invalid Expression")]
    InvalidExpression(String),

    /// Calculus was requested on an empty buffer.
    #[error("Please enter an expression with variable 'x'")]
    MissingExpression,

    /// The symbolic engine rejected the buffer. The buffer is kept.
    #[error("Cannot perform calculus operation:\n{0}")]
    CalculusFailure(String),

    /// Voice capture produced nothing usable.
    #[error("Sorry, I didn't catch that.")]
    NoTranscript,
}

impl CalcError {
    /// Usage reminders are shown as warnings rather than errors.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::MissingExpression)
    }

    /// Short title for the notice shown to the user.
    pub fn title(&self) -> &'static str {
        if self.is_warning() { "Warning" } else { "Error" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_expression_is_warning() {
        assert!(CalcError::MissingExpression.is_warning());
        assert_eq!(CalcError::MissingExpression.title(), "Warning");
        assert!(!CalcError::NoTranscript.is_warning());
        assert_eq!(
            CalcError::InvalidExpression("1/0".into()).title(),
            "Error"
        );
    }

    #[test]
    fn test_calculus_failure_carries_engine_message() {
        let err = CalcError::CalculusFailure("unexpected ')'".into());
        assert!(err.to_string().ends_with("unexpected ')'"));
    }
}
