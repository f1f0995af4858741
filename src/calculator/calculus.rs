//! Derivative and integral of the calculator buffer with respect to `x`.

use super::normalize::for_symbolic;
use crate::error::CalcError;
use crate::symbolic::{self, SymbolicError};
use tracing::debug;

/// The single free variable of calculus operations.
pub const VARIABLE: &str = "x";

/// Appended to every indefinite integral.
pub const INTEGRATION_CONSTANT: &str = " + C";

/// Calculus operation requested from the keypad or by voice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Differentiate,
    Integrate,
}

impl Operation {
    /// Name used in spoken feedback ("The derivative is ...").
    pub fn noun(self) -> &'static str {
        match self {
            Self::Differentiate => "derivative",
            Self::Integrate => "integral",
        }
    }
}

fn engine_failure(err: SymbolicError) -> CalcError {
    CalcError::CalculusFailure(err.to_string())
}

/// Apply `op` to `buffer` and return the new buffer text.
///
/// An empty buffer is a [`CalcError::MissingExpression`]; anything the engine
/// rejects is a [`CalcError::CalculusFailure`] carrying the engine's message.
pub fn calculate(buffer: &str, op: Operation) -> Result<String, CalcError> {
    if buffer.trim().is_empty() {
        return Err(CalcError::MissingExpression);
    }

    let normalized = for_symbolic(buffer);
    debug!(%normalized, ?op, "symbolic input");
    let expr = symbolic::parse(&normalized).map_err(engine_failure)?;

    match op {
        Operation::Differentiate => Ok(symbolic::differentiate(&expr, VARIABLE).to_string()),
        Operation::Integrate => {
            let antiderivative = symbolic::integrate(&expr, VARIABLE).map_err(engine_failure)?;
            Ok(format!("{}{}", antiderivative, INTEGRATION_CONSTANT))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_differentiate_square() {
        assert_eq!(calculate("x**2", Operation::Differentiate).unwrap(), "2*x");
    }

    #[test]
    fn test_integrate_adds_constant() {
        assert_eq!(calculate("x", Operation::Integrate).unwrap(), "x**2/2 + C");
    }

    #[test]
    fn test_empty_buffer_is_missing_expression() {
        assert_eq!(
            calculate("", Operation::Differentiate),
            Err(CalcError::MissingExpression)
        );
        assert_eq!(
            calculate("   ", Operation::Integrate),
            Err(CalcError::MissingExpression)
        );
    }

    #[test]
    fn test_surface_notation_is_accepted() {
        assert_eq!(calculate("3x²", Operation::Differentiate).unwrap(), "6*x");
        assert_eq!(calculate("2(x+1)", Operation::Integrate).unwrap(), "x**2 + 2*x + C");
        assert_eq!(calculate("π*x^2", Operation::Differentiate).unwrap(), "2*pi*x");
    }

    #[test]
    fn test_extreme_coefficients_do_not_panic() {
        let result = calculate("(-9223372036854775807-1)*x**2", Operation::Integrate);
        if let Ok(text) = result {
            assert!(text.starts_with("-9223372036854775808"), "{text}");
        }
        assert!(calculate("(-9223372036854775807-1)**(-1)*x", Operation::Differentiate).is_ok());
    }

    #[test]
    fn test_glued_function_names_fail() {
        assert!(matches!(
            calculate("sinx", Operation::Differentiate),
            Err(CalcError::CalculusFailure(_))
        ));
    }

    #[test]
    fn test_unparseable_buffer_fails() {
        assert!(calculate("sin(x", Operation::Differentiate).is_err());
        assert!(calculate("x+", Operation::Integrate).is_err());
    }

    #[test]
    fn test_previous_integral_can_be_differentiated() {
        let integral = calculate("x", Operation::Integrate).unwrap();
        assert_eq!(calculate(&integral, Operation::Differentiate).unwrap(), "x");
    }

    #[test]
    fn test_engine_message_is_carried() {
        match calculate("x*sin(x)", Operation::Integrate) {
            Err(CalcError::CalculusFailure(msg)) => assert!(msg.contains("cannot integrate")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
