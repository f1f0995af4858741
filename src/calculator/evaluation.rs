//! Numeric evaluation using fasteval.
//!
//! Wraps fasteval to evaluate the calculator buffer and format the result
//! so it can replace the buffer and be evaluated again.

use super::normalize::{auto_close, for_eval};
use crate::error::CalcError;
use tracing::debug;

/// Decimal places kept in numeric results unless configured otherwise.
pub const DEFAULT_PRECISION: u32 = 8;

/// A successful numeric evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    /// The buffer as entered.
    pub expression: String,
    /// What was handed to the evaluator.
    pub normalized: String,
    /// The rounded value.
    pub value: f64,
    /// The value formatted as new buffer content.
    pub result: String,
}

/// Functions the calculator offers beyond fasteval's builtins.
fn extra_functions(name: &str, args: Vec<f64>) -> Option<f64> {
    match (name, args.as_slice()) {
        ("radians", [degrees]) => Some(degrees.to_radians()),
        ("sqrt", [value]) => Some(value.sqrt()),
        _ => None,
    }
}

/// Evaluate the calculator buffer numerically.
///
/// Open parentheses are closed, trig arguments are read as degrees and the
/// result is rounded to `precision` decimal places. Any failure, including a
/// non-finite result, is an [`CalcError::InvalidExpression`].
pub fn evaluate_expression(buffer: &str, precision: u32) -> Result<Evaluation, CalcError> {
    let expression = buffer.trim().to_string();
    let closed = format!("{}{}", expression, auto_close(&expression));
    let normalized = for_eval(&closed);
    debug!(%expression, %normalized, "evaluating");

    let mut namespace = |name: &str, args: Vec<f64>| extra_functions(name, args);
    let raw = fasteval::ez_eval(&normalized, &mut namespace)
        .map_err(|e| CalcError::InvalidExpression(format!("{}: {:?}", normalized, e)))?;

    if !raw.is_finite() {
        return Err(CalcError::InvalidExpression(format!(
            "{} evaluates to {}",
            normalized, raw
        )));
    }

    let value = round_to(raw, precision);
    Ok(Evaluation {
        expression,
        normalized,
        result: format_result(value, precision),
        value,
    })
}

/// Round half away from zero to `places` decimals.
fn round_to(value: f64, places: u32) -> f64 {
    let scale = 10f64.powi(places as i32);
    let scaled = (value * scale).round() / scale;
    if scaled.is_finite() { scaled } else { value }
}

/// Format a number as buffer text: integers without a fractional part,
/// decimals without trailing zeros.
pub fn format_result(value: f64, precision: u32) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let formatted = format!("{:.*}", precision as usize, value);
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}
