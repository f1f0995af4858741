//! Calculator core shared by the keypad and the voice front-end.
//!
//! This module provides functionality to:
//! - Translate spoken phrases into calculator tokens and filter the result
//! - Normalise the buffer for numeric evaluation or symbolic manipulation
//! - Evaluate expressions with fasteval and run derivatives/integrals
//! - Copy results to the clipboard

pub mod calculus;
mod clipboard;
pub mod evaluation;
pub mod normalize;
pub mod substitution;
pub mod whitelist;

pub use calculus::{INTEGRATION_CONSTANT, Operation, VARIABLE, calculate};
pub use clipboard::copy_to_clipboard;
pub use evaluation::{DEFAULT_PRECISION, Evaluation, evaluate_expression};
pub use substitution::{Marker, substitute};
pub use whitelist::clean;

/// Run the voice text pipeline: lowercase, substitute phrases, filter, then
/// parenthesise bare function arguments.
///
/// An empty result means nothing recognisable was said.
pub fn parse_voice_command(transcript: &str) -> String {
    let lowered = transcript.trim().to_lowercase();
    normalize::wrap_bare_calls(&clean(&substitute(&lowered)))
}
