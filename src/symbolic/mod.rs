//! Small computer-algebra engine used for the calculus buttons.
//!
//! This module provides:
//! - Parsing calculator notation into an exact expression tree
//! - Differentiation and indefinite integration with respect to one variable
//! - Rendering results in conventional CAS notation

mod diff;
mod display;
mod expr;
mod integrate;
mod parser;

pub use diff::differentiate;
pub use expr::{Constant, Expr, Func, Rational, approximate};
pub use integrate::integrate;
pub use parser::parse;

use thiserror::Error;

/// Errors reported by the symbolic engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolicError {
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("function '{0}' requires an argument")]
    MissingArgument(String),
    #[error("unknown symbol '{0}'")]
    UnknownSymbol(String),
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("cannot integrate {0}")]
    NotIntegrable(String),
}
