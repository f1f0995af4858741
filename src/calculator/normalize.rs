//! Rewriting passes from calculator-surface syntax into what the numeric
//! evaluator and the symbolic engine accept.
//!
//! The buffer may hold display-only tokens (`π`, `√`, `²`), `**` powers and
//! degree-based trig calls. Each backend needs its own spelling of those.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// Literal substituted for `π` in numeric evaluation.
pub const PI_LITERAL: &str = "3.14159265";

lazy_static! {
    /// A single-level trig call whose argument holds no parentheses.
    static ref TRIG_CALL: Regex = Regex::new(r"\b(sin|cos|tan)\(([^()]+)\)").unwrap();

    /// A square root applied directly to a number or constant.
    static ref SQRT_OF_ATOM: Regex = Regex::new(r"√(\d*\.?\d+|π|pi|x)").unwrap();

    /// A digit, point or closing parenthesis directly before `π` or `√`.
    static ref IMPLICIT_BEFORE: Regex = Regex::new(r"([\d.)])([π√])").unwrap();

    /// `π` directly before a digit or opening parenthesis.
    static ref IMPLICIT_AFTER_PI: Regex = Regex::new(r"π([\d(])").unwrap();

    /// A function name with an optional bare argument and opening parenthesis.
    static ref BARE_CALL: Regex = Regex::new(r"(sin|cos|tan|log)([\d.]+|x|π)?(\()?").unwrap();

    /// A digit directly before a letter or opening parenthesis (`2x`, `2(x+1)`).
    static ref IMPLICIT_PRODUCT: Regex = Regex::new(r"(\d)([a-zA-Z(])").unwrap();
}

/// Unmatched `(` minus `)`; negative when closers outnumber openers.
pub fn balance(expr: &str) -> i64 {
    expr.chars().fold(0, |acc, c| match c {
        '(' => acc + 1,
        ')' => acc - 1,
        _ => acc,
    })
}

/// Closing parentheses needed to balance `expr` (empty when balanced).
pub fn auto_close(expr: &str) -> String {
    let missing = usize::try_from(balance(expr)).unwrap_or(0);
    ")".repeat(missing)
}

/// Give spoken function calls their parentheses: `sin30` becomes `sin(30)`
/// and `sinx**2` becomes `sin(x)**2`. A name followed by anything else
/// opens a call that [`auto_close`] finishes later.
pub fn wrap_bare_calls(expr: &str) -> String {
    BARE_CALL
        .replace_all(expr, |caps: &Captures| {
            let name = &caps[1];
            let paren = caps.get(3).map_or("", |m| m.as_str());
            match caps.get(2) {
                Some(arg) => format!("{name}({}){paren}", arg.as_str()),
                None => format!("{name}("),
            }
        })
        .into_owned()
}

fn strip_common(expr: &str) -> String {
    expr.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .replace("math.", "")
        .replace('²', "**2")
}

/// Normalise an already auto-closed buffer for numeric evaluation.
///
/// Trig arguments are taken in degrees, `π` becomes [`PI_LITERAL`], `√`
/// becomes a `sqrt` call and `**` becomes the evaluator's `^`.
pub fn for_eval(expr: &str) -> String {
    let s = strip_common(expr);
    let s = IMPLICIT_BEFORE.replace_all(&s, "${1}*${2}");
    let s = IMPLICIT_AFTER_PI.replace_all(&s, "π*${1}");
    let s = SQRT_OF_ATOM.replace_all(&s, "sqrt(${1})");
    let s = s.replace('√', "sqrt").replace('π', PI_LITERAL);
    let s = TRIG_CALL.replace_all(&s, "${1}(radians(${2}))");
    s.replace("**", "^")
}

/// Normalise the raw buffer for the symbolic engine (variable `x`).
///
/// `π` stays exact as `pi`, caret powers become `**` and implicit products
/// get an explicit `*`.
pub fn for_symbolic(expr: &str) -> String {
    let s = strip_common(expr).replace('^', "**");
    let s = SQRT_OF_ATOM.replace_all(&s, "sqrt(${1})");
    let s = s.replace('√', "sqrt").replace('π', "pi");
    IMPLICIT_PRODUCT.replace_all(&s, "${1}*${2}").into_owned()
}
