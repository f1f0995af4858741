//! Character whitelist applied to substituted voice transcripts.
//!
//! Drops conversational filler ("what is", "please") that survived
//! substitution. Letters are only kept when a run of them is exactly one
//! known name. Whitespace ends a run, so separate words never fuse into a
//! name.

use super::substitution::Marker;

/// Names a run of letters may spell.
const NAMES: &[&str] = &["sin", "cos", "tan", "log", "x"];

fn is_allowed_symbol(c: char) -> bool {
    c.is_ascii_digit()
        || matches!(c, '+' | '-' | '*' | '/' | '=' | '(' | ')' | '.' | 'π' | '√')
        || Marker::from_symbol(c).is_some()
}

fn flush(run: &mut String, out: &mut String) {
    if NAMES.contains(&run.as_str()) {
        out.push_str(run);
    }
    run.clear();
}

/// Remove everything that cannot be part of a calculator expression.
pub fn clean(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = String::new();

    for c in text.chars() {
        if c.is_ascii_alphabetic() {
            run.push(c.to_ascii_lowercase());
            continue;
        }
        flush(&mut run, &mut out);
        if is_allowed_symbol(c) {
            out.push(c);
        }
    }
    flush(&mut run, &mut out);

    out
}
