//! Spoken-phrase to calculator-token substitution.
//!
//! The table is an ordered rule list. Matching works on whole words: at each
//! position of the transcript the first rule whose phrase matches wins, so a
//! phrase that extends another (e.g. "open parenthesis" vs "open paren") must
//! be listed first. `test_longer_phrases_come_first` enforces that ordering.

/// Commands recognised in a transcript that are not part of the expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    Derivative,
    Integral,
    Clear,
}

impl Marker {
    /// Reserved character standing for this marker in a cleaned transcript.
    pub const fn symbol(self) -> char {
        match self {
            Self::Derivative => '∂',
            Self::Integral => '∫',
            Self::Clear => '⌧',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        [Self::Derivative, Self::Integral, Self::Clear]
            .into_iter()
            .find(|m| m.symbol() == c)
    }
}

/// Replacement produced by a substitution rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token {
    /// Text inserted verbatim into the expression.
    Text(&'static str),
    /// A command marker.
    Marker(Marker),
}

impl Token {
    fn push_to(self, out: &mut String) {
        match self {
            Token::Text(text) => out.push_str(text),
            Token::Marker(marker) => out.push(marker.symbol()),
        }
    }
}

/// A single phrase rule.
pub struct Rule {
    pub phrase: &'static str,
    pub token: Token,
}

const fn text(phrase: &'static str, value: &'static str) -> Rule {
    Rule {
        phrase,
        token: Token::Text(value),
    }
}

const fn marker(phrase: &'static str, value: Marker) -> Rule {
    Rule {
        phrase,
        token: Token::Marker(value),
    }
}

/// Substitution rules in priority order.
pub const RULES: &[Rule] = &[
    // Calculus triggers
    marker("derivative of", Marker::Derivative),
    marker("differentiate", Marker::Derivative),
    marker("derivative", Marker::Derivative),
    marker("integral of", Marker::Integral),
    marker("integrate", Marker::Integral),
    marker("integral", Marker::Integral),
    // Buffer commands
    marker("clear", Marker::Clear),
    marker("reset", Marker::Clear),
    marker("delete", Marker::Clear),
    // Operators
    text("plus", "+"),
    text("add", "+"),
    text("minus", "-"),
    text("subtract", "-"),
    text("multiplied by", "*"),
    text("times", "*"),
    text("multiply", "*"),
    text("divided by", "/"),
    text("divide", "/"),
    text("over", "/"),
    text("is equal to", "="),
    text("equals", "="),
    text("equal", "="),
    // Structure
    text("open parenthesis", "("),
    text("open paren", "("),
    text("open bracket", "("),
    text("close parenthesis", ")"),
    text("close paren", ")"),
    text("close bracket", ")"),
    // Functions
    text("sine", "sin"),
    text("sin", "sin"),
    text("cosine", "cos"),
    text("cos", "cos"),
    text("tangent", "tan"),
    text("tan", "tan"),
    text("logarithm", "log"),
    text("log", "log"),
    // Constants and powers
    text("pie", "π"),
    text("pi", "π"),
    text("square root", "√"),
    text("root", "√"),
    text("power of two", "**2"),
    text("power of 2", "**2"),
    text("power of three", "**3"),
    text("power of 3", "**3"),
    text("squared", "**2"),
    text("square", "**2"),
    text("cubed", "**3"),
    text("cube", "**3"),
    text("to the power", "**"),
    text("raised to", "**"),
    text("power", "**"),
    text("point", "."),
    text("decimal", "."),
    // Digits
    text("zero", "0"),
    text("one", "1"),
    text("two", "2"),
    text("three", "3"),
    text("four", "4"),
    text("five", "5"),
    text("six", "6"),
    text("seven", "7"),
    text("eight", "8"),
    text("nine", "9"),
];

/// Split a transcript into lowercase words, keeping symbols that speech
/// engines emit inline (`5+3`) attached to their word. Sentence punctuation
/// trailing a word ("equals.", "three?") is dropped.
fn words(transcript: &str) -> Vec<String> {
    transcript
        .split_whitespace()
        .map(|w| match w.trim_end_matches(['.', ',', '?', '!']) {
            "" => w.to_lowercase(),
            trimmed => trimmed.to_lowercase(),
        })
        .collect()
}

/// Apply the substitution table to `transcript`.
///
/// Matched phrases become their tokens; words no rule covers are kept
/// verbatim for the whitelist pass. Pieces are separated by single spaces so
/// that neighbouring words never fuse into one.
pub fn substitute(transcript: &str) -> String {
    let words = words(transcript);
    let mut out = String::new();
    let mut i = 0;

    'outer: while i < words.len() {
        if !out.is_empty() {
            out.push(' ');
        }
        for rule in RULES {
            let phrase: Vec<&str> = rule.phrase.split(' ').collect();
            let end = i + phrase.len();
            if end <= words.len() && words[i..end].iter().zip(&phrase).all(|(w, p)| w == p) {
                rule.token.push_to(&mut out);
                i = end;
                continue 'outer;
            }
        }
        out.push_str(&words[i]);
        i += 1;
    }

    out
}
