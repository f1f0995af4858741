//! Recursive-descent parser from calculator notation into [`Expr`].
//!
//! Grammar:
//!
//! ```text
//! sum     := product (('+' | '-') product)*
//! product := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | power
//! power   := atom ('**' unary)?
//! atom    := number | name '(' sum ')' | name | '(' sum ')'
//! ```
//!
//! Multiplication must be explicit; implicit products such as `2x` are
//! rewritten before they reach this parser.

use super::SymbolicError;
use super::expr::{Constant, Expr, Func, Rational};

/// Free symbols accepted by the parser: the variable and the integration
/// constant carried over from a previous integral.
const SYMBOLS: &[&str] = &["x", "C"];

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(String),
    Name(String),
    Plus,
    Minus,
    Star,
    Slash,
    Power,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(s) | Token::Name(s) => s.clone(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Star => "*".into(),
            Token::Slash => "/".into(),
            Token::Power => "**".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, SymbolicError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                tokens.push(Token::Number(chars[start..i].iter().collect()));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Name(chars[start..i].iter().collect()));
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Power);
                i += 2;
            }
            '^' => {
                tokens.push(Token::Power);
                i += 1;
            }
            '+' | '-' | '*' | '/' | '(' | ')' => {
                tokens.push(match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '(' => Token::LParen,
                    _ => Token::RParen,
                });
                i += 1;
            }
            other => return Err(SymbolicError::UnexpectedChar(other, i)),
        }
    }

    Ok(tokens)
}

/// Parse a decimal literal exactly, e.g. `3.14159265` -> 314159265/100000000.
fn parse_number(text: &str) -> Result<Rational, SymbolicError> {
    let invalid = || SymbolicError::InvalidNumber(text.to_string());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, f),
        None => (text, ""),
    };
    if frac_part.contains('.') || (int_part.is_empty() && frac_part.is_empty()) {
        return Err(invalid());
    }

    let digits = format!("{int_part}{frac_part}");
    let numer: i64 = digits.parse().map_err(|_| invalid())?;
    let scale = u32::try_from(frac_part.len()).map_err(|_| invalid())?;
    let denom = 10_i64.checked_pow(scale).ok_or_else(invalid)?;
    Ok(Rational::new(numer, denom))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), SymbolicError> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(SymbolicError::UnexpectedToken(token.describe())),
            None => Err(SymbolicError::UnexpectedEnd),
        }
    }

    fn sum(&mut self) -> Result<Expr, SymbolicError> {
        let mut terms = vec![self.product()?];
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    terms.push(self.product()?);
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    terms.push(-self.product()?);
                }
                _ => break,
            }
        }
        Ok(Expr::sum(terms))
    }

    fn product(&mut self) -> Result<Expr, SymbolicError> {
        let mut factors = vec![self.unary()?];
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    factors.push(self.unary()?);
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    factors.push(self.unary()?.recip());
                }
                _ => break,
            }
        }
        Ok(Expr::product(factors))
    }

    fn unary(&mut self) -> Result<Expr, SymbolicError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, SymbolicError> {
        let base = self.atom()?;
        if self.peek() == Some(&Token::Power) {
            self.pos += 1;
            let exp = self.unary()?;
            return Ok(Expr::pow(base, exp));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Expr, SymbolicError> {
        match self.next() {
            Some(Token::Number(text)) => Ok(Expr::Num(parse_number(&text)?)),
            Some(Token::LParen) => {
                let inner = self.sum()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Name(name)) => self.named(name),
            Some(token) => Err(SymbolicError::UnexpectedToken(token.describe())),
            None => Err(SymbolicError::UnexpectedEnd),
        }
    }

    fn named(&mut self, name: String) -> Result<Expr, SymbolicError> {
        let is_call = self.peek() == Some(&Token::LParen);
        match name.as_str() {
            "pi" if !is_call => return Ok(Expr::Const(Constant::Pi)),
            "E" if !is_call => return Ok(Expr::Const(Constant::E)),
            _ => {}
        }

        let func = Func::from_name(&name);
        let is_sqrt = name == "sqrt";
        if !is_call {
            if func.is_some() || is_sqrt {
                return Err(SymbolicError::MissingArgument(name));
            }
            if !SYMBOLS.contains(&name.as_str()) {
                return Err(SymbolicError::UnknownSymbol(name));
            }
            return Ok(Expr::Sym(name));
        }

        self.pos += 1;
        let arg = self.sum()?;
        self.expect(Token::RParen)?;
        match func {
            Some(func) => Ok(Expr::apply(func, arg)),
            None if is_sqrt => Ok(arg.sqrt()),
            None => Err(SymbolicError::UnknownFunction(name)),
        }
    }
}

/// Parse `input` into a simplified expression.
pub fn parse(input: &str) -> Result<Expr, SymbolicError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(SymbolicError::UnexpectedEnd);
    }

    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.sum()?;
    match parser.next() {
        None => Ok(expr),
        Some(token) => Err(SymbolicError::UnexpectedToken(token.describe())),
    }
}
