//! Symbolic expression tree with simplifying constructors.
//!
//! Every `Expr` built through [`Expr::sum`], [`Expr::product`], [`Expr::pow`]
//! and [`Expr::apply`] is kept in a canonical form: sums and products are
//! flat, numeric constants are folded, like terms and like bases are
//! collected, and operands are sorted. Structural equality is therefore a
//! usable (if incomplete) notion of mathematical equality.

use num_rational::Rational64;
use num_traits::{CheckedAdd, CheckedMul, One, Signed, ToPrimitive, Zero};
use std::cmp::Reverse;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Exact rational coefficient.
pub type Rational = Rational64;

/// Largest integer exponent folded into a numeric constant.
const MAX_NUMERIC_EXPONENT: u64 = 64;

/// Named mathematical constants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Constant {
    Pi,
    E,
}

impl Constant {
    pub fn name(self) -> &'static str {
        match self {
            Self::Pi => "pi",
            Self::E => "E",
        }
    }
}

/// Elementary functions understood by the engine.
///
/// Square roots are not a function here; they are powers with exponent 1/2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Log,
    Exp,
}

impl Func {
    pub fn name(self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Log => "log",
            Self::Exp => "exp",
        }
    }

    /// Look up a function by name. `ln` is accepted as an alias of `log`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sin" => Some(Self::Sin),
            "cos" => Some(Self::Cos),
            "tan" => Some(Self::Tan),
            "log" | "ln" => Some(Self::Log),
            "exp" => Some(Self::Exp),
            _ => None,
        }
    }
}

/// Symbolic expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Expr {
    /// Exact rational number.
    Num(Rational),
    /// Named constant such as `pi`.
    Const(Constant),
    /// Free symbol.
    Sym(String),
    /// Sum of at least two terms; a numeric term, if any, is last.
    Add(Vec<Expr>),
    /// Product of at least two factors; a numeric coefficient, if any, is first.
    Mul(Vec<Expr>),
    /// `base ** exponent`.
    Pow(Box<Expr>, Box<Expr>),
    /// Function application.
    Func(Func, Box<Expr>),
}

impl Expr {
    pub fn zero() -> Self {
        Expr::Num(Rational::zero())
    }

    pub fn one() -> Self {
        Expr::Num(Rational::one())
    }

    pub fn int(value: i64) -> Self {
        Expr::Num(Rational::from_integer(value))
    }

    pub fn rational(numer: i64, denom: i64) -> Self {
        Expr::Num(Rational::new(numer, denom))
    }

    pub fn sym(name: &str) -> Self {
        Expr::Sym(name.to_string())
    }

    pub fn as_num(&self) -> Option<Rational> {
        match self {
            Expr::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Num(n) if n.is_zero())
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Num(n) if n.is_one())
    }

    /// Whether `var` occurs anywhere in the expression.
    pub fn contains(&self, var: &str) -> bool {
        match self {
            Expr::Num(_) | Expr::Const(_) => false,
            Expr::Sym(s) => s == var,
            Expr::Add(items) | Expr::Mul(items) => items.iter().any(|e| e.contains(var)),
            Expr::Pow(base, exp) => base.contains(var) || exp.contains(var),
            Expr::Func(_, arg) => arg.contains(var),
        }
    }

    fn has_symbols(&self) -> bool {
        match self {
            Expr::Num(_) | Expr::Const(_) => false,
            Expr::Sym(_) => true,
            Expr::Add(items) | Expr::Mul(items) => items.iter().any(Expr::has_symbols),
            Expr::Pow(base, exp) => base.has_symbols() || exp.has_symbols(),
            Expr::Func(_, arg) => arg.has_symbols(),
        }
    }

    fn has_functions(&self) -> bool {
        match self {
            Expr::Num(_) | Expr::Const(_) | Expr::Sym(_) => false,
            Expr::Add(items) | Expr::Mul(items) => items.iter().any(Expr::has_functions),
            Expr::Pow(base, exp) => base.has_functions() || exp.has_functions(),
            Expr::Func(..) => true,
        }
    }

    /// Split a term into its numeric coefficient and the remaining factor.
    pub fn split_coeff(&self) -> (Rational, Expr) {
        match self {
            Expr::Num(n) => (*n, Expr::one()),
            Expr::Mul(factors) => match factors.split_first() {
                Some((Expr::Num(c), rest)) => {
                    let rest = if rest.len() == 1 {
                        rest[0].clone()
                    } else {
                        Expr::Mul(rest.to_vec())
                    };
                    (*c, rest)
                }
                _ => (Rational::one(), self.clone()),
            },
            _ => (Rational::one(), self.clone()),
        }
    }

    /// Sum of `terms`, simplified.
    pub fn sum(terms: Vec<Expr>) -> Expr {
        let mut flat = Vec::with_capacity(terms.len());
        for term in terms {
            match term {
                Expr::Add(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }

        let mut constant = Rational::zero();
        let mut collected: Vec<(Rational, Expr)> = Vec::new();
        for term in flat {
            if let Expr::Num(n) = term {
                match constant.checked_add(&n) {
                    Some(total) => constant = total,
                    None => collected.push((n, Expr::one())),
                }
                continue;
            }

            let (coeff, rest) = term.split_coeff();
            if let Some(entry) = collected.iter_mut().find(|(_, r)| *r == rest)
                && let Some(total) = entry.0.checked_add(&coeff)
            {
                entry.0 = total;
            } else {
                collected.push((coeff, rest));
            }
        }

        let mut out: Vec<Expr> = collected
            .into_iter()
            .filter(|(coeff, _)| !coeff.is_zero())
            .map(|(coeff, rest)| Expr::product(vec![Expr::Num(coeff), rest]))
            .collect();
        if !constant.is_zero() {
            out.push(Expr::Num(constant));
        }

        match out.len() {
            0 => Expr::zero(),
            1 => out.swap_remove(0),
            _ => {
                out.sort_by_cached_key(term_order_key);
                Expr::Add(out)
            }
        }
    }

    /// Product of `factors`, simplified.
    pub fn product(factors: Vec<Expr>) -> Expr {
        let mut flat = Vec::with_capacity(factors.len());
        for factor in factors {
            match factor {
                Expr::Mul(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }

        let mut coeff = Rational::one();
        let mut bases: Vec<(Expr, Expr)> = Vec::new();
        for factor in flat {
            if let Expr::Num(n) = &factor {
                if n.is_zero() {
                    return Expr::zero();
                }
                if let Some(total) = coeff.checked_mul(n) {
                    coeff = total;
                    continue;
                }
            }

            let (base, exp) = match factor {
                Expr::Pow(base, exp) => (*base, *exp),
                other => (other, Expr::one()),
            };
            if let Some(entry) = bases.iter_mut().find(|(b, _)| *b == base) {
                entry.1 = Expr::sum(vec![entry.1.clone(), exp]);
            } else {
                bases.push((base, exp));
            }
        }

        let mut rest = Vec::with_capacity(bases.len());
        let mut distributed = Vec::new();
        for (base, exp) in bases {
            match Expr::pow(base, exp) {
                Expr::Num(n) => match coeff.checked_mul(&n) {
                    Some(total) => coeff = total,
                    None => rest.push(Expr::Num(n)),
                },
                Expr::Mul(inner) => distributed.extend(inner),
                other => rest.push(other),
            }
        }

        if !distributed.is_empty() {
            distributed.push(Expr::Num(coeff));
            distributed.extend(rest);
            return Expr::product(distributed);
        }

        if coeff.is_zero() {
            return Expr::zero();
        }
        match rest.len() {
            0 => return Expr::Num(coeff),
            1 if coeff.is_one() => return rest.swap_remove(0),
            1 => {
                if let Expr::Add(terms) = &rest[0] {
                    return Expr::sum(
                        terms
                            .iter()
                            .map(|t| Expr::product(vec![Expr::Num(coeff), t.clone()]))
                            .collect(),
                    );
                }
            }
            _ => {}
        }

        rest.sort_by_cached_key(factor_order_key);
        if !coeff.is_one() {
            rest.insert(0, Expr::Num(coeff));
        }
        Expr::Mul(rest)
    }

    /// `base ** exp`, simplified.
    pub fn pow(base: Expr, exp: Expr) -> Expr {
        if exp.is_zero() || base.is_one() {
            return Expr::one();
        }
        if exp.is_one() {
            return base;
        }

        match (&base, &exp) {
            (Expr::Num(b), Expr::Num(e)) => {
                if let Some(value) = rational_pow(*b, *e) {
                    return Expr::Num(value);
                }
            }
            (Expr::Pow(inner, e1), Expr::Num(e2)) if e2.is_integer() => {
                let exp = Expr::product(vec![(**e1).clone(), exp.clone()]);
                return Expr::pow((**inner).clone(), exp);
            }
            (Expr::Mul(factors), Expr::Num(e)) if e.is_integer() => {
                return Expr::product(
                    factors
                        .iter()
                        .map(|f| Expr::pow(f.clone(), exp.clone()))
                        .collect(),
                );
            }
            _ => {}
        }

        Expr::Pow(Box::new(base), Box::new(exp))
    }

    /// Apply `func` to `arg`, folding trivial values.
    pub fn apply(func: Func, arg: Expr) -> Expr {
        match (func, &arg) {
            (Func::Sin | Func::Tan, a) if a.is_zero() => Expr::zero(),
            (Func::Cos | Func::Exp, a) if a.is_zero() => Expr::one(),
            (Func::Log, a) if a.is_one() => Expr::zero(),
            (Func::Log, Expr::Const(Constant::E)) => Expr::one(),
            (Func::Exp, Expr::Func(Func::Log, inner)) | (Func::Log, Expr::Func(Func::Exp, inner)) => {
                (**inner).clone()
            }
            _ => Expr::Func(func, Box::new(arg)),
        }
    }

    pub fn sqrt(self) -> Expr {
        Expr::pow(self, Expr::rational(1, 2))
    }

    pub fn recip(self) -> Expr {
        Expr::pow(self, Expr::int(-1))
    }
}

/// Exact `base ** exp` when the result stays rational and small.
fn rational_pow(base: Rational, exp: Rational) -> Option<Rational> {
    if !exp.is_integer() {
        // Perfect square roots only: sqrt(9/4) -> 3/2.
        if *exp.denom() != 2 || base.is_negative() {
            return None;
        }
        let root = Rational::new(exact_isqrt(*base.numer())?, exact_isqrt(*base.denom())?);
        return rational_pow(root, Rational::from_integer(*exp.numer()));
    }

    let n = exp.to_integer();
    if n.unsigned_abs() > MAX_NUMERIC_EXPONENT || (n < 0 && base.is_zero()) {
        return None;
    }
    let mut acc = Rational::one();
    for _ in 0..n.unsigned_abs() {
        acc = acc.checked_mul(&base)?;
    }
    if n < 0 {
        // The reciprocal negates the numerator.
        return (*acc.numer() != i64::MIN).then(|| acc.recip());
    }
    Some(acc)
}

fn exact_isqrt(value: i64) -> Option<i64> {
    if value < 0 {
        return None;
    }
    let guess = (value as f64).sqrt().round() as i64;
    (guess.checked_mul(guess)? == value).then_some(guess)
}

/// Degree of a term in its symbols, e.g. 2 for `3*x**2`.
fn degree(term: &Expr) -> Rational {
    match term {
        Expr::Sym(_) => Rational::one(),
        Expr::Pow(base, exp) if matches!(**base, Expr::Sym(_)) => {
            exp.as_num().unwrap_or_else(Rational::zero)
        }
        Expr::Mul(factors) => factors.iter().map(degree).sum(),
        _ => Rational::zero(),
    }
}

/// Ordering of sum terms: symbolic terms by descending degree, then named
/// constants, then the numeric term.
fn term_order_key(term: &Expr) -> (u8, Reverse<Rational>, Reverse<bool>, String) {
    let (_, rest) = term.split_coeff();
    let class = match term {
        Expr::Num(_) => 2,
        _ if term.has_symbols() => 0,
        _ => 1,
    };
    (
        class,
        Reverse(degree(&rest)),
        Reverse(rest.has_functions()),
        rest.to_string(),
    )
}

/// Ordering of product factors: numbers, constants, symbols, sums, functions.
fn factor_order_key(factor: &Expr) -> (u8, String) {
    let base = match factor {
        Expr::Pow(base, _) => base.as_ref(),
        other => other,
    };
    let rank = match base {
        Expr::Num(_) => 0,
        Expr::Const(_) => 1,
        Expr::Sym(_) => 2,
        Expr::Add(_) | Expr::Mul(_) | Expr::Pow(..) => 3,
        Expr::Func(..) => 4,
    };
    (rank, base.to_string())
}

/// Approximate value of a constant-only expression.
pub fn approximate(expr: &Expr) -> Option<f64> {
    match expr {
        Expr::Num(n) => n.to_f64(),
        Expr::Const(Constant::Pi) => Some(std::f64::consts::PI),
        Expr::Const(Constant::E) => Some(std::f64::consts::E),
        Expr::Sym(_) => None,
        Expr::Add(items) => items.iter().map(approximate).sum(),
        Expr::Mul(items) => items.iter().map(approximate).product(),
        Expr::Pow(base, exp) => Some(approximate(base)?.powf(approximate(exp)?)),
        Expr::Func(func, arg) => {
            let v = approximate(arg)?;
            Some(match func {
                Func::Sin => v.sin(),
                Func::Cos => v.cos(),
                Func::Tan => v.tan(),
                Func::Log => v.ln(),
                Func::Exp => v.exp(),
            })
        }
    }
}

impl Add for Expr {
    type Output = Expr;
    fn add(self, rhs: Expr) -> Expr {
        Expr::sum(vec![self, rhs])
    }
}

impl Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Expr) -> Expr {
        Expr::sum(vec![self, -rhs])
    }
}

impl Mul for Expr {
    type Output = Expr;
    fn mul(self, rhs: Expr) -> Expr {
        Expr::product(vec![self, rhs])
    }
}

impl Div for Expr {
    type Output = Expr;
    fn div(self, rhs: Expr) -> Expr {
        Expr::product(vec![self, rhs.recip()])
    }
}

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::product(vec![Expr::int(-1), self])
    }
}
