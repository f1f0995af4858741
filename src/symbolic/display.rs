//! Textual rendering of expressions in conventional CAS notation
//! (`x**2/2`, `-cos(x)`, `1/(2*sqrt(x))`).

use super::expr::{Constant, Expr, Rational};
use num_traits::{Signed, Zero};
use std::fmt;

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Num(n) => write!(f, "{}", n),
            Expr::Const(c) => f.write_str(c.name()),
            Expr::Sym(s) => f.write_str(s),
            Expr::Add(terms) => fmt_sum(terms, f),
            Expr::Mul(_) => fmt_product(self, f),
            Expr::Pow(base, exp) => fmt_power(base, exp, f),
            Expr::Func(func, arg) => write!(f, "{}({})", func.name(), arg),
        }
    }
}

fn fmt_sum(terms: &[Expr], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, term) in terms.iter().enumerate() {
        let (coeff, _) = term.split_coeff();
        if i == 0 {
            write!(f, "{}", term)?;
        } else if coeff.is_negative() {
            write!(f, " - {}", -term.clone())?;
        } else {
            write!(f, " + {}", term)?;
        }
    }
    Ok(())
}

fn fmt_product(expr: &Expr, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let (coeff, rest) = expr.split_coeff();
    let factors = match rest {
        Expr::Mul(factors) => factors,
        other => vec![other],
    };

    let mut numer = Vec::new();
    let mut denom = Vec::new();
    if coeff.numer().unsigned_abs() != 1 {
        numer.push(coeff.numer().unsigned_abs().to_string());
    }
    if *coeff.denom() != 1 {
        denom.push(coeff.denom().to_string());
    }

    for factor in &factors {
        match factor {
            Expr::Pow(base, exp) if exp.as_num().is_some_and(|e| e.is_negative()) => {
                let flipped = Expr::pow((**base).clone(), -(**exp).clone());
                denom.push(wrap_factor(&flipped));
            }
            other => numer.push(wrap_factor(other)),
        }
    }

    let sign = if coeff.is_negative() { "-" } else { "" };
    let numer = if numer.is_empty() {
        "1".to_string()
    } else {
        numer.join("*")
    };
    match denom.len() {
        0 => write!(f, "{sign}{numer}"),
        1 => write!(f, "{sign}{numer}/{}", denom[0]),
        _ => write!(f, "{sign}{numer}/({})", denom.join("*")),
    }
}

fn fmt_power(base: &Expr, exp: &Expr, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if let Expr::Const(Constant::E) = base {
        return write!(f, "exp({})", exp);
    }
    if let Some(e) = exp.as_num() {
        if e == Rational::new(1, 2) {
            return write!(f, "sqrt({})", base);
        }
        if e == Rational::new(-1, 2) {
            return write!(f, "1/sqrt({})", base);
        }
        if e == Rational::from_integer(-1) {
            return write!(f, "1/{}", wrap_base(base));
        }
    }
    write!(f, "{}**{}", wrap_base(base), wrap_exponent(exp))
}

fn wrap_factor(expr: &Expr) -> String {
    match expr {
        Expr::Add(_) => format!("({})", expr),
        _ => expr.to_string(),
    }
}

fn wrap_base(expr: &Expr) -> String {
    let needs_parens = match expr {
        Expr::Add(_) | Expr::Mul(_) | Expr::Pow(..) => true,
        Expr::Num(n) => n.is_negative() || !n.is_integer(),
        _ => false,
    };
    if needs_parens {
        format!("({})", expr)
    } else {
        expr.to_string()
    }
}

fn wrap_exponent(expr: &Expr) -> String {
    let bare = match expr {
        Expr::Num(n) => n.is_integer() && !n.is_negative() && !n.is_zero(),
        Expr::Sym(_) | Expr::Const(_) | Expr::Func(..) => true,
        _ => false,
    };
    if bare {
        expr.to_string()
    } else {
        format!("({})", expr)
    }
}
