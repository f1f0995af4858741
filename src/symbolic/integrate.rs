//! Indefinite integration for the forms a calculator user is likely to enter.
//!
//! Supported: linearity and constant factors, (Laurent) polynomials,
//! elementary functions of a linear argument, powers of a linear base and
//! exponentials `a**(k*x + c)`. Everything else is reported as
//! [`SymbolicError::NotIntegrable`].

use super::SymbolicError;
use super::expr::{Constant, Expr, Func, Rational};
use std::collections::BTreeMap;

/// Largest integer power expanded when treating an expression as a polynomial.
const MAX_EXPANSION: i64 = 16;

/// Exponent of the variable mapped to a coefficient free of it.
type Poly = BTreeMap<i64, Expr>;

/// Antiderivative of `expr` with respect to `var`, without integration constant.
pub fn integrate(expr: &Expr, var: &str) -> Result<Expr, SymbolicError> {
    if !expr.contains(var) {
        return Ok(expr.clone() * Expr::sym(var));
    }
    if let Some(poly) = as_poly(expr, var) {
        return Ok(integrate_poly(poly, var));
    }

    match expr {
        Expr::Add(terms) => terms
            .iter()
            .map(|t| integrate(t, var))
            .collect::<Result<Vec<_>, _>>()
            .map(Expr::sum),

        Expr::Mul(factors) => {
            let (mut constant, varying): (Vec<Expr>, Vec<Expr>) =
                factors.iter().cloned().partition(|f| !f.contains(var));
            if constant.is_empty() {
                return Err(not_integrable(expr));
            }
            constant.push(integrate(&Expr::product(varying), var)?);
            Ok(Expr::product(constant))
        }

        _ => integrate_elementary(expr, var),
    }
}

fn not_integrable(expr: &Expr) -> SymbolicError {
    SymbolicError::NotIntegrable(expr.to_string())
}

fn integrate_poly(poly: Poly, var: &str) -> Expr {
    let x = Expr::sym(var);
    let terms = poly
        .into_iter()
        .map(|(k, coeff)| {
            if k == -1 {
                coeff * Expr::apply(Func::Log, x.clone())
            } else {
                let raised = k + 1;
                Expr::product(vec![
                    coeff,
                    Expr::Num(Rational::new(1, raised)),
                    Expr::pow(x.clone(), Expr::int(raised)),
                ])
            }
        })
        .collect();
    Expr::sum(terms)
}

/// Functions of a linear argument and powers with a linear base or exponent.
fn integrate_elementary(expr: &Expr, var: &str) -> Result<Expr, SymbolicError> {
    match expr {
        Expr::Func(func, arg) => {
            let slope = linear_slope(arg, var).ok_or_else(|| not_integrable(expr))?;
            let u = arg.as_ref().clone();
            let anti = match func {
                Func::Sin => -Expr::apply(Func::Cos, u),
                Func::Cos => Expr::apply(Func::Sin, u),
                Func::Exp => expr.clone(),
                Func::Tan => -Expr::apply(Func::Log, Expr::apply(Func::Cos, u)),
                Func::Log => u.clone() * Expr::apply(Func::Log, u.clone()) - u,
            };
            Ok(anti / slope)
        }

        Expr::Pow(base, exp) if !exp.contains(var) => {
            let slope = linear_slope(base, var).ok_or_else(|| not_integrable(expr))?;
            let base = base.as_ref().clone();
            let exp = exp.as_ref().clone();
            if exp == Expr::int(-1) {
                return Ok(Expr::apply(Func::Log, base) / slope);
            }
            let raised = exp + Expr::one();
            Ok(Expr::pow(base, raised.clone()) / (slope * raised))
        }

        Expr::Pow(base, exp) if !base.contains(var) => {
            let slope = linear_slope(exp, var).ok_or_else(|| not_integrable(expr))?;
            let base = base.as_ref().clone();
            if base == Expr::Const(Constant::E) {
                return Ok(expr.clone() / slope);
            }
            Ok(expr.clone() / (slope * Expr::apply(Func::Log, base)))
        }

        _ => Err(not_integrable(expr)),
    }
}

/// `a` when `expr` is `a*var + b` with `a` nonzero and free of `var`.
fn linear_slope(expr: &Expr, var: &str) -> Option<Expr> {
    let poly = as_poly(expr, var)?;
    if poly.keys().any(|&k| k != 0 && k != 1) {
        return None;
    }
    poly.get(&1).cloned()
}

/// View `expr` as a Laurent polynomial in `var`, if it is one.
fn as_poly(expr: &Expr, var: &str) -> Option<Poly> {
    if !expr.contains(var) {
        return Some(Poly::from([(0, expr.clone())]));
    }

    let poly = match expr {
        Expr::Sym(_) => Poly::from([(1, Expr::one())]),
        Expr::Add(terms) => {
            let mut acc = Poly::new();
            for term in terms {
                for (k, coeff) in as_poly(term, var)? {
                    add_term(&mut acc, k, coeff);
                }
            }
            acc
        }
        Expr::Mul(factors) => {
            let mut acc = Poly::from([(0, Expr::one())]);
            for factor in factors {
                acc = poly_mul(&acc, &as_poly(factor, var)?)?;
            }
            acc
        }
        Expr::Pow(base, exp) => {
            let n = exp.as_num().filter(|n| n.is_integer())?.to_integer();
            let base = as_poly(base, var)?;
            if n >= 0 {
                if n > MAX_EXPANSION {
                    return None;
                }
                let mut acc = Poly::from([(0, Expr::one())]);
                for _ in 0..n {
                    acc = poly_mul(&acc, &base)?;
                }
                acc
            } else {
                // Only a single monomial can be inverted.
                let mut monomials = base.into_iter();
                let (k, coeff) = monomials.next()?;
                if monomials.next().is_some() {
                    return None;
                }
                Poly::from([(k.checked_mul(n)?, Expr::pow(coeff, Expr::int(n)))])
            }
        }
        _ => return None,
    };

    Some(poly.into_iter().filter(|(_, c)| !c.is_zero()).collect())
}

fn add_term(poly: &mut Poly, k: i64, coeff: Expr) {
    let entry = poly.entry(k).or_insert_with(Expr::zero);
    *entry = entry.clone() + coeff;
}

fn poly_mul(a: &Poly, b: &Poly) -> Option<Poly> {
    let mut out = Poly::new();
    for (i, ca) in a {
        for (j, cb) in b {
            add_term(&mut out, i.checked_add(*j)?, ca.clone() * cb.clone());
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::{differentiate, parse};

    fn i(input: &str) -> String {
        integrate(&parse(input).unwrap(), "x").unwrap().to_string()
    }

    #[test]
    fn test_polynomials() {
        assert_eq!(i("x"), "x**2/2");
        assert_eq!(i("2*x"), "x**2");
        assert_eq!(i("3"), "3*x");
        assert_eq!(i("x**2 + 1"), "x**3/3 + x");
        assert_eq!(i("(x+1)**2"), "x**3/3 + x**2 + x");
    }

    #[test]
    fn test_reciprocal_and_roots() {
        assert_eq!(i("1/x"), "log(x)");
        assert_eq!(i("1/(x+1)"), "log(x + 1)");
        assert_eq!(i("sqrt(x)"), "2*x**(3/2)/3");
        assert_eq!(i("x**(-2)"), "-1/x");
    }

    #[test]
    fn test_elementary_functions() {
        assert_eq!(i("sin(x)"), "-cos(x)");
        assert_eq!(i("cos(x)"), "sin(x)");
        assert_eq!(i("exp(x)"), "exp(x)");
        assert_eq!(i("cos(2*x)"), "sin(2*x)/2");
        assert_eq!(i("log(x)"), "x*log(x) - x");
    }

    #[test]
    fn test_constant_factor_is_pulled_out() {
        assert_eq!(i("3*sin(x)"), "-3*cos(x)");
        assert_eq!(i("pi"), "pi*x");
    }

    #[test]
    fn test_unsupported_forms_fail() {
        let e = parse("x*sin(x)").unwrap();
        assert!(matches!(
            integrate(&e, "x"),
            Err(SymbolicError::NotIntegrable(_))
        ));
        let e = parse("sin(x**2)").unwrap();
        assert!(integrate(&e, "x").is_err());
    }

    #[test]
    fn test_derivative_undoes_integral_for_polynomials() {
        for input in ["x", "x**2 + 3*x + 1", "4*x**3 - x/2 + 7", "x**4 - 2*x**2 + x - 5"] {
            let p = parse(input).unwrap();
            let back = differentiate(&integrate(&p, "x").unwrap(), "x");
            assert_eq!(back, p, "round trip failed for {input}");
        }
    }
}
