//! Symbolic differentiation.

use super::expr::{Expr, Func};

/// Derivative of `expr` with respect to `var`.
pub fn differentiate(expr: &Expr, var: &str) -> Expr {
    match expr {
        Expr::Num(_) | Expr::Const(_) => Expr::zero(),

        Expr::Sym(s) => {
            if s == var {
                Expr::one()
            } else {
                Expr::zero()
            }
        }

        Expr::Add(terms) => Expr::sum(terms.iter().map(|t| differentiate(t, var)).collect()),

        // Product rule generalised to n factors.
        Expr::Mul(factors) => {
            let mut terms = Vec::with_capacity(factors.len());
            for (i, factor) in factors.iter().enumerate() {
                let d = differentiate(factor, var);
                if d.is_zero() {
                    continue;
                }
                let mut parts: Vec<Expr> = factors
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, f)| f.clone())
                    .collect();
                parts.push(d);
                terms.push(Expr::product(parts));
            }
            Expr::sum(terms)
        }

        Expr::Pow(base, exp) => {
            let base = base.as_ref().clone();
            let exp = exp.as_ref().clone();
            match (base.contains(var), exp.contains(var)) {
                (false, false) => Expr::zero(),

                // d(u^n) = n * u^(n-1) * u'
                (true, false) => {
                    let db = differentiate(&base, var);
                    let lowered = Expr::pow(base, exp.clone() - Expr::one());
                    Expr::product(vec![exp, lowered, db])
                }

                // d(a^v) = a^v * log(a) * v'
                (false, true) => {
                    let de = differentiate(&exp, var);
                    Expr::product(vec![expr.clone(), Expr::apply(Func::Log, base), de])
                }

                // d(u^v) = u^v * (v' * log(u) + v * u'/u)
                (true, true) => {
                    let db = differentiate(&base, var);
                    let de = differentiate(&exp, var);
                    let inner = de * Expr::apply(Func::Log, base.clone()) + exp * db / base;
                    expr.clone() * inner
                }
            }
        }

        // Chain rule.
        Expr::Func(func, arg) => {
            let inner = differentiate(arg, var);
            if inner.is_zero() {
                return Expr::zero();
            }
            let u = arg.as_ref().clone();
            let outer = match func {
                Func::Sin => Expr::apply(Func::Cos, u),
                Func::Cos => -Expr::apply(Func::Sin, u),
                Func::Tan => Expr::pow(Expr::apply(Func::Tan, u), Expr::int(2)) + Expr::one(),
                Func::Log => u.recip(),
                Func::Exp => expr.clone(),
            };
            outer * inner
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::parse;

    fn d(input: &str) -> String {
        differentiate(&parse(input).unwrap(), "x").to_string()
    }

    #[test]
    fn test_power_rule() {
        assert_eq!(d("x**2"), "2*x");
        assert_eq!(d("x**3 + 2*x"), "3*x**2 + 2");
        assert_eq!(d("x"), "1");
        assert_eq!(d("5"), "0");
    }

    #[test]
    fn test_negative_and_fractional_powers() {
        assert_eq!(d("1/x"), "-1/x**2");
        assert_eq!(d("sqrt(x)"), "1/(2*sqrt(x))");
    }

    #[test]
    fn test_chain_rule() {
        assert_eq!(d("sin(x)"), "cos(x)");
        assert_eq!(d("cos(2*x)"), "-2*sin(2*x)");
        assert_eq!(d("tan(x)"), "tan(x)**2 + 1");
        assert_eq!(d("log(x)"), "1/x");
        assert_eq!(d("exp(3*x)"), "3*exp(3*x)");
    }

    #[test]
    fn test_product_rule() {
        assert_eq!(d("x*sin(x)"), "x*cos(x) + sin(x)");
    }

    #[test]
    fn test_other_symbols_are_constants() {
        assert_eq!(d("C*x"), "C");
        assert_eq!(d("pi*x**2"), "2*pi*x");
    }

    #[test]
    fn test_exponential_with_constant_base() {
        assert_eq!(d("2**x"), "2**x*log(2)");
    }
}
