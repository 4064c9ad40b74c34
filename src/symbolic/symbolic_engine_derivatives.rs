//! # Symbolic Engine Derivatives Module
//!
//! Analytical differentiation over the expression tree. Every node kind
//! carries its own rule, composed through the chain rule; the raw result is
//! simplified before it is returned so `d/dx x^3` comes back as `3 * x ^ 2`
//! and not a tower of multiplications by one.
//!
//! ## Key Methods
//!
//! - `differentiate(var)` - first derivative with respect to a variable
//! - `differentiate_with(var, settings)` - same, explicit settings
//! - `derive(var, order)` - higher-order derivative by iteration
//!
//! ## Rule Highlights
//!
//! 1. **Chain Rule Composition**: every function rule multiplies by the
//!    argument derivative, so nesting falls out for free
//! 2. **Three-case Power Rule**: constant exponent, constant base and the
//!    general `a^b * (a'*b/a + ln(a)*b')` form
//! 3. **Placeholder Fusion**: differentiating `derivative(f, x, n)` by x
//!    yields `derivative(f, x, n+1)` rather than a nested placeholder, and
//!    cancels one order of `integral(f, x, n)`
//! 4. **Graceful Degradation**: a node with no closed-form rule (a relational
//!    statement, a limit) wraps itself in a `Derivative` placeholder instead
//!    of failing; `factorial` has no rule here and degrades to NaN
//!
//! Differentiation is total over well-formed trees. The only reported error
//! is an exhausted recursion budget on pathologically deep input.

use crate::symbolic::errors::SymbolicError;
use crate::symbolic::settings::SymbolicSettings;
use crate::symbolic::symbolic_engine::Expr;
use log::debug;

impl Expr {
    /// Differentiates with respect to `var` using default settings and
    /// simplifies the result.
    pub fn differentiate(&self, var: &str) -> Result<Expr, SymbolicError> {
        self.differentiate_with(var, &SymbolicSettings::default())
    }

    /// Differentiates with respect to `var` under explicit settings.
    pub fn differentiate_with(
        &self,
        var: &str,
        settings: &SymbolicSettings,
    ) -> Result<Expr, SymbolicError> {
        let raw = inner_diff(self, var, settings, settings.max_recursion_depth)?;
        let simplified = raw.simplify();
        debug!("d/d{} [{}] = {}", var, self, simplified);
        Ok(simplified)
    }

    /// Higher-order derivative by iterated differentiation, simplifying at
    /// each step.
    pub fn derive(&self, var: &str, order: usize) -> Result<Expr, SymbolicError> {
        self.derive_with(var, order, &SymbolicSettings::default())
    }

    /// Higher-order derivative under explicit settings; the recursion budget
    /// applies to every iteration.
    pub fn derive_with(
        &self,
        var: &str,
        order: usize,
        settings: &SymbolicSettings,
    ) -> Result<Expr, SymbolicError> {
        let mut current = self.clone();
        for _ in 0..order {
            current = current.differentiate_with(var, settings)?;
        }
        Ok(current)
    }
}

/// One derivative rule per node kind. `depth` counts down toward the
/// recursion budget error.
fn inner_diff(
    e: &Expr,
    var: &str,
    settings: &SymbolicSettings,
    depth: usize,
) -> Result<Expr, SymbolicError> {
    if depth == 0 {
        return Err(SymbolicError::RecursionBudgetExceeded {
            limit: settings.max_recursion_depth,
        });
    }
    let d = |a: &Expr| inner_diff(a, var, settings, depth - 1);
    let result = match e {
        Expr::Var(name) => {
            if name == var {
                Expr::int(1)
            } else {
                Expr::int(0)
            }
        }
        // an undefined literal stays undefined, a defined one has slope zero
        Expr::Num(v) => {
            if v.is_nan() {
                e.clone()
            } else {
                Expr::int(0)
            }
        }
        Expr::Add(l, r) => d(l)? + d(r)?,
        Expr::Sub(l, r) => d(l)? - d(r)?,
        Expr::Mul(l, r) => d(l)? * (**r).clone() + (**l).clone() * d(r)?,
        Expr::Div(l, r) => {
            let num = d(l)? * (**r).clone() - d(r)? * (**l).clone();
            let den = (**r).clone().pow(Expr::int(2));
            num / den
        }
        Expr::Pow(base, exp) => {
            let base_has_var = base.contains_variable(var);
            let exp_has_var = exp.contains_variable(var);
            if !exp_has_var {
                // d/dx a^c = c * a^(c-1) * a'
                let c = (**exp).clone();
                c.clone() * (**base).clone().pow(c - Expr::int(1)) * d(base)?
            } else if !base_has_var {
                // d/dx c^b = c^b * ln(c) * b'
                (**base).clone().pow((**exp).clone()) * (**base).clone().ln() * d(exp)?
            } else {
                // general case: a^b * (a'*b/a + ln(a)*b')
                let a = (**base).clone();
                let b = (**exp).clone();
                a.clone().pow(b.clone())
                    * (d(base)? * b / a.clone() + a.ln() * d(exp)?)
            }
        }
        Expr::Exp(a) => (**a).clone().exp() * d(a)?,
        Expr::Ln(a) => d(a)? / (**a).clone(),
        Expr::Log(b, a) => {
            // quotient rule over ln(a)/ln(b)
            let ln_b = (**b).clone().ln();
            let num = d(a)? / (**a).clone() * ln_b.clone()
                - (**a).clone().ln() * (d(b)? / (**b).clone());
            num / ln_b.clone().pow(Expr::int(2))
        }
        Expr::Abs(a) => Expr::Signum(a.clone()) * d(a)?,
        // no closed form at the discontinuity
        Expr::Signum(_) => Expr::Derivative(e.clone().boxed(), var.to_string(), 1),
        Expr::Factorial(_) => Expr::Num(crate::symbolic::numeric::Number::nan()),
        Expr::sin(a) => Expr::cos(a.clone()) * d(a)?,
        Expr::cos(a) => -(Expr::sin(a.clone())) * d(a)?,
        Expr::tg(a) => d(a)? / Expr::cos(a.clone()).pow(Expr::int(2)),
        Expr::ctg(a) => -(d(a)? / Expr::sin(a.clone()).pow(Expr::int(2))),
        Expr::sec(a) => Expr::sec(a.clone()) * Expr::tg(a.clone()) * d(a)?,
        Expr::csc(a) => -(Expr::csc(a.clone()) * Expr::ctg(a.clone()) * d(a)?),
        Expr::arcsin(a) => {
            d(a)? / (Expr::int(1) - (**a).clone().pow(Expr::int(2))).pow(Expr::real(0.5))
        }
        Expr::arccos(a) => {
            -(d(a)? / (Expr::int(1) - (**a).clone().pow(Expr::int(2))).pow(Expr::real(0.5)))
        }
        Expr::arctg(a) => d(a)? / (Expr::int(1) + (**a).clone().pow(Expr::int(2))),
        Expr::arcctg(a) => -(d(a)? / (Expr::int(1) + (**a).clone().pow(Expr::int(2)))),
        Expr::arcsec(a) => {
            let inner = (Expr::int(1)
                - Expr::int(1) / (**a).clone().pow(Expr::int(2)))
            .pow(Expr::real(0.5));
            d(a)? / (inner * (**a).clone().pow(Expr::int(2)))
        }
        Expr::arccsc(a) => {
            let inner = (Expr::int(1)
                - Expr::int(1) / (**a).clone().pow(Expr::int(2)))
            .pow(Expr::real(0.5));
            -(d(a)? / (inner * (**a).clone().pow(Expr::int(2))))
        }
        Expr::sh(a) => Expr::ch(a.clone()) * d(a)?,
        Expr::ch(a) => Expr::sh(a.clone()) * d(a)?,
        Expr::th(a) => d(a)? / Expr::ch(a.clone()).pow(Expr::int(2)),
        Expr::cth(a) => -(d(a)? / Expr::sh(a.clone()).pow(Expr::int(2))),
        Expr::arsh(a) => {
            d(a)? / ((**a).clone().pow(Expr::int(2)) + Expr::int(1)).pow(Expr::real(0.5))
        }
        Expr::arch(a) => {
            d(a)? / ((**a).clone().pow(Expr::int(2)) - Expr::int(1)).pow(Expr::real(0.5))
        }
        Expr::arth(a) | Expr::arcth(a) => {
            d(a)? / (Expr::int(1) - (**a).clone().pow(Expr::int(2)))
        }
        Expr::Derivative(inner, v, n) => {
            if v == var {
                // fuse orders instead of nesting placeholders
                Expr::Derivative(inner.clone(), v.clone(), n + 1)
            } else {
                Expr::Derivative(e.clone().boxed(), var.to_string(), 1)
            }
        }
        Expr::Integral(inner, v, n) => {
            if v == var {
                if *n > 1 {
                    Expr::Integral(inner.clone(), v.clone(), n - 1)
                } else {
                    (**inner).clone()
                }
            } else {
                Expr::Derivative(e.clone().boxed(), var.to_string(), 1)
            }
        }
        Expr::Limit(..) => Expr::Derivative(e.clone().boxed(), var.to_string(), 1),
        Expr::Provided(value, pred) => Expr::Provided(d(value)?.boxed(), pred.clone()),
        Expr::Piecewise(cases) => {
            let mut out = Vec::with_capacity(cases.len());
            for (value, pred) in cases {
                out.push((d(value)?, pred.clone()));
            }
            Expr::Piecewise(out)
        }
        Expr::Tensor(elems, shape) => {
            let mut out = Vec::with_capacity(elems.len());
            for elem in elems {
                out.push(d(elem)?);
            }
            Expr::Tensor(out, shape.clone())
        }
        // statements have no derivative; keep them as a placeholder
        Expr::Equals(..)
        | Expr::Greater(..)
        | Expr::GreaterOrEq(..)
        | Expr::Less(..)
        | Expr::LessOrEq(..)
        | Expr::And(..)
        | Expr::Or(..)
        | Expr::Implies(..) => Expr::Derivative(e.clone().boxed(), var.to_string(), 1),
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_rule() {
        let dydx = Expr::parse_expression("x^3").differentiate("x").unwrap();
        assert_eq!(dydx, Expr::parse_expression("3 * x^2"));
    }

    #[test]
    fn test_exponential_base() {
        let dydx = Expr::parse_expression("2^x").differentiate("x").unwrap();
        assert_eq!(dydx, Expr::parse_expression("2^x * ln(2)"));
    }

    #[test]
    fn test_product_rule() {
        let dydx = Expr::parse_expression("sin(x) * x").differentiate("x").unwrap();
        assert_eq!(dydx, Expr::parse_expression("cos(x) * x + sin(x)"));
    }

    #[test]
    fn test_chain_rule() {
        let dydx = Expr::parse_expression("sin(x^2)").differentiate("x").unwrap();
        assert_eq!(dydx, Expr::parse_expression("cos(x^2) * (2 * x)"));
    }

    #[test]
    fn test_quotient_rule_numerically() {
        let f = Expr::parse_expression("x / (x^2 + 1)");
        let dydx = f.differentiate("x").unwrap();
        for x in [-2.0, -0.5, 0.0, 1.0, 3.0] {
            let h = 1e-6;
            let numeric = (f.eval_expression(vec!["x"], &[x + h])
                - f.eval_expression(vec!["x"], &[x - h]))
                / (2.0 * h);
            let analytic = dydx.eval_expression(vec!["x"], &[x]);
            approx::assert_relative_eq!(numeric, analytic, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_linearity_numerically() {
        let f = Expr::parse_expression("3 * ln(x) + 2 * exp(x)");
        let dydx = f.differentiate("x").unwrap();
        let expected = Expr::parse_expression("3 / x + 2 * exp(x)");
        for x in [0.5, 1.0, 2.0, 4.0] {
            approx::assert_relative_eq!(
                dydx.eval_expression(vec!["x"], &[x]),
                expected.eval_expression(vec!["x"], &[x]),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_constant_and_other_variable() {
        assert_eq!(
            Expr::parse_expression("7").differentiate("x").unwrap(),
            Expr::int(0)
        );
        assert_eq!(
            Expr::parse_expression("y").differentiate("x").unwrap(),
            Expr::int(0)
        );
        assert_eq!(
            Expr::parse_expression("x").differentiate("x").unwrap(),
            Expr::int(1)
        );
    }

    #[test]
    fn test_abs_uses_signum() {
        let dydx = Expr::parse_expression("abs(x)").differentiate("x").unwrap();
        assert_eq!(dydx, Expr::parse_expression("sign(x)"));
    }

    #[test]
    fn test_factorial_has_no_derivative() {
        let dydx = Expr::parse_expression("x!").differentiate("x").unwrap();
        assert!(dydx.is_nan());
    }

    #[test]
    fn test_derivative_placeholder_fuses_orders() {
        let e = Expr::parse_expression("derivative(sin(x) * x, x, 2)");
        let dydx = e.differentiate("x").unwrap();
        assert_eq!(
            dydx,
            Expr::Derivative(
                Expr::parse_expression("sin(x) * x").boxed(),
                "x".to_string(),
                3
            )
        );
    }

    #[test]
    fn test_integral_cancels_one_order() {
        let e = Expr::parse_expression("integral(sin(x), x, 2)");
        assert_eq!(
            e.differentiate("x").unwrap(),
            Expr::parse_expression("integral(sin(x), x, 1)")
        );
        let e = Expr::parse_expression("integral(sin(x), x, 1)");
        assert_eq!(
            e.differentiate("x").unwrap(),
            Expr::parse_expression("sin(x)")
        );
    }

    #[test]
    fn test_statement_wraps_in_placeholder() {
        let e = Expr::parse_expression("x = 1");
        assert_eq!(
            e.differentiate("x").unwrap(),
            Expr::Derivative(e.boxed(), "x".to_string(), 1)
        );
    }

    #[test]
    fn test_derive_matches_iterated_differentiate() {
        let f = Expr::parse_expression("x^4 + sin(x)");
        let twice = f.differentiate("x").unwrap().differentiate("x").unwrap();
        assert_eq!(f.derive("x", 2).unwrap(), twice);
    }

    #[test]
    fn test_derive_with_carries_settings() {
        let settings = SymbolicSettings {
            max_recursion_depth: 2,
            ..Default::default()
        };
        let f = Expr::parse_expression("sin(sin(sin(x)))");
        assert_eq!(
            f.derive_with("x", 1, &settings),
            Err(SymbolicError::RecursionBudgetExceeded { limit: 2 })
        );
        assert!(f.derive("x", 1).is_ok());
    }

    #[test]
    fn test_recursion_budget() {
        let settings = SymbolicSettings {
            max_recursion_depth: 3,
            ..Default::default()
        };
        let deep = Expr::parse_expression("sin(sin(sin(sin(sin(x)))))");
        assert_eq!(
            deep.differentiate_with("x", &settings),
            Err(SymbolicError::RecursionBudgetExceeded { limit: 3 })
        );
    }

    #[test]
    fn test_piecewise_differentiates_per_case() {
        let e = Expr::parse_expression("piecewise(x^2, x > 0, x, x <= 0)");
        assert_eq!(
            e.differentiate("x").unwrap(),
            Expr::parse_expression("piecewise(2 * x, x > 0, 1, x <= 0)")
        );
    }
}
