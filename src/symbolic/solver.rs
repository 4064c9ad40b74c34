//! Statement solver: equations, inequalities and boolean combinations over
//! one unknown, reduced to set algebra.
//!
//! ## Dispatch
//!
//! - `a = b` extracts dense polynomial coefficients of `a - b` in the
//!   unknown and returns the root set (degrees 0..2 have closed forms)
//! - `a > b` solves the strictly positive sign regions of the difference
//!   polynomial; `a >= b` unions the boundary roots in
//! - `a <= b` and `a < b` are the complements (within the codomain) of the
//!   strict and non-strict greater forms; the set constructors reduce the
//!   complements back to intervals
//! - `and` / `or` intersect / union the operand solutions
//! - `a => b` rewrites to (not a) or b, with the complement taken against
//!   the universal set of the statement's codomain
//! - a bare true statement (like `x = x` after the difference collapses to
//!   the zero polynomial) yields the universal set
//!
//! Any statement shape outside this table logs a warning and returns the
//! empty set rather than failing: "no solutions found" is an answer.
//!
//! ## Solver struct
//!
//! [`StatementSolver`] bundles statement, unknown and settings, and owns the
//! optional logger initialization; `solve()` configures logging from
//! `loglevel` and delegates to `solver()`.

use crate::symbolic::errors::SymbolicError;
use crate::symbolic::numeric::Number;
use crate::symbolic::sets::SolutionSet;
use crate::symbolic::settings::SymbolicSettings;
use crate::symbolic::symbolic_engine::{Domain, Expr};
use log::{info, warn};
use simplelog::{ColorChoice, CombinedLogger, Config, LevelFilter, TermLogger, TerminalMode};

/// Degree cap for polynomial extraction; beyond it the solver gives up.
const MAX_POLY_DEGREE: usize = 8;

/// Solves `statement` for `unknown` with default settings.
pub fn solve_statement(statement: &Expr, unknown: &str) -> Result<SolutionSet, SymbolicError> {
    solve_statement_with(statement, unknown, &SymbolicSettings::default())
}

/// Solves `statement` for `unknown` under explicit settings.
pub fn solve_statement_with(
    statement: &Expr,
    unknown: &str,
    settings: &SymbolicSettings,
) -> Result<SolutionSet, SymbolicError> {
    // the codomain comes from the statement as written; simplification may
    // fold a complex literal away without changing what the user asked for
    let domain = statement.codomain();
    let simplified = statement.simplify();
    solve_inner(
        &simplified,
        unknown,
        domain,
        settings,
        settings.max_recursion_depth,
    )
}

fn solve_inner(
    e: &Expr,
    unknown: &str,
    domain: Domain,
    settings: &SymbolicSettings,
    depth: usize,
) -> Result<SolutionSet, SymbolicError> {
    if depth == 0 {
        return Err(SymbolicError::RecursionBudgetExceeded {
            limit: settings.max_recursion_depth,
        });
    }
    let solve = |s: &Expr| solve_inner(s, unknown, domain, settings, depth - 1);
    let result = match e {
        Expr::Equals(l, r) => solve_equation(l, r, unknown, domain),
        Expr::Greater(l, r) => solve_strict_inequality(l, r, unknown),
        Expr::GreaterOrEq(l, r) => SolutionSet::union(
            solve_strict_inequality(l, r, unknown),
            solve_equation(l, r, unknown, domain),
        ),
        // the non-greater forms are complements within the codomain
        Expr::LessOrEq(l, r) => SolutionSet::subtraction(
            SolutionSet::Universal(domain),
            solve_strict_inequality(l, r, unknown),
        ),
        Expr::Less(l, r) => SolutionSet::subtraction(
            SolutionSet::Universal(domain),
            SolutionSet::union(
                solve_strict_inequality(l, r, unknown),
                solve_equation(l, r, unknown, domain),
            ),
        ),
        Expr::And(l, r) => SolutionSet::intersection(solve(l)?, solve(r)?),
        Expr::Or(l, r) => SolutionSet::union(solve(l)?, solve(r)?),
        Expr::Implies(l, r) => {
            // (not a) or b
            let complement =
                SolutionSet::subtraction(SolutionSet::Universal(domain), solve(l)?);
            SolutionSet::union(complement, solve(r)?)
        }
        // a statement already known true holds for every value
        Expr::Var(name) if name == unknown => SolutionSet::Universal(domain),
        other => {
            warn!("statement shape not supported by the solver: {}", other);
            SolutionSet::Empty
        }
    };
    Ok(result)
}

/// `l = r`: root set of the difference polynomial.
fn solve_equation(l: &Expr, r: &Expr, unknown: &str, domain: Domain) -> SolutionSet {
    let difference = ((*l).clone() - (*r).clone()).simplify();
    match polynomial_coefficients(&difference, unknown) {
        Some(coeffs) => equation_roots(coeffs, domain),
        None => {
            warn!(
                "cannot extract polynomial in {} from {}",
                unknown, difference
            );
            SolutionSet::Empty
        }
    }
}

/// `l > r`: regions where the difference polynomial is strictly positive.
fn solve_strict_inequality(l: &Expr, r: &Expr, unknown: &str) -> SolutionSet {
    let difference = ((*l).clone() - (*r).clone()).simplify();
    match polynomial_coefficients(&difference, unknown) {
        Some(coeffs) => positive_regions(coeffs),
        None => {
            warn!(
                "cannot extract polynomial in {} from {}",
                unknown, difference
            );
            SolutionSet::Empty
        }
    }
}

/// Dense ascending coefficients of `e` as a polynomial in `unknown`, or None
/// when `e` is not polynomial in it (or the degree exceeds the cap). A
/// subtree free of the unknown contributes its numeric value, so `pi * x`
/// and `y`-free constants work; a second free variable does not.
pub fn polynomial_coefficients(e: &Expr, unknown: &str) -> Option<Vec<Number>> {
    if !e.contains_variable(unknown) {
        let v = constant_fold(e)?;
        return Some(vec![v]);
    }
    match e {
        Expr::Var(name) if name == unknown => Some(vec![Number::int(0), Number::int(1)]),
        Expr::Add(l, r) => {
            let a = polynomial_coefficients(l, unknown)?;
            let b = polynomial_coefficients(r, unknown)?;
            Some(add_coeffs(a, b, false))
        }
        Expr::Sub(l, r) => {
            let a = polynomial_coefficients(l, unknown)?;
            let b = polynomial_coefficients(r, unknown)?;
            Some(add_coeffs(a, b, true))
        }
        Expr::Mul(l, r) => {
            let a = polynomial_coefficients(l, unknown)?;
            let b = polynomial_coefficients(r, unknown)?;
            mul_coeffs(&a, &b)
        }
        Expr::Div(l, r) => {
            // only division by a nonzero constant stays polynomial
            if r.contains_variable(unknown) {
                return None;
            }
            let divisor = constant_fold(r)?;
            if divisor.is_zero() || divisor.is_nan() {
                return None;
            }
            let a = polynomial_coefficients(l, unknown)?;
            Some(a.into_iter().map(|c| c / divisor.clone()).collect())
        }
        Expr::Pow(base, exp) => {
            let n = match exp.as_ref() {
                Expr::Num(v) => v.as_integer()?,
                _ => return None,
            };
            if n < 0 || n as usize > MAX_POLY_DEGREE {
                return None;
            }
            let base_coeffs = polynomial_coefficients(base, unknown)?;
            let mut acc = vec![Number::int(1)];
            for _ in 0..n {
                acc = mul_coeffs(&acc, &base_coeffs)?;
            }
            Some(acc)
        }
        _ => None,
    }
}

/// Numeric value of a subtree with no occurrence of the unknown. Falls back
/// to float evaluation for non-literal constants like `sin(1)`; NaN means no
/// usable constant.
fn constant_fold(e: &Expr) -> Option<Number> {
    match e.simplify() {
        Expr::Num(v) if !v.is_nan() => Some(v),
        other => {
            if !other.all_arguments_are_variables().iter().all(|v| {
                Expr::constant_value(v).is_some()
            }) {
                return None;
            }
            let v = other.eval_expression(vec![], &[]);
            if v.is_nan() { None } else { Some(Number::real(v)) }
        }
    }
}

fn add_coeffs(a: Vec<Number>, b: Vec<Number>, subtract: bool) -> Vec<Number> {
    let n = a.len().max(b.len());
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let x = a.get(i).cloned().unwrap_or_else(|| Number::int(0));
        let y = b.get(i).cloned().unwrap_or_else(|| Number::int(0));
        out.push(if subtract { x - y } else { x + y });
    }
    out
}

fn mul_coeffs(a: &[Number], b: &[Number]) -> Option<Vec<Number>> {
    if a.len() + b.len() > MAX_POLY_DEGREE + 2 {
        return None;
    }
    let mut out = vec![Number::int(0); a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] = out[i + j].clone() + x.clone() * y.clone();
        }
    }
    Some(out)
}

/// Folds negative zero into positive zero so computed roots compare equal to
/// literal zeros.
fn clean_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

fn clean_root(root: Number) -> Number {
    match root {
        Number::Real(v) => Number::Real(clean_zero(v)),
        other => other,
    }
}

fn trim_leading_zeros(mut coeffs: Vec<Number>) -> Vec<Number> {
    while coeffs.len() > 1 && coeffs.last().is_some_and(|c| c.is_zero()) {
        coeffs.pop();
    }
    coeffs
}

/// Root set of a dense ascending-coefficient polynomial.
fn equation_roots(coeffs: Vec<Number>, domain: Domain) -> SolutionSet {
    let coeffs = trim_leading_zeros(coeffs);
    if coeffs.iter().any(|c| c.is_nan()) {
        return SolutionSet::Empty;
    }
    match coeffs.len() {
        1 => {
            // 0 = c: every value or none
            if coeffs[0].is_zero() {
                SolutionSet::Universal(domain)
            } else {
                SolutionSet::Empty
            }
        }
        2 => {
            // a*x + b = 0, exact when the coefficients are rational
            let b = coeffs[0].clone();
            let a = coeffs[1].clone();
            let root = clean_root(-b / a);
            info!("linear root: {}", root);
            SolutionSet::finite(vec![Expr::Num(root)])
        }
        3 => {
            let c = coeffs[0].to_f64();
            let b = coeffs[1].to_f64();
            let a = coeffs[2].to_f64();
            let disc = b * b - 4.0 * a * c;
            if disc == 0.0 {
                // exact single root where coefficients allow it
                let root = clean_root(-coeffs[1].clone() / (Number::int(2) * coeffs[2].clone()));
                SolutionSet::finite(vec![Expr::Num(root)])
            } else if disc > 0.0 {
                let sq = disc.sqrt();
                let r1 = clean_zero((-b - sq) / (2.0 * a));
                let r2 = clean_zero((-b + sq) / (2.0 * a));
                let (lo, hi) = if r1 <= r2 { (r1, r2) } else { (r2, r1) };
                SolutionSet::finite(vec![Expr::real(lo), Expr::real(hi)])
            } else if domain == Domain::Complexes {
                let re = clean_zero(-b / (2.0 * a));
                let im = (-disc).sqrt() / (2.0 * a).abs();
                SolutionSet::finite(vec![
                    Expr::Num(Number::complex(re, -im)),
                    Expr::Num(Number::complex(re, im)),
                ])
            } else {
                SolutionSet::Empty
            }
        }
        n => {
            warn!("no closed form for a degree {} equation", n - 1);
            SolutionSet::Empty
        }
    }
}

/// Regions of the real line where the polynomial is strictly positive.
fn positive_regions(coeffs: Vec<Number>) -> SolutionSet {
    let coeffs = trim_leading_zeros(coeffs);
    if coeffs.iter().any(|c| c.is_nan()) {
        return SolutionSet::Empty;
    }
    match coeffs.len() {
        1 => {
            if coeffs[0].to_f64() > 0.0 {
                SolutionSet::reals()
            } else {
                SolutionSet::Empty
            }
        }
        2 => {
            let b = coeffs[0].clone();
            let a = coeffs[1].clone();
            let root = clean_root(-b / a.clone());
            if a.to_f64() > 0.0 {
                SolutionSet::interval(root, Number::real(f64::INFINITY), false, false)
            } else {
                SolutionSet::interval(Number::real(f64::NEG_INFINITY), root, false, false)
            }
        }
        3 => {
            let c = coeffs[0].to_f64();
            let b = coeffs[1].to_f64();
            let a = coeffs[2].to_f64();
            let disc = b * b - 4.0 * a * c;
            let upward = a > 0.0;
            if disc < 0.0 {
                // no real roots: one constant sign everywhere
                if upward {
                    SolutionSet::reals()
                } else {
                    SolutionSet::Empty
                }
            } else if disc == 0.0 {
                let root = clean_zero(-b / (2.0 * a));
                if upward {
                    SolutionSet::subtraction(
                        SolutionSet::reals(),
                        SolutionSet::finite(vec![Expr::real(root)]),
                    )
                } else {
                    SolutionSet::Empty
                }
            } else {
                let sq = disc.sqrt();
                let r1 = clean_zero((-b - sq) / (2.0 * a));
                let r2 = clean_zero((-b + sq) / (2.0 * a));
                let (lo, hi) = if r1 <= r2 { (r1, r2) } else { (r2, r1) };
                if upward {
                    SolutionSet::union(
                        SolutionSet::interval(
                            Number::real(f64::NEG_INFINITY),
                            Number::real(lo),
                            false,
                            false,
                        ),
                        SolutionSet::interval(
                            Number::real(hi),
                            Number::real(f64::INFINITY),
                            false,
                            false,
                        ),
                    )
                } else {
                    SolutionSet::interval(Number::real(lo), Number::real(hi), false, false)
                }
            }
        }
        n => {
            warn!("no closed form for a degree {} inequality", n - 1);
            SolutionSet::Empty
        }
    }
}

/// Bundles a statement, the unknown and the settings, with optional logger
/// setup, in the style of the numeric solver structs elsewhere in this
/// codebase.
pub struct StatementSolver {
    pub statement: Expr,
    pub unknown: String,
    pub settings: SymbolicSettings,
    /// "debug" | "info" | "warn" | "error" | "off"; None leaves logging as is
    pub loglevel: Option<String>,
    pub result: Option<SolutionSet>,
}

impl StatementSolver {
    pub fn new(statement: Expr, unknown: &str) -> StatementSolver {
        StatementSolver {
            statement,
            unknown: unknown.to_string(),
            settings: SymbolicSettings::default(),
            loglevel: Some("info".to_string()),
            result: None,
        }
    }

    /// Configures the terminal logger from `loglevel`, then solves.
    pub fn solve(&mut self) -> Result<SolutionSet, SymbolicError> {
        if let Some(level) = &self.loglevel {
            let level_filter = match level.as_str() {
                "debug" => LevelFilter::Debug,
                "info" => LevelFilter::Info,
                "warn" => LevelFilter::Warn,
                "error" => LevelFilter::Error,
                "off" => LevelFilter::Off,
                _ => LevelFilter::Info,
            };
            // a second init in the same process is fine to ignore
            let _ = CombinedLogger::init(vec![TermLogger::new(
                level_filter,
                Config::default(),
                TerminalMode::Mixed,
                ColorChoice::Auto,
            )]);
        }
        self.solver()
    }

    /// Solves without touching logger state.
    pub fn solver(&mut self) -> Result<SolutionSet, SymbolicError> {
        info!("solving {} for {}", self.statement, self.unknown);
        let result = solve_statement_with(&self.statement, &self.unknown, &self.settings)?;
        info!("solution set: {}", result);
        self.result = Some(result.clone());
        Ok(result)
    }

    pub fn get_result(&self) -> Option<&SolutionSet> {
        self.result.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solve(src: &str) -> SolutionSet {
        solve_statement(&Expr::parse_expression(src), "x").unwrap()
    }

    #[test]
    fn test_tautology_is_universal() {
        assert_eq!(solve("x = x"), SolutionSet::reals());
        assert_eq!(solve("0 = 0"), SolutionSet::reals());
    }

    #[test]
    fn test_contradiction_is_empty() {
        assert_eq!(solve("0 = 1"), SolutionSet::Empty);
    }

    #[test]
    fn test_linear_equation_is_exact() {
        // 2x + 1 = 0 has the exact rational root -1/2
        assert_eq!(
            solve("2 * x + 1 = 0"),
            SolutionSet::Finite(vec![Expr::Num(Number::int(-1) / Number::int(2))])
        );
        assert_eq!(solve("x + 3 = 5"), SolutionSet::Finite(vec![Expr::int(2)]));
    }

    #[test]
    fn test_quadratic_equation() {
        assert_eq!(
            solve("x^2 - 1 = 0"),
            SolutionSet::Finite(vec![Expr::real(-1.0), Expr::real(1.0)])
        );
        // double root
        assert_eq!(
            solve("x^2 - 2*x + 1 = 0"),
            SolutionSet::Finite(vec![Expr::Num(Number::int(1))])
        );
        // no real roots
        assert_eq!(solve("x^2 + 1 = 0"), SolutionSet::Empty);
    }

    #[test]
    fn test_quadratic_over_complexes() {
        // a complex literal in the statement switches the codomain
        let statement = Expr::Equals(
            (Expr::Var("x".to_string()).pow(Expr::int(2)) + Expr::int(1)).boxed(),
            (Expr::Num(Number::complex(0.0, 1.0)) * Expr::int(0)).boxed(),
        );
        let roots = solve_statement(&statement, "x").unwrap();
        assert_eq!(
            roots,
            SolutionSet::Finite(vec![
                Expr::Num(Number::complex(0.0, -1.0)),
                Expr::Num(Number::complex(0.0, 1.0)),
            ])
        );
    }

    #[test]
    fn test_strict_inequalities() {
        assert_eq!(
            solve("x > 0"),
            SolutionSet::interval(Number::int(0), Number::real(f64::INFINITY), false, false)
        );
        assert_eq!(
            solve("x < 5"),
            SolutionSet::interval(Number::real(f64::NEG_INFINITY), Number::int(5), false, false)
        );
    }

    #[test]
    fn test_non_strict_inequality_closes_endpoint() {
        assert_eq!(
            solve("x >= 2"),
            SolutionSet::Interval {
                left: Number::int(2),
                right: Number::real(f64::INFINITY),
                left_closed: true,
                right_closed: false
            }
        );
    }

    #[test]
    fn test_non_strict_less_keeps_endpoint() {
        assert_eq!(
            solve("x <= 0"),
            SolutionSet::Interval {
                left: Number::real(f64::NEG_INFINITY),
                right: Number::int(0),
                left_closed: false,
                right_closed: true
            }
        );
    }

    #[test]
    fn test_conjunction_intersects() {
        assert_eq!(
            solve("(x > 0) and (x < 5)"),
            SolutionSet::interval(Number::int(0), Number::int(5), false, false)
        );
    }

    #[test]
    fn test_disjunction_unions() {
        assert_eq!(
            solve("(x = 1) or (x = 2)"),
            SolutionSet::Finite(vec![Expr::Num(Number::int(1)), Expr::Num(Number::int(2))])
        );
        // a solution reached through two branches appears once
        assert_eq!(
            solve("(x = 1) or (x = 2) or (x = 1)"),
            SolutionSet::Finite(vec![Expr::Num(Number::int(1)), Expr::Num(Number::int(2))])
        );
    }

    #[test]
    fn test_implication() {
        // (x = 1) => (x = 1) is a tautology
        assert_eq!(solve("x = 1 => x = 1"), SolutionSet::reals());
    }

    #[test]
    fn test_quadratic_inequality() {
        // x^2 < 1 between the roots
        assert_eq!(
            solve("x^2 < 1"),
            SolutionSet::interval(Number::real(-1.0), Number::real(1.0), false, false)
        );
        // x^2 > -1 everywhere
        assert_eq!(solve("x^2 > -1"), SolutionSet::reals());
    }

    #[test]
    fn test_double_root_inequalities() {
        // (x - 1)^2 is never negative and zero only at 1
        assert_eq!(solve("x^2 < 2*x - 1"), SolutionSet::Empty);
        assert_eq!(
            solve("x^2 <= 2*x - 1"),
            SolutionSet::Finite(vec![Expr::real(1.0)])
        );
    }

    #[test]
    fn test_unsupported_shape_is_empty() {
        assert_eq!(solve("sin(x) = 0"), SolutionSet::Empty);
        assert_eq!(solve("x ^ 9 = 0"), SolutionSet::Empty);
    }

    #[test]
    fn test_constants_in_coefficients() {
        // pi * x > 0 behaves like x > 0
        assert_eq!(
            solve("pi * x > 0"),
            SolutionSet::interval(Number::real(0.0), Number::real(f64::INFINITY), false, false)
        );
    }

    #[test]
    fn test_free_second_variable_is_unsupported() {
        assert_eq!(solve("x + y = 0"), SolutionSet::Empty);
    }

    #[test]
    fn test_statement_solver_struct() {
        let mut solver = StatementSolver::new(Expr::parse_expression("x^2 - 4 = 0"), "x");
        solver.loglevel = Some("off".to_string());
        let result = solver.solve().unwrap();
        assert_eq!(
            result,
            SolutionSet::Finite(vec![Expr::real(-2.0), Expr::real(2.0)])
        );
        assert_eq!(solver.get_result(), Some(&result));
    }

    #[test]
    fn test_recursion_budget() {
        let settings = SymbolicSettings {
            max_recursion_depth: 2,
            ..Default::default()
        };
        let statement =
            Expr::parse_expression("((x > 0) and (x > 1)) and ((x > 2) and (x > 3))");
        assert_eq!(
            solve_statement_with(&statement, "x", &settings),
            Err(SymbolicError::RecursionBudgetExceeded { limit: 2 })
        );
    }
}
