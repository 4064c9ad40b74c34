//! # Symbolic Engine Module
//!
//! Core expression tree of the symbolic algebra engine. Expressions are
//! immutable: every transform (substitution, differentiation, simplification)
//! returns a new tree and unchanged sub-trees may be shared freely between
//! trees, which also makes concurrent read-only traversal safe.
//!
//! ## Main Structures and Methods
//!
//! ### `Expr` Enum
//! The core symbolic expression type supporting:
//! - **Variables**: `Var(String)` - symbolic variables like "x", "y"
//! - **Numbers**: `Num(Number)` - exact rationals, reals, complex values
//! - **Operations**: `Add`, `Sub`, `Mul`, `Div`, `Pow` - basic arithmetic
//! - **Functions**: `Exp`, `Ln`, `Log`, `sin`, `cos`, trig/hyperbolic and
//!   inverse families, `Abs`, `Signum`, `Factorial`
//! - **Placeholders**: `Derivative`, `Integral`, `Limit` - unevaluated
//!   higher-order nodes carrying (expression, variable, iteration count)
//! - **Conditionals**: `Piecewise`, `Provided`
//! - **Statements**: `Equals`, `Greater`, `GreaterOrEq`, `Less`, `LessOrEq`,
//!   `And`, `Or`, `Implies` - usable both as sub-expressions and as solver
//!   input
//! - **Tensor**: n-dimensional array of expressions, traversed element-wise
//!
//! ### Key Methods
//! - `Symbols(symbols: &str)` - create multiple variables from a comma-separated string
//! - `children()` / `map_children()` - enumerate / rebuild direct operands
//! - `contains_variable()`, `substitute_variable()`, `set_variable()` - tree rewriting
//! - `create_unique()` - fresh indexed variable that collides with nothing in the tree
//! - `eval_expression()` - direct numeric evaluation
//!
//! Structural equality and hashing are deep (node kind + ordered children);
//! a NaN number is structurally equal to itself so rewriting recognizes the
//! "undefined" sentinel it produced earlier.

#![allow(non_camel_case_types)]

use crate::symbolic::numeric::Number;
use itertools::Itertools;
use std::f64::consts::{E, PI};
use std::fmt;

/// Precedence class of a node, loosest binding first. Used by the printer to
/// decide parenthesization and mirrored by the parser's rule nesting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Implies,
    Or,
    And,
    Relational,
    Additive,
    Multiplicative,
    Pow,
    Postfix,
    Function,
    Leaf,
}

/// Value domain an expression ranges over; supplies the universal set for
/// complement operations in the inequality solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Domain {
    Reals,
    Complexes,
}

impl Domain {
    pub fn join(self, other: Domain) -> Domain {
        if self == Domain::Complexes || other == Domain::Complexes {
            Domain::Complexes
        } else {
            Domain::Reals
        }
    }
}

/// Core symbolic expression enum representing mathematical expressions as an
/// abstract syntax tree. Uses Box<Expr> for recursive structure, allowing
/// arbitrarily deep expression trees.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Expr {
    /// Symbolic variable with a name (e.g., "x", "y", "velocity")
    Var(String),
    /// Numeric literal (rational / real / complex, NaN = "undefined")
    Num(Number),
    /// Addition operation: left + right
    Add(Box<Expr>, Box<Expr>),
    /// Subtraction operation: left - right
    Sub(Box<Expr>, Box<Expr>),
    /// Multiplication operation: left * right
    Mul(Box<Expr>, Box<Expr>),
    /// Division operation: left / right
    Div(Box<Expr>, Box<Expr>),
    /// Power operation: base ^ exponent
    Pow(Box<Expr>, Box<Expr>),
    /// Exponential function: e^x
    Exp(Box<Expr>),
    /// Natural logarithm: ln(x)
    Ln(Box<Expr>),
    /// Logarithm with explicit base: log(base, antilogarithm)
    Log(Box<Expr>, Box<Expr>),
    /// Absolute value
    Abs(Box<Expr>),
    /// Sign function: -1, 0 or 1
    Signum(Box<Expr>),
    /// Factorial, postfix `!`
    Factorial(Box<Expr>),
    /// Sine
    sin(Box<Expr>),
    /// Cosine
    cos(Box<Expr>),
    /// Tangent - mathematical notation 'tg'
    tg(Box<Expr>),
    /// Cotangent - mathematical notation 'ctg'
    ctg(Box<Expr>),
    /// Secant
    sec(Box<Expr>),
    /// Cosecant
    csc(Box<Expr>),
    /// Arcsine
    arcsin(Box<Expr>),
    /// Arccosine
    arccos(Box<Expr>),
    /// Arctangent - mathematical notation 'arctg'
    arctg(Box<Expr>),
    /// Arccotangent - mathematical notation 'arcctg'
    arcctg(Box<Expr>),
    /// Arcsecant
    arcsec(Box<Expr>),
    /// Arccosecant
    arccsc(Box<Expr>),
    /// Hyperbolic sine - mathematical notation 'sh'
    sh(Box<Expr>),
    /// Hyperbolic cosine - mathematical notation 'ch'
    ch(Box<Expr>),
    /// Hyperbolic tangent - mathematical notation 'th'
    th(Box<Expr>),
    /// Hyperbolic cotangent - mathematical notation 'cth'
    cth(Box<Expr>),
    /// Inverse hyperbolic sine
    arsh(Box<Expr>),
    /// Inverse hyperbolic cosine
    arch(Box<Expr>),
    /// Inverse hyperbolic tangent
    arth(Box<Expr>),
    /// Inverse hyperbolic cotangent
    arcth(Box<Expr>),
    /// Unevaluated derivative placeholder: (expression, variable, order)
    Derivative(Box<Expr>, String, i64),
    /// Unevaluated integral placeholder: (expression, variable, order)
    Integral(Box<Expr>, String, i64),
    /// Unevaluated limit placeholder: (expression, variable, order)
    Limit(Box<Expr>, String, i64),
    /// Guarded expression: value provided the predicate holds, undefined otherwise
    Provided(Box<Expr>, Box<Expr>),
    /// Ordered sequence of (expression, predicate) cases; first matching case wins
    Piecewise(Vec<(Expr, Expr)>),
    /// Equation statement: left = right
    Equals(Box<Expr>, Box<Expr>),
    /// Strict greater-than statement
    Greater(Box<Expr>, Box<Expr>),
    /// Greater-or-equal statement
    GreaterOrEq(Box<Expr>, Box<Expr>),
    /// Strict less-than statement
    Less(Box<Expr>, Box<Expr>),
    /// Less-or-equal statement
    LessOrEq(Box<Expr>, Box<Expr>),
    /// Boolean conjunction
    And(Box<Expr>, Box<Expr>),
    /// Boolean disjunction
    Or(Box<Expr>, Box<Expr>),
    /// Boolean implication
    Implies(Box<Expr>, Box<Expr>),
    /// n-dimensional array of expressions with a shape; element-wise traversal
    Tensor(Vec<Expr>, Vec<usize>),
}

impl Expr {
    /// BASIC FEATURES

    /// Creates multiple symbolic variables from a comma-separated string.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let vars = Expr::Symbols("x, y, z");
    /// assert_eq!(vars.len(), 3);
    /// ```
    pub fn Symbols(symbols: &str) -> Vec<Expr> {
        symbols
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| Expr::Var(s.to_string()))
            .collect()
    }

    /// Integer literal constructor (exact rational)
    pub fn int(value: i64) -> Expr {
        Expr::Num(Number::int(value))
    }

    /// Real literal constructor
    pub fn real(value: f64) -> Expr {
        Expr::Num(Number::real(value))
    }

    /// Convenience method to wrap expression in Box for recursive structures.
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    /// Creates power expression self^rhs.
    pub fn pow(self, rhs: Expr) -> Expr {
        Expr::Pow(self.boxed(), rhs.boxed())
    }

    /// Creates exponential function e^(self).
    pub fn exp(self) -> Expr {
        Expr::Exp(self.boxed())
    }

    /// Creates natural logarithm ln(self).
    pub fn ln(self) -> Expr {
        Expr::Ln(self.boxed())
    }

    /// Creates absolute value |self|.
    pub fn abs_expr(self) -> Expr {
        Expr::Abs(self.boxed())
    }

    /// Creates the sign function of self.
    pub fn signum_expr(self) -> Expr {
        Expr::Signum(self.boxed())
    }

    /// Checks if expression is exactly the number zero.
    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Num(v) if v.is_zero())
    }

    /// Checks if expression is exactly the number one.
    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Num(v) if v.is_one())
    }

    /// Checks if expression is the NaN "undefined" sentinel.
    pub fn is_nan(&self) -> bool {
        matches!(self, Expr::Num(v) if v.is_nan())
    }

    /// Fixed lookup table of recognized mathematical constants. Any variable
    /// name outside this table is a free variable.
    pub fn constant_value(name: &str) -> Option<Number> {
        match name {
            "pi" => Some(Number::real(PI)),
            "e" => Some(Number::real(E)),
            _ => None,
        }
    }

    /// Precedence class of this node, used for printing.
    pub fn priority(&self) -> Priority {
        match self {
            Expr::Implies(..) => Priority::Implies,
            Expr::Or(..) => Priority::Or,
            Expr::And(..) => Priority::And,
            Expr::Equals(..)
            | Expr::Greater(..)
            | Expr::GreaterOrEq(..)
            | Expr::Less(..)
            | Expr::LessOrEq(..) => Priority::Relational,
            Expr::Add(..) | Expr::Sub(..) => Priority::Additive,
            Expr::Mul(..) | Expr::Div(..) => Priority::Multiplicative,
            Expr::Pow(..) => Priority::Pow,
            Expr::Factorial(..) => Priority::Postfix,
            Expr::Var(_) | Expr::Num(_) | Expr::Tensor(..) => Priority::Leaf,
            _ => Priority::Function,
        }
    }

    /// Value domain the expression ranges over: complex as soon as a complex
    /// literal appears anywhere in the tree, real otherwise.
    pub fn codomain(&self) -> Domain {
        if let Expr::Num(v) = self {
            if v.is_properly_complex() {
                return Domain::Complexes;
            }
        }
        self.children()
            .into_iter()
            .fold(Domain::Reals, |d, c| d.join(c.codomain()))
    }

    /// Enumerates the direct children of this node, in operand order.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Var(_) | Expr::Num(_) => vec![],
            Expr::Add(l, r)
            | Expr::Sub(l, r)
            | Expr::Mul(l, r)
            | Expr::Div(l, r)
            | Expr::Pow(l, r)
            | Expr::Log(l, r)
            | Expr::Provided(l, r)
            | Expr::Equals(l, r)
            | Expr::Greater(l, r)
            | Expr::GreaterOrEq(l, r)
            | Expr::Less(l, r)
            | Expr::LessOrEq(l, r)
            | Expr::And(l, r)
            | Expr::Or(l, r)
            | Expr::Implies(l, r) => vec![l, r],
            Expr::Exp(a)
            | Expr::Ln(a)
            | Expr::Abs(a)
            | Expr::Signum(a)
            | Expr::Factorial(a)
            | Expr::sin(a)
            | Expr::cos(a)
            | Expr::tg(a)
            | Expr::ctg(a)
            | Expr::sec(a)
            | Expr::csc(a)
            | Expr::arcsin(a)
            | Expr::arccos(a)
            | Expr::arctg(a)
            | Expr::arcctg(a)
            | Expr::arcsec(a)
            | Expr::arccsc(a)
            | Expr::sh(a)
            | Expr::ch(a)
            | Expr::th(a)
            | Expr::cth(a)
            | Expr::arsh(a)
            | Expr::arch(a)
            | Expr::arth(a)
            | Expr::arcth(a)
            | Expr::Derivative(a, _, _)
            | Expr::Integral(a, _, _)
            | Expr::Limit(a, _, _) => vec![a],
            Expr::Piecewise(cases) => cases.iter().flat_map(|(e, p)| [e, p]).collect(),
            Expr::Tensor(elems, _) => elems.iter().collect(),
        }
    }

    /// Rebuilds this node from transformed children, preserving the node kind
    /// and any non-expression payload (variable names, orders, shapes).
    pub fn map_children<F: FnMut(&Expr) -> Expr>(&self, f: &mut F) -> Expr {
        match self {
            Expr::Var(_) | Expr::Num(_) => self.clone(),
            Expr::Add(l, r) => Expr::Add(f(l).boxed(), f(r).boxed()),
            Expr::Sub(l, r) => Expr::Sub(f(l).boxed(), f(r).boxed()),
            Expr::Mul(l, r) => Expr::Mul(f(l).boxed(), f(r).boxed()),
            Expr::Div(l, r) => Expr::Div(f(l).boxed(), f(r).boxed()),
            Expr::Pow(l, r) => Expr::Pow(f(l).boxed(), f(r).boxed()),
            Expr::Log(l, r) => Expr::Log(f(l).boxed(), f(r).boxed()),
            Expr::Exp(a) => Expr::Exp(f(a).boxed()),
            Expr::Ln(a) => Expr::Ln(f(a).boxed()),
            Expr::Abs(a) => Expr::Abs(f(a).boxed()),
            Expr::Signum(a) => Expr::Signum(f(a).boxed()),
            Expr::Factorial(a) => Expr::Factorial(f(a).boxed()),
            Expr::sin(a) => Expr::sin(f(a).boxed()),
            Expr::cos(a) => Expr::cos(f(a).boxed()),
            Expr::tg(a) => Expr::tg(f(a).boxed()),
            Expr::ctg(a) => Expr::ctg(f(a).boxed()),
            Expr::sec(a) => Expr::sec(f(a).boxed()),
            Expr::csc(a) => Expr::csc(f(a).boxed()),
            Expr::arcsin(a) => Expr::arcsin(f(a).boxed()),
            Expr::arccos(a) => Expr::arccos(f(a).boxed()),
            Expr::arctg(a) => Expr::arctg(f(a).boxed()),
            Expr::arcctg(a) => Expr::arcctg(f(a).boxed()),
            Expr::arcsec(a) => Expr::arcsec(f(a).boxed()),
            Expr::arccsc(a) => Expr::arccsc(f(a).boxed()),
            Expr::sh(a) => Expr::sh(f(a).boxed()),
            Expr::ch(a) => Expr::ch(f(a).boxed()),
            Expr::th(a) => Expr::th(f(a).boxed()),
            Expr::cth(a) => Expr::cth(f(a).boxed()),
            Expr::arsh(a) => Expr::arsh(f(a).boxed()),
            Expr::arch(a) => Expr::arch(f(a).boxed()),
            Expr::arth(a) => Expr::arth(f(a).boxed()),
            Expr::arcth(a) => Expr::arcth(f(a).boxed()),
            Expr::Derivative(a, v, n) => Expr::Derivative(f(a).boxed(), v.clone(), *n),
            Expr::Integral(a, v, n) => Expr::Integral(f(a).boxed(), v.clone(), *n),
            Expr::Limit(a, v, n) => Expr::Limit(f(a).boxed(), v.clone(), *n),
            Expr::Provided(e, p) => Expr::Provided(f(e).boxed(), f(p).boxed()),
            Expr::Piecewise(cases) => {
                Expr::Piecewise(cases.iter().map(|(e, p)| (f(e), f(p))).collect())
            }
            Expr::Equals(l, r) => Expr::Equals(f(l).boxed(), f(r).boxed()),
            Expr::Greater(l, r) => Expr::Greater(f(l).boxed(), f(r).boxed()),
            Expr::GreaterOrEq(l, r) => Expr::GreaterOrEq(f(l).boxed(), f(r).boxed()),
            Expr::Less(l, r) => Expr::Less(f(l).boxed(), f(r).boxed()),
            Expr::LessOrEq(l, r) => Expr::LessOrEq(f(l).boxed(), f(r).boxed()),
            Expr::And(l, r) => Expr::And(f(l).boxed(), f(r).boxed()),
            Expr::Or(l, r) => Expr::Or(f(l).boxed(), f(r).boxed()),
            Expr::Implies(l, r) => Expr::Implies(f(l).boxed(), f(r).boxed()),
            Expr::Tensor(elems, shape) => {
                Expr::Tensor(elems.iter().map(|e| f(e)).collect(), shape.clone())
            }
        }
    }

    /// Extracts all unique variable names from the symbolic expression,
    /// sorted and deduplicated. Bound variables of derivative/integral/limit
    /// placeholders count as occurrences.
    pub fn all_arguments_are_variables(&self) -> Vec<String> {
        fn walk(e: &Expr, out: &mut Vec<String>) {
            match e {
                Expr::Var(name) => out.push(name.clone()),
                Expr::Derivative(_, v, _) | Expr::Integral(_, v, _) | Expr::Limit(_, v, _) => {
                    out.push(v.clone())
                }
                _ => {}
            }
            for c in e.children() {
                walk(c, out);
            }
        }
        let mut vars = Vec::new();
        walk(self, &mut vars);
        vars.into_iter().sorted().dedup().collect()
    }

    /// check if the expression contains a variable
    pub fn contains_variable(&self, var_name: &str) -> bool {
        match self {
            Expr::Var(name) => name == var_name,
            Expr::Derivative(a, v, _) | Expr::Integral(a, v, _) | Expr::Limit(a, v, _) => {
                v == var_name || a.contains_variable(var_name)
            }
            _ => self.children().iter().any(|c| c.contains_variable(var_name)),
        }
    }

    /// substitute a variable with an expression
    pub fn substitute_variable(&self, var: &str, replacement: &Expr) -> Expr {
        match self {
            Expr::Var(name) if name == var => replacement.clone(),
            _ => self.map_children(&mut |c| c.substitute_variable(var, replacement)),
        }
    }

    /// Substitutes a variable with a constant value throughout the expression.
    pub fn set_variable(&self, var: &str, value: f64) -> Expr {
        self.substitute_variable(var, &Expr::real(value))
    }

    /// Renames a variable throughout the expression, bound placeholder
    /// variables included.
    pub fn rename_variable(&self, old_var: &str, new_var: &str) -> Expr {
        match self {
            Expr::Var(name) if name == old_var => Expr::Var(new_var.to_string()),
            Expr::Derivative(a, v, n) if v == old_var => Expr::Derivative(
                a.rename_variable(old_var, new_var).boxed(),
                new_var.to_string(),
                *n,
            ),
            Expr::Integral(a, v, n) if v == old_var => Expr::Integral(
                a.rename_variable(old_var, new_var).boxed(),
                new_var.to_string(),
                *n,
            ),
            Expr::Limit(a, v, n) if v == old_var => Expr::Limit(
                a.rename_variable(old_var, new_var).boxed(),
                new_var.to_string(),
                *n,
            ),
            _ => self.map_children(&mut |c| c.rename_variable(old_var, new_var)),
        }
    }

    /// Finds the next unused indexed variable `prefix_<k>` (k starting at 1)
    /// that collides with no variable already present in the expression.
    ///
    /// `x + n_1 + n_3` with prefix "n" yields `n_2`.
    pub fn create_unique(&self, prefix: &str) -> Expr {
        let mut taken = std::collections::HashSet::new();
        for name in self.all_arguments_are_variables() {
            if let Some(rest) = name.strip_prefix(prefix).and_then(|r| r.strip_prefix('_')) {
                if let Ok(k) = rest.parse::<usize>() {
                    taken.insert(k);
                }
            }
        }
        let mut i = 1;
        while taken.contains(&i) {
            i += 1;
        }
        Expr::Var(format!("{}_{}", prefix, i))
    }

    /// DIRECT EXPRESSION EVALUATION

    /// Evaluates the expression numerically with given variable values.
    ///
    /// Recognized constants (pi, e) evaluate from the constant table; an
    /// unknown variable, an unevaluated placeholder node or a failed guard
    /// evaluates to NaN. Numeric undefinedness is data here, never a panic.
    /// Boolean statements evaluate to 1.0 (true) or 0.0 (false).
    pub fn eval_expression(&self, vars: Vec<&str>, values: &[f64]) -> f64 {
        let ev = |e: &Expr| e.eval_expression(vars.clone(), values);
        match self {
            Expr::Var(name) => match Expr::constant_value(name) {
                Some(v) => v.to_f64(),
                None => vars
                    .iter()
                    .position(|x| x == name)
                    .and_then(|i| values.get(i).copied())
                    .unwrap_or(f64::NAN),
            },
            Expr::Num(v) => v.to_f64(),
            Expr::Add(l, r) => ev(l) + ev(r),
            Expr::Sub(l, r) => ev(l) - ev(r),
            Expr::Mul(l, r) => ev(l) * ev(r),
            Expr::Div(l, r) => ev(l) / ev(r),
            Expr::Pow(base, exp) => ev(base).powf(ev(exp)),
            Expr::Exp(a) => ev(a).exp(),
            Expr::Ln(a) => ev(a).ln(),
            Expr::Log(b, a) => ev(a).ln() / ev(b).ln(),
            Expr::Abs(a) => ev(a).abs(),
            Expr::Signum(a) => {
                let v = ev(a);
                if v == 0.0 { 0.0 } else { v.signum() }
            }
            Expr::Factorial(a) => {
                let v = ev(a);
                if v >= 0.0 && v.fract() == 0.0 && v <= 170.0 {
                    (1..=(v as u64)).map(|k| k as f64).product()
                } else {
                    f64::NAN
                }
            }
            Expr::sin(a) => ev(a).sin(),
            Expr::cos(a) => ev(a).cos(),
            Expr::tg(a) => ev(a).tan(),
            Expr::ctg(a) => 1.0 / ev(a).tan(),
            Expr::sec(a) => 1.0 / ev(a).cos(),
            Expr::csc(a) => 1.0 / ev(a).sin(),
            Expr::arcsin(a) => ev(a).asin(),
            Expr::arccos(a) => ev(a).acos(),
            Expr::arctg(a) => ev(a).atan(),
            Expr::arcctg(a) => PI / 2.0 - ev(a).atan(),
            Expr::arcsec(a) => (1.0 / ev(a)).acos(),
            Expr::arccsc(a) => (1.0 / ev(a)).asin(),
            Expr::sh(a) => ev(a).sinh(),
            Expr::ch(a) => ev(a).cosh(),
            Expr::th(a) => ev(a).tanh(),
            Expr::cth(a) => 1.0 / ev(a).tanh(),
            Expr::arsh(a) => ev(a).asinh(),
            Expr::arch(a) => ev(a).acosh(),
            Expr::arth(a) => ev(a).atanh(),
            Expr::arcth(a) => {
                let v = ev(a);
                0.5 * ((v + 1.0) / (v - 1.0)).ln()
            }
            Expr::Derivative(..) | Expr::Integral(..) | Expr::Limit(..) => f64::NAN,
            Expr::Provided(e, p) => {
                if ev(p) != 0.0 { ev(e) } else { f64::NAN }
            }
            Expr::Piecewise(cases) => {
                for (e, p) in cases {
                    if ev(p) != 0.0 {
                        return ev(e);
                    }
                }
                f64::NAN
            }
            Expr::Equals(l, r) => (ev(l) == ev(r)) as u8 as f64,
            Expr::Greater(l, r) => (ev(l) > ev(r)) as u8 as f64,
            Expr::GreaterOrEq(l, r) => (ev(l) >= ev(r)) as u8 as f64,
            Expr::Less(l, r) => (ev(l) < ev(r)) as u8 as f64,
            Expr::LessOrEq(l, r) => (ev(l) <= ev(r)) as u8 as f64,
            Expr::And(l, r) => ((ev(l) != 0.0) && (ev(r) != 0.0)) as u8 as f64,
            Expr::Or(l, r) => ((ev(l) != 0.0) || (ev(r) != 0.0)) as u8 as f64,
            Expr::Implies(l, r) => ((ev(l) == 0.0) || (ev(r) != 0.0)) as u8 as f64,
            Expr::Tensor(..) => f64::NAN,
        }
    }
}

/// Writes a child operand, parenthesized when its precedence binds looser
/// than the parent (or equally, for the non-associative side).
fn fmt_operand(
    f: &mut fmt::Formatter,
    child: &Expr,
    parent: Priority,
    parens_on_equal: bool,
) -> fmt::Result {
    let cp = child.priority();
    if cp < parent || (cp == parent && parens_on_equal) {
        write!(f, "({})", child)
    } else {
        write!(f, "{}", child)
    }
}

fn fmt_binary(
    f: &mut fmt::Formatter,
    l: &Expr,
    op: &str,
    r: &Expr,
    prio: Priority,
    right_parens_on_equal: bool,
) -> fmt::Result {
    fmt_operand(f, l, prio, false)?;
    write!(f, " {} ", op)?;
    fmt_operand(f, r, prio, right_parens_on_equal)
}

fn fmt_call(f: &mut fmt::Formatter, name: &str, arg: &Expr) -> fmt::Result {
    write!(f, "{}({})", name, arg)
}

/// Display implementation for pretty printing symbolic expressions.
/// Parentheses are driven by node priority, so the printed form re-parses to
/// the same tree.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Num(v) => write!(f, "{}", v),
            Expr::Add(l, r) => fmt_binary(f, l, "+", r, Priority::Additive, false),
            Expr::Sub(l, r) => fmt_binary(f, l, "-", r, Priority::Additive, true),
            Expr::Mul(l, r) => fmt_binary(f, l, "*", r, Priority::Multiplicative, false),
            Expr::Div(l, r) => fmt_binary(f, l, "/", r, Priority::Multiplicative, true),
            Expr::Pow(base, exp) => {
                // right-associative, so the base side parenthesizes on equal priority
                fmt_operand(f, base, Priority::Pow, true)?;
                write!(f, " ^ ")?;
                fmt_operand(f, exp, Priority::Pow, false)
            }
            Expr::Exp(a) => fmt_call(f, "exp", a),
            Expr::Ln(a) => fmt_call(f, "ln", a),
            Expr::Log(b, a) => write!(f, "log({}, {})", b, a),
            Expr::Abs(a) => fmt_call(f, "abs", a),
            Expr::Signum(a) => fmt_call(f, "sign", a),
            Expr::Factorial(a) => {
                fmt_operand(f, a, Priority::Postfix, false)?;
                write!(f, "!")
            }
            Expr::sin(a) => fmt_call(f, "sin", a),
            Expr::cos(a) => fmt_call(f, "cos", a),
            Expr::tg(a) => fmt_call(f, "tg", a),
            Expr::ctg(a) => fmt_call(f, "ctg", a),
            Expr::sec(a) => fmt_call(f, "sec", a),
            Expr::csc(a) => fmt_call(f, "csc", a),
            Expr::arcsin(a) => fmt_call(f, "arcsin", a),
            Expr::arccos(a) => fmt_call(f, "arccos", a),
            Expr::arctg(a) => fmt_call(f, "arctg", a),
            Expr::arcctg(a) => fmt_call(f, "arcctg", a),
            Expr::arcsec(a) => fmt_call(f, "arcsec", a),
            Expr::arccsc(a) => fmt_call(f, "arccsc", a),
            Expr::sh(a) => fmt_call(f, "sh", a),
            Expr::ch(a) => fmt_call(f, "ch", a),
            Expr::th(a) => fmt_call(f, "th", a),
            Expr::cth(a) => fmt_call(f, "cth", a),
            Expr::arsh(a) => fmt_call(f, "arsh", a),
            Expr::arch(a) => fmt_call(f, "arch", a),
            Expr::arth(a) => fmt_call(f, "arth", a),
            Expr::arcth(a) => fmt_call(f, "arcth", a),
            Expr::Derivative(a, v, n) => write!(f, "derivative({}, {}, {})", a, v, n),
            Expr::Integral(a, v, n) => write!(f, "integral({}, {}, {})", a, v, n),
            Expr::Limit(a, v, n) => write!(f, "limit({}, {}, {})", a, v, n),
            Expr::Provided(e, p) => write!(f, "provided({}, {})", e, p),
            Expr::Piecewise(cases) => {
                write!(f, "piecewise(")?;
                for (i, (e, p)) in cases.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}, {}", e, p)?;
                }
                write!(f, ")")
            }
            Expr::Equals(l, r) => fmt_binary(f, l, "=", r, Priority::Relational, true),
            Expr::Greater(l, r) => fmt_binary(f, l, ">", r, Priority::Relational, true),
            Expr::GreaterOrEq(l, r) => fmt_binary(f, l, ">=", r, Priority::Relational, true),
            Expr::Less(l, r) => fmt_binary(f, l, "<", r, Priority::Relational, true),
            Expr::LessOrEq(l, r) => fmt_binary(f, l, "<=", r, Priority::Relational, true),
            Expr::And(l, r) => fmt_binary(f, l, "and", r, Priority::And, false),
            Expr::Or(l, r) => fmt_binary(f, l, "or", r, Priority::Or, false),
            Expr::Implies(l, r) => fmt_binary(f, l, "=>", r, Priority::Implies, true),
            Expr::Tensor(elems, _) => {
                write!(f, "[")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Div(self.boxed(), rhs.boxed())
    }
}

impl std::ops::AddAssign for Expr {
    fn add_assign(&mut self, rhs: Self) {
        *self = Expr::Add(Box::new(self.clone()), Box::new(rhs));
    }
}

impl std::ops::SubAssign for Expr {
    fn sub_assign(&mut self, rhs: Self) {
        *self = Expr::Sub(Box::new(self.clone()), Box::new(rhs));
    }
}

impl std::ops::MulAssign for Expr {
    fn mul_assign(&mut self, rhs: Self) {
        *self = Expr::Mul(Box::new(self.clone()), Box::new(rhs));
    }
}

impl std::ops::DivAssign for Expr {
    fn div_assign(&mut self, rhs: Self) {
        *self = Expr::Div(Box::new(self.clone()), Box::new(rhs));
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Mul(Box::new(Expr::int(-1)), Box::new(self))
    }
}

//___________________________________MACROS____________________________________

/// Macro to create symbolic variables from a comma-separated list
/// Usage: symbols!(x, y, z) -> creates variables x, y, z
#[macro_export]
macro_rules! symbols {
    ($($var:ident),+ $(,)?) => {
        {
            let var_names = stringify!($($var),+);
            let vars = Expr::Symbols(var_names);
            let mut iter = vars.into_iter();
            ($(
                {
                    let $var = iter.next().unwrap();
                    $var
                }
            ),+)
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_equality_is_deep() {
        let a = Expr::Var("x".to_string()) + Expr::int(2);
        let b = Expr::Var("x".to_string()) + Expr::int(2);
        assert_eq!(a, b);
        let c = Expr::int(2) + Expr::Var("x".to_string());
        assert_ne!(a, c); // ordered children, no commutativity
    }

    #[test]
    fn test_equal_trees_hash_equal() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        let hash = |e: &Expr| {
            let mut h = DefaultHasher::new();
            e.hash(&mut h);
            h.finish()
        };
        let a = Expr::sin(Expr::Var("x".to_string()).boxed()) * Expr::int(3);
        let b = Expr::sin(Expr::Var("x".to_string()).boxed()) * Expr::int(3);
        assert_eq!(hash(&a), hash(&b));
    }

    #[test]
    fn test_nan_subtree_equals_itself() {
        let a = Expr::Num(Number::nan()) + Expr::Var("x".to_string());
        let b = Expr::Num(Number::nan()) + Expr::Var("x".to_string());
        assert_eq!(a, b);
    }

    #[test]
    fn test_children_order() {
        let e = Expr::Div(
            Expr::Var("a".to_string()).boxed(),
            Expr::Var("b".to_string()).boxed(),
        );
        let kids = e.children();
        assert_eq!(kids.len(), 2);
        assert_eq!(*kids[0], Expr::Var("a".to_string()));
        assert_eq!(*kids[1], Expr::Var("b".to_string()));
    }

    #[test]
    fn test_substitute_variable_leaves_original_untouched() {
        let e = Expr::Var("x".to_string()) * Expr::Var("y".to_string());
        let replaced = e.substitute_variable("x", &Expr::int(2));
        assert_eq!(replaced, Expr::int(2) * Expr::Var("y".to_string()));
        assert_eq!(e, Expr::Var("x".to_string()) * Expr::Var("y".to_string()));
    }

    #[test]
    fn test_all_arguments_are_variables() {
        let e = Expr::parse_expression("x^2 + y*z + x");
        assert_eq!(e.all_arguments_are_variables(), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_create_unique_skips_taken_indices() {
        let e = Expr::parse_expression("x + n_1 + n_3");
        assert_eq!(e.create_unique("n"), Expr::Var("n_2".to_string()));
        let e2 = Expr::parse_expression("x + n_1 + n_2");
        assert_eq!(e2.create_unique("n"), Expr::Var("n_3".to_string()));
    }

    #[test]
    fn test_eval_constants_table() {
        let e = Expr::parse_expression("sin(pi)");
        assert!(e.eval_expression(vec![], &[]).abs() < 1e-11);
        let e = Expr::parse_expression("ln(e)");
        assert!((e.eval_expression(vec![], &[]) - 1.0).abs() < 1e-11);
    }

    #[test]
    fn test_eval_statements_are_boolean() {
        let e = Expr::parse_expression("(x > 0) and (x < 5)");
        assert_eq!(e.eval_expression(vec!["x"], &[3.0]), 1.0);
        assert_eq!(e.eval_expression(vec!["x"], &[7.0]), 0.0);
    }

    #[test]
    fn test_display_respects_priority() {
        let e = (Expr::Var("x".to_string()) + Expr::int(1)) * Expr::int(2);
        assert_eq!(format!("{}", e), "(x + 1) * 2");
        let e = Expr::Var("x".to_string()) + Expr::int(1) * Expr::int(2);
        assert_eq!(format!("{}", e), "x + 1 * 2");
    }

    #[test]
    fn test_symbols_macro() {
        let (x, y) = symbols!(x, y);
        assert_eq!(x, Expr::Var("x".to_string()));
        assert_eq!(y, Expr::Var("y".to_string()));
    }

    #[test]
    fn test_codomain_join() {
        let real = Expr::parse_expression("x + 1");
        assert_eq!(real.codomain(), Domain::Reals);
        let complex = Expr::Var("x".to_string()) + Expr::Num(Number::complex(0.0, 1.0));
        assert_eq!(complex.codomain(), Domain::Complexes);
    }
}
