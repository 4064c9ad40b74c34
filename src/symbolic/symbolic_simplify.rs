//! # Symbolic Expression Simplification Module
//!
//! Algebraic simplification for symbolic expressions. The pass is a bounded
//! fixpoint loop over one bottom-up rewrite sweep, so every rule only has to
//! handle the local node shape and repeated application takes care of the
//! rest.
//!
//! ## Simplification Strategy
//!
//! 1. **Constant Folding**: arithmetic on numeric literals folds through the
//!    exact number tower (rational stays rational, NaN propagates)
//! 2. **Algebraic Identities**: x + 0 = x, x * 1 = x, x - x = 0, x / x = 1
//! 3. **Power Rules**: x^0 = 1, x^1 = x, (a^b)^c = a^(b*c), a^b * a^c = a^(b+c)
//! 4. **Inverse Pairs**: exp(ln(x)) = x, ln(exp(x)) = x
//! 5. **Special Values**: sin(0) = 0, cos(0) = 1, ln(1) = 0, small factorials
//!
//! Simplification never invents undefinedness: rules that would be wrong for
//! NaN operands (like x * 0 = 0) check for the sentinel first. Conditional,
//! relational and placeholder nodes keep their shape and only simplify their
//! children.

use crate::symbolic::numeric::Number;
use crate::symbolic::symbolic_engine::Expr;

/// Upper bound on fixpoint sweeps; a non-pathological tree settles in a few.
const MAX_SIMPLIFY_PASSES: usize = 64;

impl Expr {
    /// Simplifies the expression to a fixpoint of the rewrite rules.
    pub fn simplify(&self) -> Expr {
        let mut current = self.clone();
        for _ in 0..MAX_SIMPLIFY_PASSES {
            let next = current.simplify_once();
            if next == current {
                return next;
            }
            current = next;
        }
        current
    }

    /// One bottom-up sweep: children first, then local rules at this node.
    fn simplify_once(&self) -> Expr {
        let node = self.map_children(&mut |c| c.simplify_once());
        apply_local_rules(node)
    }
}

fn num(e: &Expr) -> Option<&Number> {
    match e {
        Expr::Num(v) => Some(v),
        _ => None,
    }
}

fn apply_local_rules(e: Expr) -> Expr {
    match e {
        Expr::Add(l, r) => {
            if let (Some(a), Some(b)) = (num(&l), num(&r)) {
                return Expr::Num(a.clone() + b.clone());
            }
            if l.is_zero() {
                return *r;
            }
            if r.is_zero() {
                return *l;
            }
            Expr::Add(l, r)
        }
        Expr::Sub(l, r) => {
            if let (Some(a), Some(b)) = (num(&l), num(&r)) {
                return Expr::Num(a.clone() - b.clone());
            }
            if r.is_zero() {
                return *l;
            }
            if l.is_zero() {
                return Expr::Mul(Expr::int(-1).boxed(), r);
            }
            if l == r {
                return Expr::int(0);
            }
            Expr::Sub(l, r)
        }
        Expr::Mul(l, r) => {
            if let (Some(a), Some(b)) = (num(&l), num(&r)) {
                return Expr::Num(a.clone() * b.clone());
            }
            // annihilation is unsound for an undefined operand
            if (l.is_zero() && !r.is_nan()) || (r.is_zero() && !l.is_nan()) {
                return Expr::int(0);
            }
            if l.is_one() {
                return *r;
            }
            if r.is_one() {
                return *l;
            }
            // collect constants through a nested product: a * (b * x) = (a*b) * x
            if let (Some(a), Expr::Mul(rl, rr)) = (num(&l), r.as_ref()) {
                if let Some(b) = num(rl) {
                    return Expr::Mul(
                        Expr::Num(a.clone() * b.clone()).boxed(),
                        rr.clone(),
                    );
                }
            }
            // a^b * a^c = a^(b+c)
            if let (Expr::Pow(lb, le), Expr::Pow(rb, re)) = (l.as_ref(), r.as_ref()) {
                if lb == rb {
                    return Expr::Pow(
                        lb.clone(),
                        Expr::Add(le.clone(), re.clone()).boxed(),
                    );
                }
            }
            Expr::Mul(l, r)
        }
        Expr::Div(l, r) => {
            if let (Some(a), Some(b)) = (num(&l), num(&r)) {
                return Expr::Num(a.clone() / b.clone());
            }
            if l.is_zero() && !r.is_nan() && !r.is_zero() {
                return Expr::int(0);
            }
            if r.is_one() {
                return *l;
            }
            if l == r && !l.is_nan() && !l.is_zero() {
                return Expr::int(1);
            }
            Expr::Div(l, r)
        }
        Expr::Pow(base, exp) => {
            if let (Some(a), Some(b)) = (num(&base), num(&exp)) {
                return Expr::Num(a.pow(b));
            }
            if exp.is_zero() && !base.is_nan() {
                return Expr::int(1);
            }
            if exp.is_one() {
                return *base;
            }
            if base.is_one() && !exp.is_nan() {
                return Expr::int(1);
            }
            // 0^x = 0 only for a provably positive exponent
            if base.is_zero() {
                if let Some(v) = num(&exp) {
                    if v.to_f64() > 0.0 {
                        return Expr::int(0);
                    }
                }
            }
            // (a^b)^c = a^(b*c)
            match *base {
                Expr::Pow(inner_base, inner_exp) => {
                    Expr::Pow(inner_base, Expr::Mul(inner_exp, exp).boxed())
                }
                other => Expr::Pow(other.boxed(), exp),
            }
        }
        Expr::Exp(a) => {
            if a.is_zero() {
                return Expr::int(1);
            }
            if a.is_nan() {
                return *a;
            }
            match *a {
                Expr::Ln(inner) => *inner,
                other => Expr::Exp(other.boxed()),
            }
        }
        Expr::Ln(a) => {
            if a.is_one() {
                return Expr::int(0);
            }
            if a.is_nan() {
                return *a;
            }
            match *a {
                Expr::Exp(inner) => *inner,
                other => Expr::Ln(other.boxed()),
            }
        }
        Expr::sin(a) => {
            if a.is_zero() {
                return Expr::int(0);
            }
            nan_or(Expr::sin, a)
        }
        Expr::cos(a) => {
            if a.is_zero() {
                return Expr::int(1);
            }
            nan_or(Expr::cos, a)
        }
        Expr::tg(a) => {
            if a.is_zero() {
                return Expr::int(0);
            }
            nan_or(Expr::tg, a)
        }
        Expr::sh(a) => {
            if a.is_zero() {
                return Expr::int(0);
            }
            nan_or(Expr::sh, a)
        }
        Expr::ch(a) => {
            if a.is_zero() {
                return Expr::int(1);
            }
            nan_or(Expr::ch, a)
        }
        Expr::th(a) => {
            if a.is_zero() {
                return Expr::int(0);
            }
            nan_or(Expr::th, a)
        }
        Expr::arcsin(a) => {
            if a.is_zero() {
                return Expr::int(0);
            }
            nan_or(Expr::arcsin, a)
        }
        Expr::arctg(a) => {
            if a.is_zero() {
                return Expr::int(0);
            }
            nan_or(Expr::arctg, a)
        }
        Expr::arsh(a) => {
            if a.is_zero() {
                return Expr::int(0);
            }
            nan_or(Expr::arsh, a)
        }
        Expr::arth(a) => {
            if a.is_zero() {
                return Expr::int(0);
            }
            nan_or(Expr::arth, a)
        }
        Expr::Abs(a) => {
            if let Some(v) = num(&a) {
                return Expr::Num(v.abs());
            }
            Expr::Abs(a)
        }
        Expr::Signum(a) => {
            if let Some(v) = num(&a) {
                return Expr::Num(v.signum());
            }
            Expr::Signum(a)
        }
        Expr::Factorial(a) => {
            if let Some(v) = num(&a) {
                if v.is_nan() {
                    return Expr::Num(Number::nan());
                }
                if let Some(n) = v.as_integer() {
                    if (0..=20).contains(&n) {
                        let mut acc: i64 = 1;
                        for k in 2..=n {
                            acc *= k;
                        }
                        return Expr::int(acc);
                    }
                }
            }
            Expr::Factorial(a)
        }
        other => other,
    }
}

/// An undefined argument swallows the unary function around it.
fn nan_or(build: fn(Box<Expr>) -> Expr, a: Box<Expr>) -> Expr {
    if a.is_nan() { *a } else { build(a) }
}
