//! Solution sets and their algebra.
//!
//! The statement solver reduces equations and inequalities to values of
//! [`SolutionSet`] and combines them with union, intersection and
//! subtraction. The constructors normalize eagerly where the result has a
//! simpler closed form (merging finite sets, absorbing endpoints, clamping
//! intervals) and fall back to a symbolic combination node when they cannot
//! decide, so no information is lost.
//!
//! Interval endpoints are [`Number`] values; unbounded sides use infinite
//! reals. All endpoint comparisons go through f64, which is exact enough for
//! the solver's linear and quadratic roots.

use crate::symbolic::numeric::Number;
use crate::symbolic::symbolic_engine::{Domain, Expr};
use itertools::Itertools;
use std::cmp::Ordering;
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum SolutionSet {
    /// No solutions
    Empty,
    /// Every value of the domain
    Universal(Domain),
    /// Explicitly enumerated solutions
    Finite(Vec<Expr>),
    /// Contiguous range of reals
    Interval {
        left: Number,
        right: Number,
        left_closed: bool,
        right_closed: bool,
    },
    /// Symbolic union that did not normalize away
    Union(Box<SolutionSet>, Box<SolutionSet>),
    /// Symbolic intersection that did not normalize away
    Intersection(Box<SolutionSet>, Box<SolutionSet>),
    /// Symbolic set difference that did not normalize away
    Subtraction(Box<SolutionSet>, Box<SolutionSet>),
}

fn cmp(a: &Number, b: &Number) -> Option<Ordering> {
    a.to_f64().partial_cmp(&b.to_f64())
}

impl SolutionSet {
    /// Finite set from a list of solutions, deduplicated structurally
    /// regardless of order; the first occurrence keeps its place.
    pub fn finite(items: Vec<Expr>) -> SolutionSet {
        let items: Vec<Expr> = items.into_iter().unique().collect();
        if items.is_empty() {
            SolutionSet::Empty
        } else {
            SolutionSet::Finite(items)
        }
    }

    /// Interval constructor; an inverted range collapses to Empty and a
    /// closed degenerate range to a single point.
    pub fn interval(left: Number, right: Number, left_closed: bool, right_closed: bool) -> SolutionSet {
        match cmp(&left, &right) {
            Some(Ordering::Greater) | None => SolutionSet::Empty,
            Some(Ordering::Equal) => {
                if left_closed && right_closed {
                    SolutionSet::Finite(vec![Expr::Num(left)])
                } else {
                    SolutionSet::Empty
                }
            }
            Some(Ordering::Less) => SolutionSet::Interval {
                left,
                right,
                left_closed,
                right_closed,
            },
        }
    }

    /// The whole real line.
    pub fn reals() -> SolutionSet {
        SolutionSet::Universal(Domain::Reals)
    }

    /// Membership test; `None` when the set contains symbolic elements the
    /// test cannot decide against.
    pub fn contains(&self, v: &Number) -> Option<bool> {
        match self {
            SolutionSet::Empty => Some(false),
            SolutionSet::Universal(Domain::Complexes) => Some(true),
            SolutionSet::Universal(Domain::Reals) => Some(!v.is_properly_complex() && !v.is_nan()),
            SolutionSet::Finite(items) => {
                let mut undecided = false;
                for item in items {
                    match item {
                        Expr::Num(n) => {
                            if cmp(n, v) == Some(Ordering::Equal) {
                                return Some(true);
                            }
                        }
                        _ => undecided = true,
                    }
                }
                if undecided { None } else { Some(false) }
            }
            SolutionSet::Interval {
                left,
                right,
                left_closed,
                right_closed,
            } => {
                let x = v.to_f64();
                if x.is_nan() || v.is_properly_complex() {
                    return Some(false);
                }
                let (l, r) = (left.to_f64(), right.to_f64());
                let above = if *left_closed { x >= l } else { x > l };
                let below = if *right_closed { x <= r } else { x < r };
                Some(above && below)
            }
            SolutionSet::Union(a, b) => match (a.contains(v), b.contains(v)) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            },
            SolutionSet::Intersection(a, b) => match (a.contains(v), b.contains(v)) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            },
            SolutionSet::Subtraction(a, b) => match (a.contains(v), b.contains(v)) {
                (Some(false), _) => Some(false),
                (_, Some(true)) => Some(false),
                (Some(true), Some(false)) => Some(true),
                _ => None,
            },
        }
    }

    /// Set union with eager normalization.
    pub fn union(a: SolutionSet, b: SolutionSet) -> SolutionSet {
        match (a, b) {
            (SolutionSet::Empty, s) | (s, SolutionSet::Empty) => s,
            (SolutionSet::Universal(d), _) | (_, SolutionSet::Universal(d)) => {
                SolutionSet::Universal(d)
            }
            (SolutionSet::Finite(mut xs), SolutionSet::Finite(ys)) => {
                xs.extend(ys);
                SolutionSet::finite(xs)
            }
            (interval @ SolutionSet::Interval { .. }, SolutionSet::Finite(points))
            | (SolutionSet::Finite(points), interval @ SolutionSet::Interval { .. }) => {
                absorb_points(interval, points)
            }
            (
                SolutionSet::Interval {
                    left: l1,
                    right: r1,
                    left_closed: lc1,
                    right_closed: rc1,
                },
                SolutionSet::Interval {
                    left: l2,
                    right: r2,
                    left_closed: lc2,
                    right_closed: rc2,
                },
            ) => merge_intervals((l1, r1, lc1, rc1), (l2, r2, lc2, rc2)),
            (a, b) => {
                if a == b {
                    return a;
                }
                // (s \ t) U t = s
                if let SolutionSet::Subtraction(base, removed) = &a {
                    if **removed == b {
                        return (**base).clone();
                    }
                }
                if let SolutionSet::Subtraction(base, removed) = &b {
                    if **removed == a {
                        return (**base).clone();
                    }
                }
                SolutionSet::Union(Box::new(a), Box::new(b))
            }
        }
    }

    /// Set intersection with eager normalization.
    pub fn intersection(a: SolutionSet, b: SolutionSet) -> SolutionSet {
        match (a, b) {
            (SolutionSet::Empty, _) | (_, SolutionSet::Empty) => SolutionSet::Empty,
            (SolutionSet::Universal(_), s) | (s, SolutionSet::Universal(_)) => s,
            (SolutionSet::Finite(points), other) | (other, SolutionSet::Finite(points)) => {
                filter_points(points, &other)
            }
            (
                SolutionSet::Interval {
                    left: l1,
                    right: r1,
                    left_closed: lc1,
                    right_closed: rc1,
                },
                SolutionSet::Interval {
                    left: l2,
                    right: r2,
                    left_closed: lc2,
                    right_closed: rc2,
                },
            ) => {
                let (left, left_closed) = match cmp(&l1, &l2) {
                    Some(Ordering::Less) => (l2, lc2),
                    Some(Ordering::Greater) => (l1, lc1),
                    _ => (l1, lc1 && lc2),
                };
                let (right, right_closed) = match cmp(&r1, &r2) {
                    Some(Ordering::Less) => (r1, rc1),
                    Some(Ordering::Greater) => (r2, rc2),
                    _ => (r1, rc1 && rc2),
                };
                SolutionSet::interval(left, right, left_closed, right_closed)
            }
            // s & (U \ t) = s \ t
            (SolutionSet::Subtraction(base, removed), other)
            | (other, SolutionSet::Subtraction(base, removed))
                if matches!(*base, SolutionSet::Universal(_)) =>
            {
                SolutionSet::subtraction(other, *removed)
            }
            (a, b) => {
                if a == b {
                    a
                } else {
                    SolutionSet::Intersection(Box::new(a), Box::new(b))
                }
            }
        }
    }

    /// Set difference with eager normalization.
    pub fn subtraction(a: SolutionSet, b: SolutionSet) -> SolutionSet {
        match (a, b) {
            (s, SolutionSet::Empty) => s,
            (SolutionSet::Empty, _) => SolutionSet::Empty,
            (SolutionSet::Universal(d1), SolutionSet::Universal(d2)) if d1 == d2 => {
                SolutionSet::Empty
            }
            // U \ (a U b) = (U \ a) & (U \ b)
            (SolutionSet::Universal(d), SolutionSet::Union(x, y)) => SolutionSet::intersection(
                SolutionSet::subtraction(SolutionSet::Universal(d), *x),
                SolutionSet::subtraction(SolutionSet::Universal(d), *y),
            ),
            // U \ (U \ t) = t
            (SolutionSet::Universal(d), SolutionSet::Subtraction(base, removed))
                if *base == SolutionSet::Universal(d) =>
            {
                *removed
            }
            (
                SolutionSet::Universal(Domain::Reals),
                SolutionSet::Interval {
                    left,
                    right,
                    left_closed,
                    right_closed,
                },
            ) => {
                // the complement of an interval is the two outer rays with
                // flipped closures
                let lower = SolutionSet::interval(
                    Number::real(f64::NEG_INFINITY),
                    left,
                    false,
                    !left_closed,
                );
                let upper = SolutionSet::interval(
                    right,
                    Number::real(f64::INFINITY),
                    !right_closed,
                    false,
                );
                SolutionSet::union(lower, upper)
            }
            (interval @ SolutionSet::Interval { .. }, SolutionSet::Finite(points)) => {
                remove_points(interval, points)
            }
            (SolutionSet::Finite(points), other) => {
                // keep the points the other set provably misses
                let mut kept = Vec::new();
                for p in points {
                    match &p {
                        Expr::Num(n) => match other.contains(n) {
                            Some(false) => kept.push(p),
                            Some(true) => {}
                            None => {
                                return SolutionSet::Subtraction(
                                    Box::new(SolutionSet::finite(
                                        kept.into_iter().chain([p]).collect(),
                                    )),
                                    Box::new(other),
                                );
                            }
                        },
                        _ => {
                            return SolutionSet::Subtraction(
                                Box::new(SolutionSet::finite(
                                    kept.into_iter().chain([p]).collect(),
                                )),
                                Box::new(other),
                            );
                        }
                    }
                }
                SolutionSet::finite(kept)
            }
            (a, b) => {
                if a == b {
                    SolutionSet::Empty
                } else {
                    SolutionSet::Subtraction(Box::new(a), Box::new(b))
                }
            }
        }
    }
}

/// Finite ∩ other: keeps the points the other set provably contains; an
/// undecidable point keeps the whole intersection symbolic.
fn filter_points(points: Vec<Expr>, other: &SolutionSet) -> SolutionSet {
    let mut kept = Vec::new();
    for p in &points {
        let decided = match p {
            Expr::Num(n) => other.contains(n),
            _ => None,
        };
        match decided {
            Some(true) => kept.push(p.clone()),
            Some(false) => {}
            None => {
                return SolutionSet::Intersection(
                    Box::new(SolutionSet::finite(points)),
                    Box::new(other.clone()),
                );
            }
        }
    }
    SolutionSet::finite(kept)
}

/// Interval ∪ points: numeric points inside are dropped, points equal to an
/// open endpoint close it, anything else stays a symbolic union.
fn absorb_points(interval: SolutionSet, points: Vec<Expr>) -> SolutionSet {
    let SolutionSet::Interval {
        left,
        right,
        mut left_closed,
        mut right_closed,
    } = interval
    else {
        unreachable!();
    };
    let mut leftover = Vec::new();
    for p in points {
        let keep = match &p {
            Expr::Num(n) => {
                if cmp(n, &left) == Some(Ordering::Equal) {
                    left_closed = true;
                    false
                } else if cmp(n, &right) == Some(Ordering::Equal) {
                    right_closed = true;
                    false
                } else {
                    let inside = {
                        let x = n.to_f64();
                        x > left.to_f64() && x < right.to_f64()
                    };
                    !inside
                }
            }
            _ => true,
        };
        if keep {
            leftover.push(p);
        }
    }
    let interval = SolutionSet::interval(left, right, left_closed, right_closed);
    if leftover.is_empty() {
        interval
    } else {
        SolutionSet::Union(Box::new(interval), Box::new(SolutionSet::finite(leftover)))
    }
}

/// Interval ∖ points: a point on a closed endpoint opens it; interior points
/// keep the subtraction symbolic.
fn remove_points(interval: SolutionSet, points: Vec<Expr>) -> SolutionSet {
    let SolutionSet::Interval {
        left,
        right,
        mut left_closed,
        mut right_closed,
    } = interval
    else {
        unreachable!();
    };
    let mut leftover = Vec::new();
    for p in points {
        match &p {
            Expr::Num(n) if cmp(n, &left) == Some(Ordering::Equal) => left_closed = false,
            Expr::Num(n) if cmp(n, &right) == Some(Ordering::Equal) => right_closed = false,
            Expr::Num(n)
                if n.to_f64() < left.to_f64() || n.to_f64() > right.to_f64() =>
            {
                // outside the interval, nothing to remove
            }
            _ => leftover.push(p),
        }
    }
    let interval = SolutionSet::interval(left, right, left_closed, right_closed);
    if leftover.is_empty() {
        interval
    } else {
        SolutionSet::Subtraction(Box::new(interval), Box::new(SolutionSet::finite(leftover)))
    }
}

fn merge_intervals(
    a: (Number, Number, bool, bool),
    b: (Number, Number, bool, bool),
) -> SolutionSet {
    let (l1, r1, lc1, rc1) = a;
    let (l2, r2, lc2, rc2) = b;
    // overlap or touching with at least one closed side merges
    let (r1f, l2f) = (r1.to_f64(), l2.to_f64());
    let (r2f, l1f) = (r2.to_f64(), l1.to_f64());
    let a_reaches_b = r1f > l2f || (r1f == l2f && (rc1 || lc2));
    let b_reaches_a = r2f > l1f || (r2f == l1f && (rc2 || lc1));
    if a_reaches_b && b_reaches_a {
        let (left, left_closed) = match l1f.partial_cmp(&l2f) {
            Some(Ordering::Less) => (l1, lc1),
            Some(Ordering::Greater) => (l2, lc2),
            _ => (l1, lc1 || lc2),
        };
        let (right, right_closed) = match r1f.partial_cmp(&r2f) {
            Some(Ordering::Greater) => (r1, rc1),
            Some(Ordering::Less) => (r2, rc2),
            _ => (r1, rc1 || rc2),
        };
        SolutionSet::interval(left, right, left_closed, right_closed)
    } else {
        SolutionSet::Union(
            Box::new(SolutionSet::Interval {
                left: l1,
                right: r1,
                left_closed: lc1,
                right_closed: rc1,
            }),
            Box::new(SolutionSet::Interval {
                left: l2,
                right: r2,
                left_closed: lc2,
                right_closed: rc2,
            }),
        )
    }
}

impl fmt::Display for SolutionSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SolutionSet::Empty => write!(f, "{{}}"),
            SolutionSet::Universal(Domain::Reals) => write!(f, "R"),
            SolutionSet::Universal(Domain::Complexes) => write!(f, "C"),
            SolutionSet::Finite(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "}}")
            }
            SolutionSet::Interval {
                left,
                right,
                left_closed,
                right_closed,
            } => {
                let open = if *left_closed { '[' } else { '(' };
                let close = if *right_closed { ']' } else { ')' };
                write!(f, "{}{}, {}{}", open, left, right, close)
            }
            SolutionSet::Union(a, b) => write!(f, "({} U {})", a, b),
            SolutionSet::Intersection(a, b) => write!(f, "({} & {})", a, b),
            SolutionSet::Subtraction(a, b) => write!(f, "({} \\ {})", a, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(l: f64, r: f64) -> SolutionSet {
        SolutionSet::interval(Number::real(l), Number::real(r), false, false)
    }

    #[test]
    fn test_interval_normalization() {
        assert_eq!(open(5.0, 0.0), SolutionSet::Empty);
        assert_eq!(
            SolutionSet::interval(Number::int(2), Number::int(2), true, true),
            SolutionSet::Finite(vec![Expr::Num(Number::int(2))])
        );
        assert_eq!(
            SolutionSet::interval(Number::int(2), Number::int(2), true, false),
            SolutionSet::Empty
        );
    }

    #[test]
    fn test_finite_dedup() {
        let s = SolutionSet::finite(vec![Expr::int(1), Expr::int(1), Expr::int(2)]);
        assert_eq!(s, SolutionSet::Finite(vec![Expr::int(1), Expr::int(2)]));
        assert_eq!(SolutionSet::finite(vec![]), SolutionSet::Empty);
        // duplicates need not be adjacent
        let s = SolutionSet::finite(vec![Expr::int(1), Expr::int(2), Expr::int(1)]);
        assert_eq!(s, SolutionSet::Finite(vec![Expr::int(1), Expr::int(2)]));
    }

    #[test]
    fn test_union_identities() {
        let s = open(0.0, 5.0);
        assert_eq!(SolutionSet::union(SolutionSet::Empty, s.clone()), s);
        assert_eq!(
            SolutionSet::union(SolutionSet::reals(), s.clone()),
            SolutionSet::reals()
        );
    }

    #[test]
    fn test_union_closes_open_endpoint() {
        // (5, inf) with {5} becomes [5, inf)
        let ray = SolutionSet::interval(
            Number::int(5),
            Number::real(f64::INFINITY),
            false,
            false,
        );
        let merged = SolutionSet::union(
            ray,
            SolutionSet::Finite(vec![Expr::int(5)]),
        );
        assert_eq!(
            merged,
            SolutionSet::Interval {
                left: Number::int(5),
                right: Number::real(f64::INFINITY),
                left_closed: true,
                right_closed: false
            }
        );
    }

    #[test]
    fn test_union_merges_overlapping_intervals() {
        assert_eq!(
            SolutionSet::union(open(0.0, 3.0), open(2.0, 5.0)),
            open(0.0, 5.0)
        );
        // disjoint stays symbolic
        assert!(matches!(
            SolutionSet::union(open(0.0, 1.0), open(2.0, 3.0)),
            SolutionSet::Union(..)
        ));
    }

    #[test]
    fn test_intersection_of_rays() {
        let above = SolutionSet::interval(
            Number::int(0),
            Number::real(f64::INFINITY),
            false,
            false,
        );
        let below = SolutionSet::interval(
            Number::real(f64::NEG_INFINITY),
            Number::int(5),
            false,
            false,
        );
        assert_eq!(SolutionSet::intersection(above, below), open(0.0, 5.0));
    }

    #[test]
    fn test_intersection_filters_points() {
        let points = SolutionSet::Finite(vec![Expr::int(1), Expr::int(7)]);
        assert_eq!(
            SolutionSet::intersection(points, open(0.0, 5.0)),
            SolutionSet::Finite(vec![Expr::int(1)])
        );
    }

    #[test]
    fn test_complement_of_closed_ray() {
        // R \ [5, inf) = (-inf, 5)
        let ray = SolutionSet::interval(
            Number::int(5),
            Number::real(f64::INFINITY),
            true,
            false,
        );
        assert_eq!(
            SolutionSet::subtraction(SolutionSet::reals(), ray),
            SolutionSet::Interval {
                left: Number::real(f64::NEG_INFINITY),
                right: Number::int(5),
                left_closed: false,
                right_closed: false
            }
        );
    }

    #[test]
    fn test_complement_distributes_over_union() {
        // R \ ((-inf, -1) U (1, inf)) = [-1, 1]
        let outer = SolutionSet::Union(
            Box::new(SolutionSet::interval(
                Number::real(f64::NEG_INFINITY),
                Number::real(-1.0),
                false,
                false,
            )),
            Box::new(SolutionSet::interval(
                Number::real(1.0),
                Number::real(f64::INFINITY),
                false,
                false,
            )),
        );
        assert_eq!(
            SolutionSet::subtraction(SolutionSet::reals(), outer),
            SolutionSet::interval(Number::real(-1.0), Number::real(1.0), true, true)
        );
    }

    #[test]
    fn test_double_complement_cancels() {
        let punctured = SolutionSet::Subtraction(
            Box::new(SolutionSet::reals()),
            Box::new(SolutionSet::Finite(vec![Expr::int(1)])),
        );
        assert_eq!(
            SolutionSet::subtraction(SolutionSet::reals(), punctured),
            SolutionSet::Finite(vec![Expr::int(1)])
        );
    }

    #[test]
    fn test_subtracting_endpoint_opens_it() {
        let closed = SolutionSet::interval(Number::int(0), Number::int(5), true, true);
        assert_eq!(
            SolutionSet::subtraction(closed, SolutionSet::Finite(vec![Expr::int(5)])),
            SolutionSet::Interval {
                left: Number::int(0),
                right: Number::int(5),
                left_closed: true,
                right_closed: false
            }
        );
    }

    #[test]
    fn test_membership() {
        let s = SolutionSet::interval(Number::int(0), Number::int(5), false, true);
        assert_eq!(s.contains(&Number::int(0)), Some(false));
        assert_eq!(s.contains(&Number::int(3)), Some(true));
        assert_eq!(s.contains(&Number::int(5)), Some(true));
        assert_eq!(SolutionSet::reals().contains(&Number::nan()), Some(false));
        assert_eq!(
            SolutionSet::reals().contains(&Number::complex(0.0, 1.0)),
            Some(false)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", SolutionSet::Empty), "{}");
        assert_eq!(format!("{}", SolutionSet::reals()), "R");
        assert_eq!(
            format!("{}", SolutionSet::Finite(vec![Expr::int(1), Expr::int(2)])),
            "{1, 2}"
        );
        assert_eq!(format!("{}", open(0.0, 5.0)), "(0, 5)");
    }
}
