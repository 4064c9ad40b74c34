//! Engine configuration.
//!
//! The original design kept these knobs in process-wide mutable state; here
//! they are an explicitly passed value so that parse/differentiate/solve stay
//! pure and independently testable. Convenience APIs fall back to
//! `SymbolicSettings::default()`.

/// Configuration consumed by the parser, the differentiation engine and the
/// statement solver.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolicSettings {
    /// Threshold for numeric approximate-equality comparisons
    pub equality_threshold: f64,
    /// Disable implicit operator insertion; juxtaposed tokens become a
    /// MissingOperator error instead
    pub explicit_parsing_only: bool,
    /// Recursion/step budget for differentiation and solving over deep trees
    pub max_recursion_depth: usize,
}

impl Default for SymbolicSettings {
    fn default() -> Self {
        SymbolicSettings {
            equality_threshold: 1.0e-11,
            explicit_parsing_only: false,
            max_recursion_depth: 256,
        }
    }
}
