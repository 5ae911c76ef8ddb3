//! Execution limits.

/// Default maximum depth of nested user-function frames.
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 1000;

/// Limits enforced during execution. Checked at function entry, before any
/// allocation for the new frame.
#[derive(Debug, Clone, Copy)]
pub struct ResourceLimits {
    /// Maximum depth of nested user-function calls; exceeding it raises
    /// `RecursionError`.
    pub max_recursion_depth: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
        }
    }
}

impl ResourceLimits {
    #[must_use]
    pub fn with_max_recursion_depth(depth: usize) -> Self {
        Self {
            max_recursion_depth: depth,
        }
    }
}
