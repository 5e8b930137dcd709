//! Error types of the linkage solver.
use thiserror::Error;

/// Errors that can occur while building or simulating a linkage.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The constraints of a joint admit no geometric solution at the current
    /// dimensions and pose.
    ///
    /// This is the expected failure while searching the dimension space.
    #[error("unable to solve constraints on joint {name} (#{index})")]
    Unbuildable {
        /// Index of the joint in the linkage.
        index: usize,
        /// Name of the joint.
        name: String,
    },

    /// The mechanism (or a joint) is under-constrained.
    #[error("hypostatic system: {0}")]
    Hypostatic(String),

    /// The constraint vector does not match the joints.
    #[error("expected {expected} constraint values, got {got}")]
    ConstraintCount {
        /// Number required by the linkage.
        expected: usize,
        /// Number provided.
        got: usize,
    },

    /// The coordinate list does not match the joints.
    #[error("expected {expected} coordinates, got {got}")]
    CoordCount {
        /// Number of joints.
        expected: usize,
        /// Number provided.
        got: usize,
    },

    /// A joint refers to an index outside of the linkage.
    #[error("joint {joint} refers to missing joint #{target}")]
    MissingRef {
        /// Name of the referring joint.
        joint: String,
        /// The missing index.
        target: usize,
    },

    /// A user supplied solve order is not a valid topological order.
    #[error("invalid solve order: {0}")]
    InvalidOrder(String),

    /// The rotation period does not fit in 64 bits.
    #[error("rotation period of crank {joint} (angle {angle}) is out of range")]
    PeriodOverflow {
        /// Name of the crank that overflows the period.
        joint: String,
        /// Its rotation per step.
        angle: f64,
    },
}

impl Error {
    /// Return true if the error comes from unsolvable dimensions.
    pub fn is_unbuildable(&self) -> bool {
        matches!(self, Self::Unbuildable { .. })
    }

    /// Return true if the error comes from missing constraints.
    pub fn is_hypostatic(&self) -> bool {
        matches!(self, Self::Hypostatic(_))
    }
}

/// Result type of the linkage solver.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::Unbuildable { index: 2, name: "C".to_string() };
        assert_eq!(err.to_string(), "unable to solve constraints on joint C (#2)");
        assert!(err.is_unbuildable());
        let err = Error::ConstraintCount { expected: 4, got: 3 };
        assert!(err.to_string().contains("expected 4"));
        assert!(!err.is_hypostatic());
    }
}
