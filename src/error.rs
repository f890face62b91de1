use std::error::Error;
use std::fmt;

/// Errors reported by the construction. All of them abort the call; there
/// is never partial output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PstError {
    /// The adjacency is empty, lists an edge on only one side, references
    /// an undeclared label, or collides with a reserved synthetic label.
    /// Raised before any traversal starts.
    InvalidInput(String),
    /// The graph shape is outside what the algorithm handles, e.g. a graph
    /// with no source node at all.
    Unsupported(String),
    /// A post-pass consistency check failed. Always a bug in this crate,
    /// never a property of the input.
    InternalInvariantViolation(String),
}

impl fmt::Display for PstError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PstError::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            PstError::Unsupported(msg) => write!(f, "unsupported graph: {}", msg),
            PstError::InternalInvariantViolation(msg) => {
                write!(f, "internal invariant violation: {}", msg)
            }
        }
    }
}

impl Error for PstError {}
