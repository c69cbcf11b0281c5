//! Error type shared by tree construction and mesh assembly.

/// Errors raised while building a tree.
///
/// Generation is one-shot: any error aborts construction of the whole tree.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TreeError {
    /// A caller-supplied setting is out of range.
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A direction or rotation collapsed to something unusable.
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(&'static str),
}

impl TreeError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        TreeError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
