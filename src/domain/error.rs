//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::tag::TagId;

/// Tag tree errors.
///
/// Every variant except `Validation` is raised before the tree is touched, so
/// a failed call leaves the tree exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    #[error("index {index} out of range for {len} children")]
    OutOfRange { index: usize, len: usize },

    #[error("cyclic attachment: {tag} is an ancestor of {parent}")]
    CyclicAttachment { tag: TagId, parent: TagId },

    /// A tag handle that does not resolve, e.g. after `destroy`.
    #[error("tag not found: {0}")]
    MissingTag(TagId),

    #[error("tag is not a container: {0}")]
    NotAContainer(TagId),

    #[error("nonempty identifier expected for tag {0}")]
    BlankIdentifier(TagId),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("tree invariant violated: {0}")]
    BrokenInvariant(String),
}

/// Result type for tag tree operations.
pub type TagResult<T> = Result<T, TagError>;

/// A payload that does not conform to its own rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("validation failed: {message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
