//! Object store error types.

use crate::ObjectId;
use thiserror::Error;

/// Object store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObjectError {
    /// The object behind this id has been reclaimed
    #[error("object {0} has been reclaimed")]
    Reclaimed(ObjectId),

    /// Release without a matching acquire
    #[error("unbalanced release of object {0}")]
    Underflow(ObjectId),
}
