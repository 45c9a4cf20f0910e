//! AMQP error conditions attached to endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Condition name used when the local idle timeout expires
pub const RESOURCE_LIMIT_EXCEEDED: &str = "amqp:resource-limit-exceeded";

/// Condition name for internal errors
pub const INTERNAL_ERROR: &str = "amqp:internal-error";

/// Condition name for frames the peer should not have sent
pub const FRAMING_ERROR: &str = "amqp:connection:framing-error";

/// Error condition carried on close/end/detach
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Symbolic condition name, e.g. `amqp:not-found`
    pub name: String,
    /// Human readable description
    pub description: Option<String>,
}

impl Condition {
    /// Create a condition with a description
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
        }
    }

    /// Create a condition with only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(description) => write!(f, "{}: {}", self.name, description),
            None => write!(f, "{}", self.name),
        }
    }
}
