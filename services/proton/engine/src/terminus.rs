//! Link source and target termini.

use serde::{Deserialize, Serialize};

/// Link direction from the local point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Sends messages to the target
    Sender,
    /// Receives messages from the source
    Receiver,
}

impl Role {
    /// Role of the peer's end of the same link
    pub fn inverse(self) -> Role {
        match self {
            Role::Sender => Role::Receiver,
            Role::Receiver => Role::Sender,
        }
    }
}

/// Source or target of a link
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terminus {
    /// Node address, if any
    pub address: Option<String>,
    /// Ask the peer to create a node and assign its address
    pub dynamic: bool,
}

impl Terminus {
    /// Terminus naming an existing node. An empty address names no node.
    pub fn address(address: impl Into<String>) -> Self {
        let address = address.into();
        Self {
            address: (!address.is_empty()).then_some(address),
            dynamic: false,
        }
    }

    /// Terminus asking the peer for a dynamically created node
    pub fn dynamic() -> Self {
        Self {
            address: None,
            dynamic: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_address_names_no_node() {
        assert_eq!(Terminus::address("").address, None);
        assert_eq!(Terminus::address("queue").address.as_deref(), Some("queue"));
        assert_eq!(Role::Sender.inverse(), Role::Receiver);
    }
}
