//! Endpoint state flags and per-side lifecycle.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// State of one side (local or remote) of an endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Not opened yet
    #[default]
    Uninitialized,
    /// Opened
    Active,
    /// Closed
    Closed,
}

bitflags! {
    /// Combined local/remote endpoint state, one bit per side
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct EndpointState: u8 {
        /// Local side not opened yet
        const LOCAL_UNINIT = 1 << 0;
        /// Local side open
        const LOCAL_ACTIVE = 1 << 1;
        /// Local side closed
        const LOCAL_CLOSED = 1 << 2;
        /// Remote side not opened yet
        const REMOTE_UNINIT = 1 << 3;
        /// Remote side open
        const REMOTE_ACTIVE = 1 << 4;
        /// Remote side closed
        const REMOTE_CLOSED = 1 << 5;
        /// All local bits
        const LOCAL_MASK = Self::LOCAL_UNINIT.bits() | Self::LOCAL_ACTIVE.bits() | Self::LOCAL_CLOSED.bits();
        /// All remote bits
        const REMOTE_MASK = Self::REMOTE_UNINIT.bits() | Self::REMOTE_ACTIVE.bits() | Self::REMOTE_CLOSED.bits();
    }
}

impl Lifecycle {
    /// Flag for this lifecycle on the local side
    pub fn local_flag(self) -> EndpointState {
        match self {
            Lifecycle::Uninitialized => EndpointState::LOCAL_UNINIT,
            Lifecycle::Active => EndpointState::LOCAL_ACTIVE,
            Lifecycle::Closed => EndpointState::LOCAL_CLOSED,
        }
    }

    /// Flag for this lifecycle on the remote side
    pub fn remote_flag(self) -> EndpointState {
        match self {
            Lifecycle::Uninitialized => EndpointState::REMOTE_UNINIT,
            Lifecycle::Active => EndpointState::REMOTE_ACTIVE,
            Lifecycle::Closed => EndpointState::REMOTE_CLOSED,
        }
    }
}

impl EndpointState {
    /// Combine a local and a remote lifecycle
    pub fn new(local: Lifecycle, remote: Lifecycle) -> Self {
        local.local_flag() | remote.remote_flag()
    }

    /// Local side of a combined state
    pub fn local(self) -> Lifecycle {
        if self.contains(Self::LOCAL_CLOSED) {
            Lifecycle::Closed
        } else if self.contains(Self::LOCAL_ACTIVE) {
            Lifecycle::Active
        } else {
            Lifecycle::Uninitialized
        }
    }

    /// Remote side of a combined state
    pub fn remote(self) -> Lifecycle {
        if self.contains(Self::REMOTE_CLOSED) {
            Lifecycle::Closed
        } else if self.contains(Self::REMOTE_ACTIVE) {
            Lifecycle::Active
        } else {
            Lifecycle::Uninitialized
        }
    }

    /// Whether every bit of `mask` is set. An empty mask matches anything.
    pub fn matches(self, mask: EndpointState) -> bool {
        self.contains(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_state_round_trips_sides() {
        let sides = [Lifecycle::Uninitialized, Lifecycle::Active, Lifecycle::Closed];
        let mut seen = std::collections::HashSet::new();
        for local in sides {
            for remote in sides {
                let state = EndpointState::new(local, remote);
                assert_eq!(state.local(), local);
                assert_eq!(state.remote(), remote);
                assert_eq!((state & EndpointState::LOCAL_MASK).bits().count_ones(), 1);
                assert_eq!((state & EndpointState::REMOTE_MASK).bits().count_ones(), 1);
                seen.insert(state);
            }
        }
        assert_eq!(seen.len(), 9);
    }

    #[test]
    fn test_matches_requires_all_bits() {
        let state = EndpointState::new(Lifecycle::Active, Lifecycle::Uninitialized);
        assert!(state.matches(EndpointState::LOCAL_ACTIVE));
        assert!(state.matches(EndpointState::LOCAL_ACTIVE | EndpointState::REMOTE_UNINIT));
        assert!(!state.matches(EndpointState::LOCAL_ACTIVE | EndpointState::REMOTE_ACTIVE));
        assert!(!state.matches(EndpointState::LOCAL_CLOSED));
        assert!(state.matches(EndpointState::empty()));
    }

    #[test]
    fn test_flag_values() {
        assert_eq!(EndpointState::LOCAL_UNINIT.bits(), 1);
        assert_eq!(EndpointState::LOCAL_ACTIVE.bits(), 2);
        assert_eq!(EndpointState::LOCAL_CLOSED.bits(), 4);
        assert_eq!(EndpointState::REMOTE_UNINIT.bits(), 8);
        assert_eq!(EndpointState::REMOTE_ACTIVE.bits(), 16);
        assert_eq!(EndpointState::REMOTE_CLOSED.bits(), 32);
        assert_eq!(EndpointState::LOCAL_MASK.bits(), 7);
        assert_eq!(EndpointState::REMOTE_MASK.bits(), 56);
    }
}
