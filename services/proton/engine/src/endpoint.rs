//! Endpoint state machine shared by connections, sessions and links.
//!
//! Each side moves forward only: `Uninitialized -> Active -> Closed` (the
//! local side may also jump straight to `Closed`). The local side is driven
//! by [`Endpoint::open`] and [`Endpoint::close`]; the remote side only by the
//! transport applying inbound frames.
//!
//! Repeated `open` on an active endpoint and repeated `close` are ignored.
//! `open` after a local close is rejected with [`StateError::Closed`].

use crate::condition::Condition;
use crate::error::StateError;
use crate::state::{EndpointState, Lifecycle};

/// Outcome of a local state request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The state changed
    Applied,
    /// The endpoint was already in the requested state
    Ignored,
}

/// Local/remote state pair plus error conditions
#[derive(Debug, Clone, Default)]
pub struct EndpointCore {
    local: Lifecycle,
    remote: Lifecycle,
    condition: Option<Condition>,
    remote_condition: Option<Condition>,
}

impl EndpointCore {
    /// Local lifecycle
    pub fn local(&self) -> Lifecycle {
        self.local
    }

    /// Remote lifecycle
    pub fn remote(&self) -> Lifecycle {
        self.remote
    }

    /// Combined state flags
    pub fn state(&self) -> EndpointState {
        EndpointState::new(self.local, self.remote)
    }

    /// Local error condition, sent with the closing frame
    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    /// Error condition received from the peer
    pub fn remote_condition(&self) -> Option<&Condition> {
        self.remote_condition.as_ref()
    }

    /// Both sides closed
    pub fn is_terminal(&self) -> bool {
        self.local == Lifecycle::Closed && self.remote == Lifecycle::Closed
    }

    fn open(&mut self) -> Result<Transition, StateError> {
        match self.local {
            Lifecycle::Uninitialized => {
                self.local = Lifecycle::Active;
                Ok(Transition::Applied)
            }
            Lifecycle::Active => Ok(Transition::Ignored),
            Lifecycle::Closed => Err(StateError::Closed),
        }
    }

    fn close(&mut self, condition: Option<Condition>) -> Transition {
        if self.local == Lifecycle::Closed {
            return Transition::Ignored;
        }
        self.local = Lifecycle::Closed;
        if condition.is_some() {
            self.condition = condition;
        }
        Transition::Applied
    }

    /// Apply a remote open. Returns false if the remote side already left
    /// `Uninitialized`.
    pub(crate) fn remote_open(&mut self) -> bool {
        if self.remote != Lifecycle::Uninitialized {
            return false;
        }
        self.remote = Lifecycle::Active;
        true
    }

    /// Apply a remote close. Returns false if the remote side was already
    /// closed.
    pub(crate) fn remote_close(&mut self, condition: Option<Condition>) -> bool {
        if self.remote == Lifecycle::Closed {
            return false;
        }
        self.remote = Lifecycle::Closed;
        self.remote_condition = condition;
        true
    }
}

/// Capability shared by connection, session and link state holders
pub trait Endpoint {
    /// Shared state pair
    fn core(&self) -> &EndpointCore;

    /// Mutable shared state pair
    fn core_mut(&mut self) -> &mut EndpointCore;

    /// Local lifecycle
    fn local_state(&self) -> Lifecycle {
        self.core().local()
    }

    /// Remote lifecycle
    fn remote_state(&self) -> Lifecycle {
        self.core().remote()
    }

    /// Combined state flags
    fn state(&self) -> EndpointState {
        self.core().state()
    }

    /// Request local open
    fn open(&mut self) -> Result<Transition, StateError> {
        self.core_mut().open()
    }

    /// Request local close, optionally with an error condition
    fn close(&mut self, condition: Option<Condition>) -> Transition {
        self.core_mut().close(condition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Probe {
        core: EndpointCore,
    }

    impl Endpoint for Probe {
        fn core(&self) -> &EndpointCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut EndpointCore {
            &mut self.core
        }
    }

    #[test]
    fn test_open_moves_local_to_active() {
        let mut probe = Probe::default();
        assert_eq!(
            probe.state(),
            EndpointState::LOCAL_UNINIT | EndpointState::REMOTE_UNINIT
        );

        assert_eq!(probe.open().unwrap(), Transition::Applied);
        assert_eq!(probe.local_state(), Lifecycle::Active);
        assert_eq!(probe.open().unwrap(), Transition::Ignored);
        assert_eq!(probe.local_state(), Lifecycle::Active);
    }

    #[test]
    fn test_close_from_any_local_state() {
        let mut fresh = Probe::default();
        assert_eq!(fresh.close(None), Transition::Applied);
        assert_eq!(fresh.local_state(), Lifecycle::Closed);

        let mut opened = Probe::default();
        opened.open().unwrap();
        assert_eq!(opened.close(None), Transition::Applied);
        assert_eq!(opened.local_state(), Lifecycle::Closed);
        assert_eq!(opened.close(None), Transition::Ignored);
    }

    #[test]
    fn test_open_after_close_is_rejected() {
        let mut probe = Probe::default();
        probe.open().unwrap();
        probe.close(None);
        assert_eq!(probe.open(), Err(StateError::Closed));
        assert_eq!(probe.local_state(), Lifecycle::Closed);
    }

    #[test]
    fn test_close_keeps_first_condition() {
        let mut probe = Probe::default();
        probe.close(Some(Condition::named("amqp:not-found")));
        probe.close(Some(Condition::named("amqp:internal-error")));
        assert_eq!(probe.core().condition().unwrap().name, "amqp:not-found");
    }

    #[test]
    fn test_remote_side_never_regresses() {
        let mut probe = Probe::default();
        assert!(probe.core_mut().remote_open());
        assert!(!probe.core_mut().remote_open());
        assert!(probe.core_mut().remote_close(Some(Condition::named("amqp:not-found"))));
        assert!(!probe.core_mut().remote_close(None));
        assert!(!probe.core_mut().remote_open());
        assert_eq!(probe.remote_state(), Lifecycle::Closed);
        assert_eq!(
            probe.core().remote_condition().unwrap().name,
            "amqp:not-found"
        );
    }

    #[test]
    fn test_terminal_needs_both_sides() {
        let mut probe = Probe::default();
        probe.open().unwrap();
        probe.close(None);
        assert!(!probe.core().is_terminal());
        probe.core_mut().remote_close(None);
        assert!(probe.core().is_terminal());
    }
}
