//! Engine error types.

use proton_object::{ObjectError, ObjectId};
use thiserror::Error;

/// Illegal local state transitions
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    /// Open requested after the local side was closed
    #[error("endpoint already closed locally")]
    Closed,

    /// Child creation on a connection whose both sides are closed
    #[error("connection is closed on both sides")]
    Terminal,
}

/// Transport binding and inbound frame errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The transport is already bound to a connection
    #[error("transport already bound")]
    AlreadyBound,

    /// The connection already has a transport
    #[error("connection already has a transport")]
    ConnectionBound,

    /// A frame arrived while the transport was not accepting frames
    #[error("transport is not handling frames")]
    NotHandlingFrames,

    /// Frame on a channel with no session
    #[error("unknown channel {0}")]
    UnknownChannel(u16),

    /// Frame for a link handle that was never attached
    #[error("unknown handle {handle} on channel {channel}")]
    UnknownHandle {
        /// Channel carrying the frame
        channel: u16,
        /// Remote link handle
        handle: u32,
    },

    /// Frame that is not valid in the current state
    #[error("unexpected {0} frame")]
    UnexpectedFrame(&'static str),

    /// No free channel below the negotiated maximum
    #[error("channel limit {0} reached")]
    ChannelsExhausted(u16),
}

/// Engine errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Object store error (reclaimed object, unbalanced release)
    #[error(transparent)]
    Object(#[from] ObjectError),

    /// Handle refers to an object of another kind
    #[error("object {id} is not a {expected}")]
    WrongKind {
        /// Offending object
        id: ObjectId,
        /// Expected kind
        expected: &'static str,
    },

    /// Illegal state transition
    #[error(transparent)]
    State(#[from] StateError),

    /// Transport error
    #[error(transparent)]
    Transport(#[from] TransportError),
}
