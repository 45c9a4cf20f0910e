//! Typed AMQP frames exchanged between transports.
//!
//! Frames carry decoded performatives; turning them into bytes is left to
//! the I/O layer.

use crate::condition::Condition;
use crate::terminus::{Role, Terminus};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One frame on a channel. A frame without a body is an idle keepalive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Channel number (always 0 for connection-level frames)
    pub channel: u16,
    /// Performative, or `None` for an empty frame
    pub body: Option<Performative>,
}

impl Frame {
    /// Frame carrying a performative
    pub fn new(channel: u16, body: Performative) -> Self {
        Self {
            channel,
            body: Some(body),
        }
    }

    /// Empty keepalive frame
    pub fn empty() -> Self {
        Self {
            channel: 0,
            body: None,
        }
    }

    /// Short name of the performative, `"empty"` for keepalives
    pub fn name(&self) -> &'static str {
        self.body.as_ref().map(Performative::name).unwrap_or("empty")
    }
}

/// Frame bodies understood by the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Performative {
    /// Connection open
    Open {
        /// Sender's container id
        container_id: String,
        /// Host the sender wants to talk to
        hostname: Option<String>,
        /// Sender closes the connection after this much input silence
        idle_timeout: Option<Duration>,
        /// Highest channel the sender will use
        channel_max: u16,
        /// Largest frame the sender accepts
        max_frame_size: u32,
    },
    /// Session begin
    Begin {
        /// Channel of the peer's session this begin answers
        remote_channel: Option<u16>,
    },
    /// Link attach
    Attach {
        /// Link name, unique per direction within the connection
        name: String,
        /// Sender's handle for the link
        handle: u32,
        /// Role of the sender of this frame
        role: Role,
        /// Link source
        source: Option<Terminus>,
        /// Link target
        target: Option<Terminus>,
    },
    /// Link detach, closing the link
    Detach {
        /// Sender's handle for the link
        handle: u32,
        /// Error condition
        error: Option<Condition>,
    },
    /// Session end
    End {
        /// Error condition
        error: Option<Condition>,
    },
    /// Connection close
    Close {
        /// Error condition
        error: Option<Condition>,
    },
}

impl Performative {
    /// Short lower-case name
    pub fn name(&self) -> &'static str {
        match self {
            Performative::Open { .. } => "open",
            Performative::Begin { .. } => "begin",
            Performative::Attach { .. } => "attach",
            Performative::Detach { .. } => "detach",
            Performative::End { .. } => "end",
            Performative::Close { .. } => "close",
        }
    }
}
