//! Engine events and the collector that queues them.
//!
//! Every local and remote state change pushes an [`Event`] onto the
//! engine's [`Collector`]. The driving loop drains the collector and hands
//! each event to a [`Handler`](crate::Handler).

use crate::connection::Connection;
use crate::engine::Engine;
use crate::link::Link;
use crate::session::Session;
use crate::transport::Transport;
use std::collections::VecDeque;
use std::fmt;

/// Kind of engine event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Connection created
    ConnectionInit,
    /// Transport bound to the connection
    ConnectionBound,
    /// Transport unbound from the connection
    ConnectionUnbound,
    /// Connection opened locally
    ConnectionLocalOpen,
    /// Peer opened the connection
    ConnectionRemoteOpen,
    /// Connection closed locally
    ConnectionLocalClose,
    /// Peer closed the connection
    ConnectionRemoteClose,
    /// Connection reclaimed
    ConnectionFinal,
    /// Session created
    SessionInit,
    /// Session opened locally
    SessionLocalOpen,
    /// Peer began the session
    SessionRemoteOpen,
    /// Session closed locally
    SessionLocalClose,
    /// Peer ended the session
    SessionRemoteClose,
    /// Session reclaimed
    SessionFinal,
    /// Link created
    LinkInit,
    /// Link opened locally
    LinkLocalOpen,
    /// Peer attached the link
    LinkRemoteOpen,
    /// Link closed locally
    LinkLocalClose,
    /// Peer detached the link
    LinkRemoteClose,
    /// Link reclaimed
    LinkFinal,
    /// Transport rejected an inbound frame
    TransportError,
    /// Close frames sent and received
    TransportClosed,
}

/// Object an event is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventContext {
    /// Connection event
    Connection(Connection),
    /// Session event
    Session(Session),
    /// Link event
    Link(Link),
    /// Transport event
    Transport(Transport),
}

/// A queued engine event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// What happened
    pub kind: EventType,
    /// What it happened to
    pub context: EventContext,
}

impl Event {
    /// Create an event
    pub fn new(kind: EventType, context: EventContext) -> Self {
        Self { kind, context }
    }

    /// Link the event is about, if any
    pub fn link(&self) -> Option<Link> {
        match self.context {
            EventContext::Link(link) => Some(link),
            _ => None,
        }
    }

    /// Session the event is about, directly or through its link
    pub fn session(&self, engine: &Engine) -> Option<Session> {
        match self.context {
            EventContext::Session(session) => Some(session),
            EventContext::Link(link) => link.session(engine).ok(),
            _ => None,
        }
    }

    /// Connection the event is about, directly or through its children
    pub fn connection(&self, engine: &Engine) -> Option<Connection> {
        match self.context {
            EventContext::Connection(connection) => Some(connection),
            EventContext::Session(session) => session.connection(engine).ok(),
            EventContext::Link(link) => link.connection(engine).ok(),
            EventContext::Transport(transport) => transport.connection(engine).ok().flatten(),
        }
    }

    /// Transport the event is about, directly or through the connection
    pub fn transport(&self, engine: &Engine) -> Option<Transport> {
        match self.context {
            EventContext::Transport(transport) => Some(transport),
            _ => self
                .connection(engine)
                .and_then(|connection| connection.transport(engine).ok().flatten()),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)
    }
}

/// FIFO queue of pending events
#[derive(Debug, Default)]
pub struct Collector {
    events: VecDeque<Event>,
}

impl Collector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event
    pub fn put(&mut self, kind: EventType, context: EventContext) {
        self.events.push_back(Event::new(kind, context));
    }

    /// Oldest pending event
    pub fn peek(&self) -> Option<&Event> {
        self.events.front()
    }

    /// Remove and return the oldest pending event
    pub fn pop(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    /// Remove all pending events
    pub fn drain(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }

    /// Number of pending events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events are pending
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
