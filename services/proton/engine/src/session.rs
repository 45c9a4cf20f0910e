//! Session endpoint.

use crate::condition::Condition;
use crate::connection::Connection;
use crate::endpoint::{Endpoint, EndpointCore};
use crate::engine::Engine;
use crate::error::{EngineError, StateError};
use crate::handler::Handler;
use crate::link::Link;
use crate::state::{EndpointState, Lifecycle};
use crate::terminus::{Role, Terminus};
use proton_object::{facade, Facade};
use std::sync::Arc;

facade! {
    /// Handle to an AMQP session
    pub struct Session => "session";
}

/// Session state owned by the engine
#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) core: EndpointCore,
    pub(crate) connection: Connection,
    pub(crate) links: Vec<Link>,
}

impl SessionState {
    pub(crate) fn new(connection: Connection) -> Self {
        Self {
            core: EndpointCore::default(),
            connection,
            links: Vec::new(),
        }
    }
}

impl Endpoint for SessionState {
    fn core(&self) -> &EndpointCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EndpointCore {
        &mut self.core
    }
}

impl Session {
    /// Request local open
    pub fn open(self, engine: &mut Engine) -> Result<(), EngineError> {
        engine.open_endpoint(self.id())
    }

    /// Request local close
    pub fn close(self, engine: &mut Engine) -> Result<(), EngineError> {
        engine.close_endpoint(self.id(), None)
    }

    /// Request local close with an error condition for the peer
    pub fn close_with(self, engine: &mut Engine, condition: Condition) -> Result<(), EngineError> {
        engine.close_endpoint(self.id(), Some(condition))
    }

    /// Combined local and remote state
    pub fn state(self, engine: &Engine) -> Result<EndpointState, EngineError> {
        Ok(engine.session_state(self)?.core.state())
    }

    /// Owning connection
    pub fn connection(self, engine: &Engine) -> Result<Connection, EngineError> {
        Ok(engine.session_state(self)?.connection)
    }

    /// Local error condition
    pub fn condition(self, engine: &Engine) -> Result<Option<&Condition>, EngineError> {
        Ok(engine.session_state(self)?.core.condition())
    }

    /// Error condition sent by the peer
    pub fn remote_condition(self, engine: &Engine) -> Result<Option<&Condition>, EngineError> {
        Ok(engine.session_state(self)?.core.remote_condition())
    }

    /// Links of this session in creation order
    pub fn links(self, engine: &Engine) -> Result<&[Link], EngineError> {
        Ok(&engine.session_state(self)?.links)
    }

    /// Next session of the same connection whose state contains `mask`
    pub fn next(self, engine: &Engine, mask: EndpointState) -> Result<Option<Session>, EngineError> {
        self.connection(engine)?.session_next(engine, self, mask)
    }

    /// Create a sender targeting `address`. Fails with
    /// [`StateError::Closed`] once the session is closed locally.
    pub fn create_sender(
        self,
        engine: &mut Engine,
        address: &str,
        handler: Option<Arc<dyn Handler>>,
    ) -> Result<Link, EngineError> {
        self.check_not_closed(engine)?;
        let target = Terminus::address(address);
        engine.create_link_in(self, Role::Sender, link_name(), Terminus::default(), target, handler)
    }

    /// Create a receiver reading from `address`. With `dynamic` the peer is
    /// asked to create the source node; `address` may then be empty.
    /// Fails with [`StateError::Closed`] once the session is closed locally.
    pub fn create_receiver(
        self,
        engine: &mut Engine,
        address: &str,
        dynamic: bool,
        handler: Option<Arc<dyn Handler>>,
    ) -> Result<Link, EngineError> {
        self.check_not_closed(engine)?;
        let source = Terminus {
            dynamic,
            ..Terminus::address(address)
        };
        engine.create_link_in(self, Role::Receiver, link_name(), source, Terminus::default(), handler)
    }

    /// A locally closed session has sent or will send its end frame, so
    /// links created on it could never attach
    fn check_not_closed(self, engine: &Engine) -> Result<(), EngineError> {
        if engine.session_state(self)?.core.local() == Lifecycle::Closed {
            return Err(StateError::Closed.into());
        }
        Ok(())
    }
}

fn link_name() -> String {
    uuid::Uuid::new_v4().to_string()
}
