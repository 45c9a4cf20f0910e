//! Link endpoint.

use crate::condition::Condition;
use crate::connection::Connection;
use crate::endpoint::{Endpoint, EndpointCore};
use crate::engine::Engine;
use crate::error::EngineError;
use crate::handler::Handler;
use crate::session::Session;
use crate::state::EndpointState;
use crate::terminus::{Role, Terminus};
use proton_object::{facade, Facade};
use std::sync::Arc;

facade! {
    /// Handle to an AMQP link (sender or receiver)
    pub struct Link => "link";
}

/// Link state owned by the engine
#[derive(Debug)]
pub(crate) struct LinkState {
    pub(crate) core: EndpointCore,
    pub(crate) name: String,
    pub(crate) role: Role,
    pub(crate) session: Session,
    pub(crate) connection: Connection,
    pub(crate) source: Terminus,
    pub(crate) target: Terminus,
    pub(crate) remote_source: Option<Terminus>,
    pub(crate) remote_target: Option<Terminus>,
    pub(crate) handler: Option<Arc<dyn Handler>>,
}

impl LinkState {
    pub(crate) fn new(
        name: String,
        role: Role,
        session: Session,
        connection: Connection,
        source: Terminus,
        target: Terminus,
        handler: Option<Arc<dyn Handler>>,
    ) -> Self {
        Self {
            core: EndpointCore::default(),
            name,
            role,
            session,
            connection,
            source,
            target,
            remote_source: None,
            remote_target: None,
            handler,
        }
    }
}

impl Endpoint for LinkState {
    fn core(&self) -> &EndpointCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EndpointCore {
        &mut self.core
    }
}

impl Link {
    /// Request local attach
    pub fn open(self, engine: &mut Engine) -> Result<(), EngineError> {
        engine.open_endpoint(self.id())
    }

    /// Request local detach
    pub fn close(self, engine: &mut Engine) -> Result<(), EngineError> {
        engine.close_endpoint(self.id(), None)
    }

    /// Request local detach with an error condition for the peer
    pub fn close_with(self, engine: &mut Engine, condition: Condition) -> Result<(), EngineError> {
        engine.close_endpoint(self.id(), Some(condition))
    }

    /// Combined local and remote state
    pub fn state(self, engine: &Engine) -> Result<EndpointState, EngineError> {
        Ok(engine.link_state(self)?.core.state())
    }

    /// Link name
    pub fn name(self, engine: &Engine) -> Result<&str, EngineError> {
        Ok(&engine.link_state(self)?.name)
    }

    /// Local role
    pub fn role(self, engine: &Engine) -> Result<Role, EngineError> {
        Ok(engine.link_state(self)?.role)
    }

    /// Whether this end sends
    pub fn is_sender(self, engine: &Engine) -> Result<bool, EngineError> {
        Ok(self.role(engine)? == Role::Sender)
    }

    /// Whether this end receives
    pub fn is_receiver(self, engine: &Engine) -> Result<bool, EngineError> {
        Ok(self.role(engine)? == Role::Receiver)
    }

    /// Owning session
    pub fn session(self, engine: &Engine) -> Result<Session, EngineError> {
        Ok(engine.link_state(self)?.session)
    }

    /// Owning connection
    pub fn connection(self, engine: &Engine) -> Result<Connection, EngineError> {
        Ok(engine.link_state(self)?.connection)
    }

    /// Local source terminus
    pub fn source(self, engine: &Engine) -> Result<&Terminus, EngineError> {
        Ok(&engine.link_state(self)?.source)
    }

    /// Local target terminus
    pub fn target(self, engine: &Engine) -> Result<&Terminus, EngineError> {
        Ok(&engine.link_state(self)?.target)
    }

    /// Source announced by the peer
    pub fn remote_source(self, engine: &Engine) -> Result<Option<&Terminus>, EngineError> {
        Ok(engine.link_state(self)?.remote_source.as_ref())
    }

    /// Target announced by the peer
    pub fn remote_target(self, engine: &Engine) -> Result<Option<&Terminus>, EngineError> {
        Ok(engine.link_state(self)?.remote_target.as_ref())
    }

    /// Node address: the target for a sender, the source for a receiver.
    /// Falls back to the peer's terminus when none was set locally.
    pub fn address(self, engine: &Engine) -> Result<Option<&str>, EngineError> {
        let state = engine.link_state(self)?;
        let (local, remote) = match state.role {
            Role::Sender => (&state.target, state.remote_target.as_ref()),
            Role::Receiver => (&state.source, state.remote_source.as_ref()),
        };
        Ok(local
            .address
            .as_deref()
            .or_else(|| remote.and_then(|terminus| terminus.address.as_deref())))
    }

    /// Local error condition
    pub fn condition(self, engine: &Engine) -> Result<Option<&Condition>, EngineError> {
        Ok(engine.link_state(self)?.core.condition())
    }

    /// Error condition sent by the peer
    pub fn remote_condition(self, engine: &Engine) -> Result<Option<&Condition>, EngineError> {
        Ok(engine.link_state(self)?.core.remote_condition())
    }

    /// Handler attached at creation
    pub fn handler(self, engine: &Engine) -> Result<Option<Arc<dyn Handler>>, EngineError> {
        Ok(engine.link_state(self)?.handler.clone())
    }

    /// Next link of the same connection whose state contains `mask`
    pub fn next(self, engine: &Engine, mask: EndpointState) -> Result<Option<Link>, EngineError> {
        self.connection(engine)?.link_next(engine, self, mask)
    }
}
