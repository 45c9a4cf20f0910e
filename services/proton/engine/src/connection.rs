//! Connection endpoint.

use crate::condition::Condition;
use crate::endpoint::{Endpoint, EndpointCore};
use crate::engine::Engine;
use crate::error::EngineError;
use crate::handler::Handler;
use crate::link::Link;
use crate::session::Session;
use crate::state::EndpointState;
use crate::transport::Transport;
use proton_object::{facade, Facade};
use std::sync::Arc;
use tracing::debug;

facade! {
    /// Handle to an AMQP connection
    pub struct Connection => "connection";
}

/// Connection state owned by the engine
#[derive(Debug)]
pub(crate) struct ConnectionState {
    pub(crate) core: EndpointCore,
    pub(crate) hostname: String,
    pub(crate) container_id: String,
    pub(crate) sessions: Vec<Session>,
    pub(crate) links: Vec<Link>,
    pub(crate) default_session: Option<Session>,
    pub(crate) transport: Option<Transport>,
    pub(crate) handler: Option<Arc<dyn Handler>>,
    pub(crate) remote_container: Option<String>,
    pub(crate) remote_hostname: Option<String>,
}

impl ConnectionState {
    pub(crate) fn new(hostname: String, container_id: String) -> Self {
        Self {
            core: EndpointCore::default(),
            hostname,
            container_id,
            sessions: Vec::new(),
            links: Vec::new(),
            default_session: None,
            transport: None,
            handler: None,
            remote_container: None,
            remote_hostname: None,
        }
    }
}

impl Endpoint for ConnectionState {
    fn core(&self) -> &EndpointCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EndpointCore {
        &mut self.core
    }
}

impl Connection {
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

    /// Close locally and drop the engine hold. The connection stays
    /// reachable while references taken with [`Engine::acquire`] remain.
    pub fn free(self, engine: &mut Engine) -> Result<(), EngineError> {
        engine.close_endpoint(self.id(), None)?;
        if engine.is_live(self) {
            engine.disown(self.id())?;
        }
        Ok(())
    }

    /// Combined local and remote state
    pub fn state(self, engine: &Engine) -> Result<EndpointState, EngineError> {
        Ok(engine.connection_state(self)?.core.state())
    }

    /// Host this connection is for
    pub fn hostname(self, engine: &Engine) -> Result<&str, EngineError> {
        Ok(&engine.connection_state(self)?.hostname)
    }

    /// Id of the container the connection was created in
    pub fn container(self, engine: &Engine) -> Result<&str, EngineError> {
        Ok(&engine.connection_state(self)?.container_id)
    }

    /// Bound transport, if any
    pub fn transport(self, engine: &Engine) -> Result<Option<Transport>, EngineError> {
        Ok(engine.connection_state(self)?.transport)
    }

    /// Local error condition
    pub fn condition(self, engine: &Engine) -> Result<Option<&Condition>, EngineError> {
        Ok(engine.connection_state(self)?.core.condition())
    }

    /// Error condition sent by the peer
    pub fn remote_condition(self, engine: &Engine) -> Result<Option<&Condition>, EngineError> {
        Ok(engine.connection_state(self)?.core.remote_condition())
    }

    /// Container id announced by the peer
    pub fn remote_container(self, engine: &Engine) -> Result<Option<&str>, EngineError> {
        Ok(engine.connection_state(self)?.remote_container.as_deref())
    }

    /// Hostname requested by the peer
    pub fn remote_hostname(self, engine: &Engine) -> Result<Option<&str>, EngineError> {
        Ok(engine.connection_state(self)?.remote_hostname.as_deref())
    }

    /// Handler for events on this connection and its children
    pub fn handler(self, engine: &Engine) -> Result<Option<Arc<dyn Handler>>, EngineError> {
        Ok(engine.connection_state(self)?.handler.clone())
    }

    /// Replace the connection handler
    pub fn set_handler(self, engine: &mut Engine, handler: Option<Arc<dyn Handler>>) -> Result<(), EngineError> {
        engine.connection_state_mut(self)?.handler = handler;
        Ok(())
    }

    /// Create a new session
    pub fn create_session(self, engine: &mut Engine) -> Result<Session, EngineError> {
        engine.create_session_in(self)
    }

    /// Session used by [`create_sender`](Self::create_sender) and
    /// [`create_receiver`](Self::create_receiver). Created and opened on
    /// first use; later calls return the same session.
    pub fn default_session(self, engine: &mut Engine) -> Result<Session, EngineError> {
        if let Some(session) = engine.connection_state(self)?.default_session {
            return Ok(session);
        }

        let session = engine.create_session_in(self)?;
        engine.acquire(Some(session))?;
        engine.connection_state_mut(self)?.default_session = Some(session);
        session.open(engine)?;
        debug!(connection = %self.id(), session = %session.id(), "default session created");
        Ok(session)
    }

    /// Create a sender on the default session targeting `address`. Fails
    /// with [`StateError::Closed`](crate::StateError::Closed) once the
    /// default session has been closed locally.
    pub fn create_sender(
        self,
        engine: &mut Engine,
        address: &str,
        handler: Option<Arc<dyn Handler>>,
    ) -> Result<Link, EngineError> {
        let session = self.default_session(engine)?;
        session.create_sender(engine, address, handler)
    }

    /// Create a receiver on the default session reading from `address`.
    /// With `dynamic` the peer is asked to create the source node.
    /// Fails like [`create_sender`](Self::create_sender) on a closed
    /// default session.
    pub fn create_receiver(
        self,
        engine: &mut Engine,
        address: &str,
        dynamic: bool,
        handler: Option<Arc<dyn Handler>>,
    ) -> Result<Link, EngineError> {
        let session = self.default_session(engine)?;
        session.create_receiver(engine, address, dynamic, handler)
    }

    /// First link, in creation order, whose state contains every flag in `mask`
    pub fn link_head(self, engine: &Engine, mask: EndpointState) -> Result<Option<Link>, EngineError> {
        let links = &engine.connection_state(self)?.links;
        Ok(first_match(engine, links, mask))
    }

    /// Next link after `link` whose state contains every flag in `mask`
    pub fn link_next(self, engine: &Engine, link: Link, mask: EndpointState) -> Result<Option<Link>, EngineError> {
        let links = &engine.connection_state(self)?.links;
        let rest = match links.iter().position(|candidate| *candidate == link) {
            Some(index) => &links[index + 1..],
            None => return Ok(None),
        };
        Ok(first_match(engine, rest, mask))
    }

    /// First session, in creation order, whose state contains every flag in `mask`
    pub fn session_head(self, engine: &Engine, mask: EndpointState) -> Result<Option<Session>, EngineError> {
        let sessions = &engine.connection_state(self)?.sessions;
        Ok(first_match(engine, sessions, mask))
    }

    /// Next session after `session` whose state contains every flag in `mask`
    pub fn session_next(
        self,
        engine: &Engine,
        session: Session,
        mask: EndpointState,
    ) -> Result<Option<Session>, EngineError> {
        let sessions = &engine.connection_state(self)?.sessions;
        let rest = match sessions.iter().position(|candidate| *candidate == session) {
            Some(index) => &sessions[index + 1..],
            None => return Ok(None),
        };
        Ok(first_match(engine, rest, mask))
    }
}

fn first_match<F: Facade>(engine: &Engine, candidates: &[F], mask: EndpointState) -> Option<F> {
    candidates.iter().copied().find(|candidate| {
        engine
            .endpoint(candidate.id())
            .map(|endpoint| endpoint.state().matches(mask))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventType;
    use crate::state::Lifecycle;
    use crate::StateError;

    fn engine() -> Engine {
        Engine::new("test-container")
    }

    #[test]
    fn test_create_connection() {
        let mut engine = engine();
        let connection = engine.create_connection("example.com");

        assert_eq!(connection.hostname(&engine).unwrap(), "example.com");
        assert_eq!(connection.container(&engine).unwrap(), "test-container");
        assert_eq!(connection.transport(&engine).unwrap(), None);
        assert_eq!(
            connection.state(&engine).unwrap(),
            EndpointState::LOCAL_UNINIT | EndpointState::REMOTE_UNINIT
        );
        assert_eq!(engine.collector_mut().pop().unwrap().kind, EventType::ConnectionInit);
    }

    #[test]
    fn test_open_then_close() {
        let mut engine = engine();
        let connection = engine.create_connection("example.com");

        connection.open(&mut engine).unwrap();
        connection.open(&mut engine).unwrap();
        assert!(connection.state(&engine).unwrap().contains(EndpointState::LOCAL_ACTIVE));

        connection.close(&mut engine).unwrap();
        connection.close(&mut engine).unwrap();
        let state = connection.state(&engine).unwrap();
        assert_eq!(state.local(), Lifecycle::Closed);
        assert_eq!(state.remote(), Lifecycle::Uninitialized);

        let kinds: Vec<_> = engine.collector_mut().drain().into_iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventType::ConnectionInit,
                EventType::ConnectionLocalOpen,
                EventType::ConnectionLocalClose,
            ]
        );
    }

    #[test]
    fn test_open_after_close_fails() {
        let mut engine = engine();
        let connection = engine.create_connection("example.com");
        connection.close(&mut engine).unwrap();

        let err = connection.open(&mut engine).unwrap_err();
        assert_eq!(err, EngineError::State(StateError::Closed));
        assert_eq!(connection.state(&engine).unwrap().local(), Lifecycle::Closed);
    }

    #[test]
    fn test_close_with_condition() {
        let mut engine = engine();
        let connection = engine.create_connection("example.com");
        connection
            .close_with(&mut engine, Condition::new("amqp:not-allowed", "go away"))
            .unwrap();
        assert_eq!(
            connection.condition(&engine).unwrap().unwrap().name,
            "amqp:not-allowed"
        );
        assert_eq!(connection.remote_condition(&engine).unwrap(), None);
    }

    #[test]
    fn test_default_session_is_memoized() {
        let mut engine = engine();
        let connection = engine.create_connection("example.com");

        let first = connection.default_session(&mut engine).unwrap();
        let second = connection.default_session(&mut engine).unwrap();
        assert_eq!(first, second);

        let inits = engine
            .collector_mut()
            .drain()
            .into_iter()
            .filter(|event| event.kind == EventType::SessionInit)
            .count();
        assert_eq!(inits, 1);
        assert_eq!(
            connection.session_head(&engine, EndpointState::empty()).unwrap(),
            Some(first)
        );
        assert_eq!(
            connection.session_next(&engine, first, EndpointState::empty()).unwrap(),
            None
        );
    }

    #[test]
    fn test_default_session_is_opened() {
        let mut engine = engine();
        let connection = engine.create_connection("example.com");
        let session = connection.default_session(&mut engine).unwrap();
        assert_eq!(session.state(&engine).unwrap().local(), Lifecycle::Active);
        assert_eq!(engine.refcount(session).unwrap(), 1);
    }

    #[test]
    fn test_sender_and_receiver_addresses() {
        let mut engine = engine();
        let connection = engine.create_connection("example.com");

        let sender = connection.create_sender(&mut engine, "queue/a", None).unwrap();
        let receiver = connection
            .create_receiver(&mut engine, "queue/b", false, None)
            .unwrap();

        assert!(sender.is_sender(&engine).unwrap());
        assert_eq!(sender.target(&engine).unwrap().address.as_deref(), Some("queue/a"));
        assert_eq!(sender.address(&engine).unwrap(), Some("queue/a"));
        assert!(receiver.is_receiver(&engine).unwrap());
        assert_eq!(receiver.source(&engine).unwrap().address.as_deref(), Some("queue/b"));
        assert_eq!(receiver.address(&engine).unwrap(), Some("queue/b"));

        let session = connection.default_session(&mut engine).unwrap();
        assert_eq!(sender.session(&engine).unwrap(), session);
        assert_eq!(receiver.connection(&engine).unwrap(), connection);
    }

    #[test]
    fn test_link_head_with_mask() {
        let mut engine = engine();
        let connection = engine.create_connection("example.com");
        assert_eq!(connection.link_head(&engine, EndpointState::empty()).unwrap(), None);

        let first = connection.create_sender(&mut engine, "a", None).unwrap();
        let second = connection.create_sender(&mut engine, "b", None).unwrap();
        second.open(&mut engine).unwrap();

        assert_eq!(
            connection.link_head(&engine, EndpointState::empty()).unwrap(),
            Some(first)
        );
        assert_eq!(
            connection.link_head(&engine, EndpointState::LOCAL_ACTIVE).unwrap(),
            Some(second)
        );
        assert_eq!(
            connection
                .link_head(&engine, EndpointState::LOCAL_ACTIVE | EndpointState::REMOTE_ACTIVE)
                .unwrap(),
            None
        );
        assert_eq!(
            connection.link_next(&engine, first, EndpointState::LOCAL_UNINIT).unwrap(),
            None
        );
        assert_eq!(
            connection.link_next(&engine, first, EndpointState::empty()).unwrap(),
            Some(second)
        );
    }

    #[test]
    fn test_no_links_once_default_session_closed() {
        let mut engine = engine();
        let connection = engine.create_connection("example.com");
        let session = connection.default_session(&mut engine).unwrap();
        session.close(&mut engine).unwrap();

        assert_eq!(
            connection.create_sender(&mut engine, "a", None),
            Err(EngineError::State(StateError::Closed))
        );
        assert_eq!(
            connection.create_receiver(&mut engine, "b", false, None),
            Err(EngineError::State(StateError::Closed))
        );
        assert_eq!(connection.default_session(&mut engine).unwrap(), session);
    }

    #[test]
    fn test_free_reclaims_unreferenced_connection() {
        let mut engine = engine();
        let connection = engine.create_connection("example.com");
        let sender = connection.create_sender(&mut engine, "a", None).unwrap();

        connection.free(&mut engine).unwrap();

        assert!(!engine.is_live(connection));
        assert!(!engine.is_live(sender));
        assert_eq!(engine.object_count(), 0);
        assert!(matches!(
            connection.state(&engine),
            Err(EngineError::Object(proton_object::ObjectError::Reclaimed(_)))
        ));
    }

    #[test]
    fn test_free_waits_for_references() {
        let mut engine = engine();
        let connection = engine.create_connection("example.com");
        engine.acquire(Some(connection)).unwrap();

        connection.free(&mut engine).unwrap();
        assert!(engine.is_live(connection));

        engine.release(Some(connection)).unwrap();
        assert!(!engine.is_live(connection));
    }
}
