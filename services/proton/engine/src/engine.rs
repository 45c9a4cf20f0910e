//! Object graph owner: creates endpoints, applies state changes, reclaims objects.
//!
//! All engine objects live in one [`ObjectStore`]. Endpoints are held by the
//! engine until both sides are closed; the transport additionally acquires
//! every endpoint it has announced to the peer until the closing frame is
//! produced. Reclaiming a connection drops the engine hold on all of its
//! sessions and links and unbinds its transport; the transport itself is
//! reclaimed once its remaining output has been taken.

use crate::condition::Condition;
use crate::connection::{Connection, ConnectionState};
use crate::endpoint::{Endpoint, Transition};
use crate::error::{EngineError, StateError};
use crate::event::{Collector, EventContext, EventType};
use crate::handler::Handler;
use crate::link::{Link, LinkState};
use crate::session::{Session, SessionState};
use crate::terminus::{Role, Terminus};
use crate::transport::{Transport, TransportState};
use crate::TransportConfig;
use proton_object::{wrap, Facade, ObjectId, ObjectStore};
use std::sync::Arc;
use tracing::{debug, info};

/// Object stored in the engine
#[derive(Debug)]
pub(crate) enum EngineObject {
    Connection(ConnectionState),
    Session(SessionState),
    Link(LinkState),
    Transport(TransportState),
}

impl EngineObject {
    fn context(&self, id: ObjectId) -> EventContext {
        match self {
            EngineObject::Connection(_) => EventContext::Connection(wrap(id)),
            EngineObject::Session(_) => EventContext::Session(wrap(id)),
            EngineObject::Link(_) => EventContext::Link(wrap(id)),
            EngineObject::Transport(_) => EventContext::Transport(wrap(id)),
        }
    }

    fn endpoint(&self) -> Option<&dyn Endpoint> {
        match self {
            EngineObject::Connection(state) => Some(state),
            EngineObject::Session(state) => Some(state),
            EngineObject::Link(state) => Some(state),
            EngineObject::Transport(_) => None,
        }
    }

    fn endpoint_mut(&mut self) -> Option<&mut dyn Endpoint> {
        match self {
            EngineObject::Connection(state) => Some(state),
            EngineObject::Session(state) => Some(state),
            EngineObject::Link(state) => Some(state),
            EngineObject::Transport(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Change {
    LocalOpen,
    LocalClose,
    RemoteOpen,
    RemoteClose,
}

fn change_event(context: EventContext, change: Change) -> Option<EventType> {
    let kind = match (context, change) {
        (EventContext::Connection(_), Change::LocalOpen) => EventType::ConnectionLocalOpen,
        (EventContext::Connection(_), Change::LocalClose) => EventType::ConnectionLocalClose,
        (EventContext::Connection(_), Change::RemoteOpen) => EventType::ConnectionRemoteOpen,
        (EventContext::Connection(_), Change::RemoteClose) => EventType::ConnectionRemoteClose,
        (EventContext::Session(_), Change::LocalOpen) => EventType::SessionLocalOpen,
        (EventContext::Session(_), Change::LocalClose) => EventType::SessionLocalClose,
        (EventContext::Session(_), Change::RemoteOpen) => EventType::SessionRemoteOpen,
        (EventContext::Session(_), Change::RemoteClose) => EventType::SessionRemoteClose,
        (EventContext::Link(_), Change::LocalOpen) => EventType::LinkLocalOpen,
        (EventContext::Link(_), Change::LocalClose) => EventType::LinkLocalClose,
        (EventContext::Link(_), Change::RemoteOpen) => EventType::LinkRemoteOpen,
        (EventContext::Link(_), Change::RemoteClose) => EventType::LinkRemoteClose,
        (EventContext::Transport(_), _) => return None,
    };
    Some(kind)
}

/// AMQP endpoint engine for one container
#[derive(Debug)]
pub struct Engine {
    objects: ObjectStore<EngineObject>,
    collector: Collector,
    container_id: String,
}

impl Engine {
    /// Create an empty engine for the given container id
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            objects: ObjectStore::new(),
            collector: Collector::new(),
            container_id: container_id.into(),
        }
    }

    /// Id of the owning container
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Pending events
    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    /// Pending events, for draining
    pub fn collector_mut(&mut self) -> &mut Collector {
        &mut self.collector
    }

    /// Number of live objects of every kind
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Create a connection to `hostname`
    pub fn create_connection(&mut self, hostname: impl Into<String>) -> Connection {
        let hostname = hostname.into();
        let state = ConnectionState::new(hostname.clone(), self.container_id.clone());
        let connection: Connection = wrap(self.objects.insert(EngineObject::Connection(state)));
        info!(connection = %connection.id(), hostname = %hostname, "connection created");
        self.emit(EventType::ConnectionInit, EventContext::Connection(connection));
        connection
    }

    /// Create an unbound transport
    pub fn create_transport(&mut self, config: TransportConfig) -> Transport {
        let state = TransportState::new(config);
        let transport: Transport = wrap(self.objects.insert(EngineObject::Transport(state)));
        debug!(transport = %transport.id(), "transport created");
        transport
    }

    /// Take a reference on an object. `None` is a no-op.
    pub fn acquire<F: Facade>(&mut self, handle: Option<F>) -> Result<(), EngineError> {
        self.objects.acquire(handle.map(Facade::id))?;
        Ok(())
    }

    /// Drop a reference taken with [`acquire`](Self::acquire). `None` is a
    /// no-op. The object is reclaimed once no references remain and the
    /// engine no longer holds it.
    pub fn release<F: Facade>(&mut self, handle: Option<F>) -> Result<(), EngineError> {
        match handle {
            Some(handle) => self.release_id(handle.id()),
            None => Ok(()),
        }
    }

    /// Number of references taken on an object
    pub fn refcount<F: Facade>(&self, handle: F) -> Result<usize, EngineError> {
        Ok(self.objects.refcount(handle.id())?)
    }

    /// Whether the handle still refers to a live object
    pub fn is_live<F: Facade>(&self, handle: F) -> bool {
        self.objects.contains(handle.id())
    }

    pub(crate) fn emit(&mut self, kind: EventType, context: EventContext) {
        self.collector.put(kind, context);
    }

    pub(crate) fn connection_state(&self, connection: Connection) -> Result<&ConnectionState, EngineError> {
        match self.objects.get(connection.id())? {
            EngineObject::Connection(state) => Ok(state),
            _ => Err(wrong_kind(connection)),
        }
    }

    pub(crate) fn connection_state_mut(
        &mut self,
        connection: Connection,
    ) -> Result<&mut ConnectionState, EngineError> {
        match self.objects.get_mut(connection.id())? {
            EngineObject::Connection(state) => Ok(state),
            _ => Err(wrong_kind(connection)),
        }
    }

    pub(crate) fn session_state(&self, session: Session) -> Result<&SessionState, EngineError> {
        match self.objects.get(session.id())? {
            EngineObject::Session(state) => Ok(state),
            _ => Err(wrong_kind(session)),
        }
    }

    pub(crate) fn session_state_mut(&mut self, session: Session) -> Result<&mut SessionState, EngineError> {
        match self.objects.get_mut(session.id())? {
            EngineObject::Session(state) => Ok(state),
            _ => Err(wrong_kind(session)),
        }
    }

    pub(crate) fn link_state(&self, link: Link) -> Result<&LinkState, EngineError> {
        match self.objects.get(link.id())? {
            EngineObject::Link(state) => Ok(state),
            _ => Err(wrong_kind(link)),
        }
    }

    pub(crate) fn link_state_mut(&mut self, link: Link) -> Result<&mut LinkState, EngineError> {
        match self.objects.get_mut(link.id())? {
            EngineObject::Link(state) => Ok(state),
            _ => Err(wrong_kind(link)),
        }
    }

    pub(crate) fn transport_state(&self, transport: Transport) -> Result<&TransportState, EngineError> {
        match self.objects.get(transport.id())? {
            EngineObject::Transport(state) => Ok(state),
            _ => Err(wrong_kind(transport)),
        }
    }

    pub(crate) fn transport_state_mut(
        &mut self,
        transport: Transport,
    ) -> Result<&mut TransportState, EngineError> {
        match self.objects.get_mut(transport.id())? {
            EngineObject::Transport(state) => Ok(state),
            _ => Err(wrong_kind(transport)),
        }
    }

    /// Endpoint view of any connection, session or link
    pub(crate) fn endpoint(&self, id: ObjectId) -> Result<&dyn Endpoint, EngineError> {
        self.objects
            .get(id)?
            .endpoint()
            .ok_or(EngineError::WrongKind { id, expected: "endpoint" })
    }

    pub(crate) fn open_endpoint(&mut self, id: ObjectId) -> Result<(), EngineError> {
        let object = self.objects.get_mut(id)?;
        let context = object.context(id);
        let endpoint = object
            .endpoint_mut()
            .ok_or(EngineError::WrongKind { id, expected: "endpoint" })?;

        if endpoint.open()? == Transition::Applied {
            debug!(object = %id, "local open");
            if let Some(kind) = change_event(context, Change::LocalOpen) {
                self.emit(kind, context);
            }
        }
        Ok(())
    }

    pub(crate) fn close_endpoint(&mut self, id: ObjectId, condition: Option<Condition>) -> Result<(), EngineError> {
        let object = self.objects.get_mut(id)?;
        let context = object.context(id);
        let endpoint = object
            .endpoint_mut()
            .ok_or(EngineError::WrongKind { id, expected: "endpoint" })?;

        if endpoint.close(condition) == Transition::Applied {
            debug!(object = %id, "local close");
            if let Some(kind) = change_event(context, Change::LocalClose) {
                self.emit(kind, context);
            }
            self.settle(id)?;
        }
        Ok(())
    }

    /// Apply a remote open; false if the remote side was not uninitialized
    pub(crate) fn remote_open(&mut self, id: ObjectId) -> Result<bool, EngineError> {
        let object = self.objects.get_mut(id)?;
        let context = object.context(id);
        let endpoint = object
            .endpoint_mut()
            .ok_or(EngineError::WrongKind { id, expected: "endpoint" })?;

        if !endpoint.core_mut().remote_open() {
            return Ok(false);
        }
        debug!(object = %id, "remote open");
        if let Some(kind) = change_event(context, Change::RemoteOpen) {
            self.emit(kind, context);
        }
        Ok(true)
    }

    /// Apply a remote close; false if the remote side was already closed
    pub(crate) fn remote_close(&mut self, id: ObjectId, condition: Option<Condition>) -> Result<bool, EngineError> {
        let object = self.objects.get_mut(id)?;
        let context = object.context(id);
        let endpoint = object
            .endpoint_mut()
            .ok_or(EngineError::WrongKind { id, expected: "endpoint" })?;

        if !endpoint.core_mut().remote_close(condition) {
            return Ok(false);
        }
        debug!(object = %id, "remote close");
        if let Some(kind) = change_event(context, Change::RemoteClose) {
            self.emit(kind, context);
        }
        self.settle(id)?;
        Ok(true)
    }

    pub(crate) fn create_session_in(&mut self, connection: Connection) -> Result<Session, EngineError> {
        if self.connection_state(connection)?.core.is_terminal() {
            return Err(StateError::Terminal.into());
        }

        let session: Session = wrap(
            self.objects
                .insert(EngineObject::Session(SessionState::new(connection))),
        );
        self.connection_state_mut(connection)?.sessions.push(session);
        debug!(connection = %connection.id(), session = %session.id(), "session created");
        self.emit(EventType::SessionInit, EventContext::Session(session));
        Ok(session)
    }

    pub(crate) fn create_link_in(
        &mut self,
        session: Session,
        role: Role,
        name: String,
        source: Terminus,
        target: Terminus,
        handler: Option<Arc<dyn Handler>>,
    ) -> Result<Link, EngineError> {
        let connection = self.session_state(session)?.connection;
        if self.connection_state(connection)?.core.is_terminal() {
            return Err(StateError::Terminal.into());
        }

        let state = LinkState::new(name, role, session, connection, source, target, handler);
        let link: Link = wrap(self.objects.insert(EngineObject::Link(state)));
        self.session_state_mut(session)?.links.push(link);
        self.connection_state_mut(connection)?.links.push(link);
        debug!(session = %session.id(), link = %link.id(), ?role, "link created");
        self.emit(EventType::LinkInit, EventContext::Link(link));
        Ok(link)
    }

    /// Drop the engine hold once an endpoint is closed on both sides
    fn settle(&mut self, id: ObjectId) -> Result<(), EngineError> {
        let terminal = self.endpoint(id)?.core().is_terminal();
        if terminal && self.objects.is_held(id)? {
            self.disown(id)?;
        }
        Ok(())
    }

    /// Drop the engine hold, reclaiming the object if nothing references it
    pub(crate) fn disown(&mut self, id: ObjectId) -> Result<(), EngineError> {
        if let Some(object) = self.objects.disown(id)? {
            self.finalize(id, object);
        }
        Ok(())
    }

    pub(crate) fn acquire_id(&mut self, id: ObjectId) -> Result<(), EngineError> {
        self.objects.acquire(Some(id))?;
        Ok(())
    }

    pub(crate) fn release_id(&mut self, id: ObjectId) -> Result<(), EngineError> {
        if let Some(object) = self.objects.release(Some(id))? {
            self.finalize(id, object);
        }
        Ok(())
    }

    /// Unlink a reclaimed object from the graph and cascade to its children
    fn finalize(&mut self, id: ObjectId, object: EngineObject) {
        match object {
            EngineObject::Connection(state) => {
                info!(connection = %id, hostname = %state.hostname, "connection reclaimed");
                self.emit(EventType::ConnectionFinal, EventContext::Connection(wrap(id)));
                if let Some(transport) = state.transport {
                    let announced = match self.transport_state_mut(transport) {
                        Ok(transport_state) => {
                            transport_state.connection = None;
                            transport_state.orphaned = true;
                            std::mem::take(&mut transport_state.announced)
                        }
                        Err(_) => Vec::new(),
                    };
                    for held in announced {
                        let _ = self.release_id(held);
                    }
                }
                if let Some(session) = state.default_session {
                    let _ = self.release_id(session.id());
                }
                for session in state.sessions {
                    let _ = self.disown(session.id());
                }
                for link in state.links {
                    let _ = self.disown(link.id());
                }
            }
            EngineObject::Session(state) => {
                debug!(session = %id, "session reclaimed");
                self.emit(EventType::SessionFinal, EventContext::Session(wrap(id)));
                if let Ok(connection) = self.connection_state_mut(state.connection) {
                    connection.sessions.retain(|session| session.id() != id);
                }
                for link in state.links {
                    let _ = self.disown(link.id());
                }
            }
            EngineObject::Link(state) => {
                debug!(link = %id, name = %state.name, "link reclaimed");
                self.emit(EventType::LinkFinal, EventContext::Link(wrap(id)));
                if let Ok(session) = self.session_state_mut(state.session) {
                    session.links.retain(|link| link.id() != id);
                }
                if let Ok(connection) = self.connection_state_mut(state.connection) {
                    connection.links.retain(|link| link.id() != id);
                }
            }
            EngineObject::Transport(state) => {
                debug!(transport = %id, "transport reclaimed");
                if let Some(connection) = state.connection {
                    if let Ok(connection) = self.connection_state_mut(connection) {
                        connection.transport = None;
                    }
                }
                for announced in state.announced {
                    let _ = self.release_id(announced);
                }
            }
        }
    }
}

fn wrong_kind<F: Facade>(handle: F) -> EngineError {
    EngineError::WrongKind {
        id: handle.id(),
        expected: F::KIND,
    }
}
