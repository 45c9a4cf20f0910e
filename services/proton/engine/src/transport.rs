//! Transport: turns local endpoint state into outbound performatives and
//! applies inbound performatives as remote state.
//!
//! The transport works on typed [`Frame`]s and never touches sockets. A
//! driver moves frames between two transports (or an I/O layer) with
//! [`Transport::take_output`] and [`Transport::handle_frame`], and calls
//! [`Transport::tick`] to enforce idle timeouts.
//!
//! Every endpoint announced to the peer (open, begin or attach written) and
//! every endpoint created from an inbound frame is acquired by the
//! transport; the reference is released once the closing performative has
//! been written, or when the transport is unbound.

use crate::condition::{Condition, FRAMING_ERROR, RESOURCE_LIMIT_EXCEEDED};
use crate::config::TransportConfig;
use crate::connection::Connection;
use crate::engine::Engine;
use crate::error::{EngineError, TransportError};
use crate::event::{EventContext, EventType};
use crate::frame::{Frame, Performative};
use crate::link::Link;
use crate::session::Session;
use crate::state::Lifecycle;
use crate::terminus::Terminus;
use proton_object::{facade, Facade, ObjectId};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

facade! {
    /// Handle to a transport
    pub struct Transport => "transport";
}

/// Per-session channel bookkeeping
#[derive(Debug, Default)]
struct SessionWire {
    local_channel: Option<u16>,
    remote_channel: Option<u16>,
    begin_sent: bool,
    end_sent: bool,
    end_received: bool,
    next_handle: u32,
    remote_handles: HashMap<u32, Link>,
}

/// Per-link handle bookkeeping
#[derive(Debug, Default)]
struct LinkWire {
    local_handle: Option<u32>,
    attach_sent: bool,
    detach_sent: bool,
}

/// Transport state owned by the engine
#[derive(Debug)]
pub(crate) struct TransportState {
    config: TransportConfig,
    pub(crate) connection: Option<Connection>,
    /// Endpoints this transport holds a reference on
    pub(crate) announced: Vec<ObjectId>,
    /// Connection was reclaimed while bound
    pub(crate) orphaned: bool,
    condition: Option<Condition>,
    handling_frames: bool,
    stashed: Vec<Frame>,
    output: VecDeque<Frame>,
    open_sent: bool,
    close_sent: bool,
    close_received: bool,
    closed_emitted: bool,
    local_channels: BTreeMap<u16, Session>,
    remote_channels: HashMap<u16, Session>,
    sessions: HashMap<Session, SessionWire>,
    links: HashMap<Link, LinkWire>,
    remote_idle_timeout: Option<Duration>,
    frames_input: u64,
    frames_output: u64,
    last_input: u64,
    last_output: u64,
    local_deadline: Option<Instant>,
    remote_deadline: Option<Instant>,
}

impl TransportState {
    pub(crate) fn new(config: TransportConfig) -> Self {
        Self {
            config,
            connection: None,
            announced: Vec::new(),
            orphaned: false,
            condition: None,
            handling_frames: true,
            stashed: Vec::new(),
            output: VecDeque::new(),
            open_sent: false,
            close_sent: false,
            close_received: false,
            closed_emitted: false,
            local_channels: BTreeMap::new(),
            remote_channels: HashMap::new(),
            sessions: HashMap::new(),
            links: HashMap::new(),
            remote_idle_timeout: None,
            frames_input: 0,
            frames_output: 0,
            last_input: 0,
            last_output: 0,
            local_deadline: None,
            remote_deadline: None,
        }
    }

    fn free_channel(&self) -> Option<u16> {
        (0..=self.config.channel_max).find(|channel| !self.local_channels.contains_key(channel))
    }

    /// Forget the reference held on `id`. Returns false if none was held.
    fn unannounce(&mut self, id: ObjectId) -> bool {
        match self.announced.iter().position(|held| *held == id) {
            Some(index) => {
                self.announced.swap_remove(index);
                true
            }
            None => false,
        }
    }

    fn session_on(&self, channel: u16) -> Result<Session, TransportError> {
        self.remote_channels
            .get(&channel)
            .copied()
            .ok_or(TransportError::UnknownChannel(channel))
    }
}

impl Transport {
    /// Bind to a connection. Frames received while unbound are applied now.
    pub fn bind(self, engine: &mut Engine, connection: Connection) -> Result<(), EngineError> {
        engine.bind_transport(self, connection)
    }

    /// Detach from the connection and drop every endpoint reference
    pub fn unbind(self, engine: &mut Engine) -> Result<(), EngineError> {
        engine.unbind_transport(self)
    }

    /// Apply one inbound frame
    pub fn handle_frame(self, engine: &mut Engine, frame: Frame) -> Result<(), EngineError> {
        engine.transport_input(self, frame)
    }

    /// Number of outbound frames ready to be taken
    pub fn pending(self, engine: &mut Engine) -> Result<usize, EngineError> {
        engine.pump(self)?;
        Ok(engine.transport_state(self)?.output.len())
    }

    /// Take the next outbound frame
    pub fn pop_frame(self, engine: &mut Engine) -> Result<Option<Frame>, EngineError> {
        engine.pump(self)?;
        let state = engine.transport_state_mut(self)?;
        let frame = state.output.pop_front();
        if frame.is_some() {
            state.frames_output += 1;
        }
        engine.reap_transport(self)?;
        Ok(frame)
    }

    /// Take every outbound frame
    pub fn take_output(self, engine: &mut Engine) -> Result<Vec<Frame>, EngineError> {
        engine.pump(self)?;
        let state = engine.transport_state_mut(self)?;
        let frames: Vec<Frame> = state.output.drain(..).collect();
        state.frames_output += frames.len() as u64;
        engine.reap_transport(self)?;
        Ok(frames)
    }

    /// Process idle timeouts at `now`. Returns the next instant `tick`
    /// should be called again, if any timeout is configured.
    pub fn tick(self, engine: &mut Engine, now: Instant) -> Result<Option<Instant>, EngineError> {
        engine.tick_transport(self, now)
    }

    /// Unbind and drop the engine hold
    pub fn free(self, engine: &mut Engine) -> Result<(), EngineError> {
        engine.unbind_transport(self)?;
        engine.disown(self.id())
    }

    /// Bound connection, if any
    pub fn connection(self, engine: &Engine) -> Result<Option<Connection>, EngineError> {
        Ok(engine.transport_state(self)?.connection)
    }

    /// Error recorded by the last rejected frame or expired timeout
    pub fn condition(self, engine: &Engine) -> Result<Option<&Condition>, EngineError> {
        Ok(engine.transport_state(self)?.condition.as_ref())
    }

    /// False once a frame arrived before the transport was bound
    pub fn is_handling_frames(self, engine: &Engine) -> Result<bool, EngineError> {
        Ok(engine.transport_state(self)?.handling_frames)
    }

    /// Frames received so far
    pub fn frames_input(self, engine: &Engine) -> Result<u64, EngineError> {
        Ok(engine.transport_state(self)?.frames_input)
    }

    /// Frames taken so far
    pub fn frames_output(self, engine: &Engine) -> Result<u64, EngineError> {
        Ok(engine.transport_state(self)?.frames_output)
    }

    /// Idle timeout announced by the peer
    pub fn remote_idle_timeout(self, engine: &Engine) -> Result<Option<Duration>, EngineError> {
        Ok(engine.transport_state(self)?.remote_idle_timeout)
    }

    /// Configuration the transport was created with
    pub fn config(self, engine: &Engine) -> Result<&TransportConfig, EngineError> {
        Ok(&engine.transport_state(self)?.config)
    }
}

impl Engine {
    fn bind_transport(&mut self, transport: Transport, connection: Connection) -> Result<(), EngineError> {
        if self.transport_state(transport)?.connection.is_some() {
            return Err(TransportError::AlreadyBound.into());
        }
        if self.connection_state(connection)?.transport.is_some() {
            return Err(TransportError::ConnectionBound.into());
        }

        self.connection_state_mut(connection)?.transport = Some(transport);
        let state = self.transport_state_mut(transport)?;
        state.connection = Some(connection);
        let stashed = std::mem::take(&mut state.stashed);
        info!(transport = %transport.id(), connection = %connection.id(), "transport bound");
        self.emit(EventType::ConnectionBound, EventContext::Connection(connection));

        for frame in stashed {
            self.apply_or_fail(transport, connection, frame)?;
        }
        self.transport_state_mut(transport)?.handling_frames = true;
        Ok(())
    }

    fn unbind_transport(&mut self, transport: Transport) -> Result<(), EngineError> {
        let state = self.transport_state_mut(transport)?;
        let Some(connection) = state.connection.take() else {
            return Ok(());
        };
        let announced = std::mem::take(&mut state.announced);

        if let Ok(connection_state) = self.connection_state_mut(connection) {
            connection_state.transport = None;
        }
        info!(transport = %transport.id(), connection = %connection.id(), "transport unbound");
        self.emit(EventType::ConnectionUnbound, EventContext::Connection(connection));

        for id in announced {
            let _ = self.release_id(id);
        }
        Ok(())
    }

    fn transport_input(&mut self, transport: Transport, frame: Frame) -> Result<(), EngineError> {
        let state = self.transport_state_mut(transport)?;
        if !state.handling_frames {
            warn!(transport = %transport.id(), frame = frame.name(), "frame rejected, transport not handling frames");
            return Err(TransportError::NotHandlingFrames.into());
        }
        state.frames_input += 1;

        let Some(connection) = state.connection else {
            debug!(transport = %transport.id(), frame = frame.name(), "frame stashed until bind");
            state.stashed.push(frame);
            state.handling_frames = false;
            return Ok(());
        };
        self.apply_or_fail(transport, connection, frame)
    }

    fn apply_or_fail(&mut self, transport: Transport, connection: Connection, frame: Frame) -> Result<(), EngineError> {
        let name = frame.name();
        match self.apply_frame(transport, connection, frame) {
            Ok(()) => self.check_closed(transport),
            Err(err) => {
                warn!(transport = %transport.id(), frame = name, error = %err, "inbound frame rejected");
                let state = self.transport_state_mut(transport)?;
                if state.condition.is_none() {
                    state.condition = Some(Condition::new(FRAMING_ERROR, err.to_string()));
                }
                self.emit(EventType::TransportError, EventContext::Transport(transport));
                Err(err)
            }
        }
    }

    fn apply_frame(&mut self, transport: Transport, connection: Connection, frame: Frame) -> Result<(), EngineError> {
        let channel = frame.channel;
        let Some(body) = frame.body else {
            return Ok(());
        };
        debug!(transport = %transport.id(), channel, frame = body.name(), "frame received");

        match body {
            Performative::Open {
                container_id,
                hostname,
                idle_timeout,
                ..
            } => {
                if !self.remote_open(connection.id())? {
                    return Err(TransportError::UnexpectedFrame("open").into());
                }
                let state = self.connection_state_mut(connection)?;
                state.remote_container = Some(container_id);
                state.remote_hostname = hostname;
                self.transport_state_mut(transport)?.remote_idle_timeout = idle_timeout;
            }
            Performative::Begin { remote_channel } => {
                if self.transport_state(transport)?.remote_channels.contains_key(&channel) {
                    return Err(TransportError::UnexpectedFrame("begin").into());
                }
                let session = match remote_channel {
                    Some(local) => self
                        .transport_state(transport)?
                        .local_channels
                        .get(&local)
                        .copied()
                        .ok_or(TransportError::UnknownChannel(local))?,
                    None => {
                        let session = self.create_session_in(connection)?;
                        self.hold(transport, session.id())?;
                        session
                    }
                };
                if !self.remote_open(session.id())? {
                    return Err(TransportError::UnexpectedFrame("begin").into());
                }
                let state = self.transport_state_mut(transport)?;
                state.remote_channels.insert(channel, session);
                state.sessions.entry(session).or_default().remote_channel = Some(channel);
            }
            Performative::Attach {
                name,
                handle,
                role,
                source,
                target,
            } => {
                let session = self.transport_state(transport)?.session_on(channel)?;
                let wire = self.transport_state(transport)?.sessions.get(&session);
                if wire.map_or(false, |wire| wire.remote_handles.contains_key(&handle)) {
                    return Err(TransportError::UnexpectedFrame("attach").into());
                }

                let local_role = role.inverse();
                let existing = self.session_state(session)?.links.iter().copied().find(|link| {
                    self.link_state(*link)
                        .map(|state| {
                            state.name == name
                                && state.role == local_role
                                && state.core.remote() == Lifecycle::Uninitialized
                        })
                        .unwrap_or(false)
                });
                let link = match existing {
                    Some(link) => link,
                    None => {
                        let link = self.create_link_in(
                            session,
                            local_role,
                            name,
                            Terminus::default(),
                            Terminus::default(),
                            None,
                        )?;
                        self.hold(transport, link.id())?;
                        link
                    }
                };

                let state = self.link_state_mut(link)?;
                state.remote_source = source;
                state.remote_target = target;
                self.transport_state_mut(transport)?
                    .sessions
                    .entry(session)
                    .or_default()
                    .remote_handles
                    .insert(handle, link);
                self.remote_open(link.id())?;
            }
            Performative::Detach { handle, error } => {
                let session = self.transport_state(transport)?.session_on(channel)?;
                let link = self
                    .transport_state_mut(transport)?
                    .sessions
                    .get_mut(&session)
                    .and_then(|wire| wire.remote_handles.remove(&handle))
                    .ok_or(TransportError::UnknownHandle { channel, handle })?;
                self.remote_close(link.id(), error)?;
            }
            Performative::End { error } => {
                let state = self.transport_state_mut(transport)?;
                let session = state.session_on(channel)?;
                state.remote_channels.remove(&channel);
                let wire = state.sessions.entry(session).or_default();
                wire.end_received = true;
                wire.remote_channel = None;
                self.remote_close(session.id(), error)?;
            }
            Performative::Close { error } => {
                self.transport_state_mut(transport)?.close_received = true;
                self.remote_close(connection.id(), error)?;
            }
        }
        Ok(())
    }

    /// Take a transport reference on an endpoint
    fn hold(&mut self, transport: Transport, id: ObjectId) -> Result<(), EngineError> {
        let state = self.transport_state_mut(transport)?;
        if state.close_sent || state.announced.contains(&id) {
            return Ok(());
        }
        state.announced.push(id);
        self.acquire_id(id)
    }

    fn check_closed(&mut self, transport: Transport) -> Result<(), EngineError> {
        let state = self.transport_state_mut(transport)?;
        if state.close_sent && state.close_received && !state.closed_emitted {
            state.closed_emitted = true;
            info!(transport = %transport.id(), "transport closed");
            self.emit(EventType::TransportClosed, EventContext::Transport(transport));
        }
        Ok(())
    }

    fn lifecycles(&self, id: ObjectId) -> Result<(Lifecycle, Lifecycle), EngineError> {
        let core = self.endpoint(id)?.core();
        Ok((core.local(), core.remote()))
    }

    /// Write outbound frames for every pending local state change
    pub(crate) fn pump(&mut self, transport: Transport) -> Result<(), EngineError> {
        let state = self.transport_state(transport)?;
        let Some(connection) = state.connection else {
            return Ok(());
        };
        if state.close_sent {
            return self.prune(transport);
        }
        let mut releases = Vec::new();

        if !self.transport_state(transport)?.open_sent {
            match self.lifecycles(connection.id())? {
                (Lifecycle::Uninitialized, _) | (Lifecycle::Closed, Lifecycle::Uninitialized) => return Ok(()),
                _ => {}
            }
            let conn = self.connection_state(connection)?;
            let container_id = conn.container_id.clone();
            let hostname = Some(conn.hostname.clone());
            let state = self.transport_state_mut(transport)?;
            let open = Performative::Open {
                container_id,
                hostname,
                idle_timeout: state.config.idle_timeout,
                channel_max: state.config.channel_max,
                max_frame_size: state.config.max_frame_size,
            };
            state.open_sent = true;
            state.output.push_back(Frame::new(0, open));
            debug!(transport = %transport.id(), "open written");
            self.hold(transport, connection.id())?;
        }

        let sessions = self.connection_state(connection)?.sessions.clone();
        for session in sessions {
            if !self.pump_session(transport, session, &mut releases)? {
                break;
            }
        }

        let (local, _) = self.lifecycles(connection.id())?;
        if local == Lifecycle::Closed {
            let error = self.connection_state(connection)?.core.condition().cloned();
            let state = self.transport_state_mut(transport)?;
            state.close_sent = true;
            state.output.push_back(Frame::new(0, Performative::Close { error }));
            releases.append(&mut state.announced);
            debug!(transport = %transport.id(), "close written");
        }
        self.check_closed(transport)?;

        for id in releases {
            let _ = self.release_id(id);
        }
        self.prune(transport)
    }

    /// Write begin, attach, detach and end frames for one session. Returns
    /// false when no channel was left for it.
    fn pump_session(
        &mut self,
        transport: Transport,
        session: Session,
        releases: &mut Vec<ObjectId>,
    ) -> Result<bool, EngineError> {
        let (local, remote) = self.lifecycles(session.id())?;
        let state = self.transport_state_mut(transport)?;
        let wire = state.sessions.entry(session).or_default();

        if !wire.begin_sent {
            match (local, remote) {
                (Lifecycle::Uninitialized, _) => return Ok(true),
                (Lifecycle::Closed, Lifecycle::Uninitialized) => {
                    wire.begin_sent = true;
                    wire.end_sent = true;
                    return Ok(true);
                }
                _ => {}
            }
            let remote_channel = wire.remote_channel;
            let Some(channel) = state.free_channel() else {
                if state.condition.is_none() {
                    let limit = state.config.channel_max;
                    warn!(transport = %transport.id(), limit, "no free channel for session");
                    state.condition = Some(Condition::new(
                        RESOURCE_LIMIT_EXCEEDED,
                        TransportError::ChannelsExhausted(limit).to_string(),
                    ));
                    self.emit(EventType::TransportError, EventContext::Transport(transport));
                }
                return Ok(false);
            };
            state.local_channels.insert(channel, session);
            let wire = state.sessions.entry(session).or_default();
            wire.local_channel = Some(channel);
            wire.begin_sent = true;
            state
                .output
                .push_back(Frame::new(channel, Performative::Begin { remote_channel }));
            debug!(transport = %transport.id(), session = %session.id(), channel, "begin written");
            self.hold(transport, session.id())?;
        }

        let state = self.transport_state(transport)?;
        let Some(wire) = state.sessions.get(&session) else {
            return Ok(true);
        };
        if wire.end_sent {
            return Ok(true);
        }
        let Some(channel) = wire.local_channel else {
            return Ok(true);
        };

        let links = self.session_state(session)?.links.clone();
        for link in links {
            self.pump_link(transport, session, channel, link, releases)?;
        }

        if local == Lifecycle::Closed {
            let error = self.session_state(session)?.core.condition().cloned();
            let state = self.transport_state_mut(transport)?;
            if let Some(wire) = state.sessions.get_mut(&session) {
                wire.end_sent = true;
            }
            state.output.push_back(Frame::new(channel, Performative::End { error }));
            debug!(transport = %transport.id(), session = %session.id(), channel, "end written");
            if state.unannounce(session.id()) {
                releases.push(session.id());
            }
        }
        Ok(true)
    }

    fn pump_link(
        &mut self,
        transport: Transport,
        session: Session,
        channel: u16,
        link: Link,
        releases: &mut Vec<ObjectId>,
    ) -> Result<(), EngineError> {
        let (local, remote) = self.lifecycles(link.id())?;
        let state = self.transport_state_mut(transport)?;
        let wire = state.links.entry(link).or_default();

        if !wire.attach_sent {
            match (local, remote) {
                (Lifecycle::Uninitialized, _) => return Ok(()),
                (Lifecycle::Closed, Lifecycle::Uninitialized) => {
                    wire.attach_sent = true;
                    wire.detach_sent = true;
                    return Ok(());
                }
                _ => {}
            }
            let link_state = self.link_state(link)?;
            let name = link_state.name.clone();
            let role = link_state.role;
            let source = Some(link_state.source.clone());
            let target = Some(link_state.target.clone());

            let state = self.transport_state_mut(transport)?;
            let session_wire = state.sessions.entry(session).or_default();
            let handle = session_wire.next_handle;
            session_wire.next_handle += 1;
            let wire = state.links.entry(link).or_default();
            wire.local_handle = Some(handle);
            wire.attach_sent = true;
            state.output.push_back(Frame::new(
                channel,
                Performative::Attach {
                    name,
                    handle,
                    role,
                    source,
                    target,
                },
            ));
            debug!(transport = %transport.id(), link = %link.id(), handle, "attach written");
            self.hold(transport, link.id())?;
        }

        if local != Lifecycle::Closed {
            return Ok(());
        }
        let error = self.link_state(link)?.core.condition().cloned();
        let state = self.transport_state_mut(transport)?;
        let Some(wire) = state.links.get_mut(&link) else {
            return Ok(());
        };
        if wire.detach_sent {
            return Ok(());
        }
        let Some(handle) = wire.local_handle else {
            return Ok(());
        };
        wire.detach_sent = true;
        state.output.push_back(Frame::new(
            channel,
            Performative::Detach {
                handle,
                error,
            },
        ));
        debug!(transport = %transport.id(), link = %link.id(), handle, "detach written");
        if state.unannounce(link.id()) {
            releases.push(link.id());
        }
        Ok(())
    }

    /// Forget reclaimed endpoints and free channels of ended sessions
    fn prune(&mut self, transport: Transport) -> Result<(), EngineError> {
        let Ok(state) = self.transport_state(transport) else {
            return Ok(());
        };
        let dead_links: Vec<Link> = state
            .links
            .keys()
            .copied()
            .filter(|link| !self.is_live(*link))
            .collect();
        let dead_sessions: Vec<Session> = state
            .sessions
            .keys()
            .copied()
            .filter(|session| !self.is_live(*session))
            .collect();

        let state = self.transport_state_mut(transport)?;
        for link in dead_links {
            state.links.remove(&link);
        }
        for session in dead_sessions {
            state.sessions.remove(&session);
        }
        let TransportState {
            sessions,
            local_channels,
            remote_channels,
            ..
        } = state;
        for wire in sessions.values_mut().filter(|wire| wire.end_sent && wire.end_received) {
            if let Some(channel) = wire.local_channel.take() {
                local_channels.remove(&channel);
            }
            if let Some(channel) = wire.remote_channel.take() {
                remote_channels.remove(&channel);
            }
        }
        local_channels.retain(|_, session| sessions.contains_key(session));
        Ok(())
    }

    /// Reclaim a transport whose connection is gone once its output is taken
    fn reap_transport(&mut self, transport: Transport) -> Result<(), EngineError> {
        let state = self.transport_state(transport)?;
        if state.orphaned && state.output.is_empty() {
            debug!(transport = %transport.id(), "orphaned transport drained");
            self.disown(transport.id())?;
        }
        Ok(())
    }

    fn tick_transport(&mut self, transport: Transport, now: Instant) -> Result<Option<Instant>, EngineError> {
        let mut next: Option<Instant> = None;
        let state = self.transport_state_mut(transport)?;

        if let Some(timeout) = state.config.idle_timeout {
            let expired = match state.local_deadline {
                Some(deadline) if state.last_input == state.frames_input => deadline <= now,
                _ => false,
            };
            if state.local_deadline.is_none() || state.last_input != state.frames_input || expired {
                state.local_deadline = Some(now + timeout);
                state.last_input = state.frames_input;
            }
            next = state.local_deadline;

            if expired {
                if let Some(connection) = state.connection {
                    let condition = Condition::new(RESOURCE_LIMIT_EXCEEDED, "local-idle-timeout expired");
                    state.condition = Some(condition.clone());
                    warn!(transport = %transport.id(), ?timeout, "local idle timeout expired");
                    if self.lifecycles(connection.id())?.0 != Lifecycle::Closed {
                        self.close_endpoint(connection.id(), Some(condition))?;
                    }
                }
            }
        }

        let state = self.transport_state_mut(transport)?;
        if let (Some(timeout), false) = (state.remote_idle_timeout, state.close_sent) {
            let half = timeout / 2;
            let expired = match state.remote_deadline {
                Some(deadline) if state.last_output == state.frames_output => deadline <= now,
                _ => false,
            };
            if state.remote_deadline.is_none() || state.last_output != state.frames_output || expired {
                state.remote_deadline = Some(now + half);
                state.last_output = state.frames_output;
            }
            let deadline = state.remote_deadline;

            if expired {
                self.pump(transport)?;
                let state = self.transport_state_mut(transport)?;
                if state.output.is_empty() {
                    debug!(transport = %transport.id(), "keepalive written");
                    state.output.push_back(Frame::empty());
                }
                state.last_output = state.frames_output + state.output.len() as u64;
            }
            next = match (next, deadline) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
        }
        Ok(next)
    }
}
