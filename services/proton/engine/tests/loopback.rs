//! Two containers wired back to back through their transports.

use proton_engine::{
    Condition, Connection, Container, ContainerConfig, EndpointState, Engine, Event, EventType, Handler, Lifecycle,
    Role, Transport, TransportConfig,
};
use std::sync::{Arc, Mutex};

/// Peer that mirrors whatever the other side does
#[derive(Debug, Default)]
struct Mirror {
    seen: Mutex<Vec<EventType>>,
}

impl Handler for Mirror {
    fn on_connection_remote_open(&self, engine: &mut Engine, event: &Event) {
        self.record(event);
        if let Some(connection) = event.connection(engine) {
            connection.open(engine).unwrap();
        }
    }

    fn on_session_remote_open(&self, engine: &mut Engine, event: &Event) {
        self.record(event);
        if let Some(session) = event.session(engine) {
            session.open(engine).unwrap();
        }
    }

    fn on_link_remote_open(&self, engine: &mut Engine, event: &Event) {
        self.record(event);
        if let Some(link) = event.link() {
            link.open(engine).unwrap();
        }
    }

    fn on_link_remote_close(&self, engine: &mut Engine, event: &Event) {
        self.record(event);
        if let Some(link) = event.link() {
            link.close(engine).unwrap();
        }
    }

    fn on_session_remote_close(&self, engine: &mut Engine, event: &Event) {
        self.record(event);
        if let Some(session) = event.session(engine) {
            session.close(engine).unwrap();
        }
    }

    fn on_connection_remote_close(&self, engine: &mut Engine, event: &Event) {
        self.record(event);
        if let Some(connection) = event.connection(engine) {
            connection.close(engine).unwrap();
        }
    }

    fn on_unhandled(&self, _engine: &mut Engine, event: &Event) {
        self.record(event);
    }
}

impl Mirror {
    fn record(&self, event: &Event) {
        self.seen.lock().unwrap().push(event.kind);
    }

    fn saw(&self, kind: EventType) -> bool {
        self.seen.lock().unwrap().contains(&kind)
    }
}

struct Pair {
    client: Container,
    server: Container,
    client_transport: Transport,
    server_transport: Transport,
    connection: Connection,
    mirror: Arc<Mirror>,
}

impl Pair {
    fn new() -> Self {
        let mut client = Container::new(ContainerConfig {
            id: Some("client".to_string()),
        });
        let mut server = Container::new(ContainerConfig {
            id: Some("server".to_string()),
        });
        let mirror = Arc::new(Mirror::default());
        server.set_handler(mirror.clone());

        let connection = client.connect("server.example", TransportConfig::default()).unwrap();
        let client_transport = connection.transport(client.engine()).unwrap().unwrap();
        let accepted = server.accept(TransportConfig::default()).unwrap();
        let server_transport = accepted.transport(server.engine()).unwrap().unwrap();

        Self {
            client,
            server,
            client_transport,
            server_transport,
            connection,
            mirror,
        }
    }

    /// Move frames both ways until neither side has output. Returns the
    /// number of frames moved.
    fn pump(&mut self) -> usize {
        let mut total = 0;
        loop {
            self.client.process();
            self.server.process();
            let moved = transfer(&mut self.client, self.client_transport, &mut self.server, self.server_transport)
                + transfer(&mut self.server, self.server_transport, &mut self.client, self.client_transport);
            if moved == 0 {
                return total;
            }
            total += moved;
        }
    }
}

fn transfer(from: &mut Container, source: Transport, to: &mut Container, sink: Transport) -> usize {
    if !from.engine().is_live(source) {
        return 0;
    }
    let frames = source.take_output(from.engine_mut()).unwrap();
    let count = frames.len();
    for frame in frames {
        if to.engine().is_live(sink) {
            sink.handle_frame(to.engine_mut(), frame).unwrap();
        }
    }
    count
}

const ACTIVE: EndpointState = EndpointState::LOCAL_ACTIVE.union(EndpointState::REMOTE_ACTIVE);

#[test]
fn test_open_handshake_reaches_both_sides() {
    let mut pair = Pair::new();
    let engine = pair.client.engine_mut();
    pair.connection.open(engine).unwrap();
    let sender = pair.connection.create_sender(engine, "queue/orders", None).unwrap();
    sender.open(engine).unwrap();

    assert!(pair.pump() >= 6);

    let engine = pair.client.engine();
    let session = sender.session(engine).unwrap();
    assert_eq!(pair.connection.state(engine).unwrap(), ACTIVE);
    assert_eq!(session.state(engine).unwrap(), ACTIVE);
    assert_eq!(sender.state(engine).unwrap(), ACTIVE);
    assert_eq!(pair.connection.remote_container(engine).unwrap(), Some("server"));

    let server = pair.server.engine();
    let accepted = pair.server_transport.connection(server).unwrap().unwrap();
    assert_eq!(accepted.state(server).unwrap(), ACTIVE);
    assert_eq!(accepted.remote_container(server).unwrap(), Some("client"));
    assert_eq!(accepted.remote_hostname(server).unwrap(), Some("server.example"));

    let receiver = accepted.link_head(server, ACTIVE).unwrap().unwrap();
    assert_eq!(receiver.role(server).unwrap(), Role::Receiver);
    assert_eq!(receiver.name(server).unwrap(), sender.name(engine).unwrap());
    assert_eq!(
        receiver.remote_target(server).unwrap().and_then(|t| t.address.as_deref()),
        Some("queue/orders")
    );
    assert!(pair.mirror.saw(EventType::LinkInit));
    assert!(pair.mirror.saw(EventType::LinkRemoteOpen));
}

#[test]
fn test_detach_reclaims_links_on_both_sides() {
    let mut pair = Pair::new();
    let engine = pair.client.engine_mut();
    pair.connection.open(engine).unwrap();
    let sender = pair.connection.create_sender(engine, "a", None).unwrap();
    sender.open(engine).unwrap();
    pair.pump();

    let server = pair.server.engine();
    let accepted = pair.server_transport.connection(server).unwrap().unwrap();
    let receiver = accepted.link_head(server, ACTIVE).unwrap().unwrap();

    sender.close(pair.client.engine_mut()).unwrap();
    pair.pump();

    assert!(!pair.client.engine().is_live(sender));
    assert!(!pair.server.engine().is_live(receiver));
    assert!(pair.mirror.saw(EventType::LinkRemoteClose));
    assert!(pair.mirror.saw(EventType::LinkFinal));
    assert_eq!(
        pair.connection.link_head(pair.client.engine(), EndpointState::empty()).unwrap(),
        None
    );
}

#[test]
fn test_acquired_link_outlives_detach() {
    let mut pair = Pair::new();
    let engine = pair.client.engine_mut();
    pair.connection.open(engine).unwrap();
    let sender = pair.connection.create_sender(engine, "a", None).unwrap();
    engine.acquire(Some(sender)).unwrap();
    sender.open(engine).unwrap();
    pair.pump();

    sender
        .close_with(pair.client.engine_mut(), Condition::named("amqp:link:detach-forced"))
        .unwrap();
    pair.pump();

    let engine = pair.client.engine_mut();
    assert!(engine.is_live(sender));
    assert_eq!(
        sender.state(engine).unwrap(),
        EndpointState::LOCAL_CLOSED | EndpointState::REMOTE_CLOSED
    );
    engine.release(Some(sender)).unwrap();
    assert!(!engine.is_live(sender));
}

#[test]
fn test_close_reclaims_everything() {
    let mut pair = Pair::new();
    let engine = pair.client.engine_mut();
    pair.connection.open(engine).unwrap();
    let sender = pair.connection.create_sender(engine, "a", None).unwrap();
    let receiver = pair.connection.create_receiver(engine, "b", false, None).unwrap();
    sender.open(engine).unwrap();
    receiver.open(engine).unwrap();
    pair.pump();

    pair.connection.close(pair.client.engine_mut()).unwrap();
    pair.pump();

    assert!(pair.mirror.saw(EventType::ConnectionRemoteClose));
    assert!(pair.mirror.saw(EventType::TransportClosed));
    assert!(pair.mirror.saw(EventType::ConnectionFinal));
    assert!(!pair.client.engine().is_live(pair.connection));
    assert!(!pair.client.engine().is_live(sender));
    assert_eq!(pair.client.engine().object_count(), 0);
    assert_eq!(pair.server.engine().object_count(), 0);
}

#[test]
fn test_peer_close_condition_is_visible() {
    let mut pair = Pair::new();
    pair.connection.open(pair.client.engine_mut()).unwrap();
    pair.pump();

    let server = pair.server.engine_mut();
    let accepted = pair.server_transport.connection(server).unwrap().unwrap();
    accepted
        .close_with(server, Condition::new("amqp:connection:forced", "shutting down"))
        .unwrap();
    pair.pump();

    // client never closes, so the connection stays with the remote side closed
    let engine = pair.client.engine();
    let state = pair.connection.state(engine).unwrap();
    assert_eq!(state.local(), Lifecycle::Active);
    assert_eq!(state.remote(), Lifecycle::Closed);
    let condition = pair.connection.remote_condition(engine).unwrap().unwrap();
    assert_eq!(condition.name, "amqp:connection:forced");
    assert_eq!(condition.description.as_deref(), Some("shutting down"));
}
