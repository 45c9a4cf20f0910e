//! In-process loopback: a client container talking to a peer container
//! through their transports.

use crate::config::SendConfig;
use crate::{component_debug, component_info, component_warn};
use anyhow::{Context, Result};
use proton_engine::{
    Connection, Container, ContainerConfig, EndpointState, Engine, Event, Handler, Link, Transport,
    TransportConfig,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

const ATTACHED: EndpointState = EndpointState::LOCAL_ACTIVE.union(EndpointState::REMOTE_ACTIVE);

/// Peer side: accepts everything the client opens and mirrors closes
#[derive(Debug)]
pub struct PeerHandler;

impl Handler for PeerHandler {
    fn on_connection_remote_open(&self, engine: &mut Engine, event: &Event) {
        if let Some(connection) = event.connection(engine) {
            let container = connection.remote_container(engine).ok().flatten().unwrap_or("?").to_string();
            component_info!("peer", "Accepting connection from {}", container);
            if let Err(e) = connection.open(engine) {
                component_warn!("peer", "Failed to open connection: {}", e);
            }
        }
    }

    fn on_session_remote_open(&self, engine: &mut Engine, event: &Event) {
        if let Some(session) = event.session(engine) {
            if let Err(e) = session.open(engine) {
                component_warn!("peer", "Failed to begin session: {}", e);
            }
        }
    }

    fn on_link_remote_open(&self, engine: &mut Engine, event: &Event) {
        let Some(link) = event.link() else {
            return;
        };
        let address = link
            .remote_target(engine)
            .ok()
            .flatten()
            .and_then(|target| target.address.clone())
            .unwrap_or_default();
        component_info!("peer", "Attaching receiver for {}", address);
        if let Err(e) = link.open(engine) {
            component_warn!("peer", "Failed to attach link: {}", e);
        }
    }

    fn on_link_remote_close(&self, engine: &mut Engine, event: &Event) {
        if let Some(link) = event.link() {
            let _ = link.close(engine);
        }
    }

    fn on_session_remote_close(&self, engine: &mut Engine, event: &Event) {
        if let Some(session) = event.session(engine) {
            let _ = session.close(engine);
        }
    }

    fn on_connection_remote_close(&self, engine: &mut Engine, event: &Event) {
        if let Some(connection) = event.connection(engine) {
            component_info!("peer", "Client closed the connection");
            let _ = connection.close(engine);
        }
    }

    fn on_unhandled(&self, _engine: &mut Engine, event: &Event) {
        component_debug!("peer", "Event {}", event);
    }
}

/// Client side: reports remote state changes
#[derive(Debug)]
pub struct ClientHandler;

impl Handler for ClientHandler {
    fn on_link_remote_open(&self, engine: &mut Engine, event: &Event) {
        if let Some(link) = event.link() {
            let address = link.address(engine).ok().flatten().unwrap_or_default().to_string();
            component_info!("client", "Sender attached to {}", address);
        }
    }

    fn on_transport_error(&self, engine: &mut Engine, event: &Event) {
        let condition = event
            .transport(engine)
            .and_then(|transport| transport.condition(engine).ok().flatten().cloned());
        component_warn!("client", "Transport error: {:?}", condition);
    }

    fn on_transport_closed(&self, _engine: &mut Engine, _event: &Event) {
        component_info!("client", "Transport closed");
    }

    fn on_unhandled(&self, _engine: &mut Engine, event: &Event) {
        component_debug!("client", "Event {}", event);
    }
}

/// Outcome of one run
#[derive(Debug, Default)]
pub struct Report {
    /// Addresses whose sender attached
    pub attached: Vec<String>,
    /// Addresses whose sender did not attach in time
    pub failed: Vec<String>,
    /// Links still alive after shutdown
    pub leaked: usize,
    /// Frames moved in both directions
    pub frames: usize,
}

/// Two containers wired back to back
struct Loopback {
    client: Container,
    client_transport: Transport,
    peer: Container,
    peer_transport: Transport,
    interval: Duration,
    frames: usize,
}

impl Loopback {
    /// Run handlers, move frames both ways, then process idle timeouts.
    /// Returns the number of frames moved.
    async fn round(&mut self) -> Result<usize> {
        self.client.process();
        self.peer.process();

        let moved = transfer(&mut self.client, self.client_transport, &mut self.peer, self.peer_transport)?
            + transfer(&mut self.peer, self.peer_transport, &mut self.client, self.client_transport)?;
        self.frames += moved;

        let now = Instant::now();
        for (container, transport) in [
            (&mut self.client, self.client_transport),
            (&mut self.peer, self.peer_transport),
        ] {
            if container.engine().is_live(transport) {
                transport.tick(container.engine_mut(), now)?;
            }
        }

        tokio::time::sleep(self.interval).await;
        Ok(moved)
    }

    /// Run rounds until `done` holds or `max_rounds` is reached
    async fn run_until<F>(&mut self, max_rounds: usize, mut done: F) -> Result<bool>
    where
        F: FnMut(&Engine) -> bool,
    {
        for round in 0..max_rounds {
            let moved = self.round().await?;
            component_debug!("loopback", "Round {} moved {} frames", round, moved);
            if done(self.client.engine()) {
                return Ok(true);
            }
        }
        Ok(done(self.client.engine()))
    }
}

fn transfer(from: &mut Container, source: Transport, to: &mut Container, sink: Transport) -> Result<usize> {
    if !from.engine().is_live(source) {
        return Ok(0);
    }
    let frames = source.take_output(from.engine_mut())?;
    let count = frames.len();
    for frame in frames {
        if !to.engine().is_live(sink) {
            break;
        }
        sink.handle_frame(to.engine_mut(), frame)
            .context("peer rejected frame")?;
    }
    Ok(count)
}

/// Open a sender per configured address against an in-process peer, wait
/// for them to attach, then close everything and wait for reclamation.
pub async fn run(config: &SendConfig) -> Result<Report> {
    let mut client = Container::new(ContainerConfig {
        id: config.container_id.clone(),
    });
    client.set_handler(Arc::new(ClientHandler));
    let mut peer = Container::new(ContainerConfig {
        id: Some(format!("{}-peer", client.id())),
    });
    peer.set_handler(Arc::new(PeerHandler));

    let transport_config = TransportConfig {
        idle_timeout: config.idle_timeout()?,
        ..TransportConfig::default()
    };
    let connection = client.connect(&config.hostname, transport_config)?;
    let client_transport = connection
        .transport(client.engine())?
        .context("connection has no transport")?;
    let accepted = peer.accept(TransportConfig::default())?;
    let peer_transport = accepted
        .transport(peer.engine())?
        .context("accepted connection has no transport")?;
    component_info!("client", "Connecting to {} as {}", config.hostname, client.id());

    let senders = open_senders(client.engine_mut(), connection, &config.addresses)?;

    let mut wire = Loopback {
        client,
        client_transport,
        peer,
        peer_transport,
        interval: config.round_interval()?,
        frames: 0,
    };

    let attached = wire
        .run_until(config.max_rounds, |engine| {
            senders
                .iter()
                .all(|(_, link)| link.state(engine).map_or(false, |state| state.matches(ATTACHED)))
        })
        .await?;

    let mut report = Report::default();
    for (address, link) in &senders {
        let state = link.state(wire.client.engine())?;
        if state.matches(ATTACHED) {
            report.attached.push(address.clone());
        } else {
            component_warn!("client", "Sender for {} did not attach, state {:?}", address, state);
            report.failed.push(address.clone());
        }
    }
    if attached {
        component_info!("client", "All {} senders attached", senders.len());
    }

    let engine = wire.client.engine_mut();
    for (_, link) in &senders {
        link.close(engine)?;
    }
    connection.close(engine)?;
    component_info!("client", "Closing connection");

    wire.run_until(config.max_rounds, |engine| !engine.is_live(connection))
        .await?;

    let engine = wire.client.engine_mut();
    for (address, link) in &senders {
        engine.release(Some(*link))?;
        if engine.is_live(*link) {
            component_warn!("client", "Sender for {} still referenced after close", address);
            report.leaked += 1;
        }
    }
    report.frames = wire.frames;
    component_info!(
        "client",
        "Done: {} attached, {} failed, {} frames exchanged",
        report.attached.len(),
        report.failed.len(),
        report.frames
    );
    Ok(report)
}

/// Create, reference and open one sender per address
fn open_senders(engine: &mut Engine, connection: Connection, addresses: &[String]) -> Result<Vec<(String, Link)>> {
    connection.open(engine)?;
    let mut senders = Vec::with_capacity(addresses.len());
    for address in addresses {
        let sender = connection.create_sender(engine, address, None)?;
        engine.acquire(Some(sender))?;
        sender.open(engine)?;
        component_debug!("client", "Opening sender {} for {}", sender.name(engine)?, address);
        senders.push((address.clone(), sender));
    }
    Ok(senders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proton_engine::{EventContext, EventType};

    fn quick(addresses: &[&str]) -> SendConfig {
        SendConfig {
            addresses: addresses.iter().map(|a| a.to_string()).collect(),
            round_interval: "1ms".to_string(),
            ..SendConfig::default()
        }
    }

    #[tokio::test]
    async fn test_run_attaches_every_sender() {
        let report = run(&quick(&["a", "b", "c"])).await.unwrap();
        assert_eq!(report.attached, vec!["a", "b", "c"]);
        assert!(report.failed.is_empty());
        assert_eq!(report.leaked, 0);
        assert!(report.frames > 0);
    }

    #[tokio::test]
    async fn test_run_with_idle_timeout() {
        let config = SendConfig {
            idle_timeout: Some("5s".to_string()),
            ..quick(&["q"])
        };
        let report = run(&config).await.unwrap();
        assert_eq!(report.attached, vec!["q"]);
    }

    #[tokio::test]
    async fn test_too_few_rounds_reports_failure() {
        let config = SendConfig {
            max_rounds: 1,
            ..quick(&["slow"])
        };
        let report = run(&config).await.unwrap();
        assert_eq!(report.failed, vec!["slow"]);
        assert!(report.attached.is_empty());
    }

    #[test]
    fn test_client_handler_has_no_side_effects() {
        let mut engine = Engine::new("c");
        let connection = engine.create_connection("h");
        let event = Event::new(EventType::ConnectionInit, EventContext::Connection(connection));
        ClientHandler.on_unhandled(&mut engine, &event);
        assert_eq!(connection.state(&engine).unwrap(), EndpointState::LOCAL_UNINIT | EndpointState::REMOTE_UNINIT);
    }
}
