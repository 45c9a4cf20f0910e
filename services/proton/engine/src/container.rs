//! Container: owns an engine and dispatches its events to handlers.

use crate::config::{ContainerConfig, TransportConfig};
use crate::connection::Connection;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::event::Event;
use crate::handler::{dispatch, Handler};
use std::sync::Arc;
use tracing::{debug, info};

/// A named AMQP container
#[derive(Debug)]
pub struct Container {
    engine: Engine,
    handler: Option<Arc<dyn Handler>>,
}

impl Container {
    /// Create a container; a random UUID is used when no id is configured
    pub fn new(config: ContainerConfig) -> Self {
        let id = config
            .id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        info!(container = %id, "container created");
        Self {
            engine: Engine::new(id),
            handler: None,
        }
    }

    /// Container id
    pub fn id(&self) -> &str {
        self.engine.container_id()
    }

    /// The engine
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The engine, for creating and driving endpoints
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Handler for events no link or connection handler claims
    pub fn set_handler(&mut self, handler: Arc<dyn Handler>) {
        self.handler = Some(handler);
    }

    /// Create a connection to `hostname` bound to a fresh transport
    pub fn connect(&mut self, hostname: &str, config: TransportConfig) -> Result<Connection, EngineError> {
        let connection = self.engine.create_connection(hostname);
        let transport = self.engine.create_transport(config);
        transport.bind(&mut self.engine, connection)?;
        debug!(container = %self.id(), hostname, "connecting");
        Ok(connection)
    }

    /// Create a connection for an inbound peer bound to a fresh transport.
    /// The peer's hostname is available once its open frame arrives.
    pub fn accept(&mut self, config: TransportConfig) -> Result<Connection, EngineError> {
        let connection = self.engine.create_connection("");
        let transport = self.engine.create_transport(config);
        transport.bind(&mut self.engine, connection)?;
        debug!(container = %self.id(), "accepting");
        Ok(connection)
    }

    /// Drain pending events and dispatch each to the link's handler, else
    /// the connection's handler, else the container's. Events queued by
    /// handlers are dispatched in the same call. Returns the number of
    /// events drained.
    pub fn process(&mut self) -> usize {
        let mut count = 0;
        while let Some(event) = self.engine.collector_mut().pop() {
            if let Some(handler) = self.handler_for(&event) {
                dispatch(handler.as_ref(), &mut self.engine, &event);
            }
            count += 1;
        }
        count
    }

    fn handler_for(&self, event: &Event) -> Option<Arc<dyn Handler>> {
        let engine = &self.engine;
        event
            .link()
            .and_then(|link| link.handler(engine).ok().flatten())
            .or_else(|| {
                event
                    .connection(engine)
                    .and_then(|connection| connection.handler(engine).ok().flatten())
            })
            .or_else(|| self.handler.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventType;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Recorder {
        label: &'static str,
        seen: Arc<Mutex<Vec<(&'static str, EventType)>>>,
    }

    impl Handler for Recorder {
        fn on_unhandled(&self, _engine: &mut Engine, event: &Event) {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push((self.label, event.kind));
            }
        }
    }

    #[test]
    fn test_generated_id() {
        let a = Container::new(ContainerConfig::default());
        let b = Container::new(ContainerConfig::default());
        assert_ne!(a.id(), b.id());
        assert!(uuid::Uuid::parse_str(a.id()).is_ok());

        let named = Container::new(ContainerConfig {
            id: Some("broker".to_string()),
        });
        assert_eq!(named.id(), "broker");
    }

    #[test]
    fn test_connect_binds_transport() {
        let mut container = Container::new(ContainerConfig::default());
        let connection = container.connect("example.com", TransportConfig::default()).unwrap();
        let engine = container.engine();
        let transport = connection.transport(engine).unwrap().unwrap();
        assert_eq!(transport.connection(engine).unwrap(), Some(connection));
        assert_eq!(connection.container(engine).unwrap(), container.id());
    }

    #[test]
    fn test_dispatch_prefers_link_then_connection_then_container() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = |label| -> Arc<dyn Handler> {
            Arc::new(Recorder {
                label,
                seen: seen.clone(),
            })
        };

        let mut container = Container::new(ContainerConfig::default());
        container.set_handler(recorder("container"));
        let connection = container.connect("example.com", TransportConfig::default()).unwrap();
        assert_eq!(container.process(), 2);

        let engine = container.engine_mut();
        connection.set_handler(engine, Some(recorder("connection"))).unwrap();
        let session = connection.create_session(engine).unwrap();
        let link = session.create_sender(engine, "q", Some(recorder("link"))).unwrap();
        link.open(engine).unwrap();

        assert_eq!(container.process(), 3);
        let seen = seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                ("container", EventType::ConnectionInit),
                ("container", EventType::ConnectionBound),
                ("connection", EventType::SessionInit),
                ("link", EventType::LinkInit),
                ("link", EventType::LinkLocalOpen),
            ]
        );
    }

    #[test]
    fn test_process_without_handlers_drains() {
        let mut container = Container::new(ContainerConfig::default());
        let connection = container.connect("example.com", TransportConfig::default()).unwrap();
        connection.open(container.engine_mut()).unwrap();
        assert_eq!(container.process(), 3);
        assert!(container.engine().collector().is_empty());
        assert_eq!(container.process(), 0);
    }
}
