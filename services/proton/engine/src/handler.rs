//! Event handler capability.

use crate::engine::Engine;
use crate::event::{Event, EventType};
use std::fmt;

/// Callbacks for engine events.
///
/// Every method defaults to [`on_unhandled`](Handler::on_unhandled). The
/// engine only stores handlers; they are invoked by the driving loop (see
/// [`Container::process`](crate::Container::process)) with mutable access to
/// the engine so they can react, e.g. open a session the peer began.
pub trait Handler: Send + Sync + fmt::Debug {
    /// Connection created
    fn on_connection_init(&self, engine: &mut Engine, event: &Event) {
        self.on_unhandled(engine, event)
    }
    /// Transport bound
    fn on_connection_bound(&self, engine: &mut Engine, event: &Event) {
        self.on_unhandled(engine, event)
    }
    /// Transport unbound
    fn on_connection_unbound(&self, engine: &mut Engine, event: &Event) {
        self.on_unhandled(engine, event)
    }
    /// Connection opened locally
    fn on_connection_local_open(&self, engine: &mut Engine, event: &Event) {
        self.on_unhandled(engine, event)
    }
    /// Peer opened the connection
    fn on_connection_remote_open(&self, engine: &mut Engine, event: &Event) {
        self.on_unhandled(engine, event)
    }
    /// Connection closed locally
    fn on_connection_local_close(&self, engine: &mut Engine, event: &Event) {
        self.on_unhandled(engine, event)
    }
    /// Peer closed the connection
    fn on_connection_remote_close(&self, engine: &mut Engine, event: &Event) {
        self.on_unhandled(engine, event)
    }
    /// Connection reclaimed
    fn on_connection_final(&self, engine: &mut Engine, event: &Event) {
        self.on_unhandled(engine, event)
    }
    /// Session created
    fn on_session_init(&self, engine: &mut Engine, event: &Event) {
        self.on_unhandled(engine, event)
    }
    /// Session opened locally
    fn on_session_local_open(&self, engine: &mut Engine, event: &Event) {
        self.on_unhandled(engine, event)
    }
    /// Peer began the session
    fn on_session_remote_open(&self, engine: &mut Engine, event: &Event) {
        self.on_unhandled(engine, event)
    }
    /// Session closed locally
    fn on_session_local_close(&self, engine: &mut Engine, event: &Event) {
        self.on_unhandled(engine, event)
    }
    /// Peer ended the session
    fn on_session_remote_close(&self, engine: &mut Engine, event: &Event) {
        self.on_unhandled(engine, event)
    }
    /// Session reclaimed
    fn on_session_final(&self, engine: &mut Engine, event: &Event) {
        self.on_unhandled(engine, event)
    }
    /// Link created
    fn on_link_init(&self, engine: &mut Engine, event: &Event) {
        self.on_unhandled(engine, event)
    }
    /// Link opened locally
    fn on_link_local_open(&self, engine: &mut Engine, event: &Event) {
        self.on_unhandled(engine, event)
    }
    /// Peer attached the link
    fn on_link_remote_open(&self, engine: &mut Engine, event: &Event) {
        self.on_unhandled(engine, event)
    }
    /// Link closed locally
    fn on_link_local_close(&self, engine: &mut Engine, event: &Event) {
        self.on_unhandled(engine, event)
    }
    /// Peer detached the link
    fn on_link_remote_close(&self, engine: &mut Engine, event: &Event) {
        self.on_unhandled(engine, event)
    }
    /// Link reclaimed
    fn on_link_final(&self, engine: &mut Engine, event: &Event) {
        self.on_unhandled(engine, event)
    }
    /// Transport rejected an inbound frame
    fn on_transport_error(&self, engine: &mut Engine, event: &Event) {
        self.on_unhandled(engine, event)
    }
    /// Transport closed in both directions
    fn on_transport_closed(&self, engine: &mut Engine, event: &Event) {
        self.on_unhandled(engine, event)
    }

    /// Fallback for events without a dedicated override
    fn on_unhandled(&self, _engine: &mut Engine, _event: &Event) {}
}

/// Invoke the handler method matching the event kind
pub fn dispatch(handler: &dyn Handler, engine: &mut Engine, event: &Event) {
    match event.kind {
        EventType::ConnectionInit => handler.on_connection_init(engine, event),
        EventType::ConnectionBound => handler.on_connection_bound(engine, event),
        EventType::ConnectionUnbound => handler.on_connection_unbound(engine, event),
        EventType::ConnectionLocalOpen => handler.on_connection_local_open(engine, event),
        EventType::ConnectionRemoteOpen => handler.on_connection_remote_open(engine, event),
        EventType::ConnectionLocalClose => handler.on_connection_local_close(engine, event),
        EventType::ConnectionRemoteClose => handler.on_connection_remote_close(engine, event),
        EventType::ConnectionFinal => handler.on_connection_final(engine, event),
        EventType::SessionInit => handler.on_session_init(engine, event),
        EventType::SessionLocalOpen => handler.on_session_local_open(engine, event),
        EventType::SessionRemoteOpen => handler.on_session_remote_open(engine, event),
        EventType::SessionLocalClose => handler.on_session_local_close(engine, event),
        EventType::SessionRemoteClose => handler.on_session_remote_close(engine, event),
        EventType::SessionFinal => handler.on_session_final(engine, event),
        EventType::LinkInit => handler.on_link_init(engine, event),
        EventType::LinkLocalOpen => handler.on_link_local_open(engine, event),
        EventType::LinkRemoteOpen => handler.on_link_remote_open(engine, event),
        EventType::LinkLocalClose => handler.on_link_local_close(engine, event),
        EventType::LinkRemoteClose => handler.on_link_remote_close(engine, event),
        EventType::LinkFinal => handler.on_link_final(engine, event),
        EventType::TransportError => handler.on_transport_error(engine, event),
        EventType::TransportClosed => handler.on_transport_closed(engine, event),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventContext;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Opener {
        unhandled: Mutex<Vec<EventType>>,
    }

    impl Handler for Opener {
        fn on_connection_init(&self, engine: &mut Engine, event: &Event) {
            if let Some(connection) = event.connection(engine) {
                connection.open(engine).unwrap();
            }
        }

        fn on_unhandled(&self, _engine: &mut Engine, event: &Event) {
            self.unhandled.lock().unwrap().push(event.kind);
        }
    }

    #[test]
    fn test_dispatch_routes_by_kind() {
        let mut engine = Engine::new("c");
        let connection = engine.create_connection("h");
        let handler = Opener::default();

        let init = engine.collector_mut().pop().unwrap();
        dispatch(&handler, &mut engine, &init);
        assert!(connection.state(&engine).unwrap().contains(crate::EndpointState::LOCAL_ACTIVE));

        let open = engine.collector_mut().pop().unwrap();
        assert_eq!(open.kind, EventType::ConnectionLocalOpen);
        dispatch(&handler, &mut engine, &open);
        let final_event = Event::new(EventType::ConnectionFinal, EventContext::Connection(connection));
        dispatch(&handler, &mut engine, &final_event);

        assert_eq!(
            *handler.unhandled.lock().unwrap(),
            vec![EventType::ConnectionLocalOpen, EventType::ConnectionFinal]
        );
    }
}
