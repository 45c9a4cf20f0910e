//! AMQP endpoint engine.
//!
//! Connections, sessions and links are reference-counted objects owned by an
//! [`Engine`] and addressed through zero-overhead handles. Each endpoint has
//! an independent local and remote state; local changes are requested with
//! `open`/`close` and become performatives on the bound [`Transport`], while
//! remote changes are applied only from inbound frames. Every state change is
//! queued as an [`Event`] for a [`Handler`].
//!
//! # Example
//!
//! ```
//! use proton_engine::{Container, ContainerConfig, EndpointState, TransportConfig};
//!
//! let mut container = Container::new(ContainerConfig::default());
//! let connection = container.connect("broker.example", TransportConfig::default())?;
//! let engine = container.engine_mut();
//!
//! connection.open(engine)?;
//! let sender = connection.create_sender(engine, "orders", None)?;
//! sender.open(engine)?;
//!
//! assert_eq!(connection.link_head(engine, EndpointState::LOCAL_ACTIVE)?, Some(sender));
//!
//! let transport = connection.transport(engine)?.expect("bound");
//! let frames = transport.take_output(engine)?;
//! assert_eq!(frames.len(), 3);
//! # Ok::<(), proton_engine::EngineError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod condition;
pub mod config;
pub mod connection;
pub mod container;
pub mod endpoint;
pub mod engine;
pub mod error;
pub mod event;
pub mod frame;
pub mod handler;
pub mod link;
pub mod session;
pub mod state;
pub mod terminus;
pub mod transport;

pub use condition::Condition;
pub use config::{ContainerConfig, TransportConfig};
pub use connection::Connection;
pub use container::Container;
pub use endpoint::{Endpoint, EndpointCore, Transition};
pub use engine::Engine;
pub use error::{EngineError, StateError, TransportError};
pub use event::{Collector, Event, EventContext, EventType};
pub use frame::{Frame, Performative};
pub use handler::{dispatch, Handler};
pub use link::Link;
pub use session::Session;
pub use state::{EndpointState, Lifecycle};
pub use terminus::{Role, Terminus};
pub use transport::Transport;

pub use proton_object::{Facade, ObjectError, ObjectId};
