//! Reference-counted object store and zero-overhead facade handles for the proton engine.
//!
//! Engine objects (connections, sessions, links, transports) live in an
//! [`ObjectStore`] and are addressed by generation-checked [`ObjectId`]s.
//! Every object carries an intrusive reference count plus an engine hold;
//! it is reclaimed once both are gone. Reusing an id after its object was
//! reclaimed is reported as [`ObjectError::Reclaimed`] instead of reading
//! whatever now occupies the slot.
//!
//! Typed handles over an id are declared with the [`facade!`] macro. A
//! facade is a `#[repr(transparent)]` newtype with no fields of its own, so
//! converting between an id and a facade is free and two facades over the
//! same object always compare equal.
//!
//! ## Example
//!
//! ```rust
//! use proton_object::{facade, wrap, Facade, ObjectStore};
//!
//! facade! {
//!     /// Handle to a widget
//!     pub struct Widget => "widget";
//! }
//!
//! let mut store = ObjectStore::new();
//! let id = store.insert("spinner");
//! let a: Widget = wrap(id);
//! let b: Widget = wrap(id);
//! assert_eq!(a, b);
//!
//! store.acquire(Some(a.id())).unwrap();
//! assert_eq!(store.refcount(id).unwrap(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod facade;
pub mod id;
pub mod store;

// Re-export main types
pub use error::ObjectError;
pub use facade::{wrap, Facade};
pub use id::ObjectId;
pub use store::ObjectStore;
