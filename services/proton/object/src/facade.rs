//! Zero-overhead typed handles over object ids.

use crate::ObjectId;
use std::fmt;
use std::hash::Hash;

/// Typed view of one object in the store.
///
/// Implementors are `#[repr(transparent)]` newtypes over [`ObjectId`]
/// declared with [`facade!`](crate::facade!). Holding or dropping a facade
/// never changes the object's reference count.
pub trait Facade: Copy + Eq + Hash + fmt::Debug {
    /// Short name of the object kind, used in error messages
    const KIND: &'static str;

    /// View an id as this facade
    fn from_id(id: ObjectId) -> Self;

    /// Identity of the underlying object
    fn id(self) -> ObjectId;
}

/// Wrap an id in a facade. Wrapping the same id twice yields equal handles.
pub fn wrap<F: Facade>(id: ObjectId) -> F {
    F::from_id(id)
}

/// Declare a facade type over [`ObjectId`].
///
/// Generates the newtype, its [`Facade`] impl, and a compile-time assertion
/// that the facade adds no storage to the id it wraps.
#[macro_export]
macro_rules! facade {
    ($(#[$meta:meta])* $vis:vis struct $name:ident => $kind:literal;) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis struct $name($crate::ObjectId);

        impl $crate::Facade for $name {
            const KIND: &'static str = $kind;

            fn from_id(id: $crate::ObjectId) -> Self {
                Self(id)
            }

            fn id(self) -> $crate::ObjectId {
                self.0
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}({})", $kind, self.0)
            }
        }

        const _: () = assert!(
            ::std::mem::size_of::<$name>() == ::std::mem::size_of::<$crate::ObjectId>(),
            concat!("facade ", stringify!($name), " not empty")
        );
    };
}
