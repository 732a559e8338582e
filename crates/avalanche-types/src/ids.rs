//! Type-safe identifier wrappers around unsigned integers.
//!
//! Node ids and cluster ids are both plain integers on the wire, but they
//! index completely different things. Wrapping them keeps a node id from
//! being passed where a cluster id is expected.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around an unsigned integer with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident($inner:ty)
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl $name {
            /// Create an identifier from its raw value.
            pub const fn new(raw: $inner) -> Self {
                Self(raw)
            }

            /// Return the raw integer value.
            pub const fn into_inner(self) -> $inner {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(raw: $inner) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for $inner {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// One-based index of a neuron on the square grid.
    ///
    /// Valid ids run from `1` to `side * side`; the grid decides whether a
    /// particular id is in range.
    NodeId(u32)
}

define_id! {
    /// Creation sequence number of a cluster.
    ///
    /// Ids are handed out in increasing order, so ordering by id is
    /// ordering by creation time.
    ClusterId(u64)
}

impl ClusterId {
    /// The id following this one, or `None` on overflow.
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }
}
