//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every long-lived entity in the simulation has a strongly-typed ID to
//! prevent accidental mixing of identifiers at compile time. IDs are built
//! from caller-supplied random bytes so a seeded simulation produces the
//! same IDs on every run.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::{Builder, Uuid};

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier from 16 random bytes (UUID v4 layout).
            ///
            /// Pass bytes drawn from the simulation RNG to keep runs
            /// reproducible.
            pub const fn from_random_bytes(bytes: [u8; 16]) -> Self {
                Self(Builder::from_random_bytes(bytes).into_uuid())
            }

            /// Create a new identifier from the operating system RNG.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Stable unique identifier for an agent, valid across its whole life.
    ///
    /// Unlike an [`AgentHandle`](crate::AgentHandle), the ID is never reused
    /// when the agent's pool slot is recycled. Banks key loans and accounts
    /// by this ID.
    AgentId
}

define_id! {
    /// Unique identifier for a town.
    TownId
}

define_id! {
    /// Unique identifier for a building.
    BuildingId
}
