//! Opaque ID newtypes for architecture entities.
//!
//! Each ID is a thin `u32` wrapper that is `Copy`, `Hash`, `Ord`, and
//! `Serialize`/`Deserialize`. IDs are created by
//! [`Arena::alloc`](crate::arena::Arena::alloc) and used for O(1) lookup.
//! Instances refer to primitives and blocks through these handles, so the
//! object graph has no pointers and serializes as plain data.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a primitive in the [`PrimitiveLibrary`](crate::PrimitiveLibrary).
    PrimitiveId
);

define_id!(
    /// Opaque, copyable ID for an IO or logic block.
    BlockId
);

define_id!(
    /// Opaque, copyable ID for a tile.
    TileId
);

define_id!(
    /// Opaque, copyable ID for a global signal.
    GlobalId
);

define_id!(
    /// Opaque, copyable ID for a routing segment family.
    SegmentId
);

define_id!(
    /// Opaque, copyable ID for a direct inter-block tunnel.
    TunnelId
);

define_id!(
    /// Opaque, copyable ID for a port within its block.
    PortId
);

define_id!(
    /// Opaque, copyable ID for an instance within its parent block.
    InstanceId
);

define_id!(
    /// Opaque, copyable ID for a routing switch definition.
    SwitchId
);
