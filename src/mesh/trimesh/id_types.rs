// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

/// Handles are plain monotonic integers, unique within their own class. A
/// handle is never reused after its element is deleted, so tables become
/// sparse over time. Handles from different classes live in independent
/// numbering spaces and must not be mixed.
macro_rules! new_id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
            Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Builds a handle from a raw integer. Meant for codecs and
            /// generators that bring their own numbering; within the engine
            /// handles are only minted by the store's counters.
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> u32 {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

new_id_type! {
    /// Identifies a vertex in the vertex table.
    VertexId
}
new_id_type! {
    /// Identifies an edge in the edge table.
    EdgeId
}
new_id_type! {
    /// Identifies a triangular face in the face table.
    FaceId
}
