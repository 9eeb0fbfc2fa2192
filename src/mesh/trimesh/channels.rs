// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use super::*;

/// The key of a channel is the handle type the channel attaches data to.
pub trait ChannelKey:
    Default + Debug + Clone + Copy + Ord + std::hash::Hash + Sized + 'static
{
    fn name() -> &'static str;
}

macro_rules! impl_channel_key {
    ($t:ident) => {
        impl ChannelKey for $t {
            fn name() -> &'static str {
                stringify!($t)
            }
        }
    };
}
impl_channel_key!(VertexId);
impl_channel_key!(EdgeId);
impl_channel_key!(FaceId);

/// A sparse attribute side-table, keyed by element handle. Elements are not
/// required to have an entry in every channel, and a channel may briefly hold
/// entries for handles that no longer exist in the owning table. Those stale
/// entries are dropped by the cleanup passes in
/// [`edit_ops`](crate::mesh::trimesh::edit_ops).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel<K: ChannelKey, V> {
    values: BTreeMap<K, V>,
}

impl<K: ChannelKey, V> Default for Channel<K, V> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }
}

impl<K: ChannelKey, V> Channel<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.values.insert(key, value)
    }

    pub fn get(&self, key: K) -> Option<&V> {
        self.values.get(&key)
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.values.get_mut(&key)
    }

    pub fn remove(&mut self, key: K) -> Option<V> {
        self.values.remove(&key)
    }

    pub fn contains(&self, key: K) -> bool {
        self.values.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    pub fn retain(&mut self, mut keep: impl FnMut(K, &V) -> bool) {
        self.values.retain(|k, v| keep(*k, v));
    }
}

impl<K: ChannelKey, V: Clone> Channel<K, V> {
    /// Returns a copy of this channel with every key rewritten through `f`.
    /// Used when a store's handle space is renumbered or offset.
    pub fn map_keys(&self, mut f: impl FnMut(K) -> K) -> Self {
        Self {
            values: self.values.iter().map(|(k, v)| (f(*k), v.clone())).collect(),
        }
    }

    /// Copies the entries of `other` into this channel. Colliding keys take
    /// the incoming value.
    pub fn extend_from(&mut self, other: &Self) {
        for (k, v) in other.iter() {
            self.values.insert(k, v.clone());
        }
    }
}

impl<K: ChannelKey, V> std::ops::Index<K> for Channel<K, V> {
    type Output = V;

    fn index(&self, key: K) -> &V {
        self.values.get(&key).unwrap_or_else(|| {
            panic!(
                "{} channel index error for {:?}. Has the value been deleted?",
                K::name(),
                key
            )
        })
    }
}

impl<K: ChannelKey, V> std::ops::IndexMut<K> for Channel<K, V> {
    fn index_mut(&mut self, key: K) -> &mut V {
        self.values.get_mut(&key).unwrap_or_else(|| {
            panic!(
                "{} channel index error for {:?}. Has the value been deleted?",
                K::name(),
                key
            )
        })
    }
}

/// All the attribute side-tables of a mesh store. Every channel is sparse and
/// keyed by the same handles as the main tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshChannels {
    /// Per-vertex normal.
    pub vertex_normals: Channel<VertexId, Vec3>,
    /// Per-vertex texture coordinates.
    pub vertex_uvs: Channel<VertexId, Vec2>,
    /// Per-vertex RGBA color.
    pub vertex_colors: Channel<VertexId, Vec4>,
    /// Per-edge RGBA color pair, one entry for each endpoint.
    pub edge_colors: Channel<EdgeId, [Vec4; 2]>,
}

impl MeshChannels {
    /// Drops every vertex-keyed entry for `v`.
    pub fn remove_vertex(&mut self, v: VertexId) {
        self.vertex_normals.remove(v);
        self.vertex_uvs.remove(v);
        self.vertex_colors.remove(v);
    }

    /// Drops every edge-keyed entry for `e`.
    pub fn remove_edge(&mut self, e: EdgeId) {
        self.edge_colors.remove(e);
    }
}
