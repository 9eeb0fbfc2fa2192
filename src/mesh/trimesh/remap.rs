// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::debug;

use crate::prelude::*;

/// Per-class old-to-new handle maps, built by walking each table in its
/// iteration order and handing out consecutive handles from a base.
///
/// Handles that were dangling in the source (an edge endpoint or group face
/// that names no live element) have no entry; looking them up passes the old
/// handle through unchanged, so a dangling reference stays dangling instead
/// of silently capturing a live element's new handle.
#[derive(Debug, Clone, Default)]
pub struct MeshMapping {
    vertices: HashMap<VertexId, VertexId>,
    edges: HashMap<EdgeId, EdgeId>,
    faces: HashMap<FaceId, FaceId>,
}

impl MeshMapping {
    /// Builds the mapping that assigns contiguous handles starting at
    /// `base`, one counter per class.
    pub fn dense(mesh: &TriMesh, base: IdCounters) -> Self {
        MeshMapping {
            vertices: mesh
                .iter_vertices()
                .enumerate()
                .map(|(i, (id, _))| (id, VertexId::from_raw(base.vertex + i as u32)))
                .collect(),
            edges: mesh
                .iter_edges()
                .enumerate()
                .map(|(i, (id, _))| (id, EdgeId::from_raw(base.edge + i as u32)))
                .collect(),
            faces: mesh
                .iter_faces()
                .enumerate()
                .map(|(i, (id, _))| (id, FaceId::from_raw(base.face + i as u32)))
                .collect(),
        }
    }

    /// Builds a mapping that renumbers only the vertex class to a dense
    /// 0-based range, leaving edge and face handles untouched. Used by the
    /// remapped group extraction mode, where consumers need contiguous
    /// vertex indices but keep the other handle spaces as-is.
    pub fn dense_vertices(mesh: &TriMesh) -> Self {
        MeshMapping {
            vertices: mesh
                .iter_vertices()
                .enumerate()
                .map(|(i, (id, _))| (id, VertexId::from_raw(i as u32)))
                .collect(),
            edges: HashMap::new(),
            faces: HashMap::new(),
        }
    }

    pub fn vertex(&self, v: VertexId) -> VertexId {
        self.vertices.get(&v).copied().unwrap_or(v)
    }

    pub fn edge(&self, e: EdgeId) -> EdgeId {
        self.edges.get(&e).copied().unwrap_or(e)
    }

    pub fn face(&self, f: FaceId) -> FaceId {
        self.faces.get(&f).copied().unwrap_or(f)
    }
}

/// Produces a copy of `mesh` with every handle rewritten through `mapping`:
/// table keys, edge endpoints, face vertices, channel keys and group face
/// lists. Counters are resynchronized on the result.
pub(crate) fn apply_mapping(mesh: &TriMesh, mapping: &MeshMapping) -> TriMesh {
    let mut result = TriMesh::new();

    for (id, vertex) in mesh.iter_vertices() {
        result.insert_vertex_raw(mapping.vertex(id), *vertex);
    }
    for (id, edge) in mesh.iter_edges() {
        result.insert_edge_raw(
            mapping.edge(id),
            Edge {
                start: mapping.vertex(edge.start),
                end: mapping.vertex(edge.end),
            },
        );
    }
    for (id, face) in mesh.iter_faces() {
        result.insert_face_raw(
            mapping.face(id),
            Face {
                vertices: face.vertices.map(|v| mapping.vertex(v)),
            },
        );
    }

    result.channels.vertex_normals = mesh.channels.vertex_normals.map_keys(|v| mapping.vertex(v));
    result.channels.vertex_uvs = mesh.channels.vertex_uvs.map_keys(|v| mapping.vertex(v));
    result.channels.vertex_colors = mesh.channels.vertex_colors.map_keys(|v| mapping.vertex(v));
    result.channels.edge_colors = mesh.channels.edge_colors.map_keys(|e| mapping.edge(e));

    for material in mesh.iter_materials() {
        result.insert_material(material.clone());
    }
    for (name, group) in mesh.iter_groups() {
        result.insert_group(
            name.to_owned(),
            FaceGroup {
                material: group.material.clone(),
                faces: group.faces.iter_cpy().map(|f| mapping.face(f)).collect(),
            },
        );
    }

    result.sync_counters();
    result
}

/// Collapses the sparse handle spaces of `mesh` into contiguous ranges
/// starting at 0, one per class, preserving table iteration order. The
/// result's counters are one past the new maximum handles. Dangling
/// references are not validated and propagate into the result.
#[profiling::function]
pub fn renumber(mesh: &TriMesh) -> TriMesh {
    apply_mapping(mesh, &MeshMapping::dense(mesh, IdCounters::default()))
}

/// Same mapping process as [`renumber`], but new handles start at the
/// caller-supplied `base` counters. Used to shift a store's handle space
/// clear of another store's before a combine.
#[profiling::function]
pub fn offset(mesh: &TriMesh, base: IdCounters) -> TriMesh {
    apply_mapping(mesh, &MeshMapping::dense(mesh, base))
}

/// Unions two stores into a new one with disjoint handle spaces: `a` is
/// renumbered, `b` is renumbered and then offset past `a`'s counters, and
/// every table of the shifted `b` is copied in. Neither input is mutated.
///
/// Materials keep the first-inserted definition on a name collision, like
/// [`TriMesh::add_material`]. Colliding group names have their face lists
/// concatenated (`a` first); `a`'s material association wins when non-empty.
#[profiling::function]
pub fn combine(a: &TriMesh, b: &TriMesh) -> TriMesh {
    let mut result = renumber(a);
    let b = offset(&renumber(b), result.counters());

    for (id, vertex) in b.iter_vertices() {
        result.insert_vertex_raw(id, *vertex);
    }
    for (id, edge) in b.iter_edges() {
        result.insert_edge_raw(id, *edge);
    }
    for (id, face) in b.iter_faces() {
        result.insert_face_raw(id, *face);
    }

    result
        .channels
        .vertex_normals
        .extend_from(&b.channels.vertex_normals);
    result.channels.vertex_uvs.extend_from(&b.channels.vertex_uvs);
    result
        .channels
        .vertex_colors
        .extend_from(&b.channels.vertex_colors);
    result.channels.edge_colors.extend_from(&b.channels.edge_colors);

    for material in b.iter_materials() {
        result.add_material(material.clone());
    }
    for (name, group) in b.iter_groups() {
        for f in group.faces.iter_cpy() {
            result.add_face_to_group(name, f);
        }
        if !group.material.is_empty() {
            let unset = result
                .group(name)
                .map_or(true, |existing| existing.material.is_empty());
            if unset {
                result.set_group_material(name, &group.material);
            }
        }
    }

    result.sync_counters();
    debug!(
        "combine: {} + {} vertices -> {}",
        a.num_vertices(),
        b.num_vertices(),
        result.num_vertices()
    );
    result
}
