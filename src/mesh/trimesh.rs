// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Newtype handles used as indices into the mesh tables
pub mod id_types;
pub use id_types::*;

/// Sparse attribute side-tables (normals, uvs, colors)
pub mod channels;
pub use channels::*;

/// Cleanup passes restoring the store's invariants after arbitrary mutation
pub mod edit_ops;

/// Renumbering, handle-space offsetting and two-store combination
pub mod remap;

/// Face and vertex normal derivation
pub mod normals;

/// Axis-aligned bounding box computation
pub mod bounds;

/// Named face groups and group extraction
pub mod groups;
pub use groups::FaceGroup;

/// A vertex is just a position. All other per-vertex data lives in the
/// sparse channels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Vec3,
}

/// An edge between two vertices. Stored by value and replaced wholesale on
/// write. The endpoints are not guaranteed to exist in the vertex table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub start: VertexId,
    pub end: VertexId,
}

impl Edge {
    /// The endpoint pair with the smaller handle first. Two edges describe
    /// the same segment iff their unordered pairs match.
    pub fn unordered_pair(&self) -> (VertexId, VertexId) {
        if self.start <= self.end {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        }
    }
}

/// A triangular face. Vertices are listed clockwise as seen from the outward
/// side of the surface. The referenced handles are not guaranteed to exist in
/// the vertex table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Face {
    pub vertices: [VertexId; 3],
}

impl Face {
    pub fn contains(&self, v: VertexId) -> bool {
        self.vertices.contains(&v)
    }

    /// The vertex triple in ascending handle order. Two faces describe the
    /// same triangle, in any winding, iff their unordered triples match.
    pub fn unordered_triple(&self) -> [VertexId; 3] {
        let mut triple = self.vertices;
        triple.sort_unstable();
        triple
    }
}

/// A PBR-style material. Materials are identified by name, not by handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub base_color: Vec4,
    pub metallic: f32,
    pub roughness: f32,
}

/// The next fresh handle for each element class. A counter is always strictly
/// greater than the largest handle present in its table; after bulk
/// mutations that bypass the `add_*` calls, [`TriMesh::sync_counters`] must
/// be used to restore that invariant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdCounters {
    pub vertex: u32,
    pub edge: u32,
    pub face: u32,
}

/// An indexed triangle mesh: vertex, edge and face tables addressed by
/// monotonic integer handles, material and named-group tables addressed by
/// name, and sparse attribute channels keyed by the same handles.
///
/// The store is deliberately permissive on creation: `add_edge` and
/// `add_face` accept endpoints that do not (yet) exist, and group face lists
/// are weak references that may name deleted faces. The passes in
/// [`edit_ops`] restore full consistency on demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriMesh {
    vertices: BTreeMap<VertexId, Vertex>,
    edges: BTreeMap<EdgeId, Edge>,
    faces: BTreeMap<FaceId, Face>,
    materials: BTreeMap<String, Material>,
    groups: BTreeMap<String, FaceGroup>,
    pub channels: MeshChannels,
    counters: IdCounters,
}

impl TriMesh {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Vertices ---

    /// Adds a vertex at `position` and returns its freshly minted handle.
    /// Never fails and never reuses a handle.
    pub fn add_vertex(&mut self, position: Vec3) -> VertexId {
        let id = VertexId::from_raw(self.counters.vertex);
        self.counters.vertex += 1;
        self.vertices.insert(id, Vertex { position });
        id
    }

    /// Same as [`add_vertex`](Self::add_vertex), but also fills the optional
    /// attribute channels in one call.
    pub fn add_vertex_with(
        &mut self,
        position: Vec3,
        normal: Option<Vec3>,
        color: Option<Vec4>,
        uv: Option<Vec2>,
    ) -> VertexId {
        let id = self.add_vertex(position);
        if let Some(normal) = normal {
            self.channels.vertex_normals.insert(id, normal);
        }
        if let Some(color) = color {
            self.channels.vertex_colors.insert(id, color);
        }
        if let Some(uv) = uv {
            self.channels.vertex_uvs.insert(id, uv);
        }
        id
    }

    /// Removes a vertex and its channel entries. Removing a vertex that does
    /// not exist is a silent no-op. Edges and faces referencing the vertex
    /// are left dangling until a cleanup pass runs.
    pub fn remove_vertex(&mut self, v: VertexId) {
        self.vertices.remove(&v);
        self.channels.remove_vertex(v);
    }

    // --- Attribute setters ---
    //
    // Unlike the `add_*` calls, setting an attribute on a specific handle is
    // strict: the target element must exist.

    pub fn set_vertex_normal(&mut self, v: VertexId, normal: Vec3) -> Result<()> {
        if !self.vertices.contains_key(&v) {
            bail!("Cannot set normal: no vertex {v} in this mesh");
        }
        self.channels.vertex_normals.insert(v, normal);
        Ok(())
    }

    pub fn set_vertex_uv(&mut self, v: VertexId, uv: Vec2) -> Result<()> {
        if !self.vertices.contains_key(&v) {
            bail!("Cannot set uv: no vertex {v} in this mesh");
        }
        self.channels.vertex_uvs.insert(v, uv);
        Ok(())
    }

    pub fn set_vertex_color(&mut self, v: VertexId, color: Vec4) -> Result<()> {
        if !self.vertices.contains_key(&v) {
            bail!("Cannot set color: no vertex {v} in this mesh");
        }
        self.channels.vertex_colors.insert(v, color);
        Ok(())
    }

    pub fn set_edge_color(&mut self, e: EdgeId, start: Vec4, end: Vec4) -> Result<()> {
        if !self.edges.contains_key(&e) {
            bail!("Cannot set color: no edge {e} in this mesh");
        }
        self.channels.edge_colors.insert(e, [start, end]);
        Ok(())
    }

    // --- Edges ---

    /// Adds an edge between `start` and `end` and returns its handle. The
    /// endpoints are not checked for existence.
    pub fn add_edge(&mut self, start: VertexId, end: VertexId) -> EdgeId {
        let id = EdgeId::from_raw(self.counters.edge);
        self.counters.edge += 1;
        self.edges.insert(id, Edge { start, end });
        id
    }

    pub fn remove_edge(&mut self, e: EdgeId) {
        self.edges.remove(&e);
        self.channels.remove_edge(e);
    }

    // --- Faces ---

    /// Adds a triangle with vertices `a`, `b`, `c` listed clockwise from the
    /// outward side. The handles are not checked for existence.
    pub fn add_face(&mut self, a: VertexId, b: VertexId, c: VertexId) -> FaceId {
        let id = FaceId::from_raw(self.counters.face);
        self.counters.face += 1;
        self.faces.insert(id, Face { vertices: [a, b, c] });
        id
    }

    /// Removing a face leaves any group entries naming it in place; group
    /// face lists are weak references filtered at read time.
    pub fn remove_face(&mut self, f: FaceId) {
        self.faces.remove(&f);
    }

    // --- Materials ---

    /// Inserts a material, unless one with the same name already exists, in
    /// which case the existing one is kept and the call is a no-op.
    pub fn add_material(&mut self, material: Material) {
        self.materials
            .entry(material.name.clone())
            .or_insert(material);
    }

    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    pub fn iter_materials(&self) -> impl Iterator<Item = &Material> {
        self.materials.values()
    }

    pub fn num_materials(&self) -> usize {
        self.materials.len()
    }

    // --- Groups ---

    /// Appends a face handle to the named group, creating the group record
    /// on first use. The face is not checked for existence and may appear in
    /// any number of groups.
    pub fn add_face_to_group(&mut self, name: &str, face: FaceId) {
        self.groups
            .entry(name.to_owned())
            .or_default()
            .faces
            .push(face);
    }

    /// Associates a material name with the named group, creating the group
    /// record on first use.
    pub fn set_group_material(&mut self, name: &str, material: &str) {
        self.groups.entry(name.to_owned()).or_default().material = material.to_owned();
    }

    pub fn group(&self, name: &str) -> Option<&FaceGroup> {
        self.groups.get(name)
    }

    pub fn iter_groups(&self) -> impl Iterator<Item = (&str, &FaceGroup)> {
        self.groups.iter().map(|(name, g)| (name.as_str(), g))
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    pub(crate) fn insert_group(&mut self, name: String, group: FaceGroup) {
        self.groups.insert(name, group);
    }

    pub(crate) fn insert_material(&mut self, material: Material) {
        self.materials.insert(material.name.clone(), material);
    }

    // --- Raw access ---
    //
    // Renumbering and extraction build stores wholesale, bypassing the
    // counters. Callers are responsible for a final `sync_counters`.

    pub(crate) fn insert_vertex_raw(&mut self, id: VertexId, vertex: Vertex) {
        self.vertices.insert(id, vertex);
    }

    pub(crate) fn insert_edge_raw(&mut self, id: EdgeId, edge: Edge) {
        self.edges.insert(id, edge);
    }

    pub(crate) fn insert_face_raw(&mut self, id: FaceId, face: Face) {
        self.faces.insert(id, face);
    }

    pub(crate) fn set_counters(&mut self, counters: IdCounters) {
        self.counters = counters;
    }

    // --- Queries ---

    pub fn vertex(&self, v: VertexId) -> Option<&Vertex> {
        self.vertices.get(&v)
    }

    pub fn edge(&self, e: EdgeId) -> Option<&Edge> {
        self.edges.get(&e)
    }

    pub fn face(&self, f: FaceId) -> Option<&Face> {
        self.faces.get(&f)
    }

    pub fn vertex_exists(&self, v: VertexId) -> bool {
        self.vertices.contains_key(&v)
    }

    pub fn face_exists(&self, f: FaceId) -> bool {
        self.faces.contains_key(&f)
    }

    /// Iterates vertices in ascending handle order. This order is the "table
    /// iteration order" every first-encountered-wins rule refers to.
    pub fn iter_vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> {
        self.vertices.iter().map(|(id, v)| (*id, v))
    }

    pub fn iter_edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges.iter().map(|(id, e)| (*id, e))
    }

    pub fn iter_faces(&self) -> impl Iterator<Item = (FaceId, &Face)> {
        self.faces.iter().map(|(id, f)| (*id, f))
    }

    /// Returns the faces referencing `v`, in table iteration order.
    pub fn faces_of_vertex(&self, v: VertexId) -> SVec<FaceId> {
        self.iter_faces()
            .filter(|(_, face)| face.contains(v))
            .map(|(id, _)| id)
            .collect_svec()
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn counters(&self) -> IdCounters {
        self.counters
    }

    /// Resets each class counter to one past the largest handle present in
    /// its table. Must be called after any bulk mutation that inserts
    /// elements without going through the `add_*` calls.
    pub fn sync_counters(&mut self) {
        self.counters = IdCounters {
            vertex: self.vertices.keys().last().map_or(0, |id| id.raw() + 1),
            edge: self.edges.keys().last().map_or(0, |id| id.raw() + 1),
            face: self.faces.keys().last().map_or(0, |id| id.raw() + 1),
        };
    }

    /// Builds a mesh from a list of positions and a list of triangles
    /// containing indices into it.
    ///
    /// - Generic over Index: Use as much precision as you need / want.
    ///
    /// If unsure, you can pass `&[[u32; 3]]` as `triangles`. Same for `u8`,
    /// `u16` or `usize` indices.
    pub fn build_from_triangles<Index>(positions: &[Vec3], triangles: &[[Index; 3]]) -> Result<Self>
    where
        Index: num_traits::AsPrimitive<usize>,
    {
        let mut mesh = TriMesh::new();
        let vertex_ids = positions
            .iter_cpy()
            .map(|p| mesh.add_vertex(p))
            .collect::<Vec<_>>();

        for &[a, b, c] in triangles {
            let get = |i: usize| {
                vertex_ids
                    .get(i)
                    .copied()
                    .ok_or_else(|| anyhow!("Out-of-bounds index in the triangle array {}", i))
            };
            mesh.add_face(get(a.as_())?, get(b.as_())?, get(c.as_())?);
        }

        Ok(mesh)
    }
}

macro_rules! impl_index_traits {
    ($id_type:ty, $output_type:ty, $table:ident) => {
        impl std::ops::Index<$id_type> for TriMesh {
            type Output = $output_type;

            fn index(&self, index: $id_type) -> &Self::Output {
                self.$table.get(&index).unwrap_or_else(|| {
                    panic!(
                        "{} index error for {:?}. Has the value been deleted?",
                        stringify!($id_type),
                        index
                    )
                })
            }
        }

        impl std::ops::IndexMut<$id_type> for TriMesh {
            fn index_mut(&mut self, index: $id_type) -> &mut Self::Output {
                self.$table.get_mut(&index).unwrap_or_else(|| {
                    panic!(
                        "{} index error for {:?}. Has the value been deleted?",
                        stringify!($id_type),
                        index
                    )
                })
            }
        }
    };
}

impl_index_traits!(VertexId, Vertex, vertices);
impl_index_traits!(EdgeId, Edge, edges);
impl_index_traits!(FaceId, Face, faces);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn add_is_permissive_set_is_strict() {
        let mut mesh = TriMesh::new();
        let v = mesh.add_vertex(Vec3::ZERO);

        // Edges and faces may reference vertices that don't exist yet.
        let ghost = VertexId::from_raw(999);
        let e = mesh.add_edge(v, ghost);
        mesh.add_face(v, ghost, VertexId::from_raw(1000));
        assert_eq!(mesh.num_edges(), 1);
        assert_eq!(mesh.num_faces(), 1);

        // Setting an attribute on a missing element reports not-found and
        // mutates nothing.
        assert!(mesh.set_vertex_normal(v, Vec3::Y).is_ok());
        assert!(mesh.set_vertex_normal(ghost, Vec3::Y).is_err());
        assert!(mesh.set_vertex_uv(ghost, Vec2::ZERO).is_err());
        assert!(mesh.set_vertex_color(ghost, Vec4::ONE).is_err());
        assert!(mesh
            .set_edge_color(EdgeId::from_raw(42), Vec4::ONE, Vec4::ONE)
            .is_err());
        assert!(mesh.set_edge_color(e, Vec4::ONE, Vec4::ZERO).is_ok());
        assert_eq!(mesh.channels.vertex_normals.len(), 1);
        assert_eq!(mesh.channels.edge_colors.len(), 1);
    }

    #[test]
    fn handles_are_never_reused() {
        let mut mesh = TriMesh::new();
        let v0 = mesh.add_vertex(Vec3::ZERO);
        let v1 = mesh.add_vertex(Vec3::X);
        mesh.remove_vertex(v1);
        let v2 = mesh.add_vertex(Vec3::Y);

        assert_eq!(v0.raw(), 0);
        assert_eq!(v1.raw(), 1);
        assert_eq!(v2.raw(), 2);
        assert_eq!(mesh.num_vertices(), 2);
        assert_eq!(mesh.counters().vertex, 3);
    }

    #[test]
    fn removing_a_vertex_drops_its_attributes() {
        let mut mesh = TriMesh::new();
        let v = mesh.add_vertex_with(Vec3::ZERO, Some(Vec3::Y), Some(Vec4::ONE), Some(Vec2::ONE));
        mesh.remove_vertex(v);
        assert!(mesh.channels.vertex_normals.is_empty());
        assert!(mesh.channels.vertex_colors.is_empty());
        assert!(mesh.channels.vertex_uvs.is_empty());
    }

    #[test]
    fn add_material_by_name_is_idempotent() {
        let mut mesh = TriMesh::new();
        mesh.add_material(Material {
            name: "steel".into(),
            base_color: Vec4::ONE,
            metallic: 1.0,
            roughness: 0.2,
        });
        mesh.add_material(Material {
            name: "steel".into(),
            base_color: Vec4::ZERO,
            metallic: 0.0,
            roughness: 1.0,
        });
        assert_eq!(mesh.num_materials(), 1);
        // The first insertion wins.
        assert_eq!(mesh.material("steel").unwrap().metallic, 1.0);
    }

    #[test]
    fn group_record_created_on_first_use() {
        let mut mesh = TriMesh::new();
        mesh.add_face_to_group("hull", FaceId::from_raw(7));
        mesh.set_group_material("hull", "steel");
        mesh.set_group_material("deck", "wood");

        let hull = mesh.group("hull").unwrap();
        assert_eq!(hull.material, "steel");
        assert_eq!(hull.faces, vec![FaceId::from_raw(7)]);
        assert_eq!(mesh.group("deck").unwrap().material, "wood");
        assert!(mesh.group("deck").unwrap().faces.is_empty());
        assert_eq!(mesh.num_groups(), 2);
    }

    #[test]
    fn build_from_triangles_rejects_bad_indices() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y];
        assert!(TriMesh::build_from_triangles(&positions, &[[0u32, 1, 2]]).is_ok());
        assert!(TriMesh::build_from_triangles(&positions, &[[0u32, 1, 3]]).is_err());
    }

    #[test]
    fn sync_counters_tracks_max_live_handle() {
        let mut mesh = TriMesh::new();
        mesh.insert_vertex_raw(VertexId::from_raw(10), Vertex { position: Vec3::ZERO });
        mesh.insert_face_raw(
            FaceId::from_raw(3),
            Face {
                vertices: [VertexId::from_raw(10); 3],
            },
        );
        mesh.sync_counters();
        assert_eq!(mesh.counters().vertex, 11);
        assert_eq!(mesh.counters().edge, 0);
        assert_eq!(mesh.counters().face, 4);
    }
}
