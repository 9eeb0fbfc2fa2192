// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

use super::remap::{self, MeshMapping};
use crate::prelude::*;

/// A named, non-exclusive collection of faces with one associated material
/// name. The face list holds weak references: entries may name faces that no
/// longer exist, and consumers must filter for existence at read time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceGroup {
    pub material: String,
    pub faces: Vec<FaceId>,
}

impl FaceGroup {
    /// The subset of the face list that still exists in `mesh`, in list
    /// order.
    pub fn live_faces(&self, mesh: &TriMesh) -> Vec<FaceId> {
        self.faces
            .iter_cpy()
            .filter(|f| mesh.face_exists(*f))
            .collect()
    }
}

/// Materializes a new store containing only the geometry reachable from the
/// named group: its live faces, the vertices those faces reference, every
/// vertex attribute for that vertex set, and every edge (plus edge colors)
/// whose both endpoints lie in it. The group record (filtered to live faces)
/// and its material are copied along.
///
/// Copied elements keep their source handles verbatim, and the counters are
/// copied from the source store rather than recomputed, so handles minted by
/// further additions to the extracted store cannot collide with the source.
#[profiling::function]
pub fn extract_group(mesh: &TriMesh, name: &str) -> Result<TriMesh> {
    let group = mesh
        .group(name)
        .ok_or_else(|| anyhow!("No group named '{name}' in this mesh"))?;
    let faces = group.live_faces(mesh);

    let mut vertex_set = HashSet::new();
    for f in faces.iter_cpy() {
        vertex_set.extend(mesh[f].vertices.iter_cpy());
    }

    let mut out = TriMesh::new();
    for (id, vertex) in mesh.iter_vertices() {
        if !vertex_set.contains(&id) {
            continue;
        }
        out.insert_vertex_raw(id, *vertex);
        if let Some(normal) = mesh.channels.vertex_normals.get(id) {
            out.channels.vertex_normals.insert(id, *normal);
        }
        if let Some(uv) = mesh.channels.vertex_uvs.get(id) {
            out.channels.vertex_uvs.insert(id, *uv);
        }
        if let Some(color) = mesh.channels.vertex_colors.get(id) {
            out.channels.vertex_colors.insert(id, *color);
        }
    }

    for (id, edge) in mesh.iter_edges() {
        if vertex_set.contains(&edge.start) && vertex_set.contains(&edge.end) {
            out.insert_edge_raw(id, *edge);
            if let Some(colors) = mesh.channels.edge_colors.get(id) {
                out.channels.edge_colors.insert(id, *colors);
            }
        }
    }

    for f in faces.iter_cpy() {
        out.insert_face_raw(f, mesh[f]);
    }

    if let Some(material) = mesh.material(&group.material) {
        out.insert_material(material.clone());
    }
    out.insert_group(
        name.to_owned(),
        FaceGroup {
            material: group.material.clone(),
            faces,
        },
    );

    out.set_counters(mesh.counters());
    Ok(out)
}

/// Like [`extract_group`], but vertex handles are renumbered to a dense
/// 0-based range (ordered by original handle value) and edge/face vertex
/// references are rewritten accordingly, for consumers that require
/// contiguous indices such as rendering buffers. Counters are resynchronized
/// rather than inherited.
#[profiling::function]
pub fn extract_group_remapped(mesh: &TriMesh, name: &str) -> Result<TriMesh> {
    let extracted = extract_group(mesh, name)?;
    let mapping = MeshMapping::dense_vertices(&extracted);
    Ok(remap::apply_mapping(&extracted, &mapping))
}

/// Partitions a store by extracting every named group independently,
/// discarding groups with no live faces. Faces belonging to several groups
/// appear in several partitions; faces belonging to none appear in none.
pub fn split_by_groups(mesh: &TriMesh) -> Vec<(String, TriMesh)> {
    mesh.iter_groups()
        .filter_map(|(name, _)| {
            let sub = extract_group(mesh, name).ok()?;
            if sub.num_faces() == 0 {
                None
            } else {
                Some((name.to_owned(), sub))
            }
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    /// Two triangles sharing an edge, one of them grouped, plus a stale
    /// group entry and an ungrouped triangle off to the side.
    fn grouped_mesh() -> (TriMesh, FaceId) {
        let mut mesh = TriMesh::new();
        let a = mesh.add_vertex_with(Vec3::ZERO, Some(Vec3::Z), None, Some(Vec2::ZERO));
        let b = mesh.add_vertex(Vec3::X);
        let c = mesh.add_vertex(Vec3::Y);
        let d = mesh.add_vertex(Vec3::new(1.0, 1.0, 0.0));
        let e = mesh.add_vertex(Vec3::splat(5.0));
        let f = mesh.add_vertex(Vec3::splat(6.0));
        let g = mesh.add_vertex(Vec3::splat(7.0));

        let grouped = mesh.add_face(a, b, c);
        mesh.add_face(b, d, c);
        mesh.add_face(e, f, g);

        let inside = mesh.add_edge(a, b);
        mesh.add_edge(a, e); // one endpoint outside the group
        mesh.set_edge_color(inside, Vec4::ONE, Vec4::ZERO).unwrap();

        mesh.add_material(Material {
            name: "hull_paint".into(),
            base_color: Vec4::ONE,
            metallic: 0.0,
            roughness: 1.0,
        });
        mesh.set_group_material("hull", "hull_paint");
        mesh.add_face_to_group("hull", grouped);
        mesh.add_face_to_group("hull", FaceId::from_raw(400)); // stale
        (mesh, grouped)
    }

    #[test]
    fn extraction_is_exact() {
        let (mesh, grouped) = grouped_mesh();
        let sub = extract_group(&mesh, "hull").unwrap();

        // Face set: exactly the live grouped faces, under original handles.
        assert_eq!(
            sub.iter_faces().map(|(id, _)| id).collect::<Vec<_>>(),
            vec![grouped]
        );
        // Vertex set: exactly the vertices referenced by those faces.
        assert_eq!(
            sub.iter_vertices().map(|(id, _)| id.raw()).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        // Attributes and interior edges came along; the crossing edge did not.
        assert_eq!(sub.channels.vertex_normals.len(), 1);
        assert_eq!(sub.channels.vertex_uvs.len(), 1);
        assert_eq!(sub.num_edges(), 1);
        assert_eq!(sub.channels.edge_colors.len(), 1);
        // Material and the filtered group record were copied.
        assert!(sub.material("hull_paint").is_some());
        assert_eq!(sub.group("hull").unwrap().faces, vec![grouped]);
    }

    #[test]
    fn extracted_store_inherits_source_counters() {
        let (mesh, _) = grouped_mesh();
        let mut sub = extract_group(&mesh, "hull").unwrap();
        assert_eq!(sub.counters(), mesh.counters());

        // Fresh handles in the extraction can't collide with source handles.
        let v = sub.add_vertex(Vec3::ONE);
        assert!(mesh.vertex(v).is_none());
        assert_eq!(v.raw(), mesh.counters().vertex);
    }

    #[test]
    fn remapped_extraction_is_dense_and_rewritten() {
        let (mut mesh, _) = grouped_mesh();
        // Make the group's vertex handles sparse.
        let x = mesh.add_vertex(Vec3::new(0.0, 0.0, 3.0));
        let y = mesh.add_vertex(Vec3::new(1.0, 0.0, 3.0));
        let z = mesh.add_vertex(Vec3::new(0.0, 1.0, 3.0));
        let far = mesh.add_face(x, z, y);
        mesh.add_face_to_group("far", far);

        let sub = extract_group_remapped(&mesh, "far").unwrap();
        assert_eq!(
            sub.iter_vertices().map(|(id, _)| id.raw()).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        // Ordered by original handle value: x -> 0, y -> 1, z -> 2.
        let face = sub.iter_faces().next().unwrap().1;
        assert_eq!(
            face.vertices,
            [
                VertexId::from_raw(0),
                VertexId::from_raw(2),
                VertexId::from_raw(1)
            ]
        );
        assert_eq!(sub.counters().vertex, 3);
    }

    #[test]
    fn split_discards_empty_groups() {
        let (mut mesh, _) = grouped_mesh();
        mesh.add_face_to_group("stale_only", FaceId::from_raw(900));
        mesh.set_group_material("never_filled", "hull_paint");

        let parts = split_by_groups(&mesh);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].0, "hull");
    }

    #[test]
    fn extracting_a_missing_group_is_an_error() {
        let (mesh, _) = grouped_mesh();
        assert!(extract_group(&mesh, "no_such_group").is_err());
    }
}
