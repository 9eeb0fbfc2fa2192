// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::debug;

use crate::prelude::*;

/// Removes every vertex that is referenced by no edge and no face, along
/// with its attribute entries. Removing nothing is a success, not an error.
///
/// A reference only counts when the referencing edge or face is itself fully
/// valid: an edge or face that names a missing vertex cannot keep its other
/// vertices alive, since the later cleanup passes delete it.
#[profiling::function]
pub fn remove_orphan_vertices(mesh: &mut TriMesh) {
    let mut referenced = HashSet::new();
    for (_, edge) in mesh.iter_edges() {
        if mesh.vertex_exists(edge.start) && mesh.vertex_exists(edge.end) {
            referenced.insert(edge.start);
            referenced.insert(edge.end);
        }
    }
    for (_, face) in mesh.iter_faces() {
        if face.vertices.iter().all(|v| mesh.vertex_exists(*v)) {
            referenced.extend(face.vertices.iter_cpy());
        }
    }

    let orphans = mesh
        .iter_vertices()
        .map(|(id, _)| id)
        .filter(|id| !referenced.contains(id))
        .collect::<Vec<_>>();
    for v in &orphans {
        mesh.remove_vertex(*v);
    }
    if !orphans.is_empty() {
        debug!("remove_orphan_vertices: removed {} vertices", orphans.len());
    }
}

/// Collapses vertices that lie within `tolerance` of each other. The scan
/// visits unordered pairs in table iteration order and the first-encountered
/// vertex of a matching pair is kept as canonical: every edge and face
/// reference to the duplicate is rewritten to the canonical vertex, then the
/// duplicate and its attributes are deleted.
#[profiling::function]
pub fn merge_duplicate_vertices(mesh: &mut TriMesh, tolerance: f32) {
    let ids = mesh.iter_vertices().map(|(id, _)| id).collect::<Vec<_>>();
    let tolerance_sq = tolerance * tolerance;
    let mut merged = 0usize;

    for (keep, dup) in ids.iter_cpy().tuple_combinations() {
        // Either endpoint may already have been merged away.
        let (p_keep, p_dup) = match (mesh.vertex(keep), mesh.vertex(dup)) {
            (Some(a), Some(b)) => (a.position, b.position),
            _ => continue,
        };
        if p_keep.distance_squared(p_dup) <= tolerance_sq {
            rewrite_vertex_references(mesh, dup, keep);
            mesh.remove_vertex(dup);
            merged += 1;
        }
    }
    if merged > 0 {
        debug!("merge_duplicate_vertices: merged {merged} vertices");
    }
}

/// Points every edge and face reference to `from` at `to` instead.
fn rewrite_vertex_references(mesh: &mut TriMesh, from: VertexId, to: VertexId) {
    for edge in mesh.edges.values_mut() {
        if edge.start == from {
            edge.start = to;
        }
        if edge.end == from {
            edge.end = to;
        }
    }
    for face in mesh.faces.values_mut() {
        for v in face.vertices.iter_mut() {
            if *v == from {
                *v = to;
            }
        }
    }
}

/// Drops vertex attribute entries whose vertex no longer exists.
#[profiling::function]
pub fn remove_dangling_attributes(mesh: &mut TriMesh) {
    let vertices = &mesh.vertices;
    mesh.channels
        .vertex_normals
        .retain(|v, _| vertices.contains_key(&v));
    mesh.channels
        .vertex_uvs
        .retain(|v, _| vertices.contains_key(&v));
    mesh.channels
        .vertex_colors
        .retain(|v, _| vertices.contains_key(&v));
}

/// Removes edges referencing a missing vertex, removes duplicate edges (same
/// unordered endpoint pair, first in table order wins), and drops edge color
/// entries whose edge no longer exists.
#[profiling::function]
pub fn cleanup_edges(mesh: &mut TriMesh) {
    let mut seen = HashSet::new();
    let doomed = mesh
        .iter_edges()
        .filter(|(_, edge)| {
            !mesh.vertex_exists(edge.start)
                || !mesh.vertex_exists(edge.end)
                || !seen.insert(edge.unordered_pair())
        })
        .map(|(id, _)| id)
        .collect::<Vec<_>>();
    for e in &doomed {
        mesh.remove_edge(*e);
    }

    let edges = &mesh.edges;
    mesh.channels
        .edge_colors
        .retain(|e, _| edges.contains_key(&e));

    if !doomed.is_empty() {
        debug!("cleanup_edges: removed {} edges", doomed.len());
    }
}

/// Removes faces referencing a missing vertex and duplicate faces (same
/// unordered vertex triple, any winding, first in table order wins).
#[profiling::function]
pub fn cleanup_faces(mesh: &mut TriMesh) {
    let mut seen = HashSet::new();
    let doomed = mesh
        .iter_faces()
        .filter(|(_, face)| {
            face.vertices.iter().any(|v| !mesh.vertex_exists(*v))
                || !seen.insert(face.unordered_triple())
        })
        .map(|(id, _)| id)
        .collect::<Vec<_>>();
    for f in &doomed {
        mesh.remove_face(*f);
    }
    if !doomed.is_empty() {
        debug!("cleanup_faces: removed {} faces", doomed.len());
    }
}

/// Runs every cleanup pass in a fixed order chosen to avoid cascading
/// inconsistency:
///
/// 1. orphan vertices
/// 2. duplicate vertices within `tolerance`
/// 3. dangling vertex attributes
/// 4. edge cleanup (dangling, duplicate, orphaned colors)
/// 5. face cleanup (dangling, duplicate)
///
/// The pass is idempotent: a second run on the same store changes nothing.
/// There is no rollback; callers that need atomicity should sanitize a copy.
#[profiling::function]
pub fn sanitize(mesh: &mut TriMesh, tolerance: f32) {
    remove_orphan_vertices(mesh);
    merge_duplicate_vertices(mesh, tolerance);
    remove_dangling_attributes(mesh);
    cleanup_edges(mesh);
    cleanup_faces(mesh);
}
