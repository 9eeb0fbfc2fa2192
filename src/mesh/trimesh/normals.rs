// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::prelude::*;

/// Returns the outward unit normal of a face, or None when the face does not
/// exist, references a missing vertex, or is degenerate (zero area).
///
/// Faces list their vertices clockwise as seen from the outward side, so the
/// outward normal is `(c - a) x (b - a)`, normalized. This is the only
/// normal routine in the crate; every caller goes through it so the sign
/// convention cannot drift between call sites.
pub fn face_normal(mesh: &TriMesh, face: FaceId) -> Option<Vec3> {
    let face = mesh.face(face)?;
    let [a, b, c] = face.vertices;
    let a = mesh.vertex(a)?.position;
    let b = mesh.vertex(b)?.position;
    let c = mesh.vertex(c)?.position;
    (c - a).cross(b - a).try_normalize()
}

/// Assigns each vertex the normal of the *first* face, in face-table
/// iteration order, that references it. This produces faceted shading by
/// construction; it is not an approximation of averaged smooth normals.
/// Vertices referenced by no face (or only by faces whose normal cannot be
/// computed) keep whatever normal entry they already had.
#[profiling::function]
pub fn set_normals_from_faces(mesh: &mut TriMesh) {
    let updates = mesh
        .iter_vertices()
        .filter_map(|(v, _)| {
            let first_face = mesh.faces_of_vertex(v).first().copied()?;
            face_normal(mesh, first_face).map(|normal| (v, normal))
        })
        .collect::<Vec<_>>();

    for (v, normal) in updates {
        mesh.channels.vertex_normals.insert(v, normal);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn normal_sign_convention() {
        let mut mesh = TriMesh::new();
        let a = mesh.add_vertex(Vec3::ZERO);
        let b = mesh.add_vertex(Vec3::X);
        let c = mesh.add_vertex(Vec3::Y);
        let f = mesh.add_face(a, b, c);

        // The fixed convention: this triangle's outward normal is -Z.
        assert_eq!(face_normal(&mesh, f), Some(Vec3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn degenerate_and_dangling_faces_have_no_normal() {
        let mut mesh = TriMesh::new();
        let a = mesh.add_vertex(Vec3::ZERO);
        let b = mesh.add_vertex(Vec3::X);
        let degenerate = mesh.add_face(a, b, a);
        let dangling = mesh.add_face(a, b, VertexId::from_raw(99));

        assert_eq!(face_normal(&mesh, degenerate), None);
        assert_eq!(face_normal(&mesh, dangling), None);
        assert_eq!(face_normal(&mesh, FaceId::from_raw(1000)), None);
    }

    #[test]
    fn vertices_take_the_first_face_normal() {
        let mut mesh = TriMesh::new();
        let a = mesh.add_vertex(Vec3::ZERO);
        let b = mesh.add_vertex(Vec3::X);
        let c = mesh.add_vertex(Vec3::Y);
        let d = mesh.add_vertex(Vec3::new(1.0, 0.0, 1.0));
        let f0 = mesh.add_face(a, b, c);
        let f1 = mesh.add_face(a, d, b);
        let lonely = mesh.add_vertex(Vec3::splat(9.0));

        set_normals_from_faces(&mut mesh);

        let n0 = face_normal(&mesh, f0).unwrap();
        let n1 = face_normal(&mesh, f1).unwrap();
        assert_ne!(n0, n1);
        // a and b are shared between both faces; f0 comes first in table
        // order, so its normal wins. d is only touched by f1.
        assert_eq!(mesh.channels.vertex_normals[a], n0);
        assert_eq!(mesh.channels.vertex_normals[b], n0);
        assert_eq!(mesh.channels.vertex_normals[c], n0);
        assert_eq!(mesh.channels.vertex_normals[d], n1);
        assert!(!mesh.channels.vertex_normals.contains(lonely));
    }
}
