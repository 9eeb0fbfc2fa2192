// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for BoundingBox {
    /// A degenerate, zero-sized box at the origin.
    fn default() -> Self {
        Self {
            min: Vec3::ZERO,
            max: Vec3::ZERO,
        }
    }
}

impl BoundingBox {
    /// Computes the box enclosing every vertex of `mesh` in a single pass.
    /// An empty vertex table yields the degenerate default box.
    pub fn of_mesh(mesh: &TriMesh) -> Self {
        let mut vertices = mesh.iter_vertices().map(|(_, v)| v.position);
        let first = match vertices.next() {
            Some(p) => p,
            None => return Self::default(),
        };
        vertices.fold(
            Self {
                min: first,
                max: first,
            },
            |bb, p| Self {
                min: bb.min.min(p),
                max: bb.max.max(p),
            },
        )
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_mesh_yields_degenerate_box() {
        let bb = BoundingBox::of_mesh(&TriMesh::new());
        assert_eq!(bb, BoundingBox::default());
        assert_eq!(bb.size(), Vec3::ZERO);
    }

    #[test]
    fn box_tracks_per_axis_extremes() {
        let mut mesh = TriMesh::new();
        mesh.add_vertex(Vec3::new(-1.0, 2.0, 0.5));
        mesh.add_vertex(Vec3::new(3.0, -4.0, 0.0));
        mesh.add_vertex(Vec3::new(0.0, 0.0, -2.5));

        let bb = BoundingBox::of_mesh(&mesh);
        assert_eq!(bb.min, Vec3::new(-1.0, -4.0, -2.5));
        assert_eq!(bb.max, Vec3::new(3.0, 2.0, 0.5));
        assert_eq!(bb.center(), Vec3::new(1.0, -1.0, -1.0));
    }
}
