// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub use anyhow::{anyhow, bail, Context, Result};

pub use glam::{Vec2, Vec3, Vec4};

pub use itertools::Itertools;
pub use std::collections::{BTreeMap, HashMap, HashSet};

pub use crate::mesh::trimesh;
pub use crate::mesh::trimesh::*;

pub use crate::utils::*;
