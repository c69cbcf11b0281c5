use bevy::asset::RenderAssetUsages;
use bevy::log::debug;
use bevy::math::bounding::Aabb3d;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;

use crate::branch::TreeBranch;
use crate::error::TreeError;

/// Index the next vertex of a buffer holding `len` positions will get.
///
/// Fails once the buffer outgrows the `u32` index range.
pub fn vertex_index(len: usize) -> Result<u32, TreeError> {
    u32::try_from(len)
        .map_err(|_| TreeError::DegenerateGeometry("mesh exceeds the u32 index range"))
}

/// Flat triangle-list buffers for a whole tree.
///
/// Indices are global across the buffer and wind counter-clockwise when seen
/// from outside the bark.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds of all positions, `None` for an empty buffer.
    pub fn bounds(&self) -> Option<Aabb3d> {
        let first = *self.positions.first()?;
        let (min, max) = self
            .positions
            .iter()
            .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p)));
        Some(Aabb3d {
            min: min.into(),
            max: max.into(),
        })
    }

    /// Fills `normals` with the area-weighted average of the adjacent face
    /// normals of every vertex.
    pub fn compute_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];

        for tri in self.indices.chunks_exact(3) {
            let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let (pa, pb, pc) = (self.positions[a], self.positions[b], self.positions[c]);
            let face = (pc - pb).cross(pa - pb);

            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }

        for normal in &mut normals {
            *normal = normal.normalize_or_zero();
        }
        self.normals = normals;
    }

    /// Converts the buffers into a Bevy [`Mesh`]. The UVs are written to both
    /// texture channels.
    pub fn to_mesh(&self) -> Mesh {
        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions.clone());
        if self.normals.len() == self.positions.len() {
            mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals.clone());
        }
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs.clone());
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_1, self.uvs.clone());
        mesh.insert_indices(Indices::U32(self.indices.clone()));
        mesh
    }
}

/// Walks a branch tree and stitches every branch into one mesh.
///
/// Per branch, in pre-order: the rings, the lateral quads between them, and
/// either a fan cap (root) or a joint to a private copy of the parent ring it
/// grows from (children).
pub struct TreeMeshBuilder {
    data: MeshData,
    normals: bool,
}

impl Default for TreeMeshBuilder {
    fn default() -> Self {
        Self {
            data: MeshData::default(),
            normals: true,
        }
    }
}

impl TreeMeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_normals(mut self, normals: bool) -> Self {
        self.normals = normals;
        self
    }

    pub fn build(mut self, root: &TreeBranch) -> Result<MeshData, TreeError> {
        self.process_branch(root)?;
        if self.normals {
            self.data.compute_normals();
        }

        debug!(
            "assembled tree mesh: {} vertices, {} triangles",
            self.data.vertex_count(),
            self.data.triangle_count()
        );
        Ok(self.data)
    }

    fn process_branch(&mut self, branch: &TreeBranch) -> Result<(), TreeError> {
        let offset = vertex_index(self.data.positions.len())?;
        let res = branch.radius_segments;
        let row = res + 1;

        // 1. Rings
        for segment in &branch.segments {
            self.data.positions.extend_from_slice(&segment.vertices);
            self.data.uvs.extend_from_slice(&segment.uvs);
        }
        vertex_index(self.data.positions.len())?;

        // 2. Lateral faces
        let rings = branch.segments.len() as u32;
        for y in 0..rings.saturating_sub(1) {
            Self::connect_rings(
                &mut self.data,
                offset + y * row,
                offset + (y + 1) * row,
                res,
            );
        }

        // 3. Root cap or 4. joint
        let bottom = offset;
        match &branch.from {
            None => {
                if let Some(first) = branch.segments.first() {
                    let center = vertex_index(self.data.positions.len())?;
                    self.data.positions.push(first.position);
                    self.data.uvs.push(Vec2::new(0.5, first.uv_offset));

                    for x in 0..res {
                        self.data
                            .indices
                            .extend_from_slice(&[bottom + x, center, bottom + x + 1]);
                    }
                }
            }
            Some(parent_ring) => {
                let joint = vertex_index(self.data.positions.len())?;
                self.data.positions.extend_from_slice(&parent_ring.vertices);
                self.data.uvs.extend_from_slice(&parent_ring.uvs);

                vertex_index(self.data.positions.len())?;
                Self::connect_rings(&mut self.data, joint, bottom, res);
            }
        }

        // 5. Children, each offset by everything emitted so far
        for child in &branch.children {
            self.process_branch(child)?;
        }
        Ok(())
    }

    /// Two triangles per radial step between a lower and an upper ring.
    fn connect_rings(data: &mut MeshData, bottom_start: u32, top_start: u32, res: u32) {
        for x in 0..res {
            let bottom_curr = bottom_start + x;
            let bottom_next = bottom_start + x + 1;
            let top_curr = top_start + x;
            let top_next = top_start + x + 1;

            data.indices
                .extend_from_slice(&[bottom_curr, bottom_next, top_curr]);
            data.indices
                .extend_from_slice(&[top_curr, bottom_next, top_next]);
        }
    }
}
