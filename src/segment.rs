use bevy::math::{Quat, Vec2, Vec3};

/// A closed ring of vertices around one point of a branch centerline.
///
/// The ring holds `radius_segments + 1` vertices: the last one repeats the
/// first so that the U coordinate can run from 0 to 1 without a seam.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeSegment {
    pub position: Vec3,
    pub rotation: Quat,
    pub uv_offset: f32,
    pub radius: f32,
    pub radius_segments: u32,
    pub vertices: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
}

impl TreeSegment {
    pub fn new(
        position: Vec3,
        rotation: Quat,
        uv_offset: f32,
        radius: f32,
        radius_segments: u32,
    ) -> Self {
        let count = radius_segments as usize + 1;
        let mut vertices = Vec::with_capacity(count);
        let mut uvs = Vec::with_capacity(count);

        for i in 0..radius_segments {
            let u = i as f32 / radius_segments as f32;
            let (sin, cos) = (u * std::f32::consts::TAU).sin_cos();
            let local = Vec3::new(radius * sin, 0.0, radius * cos);

            vertices.push(rotation * local + position);
            uvs.push(Vec2::new(u, uv_offset));
        }

        // Close the ring exactly on the first vertex
        let first = vertices.first().copied().unwrap_or(position);
        vertices.push(first);
        uvs.push(Vec2::new(1.0, uv_offset));

        Self {
            position,
            rotation,
            uv_offset,
            radius,
            radius_segments,
            vertices,
            uvs,
        }
    }

    /// Arithmetic mean of the ring vertices, closing vertex included.
    pub fn centroid(&self) -> Vec3 {
        if self.vertices.is_empty() {
            return self.position;
        }
        self.vertices.iter().copied().sum::<Vec3>() / self.vertices.len() as f32
    }
}
