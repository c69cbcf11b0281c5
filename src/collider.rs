//! Capsule collider generation for grown trees.
//!
//! Builds physics shapes along every branch, one capsule per pair of adjacent
//! rings. This is significantly cheaper than convex decomposition of the bark
//! mesh and follows the taper of each branch.

use avian3d::prelude::Collider;
use bevy::prelude::*;

use crate::branch::TreeBranch;

/// A positioned capsule collider ready to be spawned into the world.
#[derive(Debug, Clone)]
pub struct PositionedCollider {
    /// World-space transform for the collider center.
    pub transform: Transform,
    /// The capsule collider shape.
    pub collider: Collider,
    /// Average radius of the two rings (for reference).
    pub radius: f32,
    /// Distance between the two ring centers.
    pub length: f32,
    /// Generation of the branch the piece belongs to.
    pub generation: u32,
}

/// Generates capsule colliders from a branch tree.
///
/// Thin twigs can be filtered out with [`ColliderGenerator::with_min_radius`]
/// to reduce physics overhead.
#[derive(Default)]
pub struct ColliderGenerator {
    min_radius: f32,
}

impl ColliderGenerator {
    /// Creates a new collider generator with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pieces with average radius below this threshold are skipped.
    pub fn with_min_radius(mut self, min_radius: f32) -> Self {
        self.min_radius = min_radius.max(0.0);
        self
    }

    /// Generates a single compound collider for the whole tree.
    ///
    /// Returns `None` if no piece qualifies.
    pub fn build(&self, root: &TreeBranch) -> Option<Collider> {
        let parts = self.build_parts(root);
        if parts.is_empty() {
            return None;
        }
        Some(Collider::compound(
            parts
                .into_iter()
                .map(|p| (p.transform.translation, p.transform.rotation, p.collider))
                .collect::<Vec<_>>(),
        ))
    }

    /// Generates individual positioned colliders, branches in pre-order.
    ///
    /// For most use cases, prefer [`ColliderGenerator::build`] which returns a
    /// single compound collider.
    pub fn build_parts(&self, root: &TreeBranch) -> Vec<PositionedCollider> {
        let mut colliders = Vec::new();
        for branch in root.iter() {
            self.process_branch(branch, &mut colliders);
        }
        colliders
    }

    fn process_branch(&self, branch: &TreeBranch, colliders: &mut Vec<PositionedCollider>) {
        for pair in branch.segments.windows(2) {
            let (start, end) = (&pair[0], &pair[1]);

            let avg_radius = (start.radius + end.radius) * 0.5;
            if avg_radius <= 0.0 || avg_radius < self.min_radius {
                continue;
            }

            let segment_vec = end.position - start.position;
            let length = segment_vec.length();
            if length < 0.0001 {
                continue;
            }

            let center = (start.position + end.position) * 0.5;
            let rotation = Quat::from_rotation_arc(Vec3::Y, segment_vec / length);

            // A capsule shorter than its diameter would poke past both rings
            let collider = if length < 2.0 * avg_radius {
                Collider::sphere(avg_radius)
            } else {
                Collider::capsule(avg_radius, length - 2.0 * avg_radius)
            };

            colliders.push(PositionedCollider {
                transform: Transform::from_translation(center).with_rotation(rotation),
                collider,
                radius: avg_radius,
                length,
                generation: branch.generation,
            });
        }
    }
}
