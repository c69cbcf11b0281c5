//! Point queries over a finished branch tree, for tooling that places
//! markers or decorations on the bark.

use bevy::math::Vec3;

use crate::branch::TreeBranch;

/// End points of every branch that has children, at most `generations` of
/// them, in post-order.
pub fn branch_points(root: &TreeBranch, generations: u32) -> Vec<Vec3> {
    let mut points = Vec::new();
    collect_branch_points(root, generations as usize, &mut points);
    points
}

fn collect_branch_points(node: &TreeBranch, generations: usize, points: &mut Vec<Vec3>) {
    if node.children.is_empty() {
        return;
    }
    for child in &node.children {
        collect_branch_points(child, generations, points);
    }
    if node.children.len() <= generations {
        points.push(node.to);
    }
}

/// Centroid of every ring in the tree, sorted bottom to top, with the first
/// `skip` entries dropped.
pub fn ring_centers(root: &TreeBranch, skip: usize) -> Vec<Vec3> {
    let mut centers: Vec<Vec3> = root
        .iter()
        .flat_map(|branch| branch.segments.iter().map(|s| round_vec(s.centroid())))
        .collect();
    centers.sort_by(|a, b| a.y.total_cmp(&b.y));
    centers.into_iter().skip(skip).collect()
}

fn round_vec(v: Vec3) -> Vec3 {
    const SCALE: f32 = 1e5;
    (v * SCALE).round() / SCALE
}
