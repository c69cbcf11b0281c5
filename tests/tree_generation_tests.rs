use std::f32::consts::FRAC_PI_4;

use bevy::prelude::*;
use bevy_arbor::branch::ATTACHMENT_OFFSET;
use bevy_arbor::points::{branch_points, ring_centers};
use bevy_arbor::{
    Branchlet, Tree, TreeBranch, TreeGeometry, TreeRotation, TreeSettings, TreeSpawner,
    taper_ratios,
};
use rand::SeedableRng;
use rand_pcg::Pcg64;

fn seeded(generations: u32, seed: u64) -> Tree {
    Tree::new(
        TreeSettings::new()
            .with_generations(generations)
            .with_seed(seed),
    )
    .expect("valid settings")
}

fn count_leaves(branchlet: &Branchlet<'_>) -> usize {
    match branchlet {
        Branchlet::Leaf(_) => 1,
        Branchlet::Node(children) => children.iter().map(count_leaves).sum(),
    }
}

#[test]
fn test_defaults() {
    let settings = TreeSettings::default();
    assert_eq!(settings.generations, 5);
    assert_eq!(settings.length, 3.0);
    assert_eq!(settings.uv_length, 10.0);
    assert_eq!(settings.radius, 0.1);
    assert_eq!(settings.radius_segments, 8);
    assert_eq!(settings.height_segments, 8);
    assert_eq!(settings.generation, 0);

    let spawner = TreeSpawner::default();
    assert_eq!(spawner.attenuation, 0.75);
    assert_eq!(spawner.root_range, Vec2::new(0.75, 1.0));
}

#[test]
fn test_segment_and_vertex_counts() {
    let tree = Tree::new(
        TreeSettings::new()
            .with_generations(2)
            .with_height_segments(5)
            .with_radius_segments(7)
            .with_seed(1),
    )
    .unwrap();

    for branch in tree.root().iter() {
        assert_eq!(branch.segments.len(), 6);
        for segment in &branch.segments {
            assert_eq!(segment.vertices.len(), 8);
            assert_eq!(segment.uvs.len(), 8);
        }
    }
}

#[test]
fn test_first_ring_sits_on_branch_start() {
    let tree = seeded(2, 4);
    for branch in tree.root().iter() {
        assert_eq!(branch.segments[0].position, branch.position);
    }
}

#[test]
fn test_branch_counts_per_generation() {
    // Root spawns `generations` children, each child one fewer, and so on
    let tree = seeded(3, 2);
    let root = tree.root();

    assert_eq!(root.children.len(), 3);
    for child in &root.children {
        assert_eq!(child.generation, 1);
        assert_eq!(child.children.len(), 2);
        for grandchild in &child.children {
            assert_eq!(grandchild.children.len(), 1);
            assert!(grandchild.children[0].is_leaf());
        }
    }
    assert_eq!(root.count(), 1 + 3 * (1 + 2 * (1 + 1)));
}

#[test]
fn test_depth_bound() {
    for generations in 0..5 {
        let tree = seeded(generations, 17);
        assert_eq!(tree.root().depth(), generations);
        for branch in tree.root().iter() {
            assert!(branch.generation <= generations);
        }
    }
}

#[test]
fn test_growth_pass_runs_once() {
    let tree = seeded(2, 5);
    assert_eq!(tree.growth(), 1);
}

#[test]
fn test_monotonic_taper() {
    let generations = 5;
    for g in 0..generations {
        let (from, _) = taper_ratios(g, generations);
        let (next_from, _) = taper_ratios(g + 1, generations);
        assert!(from > next_from, "Generation {} is not wider than {}", g, g + 1);
    }

    // Each generation ends where the next starts
    for g in 1..generations {
        assert_eq!(taper_ratios(g - 1, generations).1, taper_ratios(g, generations).0);
    }
    assert_eq!(taper_ratios(generations, generations).1, 0.0);
}

#[test]
fn test_radius_narrows_toward_tips() {
    let tree = seeded(3, 8);

    fn check(branch: &TreeBranch) {
        for pair in branch.segments.windows(2) {
            assert!(pair[1].radius <= pair[0].radius);
        }
        for child in &branch.children {
            assert!(child.segments[0].radius < branch.segments[0].radius);
            check(child);
        }
    }
    check(tree.root());
}

#[test]
fn test_extension_attaches_to_last_ring() {
    let tree = seeded(3, 13);
    for branch in tree.root().iter() {
        if let Some(extension) = branch.children.first() {
            assert_eq!(extension.from.as_ref(), branch.segments.last());
        }
    }
}

#[test]
fn test_lateral_children_attach_within_root_range() {
    let tree = seeded(4, 21);
    for branch in tree.root().iter() {
        let first_allowed = (0.75 * branch.segments.len() as f32).floor() as usize;
        for child in branch.children.iter().skip(1) {
            let ring = child.from.as_ref().unwrap();
            let index = branch
                .segments
                .iter()
                .position(|s| s == ring)
                .expect("child attaches to a parent ring");
            assert!(index >= first_allowed, "Ring {} below root range", index);
        }
    }
}

#[test]
fn test_child_starts_just_off_parent_ring() {
    let tree = seeded(2, 30);
    for branch in tree.root().iter() {
        for child in &branch.children {
            let ring = child.from.as_ref().unwrap();
            let expected = ring.position + (ring.rotation * Vec3::Y) * ATTACHMENT_OFFSET;
            assert!(child.position.distance(expected) < 1e-5);
        }
    }
}

#[test]
fn test_child_length_attenuates() {
    let tree = Tree::new(
        TreeSettings::new()
            .with_generations(2)
            .with_length(4.0)
            .with_spawner(TreeSpawner::default().with_attenuation(0.5))
            .with_seed(3),
    )
    .unwrap();

    let root = tree.root();
    for child in &root.children {
        assert!((child.length - 2.0).abs() < 1e-6);
        assert!((child.to.distance(child.position) - 2.0).abs() < 1e-4);
        for grandchild in &child.children {
            assert!((grandchild.length - 1.0).abs() < 1e-6);
        }
    }
}

#[test]
fn test_unbent_end_point() {
    let tree = seeded(0, 44);
    let root = tree.root();
    // Identity rotation grows straight up
    assert!(root.to.distance(Vec3::new(0.0, 3.0, 0.0)) < 1e-5);
    // The curve still ends at `to`
    let last = root.segments.last().unwrap().position;
    assert!(last.distance(root.to) < 1e-4);
}

#[test]
fn test_determinism_with_seed() {
    let settings = TreeSettings::new().with_generations(3).with_seed(1234);
    let a = TreeGeometry::new(settings.clone()).unwrap();
    let b = TreeGeometry::new(settings).unwrap();
    assert_eq!(a.mesh_data(), b.mesh_data());
    assert_eq!(a.branch_ends(), b.branch_ends());
}

#[test]
fn test_determinism_with_injected_rng() {
    let settings = TreeSettings::new().with_generations(2);
    let a = Tree::with_rng(settings.clone(), &mut Pcg64::seed_from_u64(99)).unwrap();
    let b = Tree::with_rng(settings, &mut Pcg64::seed_from_u64(99)).unwrap();

    let positions = |tree: &Tree| -> Vec<Vec3> {
        tree.root()
            .iter()
            .flat_map(|b| b.segments.iter().map(|s| s.position))
            .collect()
    };
    assert_eq!(positions(&a), positions(&b));
}

#[test]
fn test_different_seeds_differ() {
    let a = TreeGeometry::new(TreeSettings::new().with_generations(2).with_seed(1)).unwrap();
    let b = TreeGeometry::new(TreeSettings::new().with_generations(2).with_seed(2)).unwrap();
    assert_ne!(a.mesh_data().positions, b.mesh_data().positions);
}

#[test]
fn test_clone_is_deep() {
    let tree = seeded(2, 7);
    let copy = tree.clone();
    assert_eq!(copy.root().count(), tree.root().count());

    let mut branch = tree.root().clone();
    branch.children.clear();
    branch.segments[0].vertices[0] = Vec3::splat(100.0);
    assert_ne!(tree.root().segments[0].vertices[0], Vec3::splat(100.0));
    assert!(!tree.root().children.is_empty());
}

#[test]
fn test_branchlets_and_leaves() {
    let tree = seeded(3, 10);
    let leaves = tree.root().leaves().count();
    assert_eq!(count_leaves(&tree.branchlets()), leaves);
    // 3 * 2 * 1 full-depth chains
    assert_eq!(leaves, 6);
    assert!(tree.root().leaves().all(|leaf| leaf.is_leaf()));
}

#[test]
fn test_branch_points_post_order() {
    let tree = seeded(2, 15);
    let root = tree.root();
    let points = branch_points(root, 2);

    // Root and its two children have children; grandchildren are leaves
    assert_eq!(points.len(), 3);
    assert_eq!(points[0], root.children[0].to);
    assert_eq!(points[1], root.children[1].to);
    assert_eq!(points[2], root.to);
}

#[test]
fn test_branch_points_respect_child_limit() {
    let tree = seeded(3, 15);
    // Root has 3 children, which exceeds a limit of 2
    let points = branch_points(tree.root(), 2);
    assert!(!points.contains(&tree.root().to));
}

#[test]
fn test_ring_centers_sorted_and_skipped() {
    let tree = seeded(2, 19);
    let all = ring_centers(tree.root(), 0);
    let total: usize = tree.root().iter().map(|b| b.segments.len()).sum();
    assert_eq!(all.len(), total);
    for pair in all.windows(2) {
        assert!(pair[0].y <= pair[1].y);
    }

    let skipped = ring_centers(tree.root(), 4);
    assert_eq!(skipped.as_slice(), &all[4..]);
}

#[test]
fn test_geometry_ring_centers_cached() {
    let geometry = TreeGeometry::new(TreeSettings::new().with_generations(1).with_seed(2)).unwrap();
    let all = geometry.ring_centers(0).to_vec();
    assert_eq!(geometry.ring_centers(3), &all[3..]);
    assert!(geometry.ring_centers(usize::MAX).is_empty());
}

#[test]
fn test_curve_length_close_to_branch_length() {
    let tree = seeded(0, 3);
    let root = tree.root();
    let length = root.curve_length();
    // Bent, so never shorter than the chord, and the bend is mild
    assert!(length >= root.position.distance(root.to) - 1e-4);
    assert!(length < root.length * 1.5);
}

#[test]
fn test_rotation_inputs_agree() {
    let angles = Vec3::new(0.3, 0.0, -0.2);
    let quat = Quat::from_euler(EulerRot::XYZ, angles.x, angles.y, angles.z);

    let build = |rotation| {
        Tree::new(
            TreeSettings::new()
                .with_generations(0)
                .with_rotation(rotation)
                .with_seed(8),
        )
        .unwrap()
    };
    let from_euler = build(TreeRotation::Euler(angles));
    let from_matrix = build(TreeRotation::Matrix(Mat4::from_quat(quat)));

    assert!(from_euler.root().to.distance(from_matrix.root().to) < 1e-4);
    let direction = (from_euler.root().to - from_euler.root().position).normalize();
    assert!(direction.distance(quat * Vec3::Y) < 1e-4);
}

#[test]
fn test_grow_gives_a_leaf_one_extension() {
    let tree = seeded(0, 23);
    let mut root = tree.root().clone();
    assert!(root.is_leaf());

    root.grow(tree.spawner(), &mut Pcg64::seed_from_u64(1)).unwrap();

    assert_eq!(root.children.len(), 1);
    let child = &root.children[0];
    assert_eq!(child.generation, 1);
    assert_eq!(child.from.as_ref(), root.segments.last());
}

#[test]
fn test_grow_extends_every_leaf_of_a_grown_tree() {
    let tree = seeded(2, 5);
    let mut root = tree.root().clone();
    let before = root.count();
    let leaves = root.leaves().count();

    root.grow(tree.spawner(), &mut Pcg64::seed_from_u64(2)).unwrap();

    assert_eq!(root.count(), before + leaves);
    assert_eq!(root.depth(), 3);
    for branch in root.iter().filter(|b| b.generation == 2) {
        assert_eq!(branch.children.len(), 1);
        assert_eq!(branch.children[0].from.as_ref(), branch.segments.last());
    }
    // The tree itself is untouched
    assert_eq!(tree.root().count(), before);
}

#[test]
fn test_branch_spawns_on_full_depth_node() {
    let tree = seeded(1, 8);
    let mut leaf = tree.root().children[0].clone();
    assert_eq!(leaf.generation, leaf.generations);

    leaf.branch(tree.spawner(), 2, &mut Pcg64::seed_from_u64(3)).unwrap();
    assert_eq!(leaf.children.len(), 2);
    assert_eq!(leaf.count(), 1 + 2 * 2);
}

#[test]
fn test_nonzero_root_generation_respects_depth_bound() {
    let tree = Tree::new(
        TreeSettings::new()
            .with_generations(3)
            .with_generation(1)
            .with_seed(4),
    )
    .unwrap();
    assert_eq!(tree.root().children.len(), 2);
    assert_eq!(tree.root().depth(), 3);
}

#[test]
fn test_zero_theta_children_follow_parent() {
    let tree = Tree::new(
        TreeSettings::new()
            .with_generations(3)
            .with_rotation(TreeRotation::Euler(Vec3::new(0.4, 0.0, -0.3)))
            .with_spawner(TreeSpawner::default().with_theta(0.0))
            .with_seed(6),
    )
    .unwrap();

    for branch in tree.root().iter() {
        let expected = branch.rotation * Vec3::Y;
        for child in &branch.children {
            let direction = (child.to - child.position).normalize();
            assert!(
                direction.distance(expected) < 1e-4,
                "Child {:?} should continue along {:?}",
                direction,
                expected
            );
        }
    }
}

#[test]
fn test_child_lean_stays_within_theta() {
    let spawner = TreeSpawner::default();
    let half = spawner.theta * 0.5;
    let tree = Tree::new(
        TreeSettings::new()
            .with_generations(3)
            .with_rotation(TreeRotation::Euler(Vec3::new(0.5, 0.0, 0.7)))
            .with_spawner(spawner.clone())
            .with_seed(31),
    )
    .unwrap();

    for branch in tree.root().iter() {
        let parent_direction = branch.rotation * Vec3::Y;
        for child in &branch.children {
            // The lean is applied on top of the parent rotation
            let lean = child.rotation * branch.rotation.inverse();
            let (x, y, z) = lean.to_euler(EulerRot::XYZ);
            assert!(y.abs() < 1e-4, "Lean has a Y component: {}", y);
            assert!(x.abs() <= half + 1e-4, "X lean {} exceeds {}", x, half);
            assert!(z.abs() <= half + 1e-4, "Z lean {} exceeds {}", z, half);

            // Two rotations of at most theta/2 each
            let direction = child.rotation * Vec3::Y;
            assert!(direction.angle_between(parent_direction) <= spawner.theta + 1e-4);
        }
    }
}

#[test]
fn test_bend_stays_within_limit() {
    for seed in 0..32 {
        // With two height segments the middle ring sits on the bent control point
        let tree = Tree::new(
            TreeSettings::new()
                .with_generations(2)
                .with_height_segments(2)
                .with_seed(seed),
        )
        .unwrap();

        for branch in tree.root().iter() {
            let control = branch.segments[1].position - branch.position;
            let straight = branch.to - branch.position;
            assert!((control.length() - branch.length * 0.5).abs() < 1e-4);
            assert!(
                control.angle_between(straight) <= FRAC_PI_4 + 1e-4,
                "Bend of {} rad exceeds pi/4",
                control.angle_between(straight)
            );
        }
    }
}
