//! Tapered, curved tube between a start and an end point.
//!
//! A [`TreeBranch`] owns its rings ([`TreeSegment`]) and its children. Children
//! keep an owned snapshot of the parent ring they grow from, so a subtree can
//! be cloned or meshed without reaching back into its parent.

use std::f32::consts::PI;

use bevy::log::trace;
use bevy::math::{EulerRot, Quat, Vec3};
use rand::Rng;

use crate::curve::CatmullRomCurve;
use crate::error::TreeError;
use crate::segment::TreeSegment;
use crate::spawner::TreeSpawner;

/// Distance a child starts above the ring it is attached to.
pub const ATTACHMENT_OFFSET: f32 = 0.05;

/// Deepest generation limit accepted. Branch count grows factorially with it.
pub const MAX_GENERATIONS: u32 = 16;

/// Maximum spread of the random bend applied to every branch curve.
const BEND_THETA: f32 = PI * 0.25;

/// Where a branch starts.
#[derive(Debug, Clone, PartialEq)]
pub enum BranchOrigin {
    /// A free-standing start point (the root).
    Point(Vec3),
    /// A ring of a parent branch the new branch is stitched to.
    Segment(TreeSegment),
}

impl Default for BranchOrigin {
    fn default() -> Self {
        BranchOrigin::Point(Vec3::ZERO)
    }
}

/// Construction parameters for a single branch.
#[derive(Debug, Clone)]
pub struct BranchParams {
    pub length: f32,
    pub radius: f32,
    pub radius_segments: u32,
    pub height_segments: u32,
    pub generation: u32,
    pub generations: u32,
    pub uv_length: f32,
    pub uv_offset: f32,
    pub rotation: Quat,
    pub from: BranchOrigin,
}

impl BranchParams {
    pub fn validate(&self) -> Result<(), TreeError> {
        if self.radius_segments < 3 {
            return Err(TreeError::invalid(
                "radius_segments",
                format!("must be at least 3, got {}", self.radius_segments),
            ));
        }
        if self.height_segments < 1 {
            return Err(TreeError::invalid(
                "height_segments",
                format!("must be at least 1, got {}", self.height_segments),
            ));
        }
        if !(self.length.is_finite() && self.length > 0.0) {
            return Err(TreeError::invalid(
                "length",
                format!("must be positive and finite, got {}", self.length),
            ));
        }
        if !(self.uv_length.is_finite() && self.uv_length > 0.0) {
            return Err(TreeError::invalid(
                "uv_length",
                format!("must be positive and finite, got {}", self.uv_length),
            ));
        }
        if !(self.radius.is_finite() && self.radius >= 0.0) {
            return Err(TreeError::invalid(
                "radius",
                format!("must be non-negative and finite, got {}", self.radius),
            ));
        }
        if !self.uv_offset.is_finite() {
            return Err(TreeError::invalid("uv_offset", "must be finite"));
        }
        if self.generations > MAX_GENERATIONS {
            return Err(TreeError::invalid(
                "generations",
                format!("must be at most {MAX_GENERATIONS}, got {}", self.generations),
            ));
        }
        Ok(())
    }
}

/// Radius scale at the start and end of a branch of the given generation.
///
/// The root starts at full radius; every generation ends where the next one
/// starts, and the last generation closes to a point. Generations grown past
/// the limit stay at zero.
pub fn taper_ratios(generation: u32, generations: u32) -> (f32, f32) {
    let span = generations as f32 + 1.0;
    let from = if generation == 0 {
        1.0
    } else {
        1.0 - generation as f32 / span
    };
    let to = 1.0 - (generation as f32 + 1.0) / span;
    (from.max(0.0), to.max(0.0))
}

#[derive(Debug, Clone)]
pub struct TreeBranch {
    pub generation: u32,
    pub generations: u32,
    pub length: f32,
    pub radius: f32,
    pub radius_segments: u32,
    pub height_segments: u32,
    pub rotation: Quat,
    pub uv_length: f32,
    pub uv_offset: f32,
    /// Start of the centerline.
    pub position: Vec3,
    /// End of the unbent centerline, `position + direction * length`.
    pub to: Vec3,
    /// Parent ring this branch is stitched to; `None` for the root.
    pub from: Option<TreeSegment>,
    pub segments: Vec<TreeSegment>,
    pub children: Vec<TreeBranch>,
}

impl TreeBranch {
    pub fn new<R: Rng>(params: BranchParams, rng: &mut R) -> Result<Self, TreeError> {
        params.validate()?;

        let rotation = params.rotation;
        if !rotation.is_finite() || rotation.length_squared() < 1e-6 {
            return Err(TreeError::DegenerateGeometry("branch rotation is not a rotation"));
        }
        let rotation = rotation.normalize();

        let direction = (rotation * Vec3::Y)
            .try_normalize()
            .ok_or(TreeError::DegenerateGeometry("branch direction has zero length"))?;

        let (position, from) = match params.from {
            BranchOrigin::Point(point) => (point, None),
            BranchOrigin::Segment(segment) => {
                let up = (segment.rotation * Vec3::Y).normalize_or_zero();
                (segment.position + up * ATTACHMENT_OFFSET, Some(segment))
            }
        };
        let to = position + direction * params.length;

        let mut branch = Self {
            generation: params.generation,
            generations: params.generations,
            length: params.length,
            radius: params.radius,
            radius_segments: params.radius_segments,
            height_segments: params.height_segments,
            rotation,
            uv_length: params.uv_length,
            uv_offset: params.uv_offset,
            position,
            to,
            from,
            segments: Vec::new(),
            children: Vec::new(),
        };
        branch.segments = branch.build_segments(direction, rng)?;
        Ok(branch)
    }

    fn build_segments<R: Rng>(
        &self,
        direction: Vec3,
        rng: &mut R,
    ) -> Result<Vec<TreeSegment>, TreeError> {
        let half = BEND_THETA * 0.5;
        let x = rng.random::<f32>() * BEND_THETA - half;
        let z = rng.random::<f32>() * BEND_THETA - half;
        let bent = (Quat::from_euler(EulerRot::XYZ, x, 0.0, z) * direction)
            .try_normalize()
            .ok_or(TreeError::DegenerateGeometry("bent direction has zero length"))?;

        // The middle control point leans off the straight line to `to`
        let control = self.position + bent * (self.length * 0.5);
        let curve = CatmullRomCurve::new(vec![self.position, control, self.to]);
        let points = curve.sample(self.height_segments);

        let (from_ratio, to_ratio) = taper_ratios(self.generation, self.generations);
        let from_radius = self.radius * from_ratio;
        let to_radius = self.radius * to_ratio;

        let mut uv_offset = self.uv_offset;
        if let Some(parent) = &self.from {
            uv_offset += parent.position.distance(points[0]) / self.uv_length;
        }

        let mut segments = Vec::with_capacity(points.len());
        segments.push(TreeSegment::new(
            points[0],
            self.rotation,
            uv_offset,
            from_radius,
            self.radius_segments,
        ));

        let steps = self.height_segments as f32;
        for i in 1..points.len() {
            let ry = i as f32 / steps;
            let radius = from_radius + (to_radius - from_radius) * ry;
            uv_offset += points[i - 1].distance(points[i]) / self.uv_length;

            segments.push(TreeSegment::new(
                points[i],
                self.rotation,
                uv_offset,
                radius,
                self.radius_segments,
            ));
        }

        Ok(segments)
    }

    /// Spawns `count` children (the first one an extension), then recurses
    /// into every child with `count - 1`.
    pub fn branch<R: Rng>(
        &mut self,
        spawner: &TreeSpawner,
        count: u32,
        rng: &mut R,
    ) -> Result<(), TreeError> {
        if count == 0 {
            return Ok(());
        }

        for i in 0..count {
            self.spawn(spawner, i == 0, rng)?;
        }

        for child in &mut self.children {
            child.branch(spawner, count - 1, rng)?;
        }
        Ok(())
    }

    /// Gives every leaf of this subtree one more extension.
    pub fn grow<R: Rng>(&mut self, spawner: &TreeSpawner, rng: &mut R) -> Result<(), TreeError> {
        if self.children.is_empty() {
            return self.branch(spawner, 1, rng);
        }
        for child in &mut self.children {
            child.grow(spawner, rng)?;
        }
        Ok(())
    }

    fn spawn<R: Rng>(
        &mut self,
        spawner: &TreeSpawner,
        extension: bool,
        rng: &mut R,
    ) -> Result<(), TreeError> {
        let child = spawner.spawn(self, extension, rng)?;
        trace!(
            "spawned generation {} {} (length {:.3})",
            child.generation,
            if extension { "extension" } else { "lateral" },
            child.length
        );
        self.children.push(child);
        Ok(())
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of branches in this subtree, this one included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(TreeBranch::count).sum::<usize>()
    }

    /// Deepest generation found in this subtree.
    pub fn depth(&self) -> u32 {
        self.children
            .iter()
            .map(TreeBranch::depth)
            .max()
            .unwrap_or(self.generation)
            .max(self.generation)
    }

    /// Polyline length through the ring centers.
    pub fn curve_length(&self) -> f32 {
        self.segments
            .windows(2)
            .map(|pair| pair[0].position.distance(pair[1].position))
            .sum()
    }

    /// Nested view of the subtree that stops at its leaves.
    pub fn branchlets(&self) -> Branchlet<'_> {
        if self.children.is_empty() {
            Branchlet::Leaf(self)
        } else {
            Branchlet::Node(self.children.iter().map(TreeBranch::branchlets).collect())
        }
    }

    /// Depth-first iterator over the leaves of this subtree.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves { stack: vec![self] }
    }

    /// Pre-order iterator over every branch of this subtree.
    pub fn iter(&self) -> Branches<'_> {
        Branches { stack: vec![self] }
    }
}

/// Leaf structure of a subtree, mirroring its nesting.
#[derive(Debug, Clone)]
pub enum Branchlet<'a> {
    Leaf(&'a TreeBranch),
    Node(Vec<Branchlet<'a>>),
}

pub struct Leaves<'a> {
    stack: Vec<&'a TreeBranch>,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = &'a TreeBranch;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(branch) = self.stack.pop() {
            if branch.children.is_empty() {
                return Some(branch);
            }
            self.stack.extend(branch.children.iter().rev());
        }
        None
    }
}

pub struct Branches<'a> {
    stack: Vec<&'a TreeBranch>,
}

impl<'a> Iterator for Branches<'a> {
    type Item = &'a TreeBranch;

    fn next(&mut self) -> Option<Self::Item> {
        let branch = self.stack.pop()?;
        self.stack.extend(branch.children.iter().rev());
        Some(branch)
    }
}
