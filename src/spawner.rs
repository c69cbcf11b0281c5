//! Stochastic policy that grows a child branch out of a parent.

use std::f32::consts::PI;

use bevy::math::{EulerRot, Quat, Vec2};
use rand::Rng;

use crate::branch::{BranchOrigin, BranchParams, TreeBranch};
use crate::error::TreeError;

/// Decides where a child attaches, how it leans and how long it is.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeSpawner {
    /// Full angular spread of the child's lean, in radians.
    pub theta: f32,
    /// Child length as a fraction of the parent length.
    pub attenuation: f32,
    /// Fraction range along the parent rings where lateral children attach.
    pub root_range: Vec2,
}

impl Default for TreeSpawner {
    fn default() -> Self {
        Self {
            theta: PI * 0.5,
            attenuation: 0.75,
            root_range: Vec2::new(0.75, 1.0),
        }
    }
}

impl TreeSpawner {
    pub fn new(theta: f32, attenuation: f32, root_range: Vec2) -> Self {
        Self {
            theta,
            attenuation,
            root_range,
        }
    }

    pub fn with_theta(mut self, theta: f32) -> Self {
        self.theta = theta;
        self
    }

    pub fn with_attenuation(mut self, attenuation: f32) -> Self {
        self.attenuation = attenuation;
        self
    }

    pub fn with_root_range(mut self, start: f32, end: f32) -> Self {
        self.root_range = Vec2::new(start, end);
        self
    }

    pub fn validate(&self) -> Result<(), TreeError> {
        if !self.theta.is_finite() {
            return Err(TreeError::invalid("spawner.theta", "must be finite"));
        }
        if !(self.attenuation.is_finite() && self.attenuation > 0.0) {
            return Err(TreeError::invalid(
                "spawner.attenuation",
                format!("must be positive and finite, got {}", self.attenuation),
            ));
        }
        let (start, end) = (self.root_range.x, self.root_range.y);
        if !(0.0..=1.0).contains(&start) || !(0.0..=1.0).contains(&end) || start > end {
            return Err(TreeError::invalid(
                "spawner.root_range",
                format!("expected 0 <= start <= end <= 1, got ({start}, {end})"),
            ));
        }
        Ok(())
    }

    /// Ring of `parent` a new child attaches to.
    ///
    /// Extensions continue from the last ring; lateral children pick a ring
    /// inside `root_range`.
    pub fn attachment_index<R: Rng>(
        &self,
        parent: &TreeBranch,
        extension: bool,
        rng: &mut R,
    ) -> usize {
        let last = parent.segments.len().saturating_sub(1);
        if extension {
            return last;
        }
        let (start, end) = (self.root_range.x, self.root_range.y);
        let fraction = rng.random::<f32>() * (end - start) + start;
        ((fraction * parent.segments.len() as f32).floor() as usize).min(last)
    }

    pub fn spawn<R: Rng>(
        &self,
        parent: &TreeBranch,
        extension: bool,
        rng: &mut R,
    ) -> Result<TreeBranch, TreeError> {
        let half = self.theta * 0.5;
        let x = rng.random::<f32>() * self.theta - half;
        let z = rng.random::<f32>() * self.theta - half;
        let index = self.attachment_index(parent, extension, rng);

        let segment = parent
            .segments
            .get(index)
            .cloned()
            .ok_or(TreeError::DegenerateGeometry("parent branch has no rings"))?;

        let rotation = Quat::from_euler(EulerRot::XYZ, x, 0.0, z) * parent.rotation;

        TreeBranch::new(
            BranchParams {
                length: parent.length * self.attenuation,
                radius: parent.radius,
                radius_segments: parent.radius_segments,
                height_segments: parent.height_segments,
                generation: parent.generation + 1,
                generations: parent.generations,
                uv_length: parent.uv_length,
                uv_offset: segment.uv_offset,
                rotation,
                from: BranchOrigin::Segment(segment),
            },
            rng,
        )
    }
}
