//! Tree orchestration: settings with defaults, the root branch and the
//! recursive spawning passes.

use bevy::log::debug;
use bevy::math::{EulerRot, Mat4, Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::branch::{BranchOrigin, BranchParams, Branchlet, TreeBranch};
use crate::error::TreeError;
use crate::spawner::TreeSpawner;

/// Initial orientation of the root branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TreeRotation {
    /// Euler angles in radians, applied in XYZ order.
    Euler(Vec3),
    /// Any affine matrix; only its rotation part is used.
    Matrix(Mat4),
    Quat(Quat),
}

impl Default for TreeRotation {
    fn default() -> Self {
        TreeRotation::Quat(Quat::IDENTITY)
    }
}

impl TreeRotation {
    pub fn resolve(&self) -> Result<Quat, TreeError> {
        let rotation = match *self {
            TreeRotation::Euler(angles) => {
                Quat::from_euler(EulerRot::XYZ, angles.x, angles.y, angles.z)
            }
            TreeRotation::Matrix(matrix) => {
                if !matrix.is_finite() || matrix.determinant().abs() < 1e-12 {
                    return Err(TreeError::DegenerateGeometry("rotation matrix is singular"));
                }
                let (_, rotation, _) = matrix.to_scale_rotation_translation();
                rotation
            }
            TreeRotation::Quat(quat) => quat,
        };

        if !rotation.is_finite() || rotation.length_squared() < 1e-6 {
            return Err(TreeError::DegenerateGeometry("rotation is not finite"));
        }
        Ok(rotation.normalize())
    }
}

/// Options for growing a [`Tree`]. Every field has a default.
#[derive(Debug, Clone)]
pub struct TreeSettings {
    /// Spawning depth below the root.
    pub generations: u32,
    /// Root branch length.
    pub length: f32,
    /// Distance along the bark covered by one texture repeat.
    pub uv_length: f32,
    /// Root radius.
    pub radius: f32,
    /// Vertices around each ring (before the closing duplicate).
    pub radius_segments: u32,
    /// Ring intervals along each branch.
    pub height_segments: u32,
    pub origin: BranchOrigin,
    pub rotation: TreeRotation,
    pub uv_offset: f32,
    /// Generation of the root, normally 0.
    pub generation: u32,
    pub spawner: TreeSpawner,
    /// Seed for the shape. `None` draws a fresh one from the thread RNG.
    pub seed: Option<u64>,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            generations: 5,
            length: 3.0,
            uv_length: 10.0,
            radius: 0.1,
            radius_segments: 8,
            height_segments: 8,
            origin: BranchOrigin::default(),
            rotation: TreeRotation::default(),
            uv_offset: 0.0,
            generation: 0,
            spawner: TreeSpawner::default(),
            seed: None,
        }
    }
}

impl TreeSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_generations(mut self, generations: u32) -> Self {
        self.generations = generations;
        self
    }

    pub fn with_length(mut self, length: f32) -> Self {
        self.length = length;
        self
    }

    pub fn with_uv_length(mut self, uv_length: f32) -> Self {
        self.uv_length = uv_length;
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_radius_segments(mut self, radius_segments: u32) -> Self {
        self.radius_segments = radius_segments;
        self
    }

    pub fn with_height_segments(mut self, height_segments: u32) -> Self {
        self.height_segments = height_segments;
        self
    }

    pub fn with_origin(mut self, origin: BranchOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_rotation(mut self, rotation: TreeRotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_uv_offset(mut self, uv_offset: f32) -> Self {
        self.uv_offset = uv_offset;
        self
    }

    pub fn with_generation(mut self, generation: u32) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_spawner(mut self, spawner: TreeSpawner) -> Self {
        self.spawner = spawner;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks every setting without building anything.
    pub fn validate(&self) -> Result<(), TreeError> {
        self.root_params(Quat::IDENTITY).validate()?;
        if self.generation > self.generations {
            return Err(TreeError::invalid(
                "generation",
                format!(
                    "{} exceeds the generation limit {}",
                    self.generation, self.generations
                ),
            ));
        }
        self.spawner.validate()?;
        self.rotation.resolve()?;
        Ok(())
    }

    fn root_params(&self, rotation: Quat) -> BranchParams {
        BranchParams {
            length: self.length,
            radius: self.radius,
            radius_segments: self.radius_segments,
            height_segments: self.height_segments,
            generation: self.generation,
            generations: self.generations,
            uv_length: self.uv_length,
            uv_offset: self.uv_offset,
            rotation,
            from: self.origin.clone(),
        }
    }
}

/// A fully grown tree. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct Tree {
    settings: TreeSettings,
    root: TreeBranch,
    spawner: TreeSpawner,
    growth: u32,
}

impl Tree {
    /// Grows a tree, seeding a [`Pcg64`] from `settings.seed` when present.
    pub fn new(settings: TreeSettings) -> Result<Self, TreeError> {
        let mut rng = match settings.seed {
            Some(seed) => Pcg64::seed_from_u64(seed),
            None => Pcg64::from_rng(&mut rand::rng()),
        };
        Self::with_rng(settings, &mut rng)
    }

    /// Grows a tree drawing every random choice from `rng`.
    pub fn with_rng<R: Rng>(settings: TreeSettings, rng: &mut R) -> Result<Self, TreeError> {
        settings.validate()?;

        let rotation = settings.rotation.resolve()?;
        let spawner = settings.spawner.clone();

        let mut root = TreeBranch::new(settings.root_params(rotation), rng)?;
        root.branch(&spawner, settings.generations - settings.generation, rng)?;

        let mut tree = Self {
            settings,
            root,
            spawner,
            growth: 0,
        };
        tree.grow();

        debug!(
            "grew tree: {} branches, depth {}, seed {:?}",
            tree.root.count(),
            tree.root.depth(),
            tree.settings.seed
        );
        Ok(tree)
    }

    // Counter only; `TreeBranch::grow` extends the leaves on request.
    fn grow(&mut self) {
        self.growth += 1;
    }

    pub fn root(&self) -> &TreeBranch {
        &self.root
    }

    pub fn settings(&self) -> &TreeSettings {
        &self.settings
    }

    pub fn spawner(&self) -> &TreeSpawner {
        &self.spawner
    }

    pub fn generations(&self) -> u32 {
        self.settings.generations
    }

    /// Number of growth steps recorded after spawning.
    pub fn growth(&self) -> u32 {
        self.growth
    }

    pub fn branchlets(&self) -> Branchlet<'_> {
        self.root.branchlets()
    }
}
