use std::sync::OnceLock;

use bevy::math::Vec3;
use bevy::prelude::Mesh;
use rand::Rng;

use crate::error::TreeError;
use crate::mesher::{MeshData, TreeMeshBuilder};
use crate::points::{branch_points, ring_centers};
use crate::tree::{Tree, TreeSettings};

/// A grown tree together with its mesh and branch tip points.
#[derive(Debug, Clone)]
pub struct TreeGeometry {
    tree: Tree,
    mesh: MeshData,
    branch_ends: Vec<Vec3>,
    ring_centers: OnceLock<Vec<Vec3>>,
}

impl TreeGeometry {
    pub fn new(settings: TreeSettings) -> Result<Self, TreeError> {
        Self::from_tree(Tree::new(settings)?)
    }

    pub fn with_rng<R: Rng>(settings: TreeSettings, rng: &mut R) -> Result<Self, TreeError> {
        Self::from_tree(Tree::with_rng(settings, rng)?)
    }

    pub fn from_tree(tree: Tree) -> Result<Self, TreeError> {
        let branch_ends = branch_points(tree.root(), tree.generations());
        let mesh = TreeMeshBuilder::new().build(tree.root())?;
        Ok(Self {
            tree,
            mesh,
            branch_ends,
            ring_centers: OnceLock::new(),
        })
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn mesh_data(&self) -> &MeshData {
        &self.mesh
    }

    pub fn branch_ends(&self) -> &[Vec3] {
        &self.branch_ends
    }

    /// Ring centroids sorted by height, computed on first use.
    pub fn ring_centers(&self, skip: usize) -> &[Vec3] {
        let centers = self
            .ring_centers
            .get_or_init(|| ring_centers(self.tree.root(), 0));
        &centers[skip.min(centers.len())..]
    }

    pub fn to_mesh(&self) -> Mesh {
        self.mesh.to_mesh()
    }
}
