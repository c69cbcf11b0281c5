//! Procedural branching tree meshes for Bevy.
//!
//! A [`Tree`] grows from a root [`TreeBranch`]: every branch is a tapered tube
//! along a bent Catmull-Rom curve, sampled into rings ([`TreeSegment`]), and a
//! [`TreeSpawner`] decides where children attach and how they lean. The
//! [`TreeMeshBuilder`] then stitches the whole tree into one closed triangle
//! mesh with continuous bark UVs.
//!
//! # Features
//!
//! - **Generation**: seedable, reproducible growth via [`TreeSettings::with_seed`]
//!   or any caller-supplied [`rand::Rng`] through [`Tree::with_rng`].
//! - **Mesh assembly**: flat buffers ([`MeshData`]) with normals and two UV
//!   channels, convertible to a Bevy [`Mesh`](bevy::prelude::Mesh).
//! - **Tooling points**: branch tips and ring centers via [`points`].
//! - **Export**: OBJ and GLB export utilities via `export`. Enabled by the
//!   default `export` feature.
//! - **Physics colliders** (optional): capsule colliders along every branch via
//!   [`ColliderGenerator`]. Requires the `physics` feature.
//!
//! # Example
//!
//! ```ignore
//! use bevy::prelude::*;
//! use bevy_arbor::{TreeGeometry, TreeSettings};
//!
//! fn spawn_tree(
//!     mut commands: Commands,
//!     mut meshes: ResMut<Assets<Mesh>>,
//!     mut materials: ResMut<Assets<StandardMaterial>>,
//! ) {
//!     let settings = TreeSettings::new()
//!         .with_generations(5)
//!         .with_length(12.0)
//!         .with_radius(0.9)
//!         .with_seed(7);
//!     let Ok(geometry) = TreeGeometry::new(settings) else {
//!         return;
//!     };
//!
//!     commands.spawn((
//!         Mesh3d(meshes.add(geometry.to_mesh())),
//!         MeshMaterial3d(materials.add(Color::srgb(0.4, 0.3, 0.2))),
//!     ));
//! }
//! ```

pub mod branch;
pub mod curve;
pub mod error;
#[cfg(feature = "export")]
pub mod export;
pub mod geometry;
pub mod mesher;
pub mod points;
pub mod segment;
pub mod spawner;
pub mod tree;

#[cfg(feature = "physics")]
pub mod collider;

pub use branch::{BranchOrigin, BranchParams, Branchlet, TreeBranch, taper_ratios};
pub use error::TreeError;
pub use geometry::TreeGeometry;
pub use mesher::{MeshData, TreeMeshBuilder};
pub use segment::TreeSegment;
pub use spawner::TreeSpawner;
pub use tree::{Tree, TreeRotation, TreeSettings};

#[cfg(feature = "physics")]
pub use collider::{ColliderGenerator, PositionedCollider};
