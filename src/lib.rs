//! # weave - interactive cloth sandbox
//!
//! A rectangular fabric of point masses joined by springs, simulated with
//! position-based Verlet integration and pushed around with the mouse.
//!
//! weave keeps the simulation core free of any window or GPU code: a
//! [`Fabric`] steps the mesh and exposes a [`FrameData`] snapshot per
//! frame. The windowed sandbox ([`run`]) feeds winit input into the fabric and
//! draws the snapshot with wgpu.
//!
//! ## Quick Start
//!
//! ```ignore
//! use weave::prelude::*;
//!
//! fn main() -> Result<(), RunError> {
//!     env_logger::init();
//!     weave::run(FabricConfig::default())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Particles and springs
//!
//! A [`Particle`] stores its current and previous position; velocity is the
//! difference of the two. A [`Spring`] joins two particles by index and
//! nudges them back toward its rest length each relaxation pass. Border
//! particles of the [`Mesh`] are pinned and never move.
//!
//! ### Interaction
//!
//! The [`Controller`] is a small state machine over the pointer and three
//! modifiers:
//!
//! | Modifier | Mode |
//! |----------|------|
//! | none | drag: grab particles near the pointer until release |
//! | sticky | grab and keep adding particles, even after release |
//! | iron | flatten particles back to rest under the pointer |
//! | repel | no grab; moving the pointer pushes the fabric away |
//!
//! ### Frame loop
//!
//! Every [`Fabric::step`] re-pins held particles, applies ambient repel,
//! relaxes springs and integrates the remaining free particles.
//!
//! ```
//! use weave::prelude::*;
//!
//! let mut fabric = Fabric::new(FabricConfig::default(), 200.0, 120.0);
//! for _ in 0..60 {
//!     fabric.step();
//! }
//! assert!(fabric.mesh().particles().iter().all(|p| p.position.is_finite()));
//! ```
//!
//! ### Impressions
//!
//! An [`Impression`] presses an image into the fabric: darker pixels push
//! their particle further down, and the result becomes the rest shape.

pub mod config;
pub mod error;
pub mod frame;
mod gpu;
pub mod impression;
pub mod input;
pub mod interaction;
pub mod mesh;
pub mod particle;
mod simulation;
pub mod spring;
pub mod time;
pub mod visuals;
mod window;

pub use config::{FabricConfig, InteractionConfig, PhysicsConfig};
pub use error::{ConfigError, GpuError, ImpressionError, RunError};
pub use frame::{FrameData, LineVertex, ParticleVertex};
pub use glam::Vec2;
pub use impression::{DepthMap, Impression};
pub use input::{Input, InputEvent, ModifierBindings, ModifierKey};
pub use interaction::{Controller, Grab, Mode, Modifiers};
pub use mesh::Mesh;
pub use particle::Particle;
pub use simulation::{Action, Fabric};
pub use spring::Spring;
pub use visuals::{Gradient, VisualConfig};
pub use window::{run, run_with_image};

/// Convenient re-exports for common usage.
///
/// ```
/// use weave::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{FabricConfig, InteractionConfig, PhysicsConfig};
    pub use crate::error::RunError;
    pub use crate::frame::FrameData;
    pub use crate::impression::Impression;
    pub use crate::interaction::{Mode, Modifiers};
    pub use crate::mesh::Mesh;
    pub use crate::particle::Particle;
    pub use crate::simulation::{Action, Fabric};
    pub use crate::visuals::{Gradient, VisualConfig};
    pub use crate::Vec2;
}
