//! Simulation configuration.
//!
//! Every tunable value lives in [`FabricConfig`]. Values are never rejected:
//! setters and [`FabricConfig::validated`] clamp them into range, so a
//! configuration file with out-of-range numbers still produces a working
//! simulation.
//!
//! # Example
//!
//! ```
//! use weave::config::FabricConfig;
//!
//! let config = FabricConfig::default()
//!     .with_selection_radius(500.0)
//!     .with_iterations(5);
//!
//! assert_eq!(config.interaction.selection_radius, 100.0);
//! assert_eq!(config.physics.iterations, 5);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::input::ModifierBindings;
use crate::visuals::VisualConfig;

/// Selection radius bounds, in viewport units.
pub const SELECTION_RADIUS_RANGE: (f32, f32) = (10.0, 100.0);
/// Step used by the radius shortcuts.
pub const SELECTION_RADIUS_STEP: f32 = 5.0;

/// Verlet integration and constraint parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration added each step, in units per step.
    pub gravity: f32,
    /// Velocity retained per step.
    pub damping: f32,
    /// Relaxation passes over all springs per frame.
    pub iterations: u32,
    /// Strength of newly built springs.
    pub spring_strength: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.05,
            damping: 0.99,
            iterations: 3,
            spring_strength: crate::spring::DEFAULT_STRENGTH,
        }
    }
}

impl PhysicsConfig {
    fn validated(mut self) -> Self {
        self.damping = self.damping.clamp(0.0, 1.0);
        self.iterations = self.iterations.clamp(1, 64);
        self.spring_strength = self.spring_strength.clamp(0.01, 1.0);
        self
    }
}

/// Pointer interaction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Radius around the pointer inside which particles are affected.
    pub selection_radius: f32,
    /// Peak impulse of the ambient repel effect.
    pub repel_strength: f32,
    /// Minimum pointer travel per frame before repel kicks in.
    pub repel_threshold: f32,
    /// Pointer speed at which repel reaches full strength.
    pub repel_speed_scale: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            selection_radius: 50.0,
            repel_strength: 7.0,
            repel_threshold: 0.5,
            repel_speed_scale: 10.0,
        }
    }
}

impl InteractionConfig {
    /// Set the selection radius, clamped to [`SELECTION_RADIUS_RANGE`].
    pub fn set_selection_radius(&mut self, radius: f32) {
        let (lo, hi) = SELECTION_RADIUS_RANGE;
        self.selection_radius = radius.clamp(lo, hi);
    }

    fn validated(mut self) -> Self {
        self.set_selection_radius(self.selection_radius);
        self.repel_strength = self.repel_strength.max(0.0);
        self.repel_threshold = self.repel_threshold.max(0.0);
        self.repel_speed_scale = self.repel_speed_scale.max(f32::EPSILON);
        self
    }
}

/// Complete configuration of a fabric simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FabricConfig {
    /// Integration and relaxation.
    pub physics: PhysicsConfig,
    /// Pointer interaction.
    pub interaction: InteractionConfig,
    /// Presentation of the frame snapshot.
    pub visuals: VisualConfig,
    /// Target distance between neighbouring grid particles when fitting
    /// the mesh to a viewport.
    pub grid_spacing: f32,
    /// Modifier keys selecting each interaction mode.
    pub bindings: ModifierBindings,
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            interaction: InteractionConfig::default(),
            visuals: VisualConfig::default(),
            grid_spacing: 15.0,
            bindings: ModifierBindings::default(),
        }
    }
}

impl FabricConfig {
    /// Read a JSON configuration file.
    ///
    /// Missing fields fall back to their defaults and every value is clamped.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Parse a JSON configuration string.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: FabricConfig = serde_json::from_str(text)?;
        Ok(config.validated())
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Clamp every field into its valid range.
    pub fn validated(self) -> Self {
        Self {
            physics: self.physics.validated(),
            interaction: self.interaction.validated(),
            visuals: self.visuals.validated(),
            grid_spacing: self.grid_spacing.max(1.0),
            bindings: self.bindings,
        }
    }

    /// Set the per-step gravity.
    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.physics.gravity = gravity;
        self
    }

    /// Set the damping factor.
    pub fn with_damping(mut self, damping: f32) -> Self {
        self.physics.damping = damping.clamp(0.0, 1.0);
        self
    }

    /// Set the number of relaxation passes per frame.
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.physics.iterations = iterations.max(1);
        self
    }

    /// Set the selection radius (clamped).
    pub fn with_selection_radius(mut self, radius: f32) -> Self {
        self.interaction.set_selection_radius(radius);
        self
    }

    /// Set the target grid spacing.
    pub fn with_grid_spacing(mut self, spacing: f32) -> Self {
        self.grid_spacing = spacing.max(1.0);
        self
    }

    /// Replace the visual configuration.
    pub fn with_visuals(mut self, visuals: VisualConfig) -> Self {
        self.visuals = visuals.validated();
        self
    }
}
