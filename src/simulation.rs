//! The simulation context.
//!
//! [`Fabric`] owns everything a running sandbox needs (mesh, interaction
//! controller, configuration and the optional impression) and advances it
//! one frame per [`Fabric::step`]. Input handlers call into it between
//! frames; the next step picks their effects up.
//!
//! ```
//! use weave::prelude::*;
//!
//! let mut fabric = Fabric::new(FabricConfig::default(), 300.0, 150.0);
//! fabric.pointer_move(Vec2::new(150.0, 75.0));
//! fabric.pointer_down(Vec2::new(150.0, 75.0), Modifiers::NONE);
//! fabric.pointer_move(Vec2::new(160.0, 90.0));
//! fabric.step();
//! fabric.pointer_up();
//!
//! let frame = fabric.frame_data();
//! assert_eq!(frame.particles.len(), fabric.mesh().particles().len());
//! ```

use glam::Vec2;

use crate::config::{FabricConfig, SELECTION_RADIUS_STEP};
use crate::error::ImpressionError;
use crate::frame::FrameData;
use crate::impression::{self, Impression};
use crate::interaction::{Controller, Modifiers};
use crate::mesh::Mesh;
use crate::visuals::VisualConfig;

/// Discrete configuration commands, usually bound to keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Display the shortcut reference (handled by the host).
    ShowHelp,
    /// Release every interaction.
    Escape,
    ShrinkSelection,
    GrowSelection,
    ToggleDepthColoring,
    DecreaseMaxDepth,
    IncreaseMaxDepth,
    /// Return every free particle to rest.
    IronAll,
    ToggleLines,
    ToggleFill,
    GrowDots,
    ShrinkDots,
    ThinnerLines,
    ThickerLines,
    MoreOpaqueFill,
    LessOpaqueFill,
    DecreaseImpressionScale,
    IncreaseImpressionScale,
    /// Drop the impression and restore the flat grid.
    ClearImpression,
    NextGradient,
    PreviousGradient,
}

/// A running fabric simulation.
#[derive(Debug, Clone)]
pub struct Fabric {
    config: FabricConfig,
    mesh: Mesh,
    controller: Controller,
    impression: Option<Impression>,
    viewport: Vec2,
    frame: u64,
}

impl Fabric {
    /// Create a simulation whose mesh fills a `width × height` viewport.
    pub fn new(config: FabricConfig, width: f32, height: f32) -> Self {
        let config = config.validated();
        let mesh = Mesh::fit_viewport(
            width,
            height,
            config.grid_spacing,
            config.physics.spring_strength,
        );
        Self::with_mesh(config, mesh)
    }

    /// Create a simulation around a prebuilt mesh.
    pub fn with_mesh(config: FabricConfig, mesh: Mesh) -> Self {
        let spacing = mesh.spacing();
        let viewport = Vec2::new(
            spacing.x * (mesh.cols() - 1) as f32,
            spacing.y * (mesh.rows() - 1) as f32,
        );
        Self {
            config: config.validated(),
            mesh,
            controller: Controller::new(),
            impression: None,
            viewport,
            frame: 0,
        }
    }

    #[inline]
    pub fn config(&self) -> &FabricConfig {
        &self.config
    }

    /// Mutable configuration. Grid spacing and spring strength take effect
    /// at the next [`Fabric::resize`].
    #[inline]
    pub fn config_mut(&mut self) -> &mut FabricConfig {
        &mut self.config
    }

    #[inline]
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    #[inline]
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    #[inline]
    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Frames stepped since creation.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Whether an impression is currently pressed in.
    pub fn has_impression(&self) -> bool {
        self.impression.is_some()
    }

    /// Rebuild the mesh for a new viewport.
    ///
    /// All interaction state is dropped in the same call, so no selection
    /// can outlive the particles it refers to. An active impression is
    /// re-applied to the new grid.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.mesh = Mesh::fit_viewport(
            width,
            height,
            self.config.grid_spacing,
            self.config.physics.spring_strength,
        );
        self.controller.reset();
        self.viewport = Vec2::new(width, height);
        log::info!(
            "rebuilt {}x{} mesh for {}x{} viewport",
            self.mesh.cols(),
            self.mesh.rows(),
            width,
            height
        );

        let refit = match &mut self.impression {
            Some(impression) => impression.fit(&mut self.mesh, self.config.visuals.impression_scale),
            None => Ok(()),
        };
        if let Err(e) = refit {
            log::warn!("dropping impression after resize: {}", e);
            self.impression = None;
        }
    }

    /// Advance one frame.
    ///
    /// 1. held particles are written back onto their targets;
    /// 2. ambient repel, when no explicit mode is engaged;
    /// 3. spring relaxation, `physics.iterations` passes;
    /// 4. integration of every particle not held this frame.
    pub fn step(&mut self) {
        let particles = self.mesh.particles_mut();
        self.controller.pin_held(particles);
        self.controller.apply_repel(particles, &self.config.interaction);

        self.mesh.relax(self.config.physics.iterations);

        let held = self.controller.held_mask(self.mesh.particles().len());
        let physics = &self.config.physics;
        for (particle, held) in self.mesh.particles_mut().iter_mut().zip(held) {
            if !held {
                particle.integrate(physics);
            }
        }

        self.controller.end_frame();
        self.frame += 1;
    }

    /// Snapshot for rendering.
    pub fn frame_data(&self) -> FrameData {
        FrameData::capture(&self.mesh, &self.config.visuals)
    }

    pub fn pointer_down(&mut self, pos: Vec2, modifiers: Modifiers) {
        self.controller.pointer_down(
            pos,
            modifiers,
            self.mesh.particles_mut(),
            &self.config.interaction,
        );
        log::trace!("pointer down at {:?}: {}", pos, self.controller.mode().name());
    }

    pub fn pointer_move(&mut self, pos: Vec2) {
        self.controller
            .pointer_move(pos, self.mesh.particles_mut(), &self.config.interaction);
    }

    pub fn pointer_up(&mut self) {
        self.controller.pointer_up();
    }

    pub fn pointer_leave(&mut self) {
        self.controller.pointer_leave();
    }

    pub fn modifiers_changed(&mut self, modifiers: Modifiers) {
        self.controller.modifiers_changed(modifiers);
    }

    /// Release every interaction.
    pub fn escape(&mut self) {
        self.controller.escape();
    }

    /// Return every free particle to rest.
    pub fn iron_all(&mut self) {
        self.mesh.iron_all();
    }

    /// Press `impression` into the mesh, replacing any previous one.
    pub fn set_impression(&mut self, mut impression: Impression) -> Result<(), ImpressionError> {
        impression.fit(&mut self.mesh, self.config.visuals.impression_scale)?;
        log::info!(
            "applied {}x{} impression",
            impression.map().cols(),
            impression.map().rows()
        );
        self.impression = Some(impression);
        Ok(())
    }

    /// Drop the impression and make the flat grid the rest state again.
    pub fn clear_impression(&mut self) {
        self.impression = None;
        impression::clear(&mut self.mesh);
    }

    /// Change the impression depth (clamped) and re-press an active impression.
    pub fn set_impression_scale(&mut self, scale: f32) {
        self.config.visuals.set_impression_scale(scale);
        if let Some(impression) = &mut self.impression {
            if let Err(e) = impression.fit(&mut self.mesh, self.config.visuals.impression_scale) {
                log::warn!("failed to re-apply impression: {}", e);
            }
        }
    }

    /// Perform a configuration command. Returns `false` for actions the core
    /// does not handle ([`Action::ShowHelp`]).
    pub fn apply_action(&mut self, action: Action) -> bool {
        let visuals: &mut VisualConfig = &mut self.config.visuals;
        match action {
            Action::ShowHelp => return false,
            Action::Escape => self.escape(),
            Action::ShrinkSelection => {
                let r = self.config.interaction.selection_radius;
                self.config.interaction.set_selection_radius(r - SELECTION_RADIUS_STEP);
            }
            Action::GrowSelection => {
                let r = self.config.interaction.selection_radius;
                self.config.interaction.set_selection_radius(r + SELECTION_RADIUS_STEP);
            }
            Action::ToggleDepthColoring => visuals.depth_coloring = !visuals.depth_coloring,
            Action::DecreaseMaxDepth => {
                visuals.set_max_depth(visuals.max_depth - VisualConfig::MAX_DEPTH_STEP)
            }
            Action::IncreaseMaxDepth => {
                visuals.set_max_depth(visuals.max_depth + VisualConfig::MAX_DEPTH_STEP)
            }
            Action::IronAll => self.iron_all(),
            Action::ToggleLines => visuals.show_lines = !visuals.show_lines,
            Action::ToggleFill => visuals.show_fill = !visuals.show_fill,
            Action::GrowDots => visuals.set_dot_size(visuals.dot_size + VisualConfig::DOT_SIZE_STEP),
            Action::ShrinkDots => visuals.set_dot_size(visuals.dot_size - VisualConfig::DOT_SIZE_STEP),
            Action::ThinnerLines => {
                visuals.set_line_width(visuals.line_width - VisualConfig::LINE_WIDTH_STEP)
            }
            Action::ThickerLines => {
                visuals.set_line_width(visuals.line_width + VisualConfig::LINE_WIDTH_STEP)
            }
            Action::MoreOpaqueFill => {
                visuals.set_fill_opacity(visuals.fill_opacity + VisualConfig::FILL_OPACITY_STEP)
            }
            Action::LessOpaqueFill => {
                visuals.set_fill_opacity(visuals.fill_opacity - VisualConfig::FILL_OPACITY_STEP)
            }
            Action::DecreaseImpressionScale => {
                let scale = visuals.impression_scale - VisualConfig::IMPRESSION_SCALE_STEP;
                self.set_impression_scale(scale);
            }
            Action::IncreaseImpressionScale => {
                let scale = visuals.impression_scale + VisualConfig::IMPRESSION_SCALE_STEP;
                self.set_impression_scale(scale);
            }
            Action::ClearImpression => self.clear_impression(),
            Action::NextGradient | Action::PreviousGradient => {
                visuals.gradient = if action == Action::NextGradient {
                    visuals.gradient.next()
                } else {
                    visuals.gradient.previous()
                };
                log::info!("Switched to gradient: {}", visuals.gradient.name());
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::Mode;
    use crate::spring::DEFAULT_STRENGTH;
    use crate::visuals::Gradient;

    fn small() -> Fabric {
        Fabric::with_mesh(
            FabricConfig::default(),
            Mesh::new(5, 5, Vec2::splat(20.0), DEFAULT_STRENGTH),
        )
    }

    #[test]
    fn test_step_pulls_free_particles_down() {
        let mut fabric = small();
        let center = fabric.mesh().index(2, 2).unwrap();
        let y0 = fabric.mesh().particles()[center].position.y;

        fabric.step();

        let y1 = fabric.mesh().particles()[center].position.y;
        assert!(y1 > y0);
        assert_eq!(fabric.frame(), 1);
    }

    #[test]
    fn test_pinned_particles_survive_many_steps() {
        let mut fabric = small();
        let before = fabric.mesh().particles().to_vec();

        for _ in 0..200 {
            fabric.step();
        }

        for (p, b) in fabric.mesh().particles().iter().zip(&before) {
            if p.pinned {
                assert_eq!(p.position, b.position);
            }
            assert!(p.position.is_finite());
        }
    }

    #[test]
    fn test_held_particles_are_not_integrated() {
        let mut fabric = small();
        let center = fabric.mesh().index(2, 2).unwrap();

        fabric.pointer_move(Vec2::new(40.0, 40.0));
        fabric.pointer_down(Vec2::new(40.0, 40.0), Modifiers::NONE);
        for _ in 0..10 {
            fabric.step();
        }

        assert_eq!(fabric.mesh().particles()[center].position, Vec2::new(40.0, 40.0));
    }

    #[test]
    fn test_resize_rebuilds_and_clears_selection() {
        let mut fabric = small();
        fabric.pointer_down(Vec2::new(40.0, 40.0), Modifiers::STICKY);
        assert!(fabric.controller().is_active());

        fabric.resize(150.0, 90.0);

        assert_eq!(fabric.controller().mode(), &Mode::Idle);
        assert_eq!(fabric.mesh().cols(), 10);
        assert_eq!(fabric.mesh().rows(), 6);
        assert_eq!(fabric.viewport(), Vec2::new(150.0, 90.0));
        fabric.step();
    }

    #[test]
    fn test_actions_clamp() {
        let mut fabric = small();
        for _ in 0..50 {
            fabric.apply_action(Action::GrowSelection);
            fabric.apply_action(Action::ThickerLines);
            fabric.apply_action(Action::DecreaseMaxDepth);
        }
        let config = fabric.config();
        assert_eq!(config.interaction.selection_radius, 100.0);
        assert_eq!(config.visuals.line_width, 5.0);
        assert_eq!(config.visuals.max_depth, 20.0);

        for _ in 0..50 {
            fabric.apply_action(Action::ShrinkSelection);
        }
        assert_eq!(fabric.config().interaction.selection_radius, 10.0);
    }

    #[test]
    fn test_gradient_and_toggle_actions() {
        let mut fabric = small();
        assert!(fabric.apply_action(Action::NextGradient));
        assert_eq!(fabric.config().visuals.gradient, Gradient::Ocean);
        fabric.apply_action(Action::PreviousGradient);
        fabric.apply_action(Action::PreviousGradient);
        assert_eq!(fabric.config().visuals.gradient, Gradient::Monochrome);

        fabric.apply_action(Action::ToggleLines);
        assert!(fabric.frame_data().lines.is_empty());
        assert!(!fabric.apply_action(Action::ShowHelp));
    }

    #[test]
    fn test_iron_all_action_restores_rest() {
        let mut fabric = small();
        for _ in 0..30 {
            fabric.step();
        }
        fabric.apply_action(Action::IronAll);
        assert!(fabric
            .mesh()
            .particles()
            .iter()
            .all(|p| p.position == p.rest && p.velocity() == Vec2::ZERO));
    }
}
