//! Pointer interaction with the fabric.
//!
//! The [`Controller`] turns pointer and modifier input into particle
//! manipulation. Exactly one explicit [`Mode`] is active at a time:
//!
//! | Mode     | Entered by                  | Effect                                        | Left by            |
//! |----------|-----------------------------|-----------------------------------------------|--------------------|
//! | `Drag`   | press, no modifier          | grabbed particles follow the pointer          | release / leave    |
//! | `Sticky` | press with sticky modifier  | grabs accumulate and follow the pointer       | modifier released  |
//! | `Iron`   | press with iron modifier    | particles under the pointer snap to rest      | modifier released  |
//!
//! When no explicit mode is active, a moving pointer gently pushes nearby
//! particles away (ambient repel). Escape returns everything to `Idle`.
//!
//! Particles are referenced by index into the mesh's particle slice. A mesh
//! rebuild must be paired with [`Controller::reset`].

use glam::Vec2;

use crate::config::InteractionConfig;
use crate::mesh;
use crate::particle::Particle;

/// Share of the repel impulse written into the previous position.
const REPEL_DAMPING: f32 = 0.5;

/// Abstract modifier state.
///
/// The three flags are platform-neutral; which physical keys drive them is
/// decided by the host (see [`crate::input::ModifierBindings`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Modifier A: iron.
    pub iron: bool,
    /// Modifier B: repel.
    pub repel: bool,
    /// Modifier C: sticky.
    pub sticky: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        iron: false,
        repel: false,
        sticky: false,
    };
    pub const IRON: Modifiers = Modifiers {
        iron: true,
        ..Modifiers::NONE
    };
    pub const REPEL: Modifiers = Modifiers {
        repel: true,
        ..Modifiers::NONE
    };
    pub const STICKY: Modifiers = Modifiers {
        sticky: true,
        ..Modifiers::NONE
    };
}

/// A particle held at a fixed offset from the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grab {
    pub index: usize,
    pub offset: Vec2,
}

/// Explicit interaction mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Mode {
    #[default]
    Idle,
    /// Normal drag, lasts while the pointer is down.
    Drag { grabs: Vec<Grab> },
    /// Latched selection, lasts while the sticky modifier is held.
    Sticky { grabs: Vec<Grab> },
    /// Ironing, lasts while the iron modifier is held. `pressing` is true
    /// while the pointer is down and keeps collecting particles.
    Iron { ironed: Vec<usize>, pressing: bool },
}

impl Mode {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Idle => "idle",
            Mode::Drag { .. } => "drag",
            Mode::Sticky { .. } => "sticky",
            Mode::Iron { .. } => "iron",
        }
    }
}

/// Interaction state: current mode and pointer.
#[derive(Debug, Clone, Default)]
pub struct Controller {
    mode: Mode,
    repel_held: bool,
    pointer: Vec2,
    frame_start_pointer: Vec2,
    pointer_inside: bool,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    #[inline]
    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    /// Whether presses are currently consumed as repel gestures.
    #[inline]
    pub fn repel_held(&self) -> bool {
        self.repel_held
    }

    /// Whether Drag, Sticky or Iron is engaged. Ambient repel is suppressed
    /// while this is true.
    #[inline]
    pub fn is_active(&self) -> bool {
        !matches!(self.mode, Mode::Idle)
    }

    /// Pointer travel since the start of the frame.
    #[inline]
    pub fn pointer_speed(&self) -> f32 {
        self.pointer.distance(self.frame_start_pointer)
    }

    /// Pointer pressed at `pos`.
    pub fn pointer_down(
        &mut self,
        pos: Vec2,
        modifiers: Modifiers,
        particles: &mut [Particle],
        config: &InteractionConfig,
    ) {
        self.track_pointer(pos);
        self.repel_held = modifiers.repel;
        let radius = config.selection_radius;

        if modifiers.repel {
            return;
        }

        if modifiers.iron {
            let mut ironed = match std::mem::take(&mut self.mode) {
                Mode::Iron { ironed, .. } => ironed,
                _ => Vec::new(),
            };
            iron_under(particles, pos, radius, &mut ironed);
            self.mode = Mode::Iron {
                ironed,
                pressing: true,
            };
            return;
        }

        if modifiers.sticky {
            let mut grabs = match std::mem::take(&mut self.mode) {
                Mode::Sticky { grabs } => grabs,
                _ => Vec::new(),
            };
            for index in mesh::within(particles, pos, radius) {
                let p = &particles[index];
                if !p.pinned && grabs.iter().all(|g| g.index != index) {
                    grabs.push(Grab {
                        index,
                        offset: p.position - pos,
                    });
                }
            }
            self.mode = Mode::Sticky { grabs };
            return;
        }

        // Normal drag also picks up pinned particles.
        let grabs: Vec<Grab> = mesh::within(particles, pos, radius)
            .map(|index| Grab {
                index,
                offset: particles[index].position - pos,
            })
            .collect();

        if grabs.is_empty() {
            self.mode = Mode::Idle;
        } else {
            follow(particles, pos, &grabs);
            self.mode = Mode::Drag { grabs };
        }
    }

    /// Pointer moved to `pos`.
    pub fn pointer_move(
        &mut self,
        pos: Vec2,
        particles: &mut [Particle],
        config: &InteractionConfig,
    ) {
        self.track_pointer(pos);

        match &mut self.mode {
            Mode::Iron {
                ironed,
                pressing: true,
            } => iron_under(particles, pos, config.selection_radius, ironed),
            Mode::Sticky { grabs } | Mode::Drag { grabs } => follow(particles, pos, grabs),
            _ => {}
        }
    }

    /// Pointer released.
    pub fn pointer_up(&mut self) {
        match self.mode {
            Mode::Drag { .. } => self.mode = Mode::Idle,
            Mode::Iron {
                ref mut pressing, ..
            } => *pressing = false,
            _ => {}
        }
    }

    /// Pointer left the viewport. Behaves like a release, and the next move
    /// re-seeds the speed tracking so re-entry does not register as a jump.
    pub fn pointer_leave(&mut self) {
        self.pointer_up();
        self.pointer_inside = false;
    }

    /// Modifier state changed.
    pub fn modifiers_changed(&mut self, modifiers: Modifiers) {
        self.repel_held = modifiers.repel;

        let release = match self.mode {
            Mode::Iron { .. } => !modifiers.iron,
            Mode::Sticky { .. } => !modifiers.sticky,
            _ => false,
        };
        if release {
            log::debug!("{} released", self.mode.name());
            self.mode = Mode::Idle;
        }
    }

    /// Force every mode back to idle and drop all selections.
    pub fn escape(&mut self) {
        self.mode = Mode::Idle;
        self.repel_held = false;
    }

    /// Drop all state that refers to particle indices.
    pub fn reset(&mut self) {
        self.mode = Mode::Idle;
        self.repel_held = false;
        self.frame_start_pointer = self.pointer;
    }

    /// Whether particle `index` is held by the current mode.
    pub fn is_held(&self, index: usize) -> bool {
        match &self.mode {
            Mode::Idle => false,
            Mode::Drag { grabs } | Mode::Sticky { grabs } => grabs.iter().any(|g| g.index == index),
            Mode::Iron { ironed, .. } => ironed.contains(&index),
        }
    }

    /// Per-particle flags marking particles that must not be integrated.
    pub fn held_mask(&self, len: usize) -> Vec<bool> {
        let held: Vec<usize> = match &self.mode {
            Mode::Idle => Vec::new(),
            Mode::Drag { grabs } | Mode::Sticky { grabs } => grabs.iter().map(|g| g.index).collect(),
            Mode::Iron { ironed, .. } => ironed.clone(),
        };

        let mut mask = vec![false; len];
        for i in held {
            if let Some(m) = mask.get_mut(i) {
                *m = true;
            }
        }
        mask
    }

    /// Write held particles back onto their targets.
    pub fn pin_held(&self, particles: &mut [Particle]) {
        match &self.mode {
            Mode::Idle => {}
            Mode::Drag { grabs } | Mode::Sticky { grabs } => follow(particles, self.pointer, grabs),
            Mode::Iron { ironed, .. } => {
                for &i in ironed {
                    if let Some(p) = particles.get_mut(i) {
                        p.teleport(p.rest);
                    }
                }
            }
        }
    }

    /// Apply ambient repel if no explicit mode is engaged.
    ///
    /// Returns the number of particles pushed.
    pub fn apply_repel(&self, particles: &mut [Particle], config: &InteractionConfig) -> usize {
        if self.is_active() || !self.pointer_inside {
            return 0;
        }
        repel(particles, self.pointer, self.pointer_speed(), config)
    }

    /// Mark the end of a frame; pointer speed is measured from here.
    pub fn end_frame(&mut self) {
        self.frame_start_pointer = self.pointer;
    }

    fn track_pointer(&mut self, pos: Vec2) {
        if !self.pointer_inside {
            self.frame_start_pointer = pos;
            self.pointer_inside = true;
        }
        self.pointer = pos;
    }
}

/// Push free particles near `pointer` away from it.
///
/// Nothing happens unless `speed` exceeds the configured threshold. Each
/// particle strictly inside the selection radius gets an impulse that grows
/// with pointer speed (saturating at `repel_speed_scale`) and with proximity.
/// The impulse is injected by shifting the previous position, so it shows
/// up as velocity on the next integration.
pub fn repel(
    particles: &mut [Particle],
    pointer: Vec2,
    speed: f32,
    config: &InteractionConfig,
) -> usize {
    if speed <= config.repel_threshold {
        return 0;
    }

    let radius = config.selection_radius;
    let speed_factor = (speed / config.repel_speed_scale).min(1.0);
    let mut pushed = 0;

    for p in particles.iter_mut().filter(|p| !p.pinned) {
        let delta = p.position - pointer;
        let distance = delta.length();
        if distance <= 0.0 || distance >= radius {
            continue;
        }

        let force = config.repel_strength * speed_factor * (radius - distance) / radius;
        let direction = delta / distance;
        p.previous -= direction * force * REPEL_DAMPING;
        pushed += 1;
    }

    pushed
}

fn follow(particles: &mut [Particle], pointer: Vec2, grabs: &[Grab]) {
    for grab in grabs {
        if let Some(p) = particles.get_mut(grab.index) {
            p.teleport(pointer + grab.offset);
        }
    }
}

fn iron_under(particles: &mut [Particle], pointer: Vec2, radius: f32, ironed: &mut Vec<usize>) {
    let hits: Vec<usize> = mesh::within(particles, pointer, radius)
        .filter(|&index| !particles[index].pinned)
        .collect();
    for index in hits {
        if !ironed.contains(&index) {
            ironed.push(index);
        }
        let p = &mut particles[index];
        p.teleport(p.rest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;
    use crate::spring::DEFAULT_STRENGTH;

    fn mesh() -> Mesh {
        Mesh::new(5, 5, Vec2::splat(20.0), DEFAULT_STRENGTH)
    }

    fn config(radius: f32) -> InteractionConfig {
        let mut config = InteractionConfig::default();
        config.set_selection_radius(radius);
        config
    }

    #[test]
    fn test_selection_radius_is_inclusive() {
        let mut mesh = mesh();
        let mut ctl = Controller::new();
        let at = Vec2::new(40.0, 40.0);

        ctl.pointer_down(at, Modifiers::NONE, mesh.particles_mut(), &config(20.0));
        let grabbed = match ctl.mode() {
            Mode::Drag { grabs } => grabs.len(),
            _ => 0,
        };
        assert_eq!(grabbed, mesh.within(at, 20.0).count());
        assert_eq!(grabbed, 5);
    }

    #[test]
    fn test_drag_grabs_and_follows() {
        let mut mesh = mesh();
        let mut ctl = Controller::new();
        let cfg = config(10.0);
        let center = mesh.index(2, 2).unwrap();

        ctl.pointer_down(Vec2::new(42.0, 40.0), Modifiers::NONE, mesh.particles_mut(), &cfg);
        assert!(matches!(ctl.mode(), Mode::Drag { grabs } if grabs.len() == 1));
        assert!(ctl.is_held(center));

        ctl.pointer_move(Vec2::new(52.0, 45.0), mesh.particles_mut(), &cfg);
        assert_eq!(mesh.particles()[center].position, Vec2::new(50.0, 45.0));
        assert_eq!(mesh.particles()[center].velocity(), Vec2::ZERO);

        ctl.pointer_up();
        assert_eq!(ctl.mode(), &Mode::Idle);
        assert!(!ctl.is_held(center));
    }

    #[test]
    fn test_drag_may_move_pinned() {
        let mut mesh = mesh();
        let mut ctl = Controller::new();
        let cfg = config(10.0);

        ctl.pointer_down(Vec2::ZERO, Modifiers::NONE, mesh.particles_mut(), &cfg);
        ctl.pointer_move(Vec2::new(5.0, 5.0), mesh.particles_mut(), &cfg);

        assert!(mesh.particles()[0].pinned);
        assert_eq!(mesh.particles()[0].position, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn test_drag_on_empty_space_stays_idle() {
        let mut mesh = mesh();
        let mut ctl = Controller::new();
        ctl.pointer_down(Vec2::new(500.0, 500.0), Modifiers::NONE, mesh.particles_mut(), &config(10.0));
        assert_eq!(ctl.mode(), &Mode::Idle);
    }

    #[test]
    fn test_iron_snaps_and_releases() {
        let mut mesh = mesh();
        let mut ctl = Controller::new();
        let cfg = config(10.0);
        let center = mesh.index(2, 2).unwrap();
        mesh.particles_mut()[center].position += Vec2::new(3.0, 4.0);

        ctl.pointer_down(Vec2::new(40.0, 40.0), Modifiers::IRON, mesh.particles_mut(), &cfg);
        assert!(ctl.is_held(center));
        assert_eq!(mesh.particles()[center].position, mesh.particles()[center].rest);

        // Releasing the pointer keeps ironing while the modifier is held.
        ctl.pointer_up();
        assert!(matches!(ctl.mode(), Mode::Iron { pressing: false, .. }));
        assert!(ctl.is_held(center));

        ctl.modifiers_changed(Modifiers::NONE);
        assert_eq!(ctl.mode(), &Mode::Idle);
        assert!(ctl.held_mask(mesh.particles().len()).iter().all(|h| !h));
        assert_eq!(mesh.particles()[center].position, mesh.particles()[center].rest);
    }

    #[test]
    fn test_iron_skips_pinned_and_extends_while_pressing() {
        let mut mesh = mesh();
        let mut ctl = Controller::new();
        let cfg = config(10.0);

        ctl.pointer_down(Vec2::ZERO, Modifiers::IRON, mesh.particles_mut(), &cfg);
        assert!(matches!(ctl.mode(), Mode::Iron { ironed, .. } if ironed.is_empty()));

        ctl.pointer_move(Vec2::new(20.0, 20.0), mesh.particles_mut(), &cfg);
        assert!(ctl.is_held(mesh.index(1, 1).unwrap()));

        ctl.pointer_up();
        ctl.pointer_move(Vec2::new(40.0, 40.0), mesh.particles_mut(), &cfg);
        assert!(!ctl.is_held(mesh.index(2, 2).unwrap()));
    }

    #[test]
    fn test_sticky_accumulates_until_modifier_released() {
        let mut mesh = mesh();
        let mut ctl = Controller::new();
        let cfg = config(10.0);

        ctl.pointer_down(Vec2::new(20.0, 20.0), Modifiers::STICKY, mesh.particles_mut(), &cfg);
        ctl.pointer_up();
        ctl.pointer_down(Vec2::new(40.0, 20.0), Modifiers::STICKY, mesh.particles_mut(), &cfg);
        ctl.pointer_up();

        match ctl.mode() {
            Mode::Sticky { grabs } => assert_eq!(grabs.len(), 2),
            other => panic!("expected sticky, got {:?}", other),
        }

        // Moving with the button up still drags the latched particles. Each
        // keeps the offset it had from the pointer when it was grabbed.
        ctl.pointer_move(Vec2::new(40.0, 30.0), mesh.particles_mut(), &cfg);
        assert_eq!(mesh.particles()[mesh.index(2, 1).unwrap()].position, Vec2::new(40.0, 30.0));
        assert_eq!(mesh.particles()[mesh.index(1, 1).unwrap()].position, Vec2::new(40.0, 30.0));

        ctl.modifiers_changed(Modifiers::NONE);
        assert_eq!(ctl.mode(), &Mode::Idle);
    }

    #[test]
    fn test_repel_press_does_not_grab() {
        let mut mesh = mesh();
        let mut ctl = Controller::new();
        ctl.pointer_down(Vec2::new(40.0, 40.0), Modifiers::REPEL, mesh.particles_mut(), &config(50.0));
        assert_eq!(ctl.mode(), &Mode::Idle);
        assert!(ctl.repel_held());
    }

    #[test]
    fn test_modes_are_exclusive() {
        let mut mesh = mesh();
        let mut ctl = Controller::new();
        let cfg = config(10.0);

        ctl.pointer_down(Vec2::new(20.0, 20.0), Modifiers::STICKY, mesh.particles_mut(), &cfg);
        ctl.pointer_down(Vec2::new(40.0, 40.0), Modifiers::IRON, mesh.particles_mut(), &cfg);

        assert!(matches!(ctl.mode(), Mode::Iron { .. }));
        assert!(!ctl.is_held(mesh.index(1, 1).unwrap()));
    }

    #[test]
    fn test_escape_clears_everything() {
        let mut mesh = mesh();
        let mut ctl = Controller::new();
        ctl.pointer_down(Vec2::new(40.0, 40.0), Modifiers::IRON, mesh.particles_mut(), &config(30.0));
        ctl.modifiers_changed(Modifiers { iron: true, repel: true, sticky: false });

        ctl.escape();

        assert_eq!(ctl.mode(), &Mode::Idle);
        assert!(!ctl.repel_held());
        assert!(!ctl.is_active());
    }

    #[test]
    fn test_repel_pushes_away_from_pointer() {
        let mut mesh = Mesh::new(3, 3, Vec2::splat(10.0), DEFAULT_STRENGTH);
        let center = mesh.index(1, 1).unwrap();
        let cfg = InteractionConfig::default();

        let pushed = repel(mesh.particles_mut(), Vec2::new(5.0, 10.0), 20.0, &cfg);
        assert_eq!(pushed, 1);

        let p = mesh.particles()[center];
        assert!(p.previous.x < p.position.x);
        assert_eq!(p.previous.y, p.position.y);

        let mut moved = p;
        moved.integrate(&crate::config::PhysicsConfig::default());
        assert!(moved.position.x > p.position.x);
    }

    #[test]
    fn test_repel_below_threshold_is_noop() {
        let mut mesh = Mesh::new(3, 3, Vec2::splat(10.0), DEFAULT_STRENGTH);
        let before = mesh.particles().to_vec();
        let cfg = InteractionConfig::default();

        assert_eq!(repel(mesh.particles_mut(), Vec2::new(5.0, 10.0), 0.5, &cfg), 0);
        assert_eq!(mesh.particles(), &before[..]);
    }

    #[test]
    fn test_ambient_repel_uses_frame_speed_and_is_suppressed() {
        let mut mesh = Mesh::new(3, 3, Vec2::splat(10.0), DEFAULT_STRENGTH);
        let cfg = InteractionConfig::default();
        let mut ctl = Controller::new();

        ctl.pointer_move(Vec2::new(0.0, 10.0), mesh.particles_mut(), &cfg);
        ctl.pointer_move(Vec2::new(5.0, 10.0), mesh.particles_mut(), &cfg);
        assert_eq!(ctl.pointer_speed(), 5.0);
        assert_eq!(ctl.apply_repel(mesh.particles_mut(), &cfg), 1);

        ctl.end_frame();
        assert_eq!(ctl.pointer_speed(), 0.0);
        assert_eq!(ctl.apply_repel(mesh.particles_mut(), &cfg), 0);

        ctl.pointer_down(Vec2::new(5.0, 10.0), Modifiers::STICKY, mesh.particles_mut(), &cfg);
        ctl.pointer_move(Vec2::new(15.0, 10.0), mesh.particles_mut(), &cfg);
        assert_eq!(ctl.apply_repel(mesh.particles_mut(), &cfg), 0);
    }

    #[test]
    fn test_reenter_does_not_register_jump() {
        let mut mesh = mesh();
        let cfg = config(10.0);
        let mut ctl = Controller::new();

        ctl.pointer_move(Vec2::new(0.0, 0.0), mesh.particles_mut(), &cfg);
        ctl.end_frame();
        ctl.pointer_leave();
        ctl.pointer_move(Vec2::new(80.0, 80.0), mesh.particles_mut(), &cfg);

        assert_eq!(ctl.pointer_speed(), 0.0);
    }

    #[test]
    fn test_held_mask_ignores_out_of_range() {
        let mut mesh = mesh();
        let mut ctl = Controller::new();
        ctl.pointer_down(Vec2::new(40.0, 40.0), Modifiers::NONE, mesh.particles_mut(), &config(10.0));

        let mask = ctl.held_mask(3);
        assert_eq!(mask, vec![false; 3]);
    }
}
