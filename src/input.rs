//! Input handling for the fabric sandbox.
//!
//! [`Input`] turns raw winit window events into [`InputEvent`]s the
//! simulation understands. It tracks the cursor, the pointer button, touch
//! contacts and the modifier keys, and maps key presses to [`Action`]s.
//! Positions are reported in logical pixels.
//!
//! Which physical modifier selects which interaction mode is configurable
//! through [`ModifierBindings`]:
//!
//! ```
//! use weave::input::{ModifierBindings, ModifierKey};
//! use winit::keyboard::ModifiersState;
//!
//! let bindings = ModifierBindings {
//!     iron: ModifierKey::Alt,
//!     repel: ModifierKey::Control,
//!     sticky: ModifierKey::Shift,
//! };
//! let m = bindings.resolve(ModifiersState::SHIFT);
//! assert!(m.sticky && !m.iron && !m.repel);
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, TouchPhase, WindowEvent};
use winit::keyboard::{Key, ModifiersState, NamedKey};

use crate::interaction::Modifiers;
use crate::simulation::{Action, Fabric};

/// A physical modifier key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierKey {
    Shift,
    Control,
    Alt,
    /// Command on macOS, the Windows key elsewhere.
    Super,
}

impl ModifierKey {
    /// Whether this key is down in `state`.
    pub fn is_down(self, state: ModifiersState) -> bool {
        match self {
            ModifierKey::Shift => state.shift_key(),
            ModifierKey::Control => state.control_key(),
            ModifierKey::Alt => state.alt_key(),
            ModifierKey::Super => state.super_key(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ModifierKey::Shift => "Shift",
            ModifierKey::Control => "Ctrl",
            ModifierKey::Alt => "Alt",
            ModifierKey::Super => {
                if cfg!(target_os = "macos") {
                    "Cmd"
                } else {
                    "Super"
                }
            }
        }
    }
}

/// Which modifier key selects each interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierBindings {
    pub iron: ModifierKey,
    pub repel: ModifierKey,
    pub sticky: ModifierKey,
}

impl Default for ModifierBindings {
    fn default() -> Self {
        let iron = if cfg!(target_os = "macos") {
            ModifierKey::Super
        } else {
            ModifierKey::Alt
        };
        Self {
            iron,
            repel: ModifierKey::Control,
            sticky: ModifierKey::Shift,
        }
    }
}

impl ModifierBindings {
    /// Translate physical modifier state into interaction modifiers.
    pub fn resolve(&self, state: ModifiersState) -> Modifiers {
        Modifiers {
            iron: self.iron.is_down(state),
            repel: self.repel.is_down(state),
            sticky: self.sticky.is_down(state),
        }
    }

    /// Shortcut reference text.
    pub fn help(&self) -> String {
        format!(
            "drag: grab and pull the fabric\n\
             {sticky}+drag: grab and keep adding (sticky)\n\
             {iron}+drag: iron the fabric flat\n\
             {repel}: push the fabric away from the cursor\n\
             Esc: release everything\n\
             q/w: selection radius  r/t: max depth  3: depth colouring\n\
             1: lines  2: fill  ,/.: fill opacity  [/]: line width  -/=: dot size\n\
             i: iron all  z/x: impression depth  c: clear impression\n\
             f/g: previous/next gradient  drop an image to press it in",
            sticky = self.sticky.name(),
            iron = self.iron.name(),
            repel = self.repel.name(),
        )
    }
}

/// Key bindings for a printable key.
pub fn actions_for_char(key: &str) -> &'static [Action] {
    match key {
        "," => &[Action::ShowHelp, Action::LessOpaqueFill],
        "." => &[Action::MoreOpaqueFill],
        "q" | "Q" => &[Action::ShrinkSelection],
        "w" | "W" => &[Action::GrowSelection],
        "3" => &[Action::ToggleDepthColoring],
        "r" | "R" => &[Action::DecreaseMaxDepth],
        "t" | "T" => &[Action::IncreaseMaxDepth],
        "i" | "I" => &[Action::IronAll],
        "1" => &[Action::ToggleLines],
        "2" => &[Action::ToggleFill],
        "=" | "+" => &[Action::GrowDots],
        "-" => &[Action::ShrinkDots],
        "[" => &[Action::ThinnerLines],
        "]" => &[Action::ThickerLines],
        "z" | "Z" => &[Action::DecreaseImpressionScale],
        "x" | "X" => &[Action::IncreaseImpressionScale],
        "c" | "C" => &[Action::ClearImpression],
        "g" | "G" => &[Action::NextGradient],
        "f" | "F" => &[Action::PreviousGradient],
        _ => &[],
    }
}

/// Key bindings for a logical key.
pub fn actions_for_key(key: &Key) -> &'static [Action] {
    match key {
        Key::Named(NamedKey::Escape) => &[Action::Escape],
        Key::Character(c) => actions_for_char(c.as_str()),
        _ => &[],
    }
}

/// Something the simulation should react to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown(Vec2, Modifiers),
    PointerMove(Vec2),
    PointerUp,
    PointerLeave,
    ModifiersChanged(Modifiers),
    Actions(&'static [Action]),
}

impl InputEvent {
    /// Forward the event to `fabric`. Returns `true` if help was requested.
    pub fn apply(self, fabric: &mut Fabric) -> bool {
        match self {
            InputEvent::PointerDown(pos, modifiers) => fabric.pointer_down(pos, modifiers),
            InputEvent::PointerMove(pos) => fabric.pointer_move(pos),
            InputEvent::PointerUp => fabric.pointer_up(),
            InputEvent::PointerLeave => fabric.pointer_leave(),
            InputEvent::ModifiersChanged(modifiers) => fabric.modifiers_changed(modifiers),
            InputEvent::Actions(actions) => {
                let mut help = false;
                for &action in actions {
                    help |= !fabric.apply_action(action);
                }
                return help;
            }
        }
        false
    }
}

/// Pointer and keyboard state tracking.
///
/// The first finger on a touchscreen drives the pointer; further contacts
/// are ignored until it lifts.
#[derive(Debug)]
pub struct Input {
    bindings: ModifierBindings,
    modifiers: ModifiersState,
    cursor: Option<Vec2>,
    pointer_held: bool,
    touch: Option<u64>,
    scale_factor: f64,
}

impl Default for Input {
    fn default() -> Self {
        Self::new(ModifierBindings::default())
    }
}

impl Input {
    pub fn new(bindings: ModifierBindings) -> Self {
        Self {
            bindings,
            modifiers: ModifiersState::empty(),
            cursor: None,
            pointer_held: false,
            touch: None,
            scale_factor: 1.0,
        }
    }

    /// Display scale used to turn physical event positions into logical ones.
    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        if scale_factor > 0.0 {
            self.scale_factor = scale_factor;
        }
    }

    pub fn bindings(&self) -> &ModifierBindings {
        &self.bindings
    }

    /// Last known cursor position, `None` while outside the window.
    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    pub fn pointer_held(&self) -> bool {
        self.pointer_held
    }

    /// Current interaction modifiers.
    pub fn modifiers(&self) -> Modifiers {
        self.bindings.resolve(self.modifiers)
    }

    /// Process a winit window event.
    pub fn handle_event(&mut self, event: &WindowEvent) -> Option<InputEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                Some(self.cursor_moved(self.to_logical(*position)))
            }
            WindowEvent::Touch(touch) => {
                self.touched(touch.id, touch.phase, self.to_logical(touch.location))
            }
            WindowEvent::CursorLeft { .. } => Some(self.cursor_left()),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => self.pointer_button(*state == ElementState::Pressed),
            WindowEvent::ModifiersChanged(modifiers) => {
                Some(self.modifiers_changed(modifiers.state()))
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                self.key_pressed(&event.logical_key)
            }
            _ => None,
        }
    }

    fn to_logical(&self, position: PhysicalPosition<f64>) -> Vec2 {
        let logical = position.to_logical::<f64>(self.scale_factor);
        Vec2::new(logical.x as f32, logical.y as f32)
    }

    /// A lifted finger leaves no hovering pointer behind, so the end of a
    /// touch is reported as [`InputEvent::PointerLeave`].
    pub(crate) fn touched(&mut self, id: u64, phase: TouchPhase, pos: Vec2) -> Option<InputEvent> {
        match phase {
            TouchPhase::Started => {
                if self.touch.is_some() {
                    return None;
                }
                self.touch = Some(id);
                self.cursor = Some(pos);
                self.pointer_held = true;
                Some(InputEvent::PointerDown(pos, self.modifiers()))
            }
            TouchPhase::Moved if self.touch == Some(id) => Some(self.cursor_moved(pos)),
            TouchPhase::Ended | TouchPhase::Cancelled if self.touch == Some(id) => {
                self.touch = None;
                Some(self.cursor_left())
            }
            _ => None,
        }
    }

    pub(crate) fn cursor_moved(&mut self, pos: Vec2) -> InputEvent {
        self.cursor = Some(pos);
        InputEvent::PointerMove(pos)
    }

    pub(crate) fn cursor_left(&mut self) -> InputEvent {
        self.cursor = None;
        self.pointer_held = false;
        InputEvent::PointerLeave
    }

    pub(crate) fn pointer_button(&mut self, pressed: bool) -> Option<InputEvent> {
        if pressed {
            let pos = self.cursor?;
            self.pointer_held = true;
            Some(InputEvent::PointerDown(pos, self.modifiers()))
        } else if self.pointer_held {
            self.pointer_held = false;
            Some(InputEvent::PointerUp)
        } else {
            None
        }
    }

    pub(crate) fn modifiers_changed(&mut self, state: ModifiersState) -> InputEvent {
        self.modifiers = state;
        InputEvent::ModifiersChanged(self.modifiers())
    }

    pub(crate) fn key_pressed(&mut self, key: &Key) -> Option<InputEvent> {
        let actions = actions_for_key(key);
        if actions.is_empty() {
            None
        } else {
            Some(InputEvent::Actions(actions))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::Mode;

    fn bindings() -> ModifierBindings {
        ModifierBindings {
            iron: ModifierKey::Alt,
            repel: ModifierKey::Control,
            sticky: ModifierKey::Shift,
        }
    }

    #[test]
    fn test_resolve_modifiers() {
        let b = bindings();
        assert_eq!(b.resolve(ModifiersState::empty()), Modifiers::NONE);
        assert_eq!(b.resolve(ModifiersState::ALT), Modifiers::IRON);
        assert_eq!(b.resolve(ModifiersState::CONTROL), Modifiers::REPEL);

        let both = b.resolve(ModifiersState::SHIFT | ModifiersState::CONTROL);
        assert!(both.sticky && both.repel && !both.iron);
    }

    #[test]
    fn test_key_map() {
        assert_eq!(actions_for_char("q"), &[Action::ShrinkSelection]);
        assert_eq!(actions_for_char("+"), actions_for_char("="));
        assert_eq!(actions_for_char(","), &[Action::ShowHelp, Action::LessOpaqueFill]);
        assert!(actions_for_char("y").is_empty());
        assert_eq!(actions_for_key(&Key::Named(NamedKey::Escape)), &[Action::Escape]);
        assert!(actions_for_key(&Key::Named(NamedKey::Tab)).is_empty());
    }

    #[test]
    fn test_pointer_needs_cursor() {
        let mut input = Input::new(bindings());
        assert_eq!(input.pointer_button(true), None);

        input.cursor_moved(Vec2::new(5.0, 6.0));
        input.modifiers_changed(ModifiersState::SHIFT);
        assert_eq!(
            input.pointer_button(true),
            Some(InputEvent::PointerDown(Vec2::new(5.0, 6.0), Modifiers::STICKY))
        );
        assert!(input.pointer_held());
        assert_eq!(input.pointer_button(false), Some(InputEvent::PointerUp));
        assert_eq!(input.pointer_button(false), None);
    }

    #[test]
    fn test_touch_drives_pointer() {
        let mut input = Input::new(bindings());
        let at = Vec2::new(40.0, 40.0);

        assert_eq!(
            input.touched(1, TouchPhase::Started, at),
            Some(InputEvent::PointerDown(at, Modifiers::NONE))
        );
        assert!(input.pointer_held());

        // A second finger is ignored while the first is down.
        assert_eq!(input.touched(2, TouchPhase::Started, Vec2::ZERO), None);
        assert_eq!(input.touched(2, TouchPhase::Moved, Vec2::ZERO), None);

        let to = Vec2::new(60.0, 45.0);
        assert_eq!(input.touched(1, TouchPhase::Moved, to), Some(InputEvent::PointerMove(to)));
        assert_eq!(input.cursor(), Some(to));

        assert_eq!(input.touched(1, TouchPhase::Ended, to), Some(InputEvent::PointerLeave));
        assert!(!input.pointer_held());
        assert_eq!(input.cursor(), None);

        assert!(input.touched(2, TouchPhase::Started, to).is_some());
        assert_eq!(input.touched(2, TouchPhase::Cancelled, to), Some(InputEvent::PointerLeave));
    }

    #[test]
    fn test_touch_drags_fabric() {
        let mut fabric = Fabric::new(Default::default(), 300.0, 150.0);
        let mut input = Input::new(bindings());
        let at = fabric.mesh().grid_position(5, 5);
        let index = fabric.mesh().index(5, 5).unwrap();

        if let Some(event) = input.touched(7, TouchPhase::Started, at) {
            event.apply(&mut fabric);
        }
        assert!(matches!(fabric.controller().mode(), Mode::Drag { .. }));

        let to = at + Vec2::new(12.0, 8.0);
        if let Some(event) = input.touched(7, TouchPhase::Moved, to) {
            event.apply(&mut fabric);
        }
        assert_eq!(fabric.mesh().particles()[index].position, to);

        if let Some(event) = input.touched(7, TouchPhase::Ended, to) {
            event.apply(&mut fabric);
        }
        assert_eq!(fabric.controller().mode(), &Mode::Idle);
    }

    #[test]
    fn test_positions_are_logical() {
        let mut input = Input::new(bindings());
        input.set_scale_factor(2.0);
        assert_eq!(input.to_logical(PhysicalPosition::new(80.0, 60.0)), Vec2::new(40.0, 30.0));

        input.set_scale_factor(0.0);
        assert_eq!(input.to_logical(PhysicalPosition::new(80.0, 60.0)), Vec2::new(40.0, 30.0));
    }

    #[test]
    fn test_cursor_left_releases_pointer() {
        let mut input = Input::new(bindings());
        input.cursor_moved(Vec2::ONE);
        input.pointer_button(true);

        assert_eq!(input.cursor_left(), InputEvent::PointerLeave);
        assert!(!input.pointer_held());
        assert_eq!(input.cursor(), None);
    }

    #[test]
    fn test_help_action_reported() {
        let mut fabric = Fabric::new(Default::default(), 100.0, 100.0);
        let opacity = fabric.config().visuals.fill_opacity;

        let help = InputEvent::Actions(actions_for_char(",")).apply(&mut fabric);

        assert!(help);
        assert!(fabric.config().visuals.fill_opacity < opacity);
        assert!(!InputEvent::Actions(actions_for_char("1")).apply(&mut fabric));
    }

    #[test]
    fn test_help_names_bindings() {
        let text = bindings().help();
        assert!(text.contains("Shift+drag"));
        assert!(text.contains("Alt+drag"));
    }
}
