//! Visual configuration and depth gradients.
//!
//! Particles are coloured by how far they have been pushed from their rest
//! position. The distance is compressed with a power curve and then swept
//! back and forth across one of the [`Gradient`] presets, so large
//! deformations cycle through the palette instead of saturating.

use serde::{Deserialize, Serialize};

/// Colour of pinned particles when depth colouring is off (`#ff4444`).
pub const PINNED_COLOR: [u8; 3] = [0xff, 0x44, 0x44];
/// Colour of free particles when depth colouring is off.
pub const FREE_COLOR: [u8; 3] = [0xff, 0xff, 0xff];
/// Spring line colour (`#444`).
pub const LINE_COLOR: [u8; 3] = [0x44, 0x44, 0x44];
/// Viewport clear colour (`#1a1a1a`).
pub const BACKGROUND_COLOR: [u8; 3] = [0x1a, 0x1a, 0x1a];
/// Clear colour while a file is dragged over the window (`#2a2a2a`).
pub const DROP_TARGET_COLOR: [u8; 3] = [0x2a, 0x2a, 0x2a];

/// Exponent applied to the depth ratio before cycling.
const DEPTH_CURVE: f32 = 0.4;
/// Forward plus backward sweep across the gradient.
const CYCLE_LENGTH: f32 = 2.0;

/// One colour stop of a gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    /// Position in `[0, 1]`.
    pub pos: f32,
    /// RGB colour.
    pub rgb: [u8; 3],
}

const fn stop(pos: f32, r: u8, g: u8, b: u8) -> ColorStop {
    ColorStop { pos, rgb: [r, g, b] }
}

/// Built-in depth gradients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Gradient {
    /// Blue through cyan, green, yellow and orange to red.
    #[default]
    Rainbow,
    /// Deep blue to white foam.
    Ocean,
    /// Dark red through orange to white hot.
    Fire,
    /// Dark to bright greens.
    Forest,
    /// Deep purple through orange to light pink.
    Sunset,
    /// Black to white.
    Monochrome,
}

impl Gradient {
    /// All presets, in cycling order.
    pub const ALL: [Gradient; 6] = [
        Gradient::Rainbow,
        Gradient::Ocean,
        Gradient::Fire,
        Gradient::Forest,
        Gradient::Sunset,
        Gradient::Monochrome,
    ];

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Gradient::Rainbow => "Rainbow",
            Gradient::Ocean => "Ocean",
            Gradient::Fire => "Fire",
            Gradient::Forest => "Forest",
            Gradient::Sunset => "Sunset",
            Gradient::Monochrome => "Monochrome",
        }
    }

    /// Colour stops, sorted by position, spanning `[0, 1]`.
    pub fn stops(&self) -> &'static [ColorStop] {
        const RAINBOW: [ColorStop; 6] = [
            stop(0.0, 0, 0, 255),
            stop(0.2, 0, 255, 255),
            stop(0.4, 0, 255, 0),
            stop(0.6, 255, 255, 0),
            stop(0.8, 255, 128, 0),
            stop(1.0, 255, 0, 0),
        ];
        const OCEAN: [ColorStop; 5] = [
            stop(0.0, 0, 20, 40),
            stop(0.3, 0, 100, 150),
            stop(0.6, 0, 180, 200),
            stop(0.8, 100, 220, 255),
            stop(1.0, 255, 255, 255),
        ];
        const FIRE: [ColorStop; 5] = [
            stop(0.0, 20, 0, 0),
            stop(0.3, 100, 0, 0),
            stop(0.6, 255, 100, 0),
            stop(0.8, 255, 200, 0),
            stop(1.0, 255, 255, 200),
        ];
        const FOREST: [ColorStop; 5] = [
            stop(0.0, 10, 30, 10),
            stop(0.3, 50, 100, 50),
            stop(0.6, 100, 150, 50),
            stop(0.8, 150, 200, 100),
            stop(1.0, 200, 255, 150),
        ];
        const SUNSET: [ColorStop; 5] = [
            stop(0.0, 25, 25, 50),
            stop(0.25, 100, 50, 100),
            stop(0.5, 200, 100, 50),
            stop(0.75, 255, 150, 100),
            stop(1.0, 255, 200, 150),
        ];
        const MONOCHROME: [ColorStop; 5] = [
            stop(0.0, 0, 0, 0),
            stop(0.25, 64, 64, 64),
            stop(0.5, 128, 128, 128),
            stop(0.75, 192, 192, 192),
            stop(1.0, 255, 255, 255),
        ];

        match self {
            Gradient::Rainbow => &RAINBOW,
            Gradient::Ocean => &OCEAN,
            Gradient::Fire => &FIRE,
            Gradient::Forest => &FOREST,
            Gradient::Sunset => &SUNSET,
            Gradient::Monochrome => &MONOCHROME,
        }
    }

    fn position(&self) -> usize {
        Self::ALL.iter().position(|g| g == self).unwrap_or(0)
    }

    /// The next preset, wrapping around.
    pub fn next(&self) -> Gradient {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    /// The previous preset, wrapping around.
    pub fn previous(&self) -> Gradient {
        let len = Self::ALL.len();
        Self::ALL[(self.position() + len - 1) % len]
    }

    /// Sample the gradient at `t` in `[0, 1]`.
    ///
    /// Channels are floored to whole values. Positions outside every stop
    /// interval return the last stop.
    pub fn sample(&self, t: f32) -> [u8; 3] {
        let stops = self.stops();
        for pair in stops.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if t >= lo.pos && t <= hi.pos {
                let f = (t - lo.pos) / (hi.pos - lo.pos);
                let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * f).floor() as u8;
                return [
                    lerp(lo.rgb[0], hi.rgb[0]),
                    lerp(lo.rgb[1], hi.rgb[1]),
                    lerp(lo.rgb[2], hi.rgb[2]),
                ];
            }
        }
        stops[stops.len() - 1].rgb
    }

    /// Colour for a particle displaced by `depth` from rest.
    ///
    /// `depth / max_depth` is raised to the 0.4 power and swept forward then
    /// backward across the gradient every two units.
    pub fn depth_color(&self, depth: f32, max_depth: f32) -> [u8; 3] {
        let ratio = depth / max_depth;
        let scaled = ratio.powf(DEPTH_CURVE);
        let cycle = scaled % CYCLE_LENGTH;
        let t = if cycle <= 1.0 { cycle } else { CYCLE_LENGTH - cycle };
        self.sample(t)
    }
}

/// Viewport clear colour, lightened while a file hovers over the window.
pub fn background_color(file_hovered: bool) -> [u8; 3] {
    if file_hovered {
        DROP_TARGET_COLOR
    } else {
        BACKGROUND_COLOR
    }
}

/// Normalise an RGB byte triple with the given alpha.
pub fn rgba(rgb: [u8; 3], alpha: f32) -> [f32; 4] {
    [
        rgb[0] as f32 / 255.0,
        rgb[1] as f32 / 255.0,
        rgb[2] as f32 / 255.0,
        alpha,
    ]
}

/// How the mesh is presented.
///
/// All setters clamp; the `*_RANGE` constants give the bounds and the
/// `*_STEP` constants the increments used by keyboard shortcuts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualConfig {
    /// Particle radius.
    pub dot_size: f32,
    /// Spring line thickness.
    pub line_width: f32,
    /// Draw springs.
    pub show_lines: bool,
    /// Fill grid cells.
    pub show_fill: bool,
    /// Alpha of cell fills.
    pub fill_opacity: f32,
    /// Colour particles by displacement instead of pinned/free.
    pub depth_coloring: bool,
    /// Displacement mapped to one full sweep of the gradient.
    pub max_depth: f32,
    /// Active depth gradient.
    pub gradient: Gradient,
    /// Displacement produced by a fully black impression pixel.
    pub impression_scale: f32,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            dot_size: 10.0,
            line_width: 1.0,
            show_lines: true,
            show_fill: false,
            fill_opacity: 0.1,
            depth_coloring: true,
            max_depth: 50.0,
            gradient: Gradient::Rainbow,
            impression_scale: 100.0,
        }
    }
}

impl VisualConfig {
    pub const DOT_SIZE_RANGE: (f32, f32) = (1.0, 10.0);
    pub const DOT_SIZE_STEP: f32 = 1.0;
    pub const LINE_WIDTH_RANGE: (f32, f32) = (0.5, 5.0);
    pub const LINE_WIDTH_STEP: f32 = 0.5;
    pub const FILL_OPACITY_RANGE: (f32, f32) = (0.05, 1.0);
    pub const FILL_OPACITY_STEP: f32 = 0.05;
    pub const MAX_DEPTH_RANGE: (f32, f32) = (20.0, 200.0);
    pub const MAX_DEPTH_STEP: f32 = 10.0;
    pub const IMPRESSION_SCALE_RANGE: (f32, f32) = (10.0, 300.0);
    pub const IMPRESSION_SCALE_STEP: f32 = 10.0;

    pub fn set_dot_size(&mut self, value: f32) {
        self.dot_size = clamp(value, Self::DOT_SIZE_RANGE);
    }

    pub fn set_line_width(&mut self, value: f32) {
        self.line_width = clamp(value, Self::LINE_WIDTH_RANGE);
    }

    pub fn set_fill_opacity(&mut self, value: f32) {
        self.fill_opacity = clamp(value, Self::FILL_OPACITY_RANGE);
    }

    pub fn set_max_depth(&mut self, value: f32) {
        self.max_depth = clamp(value, Self::MAX_DEPTH_RANGE);
    }

    pub fn set_impression_scale(&mut self, value: f32) {
        self.impression_scale = clamp(value, Self::IMPRESSION_SCALE_RANGE);
    }

    /// Colour of a particle given its displacement and pinned state.
    pub fn particle_color(&self, depth: f32, pinned: bool) -> [u8; 3] {
        if self.depth_coloring {
            self.gradient.depth_color(depth, self.max_depth)
        } else if pinned {
            PINNED_COLOR
        } else {
            FREE_COLOR
        }
    }

    /// Clamp every field into range.
    pub fn validated(mut self) -> Self {
        self.set_dot_size(self.dot_size);
        self.set_line_width(self.line_width);
        self.set_fill_opacity(self.fill_opacity);
        self.set_max_depth(self.max_depth);
        self.set_impression_scale(self.impression_scale);
        self
    }
}

fn clamp(value: f32, (lo, hi): (f32, f32)) -> f32 {
    value.clamp(lo, hi)
}
