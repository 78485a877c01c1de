//! Image impressions.
//!
//! An impression presses an image into the fabric: the image is resampled to
//! one pixel per grid particle, and darker pixels push their particle further
//! down. The displaced position becomes the particle's new rest state, so
//! ironing returns to the impressed shape rather than the flat grid.
//!
//! ```ignore
//! let impression = Impression::open("portrait.png")?;
//! fabric.set_impression(impression);
//! ```

use std::path::Path;

use glam::Vec2;
use image::imageops::FilterType;
use image::DynamicImage;

use crate::error::ImpressionError;
use crate::mesh::Mesh;

/// Per-particle brightness samples, row-major, in `0..=255`.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthMap {
    cols: usize,
    rows: usize,
    brightness: Vec<f32>,
}

impl DepthMap {
    /// Build a map from raw brightness samples.
    ///
    /// Missing samples read as white (no displacement).
    pub fn from_brightness(cols: usize, rows: usize, mut brightness: Vec<f32>) -> Self {
        brightness.resize(cols * rows, 255.0);
        Self {
            cols,
            rows,
            brightness,
        }
    }

    /// Resample `image` to `cols × rows` and average each pixel's RGB.
    pub fn from_image(image: &DynamicImage, cols: usize, rows: usize) -> Result<Self, ImpressionError> {
        if image.width() == 0 || image.height() == 0 || cols == 0 || rows == 0 {
            return Err(ImpressionError::Empty);
        }

        let resized = image
            .resize_exact(cols as u32, rows as u32, FilterType::Triangle)
            .to_rgba8();
        let brightness = resized
            .pixels()
            .map(|px| (px[0] as f32 + px[1] as f32 + px[2] as f32) / 3.0)
            .collect();

        Ok(Self::from_brightness(cols, rows, brightness))
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Brightness at `(col, row)`; white outside the map.
    pub fn brightness(&self, col: usize, row: usize) -> f32 {
        if col < self.cols && row < self.rows {
            self.brightness[row * self.cols + col]
        } else {
            255.0
        }
    }

    /// Downward displacement at `(col, row)` for a black-pixel depth of `scale`.
    pub fn depth(&self, col: usize, row: usize, scale: f32) -> f32 {
        (255.0 - self.brightness(col, row)) / 255.0 * scale
    }

    /// Press the map into `mesh`.
    ///
    /// Every free particle is moved to its grid position pushed down by its
    /// depth, with zero velocity, and that position becomes its rest.
    pub fn apply(&self, mesh: &mut Mesh, scale: f32) {
        for row in 0..mesh.rows() {
            for col in 0..mesh.cols() {
                let Some(index) = mesh.index(col, row) else {
                    continue;
                };
                let target = mesh.grid_position(col, row) + Vec2::new(0.0, self.depth(col, row, scale));
                let particle = &mut mesh.particles_mut()[index];
                if !particle.pinned {
                    particle.set_rest(target);
                }
            }
        }
    }
}

/// Restore the flat grid as the rest state of every free particle.
pub fn clear(mesh: &mut Mesh) {
    for row in 0..mesh.rows() {
        for col in 0..mesh.cols() {
            let Some(index) = mesh.index(col, row) else {
                continue;
            };
            let target = mesh.grid_position(col, row);
            let particle = &mut mesh.particles_mut()[index];
            if !particle.pinned {
                particle.set_rest(target);
            }
        }
    }
}

/// A loaded impression image together with its map for the current mesh.
///
/// The source image is kept so the map can be rebuilt when the mesh is.
#[derive(Debug, Clone)]
pub struct Impression {
    image: DynamicImage,
    map: DepthMap,
}

impl Impression {
    /// Wrap a decoded image. The map is built on the first [`Impression::fit`].
    pub fn new(image: DynamicImage) -> Result<Self, ImpressionError> {
        let map = DepthMap::from_image(&image, 1, 1)?;
        Ok(Self { image, map })
    }

    /// Open and decode an image file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ImpressionError> {
        let image = image::open(path.as_ref())?;
        Self::new(image)
    }

    /// The map for the most recent fit.
    pub fn map(&self) -> &DepthMap {
        &self.map
    }

    /// Resample the image to the mesh dimensions (if they changed) and press
    /// it in.
    pub fn fit(&mut self, mesh: &mut Mesh, scale: f32) -> Result<(), ImpressionError> {
        if self.map.cols() != mesh.cols() || self.map.rows() != mesh.rows() {
            self.map = DepthMap::from_image(&self.image, mesh.cols(), mesh.rows())?;
        }
        self.map.apply(mesh, scale);
        Ok(())
    }
}
