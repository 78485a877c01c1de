//! Per-frame render data.
//!
//! A [`FrameData`] is a read-only snapshot of the mesh laid out for direct
//! upload into vertex buffers. Renderers consume it and never write back.

use bytemuck::{Pod, Zeroable};

use crate::mesh::Mesh;
use crate::visuals::{self, VisualConfig};

/// One particle, drawn as a filled circle.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ParticleVertex {
    pub position: [f32; 2],
    pub radius: f32,
    pub _pad: f32,
    pub color: [f32; 4],
}

/// A bare 2D vertex used for spring lines and cell fills.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 2],
}

/// Everything a renderer needs to draw one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameData {
    /// One entry per particle, in mesh order.
    pub particles: Vec<ParticleVertex>,
    /// Spring endpoints as a line list (two vertices per spring). Empty when
    /// lines are hidden.
    pub lines: Vec<LineVertex>,
    /// Cell quads as a triangle list (six vertices per cell). Empty when
    /// fills are hidden.
    pub fills: Vec<LineVertex>,
    /// Spring line thickness.
    pub line_width: f32,
    /// Alpha of cell fills.
    pub fill_opacity: f32,
}

impl FrameData {
    /// Snapshot `mesh` using the given visual settings.
    pub fn capture(mesh: &Mesh, settings: &VisualConfig) -> Self {
        let particles = mesh
            .particles()
            .iter()
            .map(|p| ParticleVertex {
                position: p.position.to_array(),
                radius: settings.dot_size,
                _pad: 0.0,
                color: visuals::rgba(settings.particle_color(p.displacement(), p.pinned), 1.0),
            })
            .collect();

        let vertex = |i: usize| LineVertex {
            position: mesh.particles()[i].position.to_array(),
        };

        let lines = if settings.show_lines {
            mesh.springs()
                .iter()
                .flat_map(|s| [vertex(s.a), vertex(s.b)])
                .collect()
        } else {
            Vec::new()
        };

        let fills = if settings.show_fill {
            mesh.cells()
                .flat_map(|[tl, tr, br, bl]| {
                    [vertex(tl), vertex(tr), vertex(br), vertex(tl), vertex(br), vertex(bl)]
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            particles,
            lines,
            fills,
            line_width: settings.line_width,
            fill_opacity: settings.fill_opacity,
        }
    }

    /// Number of springs in the snapshot.
    pub fn line_count(&self) -> usize {
        self.lines.len() / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spring::DEFAULT_STRENGTH;
    use crate::visuals::{FREE_COLOR, PINNED_COLOR};
    use glam::Vec2;

    fn mesh() -> Mesh {
        Mesh::new(3, 3, Vec2::splat(10.0), DEFAULT_STRENGTH)
    }

    #[test]
    fn test_vertex_layouts() {
        assert_eq!(std::mem::size_of::<ParticleVertex>(), 32);
        assert_eq!(std::mem::size_of::<LineVertex>(), 8);
    }

    #[test]
    fn test_capture_defaults() {
        let mesh = mesh();
        let frame = FrameData::capture(&mesh, &VisualConfig::default());

        assert_eq!(frame.particles.len(), 9);
        assert_eq!(frame.line_count(), mesh.springs().len());
        assert!(frame.fills.is_empty());
        assert_eq!(frame.particles[4].position, [10.0, 10.0]);
        assert_eq!(frame.particles[4].radius, 10.0);
    }

    #[test]
    fn test_capture_toggles() {
        let mesh = mesh();
        let settings = VisualConfig {
            show_lines: false,
            show_fill: true,
            depth_coloring: false,
            ..Default::default()
        };
        let frame = FrameData::capture(&mesh, &settings);

        assert!(frame.lines.is_empty());
        assert_eq!(frame.fills.len(), 4 * 6);
        assert_eq!(frame.particles[0].color, visuals::rgba(PINNED_COLOR, 1.0));
        assert_eq!(frame.particles[4].color, visuals::rgba(FREE_COLOR, 1.0));
    }

    #[test]
    fn test_bytes_cast() {
        let frame = FrameData::capture(&mesh(), &VisualConfig::default());
        let bytes: &[u8] = bytemuck::cast_slice(&frame.particles);
        assert_eq!(bytes.len(), 9 * 32);
    }
}
