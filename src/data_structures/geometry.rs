//! Indexed triangle geometry and the primitives the viewer needs.

use std::f32::consts::PI;

use cgmath::InnerSpace;

/// Vertex attributes kept as separate buffers, one entry per vertex.
///
/// `uvs` always exists; a geometry built without texture coordinates simply
/// has an empty buffer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl Geometry {
    /// An axis-aligned plane in the XY plane facing +Z, centred on the origin.
    pub fn plane(width: f32, height: f32) -> Self {
        let (half_w, half_h) = (width / 2.0, height / 2.0);
        let mut geometry = Geometry::default();
        for iy in 0..2u32 {
            for ix in 0..2u32 {
                geometry
                    .positions
                    .push([ix as f32 * width - half_w, half_h - iy as f32 * height, 0.0]);
                geometry.normals.push([0.0, 0.0, 1.0]);
                geometry.uvs.push([ix as f32, 1.0 - iy as f32]);
            }
        }
        // a b / c d with the top row first
        geometry.indices = vec![0, 2, 1, 2, 3, 1];
        geometry
    }

    /// A UV sphere. The seam lies on the -X side and the poles are on ±Y.
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);
        let mut geometry = Geometry::default();
        let mut grid = Vec::with_capacity(height_segments as usize + 1);
        let mut index = 0u32;

        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            // Pole vertices sit in the middle of their segment so the texture doesn't pinch.
            let u_offset = if iy == 0 {
                0.5 / width_segments as f32
            } else if iy == height_segments {
                -0.5 / width_segments as f32
            } else {
                0.0
            };
            let mut row = Vec::with_capacity(width_segments as usize + 1);
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let (phi, theta) = (u * 2.0 * PI, v * PI);
                let position = cgmath::Vector3::new(
                    -radius * phi.cos() * theta.sin(),
                    radius * theta.cos(),
                    radius * phi.sin() * theta.sin(),
                );
                geometry.positions.push(position.into());
                geometry.normals.push(position.normalize().into());
                geometry.uvs.push([u + u_offset, 1.0 - v]);
                row.push(index);
                index += 1;
            }
            grid.push(row);
        }

        for iy in 0..height_segments as usize {
            for ix in 0..width_segments as usize {
                let a = grid[iy][ix + 1];
                let b = grid[iy][ix];
                let c = grid[iy + 1][ix];
                let d = grid[iy + 1][ix + 1];
                if iy != 0 {
                    geometry.indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments as usize - 1 {
                    geometry.indices.extend_from_slice(&[b, c, d]);
                }
            }
        }
        geometry
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// Mirrors every texture coordinate vertically (`v` becomes `1 - v`).
///
/// Needed for textures whose rows are stored top-down and that are uploaded
/// without flipping, such as the block-compressed ones. Applying it twice
/// restores the original coordinates.
pub fn flip_y(geometry: &mut Geometry) -> &mut Geometry {
    for uv in geometry.uvs.iter_mut() {
        uv[1] = 1.0 - uv[1];
    }
    geometry
}
