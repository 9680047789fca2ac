//! Ambient lighting as third-order spherical harmonics.
//!
//! A [`LightProbe`] stores nine RGB coefficients. They are projected from a
//! cubemap by [`LightProbe::from_cube_texture`] and evaluated per fragment
//! as irradiance in the standard shader.

use std::f32::consts::PI;

use cgmath::InnerSpace;

use crate::data_structures::texture::{ColorSpace, CubeTexture};

/// Nine RGB coefficients in the usual band order (l=0, l=1 y/z/x, l=2 ...).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SphericalHarmonics3 {
    pub coefficients: [[f32; 3]; 9],
}

impl SphericalHarmonics3 {
    /// Real SH basis for a unit direction.
    pub fn basis_at(direction: cgmath::Vector3<f32>) -> [f32; 9] {
        let (x, y, z) = (direction.x, direction.y, direction.z);
        [
            0.282095,
            0.488603 * y,
            0.488603 * z,
            0.488603 * x,
            1.092548 * x * y,
            1.092548 * y * z,
            0.315392 * (3.0 * z * z - 1.0),
            1.092548 * x * z,
            0.546274 * (x * x - y * y),
        ]
    }

    /// Cosine-convolved irradiance in the given normal direction.
    pub fn irradiance_at(&self, normal: cgmath::Vector3<f32>) -> [f32; 3] {
        let (x, y, z) = (normal.x, normal.y, normal.z);
        let weights = [
            0.886227,
            1.023328 * y,
            1.023328 * z,
            1.023328 * x,
            0.858086 * x * y,
            0.858086 * y * z,
            0.743125 * z * z - 0.247708,
            0.858086 * x * z,
            0.429043 * (x * x - y * y),
        ];
        let mut result = [0.0; 3];
        for (c, w) in self.coefficients.iter().zip(weights) {
            for channel in 0..3 {
                result[channel] += c[channel] * w;
            }
        }
        result
    }

    fn scale(&mut self, s: f32) {
        self.coefficients
            .iter_mut()
            .flat_map(|c| c.iter_mut())
            .for_each(|v| *v *= s);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LightProbe {
    pub sh: SphericalHarmonics3,
    pub intensity: f32,
}

impl LightProbe {
    /// A probe that contributes nothing until coefficients are copied in.
    pub fn new(intensity: f32) -> Self {
        Self {
            sh: SphericalHarmonics3::default(),
            intensity,
        }
    }

    /// Takes over the coefficients of `other` and keeps this probe's intensity.
    pub fn copy_coefficients(&mut self, other: &LightProbe) {
        self.sh = other.sh;
    }

    /// Projects a cubemap onto the SH basis.
    ///
    /// Every texel is weighted by its solid angle and the result is normalised
    /// so the weights integrate to 4π. sRGB faces are linearised first.
    pub fn from_cube_texture(cube: &CubeTexture) -> Self {
        let mut sh = SphericalHarmonics3::default();
        let mut total_weight = 0.0f32;

        for (face_index, face) in cube.faces.iter().enumerate() {
            let width = face.width();
            let pixel_size = 2.0 / width as f32;
            for (px, py, pixel) in face.enumerate_pixels() {
                let mut color = [
                    pixel[0] as f32 / 255.0,
                    pixel[1] as f32 / 255.0,
                    pixel[2] as f32 / 255.0,
                ];
                if cube.color_space == ColorSpace::Srgb {
                    color = color.map(srgb_to_linear);
                }

                let col = -1.0 + (px as f32 + 0.5) * pixel_size;
                let row = 1.0 - (py as f32 + 0.5) * pixel_size;
                let coord = match face_index {
                    0 => cgmath::vec3(-1.0, row, -col),
                    1 => cgmath::vec3(1.0, row, col),
                    2 => cgmath::vec3(-col, 1.0, -row),
                    3 => cgmath::vec3(-col, -1.0, row),
                    4 => cgmath::vec3(-col, row, 1.0),
                    _ => cgmath::vec3(col, row, -1.0),
                };

                let length_sq = coord.magnitude2();
                let weight = 4.0 / (length_sq.sqrt() * length_sq);
                total_weight += weight;

                let basis = SphericalHarmonics3::basis_at(coord.normalize());
                for (c, b) in sh.coefficients.iter_mut().zip(basis) {
                    for channel in 0..3 {
                        c[channel] += b * color[channel] * weight;
                    }
                }
            }
        }

        if total_weight > 0.0 {
            sh.scale(4.0 * PI / total_weight);
        }
        Self { sh, intensity: 1.0 }
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.0773993808
    } else {
        (c * 0.9478672986 + 0.0521327014).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn uniform_cube(value: u8, size: u32) -> CubeTexture {
        let face = image::RgbaImage::from_pixel(size, size, image::Rgba([value, value, value, 255]));
        CubeTexture::new("uniform", std::array::from_fn(|_| face.clone()))
    }

    #[test]
    fn uniform_white_environment_only_has_a_dc_term() {
        let probe = LightProbe::from_cube_texture(&uniform_cube(255, 8));
        let dc = 0.282095 * 4.0 * PI;
        for channel in 0..3 {
            assert_relative_eq!(probe.sh.coefficients[0][channel], dc, epsilon = 1e-3);
        }
        for c in &probe.sh.coefficients[1..] {
            for v in c {
                assert_relative_eq!(*v, 0.0, epsilon = 1e-3);
            }
        }
        // A constant environment of radiance 1 yields irradiance π everywhere.
        let irradiance = probe.sh.irradiance_at(cgmath::vec3(0.0, 1.0, 0.0));
        assert_relative_eq!(irradiance[0], PI, epsilon = 1e-2);
    }

    #[test]
    fn srgb_faces_are_linearised() {
        let mut cube = uniform_cube(128, 4);
        let linear = LightProbe::from_cube_texture(&cube);
        cube.color_space = ColorSpace::Srgb;
        let srgb = LightProbe::from_cube_texture(&cube);
        assert!(srgb.sh.coefficients[0][0] < linear.sh.coefficients[0][0]);
        assert_relative_eq!(
            srgb.sh.coefficients[0][0],
            0.282095 * 4.0 * PI * srgb_to_linear(128.0 / 255.0),
            epsilon = 1e-3
        );
    }

    #[test]
    fn copying_keeps_the_configured_intensity() {
        let mut probe = LightProbe::new(0.5);
        let generated = LightProbe::from_cube_texture(&uniform_cube(255, 2));
        probe.copy_coefficients(&generated);
        assert_eq!(probe.sh, generated.sh);
        assert_eq!(probe.intensity, 0.5);
    }
}
