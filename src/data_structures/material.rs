//! Surface descriptions attached to meshes.

use std::sync::Arc;

use crate::data_structures::texture::{CubeTexture, Texture2D};

/// Which faces get rasterised.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Side {
    #[default]
    Front,
    Double,
}

/// Unlit surface: a flat colour, optionally multiplied by a colour map.
#[derive(Clone, Debug, PartialEq)]
pub struct BasicMaterial {
    pub color: [f32; 3],
    pub map: Option<Arc<Texture2D>>,
    pub side: Side,
}

impl Default for BasicMaterial {
    fn default() -> Self {
        Self {
            color: [1.0; 3],
            map: None,
            side: Side::Front,
        }
    }
}

/// Metalness/roughness surface lit by the scene lights and an optional env map.
#[derive(Clone, Debug, PartialEq)]
pub struct StandardMaterial {
    pub color: [f32; 3],
    pub metalness: f32,
    pub roughness: f32,
    pub env_map: Option<Arc<CubeTexture>>,
    pub env_map_intensity: f32,
    pub side: Side,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            color: [1.0; 3],
            metalness: 0.0,
            roughness: 1.0,
            env_map: None,
            env_map_intensity: 1.0,
            side: Side::Front,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shading {
    Basic(BasicMaterial),
    Standard(StandardMaterial),
}

/// A material plus a version that the renderer compares against its cached
/// GPU state. Bumping the version is how a mutation asks for the shading
/// state to be rebuilt.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub shading: Shading,
    version: u64,
}

impl Material {
    pub fn basic(material: BasicMaterial) -> Self {
        Self {
            shading: Shading::Basic(material),
            version: 0,
        }
    }

    pub fn standard(material: StandardMaterial) -> Self {
        Self {
            shading: Shading::Standard(material),
            version: 0,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn set_needs_update(&mut self) {
        self.version += 1;
    }

    pub fn side(&self) -> Side {
        match &self.shading {
            Shading::Basic(m) => m.side,
            Shading::Standard(m) => m.side,
        }
    }

    pub fn as_basic_mut(&mut self) -> Option<&mut BasicMaterial> {
        match &mut self.shading {
            Shading::Basic(m) => Some(m),
            Shading::Standard(_) => None,
        }
    }

    pub fn as_standard_mut(&mut self) -> Option<&mut StandardMaterial> {
        match &mut self.shading {
            Shading::Standard(m) => Some(m),
            Shading::Basic(_) => None,
        }
    }
}
