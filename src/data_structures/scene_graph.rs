//! The scene graph rendered by the viewer.
//!
//! The scene is flat: a background, the lights and a list of meshes, each
//! with its own world position. Meshes are addressed by [`MeshId`], which
//! stays valid for the lifetime of the scene because meshes are never removed.

use std::sync::Arc;

use crate::data_structures::{
    geometry::Geometry, light_probe::LightProbe, material::Material, texture::CubeTexture,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(usize);

#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub geometry: Geometry,
    pub material: Material,
    pub position: cgmath::Vector3<f32>,
}

impl Mesh {
    pub fn new(name: impl Into<String>, geometry: Geometry, material: Material) -> Self {
        Self {
            name: name.into(),
            geometry,
            material,
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
        }
    }

    pub fn model_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
    }
}

/// Light arriving from `position` towards the origin.
#[derive(Clone, Debug, PartialEq)]
pub struct DirectionalLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub position: cgmath::Vector3<f32>,
}

impl DirectionalLight {
    pub fn new(color: [f32; 3], intensity: f32) -> Self {
        Self {
            color,
            intensity,
            position: cgmath::Vector3::new(0.0, 1.0, 0.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub background: Option<Arc<CubeTexture>>,
    pub light_probe: LightProbe,
    pub directional_light: DirectionalLight,
    meshes: Vec<Mesh>,
}

impl Scene {
    pub fn new(light_probe: LightProbe, directional_light: DirectionalLight) -> Self {
        Self {
            background: None,
            light_probe,
            directional_light,
            meshes: Vec::new(),
        }
    }

    pub fn add(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0)
    }

    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.get_mut(id.0)
    }

    pub fn find(&self, name: &str) -> Option<MeshId> {
        self.meshes.iter().position(|m| m.name == name).map(MeshId)
    }

    pub fn meshes(&self) -> impl Iterator<Item = (MeshId, &Mesh)> {
        self.meshes.iter().enumerate().map(|(i, m)| (MeshId(i), m))
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}
