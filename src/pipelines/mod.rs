//! Render pipelines and the GPU-side data layouts they consume.
//!
//! - `basic`: unlit, optionally textured surfaces
//! - `standard`: surfaces lit by the light probe, the directional light and
//!   an environment map
//! - `background`: the cubemap drawn behind everything
//! - `light`: the lights uniform shared by the lit pipelines
//!
//! Bind group slots: 0 camera, 1 material (or background cube), 2 lights.

pub mod background;
pub mod basic;
pub mod light;
pub mod standard;

use crate::data_structures::{
    material::{Material, Shading, Side},
    scene_graph::Mesh,
};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl ModelVertex {
    /// Interleaves the separate geometry buffers. Missing normals or UVs become zero.
    pub fn interleave(mesh: &Mesh) -> Vec<ModelVertex> {
        let geometry = &mesh.geometry;
        geometry
            .positions
            .iter()
            .enumerate()
            .map(|(i, position)| ModelVertex {
                position: *position,
                normal: geometry.normals.get(i).copied().unwrap_or_default(),
                tex_coords: geometry.uvs.get(i).copied().unwrap_or_default(),
            })
            .collect()
    }
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Per-mesh uniform: transform plus the scalar material parameters.
///
/// `params` packs metalness, roughness, env map intensity and whether an
/// env map is bound.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshUniform {
    model: [[f32; 4]; 4],
    color: [f32; 4],
    params: [f32; 4],
}

impl MeshUniform {
    pub fn new(mesh: &Mesh) -> Self {
        let (color, params) = match &mesh.material.shading {
            Shading::Basic(m) => (m.color, [0.0; 4]),
            Shading::Standard(m) => (
                m.color,
                [
                    m.metalness,
                    m.roughness,
                    m.env_map_intensity,
                    if m.env_map.is_some() { 1.0 } else { 0.0 },
                ],
            ),
        };
        Self {
            model: mesh.model_matrix().into(),
            color: [color[0], color[1], color[2], 1.0],
            params,
        }
    }
}

pub fn camera_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("camera_bind_group_layout"),
    })
}

/// Every pipeline the renderer needs, one per shading model and side.
pub struct Pipelines {
    pub basic_front: wgpu::RenderPipeline,
    pub basic_double: wgpu::RenderPipeline,
    pub standard_front: wgpu::RenderPipeline,
    pub standard_double: wgpu::RenderPipeline,
    pub background: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
        material_layout: &wgpu::BindGroupLayout,
        light_layout: &wgpu::BindGroupLayout,
        background_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        Self {
            basic_front: basic::mk_basic_pipeline(device, format, camera_layout, material_layout, Side::Front),
            basic_double: basic::mk_basic_pipeline(device, format, camera_layout, material_layout, Side::Double),
            standard_front: standard::mk_standard_pipeline(
                device,
                format,
                camera_layout,
                material_layout,
                light_layout,
                Side::Front,
            ),
            standard_double: standard::mk_standard_pipeline(
                device,
                format,
                camera_layout,
                material_layout,
                light_layout,
                Side::Double,
            ),
            background: background::mk_background_pipeline(device, format, camera_layout, background_layout),
        }
    }

    pub fn for_material(&self, material: &Material) -> &wgpu::RenderPipeline {
        match (&material.shading, material.side()) {
            (Shading::Basic(_), Side::Front) => &self.basic_front,
            (Shading::Basic(_), Side::Double) => &self.basic_double,
            (Shading::Standard(_), Side::Front) => &self.standard_front,
            (Shading::Standard(_), Side::Double) => &self.standard_double,
        }
    }
}

pub(crate) fn cull_mode(side: Side) -> Option<wgpu::Face> {
    match side {
        Side::Front => Some(wgpu::Face::Back),
        Side::Double => None,
    }
}
