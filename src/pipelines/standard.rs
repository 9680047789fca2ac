use crate::{
    data_structures::material::Side,
    pipelines::{
        ModelVertex, Vertex,
        basic::{DepthMode, mk_render_pipeline},
        cull_mode,
    },
};

pub fn mk_standard_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    camera_layout: &wgpu::BindGroupLayout,
    material_layout: &wgpu::BindGroupLayout,
    light_layout: &wgpu::BindGroupLayout,
    side: Side,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Standard Pipeline Layout"),
        bind_group_layouts: &[Some(camera_layout), Some(material_layout), Some(light_layout)],
        immediate_size: 0,
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Standard Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("standard.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &layout,
        format,
        Some(wgpu::BlendState::REPLACE),
        Some(DepthMode::TEST_AND_WRITE),
        cull_mode(side),
        &[ModelVertex::desc()],
        shader,
    )
}
