use crate::pipelines::basic::{DepthMode, mk_render_pipeline};

/// Draws the scene background with a single full-screen triangle.
///
/// No vertex buffer is bound; the shader derives positions from the vertex
/// index and reconstructs view directions from the inverse view projection.
pub fn mk_background_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    camera_layout: &wgpu::BindGroupLayout,
    background_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Background Pipeline Layout"),
        bind_group_layouts: &[Some(camera_layout), Some(background_layout)],
        immediate_size: 0,
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Background Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("background.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &layout,
        format,
        Some(wgpu::BlendState::REPLACE),
        Some(DepthMode::BEHIND_EVERYTHING),
        None,
        &[],
        shader,
    )
}
