use std::f32::consts::FRAC_1_PI;

use cgmath::InnerSpace;
use wgpu::util::DeviceExt;

use crate::data_structures::scene_graph::Scene;

/// GPU resources for the scene lights.
pub struct LightResources {
    pub uniform: LightsUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform = LightsUniform::default();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Lights Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("lights_bind_group"),
        });
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Writes the scene's lights to the GPU if they changed since the last call.
    pub fn update(&mut self, queue: &wgpu::Queue, scene: &Scene) {
        let uniform = LightsUniform::from_scene(scene);
        if uniform != self.uniform {
            self.uniform = uniform;
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
        }
    }
}

// Uniforms require 16 byte (4 float) spacing, hence vec4 everywhere
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniform {
    sh: [[f32; 4]; 9],
    direction: [f32; 4],
    color: [f32; 4],
    probe: [f32; 4],
}

impl LightsUniform {
    pub fn from_scene(scene: &Scene) -> Self {
        let light = &scene.directional_light;
        let direction = if light.position.magnitude2() > 0.0 {
            light.position.normalize()
        } else {
            cgmath::Vector3::unit_y()
        };
        Self {
            sh: scene
                .light_probe
                .sh
                .coefficients
                .map(|[r, g, b]| [r, g, b, 0.0]),
            direction: direction.extend(0.0).into(),
            color: [
                light.color[0] * light.intensity,
                light.color[1] * light.intensity,
                light.color[2] * light.intensity,
                1.0,
            ],
            // Lambertian diffuse of the ambient irradiance is albedo / π.
            probe: [scene.light_probe.intensity * FRAC_1_PI, 0.0, 0.0, 0.0],
        }
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
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
        label: Some("lights_bind_group_layout"),
    })
}
