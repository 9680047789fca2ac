//! Drawing a [`Scene`] with wgpu.
//!
//! The [`Renderer`] trait is the seam between the viewer and the GPU: the
//! viewer decides *when* a frame is drawn and the renderer only knows *how*.
//! [`GpuRenderer`] is the wgpu implementation. It keeps GPU copies of meshes
//! and textures between frames and rebuilds a mesh's bind group whenever its
//! material version changes.

use std::{
    collections::{HashMap, HashSet},
    iter,
};

use anyhow::Context as _;
use instant::Duration;
use wgpu::util::DeviceExt;

use crate::{
    camera::{CameraUniform, PerspectiveCamera},
    context::Context,
    data_structures::{
        material::Shading,
        scene_graph::{Mesh, MeshId, Scene},
        texture::{CubeTexture, Texture2D, TextureId},
    },
    pipelines::{self, MeshUniform, ModelVertex, Pipelines, light::LightResources},
    resources::texture::{self, Texture},
};

/// Something that can draw the scene into a viewport.
pub trait Renderer {
    /// Resizes the output. Zero-sized requests are ignored.
    fn set_size(&mut self, width: u32, height: u32);

    fn size(&self) -> (u32, u32);

    /// Draws one frame, synchronously.
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> anyhow::Result<()>;
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
    uniform: MeshUniform,
    uniform_buffer: wgpu::Buffer,
    material_version: u64,
    bind_group: wgpu::BindGroup,
}

struct Fallbacks {
    map: Texture,
    env_map: Texture,
}

pub struct GpuRenderer {
    ctx: Context,
    pipelines: Pipelines,
    material_layout: wgpu::BindGroupLayout,
    background_layout: wgpu::BindGroupLayout,
    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    lights: LightResources,
    fallbacks: Fallbacks,
    textures: HashMap<TextureId, Texture>,
    meshes: HashMap<MeshId, GpuMesh>,
    background: Option<(TextureId, wgpu::BindGroup)>,
    clear_colour: wgpu::Color,
}

impl GpuRenderer {
    pub fn new(ctx: Context) -> Self {
        let device = &ctx.device;

        let camera_uniform = CameraUniform::new();
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_layout = pipelines::camera_layout(device);
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let lights = LightResources::new(device);
        let material_layout = texture::material_layout(device);
        let background_layout = texture::background_layout(device);
        let pipelines = Pipelines::new(
            device,
            ctx.config.format,
            &camera_layout,
            &material_layout,
            &lights.bind_group_layout,
            &background_layout,
        );
        let fallbacks = Fallbacks {
            map: Texture::solid(device, &ctx.queue, [255, 255, 255, 255]),
            env_map: Texture::solid_cube(device, &ctx.queue, [0, 0, 0, 255]),
        };

        Self {
            ctx,
            pipelines,
            material_layout,
            background_layout,
            camera_uniform,
            camera_buffer,
            camera_bind_group,
            lights,
            fallbacks,
            textures: HashMap::new(),
            meshes: HashMap::new(),
            background: None,
            clear_colour: wgpu::Color::BLACK,
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn features(&self) -> wgpu::Features {
        self.ctx.features()
    }

    fn texture_2d(&mut self, source: &Texture2D) -> &Texture {
        let Self { ctx, textures, .. } = self;
        textures.entry(source.id()).or_insert_with(|| {
            log::debug!("uploading texture {}", source.label);
            Texture::from_texture2d(&ctx.device, &ctx.queue, source)
        })
    }

    fn cube_texture(&mut self, source: &CubeTexture) -> &Texture {
        let Self { ctx, textures, .. } = self;
        textures.entry(source.id()).or_insert_with(|| {
            log::debug!("uploading cube texture {}", source.label);
            Texture::from_cube(&ctx.device, &ctx.queue, source)
        })
    }

    fn material_bind_group(&mut self, mesh: &Mesh, uniform_buffer: &wgpu::Buffer) -> wgpu::BindGroup {
        let (map, env_map) = match &mesh.material.shading {
            Shading::Basic(m) => (m.map.clone(), None),
            Shading::Standard(m) => (None, m.env_map.clone()),
        };
        let map = map.map(|map| self.texture_2d(&map).clone());
        let env_map = env_map.map(|env_map| self.cube_texture(&env_map).clone());
        let map = map.as_ref().unwrap_or(&self.fallbacks.map);
        let env_map = env_map.as_ref().unwrap_or(&self.fallbacks.env_map);

        self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&map.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&env_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&env_map.sampler),
                },
            ],
            label: Some(&format!("{}_material_bind_group", mesh.name)),
        })
    }

    /// Brings the GPU copy of `mesh` up to date.
    fn prepare_mesh(&mut self, id: MeshId, mesh: &Mesh) {
        let uniform = MeshUniform::new(mesh);
        if let Some(mut gpu_mesh) = self.meshes.remove(&id) {
            if gpu_mesh.uniform != uniform {
                gpu_mesh.uniform = uniform;
                self.ctx
                    .queue
                    .write_buffer(&gpu_mesh.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
            }
            if gpu_mesh.material_version != mesh.material.version() {
                log::debug!("rebuilding material of {}", mesh.name);
                gpu_mesh.bind_group = self.material_bind_group(mesh, &gpu_mesh.uniform_buffer);
                gpu_mesh.material_version = mesh.material.version();
            }
            self.meshes.insert(id, gpu_mesh);
            return;
        }

        let device = &self.ctx.device;
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&ModelVertex::interleave(mesh)),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&mesh.geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Uniform Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = self.material_bind_group(mesh, &uniform_buffer);
        self.meshes.insert(
            id,
            GpuMesh {
                vertex_buffer,
                index_buffer,
                num_indices: mesh.geometry.indices.len() as u32,
                uniform,
                uniform_buffer,
                material_version: mesh.material.version(),
                bind_group,
            },
        );
    }

    fn prepare_background(&mut self, background: Option<&CubeTexture>) {
        let Some(background) = background else {
            self.background = None;
            return;
        };
        if matches!(&self.background, Some((id, _)) if *id == background.id()) {
            return;
        }
        let cube = self.cube_texture(background).clone();
        let bind_group = self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.background_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&cube.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&cube.sampler),
                },
            ],
            label: Some("background_bind_group"),
        });
        self.background = Some((background.id(), bind_group));
    }

    fn prepare(&mut self, scene: &Scene, camera: &PerspectiveCamera) {
        self.camera_uniform.update_view_proj(camera);
        self.ctx
            .queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[self.camera_uniform]));
        self.lights.update(&self.ctx.queue, scene);
        self.prepare_background(scene.background.as_deref());
        for (id, mesh) in scene.meshes() {
            self.prepare_mesh(id, mesh);
        }

        // Replaced maps stay alive only as long as a bind group still holds them.
        let live = referenced_textures(scene);
        self.textures.retain(|id, _| {
            let keep = live.contains(id);
            if !keep {
                log::debug!("releasing texture {id:?}");
            }
            keep
        });
    }

    fn draw(&self, scene: &Scene, view: &wgpu::TextureView) {
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                multiview_mask: None,
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

            if let Some((_, background)) = &self.background {
                render_pass.set_pipeline(&self.pipelines.background);
                render_pass.set_bind_group(1, background, &[]);
                render_pass.draw(0..3, 0..1);
            }

            for (id, mesh) in scene.meshes() {
                let Some(gpu_mesh) = self.meshes.get(&id) else {
                    continue;
                };
                if gpu_mesh.num_indices == 0 {
                    log::warn!("{} has no indices and is skipped", mesh.name);
                    continue;
                }
                render_pass.set_pipeline(self.pipelines.for_material(&mesh.material));
                render_pass.set_bind_group(1, &gpu_mesh.bind_group, &[]);
                if let Shading::Standard(_) = mesh.material.shading {
                    render_pass.set_bind_group(2, &self.lights.bind_group, &[]);
                }
                render_pass.set_vertex_buffer(0, gpu_mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(gpu_mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..gpu_mesh.num_indices, 0, 0..1);
            }
        }
        self.ctx.queue.submit(iter::once(encoder.finish()));
    }

    /// Copies the last offscreen frame back to the CPU.
    ///
    /// Only available on contexts created with [`Context::headless`].
    pub async fn read_pixels(&self) -> anyhow::Result<image::RgbaImage> {
        let texture = self
            .ctx
            .offscreen_texture()
            .context("pixels can only be read from an offscreen target")?;
        let (width, height) = self.ctx.size();
        let u32_size = std::mem::size_of::<u32>() as u32;
        let unpadded_bytes_per_row = u32_size * width;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;

        let output_buffer = self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
            size: (padded_bytes_per_row * height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST
                // this tells wpgu that we want to read this buffer from the cpu
                | wgpu::BufferUsages::MAP_READ,
            label: Some("readback buffer"),
            mapped_at_creation: false,
        });
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.ctx.queue.submit(iter::once(encoder.finish()));

        // The mapping has to be requested before polling, otherwise the await never resolves.
        let buffer_slice = output_buffer.slice(..);
        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).ok();
        });
        self.ctx
            .device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: Some(Duration::from_secs(3)),
            })
            .map_err(|e| anyhow::anyhow!("waiting for the readback failed: {e}"))?;
        rx.receive()
            .await
            .context("the readback channel closed")?
            .context("cannot map the readback buffer")?;

        let data = buffer_slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((unpadded_bytes_per_row * height) as usize);
        for row in data.chunks(padded_bytes_per_row as usize) {
            pixels.extend_from_slice(&row[..unpadded_bytes_per_row as usize]);
        }
        drop(data);
        output_buffer.unmap();

        image::RgbaImage::from_raw(width, height, pixels).context("readback has the wrong size")
    }
}

/// Ids of every texture the scene currently draws with.
fn referenced_textures(scene: &Scene) -> HashSet<TextureId> {
    let materials = scene.meshes().filter_map(|(_, mesh)| match &mesh.material.shading {
        Shading::Basic(m) => m.map.as_ref().map(|map| map.id()),
        Shading::Standard(m) => m.env_map.as_ref().map(|env_map| env_map.id()),
    });
    scene.background.iter().map(|background| background.id()).chain(materials).collect()
}

impl Renderer for GpuRenderer {
    fn set_size(&mut self, width: u32, height: u32) {
        self.ctx.resize(width, height);
    }

    fn size(&self) -> (u32, u32) {
        self.ctx.size()
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> anyhow::Result<()> {
        self.prepare(scene, camera);
        let frame = match self.ctx.acquire_frame() {
            Ok(frame) => frame,
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::CurrentSurfaceTexture::Lost | wgpu::CurrentSurfaceTexture::Outdated) => {
                log::warn!("surface lost or outdated, skipping this frame");
                self.ctx.reconfigure();
                return Ok(());
            }
            Err(e) => return Err(anyhow::anyhow!("unable to acquire a frame: {e:?}")),
        };
        self.draw(scene, &frame.view);
        frame.present();
        Ok(())
    }
}
