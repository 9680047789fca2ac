//! GPU context: device, queue and the render target frames are drawn into.
//!
//! A context either presents to a window surface or renders into an
//! offscreen texture (used by the image tests and for screenshots).

use std::sync::Arc;

use anyhow::Context as _;
use winit::window::Window;

use crate::resources::texture::Texture;

#[derive(Debug)]
enum Target {
    Surface {
        window: Arc<Window>,
        surface: wgpu::Surface<'static>,
    },
    Offscreen {
        texture: wgpu::Texture,
    },
}

/// A frame that is being drawn. Presenting is a no-op offscreen.
pub(crate) struct Frame {
    pub(crate) view: wgpu::TextureView,
    surface_texture: Option<wgpu::SurfaceTexture>,
}

impl Frame {
    pub(crate) fn present(self) {
        if let Some(surface_texture) = self.surface_texture {
            surface_texture.present();
        }
    }
}

#[derive(Debug)]
pub struct Context {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub(crate) depth_texture: Texture,
    target: Target,
}

impl Context {
    /// Sets up wgpu for the given window.
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("cannot create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable GPU adapter")?;
        let (device, queue) = request_device(&adapter).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Colours are written linear and encoded by an sRGB surface, like an sRGB output encoding.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("the surface reports no formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            Texture::create_depth_texture(&device, [config.width, config.height], "depth_texture");

        Ok(Self {
            device,
            queue,
            config,
            depth_texture,
            target: Target::Surface { window, surface },
        })
    }

    /// Sets up wgpu without a window, rendering into an sRGB texture.
    pub async fn headless(width: u32, height: u32) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::new_without_display_handle());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable GPU adapter")?;
        let (device, queue) = request_device(&adapter).await?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Opaque,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        let texture = create_offscreen_texture(&device, &config);
        let depth_texture =
            Texture::create_depth_texture(&device, [config.width, config.height], "depth_texture");

        Ok(Self {
            device,
            queue,
            config,
            depth_texture,
            target: Target::Offscreen { texture },
        })
    }

    pub fn window(&self) -> Option<&Arc<Window>> {
        match &self.target {
            Target::Surface { window, .. } => Some(window),
            Target::Offscreen { .. } => None,
        }
    }

    pub fn features(&self) -> wgpu::Features {
        self.device.features()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Reconfigures the render target and depth buffer. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        match &mut self.target {
            Target::Surface { surface, .. } => surface.configure(&self.device, &self.config),
            Target::Offscreen { texture } => {
                *texture = create_offscreen_texture(&self.device, &self.config);
            }
        }
        self.depth_texture =
            Texture::create_depth_texture(&self.device, [width, height], "depth_texture");
    }

    /// Re-applies the current configuration, e.g. after the surface was lost.
    pub(crate) fn reconfigure(&mut self) {
        let (width, height) = self.size();
        self.resize(width, height);
    }

    pub(crate) fn acquire_frame(&self) -> Result<Frame, wgpu::CurrentSurfaceTexture> {
        match &self.target {
            Target::Surface { surface, .. } => {
                let surface_texture = match surface.get_current_texture() {
                    wgpu::CurrentSurfaceTexture::Success(t)
                    | wgpu::CurrentSurfaceTexture::Suboptimal(t) => t,
                    other => return Err(other),
                };
                let view = surface_texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                Ok(Frame {
                    view,
                    surface_texture: Some(surface_texture),
                })
            }
            Target::Offscreen { texture } => Ok(Frame {
                view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
                surface_texture: None,
            }),
        }
    }

    pub(crate) fn offscreen_texture(&self) -> Option<&wgpu::Texture> {
        match &self.target {
            Target::Offscreen { texture } => Some(texture),
            Target::Surface { .. } => None,
        }
    }
}

async fn request_device(adapter: &wgpu::Adapter) -> anyhow::Result<(wgpu::Device, wgpu::Queue)> {
    // Block compression is optional; the texture loader checks for it.
    let required_features = adapter.features() & wgpu::Features::TEXTURE_COMPRESSION_BC;
    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features,
            // WebGL doesn't support all of wgpu's features, so if
            // we're building for the web we'll have to disable some.
            required_limits: if cfg!(target_arch = "wasm32") {
                wgpu::Limits::downlevel_webgl2_defaults()
            } else {
                wgpu::Limits::default()
            },
            ..Default::default()
        })
        .await
        .context("cannot open the GPU device")
}

fn create_offscreen_texture(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("offscreen target"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: config.format,
        usage: config.usage,
        view_formats: &[],
    })
}
