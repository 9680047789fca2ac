//! Application event loop.
//!
//! Wires winit to a [`Viewer`]: window and GPU setup on `resumed`, viewport
//! and pointer events forwarded as they arrive, and the two resource loads
//! spawned as futures whose settled results come back as [`ViewerEvent`]s.
//!
//! # Lifecycle
//!
//! 1. `resumed` creates the window and the GPU context
//! 2. the viewer draws its first frame and both loads start concurrently
//! 3. each load posts its result through the event loop proxy
//! 4. `user_event` hands the result to the viewer, which mutates and redraws

use std::{fmt::Debug, sync::Arc};

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::{Window, WindowId},
};

use crate::{
    config::ViewerConfig,
    context::Context,
    data_structures::texture::{CubeTexture, Texture2D},
    render::GpuRenderer,
    resources::{
        compressed::CompressedTextureLoader,
        cube::{cube_urls, load_cube_texture},
    },
    viewer::Viewer,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub(crate) enum ViewerEvent {
    #[allow(dead_code)]
    Initialized(Box<Viewer<GpuRenderer>>),
    CubeTextureLoaded(anyhow::Result<CubeTexture>),
    TextureLoaded(anyhow::Result<Texture2D>),
}

impl Debug for ViewerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(_) => f.write_str("Initialized"),
            Self::CubeTextureLoaded(result) => f
                .debug_tuple("CubeTextureLoaded")
                .field(&result.as_ref().map(|cube| &cube.label))
                .finish(),
            Self::TextureLoaded(result) => f
                .debug_tuple("TextureLoaded")
                .field(&result.as_ref().map(|texture| &texture.label))
                .finish(),
        }
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<ViewerEvent>,
    config: ViewerConfig,
    viewer: Option<Viewer<GpuRenderer>>,
    initializing: bool,
}

impl App {
    fn new(event_loop: &EventLoop<ViewerEvent>, config: ViewerConfig) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            config,
            viewer: None,
            initializing: false,
        })
    }

    /// First frame plus both loads, once the GPU is ready.
    fn on_initialized(&mut self, mut viewer: Viewer<GpuRenderer>) {
        if let Some(window) = viewer.renderer().context().window() {
            let size = window.inner_size();
            viewer.set_viewport(size.width, size.height);
        }
        viewer.start();
        self.spawn_loads(viewer.renderer().features());
        self.viewer = Some(viewer);
    }

    fn spawn_loads(&self, features: wgpu::Features) {
        let assets = self.config.assets.clone();
        let root = assets.root.clone();
        let urls = cube_urls(&assets.cube_prefix, &assets.cube_postfix);
        self.spawn_event(async move {
            let start = Instant::now();
            let result = load_cube_texture(&root, &urls).await;
            log::info!("cube texture settled after {:?}", start.elapsed());
            ViewerEvent::CubeTextureLoaded(result)
        });

        let mut loader = CompressedTextureLoader::new();
        loader.detect_support(features);
        self.spawn_event(async move {
            let start = Instant::now();
            let result = loader.load(&assets.root, &assets.texture).await;
            log::info!("{} settled after {:?}", assets.texture, start.elapsed());
            ViewerEvent::TextureLoaded(result)
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn spawn_event<F>(&self, fut: F)
    where
        F: Future<Output = ViewerEvent> + Send + 'static,
    {
        let proxy = self.proxy.clone();
        self.async_runtime.spawn(async move {
            send(&proxy, fut.await);
        });
    }

    #[cfg(target_arch = "wasm32")]
    fn spawn_event<F>(&self, fut: F)
    where
        F: Future<Output = ViewerEvent> + 'static,
    {
        let proxy = self.proxy.clone();
        wasm_bindgen_futures::spawn_local(async move {
            send(&proxy, fut.await);
        });
    }
}

fn send(proxy: &EventLoopProxy<ViewerEvent>, event: ViewerEvent) {
    if let Err(e) = proxy.send_event(event) {
        log::warn!("the event loop closed before {:?} was delivered", e.0);
    }
}

async fn create_viewer(window: Arc<Window>, config: ViewerConfig) -> anyhow::Result<Viewer<GpuRenderer>> {
    let ctx = Context::new(window).await?;
    Ok(Viewer::new(config, GpuRenderer::new(ctx)))
}

impl ApplicationHandler<ViewerEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() || self.initializing {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title(self.config.title.clone());

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("cannot create a window: {e}");
                event_loop.exit();
                return;
            }
        };
        self.initializing = true;
        let init_future = create_viewer(window, self.config.clone());

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok(viewer) => self.on_initialized(viewer),
                Err(e) => {
                    log::error!("cannot set up the renderer: {e:#}");
                    event_loop.exit();
                }
            }
            self.initializing = false;
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match init_future.await {
                    Ok(viewer) => send(&proxy, ViewerEvent::Initialized(Box::new(viewer))),
                    Err(e) => log::error!("cannot set up the renderer: {e:#}"),
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: ViewerEvent) {
        log::debug!("{:?}", event);
        match event {
            ViewerEvent::Initialized(viewer) => {
                // This is the message from our wasm `spawn_local`
                self.initializing = false;
                self.on_initialized(*viewer);
            }
            ViewerEvent::CubeTextureLoaded(result) => {
                if let Some(viewer) = &mut self.viewer {
                    viewer.on_cube_texture_loaded(result);
                }
            }
            ViewerEvent::TextureLoaded(result) => {
                if let Some(viewer) = &mut self.viewer {
                    viewer.on_texture_loaded(result);
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let viewer = match &mut self.viewer {
            Some(viewer) => viewer,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => viewer.resize(size.width, size.height),
            // The window system lost the contents, e.g. after being uncovered.
            WindowEvent::RedrawRequested => viewer.redraw(),
            event => {
                viewer.handle_window_event(&event);
            }
        }
    }
}

/// Opens the window and runs until it is closed.
pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| anyhow::anyhow!("could not initialize logger: {e}"))?;
    }

    let event_loop: EventLoop<ViewerEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}
