//! probe-view
//!
//! A render-on-demand viewer for a small scene: a ground plane carrying a
//! block-compressed painting and a mirror sphere lit by an environment cube
//! map and the light probe derived from it. It runs natively in a winit
//! window and in the browser on a `canvas` element.
//!
//! High-level modules
//! - `camera`: perspective camera, its uniform and orbit controls
//! - `config`: code-level settings and asset locations
//! - `context`: GPU device, queue and the surface or offscreen target
//! - `data_structures`: CPU-side scene data (geometry, materials, textures, light probe)
//! - `flow`: the winit event loop and async load plumbing
//! - `pipelines`: render pipelines and their WGSL shaders
//! - `render`: the [`render::Renderer`] seam and the wgpu implementation
//! - `resources`: cube map and compressed texture loaders, GPU texture upload
//! - `viewer`: the application context deciding when to redraw
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod viewer;

pub use config::{AssetConfig, Settings, ViewerConfig};
pub use flow::run;
pub use render::{GpuRenderer, Renderer};
pub use viewer::Viewer;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), JsValue> {
    run(ViewerConfig::default()).map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
