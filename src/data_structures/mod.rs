//! Scene data: everything the viewer mutates and the renderer reads.
//!
//! - `geometry` holds vertex buffers, primitive builders and the UV flip
//! - `material` describes basic and standard surfaces
//! - `texture` holds CPU-side 2D and cube textures with their colour space
//! - `light_probe` projects cubemaps onto spherical harmonics
//! - `scene_graph` ties meshes, lights and the background together
//!
//! None of these types touch the GPU.

pub mod geometry;
pub mod light_probe;
pub mod material;
pub mod scene_graph;
pub mod texture;
