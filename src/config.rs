//! Code-level configuration of the viewer.
//!
//! Nothing here is reloaded at runtime. Values are copied onto the scene
//! objects that use them when those are constructed.

use std::path::PathBuf;

/// Lighting intensities, all in linear colour space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Settings {
    /// Scales the light probe's diffuse contribution; applied every time the
    /// lights are uploaded.
    pub light_probe_intensity: f32,
    pub directional_light_intensity: f32,
    pub env_map_intensity: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            light_probe_intensity: 1.0,
            directional_light_intensity: 0.2,
            env_map_intensity: 1.0,
        }
    }
}

/// Where the two external resources live.
///
/// Native builds resolve every file name relative to `root`. On the web the
/// files are fetched from `<origin>/assets/` and `root` is ignored.
#[derive(Clone, Debug)]
pub struct AssetConfig {
    pub root: PathBuf,
    pub cube_prefix: String,
    pub cube_postfix: String,
    pub texture: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./assets"),
            cube_prefix: "cube/".to_string(),
            cube_postfix: ".png".to_string(),
            texture: "painting1.dds".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub settings: Settings,
    pub assets: AssetConfig,
    pub title: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            assets: AssetConfig::default(),
            title: "probe-view".to_string(),
        }
    }
}
