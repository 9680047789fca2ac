//! Loading of external resources.
//!
//! Loaders only produce CPU-side data, so they can run on any task without
//! touching the device. GPU upload happens later in the renderer.
//!
//! - `cube` fetches the six faces of the environment map
//! - `compressed` reads block-compressed 2D textures from DDS containers
//! - `texture` turns loaded textures into wgpu textures

use std::path::Path;

pub mod compressed;
pub mod cube;
pub mod texture;

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no global window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow::anyhow!("cannot read the page origin: {e:?}"))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

/// Reads a whole resource file.
///
/// On native `file_name` is resolved against `root`; on the web it is fetched
/// relative to `<origin>/assets/`.
pub async fn load_binary(root: &Path, file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let _ = root;
        let url = format_url(file_name)?;
        let response = reqwest::get(url).await?.error_for_status()?;
        response.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = root.join(file_name);
        tokio::fs::read(&path)
            .await
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?
    };

    Ok(data)
}
