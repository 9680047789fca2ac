use std::path::Path;

use anyhow::{bail, ensure};

use crate::{data_structures::texture::CubeTexture, resources::load_binary};

/// Face suffixes in upload order: +X, -X, +Y, -Y, +Z, -Z.
pub const FACE_SUFFIXES: [&str; 6] = ["px", "nx", "py", "ny", "pz", "nz"];

/// The six face file names for `prefix` + axis + `postfix`.
pub fn cube_urls(prefix: &str, postfix: &str) -> [String; 6] {
    FACE_SUFFIXES.map(|axis| format!("{prefix}{axis}{postfix}"))
}

/// Fetches and decodes all six faces concurrently.
///
/// Fails if any face is missing or undecodable, or if the faces are not
/// square images of one common size.
pub async fn load_cube_texture(root: &Path, urls: &[String; 6]) -> anyhow::Result<CubeTexture> {
    let faces = futures::future::try_join_all(urls.iter().map(|url| async move {
        let bytes = load_binary(root, url).await?;
        let img = image::load_from_memory(&bytes)
            .map_err(|e| anyhow::anyhow!("cannot decode cube face {url}: {e}"))?;
        anyhow::Ok(img.to_rgba8())
    }))
    .await?;

    let faces: [image::RgbaImage; 6] = match faces.try_into() {
        Ok(faces) => faces,
        Err(faces) => bail!("expected 6 cube faces, got {}", faces.len()),
    };
    let size = faces[0].width();
    ensure!(size > 0, "cube face {} is empty", urls[0]);
    for (face, url) in faces.iter().zip(urls) {
        ensure!(
            face.width() == size && face.height() == size,
            "cube face {url} is {}x{}, expected {size}x{size}",
            face.width(),
            face.height()
        );
    }

    Ok(CubeTexture::new(urls[0].clone(), faces))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_follow_the_axis_convention() {
        let urls = cube_urls("../resources/cube/", ".png");
        assert_eq!(urls[0], "../resources/cube/px.png");
        assert_eq!(urls[1], "../resources/cube/nx.png");
        assert_eq!(urls[5], "../resources/cube/nz.png");
    }

    fn write_face(dir: &Path, name: &str, width: u32, height: u32) {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        img.save(dir.join(name)).unwrap();
    }

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("probe-view-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn loads_six_square_faces() {
        let dir = temp_dir("cube-ok");
        let urls = cube_urls("", ".png");
        for url in &urls {
            write_face(&dir, url, 4, 4);
        }
        let cube = load_cube_texture(&dir, &urls).await.unwrap();
        assert_eq!(cube.size(), 4);
        assert_eq!(cube.layer_major_bytes().len(), 6 * 4 * 4 * 4);
        assert_eq!(cube.faces[3].get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    #[tokio::test]
    async fn rejects_mismatched_faces() {
        let dir = temp_dir("cube-mismatch");
        let urls = cube_urls("", ".png");
        for (i, url) in urls.iter().enumerate() {
            let size = if i == 4 { 2 } else { 4 };
            write_face(&dir, url, size, size);
        }
        let err = load_cube_texture(&dir, &urls).await.unwrap_err();
        assert!(err.to_string().contains("pz.png"), "{err}");
    }

    #[tokio::test]
    async fn missing_face_is_an_error() {
        let dir = temp_dir("cube-missing");
        let urls = cube_urls("absent_", ".png");
        assert!(load_cube_texture(&dir, &urls).await.is_err());
    }
}
