#![allow(dead_code)]

use probe_view::{
    camera::PerspectiveCamera,
    config::ViewerConfig,
    data_structures::{
        scene_graph::Scene,
        texture::{CubeTexture, PixelFormat, Texture2D},
    },
    render::Renderer,
    viewer::Viewer,
};

/// What the renderer saw when it was asked to draw.
#[derive(Clone, Debug)]
pub(crate) struct Frame {
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub size: (u32, u32),
}

/// Stands in for the GPU: every render call is recorded with a snapshot of
/// its inputs.
#[derive(Debug)]
pub(crate) struct RecordingRenderer {
    size: (u32, u32),
    pub frames: Vec<Frame>,
    pub fail_next: bool,
}

impl RecordingRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            frames: Vec::new(),
            fail_next: false,
        }
    }

    pub fn redraws(&self) -> usize {
        self.frames.len()
    }

    pub fn last_frame(&self) -> &Frame {
        self.frames.last().expect("nothing was rendered yet")
    }
}

impl Renderer for RecordingRenderer {
    fn set_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.size = (width, height);
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> anyhow::Result<()> {
        if std::mem::take(&mut self.fail_next) {
            anyhow::bail!("device lost");
        }
        self.frames.push(Frame {
            scene: scene.clone(),
            camera: camera.clone(),
            size: self.size,
        });
        Ok(())
    }
}

pub(crate) fn viewer(width: u32, height: u32) -> Viewer<RecordingRenderer> {
    Viewer::new(ViewerConfig::default(), RecordingRenderer::new(width, height))
}

/// A 4x4 cube map whose faces are each a flat colour.
pub(crate) fn test_cube() -> CubeTexture {
    let colours: [[u8; 4]; 6] = [
        [255, 0, 0, 255],
        [0, 255, 0, 255],
        [0, 0, 255, 255],
        [255, 255, 0, 255],
        [0, 255, 255, 255],
        [255, 0, 255, 255],
    ];
    CubeTexture::new(
        "test cube",
        colours.map(|c| image::RgbaImage::from_pixel(4, 4, image::Rgba(c))),
    )
}

/// An uncompressed 4x4 texture.
pub(crate) fn test_texture() -> Texture2D {
    let data = [200u8, 100, 50, 255].repeat(16);
    Texture2D::new("test painting", PixelFormat::Rgba8, 4, 4, 1, data)
}
