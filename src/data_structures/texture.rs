//! CPU-side textures as produced by the loaders.
//!
//! A texture is plain pixel data plus a [`ColorSpace`] tag. The tag decides
//! whether the GPU upload uses an sRGB or a linear format, so it has to be
//! set before the texture is attached to a material or the background.
//! Uploads happen lazily inside the renderer and are keyed by [`TextureId`].

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a loaded texture. Clones of a texture keep the same id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(u64);

impl TextureId {
    pub(crate) fn next() -> Self {
        Self(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// How stored colour values are encoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorSpace {
    #[default]
    Linear,
    Srgb,
}

/// Pixel payload layout of a [`Texture2D`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8,
    /// DXT1, 8 bytes per 4x4 block.
    Bc1,
    /// DXT5, 16 bytes per 4x4 block.
    Bc3,
    Bc7,
}

impl PixelFormat {
    pub fn is_compressed(&self) -> bool {
        !matches!(self, PixelFormat::Rgba8)
    }

    /// Size in bytes of one mip level with the given pixel dimensions.
    pub fn level_size(&self, width: u32, height: u32) -> usize {
        let width = width.max(1) as usize;
        let height = height.max(1) as usize;
        match self {
            PixelFormat::Rgba8 => width * height * 4,
            PixelFormat::Bc1 => width.div_ceil(4) * height.div_ceil(4) * 8,
            PixelFormat::Bc3 | PixelFormat::Bc7 => width.div_ceil(4) * height.div_ceil(4) * 16,
        }
    }

    pub fn to_wgpu(&self, color_space: ColorSpace) -> wgpu::TextureFormat {
        use wgpu::TextureFormat as F;
        match (self, color_space) {
            (PixelFormat::Rgba8, ColorSpace::Linear) => F::Rgba8Unorm,
            (PixelFormat::Rgba8, ColorSpace::Srgb) => F::Rgba8UnormSrgb,
            (PixelFormat::Bc1, ColorSpace::Linear) => F::Bc1RgbaUnorm,
            (PixelFormat::Bc1, ColorSpace::Srgb) => F::Bc1RgbaUnormSrgb,
            (PixelFormat::Bc3, ColorSpace::Linear) => F::Bc3RgbaUnorm,
            (PixelFormat::Bc3, ColorSpace::Srgb) => F::Bc3RgbaUnormSrgb,
            (PixelFormat::Bc7, ColorSpace::Linear) => F::Bc7RgbaUnorm,
            (PixelFormat::Bc7, ColorSpace::Srgb) => F::Bc7RgbaUnormSrgb,
        }
    }
}

/// A 2D texture with its full mip chain stored level after level in `data`.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture2D {
    id: TextureId,
    pub label: String,
    pub color_space: ColorSpace,
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub mip_level_count: u32,
    pub data: Vec<u8>,
}

impl Texture2D {
    pub fn new(
        label: impl Into<String>,
        format: PixelFormat,
        width: u32,
        height: u32,
        mip_level_count: u32,
        data: Vec<u8>,
    ) -> Self {
        Self {
            id: TextureId::next(),
            label: label.into(),
            color_space: ColorSpace::default(),
            format,
            width,
            height,
            mip_level_count: mip_level_count.max(1),
            data,
        }
    }

    pub fn from_rgba(label: impl Into<String>, img: &image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(label, PixelFormat::Rgba8, width, height, 1, img.as_raw().clone())
    }

    pub fn id(&self) -> TextureId {
        self.id
    }
}

/// Six square faces in the order +X, -X, +Y, -Y, +Z, -Z.
#[derive(Clone, Debug, PartialEq)]
pub struct CubeTexture {
    id: TextureId,
    pub label: String,
    pub color_space: ColorSpace,
    pub faces: [image::RgbaImage; 6],
}

impl CubeTexture {
    pub fn new(label: impl Into<String>, faces: [image::RgbaImage; 6]) -> Self {
        Self {
            id: TextureId::next(),
            label: label.into(),
            color_space: ColorSpace::default(),
            faces,
        }
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Edge length of a face in pixels.
    pub fn size(&self) -> u32 {
        self.faces[0].width()
    }

    /// All faces concatenated, layer after layer, as expected by the upload.
    pub fn layer_major_bytes(&self) -> Vec<u8> {
        self.faces
            .iter()
            .flat_map(|face| face.as_raw().iter().copied())
            .collect()
    }
}
