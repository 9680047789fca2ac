//! Block-compressed 2D textures stored in DDS containers.
//!
//! The payload is handed to the GPU as is, so the adapter must support the
//! block format. Call [`CompressedTextureLoader::detect_support`] with the
//! device features before loading anything.

use std::{io::Cursor, path::Path};

use anyhow::{bail, ensure};
use ddsfile::{D3DFormat, Dds, DxgiFormat};

use crate::{
    data_structures::texture::{PixelFormat, Texture2D},
    resources::load_binary,
};

#[derive(Clone, Copy, Debug, Default)]
pub struct CompressedTextureLoader {
    supports_bc: bool,
}

impl CompressedTextureLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records which block formats the device can sample from.
    pub fn detect_support(&mut self, features: wgpu::Features) -> &mut Self {
        self.supports_bc = features.contains(wgpu::Features::TEXTURE_COMPRESSION_BC);
        self
    }

    pub fn supports(&self, format: PixelFormat) -> bool {
        !format.is_compressed() || self.supports_bc
    }

    pub async fn load(&self, root: &Path, file_name: &str) -> anyhow::Result<Texture2D> {
        let bytes = load_binary(root, file_name).await?;
        self.parse(&bytes, file_name)
    }

    /// Decodes a DDS file into a texture with its complete mip chain.
    pub fn parse(&self, bytes: &[u8], label: &str) -> anyhow::Result<Texture2D> {
        let dds = Dds::read(Cursor::new(bytes))
            .map_err(|e| anyhow::anyhow!("{label} is not a valid DDS file: {e:?}"))?;

        let (format, swizzle_bgra) = pixel_format(&dds)
            .ok_or_else(|| anyhow::anyhow!("{label} uses an unsupported DDS pixel format"))?;
        if !self.supports(format) {
            bail!("{label}: {format:?} compression is not supported by this device");
        }

        let width = dds.get_width();
        let height = dds.get_height();
        ensure!(width > 0 && height > 0, "{label} has no pixels");
        if format.is_compressed() {
            ensure!(
                width % 4 == 0 && height % 4 == 0,
                "{label} is {width}x{height}; block-compressed textures need multiples of 4"
            );
        }

        let mip_level_count = dds.get_num_mipmap_levels().max(1);
        let full_chain = u32::BITS - width.max(height).leading_zeros();
        ensure!(
            mip_level_count <= full_chain,
            "{label} claims {mip_level_count} mip levels; a {width}x{height} chain has at most {full_chain}"
        );
        let expected: usize = (0..mip_level_count)
            .map(|level| format.level_size(width >> level, height >> level))
            .sum();
        ensure!(
            dds.data.len() >= expected,
            "{label} is truncated: {} of {expected} bytes",
            dds.data.len()
        );

        let mut data = dds.data[..expected].to_vec();
        if swizzle_bgra {
            data.chunks_exact_mut(4).for_each(|px| px.swap(0, 2));
        }
        log::debug!("{label}: {format:?} {width}x{height}, {mip_level_count} mip levels");
        Ok(Texture2D::new(label, format, width, height, mip_level_count, data))
    }
}

/// Maps a DDS header to our pixel format and whether the bytes are BGRA.
fn pixel_format(dds: &Dds) -> Option<(PixelFormat, bool)> {
    if let Some(format) = dds.get_dxgi_format() {
        return match format {
            DxgiFormat::BC1_UNorm | DxgiFormat::BC1_UNorm_sRGB => Some((PixelFormat::Bc1, false)),
            DxgiFormat::BC3_UNorm | DxgiFormat::BC3_UNorm_sRGB => Some((PixelFormat::Bc3, false)),
            DxgiFormat::BC7_UNorm | DxgiFormat::BC7_UNorm_sRGB => Some((PixelFormat::Bc7, false)),
            DxgiFormat::R8G8B8A8_UNorm | DxgiFormat::R8G8B8A8_UNorm_sRGB => {
                Some((PixelFormat::Rgba8, false))
            }
            DxgiFormat::B8G8R8A8_UNorm | DxgiFormat::B8G8R8A8_UNorm_sRGB => {
                Some((PixelFormat::Rgba8, true))
            }
            _ => None,
        };
    }
    match dds.get_d3d_format()? {
        D3DFormat::DXT1 => Some((PixelFormat::Bc1, false)),
        D3DFormat::DXT5 => Some((PixelFormat::Bc3, false)),
        D3DFormat::A8B8G8R8 => Some((PixelFormat::Rgba8, false)),
        D3DFormat::A8R8G8B8 => Some((PixelFormat::Rgba8, true)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DDSD_CAPS: u32 = 0x1;
    const DDSD_HEIGHT: u32 = 0x2;
    const DDSD_WIDTH: u32 = 0x4;
    const DDSD_PIXELFORMAT: u32 = 0x1000;
    const DDSD_MIPMAPCOUNT: u32 = 0x20000;
    const DDPF_ALPHAPIXELS: u32 = 0x1;
    const DDPF_FOURCC: u32 = 0x4;
    const DDPF_RGB: u32 = 0x40;
    const DDSCAPS_TEXTURE: u32 = 0x1000;

    const DXGI_R8G8B8A8_UNORM: u32 = 28;
    const DXGI_B8G8R8A8_UNORM: u32 = 87;
    const DXGI_BC7_UNORM: u32 = 98;
    const RESOURCE_DIMENSION_TEXTURE2D: u32 = 3;

    /// A legacy DDS header with the given pixel format block (flags, FourCC,
    /// bit count, then the r/g/b/a masks).
    fn dds(width: u32, height: u32, mips: u32, pixel_format: [u32; 7]) -> Vec<u8> {
        let mut header = vec![0u32; 31];
        header[0] = 124;
        header[1] = DDSD_CAPS | DDSD_HEIGHT | DDSD_WIDTH | DDSD_PIXELFORMAT | DDSD_MIPMAPCOUNT;
        header[2] = height;
        header[3] = width;
        header[6] = mips;
        // pixel format block starts at dword 18
        header[18] = 32;
        header[19..26].copy_from_slice(&pixel_format);
        header[26] = DDSCAPS_TEXTURE;

        let mut bytes = b"DDS ".to_vec();
        header.iter().for_each(|d| bytes.extend_from_slice(&d.to_le_bytes()));
        bytes
    }

    fn dxt1(width: u32, height: u32, mips: u32, payload: &[u8]) -> Vec<u8> {
        let fourcc = u32::from_le_bytes(*b"DXT1");
        let mut bytes = dds(width, height, mips, [DDPF_FOURCC, fourcc, 0, 0, 0, 0, 0]);
        bytes.extend_from_slice(payload);
        bytes
    }

    /// A DDS with the extended header naming `dxgi_format`.
    fn dx10(width: u32, height: u32, dxgi_format: u32, payload: &[u8]) -> Vec<u8> {
        let fourcc = u32::from_le_bytes(*b"DX10");
        let mut bytes = dds(width, height, 1, [DDPF_FOURCC, fourcc, 0, 0, 0, 0, 0]);
        // format, dimension, misc flags, array size, alpha mode
        [dxgi_format, RESOURCE_DIMENSION_TEXTURE2D, 0, 1, 0]
            .iter()
            .for_each(|d| bytes.extend_from_slice(&d.to_le_bytes()));
        bytes.extend_from_slice(payload);
        bytes
    }

    /// Uncompressed 32 bit pixels described by channel masks.
    fn masked(width: u32, height: u32, masks: [u32; 4], payload: &[u8]) -> Vec<u8> {
        let [r, g, b, a] = masks;
        let mut bytes = dds(width, height, 1, [DDPF_RGB | DDPF_ALPHAPIXELS, 0, 32, r, g, b, a]);
        bytes.extend_from_slice(payload);
        bytes
    }

    /// Two pixels, red then green, as stored by a BGRA encoder.
    const BGRA_PIXELS: [u8; 8] = [0, 0, 255, 255, 0, 255, 0, 255];
    const RGBA_PIXELS: [u8; 8] = [255, 0, 0, 255, 0, 255, 0, 255];

    fn loader_with_bc() -> CompressedTextureLoader {
        let mut loader = CompressedTextureLoader::new();
        loader.detect_support(wgpu::Features::TEXTURE_COMPRESSION_BC);
        loader
    }

    #[test]
    fn keeps_the_whole_mip_chain() {
        // 8x8 -> 4x4 -> 2x2 -> 1x1: 4 + 1 + 1 + 1 blocks of 8 bytes
        let payload: Vec<u8> = (0..56).collect();
        let texture = loader_with_bc().parse(&dxt1(8, 8, 4, &payload), "painting").unwrap();
        assert_eq!(texture.format, PixelFormat::Bc1);
        assert_eq!((texture.width, texture.height), (8, 8));
        assert_eq!(texture.mip_level_count, 4);
        assert_eq!(texture.data, payload);
        assert_eq!(texture.label, "painting");
    }

    #[test]
    fn block_formats_need_device_support() {
        let loader = CompressedTextureLoader::new();
        let err = loader.parse(&dxt1(4, 4, 1, &[0; 8]), "painting").unwrap_err();
        assert!(err.to_string().contains("not supported"), "{err}");
        assert!(loader.supports(PixelFormat::Rgba8));
    }

    #[test]
    fn rejects_sizes_that_are_not_whole_blocks() {
        let err = loader_with_bc().parse(&dxt1(6, 4, 1, &[0; 16]), "odd").unwrap_err();
        assert!(err.to_string().contains("multiples of 4"), "{err}");
    }

    #[test]
    fn rejects_truncated_and_garbage_input() {
        assert!(loader_with_bc().parse(&dxt1(8, 8, 1, &[0; 8]), "short").is_err());
        assert!(loader_with_bc().parse(b"definitely not a dds", "junk").is_err());
    }

    #[test]
    fn rejects_mip_counts_longer_than_the_chain() {
        let payload = [0; 1024];
        let err = loader_with_bc().parse(&dxt1(8, 8, 10, &payload), "deep").unwrap_err();
        assert!(err.to_string().contains("at most 4"), "{err}");
        assert!(loader_with_bc().parse(&dxt1(8, 8, 40, &payload), "deeper").is_err());
        assert!(loader_with_bc().parse(&dxt1(8, 8, u32::MAX, &payload), "deepest").is_err());
    }

    #[test]
    fn extended_header_formats() {
        let loader = CompressedTextureLoader::new();
        let rgba = loader.parse(&dx10(2, 1, DXGI_R8G8B8A8_UNORM, &RGBA_PIXELS), "rgba").unwrap();
        assert_eq!(rgba.format, PixelFormat::Rgba8);
        assert_eq!((rgba.width, rgba.height, rgba.mip_level_count), (2, 1, 1));
        assert_eq!(rgba.data, RGBA_PIXELS);

        let bgra = loader.parse(&dx10(2, 1, DXGI_B8G8R8A8_UNORM, &BGRA_PIXELS), "bgra").unwrap();
        assert_eq!(bgra.format, PixelFormat::Rgba8);
        assert_eq!(bgra.data, RGBA_PIXELS);

        let bc7 = dx10(4, 4, DXGI_BC7_UNORM, &[7; 16]);
        assert!(loader.parse(&bc7, "bc7").is_err());
        let texture = loader_with_bc().parse(&bc7, "bc7").unwrap();
        assert_eq!(texture.format, PixelFormat::Bc7);
        assert_eq!(texture.data, [7; 16]);
    }

    #[test]
    fn channel_masks_pick_the_byte_order() {
        let loader = CompressedTextureLoader::new();
        let a8r8g8b8 = masked(2, 1, [0x00ff_0000, 0x0000_ff00, 0x0000_00ff, 0xff00_0000], &BGRA_PIXELS);
        assert_eq!(loader.parse(&a8r8g8b8, "argb").unwrap().data, RGBA_PIXELS);

        let a8b8g8r8 = masked(2, 1, [0x0000_00ff, 0x0000_ff00, 0x00ff_0000, 0xff00_0000], &RGBA_PIXELS);
        let texture = loader.parse(&a8b8g8r8, "abgr").unwrap();
        assert_eq!(texture.format, PixelFormat::Rgba8);
        assert_eq!(texture.data, RGBA_PIXELS);
    }
}
