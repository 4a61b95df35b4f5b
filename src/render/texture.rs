use std::path::Path;

use anyhow::{Context, Result};
use glam::Vec3;
use image::RgbaImage;
use log::error;

/// Decodes a PNG or JPEG file into tightly packed RGBA8 pixels.
pub fn load_rgba(path: &Path) -> Result<RgbaImage> {
    let bytes = std::fs::read(path).with_context(|| format!("unable to read {}", path.display()))?;
    decode_rgba(&bytes).with_context(|| format!("unable to decode {}", path.display()))
}

pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Converts a linear color into one opaque RGBA8 texel. With `srgb` set the
/// channels are sRGB-encoded, for upload to an `*Srgb` texture that the GPU
/// decodes back to the linear value.
pub fn color_texel(color: Vec3, srgb: bool) -> [u8; 4] {
    let channel = |value: f32| {
        let value = value.clamp(0.0, 1.0);
        let encoded = if srgb { encode_srgb(value) } else { value };
        (encoded * 255.0).round() as u8
    };
    [channel(color.x), channel(color.y), channel(color.z), 255]
}

fn encode_srgb(linear: f32) -> f32 {
    if linear <= 0.003_130_8 {
        linear * 12.92
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    }
}

/// Whether an image of `width` x `height` can be uploaded as one 2D texture.
pub fn fits_texture_limits(width: u32, height: u32, limits: &wgpu::Limits) -> bool {
    let max = limits.max_texture_dimension_2d;
    width > 0 && height > 0 && width <= max && height <= max
}

/// Texel bound when an image file cannot be decoded.
pub const MISSING_TEXEL: [u8; 4] = [0, 0, 0, 255];

/// Sampled 2D texture plus its view.
pub struct Texture {
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl Texture {
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &RgbaImage,
        srgb: bool,
        label: &str,
    ) -> Self {
        let (width, height) = image.dimensions();
        Self::from_rgba(device, queue, image.as_raw(), width, height, srgb, label)
    }

    pub fn solid(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texel: [u8; 4],
        srgb: bool,
        label: &str,
    ) -> Self {
        Self::from_rgba(device, queue, &texel, 1, 1, srgb, label)
    }

    /// Loads `path`, or binds [`MISSING_TEXEL`] and logs when it cannot be
    /// decoded or exceeds the device's texture size limit. Rendering goes on
    /// with a visibly black surface.
    pub fn load_or_missing(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
        srgb: bool,
    ) -> Self {
        let label = path.display().to_string();
        match load_rgba(path) {
            Ok(image) => {
                let (width, height) = image.dimensions();
                if fits_texture_limits(width, height, &device.limits()) {
                    return Self::from_image(device, queue, &image, srgb, &label);
                }
                error!(
                    "failed to load texture {label}: {width}x{height} exceeds the device limit of {}",
                    device.limits().max_texture_dimension_2d
                );
                Self::solid(device, queue, MISSING_TEXEL, srgb, &label)
            }
            Err(err) => {
                error!("failed to load texture: {err:#}");
                Self::solid(device, queue, MISSING_TEXEL, srgb, &label)
            }
        }
    }

    fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &[u8],
        width: u32,
        height: u32,
        srgb: bool,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let format = if srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba};

    use super::*;

    fn encode_png(image: &RgbaImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn decodes_png_to_rgba() {
        let mut source = RgbaImage::new(2, 1);
        source.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        source.put_pixel(1, 0, Rgba([0, 0, 255, 128]));
        let decoded = decode_rgba(&encode_png(&source)).unwrap();
        assert_eq!(decoded, source);
    }

    #[test]
    fn reports_undecodable_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        let err = load_rgba(&path).unwrap_err();
        assert!(format!("{err:#}").contains("unable to decode"));

        let err = load_rgba(&dir.path().join("absent.jpg")).unwrap_err();
        assert!(format!("{err:#}").contains("unable to read"));
    }

    #[test]
    fn color_texels_are_clamped() {
        assert_eq!(color_texel(Vec3::new(1.0, 0.5, 0.0), false), [255, 128, 0, 255]);
        assert_eq!(color_texel(Vec3::new(2.0, -1.0, 0.2), false), [255, 0, 51, 255]);
    }

    #[test]
    fn srgb_texels_are_gamma_encoded() {
        assert_eq!(color_texel(Vec3::new(0.5, 0.0, 1.0), true), [188, 0, 255, 255]);
        assert_eq!(color_texel(Vec3::splat(0.001), true), [3, 3, 3, 255]);
        assert_eq!(color_texel(Vec3::splat(2.0), true), [255, 255, 255, 255]);
    }

    #[test]
    fn oversized_images_do_not_fit() {
        let limits = wgpu::Limits::default();
        let max = limits.max_texture_dimension_2d;
        assert!(fits_texture_limits(1, 1, &limits));
        assert!(fits_texture_limits(max, max, &limits));
        assert!(!fits_texture_limits(max + 1, 16, &limits));
        assert!(!fits_texture_limits(16, max * 2, &limits));
        assert!(!fits_texture_limits(0, 16, &limits));

        let downlevel = wgpu::Limits::downlevel_webgl2_defaults();
        assert!(!fits_texture_limits(4096, 4096, &downlevel));
    }
}
