//! Headless rendering: draw a chart into a GPU texture, read it back and save
//! it with the `image` crate.

use std::path::Path;
use std::sync::mpsc::channel;

use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat, RgbaImage};
use vello::wgpu;
use vello::{AaConfig, AaSupport, RenderParams, Renderer, RendererOptions, Scene};

use super::scene::build_scene;
use super::text::TextRenderer;
use crate::chart::Chart;
use crate::config::ChartConfig;

/// Raster formats accepted for `--fig`.
pub fn raster_format(path: &Path) -> Result<ImageFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Ok(ImageFormat::Png),
        "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
        "bmp" => Ok(ImageFormat::Bmp),
        "" => anyhow::bail!("{} has no file extension (expected .png, .jpg, .bmp or .svg)", path.display()),
        other => anyhow::bail!("unsupported output format '.{other}' (expected .png, .jpg, .bmp or .svg)"),
    }
}

/// Headless GPU device and Vello renderer.
pub struct OffscreenRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    renderer: Renderer,
}

impl OffscreenRenderer {
    pub fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))
            .map_err(|err| anyhow::anyhow!("wgpu adapter not found: {err}"))?;
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("offscreen chart device"),
            ..Default::default()
        }))?;

        let renderer = Renderer::new(
            &device,
            RendererOptions {
                use_cpu: false,
                antialiasing_support: AaSupport::area_only(),
                num_init_threads: None,
                pipeline_cache: None,
            },
        )
        .map_err(|err| anyhow::anyhow!("creating vello renderer: {err}"))?;

        tracing::debug!("Offscreen renderer ready on {:?}", adapter.get_info().backend);
        Ok(Self {
            device,
            queue,
            renderer,
        })
    }

    /// Render `chart` and return tightly packed RGBA8 pixels.
    pub fn render_rgba(
        &mut self,
        chart: &Chart,
        config: &ChartConfig,
        text: &mut TextRenderer,
    ) -> Result<(u32, u32, Vec<u8>)> {
        let width = chart.width.round().max(1.0) as u32;
        let height = chart.height.round().max(1.0) as u32;
        let max = self.device.limits().max_texture_dimension_2d;
        if width > max || height > max {
            anyhow::bail!("figure is {width}x{height} px but this GPU supports at most {max} px per side");
        }

        let mut scene = Scene::new();
        build_scene(&mut scene, chart, config, text);

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("chart target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer
            .render_to_texture(
                &self.device,
                &self.queue,
                &scene,
                &view,
                &RenderParams {
                    base_color: config.style.background.to_peniko(),
                    width,
                    height,
                    antialiasing_method: AaConfig::Area,
                },
            )
            .map_err(|err| anyhow::anyhow!("rendering chart: {err}"))?;

        let pixels = readback_texture(&self.device, &self.queue, &texture, width, height)?;
        Ok((width, height, pixels))
    }
}

/// Copy an RGBA8 texture into a CPU buffer without row padding.
fn readback_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    width: u32,
    height: u32,
) -> Result<Vec<u8>> {
    let row_bytes = width * 4;
    let padded_bpr = row_bytes.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let readback = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("chart readback"),
        size: u64::from(padded_bpr) * u64::from(height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("chart readback encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &readback,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bpr),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit([encoder.finish()]);

    let slice = readback.slice(..);
    let (sender, receiver) = channel();
    slice.map_async(wgpu::MapMode::Read, move |res| {
        let _ = sender.send(res);
    });
    device
        .poll(wgpu::PollType::Wait)
        .map_err(|err| anyhow::anyhow!("waiting for GPU readback: {err}"))?;
    receiver
        .recv()
        .context("readback callback dropped")?
        .map_err(|err| anyhow::anyhow!("mapping readback buffer: {err}"))?;

    let mapped = slice.get_mapped_range();
    let mut data = Vec::with_capacity(row_bytes as usize * height as usize);
    for row in mapped.chunks_exact(padded_bpr as usize) {
        data.extend_from_slice(&row[..row_bytes as usize]);
    }
    drop(mapped);
    readback.unmap();
    Ok(data)
}

/// Encode RGBA pixels to `path` in the format its extension names.
pub fn save_rgba(path: &Path, width: u32, height: u32, pixels: Vec<u8>) -> Result<()> {
    let format = raster_format(path)?;
    let image = RgbaImage::from_raw(width, height, pixels)
        .context("pixel buffer does not match the figure size")?;
    let image = match format {
        // JPEG has no alpha channel.
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(image).to_rgb8()),
        _ => DynamicImage::ImageRgba8(image),
    };
    image
        .save_with_format(path, format)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!("Wrote {width}x{height} {:?} chart to {}", format, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_format_from_extension() {
        assert_eq!(raster_format(Path::new("out.png")).unwrap(), ImageFormat::Png);
        assert_eq!(raster_format(Path::new("out.JPG")).unwrap(), ImageFormat::Jpeg);
        assert_eq!(raster_format(Path::new("out.jpeg")).unwrap(), ImageFormat::Jpeg);
        assert_eq!(raster_format(Path::new("out.bmp")).unwrap(), ImageFormat::Bmp);
        assert!(raster_format(Path::new("out.gif")).is_err());
        assert!(raster_format(Path::new("out")).is_err());
    }

    #[test]
    fn saves_png_and_jpeg_from_rgba() {
        let dir = tempfile::tempdir().unwrap();
        let pixels: Vec<u8> = [255u8, 0, 0, 255].repeat(6);

        let png = dir.path().join("chart.png");
        save_rgba(&png, 3, 2, pixels.clone()).unwrap();
        let decoded = image::open(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 1).0, [255, 0, 0, 255]);

        let jpg = dir.path().join("chart.jpg");
        save_rgba(&jpg, 3, 2, pixels).unwrap();
        assert!(std::fs::metadata(&jpg).unwrap().len() > 0);
    }

    #[test]
    fn rejects_mismatched_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let err = save_rgba(&dir.path().join("x.png"), 4, 4, vec![0; 8]).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }
}
