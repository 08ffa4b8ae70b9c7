//! CPU still frames of the threads background.
//!
//! A [`CpuSurface`] plugs into the same [`ThreadsView`] lifecycle as the GPU
//! surface but evaluates [`crate::field::shade`] per pixel into an RGBA image.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::{Rgba, RgbaImage};
use scheduler::MorphSchedule;
use tracing::info;

use crate::field::{over_black, shade, Vec2};
use crate::lifecycle::{Container, FrameUniforms, RenderSurface, ThreadsView};
use crate::runtime::{FixedTimeSource, TimeSource};
use crate::types::ThreadsProps;

/// Offscreen canvas of a fixed size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Container for Canvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Software [`RenderSurface`] writing opaque pixels composited over black.
#[derive(Debug, Clone)]
pub struct CpuSurface {
    image: RgbaImage,
}

impl CpuSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width.max(1), height.max(1)),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

fn to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl RenderSurface for CpuSurface {
    fn set_size(&mut self, width: u32, height: u32) {
        if self.image.dimensions() != (width, height) {
            self.image = RgbaImage::new(width.max(1), height.max(1));
        }
    }

    fn render(&mut self, frame: &FrameUniforms<'_>) -> Result<()> {
        let params = frame.field_params();
        let (width, height) = self.image.dimensions();
        for (x, y, pixel) in self.image.enumerate_pixels_mut() {
            // Image rows grow downwards; the field has a bottom-left origin.
            let uv = Vec2::new(
                (x as f32 + 0.5) / width as f32,
                1.0 - (y as f32 + 0.5) / height as f32,
            );
            let [r, g, b] = over_black(shade(uv, &params));
            *pixel = Rgba([to_byte(r), to_byte(g), to_byte(b), 255]);
        }
        Ok(())
    }
}

/// One still frame to evaluate.
#[derive(Debug, Clone)]
pub struct StillRequest {
    pub width: u32,
    pub height: u32,
    /// Seconds since the animation started.
    pub time: f64,
    pub props: ThreadsProps,
    pub schedule: MorphSchedule,
}

/// Renders one frame on the CPU through the regular view lifecycle.
pub fn render_still(request: &StillRequest) -> Result<RgbaImage> {
    if request.width == 0 || request.height == 0 {
        return Err(anyhow!(
            "still size must be non-zero (got {}x{})",
            request.width,
            request.height
        ));
    }
    let canvas = Canvas {
        width: request.width,
        height: request.height,
    };
    let mut view = ThreadsView::mount(
        Some(&canvas),
        request.props.clone(),
        request.schedule,
        None,
        |canvas: &Canvas| Ok(CpuSurface::new(canvas.width, canvas.height)),
    )
    .ok_or_else(|| anyhow!("failed to mount still canvas"))?;

    let mut time_source = FixedTimeSource::new(request.time);
    view.frame(time_source.sample())?
        .ok_or_else(|| anyhow!("still view did not produce a frame"))?;

    view.into_surface()
        .map(CpuSurface::into_image)
        .ok_or_else(|| anyhow!("still surface already released"))
}

/// Renders a still and writes it as PNG.
pub fn export_png(request: &StillRequest, path: &Path) -> Result<()> {
    let image = render_still(request)?;
    image
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("failed to write still frame to {}", path.display()))?;
    info!(
        path = %path.display(),
        width = request.width,
        height = request.height,
        time = request.time,
        "exported still frame"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VisualPreset;

    fn request(time: f64) -> StillRequest {
        StillRequest {
            width: 96,
            height: 64,
            time,
            props: ThreadsProps {
                morph: true,
                ..ThreadsProps::default()
            },
            schedule: MorphSchedule::default(),
        }
    }

    fn brightness(image: &RgbaImage) -> u64 {
        image.pixels().map(|p| u64::from(p[0])).sum()
    }

    #[test]
    fn logo_frame_lights_fader_pixels_only() {
        let image = render_still(&request(0.0)).expect("render");
        assert_eq!(image.dimensions(), (96, 64));
        assert!(brightness(&image) > 0);
        // Corners stay black while the logo is shown.
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(image.get_pixel(95, 63).0, [0, 0, 0, 255]);
    }

    #[test]
    fn colour_is_applied_per_channel() {
        let mut req = request(0.0);
        req.props.color = [1.0, 0.0, 0.0];
        let image = render_still(&req).expect("render");
        assert!(image.pixels().all(|p| p[1] == 0 && p[2] == 0));
        assert!(brightness(&image) > 0);
    }

    #[test]
    fn heartbeat_preset_never_draws_threads() {
        let mut req = request(7.0);
        req.props.preset = VisualPreset::Heartbeat;
        req.props.morph = false;
        let image = render_still(&req).expect("render");
        assert!(brightness(&image) > 0);
        assert_eq!(image.get_pixel(0, 32).0, [0, 0, 0, 255]);
    }

    #[test]
    fn zero_size_is_rejected() {
        let mut req = request(0.0);
        req.width = 0;
        assert!(render_still(&req).is_err());
    }

    #[test]
    fn exports_png_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("still.png");
        export_png(&request(7.0), &path).expect("export");
        let decoded = image::open(&path).expect("decode png");
        assert_eq!((decoded.width(), decoded.height()), (96, 64));
    }
}
