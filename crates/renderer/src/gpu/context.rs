use std::sync::Arc;

use anyhow::{anyhow, Context as AnyhowContext, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

/// Instance, device and swapchain for one window.
pub(crate) struct GpuContext {
    pub _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
    pub surface_format: wgpu::TextureFormat,
}

impl GpuContext {
    pub(crate) fn new(window: Arc<Window>) -> Result<Self> {
        let initial_size = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create rendering surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        tracing::debug!(
            adapter = %info.name,
            backend = ?info.backend,
            "threads surface adapter"
        );

        // One uniform block and a full-screen triangle fit the downlevel
        // limits; only the texture size follows the adapter.
        let limits = wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits());
        let size = PhysicalSize::new(
            initial_size.width.clamp(1, limits.max_texture_dimension_2d),
            initial_size.height.clamp(1, limits.max_texture_dimension_2d),
        );
        if size != initial_size {
            tracing::warn!(
                requested = ?initial_size,
                used = ?size,
                "window size clamped to GPU limits"
            );
        }

        let caps = surface.get_capabilities(&adapter);
        let surface_format = pick_format(&caps.formats)?;
        let alpha_mode = if caps.alpha_modes.contains(&wgpu::CompositeAlphaMode::Opaque) {
            wgpu::CompositeAlphaMode::Opaque
        } else {
            caps.alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto)
        };

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("attosite device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits,
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .context("failed to create GPU device")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        tracing::debug!(format = ?surface_format, ?alpha_mode, "threads surface configured");

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            size,
            surface_format,
        })
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 || new_size == self.size {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.reconfigure();
    }

    /// Reapplies the current configuration after the swapchain was lost.
    pub(crate) fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }
}

/// The shader writes display-space colour, so a non-sRGB format is preferred.
fn pick_format(formats: &[wgpu::TextureFormat]) -> Result<wgpu::TextureFormat> {
    let first = formats
        .first()
        .copied()
        .ok_or_else(|| anyhow!("surface reports no supported formats"))?;
    Ok(formats
        .iter()
        .copied()
        .find(|format| !format.is_srgb())
        .unwrap_or_else(|| {
            tracing::warn!(?first, "no non-sRGB surface format; colours will look lighter");
            first
        }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_non_srgb_formats() {
        let formats = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Bgra8Unorm,
        ];
        assert_eq!(pick_format(&formats).unwrap(), wgpu::TextureFormat::Bgra8Unorm);
        assert_eq!(
            pick_format(&formats[..1]).unwrap(),
            wgpu::TextureFormat::Bgra8UnormSrgb
        );
        assert!(pick_format(&[]).is_err());
    }
}
