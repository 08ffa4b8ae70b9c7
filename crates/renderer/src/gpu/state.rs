use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use tracing::{debug, warn};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::lifecycle::{FrameUniforms, RenderSurface};

use super::context::GpuContext;
use super::pipeline::ThreadsPipeline;
use super::uniforms::ThreadsUniforms;

/// wgpu-backed [`RenderSurface`] for one winit window.
///
/// Dropping it releases the pipeline, buffers, device and swapchain.
pub struct GpuSurface {
    context: GpuContext,
    pipeline: ThreadsPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    last_fps_update: Instant,
    frames_since_last_update: u32,
    frames_per_second: f32,
}

impl GpuSurface {
    pub fn new(window: Arc<Window>) -> Result<Self> {
        let context = GpuContext::new(window)?;
        let pipeline = ThreadsPipeline::new(&context.device, context.surface_format)?;

        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("threads uniform buffer"),
            size: std::mem::size_of::<ThreadsUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("threads uniform bind group"),
                layout: &pipeline.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

        debug!(
            width = context.size.width,
            height = context.size.height,
            format = ?context.surface_format,
            "gpu surface ready"
        );

        Ok(Self {
            context,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            last_fps_update: Instant::now(),
            frames_since_last_update: 0,
            frames_per_second: 60.0,
        })
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    fn track_fps(&mut self, time: f32) {
        let now = Instant::now();
        self.frames_since_last_update += 1;
        let elapsed = now.saturating_duration_since(self.last_fps_update);
        if elapsed >= Duration::from_secs(1) {
            self.frames_per_second = self.frames_since_last_update as f32 / elapsed.as_secs_f32();
            self.frames_since_last_update = 0;
            self.last_fps_update = now;
            debug!(fps = self.frames_per_second.round(), time, "render stats");
        }
    }

    fn acquire(&mut self) -> Result<Option<wgpu::SurfaceTexture>> {
        match self.context.surface.get_current_texture() {
            Ok(frame) => Ok(Some(frame)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("surface lost or outdated; reconfiguring");
                self.context.reconfigure();
                Ok(None)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("timed out acquiring surface texture; skipping frame");
                Ok(None)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(anyhow!("GPU ran out of memory")),
            Err(err) => Err(anyhow!("failed to acquire surface texture: {err}")),
        }
    }
}

impl RenderSurface for GpuSurface {
    fn set_size(&mut self, width: u32, height: u32) {
        self.context.resize(PhysicalSize::new(width, height));
    }

    fn render(&mut self, frame: &FrameUniforms<'_>) -> Result<()> {
        let Some(output) = self.acquire()? else {
            return Ok(());
        };
        self.track_fps(frame.params.time);

        let uniforms = ThreadsUniforms::from_frame(frame);
        self.context
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("threads encoder"),
                });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("threads pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.pipeline.pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl Drop for GpuSurface {
    fn drop(&mut self) {
        debug!("releasing gpu surface");
    }
}
