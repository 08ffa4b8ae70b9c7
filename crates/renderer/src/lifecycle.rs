//! Mount, resize and teardown of one threads view.
//!
//! A [`ThreadsView`] owns exactly one [`RenderSurface`] and one
//! [`AnimationState`]. Mounting fails soft: a missing container or a surface
//! factory error yields `None` and nothing is drawn.

use std::sync::Arc;

use anyhow::Result;
use scheduler::MorphSchedule;
use tracing::{debug, info, warn};

use crate::animation::{AnimationState, FrameParams, MorphPublisher};
use crate::field::FieldParams;
use crate::runtime::TimeSample;
use crate::types::ThreadsProps;

/// Current drawable size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Applies a new size. Zero-sized updates (minimised windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        if self.width == width && self.height == height {
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn resolution(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

/// State of the frame request handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Idle,
    Pending,
    Cancelled,
}

/// Models the "request next frame" handle of a display-paced loop.
#[derive(Debug)]
pub struct FrameLoop {
    state: LoopState,
    frames: u64,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Idle,
            frames: 0,
        }
    }

    /// Requests the next frame. No-op once cancelled.
    pub fn request(&mut self) -> bool {
        match self.state {
            LoopState::Cancelled => false,
            _ => {
                self.state = LoopState::Pending;
                true
            }
        }
    }

    /// Consumes a pending request. Returns false when no frame should run.
    pub fn on_frame(&mut self) -> bool {
        if self.state != LoopState::Pending {
            return false;
        }
        self.state = LoopState::Idle;
        self.frames += 1;
        true
    }

    /// Stops the loop. Returns true only for the call that actually cancelled.
    pub fn cancel(&mut self) -> bool {
        if self.state == LoopState::Cancelled {
            return false;
        }
        self.state = LoopState::Cancelled;
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == LoopState::Cancelled
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// Anything that can host a view and report its size.
pub trait Container {
    fn size(&self) -> (u32, u32);
}

impl Container for winit::window::Window {
    fn size(&self) -> (u32, u32) {
        let size = self.inner_size();
        (size.width, size.height)
    }
}

impl<C: Container + ?Sized> Container for Arc<C> {
    fn size(&self) -> (u32, u32) {
        (**self).size()
    }
}

/// Everything a surface needs to draw one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameUniforms<'a> {
    pub params: FrameParams,
    pub viewport: Viewport,
    pub props: &'a ThreadsProps,
}

impl FrameUniforms<'_> {
    pub fn field_params(&self) -> FieldParams {
        FieldParams {
            resolution: self.viewport.resolution(),
            time: self.params.time,
            morph: self.params.morph,
            mouse: self.params.mouse,
            pulse: self.params.pulse,
            color: self.props.color,
            amplitude: self.props.amplitude,
            distance: self.props.distance,
            preset: self.props.preset,
        }
    }
}

/// The drawing collaborator of a view. Dropping it releases its resources.
pub trait RenderSurface {
    fn set_size(&mut self, width: u32, height: u32);
    fn render(&mut self, frame: &FrameUniforms<'_>) -> Result<()>;
}

/// One mounted threads background.
pub struct ThreadsView<S: RenderSurface> {
    surface: Option<S>,
    animation: AnimationState,
    frame_loop: FrameLoop,
    viewport: Viewport,
    props: ThreadsProps,
}

impl<S: RenderSurface> ThreadsView<S> {
    /// Mounts a view into `container`, creating its surface through `factory`.
    pub fn mount<C, F>(
        container: Option<&C>,
        props: ThreadsProps,
        schedule: MorphSchedule,
        publisher: Option<MorphPublisher>,
        factory: F,
    ) -> Option<Self>
    where
        C: Container + ?Sized,
        F: FnOnce(&C) -> Result<S>,
    {
        let Some(container) = container else {
            debug!("no container to mount threads view into");
            return None;
        };

        let mut surface = match factory(container) {
            Ok(surface) => surface,
            Err(err) => {
                warn!(error = %err, "rendering context unavailable; threads view disabled");
                return None;
            }
        };

        let (width, height) = container.size();
        let viewport = Viewport::new(width, height);
        surface.set_size(viewport.width, viewport.height);

        let animation = AnimationState::new(&props, schedule).with_publisher(publisher);
        let mut frame_loop = FrameLoop::new();
        frame_loop.request();

        info!(
            width = viewport.width,
            height = viewport.height,
            preset = ?props.preset,
            "threads view mounted"
        );

        Some(Self {
            surface: Some(surface),
            animation,
            frame_loop,
            viewport,
            props,
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn props(&self) -> &ThreadsProps {
        &self.props
    }

    pub fn animation(&self) -> &AnimationState {
        &self.animation
    }

    pub fn frame_loop(&self) -> &FrameLoop {
        &self.frame_loop
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if !self.viewport.resize(width, height) {
            return;
        }
        if let Some(surface) = self.surface.as_mut() {
            surface.set_size(width, height);
        }
        debug!(width, height, aspect = self.viewport.aspect(), "threads view resized");
    }

    /// Pointer position in physical pixels, top-left origin.
    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        if !self.animation.mouse_enabled() {
            return;
        }
        let normalized = [
            (x / f64::from(self.viewport.width)) as f32,
            1.0 - (y / f64::from(self.viewport.height)) as f32,
        ];
        self.animation.pointer_moved(normalized);
    }

    pub fn pointer_left(&mut self) {
        self.animation.pointer_left();
    }

    /// Runs one tick if a frame is pending, then requests the next one.
    pub fn frame(&mut self, sample: TimeSample) -> Result<Option<FrameParams>> {
        if !self.frame_loop.on_frame() {
            return Ok(None);
        }
        let Some(surface) = self.surface.as_mut() else {
            return Ok(None);
        };
        let params = self.animation.advance(sample);
        let uniforms = FrameUniforms {
            params,
            viewport: self.viewport,
            props: &self.props,
        };
        surface.render(&uniforms)?;
        self.frame_loop.request();
        Ok(Some(params))
    }

    /// Stops the loop and hands the surface back to the caller.
    pub fn into_surface(mut self) -> Option<S> {
        self.frame_loop.cancel();
        self.surface.take()
    }

    /// Stops the loop and releases the surface.
    pub fn unmount(self) {
        drop(self);
    }
}

impl<S: RenderSurface> Drop for ThreadsView<S> {
    fn drop(&mut self) {
        let cancelled = self.frame_loop.cancel();
        if let Some(surface) = self.surface.take() {
            drop(surface);
            debug!(
                frames = self.frame_loop.frames(),
                cancelled, "threads view released its surface"
            );
        }
    }
}
