//! Renderer crate for the atto sound hero background.
//!
//! The background is a single full-screen fragment shader: forty thin threads
//! displaced by gradient noise that periodically morph into a seven-fader logo
//! and back. The overall flow is:
//!
//! ```text
//!   attosite run
//!          │ RendererConfig
//!          ▼
//!   WindowRuntime ──▶ ThreadsView ──▶ AnimationState::advance() ──▶ MorphPublisher
//!                          │
//!                          └─▶ RenderSurface::render() ──▶ GpuSurface (wgpu) | CpuSurface (still)
//! ```
//!
//! [`field`] holds a CPU mirror of the shader so still frames and tests do not
//! need a GPU. [`lifecycle::ThreadsView`] owns one surface and one animation
//! state and releases both on drop.

pub mod animation;
mod compile;
pub mod field;
mod gpu;
pub mod lifecycle;
pub mod logo;
pub mod runtime;
pub mod still;
pub mod types;
mod window;

pub use animation::{
    morph_channel, AnimationState, FrameParams, MorphPublisher, MorphSample, MorphSubscriber,
    MouseSmoother, MOUSE_SMOOTHING,
};
pub use gpu::GpuSurface;
pub use lifecycle::{Container, FrameLoop, FrameUniforms, RenderSurface, ThreadsView, Viewport};
pub use logo::logo_svg;
pub use runtime::{
    time_source_for_policy, BoxedTimeSource, FixedTimeSource, RenderPolicy, SystemTimeSource,
    TimeSample, TimeSource,
};
pub use still::{export_png, render_still, CpuSurface, StillRequest};
pub use types::{Fader, RendererConfig, ThreadsProps, VisualPreset, FADER_COUNT};
pub use window::WindowRuntime;
