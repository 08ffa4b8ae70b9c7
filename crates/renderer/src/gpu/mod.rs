//! wgpu implementation of the threads surface.
//!
//! - `context` owns the instance, device and swapchain and reconfigures them
//!   on resize or when the surface is lost.
//! - `pipeline` compiles the GLSL sources into a single render pipeline with
//!   one uniform bind group.
//! - `uniforms` packs a frame into the std140 block the shader reads.
//! - `state` glues everything together as [`GpuSurface`].

mod context;
mod pipeline;
mod state;
mod uniforms;

pub use state::GpuSurface;
