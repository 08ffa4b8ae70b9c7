use bytemuck::{Pod, Zeroable};

use crate::lifecycle::FrameUniforms;
use crate::types::FADER_COUNT;

/// std140 mirror of the `ThreadsParams` block in the fragment shader.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ThreadsUniforms {
    /// width, height, aspect, time
    pub resolution: [f32; 4],
    /// rgb, amplitude
    pub color: [f32; 4],
    /// distance, morph, mouse x, mouse y
    pub motion: [f32; 4],
    /// stem alpha, knob alpha, pulse, threads enabled
    pub preset: [f32; 4],
    /// x, knob center y, knob half height, unused
    pub faders: [[f32; 4]; FADER_COUNT],
}

unsafe impl Zeroable for ThreadsUniforms {}
unsafe impl Pod for ThreadsUniforms {}

impl ThreadsUniforms {
    pub fn from_frame(frame: &FrameUniforms<'_>) -> Self {
        let field = frame.field_params();
        let preset = field.preset;

        let mut faders = [[0.0; 4]; FADER_COUNT];
        for (slot, fader) in faders.iter_mut().zip(preset.faders().iter()) {
            *slot = [fader.x, fader.knob_center_y, fader.knob_half_height, 0.0];
        }

        Self {
            resolution: [
                field.resolution[0],
                field.resolution[1],
                field.aspect(),
                field.time,
            ],
            color: [field.color[0], field.color[1], field.color[2], field.amplitude],
            motion: [field.distance, field.morph, field.mouse[0], field.mouse[1]],
            preset: [
                preset.stem_alpha(),
                preset.knob_alpha(),
                field.pulse,
                if preset.draws_threads() { 1.0 } else { 0.0 },
            ],
            faders,
        }
    }
}
