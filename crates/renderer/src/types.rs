use scheduler::MorphSchedule;

use crate::field;
use crate::runtime::RenderPolicy;

/// Number of fader glyphs drawn by every preset.
pub const FADER_COUNT: usize = 7;

/// One decorative fader: a full-height stem plus a capsule knob.
///
/// All values are normalized to the drawing surface (`0.0..=1.0`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fader {
    pub x: f32,
    pub knob_center_y: f32,
    pub knob_half_height: f32,
}

impl Fader {
    pub const fn new(x: f32, knob_center_y: f32, knob_half_height: f32) -> Self {
        Self {
            x,
            knob_center_y,
            knob_half_height,
        }
    }

    pub fn knob_top(&self) -> f32 {
        self.knob_center_y + self.knob_half_height
    }

    pub fn knob_bottom(&self) -> f32 {
        self.knob_center_y - self.knob_half_height
    }
}

/// Fader layout used by the morphing background. Knob tops form two humps and
/// the bottoms form a V.
pub static MORPH_FADERS: [Fader; FADER_COUNT] = [
    Fader::new(0.27, 0.59, 0.18),
    Fader::new(0.35, 0.58, 0.25),
    Fader::new(0.42, 0.52, 0.29),
    Fader::new(0.50, 0.44, 0.33),
    Fader::new(0.58, 0.53, 0.26),
    Fader::new(0.65, 0.60, 0.21),
    Fader::new(0.73, 0.56, 0.19),
];

/// Fader layout of the static logo, also used by the heartbeat preset.
pub static LOGO_FADERS: [Fader; FADER_COUNT] = [
    Fader::new(0.280, 0.570, 0.120),
    Fader::new(0.350, 0.545, 0.270),
    Fader::new(0.420, 0.500, 0.320),
    Fader::new(0.500, 0.415, 0.350),
    Fader::new(0.580, 0.535, 0.300),
    Fader::new(0.650, 0.555, 0.280),
    Fader::new(0.720, 0.550, 0.130),
];

/// The two visual presets of the background. They share the shader but use
/// different fader tables and parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisualPreset {
    /// Threads morphing into the fader logo and back.
    #[default]
    Morph,
    /// Logo faders only, knobs pulsing on a double beat.
    Heartbeat,
}

impl VisualPreset {
    pub fn faders(self) -> &'static [Fader; FADER_COUNT] {
        match self {
            VisualPreset::Morph => &MORPH_FADERS,
            VisualPreset::Heartbeat => &LOGO_FADERS,
        }
    }

    /// Peak stem opacity while the logo is fully shown.
    pub fn stem_alpha(self) -> f32 {
        match self {
            VisualPreset::Morph => 0.45,
            VisualPreset::Heartbeat => 0.55,
        }
    }

    /// Peak knob opacity while the logo is fully shown.
    pub fn knob_alpha(self) -> f32 {
        match self {
            VisualPreset::Morph => 0.78,
            VisualPreset::Heartbeat => 0.9,
        }
    }

    pub fn draws_threads(self) -> bool {
        matches!(self, VisualPreset::Morph)
    }

    /// Morph value used when the morph cycle is disabled.
    pub fn resting_morph(self) -> f32 {
        match self {
            VisualPreset::Morph => 1.0,
            VisualPreset::Heartbeat => 0.0,
        }
    }

    /// Knob pulse envelope in `[0, 1]` at `seconds`.
    pub fn pulse(self, seconds: f64) -> f32 {
        match self {
            VisualPreset::Morph => 0.0,
            VisualPreset::Heartbeat => field::heartbeat_pulse(seconds),
        }
    }
}

impl From<siteconfig::PresetName> for VisualPreset {
    fn from(value: siteconfig::PresetName) -> Self {
        match value {
            siteconfig::PresetName::Morph => VisualPreset::Morph,
            siteconfig::PresetName::Heartbeat => VisualPreset::Heartbeat,
        }
    }
}

/// Visual properties of one mounted threads background.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadsProps {
    /// Line and glyph color as linear RGB in `0.0..=1.0`.
    pub color: [f32; 3],
    pub amplitude: f32,
    /// Vertical spread between neighbouring threads.
    pub distance: f32,
    /// Follow the pointer with a smoothed offset.
    pub mouse_interaction: bool,
    /// Run the logo/threads morph cycle.
    pub morph: bool,
    pub preset: VisualPreset,
}

impl Default for ThreadsProps {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            amplitude: 1.0,
            distance: 0.0,
            mouse_interaction: false,
            morph: false,
            preset: VisualPreset::Morph,
        }
    }
}

impl ThreadsProps {
    pub fn from_config(section: &siteconfig::ThreadsSection) -> Self {
        Self {
            color: section.color,
            amplitude: section.amplitude,
            distance: section.distance,
            mouse_interaction: section.mouse,
            morph: section.morph,
            preset: section.preset.into(),
        }
    }
}

/// Immutable configuration passed to the window runtime at start-up.
#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Initial window size in physical pixels.
    pub surface_size: (u32, u32),
    pub title: String,
    pub props: ThreadsProps,
    pub schedule: MorphSchedule,
    /// Animate continuously or freeze at a timestamp.
    pub policy: RenderPolicy,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            title: "atto sound".to_string(),
            props: ThreadsProps::default(),
            schedule: MorphSchedule::default(),
            policy: RenderPolicy::default(),
        }
    }
}
