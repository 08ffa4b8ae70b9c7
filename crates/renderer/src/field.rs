//! CPU evaluation of the threads shader.
//!
//! These functions mirror the GLSL in [`crate::compile`] line for line so a
//! frame can be produced without a GPU (still exports, tests). Everything is
//! stateless; coordinates follow the shader convention of a bottom-left
//! origin with `uv` in `0.0..=1.0`.

use std::ops::{Add, Mul, Sub};

use crate::types::{VisualPreset, FADER_COUNT};

/// Number of thread bands layered on top of each other.
pub const LINE_COUNT: usize = 40;
/// Width of the thickest band, in pixels.
pub const LINE_WIDTH: f32 = 7.0;
/// Extra blur applied to the right-hand side of each band, in pixels.
pub const LINE_BLUR: f32 = 10.0;
/// Relative knob growth at the peak of a heartbeat.
pub const PULSE_GAIN: f32 = 0.08;
/// Seconds between two heartbeats.
pub const HEARTBEAT_PERIOD: f32 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// GLSL `fract`: always in `[0, 1)`, also for negative input.
fn fract(x: f32) -> f32 {
    x - x.floor()
}

/// GLSL `smoothstep`, including the reversed-edge form used by the shader.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge0 == edge1 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Size of `count` pixels in uv units for the given resolution.
pub fn pixel(count: f32, resolution: [f32; 2]) -> f32 {
    count / resolution[0].max(resolution[1]).max(1.0)
}

/// 2D gradient noise in roughly `[-1, 1]`; exactly zero on integer lattice points.
pub fn perlin2d(p: Vec2) -> f32 {
    let (ix, iy) = (p.x.floor(), p.y.floor());
    let pf = [p.x - ix, p.y - iy, p.x - ix - 1.0, p.y - iy - 1.0];

    let mut lattice = [ix, iy, ix + 1.0, iy + 1.0];
    for (index, value) in lattice.iter_mut().enumerate() {
        *value -= (*value * (1.0 / 71.0)).floor() * 71.0;
        *value += if index % 2 == 0 { 26.0 } else { 161.0 };
        *value *= *value;
    }
    let hashed = [
        lattice[0] * lattice[1],
        lattice[2] * lattice[1],
        lattice[0] * lattice[3],
        lattice[2] * lattice[3],
    ];

    let offsets_x = [pf[0], pf[2], pf[0], pf[2]];
    let offsets_y = [pf[1], pf[1], pf[3], pf[3]];

    let blend_x = pf[0] * pf[0] * pf[0] * (pf[0] * (pf[0] * 6.0 - 15.0) + 10.0);
    let blend_y = pf[1] * pf[1] * pf[1] * (pf[1] * (pf[1] * 6.0 - 15.0) + 10.0);
    let weights = [
        (1.0 - blend_x) * (1.0 - blend_y),
        blend_x * (1.0 - blend_y),
        (1.0 - blend_x) * blend_y,
        blend_x * blend_y,
    ];

    let mut total = 0.0;
    for corner in 0..4 {
        let grad_x = fract(hashed[corner] * (1.0 / 951.135_66)) - 0.49999;
        let grad_y = fract(hashed[corner] * (1.0 / 642.949_9)) - 0.49999;
        let norm = (grad_x * grad_x + grad_y * grad_y).sqrt().max(f32::EPSILON);
        let gradient = (grad_x * offsets_x[corner] + grad_y * offsets_y[corner]) / norm;
        total += gradient * std::f32::consts::SQRT_2 * weights[corner];
    }
    total
}

/// Signed distance from `p` to the segment `a → b` thickened by `radius`.
pub fn sd_capsule(p: Vec2, a: Vec2, b: Vec2, radius: f32) -> f32 {
    let pa = p - a;
    let ba = b - a;
    let len_sq = ba.dot(ba);
    let h = if len_sq <= f32::EPSILON {
        0.0
    } else {
        (pa.dot(ba) / len_sq).clamp(0.0, 1.0)
    };
    (pa - ba * h).length() - radius
}

/// Double-beat envelope in `[0, 1]` repeating every [`HEARTBEAT_PERIOD`].
pub fn heartbeat_pulse(seconds: f64) -> f32 {
    if !seconds.is_finite() {
        return 0.0;
    }
    let period = f64::from(HEARTBEAT_PERIOD);
    let phase = (seconds.rem_euclid(period) / period) as f32;
    let lub = (-((phase - 0.10) / 0.04).powi(2)).exp();
    let dub = 0.6 * (-((phase - 0.32) / 0.05).powi(2)).exp();
    (lub + dub).clamp(0.0, 1.0)
}

/// Everything the shader reads for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldParams {
    pub resolution: [f32; 2],
    pub time: f32,
    pub morph: f32,
    pub mouse: [f32; 2],
    pub pulse: f32,
    pub color: [f32; 3],
    pub amplitude: f32,
    pub distance: f32,
    pub preset: VisualPreset,
}

impl FieldParams {
    pub fn aspect(&self) -> f32 {
        self.resolution[0] / self.resolution[1].max(1.0)
    }
}

/// Opacity of a single thread band at `st`.
#[allow(clippy::too_many_arguments)]
pub fn thread_line(
    st: Vec2,
    width: f32,
    perc: f32,
    mouse: [f32; 2],
    time: f32,
    amplitude: f32,
    distance: f32,
    resolution: [f32; 2],
) -> f32 {
    let split_point = 0.1 + perc * 0.4;

    let amplitude_normal = smoothstep(split_point, 0.7, st.x);
    let final_amplitude = amplitude_normal * 0.5 * amplitude * (1.0 + (mouse[1] - 0.5) * 0.2);

    let time_scaled = time / 10.0 + (mouse[0] - 0.5);
    let blur = smoothstep(split_point, split_point + 0.05, st.x) * perc;

    let xnoise = mix(
        perlin2d(Vec2::new(time_scaled, st.x + perc) * 2.5),
        perlin2d(Vec2::new(time_scaled, st.x + time_scaled) * 3.5) / 1.5,
        st.x * 0.3,
    );

    let y = 0.5 + (perc - 0.5) * distance + xnoise / 2.0 * final_amplitude;
    let blur_px = LINE_BLUR * pixel(1.0, resolution) * blur;

    let line_start = smoothstep(y + width / 2.0 + blur_px, y, st.y);
    let line_end = smoothstep(y, y - width / 2.0 - blur_px, st.y);

    ((line_start - line_end) * (1.0 - smoothstep(0.0, 1.0, perc.powf(0.3)))).clamp(0.0, 1.0)
}

/// Combined intensity of all thread bands, already faded by morph progress.
pub fn threads_intensity(uv: Vec2, params: &FieldParams) -> f32 {
    if !params.preset.draws_threads() {
        return 0.0;
    }
    let fade = smoothstep(0.2, 0.8, params.morph);
    if fade <= 0.0 {
        return 0.0;
    }
    let px = pixel(1.0, params.resolution);
    let mut strength = 1.0;
    for index in 0..LINE_COUNT {
        let perc = index as f32 / LINE_COUNT as f32;
        strength *= 1.0
            - thread_line(
                uv,
                LINE_WIDTH * px * (1.0 - perc),
                perc,
                params.mouse,
                params.time,
                params.amplitude,
                params.distance,
                params.resolution,
            );
    }
    (1.0 - strength) * fade
}

/// Intensity of the seven fader glyphs; noise jitter grows with morph.
pub fn draw_faders(uv: Vec2, params: &FieldParams) -> f32 {
    let aspect = params.aspect();
    let morph = params.morph;
    let p = Vec2::new((uv.x - 0.5) * aspect, uv.y - 0.5);

    // 0 on portrait screens, 1 on landscape.
    let r_scale = smoothstep(0.5, 1.5, aspect);
    let px = pixel(1.0, params.resolution);
    let x_spread = mix(1.7, 1.0, r_scale);

    let stem_fade = mix(params.preset.stem_alpha(), 0.0, smoothstep(0.0, 0.7, morph));
    let knob_fade = params.preset.knob_alpha() * (1.0 - smoothstep(0.0, 0.9, morph));
    let stem_width = mix(0.0018 * mix(0.6, 1.0, r_scale), 0.0005, morph);
    let knob_radius = mix(0.028 * mix(0.5, 1.0, r_scale), 0.003, morph);

    let faders = params.preset.faders();
    let mut result: f32 = 0.0;
    for (index, fader) in faders.iter().enumerate().take(FADER_COUNT) {
        let fx = (fader.x - 0.5) * x_spread * aspect;
        let fy = fader.knob_center_y - 0.5;
        let kh = fader.knob_half_height * mix(0.55, 1.0, r_scale) * (1.0 + PULSE_GAIN * params.pulse);

        let seed = index as f32 * 13.7;
        let jitter = Vec2::new(
            perlin2d(Vec2::new(params.time * 0.4 + seed, uv.y * 3.0)) * morph * 0.4,
            perlin2d(Vec2::new(params.time * 0.3 + seed + 50.0, uv.y * 2.0)) * morph * 0.2,
        );

        let stem_dist = (p.x - fx - jitter.x).abs() - stem_width;
        let stem_alpha = smoothstep(px * 2.0, 0.0, stem_dist) * stem_fade;

        let knob_top = Vec2::new(fx, fy + kh) + jitter;
        let knob_bottom = Vec2::new(fx, fy - kh) + jitter;
        let knob_dist = sd_capsule(p, knob_bottom, knob_top, knob_radius);
        let knob_alpha = smoothstep(px * 2.0, -px * 0.5, knob_dist) * knob_fade;

        result = result.max(stem_alpha.max(knob_alpha));
    }
    result
}

/// Full shader output at `uv`: premultiplied RGB plus alpha.
pub fn shade(uv: Vec2, params: &FieldParams) -> [f32; 4] {
    let combined = threads_intensity(uv, params).max(draw_faders(uv, params));
    [
        params.color[0] * combined,
        params.color[1] * combined,
        params.color[2] * combined,
        combined,
    ]
}

/// Alpha-blends a shader output onto the black page background.
pub fn over_black(rgba: [f32; 4]) -> [f32; 3] {
    let alpha = rgba[3].clamp(0.0, 1.0);
    [rgba[0] * alpha, rgba[1] * alpha, rgba[2] * alpha]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(morph: f32) -> FieldParams {
        FieldParams {
            resolution: [800.0, 600.0],
            time: 1.5,
            morph,
            mouse: [0.5, 0.5],
            pulse: 0.0,
            color: [1.0, 1.0, 1.0],
            amplitude: 1.0,
            distance: 0.0,
            preset: VisualPreset::Morph,
        }
    }

    #[test]
    fn noise_is_zero_on_lattice_points() {
        for x in -3..3 {
            for y in -3..3 {
                let value = perlin2d(Vec2::new(x as f32, y as f32));
                assert!(value.abs() < 1e-5, "({x},{y}) -> {value}");
            }
        }
    }

    #[test]
    fn noise_is_bounded_and_continuous() {
        let mut max_abs: f32 = 0.0;
        for step_x in 0..200 {
            for step_y in 0..50 {
                let p = Vec2::new(step_x as f32 * 0.073 - 4.0, step_y as f32 * 0.117 + 0.3);
                let value = perlin2d(p);
                max_abs = max_abs.max(value.abs());
                let nudged = perlin2d(p + Vec2::new(1e-3, 0.0));
                assert!((value - nudged).abs() < 0.02);
            }
        }
        assert!(max_abs <= 1.5, "noise escaped range: {max_abs}");
        assert!(max_abs > 0.1, "noise is suspiciously flat");
    }

    #[test]
    fn capsule_distance_is_negative_inside() {
        let a = Vec2::new(0.0, -1.0);
        let b = Vec2::new(0.0, 1.0);
        assert!((sd_capsule(Vec2::new(0.0, 0.0), a, b, 0.5) + 0.5).abs() < 1e-6);
        assert!((sd_capsule(Vec2::new(2.0, 0.0), a, b, 0.5) - 1.5).abs() < 1e-6);
        // Past the end cap the distance is measured to the endpoint.
        assert!((sd_capsule(Vec2::new(0.0, 3.0), a, b, 0.5) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn degenerate_capsule_is_a_circle() {
        let c = Vec2::new(1.0, 1.0);
        assert!((sd_capsule(Vec2::new(1.0, 3.0), c, c, 0.5) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn smoothstep_handles_reversed_edges() {
        assert_eq!(smoothstep(0.0, 1.0, 0.5), 0.5);
        assert_eq!(smoothstep(1.0, 0.0, 0.0), 1.0);
        assert_eq!(smoothstep(1.0, 0.0, 2.0), 0.0);
        assert_eq!(smoothstep(0.3, 0.3, 0.4), 1.0);
    }

    #[test]
    fn threads_hidden_while_logo_is_shown() {
        let logo = params(0.0);
        let uv = Vec2::new(0.5, 0.5);
        assert_eq!(threads_intensity(uv, &logo), 0.0);
    }

    #[test]
    fn threads_visible_on_center_line_when_morphed() {
        let threads = params(1.0);
        let total: f32 = (0..50)
            .map(|step| threads_intensity(Vec2::new(0.05 + step as f32 * 0.005, 0.5), &threads))
            .sum();
        assert!(total > 0.0);
    }

    #[test]
    fn faders_drawn_at_knob_centers_and_vanish_after_morph() {
        let logo = params(0.0);
        let fader = VisualPreset::Morph.faders()[3];
        let uv = Vec2::new(fader.x, fader.knob_center_y);
        let lit = draw_faders(uv, &logo);
        assert!((lit - VisualPreset::Morph.knob_alpha()).abs() < 1e-3, "lit={lit}");

        let threads = params(1.0);
        assert_eq!(draw_faders(uv, &threads), 0.0);
    }

    #[test]
    fn empty_space_between_faders_is_dark() {
        let logo = params(0.0);
        assert_eq!(draw_faders(Vec2::new(0.05, 0.95), &logo), 0.0);
    }

    #[test]
    fn shade_takes_the_brighter_layer_and_applies_color() {
        let mut logo = params(0.0);
        logo.color = [1.0, 0.5, 0.0];
        let fader = VisualPreset::Morph.faders()[0];
        let rgba = shade(Vec2::new(fader.x, fader.knob_center_y), &logo);
        assert!((rgba[3] - 0.78).abs() < 1e-3);
        assert!((rgba[1] - rgba[3] * 0.5).abs() < 1e-6);
        assert_eq!(rgba[2], 0.0);
    }

    #[test]
    fn heartbeat_pulse_peaks_once_per_period() {
        let period = f64::from(HEARTBEAT_PERIOD);
        let peak = heartbeat_pulse(0.10 * period);
        assert!(peak > 0.95);
        assert!(heartbeat_pulse(0.7 * period) < 0.01);
        let later = heartbeat_pulse(0.10 * period + 3.0 * period);
        assert!((peak - later).abs() < 1e-3);
        let much_later = heartbeat_pulse(0.10 * period + 2_000_000.0 * period);
        assert!((peak - much_later).abs() < 1e-3);
        assert_eq!(heartbeat_pulse(f64::NAN), 0.0);
    }
}
