use std::borrow::Cow;

use anyhow::Result;
use wgpu::naga::ShaderStage;

/// Compiles the static full-screen triangle vertex shader.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> Result<wgpu::ShaderModule> {
    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("fullscreen triangle vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(VERTEX_SHADER_GLSL),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    }))
}

/// Compiles the threads/faders fragment shader.
pub(crate) fn compile_fragment_shader(device: &wgpu::Device) -> Result<wgpu::ShaderModule> {
    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("threads fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(FRAGMENT_SHADER_GLSL),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    }))
}

/// Minimal full-screen triangle vertex shader. `v_uv` has a bottom-left origin.
pub(crate) const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    vec2 pos = positions[vertex_index];
    v_uv = pos * 0.5 + vec2(0.5, 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

/// Threads and fader glyphs. Kept in step with `crate::field`.
///
/// The uniform block layout must match `ThreadsUniforms` in `gpu::uniforms`.
pub(crate) const FRAGMENT_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

#define FADER_COUNT 7
#define LINE_COUNT 40
#define LINE_WIDTH 7.0
#define LINE_BLUR 10.0
#define PULSE_GAIN 0.08

layout(std140, set = 0, binding = 0) uniform ThreadsParams {
    vec4 resolution;        // width, height, aspect, time
    vec4 color;             // rgb, amplitude
    vec4 motion;            // distance, morph, mouse.xy
    vec4 preset;            // stem alpha, knob alpha, pulse, threads enabled
    vec4 faders[FADER_COUNT]; // x, knob center y, knob half height, unused
} ubo;

float pixel(float count, vec2 res) {
    return count / max(max(res.x, res.y), 1.0);
}

float perlin2d(vec2 P) {
    vec2 Pi = floor(P);
    vec4 Pf_Pfmin1 = P.xyxy - vec4(Pi, Pi + 1.0);
    vec4 Pt = vec4(Pi.xy, Pi.xy + 1.0);
    Pt = Pt - floor(Pt * (1.0 / 71.0)) * 71.0;
    Pt += vec2(26.0, 161.0).xyxy;
    Pt *= Pt;
    Pt = Pt.xzxz * Pt.yyww;
    vec4 hash_x = fract(Pt * (1.0 / 951.135664));
    vec4 hash_y = fract(Pt * (1.0 / 642.949883));
    vec4 grad_x = hash_x - 0.49999;
    vec4 grad_y = hash_y - 0.49999;
    vec4 grad_results = inversesqrt(grad_x * grad_x + grad_y * grad_y)
        * (grad_x * Pf_Pfmin1.xzxz + grad_y * Pf_Pfmin1.yyww);
    grad_results *= 1.4142135623730950;
    vec2 blend = Pf_Pfmin1.xy * Pf_Pfmin1.xy * Pf_Pfmin1.xy
        * (Pf_Pfmin1.xy * (Pf_Pfmin1.xy * 6.0 - 15.0) + 10.0);
    vec4 blend2 = vec4(blend, vec2(1.0 - blend));
    return dot(grad_results, blend2.zxzx * blend2.wwyy);
}

float sdCapsule(vec2 p, vec2 a, vec2 b, float r) {
    vec2 pa = p - a;
    vec2 ba = b - a;
    float h = clamp(dot(pa, ba) / max(dot(ba, ba), 1e-8), 0.0, 1.0);
    return length(pa - ba * h) - r;
}

float threadLine(vec2 st, float width, float perc, vec2 mouse, float time,
                 float amplitude, float dist, vec2 res) {
    float split_point = 0.1 + perc * 0.4;

    float amplitude_normal = smoothstep(split_point, 0.7, st.x);
    float final_amplitude = amplitude_normal * 0.5 * amplitude * (1.0 + (mouse.y - 0.5) * 0.2);

    float time_scaled = time / 10.0 + (mouse.x - 0.5);
    float blur = smoothstep(split_point, split_point + 0.05, st.x) * perc;

    float xnoise = mix(
        perlin2d(vec2(time_scaled, st.x + perc) * 2.5),
        perlin2d(vec2(time_scaled, st.x + time_scaled) * 3.5) / 1.5,
        st.x * 0.3
    );

    float y = 0.5 + (perc - 0.5) * dist + xnoise / 2.0 * final_amplitude;
    float blur_px = LINE_BLUR * pixel(1.0, res) * blur;

    float line_start = smoothstep(y + width / 2.0 + blur_px, y, st.y);
    float line_end = smoothstep(y, y - width / 2.0 - blur_px, st.y);

    return clamp((line_start - line_end) * (1.0 - smoothstep(0.0, 1.0, pow(perc, 0.3))), 0.0, 1.0);
}

float drawFaders(vec2 uv, float morph, float time, vec2 res, float aspect) {
    vec2 p = vec2((uv.x - 0.5) * aspect, uv.y - 0.5);

    // 0 on portrait screens, 1 on landscape.
    float r_scale = smoothstep(0.5, 1.5, aspect);
    float px = pixel(1.0, res);
    float x_spread = mix(1.7, 1.0, r_scale);

    float stem_fade = mix(ubo.preset.x, 0.0, smoothstep(0.0, 0.7, morph));
    float knob_fade = ubo.preset.y * (1.0 - smoothstep(0.0, 0.9, morph));
    float stem_width = mix(0.0018 * mix(0.6, 1.0, r_scale), 0.0005, morph);
    float knob_radius = mix(0.028 * mix(0.5, 1.0, r_scale), 0.003, morph);

    float result = 0.0;
    for (int i = 0; i < FADER_COUNT; i++) {
        vec4 fader = ubo.faders[i];
        float fx = (fader.x - 0.5) * x_spread * aspect;
        float fy = fader.y - 0.5;
        float kh = fader.z * mix(0.55, 1.0, r_scale) * (1.0 + PULSE_GAIN * ubo.preset.z);

        float seed = float(i) * 13.7;
        vec2 jitter = vec2(
            perlin2d(vec2(time * 0.4 + seed, uv.y * 3.0)) * morph * 0.4,
            perlin2d(vec2(time * 0.3 + seed + 50.0, uv.y * 2.0)) * morph * 0.2
        );

        float stem_dist = abs(p.x - fx - jitter.x) - stem_width;
        float stem_alpha = smoothstep(px * 2.0, 0.0, stem_dist) * stem_fade;

        vec2 knob_top = vec2(fx, fy + kh) + jitter;
        vec2 knob_bottom = vec2(fx, fy - kh) + jitter;
        float knob_dist = sdCapsule(p, knob_bottom, knob_top, knob_radius);
        float knob_alpha = smoothstep(px * 2.0, -px * 0.5, knob_dist) * knob_fade;

        result = max(result, max(stem_alpha, knob_alpha));
    }
    return result;
}

void main() {
    vec2 res = ubo.resolution.xy;
    vec2 uv = v_uv;
    float time = ubo.resolution.w;
    float morph = ubo.motion.y;

    float threads = 0.0;
    float fade = smoothstep(0.2, 0.8, morph) * ubo.preset.w;
    if (fade > 0.0) {
        float px = pixel(1.0, res);
        float strength = 1.0;
        for (int i = 0; i < LINE_COUNT; i++) {
            float perc = float(i) / float(LINE_COUNT);
            strength *= 1.0 - threadLine(
                uv,
                LINE_WIDTH * px * (1.0 - perc),
                perc,
                ubo.motion.zw,
                time,
                ubo.color.w,
                ubo.motion.x,
                res
            );
        }
        threads = (1.0 - strength) * fade;
    }

    float glyphs = drawFaders(uv, morph, time, res, ubo.resolution.z);
    float combined = max(threads, glyphs);
    outColor = vec4(ubo.color.rgb * combined, combined);
}
";

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::naga::front::glsl::{Frontend, Options};
    use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};

    fn validate(source: &str, stage: ShaderStage) {
        let module = Frontend::default()
            .parse(&Options::from(stage), source)
            .unwrap_or_else(|err| panic!("{stage:?} shader failed to parse: {err:?}"));
        Validator::new(ValidationFlags::all(), Capabilities::empty())
            .validate(&module)
            .unwrap_or_else(|err| panic!("{stage:?} shader failed validation: {err:?}"));
    }

    #[test]
    fn vertex_shader_is_valid_glsl() {
        validate(VERTEX_SHADER_GLSL, ShaderStage::Vertex);
    }

    #[test]
    fn fragment_shader_is_valid_glsl() {
        validate(FRAGMENT_SHADER_GLSL, ShaderStage::Fragment);
    }

    #[test]
    fn fragment_constants_match_cpu_field() {
        use crate::field::{LINE_BLUR, LINE_COUNT, LINE_WIDTH};
        use crate::types::FADER_COUNT;

        assert!(FRAGMENT_SHADER_GLSL.contains(&format!("#define FADER_COUNT {FADER_COUNT}")));
        assert!(FRAGMENT_SHADER_GLSL.contains(&format!("#define LINE_COUNT {LINE_COUNT}")));
        assert!(FRAGMENT_SHADER_GLSL.contains(&format!("#define LINE_WIDTH {LINE_WIDTH:.1}")));
        assert!(FRAGMENT_SHADER_GLSL.contains(&format!("#define LINE_BLUR {LINE_BLUR:.1}")));
    }
}
