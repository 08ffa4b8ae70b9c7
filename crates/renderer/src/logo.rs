//! Static SVG rendition of the fader logo.
//!
//! Shader coordinates map onto a `-100..100` viewBox with the y axis inverted.

use std::fmt::Write as _;

use crate::types::{Fader, LOGO_FADERS};

pub const CIRCLE_RADIUS: f32 = 96.0;
pub const CAPSULE_WIDTH: f32 = 12.8;
pub const STEM_WIDTH: f32 = 1.2;
pub const STEM_OPACITY: f32 = 0.55;

const SHADER_SCALE: f32 = 500.0;
const X_SCALE: f32 = 0.704;
const Y_SCALE: f32 = 0.336;

/// Fader converted to SVG space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogoStroke {
    pub x: f32,
    pub top: f32,
    pub bottom: f32,
}

impl LogoStroke {
    pub fn from_fader(fader: &Fader) -> Self {
        let to_x = |x: f32| (x - 0.5) * X_SCALE * SHADER_SCALE;
        let to_y = |y: f32| -(y - 0.5) * Y_SCALE * SHADER_SCALE;
        Self {
            x: round1(to_x(fader.x)),
            top: round1(to_y(fader.knob_top())),
            bottom: round1(to_y(fader.knob_bottom())),
        }
    }
}

fn round1(value: f32) -> f32 {
    let rounded = (value * 10.0).round() / 10.0;
    // Avoid printing "-0".
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

pub fn logo_strokes() -> Vec<LogoStroke> {
    LOGO_FADERS.iter().map(LogoStroke::from_fader).collect()
}

fn hex_color(color: [f32; 3]) -> String {
    let [r, g, b] = color.map(|channel| (channel.clamp(0.0, 1.0) * 255.0).round() as u8);
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Renders the logo as a standalone SVG document.
pub fn logo_svg(color: [f32; 3]) -> String {
    let stroke = hex_color(color);
    let strokes = logo_strokes();
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg viewBox="-100 -100 200 200" xmlns="http://www.w3.org/2000/svg">"#
    );
    let _ = writeln!(svg, "  <defs>");
    let _ = writeln!(svg, r#"    <clipPath id="logo-circle">"#);
    let _ = writeln!(svg, r#"      <circle cx="0" cy="0" r="{CIRCLE_RADIUS}" />"#);
    let _ = writeln!(svg, "    </clipPath>");
    let _ = writeln!(svg, "  </defs>");
    let _ = writeln!(svg, r#"  <g clip-path="url(#logo-circle)">"#);
    for line in &strokes {
        let _ = writeln!(
            svg,
            r#"    <line x1="{x}" y1="{top}" x2="{x}" y2="{bottom}" stroke="{stroke}" stroke-width="{STEM_WIDTH}" opacity="{STEM_OPACITY}" />"#,
            x = line.x,
            top = -CIRCLE_RADIUS,
            bottom = CIRCLE_RADIUS,
        );
    }
    for line in &strokes {
        let _ = writeln!(
            svg,
            r#"    <line x1="{x}" y1="{top}" x2="{x}" y2="{bottom}" stroke="{stroke}" stroke-width="{CAPSULE_WIDTH}" stroke-linecap="round" />"#,
            x = line.x,
            top = line.top,
            bottom = line.bottom,
        );
    }
    let _ = writeln!(svg, "  </g>");
    let _ = writeln!(svg, "</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strokes_match_logo_geometry() {
        let strokes = logo_strokes();
        let expected = [
            (-77.4, -31.9, 8.4),
            (-52.8, -52.9, 37.8),
            (-28.2, -53.8, 53.8),
            (0.0, -44.5, 73.1),
            (28.2, -56.3, 44.5),
            (52.8, -56.3, 37.8),
            (77.4, -30.2, 13.4),
        ];
        for (stroke, (x, top, bottom)) in strokes.iter().zip(expected) {
            assert!((stroke.x - x).abs() < 0.11, "{stroke:?}");
            assert!((stroke.top - top).abs() < 0.11, "{stroke:?}");
            assert!((stroke.bottom - bottom).abs() < 0.11, "{stroke:?}");
        }
    }

    #[test]
    fn svg_contains_clip_and_all_strokes() {
        let svg = logo_svg([1.0, 1.0, 1.0]);
        assert!(svg.starts_with("<svg viewBox=\"-100 -100 200 200\""));
        assert!(svg.contains("r=\"96\""));
        assert_eq!(svg.matches("<line ").count(), 14);
        assert_eq!(svg.matches("stroke-linecap=\"round\"").count(), 7);
        assert!(svg.contains("stroke=\"#ffffff\""));
        assert!(!svg.contains("\"-0\""));
    }

    #[test]
    fn colour_is_encoded_as_hex() {
        assert_eq!(hex_color([1.0, 0.5, 0.0]), "#ff8000");
    }
}
