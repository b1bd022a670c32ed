//! Tone palettes for the gradient backdrop.
//!
//! Each tone owns a vertical gradient (top and bottom colors) and an accent
//! used by the timeline strip. Near the end of a scene the palette blends
//! toward the next scene's palette so cuts read as slow color washes rather
//! than steps.

use crate::catalog::{SceneDescriptor, Tone};

/// Linear-space RGB in `[0, 1]` per channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        if t <= 0.0 {
            return self;
        }
        if t >= 1.0 {
            return other;
        }
        Rgb {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
        }
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
            255,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub top: Rgb,
    pub bottom: Rgb,
    pub accent: Rgb,
}

impl Palette {
    pub fn lerp(self, other: Palette, t: f32) -> Palette {
        Palette {
            top: self.top.lerp(other.top, t),
            bottom: self.bottom.lerp(other.bottom, t),
            accent: self.accent.lerp(other.accent, t),
        }
    }
}

const COLD: Palette = Palette {
    top: Rgb::new(0.051, 0.082, 0.153),
    bottom: Rgb::new(0.227, 0.353, 0.514),
    accent: Rgb::new(0.608, 0.796, 0.929),
};

const TRANSITION: Palette = Palette {
    top: Rgb::new(0.188, 0.180, 0.278),
    bottom: Rgb::new(0.549, 0.475, 0.553),
    accent: Rgb::new(0.871, 0.773, 0.737),
};

const WARM: Palette = Palette {
    top: Rgb::new(0.302, 0.141, 0.137),
    bottom: Rgb::new(0.827, 0.510, 0.290),
    accent: Rgb::new(0.969, 0.812, 0.537),
};

pub fn tone_palette(tone: Tone) -> Palette {
    match tone {
        Tone::Cold => COLD,
        Tone::Transition => TRANSITION,
        Tone::Warm => WARM,
    }
}

/// Fraction of a scene over which the backdrop washes toward the next scene.
const BLEND_WINDOW: f32 = 0.25;

/// Palette for the active scene at `progress`, blending into the following
/// scene's palette across the final `BLEND_WINDOW` of the scene. The last
/// scene holds its own palette to the end.
pub fn palette_at(scenes: &[SceneDescriptor], index: usize, progress: f32) -> Palette {
    let current = tone_palette(scenes[index].tone);
    let Some(next) = scenes.get(index + 1) else {
        return current;
    };

    let blend_start = 1.0 - BLEND_WINDOW;
    if progress <= blend_start {
        return current;
    }

    let t = (progress - blend_start) / BLEND_WINDOW;
    // Smoothstep keeps the wash from reading as a linear wipe.
    let t = t * t * (3.0 - 2.0 * t);
    current.lerp(tone_palette(next.tone), t)
}
