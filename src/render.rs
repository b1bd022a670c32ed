//! Software frame renderer: the gradient backdrop plus the progress timeline.
//!
//! Deterministic: identical `SceneState` input produces byte-identical
//! frames. The play window uploads these frames as a texture; the `render`
//! command writes them out as PNGs.

use anyhow::{Context, Result};
use tiny_skia::{Pixmap, PremultipliedColorU8};

use crate::catalog::{scene_start_secs, SceneDescriptor};
use crate::palette::{palette_at, Rgb};
use crate::sequence::SceneState;

pub struct FrameRenderer {
    width: u32,
    height: u32,
    pixmap: Pixmap,
}

impl FrameRenderer {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height).context("failed to create frame pixmap")?;
        Ok(Self {
            width,
            height,
            pixmap,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Render one frame and return its RGBA bytes (alpha always opaque).
    pub fn render(&mut self, scenes: &[SceneDescriptor], state: &SceneState) -> &[u8] {
        let palette = palette_at(scenes, state.index, state.progress);
        self.fill_gradient(palette.top, palette.bottom);
        self.draw_timeline(scenes, state, palette.accent);
        self.pixmap.data()
    }

    fn fill_gradient(&mut self, top: Rgb, bottom: Rgb) {
        let height = self.height.max(1);
        let width = self.width as usize;
        let pixels = self.pixmap.pixels_mut();
        for y in 0..height {
            let t = if height > 1 {
                y as f32 / (height - 1) as f32
            } else {
                0.0
            };
            let [r, g, b, a] = top.lerp(bottom, t).to_rgba8();
            let pixel =
                PremultipliedColorU8::from_rgba(r, g, b, a).unwrap_or(PremultipliedColorU8::TRANSPARENT);
            let row = y as usize * width;
            pixels[row..row + width].fill(pixel);
        }
    }

    fn draw_timeline(&mut self, scenes: &[SceneDescriptor], state: &SceneState, accent: Rgb) {
        let strip_h = (self.height / 40).max(3);
        if self.height <= strip_h * 4 {
            return;
        }
        let y0 = self.height - strip_h * 2;
        let y1 = y0 + strip_h;
        let total: f32 = scenes.iter().map(|scene| scene.duration_secs).sum();
        if total <= 0.0 {
            return;
        }

        // Track: darken the backdrop under the full strip.
        self.blend_rect(0, y0, self.width, y1 - y0, Rgb::new(0.0, 0.0, 0.0), 0.45);

        // Active scene span, slightly lifted.
        let span_start = scene_start_secs(scenes, state.index) / total;
        let span_end = span_start + scenes[state.index].duration_secs / total;
        let x0 = (span_start * self.width as f32) as u32;
        let x1 = ((span_end * self.width as f32) as u32).min(self.width);
        self.blend_rect(x0, y0, x1.saturating_sub(x0), y1 - y0, accent, 0.25);

        // Global progress fill.
        let progress = state.global_progress(total);
        let fill_w = (progress * self.width as f32) as u32;
        self.blend_rect(0, y0, fill_w, y1 - y0, accent, 0.85);

        // Boundary ticks between scenes.
        let tick = Rgb::new(0.95, 0.96, 0.98);
        for index in 1..scenes.len() {
            let x = (scene_start_secs(scenes, index) / total * self.width as f32) as u32;
            self.blend_rect(x.min(self.width - 1), y0, 1, y1 - y0, tick, 0.9);
        }
    }

    fn blend_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgb, alpha: f32) {
        if w == 0 || h == 0 {
            return;
        }
        let width = self.width as usize;
        let x1 = (x + w).min(self.width) as usize;
        let y1 = (y + h).min(self.height) as usize;
        let [cr, cg, cb, _] = color.to_rgba8();
        let pixels = self.pixmap.pixels_mut();
        for row in y as usize..y1 {
            for idx in row * width + x as usize..row * width + x1 {
                let px = pixels[idx];
                let blend = |base: u8, over: u8| -> u8 {
                    (base as f32 + (over as f32 - base as f32) * alpha).round() as u8
                };
                pixels[idx] = PremultipliedColorU8::from_rgba(
                    blend(px.red(), cr),
                    blend(px.green(), cg),
                    blend(px.blue(), cb),
                    255,
                )
                .unwrap_or(PremultipliedColorU8::TRANSPARENT);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SCENES;
    use crate::palette::tone_palette;
    use crate::sequence::resolve_scene;

    #[test]
    fn frames_are_deterministic_for_identical_state() {
        let state = resolve_scene(12.5, &SCENES);
        let mut a = FrameRenderer::new(160, 90).expect("renderer");
        let mut b = FrameRenderer::new(160, 90).expect("renderer");
        assert_eq!(a.render(&SCENES, &state), b.render(&SCENES, &state));
    }

    #[test]
    fn frame_buffer_has_full_rgba_coverage() {
        let state = resolve_scene(0.0, &SCENES);
        let mut renderer = FrameRenderer::new(64, 36).expect("renderer");
        let data = renderer.render(&SCENES, &state);
        assert_eq!(data.len(), 64 * 36 * 4);
        // Opaque everywhere.
        assert!(data.chunks(4).all(|px| px[3] == 255));
    }

    #[test]
    fn first_frame_opens_on_the_cold_palette() {
        let state = resolve_scene(0.0, &SCENES);
        let mut renderer = FrameRenderer::new(64, 36).expect("renderer");
        let data = renderer.render(&SCENES, &state);
        let expected = tone_palette(SCENES[0].tone).top.to_rgba8();
        assert_eq!(&data[..4], &expected);
    }

    #[test]
    fn different_scenes_render_different_frames() {
        let mut renderer = FrameRenderer::new(64, 36).expect("renderer");
        let cold = renderer
            .render(&SCENES, &resolve_scene(1.0, &SCENES))
            .to_vec();
        let warm = renderer
            .render(&SCENES, &resolve_scene(45.0, &SCENES))
            .to_vec();
        assert_ne!(cold, warm);
    }

    #[test]
    fn tiny_frames_skip_the_timeline_without_panicking() {
        let state = resolve_scene(30.0, &SCENES);
        let mut renderer = FrameRenderer::new(8, 8).expect("renderer");
        let data = renderer.render(&SCENES, &state);
        assert_eq!(data.len(), 8 * 8 * 4);
    }
}
