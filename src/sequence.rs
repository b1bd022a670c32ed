//! Scene resolution: mapping elapsed wall-clock time to the active scene.
//!
//! `resolve_scene` is a pure function of its inputs and is recomputed every
//! frame rather than cached, so identical elapsed values always produce
//! identical states.

use crate::catalog::SceneDescriptor;

/// Derived per-frame state. Never persisted or mutated in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneState {
    /// Index of the active scene within the catalog.
    pub index: usize,
    /// Seconds elapsed inside the active scene, within `[0, duration]`.
    pub scene_elapsed: f32,
    /// Seconds elapsed in the whole sequence, clamped to `[0, total]`.
    pub total_elapsed: f32,
    /// Local progress through the active scene, clamped to `[0, 1]`.
    pub progress: f32,
}

impl SceneState {
    /// Global progress through the whole sequence in `[0, 1]`.
    pub fn global_progress(&self, total_secs: f32) -> f32 {
        if total_secs <= 0.0 {
            return 0.0;
        }
        (self.total_elapsed / total_secs).clamp(0.0, 1.0)
    }
}

/// Resolve the unique active scene for `elapsed` seconds into the sequence.
///
/// The active scene is the first whose cumulative end exceeds `elapsed`. At or
/// beyond the total duration the last scene stays active with progress 1
/// (inclusive terminal boundary). A zero-duration scene reports progress 0.
pub fn resolve_scene(elapsed: f32, scenes: &[SceneDescriptor]) -> SceneState {
    let total: f32 = scenes.iter().map(|scene| scene.duration_secs).sum();
    let clamped = elapsed.clamp(0.0, total);

    let mut start = 0.0_f32;
    for (index, scene) in scenes.iter().enumerate() {
        let end = start + scene.duration_secs;
        if clamped < end {
            let scene_elapsed = clamped - start;
            let progress = if scene.duration_secs > 0.0 {
                (scene_elapsed / scene.duration_secs).clamp(0.0, 1.0)
            } else {
                0.0
            };
            return SceneState {
                index,
                scene_elapsed,
                total_elapsed: clamped,
                progress,
            };
        }
        start = end;
    }

    // Terminal boundary: elapsed reached the total, the last scene is active.
    let index = scenes.len().saturating_sub(1);
    let last = &scenes[index];
    SceneState {
        index,
        scene_elapsed: last.duration_secs,
        total_elapsed: clamped,
        progress: if last.duration_secs > 0.0 { 1.0 } else { 0.0 },
    }
}
