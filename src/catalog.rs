use anyhow::{bail, Result};
use serde::Serialize;

/// Published length of the full sequence, in seconds. The catalog durations
/// must sum to exactly this value; `validate_catalog` enforces it.
pub const TOTAL_DURATION_SECS: f32 = 60.0;

/// Number of scenes in the sequence.
pub const SCENE_COUNT: usize = 8;

/// Narrative temperature of a scene. Drives both the gradient palette and the
/// soundscape gain profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Cold,
    Transition,
    Warm,
}

/// One entry in the fixed sequence. Descriptors are defined once as consts
/// and never mutated or reordered at runtime.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SceneDescriptor {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub camera: &'static str,
    pub visual_cue: &'static str,
    pub audio_cue: &'static str,
    pub tone: Tone,
    pub duration_secs: f32,
}

impl SceneDescriptor {
    /// Whether this scene carries the footstep crunch term in the soundscape.
    pub fn has_crunch(&self) -> bool {
        matches!(self.id, "ascent" | "summit")
    }
}

/// The sixty-second sequence, in temporal order. Durations are whole seconds
/// so their f32 sum is exact.
pub const SCENES: [SceneDescriptor; SCENE_COUNT] = [
    SceneDescriptor {
        id: "basecamp",
        label: "Basecamp",
        description: "Blue hour at the tent line. Headlamps wake one by one under a wall of ice.",
        camera: "slow dolly past guy-lines, low to the snow",
        visual_cue: "breath fog catching lamplight",
        audio_cue: "wind bed, a flag snapping somewhere",
        tone: Tone::Cold,
        duration_secs: 6.0,
    },
    SceneDescriptor {
        id: "moraine",
        label: "The Moraine",
        description: "A single rope team threads the boulder field below the glacier snout.",
        camera: "long lens from the ridge, figures small against grey rock",
        visual_cue: "scale: bodies dwarfed by debris",
        audio_cue: "wind thins, high shimmer creeps in",
        tone: Tone::Cold,
        duration_secs: 8.0,
    },
    SceneDescriptor {
        id: "ascent",
        label: "The Ascent",
        description: "Crampons bite the fixed line. Each step is a decision made twice.",
        camera: "handheld, tight on boots and rope",
        visual_cue: "rhythmic kick-step into styrofoam snow",
        audio_cue: "crunch texture over the wind",
        tone: Tone::Cold,
        duration_secs: 9.0,
    },
    SceneDescriptor {
        id: "whiteout",
        label: "Whiteout",
        description: "The horizon dissolves. The world narrows to the next wand in the snow.",
        camera: "static, near-total white frame",
        visual_cue: "figures fading to silhouettes, then to nothing",
        audio_cue: "wind swells, everything else recedes",
        tone: Tone::Transition,
        duration_secs: 7.0,
    },
    SceneDescriptor {
        id: "summit",
        label: "Summit",
        description: "The last steps onto a roof of cloud. Nobody speaks first.",
        camera: "slow orbit, sky on every side",
        visual_cue: "prayer flags, a horizon that curves",
        audio_cue: "crunch slows, shimmer opens up",
        tone: Tone::Transition,
        duration_secs: 8.0,
    },
    SceneDescriptor {
        id: "afterglow",
        label: "Afterglow",
        description: "Sun breaks the cloud deck and the snowfield turns to hammered gold.",
        camera: "wide, locked off, light doing the work",
        visual_cue: "long shadows racing across the slope",
        audio_cue: "warm pulse rises under the shimmer",
        tone: Tone::Warm,
        duration_secs: 8.0,
    },
    SceneDescriptor {
        id: "descent",
        label: "The Descent",
        description: "Down through the warming air, fast and loose-limbed, rope coiled.",
        camera: "tracking alongside, snow kicked into the lens",
        visual_cue: "plunge-steps, glissade tracks",
        audio_cue: "pulse steady, wind far behind",
        tone: Tone::Warm,
        duration_secs: 8.0,
    },
    SceneDescriptor {
        id: "valley",
        label: "Valley Floor",
        description: "Green again. The mountain stands behind them, already a story.",
        camera: "drone pullback over the meltwater river",
        visual_cue: "the summit small in the top of frame",
        audio_cue: "soundscape settles to a warm hum",
        tone: Tone::Warm,
        duration_secs: 6.0,
    },
];

/// Check the catalog invariants: exactly `SCENE_COUNT` entries, unique
/// non-empty ids, positive durations, and a sum equal to the published total.
pub fn validate_catalog(scenes: &[SceneDescriptor]) -> Result<()> {
    if scenes.len() != SCENE_COUNT {
        bail!(
            "catalog must hold exactly {} scenes, got {}",
            SCENE_COUNT,
            scenes.len()
        );
    }

    let mut seen = std::collections::HashSet::with_capacity(scenes.len());
    for scene in scenes {
        if scene.id.trim().is_empty() {
            bail!("scene id cannot be empty");
        }
        if !seen.insert(scene.id) {
            bail!("duplicate scene id '{}'", scene.id);
        }
        if !(scene.duration_secs > 0.0) {
            bail!(
                "scene '{}' duration must be positive, got {}",
                scene.id,
                scene.duration_secs
            );
        }
    }

    let total: f32 = scenes.iter().map(|scene| scene.duration_secs).sum();
    if total != TOTAL_DURATION_SECS {
        bail!(
            "scene durations must sum to {}, got {}",
            TOTAL_DURATION_SECS,
            total
        );
    }

    Ok(())
}

/// Start offset of a scene within the sequence, in seconds.
pub fn scene_start_secs(scenes: &[SceneDescriptor], index: usize) -> f32 {
    scenes[..index].iter().map(|scene| scene.duration_secs).sum()
}
