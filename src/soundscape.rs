//! Soundscape modulation: mapping the active scene's tone and progress onto
//! the three ambient gain targets, and owning the lazily-created engine.

use std::sync::Arc;

use crate::audio::{AudioEngine, MixBus, MASTER_SILENT};
use crate::catalog::{SceneDescriptor, Tone};

/// Target gains for the three bed layers, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerMix {
    pub wind: f32,
    pub shimmer: f32,
    pub pulse: f32,
}

impl LayerMix {
    fn clamped(self) -> Self {
        Self {
            wind: self.wind.clamp(0.0, 1.0),
            shimmer: self.shimmer.clamp(0.0, 1.0),
            pulse: self.pulse.clamp(0.0, 1.0),
        }
    }
}

const COLD_MIX: LayerMix = LayerMix {
    wind: 0.80,
    shimmer: 0.22,
    pulse: 0.10,
};

const TRANSITION_MIX: LayerMix = LayerMix {
    wind: 0.55,
    shimmer: 0.45,
    pulse: 0.28,
};

const WARM_MIX: LayerMix = LayerMix {
    wind: 0.28,
    shimmer: 0.50,
    pulse: 0.52,
};

/// Named per-tone gain profile. Cold scenes lean on wind; warm scenes hand
/// the bed over to pulse and shimmer.
pub fn tone_mix(tone: Tone) -> LayerMix {
    match tone {
        Tone::Cold => COLD_MIX,
        Tone::Transition => TRANSITION_MIX,
        Tone::Warm => WARM_MIX,
    }
}

/// Oscillations of the crunch sinusoid across one crunch scene.
const CRUNCH_CYCLES: f32 = 7.0;
/// Peak contribution of the crunch term to shimmer and pulse.
const CRUNCH_DEPTH: f32 = 0.08;

/// Footstep texture: a sinusoid over local scene progress, present only in
/// the ascent and summit scenes, zero everywhere else.
pub fn crunch_term(scene: &SceneDescriptor, progress: f32) -> f32 {
    if !scene.has_crunch() {
        return 0.0;
    }
    (progress * CRUNCH_CYCLES * std::f32::consts::TAU).sin() * CRUNCH_DEPTH
}

/// Gain targets for a scene at a given local progress: the tone profile with
/// the crunch term folded into shimmer and pulse, clamped to `[0, 1]`.
pub fn mix_for_scene(scene: &SceneDescriptor, progress: f32) -> LayerMix {
    let base = tone_mix(scene.tone);
    let crunch = crunch_term(scene, progress);
    LayerMix {
        wind: base.wind,
        shimmer: base.shimmer + crunch,
        pulse: base.pulse + crunch,
    }
    .clamped()
}

/// Master gain target for the current transport state.
pub fn master_target(playing: bool, mute: bool, level: f32) -> f32 {
    if playing && !mute {
        level.clamp(0.0, 1.0)
    } else {
        MASTER_SILENT
    }
}

/// Owner of the audio engine handle. The engine is created lazily on the
/// first unmuted play attempt or the first user interaction, whichever comes
/// first; until then every command is a silent state update.
pub struct Soundscape {
    bus: Arc<MixBus>,
    engine: Option<AudioEngine>,
    level: f32,
    enabled: bool,
    failure_logged: bool,
}

impl Soundscape {
    pub fn new(level: f32, enabled: bool) -> Self {
        Self {
            bus: MixBus::new(),
            engine: None,
            level,
            enabled,
            failure_logged: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.is_some()
    }

    /// Create the engine if it does not exist yet. Idempotent: re-entrant
    /// calls return the existing handle. A failed attempt is logged once and
    /// retried on the next call; it is never an error for the caller.
    pub fn ensure_initialized(&mut self) -> Option<&AudioEngine> {
        if !self.enabled {
            return None;
        }
        if self.engine.is_none() {
            match AudioEngine::start(Arc::clone(&self.bus)) {
                Ok(engine) => {
                    eprintln!("[firn] audio engine online ({} Hz)", engine.sample_rate());
                    self.engine = Some(engine);
                }
                Err(error) => {
                    if !self.failure_logged {
                        eprintln!("[firn] audio unavailable, continuing silent: {error:#}");
                        self.failure_logged = true;
                    }
                }
            }
        }
        self.engine.as_ref()
    }

    /// Re-target the bed gains for the active scene. Safe before
    /// initialization: targets are picked up once the engine exists.
    pub fn retarget(&mut self, scene: &SceneDescriptor, progress: f32) {
        self.bus.set_mix(mix_for_scene(scene, progress));
    }

    /// Ramp the master gain for the play/mute state.
    pub fn set_master(&mut self, playing: bool, mute: bool) {
        self.bus.set_master(master_target(playing, mute, self.level));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SCENES;

    const PROBE_PROGRESS: [f32; 5] = [0.03, 0.2, 0.41, 0.68, 0.97];

    #[test]
    fn crunch_is_zero_for_every_non_crunch_scene() {
        for scene in SCENES.iter().filter(|scene| !scene.has_crunch()) {
            for &progress in &PROBE_PROGRESS {
                assert_eq!(crunch_term(scene, progress), 0.0, "scene {}", scene.id);
            }
        }
    }

    #[test]
    fn crunch_oscillates_during_ascent_and_summit() {
        for id in ["ascent", "summit"] {
            let scene = SCENES.iter().find(|scene| scene.id == id).unwrap();
            assert!(
                crunch_term(scene, 0.03).abs() > 0.0,
                "crunch should be live in {id}"
            );
        }
    }

    #[test]
    fn crunch_alters_shimmer_and_pulse_only() {
        let ascent = SCENES.iter().find(|scene| scene.id == "ascent").unwrap();
        let base = tone_mix(ascent.tone);
        let mix = mix_for_scene(ascent, 0.03);
        assert_eq!(mix.wind, base.wind);
        assert_ne!(mix.shimmer, base.shimmer);
        assert_ne!(mix.pulse, base.pulse);
    }

    #[test]
    fn mixes_are_always_clamped() {
        for scene in &SCENES {
            for &progress in &PROBE_PROGRESS {
                let mix = mix_for_scene(scene, progress);
                for value in [mix.wind, mix.shimmer, mix.pulse] {
                    assert!(value >= 0.0 && value <= 1.0);
                }
            }
        }
    }

    #[test]
    fn cold_favors_wind_and_warm_favors_pulse() {
        let cold = tone_mix(Tone::Cold);
        let warm = tone_mix(Tone::Warm);
        assert!(cold.wind > cold.shimmer && cold.wind > cold.pulse);
        assert!(warm.pulse > warm.wind);
        assert!(warm.shimmer > warm.wind);
    }

    #[test]
    fn master_target_silences_when_muted_or_stopped() {
        assert_eq!(master_target(true, true, 0.85), MASTER_SILENT);
        assert_eq!(master_target(false, false, 0.85), MASTER_SILENT);
        assert_eq!(master_target(true, false, 0.85), 0.85);
    }

    #[test]
    fn commands_before_initialization_do_not_panic() {
        let mut soundscape = Soundscape::new(0.85, true);
        assert!(!soundscape.is_initialized());

        // Mute toggles and retargets are pure state updates until an engine
        // exists; they must never throw.
        soundscape.set_master(true, true);
        soundscape.set_master(false, false);
        soundscape.retarget(&SCENES[0], 0.5);
        assert!(!soundscape.is_initialized());
    }

    #[test]
    fn disabled_soundscape_never_initializes() {
        let mut soundscape = Soundscape::new(0.85, false);
        assert!(soundscape.ensure_initialized().is_none());
        assert!(!soundscape.is_initialized());
    }
}
