//! Realtime audio engine for the ambient bed.
//!
//! Three perpetually-running noise-derived sources (wind, shimmer, pulse)
//! feed independently smoothed gains summed into one master gain. The UI
//! thread publishes target levels through a lock-free atomic bus; the cpal
//! output callback chases those targets with one-pole exponential smoothers,
//! so every retarget supersedes the previous ramp from the current value and
//! no step ever reaches the speaker.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::soundscape::LayerMix;

/// Time constant for wind/shimmer/pulse gain ramps.
pub const LAYER_RAMP_SECS: f32 = 0.75;
/// Master gain fade-in constant.
pub const MASTER_FADE_IN_SECS: f32 = 0.35;
/// Master gain fade-out constant. Deliberately slower than the fade-in.
pub const MASTER_FADE_OUT_SECS: f32 = 1.4;
/// Master target while muted or not playing. Exponential ramps never reach
/// zero, so "silent" is a floor below audibility.
pub const MASTER_SILENT: f32 = 0.0001;

/// Fixed frequency of the low percussive pulse tone.
const PULSE_HZ: f32 = 48.0;
/// Cutoff for the wind band-limiting low-pass.
const WIND_CUTOFF_HZ: f32 = 420.0;
/// Cutoff for the shimmer high-pass (noise minus a low-pass at this corner).
const SHIMMER_CUTOFF_HZ: f32 = 2_600.0;

/// f32 stored as its bit pattern in an `AtomicU32`. Relaxed ordering is
/// enough: there is one writer (the UI thread) and one reader (the audio
/// callback), and stale-by-a-frame targets are inaudible.
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }
}

/// Shared target levels between the UI thread and the audio callback.
pub struct MixBus {
    wind: AtomicF32,
    shimmer: AtomicF32,
    pulse: AtomicF32,
    master: AtomicF32,
}

impl MixBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            wind: AtomicF32::new(0.0),
            shimmer: AtomicF32::new(0.0),
            pulse: AtomicF32::new(0.0),
            master: AtomicF32::new(MASTER_SILENT),
        })
    }

    pub fn set_mix(&self, mix: LayerMix) {
        self.wind.store(mix.wind);
        self.shimmer.store(mix.shimmer);
        self.pulse.store(mix.pulse);
    }

    pub fn set_master(&self, target: f32) {
        self.master.store(target);
    }

    pub fn mix(&self) -> LayerMix {
        LayerMix {
            wind: self.wind.load(),
            shimmer: self.shimmer.load(),
            pulse: self.pulse.load(),
        }
    }

    pub fn master(&self) -> f32 {
        self.master.load()
    }
}

/// One-pole exponential smoother chasing a target value.
struct Smoother {
    current: f32,
    coeff: f32,
}

impl Smoother {
    fn new(tau_secs: f32, sample_rate: f32) -> Self {
        Self {
            current: 0.0,
            coeff: onepole_coeff(tau_secs, sample_rate),
        }
    }

    fn next(&mut self, target: f32) -> f32 {
        self.current += (target - self.current) * self.coeff;
        self.current
    }
}

/// Master smoother with asymmetric constants: rising targets use the fade-in
/// coefficient, falling targets the slower fade-out coefficient.
struct MasterSmoother {
    current: f32,
    rise_coeff: f32,
    fall_coeff: f32,
}

impl MasterSmoother {
    fn new(sample_rate: f32) -> Self {
        Self {
            current: MASTER_SILENT,
            rise_coeff: onepole_coeff(MASTER_FADE_IN_SECS, sample_rate),
            fall_coeff: onepole_coeff(MASTER_FADE_OUT_SECS, sample_rate),
        }
    }

    fn next(&mut self, target: f32) -> f32 {
        let coeff = if target >= self.current {
            self.rise_coeff
        } else {
            self.fall_coeff
        };
        self.current += (target - self.current) * coeff;
        self.current
    }
}

fn onepole_coeff(tau_secs: f32, sample_rate: f32) -> f32 {
    1.0 - (-1.0 / (tau_secs * sample_rate)).exp()
}

/// xorshift32 white noise in `[-1, 1]`. Deterministic for a given seed.
struct NoiseGen {
    state: u32,
}

impl NoiseGen {
    fn new(seed: u32) -> Self {
        Self {
            state: seed.max(1),
        }
    }

    fn next(&mut self) -> f32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        (x as f32 / u32::MAX as f32) * 2.0 - 1.0
    }
}

/// One-pole low-pass. High-pass is derived as `input - low_pass(input)`.
struct LowPass {
    state: f32,
    coeff: f32,
}

impl LowPass {
    fn new(cutoff_hz: f32, sample_rate: f32) -> Self {
        Self {
            state: 0.0,
            coeff: 1.0 - (-std::f32::consts::TAU * cutoff_hz / sample_rate).exp(),
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        self.state += (input - self.state) * self.coeff;
        self.state
    }
}

/// The full signal chain, owned by the output callback.
struct Synth {
    bus: Arc<MixBus>,
    wind_noise: NoiseGen,
    wind_filter: LowPass,
    shimmer_noise: NoiseGen,
    shimmer_filter: LowPass,
    pulse_phase: f32,
    pulse_step: f32,
    wind_gain: Smoother,
    shimmer_gain: Smoother,
    pulse_gain: Smoother,
    master_gain: MasterSmoother,
}

impl Synth {
    fn new(bus: Arc<MixBus>, sample_rate: f32) -> Self {
        Self {
            bus,
            wind_noise: NoiseGen::new(0x6c75_6d65),
            wind_filter: LowPass::new(WIND_CUTOFF_HZ, sample_rate),
            shimmer_noise: NoiseGen::new(0x7368_696d),
            shimmer_filter: LowPass::new(SHIMMER_CUTOFF_HZ, sample_rate),
            pulse_phase: 0.0,
            pulse_step: std::f32::consts::TAU * PULSE_HZ / sample_rate,
            wind_gain: Smoother::new(LAYER_RAMP_SECS, sample_rate),
            shimmer_gain: Smoother::new(LAYER_RAMP_SECS, sample_rate),
            pulse_gain: Smoother::new(LAYER_RAMP_SECS, sample_rate),
            master_gain: MasterSmoother::new(sample_rate),
        }
    }

    fn next_sample(&mut self) -> f32 {
        let mix = self.bus.mix();
        let master_target = self.bus.master();

        let wind = self.wind_filter.process(self.wind_noise.next());
        let shimmer_raw = self.shimmer_noise.next();
        let shimmer = shimmer_raw - self.shimmer_filter.process(shimmer_raw);
        let pulse = self.pulse_phase.sin();
        self.pulse_phase = (self.pulse_phase + self.pulse_step) % std::f32::consts::TAU;

        let bed = wind * self.wind_gain.next(mix.wind)
            + shimmer * self.shimmer_gain.next(mix.shimmer) * 0.5
            + pulse * self.pulse_gain.next(mix.pulse) * 0.6;

        bed * self.master_gain.next(master_target)
    }

    /// Fill an interleaved buffer, duplicating the mono bed to every channel.
    fn fill(&mut self, buffer: &mut [f32], channels: usize) {
        for frame in buffer.chunks_mut(channels.max(1)) {
            let sample = self.next_sample();
            frame.fill(sample);
        }
    }
}

/// Handle to the running output stream. Dropping it stops playback.
pub struct AudioEngine {
    _stream: cpal::Stream,
    sample_rate: u32,
}

impl AudioEngine {
    /// Open the default output device and start the bed. Fails when the host
    /// offers no usable device; callers treat that as "not yet available".
    pub fn start(bus: Arc<MixBus>) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("no audio output device available"))?;
        let config = device
            .default_output_config()
            .context("failed to query default output config")?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;
        let mut synth = Synth::new(bus, sample_rate as f32);

        let err_handler = |error| eprintln!("[firn] audio stream error: {error}");
        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device
                .build_output_stream(
                    &config.into(),
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        synth.fill(data, channels);
                    },
                    err_handler,
                    None,
                )
                .context("failed to build f32 output stream")?,
            cpal::SampleFormat::I16 => {
                let mut scratch: Vec<f32> = Vec::new();
                device
                    .build_output_stream(
                        &config.into(),
                        move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                            scratch.resize(data.len(), 0.0);
                            synth.fill(&mut scratch, channels);
                            for (out, &sample) in data.iter_mut().zip(&scratch) {
                                *out = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                            }
                        },
                        err_handler,
                        None,
                    )
                    .context("failed to build i16 output stream")?
            }
            cpal::SampleFormat::U16 => {
                let mut scratch: Vec<f32> = Vec::new();
                device
                    .build_output_stream(
                        &config.into(),
                        move |data: &mut [u16], _: &cpal::OutputCallbackInfo| {
                            scratch.resize(data.len(), 0.0);
                            synth.fill(&mut scratch, channels);
                            for (out, &sample) in data.iter_mut().zip(&scratch) {
                                *out = ((sample * 32767.0 + 32768.0).clamp(0.0, 65535.0)) as u16;
                            }
                        },
                        err_handler,
                        None,
                    )
                    .context("failed to build u16 output stream")?
            }
            other => bail!("unsupported sample format: {other:?}"),
        };

        stream.play().context("failed to start audio stream")?;

        Ok(Self {
            _stream: stream,
            sample_rate,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
