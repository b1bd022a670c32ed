//! Playback transport: the single clock that drives elapsed time forward.
//!
//! The clock never assumes a start time. Each `tick` measures the delta
//! between consecutive timestamps, so a pause followed by a resume simply
//! establishes a fresh baseline instead of jumping over the paused interval.

use std::time::Instant;

use crate::catalog::TOTAL_DURATION_SECS;

/// Lifecycle of the sequence. `Complete` is terminal until a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Complete,
}

/// Runtime playback state: one instance, owned by whoever drives the frames.
#[derive(Debug)]
pub struct Transport {
    phase: Phase,
    elapsed: f32,
    mute: bool,
    total_secs: f32,
    baseline: Option<Instant>,
}

impl Transport {
    pub fn new() -> Self {
        Self::with_total(TOTAL_DURATION_SECS)
    }

    /// A transport over a custom total duration. Used by tests; playback of
    /// the built-in catalog always uses `TOTAL_DURATION_SECS`.
    pub fn with_total(total_secs: f32) -> Self {
        Self {
            phase: Phase::Idle,
            elapsed: 0.0,
            mute: false,
            total_secs,
            baseline: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn is_muted(&self) -> bool {
        self.mute
    }

    /// Begin playback from the top. Always resets elapsed to zero.
    pub fn start(&mut self) {
        self.elapsed = 0.0;
        self.phase = Phase::Running;
        self.baseline = None;
    }

    /// Identical to `start`; exposed separately because the transport surface
    /// distinguishes the two commands.
    pub fn restart(&mut self) {
        self.start();
    }

    /// Freeze playback. No-op unless currently running.
    pub fn pause(&mut self) {
        if self.phase == Phase::Running {
            self.phase = Phase::Idle;
            self.baseline = None;
        }
    }

    /// Continue from the paused position. No-op unless idle with time left.
    pub fn resume(&mut self) {
        if self.phase == Phase::Idle && self.elapsed < self.total_secs {
            self.phase = Phase::Running;
            self.baseline = None;
        }
    }

    /// Collapse start/pause/resume onto a single control, the way the play
    /// button behaves: idle with no progress launches, running pauses,
    /// idle mid-sequence resumes. Complete is left for `restart`.
    pub fn toggle(&mut self) {
        match self.phase {
            Phase::Running => self.pause(),
            Phase::Idle if self.elapsed == 0.0 => self.start(),
            Phase::Idle => self.resume(),
            Phase::Complete => {}
        }
    }

    pub fn set_mute(&mut self, mute: bool) {
        self.mute = mute;
    }

    pub fn toggle_mute(&mut self) {
        self.mute = !self.mute;
    }

    /// Advance the clock to `now`. Only meaningful while running: the first
    /// tick after entering the running state records a baseline and advances
    /// nothing; each later tick adds the delta since the previous one.
    /// Reaching the total transitions to `Complete` exactly once and clamps
    /// elapsed there; further ticks are no-ops.
    pub fn tick(&mut self, now: Instant) {
        if self.phase != Phase::Running {
            return;
        }

        let Some(baseline) = self.baseline else {
            self.baseline = Some(now);
            return;
        };

        let delta = now.saturating_duration_since(baseline).as_secs_f32();
        self.baseline = Some(now);
        self.elapsed = (self.elapsed + delta).min(self.total_secs);

        if self.elapsed >= self.total_secs {
            self.phase = Phase::Complete;
            self.baseline = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn advance(transport: &mut Transport, origin: Instant, offsets_ms: &[u64]) {
        for &ms in offsets_ms {
            transport.tick(origin + Duration::from_millis(ms));
        }
    }

    #[test]
    fn starts_idle_with_zero_elapsed() {
        let transport = Transport::new();
        assert_eq!(transport.phase(), Phase::Idle);
        assert_eq!(transport.elapsed(), 0.0);
        assert!(!transport.is_muted());
    }

    #[test]
    fn start_enters_running_and_48ms_advances_the_clock() {
        let mut transport = Transport::new();
        transport.start();
        assert_eq!(transport.phase(), Phase::Running);

        let origin = Instant::now();
        advance(&mut transport, origin, &[0, 48]);
        assert!((transport.elapsed() - 0.048).abs() < 1e-3);
        assert_eq!(transport.phase(), Phase::Running);
    }

    #[test]
    fn first_tick_only_establishes_a_baseline() {
        let mut transport = Transport::new();
        transport.start();
        transport.tick(Instant::now());
        assert_eq!(transport.elapsed(), 0.0);
    }

    #[test]
    fn pause_freezes_elapsed_and_resume_does_not_jump() {
        let mut transport = Transport::new();
        transport.start();

        let origin = Instant::now();
        advance(&mut transport, origin, &[0, 500]);
        let frozen = transport.elapsed();
        transport.pause();
        assert_eq!(transport.phase(), Phase::Idle);

        // A long wall-clock gap passes while paused; the first tick after
        // resuming must re-baseline instead of charging the gap.
        transport.resume();
        transport.tick(origin + Duration::from_millis(10_500));
        assert_eq!(transport.elapsed(), frozen);

        transport.tick(origin + Duration::from_millis(10_516));
        assert!((transport.elapsed() - (frozen + 0.016)).abs() < 1e-3);
    }

    #[test]
    fn reaching_total_completes_and_clamps() {
        let mut transport = Transport::with_total(1.0);
        transport.start();
        let origin = Instant::now();
        advance(&mut transport, origin, &[0, 1500]);
        assert_eq!(transport.phase(), Phase::Complete);
        assert_eq!(transport.elapsed(), 1.0);
    }

    #[test]
    fn completion_is_idempotent_under_further_ticks() {
        let mut transport = Transport::with_total(1.0);
        transport.start();
        let origin = Instant::now();
        advance(&mut transport, origin, &[0, 2000, 3000, 4000]);
        assert_eq!(transport.phase(), Phase::Complete);
        assert_eq!(transport.elapsed(), 1.0);
    }

    #[test]
    fn resume_after_complete_is_a_no_op() {
        let mut transport = Transport::with_total(1.0);
        transport.start();
        let origin = Instant::now();
        advance(&mut transport, origin, &[0, 2000]);
        assert_eq!(transport.phase(), Phase::Complete);

        transport.resume();
        assert_eq!(transport.phase(), Phase::Complete);
        transport.toggle();
        assert_eq!(transport.phase(), Phase::Complete);
    }

    #[test]
    fn restart_resets_from_complete() {
        let mut transport = Transport::with_total(1.0);
        transport.start();
        let origin = Instant::now();
        advance(&mut transport, origin, &[0, 2000]);
        assert_eq!(transport.phase(), Phase::Complete);

        transport.restart();
        assert_eq!(transport.phase(), Phase::Running);
        assert_eq!(transport.elapsed(), 0.0);
    }

    #[test]
    fn pause_when_idle_is_a_no_op() {
        let mut transport = Transport::new();
        transport.pause();
        assert_eq!(transport.phase(), Phase::Idle);
    }

    #[test]
    fn mute_is_independent_of_phase() {
        let mut transport = Transport::new();
        transport.set_mute(true);
        assert!(transport.is_muted());
        transport.start();
        assert!(transport.is_muted());
        transport.toggle_mute();
        assert!(!transport.is_muted());
    }

    #[test]
    fn toggle_walks_launch_pause_resume() {
        let mut transport = Transport::new();
        transport.toggle();
        assert_eq!(transport.phase(), Phase::Running);

        let origin = Instant::now();
        advance(&mut transport, origin, &[0, 100]);
        transport.toggle();
        assert_eq!(transport.phase(), Phase::Idle);
        assert!(transport.elapsed() > 0.0);

        transport.toggle();
        assert_eq!(transport.phase(), Phase::Running);
    }
}
