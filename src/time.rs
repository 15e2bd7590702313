//! Frame timer.
//!
//! [`Time`] turns wall-clock frames into the simulation delta. It supports
//! pausing with single-frame stepping, an optional fixed delta for
//! reproducible runs, a time scale and a cap on the delta after long stalls
//! (window drags, breakpoints).
//!
//! ```
//! use particle_playground::Time;
//!
//! let mut time = Time::new();
//! time.set_fixed_delta(Some(1.0 / 60.0));
//! let dt = time.update();
//! assert!((dt - 1.0 / 60.0).abs() < 1e-6);
//! ```

use std::time::{Duration, Instant};

/// Longest real delta fed to the simulation.
pub const MAX_FRAME_DELTA: f32 = 0.1;

const FPS_INTERVAL: Duration = Duration::from_millis(500);

/// Time tracking for the frame loop.
#[derive(Debug)]
pub struct Time {
    last_frame: Instant,
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    paused: bool,
    /// Run exactly one frame while paused.
    step_requested: bool,
    fixed_delta: Option<f32>,
    time_scale: f32,
}

impl Time {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> Self {
        Self {
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            paused: false,
            step_requested: false,
            fixed_delta: None,
            time_scale: 1.0,
        }
    }

    /// Advance to the current instant. Call once per frame.
    ///
    /// Returns the simulation delta for this frame.
    pub fn update(&mut self) -> f32 {
        self.tick(Instant::now())
    }

    fn tick(&mut self, now: Instant) -> f32 {
        let raw = now
            .saturating_duration_since(self.last_frame)
            .as_secs_f32()
            .min(MAX_FRAME_DELTA);
        self.last_frame = now;
        self.frame_count += 1;

        let since_fps = now.saturating_duration_since(self.fps_update_time);
        if since_fps >= FPS_INTERVAL {
            self.fps = (self.frame_count - self.fps_frame_count) as f32 / since_fps.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        let running = !self.paused || std::mem::take(&mut self.step_requested);
        self.delta_secs = if running {
            self.fixed_delta.unwrap_or(raw) * self.time_scale
        } else {
            0.0
        };
        self.elapsed_secs += self.delta_secs;
        self.delta_secs
    }

    /// Simulated seconds since start.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Simulation delta of the last frame.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Rendered frames per second, refreshed twice a second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        self.step_requested = false;
    }

    /// While paused, let the next frame advance once.
    pub fn request_step(&mut self) {
        if self.paused {
            self.step_requested = true;
        }
    }

    /// Use a constant delta instead of wall-clock time; `None` restores real timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }

    /// Scale the simulation delta; negative values clamp to 0.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_delta_follows_clock() {
        let t0 = Instant::now();
        let mut time = Time::starting_at(t0);

        let dt = time.tick(t0 + ms(20));
        assert!((dt - 0.02).abs() < 1e-4);
        assert_eq!(time.frame(), 1);
    }

    #[test]
    fn test_long_stall_is_capped() {
        let t0 = Instant::now();
        let mut time = Time::starting_at(t0);
        assert_eq!(time.tick(t0 + Duration::from_secs(3)), MAX_FRAME_DELTA);
    }

    #[test]
    fn test_pause_and_step() {
        let t0 = Instant::now();
        let mut time = Time::starting_at(t0);
        time.set_fixed_delta(Some(0.01));

        time.toggle_pause();
        assert_eq!(time.tick(t0 + ms(10)), 0.0);

        time.request_step();
        assert_eq!(time.tick(t0 + ms(20)), 0.01);
        assert_eq!(time.tick(t0 + ms(30)), 0.0);
        assert!((time.elapsed() - 0.01).abs() < 1e-6);
        // Frames are still counted
        assert_eq!(time.frame(), 3);
    }

    #[test]
    fn test_step_request_ignored_when_running() {
        let mut time = Time::new();
        time.request_step();
        time.toggle_pause();
        assert_eq!(time.tick(Instant::now()), 0.0);
    }

    #[test]
    fn test_time_scale() {
        let t0 = Instant::now();
        let mut time = Time::starting_at(t0);
        time.set_fixed_delta(Some(0.02));
        time.set_time_scale(0.5);
        assert!((time.tick(t0 + ms(5)) - 0.01).abs() < 1e-6);

        time.set_time_scale(-1.0);
        assert_eq!(time.time_scale(), 0.0);
    }

    #[test]
    fn test_fps_refresh() {
        let t0 = Instant::now();
        let mut time = Time::starting_at(t0);
        for i in 1..=30 {
            time.tick(t0 + ms(i * 20));
        }
        // 25 frames in the first 500 ms
        assert!((time.fps() - 50.0).abs() < 1.0, "fps {}", time.fps());
    }
}
