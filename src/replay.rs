//! Input recording and playback.
//!
//! A [`Recording`] is the seed, the starting preset and every frame's delta
//! and [`InputSnapshot`]. Feeding it back into a fresh
//! [`App`](crate::App) built from the same config reproduces the session
//! exactly, since the simulation has no other source of nondeterminism.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ReplayError;
use crate::input::InputSnapshot;
use crate::presets::Preset;

/// One frame of recorded input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    pub delta_time: f32,
    pub input: InputSnapshot,
}

/// A whole recorded session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub seed: u64,
    pub start_preset: Preset,
    pub frames: Vec<FrameInput>,
}

impl Recording {
    pub fn to_json(&self) -> Result<String, ReplayError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ReplayError> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        log::info!(
            "Saved {} recorded frames to {}",
            self.frames.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

/// Captures frames as the app runs.
#[derive(Debug, Clone)]
pub struct Recorder {
    recording: Recording,
}

impl Recorder {
    pub fn new(seed: u64, start_preset: Preset) -> Self {
        Self {
            recording: Recording {
                seed,
                start_preset,
                frames: Vec::new(),
            },
        }
    }

    pub fn record(&mut self, delta_time: f32, input: &InputSnapshot) {
        self.recording.frames.push(FrameInput {
            delta_time,
            input: input.clone(),
        });
    }

    pub fn len(&self) -> usize {
        self.recording.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recording.frames.is_empty()
    }

    pub fn finish(self) -> Recording {
        self.recording
    }
}

/// Yields recorded frames in order.
#[derive(Debug, Clone)]
pub struct Playback {
    recording: Recording,
    cursor: usize,
}

impl Playback {
    pub fn new(recording: Recording) -> Self {
        Self {
            recording,
            cursor: 0,
        }
    }

    pub fn recording(&self) -> &Recording {
        &self.recording
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.recording.frames.len()
    }

    /// Start over from the first frame.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }
}

impl Iterator for Playback {
    type Item = FrameInput;

    fn next(&mut self) -> Option<FrameInput> {
        let frame = self.recording.frames.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Key;

    fn sample() -> Recording {
        let mut recorder = Recorder::new(9, Preset::FountainBounce);
        let mut input = InputSnapshot::new();
        recorder.record(0.016, &input);
        input.begin_frame();
        input.set_key(Key::Digit3, true);
        recorder.record(0.017, &input);
        assert_eq!(recorder.len(), 2);
        recorder.finish()
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let recording = sample();

        recording.save(&path).unwrap();
        let loaded = Recording::load(&path).unwrap();
        assert_eq!(loaded, recording);
        assert!(loaded.frames[1].input.key_pressed(Key::Digit3));
    }

    #[test]
    fn test_playback_order_and_rewind() {
        let mut playback = Playback::new(sample());
        let deltas: Vec<f32> = playback.by_ref().map(|f| f.delta_time).collect();
        assert_eq!(deltas, vec![0.016, 0.017]);
        assert!(playback.is_finished());

        playback.rewind();
        assert_eq!(playback.next().map(|f| f.delta_time), Some(0.016));
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(Recording::from_json("[1, 2"), Err(ReplayError::Json(_))));
        assert!(matches!(
            Recording::load("/nonexistent/recording.json"),
            Err(ReplayError::Io(_))
        ));
    }
}
