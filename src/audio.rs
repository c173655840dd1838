//! Audio cues
//!
//! The core never plays sound itself. It emits named cues and the front-end
//! hands them to whatever [`AudioSink`] it owns. Playback is fire-and-forget.

use serde::{Deserialize, Serialize};

use crate::sim::GameEvent;

/// Sound cue types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    /// Ball struck by the left paddle
    LeftHit,
    /// Ball struck by the right paddle
    RightHit,
    /// Ball put into play
    Serve,
}

impl SoundCue {
    /// Stable cue name used by asset packs
    pub fn name(&self) -> &'static str {
        match self {
            SoundCue::LeftHit => "left-hit",
            SoundCue::RightHit => "right-hit",
            SoundCue::Serve => "serve",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "left-hit" => Some(SoundCue::LeftHit),
            "right-hit" => Some(SoundCue::RightHit),
            "serve" => Some(SoundCue::Serve),
            _ => None,
        }
    }
}

/// Anything that can play a cue
pub trait AudioSink {
    fn play(&mut self, cue: SoundCue);
}

/// Sink that drops every cue (headless runs, muted play)
#[derive(Debug, Default)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play(&mut self, _cue: SoundCue) {}
}

/// Sink that only logs cues
#[derive(Debug, Default)]
pub struct LogAudio {
    muted: bool,
}

impl LogAudio {
    pub fn new() -> Self {
        Self { muted: false }
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }
}

impl AudioSink for LogAudio {
    fn play(&mut self, cue: SoundCue) {
        if self.muted {
            return;
        }
        log::debug!("Audio cue: {}", cue.name());
    }
}

/// Sink that keeps every cue in order, for tests and replays of a frame
#[derive(Debug, Default)]
pub struct CueRecorder {
    pub played: Vec<SoundCue>,
}

impl AudioSink for CueRecorder {
    fn play(&mut self, cue: SoundCue) {
        self.played.push(cue);
    }
}

/// Forward every cue found in `events` to `sink`, in emission order
pub fn dispatch(events: &[GameEvent], sink: &mut dyn AudioSink) {
    for event in events {
        if let GameEvent::Cue(cue) = event {
            sink.play(*cue);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Player;

    #[test]
    fn test_cue_names() {
        assert_eq!(SoundCue::LeftHit.name(), "left-hit");
        assert_eq!(SoundCue::RightHit.name(), "right-hit");
        assert_eq!(SoundCue::Serve.name(), "serve");
        assert_eq!(SoundCue::from_name("right-hit"), Some(SoundCue::RightHit));
        assert_eq!(SoundCue::from_name("boom"), None);
    }

    #[test]
    fn test_dispatch_only_forwards_cues() {
        let events = vec![
            GameEvent::Cue(SoundCue::Serve),
            GameEvent::PointScored {
                scorer: Player::One,
                points: (1, 0),
            },
            GameEvent::Cue(SoundCue::RightHit),
        ];
        let mut recorder = CueRecorder::default();
        dispatch(&events, &mut recorder);
        assert_eq!(recorder.played, vec![SoundCue::Serve, SoundCue::RightHit]);
    }
}
