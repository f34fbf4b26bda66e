#![forbid(unsafe_code)]

//! Audio gate: decides which sound cues may play.
//!
//! Browsers refuse sound until the user interacts with the page, so the gate
//! stays locked until the first gesture. That gesture also starts the music.
//! Afterwards the music toggle mutes or unmutes every cue.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A sound the scene can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    /// Headline glitch and carousel transitions.
    HeadlineGlitch,
    /// Pointer over a glitch link.
    HoverGlitch,
    /// Background music.
    Music,
}

impl AudioCue {
    /// Playback volume in [0, 1].
    #[must_use]
    pub const fn volume(self) -> f32 {
        match self {
            Self::HeadlineGlitch => 0.7,
            Self::HoverGlitch => 0.3,
            Self::Music => 1.0,
        }
    }
}

/// A cue cleared to play.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CuePlayback {
    pub cue: AudioCue,
    pub volume: f32,
}

/// Command for the music track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicCommand {
    Play,
    Pause,
}

/// Tracks whether sound is allowed.
#[derive(Debug, Clone, Default)]
pub struct AudioGate {
    unlocked: bool,
    enabled: bool,
    page_loaded: bool,
}

impl AudioGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a user gesture. The first one unlocks audio and starts music.
    pub fn user_gesture(&mut self) -> Option<MusicCommand> {
        if self.unlocked {
            return None;
        }
        self.unlocked = true;
        self.enabled = true;
        debug!("audio unlocked");
        Some(MusicCommand::Play)
    }

    /// Flip music and cues on or off. Ignored until audio is unlocked.
    pub fn toggle_music(&mut self) -> Option<MusicCommand> {
        if !self.unlocked {
            return None;
        }
        self.enabled = !self.enabled;
        debug!(enabled = self.enabled, "music toggled");
        Some(if self.enabled {
            MusicCommand::Play
        } else {
            MusicCommand::Pause
        })
    }

    /// Mark the page as loaded.
    pub fn set_page_loaded(&mut self) {
        self.page_loaded = true;
    }

    /// Clear `cue` for playback if sound is currently allowed.
    #[must_use]
    pub fn cue(&self, cue: AudioCue) -> Option<CuePlayback> {
        (self.enabled && self.page_loaded).then_some(CuePlayback {
            cue,
            volume: cue.volume(),
        })
    }

    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
