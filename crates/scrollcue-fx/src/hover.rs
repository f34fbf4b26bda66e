#![forbid(unsafe_code)]

//! Hover glitch for links and buttons.
//!
//! Pointer enter plays the glitch. Pointer leave reverses it when the link
//! swaps in an alternate layer, otherwise it snaps back to the start.

use std::time::Duration;

use rand::Rng;
use scrollcue_core::ConfigurationError;
use scrollcue_core::sequence::{PlaybackState, Sequence};

use crate::glitch::{GlitchProfile, GlitchTargets, Pose};

/// A glitch bound to pointer hover.
#[derive(Debug)]
pub struct HoverGlitch {
    sequence: Sequence,
    rest: Pose,
    reverses: bool,
}

impl HoverGlitch {
    /// Lay out `profile` over `targets`.
    pub fn new<R: Rng + ?Sized>(
        label: impl Into<String>,
        profile: &GlitchProfile,
        targets: &GlitchTargets,
        rng: &mut R,
    ) -> Result<Self, ConfigurationError> {
        let timeline = profile.timeline(targets, rng);
        Ok(Self {
            sequence: Sequence::new(label, timeline.segments)?,
            rest: timeline.rest,
            reverses: targets.alternate.is_some(),
        })
    }

    pub fn pointer_enter(&mut self) {
        self.sequence.play();
    }

    pub fn pointer_leave(&mut self) {
        if self.reverses {
            self.sequence.reverse();
        } else {
            self.sequence.pause_at(Duration::ZERO);
        }
    }

    pub fn tick(&mut self, dt: Duration) {
        self.sequence.tick(dt);
        let _ = self.sequence.drain_events();
    }

    /// Resolved pose to paint this frame.
    #[must_use]
    pub fn pose(&self) -> Pose {
        self.rest.resolve(&self.sequence.sample())
    }

    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.sequence.state()
    }

    #[must_use]
    pub fn label(&self) -> &str {
        self.sequence.label()
    }
}
