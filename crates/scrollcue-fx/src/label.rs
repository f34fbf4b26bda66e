#![forbid(unsafe_code)]

//! Label swap: erase the shown name, pause, then type the next one.

use std::time::Duration;

use scrollcue_core::Ease;
use scrollcue_core::animation::{Animation, Chain, Delayed, Fade, chain, delay};
use serde::{Deserialize, Serialize};

/// Timing of a label swap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelSwapConfig {
    /// Seconds spent erasing the old label.
    pub erase: f64,
    /// Seconds between erase and type.
    pub gap: f64,
    /// Seconds spent typing the new label.
    pub write: f64,
    pub easing: Ease,
}

impl Default for LabelSwapConfig {
    fn default() -> Self {
        Self {
            erase: 0.25,
            gap: 0.25,
            write: 0.25,
            easing: Ease::SineIn,
        }
    }
}

type Swap = Chain<Fade, Delayed<Fade>>;

/// Animated carousel label.
#[derive(Debug, Clone)]
pub struct LabelSwap {
    erase: Duration,
    gap: Duration,
    write: Duration,
    easing: Ease,
    outgoing: String,
    incoming: String,
    swap: Option<Swap>,
}

impl LabelSwap {
    /// A blank label using `config` timing.
    ///
    /// Invalid durations fall back to zero.
    pub fn new(config: LabelSwapConfig) -> Self {
        let secs = |s: f64| Duration::try_from_secs_f64(s).unwrap_or_default();
        Self {
            erase: secs(config.erase),
            gap: secs(config.gap),
            write: secs(config.write),
            easing: config.easing,
            outgoing: String::new(),
            incoming: String::new(),
            swap: None,
        }
    }

    /// Start swapping to `label` from whatever is shown now.
    pub fn set(&mut self, label: &str) {
        if self.swap.is_none() && self.outgoing == label {
            return;
        }
        self.outgoing = self.text();
        self.incoming = label.to_string();
        let easing = self.easing;
        self.swap = Some(chain(
            Fade::new(self.erase).easing(easing),
            delay(self.gap, Fade::new(self.write).easing(easing)),
        ));
    }

    pub fn tick(&mut self, dt: Duration) {
        let Some(swap) = self.swap.as_mut() else {
            return;
        };
        swap.tick(dt);
        if swap.is_complete() {
            self.outgoing = std::mem::take(&mut self.incoming);
            self.swap = None;
        }
    }

    /// Whether a swap is in progress.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.swap.is_some()
    }

    /// Label to paint this frame.
    #[must_use]
    pub fn text(&self) -> String {
        let Some(swap) = &self.swap else {
            return self.outgoing.clone();
        };
        if !swap.in_second() {
            prefix(&self.outgoing, 1.0 - swap.value())
        } else if !swap.second().has_started() {
            String::new()
        } else {
            prefix(&self.incoming, swap.value())
        }
    }
}

fn prefix(text: &str, fraction: f32) -> String {
    let count = text.chars().count();
    let keep = ((count as f32 * fraction.clamp(0.0, 1.0)).round() as usize).min(count);
    text.chars().take(keep).collect()
}
