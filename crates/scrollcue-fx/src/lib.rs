#![forbid(unsafe_code)]

//! Site effects built on `scrollcue-core`.
//!
//! - [`glitch`]: the sliced glitch preset used by headlines, carousels and links.
//! - [`scramble`]: scramble resolve and typewriter reveal text.
//! - [`label`] and [`stats`]: carousel presenters.
//! - [`audio`] and [`load_gate`]: when sound may play and when the page is ready.
//! - [`config`] and [`scene`]: a declarative page description and its driver.
//! - `logging` (feature `tracing-json`): a ready-made subscriber for hosts.

pub mod audio;
pub mod config;
pub mod glitch;
pub mod hover;
pub mod label;
pub mod load_gate;
#[cfg(feature = "tracing-json")]
pub mod logging;
pub mod scene;
pub mod scramble;
pub mod stats;

pub use audio::{AudioCue, AudioGate, CuePlayback, MusicCommand};
pub use config::{
    CarouselConfig, EffectConfig, EffectKind, HoverConfig, HoverKind, ItemConfig, RegionBinding,
    RegionConfig, SceneConfig,
};
pub use glitch::{AlternateLayer, GlitchProfile, GlitchTargets, GlitchTimeline, Pose};
pub use hover::HoverGlitch;
pub use label::{LabelSwap, LabelSwapConfig};
pub use load_gate::LoadGate;
#[cfg(feature = "tracing-json")]
pub use logging::LogFormat;
pub use scene::{FrameOutput, Scene, SceneAction};
pub use scramble::{HoverScramble, ScrambleText, TypewriterReveal};
pub use stats::{StatBars, StatBarsConfig};
