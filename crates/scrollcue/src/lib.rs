#![forbid(unsafe_code)]

//! scrollcue public facade crate.
//!
//! Re-exports the sequence player, region trigger engine and carousel from
//! `scrollcue-core`, and with the `fx` feature (on by default) the site
//! effects and scene driver from `scrollcue-fx`.

// --- Core re-exports -------------------------------------------------------

pub use scrollcue_core::animation::{Animation, Ease};
pub use scrollcue_core::carousel::{
    Carousel, CarouselEvent, CarouselItem, Handoff, Step, Transition,
};
pub use scrollcue_core::error::ConfigurationError;
pub use scrollcue_core::sequence::{
    Direction, PlaybackState, Property, PropertyDelta, PropertyFrame, Segment, Sequence,
    SequenceEvent, TargetId,
};
pub use scrollcue_core::trigger::{
    Boundary, Edge, Lifecycle, Region, RegionHandlers, RegionId, RegionState,
    RegionTriggerEngine, Schedule, TriggerEvent, TriggerGeometry,
};
pub use scrollcue_core::{Stagger, StaggerMode, StaggerOrder};

// --- Effect re-exports -----------------------------------------------------

#[cfg(feature = "fx")]
pub use scrollcue_fx::{
    AudioCue, AudioGate, CuePlayback, FrameOutput, GlitchProfile, GlitchTargets, MusicCommand,
    Pose, Scene, SceneAction, SceneConfig,
};

#[cfg(feature = "tracing-json")]
pub use scrollcue_fx::LogFormat;

/// Standard result type for scrollcue construction APIs.
pub type Result<T> = std::result::Result<T, ConfigurationError>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Boundary, Carousel, CarouselItem, ConfigurationError, Lifecycle, PlaybackState,
        Property, Region, RegionHandlers, RegionTriggerEngine, Result, Segment, Sequence,
        SequenceEvent, Stagger, Step, TargetId, Transition, TriggerGeometry,
    };

    #[cfg(feature = "fx")]
    pub use crate::{FrameOutput, Scene, SceneConfig};

    pub use crate::core;
    #[cfg(feature = "fx")]
    pub use crate::fx;
}

pub use scrollcue_core as core;
#[cfg(feature = "fx")]
pub use scrollcue_fx as fx;
