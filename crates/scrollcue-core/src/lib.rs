#![forbid(unsafe_code)]

//! Core: sequence playback, scroll region triggers, and crossfade carousels.
//!
//! Everything here is single-threaded and frame-driven. Owners feed time
//! (`tick`) and scroll positions (`update`) in, and drain queued events out;
//! nothing in this crate calls back into the owner.

pub mod animation;
pub mod carousel;
pub mod error;
pub mod sequence;
pub mod trigger;

pub use animation::stagger::{Stagger, StaggerMode, StaggerOrder};
pub use animation::{Animation, Ease};
pub use carousel::{Carousel, CarouselEvent, CarouselItem, Handoff, Step, Transition};
pub use error::ConfigurationError;
pub use sequence::{
    Direction, PlaybackState, Property, PropertyDelta, PropertyFrame, Segment, Sequence,
    SequenceEvent, TargetId,
};
pub use trigger::{
    Boundary, Edge, Lifecycle, Region, RegionHandlers, RegionId, RegionState,
    RegionTriggerEngine, Schedule, TriggerEvent, TriggerGeometry,
};
