#![forbid(unsafe_code)]

//! Configuration errors.
//!
//! Every runtime operation (`play`, `reverse`, `update`, `go_to`) normalizes
//! degenerate input instead of failing. The only fallible surface is
//! construction and registration, which report a [`ConfigurationError`].

use std::fmt;
use std::time::Duration;

/// A malformed region, sequence, or carousel definition.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// A region was registered without a trigger reference.
    MissingTrigger {
        /// Position of the region in registration order.
        region: usize,
    },
    /// A boundary string could not be parsed.
    InvalidBoundary {
        /// Offending input.
        input: String,
        /// What was wrong with it.
        reason: &'static str,
    },
    /// The resolved end offset lies before the resolved start offset.
    InvertedRange {
        /// Trigger reference of the region.
        trigger: String,
        /// Resolved start, in scroll units.
        start: f64,
        /// Resolved end, in scroll units.
        end: f64,
    },
    /// Viewport or trigger geometry is not finite or is negative.
    InvalidGeometry {
        /// Which measurement was rejected.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// A segment names no targets.
    EmptyTargets {
        /// Owning sequence.
        sequence: String,
        /// Segment position inside the sequence.
        segment: usize,
    },
    /// A duration is negative, NaN or infinite.
    InvalidDuration {
        /// Where the duration came from.
        context: String,
        /// Duration in seconds as written.
        seconds: f64,
    },
    /// A per-target delta list does not match the target list.
    MismatchedDeltas {
        /// Owning sequence.
        sequence: String,
        /// Segment position inside the sequence.
        segment: usize,
        /// Number of targets.
        targets: usize,
        /// Number of delta values.
        values: usize,
    },
    /// A playback rate is zero, negative or not finite.
    InvalidRate {
        /// Where the rate came from.
        context: String,
        /// The rejected value.
        rate: f64,
    },
    /// A carousel was declared without items.
    EmptyCarousel {
        /// Carousel name.
        carousel: String,
    },
    /// Two carousel items share a name.
    DuplicateItem {
        /// Carousel name.
        carousel: String,
        /// Repeated item name.
        item: String,
    },
    /// Two effects, carousels or hover targets share a name.
    DuplicateName {
        /// What kind of definition is repeated.
        kind: &'static str,
        /// Repeated name.
        name: String,
    },
    /// A reference to a carousel item group that does not exist.
    UnknownGroup {
        /// Carousel name.
        carousel: String,
        /// Requested group.
        group: String,
    },
    /// A reference to a carousel that does not exist.
    UnknownCarousel {
        /// Requested carousel name.
        carousel: String,
    },
    /// A reference to an effect that does not exist.
    UnknownEffect {
        /// Requested effect name.
        effect: String,
    },
    /// Declarative configuration could not be decoded.
    Parse {
        /// Decoder message.
        message: String,
    },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTrigger { region } => {
                write!(f, "region #{region} has no trigger reference")
            }
            Self::InvalidBoundary { input, reason } => {
                write!(f, "invalid boundary {input:?}: {reason}")
            }
            Self::InvertedRange {
                trigger,
                start,
                end,
            } => write!(
                f,
                "region on {trigger:?} ends at {end} before it starts at {start}"
            ),
            Self::InvalidGeometry { field, value } => {
                write!(f, "invalid {field}: {value}")
            }
            Self::EmptyTargets { sequence, segment } => {
                write!(f, "sequence {sequence:?} segment {segment} has no targets")
            }
            Self::InvalidDuration { context, seconds } => {
                write!(f, "invalid duration {seconds}s in {context}")
            }
            Self::MismatchedDeltas {
                sequence,
                segment,
                targets,
                values,
            } => write!(
                f,
                "sequence {sequence:?} segment {segment} has {targets} targets but {values} delta values"
            ),
            Self::InvalidRate { context, rate } => {
                write!(f, "invalid playback rate {rate} in {context}")
            }
            Self::EmptyCarousel { carousel } => {
                write!(f, "carousel {carousel:?} has no items")
            }
            Self::DuplicateItem { carousel, item } => {
                write!(f, "carousel {carousel:?} declares item {item:?} twice")
            }
            Self::DuplicateName { kind, name } => {
                write!(f, "{kind} {name:?} is declared twice")
            }
            Self::UnknownGroup { carousel, group } => {
                write!(f, "carousel {carousel:?} has no group {group:?}")
            }
            Self::UnknownCarousel { carousel } => {
                write!(f, "no carousel named {carousel:?}")
            }
            Self::UnknownEffect { effect } => write!(f, "no effect named {effect:?}"),
            Self::Parse { message } => write!(f, "configuration parse error: {message}"),
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Validate a duration written in seconds.
pub fn seconds(context: impl Into<String>, seconds: f64) -> Result<Duration, ConfigurationError> {
    Duration::try_from_secs_f64(seconds).map_err(|_| ConfigurationError::InvalidDuration {
        context: context.into(),
        seconds,
    })
}

/// Validate a playback rate.
pub fn rate(context: impl Into<String>, rate: f64) -> Result<f64, ConfigurationError> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(ConfigurationError::InvalidRate {
            context: context.into(),
            rate,
        });
    }
    Ok(rate)
}
