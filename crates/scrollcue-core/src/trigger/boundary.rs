#![forbid(unsafe_code)]

//! Viewport-relative boundaries such as `"top 60%"`.
//!
//! A boundary pairs an edge of the trigger with an edge of the viewport and
//! describes the scroll offset at which the two coincide. The first word is
//! the trigger edge, the second the viewport edge; each is `top`, `center`,
//! `bottom`, a percentage (`60%`) or a pixel offset (`120px`, or a bare
//! number).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// A position along an extent (trigger height or viewport height).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Edge {
    Top,
    Center,
    Bottom,
    /// Percentage of the extent, measured from the top.
    Percent(f64),
    /// Absolute distance from the top.
    Pixels(f64),
}

impl Edge {
    /// Distance of this edge from the top of an extent of `extent` units.
    #[must_use]
    pub fn resolve(self, extent: f64) -> f64 {
        match self {
            Self::Top => 0.0,
            Self::Center => extent / 2.0,
            Self::Bottom => extent,
            Self::Percent(p) => extent * p / 100.0,
            Self::Pixels(px) => px,
        }
    }

    fn parse(word: &str, input: &str) -> Result<Self, ConfigurationError> {
        let invalid = |reason| ConfigurationError::InvalidBoundary {
            input: input.to_string(),
            reason,
        };
        let edge = match word {
            "top" => Self::Top,
            "center" => Self::Center,
            "bottom" => Self::Bottom,
            _ => {
                let (number, percent) = match word.strip_suffix('%') {
                    Some(n) => (n, true),
                    None => (word.strip_suffix("px").unwrap_or(word), false),
                };
                let value: f64 = number.parse().map_err(|_| invalid("unrecognised edge"))?;
                if !value.is_finite() {
                    return Err(invalid("edge offset is not finite"));
                }
                if percent {
                    Self::Percent(value)
                } else {
                    Self::Pixels(value)
                }
            }
        };
        Ok(edge)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => f.write_str("top"),
            Self::Center => f.write_str("center"),
            Self::Bottom => f.write_str("bottom"),
            Self::Percent(p) => write!(f, "{p}%"),
            Self::Pixels(px) => write!(f, "{px}px"),
        }
    }
}

/// Trigger edge paired with viewport edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Boundary {
    /// Edge of the trigger surface.
    pub trigger: Edge,
    /// Edge of the viewport.
    pub viewport: Edge,
}

impl Boundary {
    /// Region start used when none is configured: trigger top at 60% of the
    /// viewport.
    pub const DEFAULT_START: Self = Self {
        trigger: Edge::Top,
        viewport: Edge::Percent(60.0),
    };

    /// Region end used when none is configured: trigger bottom at viewport top.
    pub const DEFAULT_END: Self = Self {
        trigger: Edge::Bottom,
        viewport: Edge::Top,
    };

    /// Create a boundary from its two edges.
    #[must_use]
    pub const fn new(trigger: Edge, viewport: Edge) -> Self {
        Self { trigger, viewport }
    }

    /// Scroll offset at which the two edges meet.
    #[must_use]
    pub fn resolve(&self, geometry: TriggerGeometry, viewport_height: f64) -> f64 {
        geometry.top + self.trigger.resolve(geometry.height) - self.viewport.resolve(viewport_height)
    }
}

impl FromStr for Boundary {
    type Err = ConfigurationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut words = input.split_whitespace();
        let (Some(trigger), viewport, None) = (words.next(), words.next(), words.next()) else {
            return Err(ConfigurationError::InvalidBoundary {
                input: input.to_string(),
                reason: "expected \"<trigger edge> <viewport edge>\"",
            });
        };
        let trigger = Edge::parse(trigger, input)?;
        // A lone edge applies to both surfaces.
        let viewport = match viewport {
            Some(word) => Edge::parse(word, input)?,
            None => trigger,
        };
        Ok(Self { trigger, viewport })
    }
}

impl TryFrom<String> for Boundary {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Boundary> for String {
    fn from(value: Boundary) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.trigger, self.viewport)
    }
}

/// Layout of a trigger surface, in scroll units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TriggerGeometry {
    /// Document offset of the surface's top edge.
    pub top: f64,
    /// Height of the surface.
    pub height: f64,
}

impl TriggerGeometry {
    /// Create geometry from top offset and height.
    #[must_use]
    pub const fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.top.is_finite() {
            return Err(ConfigurationError::InvalidGeometry {
                field: "trigger top",
                value: self.top,
            });
        }
        if !self.height.is_finite() || self.height < 0.0 {
            return Err(ConfigurationError::InvalidGeometry {
                field: "trigger height",
                value: self.height,
            });
        }
        Ok(())
    }
}
