#![forbid(unsafe_code)]

//! Segments: one step of a sequence applied to a set of targets.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::animation::Ease;
use crate::animation::stagger::Stagger;

/// Opaque reference to something the host paints (a slice, a word, a panel).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(Arc<str>);

impl TargetId {
    /// Create a target reference.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Borrow the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TargetId {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

/// Animatable quantity of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    /// Opacity, in [0, 1].
    Opacity,
    /// Horizontal offset, percent of the target's width.
    X,
    /// Vertical offset, percent of the target's height.
    Y,
    /// Width, percent of the container.
    Width,
    /// Text reveal progress, in [0, 1].
    Reveal,
}

/// Size of a property change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeltaValue {
    /// Same change for every target.
    Uniform(f32),
    /// One change per target, in target-list order.
    PerTarget(Vec<f32>),
}

impl DeltaValue {
    fn for_target(&self, index: usize) -> f32 {
        match self {
            Self::Uniform(v) => *v,
            Self::PerTarget(values) => values.get(index).copied().unwrap_or(0.0),
        }
    }
}

/// A property change applied by a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDelta {
    /// Property being changed.
    pub property: Property,
    /// Amount added over the segment.
    pub delta: DeltaValue,
}

impl PropertyDelta {
    /// The same change for every target.
    #[must_use]
    pub fn uniform(property: Property, delta: f32) -> Self {
        Self {
            property,
            delta: DeltaValue::Uniform(delta),
        }
    }

    /// One change per target.
    #[must_use]
    pub fn per_target(property: Property, deltas: Vec<f32>) -> Self {
        Self {
            property,
            delta: DeltaValue::PerTarget(deltas),
        }
    }
}

/// One step of a sequence.
///
/// Built with [`Segment::new`] and the builder methods; validated when the
/// owning [`Sequence`](super::Sequence) is constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub(crate) targets: Vec<TargetId>,
    pub(crate) deltas: Vec<PropertyDelta>,
    pub(crate) duration: Duration,
    pub(crate) stagger: Stagger,
    pub(crate) easing: Ease,
}

impl Segment {
    /// A segment over `targets` lasting `duration` per target.
    pub fn new<T: Into<TargetId>>(targets: impl IntoIterator<Item = T>, duration: Duration) -> Self {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
            deltas: Vec::new(),
            duration,
            stagger: Stagger::none(),
            easing: Ease::Linear,
        }
    }

    /// Add a property change (builder).
    #[must_use]
    pub fn delta(mut self, delta: PropertyDelta) -> Self {
        self.deltas.push(delta);
        self
    }

    /// Add a uniform change (builder).
    #[must_use]
    pub fn by(self, property: Property, amount: f32) -> Self {
        self.delta(PropertyDelta::uniform(property, amount))
    }

    /// Set the stagger policy (builder).
    #[must_use]
    pub fn stagger(mut self, stagger: Stagger) -> Self {
        self.stagger = stagger;
        self
    }

    /// Set the easing curve (builder).
    #[must_use]
    pub fn easing(mut self, easing: Ease) -> Self {
        self.easing = easing;
        self
    }

    /// Targets in list order.
    #[must_use]
    pub fn targets(&self) -> &[TargetId] {
        &self.targets
    }

    /// Per-target duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Stagger policy.
    #[must_use]
    pub fn stagger_policy(&self) -> Stagger {
        self.stagger
    }

    /// Time from the segment's start until its last target finishes.
    #[must_use]
    pub fn span(&self) -> Duration {
        self.duration + self.stagger.effective_spread(self.targets.len())
    }

    /// Accumulate this segment's contribution at `local` time into `frame`.
    pub(crate) fn contribute(&self, local: Duration, offsets: &[Duration], frame: &mut PropertyFrame) {
        for (index, target) in self.targets.iter().enumerate() {
            let offset = offsets.get(index).copied().unwrap_or_default();
            let progress = if local <= offset {
                0.0
            } else if self.duration.is_zero() {
                1.0
            } else {
                ((local - offset).as_secs_f64() / self.duration.as_secs_f64()).min(1.0) as f32
            };
            let eased = self.easing.apply(progress);
            for delta in &self.deltas {
                let amount = delta.delta.for_target(index) * eased;
                *frame
                    .values
                    .entry((target.clone(), delta.property))
                    .or_insert(0.0) += amount;
            }
        }
    }
}

/// Accumulated property offsets of every target at a playhead position.
///
/// Values are offsets from the state the host painted before the sequence
/// first played.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyFrame {
    values: BTreeMap<(TargetId, Property), f32>,
}

impl PropertyFrame {
    /// Offset of `property` on `target`, zero if never touched.
    #[must_use]
    pub fn get(&self, target: &TargetId, property: Property) -> f32 {
        self.values
            .get(&(target.clone(), property))
            .copied()
            .unwrap_or(0.0)
    }

    /// Iterate over every touched `(target, property)` pair.
    pub fn iter(&self) -> impl Iterator<Item = (&TargetId, Property, f32)> {
        self.values.iter().map(|((t, p), v)| (t, *p, *v))
    }

    /// Whether every offset is within `epsilon` of zero.
    #[must_use]
    pub fn is_rest(&self, epsilon: f32) -> bool {
        self.values.values().all(|v| v.abs() <= epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS_10: Duration = Duration::from_millis(10);

    #[test]
    fn span_includes_spread_for_multiple_targets() {
        let seg = Segment::new(["a", "b", "c"], MS_10).stagger(Stagger::random(Duration::from_millis(40)));
        assert_eq!(seg.span(), Duration::from_millis(50));
        let single = Segment::new(["a"], MS_10).stagger(Stagger::sequential(Duration::from_millis(40)));
        assert_eq!(single.span(), MS_10);
    }

    #[test]
    fn contribute_respects_offsets() {
        let seg = Segment::new(["a", "b"], MS_10).by(Property::Opacity, 1.0);
        let offsets = [Duration::ZERO, MS_10];
        let mut frame = PropertyFrame::default();
        seg.contribute(MS_10, &offsets, &mut frame);
        assert!((frame.get(&"a".into(), Property::Opacity) - 1.0).abs() < f32::EPSILON);
        assert!(frame.get(&"b".into(), Property::Opacity).abs() < f32::EPSILON);
    }

    #[test]
    fn zero_duration_segment_snaps() {
        let seg = Segment::new(["a"], Duration::ZERO).by(Property::Opacity, -1.0);
        let mut frame = PropertyFrame::default();
        seg.contribute(Duration::from_nanos(1), &[Duration::ZERO], &mut frame);
        assert!((frame.get(&"a".into(), Property::Opacity) + 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn per_target_deltas_are_indexed() {
        let seg = Segment::new(["a", "b"], MS_10)
            .delta(PropertyDelta::per_target(Property::Y, vec![10.0, -20.0]));
        let mut frame = PropertyFrame::default();
        seg.contribute(MS_10, &[Duration::ZERO, Duration::ZERO], &mut frame);
        assert!((frame.get(&"b".into(), Property::Y) + 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn target_id_deserializes_from_plain_string() {
        let id: TargetId = serde_json::from_str("\"slice-top\"").unwrap_or_else(|_| "x".into());
        assert_eq!(id.as_str(), "slice-top");
    }
}
