#![forbid(unsafe_code)]

//! Glitch preset: the slice/word flicker shared by headlines, carousel items
//! and hover links.
//!
//! The preset is authored as absolute destinations ("move y to a random
//! offset, then back to 0"), while sequence segments add deltas. A [`Pose`]
//! tracks each target's value while the steps are laid down and converts
//! every destination into a per-target delta. The starting pose is returned
//! as the rest pose; the host paints `rest.resolve(&sequence.sample())`.

use std::collections::BTreeMap;
use std::time::Duration;

use rand::Rng;
use scrollcue_core::animation::stagger::Stagger;
use scrollcue_core::sequence::{Property, PropertyDelta, PropertyFrame, Segment, TargetId};

// ---------------------------------------------------------------------------
// Pose
// ---------------------------------------------------------------------------

/// Absolute property values per target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pose {
    values: BTreeMap<(TargetId, Property), f32>,
}

impl Pose {
    /// Value of `property` on `target`, zero if unset.
    #[must_use]
    pub fn get(&self, target: &TargetId, property: Property) -> f32 {
        self.values
            .get(&(target.clone(), property))
            .copied()
            .unwrap_or(0.0)
    }

    /// Set `property` on `target`.
    pub fn set(&mut self, target: &TargetId, property: Property, value: f32) {
        self.values.insert((target.clone(), property), value);
    }

    /// This pose with `frame`'s offsets added.
    #[must_use]
    pub fn resolve(&self, frame: &PropertyFrame) -> Pose {
        let mut resolved = self.clone();
        for (target, property, offset) in frame.iter() {
            *resolved
                .values
                .entry((target.clone(), property))
                .or_insert(0.0) += offset;
        }
        resolved
    }

    /// Iterate over every `(target, property, value)`.
    pub fn iter(&self) -> impl Iterator<Item = (&TargetId, Property, f32)> {
        self.values.iter().map(|((t, p), v)| (t, *p, *v))
    }

    /// Whether no value is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Timing of the glitch preset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlitchProfile {
    /// Length of the long steps and of most stagger spreads.
    pub step: Duration,
    /// Length of the short flashes.
    pub flash: Duration,
    /// Stagger spread of the opening fade-in.
    pub intro_spread: Duration,
    /// Jitter amplitude, percent of the target's size.
    pub jitter: f32,
    /// Length of each detail-panel flicker step.
    pub detail_step: Duration,
}

impl Default for GlitchProfile {
    fn default() -> Self {
        Self::headline()
    }
}

impl GlitchProfile {
    /// Timing used for scroll-triggered headlines.
    #[must_use]
    pub const fn headline() -> Self {
        Self {
            step: Duration::from_millis(40),
            flash: Duration::from_millis(10),
            intro_spread: Duration::from_millis(200),
            jitter: 50.0,
            detail_step: Duration::from_millis(40),
        }
    }

    /// Tighter timing used by carousel items and hover links.
    #[must_use]
    pub const fn slider() -> Self {
        Self {
            step: Duration::from_millis(20),
            ..Self::headline()
        }
    }

    /// Set the long-step length (builder).
    #[must_use]
    pub const fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    /// Lay out the preset over `targets`, drawing jitter from `rng`.
    pub fn timeline<R: Rng + ?Sized>(&self, targets: &GlitchTargets, rng: &mut R) -> GlitchTimeline {
        let items = targets.items.as_slice();
        let top = if targets.top_layer.is_empty() {
            items
        } else {
            targets.top_layer.as_slice()
        };

        let mut builder = Builder {
            pose: Pose::default(),
            segments: Vec::new(),
            jitter: self.jitter,
            rng,
        };
        for item in items {
            builder.pose.set(item, Property::Opacity, 0.0);
            let x = builder.jitter_value();
            builder.pose.set(item, Property::X, x);
            let y = builder.jitter_value();
            builder.pose.set(item, Property::Y, y);
        }
        for target in &targets.top_layer {
            builder.pose.set(target, Property::X, 0.0);
        }
        if let Some(alt) = &targets.alternate {
            for target in &alt.primary {
                builder.pose.set(target, Property::Opacity, 1.0);
            }
            for target in &alt.alternate {
                builder.pose.set(target, Property::Opacity, 0.0);
            }
        }
        if let Some(detail) = &targets.detail {
            builder.pose.set(detail, Property::Opacity, 0.0);
        }
        let rest = builder.pose.clone();

        let step = self.step;
        let flash = self.flash;
        let seq = Stagger::sequential;
        let shuffled = Stagger::random;

        builder.to(items, Property::Opacity, Goal::Value(1.0), flash, seq(self.intro_spread));
        builder.to(items, Property::Y, Goal::Jitter, flash, seq(step));
        builder.to(items, Property::Y, Goal::Value(0.0), step, seq(step));
        builder.to(items, Property::Opacity, Goal::Value(0.0), step, shuffled(step));
        builder.to(items, Property::Opacity, Goal::Value(1.0), flash, shuffled(step));
        builder.to(items, Property::X, Goal::Jitter, step, seq(flash));
        builder.to(top, Property::X, Goal::Jitter, flash, seq(step));
        builder.to(items, Property::Opacity, Goal::Value(0.0), step, shuffled(step));
        if let Some(alt) = &targets.alternate {
            builder.to(&alt.primary, Property::Opacity, Goal::Value(0.0), Duration::ZERO, Stagger::none());
            builder.to(&alt.alternate, Property::Opacity, Goal::Value(1.0), Duration::ZERO, Stagger::none());
        }
        builder.to(items, Property::Opacity, Goal::Value(1.0), flash, shuffled(step));
        builder.to(items, Property::X, Goal::Value(0.0), step, seq(step));
        builder.to(top, Property::X, Goal::Value(0.0), flash, seq(step));

        if let Some(detail) = &targets.detail {
            let detail = std::slice::from_ref(detail);
            for visible in [1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0] {
                builder.to(detail, Property::Opacity, Goal::Value(visible), self.detail_step, Stagger::none());
            }
        }

        GlitchTimeline {
            rest,
            segments: builder.segments,
        }
    }
}

// ---------------------------------------------------------------------------
// Targets and output
// ---------------------------------------------------------------------------

/// Layer swapped in halfway through a hover glitch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlternateLayer {
    pub primary: Vec<TargetId>,
    pub alternate: Vec<TargetId>,
}

/// What the preset animates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlitchTargets {
    /// Words or slices.
    pub items: Vec<TargetId>,
    /// Duplicate layer jittered separately; empty means `items`.
    pub top_layer: Vec<TargetId>,
    /// Panel flickered in after the glitch settles.
    pub detail: Option<TargetId>,
    pub alternate: Option<AlternateLayer>,
}

impl GlitchTargets {
    /// Glitch over `items` only.
    pub fn new<T: Into<TargetId>>(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Jitter a separate top layer (builder).
    #[must_use]
    pub fn top_layer<T: Into<TargetId>>(mut self, targets: impl IntoIterator<Item = T>) -> Self {
        self.top_layer = targets.into_iter().map(Into::into).collect();
        self
    }

    /// Flicker a detail panel at the end (builder).
    #[must_use]
    pub fn detail(mut self, target: impl Into<TargetId>) -> Self {
        self.detail = Some(target.into());
        self
    }

    /// Swap in an alternate layer mid-glitch (builder).
    #[must_use]
    pub fn alternate(mut self, layer: AlternateLayer) -> Self {
        self.alternate = Some(layer);
        self
    }
}

/// Segments of a laid-out glitch plus the pose they start from.
#[derive(Debug, Clone, PartialEq)]
pub struct GlitchTimeline {
    pub rest: Pose,
    pub segments: Vec<Segment>,
}

enum Goal {
    Value(f32),
    Jitter,
}

struct Builder<'a, R: ?Sized> {
    pose: Pose,
    segments: Vec<Segment>,
    jitter: f32,
    rng: &'a mut R,
}

impl<R: Rng + ?Sized> Builder<'_, R> {
    fn jitter_value(&mut self) -> f32 {
        if self.jitter > 0.0 {
            self.rng.gen_range(-self.jitter..=self.jitter)
        } else {
            0.0
        }
    }

    fn to(&mut self, targets: &[TargetId], property: Property, goal: Goal, duration: Duration, stagger: Stagger) {
        if targets.is_empty() {
            return;
        }
        let mut deltas = Vec::with_capacity(targets.len());
        for target in targets {
            let to = match goal {
                Goal::Value(v) => v,
                Goal::Jitter => self.jitter_value(),
            };
            deltas.push(to - self.pose.get(target, property));
            self.pose.set(target, property, to);
        }
        self.segments.push(
            Segment::new(targets.iter().cloned(), duration)
                .delta(PropertyDelta::per_target(property, deltas))
                .stagger(stagger),
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
