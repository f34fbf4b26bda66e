#![forbid(unsafe_code)]

//! Sequence player: an ordered, reversible timeline of segments.
//!
//! A [`Sequence`] owns a list of [`Segment`]s laid end to end. Each segment
//! starts when the previous one's span (base duration plus stagger spread) has
//! elapsed. Transport operations change the playback state; time only moves
//! when the owner calls [`Sequence::tick`] once per frame.
//!
//! # Continuations
//!
//! A sequence holds at most one reverse-completion continuation of type `K`.
//! Registering a new one replaces the old one, so the last registration wins
//! and a superseded continuation can never be delivered. When a reversal
//! reaches offset 0 the continuation is moved into a
//! [`SequenceEvent::ReverseComplete`] event and the slot is cleared. Owners
//! drain events after ticking and act on the continuation themselves, which
//! keeps the player free of closures over foreign state.
//!
//! # Invariants
//!
//! 1. `play`/`reverse` on a sequence without segments leave it `Idle`.
//! 2. A reverse continuation is delivered at most once.
//! 3. `play` on a reversing sequence abandons the reversal and drops its
//!    continuation.
//! 4. `pause_at` never delivers events.
//! 5. Total duration is the sum of segment spans whatever the stagger order.
//!
//! # Failure Modes
//!
//! - Non-finite or non-positive rates passed to `set_rate` are ignored.
//! - Offsets passed to `pause_at` beyond the end are clamped.

pub mod segment;

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, trace, warn};

use crate::animation::stagger::StaggerOrder;
use crate::error::ConfigurationError;
pub use segment::{DeltaValue, Property, PropertyDelta, PropertyFrame, Segment, TargetId};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Playback state of a [`Sequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Not moving; either never played or reached an end.
    Idle,
    /// Moving towards the end.
    Playing,
    /// Moving towards offset 0.
    Reversing,
    /// Pinned by [`Sequence::pause_at`].
    Paused,
}

/// Direction of travel of the playhead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Lifecycle milestone queued during [`Sequence::tick`].
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceEvent<K> {
    /// Forward playback left offset 0 (after any pending delay).
    Started,
    /// Forward playback reached the end.
    Completed,
    /// A reversal reached offset 0.
    ReverseComplete {
        /// The registered continuation, if any.
        continuation: Option<K>,
    },
}

/// Reversible timeline of segments with transport controls.
pub struct Sequence<K = ()> {
    label: String,
    segments: Vec<Segment>,
    /// Start offset of each segment on the timeline.
    starts: Vec<Duration>,
    /// Per-segment, per-target stagger offsets for the current pass.
    offsets: Vec<Vec<Duration>>,
    total: Duration,
    playhead: Duration,
    direction: Direction,
    state: PlaybackState,
    rate: f64,
    delay: Duration,
    pending_delay: Duration,
    started: bool,
    continuation: Option<K>,
    events: Vec<SequenceEvent<K>>,
    rng: StdRng,
}

impl<K> fmt::Debug for Sequence<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("label", &self.label)
            .field("segments", &self.segments.len())
            .field("state", &self.state)
            .field("playhead", &self.playhead)
            .field("total", &self.total)
            .field("rate", &self.rate)
            .field("has_continuation", &self.continuation.is_some())
            .field("pending_events", &self.events.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl<K> Sequence<K> {
    /// Build a sequence from its segments.
    ///
    /// Fails if a segment has no targets or a per-target delta list does not
    /// match its target list.
    pub fn new(
        label: impl Into<String>,
        segments: Vec<Segment>,
    ) -> Result<Self, ConfigurationError> {
        let label = label.into();
        for (index, segment) in segments.iter().enumerate() {
            if segment.targets.is_empty() {
                return Err(ConfigurationError::EmptyTargets {
                    sequence: label,
                    segment: index,
                });
            }
            for delta in &segment.deltas {
                let DeltaValue::PerTarget(values) = &delta.delta else {
                    continue;
                };
                if values.len() != segment.targets.len() {
                    return Err(ConfigurationError::MismatchedDeltas {
                        sequence: label,
                        segment: index,
                        targets: segment.targets.len(),
                        values: values.len(),
                    });
                }
            }
        }

        let mut starts = Vec::with_capacity(segments.len());
        let mut cursor = Duration::ZERO;
        for segment in &segments {
            starts.push(cursor);
            cursor += segment.span();
        }

        let mut hasher = DefaultHasher::new();
        label.hash(&mut hasher);
        let mut rng = StdRng::seed_from_u64(hasher.finish());
        let offsets = segments
            .iter()
            .map(|s| s.stagger.offsets(s.targets.len(), &mut rng))
            .collect();

        Ok(Self {
            label,
            segments,
            starts,
            offsets,
            total: cursor,
            playhead: Duration::ZERO,
            direction: Direction::Forward,
            state: PlaybackState::Idle,
            rate: 1.0,
            delay: Duration::ZERO,
            pending_delay: Duration::ZERO,
            started: false,
            continuation: None,
            events: Vec::new(),
            rng,
        })
    }

    /// Reseed the random stagger source (builder).
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Set the start delay (builder).
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

// ---------------------------------------------------------------------------
// Inspection
// ---------------------------------------------------------------------------

impl<K> Sequence<K> {
    /// Name given at construction.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Current playback state.
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Direction of the most recent transport command.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Current offset on the timeline.
    #[must_use]
    pub fn playhead(&self) -> Duration {
        self.playhead
    }

    /// Length of a full forward pass at rate 1.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.total
    }

    /// Current playback rate multiplier.
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Delay applied when forward playback starts from offset 0.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Segments in timeline order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether the sequence has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether the playhead sits at offset 0.
    #[must_use]
    pub fn is_at_start(&self) -> bool {
        self.playhead.is_zero()
    }

    /// Whether the playhead sits at the end of the timeline.
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.playhead >= self.total
    }

    /// Playhead as a fraction of the total duration.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.total.is_zero() {
            return if self.started { 1.0 } else { 0.0 };
        }
        (self.playhead.as_secs_f64() / self.total.as_secs_f64()).clamp(0.0, 1.0) as f32
    }

    /// Whether a reverse continuation is registered.
    #[must_use]
    pub fn has_reverse_continuation(&self) -> bool {
        self.continuation.is_some()
    }

    /// Property offsets of every target at the current playhead.
    #[must_use]
    pub fn sample(&self) -> PropertyFrame {
        let mut frame = PropertyFrame::default();
        for (index, segment) in self.segments.iter().enumerate() {
            let local = self.playhead.saturating_sub(self.starts[index]);
            segment.contribute(local, &self.offsets[index], &mut frame);
        }
        frame
    }

    /// Stagger offsets used for segment `index` on the current pass.
    #[must_use]
    pub fn stagger_offsets(&self, index: usize) -> Option<&[Duration]> {
        self.offsets.get(index).map(Vec::as_slice)
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

impl<K> Sequence<K> {
    /// Play forward from the current playhead.
    ///
    /// Starting from offset 0 arms the configured delay. Calling `play` while
    /// reversing takes over immediately and drops the pending continuation.
    pub fn play(&mut self) {
        if self.segments.is_empty() {
            trace!(sequence = %self.label, "play on empty sequence ignored");
            return;
        }
        match self.state {
            PlaybackState::Playing => return,
            PlaybackState::Reversing => {
                if self.continuation.take().is_some() {
                    debug!(sequence = %self.label, "reversal abandoned, continuation dropped");
                }
            }
            PlaybackState::Idle | PlaybackState::Paused => {}
        }
        self.direction = Direction::Forward;
        if !self.total.is_zero() && self.playhead >= self.total {
            self.state = PlaybackState::Idle;
            return;
        }
        if self.playhead.is_zero() {
            self.pending_delay = self.delay;
            self.started = false;
        }
        self.reshuffle();
        self.state = PlaybackState::Playing;
        trace!(sequence = %self.label, playhead = ?self.playhead, "play");
    }

    /// Run backwards towards offset 0.
    ///
    /// On reaching 0 the registered continuation is delivered through a
    /// [`SequenceEvent::ReverseComplete`] event on the next tick.
    pub fn reverse(&mut self) {
        if self.segments.is_empty() {
            trace!(sequence = %self.label, "reverse on empty sequence ignored");
            return;
        }
        if self.state == PlaybackState::Reversing {
            return;
        }
        self.pending_delay = Duration::ZERO;
        self.reshuffle();
        self.direction = Direction::Backward;
        self.state = PlaybackState::Reversing;
        trace!(sequence = %self.label, playhead = ?self.playhead, "reverse");
    }

    /// Stop and pin the playhead to `offset` without delivering events.
    pub fn pause_at(&mut self, offset: Duration) {
        self.playhead = offset.min(self.total);
        self.pending_delay = Duration::ZERO;
        if self.playhead.is_zero() {
            self.started = false;
        }
        self.state = PlaybackState::Paused;
    }

    /// Scale the speed of subsequent playback.
    ///
    /// Zero, negative, and non-finite multipliers are ignored.
    pub fn set_rate(&mut self, rate: f64) {
        if !rate.is_finite() || rate <= 0.0 {
            warn!(sequence = %self.label, rate, "ignoring invalid playback rate");
            return;
        }
        self.rate = rate;
    }

    /// Set the delay applied the next time playback starts from offset 0.
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Register the reverse-completion continuation.
    ///
    /// Replaces and returns any previously registered continuation; the
    /// replaced one will never be delivered.
    pub fn on_reverse_complete(&mut self, continuation: K) -> Option<K> {
        let stale = self.continuation.replace(continuation);
        if stale.is_some() {
            trace!(sequence = %self.label, "reverse continuation replaced");
        }
        stale
    }

    /// Remove the reverse-completion continuation, returning it.
    pub fn clear_reverse_complete(&mut self) -> Option<K> {
        self.continuation.take()
    }

    /// Advance time by `dt`.
    pub fn tick(&mut self, dt: Duration) {
        match self.state {
            PlaybackState::Playing => self.tick_forward(dt),
            PlaybackState::Reversing => self.tick_backward(dt),
            PlaybackState::Idle | PlaybackState::Paused => {}
        }
    }

    /// Drain queued lifecycle events.
    pub fn drain_events(&mut self) -> Vec<SequenceEvent<K>> {
        std::mem::take(&mut self.events)
    }

    /// Number of queued lifecycle events.
    #[must_use]
    pub fn pending_event_count(&self) -> usize {
        self.events.len()
    }

    fn tick_forward(&mut self, dt: Duration) {
        let mut dt = dt;
        if !self.pending_delay.is_zero() {
            if dt < self.pending_delay {
                self.pending_delay -= dt;
                return;
            }
            dt -= self.pending_delay;
            self.pending_delay = Duration::ZERO;
        }
        if !self.started {
            self.started = true;
            self.events.push(SequenceEvent::Started);
        }
        self.playhead = self
            .playhead
            .saturating_add(scale(dt, self.rate))
            .min(self.total);
        if self.playhead >= self.total {
            self.state = PlaybackState::Idle;
            self.events.push(SequenceEvent::Completed);
            trace!(sequence = %self.label, "forward pass complete");
        }
    }

    fn tick_backward(&mut self, dt: Duration) {
        self.playhead = self.playhead.saturating_sub(scale(dt, self.rate));
        if self.playhead.is_zero() {
            self.state = PlaybackState::Idle;
            self.started = false;
            let continuation = self.continuation.take();
            trace!(
                sequence = %self.label,
                continued = continuation.is_some(),
                "reverse pass complete"
            );
            self.events
                .push(SequenceEvent::ReverseComplete { continuation });
        }
    }

    /// Draw a fresh random order for every random-stagger segment the
    /// playhead is not currently inside.
    fn reshuffle(&mut self) {
        for (index, segment) in self.segments.iter().enumerate() {
            if segment.stagger.order != StaggerOrder::Random {
                continue;
            }
            let start = self.starts[index];
            let end = start + segment.span();
            if self.playhead > start && self.playhead < end {
                continue;
            }
            self.offsets[index] = segment
                .stagger
                .offsets(segment.targets.len(), &mut self.rng);
        }
    }
}

fn scale(dt: Duration, rate: f64) -> Duration {
    if rate == 1.0 {
        return dt;
    }
    Duration::try_from_secs_f64(dt.as_secs_f64() * rate).unwrap_or(Duration::MAX)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::stagger::Stagger;

    const MS_10: Duration = Duration::from_millis(10);
    const MS_20: Duration = Duration::from_millis(20);
    const MS_100: Duration = Duration::from_millis(100);
    const SEC_1: Duration = Duration::from_secs(1);

    fn slices() -> Vec<&'static str> {
        vec!["top", "middle", "bottom"]
    }

    fn reveal<K>() -> Sequence<K> {
        Sequence::new(
            "reveal",
            vec![
                Segment::new(slices(), MS_10)
                    .by(Property::Opacity, 1.0)
                    .stagger(Stagger::sequential(MS_20)),
                Segment::new(slices(), MS_20)
                    .by(Property::X, 10.0)
                    .stagger(Stagger::random(MS_20)),
            ],
        )
        .expect("valid sequence")
    }

    #[test]
    fn total_is_sum_of_spans() {
        let seq: Sequence = reveal();
        assert_eq!(seq.total_duration(), Duration::from_millis(30 + 40));
    }

    #[test]
    fn empty_targets_rejected() {
        let err = Sequence::<()>::new("bad", vec![Segment::new(Vec::<&str>::new(), MS_10)])
            .expect_err("no targets");
        assert!(matches!(err, ConfigurationError::EmptyTargets { segment: 0, .. }));
    }

    #[test]
    fn mismatched_deltas_rejected() {
        let seg = Segment::new(slices(), MS_10)
            .delta(PropertyDelta::per_target(Property::Y, vec![1.0]));
        let err = Sequence::<()>::new("bad", vec![seg]).expect_err("mismatch");
        assert!(matches!(
            err,
            ConfigurationError::MismatchedDeltas { targets: 3, values: 1, .. }
        ));
    }

    #[test]
    fn empty_sequence_ignores_transport() {
        let mut seq: Sequence = Sequence::new("empty", Vec::new()).expect("empty is valid");
        seq.play();
        assert_eq!(seq.state(), PlaybackState::Idle);
        seq.reverse();
        assert_eq!(seq.state(), PlaybackState::Idle);
    }

    #[test]
    fn play_runs_to_completion() {
        let mut seq: Sequence = reveal();
        seq.play();
        seq.tick(Duration::from_millis(69));
        assert_eq!(seq.state(), PlaybackState::Playing);
        seq.tick(Duration::from_millis(1));
        assert_eq!(seq.state(), PlaybackState::Idle);
        assert!(seq.is_at_end());
        assert_eq!(
            seq.drain_events(),
            vec![SequenceEvent::Started, SequenceEvent::Completed]
        );
    }

    #[test]
    fn play_is_idempotent() {
        let mut seq: Sequence = reveal();
        seq.play();
        seq.tick(MS_10);
        seq.play();
        assert_eq!(seq.playhead(), MS_10);
        assert_eq!(seq.drain_events(), vec![SequenceEvent::Started]);
    }

    #[test]
    fn delay_only_applies_from_start() {
        let mut seq: Sequence = reveal().with_delay(MS_100);
        seq.play();
        seq.tick(Duration::from_millis(50));
        assert!(seq.is_at_start());
        seq.tick(Duration::from_millis(60));
        assert_eq!(seq.playhead(), MS_10);

        seq.pause_at(Duration::from_millis(20));
        seq.play();
        seq.tick(MS_10);
        assert_eq!(seq.playhead(), Duration::from_millis(30));
    }

    #[test]
    fn reverse_delivers_continuation_once() {
        let mut seq: Sequence<u32> = reveal();
        seq.play();
        seq.tick(SEC_1);
        let _ = seq.drain_events();

        assert_eq!(seq.on_reverse_complete(7), None);
        seq.reverse();
        seq.tick(Duration::from_millis(35));
        assert_eq!(seq.state(), PlaybackState::Reversing);
        seq.tick(SEC_1);
        assert_eq!(seq.state(), PlaybackState::Idle);
        assert_eq!(
            seq.drain_events(),
            vec![SequenceEvent::ReverseComplete { continuation: Some(7) }]
        );
        assert!(!seq.has_reverse_continuation());

        seq.reverse();
        seq.tick(MS_10);
        assert_eq!(
            seq.drain_events(),
            vec![SequenceEvent::ReverseComplete { continuation: None }]
        );
    }

    #[test]
    fn registering_replaces_previous_continuation() {
        let mut seq: Sequence<&str> = reveal();
        seq.play();
        seq.tick(SEC_1);
        assert_eq!(seq.on_reverse_complete("first"), None);
        assert_eq!(seq.on_reverse_complete("second"), Some("first"));
        seq.reverse();
        seq.tick(SEC_1);
        let events = seq.drain_events();
        assert!(events.contains(&SequenceEvent::ReverseComplete {
            continuation: Some("second")
        }));
        assert!(!events.contains(&SequenceEvent::ReverseComplete {
            continuation: Some("first")
        }));
    }

    #[test]
    fn play_takes_over_reversal() {
        let mut seq: Sequence<u8> = reveal();
        seq.play();
        seq.tick(SEC_1);
        seq.on_reverse_complete(1);
        seq.reverse();
        seq.tick(MS_20);
        seq.play();
        assert_eq!(seq.state(), PlaybackState::Playing);
        assert!(!seq.has_reverse_continuation());
        seq.tick(SEC_1);
        let events = seq.drain_events();
        assert!(
            events
                .iter()
                .all(|e| !matches!(e, SequenceEvent::ReverseComplete { .. }))
        );
    }

    #[test]
    fn pause_at_pins_without_events() {
        let mut seq: Sequence<u8> = reveal();
        seq.play();
        seq.tick(MS_20);
        let _ = seq.drain_events();
        seq.on_reverse_complete(3);
        seq.pause_at(Duration::ZERO);
        assert_eq!(seq.state(), PlaybackState::Paused);
        seq.tick(SEC_1);
        assert!(seq.drain_events().is_empty());
        assert!(seq.sample().is_rest(1e-6));
    }

    #[test]
    fn rate_scales_speed() {
        let mut seq: Sequence = reveal();
        seq.play();
        seq.tick(SEC_1);
        seq.set_rate(2.0);
        seq.reverse();
        seq.tick(Duration::from_millis(30));
        assert!(!seq.is_at_start());
        seq.tick(Duration::from_millis(10));
        assert!(seq.is_at_start());
        assert_eq!(seq.direction(), Direction::Backward);
    }

    #[test]
    fn invalid_rate_ignored() {
        let mut seq: Sequence = reveal();
        seq.set_rate(f64::NAN);
        seq.set_rate(0.0);
        assert!((seq.rate() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sample_reaches_full_deltas_and_returns_to_rest() {
        let mut seq: Sequence = reveal();
        seq.play();
        seq.tick(SEC_1);
        let frame = seq.sample();
        for target in slices() {
            let id = TargetId::from(target);
            assert!((frame.get(&id, Property::Opacity) - 1.0).abs() < 1e-6);
            assert!((frame.get(&id, Property::X) - 10.0).abs() < 1e-6);
        }
        seq.reverse();
        seq.tick(SEC_1);
        assert!(seq.sample().is_rest(1e-6));
    }

    #[test]
    fn sequential_segment_staggers_in_list_order() {
        let mut seq: Sequence = reveal();
        seq.play();
        seq.tick(MS_10);
        let frame = seq.sample();
        let top = frame.get(&"top".into(), Property::Opacity);
        let middle = frame.get(&"middle".into(), Property::Opacity);
        let bottom = frame.get(&"bottom".into(), Property::Opacity);
        assert!((top - 1.0).abs() < 1e-6);
        assert!(middle.abs() < 1e-6);
        assert!(bottom.abs() < 1e-6);
    }

    #[test]
    fn reverse_at_start_completes_next_tick() {
        let mut seq: Sequence<u8> = reveal();
        seq.on_reverse_complete(9);
        seq.reverse();
        assert_eq!(seq.state(), PlaybackState::Reversing);
        seq.tick(Duration::ZERO);
        assert_eq!(
            seq.drain_events(),
            vec![SequenceEvent::ReverseComplete { continuation: Some(9) }]
        );
    }
}
