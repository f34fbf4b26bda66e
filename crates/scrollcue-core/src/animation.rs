#![forbid(unsafe_code)]

//! Easing curves and the small tweens used by presenters.
//!
//! [`Ease`] is the curve catalogue shared by segments, stagger distribution
//! and presenters. [`Fade`] and [`Tween`] implement [`Animation`]; [`Chain`]
//! and [`Delayed`] compose them, forwarding overshoot so a large `dt` is
//! never lost at a phase boundary.
//!
//! ```ignore
//! use std::time::Duration;
//! use scrollcue_core::animation::{chain, delay, Animation, Fade};
//!
//! let quarter = Duration::from_millis(250);
//! let mut swap = chain(Fade::new(quarter), delay(quarter, Fade::new(quarter)));
//! swap.tick(Duration::from_millis(16));
//! ```

pub mod stagger;

use std::f32::consts::FRAC_PI_2;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Easing
// ---------------------------------------------------------------------------

/// Named easing curve mapping progress in [0, 1] onto [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    /// Constant velocity. Also accepted as `"none"`.
    #[default]
    #[serde(alias = "none")]
    Linear,
    /// Quadratic, slow start.
    EaseIn,
    /// Quadratic, slow end.
    EaseOut,
    EaseInOut,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    SineIn,
    SineOut,
}

impl Ease {
    /// Every curve, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Linear,
        Self::EaseIn,
        Self::EaseOut,
        Self::EaseInOut,
        Self::EaseInCubic,
        Self::EaseOutCubic,
        Self::EaseInOutCubic,
        Self::SineIn,
        Self::SineOut,
    ];

    /// Map `t` through the curve. Input outside [0, 1] is clamped; NaN reads
    /// as 0.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let u = 1.0 - t;
        let eased = match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - u * u,
            Self::EaseInOut if t < 0.5 => 2.0 * t * t,
            Self::EaseInOut => 1.0 - 2.0 * u * u,
            Self::EaseInCubic => t * t * t,
            Self::EaseOutCubic => 1.0 - u * u * u,
            Self::EaseInOutCubic if t < 0.5 => 4.0 * t * t * t,
            Self::EaseInOutCubic => 1.0 - 4.0 * u * u * u,
            Self::SineIn => 1.0 - (t * FRAC_PI_2).cos(),
            Self::SineOut => (t * FRAC_PI_2).sin(),
        };
        eased.clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Animation trait
// ---------------------------------------------------------------------------

/// A time-driven animation with output in [0, 1].
pub trait Animation {
    /// Advance by `dt`.
    fn tick(&mut self, dt: Duration);

    fn is_complete(&self) -> bool;

    /// Current eased output.
    fn value(&self) -> f32;

    /// Rewind to the beginning.
    fn reset(&mut self);

    /// Time ticked past completion. Composites hand it to the next phase.
    fn overshoot(&self) -> Duration {
        Duration::ZERO
    }
}

/// Elapsed time against a fixed length.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Clock {
    elapsed: Duration,
    length: Duration,
}

impl Clock {
    fn new(length: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            // A zero-length clock completes on its first tick.
            length: length.max(Duration::from_nanos(1)),
        }
    }

    fn advance(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    fn done(&self) -> bool {
        self.elapsed >= self.length
    }

    fn fraction(&self) -> f32 {
        (self.elapsed.as_secs_f64() / self.length.as_secs_f64()).min(1.0) as f32
    }

    fn excess(&self) -> Duration {
        self.elapsed.saturating_sub(self.length)
    }

    fn rewind(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    fn finish(&mut self) {
        self.elapsed = self.length;
    }
}

// ---------------------------------------------------------------------------
// Fade
// ---------------------------------------------------------------------------

/// Eased progress from 0 to 1 over a duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    clock: Clock,
    ease: Ease,
}

impl Fade {
    /// Linear fade lasting `duration`.
    pub fn new(duration: Duration) -> Self {
        Self {
            clock: Clock::new(duration),
            ease: Ease::Linear,
        }
    }

    /// Use `ease` instead of linear (builder).
    #[must_use]
    pub fn easing(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    /// Progress before easing.
    pub fn raw_progress(&self) -> f32 {
        self.clock.fraction()
    }
}

impl Animation for Fade {
    fn tick(&mut self, dt: Duration) {
        self.clock.advance(dt);
    }

    fn is_complete(&self) -> bool {
        self.clock.done()
    }

    fn value(&self) -> f32 {
        self.ease.apply(self.clock.fraction())
    }

    fn reset(&mut self) {
        self.clock.rewind();
    }

    fn overshoot(&self) -> Duration {
        self.clock.excess()
    }
}

// ---------------------------------------------------------------------------
// Tween
// ---------------------------------------------------------------------------

/// An `f32` quantity moving between two values.
///
/// [`Animation::value`] is eased progress; [`Tween::current`] is the quantity
/// itself (a bar width in percent, say).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    from: f32,
    to: f32,
    clock: Clock,
    ease: Ease,
}

impl Tween {
    /// Move from `from` to `to` over `duration`.
    pub fn new(from: f32, to: f32, duration: Duration) -> Self {
        Self {
            from,
            to,
            clock: Clock::new(duration),
            ease: Ease::Linear,
        }
    }

    /// Parked at `value`; later retargets take `duration`.
    pub fn resting(value: f32, duration: Duration) -> Self {
        let mut tween = Self::new(value, value, duration);
        tween.clock.finish();
        tween
    }

    /// Use `ease` instead of linear (builder).
    #[must_use]
    pub fn easing(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    pub fn current(&self) -> f32 {
        self.from + (self.to - self.from) * self.ease.apply(self.clock.fraction())
    }

    /// Head for `to`, starting from the current value.
    pub fn retarget(&mut self, to: f32) {
        self.from = self.current();
        self.to = to;
        self.clock.rewind();
    }
}

impl Animation for Tween {
    fn tick(&mut self, dt: Duration) {
        self.clock.advance(dt);
    }

    fn is_complete(&self) -> bool {
        self.clock.done()
    }

    fn value(&self) -> f32 {
        self.ease.apply(self.clock.fraction())
    }

    fn reset(&mut self) {
        self.clock.rewind();
    }

    fn overshoot(&self) -> Duration {
        self.clock.excess()
    }
}

// ---------------------------------------------------------------------------
// Composites
// ---------------------------------------------------------------------------

/// `A`, then `B`. The value follows whichever phase is running.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chain<A, B> {
    head: A,
    tail: B,
    in_tail: bool,
}

impl<A: Animation, B: Animation> Chain<A, B> {
    pub fn new(head: A, tail: B) -> Self {
        Self {
            head,
            tail,
            in_tail: false,
        }
    }

    /// Whether the first phase has finished.
    pub fn in_second(&self) -> bool {
        self.in_tail
    }

    /// The second phase.
    pub fn second(&self) -> &B {
        &self.tail
    }
}

impl<A: Animation, B: Animation> Animation for Chain<A, B> {
    fn tick(&mut self, dt: Duration) {
        if self.in_tail {
            self.tail.tick(dt);
            return;
        }
        self.head.tick(dt);
        if self.head.is_complete() {
            self.in_tail = true;
            let carry = self.head.overshoot();
            if !carry.is_zero() {
                self.tail.tick(carry);
            }
        }
    }

    fn is_complete(&self) -> bool {
        self.in_tail && self.tail.is_complete()
    }

    fn value(&self) -> f32 {
        if self.in_tail {
            self.tail.value()
        } else {
            self.head.value()
        }
    }

    fn reset(&mut self) {
        self.head.reset();
        self.tail.reset();
        self.in_tail = false;
    }

    fn overshoot(&self) -> Duration {
        if self.in_tail {
            self.tail.overshoot()
        } else {
            Duration::ZERO
        }
    }
}

/// `A` after a pause. Reads 0 until the pause is over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Delayed<A> {
    pause: Duration,
    waited: Duration,
    inner: A,
}

impl<A: Animation> Delayed<A> {
    pub fn new(pause: Duration, inner: A) -> Self {
        Self {
            pause,
            waited: Duration::ZERO,
            inner,
        }
    }

    /// Whether the pause is over.
    pub fn has_started(&self) -> bool {
        self.waited >= self.pause
    }
}

impl<A: Animation> Animation for Delayed<A> {
    fn tick(&mut self, dt: Duration) {
        if self.has_started() {
            self.inner.tick(dt);
            return;
        }
        self.waited = self.waited.saturating_add(dt);
        let carry = self.waited.saturating_sub(self.pause);
        if !carry.is_zero() {
            self.waited = self.pause;
            self.inner.tick(carry);
        }
    }

    fn is_complete(&self) -> bool {
        self.has_started() && self.inner.is_complete()
    }

    fn value(&self) -> f32 {
        if self.has_started() {
            self.inner.value()
        } else {
            0.0
        }
    }

    fn reset(&mut self) {
        self.waited = Duration::ZERO;
        self.inner.reset();
    }

    fn overshoot(&self) -> Duration {
        if self.has_started() {
            self.inner.overshoot()
        } else {
            Duration::ZERO
        }
    }
}

/// Shorthand for [`Chain::new`].
pub fn chain<A: Animation, B: Animation>(head: A, tail: B) -> Chain<A, B> {
    Chain::new(head, tail)
}

/// Shorthand for [`Delayed::new`].
pub fn delay<A: Animation>(pause: Duration, inner: A) -> Delayed<A> {
    Delayed::new(pause, inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS_100: Duration = Duration::from_millis(100);
    const MS_250: Duration = Duration::from_millis(250);
    const SEC_1: Duration = Duration::from_secs(1);

    #[test]
    fn every_curve_pins_its_endpoints() {
        for ease in Ease::ALL {
            assert!(ease.apply(0.0).abs() < 1e-6, "{ease:?} at 0");
            assert!((ease.apply(1.0) - 1.0).abs() < 1e-6, "{ease:?} at 1");
            assert!(ease.apply(f32::NAN).abs() < 1e-6, "{ease:?} at NaN");
        }
    }

    #[test]
    fn curves_are_monotonic() {
        for ease in Ease::ALL {
            let mut last = 0.0;
            for step in 0..=50 {
                let v = ease.apply(step as f32 / 50.0);
                assert!(v + 1e-6 >= last, "{ease:?} dips at step {step}");
                last = v;
            }
        }
    }

    #[test]
    fn in_out_curves_cross_the_middle() {
        assert!((Ease::EaseInOut.apply(0.5) - 0.5).abs() < 1e-6);
        assert!((Ease::EaseInOutCubic.apply(0.5) - 0.5).abs() < 1e-6);
        assert!(Ease::SineIn.apply(0.5) < 0.5);
        assert!(Ease::SineOut.apply(0.5) > 0.5);
    }

    #[test]
    fn none_is_linear() {
        let ease: Ease = serde_json::from_str("\"none\"").expect("alias");
        assert_eq!(ease, Ease::Linear);
        let ease: Ease = serde_json::from_str("\"sine_in\"").expect("name");
        assert_eq!(ease, Ease::SineIn);
    }

    #[test]
    fn zero_length_fade_completes_on_first_tick() {
        let mut fade = Fade::new(Duration::ZERO);
        assert!(!fade.is_complete());
        fade.tick(Duration::from_millis(16));
        assert!(fade.is_complete());
        assert!((fade.value() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn fade_eases_its_output_not_its_progress() {
        let mut fade = Fade::new(SEC_1).easing(Ease::EaseIn);
        fade.tick(Duration::from_millis(500));
        assert!((fade.raw_progress() - 0.5).abs() < 1e-6);
        assert!((fade.value() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn retarget_midway_starts_from_current() {
        let mut bar = Tween::new(0.0, 100.0, SEC_1);
        bar.tick(Duration::from_millis(500));
        bar.retarget(20.0);
        assert!((bar.current() - 50.0).abs() < 1e-3);
        bar.tick(SEC_1);
        assert!((bar.current() - 20.0).abs() < 1e-6);
    }

    #[test]
    fn resting_tween_keeps_its_duration() {
        let mut bar = Tween::resting(10.0, SEC_1);
        assert!(bar.is_complete());
        assert!((bar.current() - 10.0).abs() < f32::EPSILON);
        bar.retarget(30.0);
        bar.tick(Duration::from_millis(500));
        assert!((bar.current() - 20.0).abs() < 1e-3);
    }

    #[test]
    fn chain_carries_overshoot_into_second_phase() {
        let mut c = chain(Fade::new(MS_100), Fade::new(MS_100));
        c.tick(Duration::from_millis(150));
        assert!(c.in_second());
        assert!((c.value() - 0.5).abs() < 1e-3);
        c.tick(MS_100);
        assert!(c.is_complete());
        assert_eq!(c.overshoot(), Duration::from_millis(50));
    }

    #[test]
    fn erase_pause_write() {
        let mut swap = chain(Fade::new(MS_250), delay(MS_250, Fade::new(MS_250)));
        swap.tick(Duration::from_millis(300));
        assert!(swap.in_second());
        assert!(!swap.second().has_started());
        assert!(swap.value().abs() < f32::EPSILON);
        swap.tick(Duration::from_millis(300));
        assert!(swap.second().has_started());
        assert!((swap.value() - 0.4).abs() < 1e-3);
        swap.tick(SEC_1);
        assert!(swap.is_complete());
        swap.reset();
        assert!(!swap.in_second());
        assert!(!swap.second().has_started());
    }
}
