#![forbid(unsafe_code)]

//! Stagger: spreading one segment's start time across several targets.
//!
//! A segment that animates `n` targets starts target `k` at an offset inside
//! the segment's stagger spread. [`stagger_offsets`] produces the offset
//! *positions*; [`Stagger::offsets`] assigns those positions to targets, in
//! list order ([`StaggerOrder::Sequential`]) or shuffled
//! ([`StaggerOrder::Random`]).
//!
//! # Invariants
//!
//! 1. `stagger_offsets(0, ..)` returns an empty vec.
//! 2. The first position is always `Duration::ZERO`.
//! 3. With two or more targets the last position is exactly `spread`.
//! 4. Positions are monotonically non-decreasing.
//! 5. Random order permutes positions; the multiset of offsets, and hence the
//!    segment's total span, is identical to sequential order.
//!
//! # Failure Modes
//!
//! - Zero count: returns empty vec.
//! - Count of 1: returns `[Duration::ZERO]`, so the spread does not apply.
//! - Zero spread: all offsets are `Duration::ZERO`.

use std::time::Duration;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::Ease;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How offset positions are distributed across the spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaggerMode {
    /// Equal spacing.
    #[default]
    Linear,
    /// Slow start, accelerating gaps.
    EaseIn,
    /// Fast start, decelerating gaps.
    EaseOut,
    /// Slow start and end, faster middle.
    EaseInOut,
}

/// Which target receives which offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaggerOrder {
    /// Targets start in list order.
    #[default]
    Sequential,
    /// Targets start in an order shuffled once per pass.
    Random,
}

/// Stagger policy of a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stagger {
    /// Time between the first and the last target starting.
    pub spread: Duration,
    /// Target-to-offset assignment.
    pub order: StaggerOrder,
    /// Distribution of offsets inside the spread.
    pub mode: StaggerMode,
}

impl Default for Stagger {
    fn default() -> Self {
        Self::none()
    }
}

impl Stagger {
    /// All targets start together.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            spread: Duration::ZERO,
            order: StaggerOrder::Sequential,
            mode: StaggerMode::Linear,
        }
    }

    /// Targets start in list order across `spread`.
    #[must_use]
    pub const fn sequential(spread: Duration) -> Self {
        Self {
            spread,
            order: StaggerOrder::Sequential,
            mode: StaggerMode::Linear,
        }
    }

    /// Targets start in shuffled order across `spread`.
    #[must_use]
    pub const fn random(spread: Duration) -> Self {
        Self {
            spread,
            order: StaggerOrder::Random,
            mode: StaggerMode::Linear,
        }
    }

    /// Override the offset distribution (builder).
    #[must_use]
    pub const fn with_mode(mut self, mode: StaggerMode) -> Self {
        self.mode = mode;
        self
    }

    /// Spread that actually applies to `count` targets.
    ///
    /// A single target has nothing to spread across.
    #[must_use]
    pub fn effective_spread(&self, count: usize) -> Duration {
        if count > 1 { self.spread } else { Duration::ZERO }
    }

    /// Start offset of each target, indexed like the target list.
    ///
    /// Sequential order never touches `rng`.
    pub fn offsets<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<Duration> {
        let mut offsets = stagger_offsets(count, self.spread, self.mode);
        if self.order == StaggerOrder::Random {
            offsets.shuffle(rng);
        }
        offsets
    }
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Compute offset positions for `count` targets across `spread`.
#[must_use]
pub fn stagger_offsets(count: usize, spread: Duration, mode: StaggerMode) -> Vec<Duration> {
    if count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![Duration::ZERO];
    }

    let last = (count - 1) as u128;
    let ease = match mode {
        // Integer arithmetic keeps the last offset exactly equal to `spread`.
        StaggerMode::Linear => {
            let total = spread.as_nanos();
            return (0..count)
                .map(|i| nanos(total * i as u128 / last))
                .collect();
        }
        StaggerMode::EaseIn => Ease::EaseIn,
        StaggerMode::EaseOut => Ease::EaseOut,
        StaggerMode::EaseInOut => Ease::EaseInOut,
    };

    (0..count)
        .map(|i| {
            if i as u128 == last {
                return spread;
            }
            spread.mul_f64(f64::from(ease.apply(i as f32 / last as f32)))
        })
        .collect()
}

fn nanos(n: u128) -> Duration {
    Duration::from_nanos(u64::try_from(n).unwrap_or(u64::MAX))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
