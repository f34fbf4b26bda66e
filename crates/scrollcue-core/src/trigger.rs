#![forbid(unsafe_code)]

//! Region trigger engine: maps scroll positions to lifecycle events.
//!
//! Each registered [`Region`] covers an inclusive range of scroll offsets,
//! resolved once from its [`Boundary`] pair, trigger geometry and the viewport
//! height. [`RegionTriggerEngine::update`] compares the previous and current
//! scroll positions and returns the [`TriggerEvent`]s fired by the move, in
//! registration order. Handlers are plain action values of type `A`; the
//! engine clones the matching one into each event and never calls back into
//! the owner.
//!
//! # State machine
//!
//! ```text
//!   Armed ──enter──▶ Active ──leave──▶ Armed
//!     │
//!     └──forward-enter (once)──▶ Disarmed
//! ```
//!
//! # Invariants
//!
//! 1. At most one event per region per `update`.
//! 2. A region jumped over in a single update enters; it does not leave.
//! 3. Entering a grouped region first returns every other active member of
//!    the group to `Armed` without firing their leave handlers.
//! 4. A `Disarmed` region never fires again.
//! 5. A missing handler suppresses the event, not the state change.
//!
//! # Failure Modes
//!
//! - Non-finite scroll positions and zero-delta moves fire nothing.
//! - Malformed regions are rejected by `register_region` and leave the
//!   engine untouched.

pub mod boundary;

use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::error::{self, ConfigurationError};
pub use boundary::{Boundary, Edge, TriggerGeometry};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Handle returned by [`RegionTriggerEngine::register_region`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionId(usize);

impl RegionId {
    /// Registration index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Which boundary was crossed, and in which direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Scrolling down past the start boundary.
    ForwardEnter,
    /// Scrolling up past the end boundary.
    BackwardEnter,
    /// Scrolling down past the end boundary.
    ForwardLeave,
    /// Scrolling up past the start boundary.
    BackwardLeave,
}

impl Lifecycle {
    /// Whether this is one of the two enter events.
    #[must_use]
    pub const fn is_enter(self) -> bool {
        matches!(self, Self::ForwardEnter | Self::BackwardEnter)
    }
}

/// Per-region trigger state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionState {
    /// Waiting for an enter.
    Armed,
    /// Entered and not yet left.
    Active,
    /// A `once` region that has fired; terminal.
    Disarmed,
}

/// Where a position lies relative to a region's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Before,
    Within,
    After,
}

/// A scroll region and its firing policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Name of the surface whose geometry anchors the region.
    pub trigger: Option<String>,
    /// Layout of that surface.
    pub geometry: TriggerGeometry,
    /// Start boundary.
    pub start: Boundary,
    /// End boundary; `None` means [`Boundary::DEFAULT_END`].
    pub end: Option<Boundary>,
    /// Whether leave events are expected to reverse what enter played.
    pub reversible: bool,
    /// Fire forward-enter once, then disarm.
    pub once: bool,
    /// Mutual-exclusion group.
    pub group: Option<String>,
    /// Delay carried on enter events.
    pub delay: Duration,
    /// Playback rate carried on leave events.
    pub rate_on_leave: f64,
}

impl Region {
    /// A region on `trigger` with the default boundaries.
    pub fn new(trigger: impl Into<String>, geometry: TriggerGeometry) -> Self {
        Self {
            trigger: Some(trigger.into()),
            geometry,
            start: Boundary::DEFAULT_START,
            end: None,
            reversible: true,
            once: false,
            group: None,
            delay: Duration::ZERO,
            rate_on_leave: 1.0,
        }
    }

    /// Set the start boundary (builder).
    #[must_use]
    pub fn start(mut self, start: Boundary) -> Self {
        self.start = start;
        self
    }

    /// Set the end boundary (builder).
    #[must_use]
    pub fn end(mut self, end: Boundary) -> Self {
        self.end = Some(end);
        self
    }

    /// Fire forward-enter only once (builder).
    #[must_use]
    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    /// Join a mutual-exclusion group (builder).
    #[must_use]
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Set the enter delay (builder).
    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the leave playback rate (builder).
    #[must_use]
    pub fn rate_on_leave(mut self, rate: f64) -> Self {
        self.rate_on_leave = rate;
        self
    }

    /// Mark whether leave events reverse the entered effect (builder).
    #[must_use]
    pub fn reversible(mut self, reversible: bool) -> Self {
        self.reversible = reversible;
        self
    }

    fn resolve(&self, viewport_height: f64) -> Result<(f64, f64), ConfigurationError> {
        let start = self.start.resolve(self.geometry, viewport_height);
        let end = self
            .end
            .unwrap_or(Boundary::DEFAULT_END)
            .resolve(self.geometry, viewport_height);
        if end < start {
            return Err(ConfigurationError::InvertedRange {
                trigger: self.trigger.clone().unwrap_or_default(),
                start,
                end,
            });
        }
        Ok((start, end))
    }
}

/// Actions bound to a region's four lifecycle events.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionHandlers<A> {
    pub forward_enter: Option<A>,
    pub backward_enter: Option<A>,
    pub forward_leave: Option<A>,
    pub backward_leave: Option<A>,
}

impl<A> Default for RegionHandlers<A> {
    fn default() -> Self {
        Self {
            forward_enter: None,
            backward_enter: None,
            forward_leave: None,
            backward_leave: None,
        }
    }
}

impl<A> RegionHandlers<A> {
    /// No handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `action` to `lifecycle` (builder).
    #[must_use]
    pub fn on(mut self, lifecycle: Lifecycle, action: A) -> Self {
        *self.slot_mut(lifecycle) = Some(action);
        self
    }

    /// Action bound to `lifecycle`, if any.
    #[must_use]
    pub fn get(&self, lifecycle: Lifecycle) -> Option<&A> {
        match lifecycle {
            Lifecycle::ForwardEnter => self.forward_enter.as_ref(),
            Lifecycle::BackwardEnter => self.backward_enter.as_ref(),
            Lifecycle::ForwardLeave => self.forward_leave.as_ref(),
            Lifecycle::BackwardLeave => self.backward_leave.as_ref(),
        }
    }

    fn slot_mut(&mut self, lifecycle: Lifecycle) -> &mut Option<A> {
        match lifecycle {
            Lifecycle::ForwardEnter => &mut self.forward_enter,
            Lifecycle::BackwardEnter => &mut self.backward_enter,
            Lifecycle::ForwardLeave => &mut self.forward_leave,
            Lifecycle::BackwardLeave => &mut self.backward_leave,
        }
    }
}

/// Playback hints attached to a fired event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Schedule {
    /// Delay before the bound effect should start.
    pub delay: Duration,
    /// Playback rate for the bound effect.
    pub rate: f64,
    /// Whether the region reverses its effect on leave.
    pub reversible: bool,
}

/// A handler fired by [`RegionTriggerEngine::update`].
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerEvent<A> {
    pub region: RegionId,
    pub lifecycle: Lifecycle,
    pub action: A,
    pub schedule: Schedule,
}

struct Entry<A> {
    region: Region,
    handlers: RegionHandlers<A>,
    start: f64,
    end: f64,
    state: RegionState,
}

impl<A> Entry<A> {
    fn side(&self, position: f64) -> Side {
        if position < self.start {
            Side::Before
        } else if position > self.end {
            Side::After
        } else {
            Side::Within
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Evaluates registered regions against the scroll position.
pub struct RegionTriggerEngine<A> {
    viewport_height: f64,
    position: f64,
    entries: Vec<Entry<A>>,
}

impl<A> std::fmt::Debug for RegionTriggerEngine<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionTriggerEngine")
            .field("viewport_height", &self.viewport_height)
            .field("position", &self.position)
            .field("regions", &self.entries.len())
            .finish()
    }
}

impl<A: Clone> RegionTriggerEngine<A> {
    /// Create an engine for a viewport of `viewport_height` scroll units,
    /// positioned at the top of the document.
    pub fn new(viewport_height: f64) -> Result<Self, ConfigurationError> {
        validate_viewport(viewport_height)?;
        Ok(Self {
            viewport_height,
            position: 0.0,
            entries: Vec::new(),
        })
    }

    /// Validate `region` and bind `handlers` to it.
    pub fn register_region(
        &mut self,
        region: Region,
        handlers: RegionHandlers<A>,
    ) -> Result<RegionId, ConfigurationError> {
        let id = RegionId(self.entries.len());
        match region.trigger.as_deref() {
            Some(name) if !name.trim().is_empty() => {}
            _ => return Err(ConfigurationError::MissingTrigger { region: id.0 }),
        }
        region.geometry.validate()?;
        let context = format!("region {:?}", region.trigger.as_deref().unwrap_or_default());
        error::rate(context, region.rate_on_leave)?;
        let (start, end) = region.resolve(self.viewport_height)?;

        debug!(
            region = id.0,
            trigger = region.trigger.as_deref().unwrap_or_default(),
            start,
            end,
            once = region.once,
            group = region.group.as_deref().unwrap_or(""),
            "region registered"
        );
        self.entries.push(Entry {
            region,
            handlers,
            start,
            end,
            state: RegionState::Armed,
        });
        Ok(id)
    }

    /// Evaluate every region against a new scroll position.
    pub fn update(&mut self, position: f64) -> Vec<TriggerEvent<A>> {
        if !position.is_finite() {
            warn!(position, "ignoring non-finite scroll position");
            return Vec::new();
        }
        let previous = self.position;
        if position == previous {
            return Vec::new();
        }
        self.position = position;
        let forward = position > previous;

        let mut events = Vec::new();
        for index in 0..self.entries.len() {
            let entry = &self.entries[index];
            let before = entry.side(previous);
            let after = entry.side(position);
            let lifecycle = match entry.state {
                RegionState::Disarmed => continue,
                RegionState::Armed => {
                    let entered = after == Side::Within && before != Side::Within;
                    let jumped = after != Side::Within && before != after && before != Side::Within;
                    if !(entered || jumped) {
                        continue;
                    }
                    if forward {
                        Lifecycle::ForwardEnter
                    } else {
                        Lifecycle::BackwardEnter
                    }
                }
                RegionState::Active => match after {
                    Side::Within => continue,
                    Side::After => Lifecycle::ForwardLeave,
                    Side::Before => Lifecycle::BackwardLeave,
                },
            };
            self.fire(index, lifecycle, &mut events);
        }
        events
    }

    /// Fire forward-enter for every armed region the current position has
    /// reached, as if the page had been scrolled down from the top.
    ///
    /// Regions already scrolled past also fire their forward leave.
    pub fn refresh(&mut self) -> Vec<TriggerEvent<A>> {
        let mut events = Vec::new();
        for index in 0..self.entries.len() {
            let entry = &self.entries[index];
            if entry.state != RegionState::Armed {
                continue;
            }
            let side = entry.side(self.position);
            if side == Side::Before {
                continue;
            }
            self.fire(index, Lifecycle::ForwardEnter, &mut events);
            if side == Side::After && self.entries[index].state == RegionState::Active {
                self.fire(index, Lifecycle::ForwardLeave, &mut events);
            }
        }
        debug!(position = self.position, fired = events.len(), "regions refreshed");
        events
    }

    /// Move to `position` without firing anything.
    pub fn set_position(&mut self, position: f64) {
        if position.is_finite() {
            self.position = position;
        } else {
            warn!(position, "ignoring non-finite scroll position");
        }
    }

    /// Re-resolve every region for a new viewport height.
    ///
    /// On failure the previous layout is kept.
    pub fn relayout(&mut self, viewport_height: f64) -> Result<(), ConfigurationError> {
        validate_viewport(viewport_height)?;
        let ranges = self
            .entries
            .iter()
            .map(|e| e.region.resolve(viewport_height))
            .collect::<Result<Vec<_>, _>>()?;
        for (entry, (start, end)) in self.entries.iter_mut().zip(ranges) {
            entry.start = start;
            entry.end = end;
        }
        self.viewport_height = viewport_height;
        Ok(())
    }

    fn fire(&mut self, index: usize, lifecycle: Lifecycle, events: &mut Vec<TriggerEvent<A>>) {
        if lifecycle.is_enter() {
            self.deactivate_group(index);
        }
        let entry = &mut self.entries[index];
        entry.state = match lifecycle {
            Lifecycle::ForwardEnter if entry.region.once => RegionState::Disarmed,
            Lifecycle::ForwardEnter | Lifecycle::BackwardEnter => RegionState::Active,
            Lifecycle::ForwardLeave | Lifecycle::BackwardLeave => RegionState::Armed,
        };
        let schedule = if lifecycle.is_enter() {
            Schedule {
                delay: entry.region.delay,
                rate: 1.0,
                reversible: entry.region.reversible,
            }
        } else {
            Schedule {
                delay: Duration::ZERO,
                rate: entry.region.rate_on_leave,
                reversible: entry.region.reversible,
            }
        };
        let Some(action) = entry.handlers.get(lifecycle) else {
            trace!(region = index, ?lifecycle, state = ?entry.state, "no handler bound");
            return;
        };
        debug!(region = index, ?lifecycle, state = ?entry.state, "region fired");
        events.push(TriggerEvent {
            region: RegionId(index),
            lifecycle,
            action: action.clone(),
            schedule,
        });
    }

    fn deactivate_group(&mut self, index: usize) {
        let Some(group) = self.entries[index].region.group.clone() else {
            return;
        };
        for (other, entry) in self.entries.iter_mut().enumerate() {
            if other != index
                && entry.state == RegionState::Active
                && entry.region.group.as_deref() == Some(group.as_str())
            {
                entry.state = RegionState::Armed;
                debug!(region = other, group = %group, "region deactivated by group");
            }
        }
    }
}

impl<A> RegionTriggerEngine<A> {
    /// Last evaluated scroll position.
    #[must_use]
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Current viewport height.
    #[must_use]
    pub fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    /// Number of registered regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no region is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// State of region `id`.
    #[must_use]
    pub fn state(&self, id: RegionId) -> Option<RegionState> {
        self.entries.get(id.0).map(|e| e.state)
    }

    /// Definition of region `id`.
    #[must_use]
    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.entries.get(id.0).map(|e| &e.region)
    }

    /// Resolved inclusive `(start, end)` offsets of region `id`.
    #[must_use]
    pub fn range(&self, id: RegionId) -> Option<(f64, f64)> {
        self.entries.get(id.0).map(|e| (e.start, e.end))
    }
}

fn validate_viewport(height: f64) -> Result<(), ConfigurationError> {
    if !height.is_finite() || height <= 0.0 {
        return Err(ConfigurationError::InvalidGeometry {
            field: "viewport height",
            value: height,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
