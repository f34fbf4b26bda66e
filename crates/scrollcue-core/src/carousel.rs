#![forbid(unsafe_code)]

//! Carousel controller: one visible item at a time, crossfaded by reversing
//! the outgoing item's sequence before the incoming one plays.
//!
//! Items may be partitioned into named groups; navigation cycles inside the
//! active group. A transition registers a [`Handoff`] as the outgoing
//! sequence's reverse continuation. Each handoff carries the carousel's
//! transition generation, and [`Carousel::tick`] only honours a handoff whose
//! generation is current and whose target is still the current item, so a
//! superseded transition can never start its item.
//!
//! # Invariants
//!
//! 1. `go_to` on the current item is [`Transition::NoOp`].
//! 2. Only the most recently requested item ever plays forward.
//! 3. Presentation events are queued by `go_to` itself, before any reversal
//!    finishes.
//! 4. An outgoing item always hands off through its reversal, even when it
//!    already sits at offset 0. Only an item without segments, whose reversal
//!    can never complete, hands off directly.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::error::ConfigurationError;
use crate::sequence::{Sequence, SequenceEvent};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Reverse continuation registered on an outgoing item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handoff {
    /// Item to play once the reversal completes.
    pub to: usize,
    /// Transition generation that registered it.
    pub generation: u64,
}

/// One slide of a carousel.
#[derive(Debug)]
pub struct CarouselItem {
    pub name: String,
    /// Group this item cycles in; `None` joins the unnamed group.
    pub group: Option<String>,
    /// Named values shown while the item is current (stat bars).
    pub attributes: BTreeMap<String, f32>,
    pub sequence: Sequence<Handoff>,
}

impl CarouselItem {
    /// An ungrouped item without attributes.
    pub fn new(name: impl Into<String>, sequence: Sequence<Handoff>) -> Self {
        Self {
            name: name.into(),
            group: None,
            attributes: BTreeMap::new(),
            sequence,
        }
    }

    /// Put the item in `group` (builder).
    #[must_use]
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Add an attribute (builder).
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: f32) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }
}

/// Relative navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Next,
    Prev,
}

/// Outcome of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The requested item was already current.
    NoOp,
    /// The current item changed.
    Crossfade {
        /// Item index that was current before, if any.
        from: Option<usize>,
        /// Item index that is current now.
        to: usize,
    },
}

/// Notification for presenters.
#[derive(Debug, Clone, PartialEq)]
pub enum CarouselEvent {
    /// A new item became current.
    Transitioned {
        /// Position of the item inside the active group.
        index: usize,
        name: String,
        attributes: BTreeMap<String, f32>,
    },
}

struct ItemGroup {
    name: Option<String>,
    members: Vec<usize>,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Crossfading carousel over a fixed set of items.
pub struct Carousel {
    name: String,
    items: Vec<CarouselItem>,
    groups: Vec<ItemGroup>,
    active_group: usize,
    current: Option<usize>,
    previous: Option<usize>,
    current_index: usize,
    previous_index: usize,
    generation: u64,
    /// Outgoing item whose reversal still owes a handoff.
    reversing: Option<usize>,
    events: Vec<CarouselEvent>,
}

impl std::fmt::Debug for Carousel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Carousel")
            .field("name", &self.name)
            .field("items", &self.items.len())
            .field("active_group", &self.active_group_name())
            .field("current", &self.current)
            .field("previous", &self.previous)
            .field("generation", &self.generation)
            .field("reversing", &self.reversing)
            .finish()
    }
}

impl Carousel {
    /// Build a carousel; the first group to appear is active.
    ///
    /// Fails when `items` is empty or two items share a name.
    pub fn new(name: impl Into<String>, items: Vec<CarouselItem>) -> Result<Self, ConfigurationError> {
        let name = name.into();
        if items.is_empty() {
            return Err(ConfigurationError::EmptyCarousel { carousel: name });
        }
        let mut groups: Vec<ItemGroup> = Vec::new();
        for (index, item) in items.iter().enumerate() {
            if items[..index].iter().any(|other| other.name == item.name) {
                return Err(ConfigurationError::DuplicateItem {
                    carousel: name,
                    item: item.name.clone(),
                });
            }
            match groups.iter_mut().find(|g| g.name == item.group) {
                Some(group) => group.members.push(index),
                None => groups.push(ItemGroup {
                    name: item.group.clone(),
                    members: vec![index],
                }),
            }
        }
        debug!(carousel = %name, items = items.len(), groups = groups.len(), "carousel built");
        Ok(Self {
            name,
            items,
            groups,
            active_group: 0,
            current: None,
            previous: None,
            current_index: 0,
            previous_index: 0,
            generation: 0,
            reversing: None,
            events: Vec::new(),
        })
    }

    /// Carousel name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All items in declaration order.
    #[must_use]
    pub fn items(&self) -> &[CarouselItem] {
        &self.items
    }

    /// Item by declaration index.
    #[must_use]
    pub fn item(&self, index: usize) -> Option<&CarouselItem> {
        self.items.get(index)
    }

    /// Mutable item by declaration index.
    pub fn item_mut(&mut self, index: usize) -> Option<&mut CarouselItem> {
        self.items.get_mut(index)
    }

    /// Declaration index of the current item.
    #[must_use]
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Declaration index of the item that was current before the last
    /// transition.
    #[must_use]
    pub fn previous(&self) -> Option<usize> {
        self.previous
    }

    /// Current item.
    #[must_use]
    pub fn current_item(&self) -> Option<&CarouselItem> {
        self.current.and_then(|i| self.items.get(i))
    }

    /// Position of the current item inside the active group.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Position of the previous item inside its group.
    #[must_use]
    pub fn previous_index(&self) -> usize {
        self.previous_index
    }

    /// Name of the active group.
    #[must_use]
    pub fn active_group_name(&self) -> Option<&str> {
        self.groups
            .get(self.active_group)
            .and_then(|g| g.name.as_deref())
    }

    /// Number of items in the active group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups
            .get(self.active_group)
            .map_or(0, |g| g.members.len())
    }

    /// Whether the active group is empty; never true for a built carousel.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of every group, in order of first appearance.
    pub fn group_names(&self) -> impl Iterator<Item = Option<&str>> {
        self.groups.iter().map(|g| g.name.as_deref())
    }

    /// Whether an outgoing reversal still owes a handoff.
    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.reversing.is_some()
    }

    /// Move to position `index` of the active group, wrapping cyclically.
    pub fn go_to(&mut self, index: isize) -> Transition {
        let members = &self.groups[self.active_group].members;
        let position = index.rem_euclid(members.len() as isize) as usize;
        let target = members[position];
        if self.current == Some(target) {
            trace!(carousel = %self.name, index = position, "go_to current item ignored");
            return Transition::NoOp;
        }

        let outgoing = self.current;
        self.previous = outgoing;
        self.previous_index = self.current_index;
        self.current = Some(target);
        self.current_index = position;
        self.generation += 1;
        let handoff = Handoff {
            to: target,
            generation: self.generation,
        };

        if let Some(reversing) = self.reversing {
            if reversing == target {
                // Coming back to the item still fading out: resume it.
                let sequence = &mut self.items[target].sequence;
                sequence.clear_reverse_complete();
                sequence.play();
                self.reversing = None;
            } else {
                self.items[reversing].sequence.on_reverse_complete(handoff);
            }
        } else if let Some(out) = outgoing {
            let sequence = &mut self.items[out].sequence;
            if sequence.is_empty() {
                self.items[target].sequence.play();
            } else {
                sequence.on_reverse_complete(handoff);
                sequence.reverse();
                self.reversing = Some(out);
            }
        } else {
            self.items[target].sequence.play();
        }

        let item = &self.items[target];
        debug!(
            carousel = %self.name,
            from = outgoing.map(|i| self.items[i].name.as_str()).unwrap_or(""),
            to = %item.name,
            generation = self.generation,
            "carousel transition"
        );
        self.events.push(CarouselEvent::Transitioned {
            index: position,
            name: item.name.clone(),
            attributes: item.attributes.clone(),
        });
        Transition::Crossfade {
            from: outgoing,
            to: target,
        }
    }

    /// Move to the cyclic neighbour of the current position.
    pub fn advance(&mut self, step: Step) -> Transition {
        let len = self.len();
        let next = match step {
            Step::Next => (self.current_index + 1) % len,
            Step::Prev => (self.current_index + len - 1) % len,
        };
        self.go_to(next as isize)
    }

    /// Make `group` active and show its first item.
    ///
    /// Selecting the group that is already active keeps the current item.
    /// Unknown names are ignored.
    pub fn select_group(&mut self, group: &str) -> Transition {
        let Some(position) = self
            .groups
            .iter()
            .position(|g| g.name.as_deref() == Some(group))
        else {
            warn!(carousel = %self.name, group, "unknown carousel group ignored");
            return Transition::NoOp;
        };
        if position == self.active_group && self.current.is_some() {
            return Transition::NoOp;
        }
        debug!(carousel = %self.name, group, "carousel group selected");
        self.active_group = position;
        self.current_index = 0;
        self.go_to(0)
    }

    /// Advance every item's sequence and apply due handoffs.
    pub fn tick(&mut self, dt: Duration) {
        let mut handoffs = Vec::new();
        for (index, item) in self.items.iter_mut().enumerate() {
            item.sequence.tick(dt);
            for event in item.sequence.drain_events() {
                if let SequenceEvent::ReverseComplete {
                    continuation: Some(handoff),
                } = event
                {
                    handoffs.push((index, handoff));
                }
            }
        }
        for (from, handoff) in handoffs {
            if self.reversing == Some(from) {
                self.reversing = None;
            }
            if handoff.generation != self.generation || self.current != Some(handoff.to) {
                trace!(
                    carousel = %self.name,
                    from,
                    to = handoff.to,
                    generation = handoff.generation,
                    "stale handoff dropped"
                );
                continue;
            }
            trace!(carousel = %self.name, from, to = handoff.to, "handoff");
            self.items[handoff.to].sequence.play();
        }
    }

    /// Drain queued presentation events.
    pub fn drain_events(&mut self) -> Vec<CarouselEvent> {
        std::mem::take(&mut self.events)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
