//! Property-based invariant tests for the region trigger engine.
//!
//! 1. A `once` region fires at most once, and exactly once when reached.
//! 2. At most one region of a group is active after any update.
//! 3. No region fires more than one event per update.
//! 4. Enter and leave events alternate per region.

use std::collections::HashMap;

use proptest::prelude::*;
use scrollcue_core::trigger::{
    Lifecycle, Region, RegionHandlers, RegionId, RegionState, RegionTriggerEngine,
    TriggerGeometry,
};

// ── Helpers ─────────────────────────────────────────────────────────────

const VIEWPORT: f64 = 800.0;

fn handlers(id: usize) -> RegionHandlers<usize> {
    RegionHandlers::new()
        .on(Lifecycle::ForwardEnter, id)
        .on(Lifecycle::BackwardEnter, id)
        .on(Lifecycle::ForwardLeave, id)
        .on(Lifecycle::BackwardLeave, id)
}

fn path_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-2000.0f64..8000.0, 1..40)
}

fn layout_strategy() -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((0.0f64..5000.0, 0.0f64..1500.0), 1..6)
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Once regions
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn once_region_fires_exactly_when_reached(top in 1000.0f64..4000.0, path in path_strategy()) {
        let mut engine = RegionTriggerEngine::new(VIEWPORT).expect("viewport");
        let region = Region::new("headline", TriggerGeometry::new(top, 300.0)).once();
        let id = engine.register_region(region, handlers(0)).expect("valid");
        let (start, _) = engine.range(id).expect("registered");

        let mut fired = Vec::new();
        for position in &path {
            fired.extend(engine.update(*position).into_iter().map(|e| e.lifecycle));
        }
        let reached = path.iter().any(|p| *p >= start);
        prop_assert_eq!(fired.len(), usize::from(reached));
        if reached {
            prop_assert_eq!(fired[0], Lifecycle::ForwardEnter);
            prop_assert_eq!(engine.state(id), Some(RegionState::Disarmed));
        }
    }
}

#[test]
fn once_region_enter_leave_reenter() {
    let mut engine = RegionTriggerEngine::new(VIEWPORT).expect("viewport");
    let id = engine
        .register_region(
            Region::new("headline", TriggerGeometry::new(1000.0, 300.0)).once(),
            handlers(0),
        )
        .expect("valid");
    let mut count = 0;
    for position in [600.0, 2000.0, 700.0, 0.0, 700.0, 2000.0] {
        count += engine
            .update(position)
            .iter()
            .filter(|e| e.lifecycle == Lifecycle::ForwardEnter)
            .count();
    }
    assert_eq!(count, 1);
    assert_eq!(engine.state(id), Some(RegionState::Disarmed));
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Group exclusivity
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn group_has_at_most_one_active(layout in layout_strategy(), path in path_strategy()) {
        let mut engine = RegionTriggerEngine::new(VIEWPORT).expect("viewport");
        let ids: Vec<RegionId> = layout
            .iter()
            .enumerate()
            .map(|(i, (top, height))| {
                let region = Region::new(format!("faction-{i}"), TriggerGeometry::new(*top, *height))
                    .group("factions");
                engine.register_region(region, handlers(i)).expect("valid")
            })
            .collect();

        for position in path {
            let _ = engine.update(position);
            let active = ids
                .iter()
                .filter(|id| engine.state(**id) == Some(RegionState::Active))
                .count();
            prop_assert!(active <= 1, "{active} regions active at {position}");
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3 & 4. One event per region per update, alternating enter/leave
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn events_alternate_and_never_repeat(layout in layout_strategy(), path in path_strategy()) {
        let mut engine = RegionTriggerEngine::new(VIEWPORT).expect("viewport");
        for (i, (top, height)) in layout.iter().enumerate() {
            let region = Region::new(format!("section-{i}"), TriggerGeometry::new(*top, *height));
            engine.register_region(region, handlers(i)).expect("valid");
        }

        let mut last: HashMap<usize, Lifecycle> = HashMap::new();
        for position in path {
            let events = engine.update(position);
            let mut seen = Vec::new();
            for event in events {
                prop_assert!(!seen.contains(&event.action), "region {} fired twice", event.action);
                seen.push(event.action);
                if let Some(previous) = last.get(&event.action) {
                    prop_assert_ne!(previous.is_enter(), event.lifecycle.is_enter());
                } else {
                    prop_assert!(event.lifecycle.is_enter());
                }
                last.insert(event.action, event.lifecycle);
            }
        }
    }
}
