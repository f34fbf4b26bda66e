#![forbid(unsafe_code)]

//! Stat bars: one width per attribute, tweened to the current item's value.

use std::collections::BTreeMap;
use std::time::Duration;

use scrollcue_core::Ease;
use scrollcue_core::animation::{Animation, Tween};
use serde::{Deserialize, Serialize};

/// Timing of bar tweens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatBarsConfig {
    /// Seconds per tween.
    pub duration: f64,
    pub easing: Ease,
}

impl Default for StatBarsConfig {
    fn default() -> Self {
        Self {
            duration: 0.3,
            easing: Ease::SineIn,
        }
    }
}

/// Attribute bars, widths in percent.
#[derive(Debug, Clone)]
pub struct StatBars {
    duration: Duration,
    easing: Ease,
    bars: BTreeMap<String, Tween>,
}

impl StatBars {
    /// Empty bars using `config` timing. An invalid duration snaps.
    pub fn new(config: StatBarsConfig) -> Self {
        Self {
            duration: Duration::try_from_secs_f64(config.duration).unwrap_or_default(),
            easing: config.easing,
            bars: BTreeMap::new(),
        }
    }

    /// Tween every bar named in `attributes` towards its value.
    ///
    /// Values are clamped to [0, 100]. Bars not named keep their width.
    pub fn show(&mut self, attributes: &BTreeMap<String, f32>) {
        for (name, value) in attributes {
            let target = if value.is_finite() { value.clamp(0.0, 100.0) } else { 0.0 };
            let (duration, easing) = (self.duration, self.easing);
            let bar = self
                .bars
                .entry(name.clone())
                .or_insert_with(|| Tween::resting(0.0, duration).easing(easing));
            bar.retarget(target);
        }
    }

    pub fn tick(&mut self, dt: Duration) {
        for bar in self.bars.values_mut() {
            bar.tick(dt);
        }
    }

    /// Current width of every bar.
    #[must_use]
    pub fn widths(&self) -> BTreeMap<String, f32> {
        self.bars
            .iter()
            .map(|(name, bar)| (name.clone(), bar.current()))
            .collect()
    }

    /// Whether every bar has reached its target.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.bars.values().all(Animation::is_complete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(damage: f32, accuracy: f32) -> BTreeMap<String, f32> {
        BTreeMap::from([
            ("damage".to_string(), damage),
            ("accuracy".to_string(), accuracy),
        ])
    }

    #[test]
    fn bars_tween_to_values() {
        let mut bars = StatBars::new(StatBarsConfig::default());
        bars.show(&stats(80.0, 40.0));
        assert!(bars.widths()["damage"].abs() < f32::EPSILON);
        bars.tick(Duration::from_millis(150));
        let mid = bars.widths()["damage"];
        assert!(mid > 0.0 && mid < 80.0);
        bars.tick(Duration::from_millis(150));
        assert!(bars.is_settled());
        assert!((bars.widths()["damage"] - 80.0).abs() < 1e-4);
        assert!((bars.widths()["accuracy"] - 40.0).abs() < 1e-4);
    }

    #[test]
    fn retarget_starts_from_current_width() {
        let mut bars = StatBars::new(StatBarsConfig {
            easing: Ease::Linear,
            ..StatBarsConfig::default()
        });
        bars.show(&stats(100.0, 100.0));
        bars.tick(Duration::from_millis(150));
        bars.show(&stats(0.0, 100.0));
        assert!((bars.widths()["damage"] - 50.0).abs() < 1e-3);
        bars.tick(Duration::from_millis(300));
        assert!(bars.widths()["damage"].abs() < 1e-4);
    }

    #[test]
    fn values_are_clamped() {
        let mut bars = StatBars::new(StatBarsConfig::default());
        bars.show(&stats(250.0, f32::NAN));
        bars.tick(Duration::from_secs(1));
        assert!((bars.widths()["damage"] - 100.0).abs() < 1e-4);
        assert!(bars.widths()["accuracy"].abs() < f32::EPSILON);
    }
}
