#![forbid(unsafe_code)]

//! Declarative scene configuration.
//!
//! A [`SceneConfig`] describes every effect, region, carousel and hover
//! target of a page. It is decoded from JSON with [`SceneConfig::from_json_str`]
//! and validated eagerly; [`Scene::from_config`](crate::scene::Scene::from_config)
//! then builds the runtime objects. Durations are written in seconds.

use std::collections::{BTreeMap, BTreeSet};

use scrollcue_core::ConfigurationError;
use scrollcue_core::error;
use scrollcue_core::trigger::Boundary;
use serde::{Deserialize, Serialize};

use crate::label::LabelSwapConfig;
use crate::scramble::DEFAULT_CHARSET;
use crate::stats::StatBarsConfig;

/// Delay before a scroll-triggered effect starts, in seconds.
pub const DEFAULT_EFFECT_DELAY: f64 = 1.0;
/// Scramble paragraph duration, in seconds.
pub const DEFAULT_SCRAMBLE_DURATION: f64 = 2.0;
/// Playback rate used when a region's effect reverses on leave.
pub const DEFAULT_LEAVE_RATE: f64 = 2.0;

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// Everything a page animates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Viewport height in scroll units.
    pub viewport_height: f64,
    /// Seed for jitter and random stagger; `None` seeds from entropy.
    pub seed: Option<u64>,
    pub effects: Vec<EffectConfig>,
    pub regions: Vec<RegionConfig>,
    pub carousels: Vec<CarouselConfig>,
    pub hovers: Vec<HoverConfig>,
    pub label: LabelSwapConfig,
    pub stat_bars: StatBarsConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            viewport_height: 900.0,
            seed: None,
            effects: Vec::new(),
            regions: Vec::new(),
            carousels: Vec::new(),
            hovers: Vec::new(),
            label: LabelSwapConfig::default(),
            stat_bars: StatBarsConfig::default(),
        }
    }
}

impl SceneConfig {
    /// Decode and validate a JSON scene description.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigurationError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check durations, rates and cross references.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.viewport_height.is_finite() || self.viewport_height <= 0.0 {
            return Err(ConfigurationError::InvalidGeometry {
                field: "viewport height",
                value: self.viewport_height,
            });
        }
        error::seconds("label erase", self.label.erase)?;
        error::seconds("label gap", self.label.gap)?;
        error::seconds("label write", self.label.write)?;
        error::seconds("stat bar tween", self.stat_bars.duration)?;

        for effect in &self.effects {
            effect.validate()?;
        }
        for carousel in &self.carousels {
            carousel.validate()?;
        }
        for hover in &self.hovers {
            hover.validate()?;
        }
        unique("effect", self.effects.iter().map(|e| e.name.as_str()))?;
        unique("carousel", self.carousels.iter().map(|c| c.name.as_str()))?;
        unique("hover", self.hovers.iter().map(|h| h.name.as_str()))?;

        let effects: BTreeSet<&str> = self.effects.iter().map(|e| e.name.as_str()).collect();
        let carousels: BTreeMap<&str, &CarouselConfig> =
            self.carousels.iter().map(|c| (c.name.as_str(), c)).collect();
        for region in &self.regions {
            let context = format!("region {:?}", region.trigger);
            error::seconds(context.clone(), region.delay)?;
            error::rate(context, region.rate_on_leave)?;
            match &region.binding {
                RegionBinding::Effect { effect } => {
                    if !effects.contains(effect.as_str()) {
                        return Err(ConfigurationError::UnknownEffect {
                            effect: effect.clone(),
                        });
                    }
                }
                RegionBinding::CarouselGroup { carousel, group } => {
                    let Some(config) = carousels.get(carousel.as_str()) else {
                        return Err(ConfigurationError::UnknownCarousel {
                            carousel: carousel.clone(),
                        });
                    };
                    if !config.items.iter().any(|i| i.group.as_deref() == Some(group)) {
                        return Err(ConfigurationError::UnknownGroup {
                            carousel: carousel.clone(),
                            group: group.clone(),
                        });
                    }
                }
                RegionBinding::CarouselStart { carousel } => {
                    if !carousels.contains_key(carousel.as_str()) {
                        return Err(ConfigurationError::UnknownCarousel {
                            carousel: carousel.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// A scroll-triggered effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectConfig {
    pub name: String,
    #[serde(flatten)]
    pub kind: EffectKind,
}

/// What an effect animates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectKind {
    /// Word-by-word glitch headline.
    Glitch {
        words: Vec<String>,
        /// Duplicate top layer of each word, jittered separately.
        #[serde(default)]
        top_layer: Vec<String>,
        /// Long-step length in seconds.
        #[serde(default = "default_headline_step")]
        step: f64,
        /// Play the headline glitch sound when the effect starts.
        #[serde(default = "default_true")]
        sound: bool,
    },
    /// Paragraph typed in from empty.
    Scramble {
        /// Target painted by the host.
        paragraph: String,
        text: String,
        #[serde(default = "default_scramble_duration")]
        duration: f64,
    },
}

impl EffectConfig {
    fn validate(&self) -> Result<(), ConfigurationError> {
        match &self.kind {
            EffectKind::Glitch { words, step, .. } => {
                error::seconds(format!("effect {:?} step", self.name), *step)?;
                non_empty(&self.name, words)?;
            }
            EffectKind::Scramble { duration, .. } => {
                error::seconds(format!("effect {:?} duration", self.name), *duration)?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Regions
// ---------------------------------------------------------------------------

/// A scroll region and what it drives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Name of the trigger surface.
    pub trigger: String,
    /// Document offset of the trigger's top edge.
    pub top: f64,
    /// Height of the trigger.
    pub height: f64,
    /// Start boundary; defaults to `"top 60%"`.
    #[serde(default)]
    pub start: Option<Boundary>,
    /// End boundary; defaults to `"bottom top"`.
    #[serde(default)]
    pub end: Option<Boundary>,
    #[serde(default)]
    pub once: bool,
    /// Regions sharing a group are mutually exclusive.
    #[serde(default, rename = "exclusive_group")]
    pub group: Option<String>,
    /// Reverse the bound effect on leave.
    #[serde(default = "default_true")]
    pub reversible: bool,
    /// Seconds before a bound effect starts on enter.
    #[serde(default = "default_effect_delay")]
    pub delay: f64,
    #[serde(default = "default_leave_rate")]
    pub rate_on_leave: f64,
    #[serde(flatten)]
    pub binding: RegionBinding,
}

/// Action bound to a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RegionBinding {
    /// Play an effect on enter, reverse it on leave.
    Effect { effect: String },
    /// Switch a carousel to an item group when entered from either side.
    CarouselGroup { carousel: String, group: String },
    /// Show a carousel's first item when entered scrolling down.
    CarouselStart { carousel: String },
}

// ---------------------------------------------------------------------------
// Carousels
// ---------------------------------------------------------------------------

/// A crossfading carousel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarouselConfig {
    pub name: String,
    /// Long-step length of each item's glitch, in seconds.
    #[serde(default = "default_slider_step")]
    pub step: f64,
    pub items: Vec<ItemConfig>,
}

impl CarouselConfig {
    fn validate(&self) -> Result<(), ConfigurationError> {
        error::seconds(format!("carousel {:?} step", self.name), self.step)?;
        if self.items.is_empty() {
            return Err(ConfigurationError::EmptyCarousel {
                carousel: self.name.clone(),
            });
        }
        for item in &self.items {
            non_empty(&format!("{}/{}", self.name, item.name), &item.slices)?;
        }
        Ok(())
    }
}

/// One carousel item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemConfig {
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
    /// Image slices glitched in and out.
    pub slices: Vec<String>,
    /// Detail panel flickered in after the glitch.
    #[serde(default)]
    pub detail: Option<String>,
    /// Stat bar values, percent.
    #[serde(default)]
    pub attributes: BTreeMap<String, f32>,
}

// ---------------------------------------------------------------------------
// Hover targets
// ---------------------------------------------------------------------------

/// A pointer-hover effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoverConfig {
    pub name: String,
    #[serde(flatten)]
    pub kind: HoverKind,
}

/// What a hover target does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HoverKind {
    /// Sliced glitch, optionally swapping to an alternate layer.
    Glitch {
        slices: Vec<String>,
        #[serde(default)]
        primary: Vec<String>,
        #[serde(default)]
        alternate: Vec<String>,
        /// Play the hover glitch sound on enter.
        #[serde(default = "default_true")]
        sound: bool,
    },
    /// Text scrambled while hovered.
    Scramble {
        text: String,
        /// Seconds to resolve.
        #[serde(default = "default_hover_scramble_duration")]
        duration: f64,
        #[serde(default = "default_charset")]
        charset: String,
    },
}

impl HoverConfig {
    fn validate(&self) -> Result<(), ConfigurationError> {
        match &self.kind {
            HoverKind::Glitch { slices, .. } => non_empty(&self.name, slices),
            HoverKind::Scramble { duration, .. } => {
                error::seconds(format!("hover {:?} duration", self.name), *duration).map(drop)
            }
        }
    }
}

/// A glitch needs at least one target to animate.
fn non_empty(sequence: &str, targets: &[String]) -> Result<(), ConfigurationError> {
    if targets.is_empty() {
        return Err(ConfigurationError::EmptyTargets {
            sequence: sequence.to_string(),
            segment: 0,
        });
    }
    Ok(())
}

fn unique<'a>(
    kind: &'static str,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<(), ConfigurationError> {
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ConfigurationError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

fn default_true() -> bool {
    true
}

fn default_effect_delay() -> f64 {
    DEFAULT_EFFECT_DELAY
}

fn default_leave_rate() -> f64 {
    DEFAULT_LEAVE_RATE
}

fn default_scramble_duration() -> f64 {
    DEFAULT_SCRAMBLE_DURATION
}

fn default_hover_scramble_duration() -> f64 {
    1.0
}

fn default_headline_step() -> f64 {
    0.04
}

fn default_slider_step() -> f64 {
    0.02
}

fn default_charset() -> String {
    DEFAULT_CHARSET.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrollcue_core::trigger::Edge;

    const PAGE: &str = r#"{
        "viewport_height": 800,
        "effects": [
            { "name": "hero-title", "type": "glitch", "words": ["forth", "we", "win"] },
            { "name": "intro", "type": "scramble", "paragraph": "intro-p", "text": "Hold the line." }
        ],
        "regions": [
            { "trigger": "hero", "top": 0, "height": 600, "action": "effect", "effect": "hero-title", "once": true },
            { "trigger": "intro", "top": 900, "height": 400, "start": "top center", "action": "effect", "effect": "intro" },
            { "trigger": "homefront", "top": 2000, "height": 800, "start": "top center", "end": "bottom center",
              "exclusive_group": "factions", "action": "carousel_group", "carousel": "factions", "group": "homefront" }
        ],
        "carousels": [
            { "name": "factions", "items": [
                { "name": "Warden", "group": "homefront", "slices": ["w-top", "w-mid", "w-bot"] }
            ] }
        ]
    }"#;

    #[test]
    fn parses_page_with_defaults() {
        let config = SceneConfig::from_json_str(PAGE).expect("valid page");
        assert_eq!(config.effects.len(), 2);
        let homefront = &config.regions[2];
        assert_eq!(homefront.group.as_deref(), Some("factions"));
        assert_eq!(
            homefront.binding,
            RegionBinding::CarouselGroup {
                carousel: "factions".into(),
                group: "homefront".into()
            }
        );
        let title = &config.regions[0];
        assert!(title.once);
        assert!((title.delay - DEFAULT_EFFECT_DELAY).abs() < f64::EPSILON);
        assert!((title.rate_on_leave - DEFAULT_LEAVE_RATE).abs() < f64::EPSILON);
        assert_eq!(title.start, None);
        assert_eq!(
            config.regions[1].start,
            Some(Boundary::new(Edge::Top, Edge::Center))
        );
        assert!(matches!(
            &config.effects[1].kind,
            EffectKind::Scramble { duration, .. } if (*duration - 2.0).abs() < f64::EPSILON
        ));
        assert!((config.carousels[0].step - 0.02).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_carousel_group_is_rejected() {
        let page = PAGE.replace(r#""group": "homefront" }"#, r#""group": "frontier" }"#);
        assert_eq!(
            SceneConfig::from_json_str(&page),
            Err(ConfigurationError::UnknownGroup {
                carousel: "factions".into(),
                group: "frontier".into()
            })
        );
    }

    #[test]
    fn unknown_effect_is_rejected() {
        let config = SceneConfig {
            regions: vec![RegionConfig {
                trigger: "x".into(),
                top: 0.0,
                height: 10.0,
                start: None,
                end: None,
                once: false,
                group: None,
                reversible: true,
                delay: 0.0,
                rate_on_leave: 2.0,
                binding: RegionBinding::Effect {
                    effect: "missing".into(),
                },
            }],
            ..SceneConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::UnknownEffect {
                effect: "missing".into()
            })
        );
    }

    #[test]
    fn bad_boundary_is_a_parse_error() {
        let page = r#"{ "regions": [ { "trigger": "t", "top": 0, "height": 1, "start": "sideways",
            "action": "carousel_start", "carousel": "c" } ] }"#;
        assert!(matches!(
            SceneConfig::from_json_str(page),
            Err(ConfigurationError::Parse { .. })
        ));
    }

    #[test]
    fn glitch_without_words_is_rejected() {
        let page = PAGE.replace(r#""words": ["forth", "we", "win"]"#, r#""words": []"#);
        assert_eq!(
            SceneConfig::from_json_str(&page),
            Err(ConfigurationError::EmptyTargets {
                sequence: "hero-title".into(),
                segment: 0
            })
        );
    }

    #[test]
    fn carousel_item_without_slices_is_rejected() {
        let page = PAGE.replace(r#""slices": ["w-top", "w-mid", "w-bot"]"#, r#""slices": []"#);
        assert_eq!(
            SceneConfig::from_json_str(&page),
            Err(ConfigurationError::EmptyTargets {
                sequence: "factions/Warden".into(),
                segment: 0
            })
        );
    }

    #[test]
    fn hover_glitch_without_slices_is_rejected() {
        let page = r#"{ "hovers": [ { "name": "enlist", "type": "glitch", "slices": [] } ] }"#;
        assert_eq!(
            SceneConfig::from_json_str(page),
            Err(ConfigurationError::EmptyTargets {
                sequence: "enlist".into(),
                segment: 0
            })
        );
    }

    #[test]
    fn repeated_carousel_name_is_rejected() {
        let page = PAGE.replace(
            r#""carousels": ["#,
            r#""carousels": [ { "name": "factions", "items": [ { "name": "Other", "group": "x", "slices": ["o"] } ] },"#,
        );
        assert_eq!(
            SceneConfig::from_json_str(&page),
            Err(ConfigurationError::DuplicateName {
                kind: "carousel",
                name: "factions".into()
            })
        );
    }

    #[test]
    fn repeated_effect_and_hover_names_are_rejected() {
        let page = PAGE.replace(r#""name": "intro""#, r#""name": "hero-title""#);
        assert!(matches!(
            SceneConfig::from_json_str(&page),
            Err(ConfigurationError::DuplicateName { kind: "effect", .. })
        ));

        let hovers = r#"{ "hovers": [
            { "name": "enlist", "type": "scramble", "text": "Enlist" },
            { "name": "enlist", "type": "glitch", "slices": ["e1"] }
        ] }"#;
        assert_eq!(
            SceneConfig::from_json_str(hovers),
            Err(ConfigurationError::DuplicateName {
                kind: "hover",
                name: "enlist".into()
            })
        );
    }

    #[test]
    fn negative_duration_is_rejected() {
        let page = r#"{ "effects": [ { "name": "e", "type": "scramble", "paragraph": "p", "text": "t", "duration": -1 } ] }"#;
        assert!(matches!(
            SceneConfig::from_json_str(page),
            Err(ConfigurationError::InvalidDuration { .. })
        ));
    }
}
