#![forbid(unsafe_code)]

//! Scene driver: one object per page that turns scroll, time and pointer
//! input into poses, texts, labels, bar widths and sound cues.
//!
//! # Frame order
//!
//! [`Scene::frame`] performs, in order:
//!
//! 1. Engine update with the new scroll position (once the page has loaded).
//! 2. Dispatch of fired region actions.
//! 3. Sequence, carousel and hover ticks.
//! 4. Presenter ticks (labels, stat bars).
//!
//! Before the load gate opens the engine only tracks the position; sections
//! already in view fire when [`Scene::observe_header_opacity`] refreshes it.

use std::collections::BTreeMap;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scrollcue_core::carousel::{Carousel, CarouselEvent, CarouselItem, Step, Transition};
use scrollcue_core::sequence::{
    PlaybackState, Property, PropertyDelta, Segment, Sequence, SequenceEvent, TargetId,
};
use scrollcue_core::trigger::{
    Lifecycle, Region, RegionHandlers, RegionTriggerEngine, TriggerEvent, TriggerGeometry,
};
use scrollcue_core::{ConfigurationError, Ease, error};
use tracing::{debug, info, trace, warn};

use crate::audio::{AudioCue, AudioGate, CuePlayback, MusicCommand};
use crate::config::{
    CarouselConfig, EffectConfig, EffectKind, HoverConfig, HoverKind, RegionBinding,
    RegionConfig, SceneConfig,
};
use crate::glitch::{AlternateLayer, GlitchProfile, GlitchTargets, Pose};
use crate::hover::HoverGlitch;
use crate::label::LabelSwap;
use crate::load_gate::LoadGate;
use crate::scramble::{HoverScramble, ScrambleText, TypewriterReveal};
use crate::stats::StatBars;

// ---------------------------------------------------------------------------
// Actions and output
// ---------------------------------------------------------------------------

/// What a region does when it fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneAction {
    /// Play an effect forward.
    Play(usize),
    /// Reverse an effect.
    Reverse(usize),
    /// Make a carousel group active.
    SelectGroup { carousel: usize, group: String },
    /// Show a carousel position.
    GoTo { carousel: usize, index: isize },
}

/// Everything a host paints for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutput {
    /// Sounds cleared to play this frame.
    pub cues: Vec<CuePlayback>,
    /// Resolved pose per effect, carousel and hover glitch name.
    pub poses: BTreeMap<String, Pose>,
    /// Paragraph and hover text per target name.
    pub texts: BTreeMap<String, String>,
    /// Item label per carousel.
    pub labels: BTreeMap<String, String>,
    /// Stat bar widths per carousel.
    pub bars: BTreeMap<String, BTreeMap<String, f32>>,
}

// ---------------------------------------------------------------------------
// Owned runtime objects
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Effect {
    name: String,
    sound: bool,
    sequence: Sequence,
    look: Look,
}

#[derive(Debug)]
enum Look {
    Glitch { rest: Pose },
    Typewriter { paragraph: TargetId, reveal: TypewriterReveal },
}

#[derive(Debug)]
struct CarouselSlot {
    carousel: Carousel,
    rests: Vec<Pose>,
    label: LabelSwap,
    bars: StatBars,
}

#[derive(Debug)]
struct HoverSlot {
    name: String,
    target: HoverTarget,
}

#[derive(Debug)]
enum HoverTarget {
    Glitch { glitch: HoverGlitch, sound: bool },
    Scramble(HoverScramble),
}

/// A page's animation state.
#[derive(Debug)]
pub struct Scene {
    engine: RegionTriggerEngine<SceneAction>,
    effects: Vec<Effect>,
    carousels: Vec<CarouselSlot>,
    hovers: Vec<HoverSlot>,
    audio: AudioGate,
    load: LoadGate,
    cues: Vec<CuePlayback>,
}

impl Scene {
    /// Validate `config` and build every effect, region and carousel.
    pub fn from_config(config: &SceneConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let effects = config
            .effects
            .iter()
            .map(|c| build_effect(c, &mut rng))
            .collect::<Result<Vec<_>, _>>()?;
        let carousels = config
            .carousels
            .iter()
            .map(|c| build_carousel(c, config, &mut rng))
            .collect::<Result<Vec<_>, _>>()?;
        let hovers = config
            .hovers
            .iter()
            .map(|c| build_hover(c, &mut rng))
            .collect::<Result<Vec<_>, _>>()?;

        let mut engine = RegionTriggerEngine::new(config.viewport_height)?;
        for region in &config.regions {
            let handlers = bind(region, &effects, &carousels)?;
            engine.register_region(build_region(region)?, handlers)?;
        }

        info!(
            effects = effects.len(),
            regions = engine.len(),
            carousels = carousels.len(),
            hovers = hovers.len(),
            "scene built"
        );
        Ok(Self {
            engine,
            effects,
            carousels,
            hovers,
            audio: AudioGate::new(),
            load: LoadGate::new(),
            cues: Vec::new(),
        })
    }

    /// Decode, validate and build a scene from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        Self::from_config(&SceneConfig::from_json_str(json)?)
    }

    /// Feed the header opacity of the loading animation.
    ///
    /// The first observation at full opacity marks the page loaded and fires
    /// every region the current scroll position has already reached.
    pub fn observe_header_opacity(&mut self, opacity: f32) -> bool {
        if !self.load.observe(opacity) {
            return false;
        }
        self.audio.set_page_loaded();
        let events = self.engine.refresh();
        self.dispatch(events);
        true
    }

    /// Advance the scene to scroll position `scroll` and elapsed time `dt`.
    pub fn frame(&mut self, scroll: f64, dt: Duration) -> FrameOutput {
        if self.load.is_loaded() {
            let events = self.engine.update(scroll);
            self.dispatch(events);
        } else {
            self.engine.set_position(scroll);
        }

        for effect in &mut self.effects {
            effect.sequence.tick(dt);
            for event in effect.sequence.drain_events() {
                if matches!(event, SequenceEvent::Started) && effect.sound {
                    trace!(effect = %effect.name, "effect started");
                    self.cues.extend(self.audio.cue(AudioCue::HeadlineGlitch));
                }
            }
        }
        for index in 0..self.carousels.len() {
            self.carousels[index].carousel.tick(dt);
            self.present(index);
            let slot = &mut self.carousels[index];
            slot.label.tick(dt);
            slot.bars.tick(dt);
        }
        for hover in &mut self.hovers {
            match &mut hover.target {
                HoverTarget::Glitch { glitch, .. } => glitch.tick(dt),
                HoverTarget::Scramble(scramble) => scramble.tick(dt),
            }
        }

        self.output()
    }

    /// Step a carousel in response to arrow input.
    ///
    /// Presentation (label, bars, cue) starts immediately. Unknown carousels
    /// are logged and yield [`Transition::NoOp`].
    pub fn navigate(&mut self, carousel: &str, step: Step) -> Transition {
        let Some(index) = self
            .carousels
            .iter()
            .position(|slot| slot.carousel.name() == carousel)
        else {
            warn!(carousel, "navigation on unknown carousel");
            return Transition::NoOp;
        };
        let transition = self.carousels[index].carousel.advance(step);
        self.present(index);
        transition
    }

    /// Pointer entered the hover target `name`. Unknown names are ignored.
    pub fn pointer_enter(&mut self, name: &str) {
        let Some(hover) = self.hovers.iter_mut().find(|h| h.name == name) else {
            warn!(hover = name, "pointer enter on unknown hover target");
            return;
        };
        match &mut hover.target {
            HoverTarget::Glitch { glitch, sound } => {
                glitch.pointer_enter();
                if *sound {
                    self.cues.extend(self.audio.cue(AudioCue::HoverGlitch));
                }
            }
            HoverTarget::Scramble(scramble) => scramble.pointer_enter(),
        }
    }

    /// Pointer left the hover target `name`. Unknown names are ignored.
    pub fn pointer_leave(&mut self, name: &str) {
        let Some(hover) = self.hovers.iter_mut().find(|h| h.name == name) else {
            warn!(hover = name, "pointer leave on unknown hover target");
            return;
        };
        match &mut hover.target {
            HoverTarget::Glitch { glitch, .. } => glitch.pointer_leave(),
            HoverTarget::Scramble(scramble) => scramble.pointer_leave(),
        }
    }

    /// Record a user gesture; the first one unlocks audio.
    pub fn user_gesture(&mut self) -> Option<MusicCommand> {
        self.audio.user_gesture()
    }

    /// Flip music and sound cues.
    pub fn toggle_music(&mut self) -> Option<MusicCommand> {
        self.audio.toggle_music()
    }

    /// The trigger engine.
    #[must_use]
    pub fn engine(&self) -> &RegionTriggerEngine<SceneAction> {
        &self.engine
    }

    /// Carousel named `name`.
    #[must_use]
    pub fn carousel(&self, name: &str) -> Option<&Carousel> {
        self.carousels
            .iter()
            .map(|slot| &slot.carousel)
            .find(|c| c.name() == name)
    }

    /// Playback state of the effect named `name`.
    #[must_use]
    pub fn effect_state(&self, name: &str) -> Option<PlaybackState> {
        self.effects
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.sequence.state())
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.load.is_loaded()
    }

    fn dispatch(&mut self, events: Vec<TriggerEvent<SceneAction>>) {
        for TriggerEvent {
            region,
            lifecycle,
            action,
            schedule,
        } in events
        {
            debug!(region = region.index(), ?lifecycle, ?action, "dispatch");
            match action {
                SceneAction::Play(index) => {
                    let sequence = &mut self.effects[index].sequence;
                    sequence.set_delay(schedule.delay);
                    sequence.set_rate(schedule.rate);
                    sequence.play();
                }
                SceneAction::Reverse(index) => {
                    if !schedule.reversible {
                        continue;
                    }
                    let sequence = &mut self.effects[index].sequence;
                    sequence.set_rate(schedule.rate);
                    sequence.reverse();
                }
                SceneAction::SelectGroup { carousel, group } => {
                    self.carousels[carousel].carousel.select_group(&group);
                    self.present(carousel);
                }
                SceneAction::GoTo { carousel, index } => {
                    self.carousels[carousel].carousel.go_to(index);
                    self.present(carousel);
                }
            }
        }
    }

    fn present(&mut self, index: usize) {
        let slot = &mut self.carousels[index];
        for event in slot.carousel.drain_events() {
            let CarouselEvent::Transitioned {
                name, attributes, ..
            } = event;
            slot.label.set(&name);
            slot.bars.show(&attributes);
            self.cues.extend(self.audio.cue(AudioCue::HeadlineGlitch));
        }
    }

    fn output(&mut self) -> FrameOutput {
        let mut out = FrameOutput {
            cues: std::mem::take(&mut self.cues),
            ..FrameOutput::default()
        };
        for effect in &self.effects {
            let frame = effect.sequence.sample();
            match &effect.look {
                Look::Glitch { rest } => {
                    out.poses.insert(effect.name.clone(), rest.resolve(&frame));
                }
                Look::Typewriter { paragraph, reveal } => {
                    let progress = frame.get(paragraph, Property::Reveal);
                    out.texts
                        .insert(paragraph.as_str().to_string(), reveal.render(progress));
                }
            }
        }
        for slot in &self.carousels {
            let mut pose = Pose::default();
            for (item, rest) in slot.carousel.items().iter().zip(&slot.rests) {
                let resolved = rest.resolve(&item.sequence.sample());
                for (target, property, value) in resolved.iter() {
                    pose.set(target, property, value);
                }
            }
            let name = slot.carousel.name().to_string();
            out.poses.insert(name.clone(), pose);
            out.labels.insert(name.clone(), slot.label.text());
            out.bars.insert(name, slot.bars.widths());
        }
        for hover in &mut self.hovers {
            match &mut hover.target {
                HoverTarget::Glitch { glitch, .. } => {
                    out.poses.insert(hover.name.clone(), glitch.pose());
                }
                HoverTarget::Scramble(scramble) => {
                    out.texts.insert(hover.name.clone(), scramble.text());
                }
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

fn build_effect(config: &EffectConfig, rng: &mut StdRng) -> Result<Effect, ConfigurationError> {
    match &config.kind {
        EffectKind::Glitch {
            words,
            top_layer,
            step,
            sound,
        } => {
            let step = error::seconds(format!("effect {:?} step", config.name), *step)?;
            let targets = GlitchTargets::new(words.iter().map(String::as_str))
                .top_layer(top_layer.iter().map(String::as_str));
            let timeline = GlitchProfile::headline().with_step(step).timeline(&targets, rng);
            let sequence = Sequence::new(config.name.clone(), timeline.segments)?.with_seed(rng.r#gen());
            Ok(Effect {
                name: config.name.clone(),
                sound: *sound,
                sequence,
                look: Look::Glitch {
                    rest: timeline.rest,
                },
            })
        }
        EffectKind::Scramble {
            paragraph,
            text,
            duration,
        } => {
            let duration = error::seconds(format!("effect {:?} duration", config.name), *duration)?;
            let segment = Segment::new([paragraph.as_str()], duration)
                .delta(PropertyDelta::uniform(Property::Reveal, 1.0))
                .easing(Ease::Linear);
            Ok(Effect {
                name: config.name.clone(),
                sound: false,
                sequence: Sequence::new(config.name.clone(), vec![segment])?,
                look: Look::Typewriter {
                    paragraph: TargetId::new(paragraph),
                    reveal: TypewriterReveal::new(text),
                },
            })
        }
    }
}

fn build_carousel(
    config: &CarouselConfig,
    scene: &SceneConfig,
    rng: &mut StdRng,
) -> Result<CarouselSlot, ConfigurationError> {
    let step = error::seconds(format!("carousel {:?} step", config.name), config.step)?;
    let profile = GlitchProfile::slider().with_step(step);
    let mut items = Vec::with_capacity(config.items.len());
    let mut rests = Vec::with_capacity(config.items.len());
    for item in &config.items {
        let mut targets = GlitchTargets::new(item.slices.iter().map(String::as_str));
        if let Some(detail) = &item.detail {
            targets = targets.detail(detail.as_str());
        }
        let timeline = profile.timeline(&targets, rng);
        let label = format!("{}/{}", config.name, item.name);
        let sequence = Sequence::new(label, timeline.segments)?.with_seed(rng.r#gen());
        let mut built = CarouselItem::new(item.name.clone(), sequence);
        if let Some(group) = &item.group {
            built = built.in_group(group.clone());
        }
        built.attributes = item.attributes.clone();
        items.push(built);
        rests.push(timeline.rest);
    }
    Ok(CarouselSlot {
        carousel: Carousel::new(config.name.clone(), items)?,
        rests,
        label: LabelSwap::new(scene.label),
        bars: StatBars::new(scene.stat_bars),
    })
}

fn build_hover(config: &HoverConfig, rng: &mut StdRng) -> Result<HoverSlot, ConfigurationError> {
    let target = match &config.kind {
        HoverKind::Glitch {
            slices,
            primary,
            alternate,
            sound,
        } => {
            let mut targets = GlitchTargets::new(slices.iter().map(String::as_str));
            if !primary.is_empty() || !alternate.is_empty() {
                targets = targets.alternate(AlternateLayer {
                    primary: primary.iter().map(TargetId::new).collect(),
                    alternate: alternate.iter().map(TargetId::new).collect(),
                });
            }
            HoverTarget::Glitch {
                glitch: HoverGlitch::new(config.name.clone(), &GlitchProfile::slider(), &targets, rng)?,
                sound: *sound,
            }
        }
        HoverKind::Scramble {
            text,
            duration,
            charset,
        } => {
            let duration = error::seconds(format!("hover {:?} duration", config.name), *duration)?;
            let text = ScrambleText::new(text)
                .with_charset(charset)
                .with_seed(rng.r#gen());
            HoverTarget::Scramble(HoverScramble::new(text, duration))
        }
    };
    Ok(HoverSlot {
        name: config.name.clone(),
        target,
    })
}

fn build_region(config: &RegionConfig) -> Result<Region, ConfigurationError> {
    let delay = error::seconds(format!("region {:?}", config.trigger), config.delay)?;
    let mut region = Region::new(
        config.trigger.clone(),
        TriggerGeometry::new(config.top, config.height),
    )
    .delay(delay)
    .rate_on_leave(config.rate_on_leave)
    .reversible(config.reversible);
    if let Some(start) = config.start {
        region = region.start(start);
    }
    if let Some(end) = config.end {
        region = region.end(end);
    }
    if config.once {
        region = region.once();
    }
    if let Some(group) = &config.group {
        region = region.group(group.clone());
    }
    Ok(region)
}

fn bind(
    config: &RegionConfig,
    effects: &[Effect],
    carousels: &[CarouselSlot],
) -> Result<RegionHandlers<SceneAction>, ConfigurationError> {
    let carousel_index = |name: &str| {
        carousels
            .iter()
            .position(|slot| slot.carousel.name() == name)
            .ok_or_else(|| ConfigurationError::UnknownCarousel {
                carousel: name.to_string(),
            })
    };
    let handlers = match &config.binding {
        RegionBinding::Effect { effect } => {
            let index = effects.iter().position(|e| &e.name == effect).ok_or_else(|| {
                ConfigurationError::UnknownEffect {
                    effect: effect.clone(),
                }
            })?;
            RegionHandlers::new()
                .on(Lifecycle::ForwardEnter, SceneAction::Play(index))
                .on(Lifecycle::BackwardEnter, SceneAction::Play(index))
                .on(Lifecycle::ForwardLeave, SceneAction::Reverse(index))
                .on(Lifecycle::BackwardLeave, SceneAction::Reverse(index))
        }
        RegionBinding::CarouselGroup { carousel, group } => {
            let action = SceneAction::SelectGroup {
                carousel: carousel_index(carousel)?,
                group: group.clone(),
            };
            RegionHandlers::new()
                .on(Lifecycle::ForwardEnter, action.clone())
                .on(Lifecycle::BackwardEnter, action)
        }
        RegionBinding::CarouselStart { carousel } => RegionHandlers::new().on(
            Lifecycle::ForwardEnter,
            SceneAction::GoTo {
                carousel: carousel_index(carousel)?,
                index: 0,
            },
        ),
    };
    Ok(handlers)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS_100: Duration = Duration::from_millis(100);
    const SEC_1: Duration = Duration::from_secs(1);

    const PAGE: &str = r#"{
        "viewport_height": 1000,
        "seed": 7,
        "effects": [
            { "name": "title", "type": "glitch", "words": ["forth", "we", "win"] },
            { "name": "lore", "type": "scramble", "paragraph": "lore-p", "text": "Hold", "duration": 0.4 }
        ],
        "regions": [
            { "trigger": "hero", "top": 0, "height": 800, "start": "top top", "action": "effect", "effect": "title", "delay": 0 },
            { "trigger": "lore", "top": 2000, "height": 500, "action": "effect", "effect": "lore", "delay": 0 }
        ],
        "hovers": [
            { "name": "cta", "type": "scramble", "text": "ENLIST", "duration": 0.5 }
        ]
    }"#;

    fn scene() -> Scene {
        Scene::from_json_str(PAGE).expect("valid page")
    }

    #[test]
    fn nothing_fires_before_load() {
        let mut scene = scene();
        scene.frame(1800.0, MS_100);
        assert_eq!(scene.effect_state("lore"), Some(PlaybackState::Idle));
        assert!(scene.observe_header_opacity(1.0));
        assert_eq!(scene.effect_state("title"), Some(PlaybackState::Reversing));
        assert_eq!(scene.effect_state("lore"), Some(PlaybackState::Playing));
    }

    #[test]
    fn typewriter_reveals_paragraph() {
        let mut scene = scene();
        scene.observe_header_opacity(1.0);
        scene.frame(1500.0, Duration::ZERO);
        let out = scene.frame(1500.0, Duration::from_millis(200));
        assert_eq!(out.texts["lore-p"], "Ho");
        let out = scene.frame(1500.0, SEC_1);
        assert_eq!(out.texts["lore-p"], "Hold");
    }

    #[test]
    fn title_reverses_on_leave() {
        let mut scene = scene();
        scene.observe_header_opacity(1.0);
        assert_eq!(scene.effect_state("title"), Some(PlaybackState::Playing));
        scene.frame(0.0, SEC_1);
        let shown = scene.frame(0.0, SEC_1);
        let forth = TargetId::new("forth");
        assert!((shown.poses["title"].get(&forth, Property::Opacity) - 1.0).abs() < 1e-4);
        scene.frame(900.0, Duration::ZERO);
        assert_eq!(scene.effect_state("title"), Some(PlaybackState::Reversing));
        let hidden = scene.frame(900.0, SEC_1);
        assert!(hidden.poses["title"].get(&forth, Property::Opacity).abs() < 1e-4);
    }

    #[test]
    fn hover_scramble_text_is_reported() {
        let mut scene = scene();
        let out = scene.frame(0.0, MS_100);
        assert_eq!(out.texts["cta"], "ENLIST");
        scene.pointer_enter("cta");
        scene.pointer_leave("cta");
        scene.pointer_enter("nobody");
        let out = scene.frame(0.0, MS_100);
        assert_eq!(out.texts["cta"], "ENLIST");
    }

    #[test]
    fn headline_without_words_fails_to_build() {
        let page = PAGE.replace(r#""words": ["forth", "we", "win"]"#, r#""words": []"#);
        assert!(matches!(
            Scene::from_json_str(&page),
            Err(ConfigurationError::EmptyTargets { .. })
        ));
    }

    #[test]
    fn navigate_unknown_carousel_is_a_noop() {
        let mut scene = scene();
        assert_eq!(scene.navigate("armory", Step::Next), Transition::NoOp);
    }
}
