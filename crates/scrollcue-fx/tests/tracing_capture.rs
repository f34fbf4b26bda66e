#![forbid(unsafe_code)]

//! Structured log output of scene and carousel decisions.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use scrollcue_core::carousel::Step;
use scrollcue_fx::Scene;
use tracing::Level;
use tracing_subscriber::layer::{Context, SubscriberExt};

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: Level,
    message: String,
    fields: Vec<(String, String)>,
}

impl CapturedEvent {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A Layer that records every event.
struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push((field.name().to_string(), format!("{value:?}")));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.fields.push((field.name().to_string(), value.to_string()));
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor {
            message: String::new(),
            fields: Vec::new(),
        };
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

fn capture<F: FnOnce()>(f: F) -> Vec<CapturedEvent> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(EventCapture {
        events: events.clone(),
    });
    tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    captured
}

const PAGE: &str = r#"{
    "viewport_height": 1000,
    "seed": 3,
    "regions": [
        { "trigger": "armory", "top": 0, "height": 1000, "start": "top top",
          "action": "carousel_start", "carousel": "weapons" }
    ],
    "carousels": [
        { "name": "weapons", "items": [
            { "name": "Rifle", "slices": ["r1", "r2"] },
            { "name": "Launcher", "slices": ["l1", "l2"] }
        ] }
    ]
}"#;

// ============================================================================
// Tests
// ============================================================================

#[test]
fn scene_build_is_logged_at_info() {
    let events = capture(|| {
        Scene::from_json_str(PAGE).expect("valid page");
    });
    let built = events
        .iter()
        .find(|e| e.message == "scene built")
        .expect("scene built event");
    assert_eq!(built.level, Level::INFO);
    assert_eq!(built.field("regions"), Some("1"));
    assert_eq!(built.field("carousels"), Some("1"));
    assert!(events.iter().any(|e| e.message == "region registered"));
}

#[test]
fn carousel_transition_names_both_items() {
    let events = capture(|| {
        let mut scene = Scene::from_json_str(PAGE).expect("valid page");
        scene.observe_header_opacity(1.0);
        scene.frame(0.0, Duration::from_secs(2));
        scene.navigate("weapons", Step::Next);
    });
    let transitions: Vec<_> = events
        .iter()
        .filter(|e| e.message == "carousel transition")
        .collect();
    assert_eq!(transitions.len(), 2);
    assert_eq!(transitions[0].field("to"), Some("Rifle"));
    assert_eq!(transitions[1].field("from"), Some("Rifle"));
    assert_eq!(transitions[1].field("to"), Some("Launcher"));
    assert!(transitions.iter().all(|e| e.level == Level::DEBUG));
}

#[test]
fn unknown_hover_target_warns() {
    let events = capture(|| {
        let mut scene = Scene::from_json_str(PAGE).expect("valid page");
        scene.pointer_enter("ghost");
    });
    let warning = events
        .iter()
        .find(|e| e.level == Level::WARN)
        .expect("warning");
    assert_eq!(warning.field("hover"), Some("ghost"));
}

#[test]
fn unknown_carousel_navigation_warns() {
    let events = capture(|| {
        let mut scene = Scene::from_json_str(PAGE).expect("valid page");
        scene.navigate("factions", Step::Next);
    });
    let warning = events
        .iter()
        .find(|e| e.level == Level::WARN)
        .expect("warning");
    assert_eq!(warning.field("carousel"), Some("factions"));
}
