#![forbid(unsafe_code)]

//! Text effects: scramble resolve and typewriter reveal.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use scrollcue_core::animation::{Animation, Fade};

/// Glyphs used for unresolved characters unless configured otherwise.
pub const DEFAULT_CHARSET: &str = "F0RTH3W1N2023 ";

/// Text resolved left to right out of random glyphs.
#[derive(Debug, Clone)]
pub struct ScrambleText {
    original: Vec<char>,
    charset: Vec<char>,
    rng: StdRng,
}

impl ScrambleText {
    /// Scramble `text` with the default charset.
    pub fn new(text: &str) -> Self {
        Self {
            original: text.chars().collect(),
            charset: DEFAULT_CHARSET.chars().collect(),
            rng: StdRng::seed_from_u64(text.len() as u64),
        }
    }

    /// Draw glyphs from `charset` instead (builder). Empty keeps the default.
    #[must_use]
    pub fn with_charset(mut self, charset: &str) -> Self {
        if !charset.is_empty() {
            self.charset = charset.chars().collect();
        }
        self
    }

    /// Reseed the glyph source (builder).
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// The fully resolved text.
    #[must_use]
    pub fn original(&self) -> String {
        self.original.iter().collect()
    }

    /// Text at `progress` in [0, 1]: a resolved prefix followed by random
    /// glyphs. Whitespace is never scrambled.
    pub fn render(&mut self, progress: f32) -> String {
        let resolved = resolved_len(self.original.len(), progress);
        let mut out: String = self.original[..resolved].iter().collect();
        for &c in &self.original[resolved..] {
            if c.is_whitespace() {
                out.push(c);
            } else {
                out.push(self.charset.choose(&mut self.rng).copied().unwrap_or(c));
            }
        }
        out
    }
}

/// Paragraph text typed in from empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypewriterReveal {
    text: Vec<char>,
}

impl TypewriterReveal {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.chars().collect(),
        }
    }

    /// Visible prefix at `progress` in [0, 1].
    #[must_use]
    pub fn render(&self, progress: f32) -> String {
        self.text[..resolved_len(self.text.len(), progress)]
            .iter()
            .collect()
    }
}

/// Scramble played while the pointer is over an element.
///
/// Entering plays from the start; leaving pins back to the start, which shows
/// the original text.
#[derive(Debug, Clone)]
pub struct HoverScramble {
    text: ScrambleText,
    fade: Fade,
    playing: bool,
}

impl HoverScramble {
    /// Resolve over `duration` on hover.
    pub fn new(text: ScrambleText, duration: Duration) -> Self {
        Self {
            text,
            fade: Fade::new(duration),
            playing: false,
        }
    }

    pub fn pointer_enter(&mut self) {
        self.playing = true;
    }

    pub fn pointer_leave(&mut self) {
        self.playing = false;
        self.fade.reset();
    }

    pub fn tick(&mut self, dt: Duration) {
        if self.playing {
            self.fade.tick(dt);
            if self.fade.is_complete() {
                self.playing = false;
            }
        }
    }

    /// Whether a resolve is in progress.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Text to paint this frame.
    pub fn text(&mut self) -> String {
        let progress = self.fade.value();
        if progress <= 0.0 || progress >= 1.0 {
            return self.text.original();
        }
        self.text.render(progress)
    }
}

fn resolved_len(len: usize, progress: f32) -> usize {
    let progress = if progress.is_finite() { progress.clamp(0.0, 1.0) } else { 0.0 };
    ((len as f32 * progress).floor() as usize).min(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scramble_endpoints() {
        let mut s = ScrambleText::new("HOLD THE LINE").with_seed(7);
        assert_eq!(s.render(1.0), "HOLD THE LINE");
        let start = s.render(0.0);
        assert_eq!(start.chars().count(), 13);
        assert_eq!(start.chars().nth(4), Some(' '));
        assert!(start.chars().all(|c| DEFAULT_CHARSET.contains(c)));
    }

    #[test]
    fn scramble_resolves_prefix() {
        let mut s = ScrambleText::new("ABCDEFGHIJ").with_charset("#");
        assert_eq!(s.render(0.5), "ABCDE#####");
    }

    #[test]
    fn typewriter_grows_from_empty() {
        let t = TypewriterReveal::new("Forth");
        assert_eq!(t.render(0.0), "");
        assert_eq!(t.render(0.4), "Fo");
        assert_eq!(t.render(1.0), "Forth");
        assert_eq!(t.render(f32::NAN), "");
    }

    #[test]
    fn hover_scramble_resets_on_leave() {
        let mut hover = HoverScramble::new(
            ScrambleText::new("ENLIST").with_charset("*"),
            Duration::from_secs(1),
        );
        assert_eq!(hover.text(), "ENLIST");
        hover.pointer_enter();
        hover.tick(Duration::from_millis(500));
        assert_eq!(hover.text(), "ENL***");
        hover.pointer_leave();
        assert!(!hover.is_playing());
        assert_eq!(hover.text(), "ENLIST");
        hover.pointer_enter();
        hover.tick(Duration::from_secs(2));
        assert!(!hover.is_playing());
        assert_eq!(hover.text(), "ENLIST");
    }
}
