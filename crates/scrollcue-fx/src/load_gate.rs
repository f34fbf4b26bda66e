#![forbid(unsafe_code)]

//! Load gate: fires once when the loading animation has finished.

use tracing::info;

/// Watches an opacity that reaches 1 when the intro animation ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadGate {
    loaded: bool,
}

impl LoadGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed an observed opacity. Returns `true` exactly once, on the first
    /// observation at or above 1.
    pub fn observe(&mut self, opacity: f32) -> bool {
        if self.loaded || opacity.is_nan() || opacity < 1.0 {
            return false;
        }
        self.loaded = true;
        info!("page loaded");
        true
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once() {
        let mut gate = LoadGate::new();
        assert!(!gate.observe(0.2));
        assert!(!gate.observe(f32::NAN));
        assert!(gate.observe(1.0));
        assert!(!gate.observe(1.0));
        assert!(gate.is_loaded());
    }
}
