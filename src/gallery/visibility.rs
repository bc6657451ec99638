/// Fraction of the board that must be on screen before the entrance plays.
pub const VISIBILITY_THRESHOLD: f64 = 0.15;

/// Portion of a box `[top, top + height]` inside a viewport `[0, viewport_height]`.
pub fn visible_fraction(top: f64, height: f64, viewport_height: f64) -> f64 {
    if !(height.is_finite() && top.is_finite() && viewport_height.is_finite()) || height <= 0.0 {
        return 0.0;
    }
    let start = top.max(0.0);
    let end = (top + height).min(viewport_height);
    ((end - start) / height).clamp(0.0, 1.0)
}

/// Turns a stream of visibility fractions into rising-edge notifications.
#[derive(Debug, Clone)]
pub struct VisibilityWatch {
    threshold: f64,
    visible: bool,
}

impl VisibilityWatch {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            visible: false,
        }
    }

    /// Returns true only when the fraction crosses the threshold upwards.
    pub fn observe(&mut self, fraction: f64) -> bool {
        let now_visible = fraction >= self.threshold && fraction > 0.0;
        let rising = now_visible && !self.visible;
        self.visible = now_visible;
        rising
    }

    #[cfg(test)]
    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl Default for VisibilityWatch {
    fn default() -> Self {
        Self::new(VISIBILITY_THRESHOLD)
    }
}
