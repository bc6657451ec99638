//! Card poses for the entrance choreography and drag feedback.
//!
//! A pose places a card's centre at a percentage of the board plus rotation,
//! scale and opacity. Cards start as an invisible pile, settle into a visible
//! pile, and are thrown to their layout positions once the entrance latch fires.

use std::time::Duration;

use super::easing::{Spring, CARD_SPRING};
use super::table::Position;
use crate::gallery::EntrancePhase;

/// Height of the caption strip under each photo, in layout units.
pub const CAPTION_STRIP: u32 = 40;

/// Delay before the first card leaves the pile.
pub const SCATTER_BASE_DELAY: Duration = Duration::from_millis(300);

/// Extra delay per card, in board order.
pub const SCATTER_STAGGER: Duration = Duration::from_millis(150);

/// Scale of the card under the pointer while dragging.
pub const DRAG_SCALE: f64 = 1.15;

/// Scale of a hovered card.
pub const HOVER_SCALE: f64 = 1.05;

/// Delays of the three decorative tape strips after the latch fires.
pub const TAPE_DELAYS: [Duration; 3] = [
    Duration::from_millis(2000),
    Duration::from_millis(2200),
    Duration::from_millis(2400),
];

/// Fade duration of a tape strip.
pub const TAPE_FADE: Duration = Duration::from_millis(500);

/// Resting opacity of a tape strip.
pub const TAPE_OPACITY: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub left_pct: f64,
    pub top_pct: f64,
    pub rotation: f64,
    pub scale: f64,
    pub opacity: f64,
}

impl Pose {
    /// Before the board is shown at all.
    pub const INITIAL: Pose = Pose {
        left_pct: 50.0,
        top_pct: 50.0,
        rotation: 0.0,
        scale: 0.5,
        opacity: 0.0,
    };

    /// Visible pile waiting for the entrance.
    pub const STACKED: Pose = Pose {
        left_pct: 50.0,
        top_pct: 50.0,
        rotation: 0.0,
        scale: 0.8,
        opacity: 1.0,
    };

    pub fn scattered(position: &Position) -> Self {
        Self {
            left_pct: f64::from(position.x),
            top_pct: f64::from(position.y),
            rotation: f64::from(position.rotation),
            scale: 1.0,
            opacity: 1.0,
        }
    }

    /// Resting pose of a card for the current entrance phase.
    pub fn target(position: &Position, phase: EntrancePhase) -> Self {
        match phase {
            EntrancePhase::Stacked => Self::STACKED,
            EntrancePhase::Scattered => Self::scattered(position),
        }
    }

    /// Linear blend; `t` may leave `[0, 1]` for spring overshoot, opacity is clamped.
    pub fn lerp(&self, other: &Pose, t: f64) -> Pose {
        let mix = |a: f64, b: f64| a + (b - a) * t;
        Pose {
            left_pct: mix(self.left_pct, other.left_pct),
            top_pct: mix(self.top_pct, other.top_pct),
            rotation: mix(self.rotation, other.rotation),
            scale: mix(self.scale, other.scale),
            opacity: mix(self.opacity, other.opacity).clamp(0.0, 1.0),
        }
    }

    /// Card centre in board pixels.
    pub fn anchor(&self, board_width: f64, board_height: f64) -> (f64, f64) {
        (
            self.left_pct / 100.0 * board_width,
            self.top_pct / 100.0 * board_height,
        )
    }
}

/// Outer size of a card: the photo plus its caption strip.
pub fn card_size(position: &Position) -> (u32, u32) {
    (position.width, position.height + CAPTION_STRIP)
}

/// When the card at `index` starts moving after a pose change.
pub fn transition_delay(index: usize, phase: EntrancePhase) -> Duration {
    match phase {
        EntrancePhase::Stacked => Duration::ZERO,
        EntrancePhase::Scattered => {
            SCATTER_BASE_DELAY + SCATTER_STAGGER * u32::try_from(index).unwrap_or(u32::MAX)
        }
    }
}

/// Opacity of tape strip `strip` at `since_latch` after the entrance fired.
pub fn tape_opacity(strip: usize, since_latch: Duration) -> f64 {
    let Some(delay) = TAPE_DELAYS.get(strip) else {
        return 0.0;
    };
    let Some(elapsed) = since_latch.checked_sub(*delay) else {
        return 0.0;
    };
    let t = (elapsed.as_secs_f64() / TAPE_FADE.as_secs_f64()).min(1.0);
    TAPE_OPACITY * t
}

/// A pose change in flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: Pose,
    pub to: Pose,
    pub delay: Duration,
    pub spring: Spring,
}

impl Transition {
    pub fn new(from: Pose, to: Pose, delay: Duration) -> Self {
        Self {
            from,
            to,
            delay,
            spring: CARD_SPRING,
        }
    }

    /// A transition already at rest on `pose`.
    pub fn at_rest(pose: Pose) -> Self {
        Self::new(pose, pose, Duration::ZERO)
    }

    pub fn with_spring(mut self, spring: Spring) -> Self {
        self.spring = spring;
        self
    }

    fn spring_time(&self, elapsed: Duration) -> f64 {
        elapsed
            .checked_sub(self.delay)
            .map(|t| t.as_secs_f64())
            .unwrap_or(0.0)
    }

    pub fn sample(&self, elapsed: Duration) -> Pose {
        let t = self.spring_time(elapsed);
        if t <= 0.0 {
            return self.from;
        }
        if self.spring.is_settled(t) {
            return self.to;
        }
        self.from.lerp(&self.to, self.spring.progress(t))
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        self.from == self.to || self.spring.is_settled(self.spring_time(elapsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn scattered_pose_uses_layout_values() {
        let pose = Pose::scattered(&Position::new(9, 13, -8, 240, 180));
        assert_eq!(pose.left_pct, 9.0);
        assert_eq!(pose.top_pct, 13.0);
        assert_eq!(pose.rotation, -8.0);
        assert_eq!(pose.scale, 1.0);
    }

    #[test]
    fn stacked_target_ignores_position() {
        let position = Position::new(88, 13, 7, 225, 170);
        assert_eq!(Pose::target(&position, EntrancePhase::Stacked), Pose::STACKED);
        assert_eq!(
            Pose::target(&position, EntrancePhase::Scattered),
            Pose::scattered(&position)
        );
    }

    #[test]
    fn card_size_adds_caption_strip() {
        assert_eq!(card_size(&Position::new(0, 0, 0, 250, 185)), (250, 225));
    }

    #[test]
    fn scatter_is_staggered_by_index() {
        assert_eq!(transition_delay(0, EntrancePhase::Scattered), Duration::from_millis(300));
        assert_eq!(transition_delay(3, EntrancePhase::Scattered), Duration::from_millis(750));
        assert_eq!(transition_delay(5, EntrancePhase::Stacked), Duration::ZERO);
    }

    #[test]
    fn anchor_scales_percentages_to_pixels() {
        let pose = Pose::scattered(&Position::new(25, 50, 0, 10, 10));
        let (x, y) = pose.anchor(1200.0, 600.0);
        assert!(approx(x, 300.0));
        assert!(approx(y, 300.0));
    }

    #[test]
    fn lerp_clamps_opacity_only() {
        let blended = Pose::INITIAL.lerp(&Pose::STACKED, 1.2);
        assert_eq!(blended.opacity, 1.0);
        assert!(approx(blended.scale, 0.86));
    }

    #[test]
    fn transition_waits_for_delay_then_settles() {
        let to = Pose::scattered(&Position::new(62, 12, -3, 235, 180));
        let transition = Transition::new(Pose::STACKED, to, Duration::from_millis(450));

        assert_eq!(transition.sample(Duration::from_millis(100)), Pose::STACKED);
        let mid = transition.sample(Duration::from_millis(800));
        assert!(mid.left_pct > 50.0 && mid.left_pct < 62.0);
        assert!(!transition.is_finished(Duration::from_millis(800)));

        assert_eq!(transition.sample(Duration::from_secs(10)), to);
        assert!(transition.is_finished(Duration::from_secs(10)));
    }

    #[test]
    fn resting_transition_is_finished_immediately() {
        let transition = Transition::at_rest(Pose::STACKED);
        assert!(transition.is_finished(Duration::ZERO));
        assert_eq!(transition.sample(Duration::ZERO), Pose::STACKED);
    }

    #[test]
    fn tapes_fade_in_after_their_delay() {
        assert_eq!(tape_opacity(0, Duration::from_millis(1999)), 0.0);
        assert!(approx(tape_opacity(0, Duration::from_millis(2250)), 0.4));
        assert!(approx(tape_opacity(2, Duration::from_secs(5)), TAPE_OPACITY));
        assert_eq!(tape_opacity(7, Duration::from_secs(5)), 0.0);
    }
}
