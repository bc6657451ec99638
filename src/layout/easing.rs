//! Timing curves for card and splash motion.

/// CSS-style cubic Bézier timing function through (0,0), (x1,y1), (x2,y2), (1,1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

/// Curve of the splash screen's time-based progress.
pub const SPLASH_EASE: CubicBezier = CubicBezier::new(0.22, 1.0, 0.36, 1.0);

impl CubicBezier {
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    fn coefficients(p1: f64, p2: f64) -> (f64, f64, f64) {
        let c = 3.0 * p1;
        let b = 3.0 * (p2 - p1) - c;
        let a = 1.0 - c - b;
        (a, b, c)
    }

    fn sample(p1: f64, p2: f64, t: f64) -> f64 {
        let (a, b, c) = Self::coefficients(p1, p2);
        ((a * t + b) * t + c) * t
    }

    fn slope_x(&self, t: f64) -> f64 {
        let (a, b, c) = Self::coefficients(self.x1, self.x2);
        (3.0 * a * t + 2.0 * b) * t + c
    }

    fn t_for_x(&self, x: f64) -> f64 {
        let mut t = x;
        for _ in 0..8 {
            let error = Self::sample(self.x1, self.x2, t) - x;
            if error.abs() < 1e-7 {
                return t;
            }
            let slope = self.slope_x(t);
            if slope.abs() < 1e-6 {
                break;
            }
            t -= error / slope;
        }

        // Newton stalled; bisect.
        let (mut lo, mut hi) = (0.0, 1.0);
        t = x;
        for _ in 0..64 {
            let value = Self::sample(self.x1, self.x2, t);
            if (value - x).abs() < 1e-7 {
                break;
            }
            if value < x {
                lo = t;
            } else {
                hi = t;
            }
            t = (lo + hi) / 2.0;
        }
        t
    }

    /// Eased output for normalised time `x` (clamped to `[0, 1]`).
    pub fn ease(&self, x: f64) -> f64 {
        let x = x.clamp(0.0, 1.0);
        if x == 0.0 || x == 1.0 {
            return x;
        }
        Self::sample(self.y1, self.y2, self.t_for_x(x))
    }
}

/// Damped spring driving a value from 0 to 1 with no initial velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
}

/// Spring used when cards fly between the pile and their layout positions.
pub const CARD_SPRING: Spring = Spring::new(50.0, 15.0);

/// Spring used by the enlarged photo view.
pub const LIGHTBOX_SPRING: Spring = Spring::new(100.0, 25.0);

const REST_EPSILON: f64 = 0.001;

impl Spring {
    pub const fn new(stiffness: f64, damping: f64) -> Self {
        Self {
            stiffness,
            damping,
            mass: 1.0,
        }
    }

    /// Progress towards the target after `t` seconds; 0 at rest start, 1 at target.
    pub fn progress(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        let omega = (self.stiffness / self.mass).sqrt();
        let zeta = self.damping / (2.0 * (self.stiffness * self.mass).sqrt());
        // Displacement from the target, starting at -1 with zero velocity.
        let x0 = -1.0;
        let displacement = if zeta < 1.0 {
            let omega_d = omega * (1.0 - zeta * zeta).sqrt();
            let envelope = (-zeta * omega * t).exp();
            envelope * (x0 * (omega_d * t).cos() + (zeta * omega * x0 / omega_d) * (omega_d * t).sin())
        } else if (zeta - 1.0).abs() < f64::EPSILON {
            (-omega * t).exp() * (x0 + omega * x0 * t)
        } else {
            let root = (zeta * zeta - 1.0).sqrt();
            let r1 = -omega * (zeta - root);
            let r2 = -omega * (zeta + root);
            let c2 = -r1 * x0 / (r2 - r1);
            let c1 = x0 - c2;
            c1 * (r1 * t).exp() + c2 * (r2 * t).exp()
        };
        1.0 + displacement
    }

    /// Whether the spring has come to rest `t` seconds in.
    pub fn is_settled(&self, t: f64) -> bool {
        if t <= 0.0 {
            return false;
        }
        let step = 1.0 / 60.0;
        (1.0 - self.progress(t)).abs() < REST_EPSILON
            && (self.progress(t + step) - self.progress(t)).abs() < REST_EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bezier_endpoints_are_fixed() {
        assert_eq!(SPLASH_EASE.ease(0.0), 0.0);
        assert_eq!(SPLASH_EASE.ease(1.0), 1.0);
        assert_eq!(SPLASH_EASE.ease(-2.0), 0.0);
        assert_eq!(SPLASH_EASE.ease(3.0), 1.0);
    }

    #[test]
    fn linear_bezier_is_identity() {
        let linear = CubicBezier::new(0.0, 0.0, 1.0, 1.0);
        for step in 1..10 {
            let x = f64::from(step) / 10.0;
            assert!((linear.ease(x) - x).abs() < 1e-4, "x = {x}");
        }
    }

    #[test]
    fn splash_ease_front_loads_progress() {
        let half = SPLASH_EASE.ease(0.5);
        assert!(half > 0.85, "half = {half}");
        let mut previous = 0.0;
        for step in 1..=20 {
            let value = SPLASH_EASE.ease(f64::from(step) / 20.0);
            assert!(value >= previous);
            previous = value;
        }
    }

    #[test]
    fn overdamped_card_spring_rises_without_overshoot() {
        assert_eq!(CARD_SPRING.progress(0.0), 0.0);
        let mut previous = 0.0;
        for step in 1..=300 {
            let value = CARD_SPRING.progress(f64::from(step) / 60.0);
            assert!(value >= previous - 1e-12);
            assert!(value <= 1.0 + 1e-9);
            previous = value;
        }
        assert!((previous - 1.0).abs() < 0.01);
    }

    #[test]
    fn underdamped_spring_overshoots_then_settles() {
        let bouncy = Spring::new(200.0, 5.0);
        let peak = (1..120)
            .map(|step| bouncy.progress(f64::from(step) / 60.0))
            .fold(0.0, f64::max);
        assert!(peak > 1.0);
        assert!(bouncy.is_settled(8.0));
        assert!(!bouncy.is_settled(0.1));
    }

    #[test]
    fn critically_damped_spring_converges() {
        let critical = Spring::new(100.0, 20.0);
        assert!((critical.progress(2.0) - 1.0).abs() < 0.01);
    }
}
