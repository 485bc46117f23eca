// SPDX-License-Identifier: MIT OR Apache-2.0
//! Easing functions used to shape time along a curve leg.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Newton iterations before falling back to bisection
const BEZIER_NEWTON_ITERATIONS: usize = 8;
/// Bisection iterations for the fallback solver
const BEZIER_BISECTION_ITERATIONS: usize = 32;
/// Accepted error when solving `x(s) = t`
const BEZIER_EPSILON: f32 = 1e-6;

/// Easing function mapping linear time to eased progress
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum Easing {
    /// Constant speed
    Linear,
    /// Slow start, cubic-bezier(0.42, 0, 1, 1)
    EaseIn,
    /// Slow end, cubic-bezier(0, 0, 0.58, 1)
    EaseOut,
    /// Slow start and end, cubic-bezier(0.42, 0, 0.58, 1)
    #[default]
    EaseInOut,
    /// Quadratic ease in
    EaseInQuad,
    /// Quadratic ease out
    EaseOutQuad,
    /// Quadratic ease in-out
    EaseInOutQuad,
    /// Cubic ease in
    EaseInCubic,
    /// Cubic ease out
    EaseOutCubic,
    /// Cubic ease in-out
    EaseInOutCubic,
    /// Sine ease in
    EaseInSine,
    /// Sine ease out
    EaseOutSine,
    /// Sine ease in-out
    EaseInOutSine,
    /// Elastic ease out (overshoots)
    EaseOutElastic,
    /// Bouncing ease out
    EaseOutBounce,
    /// Custom timing curve with control points (x1, y1) and (x2, y2)
    CubicBezier {
        /// First control point x, clamped to [0, 1]
        x1: f32,
        /// First control point y
        y1: f32,
        /// Second control point x, clamped to [0, 1]
        x2: f32,
        /// Second control point y
        y2: f32,
    },
}

impl Easing {
    /// Evaluate the easing at linear time `t`.
    ///
    /// `t` is clamped to [0, 1]. Every variant maps 0 to 0 and 1 to 1;
    /// elastic and custom bezier curves may leave [0, 1] in between.
    pub fn apply(&self, t: f32) -> f32 {
        if t.is_nan() {
            return 0.0;
        }
        let t = t.clamp(0.0, 1.0);

        match *self {
            Easing::Linear => t,
            Easing::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            Easing::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
            Easing::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::EaseInCubic => t * t * t,
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::EaseInSine => 1.0 - (t * PI / 2.0).cos(),
            Easing::EaseOutSine => (t * PI / 2.0).sin(),
            Easing::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Easing::EaseOutElastic => ease_out_elastic(t),
            Easing::EaseOutBounce => ease_out_bounce(t),
            Easing::CubicBezier { x1, y1, x2, y2 } => {
                cubic_bezier(x1.clamp(0.0, 1.0), y1, x2.clamp(0.0, 1.0), y2, t)
            }
        }
    }

    /// Whether the curve can leave [0, 1] between its endpoints
    pub fn overshoots(&self) -> bool {
        match *self {
            Easing::EaseOutElastic => true,
            Easing::CubicBezier { y1, y2, .. } => !(0.0..=1.0).contains(&y1) || !(0.0..=1.0).contains(&y2),
            _ => false,
        }
    }
}

/// One coordinate of a cubic bezier with endpoints 0 and 1
fn bezier_coord(p1: f32, p2: f32, s: f32) -> f32 {
    let ms = 1.0 - s;
    3.0 * ms * ms * s * p1 + 3.0 * ms * s * s * p2 + s * s * s
}

fn bezier_slope(p1: f32, p2: f32, s: f32) -> f32 {
    let ms = 1.0 - s;
    3.0 * ms * ms * p1 + 6.0 * ms * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
}

/// Evaluate a CSS-style timing curve: solve `x(s) = t`, return `y(s)`
fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, t: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    let mut s = t;
    for _ in 0..BEZIER_NEWTON_ITERATIONS {
        let err = bezier_coord(x1, x2, s) - t;
        if err.abs() < BEZIER_EPSILON {
            return bezier_coord(y1, y2, s);
        }
        let slope = bezier_slope(x1, x2, s);
        if slope.abs() < BEZIER_EPSILON {
            break;
        }
        s -= err / slope;
    }

    // x(s) is monotonic for control x in [0, 1], so bisection always converges
    let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
    s = t;
    for _ in 0..BEZIER_BISECTION_ITERATIONS {
        let x = bezier_coord(x1, x2, s);
        if (x - t).abs() < BEZIER_EPSILON {
            break;
        }
        if x < t {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }
    bezier_coord(y1, y2, s)
}

fn ease_out_elastic(t: f32) -> f32 {
    if t == 0.0 {
        0.0
    } else if t == 1.0 {
        1.0
    } else {
        let c4 = (2.0 * PI) / 3.0;
        2.0_f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
    }
}

fn ease_out_bounce(t: f32) -> f32 {
    let n1 = 7.5625;
    let d1 = 2.75;

    if t < 1.0 / d1 {
        n1 * t * t
    } else if t < 2.0 / d1 {
        let t = t - 1.5 / d1;
        n1 * t * t + 0.75
    } else if t < 2.5 / d1 {
        let t = t - 2.25 / d1;
        n1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / d1;
        n1 * t * t + 0.984375
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 16] = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::EaseInQuad,
        Easing::EaseOutQuad,
        Easing::EaseInOutQuad,
        Easing::EaseInCubic,
        Easing::EaseOutCubic,
        Easing::EaseInOutCubic,
        Easing::EaseInSine,
        Easing::EaseOutSine,
        Easing::EaseInOutSine,
        Easing::EaseOutElastic,
        Easing::EaseOutBounce,
        Easing::CubicBezier { x1: 0.25, y1: 0.1, x2: 0.25, y2: 1.0 },
    ];

    #[test]
    fn test_endpoints() {
        for easing in ALL {
            assert!(easing.apply(0.0).abs() < 1e-4, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-4, "{easing:?} at 1");
        }
    }

    #[test]
    fn test_linear() {
        let easing = Easing::Linear;
        assert_eq!(easing.apply(0.25), 0.25);
        assert_eq!(easing.apply(0.5), 0.5);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(Easing::Linear.apply(-0.5), 0.0);
        assert_eq!(Easing::Linear.apply(1.5), 1.0);
        assert_eq!(Easing::EaseIn.apply(f32::NAN), 0.0);
    }

    #[test]
    fn test_ease_in_out_is_symmetric() {
        let easing = Easing::EaseInOut;
        assert!((easing.apply(0.5) - 0.5).abs() < 1e-3);
        let a = easing.apply(0.2);
        let b = easing.apply(0.8);
        assert!((a + b - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_ease_in_starts_slow() {
        assert!(Easing::EaseIn.apply(0.25) < 0.25);
        assert!(Easing::EaseOut.apply(0.25) > 0.25);
    }

    #[test]
    fn test_bezier_is_monotonic() {
        let easing = Easing::EaseInOut;
        let mut last = 0.0;
        for i in 1..=100 {
            let v = easing.apply(i as f32 / 100.0);
            assert!(v >= last - 1e-5);
            last = v;
        }
    }

    #[test]
    fn test_overshoots() {
        assert!(Easing::EaseOutElastic.overshoots());
        assert!(Easing::CubicBezier { x1: 0.3, y1: -0.5, x2: 0.7, y2: 1.5 }.overshoots());
        assert!(!Easing::EaseInOut.overshoots());
    }
}
