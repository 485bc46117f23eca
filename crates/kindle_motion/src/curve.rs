// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animation curves: duration plus easing, or a physical spring.
//!
//! A [`Curve`] is the timing descriptor for one leg of an effect. It never
//! holds a value itself; it only answers "how far along (0 to 1) is a leg
//! after `elapsed` seconds, and is it done".
//!
//! ## Spring model
//!
//! Springs use the analytic step response of a damped harmonic oscillator:
//!
//! ```text
//! x''(t) + 2ζω₀x'(t) + ω₀²x(t) = ω₀²,  x(0) = 0, x'(0) = 0
//! ```
//!
//! with `ω₀ = 2π / response` and `ζ = damping_fraction`. A spring counts as
//! settled once its decay envelope drops below [`SPRING_SETTLE_THRESHOLD`],
//! which gives every spring a finite settle duration.

use crate::easing::Easing;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Default leg duration in seconds, used by the parameterless presets
pub const DEFAULT_DURATION: f32 = 0.35;

/// Distance from the target under which a spring counts as settled
pub const SPRING_SETTLE_THRESHOLD: f32 = 0.001;

/// Smallest accepted spring response, in seconds
const MIN_RESPONSE: f32 = 0.01;
/// Smallest accepted damping fraction; an undamped spring would never settle
const MIN_DAMPING: f32 = 0.01;
/// Band around ζ = 1 treated as critically damped
const CRITICAL_BAND: f32 = 1e-3;

/// Physical spring parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "SpringFields")]
pub struct Spring {
    /// Period of the undamped oscillation, in seconds
    pub response: f32,
    /// Damping ratio. Below 1 bounces, 1 is critical, above 1 is overdamped
    pub damping_fraction: f32,
}

#[derive(Deserialize)]
struct SpringFields {
    response: f32,
    damping_fraction: f32,
}

impl From<SpringFields> for Spring {
    fn from(fields: SpringFields) -> Self {
        Self::new(fields.response, fields.damping_fraction)
    }
}

impl Default for Spring {
    fn default() -> Self {
        Self {
            response: 0.55,
            damping_fraction: 0.825,
        }
    }
}

impl Spring {
    /// Create a spring, normalizing degenerate parameters
    pub fn new(response: f32, damping_fraction: f32) -> Self {
        Self {
            response: if response.is_finite() { response.max(MIN_RESPONSE) } else { 0.55 },
            damping_fraction: if damping_fraction.is_finite() {
                damping_fraction.max(MIN_DAMPING)
            } else {
                0.825
            },
        }
    }

    /// A visibly bouncy spring
    pub fn bouncy() -> Self {
        Self::new(0.5, 0.7)
    }

    /// A critically damped spring with no overshoot
    pub fn smooth() -> Self {
        Self::new(0.5, 1.0)
    }

    fn omega(&self) -> f32 {
        TAU / self.response.max(MIN_RESPONSE)
    }

    fn zeta(&self) -> f32 {
        self.damping_fraction.max(MIN_DAMPING)
    }

    /// Normalized position after `t` seconds, starting at rest at 0 and
    /// settling on 1. Underdamped springs overshoot 1.
    pub fn position(&self, t: f32) -> f32 {
        if t <= 0.0 {
            return 0.0;
        }
        let omega = self.omega();
        let zeta = self.zeta();

        if (zeta - 1.0).abs() < CRITICAL_BAND {
            let decay = (-omega * t).exp();
            1.0 - decay * (1.0 + omega * t)
        } else if zeta < 1.0 {
            let root = (1.0 - zeta * zeta).sqrt();
            let omega_d = omega * root;
            let decay = (-zeta * omega * t).exp();
            1.0 - decay * ((omega_d * t).cos() + (zeta / root) * (omega_d * t).sin())
        } else {
            // cosh/sinh folded into the decay so large γt cannot overflow
            let root = (zeta * zeta - 1.0).sqrt();
            let gamma = omega * root;
            let slow = (-(zeta * omega - gamma) * t).exp();
            let fast = (-(zeta * omega + gamma) * t).exp();
            1.0 - 0.5 * (1.0 + zeta / root) * slow - 0.5 * (1.0 - zeta / root) * fast
        }
    }

    /// Time in seconds until the spring is within the settle threshold
    pub fn settle_duration(&self) -> f32 {
        let omega = self.omega();
        let zeta = self.zeta();
        let ln_threshold = SPRING_SETTLE_THRESHOLD.ln();

        if (zeta - 1.0).abs() < CRITICAL_BAND {
            // Solve e^(-ωt)(1 + ωt) = threshold by fixed-point iteration
            let mut t = -ln_threshold / omega;
            for _ in 0..16 {
                t = ((1.0 + omega * t).ln() - ln_threshold) / omega;
            }
            t
        } else if zeta < 1.0 {
            let amplitude = 1.0 / (1.0 - zeta * zeta).sqrt();
            (amplitude.ln() - ln_threshold) / (zeta * omega)
        } else {
            let root = (zeta * zeta - 1.0).sqrt();
            let rate = omega * (zeta - root);
            let amplitude = (1.0 + zeta / root) / 2.0;
            (amplitude.ln() - ln_threshold) / rate
        }
    }
}

/// How time maps to progress along a leg
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Timing {
    /// Fixed duration shaped by an easing function
    Eased {
        /// Easing applied to linear time
        easing: Easing,
        /// Duration in seconds
        duration: f32,
    },
    /// Physical spring, duration derived from its settle time
    Spring(Spring),
}

/// Result of sampling a curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSample {
    /// Normalized position along the leg. Exactly 1 once finished
    pub fraction: f32,
    /// Whether the leg has run its full duration
    pub finished: bool,
}

impl CurveSample {
    const DONE: CurveSample = CurveSample {
        fraction: 1.0,
        finished: true,
    };
}

fn default_speed() -> f32 {
    1.0
}

/// Timing descriptor for one animation leg
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "CurveFields")]
pub struct Curve {
    /// Base timing
    pub timing: Timing,
    /// Playback speed multiplier
    pub speed: f32,
    /// Delay before the leg starts moving, in seconds
    pub delay: f32,
}

/// Deserialized form, run through the normalizing constructors
#[derive(Deserialize)]
struct CurveFields {
    timing: Timing,
    #[serde(default = "default_speed")]
    speed: f32,
    #[serde(default)]
    delay: f32,
}

impl From<CurveFields> for Curve {
    fn from(fields: CurveFields) -> Self {
        let curve = match fields.timing {
            Timing::Eased { easing, duration } => Self::eased(easing, duration),
            Timing::Spring(spring) => Self::spring(spring.response, spring.damping_fraction),
        };
        curve.speed(fields.speed).delay(fields.delay)
    }
}

impl Default for Curve {
    fn default() -> Self {
        Self::ease_in_out(DEFAULT_DURATION)
    }
}

impl Curve {
    /// Curve from an easing and a duration in seconds
    pub fn eased(easing: Easing, duration: f32) -> Self {
        let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        Self {
            timing: Timing::Eased { easing, duration },
            speed: 1.0,
            delay: 0.0,
        }
    }

    /// Constant-speed curve
    pub fn linear(duration: f32) -> Self {
        Self::eased(Easing::Linear, duration)
    }

    /// Ease-in curve
    pub fn ease_in(duration: f32) -> Self {
        Self::eased(Easing::EaseIn, duration)
    }

    /// Ease-out curve
    pub fn ease_out(duration: f32) -> Self {
        Self::eased(Easing::EaseOut, duration)
    }

    /// Ease-in-out curve
    pub fn ease_in_out(duration: f32) -> Self {
        Self::eased(Easing::EaseInOut, duration)
    }

    /// Spring curve
    pub fn spring(response: f32, damping_fraction: f32) -> Self {
        Self {
            timing: Timing::Spring(Spring::new(response, damping_fraction)),
            speed: 1.0,
            delay: 0.0,
        }
    }

    /// Spring curve with default parameters
    pub fn default_spring() -> Self {
        Self {
            timing: Timing::Spring(Spring::default()),
            speed: 1.0,
            delay: 0.0,
        }
    }

    /// Multiply playback speed. Non-positive or non-finite factors are ignored
    pub fn speed(mut self, factor: f32) -> Self {
        if factor.is_finite() && factor > 0.0 {
            self.speed *= factor;
        }
        self
    }

    /// Set a start delay in seconds
    pub fn delay(mut self, seconds: f32) -> Self {
        self.delay = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        self
    }

    fn effective_speed(&self) -> f32 {
        if self.speed.is_finite() && self.speed > 0.0 {
            self.speed
        } else {
            1.0
        }
    }

    /// Duration of the moving part of the leg, before speed scaling
    pub fn base_duration(&self) -> f32 {
        match self.timing {
            Timing::Eased { duration, .. } if duration.is_finite() => duration.max(0.0),
            Timing::Eased { .. } => 0.0,
            Timing::Spring(spring) => spring.settle_duration(),
        }
    }

    /// Wall-clock length of a leg, including delay and speed
    pub fn total_duration(&self) -> f32 {
        self.delay.max(0.0) + self.base_duration() / self.effective_speed()
    }

    /// Sample the curve `elapsed` seconds into a leg
    pub fn sample(&self, elapsed: f32) -> CurveSample {
        let elapsed = if elapsed.is_nan() { 0.0 } else { elapsed };
        let local = (elapsed - self.delay.max(0.0)).max(0.0) * self.effective_speed();
        if elapsed < self.delay {
            return CurveSample {
                fraction: 0.0,
                finished: false,
            };
        }

        match self.timing {
            Timing::Eased { easing, duration } => {
                if !duration.is_finite() || duration <= 0.0 || local >= duration {
                    CurveSample::DONE
                } else {
                    CurveSample {
                        fraction: easing.apply(local / duration),
                        finished: false,
                    }
                }
            }
            Timing::Spring(spring) => {
                let settle = spring.settle_duration();
                if !settle.is_finite() || local >= settle {
                    CurveSample::DONE
                } else {
                    CurveSample {
                        fraction: spring.position(local),
                        finished: false,
                    }
                }
            }
        }
    }
}
