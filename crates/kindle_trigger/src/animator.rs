// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scalar animation primitive driving trigger progress.
//!
//! The state machine never moves progress itself. It asks a
//! [`ProgressAnimator`] to head toward a target under a curve, and the
//! animator reports back which leg finished. [`Tween`] is the built-in
//! frame-stepped implementation; hosts with their own animation runtime
//! can implement the trait instead.

use crate::state::LegToken;
use kindle_motion::{Curve, CurveSample};

/// Animates one scalar between targets, one leg at a time
pub trait ProgressAnimator {
    /// Current value
    fn value(&self) -> f32;

    /// Whether a leg is in flight
    fn is_animating(&self) -> bool;

    /// Start a leg from the current value toward `target`, replacing any
    /// leg in flight. `None` means an instantaneous leg.
    fn animate_to(&mut self, target: f32, curve: Option<&Curve>, token: LegToken);

    /// Advance time by `dt` seconds. Returns the token of the leg that
    /// finished during this step, if any.
    fn advance(&mut self, dt: f32) -> Option<LegToken>;
}

/// A leg in flight
#[derive(Debug, Clone)]
struct Leg {
    from: f32,
    to: f32,
    curve: Option<Curve>,
    elapsed: f32,
    token: LegToken,
}

/// Frame-stepped tweening of a single value
#[derive(Debug, Clone, Default)]
pub struct Tween {
    value: f32,
    leg: Option<Leg>,
}

impl Tween {
    /// Create a tween resting at `value`
    pub fn new(value: f32) -> Self {
        Self { value, leg: None }
    }

    /// Target of the leg in flight
    pub fn target(&self) -> Option<f32> {
        self.leg.as_ref().map(|leg| leg.to)
    }

    /// Token of the leg in flight
    pub fn leg_token(&self) -> Option<LegToken> {
        self.leg.as_ref().map(|leg| leg.token)
    }
}

impl ProgressAnimator for Tween {
    fn value(&self) -> f32 {
        self.value
    }

    fn is_animating(&self) -> bool {
        self.leg.is_some()
    }

    fn animate_to(&mut self, target: f32, curve: Option<&Curve>, token: LegToken) {
        self.leg = Some(Leg {
            from: self.value,
            to: target,
            curve: curve.copied(),
            elapsed: 0.0,
            token,
        });
    }

    fn advance(&mut self, dt: f32) -> Option<LegToken> {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let leg = self.leg.as_mut()?;
        leg.elapsed += dt;

        let sample = match &leg.curve {
            Some(curve) => curve.sample(leg.elapsed),
            None => CurveSample {
                fraction: 1.0,
                finished: true,
            },
        };

        if sample.finished {
            self.value = leg.to;
            let token = leg.token;
            self.leg = None;
            Some(token)
        } else {
            self.value = leg.from + (leg.to - leg.from) * sample.fraction;
            None
        }
    }
}
