// SPDX-License-Identifier: MIT OR Apache-2.0
//! Effect trigger state machine.
//!
//! One [`TriggerState`] lives at each effect attachment site. It turns
//! discrete triggers into a progress value that rises to 1 under the
//! insertion curve, then falls back to 0 under the removal curve:
//!
//! ```text
//!            trigger()                 progress >= 1
//!   Idle ───────────────▶ Presenting ───────────────▶ Dismissing
//!    ▲                      ▲   │ trigger()               │  │
//!    │                      │   └──────────┘              │  │
//!    │                      └──────── trigger() ──────────┘  │
//!    └──────────────────── removal leg completes ────────────┘
//! ```
//!
//! Every trigger bumps a wrapping generation counter. Each animation leg
//! carries the generation it was started under, and a completion from a
//! superseded generation is discarded. That fence is the whole
//! cancellation model: a new trigger supersedes whatever is in flight.

use crate::animator::{ProgressAnimator, Tween};
use kindle_motion::EffectAnimation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle phase of a trigger site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    /// At rest, progress 0
    #[default]
    Idle,
    /// Progress heading to 1 under the insertion curve
    Presenting,
    /// Progress heading to 0 under the removal curve
    Dismissing,
}

impl Phase {
    /// Whether the effect counts as active (presenting)
    pub fn is_active(&self) -> bool {
        matches!(self, Phase::Presenting)
    }

    /// Whether a leg is expected to be running
    pub fn is_animating(&self) -> bool {
        !matches!(self, Phase::Idle)
    }
}

/// Trigger generation counter. Wraps on overflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Generation(u64);

impl Generation {
    /// Create a generation from a raw counter value
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// The generation after this one
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Raw counter value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identity of one triggered run of an effect.
///
/// Changes exactly when a new trigger generation starts. Effects that
/// inject child content key it on this id so the content remounts and
/// replays its own entrance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectId(u64);

impl From<Generation> for EffectId {
    fn from(generation: Generation) -> Self {
        Self(generation.0)
    }
}

/// Identifies one animation leg: the generation it belongs to and the
/// phase it drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LegToken {
    /// Generation the leg was started under
    pub generation: Generation,
    /// Phase the leg drives
    pub phase: Phase,
}

/// Read-only snapshot handed to effect rendering each frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectConfiguration {
    /// Identity of the current trigger generation
    pub id: EffectId,
    /// Whether the effect is presenting
    pub is_active: bool,
    /// Progress in [0, 1]
    pub progress: f32,
}

/// Trigger state of one effect attachment site
#[derive(Debug, Clone)]
pub struct TriggerState<A: ProgressAnimator = Tween> {
    animation: EffectAnimation,
    animator: A,
    phase: Phase,
    generation: Generation,
}

impl TriggerState<Tween> {
    /// Attach a new site at rest, driven by the built-in tween
    pub fn new(animation: EffectAnimation) -> Self {
        Self::with_animator(animation, Tween::default())
    }
}

impl Default for TriggerState<Tween> {
    fn default() -> Self {
        Self::new(EffectAnimation::default())
    }
}

impl<A: ProgressAnimator> TriggerState<A> {
    /// Attach a new site at rest, driven by a host animator
    pub fn with_animator(animation: EffectAnimation, animator: A) -> Self {
        Self {
            animation,
            animator,
            phase: Phase::Idle,
            generation: Generation::default(),
        }
    }

    /// Fire the effect.
    ///
    /// Always permitted. Starts a new generation and heads progress to 1
    /// under the insertion curve, starting from wherever progress is now.
    /// Re-triggering mid-flight never resets progress.
    pub fn trigger(&mut self) {
        let previous = self.phase;
        self.generation = self.generation.next();
        self.phase = Phase::Presenting;
        self.animator.animate_to(
            1.0,
            self.animation.curve_for(self.phase.is_active()),
            LegToken {
                generation: self.generation,
                phase: Phase::Presenting,
            },
        );
        tracing::debug!(
            "Effect triggered (generation {}, was {:?}, progress {:.3})",
            self.generation,
            previous,
            self.animator.value()
        );
    }

    /// Advance the animator by `dt` seconds and run the completion monitor
    pub fn update(&mut self, dt: f32) {
        if let Some(token) = self.animator.advance(dt) {
            self.complete_leg(token);
        }
        if self.phase == Phase::Presenting && self.animator.value() >= 1.0 {
            self.begin_dismissal();
        }
    }

    /// Report that a leg finished.
    ///
    /// Returns `false` when the token is stale: from a superseded
    /// generation, or for a phase the site is no longer in.
    pub fn complete_leg(&mut self, token: LegToken) -> bool {
        if token.generation != self.generation {
            tracing::trace!(
                "Discarding stale completion (generation {}, current {})",
                token.generation,
                self.generation
            );
            return false;
        }

        match (self.phase, token.phase) {
            (Phase::Presenting, Phase::Presenting) => {
                self.begin_dismissal();
                true
            }
            (Phase::Dismissing, Phase::Dismissing) => {
                self.phase = Phase::Idle;
                tracing::debug!("Effect settled (generation {})", self.generation);
                true
            }
            (current, finished) => {
                tracing::trace!(
                    "Discarding completion for {:?} leg while {:?}",
                    finished,
                    current
                );
                false
            }
        }
    }

    fn begin_dismissal(&mut self) {
        self.phase = Phase::Dismissing;
        self.animator.animate_to(
            0.0,
            self.animation.curve_for(self.phase.is_active()),
            LegToken {
                generation: self.generation,
                phase: Phase::Dismissing,
            },
        );
        tracing::debug!("Effect dismissing (generation {})", self.generation);
    }

    /// Snapshot for rendering
    pub fn sample(&self) -> EffectConfiguration {
        EffectConfiguration {
            id: self.id(),
            is_active: self.is_active(),
            progress: self.progress(),
        }
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current generation
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Identity of the current generation
    pub fn id(&self) -> EffectId {
        EffectId::from(self.generation)
    }

    /// Whether the effect is presenting
    pub fn is_active(&self) -> bool {
        self.phase.is_active()
    }

    /// Progress clamped to [0, 1]
    pub fn progress(&self) -> f32 {
        let value = self.animator.value();
        if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        }
    }

    /// Unclamped animator value; springs overshoot past the endpoints
    pub fn raw_progress(&self) -> f32 {
        self.animator.value()
    }

    /// Whether the site is idle with nothing in flight
    pub fn is_settled(&self) -> bool {
        self.phase == Phase::Idle && !self.animator.is_animating()
    }

    /// Curves in use
    pub fn animation(&self) -> &EffectAnimation {
        &self.animation
    }

    /// Replace the curves. Takes effect from the next leg on
    pub fn set_animation(&mut self, animation: EffectAnimation) {
        self.animation = animation;
    }

    /// The underlying animator
    pub fn animator(&self) -> &A {
        &self.animator
    }

    /// Mutable access to the underlying animator
    pub fn animator_mut(&mut self) -> &mut A {
        &mut self.animator
    }
}
