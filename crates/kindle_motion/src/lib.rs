// SPDX-License-Identifier: MIT OR Apache-2.0
//! Motion primitives for Kindle effects.
//!
//! This crate is pure data and numerics:
//! - Easing functions and cubic-bezier timing curves
//! - Spring and eased [`Curve`]s describing one animation leg
//! - [`EffectAnimation`], the insertion/removal curve pair of an effect
//! - Keyframe interpolation for vector-valued effect payloads
//!
//! Nothing here holds time or state; the trigger state machine in
//! `kindle_trigger` samples these types once per frame.

pub mod animation;
pub mod curve;
pub mod easing;
pub mod keyframe;

pub use animation::EffectAnimation;
pub use curve::{Curve, CurveSample, Spring, Timing, DEFAULT_DURATION, SPRING_SETTLE_THRESHOLD};
pub use easing::Easing;
pub use keyframe::{Keyframe, KeyframeSet, Keyframed, VectorArithmetic};
