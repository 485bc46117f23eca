// SPDX-License-Identifier: MIT OR Apache-2.0
//! Insertion and removal curves for a triggered effect.

use crate::curve::{Curve, DEFAULT_DURATION};
use serde::{Deserialize, Serialize};

/// The pair of curves an effect runs: one while presenting, one while
/// dismissing. An absent curve means the leg is instantaneous.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectAnimation {
    /// Curve used while the effect animates in
    #[serde(default)]
    pub insertion: Option<Curve>,
    /// Curve used while the effect animates back out
    #[serde(default)]
    pub removal: Option<Curve>,
}

impl Default for EffectAnimation {
    fn default() -> Self {
        Self::continuous(Curve::linear(DEFAULT_DURATION))
    }
}

impl EffectAnimation {
    /// Run the same curve in both directions.
    ///
    /// Each leg plays at double speed, so a full present-and-dismiss round
    /// trip lasts as long as `curve` itself.
    pub fn continuous(curve: Curve) -> Self {
        Self {
            insertion: Some(curve.speed(2.0)),
            removal: Some(curve.speed(2.0)),
        }
    }

    /// Separate curves for each direction
    pub fn asymmetric(insertion: Option<Curve>, removal: Option<Curve>) -> Self {
        Self { insertion, removal }
    }

    /// Ease in while presenting, ease out while dismissing
    pub fn ease_in_out() -> Self {
        Self::asymmetric(
            Some(Curve::ease_in(DEFAULT_DURATION).speed(2.0)),
            Some(Curve::ease_out(DEFAULT_DURATION).speed(2.0)),
        )
    }

    /// Ease in and out with a total round trip of `duration` seconds
    pub fn ease_in_out_over(duration: f32) -> Self {
        Self::asymmetric(
            Some(Curve::ease_in(duration / 2.0)),
            Some(Curve::ease_out(duration / 2.0)),
        )
    }

    /// No animation at all; both legs jump
    pub fn instant() -> Self {
        Self::asymmetric(None, None)
    }

    /// Curve for the leg that runs while `is_active` holds
    pub fn curve_for(&self, is_active: bool) -> Option<&Curve> {
        if is_active {
            self.insertion.as_ref()
        } else {
            self.removal.as_ref()
        }
    }

    /// Wall-clock length of a leg; zero when its curve is absent
    pub fn leg_duration(&self, is_active: bool) -> f32 {
        self.curve_for(is_active)
            .map(Curve::total_duration)
            .unwrap_or(0.0)
    }

    /// Length of a full present-and-dismiss cycle
    pub fn round_trip(&self) -> f32 {
        self.leg_duration(true) + self.leg_duration(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Timing;
    use crate::easing::Easing;

    #[test]
    fn test_default_is_continuous_linear() {
        let animation = EffectAnimation::default();
        assert!((animation.round_trip() - DEFAULT_DURATION).abs() < 1e-6);
        assert_eq!(animation.insertion, animation.removal);
    }

    #[test]
    fn test_curve_selection() {
        let animation = EffectAnimation::asymmetric(Some(Curve::linear(0.05)), Some(Curve::default_spring()));
        assert!(matches!(
            animation.curve_for(true).map(|c| c.timing),
            Some(Timing::Eased { easing: Easing::Linear, .. })
        ));
        assert!(matches!(animation.curve_for(false).map(|c| c.timing), Some(Timing::Spring(_))));
    }

    #[test]
    fn test_absent_curve_is_instant() {
        let animation = EffectAnimation::instant();
        assert!(animation.curve_for(true).is_none());
        assert_eq!(animation.leg_duration(true), 0.0);
        assert_eq!(animation.round_trip(), 0.0);
    }

    #[test]
    fn test_ease_in_out_over() {
        let animation = EffectAnimation::ease_in_out_over(1.0);
        assert!((animation.leg_duration(true) - 0.5).abs() < 1e-6);
        assert!((animation.leg_duration(false) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_deserialize_partial() {
        let animation: EffectAnimation =
            ron::from_str("(insertion: Some((timing: Eased(easing: EaseIn, duration: 0.2))))").unwrap();
        assert!(animation.insertion.is_some());
        assert!(animation.removal.is_none());
    }
}
