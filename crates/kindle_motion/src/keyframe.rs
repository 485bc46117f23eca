// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe definitions and piecewise-linear interpolation.
//!
//! A [`KeyframeSet`] holds values at normalized progress breakpoints and
//! blends between the two breakpoints surrounding a query. Sets are
//! normalized once at construction (sorted, clamped, NaN dropped), so
//! interpolation never fails.

use serde::{Deserialize, Serialize};

/// Values that can be blended componentwise as `a * s + b * t`
pub trait VectorArithmetic: Clone {
    /// Componentwise multiplication by a scalar
    fn scaled(&self, factor: f32) -> Self;

    /// Componentwise sum
    fn added(&self, other: &Self) -> Self;
}

impl VectorArithmetic for f32 {
    fn scaled(&self, factor: f32) -> Self {
        self * factor
    }

    fn added(&self, other: &Self) -> Self {
        self + other
    }
}

impl VectorArithmetic for f64 {
    fn scaled(&self, factor: f32) -> Self {
        self * f64::from(factor)
    }

    fn added(&self, other: &Self) -> Self {
        self + other
    }
}

impl<const N: usize> VectorArithmetic for [f32; N] {
    fn scaled(&self, factor: f32) -> Self {
        self.map(|c| c * factor)
    }

    fn added(&self, other: &Self) -> Self {
        let mut out = *self;
        for (a, b) in out.iter_mut().zip(other) {
            *a += b;
        }
        out
    }
}

impl<A: VectorArithmetic, B: VectorArithmetic> VectorArithmetic for (A, B) {
    fn scaled(&self, factor: f32) -> Self {
        (self.0.scaled(factor), self.1.scaled(factor))
    }

    fn added(&self, other: &Self) -> Self {
        (self.0.added(&other.0), self.1.added(&other.1))
    }
}

/// A value at a normalized progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe<T> {
    /// Value at this breakpoint
    pub value: T,
    /// Progress in [0, 1]
    pub progress: f32,
}

impl<T> Keyframe<T> {
    /// Create a new keyframe
    pub fn new(value: T, progress: f32) -> Self {
        Self { value, progress }
    }
}

/// Keyframes kept in ascending progress order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Keyframe<T>>", into = "Vec<Keyframe<T>>")]
#[serde(bound(
    serialize = "T: Clone + Serialize",
    deserialize = "T: Deserialize<'de>"
))]
pub struct KeyframeSet<T> {
    keyframes: Vec<Keyframe<T>>,
}

impl<T> Default for KeyframeSet<T> {
    fn default() -> Self {
        Self { keyframes: Vec::new() }
    }
}

impl<T> From<Vec<Keyframe<T>>> for KeyframeSet<T> {
    fn from(keyframes: Vec<Keyframe<T>>) -> Self {
        Self::new(keyframes)
    }
}

impl<T> From<KeyframeSet<T>> for Vec<Keyframe<T>> {
    fn from(set: KeyframeSet<T>) -> Self {
        set.keyframes
    }
}

impl<T> FromIterator<Keyframe<T>> for KeyframeSet<T> {
    fn from_iter<I: IntoIterator<Item = Keyframe<T>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<T> KeyframeSet<T> {
    /// Build a set, dropping NaN breakpoints, clamping progress into
    /// [0, 1] and sorting. The sort is stable, so keyframes sharing a
    /// progress keep their input order.
    pub fn new(keyframes: Vec<Keyframe<T>>) -> Self {
        let mut keyframes: Vec<_> = keyframes
            .into_iter()
            .filter(|k| !k.progress.is_nan())
            .map(|mut k| {
                k.progress = k.progress.clamp(0.0, 1.0);
                k
            })
            .collect();
        keyframes.sort_by(|a, b| a.progress.total_cmp(&b.progress));
        Self { keyframes }
    }

    /// Spread values evenly over [0, 1]; a single value sits at 0
    pub fn evenly_spaced(values: impl IntoIterator<Item = T>) -> Self {
        let values: Vec<T> = values.into_iter().collect();
        let steps = values.len().saturating_sub(1).max(1) as f32;
        let keyframes = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| Keyframe::new(value, i as f32 / steps))
            .collect();
        Self::new(keyframes)
    }

    /// Insert a keyframe, after any existing keyframes with equal progress
    pub fn push(&mut self, keyframe: Keyframe<T>) {
        if keyframe.progress.is_nan() {
            return;
        }
        let progress = keyframe.progress.clamp(0.0, 1.0);
        let idx = self.keyframes.partition_point(|k| k.progress <= progress);
        self.keyframes.insert(idx, Keyframe::new(keyframe.value, progress));
    }

    /// All keyframes in ascending order
    pub fn keyframes(&self) -> &[Keyframe<T>] {
        &self.keyframes
    }

    /// Get keyframe count
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    /// Whether the set has no keyframes
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Find the keyframes surrounding a progress: the last at or before
    /// it and the first at or after it
    fn find_keyframes(&self, progress: f32) -> (Option<&Keyframe<T>>, Option<&Keyframe<T>>) {
        let after_prev = self.keyframes.partition_point(|k| k.progress <= progress);
        let next_idx = self.keyframes.partition_point(|k| k.progress < progress);

        let prev = after_prev.checked_sub(1).map(|i| &self.keyframes[i]);
        let next = self.keyframes.get(next_idx);
        (prev, next)
    }
}

impl<T: VectorArithmetic> KeyframeSet<T> {
    /// Interpolate the value at `progress`.
    ///
    /// Queries are clamped to [0, 1] (NaN reads as 0). Outside the covered
    /// range the nearest boundary value is held. Among keyframes sharing a
    /// progress, the last one wins. Returns `None` only for an empty set.
    pub fn interpolate(&self, progress: f32) -> Option<T> {
        let progress = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };

        match self.find_keyframes(progress) {
            (None, None) => None,
            (Some(kf), None) | (None, Some(kf)) => Some(kf.value.clone()),
            (Some(prev), Some(next)) => {
                let span = next.progress - prev.progress;
                if span <= 0.0 {
                    return Some(prev.value.clone());
                }
                let factor = 1.0 / span;
                let upper = next.value.scaled((progress - prev.progress) * factor);
                let lower = prev.value.scaled((next.progress - progress) * factor);
                Some(upper.added(&lower))
            }
        }
    }
}

/// An effect payload sequenced through keyframes by progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Clone + Serialize",
    deserialize = "T: Deserialize<'de>"
))]
pub struct Keyframed<T> {
    /// Value used when sequencing is disabled or there are no keyframes
    pub base: T,
    /// Breakpoints
    pub keyframes: KeyframeSet<T>,
    /// Whether the keyframes drive the value
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl<T: VectorArithmetic> Keyframed<T> {
    /// Create an enabled keyframed value
    pub fn new(base: T, keyframes: KeyframeSet<T>) -> Self {
        Self {
            base,
            keyframes,
            is_enabled: true,
        }
    }

    /// Set whether the keyframes are applied
    pub fn with_enabled(mut self, is_enabled: bool) -> Self {
        self.is_enabled = is_enabled;
        self
    }

    /// Value at `progress`
    pub fn value_at(&self, progress: f32) -> T {
        if !self.is_enabled {
            return self.base.clone();
        }
        self.keyframes
            .interpolate(progress)
            .unwrap_or_else(|| self.base.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_two_point_linearity() {
        let set = KeyframeSet::new(vec![Keyframe::new(2.0_f32, 0.0), Keyframe::new(10.0, 1.0)]);
        for i in 0..=20 {
            let q = i as f32 / 20.0;
            let expected = 2.0 * (1.0 - q) + 10.0 * q;
            assert!(close(set.interpolate(q).unwrap(), expected), "q = {q}");
        }
    }

    #[test]
    fn test_boundary_clamp() {
        let set = KeyframeSet::new(vec![
            Keyframe::new([1.0_f32, 1.0], 0.2),
            Keyframe::new([5.0, 3.0], 0.5),
            Keyframe::new([9.0, -1.0], 0.8),
        ]);
        assert_eq!(set.interpolate(0.0), Some([1.0, 1.0]));
        assert_eq!(set.interpolate(0.1), Some([1.0, 1.0]));
        assert_eq!(set.interpolate(1.0), Some([9.0, -1.0]));
        assert_eq!(set.interpolate(-4.0), Some([1.0, 1.0]));
        assert_eq!(set.interpolate(7.0), Some([9.0, -1.0]));
    }

    #[test]
    fn test_exact_hit() {
        let set = KeyframeSet::evenly_spaced([0.0_f32, 4.0, 2.0]);
        assert_eq!(set.interpolate(0.5), Some(4.0));
        assert!(close(set.interpolate(0.75).unwrap(), 3.0));
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let sorted = KeyframeSet::new(vec![
            Keyframe::new(0.0_f32, 0.0),
            Keyframe::new(3.0, 0.3),
            Keyframe::new(1.0, 1.0),
        ]);
        let shuffled = KeyframeSet::new(vec![
            Keyframe::new(1.0_f32, 1.0),
            Keyframe::new(0.0, 0.0),
            Keyframe::new(3.0, 0.3),
        ]);
        assert_eq!(sorted, shuffled);
        assert_eq!(KeyframeSet::new(sorted.keyframes().to_vec()), sorted);
        for i in 0..=10 {
            let q = i as f32 / 10.0;
            assert_eq!(sorted.interpolate(q), shuffled.interpolate(q));
        }
    }

    #[test]
    fn test_duplicate_progress_last_wins() {
        let set = KeyframeSet::new(vec![
            Keyframe::new(0.0_f32, 0.0),
            Keyframe::new(10.0, 0.5),
            Keyframe::new(20.0, 0.5),
            Keyframe::new(30.0, 1.0),
        ]);
        assert_eq!(set.interpolate(0.5), Some(20.0));
        // Left of the step blends toward the first duplicate
        assert!(close(set.interpolate(0.25).unwrap(), 5.0));
        // Right of the step blends away from the last duplicate
        assert!(close(set.interpolate(0.75).unwrap(), 25.0));
    }

    #[test]
    fn test_empty_and_single() {
        let empty: KeyframeSet<f32> = KeyframeSet::default();
        assert_eq!(empty.interpolate(0.5), None);

        let single = KeyframeSet::evenly_spaced([7.0_f32]);
        assert_eq!(single.keyframes()[0].progress, 0.0);
        assert_eq!(single.interpolate(0.0), Some(7.0));
        assert_eq!(single.interpolate(1.0), Some(7.0));
    }

    #[test]
    fn test_normalization() {
        let set = KeyframeSet::new(vec![
            Keyframe::new(1.0_f32, f32::NAN),
            Keyframe::new(2.0, 1.5),
            Keyframe::new(3.0, -0.5),
        ]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.keyframes()[0].progress, 0.0);
        assert_eq!(set.keyframes()[1].progress, 1.0);
        assert_eq!(set.interpolate(f32::NAN), Some(3.0));
    }

    #[test]
    fn test_push_keeps_order() {
        let mut set = KeyframeSet::evenly_spaced([0.0_f32, 1.0]);
        set.push(Keyframe::new(5.0, 0.5));
        set.push(Keyframe::new(6.0, 0.5));
        let values: Vec<f32> = set.keyframes().iter().map(|k| k.value).collect();
        assert_eq!(values, vec![0.0, 5.0, 6.0, 1.0]);
        assert_eq!(set.interpolate(0.5), Some(6.0));
    }

    #[test]
    fn test_pair_values() {
        let set = KeyframeSet::evenly_spaced([(0.0_f32, [0.0_f32, 0.0]), (1.0, [2.0, 4.0])]);
        let (a, b) = set.interpolate(0.5).unwrap();
        assert!(close(a, 0.5));
        assert!(close(b[0], 1.0) && close(b[1], 2.0));
    }

    #[test]
    fn test_keyframed_value() {
        let keyframed = Keyframed::new(1.0_f32, KeyframeSet::evenly_spaced([1.0, 1.5, 1.0]));
        assert!(close(keyframed.value_at(0.5), 1.5));
        assert!(close(keyframed.value_at(0.25), 1.25));

        let disabled = keyframed.clone().with_enabled(false);
        assert_eq!(disabled.value_at(0.5), 1.0);

        let empty = Keyframed::new(3.0_f32, KeyframeSet::default());
        assert_eq!(empty.value_at(0.5), 3.0);
    }

    #[test]
    fn test_serialization_sorts() {
        let set: KeyframeSet<f32> =
            ron::from_str("[(value: 1.0, progress: 1.0), (value: 0.0, progress: 0.0)]").unwrap();
        assert_eq!(set.keyframes()[0].value, 0.0);
        let text = ron::to_string(&set).unwrap();
        let loaded: KeyframeSet<f32> = ron::from_str(&text).unwrap();
        assert_eq!(loaded, set);
    }
}
