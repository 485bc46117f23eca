// SPDX-License-Identifier: MIT OR Apache-2.0
//! Trigger sources: an enable gate, a fixed-interval schedule and a
//! value-change watcher, each wrapping a [`TriggerState`].

use crate::animator::{ProgressAnimator, Tween};
use crate::inbox::TriggerEvent;
use crate::state::{EffectConfiguration, TriggerState};
use kindle_motion::EffectAnimation;

/// Shortest accepted schedule interval, in seconds
pub const MIN_INTERVAL: f32 = 0.001;

/// A trigger state behind an enable gate.
///
/// Disabling only drops future triggers. A leg already in flight keeps
/// running until the site is back at rest.
#[derive(Debug, Clone)]
pub struct GatedTrigger<A: ProgressAnimator = Tween> {
    state: TriggerState<A>,
    is_enabled: bool,
    dropped: u64,
}

impl GatedTrigger<Tween> {
    /// Create a gated site driven by the built-in tween
    pub fn new(animation: EffectAnimation, is_enabled: bool) -> Self {
        Self::with_state(TriggerState::new(animation), is_enabled)
    }
}

impl<A: ProgressAnimator> GatedTrigger<A> {
    /// Put an existing state behind a gate
    pub fn with_state(state: TriggerState<A>, is_enabled: bool) -> Self {
        Self {
            state,
            is_enabled,
            dropped: 0,
        }
    }

    /// Trigger if enabled. Returns whether the trigger went through
    pub fn fire(&mut self) -> bool {
        if self.is_enabled {
            self.state.trigger();
            true
        } else {
            self.dropped += 1;
            tracing::trace!("Trigger dropped while disabled");
            false
        }
    }

    /// Apply events drained from an inbox, in order.
    ///
    /// Each `Trigger` fires on its own. Ticks coalesce: once a tick has
    /// fired in this batch, later ticks are dropped, so a stalled owner
    /// never replays a backlog. Returns the number of triggers fired.
    pub fn apply_events(&mut self, events: impl IntoIterator<Item = TriggerEvent>) -> usize {
        let mut fired = 0;
        let mut ticked = false;
        for event in events {
            match event {
                TriggerEvent::Trigger => {
                    if self.fire() {
                        fired += 1;
                    }
                }
                TriggerEvent::Tick if ticked => {
                    self.dropped += 1;
                }
                TriggerEvent::Tick => {
                    if self.fire() {
                        fired += 1;
                        ticked = true;
                    }
                }
                TriggerEvent::SetEnabled(is_enabled) => self.set_enabled(is_enabled),
            }
        }
        fired
    }

    /// Advance the underlying state
    pub fn update(&mut self, dt: f32) {
        self.state.update(dt);
    }

    /// Open or close the gate
    pub fn set_enabled(&mut self, is_enabled: bool) {
        if self.is_enabled != is_enabled {
            tracing::debug!("Trigger gate {}", if is_enabled { "enabled" } else { "disabled" });
        }
        self.is_enabled = is_enabled;
    }

    /// Whether triggers go through
    pub fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    /// Number of triggers dropped by the gate or by tick coalescing
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Snapshot for rendering
    pub fn sample(&self) -> EffectConfiguration {
        self.state.sample()
    }

    /// The gated state
    pub fn state(&self) -> &TriggerState<A> {
        &self.state
    }

    /// Mutable access to the gated state
    pub fn state_mut(&mut self) -> &mut TriggerState<A> {
        &mut self.state
    }
}

/// Fixed-interval tick clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Schedule {
    interval: f32,
    elapsed: f32,
}

impl Schedule {
    /// Create a schedule ticking every `interval` seconds. The first tick
    /// comes one interval after creation.
    pub fn new(interval: f32) -> Self {
        let interval = if interval.is_finite() {
            interval.max(MIN_INTERVAL)
        } else {
            MIN_INTERVAL
        };
        Self { interval, elapsed: 0.0 }
    }

    /// Advance by `dt` seconds. Returns whether at least one tick fell
    /// inside the step; several ticks in one step count as one.
    pub fn advance(&mut self, dt: f32) -> bool {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.elapsed += dt;
        if self.elapsed >= self.interval {
            self.elapsed %= self.interval;
            true
        } else {
            false
        }
    }

    /// Seconds between ticks
    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Seconds until the next tick
    pub fn remaining(&self) -> f32 {
        self.interval - self.elapsed
    }
}

/// Site that triggers itself every interval
#[derive(Debug, Clone)]
pub struct ScheduledTrigger<A: ProgressAnimator = Tween> {
    gate: GatedTrigger<A>,
    schedule: Schedule,
}

impl ScheduledTrigger<Tween> {
    /// Create a scheduled site driven by the built-in tween
    pub fn new(animation: EffectAnimation, interval: f32, is_enabled: bool) -> Self {
        Self::with_gate(GatedTrigger::new(animation, is_enabled), interval)
    }
}

impl<A: ProgressAnimator> ScheduledTrigger<A> {
    /// Schedule an existing gated site
    pub fn with_gate(gate: GatedTrigger<A>, interval: f32) -> Self {
        Self {
            gate,
            schedule: Schedule::new(interval),
        }
    }

    /// Advance the running leg, then tick the schedule. A tick fires the
    /// effect only if the gate is open at tick time.
    pub fn update(&mut self, dt: f32) {
        self.gate.update(dt);
        if self.schedule.advance(dt) {
            self.gate.fire();
        }
    }

    /// Apply events drained from an inbox
    pub fn apply_events(&mut self, events: impl IntoIterator<Item = TriggerEvent>) -> usize {
        self.gate.apply_events(events)
    }

    /// Open or close the gate
    pub fn set_enabled(&mut self, is_enabled: bool) {
        self.gate.set_enabled(is_enabled);
    }

    /// Whether ticks fire the effect
    pub fn is_enabled(&self) -> bool {
        self.gate.is_enabled()
    }

    /// Snapshot for rendering
    pub fn sample(&self) -> EffectConfiguration {
        self.gate.sample()
    }

    /// The tick clock
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// The gated site
    pub fn gate(&self) -> &GatedTrigger<A> {
        &self.gate
    }

    /// Mutable access to the gated site
    pub fn gate_mut(&mut self) -> &mut GatedTrigger<A> {
        &mut self.gate
    }

    /// The trigger state
    pub fn state(&self) -> &TriggerState<A> {
        self.gate.state()
    }
}

/// Site that triggers whenever an observed value changes
#[derive(Debug, Clone)]
pub struct ChangeTrigger<V, A: ProgressAnimator = Tween> {
    gate: GatedTrigger<A>,
    last: Option<V>,
}

impl<V: PartialEq> ChangeTrigger<V, Tween> {
    /// Create a change-watching site driven by the built-in tween
    pub fn new(animation: EffectAnimation, is_enabled: bool) -> Self {
        Self::with_gate(GatedTrigger::new(animation, is_enabled))
    }
}

impl<V: PartialEq, A: ProgressAnimator> ChangeTrigger<V, A> {
    /// Watch values for an existing gated site
    pub fn with_gate(gate: GatedTrigger<A>) -> Self {
        Self { gate, last: None }
    }

    /// Record `value`, triggering if it differs from the previous one.
    ///
    /// The first value only establishes the baseline. A change seen while
    /// disabled is recorded and never replayed.
    pub fn observe(&mut self, value: V) -> bool {
        let changed = matches!(&self.last, Some(previous) if *previous != value);
        self.last = Some(value);
        changed && self.gate.fire()
    }

    /// Advance the running leg
    pub fn update(&mut self, dt: f32) {
        self.gate.update(dt);
    }

    /// Open or close the gate
    pub fn set_enabled(&mut self, is_enabled: bool) {
        self.gate.set_enabled(is_enabled);
    }

    /// Last observed value
    pub fn last(&self) -> Option<&V> {
        self.last.as_ref()
    }

    /// Snapshot for rendering
    pub fn sample(&self) -> EffectConfiguration {
        self.gate.sample()
    }

    /// The trigger state
    pub fn state(&self) -> &TriggerState<A> {
        self.gate.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Phase;
    use kindle_motion::Curve;

    const FRAME: f32 = 1.0 / 60.0;

    #[test]
    fn test_schedule_ticks_once_per_interval() {
        let mut schedule = Schedule::new(1.0);
        assert!(!schedule.advance(0.5));
        assert!(!schedule.advance(0.4));
        assert!(schedule.advance(0.2));
        assert!((schedule.remaining() - 0.9).abs() < 1e-5);
    }

    #[test]
    fn test_schedule_does_not_catch_up() {
        let mut schedule = Schedule::new(1.0);
        assert!(schedule.advance(5.5));
        assert!(!schedule.advance(0.4));
        assert!(schedule.advance(0.2));
    }

    #[test]
    fn test_schedule_interval_normalizes() {
        assert_eq!(Schedule::new(0.0).interval(), MIN_INTERVAL);
        assert_eq!(Schedule::new(f32::NAN).interval(), MIN_INTERVAL);
    }

    #[test]
    fn test_scheduled_trigger_fires_on_tick() {
        let mut site = ScheduledTrigger::new(EffectAnimation::default(), 1.0, true);
        site.update(0.9);
        assert_eq!(site.state().phase(), Phase::Idle);
        site.update(0.2);
        assert_eq!(site.state().phase(), Phase::Presenting);
        assert_eq!(site.state().generation().value(), 1);
    }

    #[test]
    fn test_disabled_ticks_never_mutate() {
        let mut site = ScheduledTrigger::new(EffectAnimation::default(), 0.1, false);
        for _ in 0..600 {
            site.update(FRAME);
            assert_eq!(site.state().generation().value(), 0);
            assert!(!site.sample().is_active);
        }
        assert!(site.gate().dropped() > 0);
    }

    #[test]
    fn test_disable_mid_flight_finishes_to_idle() {
        let mut site = ScheduledTrigger::new(EffectAnimation::continuous(Curve::linear(1.0)), 0.5, true);
        site.update(0.5);
        assert!(site.state().is_active());
        let generation = site.state().generation();

        site.set_enabled(false);
        for _ in 0..300 {
            site.update(FRAME);
        }
        assert_eq!(site.state().phase(), Phase::Idle);
        assert_eq!(site.state().generation(), generation);
        assert_eq!(site.sample().progress, 0.0);
    }

    #[test]
    fn test_events_coalesce_ticks() {
        let mut site = ScheduledTrigger::new(EffectAnimation::default(), 10.0, true);
        let fired = site.apply_events([TriggerEvent::Tick, TriggerEvent::Tick, TriggerEvent::Tick]);
        assert_eq!(fired, 1);
        assert_eq!(site.state().generation().value(), 1);
    }

    #[test]
    fn test_events_trigger_individually() {
        let mut site = ScheduledTrigger::new(EffectAnimation::default(), 10.0, true);
        let fired = site.apply_events([TriggerEvent::Trigger, TriggerEvent::Trigger]);
        assert_eq!(fired, 2);
        assert_eq!(site.state().generation().value(), 2);
    }

    #[test]
    fn test_events_respect_enable_order() {
        let mut site = ScheduledTrigger::new(EffectAnimation::default(), 10.0, true);
        let fired = site.apply_events([
            TriggerEvent::SetEnabled(false),
            TriggerEvent::Tick,
            TriggerEvent::Trigger,
            TriggerEvent::SetEnabled(true),
            TriggerEvent::Tick,
        ]);
        assert_eq!(fired, 1);
        assert!(site.is_enabled());
        assert_eq!(site.gate().dropped(), 2);
    }

    #[test]
    fn test_change_trigger_needs_a_change() {
        let mut site = ChangeTrigger::new(EffectAnimation::default(), true);
        assert!(!site.observe(1));
        assert!(!site.observe(1));
        assert_eq!(site.state().generation().value(), 0);

        assert!(site.observe(2));
        assert_eq!(site.state().generation().value(), 1);
        assert_eq!(site.last(), Some(&2));
    }

    #[test]
    fn test_change_while_disabled_is_not_replayed() {
        let mut site = ChangeTrigger::new(EffectAnimation::default(), true);
        site.observe("a");
        site.set_enabled(false);
        assert!(!site.observe("b"));
        site.set_enabled(true);
        assert!(!site.observe("b"));
        assert_eq!(site.state().generation().value(), 0);
        assert!(site.observe("c"));
    }

    #[test]
    fn test_change_trigger_settles() {
        let mut site = ChangeTrigger::new(EffectAnimation::ease_in_out(), true);
        site.observe(0_u32);
        site.observe(1);
        for _ in 0..120 {
            site.update(FRAME);
        }
        assert!(site.state().is_settled());
        assert_eq!(site.sample().progress, 0.0);
    }
}
