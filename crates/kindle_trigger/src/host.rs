// SPDX-License-Identifier: MIT OR Apache-2.0
//! Owner of a set of effect sites.
//!
//! The host is the single mutator of every site it holds. Triggers from
//! other threads arrive through each site's inbox and are applied during
//! [`EffectHost::update`].

use crate::inbox::{self, TriggerInbox, TriggerSender};
use crate::source::{GatedTrigger, ScheduledTrigger};
use crate::state::{EffectConfiguration, Phase};
use indexmap::IndexMap;
use kindle_motion::EffectAnimation;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for an effect site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteId(pub Uuid);

impl SiteId {
    /// Create a new random site ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SiteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for host operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// No site with this id is attached
    #[error("Unknown site: {0}")]
    UnknownSite(SiteId),
}

/// How a site gets fired besides explicit triggers
#[derive(Debug)]
enum SiteSource {
    Manual(GatedTrigger),
    Scheduled(ScheduledTrigger),
}

#[derive(Debug)]
struct Site {
    source: SiteSource,
    inbox: TriggerInbox,
    sender: TriggerSender,
}

impl Site {
    fn new(source: SiteSource) -> Self {
        let (sender, inbox) = inbox::channel();
        Self { source, inbox, sender }
    }

    fn gate(&self) -> &GatedTrigger {
        match &self.source {
            SiteSource::Manual(gate) => gate,
            SiteSource::Scheduled(scheduled) => scheduled.gate(),
        }
    }

    fn gate_mut(&mut self) -> &mut GatedTrigger {
        match &mut self.source {
            SiteSource::Manual(gate) => gate,
            SiteSource::Scheduled(scheduled) => scheduled.gate_mut(),
        }
    }

    fn update(&mut self, dt: f32) {
        let events = self.inbox.drain();
        if !events.is_empty() {
            self.gate_mut().apply_events(events);
        }
        match &mut self.source {
            SiteSource::Manual(gate) => gate.update(dt),
            SiteSource::Scheduled(scheduled) => scheduled.update(dt),
        }
    }
}

/// Collection of effect sites driven from one thread
#[derive(Debug, Default)]
pub struct EffectHost {
    sites: IndexMap<SiteId, Site>,
}

impl EffectHost {
    /// Create an empty host
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a site fired by [`EffectHost::trigger`] or through its sender
    pub fn attach(&mut self, animation: EffectAnimation, is_enabled: bool) -> SiteId {
        self.insert(Site::new(SiteSource::Manual(GatedTrigger::new(animation, is_enabled))))
    }

    /// Attach a site that triggers itself every `interval` seconds while
    /// enabled
    pub fn attach_scheduled(&mut self, animation: EffectAnimation, interval: f32, is_enabled: bool) -> SiteId {
        self.insert(Site::new(SiteSource::Scheduled(ScheduledTrigger::new(
            animation, interval, is_enabled,
        ))))
    }

    fn insert(&mut self, site: Site) -> SiteId {
        let id = SiteId::new();
        tracing::debug!(
            "Attached site {} (scheduled: {})",
            id,
            matches!(site.source, SiteSource::Scheduled(_))
        );
        self.sites.insert(id, site);
        id
    }

    /// Detach a site. Anything in flight is dropped with it
    pub fn detach(&mut self, id: SiteId) -> bool {
        let removed = self.sites.shift_remove(&id).is_some();
        if removed {
            tracing::debug!("Detached site {}", id);
        }
        removed
    }

    fn site(&self, id: SiteId) -> Result<&Site, HostError> {
        self.sites.get(&id).ok_or(HostError::UnknownSite(id))
    }

    fn site_mut(&mut self, id: SiteId) -> Result<&mut Site, HostError> {
        self.sites.get_mut(&id).ok_or(HostError::UnknownSite(id))
    }

    /// Trigger a site. `Ok(false)` means the site is disabled
    pub fn trigger(&mut self, id: SiteId) -> Result<bool, HostError> {
        Ok(self.site_mut(id)?.gate_mut().fire())
    }

    /// Open or close a site's gate
    pub fn set_enabled(&mut self, id: SiteId, is_enabled: bool) -> Result<(), HostError> {
        self.site_mut(id)?.gate_mut().set_enabled(is_enabled);
        Ok(())
    }

    /// Whether a site accepts triggers
    pub fn is_enabled(&self, id: SiteId) -> Result<bool, HostError> {
        Ok(self.site(id)?.gate().is_enabled())
    }

    /// Sender for delivering triggers to a site from another thread
    pub fn sender(&self, id: SiteId) -> Result<TriggerSender, HostError> {
        Ok(self.site(id)?.sender.clone())
    }

    /// Snapshot of one site
    pub fn sample(&self, id: SiteId) -> Result<EffectConfiguration, HostError> {
        Ok(self.site(id)?.gate().sample())
    }

    /// Phase of one site
    pub fn phase(&self, id: SiteId) -> Result<Phase, HostError> {
        Ok(self.site(id)?.gate().state().phase())
    }

    /// Apply pending events and advance every site by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        for site in self.sites.values_mut() {
            site.update(dt);
        }
    }

    /// Snapshots of all sites, in attach order
    pub fn samples(&self) -> impl Iterator<Item = (SiteId, EffectConfiguration)> + '_ {
        self.sites.iter().map(|(id, site)| (*id, site.gate().sample()))
    }

    /// Number of attached sites
    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    /// Whether every site is idle with nothing in flight
    pub fn is_settled(&self) -> bool {
        self.sites.values().all(|site| site.gate().state().is_settled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kindle_motion::Curve;

    const FRAME: f32 = 1.0 / 60.0;

    fn run(host: &mut EffectHost, seconds: f32) {
        let frames = (seconds / FRAME).round() as usize;
        for _ in 0..frames {
            host.update(FRAME);
        }
    }

    #[test]
    fn test_attach_and_trigger() {
        let mut host = EffectHost::new();
        let id = host.attach(EffectAnimation::default(), true);
        assert_eq!(host.site_count(), 1);
        assert!(host.is_settled());

        assert_eq!(host.trigger(id), Ok(true));
        assert_eq!(host.phase(id), Ok(Phase::Presenting));
        assert!(!host.is_settled());

        run(&mut host, 2.0);
        assert!(host.is_settled());
        assert_eq!(host.sample(id).map(|sample| sample.progress), Ok(0.0));
    }

    #[test]
    fn test_unknown_site() {
        let mut host = EffectHost::new();
        let id = host.attach(EffectAnimation::default(), true);
        assert!(host.detach(id));
        assert!(!host.detach(id));
        assert_eq!(host.trigger(id), Err(HostError::UnknownSite(id)));
        assert_eq!(host.sample(id), Err(HostError::UnknownSite(id)));
    }

    #[test]
    fn test_disabled_trigger_is_dropped() {
        let mut host = EffectHost::new();
        let id = host.attach(EffectAnimation::default(), false);
        assert_eq!(host.trigger(id), Ok(false));
        host.set_enabled(id, true).unwrap();
        assert_eq!(host.trigger(id), Ok(true));
        host.set_enabled(id, false).unwrap();
        assert_eq!(host.trigger(id), Ok(false));
        assert_eq!(host.phase(id), Ok(Phase::Presenting));
    }

    #[test]
    fn test_disabled_from_attach() {
        let mut host = EffectHost::new();
        let id = host.attach(EffectAnimation::default(), false);
        assert_eq!(host.is_enabled(id), Ok(false));
        assert_eq!(host.trigger(id), Ok(false));
        assert_eq!(host.phase(id), Ok(Phase::Idle));
    }

    #[test]
    fn test_scheduled_site_ticks() {
        let mut host = EffectHost::new();
        let id = host.attach_scheduled(EffectAnimation::continuous(Curve::linear(0.2)), 1.0, true);
        run(&mut host, 0.5);
        assert_eq!(host.phase(id), Ok(Phase::Idle));

        run(&mut host, 0.6);
        assert_ne!(host.phase(id), Ok(Phase::Idle));
    }

    #[test]
    fn test_sender_delivers_on_update() {
        let mut host = EffectHost::new();
        let id = host.attach(EffectAnimation::default(), true);
        let sender = host.sender(id).unwrap();

        std::thread::spawn(move || {
            sender.trigger();
        })
        .join()
        .unwrap();

        assert_eq!(host.phase(id), Ok(Phase::Idle));
        host.update(FRAME);
        assert_eq!(host.phase(id), Ok(Phase::Presenting));
    }

    #[test]
    fn test_sender_can_disable() {
        let mut host = EffectHost::new();
        let id = host.attach_scheduled(EffectAnimation::default(), 0.1, true);
        host.sender(id).unwrap().set_enabled(false);
        run(&mut host, 1.0);
        assert_eq!(host.is_enabled(id), Ok(false));
        assert_eq!(host.phase(id), Ok(Phase::Idle));
    }

    #[test]
    fn test_samples_in_attach_order() {
        let mut host = EffectHost::new();
        let first = host.attach(EffectAnimation::default(), true);
        let second = host.attach(EffectAnimation::instant(), true);
        let ids: Vec<SiteId> = host.samples().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn test_scheduled_site_settles_after_disable() {
        let mut host = EffectHost::new();
        let id = host.attach_scheduled(EffectAnimation::continuous(Curve::linear(0.4)), 0.5, true);
        run(&mut host, 0.55);
        assert_eq!(host.phase(id), Ok(Phase::Presenting));

        host.set_enabled(id, false).unwrap();
        run(&mut host, 2.0);
        assert!(host.is_settled());
        assert_eq!(host.sample(id).map(|sample| sample.progress), Ok(0.0));
    }
}
