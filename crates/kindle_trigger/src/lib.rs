// SPDX-License-Identifier: MIT OR Apache-2.0
//! Trigger state machine for Kindle effects.
//!
//! This crate turns discrete triggers into animated effect progress:
//! - [`TriggerState`], the per-site Idle/Presenting/Dismissing machine
//! - [`Tween`] and the [`ProgressAnimator`] seam it implements
//! - Enable-gated, scheduled and change-driven trigger sources
//! - A cross-thread inbox and tokio ticker for wall-clock schedules
//! - [`EffectHost`], owning many sites keyed by [`SiteId`]
//!
//! ## Threading
//!
//! Sites are plain owned values and are mutated from a single thread.
//! Anything running elsewhere talks to a site through a [`TriggerSender`].

pub mod animator;
pub mod host;
pub mod inbox;
pub mod source;
pub mod state;
pub mod ticker;

pub use animator::{ProgressAnimator, Tween};
pub use host::{EffectHost, HostError, SiteId};
pub use inbox::{channel, TriggerEvent, TriggerInbox, TriggerSender};
pub use source::{ChangeTrigger, GatedTrigger, Schedule, ScheduledTrigger, MIN_INTERVAL};
pub use state::{EffectConfiguration, EffectId, Generation, LegToken, Phase, TriggerState};
pub use ticker::Ticker;
