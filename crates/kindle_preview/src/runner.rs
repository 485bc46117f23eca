// SPDX-License-Identifier: MIT OR Apache-2.0
//! Drives a scene frame by frame and writes each sample as a JSON line.

use crate::config::{PreviewConfig, SourceConfig};
use crate::error::PreviewError;
use kindle_motion::Keyframed;
use kindle_trigger::{EffectConfiguration, EffectHost, Phase, SiteId, Ticker};
use serde::Serialize;
use std::io::Write;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Where scheduled sites get their ticks from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleClock {
    /// Simulated time, advanced by the frame step
    Simulated,
    /// Tokio tickers feeding each site's inbox
    WallClock,
}

/// One output line
#[derive(Debug, Serialize)]
pub struct FrameRecord<'a> {
    /// Frame index, starting at 1
    pub frame: u64,
    /// Seconds since the start of the run
    pub time: f32,
    /// Site label
    pub site: &'a str,
    /// Effect snapshot
    #[serde(flatten)]
    pub effect: EffectConfiguration,
    /// Trigger phase
    pub phase: Phase,
    /// Keyframed payload at the current progress
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<[f32; 2]>,
}

#[derive(Debug)]
struct PreviewSite {
    id: SiteId,
    name: String,
    triggers_at: Vec<f32>,
    next_trigger: usize,
    interval: Option<f32>,
    disable_at: Option<f32>,
    payload: Option<Keyframed<[f32; 2]>>,
}

/// A scene being played
#[derive(Debug)]
pub struct Preview {
    host: EffectHost,
    sites: Vec<PreviewSite>,
    frame_step: f32,
    duration: f32,
    elapsed: f32,
    frame: u64,
}

impl Preview {
    /// Attach every site of `config` to a fresh host
    pub fn new(config: &PreviewConfig, clock: ScheduleClock) -> Self {
        let mut host = EffectHost::new();
        let sites = config
            .sites
            .iter()
            .map(|site| {
                let (id, triggers_at, interval, disable_at) = match &site.source {
                    SourceConfig::Manual { triggers_at } => {
                        let mut triggers_at = triggers_at.clone();
                        triggers_at.retain(|at| at.is_finite());
                        triggers_at.sort_by(f32::total_cmp);
                        (host.attach(site.animation, true), triggers_at, None, None)
                    }
                    SourceConfig::Scheduled {
                        interval,
                        enabled,
                        disable_at,
                    } => {
                        let id = match clock {
                            ScheduleClock::Simulated => {
                                host.attach_scheduled(site.animation, *interval, *enabled)
                            }
                            ScheduleClock::WallClock => host.attach(site.animation, *enabled),
                        };
                        (id, Vec::new(), Some(*interval), *disable_at)
                    }
                };
                PreviewSite {
                    id,
                    name: site.name.clone(),
                    triggers_at,
                    next_trigger: 0,
                    interval,
                    disable_at,
                    payload: site
                        .keyframes
                        .clone()
                        .map(|keyframes| Keyframed::new([0.0, 0.0], keyframes)),
                }
            })
            .collect();

        Self {
            host,
            sites,
            frame_step: config.frame_step(),
            duration: config.duration,
            elapsed: 0.0,
            frame: 0,
        }
    }

    /// Spawn one wall-clock ticker per scheduled site. Must be called
    /// from within a tokio runtime; dropping the tickers stops them.
    pub fn spawn_tickers(&self) -> Result<Vec<Ticker>, PreviewError> {
        let mut tickers = Vec::new();
        for site in &self.sites {
            if let Some(interval) = site.interval {
                let sender = self.host.sender(site.id)?;
                let interval = Duration::try_from_secs_f32(interval).unwrap_or_default();
                tickers.push(Ticker::spawn(interval, sender));
            }
        }
        Ok(tickers)
    }

    /// Apply scripted events due by now, then advance every site by `dt`
    pub fn step(&mut self, dt: f32) -> Result<(), PreviewError> {
        let now = self.elapsed;
        for site in &mut self.sites {
            while let Some(&at) = site.triggers_at.get(site.next_trigger) {
                if at > now {
                    break;
                }
                if !self.host.trigger(site.id)? {
                    tracing::debug!("Trigger on '{}' dropped, site disabled", site.name);
                }
                site.next_trigger += 1;
            }

            if site.disable_at.is_some_and(|at| at <= now) && self.host.is_enabled(site.id)? {
                self.host.set_enabled(site.id, false)?;
                tracing::info!("Disabled '{}' at {:.3}s", site.name, now);
            }
        }

        self.host.update(dt);
        self.elapsed += dt;
        self.frame += 1;
        Ok(())
    }

    /// Whether the scene has run its full duration
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration - self.frame_step * 0.5
    }

    /// Samples for the frame just stepped
    pub fn records(&self) -> impl Iterator<Item = FrameRecord<'_>> + '_ {
        self.sites.iter().filter_map(move |site| {
            let effect = self.host.sample(site.id).ok()?;
            let phase = self.host.phase(site.id).ok()?;
            Some(FrameRecord {
                frame: self.frame,
                time: self.elapsed,
                site: &site.name,
                effect,
                phase,
                value: site.payload.as_ref().map(|payload| payload.value_at(effect.progress)),
            })
        })
    }

    /// Write the current frame as JSON lines
    pub fn write_frame<W: Write>(&self, out: &mut W) -> Result<(), PreviewError> {
        for record in self.records() {
            serde_json::to_writer(&mut *out, &record)?;
            out.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Seconds per frame
    pub fn frame_step(&self) -> f32 {
        self.frame_step
    }

    /// Frames stepped so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// The host driving the sites
    pub fn host(&self) -> &EffectHost {
        &self.host
    }
}

/// Run a scene as fast as possible with a fixed frame step
pub fn run<W: Write>(config: &PreviewConfig, out: &mut W) -> Result<Preview, PreviewError> {
    config.validate()?;
    let mut preview = Preview::new(config, ScheduleClock::Simulated);
    let dt = preview.frame_step();
    while !preview.is_finished() {
        preview.step(dt)?;
        preview.write_frame(out)?;
    }
    tracing::info!(
        "Preview finished: {} frames, {} sites",
        preview.frame(),
        preview.host().site_count()
    );
    Ok(preview)
}

/// Run a scene paced by the wall clock, with scheduled sites fed by
/// tokio tickers
pub async fn run_realtime<W: Write>(config: &PreviewConfig, out: &mut W) -> Result<Preview, PreviewError> {
    config.validate()?;
    let mut preview = Preview::new(config, ScheduleClock::WallClock);
    let _tickers = preview.spawn_tickers()?;

    let period = Duration::try_from_secs_f32(preview.frame_step())
        .map_err(|e| PreviewError::Invalid(format!("frame step: {e}")))?;
    let mut frames = time::interval(period.max(Duration::from_millis(1)));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last = Instant::now();
    frames.tick().await;

    while !preview.is_finished() {
        frames.tick().await;
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;

        preview.step(dt)?;
        preview.write_frame(out)?;
        out.flush()?;
    }
    tracing::info!(
        "Realtime preview finished: {} frames, {} sites",
        preview.frame(),
        preview.host().site_count()
    );
    Ok(preview)
}
