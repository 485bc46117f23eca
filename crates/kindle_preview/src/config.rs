// SPDX-License-Identifier: MIT OR Apache-2.0
//! Preview scene description, stored as RON.

use crate::error::PreviewError;
use kindle_motion::{Curve, EffectAnimation, KeyframeSet};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_enabled() -> bool {
    true
}

/// What fires a site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SourceConfig {
    /// Scripted triggers at fixed times, in seconds
    Manual {
        /// Trigger times
        #[serde(default)]
        triggers_at: Vec<f32>,
    },
    /// Triggers itself every `interval` seconds while enabled
    Scheduled {
        /// Seconds between ticks
        interval: f32,
        /// Initial enable state
        #[serde(default = "default_enabled")]
        enabled: bool,
        /// Time at which the site is disabled
        #[serde(default)]
        disable_at: Option<f32>,
    },
}

/// One effect site in the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Label used in the output
    pub name: String,
    /// Insertion and removal curves
    #[serde(default)]
    pub animation: EffectAnimation,
    /// Trigger source
    pub source: SourceConfig,
    /// Optional 2D payload sequenced by progress
    #[serde(default)]
    pub keyframes: Option<KeyframeSet<[f32; 2]>>,
}

/// A preview scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Frames per second
    pub frame_rate: f32,
    /// Length of the run, in seconds
    pub duration: f32,
    /// Pace frames by the wall clock instead of running flat out
    pub realtime: bool,
    /// Sites to drive
    pub sites: Vec<SiteConfig>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60.0,
            duration: 4.0,
            realtime: false,
            sites: vec![
                SiteConfig {
                    name: "tap".to_string(),
                    animation: EffectAnimation::continuous(Curve::spring(0.5, 0.7)),
                    source: SourceConfig::Manual {
                        triggers_at: vec![0.25, 0.4, 1.5],
                    },
                    keyframes: Some(KeyframeSet::evenly_spaced([
                        [0.0, 0.0],
                        [0.0, -12.0],
                        [0.0, 0.0],
                    ])),
                },
                SiteConfig {
                    name: "pulse".to_string(),
                    animation: EffectAnimation::ease_in_out(),
                    source: SourceConfig::Scheduled {
                        interval: 1.0,
                        enabled: true,
                        disable_at: Some(2.5),
                    },
                    keyframes: None,
                },
                SiteConfig {
                    name: "flash".to_string(),
                    animation: EffectAnimation::asymmetric(None, Some(Curve::spring(0.55, 1.0))),
                    source: SourceConfig::Manual {
                        triggers_at: vec![3.0],
                    },
                    keyframes: None,
                },
            ],
        }
    }
}

impl PreviewConfig {
    /// Load and validate a scene from a RON file
    pub fn load(path: &Path) -> Result<Self, PreviewError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron(&content)?;
        tracing::info!(
            "Loaded scene {} ({} sites)",
            path.display(),
            config.sites.len()
        );
        Ok(config)
    }

    /// Parse and validate a scene
    pub fn from_ron(content: &str) -> Result<Self, PreviewError> {
        let config: PreviewConfig = ron::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject scenes that cannot be run
    pub fn validate(&self) -> Result<(), PreviewError> {
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(PreviewError::Invalid(format!(
                "frame_rate must be positive, got {}",
                self.frame_rate
            )));
        }
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(PreviewError::Invalid(format!(
                "duration must be positive, got {}",
                self.duration
            )));
        }
        for site in &self.sites {
            if let SourceConfig::Scheduled { interval, .. } = site.source {
                if !(interval.is_finite() && interval > 0.0) {
                    return Err(PreviewError::Invalid(format!(
                        "site '{}' has non-positive interval {}",
                        site.name, interval
                    )));
                }
            }
        }
        Ok(())
    }

    /// Seconds per frame
    pub fn frame_step(&self) -> f32 {
        1.0 / self.frame_rate
    }
}
