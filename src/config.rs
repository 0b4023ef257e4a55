use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_LOG_CAPACITY: usize = 10;
pub const DEFAULT_EMPHASIS_DECAY_MS: u64 = 1000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;
pub const DEFAULT_STATUS_URL: &str = "http://127.0.0.1:8080/api/stats";
pub const DEFAULT_TICK_RATE_HZ: f32 = 60.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Simulated,
    Fixed,
}

impl LayoutMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Simulated => "simulated",
            Self::Fixed => "fixed",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitialPlacement {
    #[default]
    Random,
    Radial,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForceSettings {
    pub link_distance: f32,
    pub repulsion_strength: f32,
    pub collision_radius: f32,
}

impl Default for ForceSettings {
    fn default() -> Self {
        Self {
            link_distance: 150.0,
            repulsion_strength: 400.0,
            collision_radius: 50.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub mode: LayoutMode,
    pub initial_placement: InitialPlacement,
    pub tick_rate_hz: f32,
    pub forces: ForceSettings,
    pub fixed_positions: BTreeMap<String, [f32; 2]>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            mode: LayoutMode::default(),
            initial_placement: InitialPlacement::default(),
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            forces: ForceSettings::default(),
            fixed_positions: default_fixed_positions(),
        }
    }
}

impl LayoutConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.tick_rate_hz)
    }
}

fn default_fixed_positions() -> BTreeMap<String, [f32; 2]> {
    [
        ("wan-host", [0.5, 0.1]),
        ("router", [0.5, 0.32]),
        ("coredns", [0.5, 0.58]),
        ("nginx-app", [0.2, 0.55]),
        ("client10", [0.2, 0.82]),
        ("dnsmasq", [0.8, 0.55]),
        ("client20", [0.8, 0.82]),
    ]
    .into_iter()
    .map(|(id, fraction)| (id.to_owned(), fraction))
    .collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActivityConfig {
    pub log_capacity: usize,
    pub emphasis_decay_ms: u64,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            log_capacity: DEFAULT_LOG_CAPACITY,
            emphasis_decay_ms: DEFAULT_EMPHASIS_DECAY_MS,
        }
    }
}

impl ActivityConfig {
    pub fn emphasis_decay(&self) -> Duration {
        Duration::from_millis(self.emphasis_decay_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatusConfig {
    /// `None` turns the status table off; an empty `url` in the file does the same.
    pub url: Option<String>,
    pub poll_interval_ms: u64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            url: Some(DEFAULT_STATUS_URL.to_owned()),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl StatusConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub layout: LayoutConfig,
    pub activity: ActivityConfig,
    pub status: StatusConfig,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw).context("failed to parse TOML")?;
        config.sanitize();
        Ok(config)
    }

    fn sanitize(&mut self) {
        if self.activity.log_capacity == 0 {
            warn!("activity.logCapacity must be at least 1; using 1");
            self.activity.log_capacity = 1;
        }

        if !(self.layout.tick_rate_hz.is_finite() && self.layout.tick_rate_hz > 0.0) {
            warn!(
                tick_rate_hz = self.layout.tick_rate_hz,
                "layout.tickRateHz must be positive; using default"
            );
            self.layout.tick_rate_hz = DEFAULT_TICK_RATE_HZ;
        }

        let forces = &mut self.layout.forces;
        if forces.link_distance < 0.0 {
            warn!("layout.forces.linkDistance must not be negative; using its magnitude");
            forces.link_distance = forces.link_distance.abs();
        }
        if forces.collision_radius < 0.0 {
            warn!("layout.forces.collisionRadius must not be negative; using its magnitude");
            forces.collision_radius = forces.collision_radius.abs();
        }
        // Negative strengths are accepted as the conventional "repel" sign.
        forces.repulsion_strength = forces.repulsion_strength.abs();

        if self.status.poll_interval_ms == 0 {
            warn!("status.pollIntervalMs must be positive; using default");
            self.status.poll_interval_ms = DEFAULT_POLL_INTERVAL_MS;
        }
        if self.status.url.as_deref().is_some_and(|url| url.trim().is_empty()) {
            self.status.url = None;
        }
    }
}
