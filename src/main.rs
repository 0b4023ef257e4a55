mod activity;
mod app;
mod channel;
mod config;
mod error;
mod interaction;
mod layout;
mod session;
mod source;
mod status;
mod topology;
mod util;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::{NetVizApp, Startup};
use crate::config::{Config, LayoutMode};
use crate::source::EventSource;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    layout: Option<LayoutMode>,

    /// Newline-delimited event envelopes; `-` reads stdin.
    #[arg(long, conflicts_with = "connect")]
    events: Option<String>,

    /// Stream envelopes from a TCP endpoint, reconnecting when it drops.
    #[arg(long, value_name = "HOST:PORT")]
    connect: Option<String>,

    /// Delay between frames when replaying a file.
    #[arg(long, value_name = "MS")]
    replay_interval_ms: Option<u64>,

    /// Endpoint polled for the status table; an empty value turns it off.
    #[arg(long, value_name = "URL")]
    stats_url: Option<String>,
}

impl Args {
    fn event_source(&self) -> Option<EventSource> {
        if let Some(address) = &self.connect {
            return Some(EventSource::Tcp(address.clone()));
        }
        self.events.as_deref().map(EventSource::from_events_arg)
    }

    fn into_startup(self) -> anyhow::Result<Startup> {
        let mut config = Config::load(self.config.as_deref()).context("failed to load configuration")?;
        if let Some(mode) = self.layout {
            config.layout.mode = mode;
        }
        if let Some(url) = &self.stats_url {
            config.status.url = (!url.trim().is_empty()).then(|| url.clone());
        }

        Ok(Startup {
            source: self.event_source(),
            replay_interval: self.replay_interval_ms.map(Duration::from_millis),
            config,
        })
    }
}

fn main() -> anyhow::Result<()> {
    let local_offset = util::capture_local_offset();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let startup = Args::parse().into_startup()?;
    info!(
        layout = startup.config.layout.mode.label(),
        source = startup.source.as_ref().map(EventSource::describe).as_deref().unwrap_or("none"),
        status_url = startup.config.status.url.as_deref().unwrap_or("none"),
        %local_offset,
        "starting netviz"
    );

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "netviz",
        options,
        Box::new(move |cc| Ok(Box::new(NetVizApp::new(cc, startup)))),
    )
    .map_err(|error| anyhow::anyhow!("window failed: {error}"))
}
