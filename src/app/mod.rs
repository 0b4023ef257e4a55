use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use eframe::egui::{self, Context, Pos2, Vec2};
use tracing::{debug, warn};

use crate::channel::{TransportEvent, UpdateChannel};
use crate::config::Config;
use crate::error::VizError;
use crate::layout::Viewport;
use crate::session::VisualizationSession;
use crate::source::{EventSource, spawn_event_source};
use crate::status::{StatusTable, spawn_status_poller};
use crate::topology::StatsMap;

mod graph;
mod render_utils;
mod ui;

pub struct Startup {
    pub config: Config,
    pub source: Option<EventSource>,
    pub replay_interval: Option<Duration>,
}

pub struct NetVizApp {
    session: VisualizationSession,
    channel: UpdateChannel,
    events_rx: Option<Receiver<TransportEvent>>,
    status_rx: Option<Receiver<Result<StatsMap, VizError>>>,
    source_label: Option<String>,
    view: ViewModel,
}

struct ViewModel {
    pan: Vec2,
    zoom: f32,
    hovered: Option<String>,
    panning_with_primary: bool,
    last_drag_world: Option<Pos2>,
    seen_revision: u64,
    status_table: StatusTable,
    show_status_table: bool,
    status_enabled: bool,
}

impl ViewModel {
    fn new(status_enabled: bool) -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
            hovered: None,
            panning_with_primary: false,
            last_drag_world: None,
            seen_revision: 0,
            status_table: StatusTable::default(),
            show_status_table: status_enabled,
            status_enabled,
        }
    }
}

impl ViewModel {
    /// A new snapshot drops drag sessions, so any gesture state the view holds goes too.
    fn sync_revision(&mut self, session: &VisualizationSession) {
        if session.revision() == self.seen_revision {
            return;
        }
        self.seen_revision = session.revision();
        self.hovered = None;
        self.last_drag_world = None;
        self.panning_with_primary = false;
    }
}

impl NetVizApp {
    pub fn new(cc: &eframe::CreationContext<'_>, startup: Startup) -> Self {
        let Startup {
            config,
            source,
            replay_interval,
        } = startup;

        let source_label = source.as_ref().map(EventSource::describe);
        let events_rx = source.map(|source| {
            let ctx = cc.egui_ctx.clone();
            spawn_event_source(source, replay_interval, move || ctx.request_repaint())
        });

        let status_rx = config.status.url.clone().map(|url| {
            let ctx = cc.egui_ctx.clone();
            spawn_status_poller(url, config.status.poll_interval(), move || {
                ctx.request_repaint()
            })
        });

        let view = ViewModel::new(status_rx.is_some());
        Self {
            session: VisualizationSession::new(&config, Viewport::default()),
            channel: UpdateChannel::default(),
            events_rx,
            status_rx,
            source_label,
            view,
        }
    }

    fn drain_transport(&mut self) {
        let Some(rx) = self.events_rx.take() else {
            return;
        };

        loop {
            match rx.try_recv() {
                Ok(event) => self.channel.push(event),
                Err(TryRecvError::Empty) => {
                    self.events_rx = Some(rx);
                    return;
                }
                Err(TryRecvError::Disconnected) => {
                    debug!("event source thread finished");
                    return;
                }
            }
        }
    }

    fn drain_status(&mut self) {
        let Some(rx) = self.status_rx.take() else {
            return;
        };

        loop {
            match rx.try_recv() {
                Ok(result) => self.view.status_table.apply(result),
                Err(TryRecvError::Empty) => {
                    self.status_rx = Some(rx);
                    return;
                }
                Err(TryRecvError::Disconnected) => {
                    warn!("status poller stopped");
                    return;
                }
            }
        }
    }
}

impl eframe::App for NetVizApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.drain_transport();
        self.drain_status();

        let now = Instant::now();
        self.channel.process(&mut self.session, now);
        self.session.advance(now);
        self.view.sync_revision(&self.session);

        let mut restart_requested = false;
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                self.view.draw_top_bar(
                    ui,
                    &self.session,
                    &self.channel,
                    self.source_label.as_deref(),
                    &mut restart_requested,
                )
            });
        if restart_requested {
            self.session.restart_layout();
        }

        if self.view.show_status_table {
            egui::TopBottomPanel::bottom("status_table")
                .resizable(true)
                .default_height(200.0)
                .show(ctx, |ui| self.view.draw_status_table(ui));
        }

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.view.draw_details(ui, &mut self.session, now));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.view.draw_graph(ui, &mut self.session, now));

        if self.session.interaction().has_active_sessions() {
            ctx.request_repaint();
        } else if let Some(delay) = self.session.next_wakeup(Instant::now()) {
            ctx.request_repaint_after(delay);
        }
    }
}
