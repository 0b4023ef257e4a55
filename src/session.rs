use std::time::{Duration, Instant};

use eframe::egui::Pos2;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::activity::ActivityOverlay;
use crate::config::Config;
use crate::error::VizError;
use crate::interaction::{InteractionController, PointerId, pick_node};
use crate::layout::{LayoutEngine, Viewport};
use crate::topology::{StatsMap, TopologyGraph, build_from_value, parse_update};
use crate::util::wall_clock;

/// Radius of a node disc in layout coordinates.
pub const NODE_RADIUS: f32 = 25.0;

const MAX_TICKS_PER_ADVANCE: u32 = 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub error: VizError,
    pub clock: String,
}

/// Everything one viewport shows: the current graph, its layout, drag state and overlays.
pub struct VisualizationSession {
    viewport: Viewport,
    graph: Option<TopologyGraph>,
    layout: LayoutEngine,
    interaction: InteractionController,
    activity: ActivityOverlay,
    stats: StatsMap,
    iptables: Option<String>,
    diagnostic: Option<Diagnostic>,
    tick_interval: Duration,
    last_tick: Option<Instant>,
    revision: u64,
}

impl VisualizationSession {
    pub fn new(config: &Config, viewport: Viewport) -> Self {
        let layout = LayoutEngine::from_config(&config.layout);
        let activity = ActivityOverlay::new(&config.activity);
        let tick_interval = config.layout.tick_interval();
        Self {
            viewport,
            graph: None,
            layout,
            interaction: InteractionController::default(),
            activity,
            stats: StatsMap::new(),
            iptables: None,
            diagnostic: None,
            tick_interval,
            last_tick: None,
            revision: 0,
        }
    }

    /// Replaces the graph wholesale. A rejected snapshot leaves the current graph untouched.
    pub fn apply_topology(&mut self, data: &Value) -> Result<(), VizError> {
        let graph = build_from_value(data)?;

        self.interaction.reset();
        self.layout.reset(&graph, self.viewport);
        self.last_tick = None;
        self.revision += 1;
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            networks = graph.networks.len(),
            mode = self.layout.mode().label(),
            "applied topology snapshot"
        );
        self.graph = Some(graph);
        Ok(())
    }

    /// Routes each optional part of a `network_update` to its consumer. Readable parts are
    /// applied even when another part is rejected; the rejection is returned afterwards.
    pub fn apply_update(&mut self, data: &Value, now: Instant) -> Result<(), VizError> {
        let update = parse_update(data)?;
        let rejection = update.rejection();

        if let Some(activity) = update.activity {
            self.activity.record_activity(&activity, now);
        }
        if let Some(stats) = update.stats {
            debug!(entries = stats.len(), "stats refreshed");
            self.stats = stats;
        }
        if let Some(iptables) = update.iptables {
            self.iptables = Some(iptables);
        }
        rejection.map_or(Ok(()), Err)
    }

    pub fn report(&mut self, error: VizError) {
        warn!(kind = error.kind_label(), %error, "surfaced error");
        self.diagnostic = Some(Diagnostic {
            error,
            clock: wall_clock(),
        });
    }

    pub fn clear_diagnostic(&mut self) {
        self.diagnostic = None;
    }

    /// Runs the due layout ticks and emphasis expiries. Returns true when anything visible changed.
    pub fn advance(&mut self, now: Instant) -> bool {
        let mut changed = self.activity.expire(now);

        if !self.layout.is_active() {
            self.last_tick = None;
            return changed;
        }

        let due = match self.last_tick {
            None => 1,
            Some(last) => {
                let elapsed = now.saturating_duration_since(last);
                (elapsed.as_secs_f32() / self.tick_interval.as_secs_f32()).floor() as u32
            }
        };
        if due == 0 {
            return changed;
        }

        for _ in 0..due.min(MAX_TICKS_PER_ADVANCE) {
            if !self.layout.tick(None) {
                break;
            }
            changed = true;
        }
        self.last_tick = Some(now);
        changed
    }

    /// How long until `advance` has work to do again, if ever.
    pub fn next_wakeup(&self, now: Instant) -> Option<Duration> {
        if self.layout.is_active() {
            return Some(match self.last_tick {
                Some(last) => (last + self.tick_interval).saturating_duration_since(now),
                None => Duration::ZERO,
            });
        }

        self.activity
            .next_expiry()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    pub fn resize(&mut self, viewport: Viewport) {
        if viewport == self.viewport {
            return;
        }
        debug!(width = viewport.width, height = viewport.height, "viewport resized");
        self.viewport = viewport;
        self.layout.resize(viewport);
    }

    pub fn restart_layout(&mut self) {
        self.layout.restart();
        self.last_tick = None;
    }

    pub fn pointer_down(&mut self, pointer: PointerId, position: Pos2) -> bool {
        let node = pick_node(&self.layout, position, NODE_RADIUS).map(str::to_owned);
        self.interaction
            .on_pointer_down(&mut self.layout, pointer, node.as_deref(), position)
    }

    pub fn pointer_move(&mut self, pointer: PointerId, position: Pos2) -> bool {
        self.interaction
            .on_pointer_move(&mut self.layout, pointer, position)
    }

    pub fn pointer_up(&mut self, pointer: PointerId, position: Pos2) -> bool {
        self.interaction
            .on_pointer_up(&mut self.layout, pointer, position)
    }

    pub fn node_at(&self, position: Pos2) -> Option<&str> {
        pick_node(&self.layout, position, NODE_RADIUS)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn graph(&self) -> Option<&TopologyGraph> {
        self.graph.as_ref()
    }

    pub fn layout(&self) -> &LayoutEngine {
        &self.layout
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    pub fn activity(&self) -> &ActivityOverlay {
        &self.activity
    }

    pub fn stats(&self) -> &StatsMap {
        &self.stats
    }

    pub fn iptables(&self) -> Option<&str> {
        self.iptables.as_deref()
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        self.diagnostic.as_ref()
    }

    /// Bumped on every accepted snapshot.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
