mod fixed;
mod forces;
mod placement;
mod quadtree;
mod simulated;

use eframe::egui::{Pos2, Vec2};

use crate::config::{LayoutConfig, LayoutMode};
use crate::topology::TopologyGraph;

pub use fixed::FixedLayout;
pub use simulated::{REHEAT_ALPHA, SimulatedLayout};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    pub fn center(self) -> Pos2 {
        Pos2::new(self.width * 0.5, self.height * 0.5)
    }

    pub fn at_fraction(self, fx: f32, fy: f32) -> Pos2 {
        Pos2::new(fx * self.width, fy * self.height)
    }

    pub fn fraction_of(self, position: Pos2) -> (f32, f32) {
        (position.x / self.width, position.y / self.height)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutNode {
    pub id: String,
    pub position: Pos2,
    pub velocity: Vec2,
    pub pinned: Option<Pos2>,
}

impl LayoutNode {
    fn new(id: String, position: Pos2) -> Self {
        Self {
            id,
            position,
            velocity: Vec2::ZERO,
            pinned: None,
        }
    }
}

pub enum LayoutEngine {
    Simulated(SimulatedLayout),
    Fixed(FixedLayout),
}

impl LayoutEngine {
    pub fn from_config(config: &LayoutConfig) -> Self {
        match config.mode {
            LayoutMode::Simulated => Self::Simulated(SimulatedLayout::new(
                config.forces,
                config.initial_placement,
            )),
            LayoutMode::Fixed => Self::Fixed(FixedLayout::new(&config.fixed_positions)),
        }
    }

    pub fn mode(&self) -> LayoutMode {
        match self {
            Self::Simulated(_) => LayoutMode::Simulated,
            Self::Fixed(_) => LayoutMode::Fixed,
        }
    }

    /// Discards all layout state and places the nodes of `graph` from scratch.
    pub fn reset(&mut self, graph: &TopologyGraph, viewport: Viewport) {
        match self {
            Self::Simulated(layout) => layout.reset(graph, viewport, &mut rand::thread_rng()),
            Self::Fixed(layout) => layout.reset(graph, viewport),
        }
    }

    pub fn nodes(&self) -> &[LayoutNode] {
        match self {
            Self::Simulated(layout) => layout.nodes(),
            Self::Fixed(layout) => layout.nodes(),
        }
    }

    pub fn position(&self, id: &str) -> Option<Pos2> {
        match self {
            Self::Simulated(layout) => layout.position(id),
            Self::Fixed(layout) => layout.position(id),
        }
    }

    /// Current alpha of a simulated layout; fixed placement has none.
    pub fn energy(&self) -> Option<f32> {
        match self {
            Self::Simulated(layout) => Some(layout.alpha()),
            Self::Fixed(_) => None,
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            Self::Simulated(layout) => layout.is_running(),
            Self::Fixed(_) => false,
        }
    }

    /// Runs one simulation step. Fixed placement has no per-tick work.
    pub fn tick(&mut self, boost: Option<f32>) -> bool {
        match self {
            Self::Simulated(layout) => layout.tick(boost),
            Self::Fixed(_) => false,
        }
    }

    pub fn restart(&mut self) {
        if let Self::Simulated(layout) = self {
            layout.restart();
        }
    }

    /// Starts a manual placement of `id`, returning where the node currently is.
    pub fn begin_override(&mut self, id: &str) -> Option<Pos2> {
        let position = self.position(id)?;
        if let Self::Simulated(layout) = self {
            layout.set_alpha_target(REHEAT_ALPHA);
        }
        self.apply_override(id, position);
        Some(position)
    }

    pub fn apply_override(&mut self, id: &str, position: Pos2) -> bool {
        match self {
            Self::Simulated(layout) => layout.apply_override(id, position),
            Self::Fixed(layout) => layout.apply_override(id, position),
        }
    }

    /// Ends a manual placement: simulated layouts release the pin, fixed ones keep the spot.
    pub fn end_override(&mut self, id: &str, position: Pos2) -> bool {
        match self {
            Self::Simulated(layout) => layout.clear_override(id),
            Self::Fixed(layout) => layout.commit_override(id, position),
        }
    }

    pub fn resize(&mut self, viewport: Viewport) {
        match self {
            Self::Simulated(layout) => layout.resize(viewport),
            Self::Fixed(layout) => layout.resize(viewport),
        }
    }
}
