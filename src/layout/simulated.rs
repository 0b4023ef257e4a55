use std::collections::HashMap;

use eframe::egui::{Pos2, Vec2};
use rand::Rng;
use tracing::debug;

use crate::config::{ForceSettings, InitialPlacement};
use crate::topology::TopologyGraph;

use super::forces::{apply_links, collide, many_body};
use super::placement::compute_initial_positions;
use super::quadtree::{Body, Quadtree};
use super::{LayoutNode, Viewport};

pub const ALPHA_MIN: f32 = 0.001;
/// Takes alpha from 1.0 to `ALPHA_MIN` in roughly 300 ticks.
pub const ALPHA_DECAY: f32 = 0.022_8;
pub const REHEAT_ALPHA: f32 = 0.3;
const VELOCITY_DECAY: f32 = 0.4;
const CENTER_STRENGTH: f32 = 1.0;
const COLLISION_STRENGTH: f32 = 1.0;
const BARNES_HUT_THETA: f32 = 0.9;

#[derive(Default)]
struct PhysicsScratch {
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    bodies: Vec<Body>,
    forces: Vec<Vec2>,
}

pub struct SimulatedLayout {
    forces: ForceSettings,
    placement: InitialPlacement,
    viewport: Viewport,
    nodes: Vec<LayoutNode>,
    index_by_id: HashMap<String, usize>,
    edges: Vec<(usize, usize)>,
    degrees: Vec<usize>,
    alpha: f32,
    alpha_target: f32,
    running: bool,
    scratch: PhysicsScratch,
}

impl SimulatedLayout {
    pub fn new(forces: ForceSettings, placement: InitialPlacement) -> Self {
        Self {
            forces,
            placement,
            viewport: Viewport::default(),
            nodes: Vec::new(),
            index_by_id: HashMap::new(),
            edges: Vec::new(),
            degrees: Vec::new(),
            alpha: 0.0,
            alpha_target: 0.0,
            running: false,
            scratch: PhysicsScratch::default(),
        }
    }

    pub fn reset<R: Rng + ?Sized>(&mut self, graph: &TopologyGraph, viewport: Viewport, rng: &mut R) {
        let ids = graph
            .nodes
            .iter()
            .map(|node| node.id.clone())
            .collect::<Vec<_>>();
        let positions = compute_initial_positions(&ids, viewport, self.placement, rng);

        self.viewport = viewport;
        self.nodes = ids
            .into_iter()
            .zip(positions)
            .map(|(id, position)| LayoutNode::new(id, position))
            .collect();
        self.index_by_id = graph.index_by_id.clone();
        self.edges = graph.edge_indices();
        self.degrees = vec![0; self.nodes.len()];
        for &(source, target) in &self.edges {
            self.degrees[source] += 1;
            self.degrees[target] += 1;
        }

        self.alpha = 1.0;
        self.alpha_target = 0.0;
        self.running = !self.nodes.is_empty();
    }

    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    pub fn position(&self, id: &str) -> Option<Pos2> {
        self.index_by_id
            .get(id)
            .map(|&index| self.nodes[index].position)
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Raises the energy to at least `energy` and re-arms the tick loop.
    pub fn reheat(&mut self, energy: f32) {
        self.alpha = self.alpha.max(energy);
        self.running = !self.nodes.is_empty();
    }

    pub fn restart(&mut self) {
        self.alpha = 1.0;
        self.alpha_target = 0.0;
        self.running = !self.nodes.is_empty();
    }

    pub fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target.max(0.0);
        if target > 0.0 {
            self.running = !self.nodes.is_empty();
        }
    }

    pub fn apply_override(&mut self, id: &str, position: Pos2) -> bool {
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };

        let node = &mut self.nodes[index];
        node.pinned = Some(position);
        node.position = position;
        node.velocity = Vec2::ZERO;
        true
    }

    /// Releases a pin so the node moves freely again, leaving enough energy to resettle.
    /// The layout only starts cooling once no other node is still pinned.
    pub fn clear_override(&mut self, id: &str) -> bool {
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };

        self.nodes[index].pinned = None;
        if !self.has_pins() {
            self.alpha_target = 0.0;
        }
        self.reheat(REHEAT_ALPHA);
        true
    }

    fn has_pins(&self) -> bool {
        self.nodes.iter().any(|node| node.pinned.is_some())
    }

    pub fn resize(&mut self, viewport: Viewport) {
        if viewport == self.viewport {
            return;
        }

        self.viewport = viewport;
        self.alpha = REHEAT_ALPHA;
        self.running = !self.nodes.is_empty();
    }

    /// Advances the simulation by one step. Returns false once the layout has come to rest.
    pub fn tick(&mut self, boost: Option<f32>) -> bool {
        if let Some(energy) = boost {
            self.reheat(energy);
        }

        if !self.running {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * ALPHA_DECAY;
        self.step();

        if self.alpha < ALPHA_MIN {
            self.running = false;
            debug!(alpha = self.alpha, "layout settled");
        }
        true
    }

    fn step(&mut self) {
        let node_count = self.nodes.len();
        if node_count == 0 {
            return;
        }

        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch.velocities.clear();
        for node in &self.nodes {
            scratch.positions.push(node.position.to_vec2());
            scratch.velocities.push(node.velocity);
        }

        let alpha = self.alpha;
        let positions = &scratch.positions;
        let velocities = &mut scratch.velocities;

        apply_links(
            &self.edges,
            &self.degrees,
            positions,
            velocities,
            self.forces.link_distance,
            alpha,
        );

        if node_count > 1 && self.forces.repulsion_strength > 0.0 {
            scratch.bodies.clear();
            scratch.bodies.extend(positions.iter().map(|&position| Body {
                position,
                radius: 0.0,
            }));
            if let Some(tree) = Quadtree::build(&scratch.bodies) {
                let strength = self.forces.repulsion_strength * alpha;
                for (index, velocity) in velocities.iter_mut().enumerate() {
                    *velocity += many_body(&tree, index, strength, BARNES_HUT_THETA);
                }
            }
        }

        let radius = self.forces.collision_radius;
        if node_count > 1 && radius > 0.0 {
            scratch.bodies.clear();
            scratch.bodies.extend(
                positions
                    .iter()
                    .zip(velocities.iter())
                    .map(|(position, velocity)| Body {
                        position: *position + *velocity,
                        radius,
                    }),
            );
            scratch.forces.clear();
            scratch.forces.resize(node_count, Vec2::ZERO);

            if let Some(tree) = Quadtree::build(&scratch.bodies) {
                collide(&tree, COLLISION_STRENGTH, &mut scratch.forces);
            }

            for (velocity, push) in velocities.iter_mut().zip(&scratch.forces) {
                *velocity += *push;
            }
        }

        let mut centroid = Vec2::ZERO;
        for position in positions {
            centroid += *position;
        }
        centroid /= node_count as f32;
        let shift = (self.viewport.center().to_vec2() - centroid) * CENTER_STRENGTH;

        let center = self.viewport.center();
        for (index, node) in self.nodes.iter_mut().enumerate() {
            if let Some(pinned) = node.pinned {
                node.position = pinned;
                node.velocity = Vec2::ZERO;
                continue;
            }

            let velocity = velocities[index] * (1.0 - VELOCITY_DECAY);
            let position = node.position + shift + velocity;
            if position.is_finite() && velocity.is_finite() {
                node.velocity = velocity;
                node.position = position;
            } else {
                node.velocity = Vec2::ZERO;
                node.position = center;
            }
        }
    }
}
