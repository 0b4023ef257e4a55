use eframe::egui::{Vec2, vec2};

use super::quadtree::{Body, Quadtree, Source};

const MIN_DISTANCE: f32 = 1.0;

/// Direction used when two points coincide, spread by index so stacked nodes separate.
pub(super) fn jiggle(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

fn repulsion_between(point: Vec2, other: Vec2, index: usize, other_index: usize, strength: f32) -> Vec2 {
    let delta = point - other;
    let distance = delta.length();
    let direction = if distance > 0.0001 {
        delta / distance
    } else if index < other_index {
        jiggle(index, other_index)
    } else {
        -jiggle(other_index, index)
    };
    direction * (strength / distance.max(MIN_DISTANCE))
}

/// Total push on body `index` from every other body, with distant groups approximated.
pub(super) fn many_body(tree: &Quadtree<'_>, index: usize, strength: f32, theta: f32) -> Vec2 {
    let bodies = tree.bodies();
    let point = bodies[index].position;
    let mut force = Vec2::ZERO;

    tree.visit_sources(index, theta, |source| {
        force += match source {
            Source::Body(other) => {
                repulsion_between(point, bodies[other].position, index, other, strength)
            }
            Source::Cluster { centroid, mass } => {
                let delta = point - centroid;
                let distance = delta.length().max(MIN_DISTANCE);
                (delta / distance) * (strength * mass / distance)
            }
        };
    });
    force
}

fn push_apart(from: usize, to: usize, bodies: &[Body], strength: f32, forces: &mut [Vec2]) {
    let delta = bodies[from].position - bodies[to].position;
    let distance = delta.length();
    let min_distance = bodies[from].radius + bodies[to].radius;
    if distance >= min_distance {
        return;
    }

    let direction = if distance > 0.0001 {
        delta / distance
    } else {
        jiggle(from, to)
    };

    let overlap_push = (min_distance - distance) * 0.5 * strength;
    forces[from] += direction * overlap_push;
    forces[to] -= direction * overlap_push;
}

/// Splits every overlapping pair evenly; `forces` is indexed like the tree's bodies.
pub(super) fn collide(tree: &Quadtree<'_>, strength: f32, forces: &mut [Vec2]) {
    let bodies = tree.bodies();
    for index in 0..bodies.len() {
        tree.visit_overlaps(index, |other| push_apart(index, other, bodies, strength, forces));
    }
}

/// Spring pull along each edge toward `distance`, biased so low-degree endpoints move more.
pub(super) fn apply_links(
    edges: &[(usize, usize)],
    degrees: &[usize],
    positions: &[Vec2],
    velocities: &mut [Vec2],
    distance: f32,
    alpha: f32,
) {
    for &(source, target) in edges {
        if source == target || source >= positions.len() || target >= positions.len() {
            continue;
        }

        let source_degree = degrees[source].max(1) as f32;
        let target_degree = degrees[target].max(1) as f32;
        let strength = 1.0 / source_degree.min(target_degree);
        let bias = source_degree / (source_degree + target_degree);

        let mut delta = (positions[target] + velocities[target])
            - (positions[source] + velocities[source]);
        let mut length = delta.length();
        if length <= 0.0001 {
            delta = jiggle(source, target) * 0.0001;
            length = 0.0001;
        }

        let scale = (length - distance) / length * alpha * strength;
        let correction = delta * scale;
        velocities[target] -= correction * bias;
        velocities[source] += correction * (1.0 - bias);
    }
}
