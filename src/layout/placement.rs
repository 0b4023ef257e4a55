use std::f32::consts::TAU;

use eframe::egui::{Pos2, vec2};
use rand::Rng;

use crate::config::InitialPlacement;
use crate::util::stable_pair;

use super::Viewport;

const RANDOM_MARGIN: f32 = 100.0;

/// Starting coordinates for a freshly built graph, in viewport space.
pub fn compute_initial_positions<R: Rng + ?Sized>(
    node_ids: &[String],
    viewport: Viewport,
    placement: InitialPlacement,
    rng: &mut R,
) -> Vec<Pos2> {
    match placement {
        InitialPlacement::Random => random_positions(node_ids.len(), viewport, rng),
        InitialPlacement::Radial => radial_positions(node_ids, viewport),
    }
}

fn random_positions<R: Rng + ?Sized>(count: usize, viewport: Viewport, rng: &mut R) -> Vec<Pos2> {
    let margin_x = RANDOM_MARGIN.min(viewport.width * 0.25);
    let margin_y = RANDOM_MARGIN.min(viewport.height * 0.25);
    let span_x = (viewport.width - margin_x * 2.0).max(1.0);
    let span_y = (viewport.height - margin_y * 2.0).max(1.0);

    (0..count)
        .map(|_| {
            Pos2::new(
                margin_x + rng.gen_range(0.0..span_x),
                margin_y + rng.gen_range(0.0..span_y),
            )
        })
        .collect()
}

pub(super) fn radial_positions(node_ids: &[String], viewport: Viewport) -> Vec<Pos2> {
    let count = node_ids.len();
    if count == 0 {
        return Vec::new();
    }

    let center = viewport.center();
    if count == 1 {
        return vec![center];
    }

    let radius = viewport.width.min(viewport.height) * 0.35;
    node_ids
        .iter()
        .enumerate()
        .map(|(index, id)| {
            let angle = (index as f32 / count as f32) * TAU;
            let (jx, jy) = stable_pair(id);
            let jitter = vec2(jx, jy) * (radius * 0.05);
            center + vec2(angle.cos(), angle.sin()) * radius + jitter
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn ids(count: usize) -> Vec<String> {
        (0..count).map(|index| format!("node-{index}")).collect()
    }

    #[test]
    fn test_random_positions_stay_inside_margins() {
        let viewport = Viewport::new(1000.0, 800.0);
        let mut rng = StdRng::seed_from_u64(7);
        let positions =
            compute_initial_positions(&ids(50), viewport, InitialPlacement::Random, &mut rng);

        assert_eq!(positions.len(), 50);
        for position in positions {
            assert!((100.0..=900.0).contains(&position.x));
            assert!((100.0..=700.0).contains(&position.y));
        }
    }

    #[test]
    fn test_radial_positions_circle_the_center() {
        let viewport = Viewport::new(800.0, 600.0);
        let mut rng = StdRng::seed_from_u64(1);
        let positions =
            compute_initial_positions(&ids(6), viewport, InitialPlacement::Radial, &mut rng);

        let radius = 600.0 * 0.35;
        for position in &positions {
            let distance = position.distance(viewport.center());
            assert!((distance - radius).abs() <= radius * 0.08);
        }

        let again = compute_initial_positions(&ids(6), viewport, InitialPlacement::Radial, &mut rng);
        assert_eq!(positions, again);
    }

    #[test]
    fn test_single_radial_node_sits_at_center() {
        let viewport = Viewport::new(640.0, 480.0);
        assert_eq!(radial_positions(&ids(1), viewport), vec![viewport.center()]);
        assert!(radial_positions(&[], viewport).is_empty());
    }
}
