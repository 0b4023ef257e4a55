use std::collections::HashMap;

use eframe::egui::{Pos2, Vec2};
use tracing::debug;

use crate::layout::LayoutEngine;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PointerId(pub u64);

impl PointerId {
    pub const MOUSE: Self = Self(0);
}

#[derive(Clone, Debug, PartialEq)]
struct DragSession {
    node_id: String,
    grab_offset: Vec2,
}

/// Turns pointer gestures over nodes into manual position overrides.
///
/// Positions are in layout coordinates; converting from screen space is the caller's job.
#[derive(Default)]
pub struct InteractionController {
    sessions: HashMap<PointerId, DragSession>,
}

impl InteractionController {
    /// Begins a drag of `node_id` on `pointer`. Returns false when nothing was grabbed.
    pub fn on_pointer_down(
        &mut self,
        engine: &mut LayoutEngine,
        pointer: PointerId,
        node_id: Option<&str>,
        position: Pos2,
    ) -> bool {
        let Some(node_id) = node_id else {
            return false;
        };
        if self.sessions.contains_key(&pointer) || self.is_dragging(node_id) {
            return false;
        }

        let Some(node_position) = engine.begin_override(node_id) else {
            return false;
        };

        debug!(?pointer, node = node_id, "drag started");
        self.sessions.insert(
            pointer,
            DragSession {
                node_id: node_id.to_owned(),
                grab_offset: node_position - position,
            },
        );
        true
    }

    pub fn on_pointer_move(&mut self, engine: &mut LayoutEngine, pointer: PointerId, position: Pos2) -> bool {
        let Some(session) = self.sessions.get(&pointer) else {
            return false;
        };
        engine.apply_override(&session.node_id, position + session.grab_offset)
    }

    pub fn on_pointer_up(&mut self, engine: &mut LayoutEngine, pointer: PointerId, position: Pos2) -> bool {
        let Some(session) = self.sessions.remove(&pointer) else {
            return false;
        };

        debug!(?pointer, node = %session.node_id, "drag finished");
        engine.end_override(&session.node_id, position + session.grab_offset)
    }

    pub fn is_dragging(&self, node_id: &str) -> bool {
        self.sessions.values().any(|session| session.node_id == node_id)
    }

    pub fn has_active_sessions(&self) -> bool {
        !self.sessions.is_empty()
    }

    /// Drops every session without touching the layout, used when the graph is replaced.
    pub fn reset(&mut self) {
        self.sessions.clear();
    }
}

/// Finds the node closest to `position` within `hit_radius`, in layout coordinates.
pub fn pick_node(engine: &LayoutEngine, position: Pos2, hit_radius: f32) -> Option<&str> {
    engine
        .nodes()
        .iter()
        .map(|node| (node, node.position.distance(position)))
        .filter(|(_, distance)| *distance <= hit_radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(node, _)| node.id.as_str())
}

#[cfg(test)]
mod tests {
    use crate::config::{Config, LayoutMode};
    use crate::layout::Viewport;
    use crate::topology::{NetworkDescriptor, NodeDescriptor, TopologySnapshot, build_graph};

    use super::*;

    fn engine(mode: LayoutMode) -> LayoutEngine {
        let mut config = Config::default().layout;
        config.mode = mode;
        let mut engine = LayoutEngine::from_config(&config);
        let graph = build_graph(&TopologySnapshot {
            nodes: ["router", "nginx-app", "coredns"]
                .iter()
                .map(|id| NodeDescriptor {
                    id: (*id).to_owned(),
                    label: None,
                    ip: None,
                    kind: None,
                })
                .collect(),
            networks: vec![NetworkDescriptor {
                id: "lan".to_owned(),
                label: None,
                members: vec!["router".to_owned(), "nginx-app".to_owned(), "coredns".to_owned()],
            }],
        });
        engine.reset(&graph, Viewport::new(800.0, 600.0));
        engine
    }

    #[test]
    fn test_pointer_down_on_empty_space_is_ignored() {
        let mut engine = engine(LayoutMode::Fixed);
        let mut controller = InteractionController::default();
        assert!(!controller.on_pointer_down(&mut engine, PointerId::MOUSE, None, Pos2::ZERO));
        assert!(!controller.has_active_sessions());
        assert!(!controller.on_pointer_move(&mut engine, PointerId::MOUSE, Pos2::ZERO));
        assert!(!controller.on_pointer_up(&mut engine, PointerId::MOUSE, Pos2::ZERO));
    }

    #[test]
    fn test_drag_keeps_grab_offset() {
        let mut engine = engine(LayoutMode::Fixed);
        let mut controller = InteractionController::default();
        let start = engine.position("nginx-app").unwrap();
        let grab = start + Vec2::new(5.0, -3.0);

        assert!(controller.on_pointer_down(&mut engine, PointerId::MOUSE, Some("nginx-app"), grab));
        assert!(controller.is_dragging("nginx-app"));

        controller.on_pointer_move(&mut engine, PointerId::MOUSE, grab + Vec2::new(100.0, 0.0));
        let expected = start + Vec2::new(100.0, 0.0);
        assert!(engine.position("nginx-app").unwrap().distance(expected) < 1e-3);

        assert!(controller.on_pointer_up(&mut engine, PointerId::MOUSE, grab + Vec2::new(100.0, 0.0)));
        assert!(!controller.is_dragging("nginx-app"));
        assert!(engine.position("nginx-app").unwrap().distance(expected) < 1e-3);
    }

    #[test]
    fn test_simulated_release_unpins_node() {
        let mut engine = engine(LayoutMode::Simulated);
        let mut controller = InteractionController::default();
        let start = engine.position("coredns").unwrap();

        controller.on_pointer_down(&mut engine, PointerId::MOUSE, Some("coredns"), start);
        controller.on_pointer_move(&mut engine, PointerId::MOUSE, Pos2::new(10.0, 10.0));
        assert!(engine.nodes().iter().any(|node| node.pinned.is_some()));

        controller.on_pointer_up(&mut engine, PointerId::MOUSE, Pos2::new(10.0, 10.0));
        assert!(engine.nodes().iter().all(|node| node.pinned.is_none()));
        assert!(engine.is_active());
    }

    #[test]
    fn test_two_pointers_cannot_share_a_node() {
        let mut engine = engine(LayoutMode::Fixed);
        let mut controller = InteractionController::default();
        let first = PointerId(1);
        let second = PointerId(2);

        assert!(controller.on_pointer_down(&mut engine, first, Some("nginx-app"), Pos2::ZERO));
        assert!(!controller.on_pointer_down(&mut engine, second, Some("nginx-app"), Pos2::ZERO));
        assert!(controller.on_pointer_down(&mut engine, second, Some("coredns"), Pos2::ZERO));
    }

    #[test]
    fn test_pointer_holds_at_most_one_session() {
        let mut engine = engine(LayoutMode::Fixed);
        let mut controller = InteractionController::default();

        assert!(controller.on_pointer_down(&mut engine, PointerId::MOUSE, Some("nginx-app"), Pos2::ZERO));
        assert!(!controller.on_pointer_down(&mut engine, PointerId::MOUSE, Some("coredns"), Pos2::ZERO));
        assert!(!controller.is_dragging("coredns"));
    }

    #[test]
    fn test_sessions_on_different_pointers_are_independent() {
        let mut engine = engine(LayoutMode::Fixed);
        let mut controller = InteractionController::default();
        let app_start = engine.position("nginx-app").unwrap();
        let coredns_start = engine.position("coredns").unwrap();

        controller.on_pointer_down(&mut engine, PointerId(1), Some("nginx-app"), app_start);
        controller.on_pointer_down(&mut engine, PointerId(2), Some("coredns"), coredns_start);
        controller.on_pointer_up(&mut engine, PointerId(1), Pos2::new(1.0, 1.0));

        assert!(!controller.is_dragging("nginx-app"));
        assert!(controller.is_dragging("coredns"));
        controller.on_pointer_move(&mut engine, PointerId(2), Pos2::new(7.0, 9.0));
        assert_eq!(engine.position("coredns"), Some(Pos2::new(7.0, 9.0)));
    }

    #[test]
    fn test_pick_node_prefers_closest_hit() {
        let engine = engine(LayoutMode::Fixed);
        let app = engine.position("nginx-app").unwrap();
        assert_eq!(pick_node(&engine, app + Vec2::new(2.0, 0.0), 20.0), Some("nginx-app"));
        assert_eq!(pick_node(&engine, Pos2::new(-500.0, -500.0), 20.0), None);
    }
}
