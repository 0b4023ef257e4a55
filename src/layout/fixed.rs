use std::collections::{BTreeMap, HashMap};

use eframe::egui::{Pos2, Vec2};

use crate::topology::TopologyGraph;

use super::{LayoutNode, Viewport};

const CENTER_FRACTION: [f32; 2] = [0.5, 0.5];

pub struct FixedLayout {
    table: HashMap<String, [f32; 2]>,
    committed: HashMap<String, [f32; 2]>,
    viewport: Viewport,
    nodes: Vec<LayoutNode>,
    index_by_id: HashMap<String, usize>,
}

impl FixedLayout {
    pub fn new(table: &BTreeMap<String, [f32; 2]>) -> Self {
        Self {
            table: table
                .iter()
                .map(|(id, fraction)| (id.clone(), *fraction))
                .collect(),
            committed: HashMap::new(),
            viewport: Viewport::default(),
            nodes: Vec::new(),
            index_by_id: HashMap::new(),
        }
    }

    fn fraction_for(&self, id: &str) -> [f32; 2] {
        self.committed
            .get(id)
            .or_else(|| self.table.get(id))
            .copied()
            .unwrap_or(CENTER_FRACTION)
    }

    pub fn compute_initial_positions(&self, node_ids: &[String], viewport: Viewport) -> Vec<Pos2> {
        node_ids
            .iter()
            .map(|id| {
                let [fx, fy] = self.table.get(id).copied().unwrap_or(CENTER_FRACTION);
                viewport.at_fraction(fx, fy)
            })
            .collect()
    }

    pub fn reset(&mut self, graph: &TopologyGraph, viewport: Viewport) {
        let ids = graph
            .nodes
            .iter()
            .map(|node| node.id.clone())
            .collect::<Vec<_>>();
        let positions = self.compute_initial_positions(&ids, viewport);

        self.viewport = viewport;
        self.committed.clear();
        self.nodes = ids
            .into_iter()
            .zip(positions)
            .map(|(id, position)| LayoutNode::new(id, position))
            .collect();
        self.index_by_id = graph.index_by_id.clone();
    }

    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    pub fn position(&self, id: &str) -> Option<Pos2> {
        self.index_by_id
            .get(id)
            .map(|&index| self.nodes[index].position)
    }

    pub fn apply_override(&mut self, id: &str, position: Pos2) -> bool {
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };

        let node = &mut self.nodes[index];
        node.pinned = Some(position);
        node.position = position;
        true
    }

    /// Makes a dragged position permanent for the lifetime of the current snapshot.
    pub fn commit_override(&mut self, id: &str, position: Pos2) -> bool {
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };

        let (fx, fy) = self.viewport.fraction_of(position);
        self.committed.insert(id.to_owned(), [fx, fy]);
        let node = &mut self.nodes[index];
        node.pinned = None;
        node.position = position;
        node.velocity = Vec2::ZERO;
        true
    }

    pub fn resize(&mut self, viewport: Viewport) {
        if viewport == self.viewport {
            return;
        }

        self.viewport = viewport;
        for index in 0..self.nodes.len() {
            if self.nodes[index].pinned.is_some() {
                continue;
            }
            let [fx, fy] = self.fraction_for(&self.nodes[index].id);
            self.nodes[index].position = viewport.at_fraction(fx, fy);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::topology::{NodeDescriptor, TopologySnapshot, build_graph};

    use super::*;

    fn table() -> BTreeMap<String, [f32; 2]> {
        BTreeMap::from([
            ("router".to_owned(), [0.5, 0.25]),
            ("web".to_owned(), [0.2, 0.75]),
        ])
    }

    fn graph(ids: &[&str]) -> TopologyGraph {
        build_graph(&TopologySnapshot {
            nodes: ids
                .iter()
                .map(|id| NodeDescriptor {
                    id: (*id).to_owned(),
                    label: None,
                    ip: None,
                    kind: None,
                })
                .collect(),
            networks: vec![],
        })
    }

    #[test]
    fn test_known_ids_land_on_exact_fractions() {
        let mut layout = FixedLayout::new(&table());
        layout.reset(&graph(&["router", "web"]), Viewport::new(1000.0, 800.0));

        assert_eq!(layout.position("router"), Some(Pos2::new(500.0, 200.0)));
        assert_eq!(layout.position("web"), Some(Pos2::new(200.0, 600.0)));
    }

    #[test]
    fn test_unknown_id_lands_on_center() {
        let mut layout = FixedLayout::new(&table());
        layout.reset(&graph(&["mystery"]), Viewport::new(640.0, 480.0));
        assert_eq!(layout.position("mystery"), Some(Pos2::new(320.0, 240.0)));
    }

    #[test]
    fn test_compute_initial_positions_is_pure() {
        let layout = FixedLayout::new(&table());
        let ids = vec!["web".to_owned(), "other".to_owned()];
        let viewport = Viewport::new(100.0, 100.0);
        let positions = layout.compute_initial_positions(&ids, viewport);
        assert_eq!(positions, vec![Pos2::new(20.0, 75.0), Pos2::new(50.0, 50.0)]);
        assert!(layout.nodes().is_empty());
    }

    #[test]
    fn test_resize_rederives_from_fractions() {
        let mut layout = FixedLayout::new(&table());
        layout.reset(&graph(&["router", "web"]), Viewport::new(1000.0, 800.0));
        layout.resize(Viewport::new(500.0, 400.0));

        assert_eq!(layout.position("router"), Some(Pos2::new(250.0, 100.0)));
        assert_eq!(layout.position("web"), Some(Pos2::new(100.0, 300.0)));
    }

    #[test]
    fn test_committed_override_persists_across_resize() {
        let mut layout = FixedLayout::new(&table());
        layout.reset(&graph(&["router", "web"]), Viewport::new(1000.0, 800.0));

        assert!(layout.apply_override("web", Pos2::new(750.0, 400.0)));
        assert!(layout.commit_override("web", Pos2::new(750.0, 400.0)));
        assert_eq!(layout.position("web"), Some(Pos2::new(750.0, 400.0)));

        layout.resize(Viewport::new(500.0, 400.0));
        assert_eq!(layout.position("web"), Some(Pos2::new(375.0, 200.0)));
    }

    #[test]
    fn test_reset_forgets_committed_positions() {
        let mut layout = FixedLayout::new(&table());
        let graph = graph(&["router", "web"]);
        let viewport = Viewport::new(1000.0, 800.0);
        layout.reset(&graph, viewport);
        layout.commit_override("web", Pos2::new(10.0, 10.0));

        layout.reset(&graph, viewport);
        assert_eq!(layout.position("web"), Some(Pos2::new(200.0, 600.0)));
    }
}
