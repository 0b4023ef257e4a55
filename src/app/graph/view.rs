use std::time::Instant;

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Sense, Stroke, Ui, vec2};

use crate::layout::Viewport;
use crate::session::{NODE_RADIUS, VisualizationSession};

use super::super::ViewModel;
use super::super::render_utils::{
    blend_color, circle_visible, draw_background, network_color, node_color, world_to_screen,
};

const LABEL_COLOR: Color32 = Color32::from_gray(226);
const IP_COLOR: Color32 = Color32::from_rgb(148, 163, 184);
const GLOW_COLOR: Color32 = Color32::from_rgb(250, 204, 21);

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui, session: &mut VisualizationSession, now: Instant) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        session.resize(Viewport::new(rect.width(), rect.height()));
        draw_background(&painter, rect, self.pan, self.zoom);

        self.handle_graph_zoom(ui, rect, &response);
        self.handle_node_drag(ui, rect, &response, session);
        self.handle_graph_pan(&response);
        self.update_hovered(ui, rect, session);

        let Some(graph) = session.graph() else {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "Waiting for topology...",
                FontId::proportional(18.0),
                IP_COLOR,
            );
            return;
        };

        let viewport = session.viewport();
        let layout = session.layout();
        let screen_positions = layout
            .nodes()
            .iter()
            .map(|node| world_to_screen(rect, self.pan, self.zoom, viewport, node.position))
            .collect::<Vec<Pos2>>();
        let radius = NODE_RADIUS * self.zoom;

        let edge_width = 2.0 * self.zoom.sqrt();
        for edge in &graph.edges {
            let (Some(&source), Some(&target)) = (
                graph.index_by_id.get(&edge.source),
                graph.index_by_id.get(&edge.target),
            ) else {
                continue;
            };
            let (Some(&start), Some(&end)) = (screen_positions.get(source), screen_positions.get(target))
            else {
                continue;
            };
            painter.line_segment([start, end], Stroke::new(edge_width, network_color(&edge.network)));
        }

        let activity = session.activity();
        let interaction = session.interaction();
        let mut glowing = false;

        for (index, node) in graph.nodes.iter().enumerate() {
            let Some(&position) = screen_positions.get(index) else {
                continue;
            };
            if !circle_visible(rect, position, radius * 2.0) {
                continue;
            }

            let base_color = node_color(&node.kind);
            let emphasis = activity.emphasis_level(&node.id, now);
            if emphasis > 0.0 {
                glowing = true;
                let alpha = (emphasis * 110.0) as u8;
                painter.circle_filled(
                    position,
                    radius + (10.0 * self.zoom),
                    Color32::from_rgba_unmultiplied(GLOW_COLOR.r(), GLOW_COLOR.g(), GLOW_COLOR.b(), alpha),
                );
            }

            let is_hovered = self.hovered.as_deref() == Some(node.id.as_str());
            let is_dragged = interaction.is_dragging(&node.id);
            let fill = blend_color(base_color, GLOW_COLOR, emphasis * 0.35);
            painter.circle_filled(position, radius, fill);

            let stroke = if is_dragged {
                Stroke::new(2.5, Color32::WHITE)
            } else if is_hovered {
                Stroke::new(2.0, Color32::from_gray(235))
            } else {
                Stroke::new(1.5, Color32::from_rgba_unmultiplied(15, 15, 15, 190))
            };
            painter.circle_stroke(position, radius, stroke);

            let font_scale = self.zoom.sqrt();
            painter.text(
                position + vec2(0.0, radius + (8.0 * self.zoom)),
                Align2::CENTER_TOP,
                node.label.as_str(),
                FontId::proportional(12.0 * font_scale),
                LABEL_COLOR,
            );
            if let Some(ip) = &node.ip {
                painter.text(
                    position - vec2(0.0, radius + (6.0 * self.zoom)),
                    Align2::CENTER_BOTTOM,
                    ip.as_str(),
                    FontId::proportional(10.0 * font_scale),
                    IP_COLOR,
                );
            }
        }

        if let Some(node) = self.hovered.as_deref().and_then(|id| graph.node(id)) {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::Grab);
            let panel_text = format!(
                "{}  |  {}  |  {}",
                node.label,
                node.kind.label(),
                node.ip.as_deref().unwrap_or("no address")
            );
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                panel_text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if glowing {
            ui.ctx().request_repaint();
        }
    }
}
