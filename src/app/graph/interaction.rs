use eframe::egui::{self, PointerButton, Pos2, Rect, Ui};

use crate::interaction::PointerId;
use crate::session::VisualizationSession;

use super::super::ViewModel;
use super::super::render_utils::{MAX_ZOOM, MIN_ZOOM, screen_to_world};

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let offset_before = (pointer - rect.center() - self.pan) / self.zoom;

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = pointer - rect.center() - (offset_before * self.zoom);
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(PointerButton::Secondary)
            || response.dragged_by(PointerButton::Middle)
            || (self.panning_with_primary && response.dragged_by(PointerButton::Primary))
        {
            self.pan += response.drag_delta();
        }
        if response.drag_stopped() {
            self.panning_with_primary = false;
        }
    }

    /// Forwards primary-button drags to the session; a drag that starts off any node pans instead.
    pub(in crate::app) fn handle_node_drag(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
        session: &mut VisualizationSession,
    ) {
        let viewport = session.viewport();
        let to_world = |screen: Pos2| screen_to_world(rect, self.pan, self.zoom, viewport, screen);

        if response.drag_started_by(PointerButton::Primary) {
            let origin = ui
                .input(|input| input.pointer.press_origin())
                .or_else(|| response.interact_pointer_pos());
            if let Some(origin) = origin {
                let world = to_world(origin);
                let grabbed = session.pointer_down(PointerId::MOUSE, world);
                self.panning_with_primary = !grabbed;
                self.last_drag_world = grabbed.then_some(world);
            }
        }

        if self.last_drag_world.is_some()
            && response.dragged_by(PointerButton::Primary)
            && let Some(pointer) = response.interact_pointer_pos()
        {
            let world = to_world(pointer);
            session.pointer_move(PointerId::MOUSE, world);
            self.last_drag_world = Some(world);
        }

        if response.drag_stopped_by(PointerButton::Primary)
            && let Some(last) = self.last_drag_world.take()
        {
            let world = response.interact_pointer_pos().map(to_world).unwrap_or(last);
            session.pointer_up(PointerId::MOUSE, world);
        }
    }

    pub(in crate::app) fn update_hovered(&mut self, ui: &Ui, rect: Rect, session: &VisualizationSession) {
        let viewport = session.viewport();
        self.hovered = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|pointer| rect.contains(*pointer))
            .and_then(|pointer| {
                let world = screen_to_world(rect, self.pan, self.zoom, viewport, pointer);
                session.node_at(world).map(str::to_owned)
            });
    }
}
