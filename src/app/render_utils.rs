use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use crate::layout::Viewport;
use crate::topology::NodeKind;

pub(super) const MIN_ZOOM: f32 = 0.5;
pub(super) const MAX_ZOOM: f32 = 3.0;

const FALLBACK_NODE_COLOR: Color32 = Color32::from_rgb(100, 116, 139);

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn node_color(kind: &NodeKind) -> Color32 {
    match kind {
        NodeKind::Router => Color32::from_rgb(245, 158, 11),
        NodeKind::Switch => Color32::from_rgb(20, 184, 166),
        NodeKind::Dns => Color32::from_rgb(139, 92, 246),
        NodeKind::Web => Color32::from_rgb(16, 185, 129),
        NodeKind::Client => Color32::from_rgb(59, 130, 246),
        NodeKind::Dhcp => Color32::from_rgb(236, 72, 153),
        NodeKind::External | NodeKind::Other(_) => FALLBACK_NODE_COLOR,
    }
}

pub(super) fn network_color(network_id: &str) -> Color32 {
    match network_id {
        "vlan10" => Color32::from_rgba_unmultiplied(59, 130, 246, 110),
        "vlan20" => Color32::from_rgba_unmultiplied(236, 72, 153, 110),
        "wan" => Color32::from_rgba_unmultiplied(100, 116, 139, 110),
        _ => Color32::from_rgba_unmultiplied(255, 255, 255, 80),
    }
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(15, 23, 42));

    let step = (56.0 * zoom).max(20.0);
    let origin = rect.center() + pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(51, 65, 85, 70));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

/// Layout coordinates are centered on the viewport center so zoom pivots around the middle.
pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, viewport: Viewport, world: Pos2) -> Pos2 {
    rect.center() + pan + (world - viewport.center()) * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, viewport: Viewport, screen: Pos2) -> Pos2 {
    viewport.center() + (screen - rect.center() - pan) / zoom
}
