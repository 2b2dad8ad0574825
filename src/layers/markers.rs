//! Pin and cluster drawing on the topmost marker surface.

use crate::core::config::{ClusteringConfig, InteractionConfig};
use crate::core::geo::IncidentStatus;
use crate::core::viewport::Viewport;
use crate::input::handler::hit_radius;
use crate::rendering::surface::{Color, Surface};
use crate::spatial::clustering::Marker;
use crate::spatial::index::HitTarget;

const OUTLINE: Color = Color::WHITE;
const SELECTED_RING: Color = Color::rgb(33, 33, 33);
const SELECTED_RING_GAP: f64 = 4.0;

/// Fill colour for an incident status.
pub fn status_color(status: IncidentStatus) -> Color {
    match status {
        IncidentStatus::Reported => Color::rgb(229, 57, 53),
        IncidentStatus::Investigating => Color::rgb(251, 140, 0),
        IncidentStatus::Resolved => Color::rgb(67, 160, 71),
    }
}

/// Draws this frame's markers and returns the hit targets of those that
/// ended up on the canvas, in drawing order.
pub fn draw_markers(
    surface: &mut dyn Surface,
    viewport: &Viewport,
    markers: &[Marker],
    selected: Option<&str>,
    clustering: &ClusteringConfig,
    interaction: &InteractionConfig,
) -> Vec<HitTarget> {
    let mut targets = Vec::with_capacity(markers.len());

    for (index, marker) in markers.iter().enumerate() {
        let pos = marker.position();
        let radius = marker.radius(clustering);
        if !pos.is_finite() || !viewport.contains_pixel(&pos, radius + SELECTED_RING_GAP) {
            continue;
        }

        let fill = status_color(marker.status());
        match marker {
            Marker::Pin(pin) => {
                if selected == Some(pin.id.as_str()) {
                    surface.stroke_circle(pos.x, pos.y, radius + SELECTED_RING_GAP, 2.0, SELECTED_RING);
                }
                surface.fill_circle(pos.x, pos.y, radius + 2.0, OUTLINE);
                surface.fill_circle(pos.x, pos.y, radius, fill);
            }
            Marker::Cluster(cluster) => {
                let holds_selected = selected
                    .map(|id| cluster.member_ids.iter().any(|m| m == id))
                    .unwrap_or(false);
                if holds_selected {
                    surface.stroke_circle(pos.x, pos.y, radius + SELECTED_RING_GAP, 2.0, SELECTED_RING);
                }
                surface.fill_circle(pos.x, pos.y, radius, fill.with_opacity(0.85));
                surface.stroke_circle(pos.x, pos.y, radius, 2.0, OUTLINE);
                surface.fill_text(pos.x, pos.y, &cluster.count.to_string(), OUTLINE);
            }
        }

        targets.push(HitTarget::new(index, pos, hit_radius(marker, clustering, interaction)));
    }

    targets
}
