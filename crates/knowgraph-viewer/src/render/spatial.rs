use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};
use knowgraph_core::pipeline::{Glow, LinkEmphasis, Viewport};
use knowgraph_core::Group;
use std::time::Instant;

use crate::graph::GraphState;

pub fn group_color(group: Group) -> egui::Color32 {
    match group {
        Group::Core => egui::Color32::from_rgb(250, 204, 21),
        Group::Ai => egui::Color32::from_rgb(168, 85, 247),
        Group::Data => egui::Color32::from_rgb(59, 130, 246),
        Group::Erp => egui::Color32::from_rgb(16, 185, 129),
        Group::Crm => egui::Color32::from_rgb(244, 114, 182),
        Group::Commerce => egui::Color32::from_rgb(249, 115, 22),
        Group::Finance => egui::Color32::from_rgb(34, 211, 238),
        Group::Operations => egui::Color32::from_rgb(148, 163, 184),
    }
}

/// Strongest emphasis wins the colour; opacity and width come from the frame.
pub fn link_color(e: &LinkEmphasis) -> egui::Color32 {
    if e.highway {
        egui::Color32::from_rgb(125, 211, 252)
    } else if e.path {
        egui::Color32::from_rgb(253, 224, 71)
    } else if e.traversal > 0.0 {
        egui::Color32::from_rgb(196, 181, 253)
    } else if e.backbone {
        egui::Color32::from_rgb(203, 213, 225)
    } else {
        egui::Color32::from_rgb(100, 116, 139)
    }
}

/// Far nodes fade toward the background.
pub fn depth_fade(scale: f32) -> f32 {
    (0.35 + scale * 0.65).clamp(0.35, 1.0)
}

fn pos(v: Vec2, origin: Vec2) -> egui::Pos2 {
    egui::pos2(v.x + origin.x, v.y + origin.y)
}

/// Render schedule: sizes the drawing surface to the space left by panels and
/// projects the current layout into it.
pub fn project_scene(mut contexts: EguiContexts, mut st: ResMut<GraphState>) {
    let rect = contexts.ctx_mut().available_rect();
    if rect.width() <= 1.0 || rect.height() <= 1.0 {
        return;
    }
    st.origin = Vec2::new(rect.min.x, rect.min.y);
    st.viewport = Viewport::new(rect.width(), rect.height());
    if std::mem::take(&mut st.ui.fit_pending) {
        st.fit_view(false);
    }
    let viewport = st.viewport;
    let time = st.elapsed();
    st.session.render_frame(Instant::now(), viewport, time);
}

pub fn draw_scene(mut contexts: EguiContexts, st: Res<GraphState>) {
    let Some(frame) = st.session.frame() else {
        return;
    };
    let painter = contexts.ctx_mut().layer_painter(egui::LayerId::background());
    let origin = st.origin;

    if st.ui.show_links {
        for link in &frame.links {
            let hovered = st
                .ui
                .hovered_link
                .as_ref()
                .is_some_and(|(s, t)| s == &link.source && t == &link.target);
            let (opacity, width) = if hovered {
                (1.0, link.width + 1.5)
            } else {
                (link.opacity, link.width)
            };
            painter.line_segment(
                [pos(link.from, origin), pos(link.to, origin)],
                egui::Stroke::new(width, link_color(&link.emphasis).gamma_multiply(opacity)),
            );
        }
    }

    for node in &frame.nodes {
        let c = pos(node.screen, origin);
        let color = group_color(node.group);

        match node.glow {
            Glow::Strong => {
                painter.circle_filled(c, node.size * 1.8, color.gamma_multiply(0.28));
            }
            Glow::Soft => {
                painter.circle_filled(c, node.size * 1.4, color.gamma_multiply(0.14));
            }
            Glow::None => {}
        }
        if let Some(r) = node.pulse_ring {
            painter.circle_stroke(c, r, egui::Stroke::new(1.5, color.gamma_multiply(0.55)));
        }

        painter.circle_filled(c, node.size, color.gamma_multiply(depth_fade(node.scale)));
        if node.master {
            painter.circle_stroke(c, node.size, egui::Stroke::new(1.0, egui::Color32::WHITE));
        }
        if node.selected {
            painter.circle_stroke(
                c,
                node.size + 3.0,
                egui::Stroke::new(2.0, egui::Color32::WHITE),
            );
        }
        if node.focused {
            painter.circle_stroke(
                c,
                node.size + 6.0,
                egui::Stroke::new(1.0, egui::Color32::YELLOW),
            );
        }

        if st.ui.show_labels && node.show_label {
            painter.text(
                c + egui::vec2(0.0, node.size + 4.0),
                egui::Align2::CENTER_TOP,
                st.label(&node.id),
                egui::FontId::proportional(12.0),
                egui::Color32::from_gray(225).gamma_multiply(depth_fade(node.scale)),
            );
        }
    }
}
