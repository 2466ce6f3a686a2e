use bevy::prelude::Res;
use bevy_egui::{egui, EguiContexts};
use knowgraph_core::LinkKind;

use crate::graph::GraphState;
use crate::ui::TOOLTIP_OFFSET;

pub fn render_tooltip(
    ctx: &egui::Context,
    id: &str,
    pos: egui::Pos2,
    lines: impl IntoIterator<Item = String>,
) {
    egui::Area::new(egui::Id::new(id))
        .order(egui::Order::Tooltip)
        .fixed_pos(pos)
        .interactable(false)
        .show(ctx, |ui| {
            ui.group(|ui| {
                for line in lines {
                    ui.label(line);
                }
            });
        });
}

impl GraphState {
    pub fn node_tooltip_lines(&self) -> Option<Vec<String>> {
        let id = self.session.hovered()?;
        let record = self.record(id)?;
        let mut lines = vec![
            record.label.clone(),
            format!("group: {}", record.group.as_str()),
        ];
        if let Some(node) = self.session.engine().node(id) {
            lines.push(format!("links: {}", node.degree));
        }
        if let Some(desc) = &record.description {
            lines.push(desc.clone());
        }
        Some(lines)
    }

    pub fn link_tooltip_lines(&self) -> Option<Vec<String>> {
        let (source, target) = self.ui.hovered_link.as_ref()?;
        let kind = self
            .session
            .engine()
            .links()
            .iter()
            .find(|l| &l.source == source && &l.target == target)
            .map(|l| l.kind)
            .unwrap_or_default();
        Some(vec![
            format!("{} \u{2194} {}", self.label(source), self.label(target)),
            match kind {
                LinkKind::Backbone => "backbone link".to_string(),
                LinkKind::Normal => "link".to_string(),
            },
        ])
    }
}

pub fn tooltip_overlay(mut contexts: EguiContexts, st: Res<GraphState>) {
    let ctx = contexts.ctx_mut();
    let Some(pointer) = ctx.input(|i| i.pointer.hover_pos()) else {
        return;
    };
    let Some(lines) = st.node_tooltip_lines().or_else(|| st.link_tooltip_lines()) else {
        return;
    };
    let pos = pointer + egui::vec2(TOOLTIP_OFFSET, TOOLTIP_OFFSET);
    render_tooltip(ctx, "graph_tooltip", pos, lines);
}
