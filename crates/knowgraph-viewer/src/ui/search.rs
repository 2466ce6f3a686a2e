use bevy::prelude::ResMut;
use bevy_egui::{egui, EguiContexts};
use knowgraph_core::NodeId;

use crate::graph::GraphState;

pub const SEARCH_LIMIT: usize = 30;

// Ctrl+P search overlay
pub fn search_overlay(mut contexts: EguiContexts, mut st: ResMut<GraphState>) {
    let ctx = contexts.ctx_mut();

    if !st.ui.search_open {
        return;
    }

    let mut open = true;
    egui::Window::new("Search / Jump (Ctrl+P)")
        .collapsible(false)
        .resizable(true)
        .open(&mut open)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Query:");
                let resp = ui.text_edit_singleline(&mut st.ui.search_query);
                if resp.changed() {
                    st.recompute_search_hits(SEARCH_LIMIT);
                }
                resp.request_focus();
            });

            ui.separator();
            let mut picked: Option<NodeId> = None;
            egui::ScrollArea::vertical()
                .max_height(260.0)
                .show(ui, |ui| {
                    for id in st.ui.search_hits.iter() {
                        let label = match st.record(id) {
                            Some(r) => format!("{} ({}, {})", r.label, r.group.as_str(), id),
                            None => id.to_string(),
                        };
                        if ui.selectable_label(false, label).clicked() {
                            picked = Some(id.clone());
                        }
                    }
                });

            if ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                if let Some(first) = st.ui.search_hits.first() {
                    picked = Some(first.clone());
                }
            }

            if let Some(id) = picked {
                st.jump_to(id);
                st.ui.search_open = false;
            }
        });

    if !open {
        st.ui.search_open = false;
    }
}
