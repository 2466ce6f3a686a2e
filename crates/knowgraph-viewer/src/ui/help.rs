use bevy::prelude::Res;
use bevy_egui::{egui, EguiContexts};

use crate::graph::GraphState;

pub fn help_overlay(mut contexts: EguiContexts, st: Res<GraphState>) {
    if !st.ui.help_open {
        return;
    }

    egui::Window::new("Help / Shortcuts")
        .collapsible(false)
        .resizable(false)
        .show(contexts.ctx_mut(), |ui| {
            ui.label("Drag background: pan");
            ui.label("Drag node: move it");
            ui.label("Scroll: zoom");
            ui.label("Click: select, Shift/Ctrl+Click: add or remove");
            ui.label("Tab / Shift+Tab: cycle keyboard focus");
            ui.label("Enter: select focused node");
            ui.label("R: reset camera");
            ui.label("F: fit graph to view");
            ui.label("Space: wake layout");
            ui.label("Ctrl+P: search");
            ui.label("Esc: close overlays, then clear selection");
            ui.label("?: toggle help");
        });
}
