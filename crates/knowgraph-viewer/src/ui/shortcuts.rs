use bevy::prelude::ResMut;
use bevy_egui::{egui, EguiContexts};

use crate::graph::GraphState;

pub fn handle_shortcuts(mut contexts: EguiContexts, mut st: ResMut<GraphState>) {
    let ctx = contexts.ctx_mut();

    if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        st.escape();
    }
    if ctx.wants_keyboard_input() {
        return;
    }

    let (shift, command) = ctx.input(|i| (i.modifiers.shift, i.modifiers.command));
    let pressed = |key| ctx.input(|i| i.key_pressed(key));

    if pressed(egui::Key::P) && command {
        st.ui.search_open = true;
        return;
    }
    if pressed(egui::Key::Questionmark) {
        st.ui.help_open = !st.ui.help_open;
    }
    if pressed(egui::Key::Tab) {
        if shift {
            st.session.focus_prev();
        } else {
            st.session.focus_next();
        }
    }
    if pressed(egui::Key::Enter) {
        st.select_focused(shift || command);
    }
    if pressed(egui::Key::R) {
        st.session.camera_mut().reset();
    }
    if pressed(egui::Key::F) {
        st.fit_view(true);
    }
    if pressed(egui::Key::Space) {
        st.session.wake();
    }
}
