use bevy::prelude::Res;
use bevy_egui::{egui, EguiContexts};
use knowgraph_core::{EngineState, Stage};

use crate::graph::GraphState;
use crate::ui::HUD_EDGE_PADDING;

fn ms(d: std::time::Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

pub fn hud_overlay(mut contexts: EguiContexts, st: Res<GraphState>) {
    let ctx = contexts.ctx_mut();
    let perf = st.session.perf();

    egui::Area::new(egui::Id::new("hud"))
        .order(egui::Order::Foreground)
        .anchor(
            egui::Align2::RIGHT_TOP,
            egui::vec2(-HUD_EDGE_PADDING, HUD_EDGE_PADDING),
        )
        .show(ctx, |ui| {
            ui.group(|ui| {
                ui.label(format!("FPS: {:.0}", perf.fps()));
                ui.label(format!(
                    "Physics: {:.2} ms avg / {:.2} ms max",
                    ms(perf.average(Stage::Physics)),
                    ms(perf.max(Stage::Physics))
                ));
                ui.label(format!(
                    "Render: {:.2} ms avg",
                    ms(perf.average(Stage::Render))
                ));
                ui.label(format!(
                    "Over budget ({:.1} ms): {}",
                    ms(perf.budget()),
                    perf.overruns(Stage::Physics)
                ));
                if let Some(frame) = st.session.frame() {
                    ui.label(format!(
                        "Visible: {} nodes / {} links",
                        frame.nodes.len(),
                        frame.links.len()
                    ));
                    ui.label(format!(
                        "Culled: {} nodes / {} links",
                        frame.stats.nodes_culled, frame.stats.links_culled
                    ));
                }
                ui.label(format!(
                    "Layout: {} (tick {})",
                    match st.session.engine_state() {
                        EngineState::Running => "running",
                        EngineState::Stabilized => "stabilized",
                    },
                    st.session.engine().ticks()
                ));
            });
        });
}
