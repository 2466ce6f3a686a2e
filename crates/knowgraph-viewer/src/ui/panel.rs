use bevy::prelude::ResMut;
use bevy_egui::{egui, EguiContexts};
use knowgraph_core::{EngineState, Group, VisibilityFilter};

use crate::graph::GraphState;
use crate::render::group_color;
use crate::ui::PANEL_W;
use crate::util::{config, dataset};

pub fn ui_panel(mut contexts: EguiContexts, mut st: ResMut<GraphState>) {
    egui::SidePanel::left("left")
        .default_width(PANEL_W)
        .show(contexts.ctx_mut(), |ui| {
            ui.heading("KnowGraph");
            let engine = st.session.engine();
            ui.label(format!(
                "nodes: {} / {}",
                engine.nodes().len(),
                st.session.data().nodes.len()
            ));
            ui.label(format!("links: {}", engine.links().len()));
            if ui.button("Reload dataset").clicked() {
                let data = dataset::load_or_demo(st.cfg.dataset.as_deref());
                st.replace_data(data);
            }
            ui.separator();

            ui.label("Groups:");
            for group in Group::ALL {
                let mut visible = st.session.filter().contains(group);
                ui.horizontal(|ui| {
                    let (rect, _) =
                        ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
                    ui.painter()
                        .circle_filled(rect.center(), 5.0, group_color(group));
                    if ui.checkbox(&mut visible, group.as_str()).changed() {
                        st.set_group_visible(group, visible);
                    }
                });
            }
            ui.horizontal(|ui| {
                if ui.button("All").clicked() {
                    st.apply_filter(VisibilityFilter::all());
                }
                if ui.button("Core only").clicked() {
                    st.apply_filter(VisibilityFilter::only([Group::Core]));
                }
            });

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.checkbox(&mut st.ui.show_links, "Links");
                ui.checkbox(&mut st.ui.show_labels, "Labels");
            });

            ui.add_space(8.0);
            ui.separator();
            ui.heading("Selection");
            ui.label(format!("selected: {}", st.ui.selection_order.len()));
            let mut path = st.ui.path_from_selection;
            if ui.checkbox(&mut path, "Path from selection").changed() {
                st.set_path_from_selection(path);
            }
            if !st.ui.selection_order.is_empty() && ui.button("Clear selection").clicked() {
                st.clear_selection();
            }

            ui.add_space(8.0);
            ui.separator();
            ui.heading("Layout");
            let state = match st.session.engine_state() {
                EngineState::Running => "running",
                EngineState::Stabilized => "stabilized",
            };
            ui.label(format!(
                "physics: {state} (v max {:.3})",
                st.session.engine().max_velocity()
            ));

            let mut params = st.session.engine().params().clone();
            let mut changed = false;
            changed |= ui
                .add(egui::Slider::new(&mut params.repulsion, 500.0..=12_000.0).text("repulsion"))
                .changed();
            changed |= ui
                .add(egui::Slider::new(&mut params.damping, 0.5..=0.98).text("damping"))
                .changed();
            changed |= ui
                .add(
                    egui::Slider::new(&mut params.backbone_rest, 50.0..=600.0)
                        .text("backbone length"),
                )
                .changed();
            changed |= ui
                .add(egui::Slider::new(&mut params.link_rest, 20.0..=400.0).text("link length"))
                .changed();
            changed |= ui
                .add(egui::Slider::new(&mut params.anchor_strength, 0.0..=0.05).text("anchor pull"))
                .changed();
            if changed {
                st.cfg.layout = params.clone();
                st.session.set_layout_params(params);
                st.session.wake();
            }
            if ui.button("Wake layout").clicked() {
                st.session.wake();
            }

            ui.add_space(8.0);
            ui.separator();
            ui.heading("Camera");
            ui.horizontal(|ui| {
                if ui.button("Reset camera").clicked() {
                    st.session.camera_mut().reset();
                }
                if ui.button("Fit").clicked() {
                    st.fit_view(true);
                }
            });

            ui.add_space(10.0);
            ui.separator();
            if ui.button("Search (Ctrl+P)").clicked() {
                st.ui.search_open = true;
            }
            if ui.button("Save settings").clicked() {
                let (links, labels) = (st.ui.show_links, st.ui.show_labels);
                st.cfg.show_links = links;
                st.cfg.show_labels = labels;
                match config::save(&st.cfg) {
                    Ok(()) => bevy::log::info!("viewer config saved"),
                    Err(err) => bevy::log::warn!(
                        error = %format!("{err:#}"),
                        "failed to save viewer config"
                    ),
                }
            }
        });
}
