use bevy::prelude::*;
use bevy_egui::EguiContexts;
use std::time::Instant;

use crate::app::resources::CameraStore;
use crate::graph::{GraphState, PointerSample};

pub fn setup_scene(mut commands: Commands) {
    commands.insert_resource(ClearColor(Color::srgb(0.04, 0.05, 0.08)));
    commands.spawn(Camera2dBundle::default());
}

/// Feeds this frame's pointer state into the graph. Pan and zoom deltas are
/// coalesced by the camera controller and applied at projection time.
pub fn pointer_input(mut contexts: EguiContexts, mut st: ResMut<GraphState>) {
    let ctx = contexts.ctx_mut();
    let over_ui = ctx.wants_pointer_input() || ctx.is_pointer_over_area();
    let sample = ctx.input(|i| {
        let delta = i.pointer.delta();
        PointerSample {
            pos: i.pointer.hover_pos().map(|p| Vec2::new(p.x, p.y)),
            pressed: i.pointer.primary_pressed(),
            down: i.pointer.primary_down(),
            released: i.pointer.primary_released(),
            clicked: i.pointer.primary_clicked(),
            dragging: i.pointer.is_decidedly_dragging(),
            delta: Vec2::new(delta.x, delta.y),
            scroll: i.raw_scroll_delta.y,
            additive: i.modifiers.shift || i.modifiers.command,
            over_ui,
        }
    });
    st.handle_pointer(&sample);
}

pub fn persist_camera(mut st: ResMut<GraphState>, store: Res<CameraStore>) {
    let Some(store) = store.0.as_ref() else {
        return;
    };
    st.session.persist_camera(Instant::now(), store);
}

pub fn flush_camera_on_exit(
    mut exits: EventReader<AppExit>,
    mut st: ResMut<GraphState>,
    store: Res<CameraStore>,
) {
    if exits.read().next().is_none() {
        return;
    }
    let Some(store) = store.0.as_ref() else {
        return;
    };
    if let Err(err) = st.session.flush_camera(store) {
        warn!(error = %format!("{err:#}"), "failed to save camera on exit");
    }
}
