use bevy::prelude::*;
use knowgraph_core::persist::{load_camera, KvStore, CAMERA_KEY};

use crate::app::resources::CameraStore;
use crate::graph::GraphState;
use crate::util::{config, dataset, store::FileKvStore};

pub mod resources;

pub struct KnowGraphViewerPlugin;

impl Plugin for KnowGraphViewerPlugin {
    fn build(&self, app: &mut App) {
        let cfg = config::load_or_default();
        let data = dataset::load_or_demo(cfg.dataset.as_deref());
        let store = FileKvStore::open_default();

        let restored = store.as_ref().is_some_and(|s| s.get(CAMERA_KEY).is_some());
        let camera = match &store {
            Some(s) => load_camera(s, cfg.default_camera),
            None => cfg.default_camera,
        };
        info!(
            nodes = data.nodes.len(),
            links = data.links.len(),
            restored_camera = restored,
            "graph loaded"
        );

        let mut st = GraphState::new(data, camera, cfg);
        st.ui.fit_pending = !restored;

        app.insert_resource(st)
            .insert_resource(CameraStore(store))
            .add_systems(Startup, crate::render::setup_scene)
            .add_systems(
                Update,
                (
                    crate::ui::handle_shortcuts,
                    crate::ui::ui_panel,
                    crate::ui::search_overlay,
                    crate::ui::help_overlay,
                    crate::ui::hud_overlay,
                    crate::render::pointer_input,
                    crate::graph::physics_tick,
                    crate::render::project_scene,
                    crate::render::draw_scene,
                    crate::ui::tooltip_overlay,
                    crate::render::persist_camera,
                )
                    .chain(),
            )
            .add_systems(Last, crate::render::flush_camera_on_exit);
    }
}
