use bevy::prelude::{ResMut, Vec2};
use knowgraph_core::{unproject, EngineState, NodeId};
use std::time::Instant;

use crate::graph::state::GraphState;

/// Physics schedule: hands the pending frame callback to the engine. The
/// engine throttles to its own tick interval and stops scheduling once the
/// layout settles.
pub fn physics_tick(mut st: ResMut<GraphState>) {
    let was_running = st.session.is_scheduled();
    let Some(report) = st.session.physics_frame(Instant::now()) else {
        return;
    };
    if was_running && report.state == EngineState::Stabilized {
        bevy::log::debug!(
            ticks = st.session.engine().ticks(),
            max_velocity = report.max_velocity,
            "layout settled"
        );
    }
}

impl GraphState {
    /// Keeps a dragged node under the pointer at the depth it was grabbed.
    pub fn drag_node_to(&mut self, id: &NodeId, depth: f32, pointer: Vec2) {
        let surface = self.to_surface(pointer);
        let cam = *self.session.camera().camera();
        let vp = self.viewport;
        if let Some(world) = unproject(surface, depth, &cam, vp.width, vp.height) {
            self.session.displace(id, world);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::config::ViewerConfig;
    use knowgraph_core::{project, Camera, GraphData};

    #[test]
    fn dragged_node_follows_pointer_and_wakes_layout() {
        let data = GraphData::demo().expect("demo dataset");
        let mut st = GraphState::new(data, Camera::DEFAULT, ViewerConfig::default());
        st.origin = Vec2::new(240.0, 0.0);
        st.session.engine_mut().run_until_stable(20_000);

        let id = NodeId::new("crm-leads");
        let depth = st
            .session
            .engine()
            .node(&id)
            .and_then(|n| n.position)
            .expect("positioned")
            .z;
        let pointer = Vec2::new(700.0, 220.0);
        st.drag_node_to(&id, depth, pointer);

        let pos = st.session.engine().node(&id).and_then(|n| n.position).expect("positioned");
        let p = project(pos, st.session.camera().camera(), st.viewport.width, st.viewport.height);
        assert!((p.screen - st.to_surface(pointer)).length() < 1e-2);
        assert_eq!(st.session.engine_state(), EngineState::Running);
    }
}
