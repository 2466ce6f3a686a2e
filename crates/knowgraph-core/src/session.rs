//! Host-facing facade: one layout engine, its pending physics callback, the
//! camera and the per-frame projection, driven by explicit event handlers.

use glam::{Vec2, Vec3};
use std::collections::BTreeSet;
use std::time::Instant;

use crate::camera::{CameraController, ZoomRange};
use crate::layout::{
    EngineState, FrameOutcome, FrameRequest, LayoutEngine, LayoutParams, StepReport,
};
use crate::perf::{PerfMonitor, Stage};
use crate::persist::{save_camera, KvStore};
use crate::pipeline::{FocusCursor, Frame, PipelineParams, RenderPipeline, RenderSignals, Viewport};
use crate::traversal::TraversalHistory;
use crate::{Camera, GraphData, NodeId, VisibilityFilter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    NodeClicked { id: NodeId, additive: bool },
    HoverChanged(Option<NodeId>),
}

pub struct SessionConfig {
    pub layout: LayoutParams,
    pub pipeline: PipelineParams,
    pub default_camera: Camera,
    pub zoom_range: ZoomRange,
    pub perf: PerfMonitor,
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            layout: LayoutParams::default(),
            pipeline: PipelineParams::default(),
            default_camera: Camera::DEFAULT,
            zoom_range: ZoomRange::default(),
            perf: PerfMonitor::default(),
            seed: None,
        }
    }
}

pub struct GraphSession {
    data: GraphData,
    filter: VisibilityFilter,
    engine: LayoutEngine,
    pending: Option<FrameRequest>,
    camera: CameraController,
    pipeline: RenderPipeline,
    perf: PerfMonitor,
    selection: BTreeSet<NodeId>,
    path: Vec<NodeId>,
    hovered: Option<NodeId>,
    focus: FocusCursor,
    history: TraversalHistory,
    frame: Option<Frame>,
}

impl GraphSession {
    pub fn new(data: GraphData, camera: Camera, cfg: SessionConfig) -> Self {
        let engine = match cfg.seed {
            Some(seed) => LayoutEngine::with_seed(cfg.layout, seed),
            None => LayoutEngine::new(cfg.layout),
        };
        Self {
            data,
            filter: VisibilityFilter::all(),
            engine,
            pending: None,
            camera: CameraController::new(camera, cfg.default_camera, cfg.zoom_range),
            pipeline: RenderPipeline::new(cfg.pipeline),
            perf: cfg.perf,
            selection: BTreeSet::new(),
            path: Vec::new(),
            hovered: None,
            focus: FocusCursor::default(),
            history: TraversalHistory::default(),
            frame: None,
        }
    }

    pub fn data(&self) -> &GraphData {
        &self.data
    }

    pub fn filter(&self) -> &VisibilityFilter {
        &self.filter
    }

    pub fn engine(&self) -> &LayoutEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut LayoutEngine {
        &mut self.engine
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraController {
        &mut self.camera
    }

    pub fn perf(&self) -> &PerfMonitor {
        &self.perf
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    pub fn selection(&self) -> &BTreeSet<NodeId> {
        &self.selection
    }

    pub fn path(&self) -> &[NodeId] {
        &self.path
    }

    pub fn hovered(&self) -> Option<&NodeId> {
        self.hovered.as_ref()
    }

    pub fn focused(&self) -> Option<&NodeId> {
        self.focus.focused()
    }

    pub fn history(&self) -> &TraversalHistory {
        &self.history
    }

    pub fn is_scheduled(&self) -> bool {
        self.pending.is_some()
    }

    /// Rebuilds the layout for `filter`. Any pending physics callback from
    /// the previous node set is invalidated.
    pub fn initialize(&mut self, filter: VisibilityFilter) {
        self.filter = filter;
        self.pending = Some(self.engine.initialize(&self.data, &self.filter));
        self.hovered = None;
        self.frame = None;
    }

    pub fn set_data(&mut self, data: GraphData) {
        self.data = data;
        self.initialize(self.filter.clone());
    }

    pub fn teardown(&mut self) {
        self.engine.teardown();
        self.pending = None;
        self.hovered = None;
        self.focus.clear();
        self.frame = None;
    }

    pub fn set_layout_params(&mut self, params: LayoutParams) {
        self.engine.set_params(params);
        self.pending = self.engine.request();
    }

    pub fn wake(&mut self) {
        if let Some(req) = self.engine.wake() {
            self.pending = Some(req);
        }
    }

    /// Moves a node to `position` (dragging) and restarts the simulation.
    pub fn displace(&mut self, id: &NodeId, position: Vec3) {
        if let Some(req) = self.engine.displace(id, position) {
            self.pending = Some(req);
        }
    }

    /// Physics schedule entry point, call once per host frame.
    pub fn physics_frame(&mut self, now: Instant) -> Option<StepReport> {
        if self.pending.is_none() {
            self.pending = self.engine.request();
        }
        let req = self.pending?;
        let start = Instant::now();
        let outcome = self.engine.on_frame(req, now);
        self.pending = outcome.next();
        match outcome {
            FrameOutcome::Ticked { report, .. } => {
                self.perf.record(Stage::Physics, start.elapsed());
                Some(report)
            }
            FrameOutcome::Stale => {
                tracing::debug!("dropped stale physics callback");
                None
            }
            FrameOutcome::Throttled(_) | FrameOutcome::Settled => None,
        }
    }

    /// Render schedule entry point: applies coalesced camera input and
    /// projects the latest committed positions.
    pub fn render_frame(&mut self, now: Instant, viewport: Viewport, time: f32) -> &Frame {
        self.camera.apply_pending();
        if self.camera.is_animating() {
            self.camera.advance_animation(0.18);
        }

        let start = Instant::now();
        let signals = RenderSignals {
            selection: &self.selection,
            path: &self.path,
            hovered: self.hovered.as_ref(),
            focused: self.focus.focused(),
            traversal: &self.history,
            time,
        };
        let frame = self.pipeline.project_frame(
            self.engine.snapshot(),
            self.camera.camera(),
            viewport,
            &signals,
        );
        self.perf.record(Stage::Render, start.elapsed());
        self.perf.mark_frame(now);

        self.focus.retain_visible(&frame);
        if let Some(id) = &self.hovered {
            if frame.node(id).is_none() {
                self.hovered = None;
            }
        }
        self.frame.insert(frame)
    }

    /// Writes the camera once input has been quiet for the debounce window.
    pub fn persist_camera(&mut self, now: Instant, store: &dyn KvStore) {
        if let Some(cam) = self.camera.poll_persist(now) {
            if let Err(err) = save_camera(store, &cam) {
                tracing::warn!(error = %format!("{err:#}"), "failed to persist camera");
            }
        }
    }

    /// Writes any camera change still inside the debounce window.
    pub fn flush_camera(&mut self, store: &dyn KvStore) -> anyhow::Result<()> {
        match self.camera.flush_persist() {
            Some(cam) => save_camera(store, &cam),
            None => Ok(()),
        }
    }

    pub fn pointer_moved(&mut self, point: Option<Vec2>) -> Option<SessionEvent> {
        let hit = point.and_then(|p| {
            self.frame
                .as_ref()
                .and_then(|f| f.node_at(p))
                .map(|n| n.id.clone())
        });
        if hit == self.hovered {
            return None;
        }
        self.hovered = hit.clone();
        Some(SessionEvent::HoverChanged(hit))
    }

    /// Plain clicks replace the selection, additive clicks toggle membership.
    pub fn click(&mut self, point: Vec2, additive: bool) -> Option<SessionEvent> {
        let id = self.frame.as_ref()?.node_at(point)?.id.clone();
        self.select(id.clone(), additive);
        Some(SessionEvent::NodeClicked { id, additive })
    }

    pub fn select(&mut self, id: NodeId, additive: bool) {
        if additive {
            if !self.selection.remove(&id) {
                self.selection.insert(id.clone());
            }
        } else {
            self.selection.clear();
            self.selection.insert(id.clone());
        }
        self.history.visit(id);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.path.clear();
    }

    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.selection = ids.into_iter().collect();
    }

    pub fn set_path(&mut self, path: Vec<NodeId>) {
        self.path = path;
    }

    pub fn focus_next(&mut self) -> Option<NodeId> {
        let frame = self.frame.as_ref()?;
        self.focus.next(frame).cloned()
    }

    pub fn focus_prev(&mut self) -> Option<NodeId> {
        let frame = self.frame.as_ref()?;
        self.focus.prev(frame).cloned()
    }

    pub fn fit_camera(&mut self, viewport: Viewport, animate: bool) {
        let points = self.engine.nodes().iter().filter_map(|n| n.position);
        let Some(target) = self.camera.auto_frame(points, viewport) else {
            return;
        };
        if animate {
            self.camera.animate_toward(target);
        } else {
            self.camera.set(target);
        }
    }

    pub fn engine_state(&self) -> EngineState {
        self.engine.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::{load_camera, MemoryKvStore};
    use crate::{Group, LinkKind, LinkRecord, NodeRecord};
    use std::time::Duration;

    const VIEW: Viewport = Viewport {
        width: 800.0,
        height: 600.0,
    };

    fn data() -> GraphData {
        let mut nodes = vec![NodeRecord {
            id: NodeId::new("hub"),
            group: Group::Core,
            label: "Hub".to_string(),
            radius: 48.0,
            icon: None,
            description: Some("central node".to_string()),
        }];
        for (i, group) in [Group::Crm, Group::Crm, Group::Erp].into_iter().enumerate() {
            nodes.push(NodeRecord {
                id: NodeId::new(format!("n{i}")),
                group,
                label: format!("N{i}"),
                radius: 12.0,
                icon: None,
                description: None,
            });
        }
        let links = (0..3)
            .map(|i| LinkRecord {
                source: NodeId::new("hub"),
                target: NodeId::new(format!("n{i}")),
                kind: if i == 0 {
                    LinkKind::Backbone
                } else {
                    LinkKind::Normal
                },
            })
            .collect();
        GraphData {
            nodes,
            links,
            anchors: None,
        }
    }

    fn session() -> GraphSession {
        let cfg = SessionConfig {
            seed: Some(17),
            ..SessionConfig::default()
        };
        let mut s = GraphSession::new(data(), Camera::DEFAULT, cfg);
        s.initialize(VisibilityFilter::all());
        s
    }

    #[test]
    fn physics_runs_on_cadence_until_settled() {
        let mut s = session();
        let t0 = Instant::now();
        let mut ticks = 0;
        for i in 0..20_000u64 {
            if s.physics_frame(t0 + Duration::from_millis(i * 16)).is_some() {
                ticks += 1;
            }
            if !s.is_scheduled() {
                break;
            }
        }
        assert_eq!(s.engine_state(), EngineState::Stabilized);
        assert!(!s.is_scheduled());
        assert!(ticks > 0);
        assert_eq!(s.perf().samples(Stage::Physics), ticks);
    }

    #[test]
    fn filter_change_invalidates_pending_tick() {
        let mut s = session();
        let generation = s.engine().generation();
        s.initialize(VisibilityFilter::only([Group::Crm]));
        assert_eq!(s.engine().generation(), generation + 1);
        assert_eq!(s.engine().nodes().len(), 2);
        assert!(s.engine().links().is_empty());
        assert!(s.physics_frame(Instant::now()).is_some());
    }

    #[test]
    fn render_frame_reflects_camera_input_coalescing() {
        let mut s = session();
        s.fit_camera(VIEW, false);
        let before = s.camera().camera().x;
        s.camera_mut().queue_pan(10.0, 0.0);
        s.camera_mut().queue_pan(25.0, 0.0);
        s.render_frame(Instant::now(), VIEW, 0.0);
        assert_eq!(s.camera().camera().x, before + 25.0);
        assert_eq!(s.perf().samples(Stage::Render), 1);
    }

    #[test]
    fn click_and_hover_report_nodes_under_pointer() {
        let mut s = session();
        s.fit_camera(VIEW, false);
        let frame = s.render_frame(Instant::now(), VIEW, 0.0);
        let hub = frame.node(&NodeId::new("hub")).expect("hub visible").screen;

        assert_eq!(
            s.pointer_moved(Some(hub)),
            Some(SessionEvent::HoverChanged(Some(NodeId::new("hub"))))
        );
        assert_eq!(s.pointer_moved(Some(hub)), None);

        let ev = s.click(hub, false).expect("click hit");
        assert_eq!(
            ev,
            SessionEvent::NodeClicked {
                id: NodeId::new("hub"),
                additive: false
            }
        );
        assert!(s.selection().contains(&NodeId::new("hub")));

        s.click(hub, true);
        assert!(s.selection().is_empty());
        assert_eq!(s.pointer_moved(None), Some(SessionEvent::HoverChanged(None)));
    }

    #[test]
    fn camera_is_persisted_after_quiet_window() {
        let store = MemoryKvStore::new();
        let mut s = session();
        let t0 = Instant::now();
        s.camera_mut().pan(30.0, 5.0);
        s.persist_camera(t0, &store);
        assert_eq!(store.writes(), 0);
        s.persist_camera(t0 + Duration::from_millis(600), &store);
        assert_eq!(store.writes(), 1);
        assert_eq!(load_camera(&store, Camera::DEFAULT), *s.camera().camera());
    }

    #[test]
    fn teardown_stops_scheduling() {
        let mut s = session();
        s.teardown();
        assert!(!s.is_scheduled());
        assert!(s.physics_frame(Instant::now()).is_none());
        assert!(s.frame().is_none());
    }

    #[test]
    fn displacing_a_settled_node_reschedules_physics() {
        let mut s = session();
        s.engine_mut().run_until_stable(20_000);
        s.physics_frame(Instant::now());
        assert!(!s.is_scheduled());

        s.displace(&NodeId::new("n2"), Vec3::new(300.0, 0.0, 0.0));
        assert!(s.is_scheduled());
        assert_eq!(s.engine_state(), EngineState::Running);
        assert_eq!(
            s.engine().node(&NodeId::new("n2")).and_then(|n| n.position),
            Some(Vec3::new(300.0, 0.0, 0.0))
        );
    }
}
