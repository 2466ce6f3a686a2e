use bevy::prelude::{Resource, Vec2};
use knowgraph_core::pipeline::Viewport;
use knowgraph_core::{Camera, GraphData, GraphSession, Group, NodeId, NodeRecord, VisibilityFilter};
use std::collections::HashMap;
use std::time::Instant;

use crate::util::config::ViewerConfig;

/// An in-progress primary-button drag.
#[derive(Debug, Clone, PartialEq)]
pub enum Drag {
    Pan,
    /// Dragging a node; `depth` is its world z when the drag started.
    Node { id: NodeId, depth: f32 },
}

#[derive(Default)]
pub struct UiState {
    pub show_links: bool,
    pub show_labels: bool,
    /// Highlight the selection, in click order, as a path.
    pub path_from_selection: bool,
    pub selection_order: Vec<NodeId>,
    pub hovered_link: Option<(NodeId, NodeId)>,
    pub drag: Option<Drag>,
    /// Auto-frame once the drawing surface size is known.
    pub fit_pending: bool,

    pub search_open: bool,
    pub search_query: String,
    pub search_hits: Vec<NodeId>,
    pub help_open: bool,
}

#[derive(Resource)]
pub struct GraphState {
    pub session: GraphSession,
    pub ui: UiState,
    pub cfg: ViewerConfig,
    /// Top-left of the drawing surface in screen points.
    pub origin: Vec2,
    pub viewport: Viewport,
    records: HashMap<NodeId, usize>,
    started: Instant,
}

impl GraphState {
    pub fn new(data: GraphData, camera: Camera, cfg: ViewerConfig) -> Self {
        let records = index_records(&data);
        let mut session = GraphSession::new(data, camera, cfg.session_config());
        session.initialize(cfg.filter());
        Self {
            session,
            ui: UiState {
                show_links: cfg.show_links,
                show_labels: cfg.show_labels,
                ..UiState::default()
            },
            cfg,
            origin: Vec2::ZERO,
            viewport: Viewport::new(1280.0, 720.0),
            records,
            started: Instant::now(),
        }
    }

    pub fn record(&self, id: &NodeId) -> Option<&NodeRecord> {
        let &i = self.records.get(id)?;
        self.session.data().nodes.get(i)
    }

    pub fn label<'a>(&'a self, id: &'a NodeId) -> &'a str {
        self.record(id).map(|r| r.label.as_str()).unwrap_or(id.as_str())
    }

    pub fn elapsed(&self) -> f32 {
        self.started.elapsed().as_secs_f32()
    }

    /// Screen point to drawing-surface point.
    pub fn to_surface(&self, screen: Vec2) -> Vec2 {
        screen - self.origin
    }

    pub fn set_group_visible(&mut self, group: Group, visible: bool) {
        let mut filter = self.session.filter().clone();
        if filter.contains(group) == visible {
            return;
        }
        filter.toggle(group);
        self.apply_filter(filter);
    }

    /// Re-initializes the layout for `filter` and drops selection state for
    /// nodes that are no longer part of it.
    pub fn apply_filter(&mut self, filter: VisibilityFilter) {
        bevy::log::info!(groups = ?filter.0, "visibility filter changed");
        self.cfg.visible_groups = filter.0.iter().copied().collect();
        self.session.initialize(filter);

        let filter = self.session.filter().clone();
        let visible = |id: &NodeId| {
            self.record(id)
                .map(|r| filter.contains(r.group))
                .unwrap_or(false)
        };
        let kept: Vec<NodeId> = self
            .ui
            .selection_order
            .iter()
            .filter(|id| visible(id))
            .cloned()
            .collect();
        self.ui.selection_order = kept;
        self.ui.hovered_link = None;
        self.ui.drag = None;
        self.sync_selection();
    }

    pub fn replace_data(&mut self, data: GraphData) {
        self.records = index_records(&data);
        self.ui.selection_order.clear();
        self.session.set_data(data);
        self.sync_selection();
    }

    /// Plain clicks replace the selection, additive clicks toggle membership.
    pub fn click_node(&mut self, id: NodeId, additive: bool) {
        if additive {
            if let Some(pos) = self.ui.selection_order.iter().position(|s| s == &id) {
                self.ui.selection_order.remove(pos);
            } else {
                self.ui.selection_order.push(id.clone());
            }
        } else {
            self.ui.selection_order = vec![id.clone()];
        }
        self.session.select(id, additive);
        self.sync_selection();
    }

    pub fn clear_selection(&mut self) {
        self.ui.selection_order.clear();
        self.session.clear_selection();
    }

    pub fn set_path_from_selection(&mut self, on: bool) {
        self.ui.path_from_selection = on;
        self.sync_selection();
    }

    fn sync_selection(&mut self) {
        self.session
            .set_selection(self.ui.selection_order.iter().cloned());
        let path = if self.ui.path_from_selection && self.ui.selection_order.len() > 1 {
            self.ui.selection_order.clone()
        } else {
            Vec::new()
        };
        self.session.set_path(path);
    }

    /// Case-insensitive label/id match, sorted by label, at most `limit` hits.
    pub fn recompute_search_hits(&mut self, limit: usize) {
        let q = self.ui.search_query.trim().to_lowercase();
        if q.is_empty() {
            self.ui.search_hits.clear();
            return;
        }
        let filter = self.session.filter();
        let mut hits: Vec<&NodeRecord> = self
            .session
            .data()
            .nodes
            .iter()
            .filter(|n| filter.contains(n.group))
            .filter(|n| {
                n.label.to_lowercase().contains(&q) || n.id.as_str().to_lowercase().contains(&q)
            })
            .collect();
        hits.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.id.cmp(&b.id)));
        self.ui.search_hits = hits.into_iter().take(limit).map(|n| n.id.clone()).collect();
    }

    /// Selects `id` and animates the camera onto it.
    pub fn jump_to(&mut self, id: NodeId) {
        let Some(pos) = self.session.engine().node(&id).and_then(|n| n.position) else {
            return;
        };
        let cam = *self.session.camera().camera();
        self.session.camera_mut().animate_toward(Camera {
            x: -pos.x,
            y: -pos.y,
            ..cam
        });
        self.click_node(id, false);
    }
}

fn index_records(data: &GraphData) -> HashMap<NodeId, usize> {
    let mut records = HashMap::new();
    for (i, n) in data.nodes.iter().enumerate() {
        records.entry(n.id.clone()).or_insert(i);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowgraph_core::{LinkKind, LinkRecord};

    fn node(id: &str, group: Group, label: &str) -> NodeRecord {
        NodeRecord {
            id: NodeId::new(id),
            group,
            label: label.to_string(),
            radius: 12.0,
            icon: None,
            description: None,
        }
    }

    fn state() -> GraphState {
        let data = GraphData {
            nodes: vec![
                node("hub", Group::Core, "Hub"),
                node("ledger", Group::Finance, "Ledger"),
                node("leads", Group::Crm, "Leads"),
                node("accounts", Group::Crm, "Accounts"),
            ],
            links: vec![
                LinkRecord {
                    source: NodeId::new("hub"),
                    target: NodeId::new("leads"),
                    kind: LinkKind::Backbone,
                },
                LinkRecord {
                    source: NodeId::new("leads"),
                    target: NodeId::new("accounts"),
                    kind: LinkKind::Normal,
                },
            ],
            anchors: None,
        };
        GraphState::new(data, Camera::DEFAULT, ViewerConfig::default())
    }

    fn id(s: &str) -> NodeId {
        NodeId::new(s)
    }

    #[test]
    fn additive_clicks_build_ordered_path() {
        let mut st = state();
        st.click_node(id("hub"), false);
        st.click_node(id("leads"), true);
        st.click_node(id("accounts"), true);
        assert_eq!(st.session.selection().len(), 3);
        assert!(st.session.path().is_empty());

        st.set_path_from_selection(true);
        assert_eq!(st.session.path(), &[id("hub"), id("leads"), id("accounts")]);

        st.click_node(id("leads"), true);
        assert_eq!(st.session.path(), &[id("hub"), id("accounts")]);

        st.click_node(id("ledger"), false);
        assert!(st.session.path().is_empty());
        assert_eq!(st.ui.selection_order, vec![id("ledger")]);
    }

    #[test]
    fn hiding_a_group_drops_its_selection() {
        let mut st = state();
        st.click_node(id("hub"), false);
        st.click_node(id("leads"), true);
        let generation = st.session.engine().generation();

        st.set_group_visible(Group::Crm, false);
        assert_eq!(st.session.engine().generation(), generation + 1);
        assert_eq!(st.ui.selection_order, vec![id("hub")]);
        assert!(!st.cfg.visible_groups.contains(&Group::Crm));
        assert!(st.session.engine().node(&id("leads")).is_none());

        // no-op when already hidden
        st.set_group_visible(Group::Crm, false);
        assert_eq!(st.session.engine().generation(), generation + 1);
    }

    #[test]
    fn search_matches_visible_labels_sorted() {
        let mut st = state();
        st.ui.search_query = "LE".to_string();
        st.recompute_search_hits(10);
        assert_eq!(st.ui.search_hits, vec![id("leads"), id("ledger")]);

        st.set_group_visible(Group::Finance, false);
        st.recompute_search_hits(10);
        assert_eq!(st.ui.search_hits, vec![id("leads")]);

        st.recompute_search_hits(0);
        assert!(st.ui.search_hits.is_empty());
    }

    #[test]
    fn search_matches_ids_ignoring_case() {
        let data = GraphData {
            nodes: vec![node("ERP-Ledger", Group::Erp, "General book")],
            links: Vec::new(),
            anchors: None,
        };
        let mut st = GraphState::new(data, Camera::DEFAULT, ViewerConfig::default());
        for query in ["erp-led", "ERP-LED", "Ledger"] {
            st.ui.search_query = query.to_string();
            st.recompute_search_hits(10);
            assert_eq!(st.ui.search_hits, vec![id("ERP-Ledger")], "query {query}");
        }
    }

    #[test]
    fn jump_selects_and_targets_node() {
        let mut st = state();
        st.jump_to(id("ledger"));
        assert_eq!(st.ui.selection_order, vec![id("ledger")]);
        assert!(st.session.camera().is_animating());
        assert_eq!(st.label(&id("ledger")), "Ledger");
        assert_eq!(st.label(&id("ghost")), "ghost");
    }
}
