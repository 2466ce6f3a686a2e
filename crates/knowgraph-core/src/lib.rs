use anyhow::Context;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub mod camera;
pub mod coalesce;
pub mod layout;
pub mod perf;
pub mod persist;
pub mod pipeline;
pub mod projection;
pub mod session;
pub mod traversal;

pub use camera::CameraController;
pub use layout::{EngineState, FrameOutcome, FrameRequest, LayoutEngine, LayoutParams};
pub use perf::{PerfMonitor, Stage};
pub use pipeline::{FocusCursor, Frame, PipelineParams, RenderPipeline, RenderSignals, Viewport};
pub use projection::{project, screen_delta_to_pan, unproject, Projected};
pub use session::{GraphSession, SessionConfig, SessionEvent};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub const DEMO_GRAPH: &str = include_str!("../assets/demo_graph.json");

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    Core,
    Ai,
    Data,
    Erp,
    Crm,
    Commerce,
    Finance,
    Operations,
}

impl Group {
    pub const ALL: [Group; 8] = [
        Group::Core,
        Group::Ai,
        Group::Data,
        Group::Erp,
        Group::Crm,
        Group::Commerce,
        Group::Finance,
        Group::Operations,
    ];

    /// Master nodes of this group get the pulsing ring.
    pub const PULSE: Group = Group::Core;

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Ai => "ai",
            Self::Data => "data",
            Self::Erp => "erp",
            Self::Crm => "crm",
            Self::Commerce => "commerce",
            Self::Finance => "finance",
            Self::Operations => "operations",
        }
    }

    pub fn parse(input: &str) -> anyhow::Result<Self> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == input)
            .ok_or_else(|| anyhow::anyhow!("unknown group: {input}"))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    #[default]
    Normal,
    Backbone,
}

fn default_radius() -> f32 {
    12.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeRecord {
    pub id: NodeId,
    pub group: Group,
    pub label: String,
    #[serde(default = "default_radius")]
    pub radius: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkRecord {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub kind: LinkKind,
}

/// Read-only graph content, supplied once per visibility-filter change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphData {
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub links: Vec<LinkRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchors: Option<GroupAnchors>,
}

impl GraphData {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        serde_json::from_str(s).context("failed to parse graph dataset")
    }

    /// Bundled sample graph used when no dataset is configured.
    pub fn demo() -> anyhow::Result<Self> {
        Self::from_json(DEMO_GRAPH)
    }

    pub fn node(&self, id: &NodeId) -> Option<&NodeRecord> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn anchors(&self) -> GroupAnchors {
        self.anchors.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct GroupAnchors(pub BTreeMap<Group, Vec3>);

impl GroupAnchors {
    pub fn anchor(&self, group: Group) -> Vec3 {
        self.0.get(&group).copied().unwrap_or(Vec3::ZERO)
    }
}

impl Default for GroupAnchors {
    fn default() -> Self {
        let ring = 420.0;
        let mut map = BTreeMap::new();
        map.insert(Group::Core, Vec3::ZERO);
        let outer = &Group::ALL[1..];
        for (i, group) in outer.iter().enumerate() {
            let t = i as f32 / outer.len() as f32 * std::f32::consts::TAU;
            let y = if i % 2 == 0 { 60.0 } else { -60.0 };
            map.insert(*group, Vec3::new(ring * t.cos(), y, ring * t.sin()));
        }
        Self(map)
    }
}

/// Pan/dolly offsets plus field-of-view. Persisted as `{x, y, z, fov}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub fov: f32,
}

impl Camera {
    pub const DEFAULT: Camera = Camera {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        fov: 800.0,
    };

    pub fn lerp(&self, to: &Camera, t: f32) -> Camera {
        let t = t.clamp(0.0, 1.0);
        Camera {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
            z: self.z + (to.z - self.z) * t,
            fov: self.fov + (to.fov - self.fov) * t,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.fov.is_finite()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisibilityFilter(pub BTreeSet<Group>);

impl VisibilityFilter {
    pub fn all() -> Self {
        Self(Group::ALL.into_iter().collect())
    }

    pub fn only(groups: impl IntoIterator<Item = Group>) -> Self {
        Self(groups.into_iter().collect())
    }

    pub fn contains(&self, group: Group) -> bool {
        self.0.contains(&group)
    }

    pub fn toggle(&mut self, group: Group) {
        if !self.0.remove(&group) {
            self.0.insert(group);
        }
    }
}

impl Default for VisibilityFilter {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_parses_with_defaults() {
        let json = r#"{
            "nodes": [
                {"id": "hub", "group": "core", "label": "Hub", "radius": 48},
                {"id": "crm-1", "group": "crm", "label": "Leads"}
            ],
            "links": [
                {"source": "hub", "target": "crm-1", "kind": "backbone"},
                {"source": "crm-1", "target": "hub"}
            ]
        }"#;
        let data = GraphData::from_json(json).expect("parse dataset");
        assert_eq!(data.nodes.len(), 2);
        assert_eq!(data.nodes[1].radius, 12.0);
        assert_eq!(data.links[0].kind, LinkKind::Backbone);
        assert_eq!(data.links[1].kind, LinkKind::Normal);
        assert_eq!(data.anchors(), GroupAnchors::default());
    }

    #[test]
    fn dataset_rejects_unknown_group() {
        let json = r#"{"nodes": [{"id": "x", "group": "marketing", "label": "X"}]}"#;
        assert!(GraphData::from_json(json).is_err());
    }

    #[test]
    fn default_anchors_cover_every_group() {
        let anchors = GroupAnchors::default();
        for group in Group::ALL {
            assert!(anchors.0.contains_key(&group), "{group:?} has no anchor");
        }
        assert_eq!(anchors.anchor(Group::Core), Vec3::ZERO);
    }

    #[test]
    fn camera_serializes_as_flat_record() {
        let json = serde_json::to_string(&Camera::DEFAULT).expect("serialize camera");
        assert_eq!(json, r#"{"x":0.0,"y":0.0,"z":0.0,"fov":800.0}"#);
    }

    #[test]
    fn filter_toggle_adds_and_removes() {
        let mut filter = VisibilityFilter::only([Group::Crm]);
        filter.toggle(Group::Crm);
        assert!(!filter.contains(Group::Crm));
        filter.toggle(Group::Erp);
        assert!(filter.contains(Group::Erp));
    }

    #[test]
    fn demo_graph_links_resolve() {
        let data = GraphData::demo().expect("demo dataset");
        assert!(data.nodes.iter().any(|n| n.group == Group::PULSE && n.radius >= 40.0));
        for link in &data.links {
            assert!(data.node(&link.source).is_some(), "{}", link.source);
            assert!(data.node(&link.target).is_some(), "{}", link.target);
        }
    }

    #[test]
    fn group_names_parse_back() {
        for group in Group::ALL {
            assert_eq!(Group::parse(group.as_str()).expect("known group"), group);
        }
        assert!(Group::parse("marketing").is_err());
    }
}
