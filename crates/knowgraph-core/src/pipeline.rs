//! Per-frame projection of the current layout onto a 2D surface.
//!
//! Runs at the drawing surface's refresh rate, independent of the physics
//! tick. Links are re-resolved by id against the snapshot passed in, never
//! against anything kept from an earlier frame.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::layout::{LayoutSnapshot, SimNode};
use crate::projection::{project, Projected};
use crate::traversal::{NoTraversal, TraversalSource};
use crate::{Camera, Group, LinkKind, NodeId};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }

    /// `contains` on the viewport grown by `margin` of its size on each side.
    pub fn contains_expanded(&self, p: Vec2, margin: f32) -> bool {
        let mx = self.width * margin;
        let my = self.height * margin;
        p.x >= -mx && p.x <= self.width + mx && p.y >= -my && p.y <= self.height + my
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineParams {
    pub cull_margin: f32,
    pub node_size_factor: f32,
    pub degree_boost_per_link: f32,
    pub degree_boost_cap: f32,
    pub emphasis_multiplier: f32,
    pub label_scale: f32,
    pub pulse_hz: f32,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            cull_margin: 0.5,
            node_size_factor: 0.5,
            degree_boost_per_link: 2.0,
            degree_boost_cap: 15.0,
            emphasis_multiplier: 1.3,
            label_scale: 0.7,
            pulse_hz: 0.8,
        }
    }
}

static NO_TRAVERSAL: NoTraversal = NoTraversal;
static EMPTY_SELECTION: BTreeSet<NodeId> = BTreeSet::new();

/// Externally supplied signals, re-read every frame.
#[derive(Clone, Copy)]
pub struct RenderSignals<'a> {
    pub selection: &'a BTreeSet<NodeId>,
    pub path: &'a [NodeId],
    pub hovered: Option<&'a NodeId>,
    pub focused: Option<&'a NodeId>,
    pub traversal: &'a dyn TraversalSource,
    /// Seconds, drives cosmetic animation only.
    pub time: f32,
}

impl Default for RenderSignals<'_> {
    fn default() -> Self {
        Self {
            selection: &EMPTY_SELECTION,
            path: &[],
            hovered: None,
            focused: None,
            traversal: &NO_TRAVERSAL,
            time: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glow {
    None,
    Soft,
    Strong,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedNode {
    pub id: NodeId,
    pub group: Group,
    pub screen: Vec2,
    pub scale: f32,
    pub depth: f32,
    pub size: f32,
    pub degree: u32,
    pub master: bool,
    pub selected: bool,
    pub hovered: bool,
    pub focused: bool,
    pub glow: Glow,
    /// Radius of the pulsing ring, when this node has one.
    pub pulse_ring: Option<f32>,
    pub show_label: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LinkEmphasis {
    pub highway: bool,
    pub path: bool,
    pub backbone: bool,
    pub traversal: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedLink {
    pub source: NodeId,
    pub target: NodeId,
    pub from: Vec2,
    pub to: Vec2,
    pub emphasis: LinkEmphasis,
    pub opacity: f32,
    pub width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FrameStats {
    pub nodes_total: usize,
    pub nodes_unpositioned: usize,
    pub nodes_culled: usize,
    pub links_total: usize,
    pub links_unresolved: usize,
    pub links_culled: usize,
}

/// One frame worth of drawable elements. Nodes are sorted far to near.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub nodes: Vec<ProjectedNode>,
    pub links: Vec<ProjectedLink>,
    pub stats: FrameStats,
    pub viewport: Viewport,
    pub revision: u64,
}

impl Frame {
    pub fn node(&self, id: &NodeId) -> Option<&ProjectedNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Nearest node whose drawn disc contains `point`.
    pub fn node_at(&self, point: Vec2) -> Option<&ProjectedNode> {
        self.nodes
            .iter()
            .rev()
            .find(|n| n.screen.distance(point) <= n.size.max(3.0))
    }

    /// Closest link within `tolerance` pixels of `point`.
    pub fn link_at(&self, point: Vec2, tolerance: f32) -> Option<&ProjectedLink> {
        self.links
            .iter()
            .map(|l| (segment_distance(point, l.from, l.to), l))
            .filter(|(d, l)| *d <= tolerance + l.width * 0.5)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, l)| l)
    }
}

fn segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

fn ranges_overlap(a: f32, b: f32, lo: f32, hi: f32) -> bool {
    a.min(b) <= hi && a.max(b) >= lo
}

#[derive(Debug, Clone, Default)]
pub struct RenderPipeline {
    params: PipelineParams,
}

impl RenderPipeline {
    pub fn new(params: PipelineParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    pub fn project_frame(
        &self,
        snapshot: LayoutSnapshot<'_>,
        camera: &Camera,
        viewport: Viewport,
        signals: &RenderSignals<'_>,
    ) -> Frame {
        let p = &self.params;
        let mut stats = FrameStats {
            nodes_total: snapshot.nodes.len(),
            links_total: snapshot.links.len(),
            ..FrameStats::default()
        };

        let projected: Vec<Option<Projected>> = snapshot
            .nodes
            .iter()
            .map(|n| {
                n.position
                    .map(|pos| project(pos, camera, viewport.width, viewport.height))
                    .filter(Projected::is_visible)
            })
            .collect();

        let mut nodes = Vec::with_capacity(snapshot.nodes.len());
        for (node, proj) in snapshot.nodes.iter().zip(&projected) {
            let Some(pos) = node.position else {
                stats.nodes_unpositioned += 1;
                continue;
            };
            match proj {
                Some(proj) if viewport.contains_expanded(proj.screen, p.cull_margin) => {
                    nodes.push(self.project_node(node, pos.z + camera.z, proj, signals));
                }
                _ => stats.nodes_culled += 1,
            }
        }
        nodes.sort_by(|a, b| b.depth.total_cmp(&a.depth).then_with(|| a.id.cmp(&b.id)));

        let path_pairs: HashSet<(&NodeId, &NodeId)> = signals
            .path
            .windows(2)
            .flat_map(|w| [(&w[0], &w[1]), (&w[1], &w[0])])
            .collect();

        let mut links = Vec::with_capacity(snapshot.links.len());
        for link in snapshot.links.iter() {
            let (Some(a), Some(b)) = (
                snapshot.index_of(&link.source),
                snapshot.index_of(&link.target),
            ) else {
                stats.links_unresolved += 1;
                continue;
            };
            if snapshot.nodes[a].position.is_none() || snapshot.nodes[b].position.is_none() {
                stats.links_unresolved += 1;
                continue;
            }
            let (Some(pa), Some(pb)) = (projected[a], projected[b]) else {
                stats.links_culled += 1;
                continue;
            };
            let (from, to) = (pa.screen, pb.screen);
            let endpoint_in_view = viewport.contains_expanded(from, p.cull_margin)
                || viewport.contains_expanded(to, p.cull_margin);
            let crosses = ranges_overlap(from.x, to.x, 0.0, viewport.width)
                || ranges_overlap(from.y, to.y, 0.0, viewport.height);
            if !endpoint_in_view && !crosses {
                stats.links_culled += 1;
                continue;
            }

            let emphasis = LinkEmphasis {
                highway: signals.selection.contains(&link.source)
                    && signals.selection.contains(&link.target),
                path: path_pairs.contains(&(&link.source, &link.target)),
                backbone: link.kind == LinkKind::Backbone,
                traversal: signals
                    .traversal
                    .traversal_strength(&link.source, &link.target)
                    .clamp(0.0, 1.0),
            };
            let (opacity, width) = link_weight(&emphasis);
            links.push(ProjectedLink {
                source: link.source.clone(),
                target: link.target.clone(),
                from,
                to,
                emphasis,
                opacity,
                width,
            });
        }

        Frame {
            nodes,
            links,
            stats,
            viewport,
            revision: snapshot.revision,
        }
    }

    fn project_node(
        &self,
        node: &SimNode,
        depth: f32,
        proj: &Projected,
        signals: &RenderSignals<'_>,
    ) -> ProjectedNode {
        let p = &self.params;
        let selected = signals.selection.contains(&node.id);
        let hovered = signals.hovered == Some(&node.id);
        let focused = signals.focused == Some(&node.id);

        let boost = (node.degree as f32 * p.degree_boost_per_link).min(p.degree_boost_cap);
        let mut size = node.radius * proj.scale * p.node_size_factor + boost;
        if selected || hovered {
            size *= p.emphasis_multiplier;
        }

        let glow = if node.master {
            Glow::Strong
        } else if selected || hovered || focused {
            Glow::Soft
        } else {
            Glow::None
        };

        let pulse_ring = (node.master && node.group == Group::PULSE).then(|| {
            let phase = signals.time * p.pulse_hz * std::f32::consts::TAU;
            size * (1.35 + 0.25 * phase.sin())
        });

        ProjectedNode {
            id: node.id.clone(),
            group: node.group,
            screen: proj.screen,
            scale: proj.scale,
            depth,
            size,
            degree: node.degree,
            master: node.master,
            selected,
            hovered,
            focused,
            glow,
            pulse_ring,
            show_label: node.master || selected || hovered || focused || proj.scale > p.label_scale,
        }
    }
}

/// Base opacity/width per category, with traversal strength layered on top.
pub fn link_weight(e: &LinkEmphasis) -> (f32, f32) {
    let mut opacity = 0.25;
    let mut width = 1.0;
    if e.backbone {
        opacity += 0.15;
        width += 1.0;
    }
    if e.path {
        opacity += 0.35;
        width += 1.5;
    }
    if e.highway {
        opacity += 0.45;
        width += 2.0;
    }
    let t = e.traversal.clamp(0.0, 1.0);
    opacity += 0.3 * t;
    width += 1.5 * t;
    (opacity.min(1.0), width)
}

/// Keyboard focus over the visible, depth-sorted node list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FocusCursor {
    focused: Option<NodeId>,
}

impl FocusCursor {
    pub fn focused(&self) -> Option<&NodeId> {
        self.focused.as_ref()
    }

    pub fn index_in(&self, frame: &Frame) -> Option<usize> {
        let id = self.focused.as_ref()?;
        frame.nodes.iter().position(|n| &n.id == id)
    }

    pub fn next(&mut self, frame: &Frame) -> Option<&NodeId> {
        self.step(frame, 1)
    }

    pub fn prev(&mut self, frame: &Frame) -> Option<&NodeId> {
        self.step(frame, -1)
    }

    fn step(&mut self, frame: &Frame, dir: isize) -> Option<&NodeId> {
        let len = frame.nodes.len();
        if len == 0 {
            self.focused = None;
            return None;
        }
        let i = match self.index_in(frame) {
            Some(i) => (i as isize + dir).rem_euclid(len as isize) as usize,
            None if dir >= 0 => 0,
            None => len - 1,
        };
        self.focused = Some(frame.nodes[i].id.clone());
        self.focused.as_ref()
    }

    /// Drops the focus when the node left the visible set.
    pub fn retain_visible(&mut self, frame: &Frame) {
        if self.index_in(frame).is_none() {
            self.focused = None;
        }
    }

    pub fn clear(&mut self) {
        self.focused = None;
    }
}
