//! Force-directed 3D layout.
//!
//! Nodes live in a flat arena indexed by id; links hold ids and are resolved
//! through the index every time they are used. Each tick builds a new node
//! vector and swaps it in whole, so nothing outside the engine may hold on
//! to node references across ticks.
//!
//! Repulsion is all-pairs, O(n^2) per tick. That is fine for the few hundred
//! nodes this engine targets; larger graphs would need spatial partitioning
//! with the same pairwise inverse-square contract.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::{GraphData, Group, GroupAnchors, LinkKind, NodeId, VisibilityFilter};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    pub anchor_strength: f32,
    pub master_anchor_strength: f32,
    pub master_radius: f32,
    pub repulsion: f32,
    pub interaction_radius: f32,
    pub master_interaction_radius: f32,
    pub both_master_factor: f32,
    pub one_master_factor: f32,
    pub base_factor: f32,
    pub backbone_rest: f32,
    pub link_rest: f32,
    pub backbone_stiffness: f32,
    pub link_stiffness: f32,
    pub damping: f32,
    pub pause_threshold: f32,
    pub wake_threshold: f32,
    pub tick_interval_ms: u64,
    pub spawn_jitter: f32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            anchor_strength: 0.008,
            master_anchor_strength: 0.03,
            master_radius: 40.0,
            repulsion: 4000.0,
            interaction_radius: 500.0,
            master_interaction_radius: 600.0,
            both_master_factor: 1.5,
            one_master_factor: 1.2,
            base_factor: 0.5,
            backbone_rest: 250.0,
            link_rest: 100.0,
            backbone_stiffness: 0.2,
            link_stiffness: 0.03,
            damping: 0.88,
            pause_threshold: 0.01,
            wake_threshold: 0.05,
            tick_interval_ms: 33,
            spawn_jitter: 30.0,
        }
    }
}

impl LayoutParams {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn is_master(&self, radius: f32) -> bool {
        radius >= self.master_radius
    }
}

/// Inverse-square repulsion between two nodes `dist2` apart (already
/// floored), or None beyond the interaction radius.
pub fn repulsion_magnitude(
    dist2: f32,
    a_master: bool,
    b_master: bool,
    params: &LayoutParams,
) -> Option<f32> {
    let radius = if a_master || b_master {
        params.master_interaction_radius
    } else {
        params.interaction_radius
    };
    if dist2 > radius * radius {
        return None;
    }
    let factor = match (a_master, b_master) {
        (true, true) => params.both_master_factor,
        (true, false) | (false, true) => params.one_master_factor,
        (false, false) => params.base_factor,
    };
    Some(params.repulsion * factor / dist2)
}

/// Signed spring force along a link. Positive pulls the endpoints together.
pub fn spring_force(dist: f32, kind: LinkKind, params: &LayoutParams) -> f32 {
    let (rest, stiffness) = match kind {
        LinkKind::Backbone => (params.backbone_rest, params.backbone_stiffness),
        LinkKind::Normal => (params.link_rest, params.link_stiffness),
    };
    stiffness * (dist - rest)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimNode {
    pub id: NodeId,
    pub group: Group,
    pub radius: f32,
    pub master: bool,
    pub position: Option<Vec3>,
    pub velocity: Vec3,
    pub degree: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimLink {
    pub source: NodeId,
    pub target: NodeId,
    pub kind: LinkKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Running,
    Stabilized,
}

/// Token for one pending physics callback. Invalidated by `initialize` and
/// `teardown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRequest {
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub max_velocity: f32,
    pub state: EngineState,
    pub revision: u64,
    pub worked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// The request belongs to a previous node set; drop it.
    Stale,
    /// Called before the tick interval elapsed; nothing was done.
    Throttled(FrameRequest),
    Ticked {
        next: Option<FrameRequest>,
        report: StepReport,
    },
    /// The engine is stabilized; stop scheduling.
    Settled,
}

impl FrameOutcome {
    pub fn next(&self) -> Option<FrameRequest> {
        match self {
            Self::Throttled(req) => Some(*req),
            Self::Ticked { next, .. } => *next,
            Self::Stale | Self::Settled => None,
        }
    }
}

/// Read-only view of the current node collection.
#[derive(Debug, Clone, Copy)]
pub struct LayoutSnapshot<'a> {
    pub nodes: &'a [SimNode],
    pub links: &'a [SimLink],
    pub index: &'a HashMap<NodeId, usize>,
    pub revision: u64,
}

impl<'a> LayoutSnapshot<'a> {
    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied().filter(|&i| i < self.nodes.len())
    }

    pub fn resolve(&self, id: &NodeId) -> Option<&'a SimNode> {
        self.index_of(id).map(|i| &self.nodes[i])
    }
}

pub struct LayoutEngine {
    params: LayoutParams,
    anchors: GroupAnchors,
    nodes: Vec<SimNode>,
    index: HashMap<NodeId, usize>,
    links: Vec<SimLink>,
    state: EngineState,
    generation: u64,
    revision: u64,
    ticks: u64,
    last_tick: Option<Instant>,
    max_velocity: f32,
    rng: StdRng,
}

impl LayoutEngine {
    pub fn new(params: LayoutParams) -> Self {
        Self::with_rng(params, StdRng::from_entropy())
    }

    pub fn with_seed(params: LayoutParams, seed: u64) -> Self {
        Self::with_rng(params, StdRng::seed_from_u64(seed))
    }

    fn with_rng(params: LayoutParams, rng: StdRng) -> Self {
        Self {
            params,
            anchors: GroupAnchors::default(),
            nodes: Vec::new(),
            index: HashMap::new(),
            links: Vec::new(),
            state: EngineState::Stabilized,
            generation: 0,
            revision: 0,
            ticks: 0,
            last_tick: None,
            max_velocity: 0.0,
            rng,
        }
    }

    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    pub fn set_params(&mut self, params: LayoutParams) {
        self.params = params;
        self.wake();
    }

    pub fn anchors(&self) -> &GroupAnchors {
        &self.anchors
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[SimLink] {
        &self.links
    }

    pub fn node(&self, id: &NodeId) -> Option<&SimNode> {
        self.index.get(id).and_then(|&i| self.nodes.get(i))
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn max_velocity(&self) -> f32 {
        self.max_velocity
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn snapshot(&self) -> LayoutSnapshot<'_> {
        LayoutSnapshot {
            nodes: &self.nodes,
            links: &self.links,
            index: &self.index,
            revision: self.revision,
        }
    }

    /// Rebuilds the node/link collection for `filter`. Every visible node is
    /// seeded near its group anchor with zero velocity; links whose
    /// endpoints are not both visible are dropped. Any earlier
    /// `FrameRequest` becomes stale.
    pub fn initialize(&mut self, data: &GraphData, filter: &VisibilityFilter) -> FrameRequest {
        self.generation += 1;
        self.anchors = data.anchors();
        self.nodes.clear();
        self.index.clear();
        self.links.clear();

        let jitter = if self.params.spawn_jitter.is_finite() {
            self.params.spawn_jitter.max(0.0)
        } else {
            0.0
        };
        for rec in data.nodes.iter().filter(|n| filter.contains(n.group)) {
            if self.index.contains_key(&rec.id) {
                tracing::debug!(id = %rec.id, "duplicate node id skipped");
                continue;
            }
            let anchor = self.anchors.anchor(rec.group);
            let offset = if jitter > 0.0 {
                Vec3::new(
                    self.rng.gen_range(-jitter..=jitter),
                    self.rng.gen_range(-jitter..=jitter),
                    self.rng.gen_range(-jitter..=jitter),
                )
            } else {
                Vec3::ZERO
            };
            self.index.insert(rec.id.clone(), self.nodes.len());
            self.nodes.push(SimNode {
                id: rec.id.clone(),
                group: rec.group,
                radius: rec.radius,
                master: self.params.is_master(rec.radius),
                position: Some(anchor + offset),
                velocity: Vec3::ZERO,
                degree: 0,
            });
        }

        let mut dropped = 0usize;
        for rec in data.links.iter() {
            let (Some(&a), Some(&b)) = (self.index.get(&rec.source), self.index.get(&rec.target))
            else {
                dropped += 1;
                continue;
            };
            if a == b {
                dropped += 1;
                continue;
            }
            self.nodes[a].degree += 1;
            self.nodes[b].degree += 1;
            self.links.push(SimLink {
                source: rec.source.clone(),
                target: rec.target.clone(),
                kind: rec.kind,
            });
        }

        self.state = if self.nodes.is_empty() {
            EngineState::Stabilized
        } else {
            EngineState::Running
        };
        self.last_tick = None;
        self.max_velocity = 0.0;
        self.ticks = 0;
        self.revision += 1;

        tracing::info!(
            nodes = self.nodes.len(),
            links = self.links.len(),
            dropped_links = dropped,
            generation = self.generation,
            "layout initialized"
        );
        FrameRequest {
            generation: self.generation,
        }
    }

    /// Drops the node set and invalidates any pending request.
    pub fn teardown(&mut self) {
        self.generation += 1;
        self.nodes.clear();
        self.index.clear();
        self.links.clear();
        self.state = EngineState::Stabilized;
        self.last_tick = None;
        self.max_velocity = 0.0;
        self.revision += 1;
        tracing::info!(generation = self.generation, "layout torn down");
    }

    /// The request a host should hold while the engine is running.
    pub fn request(&self) -> Option<FrameRequest> {
        match self.state {
            EngineState::Running if !self.nodes.is_empty() => Some(FrameRequest {
                generation: self.generation,
            }),
            _ => None,
        }
    }

    pub fn wake(&mut self) -> Option<FrameRequest> {
        if self.nodes.is_empty() {
            return None;
        }
        if self.state == EngineState::Stabilized {
            tracing::debug!(generation = self.generation, "layout woken");
        }
        self.state = EngineState::Running;
        self.request()
    }

    /// Moves a node (e.g. dragged) and restarts the simulation.
    pub fn displace(&mut self, id: &NodeId, position: Vec3) -> Option<FrameRequest> {
        let &i = self.index.get(id)?;
        let node = &mut self.nodes[i];
        node.position = Some(position);
        node.velocity = Vec3::ZERO;
        self.revision += 1;
        self.wake()
    }

    /// Adds `velocity` to a node. A stabilized engine only wakes up when the
    /// kick exceeds the wake threshold.
    pub fn apply_impulse(&mut self, id: &NodeId, velocity: Vec3) -> Option<FrameRequest> {
        let &i = self.index.get(id)?;
        let node = &mut self.nodes[i];
        node.velocity += velocity;
        let speed = node.velocity.length();
        if self.state == EngineState::Stabilized && speed <= self.params.wake_threshold {
            return None;
        }
        self.wake()
    }

    /// Throttled entry point for the host's frame callback.
    pub fn on_frame(&mut self, request: FrameRequest, now: Instant) -> FrameOutcome {
        if request.generation != self.generation {
            return FrameOutcome::Stale;
        }
        if self.state == EngineState::Stabilized {
            return FrameOutcome::Settled;
        }
        if let Some(last) = self.last_tick {
            if now.saturating_duration_since(last) < self.params.tick_interval() {
                return FrameOutcome::Throttled(request);
            }
        }
        self.last_tick = Some(now);
        let report = self.step();
        FrameOutcome::Ticked {
            next: self.request(),
            report,
        }
    }

    /// One unthrottled simulation tick. Does nothing once stabilized.
    pub fn step(&mut self) -> StepReport {
        if self.nodes.is_empty() {
            self.state = EngineState::Stabilized;
        }
        if self.state == EngineState::Stabilized {
            return self.report(false);
        }

        let p = &self.params;
        let positions: Vec<Option<Vec3>> = self.nodes.iter().map(|n| n.position).collect();
        let mut next: Vec<SimNode> = self.nodes.clone();

        for (node, pos) in next.iter_mut().zip(&positions) {
            let Some(pos) = pos else { continue };
            let k = if node.master {
                p.master_anchor_strength
            } else {
                p.anchor_strength
            };
            node.velocity += (self.anchors.anchor(node.group) - *pos) * k;
        }

        for i in 0..next.len() {
            let Some(pi) = positions[i] else { continue };
            for j in (i + 1)..next.len() {
                let Some(pj) = positions[j] else { continue };
                let d = pi - pj;
                let dist2 = d.length_squared().max(1.0);
                let Some(f) = repulsion_magnitude(dist2, next[i].master, next[j].master, p)
                else {
                    continue;
                };
                // coincident nodes: push apart along a fixed axis
                let dir = d.try_normalize().unwrap_or(Vec3::X);
                next[i].velocity += dir * f;
                next[j].velocity -= dir * f;
            }
        }

        for link in self.links.iter() {
            let (Some(&a), Some(&b)) = (self.index.get(&link.source), self.index.get(&link.target))
            else {
                tracing::trace!(
                    source = %link.source,
                    target = %link.target,
                    "unresolved link skipped"
                );
                continue;
            };
            let (Some(pa), Some(pb)) = (positions[a], positions[b]) else {
                continue;
            };
            let d = pb - pa;
            let dist = d.length().max(0.001);
            let dir = d / dist;
            let f = spring_force(dist, link.kind, p);
            next[a].velocity += dir * f;
            next[b].velocity -= dir * f;
        }

        let mut max_velocity = 0.0f32;
        for node in next.iter_mut() {
            node.velocity *= p.damping;
            if let Some(pos) = node.position.as_mut() {
                *pos += node.velocity;
            }
            max_velocity = max_velocity.max(node.velocity.length());
        }

        self.nodes = next;
        self.revision += 1;
        self.ticks += 1;
        self.max_velocity = max_velocity;

        if max_velocity < self.params.pause_threshold {
            self.state = EngineState::Stabilized;
            tracing::debug!(
                ticks = self.ticks,
                max_velocity,
                generation = self.generation,
                "layout stabilized"
            );
        }
        self.report(true)
    }

    /// Steps until stabilized or `max_ticks` ran. Returns the ticks taken.
    pub fn run_until_stable(&mut self, max_ticks: u64) -> u64 {
        let mut n = 0;
        while n < max_ticks && self.state == EngineState::Running {
            self.step();
            n += 1;
        }
        n
    }

    fn report(&self, worked: bool) -> StepReport {
        StepReport {
            max_velocity: self.max_velocity,
            state: self.state,
            revision: self.revision,
            worked,
        }
    }
}
