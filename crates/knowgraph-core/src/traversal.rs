use std::collections::VecDeque;

use crate::NodeId;

pub const HISTORY_LEN: usize = 32;
pub const HOP_DECAY: f32 = 0.8;

/// Per-edge emphasis in 0..1, used only for drawing.
pub trait TraversalSource {
    fn traversal_strength(&self, source: &NodeId, target: &NodeId) -> f32;
}

pub struct NoTraversal;

impl TraversalSource for NoTraversal {
    fn traversal_strength(&self, _: &NodeId, _: &NodeId) -> f32 {
        0.0
    }
}

impl<F> TraversalSource for F
where
    F: Fn(&NodeId, &NodeId) -> f32,
{
    fn traversal_strength(&self, source: &NodeId, target: &NodeId) -> f32 {
        self(source, target).clamp(0.0, 1.0)
    }
}

/// The user's recent navigation through the graph. The newest hop has
/// strength 1 and each older hop decays geometrically. Direction is ignored.
#[derive(Debug, Clone)]
pub struct TraversalHistory {
    visits: VecDeque<NodeId>,
    capacity: usize,
    decay: f32,
}

impl Default for TraversalHistory {
    fn default() -> Self {
        Self::new(HISTORY_LEN, HOP_DECAY)
    }
}

impl TraversalHistory {
    pub fn new(capacity: usize, decay: f32) -> Self {
        Self {
            visits: VecDeque::new(),
            capacity: capacity.max(2),
            decay: decay.clamp(0.0, 1.0),
        }
    }

    pub fn visit(&mut self, id: NodeId) {
        if self.visits.back() == Some(&id) {
            return;
        }
        if self.visits.len() == self.capacity {
            self.visits.pop_front();
        }
        self.visits.push_back(id);
    }

    pub fn clear(&mut self) {
        self.visits.clear();
    }

    pub fn visits(&self) -> impl Iterator<Item = &NodeId> {
        self.visits.iter()
    }

    pub fn len(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }
}

impl TraversalSource for TraversalHistory {
    fn traversal_strength(&self, source: &NodeId, target: &NodeId) -> f32 {
        let hops = self.visits.len().saturating_sub(1);
        // newest hop first
        for age in 0..hops {
            let i = hops - age;
            let (a, b) = (&self.visits[i - 1], &self.visits[i]);
            if (a == source && b == target) || (a == target && b == source) {
                return self.decay.powi(age as i32);
            }
        }
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> NodeId {
        NodeId::new(s)
    }

    #[test]
    fn newest_hop_is_strongest_and_older_hops_decay() {
        let mut h = TraversalHistory::default();
        for n in ["a", "b", "c", "d"] {
            h.visit(id(n));
        }
        assert_eq!(h.traversal_strength(&id("c"), &id("d")), 1.0);
        assert_eq!(h.traversal_strength(&id("d"), &id("c")), 1.0);
        assert!((h.traversal_strength(&id("b"), &id("c")) - 0.8).abs() < 1e-6);
        assert!((h.traversal_strength(&id("a"), &id("b")) - 0.64).abs() < 1e-6);
        assert_eq!(h.traversal_strength(&id("a"), &id("d")), 0.0);
    }

    #[test]
    fn repeated_visit_is_ignored_and_capacity_bounds_history() {
        let mut h = TraversalHistory::new(3, 0.5);
        h.visit(id("a"));
        h.visit(id("a"));
        assert_eq!(h.len(), 1);
        for n in ["b", "c", "d"] {
            h.visit(id(n));
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.traversal_strength(&id("a"), &id("b")), 0.0);
        assert_eq!(h.traversal_strength(&id("c"), &id("d")), 1.0);
    }

    #[test]
    fn closures_are_clamped() {
        let f = |_: &NodeId, _: &NodeId| 3.0_f32;
        assert_eq!(f.traversal_strength(&id("a"), &id("b")), 1.0);
        assert_eq!(NoTraversal.traversal_strength(&id("a"), &id("b")), 0.0);
    }
}
