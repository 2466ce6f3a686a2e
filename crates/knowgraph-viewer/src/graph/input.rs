use bevy::prelude::Vec2;
use knowgraph_core::screen_delta_to_pan;

use crate::graph::state::{Drag, GraphState};

/// Link pick tolerance in points.
pub const LINK_PICK_TOLERANCE: f32 = 4.0;

/// One frame of pointer input, in screen points.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerSample {
    pub pos: Option<Vec2>,
    pub pressed: bool,
    pub down: bool,
    pub released: bool,
    pub clicked: bool,
    pub dragging: bool,
    pub delta: Vec2,
    pub scroll: f32,
    pub additive: bool,
    /// The pointer is over a panel or window.
    pub over_ui: bool,
}

impl GraphState {
    pub fn handle_pointer(&mut self, sample: &PointerSample) {
        if sample.released {
            self.ui.drag = None;
        }
        if sample.over_ui && self.ui.drag.is_none() {
            self.session.pointer_moved(None);
            self.ui.hovered_link = None;
            return;
        }

        let surface = sample.pos.map(|p| self.to_surface(p));
        self.session.pointer_moved(surface);
        self.ui.hovered_link = match (surface, self.session.hovered()) {
            (Some(p), None) if self.ui.show_links => self
                .session
                .frame()
                .and_then(|f| f.link_at(p, LINK_PICK_TOLERANCE))
                .map(|l| (l.source.clone(), l.target.clone())),
            _ => None,
        };

        if sample.pressed {
            self.ui.drag = surface.map(|p| self.drag_target(p));
        }

        if sample.dragging && sample.down {
            match self.ui.drag.clone() {
                Some(Drag::Pan) => {
                    let pan = screen_delta_to_pan(sample.delta, self.session.camera().camera());
                    self.session.camera_mut().queue_pan(pan.x, pan.y);
                }
                Some(Drag::Node { id, depth }) => {
                    if let Some(pos) = sample.pos {
                        self.drag_node_to(&id, depth, pos);
                    }
                }
                None => {}
            }
        }

        if sample.clicked {
            let hit = surface.and_then(|p| {
                self.session
                    .frame()
                    .and_then(|f| f.node_at(p))
                    .map(|n| n.id.clone())
            });
            if let Some(id) = hit {
                self.click_node(id, sample.additive);
            }
        }

        if sample.scroll != 0.0 {
            self.session
                .camera_mut()
                .queue_zoom(-sample.scroll * self.cfg.zoom_step);
        }
    }

    fn drag_target(&self, surface: Vec2) -> Drag {
        let hit = self.session.frame().and_then(|f| f.node_at(surface));
        let Some(node) = hit else {
            return Drag::Pan;
        };
        match self.session.engine().node(&node.id).and_then(|n| n.position) {
            Some(pos) => Drag::Node {
                id: node.id.clone(),
                depth: pos.z,
            },
            None => Drag::Pan,
        }
    }

    pub fn select_focused(&mut self, additive: bool) {
        if let Some(id) = self.session.focused().cloned() {
            self.click_node(id, additive);
        }
    }

    pub fn fit_view(&mut self, animate: bool) {
        let vp = self.viewport;
        self.session.fit_camera(vp, animate);
    }

    /// Esc: closes overlays first, then clears selection and path.
    pub fn escape(&mut self) {
        if self.ui.search_open || self.ui.help_open {
            self.ui.search_open = false;
            self.ui.help_open = false;
            return;
        }
        self.clear_selection();
        self.ui.drag = None;
    }
}
