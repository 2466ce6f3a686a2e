//! Camera controller.
//!
//! Navigation is flat: `pan` translates the camera in the projection plane
//! and `zoom` dollies along z. There is no orbit around a look-at point.

use glam::{Vec2, Vec3};
use std::time::{Duration, Instant};

use crate::coalesce::{Debouncer, FrameCoalescer};
use crate::pipeline::Viewport;
use crate::Camera;

pub const AUTO_FRAME_PADDING: f32 = 1.5;
pub const PERSIST_WINDOW: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomRange {
    pub min: f32,
    pub max: f32,
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self {
            min: -1500.0,
            max: 1500.0,
        }
    }
}

impl ZoomRange {
    pub fn clamp(&self, z: f32) -> f32 {
        z.clamp(self.min, self.max)
    }
}

/// Latest pan/zoom deltas waiting for the next frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraInput {
    pub pan: Option<Vec2>,
    pub zoom: Option<f32>,
}

pub struct CameraController {
    camera: Camera,
    default: Camera,
    zoom_range: ZoomRange,
    input: FrameCoalescer<CameraInput>,
    persist: Debouncer<Camera>,
    changed: bool,
    target: Option<Camera>,
}

impl CameraController {
    pub fn new(camera: Camera, default: Camera, zoom_range: ZoomRange) -> Self {
        Self {
            camera: Camera {
                z: zoom_range.clamp(camera.z),
                ..camera
            },
            default,
            zoom_range,
            input: FrameCoalescer::new(),
            persist: Debouncer::new(PERSIST_WINDOW),
            changed: false,
            target: None,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn zoom_range(&self) -> ZoomRange {
        self.zoom_range
    }

    pub fn is_animating(&self) -> bool {
        self.target.is_some()
    }

    pub fn set(&mut self, camera: Camera) {
        self.camera = Camera {
            z: self.zoom_range.clamp(camera.z),
            ..camera
        };
        self.target = None;
        self.changed = true;
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.camera.x += dx;
        self.camera.y += dy;
        self.target = None;
        self.changed = true;
    }

    pub fn zoom(&mut self, dz: f32) {
        self.camera.z = self.zoom_range.clamp(self.camera.z + dz);
        self.target = None;
        self.changed = true;
    }

    pub fn reset(&mut self) {
        self.camera = self.default;
        self.target = None;
        self.changed = true;
    }

    /// Replaces any pan delta already waiting for this frame.
    pub fn queue_pan(&mut self, dx: f32, dy: f32) {
        let pan = Vec2::new(dx, dy);
        match self.input.pending_mut() {
            Some(pending) => pending.pan = Some(pan),
            None => {
                self.input.submit(CameraInput {
                    pan: Some(pan),
                    zoom: None,
                });
            }
        }
    }

    /// Replaces any zoom delta already waiting for this frame.
    pub fn queue_zoom(&mut self, dz: f32) {
        match self.input.pending_mut() {
            Some(pending) => pending.zoom = Some(dz),
            None => {
                self.input.submit(CameraInput {
                    pan: None,
                    zoom: Some(dz),
                });
            }
        }
    }

    /// Applies the coalesced input for this frame. Returns whether the camera moved.
    pub fn apply_pending(&mut self) -> bool {
        let Some(input) = self.input.take() else {
            return false;
        };
        if let Some(pan) = input.pan {
            self.pan(pan.x, pan.y);
        }
        if let Some(dz) = input.zoom {
            self.zoom(dz);
        }
        input.pan.is_some() || input.zoom.is_some()
    }

    pub fn animate_toward(&mut self, target: Camera) {
        self.target = Some(Camera {
            z: self.zoom_range.clamp(target.z),
            ..target
        });
    }

    /// Moves a fraction `t` of the remaining way toward the animation target.
    pub fn advance_animation(&mut self, t: f32) {
        let Some(target) = self.target else {
            return;
        };
        let next = self.camera.lerp(&target, t);
        let done = (next.x - target.x).abs() < 0.5
            && (next.y - target.y).abs() < 0.5
            && (next.z - target.z).abs() < 0.5
            && (next.fov - target.fov).abs() < 0.5;
        self.camera = if done { target } else { next };
        if done {
            self.target = None;
        }
        self.changed = true;
    }

    /// Returns the camera to persist once changes have been quiet for the
    /// persistence window.
    pub fn poll_persist(&mut self, now: Instant) -> Option<Camera> {
        if self.changed {
            self.changed = false;
            self.persist.push(self.camera, now);
        }
        self.persist.poll(now)
    }

    pub fn flush_persist(&mut self) -> Option<Camera> {
        if std::mem::take(&mut self.changed) {
            self.persist.push(self.camera, Instant::now());
        }
        self.persist.flush()
    }

    /// A camera centering the bounding box of `points` with its largest
    /// dimension (padded) fitting the viewport. Does not touch the current
    /// camera.
    pub fn auto_frame(
        &self,
        points: impl IntoIterator<Item = Vec3>,
        viewport: Viewport,
    ) -> Option<Camera> {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for p in points {
            if !p.is_finite() {
                continue;
            }
            min = min.min(p);
            max = max.max(p);
        }
        if !min.x.is_finite() {
            return None;
        }

        let center = (min + max) * 0.5;
        let extent = (max - min).max_element().max(1.0) * AUTO_FRAME_PADDING;
        let fov = self.camera.fov;
        let fit = viewport.width.min(viewport.height).max(1.0);

        // Nearest face (min z) has the largest scale; fit extent there.
        let z = extent * fov / fit - fov - min.z;

        Some(Camera {
            x: -center.x,
            y: -center.y,
            z: self.zoom_range.clamp(z),
            fov,
        })
    }
}
