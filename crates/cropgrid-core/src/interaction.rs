//! Pointer-driven interaction state machine.
//!
//! [`InteractionEngine`] turns a stream of pointer events into mutations of a
//! host-owned [`CropModel`]. It keeps only the transient state of the gesture
//! in progress; everything else lives in the model the host passes in.
//!
//! # Gestures
//!
//! Every gesture starts from [`InteractionMode::Idle`] on pointer-down and
//! returns there on pointer-up. Pointer-leave ends a gesture exactly like
//! pointer-up: the change is committed, not discarded.
//!
//! | Pointer-down lands on            | Mode              |
//! |----------------------------------|-------------------|
//! | selected region's rotation handle| `Rotating`        |
//! | selected region's resize handle  | `Resizing`        |
//! | a region body                    | `Dragging`        |
//! | empty space over the image       | `CreatingRegion`  |
//! | anywhere else                    | `Panning`         |
//!
//! A second body hit on the same region inside the double-activation window
//! requests the advanced editor instead of starting another drag.
//!
//! Drags, resizes, and rotations commit geometry on every move, so the
//! pointer-up of those gestures only reports the finished snapshot.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::EditorConfig;
use crate::constraint::{self, ConstraintContext, Containment, ViewBounds};
use crate::geometry::{
    angle_delta, display_to_image, image_to_display, normalize_degrees, to_local, DisplayTransform, Point, Rect,
};
use crate::grid::{self, RegionPatch};
use crate::hit::{self, CursorHint, Handle, HitMetrics, HitTarget};
use crate::model::CropModel;
use crate::region::{Region, RegionId};

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerEventKind {
    Down,
    Move,
    Up,
    Leave,
}

/// Modifier keys held during a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    /// Snaps rotation to the configured increment.
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
}

/// A normalized, canvas-relative pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    /// Position in display space.
    pub position: Point,
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Event timestamp in milliseconds, used for double activation.
    #[serde(default)]
    pub time_ms: f64,
}

impl PointerEvent {
    pub fn new(kind: PointerEventKind, x: f64, y: f64) -> Self {
        Self {
            kind,
            position: Point::new(x, y),
            modifiers: Modifiers::default(),
            time_ms: 0.0,
        }
    }

    pub fn down(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Down, x, y)
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Move, x, y)
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Up, x, y)
    }

    pub fn leave(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Leave, x, y)
    }

    pub fn at_time(mut self, time_ms: f64) -> Self {
        self.time_ms = time_ms;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Per-view policy passed to the engine.
///
/// `position_selector` replaces ambient "pick a position" state: while it is
/// set, pointer-down reports the image-space point and starts no gesture.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewPolicy {
    pub config: EditorConfig,
    pub bounds: ViewBounds,
    pub position_selector: bool,
}

/// Transient gesture state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    Dragging {
        id: RegionId,
        /// Display-space position of the previous sample.
        last: Point,
    },
    Resizing {
        id: RegionId,
        handle: Handle,
        /// Region as it was at pointer-down.
        original: Region,
    },
    Rotating {
        id: RegionId,
        /// Pointer angle of the previous sample, degrees clockwise from up.
        last_angle: f64,
        /// Unsnapped accumulated rotation.
        raw_rotation: f64,
    },
    Panning {
        start: Point,
        last: Point,
        origin: DisplayTransform,
    },
    CreatingRegion {
        start: Point,
        end: Point,
    },
}

impl InteractionMode {
    pub fn name(&self) -> &'static str {
        match self {
            InteractionMode::Idle => "idle",
            InteractionMode::Dragging { .. } => "dragging",
            InteractionMode::Resizing { .. } => "resizing",
            InteractionMode::Rotating { .. } => "rotating",
            InteractionMode::Panning { .. } => "panning",
            InteractionMode::CreatingRegion { .. } => "creating",
        }
    }
}

/// Outcome of an event, for the host to forward to its collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Action {
    Selected(RegionId),
    SelectionCleared,
    /// Regions whose geometry changed during a gesture step.
    RegionsUpdated(Vec<Region>),
    RegionCreated(Region),
    AdvancedEditRequested(RegionId),
    TransformChanged(DisplayTransform),
    /// Image-space point picked in position-selector mode.
    PositionSelected(Point),
    CursorChanged(CursorHint),
    /// Region collection after a finished gesture, for the history stack.
    GestureCommitted(Vec<Region>),
}

/// Angle from `center` to `p`, degrees clockwise from "up", in `[0, 360)`.
pub fn pointer_angle(center: Point, p: Point) -> f64 {
    let (dx, dy) = (p.x - center.x, p.y - center.y);
    normalize_degrees(dy.atan2(dx).to_degrees() + 90.0)
}

/// Round an angle to the nearest multiple of `step` degrees.
pub fn snap_rotation(angle: f64, step: f64) -> f64 {
    if step > 0.0 && step.is_finite() {
        (angle / step).round() * step
    } else {
        angle
    }
}

/// Gesture state machine for one canvas view.
#[derive(Debug, Clone, Default)]
pub struct InteractionEngine {
    policy: ViewPolicy,
    mode: InteractionMode,
    /// Region and time of the most recent body hit.
    last_body_hit: Option<(RegionId, f64)>,
    cursor: Option<CursorHint>,
    /// Whether the current gesture changed the region collection.
    dirty: bool,
}

impl InteractionEngine {
    pub fn new(policy: ViewPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> &ViewPolicy {
        &self.policy
    }

    /// Swap the view policy. Takes effect from the next event.
    pub fn set_policy(&mut self, policy: ViewPolicy) {
        self.policy = policy;
    }

    pub fn mode(&self) -> &InteractionMode {
        &self.mode
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.mode, InteractionMode::Idle)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.mode, InteractionMode::Dragging { .. })
    }

    pub fn is_resizing(&self) -> bool {
        matches!(self.mode, InteractionMode::Resizing { .. })
    }

    pub fn is_rotating(&self) -> bool {
        matches!(self.mode, InteractionMode::Rotating { .. })
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.mode, InteractionMode::Panning { .. })
    }

    pub fn is_creating(&self) -> bool {
        matches!(self.mode, InteractionMode::CreatingRegion { .. })
    }

    /// Display-space rectangle of a create drag in progress.
    pub fn creation_preview(&self) -> Option<Rect> {
        match self.mode {
            InteractionMode::CreatingRegion { start, end } => Some(Rect::new(
                start.x.min(end.x),
                start.y.min(end.y),
                (end.x - start.x).abs(),
                (end.y - start.y).abs(),
            )),
            _ => None,
        }
    }

    /// Transform to paint with: the live pan while panning, else the model's.
    pub fn preview_transform(&self, model: &CropModel) -> DisplayTransform {
        match self.mode {
            InteractionMode::Panning { start, last, origin } => origin.pan_by(last.x - start.x, last.y - start.y),
            _ => model.transform.sanitized(),
        }
    }

    /// Feed one pointer event. Non-finite positions are ignored.
    pub fn handle(&mut self, event: &PointerEvent, model: &mut CropModel) -> Vec<Action> {
        if !event.position.is_finite() {
            return Vec::new();
        }
        match event.kind {
            PointerEventKind::Down => self.pointer_down(event, model),
            PointerEventKind::Move => self.pointer_move(event, model),
            PointerEventKind::Up | PointerEventKind::Leave => self.pointer_up(event, model),
        }
    }

    fn pointer_down(&mut self, event: &PointerEvent, model: &mut CropModel) -> Vec<Action> {
        // A down without the previous up still commits the previous gesture.
        let mut actions = if self.is_idle() {
            Vec::new()
        } else {
            self.pointer_up(event, model)
        };

        let point = event.position;
        let transform = model.transform.sanitized();

        if self.policy.position_selector {
            let target = to_image(point, &transform);
            debug!(x = target.x, y = target.y, "position selected");
            actions.push(Action::PositionSelected(target));
            return actions;
        }

        let metrics = HitMetrics::new(&self.policy.config, transform.scale);
        let target = hit::hit_test(
            point,
            &model.regions,
            model.selected,
            &transform,
            &metrics,
            self.policy.bounds.safe_area(),
        );

        match target {
            HitTarget::Rotation { id } => {
                if let Some(region) = model.get(id) {
                    let center = image_to_display(region.rect().center(), &transform);
                    self.mode = InteractionMode::Rotating {
                        id,
                        last_angle: pointer_angle(center, point),
                        raw_rotation: region.rotation,
                    };
                    debug!(region = %id, "rotation started");
                }
                self.last_body_hit = None;
            }
            HitTarget::Handle { id, handle } => {
                if let Some(region) = model.get(id) {
                    self.mode = InteractionMode::Resizing {
                        id,
                        handle,
                        original: region.clone(),
                    };
                    debug!(region = %id, ?handle, "resize started");
                }
                self.last_body_hit = None;
            }
            HitTarget::Body { id } => {
                if self.is_double_activation(id, event.time_ms) {
                    self.last_body_hit = None;
                    debug!(region = %id, "advanced edit requested");
                    actions.push(Action::AdvancedEditRequested(id));
                    return actions;
                }
                self.last_body_hit = Some((id, event.time_ms));
                if model.selected != Some(id) {
                    model.select(Some(id));
                    actions.push(Action::Selected(id));
                }
                self.mode = InteractionMode::Dragging { id, last: point };
                debug!(region = %id, "drag started");
            }
            HitTarget::Empty | HitTarget::OutsideViewport => {
                self.last_body_hit = None;
                let image_rect = transform.rect_to_display(&Rect::new(0.0, 0.0, model.image.width, model.image.height));
                if target == HitTarget::Empty && image_rect.contains_unrotated(point) {
                    if model.selected.is_some() {
                        model.select(None);
                        actions.push(Action::SelectionCleared);
                    }
                    self.mode = InteractionMode::CreatingRegion { start: point, end: point };
                    debug!(x = point.x, y = point.y, "region creation started");
                } else {
                    self.mode = InteractionMode::Panning {
                        start: point,
                        last: point,
                        origin: transform,
                    };
                    debug!("pan started");
                }
            }
        }
        actions
    }

    fn is_double_activation(&self, id: RegionId, time_ms: f64) -> bool {
        match self.last_body_hit {
            Some((last_id, last_time)) if last_id == id => {
                (0.0..=self.policy.config.double_activate_ms).contains(&(time_ms - last_time))
            }
            _ => false,
        }
    }

    fn pointer_move(&mut self, event: &PointerEvent, model: &mut CropModel) -> Vec<Action> {
        let point = event.position;
        let transform = model.transform.sanitized();

        match self.mode.clone() {
            InteractionMode::Idle => self.update_cursor(point, model),
            InteractionMode::Dragging { id, last } => {
                let Some(region) = model.get(id) else {
                    self.reset();
                    return Vec::new();
                };
                let mut proposed = region.rect();
                proposed.x += (point.x - last.x) / transform.scale;
                proposed.y += (point.y - last.y) / transform.scale;
                let ctx = self.constraint_context(model, None, region.locked_ratio());
                let solved = constraint::apply(&proposed, &ctx);

                self.mode = InteractionMode::Dragging { id, last: point };
                trace!(region = %id, x = solved.x, y = solved.y, "drag");
                self.commit(model, id, &solved, &ctx)
            }
            InteractionMode::Resizing { id, handle, original } => {
                let frame = original.rect();
                let local = to_local(to_image(point, &transform), &frame);
                let edges = handle.edges();
                let left = if edges.left { local.x } else { frame.x };
                let right = if edges.right { local.x } else { frame.right() };
                let top = if edges.top { local.y } else { frame.y };
                let bottom = if edges.bottom { local.y } else { frame.bottom() };
                let proposed = Rect::new(left, top, right - left, bottom - top).with_rotation(frame.rotation);

                let ctx = self.constraint_context(model, Some(handle), original.locked_ratio());
                let solved = if frame.rotation == 0.0 {
                    constraint::apply(&proposed, &ctx)
                } else {
                    // Local math ran in the original frame; contain only
                    // once the box is back on screen.
                    let free = constraint::apply(&proposed, &ctx.with_containment(Containment::Unbounded));
                    constraint::contain_rotated_resize(&frame, &free, handle, &ctx)
                };

                trace!(region = %id, width = solved.width, height = solved.height, "resize");
                self.commit(model, id, &solved, &ctx)
            }
            InteractionMode::Rotating {
                id,
                last_angle,
                raw_rotation,
            } => {
                let Some(region) = model.get(id) else {
                    self.reset();
                    return Vec::new();
                };
                let center = image_to_display(region.rect().center(), &transform);
                let angle = pointer_angle(center, point);
                let raw = raw_rotation + angle_delta(last_angle, angle);
                let rotation = if event.modifiers.shift {
                    snap_rotation(raw, self.policy.config.rotation_snap_degrees)
                } else {
                    raw
                };

                let rect = region.rect().with_rotation(normalize_degrees(rotation));
                let ctx = self.constraint_context(model, None, region.locked_ratio());
                self.mode = InteractionMode::Rotating {
                    id,
                    last_angle: angle,
                    raw_rotation: raw,
                };
                trace!(region = %id, rotation = rect.rotation, "rotate");
                self.commit(model, id, &rect, &ctx)
            }
            InteractionMode::Panning { start, origin, .. } => {
                self.mode = InteractionMode::Panning {
                    start,
                    last: point,
                    origin,
                };
                Vec::new()
            }
            InteractionMode::CreatingRegion { start, .. } => {
                self.mode = InteractionMode::CreatingRegion { start, end: point };
                Vec::new()
            }
        }
    }

    fn pointer_up(&mut self, event: &PointerEvent, model: &mut CropModel) -> Vec<Action> {
        let mode = std::mem::take(&mut self.mode);
        let dirty = std::mem::take(&mut self.dirty);
        let point = event.position;
        let mut actions = Vec::new();

        match mode {
            InteractionMode::Idle => {}
            InteractionMode::Dragging { id, .. }
            | InteractionMode::Resizing { id, .. }
            | InteractionMode::Rotating { id, .. } => {
                debug!(region = %id, changed = dirty, "gesture committed");
                if dirty {
                    actions.push(Action::GestureCommitted(model.snapshot()));
                }
            }
            InteractionMode::CreatingRegion { start, .. } => {
                let width = (point.x - start.x).abs();
                let height = (point.y - start.y).abs();
                let threshold = self.policy.config.create_threshold;
                if width > threshold && height > threshold {
                    let transform = model.transform.sanitized();
                    let origin = to_image(Point::new(start.x.min(point.x), start.y.min(point.y)), &transform);
                    let proposed = Rect::new(origin.x, origin.y, width / transform.scale, height / transform.scale);
                    let ctx = self.constraint_context(model, None, None);
                    let solved = constraint::apply(&proposed, &ctx);

                    let region = model.create_region(&solved).clone();
                    model.select(Some(region.id));
                    debug!(region = %region.id, name = %region.name, "region created");
                    actions.push(Action::Selected(region.id));
                    actions.push(Action::RegionCreated(region));
                    actions.push(Action::GestureCommitted(model.snapshot()));
                } else {
                    debug!(width, height, "create drag below threshold, discarded");
                }
            }
            InteractionMode::Panning { start, origin, .. } => {
                let (dx, dy) = (point.x - start.x, point.y - start.y);
                if dx != 0.0 || dy != 0.0 {
                    model.transform = origin.pan_by(dx, dy);
                    debug!(dx, dy, "pan committed");
                    actions.push(Action::TransformChanged(model.transform));
                }
            }
        }
        actions
    }

    fn update_cursor(&mut self, point: Point, model: &CropModel) -> Vec<Action> {
        let transform = model.transform.sanitized();
        let metrics = HitMetrics::new(&self.policy.config, transform.scale);
        let target = hit::hit_test(
            point,
            &model.regions,
            model.selected,
            &transform,
            &metrics,
            self.policy.bounds.safe_area(),
        );
        let over_image = Rect::new(0.0, 0.0, model.image.width, model.image.height)
            .contains_unrotated(to_image(point, &transform));
        let cursor = hit::cursor_hint(&target, &model.regions, over_image);
        if self.cursor == Some(cursor) {
            return Vec::new();
        }
        self.cursor = Some(cursor);
        vec![Action::CursorChanged(cursor)]
    }

    fn constraint_context(&self, model: &CropModel, handle: Option<Handle>, ratio: Option<f64>) -> ConstraintContext {
        ConstraintContext::new(model.image, self.policy.config.min_size())
            .with_containment(self.policy.bounds.containment(model.transform))
            .with_aspect_ratio(ratio)
            .with_handle(handle)
    }

    /// Write solved geometry for `id`, carrying it through the region's grid
    /// group when it has one.
    fn commit(&mut self, model: &mut CropModel, id: RegionId, rect: &Rect, ctx: &ConstraintContext) -> Vec<Action> {
        let Some(region) = model.get(id) else {
            self.reset();
            return Vec::new();
        };
        let mut next = region.clone();
        next.set_rect(rect);
        if next == *region {
            return Vec::new();
        }

        let updated = match next.grid_id {
            Some(grid_id) => grid::propagate(
                &model.regions,
                grid_id,
                id,
                &RegionPatch::geometry_of(&next),
                &ctx.with_handle(None),
                self.policy.config.grid_spacing,
            ),
            None => vec![next],
        };
        if updated.is_empty() {
            return Vec::new();
        }
        model.apply_updates(&updated);
        self.dirty = true;
        vec![Action::RegionsUpdated(updated)]
    }

    fn reset(&mut self) {
        self.mode = InteractionMode::Idle;
        self.dirty = false;
    }
}

/// Display → image with a sanitized transform, which cannot fail.
#[inline]
fn to_image(p: Point, transform: &DisplayTransform) -> Point {
    display_to_image(p, transform).unwrap_or(p)
}
