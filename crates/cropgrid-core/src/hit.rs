//! Hit-testing of display-space points against crop regions.
//!
//! All tolerances are in display units: regions are projected through the
//! display transform first, then handles are laid out in the projected
//! region's local frame and rotated into the world with [`to_world`].
//!
//! # Priority
//!
//! When several targets overlap, [`hit_test`] resolves them in this order:
//! 1. Rotation handle of the selected region
//! 2. Resize handles of the selected region
//! 3. Region bodies, highest `z_index` first (later regions win ties)
//! 4. Empty space
//!
//! A point outside an active safe area short-circuits to
//! [`HitTarget::OutsideViewport`].

use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::geometry::{normalize_degrees, to_local, to_world, DisplayTransform, Point, Rect, SafeArea};
use crate::region::{Region, RegionId};

/// One of the eight resize handles of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handle {
    Nw,
    Ne,
    Sw,
    Se,
    N,
    S,
    W,
    E,
}

/// Which edges of the rectangle a handle moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Edges {
    pub top: bool,
    pub bottom: bool,
    pub left: bool,
    pub right: bool,
}

impl Edges {
    /// Whether the handle changes the width.
    #[inline]
    pub fn horizontal(&self) -> bool {
        self.left || self.right
    }

    /// Whether the handle changes the height.
    #[inline]
    pub fn vertical(&self) -> bool {
        self.top || self.bottom
    }
}

impl Handle {
    /// All resize handles, corners first.
    pub const ALL: [Handle; 8] = [
        Handle::Nw,
        Handle::Ne,
        Handle::Sw,
        Handle::Se,
        Handle::N,
        Handle::S,
        Handle::W,
        Handle::E,
    ];

    /// Edges moved by dragging this handle.
    pub fn edges(self) -> Edges {
        let (top, bottom, left, right) = match self {
            Handle::Nw => (true, false, true, false),
            Handle::Ne => (true, false, false, true),
            Handle::Sw => (false, true, true, false),
            Handle::Se => (false, true, false, true),
            Handle::N => (true, false, false, false),
            Handle::S => (false, true, false, false),
            Handle::W => (false, false, true, false),
            Handle::E => (false, false, false, true),
        };
        Edges {
            top,
            bottom,
            left,
            right,
        }
    }

    /// Handle center in the rect's local (unrotated) frame.
    pub fn local_position(self, rect: &Rect) -> Point {
        let cx = rect.x + rect.width / 2.0;
        let cy = rect.y + rect.height / 2.0;
        let (x, y) = match self {
            Handle::Nw => (rect.x, rect.y),
            Handle::Ne => (rect.right(), rect.y),
            Handle::Sw => (rect.x, rect.bottom()),
            Handle::Se => (rect.right(), rect.bottom()),
            Handle::N => (cx, rect.y),
            Handle::S => (cx, rect.bottom()),
            Handle::W => (rect.x, cy),
            Handle::E => (rect.right(), cy),
        };
        Point::new(x, y)
    }

    /// Handle center in world space.
    #[inline]
    pub fn world_position(self, rect: &Rect) -> Point {
        to_world(self.local_position(rect), rect)
    }

    /// Screen direction of the handle from the center, in degrees clockwise
    /// from "up", for an unrotated region.
    fn base_angle(self) -> f64 {
        match self {
            Handle::N => 0.0,
            Handle::Ne => 45.0,
            Handle::E => 90.0,
            Handle::Se => 135.0,
            Handle::S => 180.0,
            Handle::Sw => 225.0,
            Handle::W => 270.0,
            Handle::Nw => 315.0,
        }
    }
}

/// What a point hits on a single region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "handle", rename_all = "snake_case")]
pub enum RegionHit {
    Rotation,
    Handle(Handle),
    Body,
}

/// Result of hit-testing a point against the whole collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HitTarget {
    Rotation { id: RegionId },
    Handle { id: RegionId, handle: Handle },
    Body { id: RegionId },
    Empty,
    OutsideViewport,
}

impl HitTarget {
    /// Region under the point, if any.
    pub fn region_id(&self) -> Option<RegionId> {
        match *self {
            HitTarget::Rotation { id } | HitTarget::Handle { id, .. } | HitTarget::Body { id } => Some(id),
            HitTarget::Empty | HitTarget::OutsideViewport => None,
        }
    }
}

/// Display-space tolerances for one hit-test pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitMetrics {
    /// Side of the square tolerance box around resize handles.
    pub handle_size: f64,
    /// Distance from the top edge to the rotation handle.
    pub rotation_offset: f64,
    /// Radius of the circular rotation-handle tolerance.
    pub rotation_radius: f64,
}

impl HitMetrics {
    /// Metrics for a view at the given zoom level.
    pub fn new(config: &EditorConfig, zoom: f64) -> Self {
        let handle_size = config.handle_size(zoom);
        Self {
            handle_size,
            rotation_offset: config.rotation_handle_offset,
            rotation_radius: handle_size / 2.0,
        }
    }
}

impl Default for HitMetrics {
    fn default() -> Self {
        Self::new(&EditorConfig::default(), 1.0)
    }
}

/// Rotation handle center in world space for a display-space rect.
pub fn rotation_handle_position(rect: &Rect, offset: f64) -> Point {
    let local = Point::new(rect.x + rect.width / 2.0, rect.y - offset);
    to_world(local, rect)
}

/// Classify a display-space point against one region.
///
/// Checks the rotation handle, then resize handles, then the body. Returns
/// `None` when the point misses the region entirely.
pub fn classify(
    point: Point,
    region: &Region,
    transform: &DisplayTransform,
    metrics: &HitMetrics,
) -> Option<RegionHit> {
    let rect = transform.rect_to_display(&region.rect());

    if point.distance(rotation_handle_position(&rect, metrics.rotation_offset)) <= metrics.rotation_radius {
        return Some(RegionHit::Rotation);
    }

    if let Some(handle) = handle_at(point, &rect, metrics.handle_size) {
        return Some(RegionHit::Handle(handle));
    }

    if body_contains(point, &rect) {
        return Some(RegionHit::Body);
    }

    None
}

/// Resize handle under a display-space point, using a square tolerance.
pub fn handle_at(point: Point, rect: &Rect, handle_size: f64) -> Option<Handle> {
    let half = handle_size / 2.0;
    Handle::ALL.into_iter().find(|handle| {
        let center = handle.world_position(rect);
        (point.x - center.x).abs() <= half && (point.y - center.y).abs() <= half
    })
}

/// Body containment in the rect's local frame.
#[inline]
pub fn body_contains(point: Point, rect: &Rect) -> bool {
    rect.contains_unrotated(to_local(point, rect))
}

/// Hit-test a display-space point against a region collection.
///
/// Hidden regions are skipped. Handles are only live on the selected region.
pub fn hit_test(
    point: Point,
    regions: &[Region],
    selected: Option<RegionId>,
    transform: &DisplayTransform,
    metrics: &HitMetrics,
    safe_area: Option<&SafeArea>,
) -> HitTarget {
    if let Some(area) = safe_area {
        if !area.contains(point) {
            return HitTarget::OutsideViewport;
        }
    }

    let selected_region = selected.and_then(|id| regions.iter().find(|r| r.id == id && r.visible));
    if let Some(region) = selected_region {
        let rect = transform.rect_to_display(&region.rect());
        if point.distance(rotation_handle_position(&rect, metrics.rotation_offset)) <= metrics.rotation_radius {
            return HitTarget::Rotation { id: region.id };
        }
        if let Some(handle) = handle_at(point, &rect, metrics.handle_size) {
            return HitTarget::Handle {
                id: region.id,
                handle,
            };
        }
    }

    // max_by_key returns the last maximum, so later regions win z ties.
    regions
        .iter()
        .filter(|r| r.visible)
        .filter(|r| body_contains(point, &transform.rect_to_display(&r.rect())))
        .max_by_key(|r| r.z_index)
        .map_or(HitTarget::Empty, |r| HitTarget::Body { id: r.id })
}

/// Cursor a host should show over a hit target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CursorHint {
    Default,
    Crosshair,
    Move,
    Grab,
    Grabbing,
    Rotate,
    NsResize,
    EwResize,
    NwseResize,
    NeswResize,
    NotAllowed,
}

impl CursorHint {
    /// CSS cursor keyword.
    pub fn as_css(self) -> &'static str {
        match self {
            CursorHint::Default => "default",
            CursorHint::Crosshair => "crosshair",
            CursorHint::Move => "move",
            CursorHint::Grab => "grab",
            CursorHint::Grabbing => "grabbing",
            CursorHint::Rotate => "alias",
            CursorHint::NsResize => "ns-resize",
            CursorHint::EwResize => "ew-resize",
            CursorHint::NwseResize => "nwse-resize",
            CursorHint::NeswResize => "nesw-resize",
            CursorHint::NotAllowed => "not-allowed",
        }
    }

    /// Resize cursor for a handle on a region rotated by `rotation` degrees.
    pub fn for_handle(handle: Handle, rotation: f64) -> Self {
        let angle = normalize_degrees(handle.base_angle() + rotation);
        // Resize cursors are symmetric, so fold to [0, 180) in 45° buckets.
        let bucket = ((angle % 180.0) / 45.0).round() as u32 % 4;
        match bucket {
            0 => CursorHint::NsResize,
            1 => CursorHint::NeswResize,
            2 => CursorHint::EwResize,
            _ => CursorHint::NwseResize,
        }
    }
}

/// Cursor for an idle pointer over `target`.
///
/// `over_image` tells whether an empty-space point lies over the image
/// (create) or over the surrounding canvas (pan).
pub fn cursor_hint(target: &HitTarget, regions: &[Region], over_image: bool) -> CursorHint {
    match *target {
        HitTarget::Rotation { .. } => CursorHint::Rotate,
        HitTarget::Handle { id, handle } => {
            let rotation = regions.iter().find(|r| r.id == id).map_or(0.0, |r| r.rotation);
            CursorHint::for_handle(handle, rotation)
        }
        HitTarget::Body { .. } => CursorHint::Move,
        HitTarget::Empty if over_image => CursorHint::Crosshair,
        HitTarget::Empty => CursorHint::Grab,
        HitTarget::OutsideViewport => CursorHint::NotAllowed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(id: u64, x: f64, y: f64, w: f64, h: f64) -> Region {
        Region::new(RegionId(id), format!("Crop {id}"), x, y, w, h)
    }

    fn metrics() -> HitMetrics {
        HitMetrics::default()
    }

    #[test]
    fn test_handle_edges() {
        let e = Handle::Nw.edges();
        assert!(e.top && e.left && !e.bottom && !e.right);
        assert!(Handle::E.edges().horizontal());
        assert!(!Handle::E.edges().vertical());
        assert!(Handle::S.edges().vertical());
    }

    #[test]
    fn test_classify_corner_handle() {
        let r = region(1, 100.0, 100.0, 200.0, 150.0);
        let t = DisplayTransform::IDENTITY;
        assert_eq!(
            classify(Point::new(302.0, 252.0), &r, &t, &metrics()),
            Some(RegionHit::Handle(Handle::Se))
        );
        assert_eq!(
            classify(Point::new(100.0, 175.0), &r, &t, &metrics()),
            Some(RegionHit::Handle(Handle::W))
        );
    }

    #[test]
    fn test_classify_body_and_miss() {
        let r = region(1, 100.0, 100.0, 200.0, 150.0);
        let t = DisplayTransform::IDENTITY;
        assert_eq!(classify(Point::new(200.0, 175.0), &r, &t, &metrics()), Some(RegionHit::Body));
        assert_eq!(classify(Point::new(50.0, 50.0), &r, &t, &metrics()), None);
    }

    #[test]
    fn test_classify_rotation_handle_above_top_edge() {
        let r = region(1, 100.0, 100.0, 200.0, 150.0);
        let t = DisplayTransform::IDENTITY;
        // Top-edge midpoint is (200, 100); the handle sits 30 units above.
        assert_eq!(classify(Point::new(200.0, 70.0), &r, &t, &metrics()), Some(RegionHit::Rotation));
        // Circular tolerance: the square corner of the tolerance box misses.
        assert_eq!(classify(Point::new(204.9, 65.1), &r, &t, &metrics()), None);
    }

    #[test]
    fn test_classify_rotated_region() {
        let mut r = region(1, 0.0, 0.0, 100.0, 100.0);
        r.rotation = 90.0;
        let t = DisplayTransform::IDENTITY;
        // After 90° the local top edge faces right; the rotation handle is at (130, 50).
        assert_eq!(classify(Point::new(130.0, 50.0), &r, &t, &metrics()), Some(RegionHit::Rotation));
        // The local nw corner lands at the world ne corner.
        assert_eq!(
            classify(Point::new(100.0, 0.0), &r, &t, &metrics()),
            Some(RegionHit::Handle(Handle::Nw))
        );
    }

    #[test]
    fn test_classify_respects_transform() {
        let r = region(1, 10.0, 10.0, 50.0, 50.0);
        let t = DisplayTransform::new(2.0, 100.0, 0.0);
        // Image (35, 35) → display (170, 70)
        assert_eq!(classify(Point::new(170.0, 70.0), &r, &t, &metrics()), Some(RegionHit::Body));
        assert_eq!(classify(Point::new(35.0, 35.0), &r, &t, &metrics()), None);
    }

    #[test]
    fn test_handle_size_scales_with_zoom() {
        let config = EditorConfig::default();
        let near = HitMetrics::new(&config, 2.0);
        let far = HitMetrics::new(&config, 0.5);
        assert!(near.handle_size > far.handle_size);
        assert_eq!(near.rotation_radius, near.handle_size / 2.0);
    }

    #[test]
    fn test_hit_test_selected_handles_first() {
        let a = region(1, 0.0, 0.0, 100.0, 100.0);
        let mut b = region(2, 50.0, 50.0, 100.0, 100.0);
        b.z_index = 5;
        let regions = vec![a, b];
        let t = DisplayTransform::IDENTITY;
        // (100, 100) is a's se handle and inside b's body; selection decides.
        let hit = hit_test(Point::new(100.0, 100.0), &regions, Some(RegionId(1)), &t, &metrics(), None);
        assert_eq!(
            hit,
            HitTarget::Handle {
                id: RegionId(1),
                handle: Handle::Se
            }
        );
        let hit = hit_test(Point::new(100.0, 100.0), &regions, None, &t, &metrics(), None);
        assert_eq!(hit, HitTarget::Body { id: RegionId(2) });
    }

    #[test]
    fn test_hit_test_z_order_and_ties() {
        let mut a = region(1, 0.0, 0.0, 100.0, 100.0);
        let b = region(2, 0.0, 0.0, 100.0, 100.0);
        let t = DisplayTransform::IDENTITY;
        let p = Point::new(50.0, 50.0);

        let regions = vec![a.clone(), b.clone()];
        assert_eq!(hit_test(p, &regions, None, &t, &metrics(), None), HitTarget::Body { id: RegionId(2) });

        a.z_index = 1;
        let regions = vec![a, b];
        assert_eq!(hit_test(p, &regions, None, &t, &metrics(), None), HitTarget::Body { id: RegionId(1) });
    }

    #[test]
    fn test_hit_test_skips_hidden() {
        let mut a = region(1, 0.0, 0.0, 100.0, 100.0);
        a.visible = false;
        let regions = vec![a];
        let hit = hit_test(
            Point::new(50.0, 50.0),
            &regions,
            Some(RegionId(1)),
            &DisplayTransform::IDENTITY,
            &metrics(),
            None,
        );
        assert_eq!(hit, HitTarget::Empty);
    }

    #[test]
    fn test_hit_test_outside_viewport() {
        let regions = vec![region(1, 0.0, 0.0, 100.0, 100.0)];
        let area = SafeArea::new(10.0, 10.0, 500.0, 500.0);
        let t = DisplayTransform::IDENTITY;
        assert_eq!(
            hit_test(Point::new(5.0, 50.0), &regions, None, &t, &metrics(), Some(&area)),
            HitTarget::OutsideViewport
        );
        assert_eq!(
            hit_test(Point::new(50.0, 50.0), &regions, None, &t, &metrics(), Some(&area)),
            HitTarget::Body { id: RegionId(1) }
        );
    }

    #[test]
    fn test_cursor_for_rotated_handles() {
        assert_eq!(CursorHint::for_handle(Handle::E, 0.0), CursorHint::EwResize);
        assert_eq!(CursorHint::for_handle(Handle::E, 90.0), CursorHint::NsResize);
        assert_eq!(CursorHint::for_handle(Handle::Nw, 0.0), CursorHint::NwseResize);
        assert_eq!(CursorHint::for_handle(Handle::Nw, 90.0), CursorHint::NeswResize);
        assert_eq!(CursorHint::for_handle(Handle::N, 170.0), CursorHint::NsResize);
    }

    #[test]
    fn test_cursor_hint_targets() {
        let regions = vec![region(1, 0.0, 0.0, 10.0, 10.0)];
        assert_eq!(cursor_hint(&HitTarget::Body { id: RegionId(1) }, &regions, true), CursorHint::Move);
        assert_eq!(cursor_hint(&HitTarget::Empty, &regions, true), CursorHint::Crosshair);
        assert_eq!(cursor_hint(&HitTarget::Empty, &regions, false), CursorHint::Grab);
        assert_eq!(CursorHint::Rotate.as_css(), "alias");
    }
}
