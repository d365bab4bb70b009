//! Coordinate transforms between image, display, and region-local space.
//!
//! # Coordinate Systems
//!
//! - **Image space**: pixels of the source raster, origin top-left.
//! - **Display space**: image space after the view's uniform scale and
//!   translation (`display = image * scale + offset`).
//! - **Local space**: a region's own unrotated frame. A point in local space
//!   has the coordinates it would have if the region's rotation were zero.
//!
//! Rotation angles are degrees at the API surface and radians internally.
//! Positive angles rotate clockwise on screen (y grows downward).
//!
//! Because the display transform is a uniform scale plus translation it
//! preserves angles, so [`to_local`] and [`to_world`] work on a [`Rect`]
//! expressed in either image or display space.

use serde::{Deserialize, Serialize};

use crate::config::{self, MAX_ZOOM, MIN_ZOOM};
use crate::error::GeometryError;

/// A 2D point or vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// An axis-aligned rectangle with a rotation about its own center.
///
/// This is the geometric part of a region, decoupled from its identity and
/// metadata so the same math serves image-space and display-space frames.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Rotation in degrees about the center.
    pub rotation: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rotation: 0.0,
        }
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Axis-aligned containment, ignoring rotation.
    pub fn contains_unrotated(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Containment test that honors rotation.
    pub fn contains(&self, p: Point) -> bool {
        self.contains_unrotated(to_local(p, self))
    }

    /// Corners in world space, clockwise from the top-left (nw, ne, se, sw).
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.right(), self.bottom()),
            Point::new(self.x, self.bottom()),
        ]
        .map(|p| to_world(p, self))
    }

    /// Axis-aligned bounding box of the rotated rectangle, as
    /// `(min_x, min_y, max_x, max_y)`.
    pub fn bounding_box(&self) -> (f64, f64, f64, f64) {
        let corners = self.corners();
        corners.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(min_x, min_y, max_x, max_y), p| {
                (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y))
            },
        )
    }
}

/// A display-space rectangle regions must stay inside under the
/// viewport-aware containment policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafeArea {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl SafeArea {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: min_x.max(max_x),
            max_y: min_y.max(max_y),
        }
    }

    /// Safe area inset `margin` units from a viewport of the given size.
    pub fn inset(view_width: f64, view_height: f64, margin: f64) -> Self {
        Self::new(margin, margin, view_width - margin, view_height - margin)
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

/// Uniform scale plus translation from image space to display space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayTransform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for DisplayTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl DisplayTransform {
    pub const IDENTITY: DisplayTransform = DisplayTransform {
        scale: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
    };

    /// Create a transform with a guarded scale (see [`Self::sanitized`]).
    pub fn new(scale: f64, offset_x: f64, offset_y: f64) -> Self {
        Self {
            scale,
            offset_x,
            offset_y,
        }
        .sanitized()
    }

    #[inline]
    pub fn offset(&self) -> Point {
        Point::new(self.offset_x, self.offset_y)
    }

    /// Nearest valid transform: finite offsets and a positive scale. A
    /// non-positive scale becomes `MIN_ZOOM`; a non-finite one resets to 1.
    pub fn sanitized(self) -> Self {
        let scale = if !self.scale.is_finite() {
            1.0
        } else if self.scale <= 0.0 {
            MIN_ZOOM
        } else {
            self.scale
        };
        let finite_or_zero = |v: f64| if v.is_finite() { v } else { 0.0 };
        Self {
            scale,
            offset_x: finite_or_zero(self.offset_x),
            offset_y: finite_or_zero(self.offset_y),
        }
    }

    /// Translate the view by a display-space delta.
    pub fn pan_by(self, dx: f64, dy: f64) -> Self {
        Self {
            offset_x: self.offset_x + dx,
            offset_y: self.offset_y + dy,
            ..self
        }
    }

    /// Zoom by `factor` keeping the display-space `anchor` over the same
    /// image point. The resulting scale is clamped to `[min_zoom, max_zoom]`
    /// after the bounds pass through [`config::zoom_range`].
    pub fn zoom_at(self, anchor: Point, factor: f64, min_zoom: f64, max_zoom: f64) -> Self {
        if !factor.is_finite() || factor <= 0.0 {
            return self;
        }
        let (min_zoom, max_zoom) = config::zoom_range(min_zoom, max_zoom);
        let current = self.sanitized();
        let scale = (current.scale * factor).clamp(min_zoom, max_zoom);
        let ratio = scale / current.scale;
        Self {
            scale,
            offset_x: anchor.x - (anchor.x - current.offset_x) * ratio,
            offset_y: anchor.y - (anchor.y - current.offset_y) * ratio,
        }
    }

    /// Transform that fits an image into a viewport, centered, leaving
    /// `margin` display units on the tighter axis.
    pub fn fit(image_width: f64, image_height: f64, view_width: f64, view_height: f64, margin: f64) -> Self {
        if image_width <= 0.0 || image_height <= 0.0 {
            return Self::IDENTITY;
        }
        let avail_w = (view_width - 2.0 * margin).max(1.0);
        let avail_h = (view_height - 2.0 * margin).max(1.0);
        let scale = (avail_w / image_width)
            .min(avail_h / image_height)
            .clamp(MIN_ZOOM, MAX_ZOOM);
        Self {
            scale,
            offset_x: (view_width - image_width * scale) / 2.0,
            offset_y: (view_height - image_height * scale) / 2.0,
        }
    }

    /// Project an image-space rect into display space. Rotation is unchanged.
    pub fn rect_to_display(&self, rect: &Rect) -> Rect {
        let origin = image_to_display(Point::new(rect.x, rect.y), self);
        Rect {
            x: origin.x,
            y: origin.y,
            width: rect.width * self.scale,
            height: rect.height * self.scale,
            rotation: rect.rotation,
        }
    }

    /// Map a display-space rect back into image space.
    pub fn rect_to_image(&self, rect: &Rect) -> Result<Rect, GeometryError> {
        let origin = display_to_image(Point::new(rect.x, rect.y), self)?;
        Ok(Rect {
            x: origin.x,
            y: origin.y,
            width: rect.width / self.scale,
            height: rect.height / self.scale,
            rotation: rect.rotation,
        })
    }
}

/// Map an image-space point to display space.
#[inline]
pub fn image_to_display(p: Point, t: &DisplayTransform) -> Point {
    Point::new(p.x * t.scale + t.offset_x, p.y * t.scale + t.offset_y)
}

/// Map a display-space point to image space.
///
/// Fails only when the transform's scale is exactly zero. Transforms built
/// with [`DisplayTransform::new`] or [`DisplayTransform::sanitized`] never
/// have a zero scale.
#[inline]
pub fn display_to_image(p: Point, t: &DisplayTransform) -> Result<Point, GeometryError> {
    if t.scale == 0.0 {
        return Err(GeometryError::DivisionByZero);
    }
    Ok(Point::new((p.x - t.offset_x) / t.scale, (p.y - t.offset_y) / t.scale))
}

/// Normalize an angle in degrees into `[0, 360)`.
#[inline]
pub fn normalize_degrees(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let a = ((angle % 360.0) + 360.0) % 360.0;
    // (-tiny + 360) % 360 rounds to exactly 360
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}

/// Rotate `p` about `center` by `degrees`.
#[inline]
pub fn rotate_about(p: Point, center: Point, degrees: f64) -> Point {
    if degrees == 0.0 {
        return p;
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    let dx = p.x - center.x;
    let dy = p.y - center.y;
    Point::new(center.x + dx * cos - dy * sin, center.y + dx * sin + dy * cos)
}

/// Express a world point in the rect's unrotated frame.
#[inline]
pub fn to_local(p: Point, rect: &Rect) -> Point {
    rotate_about(p, rect.center(), -rect.rotation)
}

/// Inverse of [`to_local`]: place a local-frame point back in the world.
#[inline]
pub fn to_world(p: Point, rect: &Rect) -> Point {
    rotate_about(p, rect.center(), rect.rotation)
}

/// Signed shortest angular difference `to - from`, in `(-180, 180]`.
#[inline]
pub fn angle_delta(from: f64, to: f64) -> f64 {
    let d = normalize_degrees(to - from);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_point_eq(a: Point, b: Point) {
        assert!(
            (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn test_image_to_display() {
        let t = DisplayTransform::new(2.0, 10.0, 20.0);
        let p = image_to_display(Point::new(5.0, 5.0), &t);
        assert_eq!(p, Point::new(20.0, 30.0));
    }

    #[test]
    fn test_display_to_image_inverts() {
        let t = DisplayTransform::new(2.0, 10.0, 20.0);
        let p = display_to_image(Point::new(20.0, 30.0), &t).unwrap();
        assert_eq!(p, Point::new(5.0, 5.0));
    }

    #[test]
    fn test_display_to_image_zero_scale() {
        let t = DisplayTransform {
            scale: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
        };
        assert_eq!(
            display_to_image(Point::new(1.0, 1.0), &t),
            Err(GeometryError::DivisionByZero)
        );
    }

    #[test]
    fn test_sanitized_guards_scale() {
        let zero = DisplayTransform {
            scale: 0.0,
            offset_x: f64::NAN,
            offset_y: 3.0,
        }
        .sanitized();
        assert_eq!(zero.scale, MIN_ZOOM);
        assert_eq!(zero.offset_x, 0.0);
        assert_eq!(zero.offset_y, 3.0);

        let inf = DisplayTransform {
            scale: f64::INFINITY,
            ..DisplayTransform::IDENTITY
        };
        assert_eq!(inf.sanitized().scale, 1.0);
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert_eq!(normalize_degrees(370.0), 10.0);
        assert_eq!(normalize_degrees(-10.0), 350.0);
        assert_eq!(normalize_degrees(-720.0), 0.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_eq!(normalize_degrees(f64::NAN), 0.0);
        assert!(normalize_degrees(-1e-15) < 360.0);
    }

    #[test]
    fn test_angle_delta_wraps() {
        assert!((angle_delta(350.0, 10.0) - 20.0).abs() < EPS);
        assert!((angle_delta(10.0, 350.0) + 20.0).abs() < EPS);
        assert!((angle_delta(0.0, 180.0) - 180.0).abs() < EPS);
    }

    #[test]
    fn test_to_local_unrotated_is_identity() {
        let rect = Rect::new(10.0, 10.0, 100.0, 50.0);
        let p = Point::new(33.0, 44.0);
        assert_eq!(to_local(p, &rect), p);
    }

    #[test]
    fn test_to_world_rotates_clockwise_on_screen() {
        // 90° about the center (50, 50): a point right of center moves below it.
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0).with_rotation(90.0);
        let p = to_world(Point::new(100.0, 50.0), &rect);
        assert_point_eq(p, Point::new(50.0, 100.0));
    }

    #[test]
    fn test_rotated_contains() {
        let rect = Rect::new(0.0, 40.0, 100.0, 20.0).with_rotation(90.0);
        // Rotated 90°, the thin horizontal bar becomes a vertical bar at x≈50.
        assert!(rect.contains(Point::new(50.0, 5.0)));
        assert!(!rect.contains(Point::new(5.0, 50.0)));
    }

    #[test]
    fn test_bounding_box_of_rotated_square() {
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0).with_rotation(45.0);
        let (min_x, min_y, max_x, max_y) = rect.bounding_box();
        let half_diag = 50.0 * 2f64.sqrt();
        assert!((min_x - (50.0 - half_diag)).abs() < 1e-6);
        assert!((max_x - (50.0 + half_diag)).abs() < 1e-6);
        assert!((min_y - (50.0 - half_diag)).abs() < 1e-6);
        assert!((max_y - (50.0 + half_diag)).abs() < 1e-6);
    }

    #[test]
    fn test_safe_area_orders_bounds() {
        let area = SafeArea::new(100.0, 80.0, 10.0, 20.0);
        assert_eq!(area.min_x, 10.0);
        assert_eq!(area.max_y, 80.0);
        assert_eq!(area.width(), 90.0);
        assert!(area.contains(Point::new(50.0, 50.0)));
        assert!(!area.contains(Point::new(5.0, 50.0)));
        assert_eq!(SafeArea::inset(800.0, 600.0, 20.0).max_x, 780.0);
    }

    #[test]
    fn test_pan_by() {
        let t = DisplayTransform::IDENTITY.pan_by(5.0, -3.0);
        assert_eq!(t.offset(), Point::new(5.0, -3.0));
    }

    #[test]
    fn test_zoom_at_keeps_anchor_fixed() {
        let t = DisplayTransform::new(1.0, 10.0, 10.0);
        let anchor = Point::new(200.0, 150.0);
        let before = display_to_image(anchor, &t).unwrap();
        let zoomed = t.zoom_at(anchor, 2.0, MIN_ZOOM, MAX_ZOOM);
        let after = display_to_image(anchor, &zoomed).unwrap();
        assert_eq!(zoomed.scale, 2.0);
        assert_point_eq(before, after);
    }

    #[test]
    fn test_zoom_at_clamps() {
        let t = DisplayTransform::new(8.0, 0.0, 0.0);
        let zoomed = t.zoom_at(Point::default(), 4.0, MIN_ZOOM, MAX_ZOOM);
        assert_eq!(zoomed.scale, MAX_ZOOM);
        assert_eq!(t.zoom_at(Point::default(), -1.0, MIN_ZOOM, MAX_ZOOM), t);
    }

    #[test]
    fn test_zoom_at_tolerates_bad_bounds() {
        let t = DisplayTransform::new(2.0, 0.0, 0.0);
        assert_eq!(t.zoom_at(Point::default(), 4.0, 5.0, 1.0).scale, 5.0);
        assert_eq!(t.zoom_at(Point::default(), 0.1, 5.0, 1.0).scale, 1.0);
        assert_eq!(t.zoom_at(Point::default(), 100.0, f64::NAN, f64::NAN).scale, MAX_ZOOM);
    }

    #[test]
    fn test_fit_centers_image() {
        let t = DisplayTransform::fit(1000.0, 500.0, 520.0, 520.0, 10.0);
        assert!((t.scale - 0.5).abs() < EPS);
        assert!((t.offset_x - 10.0).abs() < EPS);
        assert!((t.offset_y - 135.0).abs() < EPS);
    }

    #[test]
    fn test_rect_display_round_trip() {
        let t = DisplayTransform::new(2.5, -40.0, 12.0);
        let rect = Rect::new(10.0, 20.0, 30.0, 40.0).with_rotation(33.0);
        let back = t.rect_to_image(&t.rect_to_display(&rect)).unwrap();
        assert!((back.x - rect.x).abs() < EPS);
        assert!((back.width - rect.width).abs() < EPS);
        assert_eq!(back.rotation, rect.rotation);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
