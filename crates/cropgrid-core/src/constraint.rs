//! Constraint solver for proposed region geometry.
//!
//! [`apply`] takes a proposed rect and returns the nearest valid one. The
//! policies run in a fixed order:
//!
//! 1. **Minimum size floor**: width and height are raised to the floor.
//! 2. **Aspect-ratio lock**: the secondary dimension is derived from the
//!    primary one chosen by the active handle (see [`primary_axis`]).
//! 3. **Image containment** ([`Containment::Image`]): size capped to the
//!    room left inside the image, position clamped into it.
//! 4. **Safe-area containment** ([`Containment::SafeArea`]): the same
//!    clamp applied to the region's display-space projection.
//!
//! Containment is a per-view strategy: a view picks one of the
//! [`Containment`] variants and the two bounded policies never compose.
//!
//! While resizing, the edges opposite the active handle stay where the
//! proposal put them through every step. The floor always wins over
//! containment: a bound smaller than the floor yields a region that pokes
//! out of it, positioned at the bound's origin.
//!
//! Rotation is not considered by containment; bounds apply to the unrotated
//! `x, y, width, height` box. Resizing a rotated region goes through
//! [`contain_rotated_resize`], which re-centres the box on screen before
//! containing it.

use serde::{Deserialize, Serialize};

use crate::config::MIN_SIZE_PRECISE;
use crate::geometry::{normalize_degrees, to_world, DisplayTransform, Point, Rect, SafeArea};
use crate::hit::{Edges, Handle};
use crate::region::ImageSize;

/// Tolerance for a box that already touches its bounds.
const BOUNDS_EPSILON: f64 = 1e-9;

/// Outer-bounds strategy of a view.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Containment {
    /// No outer bounds; only size floor and aspect lock apply.
    #[default]
    Unbounded,
    /// Keep regions inside the source image.
    Image,
    /// Keep the display-space projection inside a screen rectangle.
    SafeArea {
        area: SafeArea,
        transform: DisplayTransform,
    },
}

/// Bounds policy a view selects, resolved against the view's current
/// transform into a [`Containment`] at solve time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "area", rename_all = "snake_case")]
pub enum ViewBounds {
    #[default]
    Unbounded,
    Image,
    SafeArea(SafeArea),
}

impl ViewBounds {
    pub fn containment(&self, transform: DisplayTransform) -> Containment {
        match *self {
            ViewBounds::Unbounded => Containment::Unbounded,
            ViewBounds::Image => Containment::Image,
            ViewBounds::SafeArea(area) => Containment::SafeArea {
                area,
                transform: transform.sanitized(),
            },
        }
    }

    /// Safe area for hit-testing, if this is a viewport-aware view.
    pub fn safe_area(&self) -> Option<&SafeArea> {
        match self {
            ViewBounds::SafeArea(area) => Some(area),
            _ => None,
        }
    }
}

/// Which dimension drives the other under an aspect lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
}

/// Primary dimension for an aspect-locked change driven by `handle`.
///
/// Edge handles drive their own axis. Corners use a fixed convention:
/// `nw`/`se` let width drive height, `ne`/`sw` let height drive width.
/// Translation (`None`) keeps width primary.
pub fn primary_axis(handle: Option<Handle>) -> Axis {
    match handle {
        None | Some(Handle::W | Handle::E | Handle::Nw | Handle::Se) => Axis::Width,
        Some(Handle::N | Handle::S | Handle::Ne | Handle::Sw) => Axis::Height,
    }
}

/// Inputs the solver needs besides the proposed geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintContext {
    pub image: ImageSize,
    /// Size floor in image units.
    pub min_size: f64,
    pub containment: Containment,
    /// Locked `width / height`, if any.
    pub aspect_ratio: Option<f64>,
    /// Handle being dragged; `None` for translation.
    pub handle: Option<Handle>,
}

impl ConstraintContext {
    /// Unbounded context with the given floor. A non-positive or non-finite
    /// floor falls back to `MIN_SIZE_PRECISE`.
    pub fn new(image: ImageSize, min_size: f64) -> Self {
        let min_size = if min_size.is_finite() && min_size > 0.0 {
            min_size
        } else {
            MIN_SIZE_PRECISE
        };
        Self {
            image,
            min_size,
            containment: Containment::Unbounded,
            aspect_ratio: None,
            handle: None,
        }
    }

    pub fn with_containment(mut self, containment: Containment) -> Self {
        self.containment = match containment {
            Containment::SafeArea { area, transform } => Containment::SafeArea {
                area,
                transform: transform.sanitized(),
            },
            other => other,
        };
        self
    }

    /// Lock an aspect ratio. Non-positive or non-finite ratios unlock.
    pub fn with_aspect_ratio(mut self, ratio: Option<f64>) -> Self {
        self.aspect_ratio = ratio.filter(|r| r.is_finite() && *r > 0.0);
        self
    }

    pub fn with_handle(mut self, handle: Option<Handle>) -> Self {
        self.handle = handle;
        self
    }
}

/// Edges that stay fixed while the size changes.
#[derive(Debug, Clone, Copy)]
struct Anchor {
    edges: Edges,
    right: f64,
    bottom: f64,
}

impl Anchor {
    fn capture(rect: &Rect, handle: Option<Handle>) -> Self {
        Self {
            edges: handle.map(Handle::edges).unwrap_or_default(),
            right: rect.right(),
            bottom: rect.bottom(),
        }
    }

    /// Resize keeping the anchored edges in place. Without a moving left or
    /// top edge, the left/top edge is the one held.
    fn resize(&self, rect: &mut Rect, width: f64, height: f64) {
        rect.width = width;
        rect.height = height;
        if self.edges.left {
            rect.x = self.right - width;
        }
        if self.edges.top {
            rect.y = self.bottom - height;
        }
    }
}

/// Axis-aligned bounds for the containment step.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

/// Correct a proposed rect so it satisfies every active policy.
pub fn apply(proposed: &Rect, ctx: &ConstraintContext) -> Rect {
    let mut rect = sanitize(proposed, ctx.min_size);
    let anchor = Anchor::capture(&rect, ctx.handle);

    // 1. Minimum size floor
    let (w, h) = (rect.width.max(ctx.min_size), rect.height.max(ctx.min_size));
    anchor.resize(&mut rect, w, h);

    // 2. Aspect-ratio lock
    if let Some(ratio) = ctx.aspect_ratio {
        let (w, h) = lock_ratio(rect.width, rect.height, ratio, primary_axis(ctx.handle), ctx.min_size);
        anchor.resize(&mut rect, w, h);
    }

    // 3./4. Containment
    match ctx.containment {
        Containment::Unbounded => rect,
        Containment::Image => {
            let bounds = Bounds {
                min_x: 0.0,
                min_y: 0.0,
                max_x: ctx.image.width,
                max_y: ctx.image.height,
            };
            contain(rect, bounds, ctx.min_size, ctx.aspect_ratio, ctx.handle)
        }
        Containment::SafeArea { area, transform } => {
            let transform = transform.sanitized();
            let display = transform.rect_to_display(&rect);
            let bounds = Bounds {
                min_x: area.min_x,
                min_y: area.min_y,
                max_x: area.max_x,
                max_y: area.max_y,
            };
            let contained = contain(
                display,
                bounds,
                ctx.min_size * transform.scale,
                ctx.aspect_ratio,
                ctx.handle,
            );
            transform.rect_to_image(&contained).unwrap_or(rect)
        }
    }
}

/// Containment for a resize of a rotated region.
///
/// `original` is the region before the gesture and `resized` the floored,
/// ratio-locked proposal expressed in `original`'s local frame. The proposal
/// is re-centred so the edges opposite `handle` stay fixed on screen, then
/// its size is walked back toward the original size until the unrotated box
/// fits the bounds. If the original box already sits outside the bounds,
/// the re-centred proposal is translated in instead.
pub fn contain_rotated_resize(original: &Rect, resized: &Rect, handle: Handle, ctx: &ConstraintContext) -> Rect {
    let edges = handle.edges();
    let fixed_x = if edges.left { resized.right() } else { resized.x };
    let fixed_y = if edges.top { resized.bottom() } else { resized.y };
    let recentre = |width: f64, height: f64| {
        let local = Point::new(
            if edges.left { fixed_x - width / 2.0 } else { fixed_x + width / 2.0 },
            if edges.top { fixed_y - height / 2.0 } else { fixed_y + height / 2.0 },
        );
        let center = to_world(local, original);
        Rect::new(center.x - width / 2.0, center.y - height / 2.0, width, height).with_rotation(original.rotation)
    };

    let target = recentre(resized.width, resized.height);
    let settle = ctx.with_handle(None);
    let Some(bounds) = bounds_in_image(ctx) else {
        return apply(&target, &settle);
    };

    // Slack on each side is linear along the path from the original size
    let slack = |r: &Rect| {
        [
            r.x - bounds.min_x,
            bounds.max_x - r.right(),
            r.y - bounds.min_y,
            bounds.max_y - r.bottom(),
        ]
    };
    let start = slack(&recentre(original.width, original.height));
    let end = slack(&target);
    if start.iter().any(|s| *s < -BOUNDS_EPSILON) {
        return apply(&target, &settle);
    }

    let t = start
        .iter()
        .zip(end.iter())
        .filter(|(_, e)| **e < 0.0)
        .map(|(s, e)| (s.max(0.0) / (s.max(0.0) - e)).clamp(0.0, 1.0))
        .fold(1.0, f64::min);
    let width = original.width + t * (resized.width - original.width);
    let height = original.height + t * (resized.height - original.height);
    apply(&recentre(width, height), &settle)
}

/// Containment bounds in image space, or `None` when unbounded.
fn bounds_in_image(ctx: &ConstraintContext) -> Option<Bounds> {
    match ctx.containment {
        Containment::Unbounded => None,
        Containment::Image => Some(Bounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: ctx.image.width,
            max_y: ctx.image.height,
        }),
        Containment::SafeArea { area, transform } => {
            let t = transform.sanitized();
            Some(Bounds {
                min_x: (area.min_x - t.offset_x) / t.scale,
                min_y: (area.min_y - t.offset_y) / t.scale,
                max_x: (area.max_x - t.offset_x) / t.scale,
                max_y: (area.max_y - t.offset_y) / t.scale,
            })
        }
    }
}

/// Replace non-finite fields with the nearest valid values.
fn sanitize(rect: &Rect, min_size: f64) -> Rect {
    let finite_or = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };
    Rect {
        x: finite_or(rect.x, 0.0),
        y: finite_or(rect.y, 0.0),
        width: finite_or(rect.width, min_size),
        height: finite_or(rect.height, min_size),
        rotation: normalize_degrees(rect.rotation),
    }
}

/// Derive the secondary dimension from the primary one. If the secondary
/// would drop under the floor it is floored and the primary re-derived.
fn lock_ratio(width: f64, height: f64, ratio: f64, primary: Axis, min_size: f64) -> (f64, f64) {
    match primary {
        Axis::Width => {
            let h = width / ratio;
            if h < min_size {
                (min_size * ratio, min_size)
            } else {
                (width, h)
            }
        }
        Axis::Height => {
            let w = height * ratio;
            if w < min_size {
                (min_size, min_size / ratio)
            } else {
                (w, height)
            }
        }
    }
}

/// Clamp a floored rect into `bounds`, holding the anchored edges.
fn contain(mut rect: Rect, bounds: Bounds, min_size: f64, ratio: Option<f64>, handle: Option<Handle>) -> Rect {
    let anchor = Anchor::capture(&rect, handle);
    let span_w = (bounds.max_x - bounds.min_x).max(0.0);
    let span_h = (bounds.max_y - bounds.min_y).max(0.0);

    // Room available from the fixed edges
    let (avail_w, avail_h) = match handle {
        None => (span_w, span_h),
        Some(_) => {
            let w = if anchor.edges.left {
                anchor.right - bounds.min_x
            } else {
                bounds.max_x - rect.x
            };
            let h = if anchor.edges.top {
                anchor.bottom - bounds.min_y
            } else {
                bounds.max_y - rect.y
            };
            (w.clamp(0.0, span_w), h.clamp(0.0, span_h))
        }
    };

    let (w, h) = match ratio {
        Some(ratio) => {
            let shrink = (avail_w / rect.width).min(avail_h / rect.height).min(1.0);
            let (w, h) = (rect.width * shrink, rect.height * shrink);
            if w < min_size || h < min_size {
                // Floor wins: smallest rect with this ratio above the floor
                if ratio >= 1.0 {
                    (min_size * ratio, min_size)
                } else {
                    (min_size, min_size / ratio)
                }
            } else {
                (w, h)
            }
        }
        None => (
            rect.width.min(avail_w).max(min_size),
            rect.height.min(avail_h).max(min_size),
        ),
    };
    anchor.resize(&mut rect, w, h);

    rect.x = clamp_axis(rect.x, rect.width, bounds.min_x, bounds.max_x);
    rect.y = clamp_axis(rect.y, rect.height, bounds.min_y, bounds.max_y);
    rect
}

/// Clamp a position so `[pos, pos + size]` lies in `[lo, hi]`. When the
/// size exceeds the range, the position collapses to `lo`.
#[inline]
fn clamp_axis(pos: f64, size: f64, lo: f64, hi: f64) -> f64 {
    let max = hi - size;
    if max < lo {
        lo
    } else {
        pos.clamp(lo, max)
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
