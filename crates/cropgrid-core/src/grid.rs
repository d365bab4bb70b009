//! Grid groups: linked regions that share size, rotation, and aspect ratio.
//!
//! A group is not stored anywhere. It is the set of regions carrying the same
//! [`GridId`], re-derived on demand with [`members`]. Members tile a
//! rectangle anchored at the `{row: 0, col: 0}` cell:
//!
//! ```text
//! x = anchor.x + col * (width + spacing)
//! y = anchor.y + row * (height + spacing)
//! ```
//!
//! Positions follow that formula after a resize. A drag instead moves every
//! member by the delta the dragged member actually achieved, since a gesture
//! in progress may be partially constrained.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constraint::{self, ConstraintContext};
use crate::error::GridError;
use crate::geometry::{normalize_degrees, Point, Rect};
use crate::region::{GridId, GridPosition, ImageSize, Region, RegionId};

/// Parameters for creating a grid group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Top-left corner of the `{0,0}` cell, in image space.
    pub origin: Point,
    pub rows: u32,
    pub cols: u32,
    pub cell_width: f64,
    pub cell_height: f64,
    #[serde(default)]
    pub spacing: f64,
    #[serde(default)]
    pub aspect_ratio: Option<f64>,
}

impl GridSpec {
    /// Square cells of `cell_size` with no spacing.
    pub fn square(origin: Point, rows: u32, cols: u32, cell_size: f64) -> Self {
        Self {
            origin,
            rows,
            cols,
            cell_width: cell_size,
            cell_height: cell_size,
            spacing: 0.0,
            aspect_ratio: None,
        }
    }

    fn validate(&self) -> Result<(), GridError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(GridError::EmptyGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(self.cell_width) || !valid(self.cell_height) {
            return Err(GridError::InvalidCellSize {
                width: self.cell_width,
                height: self.cell_height,
            });
        }
        Ok(())
    }
}

/// Build every member of a new grid group, row-major.
///
/// The requested cell passes through the solver before layout: it is floored
/// at `min_size` and, with a locked ratio, its height is derived from its
/// width. Ids are allocated sequentially from `first_id`, names continue the
/// `Crop {n}` numbering from `first_number`, and z-indices stack upward from
/// `base_z`.
pub fn create_grid(
    spec: &GridSpec,
    min_size: f64,
    grid_id: GridId,
    first_id: RegionId,
    first_number: usize,
    base_z: i32,
) -> Result<Vec<Region>, GridError> {
    spec.validate()?;
    let spacing = sanitize_spacing(spec.spacing);

    let ctx = ConstraintContext::new(ImageSize::default(), min_size).with_aspect_ratio(spec.aspect_ratio);
    let cell = constraint::apply(
        &Rect::new(spec.origin.x, spec.origin.y, spec.cell_width, spec.cell_height),
        &ctx,
    );
    if cell.width != spec.cell_width || cell.height != spec.cell_height {
        debug!(
            requested_width = spec.cell_width,
            requested_height = spec.cell_height,
            width = cell.width,
            height = cell.height,
            "grid cell adjusted"
        );
    }

    let mut regions = Vec::with_capacity((spec.rows * spec.cols) as usize);
    for row in 0..spec.rows {
        for col in 0..spec.cols {
            let index = regions.len();
            let mut region = Region::new(
                RegionId(first_id.0 + index as u64),
                format!("Crop {}", first_number + index),
                spec.origin.x + col as f64 * (cell.width + spacing),
                spec.origin.y + row as f64 * (cell.height + spacing),
                cell.width,
                cell.height,
            );
            region.aspect_ratio = ctx.aspect_ratio;
            region.grid_id = Some(grid_id);
            region.grid_position = Some(GridPosition::new(row, col));
            region.z_index = base_z.saturating_add(index as i32);
            regions.push(region);
        }
    }
    Ok(regions)
}

/// Gap between cells. Negative or non-finite spacing collapses to 0.
#[inline]
pub fn sanitize_spacing(spacing: f64) -> f64 {
    if spacing.is_finite() {
        spacing.max(0.0)
    } else {
        0.0
    }
}

/// Members of a group, in collection order.
pub fn members(regions: &[Region], grid_id: GridId) -> impl Iterator<Item = &Region> {
    regions.iter().filter(move |r| r.grid_id == Some(grid_id))
}

/// Whether all members share width, height, rotation, and aspect ratio.
pub fn is_uniform(regions: &[Region], grid_id: GridId) -> bool {
    let mut iter = members(regions, grid_id);
    let Some(first) = iter.next() else {
        return true;
    };
    iter.all(|r| {
        r.width == first.width
            && r.height == first.height
            && r.rotation == first.rotation
            && r.aspect_ratio == first.aspect_ratio
    })
}

/// Top-left of the `{0,0}` cell for a group whose cells are
/// `width × height`. Falls back to the lowest-positioned member when the
/// anchor itself was deleted.
pub fn anchor_origin(regions: &[Region], grid_id: GridId, width: f64, height: f64, spacing: f64) -> Option<Point> {
    let lowest = members(regions, grid_id)
        .filter_map(|r| r.grid_position.map(|pos| (pos, r)))
        .min_by_key(|(pos, _)| *pos)?;
    let (pos, region) = lowest;
    Some(Point::new(
        region.x - pos.col as f64 * (width + spacing),
        region.y - pos.row as f64 * (height + spacing),
    ))
}

/// Partial update to a region's geometry. `None` fields are left as is.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: Option<f64>,
    /// `Some(None)` unlocks the ratio.
    pub aspect_ratio: Option<Option<f64>>,
}

impl RegionPatch {
    pub fn translate_to(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn resize(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    pub fn rotate(rotation: f64) -> Self {
        Self {
            rotation: Some(rotation),
            ..Self::default()
        }
    }

    pub fn aspect(ratio: Option<f64>) -> Self {
        Self {
            aspect_ratio: Some(ratio),
            ..Self::default()
        }
    }

    /// Full geometry of a region, as produced by a committed gesture step.
    pub fn geometry_of(region: &Region) -> Self {
        Self {
            x: Some(region.x),
            y: Some(region.y),
            width: Some(region.width),
            height: Some(region.height),
            rotation: Some(region.rotation),
            aspect_ratio: None,
        }
    }

    /// Write the patch into a region.
    pub fn apply_to(&self, region: &mut Region) {
        if let Some(x) = self.x {
            region.x = x;
        }
        if let Some(y) = self.y {
            region.y = y;
        }
        if let Some(w) = self.width {
            region.width = w;
        }
        if let Some(h) = self.height {
            region.height = h;
        }
        if let Some(r) = self.rotation {
            region.rotation = normalize_degrees(r);
        }
        if let Some(ratio) = self.aspect_ratio {
            region.aspect_ratio = ratio;
        }
    }
}

/// Apply `patch` to `changed` and carry the result to the rest of its group.
///
/// The changed member is run through the solver (its own aspect lock takes
/// part). Size, rotation, and aspect ratio then go to every member; after a
/// size change positions are re-derived from the anchor, otherwise the
/// achieved translation of the changed member is added to every other member.
///
/// Returns every updated member in collection order, or an empty vec when
/// `changed` is not in the group.
pub fn propagate(
    regions: &[Region],
    grid_id: GridId,
    changed: RegionId,
    patch: &RegionPatch,
    ctx: &ConstraintContext,
    spacing: f64,
) -> Vec<Region> {
    let Some(before) = members(regions, grid_id).find(|r| r.id == changed) else {
        return Vec::new();
    };

    let spacing = sanitize_spacing(spacing);
    let mut solved = before.clone();
    patch.apply_to(&mut solved);
    let ctx = ctx.with_aspect_ratio(solved.locked_ratio());
    let rect = constraint::apply(&solved.rect(), &ctx);
    solved.set_rect(&rect);

    let resized = solved.width != before.width || solved.height != before.height;
    let (dx, dy) = (solved.x - before.x, solved.y - before.y);

    let origin = if !resized {
        None
    } else if solved.is_grid_anchor() {
        Some(Point::new(solved.x, solved.y))
    } else if let Some(anchor) = members(regions, grid_id).find(|r| r.is_grid_anchor()) {
        Some(Point::new(anchor.x, anchor.y))
    } else {
        // Anchor was deleted: recover it from the pre-change tiling
        anchor_origin(regions, grid_id, before.width, before.height, spacing)
    };

    members(regions, grid_id)
        .map(|member| {
            let mut updated = if member.id == changed {
                solved.clone()
            } else {
                let mut m = member.clone();
                m.width = solved.width;
                m.height = solved.height;
                m.rotation = solved.rotation;
                m.aspect_ratio = solved.aspect_ratio;
                if origin.is_none() {
                    m.x += dx;
                    m.y += dy;
                }
                m
            };
            if let (Some(origin), Some(pos)) = (origin, updated.grid_position) {
                updated.x = origin.x + pos.col as f64 * (solved.width + spacing);
                updated.y = origin.y + pos.row as f64 * (solved.height + spacing);
            }
            updated
        })
        .collect()
}

/// Sever a region from its group. Geometry is left untouched.
pub fn unlink(region: &mut Region) {
    region.grid_id = None;
    region.grid_position = None;
}


// ============================================================================
// Property-Based Tests
// ============================================================================
