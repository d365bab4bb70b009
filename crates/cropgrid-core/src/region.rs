//! Crop region data model.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{normalize_degrees, Rect};

/// Opaque region identifier, unique within a [`crate::model::CropModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub u64);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a synchronization group of grid regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GridId(pub u64);

impl fmt::Display for GridId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "grid-{}", self.0)
    }
}

/// Cell of a region within its grid group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    pub row: u32,
    pub col: u32,
}

impl GridPosition {
    pub const ORIGIN: GridPosition = GridPosition { row: 0, col: 0 };

    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// Source image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

impl ImageSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A rectangular crop area over the source image.
///
/// Geometry is in image space. `rotation` is in degrees about the center and
/// is kept in `[0, 360)` by every engine mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
    /// Locked `width / height` ratio, if any.
    #[serde(default)]
    pub aspect_ratio: Option<f64>,
    pub name: String,
    #[serde(default)]
    pub grid_id: Option<GridId>,
    #[serde(default)]
    pub grid_position: Option<GridPosition>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub z_index: i32,
}

fn default_visible() -> bool {
    true
}

impl Region {
    /// Create a visible, unrotated, standalone region.
    pub fn new(id: RegionId, name: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height,
            rotation: 0.0,
            aspect_ratio: None,
            name: name.into(),
            grid_id: None,
            grid_position: None,
            visible: true,
            z_index: 0,
        }
    }

    /// Geometry of this region as a rotated rect.
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            rotation: self.rotation,
        }
    }

    /// Copy geometry from a rect. Rotation is normalized.
    pub fn set_rect(&mut self, rect: &Rect) {
        self.x = rect.x;
        self.y = rect.y;
        self.width = rect.width;
        self.height = rect.height;
        self.rotation = normalize_degrees(rect.rotation);
    }

    /// Whether this region belongs to a grid group.
    #[inline]
    pub fn is_grid_member(&self) -> bool {
        self.grid_id.is_some()
    }

    /// Whether this region is the `{0,0}` member of its grid.
    #[inline]
    pub fn is_grid_anchor(&self) -> bool {
        self.grid_id.is_some() && self.grid_position == Some(GridPosition::ORIGIN)
    }

    /// Locked aspect ratio, ignoring non-positive or non-finite values.
    #[inline]
    pub fn locked_ratio(&self) -> Option<f64> {
        self.aspect_ratio.filter(|r| r.is_finite() && *r > 0.0)
    }
}
