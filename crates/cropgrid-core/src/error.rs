//! Error types for the few explicit, fallible entry points.
//!
//! The interactive path never returns errors: degenerate geometry is clamped
//! by the constraint solver instead. These enums cover calls a host makes on
//! purpose (converting through a raw transform, building a grid, editing the
//! collection by id, exporting).

use thiserror::Error;

use crate::region::RegionId;

/// Errors from coordinate conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// The display transform has a zero scale and cannot be inverted.
    #[error("Display transform scale is zero")]
    DivisionByZero,
}

/// Errors from grid group creation.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GridError {
    /// A grid needs at least one row and one column.
    #[error("Grid must have at least one row and one column (got {rows}x{cols})")]
    EmptyGrid { rows: u32, cols: u32 },

    /// Cell size must be positive and finite.
    #[error("Invalid grid cell size: {width}x{height}")]
    InvalidCellSize { width: f64, height: f64 },
}

/// Errors from collection edits addressed by region id.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ModelError {
    /// No region with this id exists in the collection.
    #[error("Region not found: {0}")]
    RegionNotFound(RegionId),

    /// The region is standalone, so grid operations do not apply.
    #[error("Region {0} is not a grid member")]
    NotGridMember(RegionId),

    /// Grid creation failed.
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Errors from export geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExportError {
    /// The region's bounding box has no pixels inside the image.
    #[error("Region {0} does not overlap the image")]
    OutsideImage(RegionId),
}
