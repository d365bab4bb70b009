//! Cropgrid Core - Crop-region geometry and interaction engine
//!
//! This crate provides the geometry behind an interactive multi-region crop
//! editor: coordinate transforms, hit-testing, the constraint solver, linked
//! grid groups, and a pointer-driven gesture state machine. It never touches
//! pixels; rendering and export are left to the host, guided by the hints in
//! [`render`] and [`export`].
//!
//! # Module Structure
//!
//! - `geometry` - Points, rotated rects, and image/display/local transforms
//! - `hit` - Handles, hit-testing, and cursor hints
//! - `constraint` - Minimum size, aspect lock, and containment
//! - `grid` - Linked grid groups and change propagation
//! - `interaction` - The pointer gesture state machine
//! - `model` - The host-owned region collection
//! - `render` / `export` - Hints for the painting and export collaborators

pub mod config;
pub mod constraint;
pub mod error;
pub mod export;
pub mod geometry;
pub mod grid;
pub mod hit;
pub mod interaction;
pub mod model;
pub mod region;
pub mod render;

pub use config::{EditorConfig, EditorContext, PointerKind};
pub use constraint::{Containment, ConstraintContext, ViewBounds};
pub use error::{ExportError, GeometryError, GridError, ModelError};
pub use export::{export_all, export_geometry, ExportGeometry, SourceRect};
pub use geometry::{DisplayTransform, Point, Rect, SafeArea};
pub use grid::{GridSpec, RegionPatch};
pub use hit::{CursorHint, Handle, HitMetrics, HitTarget};
pub use interaction::{
    Action, InteractionEngine, InteractionMode, Modifiers, PointerEvent, PointerEventKind, ViewPolicy,
};
pub use model::CropModel;
pub use region::{GridId, GridPosition, ImageSize, Region, RegionId};
pub use render::{region_hints, view_hints, RegionHints, ViewHints};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIN_SIZE_PRECISE;

    /// Full flow through the public surface: create, grid, drag, export.
    #[test]
    fn test_end_to_end_session() {
        let mut model = CropModel::new(ImageSize::new(1000.0, 800.0));
        let mut engine = InteractionEngine::new(ViewPolicy {
            bounds: ViewBounds::Image,
            ..ViewPolicy::default()
        });

        for event in [
            PointerEvent::down(100.0, 100.0),
            PointerEvent::moved(300.0, 250.0),
            PointerEvent::up(300.0, 250.0),
        ] {
            engine.handle(&event, &mut model);
        }
        assert_eq!(model.regions.len(), 1);

        let ids = model
            .create_grid(&GridSpec::square(Point::new(400.0, 400.0), 2, 2, 150.0), MIN_SIZE_PRECISE)
            .unwrap();
        assert_eq!(ids.len(), 4);

        let exported = export_all(&model);
        assert_eq!(exported.len(), 5);
        assert_eq!(
            exported[0].source,
            SourceRect {
                x: 100,
                y: 100,
                width: 200,
                height: 150
            }
        );
    }
}
