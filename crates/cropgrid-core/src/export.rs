//! Export geometry for the export collaborator.
//!
//! The engine does not decode or encode pixels. For each region it reports
//! which integer block of source pixels to read, the rotation to undo around
//! the region center, and the size of the upright output.
//!
//! # Coordinate System
//!
//! - Source rectangles are in image pixels, top-left origin
//! - The source rectangle is the rotated region's bounding box, expanded to
//!   whole pixels and clamped to the image
//! - Rotation is in degrees, clockwise, in `[0, 360)`

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ExportError;
use crate::geometry::Point;
use crate::model::CropModel;
use crate::region::{ImageSize, Region, RegionId};

/// Distance under which a coordinate is treated as lying on a pixel edge.
const PIXEL_EPSILON: f64 = 1e-6;

/// Integer pixel rectangle in the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Everything the export collaborator needs to render one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportGeometry {
    pub id: RegionId,
    pub name: String,
    /// Pixels to read from the source image.
    pub source: SourceRect,
    /// Region center in image space, the pivot for un-rotating.
    pub center: Point,
    pub rotation: f64,
    pub output_width: u32,
    pub output_height: u32,
}

/// Size of the axis-aligned box around a `width` x `height` rectangle
/// rotated by `degrees`.
///
/// Multiples of 90° take an exact path so that quarter turns swap the
/// dimensions without rounding noise.
pub fn rotated_bounds(width: f64, height: f64, degrees: f64) -> (f64, f64) {
    let angle = degrees.rem_euclid(360.0);
    let near = |target: f64| (angle - target).abs() < 0.001;

    if near(0.0) || near(180.0) || near(360.0) {
        return (width, height);
    }
    if near(90.0) || near(270.0) {
        return (height, width);
    }

    let rad = angle.to_radians();
    let (sin, cos) = (rad.sin().abs(), rad.cos().abs());
    (width * cos + height * sin, width * sin + height * cos)
}

/// Snap values within [`PIXEL_EPSILON`] of an integer onto it.
#[inline]
fn snap(v: f64) -> f64 {
    let r = v.round();
    if (v - r).abs() < PIXEL_EPSILON {
        r
    } else {
        v
    }
}

/// Export geometry for one region over an image.
///
/// # Errors
///
/// Returns [`ExportError::OutsideImage`] when no pixel of the region's
/// bounding box lies inside the image.
pub fn export_geometry(region: &Region, image: ImageSize) -> Result<ExportGeometry, ExportError> {
    let rect = region.rect();
    let center = rect.center();
    let (bw, bh) = rotated_bounds(rect.width, rect.height, rect.rotation);

    let image_w = image.width.max(0.0).floor();
    let image_h = image.height.max(0.0).floor();

    let left = snap(center.x - bw / 2.0).floor().clamp(0.0, image_w);
    let top = snap(center.y - bh / 2.0).floor().clamp(0.0, image_h);
    let right = snap(center.x + bw / 2.0).ceil().clamp(0.0, image_w);
    let bottom = snap(center.y + bh / 2.0).ceil().clamp(0.0, image_h);

    if right <= left || bottom <= top || !(left.is_finite() && top.is_finite()) {
        return Err(ExportError::OutsideImage(region.id));
    }

    Ok(ExportGeometry {
        id: region.id,
        name: region.name.clone(),
        source: SourceRect {
            x: left as u32,
            y: top as u32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        },
        center,
        rotation: rect.rotation,
        output_width: rect.width.round().max(1.0) as u32,
        output_height: rect.height.round().max(1.0) as u32,
    })
}

/// Export geometry for every visible region, in paint order.
///
/// Regions entirely off the image are skipped with a warning.
pub fn export_all(model: &CropModel) -> Vec<ExportGeometry> {
    let mut regions: Vec<&Region> = model.regions.iter().filter(|r| r.visible).collect();
    regions.sort_by_key(|r| r.z_index);
    regions
        .into_iter()
        .filter_map(|region| match export_geometry(region, model.image) {
            Ok(geometry) => Some(geometry),
            Err(err) => {
                warn!(region = %region.id, %err, "skipping region");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn image() -> ImageSize {
        ImageSize::new(1000.0, 800.0)
    }

    fn region(x: f64, y: f64, w: f64, h: f64) -> Region {
        Region::new(RegionId(1), "Crop 1", x, y, w, h)
    }

    #[test]
    fn test_rotated_bounds_no_rotation() {
        assert_eq!(rotated_bounds(100.0, 50.0, 0.0), (100.0, 50.0));
        assert_eq!(rotated_bounds(100.0, 50.0, 360.0), (100.0, 50.0));
        assert_eq!(rotated_bounds(100.0, 50.0, 180.0), (100.0, 50.0));
    }

    #[test]
    fn test_rotated_bounds_quarter_turns_swap() {
        assert_eq!(rotated_bounds(100.0, 50.0, 90.0), (50.0, 100.0));
        assert_eq!(rotated_bounds(100.0, 50.0, 270.0), (50.0, 100.0));
        assert_eq!(rotated_bounds(100.0, 50.0, -90.0), (50.0, 100.0));
    }

    #[test]
    fn test_rotated_bounds_45_degrees() {
        let (w, h) = rotated_bounds(100.0, 100.0, 45.0);
        let expected = 100.0 * std::f64::consts::SQRT_2;
        assert!((w - expected).abs() < 1e-9);
        assert!((h - expected).abs() < 1e-9);
    }

    #[test]
    fn test_export_unrotated_expands_to_whole_pixels() {
        let g = export_geometry(&region(10.4, 20.6, 100.0, 50.0), image()).unwrap();
        assert_eq!(
            g.source,
            SourceRect {
                x: 10,
                y: 20,
                width: 101,
                height: 51
            }
        );
        assert_eq!((g.output_width, g.output_height), (100, 50));
        assert_eq!(g.rotation, 0.0);
    }

    #[test]
    fn test_export_rotated_uses_bounding_box() {
        let mut r = region(100.0, 100.0, 100.0, 50.0);
        r.rotation = 90.0;
        let g = export_geometry(&r, image()).unwrap();
        assert_eq!(
            g.source,
            SourceRect {
                x: 125,
                y: 75,
                width: 50,
                height: 100
            }
        );
        assert_eq!(g.center, Point::new(150.0, 125.0));
        assert_eq!((g.output_width, g.output_height), (100, 50));
        assert_eq!(g.rotation, 90.0);
    }

    #[test]
    fn test_export_bounding_box_matches_rect() {
        let mut r = region(300.0, 300.0, 120.0, 80.0);
        r.rotation = 30.0;
        let (min_x, min_y, max_x, max_y) = r.rect().bounding_box();
        let g = export_geometry(&r, image()).unwrap();
        assert_eq!(g.source.x, min_x.floor() as u32);
        assert_eq!(g.source.y, min_y.floor() as u32);
        assert_eq!(g.source.x + g.source.width, max_x.ceil() as u32);
        assert_eq!(g.source.y + g.source.height, max_y.ceil() as u32);
    }

    #[test]
    fn test_export_clamps_to_image() {
        let g = export_geometry(&region(-20.0, -20.0, 100.0, 100.0), image()).unwrap();
        assert_eq!(
            g.source,
            SourceRect {
                x: 0,
                y: 0,
                width: 80,
                height: 80
            }
        );
        // Output size stays the region size; the collaborator pads.
        assert_eq!((g.output_width, g.output_height), (100, 100));

        let g = export_geometry(&region(950.0, 750.0, 100.0, 100.0), image()).unwrap();
        assert_eq!((g.source.width, g.source.height), (50, 50));
    }

    #[test]
    fn test_export_outside_image() {
        let r = region(2000.0, 2000.0, 100.0, 100.0);
        assert_eq!(export_geometry(&r, image()), Err(ExportError::OutsideImage(RegionId(1))));
    }

    #[test]
    fn test_export_all_skips_hidden_and_offscreen() {
        let mut model = CropModel::new(image());
        let a = model.create_region(&Rect::new(0.0, 0.0, 100.0, 100.0)).id;
        let b = model.create_region(&Rect::new(5000.0, 0.0, 100.0, 100.0)).id;
        let c = model.create_region(&Rect::new(200.0, 0.0, 100.0, 100.0)).id;
        model.set_visible(a, false).unwrap();
        model.bring_to_front(c).unwrap();

        let all = export_all(&model);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, c);
        assert!(all.iter().all(|g| g.id != b));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// The source rect never leaves the image.
        #[test]
        fn prop_source_inside_image(
            x in -500.0f64..1500.0,
            y in -500.0f64..1300.0,
            w in 10.0f64..600.0,
            h in 10.0f64..600.0,
            rotation in 0.0f64..360.0,
        ) {
            let mut r = Region::new(RegionId(1), "r", x, y, w, h);
            r.rotation = rotation;
            if let Ok(g) = export_geometry(&r, ImageSize::new(1000.0, 800.0)) {
                prop_assert!(g.source.width > 0 && g.source.height > 0);
                prop_assert!(g.source.x + g.source.width <= 1000);
                prop_assert!(g.source.y + g.source.height <= 800);
            }
        }
    }
}
