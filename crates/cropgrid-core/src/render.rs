//! Rendering hints.
//!
//! The engine does not paint. These plain structs tell a renderer where each
//! region's outline, handles, and rotation handle sit in display space, and
//! what the interaction engine is currently doing.

use serde::{Deserialize, Serialize};

use crate::geometry::{DisplayTransform, Point, Rect};
use crate::hit::{rotation_handle_position, Handle, HitMetrics};
use crate::interaction::InteractionEngine;
use crate::model::CropModel;
use crate::region::{Region, RegionId};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandleHint {
    pub handle: Handle,
    pub position: Point,
}

/// Display-space layout of one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionHints {
    pub id: RegionId,
    pub name: String,
    /// Outline corners (nw, ne, se, sw).
    pub corners: [Point; 4],
    pub center: Point,
    pub rotation: f64,
    pub z_index: i32,
    pub selected: bool,
    pub grid_member: bool,
    /// Resize handles; empty unless selected.
    pub handles: Vec<HandleHint>,
    /// Rotation handle; only on the selected region.
    pub rotation_handle: Option<Point>,
    /// Side length to draw handles at.
    pub handle_size: f64,
}

/// Hints for one region.
pub fn region_hints(
    region: &Region,
    transform: &DisplayTransform,
    metrics: &HitMetrics,
    selected: bool,
) -> RegionHints {
    let rect = transform.rect_to_display(&region.rect());
    let (handles, rotation_handle) = if selected {
        let handles = Handle::ALL
            .iter()
            .map(|&handle| HandleHint {
                handle,
                position: handle.world_position(&rect),
            })
            .collect();
        (handles, Some(rotation_handle_position(&rect, metrics.rotation_offset)))
    } else {
        (Vec::new(), None)
    };

    RegionHints {
        id: region.id,
        name: region.name.clone(),
        corners: rect.corners(),
        center: rect.center(),
        rotation: rect.rotation,
        z_index: region.z_index,
        selected,
        grid_member: region.is_grid_member(),
        handles,
        rotation_handle,
        handle_size: metrics.handle_size,
    }
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewHints {
    /// Transform to paint with, including a live pan.
    pub transform: DisplayTransform,
    /// Image bounds in display space.
    pub image: Rect,
    /// Visible regions in paint order (lowest z first).
    pub regions: Vec<RegionHints>,
    /// Rubber-band rectangle while creating a region.
    pub creation_preview: Option<Rect>,
    pub mode: String,
    pub is_dragging: bool,
    pub is_resizing: bool,
    pub is_rotating: bool,
    pub is_panning: bool,
    pub is_creating: bool,
}

pub fn view_hints(engine: &InteractionEngine, model: &CropModel) -> ViewHints {
    let transform = engine.preview_transform(model);
    let metrics = HitMetrics::new(&engine.policy().config, transform.scale);

    let mut visible: Vec<&Region> = model.regions.iter().filter(|r| r.visible).collect();
    visible.sort_by_key(|r| r.z_index);
    let regions = visible
        .into_iter()
        .map(|r| region_hints(r, &transform, &metrics, model.selected == Some(r.id)))
        .collect();

    ViewHints {
        transform,
        image: transform.rect_to_display(&Rect::new(0.0, 0.0, model.image.width, model.image.height)),
        regions,
        creation_preview: engine.creation_preview(),
        mode: engine.mode().name().to_string(),
        is_dragging: engine.is_dragging(),
        is_resizing: engine.is_resizing(),
        is_rotating: engine.is_rotating(),
        is_panning: engine.is_panning(),
        is_creating: engine.is_creating(),
    }
}
