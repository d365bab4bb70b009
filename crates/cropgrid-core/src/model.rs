//! Host-owned editing model: the region collection, selection, and view
//! transform.
//!
//! The interaction engine borrows a [`CropModel`] mutably for each pointer
//! event and never keeps a copy. Collection edits that do not come from a
//! gesture (delete, duplicate, grid creation, unlink) live here too.

use serde::{Deserialize, Serialize};

use crate::config::DUPLICATE_OFFSET;
use crate::error::ModelError;
use crate::geometry::{DisplayTransform, Rect};
use crate::grid::{self, GridSpec};
use crate::region::{GridId, ImageSize, Region, RegionId};

/// Regions over one source image plus the view state around them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CropModel {
    pub image: ImageSize,
    /// Regions in creation order.
    pub regions: Vec<Region>,
    #[serde(default)]
    pub selected: Option<RegionId>,
    #[serde(default)]
    pub transform: DisplayTransform,
}

impl CropModel {
    /// Empty model over an image, shown at scale 1 with no offset.
    pub fn new(image: ImageSize) -> Self {
        Self {
            image,
            ..Self::default()
        }
    }

    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: RegionId) -> Option<&mut Region> {
        self.regions.iter_mut().find(|r| r.id == id)
    }

    pub fn selected_region(&self) -> Option<&Region> {
        self.selected.and_then(|id| self.get(id))
    }

    /// One past the largest id in use.
    pub fn next_region_id(&self) -> RegionId {
        RegionId(self.regions.iter().map(|r| r.id.0).max().map_or(1, |m| m + 1))
    }

    /// One past the largest grid id in use.
    pub fn next_grid_id(&self) -> GridId {
        GridId(
            self.regions
                .iter()
                .filter_map(|r| r.grid_id.map(|g| g.0))
                .max()
                .map_or(1, |m| m + 1),
        )
    }

    /// One past the current maximum z-index, or 0 for an empty model.
    /// Saturates at `i32::MAX`.
    pub fn next_z_index(&self) -> i32 {
        self.regions.iter().map(|r| r.z_index).max().map_or(0, |z| z.saturating_add(1))
    }

    /// Auto-derived name for the next region.
    pub fn next_name(&self) -> String {
        format!("Crop {}", self.regions.len() + 1)
    }

    /// Append a standalone region with the given geometry and return it.
    pub fn create_region(&mut self, rect: &Rect) -> &Region {
        let mut region = Region::new(
            self.next_region_id(),
            self.next_name(),
            rect.x,
            rect.y,
            rect.width,
            rect.height,
        );
        region.z_index = self.next_z_index();
        let index = self.regions.len();
        self.regions.push(region);
        &self.regions[index]
    }

    /// Remove a region. Clears the selection if it pointed at it.
    pub fn delete_region(&mut self, id: RegionId) -> Result<Region, ModelError> {
        let index = self
            .regions
            .iter()
            .position(|r| r.id == id)
            .ok_or(ModelError::RegionNotFound(id))?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        Ok(self.regions.remove(index))
    }

    /// Select a region, or clear the selection with `None`. Unknown ids clear.
    pub fn select(&mut self, id: Option<RegionId>) {
        self.selected = id.filter(|id| self.get(*id).is_some());
    }

    pub fn set_visible(&mut self, id: RegionId, visible: bool) -> Result<(), ModelError> {
        let region = self.get_mut(id).ok_or(ModelError::RegionNotFound(id))?;
        region.visible = visible;
        Ok(())
    }

    /// Raise a region above all others.
    pub fn bring_to_front(&mut self, id: RegionId) -> Result<(), ModelError> {
        let z = self.next_z_index();
        let region = self.get_mut(id).ok_or(ModelError::RegionNotFound(id))?;
        region.z_index = z;
        Ok(())
    }

    /// Standalone copy of a region, offset and placed on top.
    pub fn duplicate_region(&mut self, id: RegionId) -> Result<RegionId, ModelError> {
        let source = self.get(id).ok_or(ModelError::RegionNotFound(id))?;
        let mut copy = source.clone();
        copy.id = self.next_region_id();
        copy.name = format!("{} copy", source.name);
        copy.x += DUPLICATE_OFFSET;
        copy.y += DUPLICATE_OFFSET;
        copy.z_index = self.next_z_index();
        grid::unlink(&mut copy);
        let new_id = copy.id;
        self.regions.push(copy);
        Ok(new_id)
    }

    /// Create an N×M grid group atomically. Either every member is added or
    /// none is. Cells are floored at `min_size`.
    pub fn create_grid(&mut self, spec: &GridSpec, min_size: f64) -> Result<Vec<RegionId>, ModelError> {
        let members = grid::create_grid(
            spec,
            min_size,
            self.next_grid_id(),
            self.next_region_id(),
            self.regions.len() + 1,
            self.next_z_index(),
        )?;
        let ids = members.iter().map(|r| r.id).collect();
        self.regions.extend(members);
        Ok(ids)
    }

    /// Detach a region from its grid group, keeping its geometry.
    pub fn unlink_region(&mut self, id: RegionId) -> Result<(), ModelError> {
        let region = self.get_mut(id).ok_or(ModelError::RegionNotFound(id))?;
        if !region.is_grid_member() {
            return Err(ModelError::NotGridMember(id));
        }
        grid::unlink(region);
        Ok(())
    }

    /// Replace regions by id. Unknown ids are ignored.
    pub fn apply_updates(&mut self, updated: &[Region]) {
        for region in updated {
            if let Some(slot) = self.get_mut(region.id) {
                *slot = region.clone();
            }
        }
    }

    /// Copy of the region collection for the history collaborator.
    pub fn snapshot(&self) -> Vec<Region> {
        self.regions.clone()
    }

    /// Replace the collection with a snapshot. A selection that no longer
    /// exists is cleared.
    pub fn restore(&mut self, snapshot: Vec<Region>) {
        self.regions = snapshot;
        self.select(self.selected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIN_SIZE_PRECISE;
    use crate::geometry::Point;
    use crate::region::GridPosition;

    fn model() -> CropModel {
        CropModel::new(ImageSize::new(1000.0, 800.0))
    }

    #[test]
    fn test_create_region_allocates_id_name_z() {
        let mut m = model();
        let first = m.create_region(&Rect::new(0.0, 0.0, 50.0, 50.0)).clone();
        let second = m.create_region(&Rect::new(10.0, 10.0, 50.0, 50.0)).clone();
        assert_eq!(first.id, RegionId(1));
        assert_eq!(second.id, RegionId(2));
        assert_eq!(first.name, "Crop 1");
        assert_eq!(second.name, "Crop 2");
        assert_eq!(second.z_index, first.z_index + 1);
    }

    #[test]
    fn test_delete_clears_selection() {
        let mut m = model();
        let id = m.create_region(&Rect::new(0.0, 0.0, 50.0, 50.0)).id;
        m.select(Some(id));
        assert_eq!(m.selected, Some(id));
        let removed = m.delete_region(id).unwrap();
        assert_eq!(removed.id, id);
        assert_eq!(m.selected, None);
        assert_eq!(m.delete_region(id), Err(ModelError::RegionNotFound(id)));
    }

    #[test]
    fn test_select_unknown_clears() {
        let mut m = model();
        m.select(Some(RegionId(5)));
        assert_eq!(m.selected, None);
    }

    #[test]
    fn test_bring_to_front() {
        let mut m = model();
        let a = m.create_region(&Rect::new(0.0, 0.0, 50.0, 50.0)).id;
        m.create_region(&Rect::new(0.0, 0.0, 50.0, 50.0));
        m.bring_to_front(a).unwrap();
        assert_eq!(m.get(a).unwrap().z_index, 2);
    }

    #[test]
    fn test_next_z_index_saturates() {
        let mut m = model();
        let a = m.create_region(&Rect::new(0.0, 0.0, 50.0, 50.0)).id;
        let b = m.create_region(&Rect::new(0.0, 0.0, 50.0, 50.0)).id;
        m.get_mut(b).unwrap().z_index = i32::MAX;
        assert_eq!(m.next_z_index(), i32::MAX);
        m.bring_to_front(a).unwrap();
        assert_eq!(m.get(a).unwrap().z_index, i32::MAX);
        let c = m.create_region(&Rect::new(0.0, 0.0, 50.0, 50.0)).z_index;
        assert_eq!(c, i32::MAX);
    }

    #[test]
    fn test_create_grid_applies_floor() {
        let mut m = model();
        let ids = m
            .create_grid(&GridSpec::square(Point::new(100.0, 100.0), 2, 2, 5.0), MIN_SIZE_PRECISE)
            .unwrap();
        for id in ids {
            let r = m.get(id).unwrap();
            assert!(r.width >= MIN_SIZE_PRECISE && r.height >= MIN_SIZE_PRECISE);
        }
    }

    #[test]
    fn test_duplicate_is_standalone_and_offset() {
        let mut m = model();
        let ids = m
            .create_grid(&GridSpec::square(Point::new(0.0, 0.0), 1, 2, 100.0), MIN_SIZE_PRECISE)
            .unwrap();
        let copy = m.duplicate_region(ids[1]).unwrap();
        let copy = m.get(copy).unwrap();
        assert_eq!(copy.x, 100.0 + DUPLICATE_OFFSET);
        assert!(!copy.is_grid_member());
        assert_eq!(copy.name, "Crop 2 copy");
    }

    #[test]
    fn test_create_grid_is_atomic() {
        let mut m = model();
        m.create_region(&Rect::new(0.0, 0.0, 50.0, 50.0));
        let err = m.create_grid(&GridSpec::square(Point::default(), 0, 3, 100.0), MIN_SIZE_PRECISE);
        assert!(err.is_err());
        assert_eq!(m.regions.len(), 1);

        let ids = m
            .create_grid(&GridSpec::square(Point::new(100.0, 100.0), 2, 2, 150.0), MIN_SIZE_PRECISE)
            .unwrap();
        assert_eq!(ids.len(), 4);
        assert_eq!(m.regions.len(), 5);
        assert_eq!(m.get(ids[0]).unwrap().name, "Crop 2");
        assert_eq!(m.next_grid_id(), GridId(2));
    }

    #[test]
    fn test_unlink_region() {
        let mut m = model();
        let ids = m
            .create_grid(&GridSpec::square(Point::new(100.0, 100.0), 2, 2, 150.0), MIN_SIZE_PRECISE)
            .unwrap();
        let before = m.get(ids[3]).unwrap().rect();
        m.unlink_region(ids[3]).unwrap();
        let after = m.get(ids[3]).unwrap();
        assert_eq!(after.rect(), before);
        assert_eq!(after.grid_position, None::<GridPosition>);
        assert_eq!(m.unlink_region(ids[3]), Err(ModelError::NotGridMember(ids[3])));
    }

    #[test]
    fn test_snapshot_restore() {
        let mut m = model();
        let id = m.create_region(&Rect::new(0.0, 0.0, 50.0, 50.0)).id;
        let snapshot = m.snapshot();
        m.select(Some(id));
        m.get_mut(id).unwrap().x = 300.0;
        m.restore(snapshot);
        assert_eq!(m.get(id).unwrap().x, 0.0);
        assert_eq!(m.selected, Some(id));
        m.restore(Vec::new());
        assert_eq!(m.selected, None);
    }
}
