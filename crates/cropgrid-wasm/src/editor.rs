//! The crop editor as a JavaScript class.
//!
//! `JsCropEditor` owns a `CropModel` and an `InteractionEngine` for one
//! canvas view. Pointer methods return the engine's actions as plain JS
//! objects so the host can repaint, update its sidebar, and push history.
//!
//! # Example (TypeScript)
//! ```typescript
//! const editor = new JsCropEditor(4000, 3000, { config: { context: "precise" } });
//! editor.fit_to_view(canvas.width, canvas.height, 16);
//!
//! canvas.onpointerdown = (e) => handle(editor.pointer_down(e.offsetX, e.offsetY, e.shiftKey, e.timeStamp));
//! canvas.onpointermove = (e) => handle(editor.pointer_move(e.offsetX, e.offsetY, e.shiftKey, e.timeStamp));
//! canvas.onpointerup = (e) => handle(editor.pointer_up(e.offsetX, e.offsetY, e.shiftKey, e.timeStamp));
//!
//! draw(editor.render_hints());
//! ```

use cropgrid_core::{
    export_all, export_geometry, view_hints, Action, CropModel, DisplayTransform, ExportError, ExportGeometry,
    GridSpec, ImageSize, InteractionEngine, ModelError, Modifiers, Point, PointerEvent, PointerEventKind, Region,
    RegionId, ViewBounds, ViewHints, ViewPolicy,
};
use wasm_bindgen::prelude::*;

use crate::types::{from_js, js_error, to_js, EditorOptions};

/// Zoom step applied per wheel notch.
const WHEEL_ZOOM_STEP: f64 = 1.1;

#[wasm_bindgen]
pub struct JsCropEditor {
    model: CropModel,
    engine: InteractionEngine,
}

/// Methods exposed to JavaScript.
#[wasm_bindgen]
impl JsCropEditor {
    /// Create an editor over an image of the given size.
    ///
    /// # Arguments
    /// * `image_width`, `image_height` - Source image size in pixels
    /// * `options` - Optional `{ config, bounds }` object; `undefined` for defaults
    ///
    /// # Errors
    /// Returns error if `options` cannot be deserialized
    #[wasm_bindgen(constructor)]
    pub fn new(image_width: f64, image_height: f64, options: JsValue) -> Result<JsCropEditor, JsValue> {
        let options: EditorOptions = if options.is_undefined() || options.is_null() {
            EditorOptions::default()
        } else {
            from_js(options, "editor options")?
        };
        Ok(Self::with_options(ImageSize::new(image_width, image_height), options))
    }

    pub fn pointer_down(&mut self, x: f64, y: f64, shift: bool, time_ms: f64) -> Result<JsValue, JsValue> {
        to_js(&self.dispatch(PointerEventKind::Down, x, y, shift, time_ms))
    }

    pub fn pointer_move(&mut self, x: f64, y: f64, shift: bool, time_ms: f64) -> Result<JsValue, JsValue> {
        to_js(&self.dispatch(PointerEventKind::Move, x, y, shift, time_ms))
    }

    pub fn pointer_up(&mut self, x: f64, y: f64, shift: bool, time_ms: f64) -> Result<JsValue, JsValue> {
        to_js(&self.dispatch(PointerEventKind::Up, x, y, shift, time_ms))
    }

    pub fn pointer_leave(&mut self, x: f64, y: f64, shift: bool, time_ms: f64) -> Result<JsValue, JsValue> {
        to_js(&self.dispatch(PointerEventKind::Leave, x, y, shift, time_ms))
    }

    /// Zoom around the pointer. Negative `delta_y` (wheel up) zooms in.
    pub fn wheel_zoom(&mut self, x: f64, y: f64, delta_y: f64) -> Result<JsValue, JsValue> {
        to_js(&self.zoom(x, y, delta_y))
    }

    /// Fit the image into a viewport, centered, with a margin.
    pub fn fit_to_view(&mut self, view_width: f64, view_height: f64, margin: f64) -> Result<JsValue, JsValue> {
        self.model.transform = DisplayTransform::fit(
            self.model.image.width,
            self.model.image.height,
            view_width,
            view_height,
            margin,
        );
        to_js(&self.model.transform)
    }

    /// Switch between region editing and picking an image position.
    pub fn set_position_selector(&mut self, enabled: bool) {
        let mut policy = self.engine.policy().clone();
        policy.position_selector = enabled;
        self.engine.set_policy(policy);
    }

    /// Replace the view's containment bounds.
    ///
    /// # Errors
    /// Returns error if `bounds` cannot be deserialized
    pub fn set_bounds(&mut self, bounds: JsValue) -> Result<(), JsValue> {
        let bounds: ViewBounds = from_js(bounds, "bounds")?;
        let mut policy = self.engine.policy().clone();
        policy.bounds = bounds;
        self.engine.set_policy(policy);
        Ok(())
    }

    /// All regions, in creation order.
    pub fn regions(&self) -> Result<JsValue, JsValue> {
        to_js(&self.model.regions)
    }

    pub fn selected(&self) -> Option<f64> {
        self.model.selected.map(|id| id.0 as f64)
    }

    /// Select a region, or clear the selection with `undefined`. Ids that
    /// match no region also clear.
    pub fn select(&mut self, id: Option<f64>) {
        self.model.select(id.and_then(region_id));
    }

    /// Display-space layout for the next frame.
    pub fn render_hints(&self) -> Result<JsValue, JsValue> {
        to_js(&self.hints())
    }

    /// Create a linked grid group and return the new region ids.
    ///
    /// # Arguments
    /// * `spec` - `{ origin: {x, y}, rows, cols, cell_width, cell_height, aspect_ratio? }`
    ///
    /// # Errors
    /// Returns error for an empty grid or a non-positive cell size
    pub fn create_grid(&mut self, spec: JsValue) -> Result<JsValue, JsValue> {
        let spec: GridSpec = from_js(spec, "grid spec")?;
        let ids = self.add_grid(spec).map_err(js_error)?;
        to_js(&ids)
    }

    pub fn delete_region(&mut self, id: f64) -> Result<(), JsValue> {
        self.model.delete_region(js_region_id(id)?).map(|_| ()).map_err(js_error)
    }

    /// Detach a region from its grid group.
    pub fn unlink_region(&mut self, id: f64) -> Result<(), JsValue> {
        self.model.unlink_region(js_region_id(id)?).map_err(js_error)
    }

    /// Copy a region and return the id of the copy.
    pub fn duplicate_region(&mut self, id: f64) -> Result<JsValue, JsValue> {
        let copy = self.model.duplicate_region(js_region_id(id)?).map_err(js_error)?;
        to_js(&copy)
    }

    pub fn set_visible(&mut self, id: f64, visible: bool) -> Result<(), JsValue> {
        self.model.set_visible(js_region_id(id)?, visible).map_err(js_error)
    }

    pub fn bring_to_front(&mut self, id: f64) -> Result<(), JsValue> {
        self.model.bring_to_front(js_region_id(id)?).map_err(js_error)
    }

    /// Export geometry for one region.
    pub fn export_geometry(&self, id: f64) -> Result<JsValue, JsValue> {
        let geometry = self.export_one(js_region_id(id)?).map_err(js_error)?;
        to_js(&geometry)
    }

    /// Export geometry for every visible region on the image.
    pub fn export_all(&self) -> Result<JsValue, JsValue> {
        to_js(&export_all(&self.model))
    }

    /// Region collection for the history stack.
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_js(&self.model.snapshot())
    }

    /// Restore a collection produced by `snapshot` (undo/redo).
    pub fn restore(&mut self, snapshot: JsValue) -> Result<(), JsValue> {
        let regions: Vec<Region> = from_js(snapshot, "snapshot")?;
        self.model.restore(regions);
        Ok(())
    }
}

/// Native-callable core of the bindings.
impl JsCropEditor {
    pub fn with_options(image: ImageSize, options: EditorOptions) -> Self {
        let policy = ViewPolicy {
            config: options.config,
            bounds: options.bounds,
            position_selector: false,
        };
        Self {
            model: CropModel::new(image),
            engine: InteractionEngine::new(policy),
        }
    }

    pub fn model(&self) -> &CropModel {
        &self.model
    }

    pub fn dispatch(&mut self, kind: PointerEventKind, x: f64, y: f64, shift: bool, time_ms: f64) -> Vec<Action> {
        let event = PointerEvent::new(kind, x, y)
            .at_time(time_ms)
            .with_modifiers(Modifiers {
                shift,
                ..Modifiers::default()
            });
        self.engine.handle(&event, &mut self.model)
    }

    pub fn zoom(&mut self, x: f64, y: f64, delta_y: f64) -> DisplayTransform {
        let factor = if delta_y < 0.0 {
            WHEEL_ZOOM_STEP
        } else if delta_y > 0.0 {
            1.0 / WHEEL_ZOOM_STEP
        } else {
            1.0
        };
        let (min_zoom, max_zoom) = self.engine.policy().config.zoom_range();
        self.model.transform = self
            .model
            .transform
            .zoom_at(Point::new(x, y), factor, min_zoom, max_zoom);
        self.model.transform
    }

    pub fn hints(&self) -> ViewHints {
        view_hints(&self.engine, &self.model)
    }

    /// Grid members are spaced by the view's configured spacing so that
    /// later propagation lays them out the same way, and floored at the
    /// view's minimum size.
    pub fn add_grid(&mut self, mut spec: GridSpec) -> Result<Vec<RegionId>, ModelError> {
        let config = &self.engine.policy().config;
        spec.spacing = config.grid_spacing;
        let min_size = config.min_size();
        self.model.create_grid(&spec, min_size)
    }

    pub fn export_one(&self, id: RegionId) -> Result<ExportGeometry, EditorExportError> {
        let region = self.model.get(id).ok_or(ModelError::RegionNotFound(id))?;
        Ok(export_geometry(region, self.model.image)?)
    }
}

/// Failure of a single-region export: unknown id or no overlap.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum EditorExportError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Largest integer a JS number holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Region id from a JS number. Ids cross the boundary as plain numbers in
/// both directions; negative, fractional, or non-finite values name no region.
fn region_id(id: f64) -> Option<RegionId> {
    let exact = id.is_finite() && id >= 0.0 && id.fract() == 0.0 && id <= MAX_SAFE_INTEGER;
    exact.then_some(RegionId(id as u64))
}

fn js_region_id(id: f64) -> Result<RegionId, JsValue> {
    region_id(id).ok_or_else(|| JsValue::from_str(&format!("Invalid region id: {}", id)))
}


/// Tests that cross the JS boundary. Run with `wasm-pack test`.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_constructor_accepts_undefined_options() {
        let editor = JsCropEditor::new(1000.0, 800.0, JsValue::UNDEFINED).unwrap();
        assert!(editor.model().regions.is_empty());
    }

    #[wasm_bindgen_test]
    fn test_pointer_round_trip() {
        let mut editor = JsCropEditor::new(1000.0, 800.0, JsValue::UNDEFINED).unwrap();
        editor.pointer_down(100.0, 100.0, false, 0.0).unwrap();
        editor.pointer_move(300.0, 250.0, false, 10.0).unwrap();
        let actions = editor.pointer_up(300.0, 250.0, false, 20.0).unwrap();
        let actions: Vec<Action> = serde_wasm_bindgen::from_value(actions).unwrap();
        assert!(actions.iter().any(|a| matches!(a, Action::RegionCreated(_))));
    }

    #[wasm_bindgen_test]
    fn test_invalid_grid_spec_is_rejected() {
        let mut editor = JsCropEditor::new(1000.0, 800.0, JsValue::UNDEFINED).unwrap();
        assert!(editor.create_grid(JsValue::from_str("nope")).is_err());
    }
}
