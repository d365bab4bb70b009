//! Policy constants and per-view editor configuration.
//!
//! The constants are the defaults for [`EditorConfig`]. A host may override
//! any of them by deserializing a partial config object; missing fields fall
//! back to these values.

use serde::{Deserialize, Serialize};

// ── Size floors ─────────────────────────────────────────────────

/// Minimum region extent (image units) in precision editors such as the
/// zoomed pixel canvas and the full-screen advanced editor.
pub const MIN_SIZE_PRECISE: f64 = 10.0;

/// Minimum region extent (image units) in coarse placement canvases.
pub const MIN_SIZE_COARSE: f64 = 20.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Resize handle box size (display units) for precise pointers.
pub const HANDLE_SIZE_MOUSE: f64 = 10.0;

/// Resize handle box size (display units) for touch input.
pub const HANDLE_SIZE_TOUCH: f64 = 24.0;

/// Zoom range over which handle size follows the zoom level.
pub const HANDLE_ZOOM_MIN: f64 = 0.5;
pub const HANDLE_ZOOM_MAX: f64 = 2.0;

/// Distance from the top edge to the rotation handle, in display units.
pub const ROTATION_HANDLE_OFFSET: f64 = 30.0;

// ── Gestures ────────────────────────────────────────────────────

/// Both display extents of a create drag must exceed this to keep the region.
pub const CREATE_THRESHOLD: f64 = 20.0;

/// Two body hits on the same region within this window request advanced edit.
pub const DOUBLE_ACTIVATE_MS: f64 = 300.0;

/// Rotation snap increment while the snap modifier is held.
pub const ROTATION_SNAP_DEGREES: f64 = 15.0;

/// Offset applied to duplicated regions, in image units.
pub const DUPLICATE_OFFSET: f64 = 20.0;

// ── Zoom ────────────────────────────────────────────────────────

/// Minimum allowed display scale.
pub const MIN_ZOOM: f64 = 0.1;

/// Maximum allowed display scale.
pub const MAX_ZOOM: f64 = 10.0;

/// Usable `(min, max)` zoom range from host-supplied bounds.
///
/// Non-positive or non-finite bounds fall back to [`MIN_ZOOM`]/[`MAX_ZOOM`],
/// and an inverted pair is swapped.
pub fn zoom_range(min_zoom: f64, max_zoom: f64) -> (f64, f64) {
    let usable = |v: f64| v.is_finite() && v > 0.0;
    let min = if usable(min_zoom) { min_zoom } else { MIN_ZOOM };
    let max = if usable(max_zoom) { max_zoom } else { MAX_ZOOM };
    if min <= max {
        (min, max)
    } else {
        (max, min)
    }
}

/// Which minimum-size floor a view enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorContext {
    /// Pixel-precision views: zoomed canvas and advanced editor.
    #[default]
    Precise,
    /// Coarse placement views: main canvas and viewport-constrained canvas.
    Coarse,
}

impl EditorContext {
    /// Minimum region extent for this context, in image units.
    #[inline]
    pub fn min_size(self) -> f64 {
        match self {
            EditorContext::Precise => MIN_SIZE_PRECISE,
            EditorContext::Coarse => MIN_SIZE_COARSE,
        }
    }
}

/// Kind of pointing device driving the view. Touch gets larger handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerKind {
    #[default]
    Mouse,
    Touch,
}

/// Tunable gesture and hit-testing policy for one canvas view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Minimum-size floor selection.
    pub context: EditorContext,
    /// Input device class.
    pub pointer: PointerKind,
    /// Handle box size for mouse input.
    pub handle_size_mouse: f64,
    /// Handle box size for touch input.
    pub handle_size_touch: f64,
    /// Rotation handle distance above the top edge.
    pub rotation_handle_offset: f64,
    /// Minimum display extent of a create drag.
    pub create_threshold: f64,
    /// Double-activation window in milliseconds.
    pub double_activate_ms: f64,
    /// Rotation snap step in degrees.
    pub rotation_snap_degrees: f64,
    /// Gap between adjacent grid cells, in image units.
    pub grid_spacing: f64,
    /// Lower zoom clamp.
    pub min_zoom: f64,
    /// Upper zoom clamp.
    pub max_zoom: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            context: EditorContext::default(),
            pointer: PointerKind::default(),
            handle_size_mouse: HANDLE_SIZE_MOUSE,
            handle_size_touch: HANDLE_SIZE_TOUCH,
            rotation_handle_offset: ROTATION_HANDLE_OFFSET,
            create_threshold: CREATE_THRESHOLD,
            double_activate_ms: DOUBLE_ACTIVATE_MS,
            rotation_snap_degrees: ROTATION_SNAP_DEGREES,
            grid_spacing: 0.0,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }
}

impl EditorConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Config for a coarse placement canvas.
    pub fn coarse() -> Self {
        Self {
            context: EditorContext::Coarse,
            ..Self::default()
        }
    }

    /// Minimum region extent enforced by this view.
    #[inline]
    pub fn min_size(&self) -> f64 {
        self.context.min_size()
    }

    /// Zoom clamp for this view, see [`zoom_range`].
    #[inline]
    pub fn zoom_range(&self) -> (f64, f64) {
        zoom_range(self.min_zoom, self.max_zoom)
    }

    /// Base handle size for the configured pointer kind, before zoom scaling.
    #[inline]
    pub fn base_handle_size(&self) -> f64 {
        match self.pointer {
            PointerKind::Mouse => self.handle_size_mouse,
            PointerKind::Touch => self.handle_size_touch,
        }
    }

    /// Handle size at the given zoom level.
    ///
    /// Scales with the zoom, clamped to `[HANDLE_ZOOM_MIN, HANDLE_ZOOM_MAX]`.
    pub fn handle_size(&self, zoom: f64) -> f64 {
        let zoom = if zoom.is_finite() { zoom } else { 1.0 };
        self.base_handle_size() * zoom.clamp(HANDLE_ZOOM_MIN, HANDLE_ZOOM_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_size_floors_are_distinct() {
        assert_eq!(EditorContext::Precise.min_size(), 10.0);
        assert_eq!(EditorContext::Coarse.min_size(), 20.0);
        assert_eq!(EditorConfig::coarse().min_size(), MIN_SIZE_COARSE);
        assert_eq!(EditorConfig::new().min_size(), MIN_SIZE_PRECISE);
    }

    #[test]
    fn test_touch_handles_are_larger() {
        let mouse = EditorConfig::default();
        let touch = EditorConfig {
            pointer: PointerKind::Touch,
            ..EditorConfig::default()
        };
        assert!(touch.handle_size(1.0) > mouse.handle_size(1.0));
    }

    #[test]
    fn test_handle_size_follows_zoom_within_clamp() {
        let config = EditorConfig::default();
        assert_eq!(config.handle_size(1.0), HANDLE_SIZE_MOUSE);
        assert_eq!(config.handle_size(1.5), HANDLE_SIZE_MOUSE * 1.5);
        assert_eq!(config.handle_size(8.0), HANDLE_SIZE_MOUSE * HANDLE_ZOOM_MAX);
        assert_eq!(config.handle_size(0.01), HANDLE_SIZE_MOUSE * HANDLE_ZOOM_MIN);
        assert_eq!(config.handle_size(f64::NAN), HANDLE_SIZE_MOUSE);
    }

    #[test]
    fn test_zoom_range_sanitizes_host_bounds() {
        assert_eq!(EditorConfig::default().zoom_range(), (MIN_ZOOM, MAX_ZOOM));
        assert_eq!(zoom_range(5.0, 1.0), (1.0, 5.0));
        assert_eq!(zoom_range(f64::NAN, 4.0), (MIN_ZOOM, 4.0));
        assert_eq!(zoom_range(0.5, f64::INFINITY), (0.5, MAX_ZOOM));
        assert_eq!(zoom_range(-1.0, 0.0), (MIN_ZOOM, MAX_ZOOM));
        // Fallback min above a tiny max gets reordered too
        assert_eq!(zoom_range(f64::NAN, 0.05), (0.05, MIN_ZOOM));
    }
}
