//! Conversions between core types and JavaScript values.
//!
//! Core types derive serde, so crossing the boundary is a
//! `serde-wasm-bindgen` round through plain JS objects. Errors become
//! `JsValue` strings.

use cropgrid_core::{EditorConfig, ViewBounds};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Options accepted by the `JsCropEditor` constructor.
///
/// ```typescript
/// new JsCropEditor(4000, 3000, {
///   config: { context: "coarse", pointer: "touch" },
///   bounds: { kind: "safe_area", area: { min_x: 20, min_y: 20, max_x: 780, max_y: 580 } },
/// });
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorOptions {
    pub config: EditorConfig,
    pub bounds: ViewBounds,
}

/// Serialize a value into a plain JS object.
pub(crate) fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Deserialize a JS value, naming what was expected in the error.
pub(crate) fn from_js<T: DeserializeOwned>(value: JsValue, what: &str) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&format!("Invalid {}: {}", what, e)))
}

/// Map a core error onto a JS string.
pub(crate) fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}
