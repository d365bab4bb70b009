//! Cropgrid WASM - WebAssembly bindings for Cropgrid
//!
//! This crate exposes the cropgrid-core interaction engine to
//! JavaScript/TypeScript canvas hosts.
//!
//! # Module Structure
//!
//! - `editor` - `JsCropEditor`, one canvas view's model and gesture engine
//! - `types` - Constructor options and JS value conversions
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsCropEditor } from '@cropgrid/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const editor = new JsCropEditor(image.naturalWidth, image.naturalHeight, undefined);
//! const actions = editor.pointer_down(x, y, false, performance.now());
//! ```

use wasm_bindgen::prelude::*;

mod editor;
mod types;

pub use editor::{EditorExportError, JsCropEditor};
pub use types::EditorOptions;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::log_1(&JsValue::from_str(&format!("cropgrid-wasm {} ready", version())));
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }
}
