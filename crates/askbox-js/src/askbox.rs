//! JsAskBox - the widget handle exposed to JavaScript.

use askbox_browser::{AskBoxConfig, AskBoxHandle, attach};
use wasm_bindgen::prelude::*;

/// A widget attached to the current page.
///
/// Listens for selections while alive. Call `detach()` (or `free()`) to
/// remove its listeners.
#[wasm_bindgen]
pub struct JsAskBox {
    handle: AskBoxHandle,
}

#[wasm_bindgen]
impl JsAskBox {
    /// Attach a widget. `config` is optional; missing fields take defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsAskBox, JsError> {
        let config: AskBoxConfig = if config.is_undefined() || config.is_null() {
            AskBoxConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsError::new(&format!("Invalid config: {}", e)))?
        };

        let handle = attach(&config).map_err(|e| JsError::new(&e.to_string()))?;
        Ok(Self { handle })
    }

    /// Whether a selection is currently tracked.
    #[wasm_bindgen(js_name = isTracking)]
    pub fn is_tracking(&self) -> bool {
        self.handle
            .askbox()
            .borrow()
            .session()
            .tracker()
            .state()
            .is_tracking()
    }

    /// The panel became visible. Returns the number of markers added.
    #[wasm_bindgen(js_name = panelOpened)]
    pub fn panel_opened(&self) -> u32 {
        self.handle.askbox().borrow_mut().panel_opened() as u32
    }

    /// The panel closed: clears highlights and restores the selection.
    #[wasm_bindgen(js_name = panelDismissed)]
    pub fn panel_dismissed(&self) {
        self.handle.askbox().borrow_mut().panel_dismissed();
    }

    /// Link to this page that recreates the tracked selection.
    #[wasm_bindgen(js_name = shareUrl)]
    pub fn share_url(&self) -> Option<String> {
        self.handle.askbox().borrow().share_url()
    }

    /// The selection parameters as a plain object, for the submission
    /// payload. `undefined` when nothing is tracked.
    #[wasm_bindgen(js_name = selectionParams)]
    pub fn selection_params(&self) -> Result<JsValue, JsError> {
        let Some(params) = self.handle.askbox().borrow().selection_params() else {
            return Ok(JsValue::UNDEFINED);
        };

        let object = js_sys::Object::new();
        for (key, value) in params.pairs() {
            js_sys::Reflect::set(&object, &JsValue::from_str(key), &JsValue::from_str(value))
                .map_err(|e| JsError::new(&format!("Reflect.set failed: {:?}", e)))?;
        }
        Ok(object.into())
    }

    /// Highlight the selection carried in a query string.
    #[wasm_bindgen(js_name = recreateFromQuery)]
    pub fn recreate_from_query(&self, query: &str) -> u32 {
        self.handle.askbox().borrow_mut().recreate_from_query(query) as u32
    }

    /// Remove the widget's event listeners.
    pub fn detach(self) {
        drop(self.handle);
    }
}
