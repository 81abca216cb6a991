//! Widget configuration.
//!
//! Every field has a default matching the stock widget, so an empty object
//! (or no config at all) is valid.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Query parameter names used to carry a selection in a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParamKeys {
    pub start_id: SmolStr,
    pub start_offset: SmolStr,
    pub end_id: SmolStr,
    pub end_offset: SmolStr,
}

impl Default for ParamKeys {
    fn default() -> Self {
        Self {
            start_id: SmolStr::new_static("abSN"),
            start_offset: SmolStr::new_static("abSO"),
            end_id: SmolStr::new_static("abEN"),
            end_offset: SmolStr::new_static("abEO"),
        }
    }
}

/// Configuration for one widget instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AskBoxConfig {
    /// Class put on highlight marker elements.
    pub marker_class: SmolStr,
    /// Only selections inside elements with this class are tracked.
    /// `None` allows the whole page.
    pub restrict_class: Option<SmolStr>,
    /// Id of the floating button that follows the selection.
    pub button_id: SmolStr,
    /// Bottom offset of the button, in px, when no selection is tracked.
    pub default_button_bottom: f64,
    pub params: ParamKeys,
}

impl Default for AskBoxConfig {
    fn default() -> Self {
        Self {
            marker_class: SmolStr::new_static("askboxHighlight"),
            restrict_class: Some(SmolStr::new_static("askable")),
            button_id: SmolStr::new_static("askboxButton"),
            default_button_bottom: 15.0,
            params: ParamKeys::default(),
        }
    }
}
