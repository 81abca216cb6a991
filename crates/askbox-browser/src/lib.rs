//! Browser DOM layer for the askbox widget.
//!
//! Implements the `askbox-core` DOM traits over `web_sys` and wires them to
//! page events. It assumes a `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `dom`: `BrowserDom`, the live document behind `DomTree` / `SelectionHost`
//! - `widget`: `AskBox` page controller and event listener setup
//!
//! This crate re-exports `askbox-core`, so consumers only need to depend on
//! `askbox-browser`.

pub use askbox_core;
pub use askbox_core::*;

pub mod dom;
pub mod widget;

pub use dom::BrowserDom;
pub use widget::{AskBox, AskBoxHandle, attach};
