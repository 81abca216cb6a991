//! askbox-core: selection handling for the askbox widget, without browser dependencies.
//!
//! This crate provides:
//! - `DomTree` / `SelectionHost` traits abstracting the page the widget lives in
//! - `MemDom` - an arena-backed implementation for native use and tests
//! - `SelectionTracker` - owns the single tracked selection of a widget instance
//! - `partition` - splits a range into pieces that never cross an element boundary
//! - `Highlighter` - wraps those pieces in marker elements and removes them again
//! - `SelectionCodec` - round-trips a selection through URL query parameters
//! - `AskBoxSession` - one widget instance wired to its page

pub mod codec;
pub mod config;
pub mod error;
pub mod highlight;
pub mod mem;
pub mod partition;
pub mod platform;
pub mod session;
pub mod tracker;
pub mod tree;
pub mod types;

pub use codec::{SelectionCodec, SelectionParams, describe_range, resolve};
pub use config::{AskBoxConfig, ParamKeys};
pub use error::{Error, Result};
pub use highlight::Highlighter;
pub use mem::{MemDom, NodeId};
pub use partition::partition;
pub use platform::{DomTree, SelectionHost};
pub use session::AskBoxSession;
pub use smol_str::SmolStr;
pub use tracker::{
    PointerButton, PointerRelease, SelectionTracker, TrackOutcome, TrackedSelection, TrackedState,
    adjust_position,
};
pub use tree::{common_ancestor, first_text_descendant, text_in_range};
pub use types::{AnchorDescriptor, AnchorPair, BoundaryPoint, ClientRect, DomRange, MarkerKind, NodeKind};
