//! Selection tracking.
//!
//! One [`SelectionTracker`] per widget instance owns the single tracked
//! selection. Pointer releases feed it; the submission panel toggles its
//! open state and clears it on dismissal.

use smol_str::SmolStr;

use crate::codec::describe_range;
use crate::config::AskBoxConfig;
use crate::platform::SelectionHost;
use crate::tree::within_class;
use crate::types::{AnchorPair, DomRange};

/// Which pointer button was released, following `MouseEvent.button`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Auxiliary,
    Secondary,
    Other(i16),
}

impl PointerButton {
    pub fn from_button(button: i16) -> Self {
        match button {
            0 => Self::Primary,
            1 => Self::Auxiliary,
            2 => Self::Secondary,
            other => Self::Other(other),
        }
    }
}

/// A pointer-release event as seen by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerRelease {
    pub button: PointerButton,
    /// Released on the widget's own controls (the floating button), where
    /// the press usually collapsed the page selection.
    pub on_widget: bool,
}

impl PointerRelease {
    pub fn new(button: PointerButton) -> Self {
        Self {
            button,
            on_widget: false,
        }
    }

    pub fn primary() -> Self {
        Self::new(PointerButton::Primary)
    }

    pub fn on_widget(mut self) -> Self {
        self.on_widget = true;
        self
    }
}

/// A captured range and the anchors that identify it across page loads.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedSelection<N> {
    pub range: DomRange<N>,
    pub anchors: AnchorPair,
}

/// At most one tracked selection.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedState<N> {
    current: Option<TrackedSelection<N>>,
}

impl<N> Default for TrackedState<N> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<N> TrackedState<N> {
    pub fn get(&self) -> Option<&TrackedSelection<N>> {
        self.current.as_ref()
    }

    pub fn is_tracking(&self) -> bool {
        self.current.is_some()
    }

    pub fn set(&mut self, selection: TrackedSelection<N>) {
        self.current = Some(selection);
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

/// What a pointer release did to the tracked state.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackOutcome {
    /// Not the primary button, released on the widget, or the panel is open.
    Ignored,
    /// No live selection at all.
    NoSelection,
    /// The selection was collapsed, outside the region, or unidentifiable.
    Cleared,
    /// The host cannot report range geometry; state left as it was.
    Unsupported,
    /// A new selection is tracked. `bottom` is the new button offset.
    Tracked { bottom: Option<f64> },
}

/// Owns the tracked selection and the panel-open flag.
#[derive(Debug, Clone)]
pub struct SelectionTracker<N> {
    state: TrackedState<N>,
    panel_open: bool,
    restrict_class: Option<SmolStr>,
    default_bottom: f64,
}

impl<N: Clone + PartialEq + std::fmt::Debug> SelectionTracker<N> {
    pub fn new(config: &AskBoxConfig) -> Self {
        Self {
            state: TrackedState::default(),
            panel_open: false,
            restrict_class: config.restrict_class.clone(),
            default_bottom: config.default_button_bottom,
        }
    }

    pub fn state(&self) -> &TrackedState<N> {
        &self.state
    }

    pub fn tracked(&self) -> Option<&TrackedSelection<N>> {
        self.state.get()
    }

    pub fn is_panel_open(&self) -> bool {
        self.panel_open
    }

    pub fn set_panel_open(&mut self, open: bool) {
        self.panel_open = open;
    }

    pub fn default_bottom(&self) -> f64 {
        self.default_bottom
    }

    /// Capture the live selection after a pointer release.
    pub fn on_pointer_release<H>(&mut self, event: PointerRelease, host: &H) -> TrackOutcome
    where
        H: SelectionHost<Node = N>,
    {
        if event.button != PointerButton::Primary || event.on_widget || self.panel_open {
            return TrackOutcome::Ignored;
        }

        let Some(range) = host.live_range() else {
            return TrackOutcome::NoSelection;
        };

        if let Some(class) = &self.restrict_class {
            let inside = within_class(host, &range.start.container, class)
                && within_class(host, &range.end.container, class);
            if !inside {
                tracing::trace!(target: "askbox::tracker", %class, "selection outside region");
                self.clear();
                return TrackOutcome::Cleared;
            }
        }

        if range.is_collapsed() {
            self.clear();
            return TrackOutcome::Cleared;
        }

        if host.client_rects(&range).is_none() {
            tracing::warn!(target: "askbox::tracker", "range geometry unavailable");
            return TrackOutcome::Unsupported;
        }

        let anchors = match describe_range(host, &range) {
            Ok(anchors) => anchors,
            Err(error) => {
                tracing::debug!(target: "askbox::tracker", %error, "selection has no anchors");
                self.clear();
                return TrackOutcome::Cleared;
            }
        };

        tracing::debug!(
            target: "askbox::tracker",
            start = %anchors.start.element_id,
            start_offset = anchors.start.offset,
            end = %anchors.end.element_id,
            end_offset = anchors.end.offset,
            "tracking selection"
        );
        self.state.set(TrackedSelection { range, anchors });

        TrackOutcome::Tracked {
            bottom: adjust_position(&self.state, host),
        }
    }

    /// Drop the tracked selection. Returns the default button offset.
    pub fn clear(&mut self) -> f64 {
        self.state.clear();
        self.default_bottom
    }
}

/// Button offset from the bottom of the viewport that keeps it level with
/// the end of the tracked selection.
///
/// `None` when nothing is tracked or the host has no geometry. The tracked
/// range is a value, not a live range: once highlight markers have split
/// its text nodes its offsets no longer fit them, so callers skip this
/// while the highlight is shown.
pub fn adjust_position<H: SelectionHost>(state: &TrackedState<H::Node>, host: &H) -> Option<f64> {
    let tracked = state.get()?;
    let rects = host.client_rects(&tracked.range)?;
    let last = rects.last()?;
    Some(host.viewport_height() - last.bottom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::SelectionCodec;
    use crate::highlight::Highlighter;
    use crate::mem::{MemDom, NodeId};
    use crate::tree::text_in_range;
    use crate::types::{AnchorDescriptor, ClientRect};

    /// `<div class="askable"><p id="a">alpha beta</p><p id="b">gamma</p></div><p id="out">outside</p>`
    fn page() -> (MemDom, NodeId, NodeId, NodeId) {
        let mut dom = MemDom::new();
        let body = dom.root();
        let div = dom.append_element(&body, "div");
        dom.add_class(&div, "askable");
        let a = dom.append_element(&div, "p");
        dom.set_id(&a, "a");
        let alpha = dom.append_text(&a, "alpha beta");
        let b = dom.append_element(&div, "p");
        dom.set_id(&b, "b");
        let gamma = dom.append_text(&b, "gamma");
        let out = dom.append_element(&body, "p");
        dom.set_id(&out, "out");
        let outside = dom.append_text(&out, "outside");
        (dom, alpha, gamma, outside)
    }

    fn tracker() -> SelectionTracker<NodeId> {
        SelectionTracker::new(&AskBoxConfig::default())
    }

    #[test]
    fn test_tracks_selection_and_positions_button() {
        let (mut dom, alpha, gamma, _) = page();
        dom.set_viewport_height(800.0);
        dom.set_client_rects(Some(vec![
            ClientRect::new(10.0, 100.0, 300.0, 120.0),
            ClientRect::new(10.0, 130.0, 80.0, 150.0),
        ]));
        dom.select(Some(DomRange::from_parts(alpha, 6, gamma, 2)));

        let mut tracker = tracker();
        let outcome = tracker.on_pointer_release(PointerRelease::primary(), &dom);
        assert_eq!(outcome, TrackOutcome::Tracked { bottom: Some(650.0) });

        let tracked = tracker.tracked().unwrap();
        assert_eq!(tracked.anchors.start, AnchorDescriptor::new("a", 6));
        assert_eq!(tracked.anchors.end, AnchorDescriptor::new("b", 2));
        assert_eq!(adjust_position(tracker.state(), &dom), Some(650.0));
    }

    #[test]
    fn test_collapsed_selection_clears_state() {
        let (mut dom, alpha, gamma, _) = page();
        let mut tracker = tracker();
        dom.select(Some(DomRange::from_parts(alpha, 0, gamma, 3)));
        tracker.on_pointer_release(PointerRelease::primary(), &dom);
        assert!(tracker.state().is_tracking());

        dom.select(Some(DomRange::from_parts(alpha, 4, alpha, 4)));
        let outcome = tracker.on_pointer_release(PointerRelease::primary(), &dom);
        assert_eq!(outcome, TrackOutcome::Cleared);
        assert!(!tracker.state().is_tracking());

        // Nothing left to highlight.
        let highlighter = Highlighter::new("askboxHighlight");
        if let Some(tracked) = tracker.tracked() {
            highlighter.apply(&mut dom, &tracked.range.clone());
        }
        assert_eq!(highlighter.marker_count(&dom), 0);
    }

    #[test]
    fn test_out_of_region_clears_state() {
        let (mut dom, alpha, _, outside) = page();
        let mut tracker = tracker();
        dom.select(Some(DomRange::from_parts(alpha, 0, alpha, 5)));
        tracker.on_pointer_release(PointerRelease::primary(), &dom);
        assert!(tracker.state().is_tracking());

        dom.select(Some(DomRange::from_parts(alpha, 0, outside, 3)));
        let outcome = tracker.on_pointer_release(PointerRelease::primary(), &dom);
        assert_eq!(outcome, TrackOutcome::Cleared);
        assert!(!tracker.state().is_tracking());
    }

    #[test]
    fn test_unrestricted_region() {
        let (mut dom, alpha, _, outside) = page();
        let config = AskBoxConfig {
            restrict_class: None,
            ..Default::default()
        };
        let mut tracker = SelectionTracker::new(&config);
        dom.select(Some(DomRange::from_parts(alpha, 0, outside, 3)));

        let outcome = tracker.on_pointer_release(PointerRelease::primary(), &dom);
        assert!(matches!(outcome, TrackOutcome::Tracked { .. }));
        assert_eq!(
            tracker.tracked().unwrap().anchors.end,
            AnchorDescriptor::new("out", 3)
        );
    }

    #[test]
    fn test_unsupported_geometry_leaves_state() {
        let (mut dom, alpha, gamma, _) = page();
        let mut tracker = tracker();
        dom.select(Some(DomRange::from_parts(alpha, 0, alpha, 5)));
        tracker.on_pointer_release(PointerRelease::primary(), &dom);
        let before = tracker.state().clone();

        dom.set_client_rects(None);
        dom.select(Some(DomRange::from_parts(alpha, 0, gamma, 5)));
        let outcome = tracker.on_pointer_release(PointerRelease::primary(), &dom);
        assert_eq!(outcome, TrackOutcome::Unsupported);
        assert_eq!(tracker.state(), &before);
        assert_eq!(adjust_position(tracker.state(), &dom), None);
    }

    #[test]
    fn test_ignored_events() {
        let (mut dom, alpha, _, _) = page();
        let mut tracker = tracker();
        dom.select(Some(DomRange::from_parts(alpha, 0, alpha, 5)));

        let secondary = PointerRelease::new(PointerButton::from_button(2));
        assert_eq!(tracker.on_pointer_release(secondary, &dom), TrackOutcome::Ignored);

        tracker.set_panel_open(true);
        assert_eq!(
            tracker.on_pointer_release(PointerRelease::primary(), &dom),
            TrackOutcome::Ignored
        );
        assert!(!tracker.state().is_tracking());

        tracker.set_panel_open(false);
        dom.select(None);
        assert_eq!(
            tracker.on_pointer_release(PointerRelease::primary(), &dom),
            TrackOutcome::NoSelection
        );
    }

    #[test]
    fn test_release_on_widget_keeps_selection() {
        let (mut dom, alpha, gamma, _) = page();
        let mut tracker = tracker();
        let range = DomRange::from_parts(alpha, 6, gamma, 5);
        dom.select(Some(range.clone()));
        tracker.on_pointer_release(PointerRelease::primary(), &dom);

        // Pressing the floating button collapses the page selection.
        dom.select(Some(DomRange::from_parts(alpha, 2, alpha, 2)));
        assert_eq!(
            tracker.on_pointer_release(PointerRelease::primary().on_widget(), &dom),
            TrackOutcome::Ignored
        );
        assert_eq!(tracker.tracked().map(|t| &t.range), Some(&range));
    }

    #[test]
    fn test_unidentified_selection_clears() {
        let mut dom = MemDom::new();
        let body = dom.root();
        let div = dom.append_element(&body, "div");
        dom.add_class(&div, "askable");
        let p = dom.append_element(&div, "p");
        let t = dom.append_text(&p, "no ids here");
        dom.select(Some(DomRange::from_parts(t, 0, t, 2)));

        let mut tracker = tracker();
        assert_eq!(
            tracker.on_pointer_release(PointerRelease::primary(), &dom),
            TrackOutcome::Cleared
        );
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (mut dom, alpha, _, _) = page();
        let mut tracker = tracker();
        dom.select(Some(DomRange::from_parts(alpha, 0, alpha, 5)));
        tracker.on_pointer_release(PointerRelease::primary(), &dom);

        assert_eq!(tracker.clear(), 15.0);
        assert_eq!(tracker.clear(), 15.0);
        assert!(!tracker.state().is_tracking());
        assert_eq!(adjust_position(tracker.state(), &dom), None);
    }

    #[test]
    fn test_tracked_anchors_round_trip() {
        let (mut dom, alpha, gamma, _) = page();
        let mut tracker = tracker();
        let range = DomRange::from_parts(alpha, 2, gamma, 4);
        dom.select(Some(range.clone()));
        tracker.on_pointer_release(PointerRelease::primary(), &dom);

        let codec = SelectionCodec::default();
        let tracked = tracker.tracked().unwrap();
        let query = codec.encode(&tracked.anchors).to_query();
        let decoded = codec.decode_query(&dom, &query).unwrap();
        assert_eq!(text_in_range(&dom, &decoded), text_in_range(&dom, &range));
        assert_eq!(text_in_range(&dom, &decoded), "pha betagamm");
    }
}
