//! One widget instance wired to its page.
//!
//! [`AskBoxSession`] ties the tracker, highlighter and codec to a single
//! [`SelectionHost`]. The browser crate drives it from DOM events; tests
//! drive it against [`MemDom`](crate::mem::MemDom).

use crate::codec::{SelectionCodec, SelectionParams};
use crate::config::AskBoxConfig;
use crate::highlight::Highlighter;
use crate::platform::SelectionHost;
use crate::tracker::{PointerRelease, SelectionTracker, TrackOutcome, adjust_position};

pub struct AskBoxSession<H: SelectionHost> {
    host: H,
    tracker: SelectionTracker<H::Node>,
    highlighter: Highlighter,
    codec: SelectionCodec,
}

impl<H: SelectionHost> AskBoxSession<H> {
    pub fn new(host: H, config: &AskBoxConfig) -> Self {
        Self {
            host,
            tracker: SelectionTracker::new(config),
            highlighter: Highlighter::new(config.marker_class.clone()),
            codec: SelectionCodec::new(config.params.clone()),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn tracker(&self) -> &SelectionTracker<H::Node> {
        &self.tracker
    }

    pub fn highlighter(&self) -> &Highlighter {
        &self.highlighter
    }

    pub fn codec(&self) -> &SelectionCodec {
        &self.codec
    }

    /// Feed a pointer release to the tracker.
    ///
    /// Returns the outcome plus the button offset to apply, if it moved.
    pub fn pointer_release(&mut self, event: PointerRelease) -> (TrackOutcome, Option<f64>) {
        let outcome = self.tracker.on_pointer_release(event, &self.host);
        let bottom = match &outcome {
            TrackOutcome::Tracked { bottom } => *bottom,
            TrackOutcome::Cleared => Some(self.tracker.default_bottom()),
            _ => None,
        };
        (outcome, bottom)
    }

    /// Button offset after the page scrolled, if a selection is tracked.
    ///
    /// The button stays put while the panel is open: the highlight has
    /// split the tracked range's text nodes.
    pub fn scrolled(&self) -> Option<f64> {
        if self.tracker.is_panel_open() {
            return None;
        }
        adjust_position(self.tracker.state(), &self.host)
    }

    /// The submission panel became visible: highlight the tracked selection.
    ///
    /// Any earlier highlight is removed first. Returns the markers added.
    pub fn panel_opened(&mut self) -> usize {
        self.tracker.set_panel_open(true);
        self.highlighter.clear(&mut self.host);

        let Some(tracked) = self.tracker.tracked() else {
            return 0;
        };
        let range = tracked.range.clone();
        self.highlighter.apply(&mut self.host, &range)
    }

    /// The submission panel closed: drop the highlight, hand the selection
    /// back to the browser and stop tracking.
    ///
    /// Returns the default button offset.
    pub fn panel_dismissed(&mut self) -> f64 {
        self.tracker.set_panel_open(false);
        self.highlighter.clear(&mut self.host);

        if let Some(tracked) = self.tracker.tracked() {
            let range = tracked.range.clone();
            if let Err(error) = self.host.restore_live_selection(&range) {
                tracing::debug!(target: "askbox::session", %error, "could not restore selection");
            }
        }
        self.tracker.clear()
    }

    /// Parameters describing the tracked selection, for the submission.
    pub fn share_params(&self) -> Option<SelectionParams> {
        self.tracker
            .tracked()
            .map(|tracked| self.codec.encode(&tracked.anchors))
    }

    /// A shareable link to the tracked selection on `page_url`.
    pub fn share_url(&self, page_url: &str) -> Option<String> {
        self.share_params()
            .map(|params| params.append_to_url(page_url))
    }

    /// Highlight a selection carried in a page query string.
    ///
    /// Does nothing when the query holds no complete, resolvable selection.
    /// Returns the markers added.
    pub fn recreate(&mut self, query: &str) -> usize {
        let Some(range) = self.codec.decode_query(&self.host, query) else {
            return 0;
        };
        self.highlighter.clear(&mut self.host);
        let added = self.highlighter.apply(&mut self.host, &range);
        tracing::debug!(target: "askbox::session", added, "recreated shared selection");
        added
    }
}
