//! The page controller: one widget bound to the live document.

use std::cell::RefCell;
use std::rc::Rc;

use askbox_core::{
    AskBoxConfig, AskBoxSession, PointerButton, PointerRelease, Result, SelectionParams,
    TrackOutcome,
};
use gloo_events::EventListener;
use wasm_bindgen::JsCast;
use web_sys::{Event, HtmlElement, MouseEvent, Node};

use crate::dom::BrowserDom;

/// Selection handling for one widget on the current page.
pub struct AskBox {
    session: AskBoxSession<BrowserDom>,
    button_id: String,
}

impl AskBox {
    pub fn new(config: &AskBoxConfig) -> Result<Self> {
        let dom = BrowserDom::new()?;
        Ok(Self {
            session: AskBoxSession::new(dom, config),
            button_id: config.button_id.to_string(),
        })
    }

    pub fn session(&self) -> &AskBoxSession<BrowserDom> {
        &self.session
    }

    pub fn dom(&self) -> &BrowserDom {
        self.session.host()
    }

    pub fn handle_mouse_up(&mut self, event: &MouseEvent) -> TrackOutcome {
        let mut release = PointerRelease::new(PointerButton::from_button(event.button()));
        let target = event.target().and_then(|t| t.dyn_into::<Node>().ok());
        if target.is_some_and(|node| self.is_on_button(&node)) {
            release = release.on_widget();
        }
        let (outcome, bottom) = self.session.pointer_release(release);
        if let Some(bottom) = bottom {
            self.set_button_bottom(bottom);
        }
        outcome
    }

    /// Whether `node` is the floating button or sits inside it.
    pub fn is_on_button(&self, node: &Node) -> bool {
        self.dom()
            .document()
            .get_element_by_id(&self.button_id)
            .is_some_and(|button| button.contains(Some(node)))
    }

    pub fn handle_scroll(&mut self) {
        if let Some(bottom) = self.session.scrolled() {
            self.set_button_bottom(bottom);
        }
    }

    /// Call when the submission panel has opened.
    pub fn panel_opened(&mut self) -> usize {
        self.session.panel_opened()
    }

    /// Call when the submission panel has closed.
    pub fn panel_dismissed(&mut self) {
        let bottom = self.session.panel_dismissed();
        self.set_button_bottom(bottom);
    }

    pub fn selection_params(&self) -> Option<SelectionParams> {
        self.session.share_params()
    }

    /// Link to the current page that recreates the tracked selection.
    pub fn share_url(&self) -> Option<String> {
        let href = self.dom().window().location().href().ok()?;
        self.session.share_url(&href)
    }

    /// Highlight a selection carried in the page URL, if any.
    pub fn recreate_from_location(&mut self) -> usize {
        match self.dom().window().location().search() {
            Ok(search) => self.session.recreate(&search),
            Err(e) => {
                tracing::debug!(target: "askbox::widget", error = ?e, "location.search unavailable");
                0
            }
        }
    }

    pub fn recreate_from_query(&mut self, query: &str) -> usize {
        self.session.recreate(query)
    }

    /// Move the floating button `bottom` px above the viewport's bottom edge.
    pub fn set_button_bottom(&self, bottom: f64) {
        let Some(button) = self
            .dom()
            .document()
            .get_element_by_id(&self.button_id)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        else {
            tracing::trace!(target: "askbox::widget", id = %self.button_id, "no button element");
            return;
        };
        if let Err(e) = button
            .style()
            .set_property("bottom", &format!("{}px", bottom))
        {
            tracing::debug!(target: "askbox::widget", error = ?e, "could not move button");
        }
    }
}

/// A widget wired to document events. Dropping it removes the listeners.
pub struct AskBoxHandle {
    askbox: Rc<RefCell<AskBox>>,
    _listeners: Vec<EventListener>,
}

impl AskBoxHandle {
    pub fn askbox(&self) -> &Rc<RefCell<AskBox>> {
        &self.askbox
    }
}

/// Create a widget, listen for selections and scrolling, and recreate any
/// selection carried in the page URL.
pub fn attach(config: &AskBoxConfig) -> Result<AskBoxHandle> {
    let askbox = Rc::new(RefCell::new(AskBox::new(config)?));

    let (window, document) = {
        let inner = askbox.borrow();
        (inner.dom().window().clone(), inner.dom().document().clone())
    };

    let on_mouse_up = {
        let askbox = askbox.clone();
        EventListener::new(&document, "mouseup", move |event: &Event| {
            let Some(event) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            let Ok(mut askbox) = askbox.try_borrow_mut() else {
                return;
            };
            askbox.handle_mouse_up(event);
        })
    };

    let on_scroll = {
        let askbox = askbox.clone();
        EventListener::new(&window, "scroll", move |_event: &Event| {
            if let Ok(mut askbox) = askbox.try_borrow_mut() {
                askbox.handle_scroll();
            }
        })
    };

    let recreated = askbox.borrow_mut().recreate_from_location();
    tracing::debug!(target: "askbox::widget", recreated, "askbox attached");

    Ok(AskBoxHandle {
        askbox,
        _listeners: vec![on_mouse_up, on_scroll],
    })
}
