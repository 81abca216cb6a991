//! Error types for askbox operations.
//!
//! None of these escape the widget: the public entry points log them and
//! degrade to "no highlight" or "no tracked selection".

use miette::Diagnostic;
use smol_str::SmolStr;

/// Main error type for selection, highlight and codec operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Diagnostic)]
pub enum Error {
    /// The node handle does not belong to the document, or was removed from it.
    #[error("node is not attached to the document")]
    #[diagnostic(code(askbox::detached))]
    Detached,

    /// A range handed to `surround` spans more than one parent.
    #[error("range boundaries do not share a parent element")]
    #[diagnostic(code(askbox::non_contiguous))]
    NonContiguous,

    /// A boundary offset points past the end of its container.
    #[error("offset {offset} is out of bounds for a node of length {len}")]
    #[diagnostic(code(askbox::offset))]
    OffsetOutOfBounds { offset: usize, len: usize },

    /// No element carries the requested id, or more than one does.
    #[error("no unique element with id `{0}`")]
    #[diagnostic(code(askbox::missing_element))]
    MissingElement(SmolStr),

    /// The element exists but contains no text node to anchor into.
    #[error("element `{0}` has no text content")]
    #[diagnostic(code(askbox::no_text))]
    NoTextNode(SmolStr),

    /// The decoded start of a selection falls after its end.
    #[error("selection start `{start}` comes after its end `{end}`")]
    #[diagnostic(code(askbox::reversed))]
    Reversed { start: SmolStr, end: SmolStr },

    /// A selection parameter was absent from the query.
    #[error("missing selection parameter `{0}`")]
    #[diagnostic(code(askbox::missing_param))]
    MissingParam(SmolStr),

    /// A selection offset parameter is not a decimal integer.
    #[error("invalid offset `{value}` for parameter `{key}`")]
    #[diagnostic(code(askbox::invalid_offset))]
    InvalidOffset { key: SmolStr, value: String },

    /// No element with an id encloses a selection boundary.
    #[error("no identified element encloses the selection boundary")]
    #[diagnostic(
        code(askbox::unidentified),
        help("every element that can hold a selection needs a page-unique id")
    )]
    Unidentified,

    /// Failure reported by the underlying platform (e.g. a browser API call).
    #[error("{0}")]
    #[diagnostic(code(askbox::platform))]
    Platform(String),
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Platform(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Platform(s)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
