//! Round-tripping a selection through URL query parameters.
//!
//! A selection is carried as four flat parameters: start element id, start
//! offset, end element id, end offset. Offsets count UTF-16 code units from
//! the start of the element's first text node, so the recipient's browser
//! can rebuild the same range from the same page.

use std::borrow::Cow;

use smol_str::SmolStr;

use crate::config::ParamKeys;
use crate::error::{Error, Result};
use crate::platform::DomTree;
use crate::tree::{locate_text_offset, nearest_identified, point_key, text_in_range, utf16_len};
use crate::types::{AnchorDescriptor, AnchorPair, BoundaryPoint, DomRange};

/// Encoded selection parameters, ready to go into a URL.
///
/// Values are percent-encoded; keys are used verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionParams {
    pairs: Vec<(SmolStr, String)>,
}

impl SelectionParams {
    /// Key/value pairs in the order start id, start offset, end id, end offset.
    pub fn pairs(&self) -> &[(SmolStr, String)] {
        &self.pairs
    }

    /// `key=value` pairs joined with `&`, without a leading `?`.
    pub fn to_query(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Append the parameters to a page URL, keeping any fragment last.
    pub fn append_to_url(&self, url: &str) -> String {
        let (base, fragment) = match url.split_once('#') {
            Some((base, fragment)) => (base, Some(fragment)),
            None => (url, None),
        };
        let separator = if !base.contains('?') {
            "?"
        } else if base.ends_with('?') || base.ends_with('&') {
            ""
        } else {
            "&"
        };

        let mut out = format!("{base}{separator}{}", self.to_query());
        if let Some(fragment) = fragment {
            out.push('#');
            out.push_str(fragment);
        }
        out
    }
}

/// Encodes tracked anchors into parameters and decodes them back into ranges.
#[derive(Debug, Clone, Default)]
pub struct SelectionCodec {
    keys: ParamKeys,
}

impl SelectionCodec {
    pub fn new(keys: ParamKeys) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &ParamKeys {
        &self.keys
    }

    pub fn encode(&self, anchors: &AnchorPair) -> SelectionParams {
        let pairs = vec![
            (
                self.keys.start_id.clone(),
                urlencoding::encode(&anchors.start.element_id).into_owned(),
            ),
            (self.keys.start_offset.clone(), anchors.start.offset.to_string()),
            (
                self.keys.end_id.clone(),
                urlencoding::encode(&anchors.end.element_id).into_owned(),
            ),
            (self.keys.end_offset.clone(), anchors.end.offset.to_string()),
        ];
        SelectionParams { pairs }
    }

    /// Extract anchors from already-decoded key/value pairs.
    ///
    /// Unknown keys are ignored; a repeated key keeps its last value.
    pub fn parse<I, K, V>(&self, pairs: I) -> Result<AnchorPair>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut start_id = None;
        let mut start_offset = None;
        let mut end_id = None;
        let mut end_offset = None;

        for (key, value) in pairs {
            let value = value.as_ref();
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_ref() {
                k if k == self.keys.start_id => &mut start_id,
                k if k == self.keys.start_offset => &mut start_offset,
                k if k == self.keys.end_id => &mut end_id,
                k if k == self.keys.end_offset => &mut end_offset,
                _ => continue,
            };
            *slot = Some(value.to_string());
        }

        let start_id = start_id.ok_or_else(|| Error::MissingParam(self.keys.start_id.clone()))?;
        let start_offset = start_offset
            .ok_or_else(|| Error::MissingParam(self.keys.start_offset.clone()))?;
        let end_id = end_id.ok_or_else(|| Error::MissingParam(self.keys.end_id.clone()))?;
        let end_offset =
            end_offset.ok_or_else(|| Error::MissingParam(self.keys.end_offset.clone()))?;

        Ok(AnchorPair {
            start: AnchorDescriptor::new(
                start_id,
                parse_offset(&self.keys.start_offset, &start_offset)?,
            ),
            end: AnchorDescriptor::new(end_id, parse_offset(&self.keys.end_offset, &end_offset)?),
        })
    }

    /// Extract anchors from a raw query string such as `location.search`.
    ///
    /// The leading `?` is optional. Pairs without `=` are skipped and values
    /// are percent-decoded.
    pub fn parse_query(&self, query: &str) -> Result<AnchorPair> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .filter_map(|(key, value)| {
                urlencoding::decode(value)
                    .ok()
                    .map(Cow::into_owned)
                    .map(|value| (key, value))
            });
        self.parse(pairs)
    }

    /// Rebuild a range from key/value pairs.
    ///
    /// Returns `None` when a parameter is missing or malformed, or when the
    /// anchors no longer resolve in `dom`; recreation is then skipped.
    pub fn decode<D, I, K, V>(&self, dom: &D, pairs: I) -> Option<DomRange<D::Node>>
    where
        D: DomTree,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let result = self.parse(pairs).and_then(|anchors| resolve(dom, &anchors));
        log_decode(result)
    }

    /// Rebuild a range from a raw query string. See [`SelectionCodec::decode`].
    pub fn decode_query<D: DomTree>(&self, dom: &D, query: &str) -> Option<DomRange<D::Node>> {
        let result = self
            .parse_query(query)
            .and_then(|anchors| resolve(dom, &anchors));
        log_decode(result)
    }
}

fn log_decode<N>(result: Result<DomRange<N>>) -> Option<DomRange<N>> {
    match result {
        Ok(range) => Some(range),
        Err(Error::MissingParam(key)) => {
            tracing::trace!(target: "askbox::codec", %key, "no selection to recreate");
            None
        }
        Err(error) => {
            tracing::debug!(target: "askbox::codec", %error, "skipping selection recreation");
            None
        }
    }
}

fn parse_offset(key: &SmolStr, value: &str) -> Result<usize> {
    value.trim().parse().map_err(|_| Error::InvalidOffset {
        key: key.clone(),
        value: value.to_string(),
    })
}

/// Resolve anchors against the current document.
///
/// Both ids must resolve before anything is built, so a failure never
/// produces a partial range. The start must not come after the end.
pub fn resolve<D: DomTree>(dom: &D, anchors: &AnchorPair) -> Result<DomRange<D::Node>> {
    let start_element = dom
        .element_by_id(&anchors.start.element_id)
        .ok_or_else(|| Error::MissingElement(anchors.start.element_id.clone()))?;
    let end_element = dom
        .element_by_id(&anchors.end.element_id)
        .ok_or_else(|| Error::MissingElement(anchors.end.element_id.clone()))?;

    let start = locate_text_offset(dom, &start_element, anchors.start.offset)?;
    let end = locate_text_offset(dom, &end_element, anchors.end.offset)?;
    if point_key(dom, &start) > point_key(dom, &end) {
        return Err(Error::Reversed {
            start: anchors.start.element_id.clone(),
            end: anchors.end.element_id.clone(),
        });
    }
    Ok(DomRange::new(start, end))
}

/// Project a boundary point onto its nearest identified element.
pub fn describe_point<D: DomTree>(
    dom: &D,
    point: &BoundaryPoint<D::Node>,
) -> Result<AnchorDescriptor> {
    let (element, id) = nearest_identified(dom, &point.container).ok_or(Error::Unidentified)?;
    let leading = DomRange::new(BoundaryPoint::new(element, 0), point.clone());
    let offset = utf16_len(&text_in_range(dom, &leading));
    Ok(AnchorDescriptor::new(id, offset))
}

/// Anchor descriptors for both ends of a range.
pub fn describe_range<D: DomTree>(dom: &D, range: &DomRange<D::Node>) -> Result<AnchorPair> {
    Ok(AnchorPair {
        start: describe_point(dom, &range.start)?,
        end: describe_point(dom, &range.end)?,
    })
}
