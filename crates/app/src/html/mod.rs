//! Embedded static assets served by the web UI.
//!
//! HTML pages are kept as `&'static str` so they can be bundled directly
//! inside the binary without filesystem lookups; the client-side script is a
//! real file under `static/` pulled in at build time.

mod client;
mod index;

pub(crate) use client::CLIENT_HTML;
pub(crate) use index::INDEX_HTML;

/// Browser-side pipeline: camera capture, in-browser detection, canvas
/// rendering, and the same finger-counting rule.
pub(crate) const CLIENT_SIDE_JS: &str =
    include_str!("../../static/js/client_side_implementation.js");
