//! Embedded blob extraction
//!
//! Saved pages from this source carry their analytics payload as a JSON
//! object literal assigned to `window.__APP_DATA__` inside a script tag.
//! The extractor walks script nodes in document order, anchors on the
//! sentinel, and parses the assigned literal.
//!
//! Every failure mode is per-document: one malformed page must never abort a
//! multi-hundred-file batch, so failures log and return `None`.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::path::Path;
use tracing::{error, warn};

/// Identifier the payload is assigned to in the page's script.
pub const SENTINEL: &str = "window.__APP_DATA__";

static APP_DATA_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)window\.__APP_DATA__\s*=\s*(\{.*\})").unwrap()
});

static SCRIPT_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("script").unwrap()
});

/// Extract the app-data blob from raw HTML.
///
/// `source` only labels log lines (file path or test name). Returns `None`
/// when no script node carries the sentinel, or when the first sentinel node
/// does not hold a parseable object literal.
pub fn extract_document(html: &str, source: &str) -> Option<Value> {
    let document = Html::parse_document(html);

    for node in document.select(&SCRIPT_SELECTOR) {
        let text: String = node.text().collect();
        if !text.contains(SENTINEL) {
            continue;
        }

        // First sentinel-bearing node wins; anything wrong with it is an
        // extraction error for this document, not a reason to keep scanning.
        let Some(captures) = APP_DATA_REGEX.captures(&text) else {
            error!(source, "sentinel present but no object literal found");
            return None;
        };

        return match serde_json::from_str::<Value>(&captures[1]) {
            Ok(value) => Some(value),
            Err(e) => {
                error!(source, error = %e, "failed to parse embedded JSON literal");
                None
            }
        };
    }

    warn!(source, "no {} found", SENTINEL);
    None
}

/// Extract the app-data blob from an HTML file on disk.
///
/// An unreadable or undecodable file is an error for this document only.
pub fn extract_file(path: &Path) -> Option<Value> {
    let source = path.display().to_string();

    match std::fs::read_to_string(path) {
        Ok(html) => extract_document(&html, &source),
        Err(e) => {
            error!(source = %source, error = %e, "error reading input file");
            None
        }
    }
}
