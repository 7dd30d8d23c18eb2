//! The payload key-value sublanguage.
//!
//! Payloads are opaque strings. The only structure ever read from them is
//! a list of `key=value` pairs separated by `;`, used to recover a topic
//! when an event carries no `topic` tag.

use std::collections::BTreeMap;

/// Parse `key=value` pairs separated by `;`.
///
/// Segments without `=`, or with an empty key or value after trimming,
/// are skipped. A later duplicate key overwrites an earlier one.
pub fn parse_kv(payload: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for segment in payload.split(';') {
        let Some((key, value)) = segment.split_once('=') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        if !key.is_empty() && !value.is_empty() {
            out.insert(key.to_owned(), value.to_owned());
        }
    }
    out
}
