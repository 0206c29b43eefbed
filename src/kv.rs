//! Parsing of comma separated `key=value` context strings

use std::collections::BTreeMap;

use crate::{Result, SchedulerError};

/// Split `text` on commas, then split every segment on its single `=`.
///
/// An empty (or whitespace-only) string yields an empty mapping. A segment
/// with no `=` or with more than one fails the whole parse. Later duplicate
/// keys overwrite earlier ones.
pub fn parse_kv_string(text: &str) -> Result<BTreeMap<String, String>> {
    let mut pairs = BTreeMap::new();
    if text.trim().is_empty() {
        return Ok(pairs);
    }

    for segment in text.split(',') {
        let mut parts = segment.split('=');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(key), Some(value), None) => {
                pairs.insert(key.to_string(), value.to_string());
            }
            _ => return Err(SchedulerError::MalformedPair(segment.to_string())),
        }
    }
    Ok(pairs)
}
