//! Small predicates shared by the router and the message channel.

use serde_json::{Map, Value};
use url::Url;

/// Second-level labels whose sites the scraper is meant to visit.
const ACCEPTED_SITES: &[&str] = &["instagram", "youtube"];

/// True when `value` parses as an absolute `http://` or `https://` URL.
pub fn is_http_website(value: &str) -> bool {
    Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false)
}

/// True when the host of `value` is `instagram.<tld>` or `youtube.<tld>`, on any subdomain.
pub fn is_accepted_domain(value: &str) -> bool {
    let Ok(url) = Url::parse(value) else {
        return false;
    };
    let Some(host) = url.host_str() else {
        return false;
    };
    let labels: Vec<&str> = host.split('.').collect();
    // The site label must be followed by at least one more label.
    labels[..labels.len().saturating_sub(1)]
        .iter()
        .any(|label| ACCEPTED_SITES.iter().any(|site| label.eq_ignore_ascii_case(site)))
}

/// Null, empty strings and empty arrays count as empty; everything else does not.
pub fn is_non_empty(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

/// Resolves a dotted path such as `data.reel_qty` inside `root`.
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(root, |current, segment| current.as_object()?.get(segment))
}

/// True when `path` resolves to a non-empty value.
pub fn is_valid_key(root: &Value, path: &str) -> bool {
    lookup(root, path).map(is_non_empty).unwrap_or(false)
}

/// Copies the entries of `source` whose names are in `allowed`.
///
/// Keys missing from `source` are skipped; a non-object `source` yields an empty map.
pub fn filter_keys(source: &Value, allowed: &[&str]) -> Map<String, Value> {
    let Some(object) = source.as_object() else {
        return Map::new();
    };
    allowed
        .iter()
        .filter_map(|key| object.get(*key).map(|value| ((*key).to_string(), value.clone())))
        .collect()
}
