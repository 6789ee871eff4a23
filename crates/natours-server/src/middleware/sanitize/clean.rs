//! Value cleaning rules shared by body, query and path sanitization.

use serde_json::{Map, Value};
use url::form_urlencoded;

/// Whether a key could smuggle a query operator into a filter.
///
/// Bracketed query keys are checked per segment, so `price[$gte]` counts as
/// an operator key while `price[gte]` does not.
pub fn is_operator_key(key: &str) -> bool {
    key.contains('.')
        || key
            .split(['[', ']'])
            .any(|segment| segment.starts_with('$'))
}

/// Escape angle brackets so markup in user input is inert.
pub fn escape_markup(input: &str) -> String {
    if !input.contains(['<', '>']) {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Recursively drop operator keys and escape every string.
pub fn clean_value(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| !is_operator_key(key))
                .map(|(key, value)| (key, clean_value(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(clean_value).collect()),
        Value::String(s) => Value::String(escape_markup(&s)),
        other => other,
    }
}

/// Clean one route parameter value: leading `$` removed, markup escaped.
pub fn clean_path_value(raw: &str) -> String {
    escape_markup(raw.trim_start_matches('$'))
}

/// Clean a raw query string: operator keys dropped, values escaped.
pub fn clean_query(query: &str) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if !is_operator_key(&key) {
            serializer.append_pair(&key, &escape_markup(&value));
        }
    }
    serializer.finish()
}

/// Decode a form body into a JSON object. Repeated keys become arrays.
pub fn form_to_json(body: &[u8]) -> Value {
    let mut map = Map::new();
    for (key, value) in form_urlencoded::parse(body) {
        let value = Value::String(value.into_owned());
        match map.get_mut(key.as_ref()) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key.into_owned(), value);
            }
        }
    }
    Value::Object(map)
}
