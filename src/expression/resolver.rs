// Identifier Resolution
// Dotted-path lookups against the six-scope context

use serde_json::Value as Json;

use crate::context::{Context, Scope};
use crate::expression::value::Value;

/// Resolve a dot-separated identifier path against the normalized
/// context.
///
/// Paths rooted at `appEnv` or `processEnv` read the hosting process's
/// environment, so their result depends on out-of-band process state
/// rather than on the context argument alone. Every dead end (unknown
/// root, missing key, descent into a non-container) yields
/// [`Value::Undefined`], never an error.
pub fn resolve(path: &str, ctx: &Context) -> Value {
    let mut segments = path.split('.');
    let root = segments.next().unwrap_or("");
    let rest: Vec<&str> = segments.collect();

    if root == "appEnv" || root == "processEnv" {
        if rest.is_empty() {
            return Value::Undefined;
        }
        return match process_env(&rest.join(".")) {
            Some(v) => Value::String(v),
            None => Value::Undefined,
        };
    }

    let Some(scope) = ctx.scope(root) else {
        // Unknown roots fall back to a bare case-insensitive lookup in
        // `envs`; a trailing path after such a root never resolves.
        if rest.is_empty() {
            if let Some(v) = map_get(&ctx.envs, root, true) {
                return Value::from_json(v);
            }
        }
        return Value::Undefined;
    };

    // Only the envs scope tolerates case-insensitive segments.
    let case_insensitive = root == "envs";

    if rest.is_empty() {
        return Value::Structured(Json::Object(scope.clone()));
    }

    let mut current = match map_get(scope, rest[0], case_insensitive) {
        Some(v) => v,
        None => return Value::Undefined,
    };

    for (i, seg) in rest.iter().enumerate().skip(1) {
        if current.is_null() {
            return Value::Undefined;
        }
        current = match current {
            Json::Object(map) => match map_get(map, seg, case_insensitive) {
                Some(v) => v,
                None => return Value::Undefined,
            },
            Json::Array(items) => {
                if *seg == "length" {
                    return if i + 1 == rest.len() {
                        Value::Number(items.len() as f64)
                    } else {
                        Value::Undefined
                    };
                }
                match array_index(seg).and_then(|idx| items.get(idx)) {
                    Some(v) => v,
                    None => return Value::Undefined,
                }
            }
            _ => return Value::Undefined,
        };
    }

    Value::from_json(current)
}

/// Read an environment variable trying the exact spelling, then
/// upper-case, then lower-case.
fn process_env(key: &str) -> Option<String> {
    std::env::var(key)
        .or_else(|_| std::env::var(key.to_uppercase()))
        .or_else(|_| std::env::var(key.to_lowercase()))
        .ok()
}

fn map_get<'a>(map: &'a Scope, key: &str, case_insensitive: bool) -> Option<&'a Json> {
    if let Some(v) = map.get(key) {
        return Some(v);
    }
    if case_insensitive {
        if let Some(v) = map.get(&key.to_uppercase()) {
            return Some(v);
        }
        if let Some(v) = map.get(&key.to_lowercase()) {
            return Some(v);
        }
    }
    None
}

/// Array segments are plain decimal indices; leading zeros and signs
/// are not indices.
fn array_index(seg: &str) -> Option<usize> {
    if seg.is_empty() || !seg.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if seg != "0" && seg.starts_with('0') {
        return None;
    }
    seg.parse::<usize>().ok()
}
