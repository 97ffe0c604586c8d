//! Collection naming: default logical names and versioned physical names.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Local, NaiveDate};
use uuid::Uuid;

/// Convert a mixed or camel case type name into lowercase underscore form.
///
/// A run of capitals is kept together as one word, with its last capital
/// starting the next word when a lowercase letter follows:
///
/// ```rust
/// use tsense_client::naming::underscore;
///
/// assert_eq!(underscore("MyCoolModel"), "my_cool_model");
/// assert_eq!(underscore("HTTPServer"), "http_server");
/// assert_eq!(underscore("Model2Thing"), "model2_thing");
/// ```
pub fn underscore(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut pending: Option<char> = None;
    let mut in_run = false;

    for ch in name.chars() {
        if ch.is_uppercase() {
            if let Some(prev) = pending {
                if !in_run {
                    push_separator(&mut out);
                    in_run = true;
                }
                out.push(prev);
            }
            pending = Some(lower(ch));
        } else {
            if let Some(prev) = pending.take() {
                push_separator(&mut out);
                out.push(prev);
                in_run = false;
            }
            out.push(ch);
        }
    }

    if let Some(prev) = pending {
        if !in_run {
            push_separator(&mut out);
        }
        out.push(prev);
    }

    out
}

fn push_separator(out: &mut String) {
    if !out.is_empty() {
        out.push('_');
    }
}

fn lower(ch: char) -> char {
    ch.to_lowercase().next().unwrap_or(ch)
}

/// Versioned physical name for `logical`, stamped with today's local date.
///
/// Format: `<logical>_<YYYY-MM-DD>_<token>`.
pub fn version_collection_name(logical: &str) -> String {
    versioned_name_on(logical, Local::now().date_naive())
}

/// Versioned physical name for `logical` created on `date`.
pub fn versioned_name_on(logical: &str, date: NaiveDate) -> String {
    format!("{}_{}_{}", logical, date.format("%Y-%m-%d"), short_id())
}

/// URL-safe random token, 22 characters, distinct per call.
pub fn short_id() -> String {
    URL_SAFE_NO_PAD.encode(Uuid::new_v4().as_bytes())
}
