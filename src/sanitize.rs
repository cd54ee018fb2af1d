//! Untrusted text sanitation
//!
//! Bounds and strips user-supplied text before it is embedded in connection
//! metadata, stored as a room MOTD, or handed to a command handler.
//! Truncation happens before tag stripping so the work done on a pathological
//! input is bounded by the field limit.

use regex::Regex;
use std::sync::OnceLock;

/// Maximum length of a participant username, in characters
pub const MAX_USERNAME_LEN: usize = 32;

/// Maximum length of a room MOTD, in characters
pub const MAX_MOTD_LEN: usize = 256;

/// Maximum length of a command argument string, in characters
pub const MAX_ARGS_LEN: usize = 1024;

/// Markup subset permitted in a MOTD
pub const MOTD_TAGS: &[&str] = &["b", "i"];

/// Matches a complete markup run, from a `<` to the nearest following `>`
fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

/// Truncate `text` to `max_len` characters, then remove every markup run
/// whose tag is not in `allowed_tags`.
///
/// Only bare `<name>` / `</name>` runs can pass the allow-list; anything
/// carrying attributes is removed. The result never exceeds `max_len`
/// characters and may be empty — callers treat empty-after-sanitization as
/// invalid for required fields, which is not the same as the field being
/// absent.
pub fn clean(text: &str, max_len: usize, allowed_tags: &[&str]) -> String {
    let bounded: String = text.chars().take(max_len).collect();
    tag_pattern()
        .replace_all(&bounded, |caps: &regex::Captures<'_>| {
            let run = &caps[0];
            if is_allowed_tag(run, allowed_tags) {
                run.to_string()
            } else {
                String::new()
            }
        })
        .into_owned()
}

/// Username profile: bounded to [`MAX_USERNAME_LEN`], markup-free, with
/// literal `%` and `/` removed before the name travels further downstream.
pub fn clean_username(text: &str) -> String {
    clean(text, MAX_USERNAME_LEN, &[]).replace(['%', '/'], "")
}

fn is_allowed_tag(run: &str, allowed: &[&str]) -> bool {
    // `run` is "<...>" as matched; both brackets are single-byte ASCII
    let inner = &run[1..run.len() - 1];
    let name = inner.strip_prefix('/').unwrap_or(inner);
    !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric())
        && allowed.iter().any(|t| t.eq_ignore_ascii_case(name))
}
