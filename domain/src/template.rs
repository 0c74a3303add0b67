//! Prompt template rendering.
//!
//! Templates contain `{{name}}` or `{{name|fallback}}` placeholders that are
//! substituted from a variable map in a single left-to-right pass. The pass
//! never re-scans substituted text, so a variable value that itself contains
//! `{{...}}` is emitted literally rather than expanded — callers that forward
//! rendered text to another templating layer should neutralize residual
//! braces with [`neutralize_braces`].

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

/// `{{ key }}` or `{{ key | fallback }}`. The key excludes `}` and `|`,
/// the fallback excludes `}`.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^}|]*)(?:\|([^}]*))?\}\}").expect("valid pattern"));

/// A `{{...}}` occurrence of any shape, including across newlines.
static RESIDUAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{\{.*?\}\}").expect("valid pattern"));

/// Substitute placeholders in `template` from `vars`.
///
/// Lookup keys and fallbacks are trimmed. A placeholder whose key is absent
/// and that carries no fallback collapses to the empty string; this is
/// documented behavior, not an error. Substitution is single-pass: the
/// replacement text is never re-scanned.
pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let key = caps[1].trim();
            match vars.get(key) {
                Some(value) => value.clone(),
                None => caps
                    .get(2)
                    .map(|fallback| fallback.as_str().trim().to_string())
                    .unwrap_or_default(),
            }
        })
        .into_owned()
}

/// True if `text` still contains a `{{...}}` pattern.
///
/// Used on the *output* of rendering: a resolved variable's value may itself
/// carry literal double-brace text that a downstream templating layer would
/// misinterpret.
pub fn contains_placeholder(text: &str) -> bool {
    RESIDUAL.is_match(text)
}

/// Break every `{{` and `}}` pair by inserting a zero-width space between
/// the braces.
///
/// The marker is invisible to a human reader and to the model, but prevents
/// a downstream prompt-templating layer from treating the text as its own
/// template syntax. One-way; applied only when residual braces are detected.
pub fn neutralize_braces(text: &str) -> String {
    text.replace("{{", "{\u{200B}{").replace("}}", "}\u{200B}}")
}
