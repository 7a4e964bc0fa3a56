//! Two-pass handling of a submitted signature: every rule is checked against
//! the raw form first, and only an accepted form is trimmed, escaped and
//! normalized. Error messages therefore always describe what the visitor typed.

use std::sync::LazyLock;

use petition_types::api::SignatureForm;
use petition_types::models::NewSignature;
use regex::Regex;
use thiserror::Error;

pub const NAME_MAX_CHARS: usize = 128;

pub const NAME_EMPTY: &str = "Nafn má ekki vera tómt";
pub const NAME_TOO_LONG: &str = "Nafn er of langt";
pub const NATIONAL_ID_EMPTY: &str = "Kennitala má ekki vera tóm";
pub const NATIONAL_ID_FORMAT: &str = "Kennitala verður að vera á formi 000000-0000 eða 0000000000";

static NATIONAL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{6}-?[0-9]{4}$").expect("national id pattern compiles"));

/// Every rule the raw form broke, in form order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .messages.join(", "))]
pub struct ValidationFailure {
    pub messages: Vec<String>,
}

/// Validate, then sanitize. Nothing is normalized unless every rule passed.
pub fn validate(form: &SignatureForm) -> Result<NewSignature, ValidationFailure> {
    let messages = check(form);
    if !messages.is_empty() {
        return Err(ValidationFailure { messages });
    }

    let clean = sanitize(form);

    // Second pass right before the row is written.
    Ok(NewSignature {
        name: neutralize(&clean.name),
        national_id: neutralize(&clean.national_id),
        comment: neutralize(&clean.comment),
        anonymous: clean.anonymous,
    })
}

/// Run all rules over the untouched input. Never stops at the first failure.
pub fn check(form: &SignatureForm) -> Vec<String> {
    let mut messages = Vec::new();

    let name_len = form.name.chars().count();
    if name_len < 1 {
        messages.push(NAME_EMPTY.to_string());
    }
    if name_len > NAME_MAX_CHARS {
        messages.push(NAME_TOO_LONG.to_string());
    }

    if form.national_id.is_empty() {
        messages.push(NATIONAL_ID_EMPTY.to_string());
    }
    if !is_national_id(&form.national_id) {
        messages.push(NATIONAL_ID_FORMAT.to_string());
    }

    messages
}

pub fn is_national_id(raw: &str) -> bool {
    NATIONAL_ID.is_match(raw)
}

fn sanitize(form: &SignatureForm) -> NewSignature {
    NewSignature {
        name: escape(form.name.trim()),
        national_id: form.national_id.replace('-', ""),
        comment: escape(form.text.trim()),
        anonymous: is_checked(form.check.as_deref()),
    }
}

/// A checkbox counts only when the browser sent exactly `on`.
pub fn is_checked(value: Option<&str>) -> bool {
    value == Some("on")
}

/// Entity-encode the characters that can open markup or break out of an
/// attribute.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '/' => out.push_str("&#x2F;"),
            '\\' => out.push_str("&#x5C;"),
            '`' => out.push_str("&#96;"),
            _ => out.push(c),
        }
    }
    out
}

/// Encode any tag delimiters still present. Leaves existing entities alone,
/// so running it over escaped text changes nothing.
pub fn neutralize(input: &str) -> String {
    if !input.contains(['<', '>']) {
        return input.to_string();
    }
    input.replace('<', "&lt;").replace('>', "&gt;")
}
