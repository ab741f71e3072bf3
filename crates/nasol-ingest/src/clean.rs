//! Text cleanup applied to raw search results.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);").expect("valid regex")
});
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Removes every `<...>` tag, keeping the text between them.
#[must_use]
pub fn strip_html(text: &str) -> String {
    TAG_RE.replace_all(text, "").into_owned()
}

/// Decodes HTML entities in a single pass, so `&amp;lt;` becomes `&lt;`
/// rather than `<`. Unknown entities are left untouched.
#[must_use]
pub fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let body = &caps[1];
            decode_entity(body).map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn decode_entity(body: &str) -> Option<char> {
    if let Some(num) = body.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }

    match body {
        "quot" => Some('"'),
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => None,
    }
}

/// Strips tags, then decodes entities, then trims.
#[must_use]
pub fn clean_text(raw: &str) -> String {
    decode_entities(&strip_html(raw)).trim().to_string()
}

/// Cuts `text` to at most `max_chars` characters (not bytes).
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Lower-cases and collapses runs of whitespace into single spaces.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    WHITESPACE_RE
        .replace_all(text.trim(), " ")
        .to_lowercase()
}

/// Derives the short source name from an article URL: the host without a
/// leading `www.`, cut at the first dot.
#[must_use]
pub fn extract_source(url: &str) -> String {
    let Ok(parsed) = reqwest::Url::parse(url) else {
        return "unknown".to_string();
    };
    let Some(host) = parsed.host_str() else {
        return "unknown".to_string();
    };
    let host = host.strip_prefix("www.").unwrap_or(host);
    match host.split('.').next() {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => "unknown".to_string(),
    }
}
