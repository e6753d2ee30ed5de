//! Tolerant extraction from free-form model output
//!
//! Models wrap JSON in commentary and code fences, or ignore the format
//! entirely. These helpers recover what they can.

use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::LazyLock;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"'`\)\]\}]+"#).unwrap());

/// Characters that end sentences or markdown rather than URLs
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '*', '_'];

/// Replies longer than this are only scanned up to this offset
const MAX_SCAN_BYTES: usize = 256 * 1024;

/// Parse the first well-formed JSON object or array embedded in `text`
pub fn extract_json(text: &str) -> Option<Value> {
    json_values(text).next()
}

/// Every well-formed JSON object or array embedded in `text`, in order of
/// appearance.
///
/// The whole text is tried first. Otherwise each balanced `{...}` / `[...]`
/// span is tried in order of its opening bracket; spans inside a value that
/// already parsed are skipped, spans inside one that did not are still tried.
pub fn json_values(text: &str) -> impl Iterator<Item = Value> + '_ {
    let whole = serde_json::from_str::<Value>(text.trim())
        .ok()
        .filter(|v| v.is_object() || v.is_array());
    let spans = if whole.is_some() {
        Vec::new()
    } else {
        balanced_spans(text)
    };

    let mut accepted_end = 0;
    whole
        .into_iter()
        .chain(spans.into_iter().filter_map(move |(start, end)| {
            if start < accepted_end {
                return None;
            }
            let value = serde_json::from_str::<Value>(&text[start..end]).ok()?;
            accepted_end = end;
            Some(value)
        }))
}

/// Byte ranges of every balanced bracket pair, sorted by start, found in a
/// single pass. Quotes only open strings inside brackets, so apostrophes and
/// quotes in surrounding prose do not derail the scan.
fn balanced_spans(text: &str) -> Vec<(usize, usize)> {
    let mut open: Vec<(usize, char)> = Vec::new();
    let mut spans = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text.char_indices() {
        if offset >= MAX_SCAN_BYTES {
            break;
        }

        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' if !open.is_empty() => in_string = true,
            '{' | '[' => open.push((offset, c)),
            '}' | ']' => {
                let opener = if c == '}' { '{' } else { '[' };
                match open.pop() {
                    Some((start, found)) if found == opener => spans.push((start, offset + 1)),
                    // Mismatched closer: nothing open so far can balance
                    Some(_) => open.clear(),
                    None => {}
                }
            }
            _ => {}
        }
    }

    spans.sort_unstable_by_key(|&(start, _)| start);
    spans
}

/// Every distinct http(s) URL in `text`, in order of first appearance
pub fn harvest_urls(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();

    URL_RE
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(TRAILING_PUNCTUATION).to_string())
        .filter(|url| url.len() > "https://".len())
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Hostname of `url` without a leading `www.`
pub fn host_of(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_ascii_lowercase())
}
