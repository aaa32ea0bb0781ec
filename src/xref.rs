//! Cross-reference extraction from prose.
//!
//! Recognized link forms:
//!
//! - `[[Target]]`, `[[Target label]]`: internal reference by name
//! - `[Label](url)`: external link; `(#name)` anchors are internal references
//! - `<scheme://...>`: autolink, external
//!
//! `<a id="name"></a>` anchors in prose are link targets, not references.
//!
//! Scanning produces a side table of [`CrossReference`]s; the prose is never
//! rewritten. Resolution happens later, against a complete corpus.

use crate::model::{CrossReference, LinkTarget};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static RE_AUTOLINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<([a-zA-Z][a-zA-Z0-9+.-]*://[^\s>]+)>").unwrap());

// `<a id="zlib.options"></a>`
static RE_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a\s+(?:id|name)\s*=\s*"([^"]+)"\s*>\s*</a>"#).unwrap()
});

/// Scan `text` for links. `source` is the fqn of the entity owning the prose.
pub fn scan(source: &str, text: &str) -> Vec<CrossReference> {
    let mut refs = Vec::new();
    let mut i = 0;
    let mut in_code = false;

    while i < text.len() {
        let rest = &text[i..];
        let c = match rest.chars().next() {
            Some(c) => c,
            None => break,
        };

        // Inline code spans are not scanned, except inside `[[...]]` labels
        if c == '`' {
            in_code = !in_code;
            i += 1;
            continue;
        }
        if in_code {
            i += c.len_utf8();
            continue;
        }

        if rest.starts_with("[[") {
            if let Some((target, label, len)) = internal_link(rest) {
                refs.push(CrossReference {
                    source: source.to_string(),
                    target: LinkTarget::Internal(target),
                    label,
                    span: i..i + len,
                    dangling: false,
                });
                i += len;
                continue;
            }
        }

        if c == '[' {
            if let Some((label, url, len)) = markdown_link(rest) {
                let anchor = url
                    .strip_prefix('#')
                    .filter(|a| !a.is_empty())
                    .map(str::to_string);
                let target = match anchor {
                    Some(anchor) => LinkTarget::Internal(anchor),
                    None => LinkTarget::External(url),
                };
                refs.push(CrossReference {
                    source: source.to_string(),
                    target,
                    label: Some(label),
                    span: i..i + len,
                    dangling: false,
                });
                i += len;
                continue;
            }
        }

        if c == '<' {
            if let Some(caps) = RE_AUTOLINK.captures(rest) {
                let len = caps[0].len();
                refs.push(CrossReference {
                    source: source.to_string(),
                    target: LinkTarget::External(caps[1].to_string()),
                    label: None,
                    span: i..i + len,
                    dangling: false,
                });
                i += len;
                continue;
            }
        }

        i += c.len_utf8();
    }

    refs
}

/// `[[Target]]` or `[[Target label]]`. Returns (target, label, byte length).
fn internal_link(text: &str) -> Option<(String, Option<String>, usize)> {
    let body_end = text[2..].find("]]")? + 2;
    let body = &text[2..body_end];
    if body.is_empty() || body.contains(['[', ']', '\n']) {
        return None;
    }
    let body = body.trim();
    let (target, label) = match body.split_once(char::is_whitespace) {
        Some((target, label)) => (target, Some(label.trim().to_string())),
        None => (body, None),
    };
    if target.is_empty() {
        return None;
    }
    Some((target.to_string(), label, body_end + 2))
}

/// `[Label](url)`. Returns (label, url, byte length).
fn markdown_link(text: &str) -> Option<(String, String, usize)> {
    let label_end = text[1..].find(']')? + 1;
    let label = &text[1..label_end];
    if label.contains(['[', '\n']) {
        return None;
    }
    let after = &text[label_end + 1..];
    if !after.starts_with('(') {
        return None;
    }
    let url_end = after.find(')')?;
    let url = after[1..url_end].trim();
    if url.is_empty() || url.contains(char::is_whitespace) {
        return None;
    }
    Some((label.to_string(), url.to_string(), label_end + 1 + url_end + 1))
}

/// Named anchors (`<a id="name"></a>`) in `text`, with their byte spans.
pub fn anchors(text: &str) -> Vec<(String, Range<usize>)> {
    RE_ANCHOR
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some((caps[1].to_string(), whole.range()))
        })
        .collect()
}

/// Rewrite links in `text` using `link` to render each reference.
///
/// `link` receives the reference and returns its replacement markup. Spans not
/// in `refs` are copied through unchanged.
pub fn rewrite(text: &str, refs: &[CrossReference], mut link: impl FnMut(&CrossReference) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut ordered: Vec<&CrossReference> = refs.iter().collect();
    ordered.sort_by_key(|r| r.span.start);
    for r in ordered {
        if r.span.start < last || r.span.end > text.len() {
            continue;
        }
        out.push_str(&text[last..r.span.start]);
        out.push_str(&link(r));
        last = r.span.end;
    }
    out.push_str(&text[last..]);
    out
}

/// Text a reader sees for a reference when no link is rendered.
pub fn display_text(r: &CrossReference) -> String {
    match &r.label {
        Some(label) => label.clone(),
        None => r.target.to_string(),
    }
}
