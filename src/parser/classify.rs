//! Line classification, rule-based and biased toward prose.
//!
//! Declarations (`section:`, `class`, signatures) are only recognized before
//! the first prose line of a block. Bullets only count as parameters when they
//! directly follow a signature or another parameter bullet.

use super::tokenizer::Line;
use regex::Regex;
use std::sync::LazyLock;

// -- Regex patterns -----------------------------------------------------------

static RE_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^section:\s*(\S.*)$").unwrap());

static RE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^class\s+([A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*)(?:\s*<\s*([A-Za-z_$][\w$.]*))?$")
        .unwrap()
});

// Optional `new`, an identifier path, then `(`
static RE_SIGNATURE_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:new\s+)?[A-Za-z_$][\w$]*(?:[.#][A-Za-z_$][\w$]*)*\s*\(").unwrap()
});

static RE_BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-\s+\S").unwrap());

/// Kind of a logical comment line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    ClassHeader,
    SectionHeader,
    SignatureLine,
    ParamBullet,
    /// Indented line wrapping the description of the bullet above it
    BulletContinuation,
    Prose,
}

/// A line together with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified<'a> {
    pub kind: LineKind,
    pub line: Line<'a>,
}

/// Parsed `class Name < Parent` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassHeader<'a> {
    pub path: &'a str,
    pub superclass: Option<&'a str>,
}

/// Classify every line of one block.
pub fn classify<'a>(lines: impl IntoIterator<Item = Line<'a>>) -> Vec<Classified<'a>> {
    let mut out: Vec<Classified<'a>> = Vec::new();
    let mut seen_prose = false;
    let mut bullet_indent = 0;

    for line in lines {
        let previous = out.last().map(|c| (c.kind, c.line.is_blank()));
        let after_bullet = matches!(
            previous,
            Some((LineKind::ParamBullet | LineKind::BulletContinuation, false))
        );
        let kind = if line.is_blank() {
            LineKind::Prose
        } else if seen_prose {
            LineKind::Prose
        } else if after_bullet && line.indent > bullet_indent && !RE_BULLET.is_match(line.text) {
            LineKind::BulletContinuation
        } else if RE_SECTION.is_match(line.text) {
            LineKind::SectionHeader
        } else if RE_CLASS.is_match(line.text) {
            LineKind::ClassHeader
        } else if is_signature(line.text) {
            LineKind::SignatureLine
        } else if RE_BULLET.is_match(line.text)
            && matches!(
                previous,
                Some((
                    LineKind::SignatureLine | LineKind::ParamBullet | LineKind::BulletContinuation,
                    false
                ))
            )
        {
            LineKind::ParamBullet
        } else {
            LineKind::Prose
        };

        match kind {
            LineKind::Prose if !line.is_blank() => seen_prose = true,
            LineKind::ParamBullet => bullet_indent = line.indent,
            _ => {}
        }
        out.push(Classified { kind, line });
    }
    out
}

/// Signature-shaped: identifier path and `(`, closed by `)` or carrying `->`.
/// Balance is left to the signature parser.
pub fn is_signature(text: &str) -> bool {
    RE_SIGNATURE_HEAD.is_match(text) && (text.ends_with(')') || text.contains("->"))
}

/// Name of a `section:` header line.
pub fn section_name(text: &str) -> Option<&str> {
    RE_SECTION
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// Parse a `class` header line.
pub fn class_header(text: &str) -> Option<ClassHeader<'_>> {
    let caps = RE_CLASS.captures(text)?;
    Some(ClassHeader {
        path: caps.get(1)?.as_str(),
        superclass: caps.get(2).map(|m| m.as_str()),
    })
}
