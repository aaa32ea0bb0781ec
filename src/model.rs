//! Data model for parsed documentation, independent of output format.

use serde::Serialize;
use std::fmt;
use std::ops::Range;
use std::path::PathBuf;

/// What kind of API element an entity documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Module,
    Class,
    Method,
    Constructor,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Module => "module",
            EntityKind::Class => "class",
            EntityKind::Method => "method",
            EntityKind::Constructor => "constructor",
        }
    }
}

/// Member separator: `recv.name` is static, `recv#name` is an instance member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberScope {
    #[default]
    Static,
    Instance,
}

impl MemberScope {
    pub fn separator(self) -> char {
        match self {
            MemberScope::Static => '.',
            MemberScope::Instance => '#',
        }
    }
}

/// Free-text type annotation. Never validated against a type system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TypeRef(pub String);

impl TypeRef {
    pub fn new(text: impl Into<String>) -> Self {
        TypeRef(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One parameter of a signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    pub name: String,
    /// From the `- name (Type): ...` bullet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<TypeRef>,
    pub optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Callback arguments, e.g. `error` and `result` in `callback(error, result)`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<ParamSpec>,
    /// Source bracket layout, kept only when it is not the canonical one
    #[serde(skip)]
    pub brackets: Option<Brackets>,
}

/// How a parameter sits inside `[...]` optional groups in a signature.
///
/// `f(a, [b])` gives `b` one opening bracket with the comma outside it;
/// `f(a[, b])` puts the comma inside. `close` counts the `]` right after the
/// parameter, so `f([a, b])` is `a` opening one group and `b` closing it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Brackets {
    pub open: usize,
    pub close: usize,
    /// The separating comma follows the opening brackets
    pub comma_inside: bool,
}

impl Brackets {
    /// Canonical layout: `[p]` first, `[, p]` after, nothing for required ones.
    pub fn canonical(optional: bool, first: bool) -> Self {
        if optional {
            Brackets {
                open: 1,
                close: 1,
                comma_inside: !first,
            }
        } else {
            Brackets::default()
        }
    }
}

impl ParamSpec {
    pub fn required(name: impl Into<String>) -> Self {
        ParamSpec {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        ParamSpec {
            name: name.into(),
            optional: true,
            ..Default::default()
        }
    }

    /// Depth-first search for a parameter (or callback argument) by name.
    pub fn find_mut<'a>(params: &'a mut [ParamSpec], name: &str) -> Option<&'a mut ParamSpec> {
        for param in params.iter_mut() {
            if param.name == name {
                return Some(param);
            }
            if let Some(found) = ParamSpec::find_mut(&mut param.arguments, name) {
                return Some(found);
            }
        }
        None
    }
}

/// Where a link points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum LinkTarget {
    /// A name expected to exist in the corpus
    Internal(String),
    /// A URL outside the corpus
    External(String),
}

impl fmt::Display for LinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkTarget::Internal(name) => f.write_str(name),
            LinkTarget::External(url) => f.write_str(url),
        }
    }
}

/// A link found in an entity's prose. The prose itself is never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossReference {
    /// fqn of the entity whose prose holds the link
    pub source: String,
    pub target: LinkTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Byte range of the link markup within the entity description
    pub span: Range<usize>,
    pub dangling: bool,
}

impl CrossReference {
    pub fn is_internal(&self) -> bool {
        matches!(self.target, LinkTarget::Internal(_))
    }
}

/// File and line of the declaring line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// A single documented API element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocEntity {
    pub kind: EntityKind,
    pub name: String,
    pub fqn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub scope: MemberScope,
    /// First prose paragraph
    pub summary: String,
    /// Complete prose, markdown preserved
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParamSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returns: Option<TypeRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<CrossReference>,
    /// Ids of `<a id="...">` anchors in the prose; references may target them
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub anchors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    /// Created by the assembler to hold members, not declared in the source
    pub synthetic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceLocation>,
}

impl DocEntity {
    pub fn new(kind: EntityKind, name: impl Into<String>, fqn: impl Into<String>) -> Self {
        DocEntity {
            kind,
            name: name.into(),
            fqn: fqn.into(),
            parent: None,
            scope: MemberScope::Static,
            summary: String::new(),
            description: String::new(),
            parameters: Vec::new(),
            returns: None,
            examples: Vec::new(),
            references: Vec::new(),
            anchors: Vec::new(),
            section: None,
            superclass: None,
            synthetic: false,
            source: None,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, EntityKind::Method | EntityKind::Constructor)
    }

    /// Where the entity came from, for warnings: `file:line`, else its fqn.
    pub fn origin(&self) -> String {
        match &self.source {
            Some(loc) => loc.to_string(),
            None => self.fqn.clone(),
        }
    }
}

/// Split `a.b#c` into (`Some("a.b")`, `"c"`).
pub fn split_path(fqn: &str) -> (Option<&str>, &str) {
    match fqn.rsplit_once(['.', '#']) {
        Some((parent, name)) if !parent.is_empty() => (Some(parent), name),
        _ => (None, fqn),
    }
}

/// Join a member name onto its owning scope.
pub fn member_fqn(parent: &str, scope: MemberScope, name: &str) -> String {
    format!("{}{}{}", parent, scope.separator(), name)
}

/// Constructors live at `Class.new`.
pub fn constructor_fqn(class: &str) -> String {
    format!("{}.new", class)
}
