//! Renderers: trait-based format dispatch.
//!
//! Every renderer turns one page (a root entity and its members) into text.
//! Cross-references are resolved here, against the finished corpus.

pub mod html;
pub mod json;
pub mod markdown;

use crate::corpus::Corpus;
use crate::model::{CrossReference, DocEntity, LinkTarget};
use anyhow::{anyhow, Result};

/// Trait for rendering corpus pages into a specific output format.
pub trait Renderer {
    /// Render the page of one top-level entity.
    fn render(&self, corpus: &Corpus, root: &DocEntity) -> Result<String>;

    /// Render the list of pages, grouped by section.
    fn render_index(&self, corpus: &Corpus) -> Result<String>;

    fn file_extension(&self) -> &str;

    /// All pages in one stream, for stdout.
    fn render_all(&self, corpus: &Corpus) -> Result<String> {
        let pages = corpus
            .roots()
            .into_iter()
            .map(|root| self.render(corpus, root))
            .collect::<Result<Vec<_>>>()?;
        Ok(pages.join("\n"))
    }
}

/// Create a renderer for the given format name.
pub fn create_renderer(format: &str) -> Result<Box<dyn Renderer>> {
    match format {
        "markdown" | "md" => Ok(Box::new(markdown::MarkdownRenderer)),
        "html" => Ok(Box::new(html::HtmlRenderer)),
        "json" => Ok(Box::new(json::JsonRenderer)),
        _ => Err(anyhow!(
            "unknown format: {}. Use markdown, html, or json",
            format
        )),
    }
}

/// File name (without extension) of the page holding `root`.
pub fn page_name(root: &DocEntity) -> String {
    root.fqn
        .chars()
        .map(|c| match c {
            '/' | '\\' | '#' | ':' => '-',
            c => c,
        })
        .collect()
}

/// Roots grouped by section, in first-seen order. Unsectioned roots come last
/// under `None`.
pub fn sections(corpus: &Corpus) -> Vec<(Option<&str>, Vec<&DocEntity>)> {
    let mut groups: Vec<(Option<&str>, Vec<&DocEntity>)> = Vec::new();
    for root in corpus.roots() {
        let section = root.section.as_deref();
        match groups.iter_mut().find(|(s, _)| *s == section) {
            Some((_, members)) => members.push(root),
            None => groups.push((section, vec![root])),
        }
    }
    groups.sort_by_key(|(s, _)| s.is_none());
    groups
}

/// What a resolved reference lands on within its page.
pub(crate) enum Fragment<'c> {
    Entity(&'c DocEntity),
    /// A `<a id>` anchor in some entity's prose
    Anchor(&'c str),
}

/// Resolve a reference to its target page root and fragment.
pub(crate) fn link_target<'c>(
    corpus: &'c Corpus,
    r: &CrossReference,
) -> Option<(&'c DocEntity, Fragment<'c>)> {
    let target = corpus.resolve(r)?;
    let root = corpus.root_of(&target.fqn)?;
    let LinkTarget::Internal(name) = &r.target else {
        return None;
    };
    if target.fqn != *name {
        if let Some(anchor) = target.anchors.iter().find(|a| *a == name) {
            return Some((root, Fragment::Anchor(anchor)));
        }
    }
    Some((root, Fragment::Entity(target)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build_sources;
    use std::path::PathBuf;

    #[test]
    fn unknown_format_is_an_error() {
        let err = create_renderer("pdf").err().unwrap();
        assert!(err.to_string().contains("unknown format: pdf"));
        assert_eq!(create_renderer("md").unwrap().file_extension(), "md");
    }

    #[test]
    fn sections_keep_unsectioned_last() {
        let build = build_sources(&[
            (PathBuf::from("a.js"), "/**\n * class tty\n **/".to_string()),
            (
                PathBuf::from("b.js"),
                "/** section: Errors\n * class ReferenceError\n **/".to_string(),
            ),
        ]);
        let groups = sections(&build.corpus);
        assert_eq!(groups[0].0, Some("Errors"));
        assert_eq!(groups[1].0, None);
        assert_eq!(groups[1].1[0].fqn, "tty");
    }

    #[test]
    fn page_names_are_file_safe() {
        let root = DocEntity::new(crate::model::EntityKind::Module, "a", "a/b#c");
        assert_eq!(page_name(&root), "a-b-c");
    }
}
