//! GitHub-flavored markdown anchors and index links.

use crate::corpus::Corpus;
use crate::model::DocEntity;
use std::collections::HashMap;

/// Heading text of the per-page index.
pub const INDEX_HEADING: &str = "Index";

/// GitHub heading anchor slug.
///
/// - lowercase
/// - drop everything except alphanumerics, spaces and hyphens
/// - replace spaces with hyphens
pub fn github_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() || c == ' ' || c == '-' {
            slug.push(c);
        }
        // '.', '#', '_' and punctuation are stripped
    }
    slug.replace(' ', "-")
}

/// Hands out slugs for a page's headings in order, suffixing repeats the way
/// GitHub does: `zlibgzip`, `zlibgzip-1`, ...
#[derive(Debug, Default)]
pub struct Anchors {
    seen: HashMap<String, usize>,
}

impl Anchors {
    pub fn next(&mut self, heading: &str) -> String {
        let slug = github_slug(heading);
        let count = self.seen.entry(slug.clone()).or_insert(0);
        let anchor = if *count == 0 {
            slug
        } else {
            format!("{}-{}", slug, count)
        };
        *count += 1;
        anchor
    }
}

/// Anchor of every entity heading on the page rooted at `root`.
///
/// Heading order is the page order: the root, the index (when the page has
/// members), then each member depth first.
pub fn page_anchors(corpus: &Corpus, root: &DocEntity) -> HashMap<String, String> {
    let entities = corpus.descendants(&root.fqn);
    let mut anchors = Anchors::default();
    let mut out = HashMap::with_capacity(entities.len());
    for (i, entity) in entities.iter().enumerate() {
        if i == 1 {
            anchors.next(INDEX_HEADING);
        }
        out.insert(entity.fqn.clone(), anchors.next(&entity.fqn));
    }
    out
}

/// Markdown link to a heading on the same page.
pub fn render_toc_link(text: &str, anchor: &str) -> String {
    format!("[{}](#{})", text, anchor)
}

/// Index list item.
pub fn render_toc_item(text: &str, anchor: &str) -> String {
    format!("* {}", render_toc_link(text, anchor))
}
