//! GitHub-flavored markdown renderer.
//!
//! One page per root: the root's prose, an index of its members, then a
//! heading per member with its canonical signature.

use crate::corpus::Corpus;
use crate::model::*;
use crate::parser::signature::Signature;
use crate::render::{link_target, page_name, sections, Fragment, Renderer};
use crate::toc;
use crate::xref;
use anyhow::Result;
use std::collections::HashMap;

pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(&self, corpus: &Corpus, root: &DocEntity) -> Result<String> {
        let mut links = Links::new(corpus, root, self.file_extension());
        let entities = corpus.descendants(&root.fqn);
        let anchors = links.anchors(root).clone();
        let mut lines: Vec<String> = Vec::new();

        lines.push(format!("# {}\n", root.fqn));
        render_header(&mut lines, root);
        render_body(&mut lines, root, &mut links);

        // empty when `root` is not part of the corpus
        let members = entities.get(1..).unwrap_or_default();
        if !members.is_empty() {
            lines.push(format!("## {}\n", toc::INDEX_HEADING));
            for entity in members {
                let anchor = anchors.get(&entity.fqn).map_or("", String::as_str);
                lines.push(toc::render_toc_item(&entity.fqn, anchor));
            }
            lines.push(String::new());
        }

        for entity in members {
            let level = if entity.is_callable() { "###" } else { "##" };
            lines.push(format!("{} {}\n", level, entity.fqn));
            render_header(&mut lines, entity);
            render_body(&mut lines, entity, &mut links);
        }

        let mut out = lines.join("\n");
        out.truncate(out.trim_end().len());
        out.push('\n');
        Ok(out)
    }

    fn render_index(&self, corpus: &Corpus) -> Result<String> {
        let mut lines: Vec<String> = vec!["# API Reference\n".to_string()];
        for (section, roots) in sections(corpus) {
            lines.push(format!("## {}\n", section.unwrap_or("Other")));
            for root in roots {
                let link = format!("[{}]({}.{})", root.fqn, page_name(root), self.file_extension());
                if root.summary.is_empty() {
                    lines.push(format!("* {}", link));
                } else {
                    lines.push(format!("* {}: {}", link, root.summary));
                }
            }
            lines.push(String::new());
        }
        Ok(lines.join("\n"))
    }

    fn file_extension(&self) -> &str {
        "md"
    }
}

/// Anchor tables per page, built on first use.
struct Links<'c> {
    corpus: &'c Corpus,
    page: String,
    ext: String,
    anchors: HashMap<String, HashMap<String, String>>,
}

impl<'c> Links<'c> {
    fn new(corpus: &'c Corpus, page: &DocEntity, ext: &str) -> Self {
        Links {
            corpus,
            page: page.fqn.clone(),
            ext: ext.to_string(),
            anchors: HashMap::new(),
        }
    }

    fn anchors(&mut self, root: &DocEntity) -> &HashMap<String, String> {
        let corpus = self.corpus;
        self.anchors
            .entry(root.fqn.clone())
            .or_insert_with(|| toc::page_anchors(corpus, root))
    }

    /// Markdown for one reference found in `text`.
    fn link(&mut self, text: &str, r: &CrossReference) -> String {
        if !r.is_internal() {
            return text[r.span.clone()].to_string();
        }
        let Some((root, fragment)) = link_target(self.corpus, r) else {
            // dangling: keep the words, drop the link
            return xref::display_text(r);
        };
        let (name, anchor) = match fragment {
            Fragment::Entity(target) => {
                let anchor = self
                    .anchors(root)
                    .get(&target.fqn)
                    .cloned()
                    .unwrap_or_default();
                (target.fqn.clone(), anchor)
            }
            Fragment::Anchor(id) => (id.to_string(), id.to_string()),
        };
        let label = r.label.clone().unwrap_or(name);
        if root.fqn == self.page {
            format!("[{}](#{})", label, anchor)
        } else {
            format!("[{}]({}.{}#{})", label, page_name(root), self.ext, anchor)
        }
    }

    fn rewrite(&mut self, text: &str, refs: &[CrossReference]) -> String {
        xref::rewrite(text, refs, |r| self.link(text, r))
    }
}

fn render_header(lines: &mut Vec<String>, entity: &DocEntity) {
    if let Some(ref section) = entity.section {
        lines.push(format!("> Section: {}\n", section));
    }
    if let Some(ref superclass) = entity.superclass {
        lines.push(format!("Extends `{}`.\n", superclass));
    }
    if let Some(sig) = Signature::of(entity) {
        lines.push("```js".to_string());
        lines.push(sig.to_string());
        lines.push("```\n".to_string());
    }
}

fn render_body(lines: &mut Vec<String>, entity: &DocEntity, links: &mut Links<'_>) {
    if !entity.description.is_empty() {
        lines.push(links.rewrite(&entity.description, &entity.references));
        lines.push(String::new());
    }

    if !entity.parameters.is_empty() {
        lines.push("**Arguments**\n".to_string());
        for param in &entity.parameters {
            render_param(lines, entity, param, 0, links);
        }
        lines.push(String::new());
    }

    if let Some(ref returns) = entity.returns {
        lines.push(format!("**Returns**: `{}`\n", returns));
    }
}

/// `* `name` (Type) _optional_: description`, callback arguments nested below.
fn render_param(
    lines: &mut Vec<String>,
    entity: &DocEntity,
    param: &ParamSpec,
    depth: usize,
    links: &mut Links<'_>,
) {
    let mut line = format!("{}* `{}`", "  ".repeat(depth), param.name);
    if let Some(ref type_hint) = param.type_hint {
        line.push_str(&format!(" ({})", type_hint));
    }
    if param.optional {
        line.push_str(" _optional_");
    }
    if let Some(ref description) = param.description {
        let refs = xref::scan(&entity.fqn, description);
        line.push_str(": ");
        line.push_str(&links.rewrite(description, &refs));
    }
    lines.push(line);
    for argument in &param.arguments {
        render_param(lines, entity, argument, depth + 1, links);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build_sources;
    use std::path::PathBuf;

    const ZLIB: &str = r#"/**
 * class zlib
 *
 * Compression bindings. See [[zlib.createGzip]] and [[zlib.options `options`]].
 **/

/**
 * zlib.createGzip([options]) -> zlib.Gzip
 * - options (Object): The standard [[zlib.options `options`]] object.
 *
 * Returns a new [Gzip](#zlib.Gzip) object.
 **/

/**
 * zlib#gzip(buf, callback(error, result))
 * - buf (Buffer): The buffer to compress
 * - error (Error): The standard error object
 **/
"#;

    fn page(src: &str, root: &str) -> String {
        let build = build_sources(&[(PathBuf::from("zlib.js"), src.to_string())]);
        let root = build.corpus.lookup(root).unwrap();
        MarkdownRenderer.render(&build.corpus, root).unwrap()
    }

    #[test]
    fn page_has_index_and_signatures() {
        let out = page(ZLIB, "zlib");
        assert!(out.starts_with("# zlib\n"));
        assert!(out.contains("## Index\n"));
        assert!(out.contains("* [zlib.createGzip](#zlibcreategzip)"));
        assert!(out.contains("### zlib#gzip\n"));
        assert!(out.contains("```js\nzlib.createGzip([options]) -> zlib.Gzip\n```"));
        assert!(out.contains("**Returns**: `zlib.Gzip`"));
    }

    #[test]
    fn resolved_links_point_at_anchors() {
        let out = page(ZLIB, "zlib");
        assert!(out.contains("See [zlib.createGzip](#zlibcreategzip)"));
    }

    #[test]
    fn dangling_links_render_as_text() {
        let out = page(ZLIB, "zlib");
        assert!(out.contains("and `options`."));
        assert!(!out.contains("[[zlib.options"));
        // the anchor link to an undeclared class keeps only its label
        assert!(out.contains("Returns a new Gzip object."));
    }

    #[test]
    fn callback_arguments_are_nested() {
        let out = page(ZLIB, "zlib");
        assert!(out.contains("* `buf` (Buffer): The buffer to compress"));
        assert!(out.contains("* `callback`\n  * `error` (Error): The standard error object"));
    }

    #[test]
    fn optional_parameters_are_marked() {
        let out = page(ZLIB, "zlib");
        assert!(out.contains("* `options` (Object) _optional_: The standard `options` object."));
    }

    #[test]
    fn prose_anchor_links_keep_their_id() {
        let src = "/**\n * class zlib\n *\n * <a id=\"zlib.options\"></a>\n * #### Options\n **/\n/**\n * zlib.createGzip([options])\n * - options (Object): The standard [[zlib.options `options`]] object.\n **/";
        let out = page(src, "zlib");
        assert!(out.contains("The standard [`options`](#zlib.options) object."));
    }

    #[test]
    fn links_across_pages_name_the_file() {
        let build = build_sources(&[
            (PathBuf::from("a.js"), "/**\n * class tty\n *\n * Errors are [[ReferenceError]].\n **/".to_string()),
            (PathBuf::from("b.js"), "/**\n * class ReferenceError\n **/".to_string()),
        ]);
        let root = build.corpus.lookup("tty").unwrap();
        let out = MarkdownRenderer.render(&build.corpus, root).unwrap();
        assert!(out.contains("[ReferenceError](ReferenceError.md#referenceerror)"));
    }

    #[test]
    fn root_outside_the_corpus_renders_alone() {
        let build = build_sources(&[(PathBuf::from("zlib.js"), ZLIB.to_string())]);
        let stray = DocEntity::new(EntityKind::Module, "stray", "stray");
        let out = MarkdownRenderer.render(&build.corpus, &stray).unwrap();
        assert_eq!(out, "# stray\n");
    }

    #[test]
    fn index_groups_by_section() {
        let build = build_sources(&[
            (
                PathBuf::from("ReferenceError.js"),
                "/** section: Errors\n * class ReferenceError\n *\n * Thrown on bad references.\n **/".to_string(),
            ),
            (PathBuf::from("tty.js"), "/**\n * tty.isatty(fd) -> Boolean\n **/".to_string()),
        ]);
        let out = MarkdownRenderer.render_index(&build.corpus).unwrap();
        assert!(out.contains("## Errors\n\n* [ReferenceError](ReferenceError.md): Thrown on bad references."));
        assert!(out.contains("## Other\n\n* [tty](tty.md)"));
    }
}
