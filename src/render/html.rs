//! HTML renderer: standalone page with semantic markup.

use crate::corpus::Corpus;
use crate::model::*;
use crate::parser::signature::Signature;
use crate::render::{link_target, page_name, sections, Fragment, Renderer};
use crate::xref;
use anyhow::Result;
use std::ops::Range;

pub struct HtmlRenderer;

const STYLE: &str = "\
body { font-family: system-ui, sans-serif; max-width: 48em; margin: 2em auto; padding: 0 1em; }
code { background: #f4f4f4; padding: 0.15em 0.3em; border-radius: 3px; }
pre { background: #f4f4f4; padding: 1em; border-radius: 5px; overflow-x: auto; }
dt { font-weight: bold; margin-top: 0.5em; }
dd { margin-left: 1.5em; }
.section { font-size: 0.85em; color: #666; }
.synthetic { color: #888; }
";

impl Renderer for HtmlRenderer {
    fn render(&self, corpus: &Corpus, root: &DocEntity) -> Result<String> {
        let mut out = page_head(&root.fqn);
        let entities = corpus.descendants(&root.fqn);
        let ctx = Context {
            corpus,
            page: &root.fqn,
            ext: self.file_extension(),
        };

        out.push_str(&format!("<h1 id=\"{}\">{}</h1>\n", html_id(&root.fqn), html_escape(&root.fqn)));
        render_entity(&mut out, root, &ctx);

        // empty when `root` is not part of the corpus
        let members = entities.get(1..).unwrap_or_default();
        if !members.is_empty() {
            out.push_str("<h2>Index</h2>\n<ul>\n");
            for entity in members {
                out.push_str(&format!(
                    "  <li><a href=\"#{}\">{}</a></li>\n",
                    html_id(&entity.fqn),
                    html_escape(&entity.fqn)
                ));
            }
            out.push_str("</ul>\n");
        }

        for entity in members {
            let tag = if entity.is_callable() { "h3" } else { "h2" };
            out.push_str(&format!(
                "<{tag} id=\"{}\">{}</{tag}>\n",
                html_id(&entity.fqn),
                html_escape(&entity.fqn)
            ));
            render_entity(&mut out, entity, &ctx);
        }

        out.push_str("</body>\n</html>\n");
        Ok(out)
    }

    fn render_index(&self, corpus: &Corpus) -> Result<String> {
        let mut out = page_head("API Reference");
        out.push_str("<h1>API Reference</h1>\n");
        for (section, roots) in sections(corpus) {
            out.push_str(&format!("<h2>{}</h2>\n<dl>\n", html_escape(section.unwrap_or("Other"))));
            for root in roots {
                out.push_str(&format!(
                    "  <dt><a href=\"{}.{}\">{}</a></dt>\n",
                    html_escape(&page_name(root)),
                    self.file_extension(),
                    html_escape(&root.fqn)
                ));
                if !root.summary.is_empty() {
                    out.push_str(&format!("  <dd>{}</dd>\n", html_escape(&root.summary)));
                }
            }
            out.push_str("</dl>\n");
        }
        out.push_str("</body>\n</html>\n");
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "html"
    }
}

struct Context<'a> {
    corpus: &'a Corpus,
    page: &'a str,
    ext: &'a str,
}

fn page_head(title: &str) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    out.push_str("<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>{}</title>\n", html_escape(title)));
    out.push_str("<style>\n");
    out.push_str(STYLE);
    out.push_str("</style>\n");
    out.push_str("</head>\n<body>\n");
    out
}

fn render_entity(out: &mut String, entity: &DocEntity, ctx: &Context<'_>) {
    if let Some(ref section) = entity.section {
        out.push_str(&format!("<p class=\"section\">Section: {}</p>\n", html_escape(section)));
    }
    if let Some(ref superclass) = entity.superclass {
        out.push_str(&format!("<p>Extends <code>{}</code>.</p>\n", html_escape(superclass)));
    }
    if let Some(sig) = Signature::of(entity) {
        out.push_str(&format!(
            "<pre><code class=\"language-js\">{}</code></pre>\n",
            html_escape(&sig.to_string())
        ));
    }

    if !entity.description.is_empty() {
        let linked = linkify(&entity.description, &entity.references, ctx);
        for paragraph in linked.split("\n\n").filter(|p| !p.trim().is_empty()) {
            if is_code(paragraph) {
                out.push_str(&format!("<pre><code>{}</code></pre>\n", unindent(paragraph)));
            } else {
                out.push_str(&format!("<p>{}</p>\n", paragraph.trim()));
            }
        }
    } else if entity.synthetic {
        out.push_str("<p class=\"synthetic\"><em>Undocumented scope.</em></p>\n");
    }

    if !entity.parameters.is_empty() {
        out.push_str("<h4>Arguments</h4>\n");
        render_params(out, entity, &entity.parameters, ctx);
    }

    if let Some(ref returns) = entity.returns {
        out.push_str(&format!("<p>Returns <code>{}</code></p>\n", html_escape(returns.as_str())));
    }
}

fn render_params(out: &mut String, entity: &DocEntity, params: &[ParamSpec], ctx: &Context<'_>) {
    out.push_str("<dl>\n");
    for param in params {
        out.push_str(&format!("  <dt><code>{}</code>", html_escape(&param.name)));
        if let Some(ref type_hint) = param.type_hint {
            out.push_str(&format!(" ({})", html_escape(type_hint.as_str())));
        }
        if param.optional {
            out.push_str(" <em>optional</em>");
        }
        out.push_str("</dt>\n");
        if let Some(ref description) = param.description {
            let refs = xref::scan(&entity.fqn, description);
            out.push_str(&format!("  <dd>{}</dd>\n", linkify(description, &refs, ctx)));
        }
        if !param.arguments.is_empty() {
            out.push_str("  <dd>\n");
            render_params(out, entity, &param.arguments, ctx);
            out.push_str("  </dd>\n");
        }
    }
    out.push_str("</dl>\n");
}

/// Escape prose, turn references into links and keep `<a id>` anchors.
fn linkify(text: &str, refs: &[CrossReference], ctx: &Context<'_>) -> String {
    let mut pieces: Vec<(Range<usize>, String)> = refs
        .iter()
        .map(|r| (r.span.clone(), link(r, ctx)))
        .collect();
    pieces.extend(
        xref::anchors(text)
            .into_iter()
            .map(|(id, span)| (span, format!("<a id=\"{}\"></a>", html_escape(&id)))),
    );
    pieces.sort_by_key(|(span, _)| span.start);

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (span, markup) in pieces {
        if span.start < last || span.end > text.len() {
            continue;
        }
        out.push_str(&html_escape(&text[last..span.start]));
        out.push_str(&markup);
        last = span.end;
    }
    out.push_str(&html_escape(&text[last..]));
    out
}

fn link(r: &CrossReference, ctx: &Context<'_>) -> String {
    let label = html_escape(&xref::display_text(r));
    if let LinkTarget::External(url) = &r.target {
        return format!("<a href=\"{}\">{}</a>", html_escape(url), label);
    }
    let Some((root, fragment)) = link_target(ctx.corpus, r) else {
        return format!("<span class=\"dangling\">{}</span>", label);
    };
    let (name, id) = match fragment {
        Fragment::Entity(target) => (target.fqn.as_str(), html_id(&target.fqn)),
        Fragment::Anchor(id) => (id, id.to_string()),
    };
    let label = match r.label {
        Some(_) => label,
        None => html_escape(name),
    };
    let href = if root.fqn == ctx.page {
        format!("#{}", id)
    } else {
        format!("{}.{}#{}", page_name(root), ctx.ext, id)
    };
    format!("<a href=\"{}\">{}</a>", html_escape(&href), label)
}

fn is_code(paragraph: &str) -> bool {
    paragraph
        .lines()
        .filter(|l| !l.trim().is_empty())
        .all(|l| l.len() - l.trim_start_matches(' ').len() >= 4)
}

fn unindent(text: &str) -> String {
    let min = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0);
    text.lines()
        .map(|l| l.get(min..).unwrap_or(""))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Element id for an entity: its fqn with `#` made id-safe.
pub fn html_id(fqn: &str) -> String {
    fqn.replace('#', "-")
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
