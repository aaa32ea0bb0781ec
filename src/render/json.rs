//! JSON renderer: structured output for tooling integration.
//!
//! Serializes the entity model directly, one record per entity, with
//! dangling flags already resolved against the corpus.

use crate::corpus::Corpus;
use crate::model::*;
use crate::render::{page_name, sections, Renderer};
use anyhow::{Context, Result};
use serde::Serialize;

pub struct JsonRenderer;

#[derive(Serialize)]
struct Page<'a> {
    root: &'a str,
    entities: Vec<&'a DocEntity>,
}

#[derive(Serialize)]
struct IndexEntry<'a> {
    fqn: &'a str,
    kind: EntityKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    section: Option<&'a str>,
    summary: &'a str,
    page: String,
}

impl Renderer for JsonRenderer {
    fn render(&self, corpus: &Corpus, root: &DocEntity) -> Result<String> {
        let page = Page {
            root: &root.fqn,
            entities: corpus.descendants(&root.fqn),
        };
        to_json(&page)
    }

    fn render_index(&self, corpus: &Corpus) -> Result<String> {
        let entries: Vec<IndexEntry> = sections(corpus)
            .into_iter()
            .flat_map(|(_, roots)| roots)
            .map(|root| IndexEntry {
                fqn: &root.fqn,
                kind: root.kind,
                section: root.section.as_deref(),
                summary: &root.summary,
                page: format!("{}.{}", page_name(root), self.file_extension()),
            })
            .collect();
        to_json(&entries)
    }

    fn file_extension(&self) -> &str {
        "json"
    }

    /// A single array of every entity, so stdout stays one JSON document.
    fn render_all(&self, corpus: &Corpus) -> Result<String> {
        let entities: Vec<&DocEntity> = corpus.iter().collect();
        to_json(&entities)
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut out = serde_json::to_string_pretty(value).context("failed to serialize JSON")?;
    out.push('\n');
    Ok(out)
}
