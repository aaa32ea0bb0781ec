//! Per-file model assembly.
//!
//! Folds the classified blocks of one file into a tree of [`DocEntity`]s.
//! Members attach to their receiver, else to the current class, else to a
//! synthetic module named after the file. Scopes that are referenced but never
//! declared get synthetic entities so every member has a parent.

use super::classify::{class_header, classify, section_name, Classified, LineKind};
use super::signature::{self, Signature};
use super::tokenizer::{self, Block, Line};
use crate::error::Warning;
use crate::model::*;
use crate::xref;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

// `- name (Type): description`
static RE_PARAM_BULLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-\s+([^\s(:]+)\s*(?:\(([^)]*)\))?\s*:?\s*(.*)$").unwrap()
});

/// Minimum indentation of an example code line.
const CODE_INDENT: usize = 4;

/// Everything parsed out of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFile {
    pub path: PathBuf,
    /// Entities in source order; parents precede their members
    pub entities: Vec<DocEntity>,
    pub warnings: Vec<Warning>,
}

impl ParsedFile {
    /// The first top-level entity.
    pub fn root(&self) -> Option<&DocEntity> {
        self.entities.iter().find(|e| e.parent.is_none())
    }

    pub fn get(&self, fqn: &str) -> Option<&DocEntity> {
        self.entities.iter().find(|e| e.fqn == fqn)
    }
}

/// Assemble the entity tree of one file.
pub fn assemble(path: &Path, content: &str) -> ParsedFile {
    let mut asm = Assembler::new(path);
    for block in tokenizer::blocks(content) {
        asm.block(block);
    }
    ParsedFile {
        path: path.to_path_buf(),
        entities: asm.entities,
        warnings: asm.warnings,
    }
}

struct Assembler<'p> {
    path: &'p Path,
    stem: String,
    entities: Vec<DocEntity>,
    index: HashMap<String, usize>,
    current_class: Option<String>,
    current_section: Option<String>,
    warnings: Vec<Warning>,
}

impl<'p> Assembler<'p> {
    fn new(path: &'p Path) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "module".to_string());
        Assembler {
            path,
            stem,
            entities: Vec::new(),
            index: HashMap::new(),
            current_class: None,
            current_section: None,
            warnings: Vec::new(),
        }
    }

    fn location(&self, line: usize) -> SourceLocation {
        SourceLocation {
            file: self.path.to_path_buf(),
            line,
        }
    }

    fn block(&mut self, block: Block<'_>) {
        let lines = classify(block.lines());
        let mut pending: Vec<DocEntity> = Vec::new();
        let mut prose: Vec<String> = Vec::new();
        let mut section: Option<String> = None;
        // parameter named by the last matched bullet
        let mut bullet: Option<String> = None;

        for Classified { kind, line } in &lines {
            match kind {
                LineKind::SectionHeader => {
                    section = section_name(line.text).map(str::to_string);
                }
                LineKind::ClassHeader => {
                    if let Some(entity) = self.class(line, section.as_ref()) {
                        pending.push(entity);
                    }
                }
                LineKind::SignatureLine => match signature::parse(line.text) {
                    Ok(sig) => {
                        let entity = self.member(sig, line, &pending);
                        pending.push(entity);
                    }
                    Err(reason) => {
                        // one bad signature skips its whole block
                        self.warnings.push(Warning::MalformedSignature {
                            file: self.path.to_path_buf(),
                            line: line.line,
                            signature: line.text.to_string(),
                            reason,
                        });
                        return;
                    }
                },
                LineKind::ParamBullet => bullet = self.bullet(line, &mut pending),
                LineKind::BulletContinuation => {
                    if let Some(ref name) = bullet {
                        continue_bullet(&mut pending, name, line.text);
                    }
                }
                LineKind::Prose => prose.push(prose_line(line)),
            }
        }

        if section.is_some() {
            self.current_section = section;
        }
        let text = prose.join("\n").trim_matches('\n').to_string();
        self.commit(pending, &text, block.line);
    }

    fn class(&self, line: &Line<'_>, section: Option<&String>) -> Option<DocEntity> {
        let header = class_header(line.text)?;
        let (parent, name) = split_path(header.path);
        let mut entity = DocEntity::new(EntityKind::Class, name, header.path);
        entity.parent = parent.map(str::to_string);
        entity.superclass = header.superclass.map(str::to_string);
        entity.section = section.or(self.current_section.as_ref()).cloned();
        entity.source = Some(self.location(line.line));
        Some(entity)
    }

    fn member(&self, sig: Signature, line: &Line<'_>, pending: &[DocEntity]) -> DocEntity {
        // a class declared earlier in the same block wins over the file's current class
        let current = pending
            .iter()
            .rev()
            .find(|e| e.kind == EntityKind::Class)
            .map(|e| e.fqn.clone())
            .or_else(|| self.current_class.clone());

        let (fqn, parent, scope) = match sig.kind {
            EntityKind::Constructor => {
                let class = match (&sig.receiver, &current) {
                    (Some(receiver), _) => format!("{}.{}", receiver, sig.name),
                    (None, Some(current)) if split_path(current).1 == sig.name => current.clone(),
                    (None, Some(current)) => format!("{}.{}", current, sig.name),
                    (None, None) => sig.name.clone(),
                };
                (constructor_fqn(&class), class, MemberScope::Static)
            }
            _ => {
                let parent = sig
                    .receiver
                    .clone()
                    .or(current)
                    .unwrap_or_else(|| self.stem.clone());
                (member_fqn(&parent, sig.scope, &sig.name), parent, sig.scope)
            }
        };

        let mut entity = DocEntity::new(sig.kind, sig.name, fqn);
        entity.parent = Some(parent);
        entity.scope = scope;
        entity.parameters = sig.parameters;
        entity.returns = sig.returns;
        entity.source = Some(self.location(line.line));
        entity
    }

    /// Fill in a parameter from its bullet. Returns the parameter's name.
    fn bullet(&mut self, line: &Line<'_>, pending: &mut [DocEntity]) -> Option<String> {
        let caps = RE_PARAM_BULLET.captures(line.text)?;
        let entity = pending.iter_mut().rev().find(|e| e.is_callable())?;
        let name = &caps[1];
        match ParamSpec::find_mut(&mut entity.parameters, name) {
            Some(param) => {
                let type_hint = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
                if !type_hint.is_empty() {
                    param.type_hint = Some(TypeRef::new(type_hint));
                }
                let description = caps[3].trim();
                if !description.is_empty() {
                    param.description = Some(description.to_string());
                }
                Some(name.to_string())
            }
            None => {
                self.warnings.push(Warning::OrphanParameter {
                    file: self.path.to_path_buf(),
                    line: line.line,
                    entity: entity.fqn.clone(),
                    name: name.to_string(),
                });
                None
            }
        }
    }

    fn commit(&mut self, mut pending: Vec<DocEntity>, prose: &str, block_line: usize) {
        if pending.is_empty() {
            if prose.is_empty() {
                return;
            }
            // free-standing prose continues the current class
            let owner = match self.current_class.clone() {
                Some(class) if self.index.contains_key(&class) => class,
                _ => {
                    let stem = self.stem.clone();
                    self.ensure(&stem, EntityKind::Module, block_line);
                    stem
                }
            };
            if let Some(&i) = self.index.get(&owner) {
                apply_prose(&mut self.entities[i], prose);
            }
            return;
        }

        // prose belongs to the block's last declaration
        if let Some(last) = pending.last_mut().filter(|_| !prose.is_empty()) {
            apply_prose(last, prose);
        }
        for entity in pending {
            let line = entity.source.as_ref().map_or(block_line, |s| s.line);
            if let Some(parent) = entity.parent.clone() {
                let kind = if entity.kind == EntityKind::Constructor {
                    EntityKind::Class
                } else {
                    EntityKind::Module
                };
                self.ensure(&parent, kind, line);
            }
            if entity.kind == EntityKind::Class {
                self.current_class = Some(entity.fqn.clone());
            }
            self.insert(entity);
        }
    }

    /// Create a synthetic scope (and its ancestors) unless it exists.
    fn ensure(&mut self, fqn: &str, kind: EntityKind, line: usize) {
        if self.index.contains_key(fqn) {
            return;
        }
        let (parent, name) = split_path(fqn);
        if let Some(parent) = parent {
            self.ensure(parent, EntityKind::Module, line);
        }
        let mut entity = DocEntity::new(kind, name, fqn);
        entity.parent = parent.map(str::to_string);
        if parent.is_some() && fqn[..fqn.len() - name.len()].ends_with('#') {
            entity.scope = MemberScope::Instance;
        }
        entity.synthetic = true;
        entity.source = Some(self.location(line));
        self.insert(entity);
    }

    /// Insert or replace by fqn. Replacing a declared entity is a duplicate.
    fn insert(&mut self, entity: DocEntity) {
        match self.index.get(&entity.fqn) {
            Some(&i) => {
                let existing = &self.entities[i];
                if !existing.synthetic {
                    self.warnings.push(Warning::DuplicateEntity {
                        fqn: entity.fqn.clone(),
                        previous: existing.origin(),
                        replacement: entity.origin(),
                    });
                }
                self.entities[i] = entity;
            }
            None => {
                self.index.insert(entity.fqn.clone(), self.entities.len());
                self.entities.push(entity);
            }
        }
    }
}

/// Append a wrapped line to the description of parameter `name`.
fn continue_bullet(pending: &mut [DocEntity], name: &str, text: &str) {
    let Some(entity) = pending.iter_mut().rev().find(|e| e.is_callable()) else {
        return;
    };
    if let Some(param) = ParamSpec::find_mut(&mut entity.parameters, name) {
        param.description = Some(match param.description.take() {
            Some(description) => format!("{} {}", description, text),
            None => text.to_string(),
        });
    }
}

fn prose_line(line: &Line<'_>) -> String {
    if line.is_blank() {
        String::new()
    } else {
        format!("{}{}", " ".repeat(line.indent), line.text)
    }
}

/// Append prose to an entity and refresh everything derived from it.
fn apply_prose(entity: &mut DocEntity, prose: &str) {
    if entity.description.is_empty() {
        entity.description = prose.to_string();
    } else {
        entity.description.push_str("\n\n");
        entity.description.push_str(prose);
    }
    if entity.summary.is_empty() {
        entity.summary = first_paragraph(&entity.description);
    }
    entity.examples = code_blocks(&entity.description);
    entity.references = xref::scan(&entity.fqn, &entity.description);
    entity.anchors = xref::anchors(&entity.description)
        .into_iter()
        .map(|(id, _)| id)
        .collect();
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// First paragraph that is not a code block, joined onto one line.
fn first_paragraph(text: &str) -> String {
    text.split("\n\n")
        .filter(|p| !p.trim().is_empty())
        .find(|p| p.lines().all(|l| indent_of(l) < CODE_INDENT))
        .map(|p| p.lines().map(str::trim).collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

/// Indented code runs that start a paragraph, unindented.
fn code_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut previous_blank = true;

    for line in text.lines() {
        let blank = line.trim().is_empty();
        let code = !blank && indent_of(line) >= CODE_INDENT;
        if !current.is_empty() {
            if code || blank {
                current.push(line);
                previous_blank = blank;
                continue;
            }
            blocks.push(finish_code(&current));
            current.clear();
        } else if code && previous_blank {
            current.push(line);
            previous_blank = false;
            continue;
        }
        previous_blank = blank;
    }
    if !current.is_empty() {
        blocks.push(finish_code(&current));
    }
    blocks
}

fn finish_code(lines: &[&str]) -> String {
    let end = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map_or(0, |i| i + 1);
    let lines = &lines[..end];
    let min = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| indent_of(l))
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| if l.trim().is_empty() { "" } else { &l[min..] })
        .collect::<Vec<_>>()
        .join("\n")
}
