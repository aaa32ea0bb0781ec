//! The merged, queryable documentation model.
//!
//! A [`Corpus`] is assembled once from the parsed files of a build, in build
//! order, and is read-only afterwards. Entities are keyed by fully-qualified
//! name; each scope keeps its members in first-seen order.

use crate::error::Warning;
use crate::model::{CrossReference, DocEntity, LinkTarget, MemberScope};
use crate::parser::ParsedFile;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    entities: HashMap<String, DocEntity>,
    /// Member fqns per scope, in first-seen order
    children: HashMap<String, Vec<String>>,
    roots: Vec<String>,
    /// Prose anchor id to the fqn of the entity holding it
    anchors: HashMap<String, String>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one parsed file into the corpus.
    ///
    /// Returns the file's own warnings followed by any cross-file duplicates.
    /// A declared entity replaces an earlier one of the same name in place; a
    /// synthetic scope never replaces a declared one.
    pub fn merge(&mut self, file: ParsedFile) -> Vec<Warning> {
        let mut warnings = file.warnings;
        for entity in file.entities {
            for id in &entity.anchors {
                self.anchors.insert(id.clone(), entity.fqn.clone());
            }
            if let Some(existing) = self.entities.get(&entity.fqn) {
                if entity.synthetic {
                    continue;
                }
                if !existing.synthetic {
                    warnings.push(Warning::DuplicateEntity {
                        fqn: entity.fqn.clone(),
                        previous: existing.origin(),
                        replacement: entity.origin(),
                    });
                }
                self.entities.insert(entity.fqn.clone(), entity);
                continue;
            }

            match &entity.parent {
                Some(parent) => self
                    .children
                    .entry(parent.clone())
                    .or_default()
                    .push(entity.fqn.clone()),
                None => self.roots.push(entity.fqn.clone()),
            }
            self.entities.insert(entity.fqn.clone(), entity);
        }
        warnings
    }

    /// Resolve every internal reference and flag the ones that miss.
    ///
    /// Call once all files are merged. Returns a `DanglingReference` warning
    /// per unresolved reference.
    pub fn link(&mut self) -> Vec<Warning> {
        let mut flagged: Vec<(String, usize)> = Vec::new();
        for entity in self.iter() {
            for (i, r) in entity.references.iter().enumerate() {
                if r.is_internal() && self.resolve(r).is_none() {
                    flagged.push((entity.fqn.clone(), i));
                }
            }
        }

        let mut warnings = Vec::with_capacity(flagged.len());
        for (fqn, i) in flagged {
            if let Some(r) = self
                .entities
                .get_mut(&fqn)
                .and_then(|e| e.references.get_mut(i))
            {
                r.dangling = true;
                warnings.push(Warning::DanglingReference {
                    source_fqn: r.source.clone(),
                    target: r.target.to_string(),
                });
            }
        }
        warnings
    }

    pub fn lookup(&self, fqn: &str) -> Option<&DocEntity> {
        self.entities.get(fqn)
    }

    /// Direct members of a scope, in source order.
    pub fn children(&self, fqn: &str) -> Vec<&DocEntity> {
        self.children
            .get(fqn)
            .map(|names| names.iter().filter_map(|n| self.entities.get(n)).collect())
            .unwrap_or_default()
    }

    /// Top-level entities, in build order.
    pub fn roots(&self) -> Vec<&DocEntity> {
        self.roots
            .iter()
            .filter_map(|n| self.entities.get(n))
            .collect()
    }

    /// An entity followed by all its members, depth first.
    pub fn descendants(&self, fqn: &str) -> Vec<&DocEntity> {
        let mut out = Vec::new();
        let mut stack: Vec<&str> = vec![fqn];
        while let Some(name) = stack.pop() {
            let Some(entity) = self.entities.get(name) else {
                continue;
            };
            out.push(entity);
            if let Some(members) = self.children.get(name) {
                stack.extend(members.iter().rev().map(String::as_str));
            }
        }
        out
    }

    /// Every entity, depth first from each root.
    pub fn iter(&self) -> impl Iterator<Item = &DocEntity> + '_ {
        self.roots.iter().flat_map(|root| self.descendants(root))
    }

    /// The top-level entity an fqn lives under.
    pub fn root_of(&self, fqn: &str) -> Option<&DocEntity> {
        let mut entity = self.entities.get(fqn)?;
        while let Some(parent) = entity.parent.as_deref().and_then(|p| self.entities.get(p)) {
            entity = parent;
        }
        Some(entity)
    }

    /// Entity whose prose defines the anchor `id`.
    pub fn anchor_owner(&self, id: &str) -> Option<&DocEntity> {
        self.anchors.get(id).and_then(|fqn| self.entities.get(fqn))
    }

    /// Resolve an internal reference.
    ///
    /// Tries the target as an fqn, then as a prose anchor, then as a member of
    /// the referring entity and of each scope enclosing it. External links
    /// never resolve.
    pub fn resolve(&self, r: &CrossReference) -> Option<&DocEntity> {
        let LinkTarget::Internal(target) = &r.target else {
            return None;
        };
        if let Some(entity) = self.entities.get(target) {
            return Some(entity);
        }
        if let Some(owner) = self.anchor_owner(target) {
            return Some(owner);
        }

        let mut scope = self.entities.get(&r.source);
        while let Some(entity) = scope {
            for sep in [MemberScope::Static, MemberScope::Instance].map(MemberScope::separator) {
                let candidate = format!("{}{}{}", entity.fqn, sep, target);
                if let Some(found) = self.entities.get(&candidate) {
                    return Some(found);
                }
            }
            scope = entity.parent.as_deref().and_then(|p| self.entities.get(p));
        }
        None
    }

    /// Internal references that resolve to nothing, in corpus order.
    pub fn dangling_references(&self) -> Vec<CrossReference> {
        self.iter()
            .flat_map(|e| e.references.iter())
            .filter(|r| r.is_internal() && self.resolve(r).is_none())
            .map(|r| CrossReference {
                dangling: true,
                ..r.clone()
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityKind;
    use crate::parser::parse_file;
    use std::path::Path;

    fn corpus(files: &[(&str, &str)]) -> (Corpus, Vec<Warning>) {
        let mut corpus = Corpus::new();
        let mut warnings = Vec::new();
        for (path, src) in files {
            warnings.extend(corpus.merge(parse_file(Path::new(path), src)));
        }
        warnings.extend(corpus.link());
        (corpus, warnings)
    }

    const TTY: &str = "/**\n * class tty\n *\n * Terminal control. See [[tty.isatty]].\n **/\n/**\n * tty.isatty(fd) -> Boolean\n * - fd (Number): The file descriptor\n **/\n/**\n * tty.setRawMode(mode) -> Void\n *\n * See [[isatty]] and [[tty.missing]].\n **/\n";

    #[test]
    fn children_in_source_order() {
        let (corpus, _) = corpus(&[("tty.js", TTY)]);
        let names: Vec<&str> = corpus.children("tty").iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["isatty", "setRawMode"]);
        assert_eq!(corpus.roots().len(), 1);
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.root_of("tty.setRawMode").unwrap().fqn, "tty");
    }

    #[test]
    fn later_file_wins() {
        let a = "/**\n * tty.isatty(fd) -> Boolean\n *\n * From a.\n **/";
        let b = "/**\n * tty.isatty(fd, extra) -> Number\n *\n * From b.\n **/";
        let (corpus, warnings) = corpus(&[("a.js", a), ("b.js", b)]);
        let entity = corpus.lookup("tty.isatty").unwrap();
        assert_eq!(entity.summary, "From b.");
        assert_eq!(entity.parameters.len(), 2);
        assert_eq!(corpus.children("tty").len(), 1);
        assert_eq!(warnings.len(), 1);
        match &warnings[0] {
            Warning::DuplicateEntity { fqn, previous, replacement } => {
                assert_eq!(fqn, "tty.isatty");
                assert_eq!(previous, "a.js:2");
                assert_eq!(replacement, "b.js:2");
            }
            other => panic!("unexpected warning: {other:?}"),
        }
    }

    #[test]
    fn replaced_member_keeps_position() {
        let a = "/**\n * tty.isatty(fd) -> Boolean\n **/\n/**\n * tty.setRawMode(mode)\n **/";
        let b = "/**\n * tty.isatty(fd) -> Number\n **/";
        let (corpus, _) = corpus(&[("a.js", a), ("b.js", b)]);
        let names: Vec<&str> = corpus.children("tty").iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["isatty", "setRawMode"]);
    }

    #[test]
    fn synthetic_scope_does_not_replace_declared_class() {
        let a = "/**\n * class tty\n *\n * Declared.\n **/";
        let b = "/**\n * tty.getWindowSize(fd) -> Array\n **/";
        let (corpus, warnings) = corpus(&[("a.js", a), ("b.js", b)]);
        let tty = corpus.lookup("tty").unwrap();
        assert_eq!(tty.kind, EntityKind::Class);
        assert!(!tty.synthetic);
        assert!(warnings.is_empty());
        assert_eq!(corpus.children("tty").len(), 1);
    }

    #[test]
    fn references_resolve_relative_to_scope() {
        let (corpus, warnings) = corpus(&[("tty.js", TTY)]);
        let raw = &corpus.lookup("tty.setRawMode").unwrap().references;
        assert_eq!(corpus.resolve(&raw[0]).unwrap().fqn, "tty.isatty");
        assert!(corpus.resolve(&raw[1]).is_none());
        assert!(!raw[0].dangling);
        assert!(raw[1].dangling);

        let dangling = corpus.dangling_references();
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].target, LinkTarget::Internal("tty.missing".to_string()));
        assert!(matches!(
            &warnings[0],
            Warning::DanglingReference { source_fqn, target }
                if source_fqn == "tty.setRawMode" && target == "tty.missing"
        ));
    }

    #[test]
    fn external_links_never_dangle() {
        let src = "/**\n * class zlib\n *\n * See <http://zlib.net/> and [manual](http://zlib.net/manual.html).\n **/";
        let (corpus, warnings) = corpus(&[("zlib.js", src)]);
        assert!(corpus.dangling_references().is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn prose_anchors_are_link_targets() {
        let src = "/**\n * class zlib\n *\n * <a id=\"zlib.options\"></a>\n * #### Options\n **/\n/**\n * zlib.createGzip([options])\n *\n * Takes [[zlib.options `options`]].\n **/";
        let (corpus, warnings) = corpus(&[("zlib.js", src)]);
        assert!(warnings.is_empty(), "{warnings:?}");
        let r = &corpus.lookup("zlib.createGzip").unwrap().references[0];
        assert_eq!(corpus.resolve(r).unwrap().fqn, "zlib");
        assert_eq!(corpus.anchor_owner("zlib.options").unwrap().fqn, "zlib");
    }

    #[test]
    fn iteration_is_depth_first() {
        let src = "/**\n * class zlib\n **/\n/**\n * new zlib.Gzip([options])\n **/\n/**\n * zlib.createGzip([options]) -> zlib.Gzip\n **/";
        let (corpus, _) = corpus(&[("zlib.js", src)]);
        let order: Vec<&str> = corpus.iter().map(|e| e.fqn.as_str()).collect();
        assert_eq!(order, vec!["zlib", "zlib.Gzip", "zlib.Gzip.new", "zlib.createGzip"]);
    }

    #[test]
    fn corpus_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Corpus>();
    }
}
