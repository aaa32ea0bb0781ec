use pdoc::build::build_sources;
use pdoc::model::{EntityKind, MemberScope, ParamSpec, TypeRef};
use pdoc::parser::signature::{parse, Signature};
use pdoc::{parse_file, Corpus, LinkTarget, Warning};
use proptest::prelude::*;
use std::path::{Path, PathBuf};

fn ident() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]{0,7}"
}

fn param() -> impl Strategy<Value = ParamSpec> {
    (ident(), any::<bool>(), prop::collection::vec(ident(), 0..3)).prop_map(
        |(name, optional, arguments)| ParamSpec {
            name,
            optional,
            arguments: arguments.into_iter().map(ParamSpec::required).collect(),
            ..Default::default()
        },
    )
}

fn signature() -> impl Strategy<Value = Signature> {
    (
        any::<bool>(),
        prop::option::of(prop::collection::vec(ident(), 1..3)),
        any::<bool>(),
        ident(),
        prop::collection::vec(param(), 0..5),
        prop::option::of(ident()),
    )
        .prop_map(|(constructor, receiver, instance, name, parameters, returns)| {
            let kind = if constructor {
                EntityKind::Constructor
            } else {
                EntityKind::Method
            };
            let scope = if instance && !constructor && receiver.is_some() {
                MemberScope::Instance
            } else {
                MemberScope::Static
            };
            Signature {
                kind,
                receiver: receiver.map(|path| path.join(".")),
                scope,
                name,
                parameters,
                returns: returns.map(TypeRef::new),
            }
        })
}

/// Parameter lists mixing canonical and hand-written bracket layouts:
/// `a`, `, [a]`, `[, a]` and `, [a, b]`.
fn bracketed_list() -> impl Strategy<Value = String> {
    prop::collection::vec((ident(), ident(), 0..4u8), 0..5).prop_map(|items| {
        let mut out = String::new();
        for (i, (a, b, style)) in items.iter().enumerate() {
            let sep = if i == 0 { "" } else { ", " };
            let item = match style {
                0 => format!("{}{}", sep, a),
                1 => format!("{}[{}]", sep, a),
                2 => format!("[{}{}]", sep, a),
                _ => format!("{}[{}, {}]", sep, a, b),
            };
            out.push_str(&item);
        }
        out
    })
}

/// Parse each source as its own file, in order, into a fresh corpus.
fn corpus_of(files: &[(&str, String)]) -> (Corpus, Vec<Warning>) {
    let mut corpus = Corpus::new();
    let mut warnings = Vec::new();
    for (path, src) in files {
        warnings.extend(corpus.merge(parse_file(Path::new(path), src)));
    }
    warnings.extend(corpus.link());
    (corpus, warnings)
}

const BLOCKS: &[&str] = &[
    "/**\n * class tty\n *\n * Terminal control.\n **/\n",
    "/**\n * tty.isatty(fd) -> Boolean\n * - fd (Number): The file descriptor\n *\n * See [[tty.setRawMode]].\n **/\n",
    "/**\n * tty.setRawMode(mode) -> Void\n **/\n",
    "/** section: Errors\n * class ReferenceError\n *\n * A `ReferenceError`.\n **/\n",
    "/**\n * new ReferenceError([message][, fileName][, lineNumber])\n **/\n",
    "/**\n * zlib#gzip(buf, callback(error, result))\n * - error (Error): The standard error object\n **/\n",
    "/**\n * tty.isatty(fd)) -> Boolean\n **/\n",
    "/**\n * Free prose with a [[dangling]] link.\n **/\n",
    "/**\n * zlib.createGzip([options])\n * - options (Object): See [[zlib.options]].\n *\n *     var gzip = zlib.createGzip();\n **/\n",
];

fn document() -> impl Strategy<Value = String> {
    prop::collection::vec(0..BLOCKS.len(), 0..12)
        .prop_map(|picks| picks.into_iter().map(|i| BLOCKS[i]).collect::<String>())
}

proptest! {
    // Canonical signatures survive a parse/serialize cycle unchanged.
    #[test]
    fn signature_round_trip(sig in signature()) {
        let text = sig.to_string();
        let parsed = parse(&text).unwrap();
        prop_assert_eq!(&parsed, &sig);
        prop_assert_eq!(parsed.to_string(), text);
    }

    // Hand-written optional groups print back the way they were written.
    #[test]
    fn bracket_layouts_round_trip(name in ident(), params in bracketed_list()) {
        let text = format!("{}({})", name, params);
        prop_assert_eq!(parse(&text).unwrap().to_string(), text);
    }

    // Extra whitespace never changes the parse.
    #[test]
    fn signature_whitespace_insensitive(sig in signature()) {
        let text = sig.to_string().replace(',', " ,  ").replace('(', "( ");
        prop_assert_eq!(parse(&text).unwrap(), sig);
    }

    // Should not panic
    #[test]
    fn signature_parser_robustness(line in "\\PC*") {
        let _ = parse(&line);
    }

    // Should not panic, whatever sits between the markers
    #[test]
    fn file_parser_robustness(body in "\\PC*", extra in "\\PC*") {
        let src = format!("/**\n * {}\n **/\n{}\n/**{}", body, extra, body);
        let _ = parse_file(Path::new("fuzz.js"), &src);
    }

    #[test]
    fn parsing_is_idempotent(doc in document()) {
        let (first, first_warnings) = corpus_of(&[("doc.js", doc.clone())]);
        let (second, second_warnings) = corpus_of(&[("doc.js", doc)]);
        prop_assert_eq!(first, second);
        prop_assert_eq!(first_warnings, second_warnings);
    }

    // Every entity's parent exists and lists it among its children.
    #[test]
    fn tree_is_consistent(doc in document()) {
        let (corpus, _) = corpus_of(&[("doc.js", doc)]);
        for entity in corpus.iter() {
            match &entity.parent {
                Some(parent) => {
                    prop_assert!(corpus.lookup(parent).is_some());
                    prop_assert!(corpus.children(parent).iter().any(|c| c.fqn == entity.fqn));
                }
                None => prop_assert!(corpus.roots().iter().any(|r| r.fqn == entity.fqn)),
            }
        }
        prop_assert_eq!(corpus.iter().count(), corpus.len());
    }

    // Two files declaring the same fqn leave exactly one entity: the later one.
    #[test]
    fn later_definition_wins(first in "[A-Za-z ]{1,20}", second in "[A-Za-z ]{1,20}") {
        let entry = |text: &str| format!("/**\n * tty.isatty(fd) -> Boolean\n *\n * Returns {}.\n **/\n", text.trim());
        let (corpus, warnings) = corpus_of(&[("a.js", entry(&first)), ("b.js", entry(&second))]);
        let entity = corpus.lookup("tty.isatty").unwrap();
        prop_assert_eq!(&entity.summary, &format!("Returns {}.", second.trim()));
        prop_assert_eq!(corpus.children("tty").len(), 1);
        prop_assert_eq!(
            warnings.iter().filter(|w| matches!(w, Warning::DuplicateEntity { .. })).count(),
            1
        );
    }

    // Unresolvable links are kept and flagged, never dropped.
    #[test]
    fn dangling_references_are_retained(target in "[a-z]{3,8}\\.[a-z]{3,8}") {
        prop_assume!(target != "tty.isatty");
        let src = format!("/**\n * class tty\n **/\n/**\n * tty.isatty(fd) -> Boolean\n *\n * See [[{}]].\n **/\n", target);
        let build = build_sources(&[(PathBuf::from("tty.js"), src)]);
        let refs = &build.corpus.lookup("tty.isatty").unwrap().references;
        prop_assert_eq!(refs.len(), 1);
        prop_assert!(refs[0].dangling);
        prop_assert_eq!(&refs[0].target, &LinkTarget::Internal(target.clone()));
        prop_assert_eq!(build.corpus.dangling_references().len(), 1);
        prop_assert_eq!(build.report.count("dangling-reference"), 1);
    }
}

#[test]
fn reference_error_constructor() {
    let src = std::fs::read_to_string(format!(
        "{}/tests/fixtures/lib/ReferenceError.js",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap();
    let build = build_sources(&[(PathBuf::from("ReferenceError.js"), src)]);
    let ctor = build.corpus.lookup("ReferenceError.new").unwrap();
    assert_eq!(ctor.kind, EntityKind::Constructor);
    assert_eq!(ctor.name, "ReferenceError");
    assert_eq!(ctor.parameters.len(), 3);
    assert!(ctor.parameters.iter().all(|p| p.optional));
    assert_eq!(ctor.returns, None);
    assert!(build.report.is_clean());
}

#[test]
fn malformed_sibling_does_not_stop_the_file() {
    let src = std::fs::read_to_string(format!(
        "{}/tests/fixtures/broken.js",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap();
    let build = build_sources(&[(PathBuf::from("broken.js"), src)]);
    assert!(build.corpus.lookup("tty.isatty").is_none());
    assert!(build.corpus.lookup("tty.setRawMode").is_some());
    assert_eq!(build.report.count("malformed-signature"), 1);
    assert_eq!(build.report.count("orphan-parameter"), 1);
    assert_eq!(build.report.count("dangling-reference"), 1);
}
