//! pdoc: parse PDoc-style `/** ... **/` documentation comments into a
//! queryable reference model, and render it.
//!
//! ```no_run
//! use pdoc::build::{build_files, discover, BuildConfig};
//!
//! let config = BuildConfig::default();
//! let files = discover(&["docs/".to_string()], &config)?;
//! let build = build_files(&files, &config)?;
//! for root in build.corpus.roots() {
//!     println!("{} ({} members)", root.fqn, build.corpus.children(&root.fqn).len());
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod build;
pub mod corpus;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;
pub mod toc;
pub mod xref;

pub use build::{Build, BuildConfig};
pub use corpus::Corpus;
pub use error::{BuildReport, SignatureError, Warning};
pub use model::{CrossReference, DocEntity, EntityKind, LinkTarget, MemberScope, ParamSpec, TypeRef};
pub use parser::{parse_file, ParsedFile};
