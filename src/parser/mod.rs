//! Parser pipeline: tokenize, classify, parse signatures, assemble.

pub mod assemble;
pub mod classify;
pub mod signature;
pub mod tokenizer;

pub use assemble::ParsedFile;

use std::path::Path;

/// Parse one source file into its entity tree.
///
/// Never fails: problems inside the file become warnings on the result.
pub fn parse_file(path: &Path, content: &str) -> ParsedFile {
    let parsed = assemble::assemble(path, content);
    tracing::debug!(
        file = %path.display(),
        entities = parsed.entities.len(),
        warnings = parsed.warnings.len(),
        "parsed"
    );
    parsed
}
