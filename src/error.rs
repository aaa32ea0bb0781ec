//! Warning taxonomy. Nothing in the pipeline is fatal; every problem is
//! downgraded to a [`Warning`] and collected in a [`BuildReport`].

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Why a signature line could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignatureError {
    #[error("unmatched closing parenthesis at column {column}")]
    UnmatchedClose { column: usize },

    #[error("unclosed parenthesis")]
    UnclosedParen,

    #[error("unclosed optional bracket")]
    UnclosedBracket,

    #[error("unmatched closing bracket at column {column}")]
    UnmatchedBracket { column: usize },

    #[error("missing argument list")]
    MissingArguments,

    #[error("missing name")]
    MissingName,

    #[error("missing return type after `->`")]
    MissingReturnType,

    #[error("missing comma before column {column}")]
    MissingComma { column: usize },

    #[error("unexpected text after argument list: {text:?}")]
    TrailingText { text: String },
}

/// A non-fatal problem found while building the corpus.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    #[error("{}:{line}: malformed signature `{signature}`: {reason}", file.display())]
    MalformedSignature {
        file: PathBuf,
        line: usize,
        signature: String,
        reason: SignatureError,
    },

    #[error("duplicate entity `{fqn}`: {replacement} replaces {previous}")]
    DuplicateEntity {
        fqn: String,
        previous: String,
        replacement: String,
    },

    #[error("dangling reference from `{source_fqn}` to `{target}`")]
    DanglingReference { source_fqn: String, target: String },

    #[error("{}:{line}: parameter `{name}` is not in the signature of `{entity}`", file.display())]
    OrphanParameter {
        file: PathBuf,
        line: usize,
        entity: String,
        name: String,
    },

    #[error("{}: unreadable: {reason}", path.display())]
    UnreadableFile { path: PathBuf, reason: String },
}

impl Warning {
    /// Short stable identifier, used for summaries.
    pub fn code(&self) -> &'static str {
        match self {
            Warning::MalformedSignature { .. } => "malformed-signature",
            Warning::DuplicateEntity { .. } => "duplicate-entity",
            Warning::DanglingReference { .. } => "dangling-reference",
            Warning::OrphanParameter { .. } => "orphan-parameter",
            Warning::UnreadableFile { .. } => "unreadable-file",
        }
    }
}

/// Warnings returned alongside the corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub files: usize,
    pub entities: usize,
    pub warnings: Vec<Warning>,
}

impl BuildReport {
    /// Record a warning and log it.
    pub fn push(&mut self, warning: Warning) {
        tracing::warn!(code = warning.code(), "{}", warning);
        self.warnings.push(warning);
    }

    pub fn extend(&mut self, warnings: impl IntoIterator<Item = Warning>) {
        for warning in warnings {
            self.push(warning);
        }
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn count(&self, code: &str) -> usize {
        self.warnings.iter().filter(|w| w.code() == code).count()
    }

    /// One-line summary, e.g. `3 files, 40 entities, 2 warnings (1 dangling-reference, ...)`.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "{} files, {} entities, {} warnings",
            self.files,
            self.entities,
            self.warnings.len()
        );
        if self.warnings.is_empty() {
            return out;
        }
        let mut codes: Vec<&'static str> = self.warnings.iter().map(Warning::code).collect();
        codes.sort_unstable();
        codes.dedup();
        let parts: Vec<String> = codes
            .into_iter()
            .map(|code| format!("{} {}", self.count(code), code))
            .collect();
        out.push_str(&format!(" ({})", parts.join(", ")));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_signature_message() {
        let w = Warning::MalformedSignature {
            file: PathBuf::from("tty.js"),
            line: 4,
            signature: "tty.isatty(fd))".to_string(),
            reason: SignatureError::UnmatchedClose { column: 15 },
        };
        assert_eq!(
            w.to_string(),
            "tty.js:4: malformed signature `tty.isatty(fd))`: unmatched closing parenthesis at column 15"
        );
        assert_eq!(w.code(), "malformed-signature");
    }

    #[test]
    fn summary_groups_codes() {
        let mut report = BuildReport {
            files: 2,
            entities: 5,
            ..Default::default()
        };
        report.push(Warning::DanglingReference {
            source_fqn: "zlib".to_string(),
            target: "zlib.options".to_string(),
        });
        report.push(Warning::DanglingReference {
            source_fqn: "zlib".to_string(),
            target: "memory".to_string(),
        });
        assert_eq!(
            report.summary(),
            "2 files, 5 entities, 2 warnings (2 dangling-reference)"
        );
        assert!(!report.is_clean());
    }
}
