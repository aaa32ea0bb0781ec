//! Build driver: input discovery, parallel parsing, sequential merge.

use crate::corpus::Corpus;
use crate::error::{BuildReport, Warning};
use crate::parser::{parse_file, ParsedFile};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Options for one build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// File extensions picked up when walking directories
    pub extensions: Vec<String>,
    /// Worker threads; `None` uses rayon's global pool
    pub jobs: Option<usize>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["js".to_string()],
            jobs: None,
        }
    }
}

impl BuildConfig {
    #[must_use]
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }
}

/// Result of a build: the corpus and everything that went wrong on the way.
#[derive(Debug)]
pub struct Build {
    pub corpus: Corpus,
    pub report: BuildReport,
}

/// Expand inputs into a sorted, de-duplicated file list.
///
/// Files are taken as-is, directories are walked recursively for the
/// configured extensions, anything else is treated as a glob pattern.
pub fn discover(inputs: &[String], config: &BuildConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let path = Path::new(input);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        if path.is_dir() {
            for entry in WalkDir::new(path).follow_links(false) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        tracing::warn!("skipping unreadable entry under {}: {}", path.display(), err);
                        continue;
                    }
                };
                if entry.file_type().is_file() && config.accepts(entry.path()) {
                    files.push(entry.into_path());
                }
            }
            continue;
        }
        let matches: Vec<_> = glob::glob(input)
            .with_context(|| format!("invalid glob pattern: {}", input))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            tracing::warn!("no files matched: {}", input);
        }
        files.extend(matches);
    }
    // merge order is path order
    files.sort();
    files.dedup();
    Ok(files)
}

/// Parse `paths` in parallel and merge them in the given order.
pub fn build_files(paths: &[PathBuf], config: &BuildConfig) -> Result<Build> {
    let read = |path: &PathBuf| -> std::result::Result<ParsedFile, Warning> {
        let content = fs::read_to_string(path).map_err(|e| Warning::UnreadableFile {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Ok(parse_file(path, &content))
    };

    let results: Vec<_> = match config.jobs {
        Some(jobs) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .context("failed to start worker pool")?;
            pool.install(|| paths.par_iter().map(read).collect())
        }
        None => paths.par_iter().map(read).collect(),
    };
    Ok(assemble(results))
}

/// Build from in-memory sources, e.g. stdin.
pub fn build_sources(sources: &[(PathBuf, String)]) -> Build {
    let results: Vec<_> = sources
        .par_iter()
        .map(|(path, content)| Ok(parse_file(path, content)))
        .collect();
    assemble(results)
}

fn assemble(results: Vec<std::result::Result<ParsedFile, Warning>>) -> Build {
    let mut corpus = Corpus::new();
    let mut report = BuildReport::default();
    for result in results {
        match result {
            Ok(file) => {
                report.files += 1;
                report.extend(corpus.merge(file));
            }
            Err(warning) => report.push(warning),
        }
    }
    report.extend(corpus.link());
    report.entities = corpus.len();
    tracing::debug!("{}", report.summary());
    Build { corpus, report }
}
