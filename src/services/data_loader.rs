//! Export file loading
//!
//! Materializes a `RecordSet` from one or more JSON export files. This is the
//! upstream collaborator for the aggregator: once `load` returns, every
//! record the report needs is in memory.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::types::{RecordSet, Result, TracemeterError};

/// Loads `{ "traces": [...], "generations": [...] }` export files
pub struct DataLoaderService {
    input: String,
}

impl DataLoaderService {
    /// `input` is a file path or a glob pattern (e.g. `exports/*.json`)
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }

    /// Resolve the input to a sorted list of files
    pub fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let direct = Path::new(&self.input);
        if direct.is_file() {
            return Ok(vec![direct.to_path_buf()]);
        }

        let matched = glob::glob(&self.input)
            .map_err(|e| TracemeterError::Parse(format!("invalid pattern {}: {}", self.input, e)))?;

        // An unreadable entry would leave the record set incomplete
        let mut files: Vec<PathBuf> = matched
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                TracemeterError::Parse(format!(
                    "cannot read {}: {}",
                    e.path().display(),
                    e.error()
                ))
            })?
            .into_iter()
            .filter(|p| p.is_file())
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(TracemeterError::Parse(format!(
                "no export files matched {}",
                self.input
            )));
        }
        Ok(files)
    }

    /// Parse all matching files in parallel and merge them in path order
    pub fn load(&self) -> Result<RecordSet> {
        let files = self.collect_files()?;
        tracing::info!(files = files.len(), input = %self.input, "loading export files");

        // par_iter().collect() keeps input order
        let parsed: Vec<RecordSet> = files
            .par_iter()
            .map(|f| parse_file(f))
            .collect::<Result<Vec<_>>>()?;

        let mut records = RecordSet::default();
        for set in parsed {
            records.extend(set);
        }

        tracing::debug!(
            traces = records.traces.len(),
            generations = records.generations.len(),
            "export files merged"
        );
        Ok(records)
    }
}

/// Parse a single export file
pub fn parse_file(path: &Path) -> Result<RecordSet> {
    let mut bytes = std::fs::read(path)?;
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        tracing::debug!(path = %path.display(), "empty export file");
        return Ok(RecordSet::default());
    }

    simd_json::serde::from_slice(&mut bytes)
        .map_err(|e| TracemeterError::Parse(format!("{}: {}", path.display(), e)))
}
