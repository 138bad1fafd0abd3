// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Functions to glob files.

use std::path::{Path, PathBuf};

use glob::glob;
use thiserror::Error;

/// Given a glob pattern, get all of the matches from the filesystem.
pub(crate) fn get_all_matches_from_glob(g: &str) -> Result<Vec<PathBuf>, GlobError> {
    let mut entries = vec![];
    for entry in glob(g)? {
        match entry {
            Ok(e) => entries.push(e),
            Err(e) => return Err(GlobError::GlobCrate(e)),
        }
    }
    Ok(entries)
}

/// Get all of the regular files directly inside a directory, sorted by name.
/// Hidden files (starting with '.') are ignored.
pub(crate) fn get_sorted_files_in_dir(dir: &Path) -> Result<Vec<PathBuf>, GlobError> {
    if !dir.is_dir() {
        return Err(GlobError::NotADirectory {
            dir: dir.display().to_string(),
        });
    }
    let pattern = dir.join("*");
    let pattern = pattern.to_str().ok_or_else(|| GlobError::NonUtf8Path {
        dir: dir.display().to_string(),
    })?;
    let mut files: Vec<PathBuf> = get_all_matches_from_glob(pattern)?
        .into_iter()
        .filter(|p| p.is_file())
        .filter(|p| {
            !p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with('.'))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

#[derive(Error, Debug)]
/// Error type associated with glob helper functions.
pub enum GlobError {
    #[error("'{dir}' is not a directory")]
    NotADirectory { dir: String },

    #[error("The path '{dir}' contains invalid UTF-8")]
    NonUtf8Path { dir: String },

    #[error(transparent)]
    GlobCrate(#[from] glob::GlobError),

    #[error(transparent)]
    PatternError(#[from] glob::PatternError),
}
