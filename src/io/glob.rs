// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Functions to glob files.

use std::path::{Path, PathBuf};

use glob::{glob, Pattern};
use thiserror::Error;

/// Given a glob pattern, get all of the matches from the filesystem. The
/// matches are sorted.
pub(crate) fn get_all_matches_from_glob(g: &str) -> Result<Vec<PathBuf>, GlobError> {
    let mut entries = vec![];
    for entry in glob(g)? {
        match entry {
            Ok(e) => entries.push(e),
            Err(e) => return Err(GlobError::GlobCrate(e)),
        }
    }
    entries.sort_unstable();
    Ok(entries)
}

/// Does the file name of `path` match the glob pattern `g`? Only the final
/// component of `path` is tested.
pub(crate) fn glob_matches(g: &str, path: &Path) -> Result<bool, GlobError> {
    let pattern = Pattern::new(g)?;
    Ok(path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| pattern.matches(n))
        .unwrap_or(false))
}

#[derive(Error, Debug)]
/// Error type associated with glob helper functions.
pub enum GlobError {
    #[error(transparent)]
    GlobCrate(#[from] glob::GlobError),

    #[error(transparent)]
    PatternError(#[from] glob::PatternError),
}
