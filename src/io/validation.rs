// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Checks on the files, directories and external programs used by a run.

use std::{
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
};

use log::{debug, trace};
use thiserror::Error;

/// Check that `dir` exists, is a directory and can be listed.
pub(crate) fn check_read_dir(dir: &Path) -> Result<(), FileCheckError> {
    if !dir.exists() {
        return Err(FileCheckError::DoesNotExist(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(FileCheckError::NotADirectory(dir.to_path_buf()));
    }
    if std::fs::read_dir(dir).is_err() {
        return Err(FileCheckError::NotReadable(dir.to_path_buf()));
    }
    debug!("Directory {} OK", dir.display());
    Ok(())
}

/// Check that `dir` is a readable directory that files can be written into.
pub(crate) fn check_write_dir(dir: &Path) -> Result<(), FileCheckError> {
    check_read_dir(dir)?;
    let probe = dir.join(format!(".{}_write_test", env!("CARGO_PKG_NAME")));
    can_write_to_file(&probe).map_err(|_| FileCheckError::NotWritable(dir.to_path_buf()))?;
    debug!("Directory {} is writable", dir.display());
    Ok(())
}

/// Check that `file` exists, is a regular file and can be opened for reading.
pub(crate) fn check_input_file(file: &Path) -> Result<(), FileCheckError> {
    if !file.exists() {
        return Err(FileCheckError::DoesNotExist(file.to_path_buf()));
    }
    if !file.is_file() {
        return Err(FileCheckError::NotAFile(file.to_path_buf()));
    }
    if File::open(file).is_err() {
        return Err(FileCheckError::NotReadable(file.to_path_buf()));
    }
    trace!("File {} OK", file.display());
    Ok(())
}

/// Test whether `file` can be written to without disturbing its contents. A
/// file that didn't exist before the test is removed again.
pub(crate) fn can_write_to_file(file: &Path) -> Result<(), FileCheckError> {
    trace!("Testing whether we can write to {}", file.display());
    let file_exists = file.exists();

    match OpenOptions::new()
        .append(true)
        .create(true)
        .open(file)
        .map_err(|e| e.kind())
    {
        Ok(_) => {
            if !file_exists {
                std::fs::remove_file(file)?;
            }
            Ok(())
        }

        Err(std::io::ErrorKind::PermissionDenied) => {
            Err(FileCheckError::NotWritable(file.to_path_buf()))
        }

        Err(e) => Err(FileCheckError::IO(e.into())),
    }
}

/// Search the directories of `PATH` for an executable called `program`. If
/// `program` has more than one path component it is checked directly.
pub(crate) fn find_program(program: &str) -> Result<PathBuf, FileCheckError> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return if is_executable(candidate) {
            Ok(candidate.to_path_buf())
        } else {
            Err(FileCheckError::ProgramNotFound(program.to_string()))
        };
    }

    let path_var = std::env::var_os("PATH").unwrap_or_default();
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(program))
        .find(|p| is_executable(p))
        .map(|p| {
            debug!("Command {program} OK ({})", p.display());
            p
        })
        .ok_or_else(|| FileCheckError::ProgramNotFound(program.to_string()))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[derive(Error, Debug)]
pub enum FileCheckError {
    #[error("{} does not exist", .0.display())]
    DoesNotExist(PathBuf),

    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("{} is not a file", .0.display())]
    NotAFile(PathBuf),

    #[error("{} is not readable", .0.display())]
    NotReadable(PathBuf),

    #[error("{} is not writable", .0.display())]
    NotWritable(PathBuf),

    #[error("Command '{0}' was not found on PATH")]
    ProgramNotFound(String),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
