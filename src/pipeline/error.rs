// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use thiserror::Error;

use super::{config::PulsarConfigError, toas::ToaError};
use crate::io::{FileCheckError, GlobError};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Input directory isn't usable: {0}")]
    InputDir(FileCheckError),

    #[error("Output directory isn't usable: {0}")]
    OutputDir(FileCheckError),

    #[error("Input metafile {} names {line}, which isn't usable: {err}", .metafile.display())]
    MetafileEntry {
        metafile: PathBuf,
        line: String,
        err: FileCheckError,
    },

    #[error("A program the pipeline needs isn't available: {0}")]
    MissingProgram(FileCheckError),

    #[error(transparent)]
    Config(#[from] PulsarConfigError),

    #[error(transparent)]
    Toa(#[from] ToaError),

    #[error(transparent)]
    FileCheck(#[from] FileCheckError),

    #[error(transparent)]
    Glob(#[from] GlobError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
