// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all chime-wbtoa-related errors. This should be the *only*
//! error enum that is publicly visible from the command line.

use thiserror::Error;

use super::{align::AlignArgsError, dm_search::DmSearchArgsError, run::RunArgsError};
use crate::{
    dm_search::DmSearchError,
    io::FileCheckError,
    pipeline::{PipelineError, PulsarConfigError, ToaError},
    portrait::{PortraitError, PortraitReadError},
};

#[derive(Error, Debug)]
pub enum ChimeWbError {
    /// An error related to reading or handling a portrait.
    #[error("{0}")]
    Portrait(String),

    /// An error related to the DM search.
    #[error("{0}\n\nTry widening the trial DM grid (--min-dm/--max-dm) or adding trials (--num-trials)")]
    DmSearch(String),

    /// An error related to pulsar configuration files.
    #[error("{0}")]
    PulsarConfig(String),

    /// An error related to running the pipeline.
    #[error("{0}")]
    Pipeline(String),

    /// An error related to argument files.
    #[error("{0}")]
    ArgFile(String),

    /// An error related to plotting.
    #[error("{0}")]
    Plot(String),

    /// A generic error that can't be clarified further, e.g. IO errors.
    #[error("{0}")]
    Generic(String),
}

// Subcommand argument errors.

impl From<RunArgsError> for ChimeWbError {
    fn from(e: RunArgsError) -> Self {
        let s = e.to_string();
        match e {
            RunArgsError::MissingArgument(_) => Self::Generic(s),
            RunArgsError::Toa(_) => Self::Pipeline(s),
            RunArgsError::PulsarConfig(e) => Self::from(e),
            RunArgsError::Pipeline(e) => Self::from(e),
        }
    }
}

impl From<DmSearchArgsError> for ChimeWbError {
    fn from(e: DmSearchArgsError) -> Self {
        let s = e.to_string();
        match e {
            #[cfg(not(feature = "plotting"))]
            DmSearchArgsError::NoPlottingFeature => Self::Plot(s),
            DmSearchArgsError::Output(_) => Self::Generic(s),
        }
    }
}

impl From<AlignArgsError> for ChimeWbError {
    fn from(e: AlignArgsError) -> Self {
        let s = e.to_string();
        match e {
            #[cfg(not(feature = "plotting"))]
            AlignArgsError::NoPlottingFeature => Self::Plot(s),
            AlignArgsError::ZeroSubbands => Self::Portrait(s),
            AlignArgsError::NonFiniteDeltaDm(_) => Self::Generic(s),
        }
    }
}

// Library errors.

impl From<PortraitError> for ChimeWbError {
    fn from(e: PortraitError) -> Self {
        Self::Portrait(e.to_string())
    }
}

impl From<PortraitReadError> for ChimeWbError {
    fn from(e: PortraitReadError) -> Self {
        let s = e.to_string();
        match e {
            PortraitReadError::IO(e) => Self::from(e),
            PortraitReadError::Decode { .. }
            | PortraitReadError::Ragged { .. }
            | PortraitReadError::NotFound(_)
            | PortraitReadError::Portrait(_) => Self::Portrait(s),
        }
    }
}

impl From<DmSearchError> for ChimeWbError {
    fn from(e: DmSearchError) -> Self {
        Self::DmSearch(e.to_string())
    }
}

impl From<PulsarConfigError> for ChimeWbError {
    fn from(e: PulsarConfigError) -> Self {
        let s = e.to_string();
        match e {
            PulsarConfigError::IO(e) => Self::from(e),
            _ => Self::PulsarConfig(s),
        }
    }
}

impl From<PipelineError> for ChimeWbError {
    fn from(e: PipelineError) -> Self {
        let s = e.to_string();
        match e {
            PipelineError::Config(e) => Self::from(e),
            PipelineError::IO(e) => Self::from(e),
            PipelineError::InputDir(_)
            | PipelineError::OutputDir(_)
            | PipelineError::MetafileEntry { .. }
            | PipelineError::MissingProgram(_)
            | PipelineError::Toa(_)
            | PipelineError::FileCheck(_)
            | PipelineError::Glob(_) => Self::Pipeline(s),
        }
    }
}

impl From<ToaError> for ChimeWbError {
    fn from(e: ToaError) -> Self {
        Self::Pipeline(e.to_string())
    }
}

impl From<FileCheckError> for ChimeWbError {
    fn from(e: FileCheckError) -> Self {
        Self::Generic(e.to_string())
    }
}

#[cfg(feature = "plotting")]
impl From<crate::plotting::DrawError> for ChimeWbError {
    fn from(e: crate::plotting::DrawError) -> Self {
        Self::Plot(e.to_string())
    }
}

impl From<serde_json::Error> for ChimeWbError {
    fn from(e: serde_json::Error) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<std::io::Error> for ChimeWbError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}
