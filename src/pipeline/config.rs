// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Per-pulsar processing configuration.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vec1::Vec1;

use crate::io::{check_input_file, FileCheckError};

/// How a single pulsar's archives are reduced and timed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulsarConfig {
    /// The pulsar's name, e.g. "J0000+0000". Used to find its archives.
    pub name: String,

    /// The dispersion measure to install in the archives \[pc cm^-3\].
    pub dm: f64,

    /// The template (model portrait) that TOAs are measured against. Relative
    /// paths are relative to the configuration file.
    #[serde(alias = "model_portrait")]
    pub template: PathBuf,

    /// The number of frequency channels to scrunch to.
    pub nchan: usize,

    /// The number of sub-integrations to scrunch to.
    pub nsub: usize,

    /// The channels to zap after scrunching, in `paz -z` syntax
    /// (space-separated channel indices).
    #[serde(default)]
    pub zap_chans: String,
}

impl PulsarConfig {
    /// The glob pattern (without extension) matching this pulsar's data
    /// files.
    pub fn datafile_glob_prefix(&self) -> String {
        format!("CHIME_{}_beam_?_?????_?????", self.name)
    }

    fn validate(&self) -> Result<(), PulsarConfigError> {
        if self.name.trim().is_empty() {
            return Err(PulsarConfigError::EmptyName);
        }
        if !self.dm.is_finite() || self.dm < 0.0 {
            return Err(PulsarConfigError::InvalidDm {
                name: self.name.clone(),
                dm: self.dm,
            });
        }
        if self.nchan == 0 {
            return Err(PulsarConfigError::ZeroChannels(self.name.clone()));
        }
        if self.nsub == 0 {
            return Err(PulsarConfigError::ZeroSubints(self.name.clone()));
        }
        check_input_file(&self.template).map_err(|err| PulsarConfigError::Template {
            name: self.name.clone(),
            err,
        })?;
        Ok(())
    }
}

/// The layouts a configuration file may take. JSON files may be a bare list
/// of pulsars.
#[derive(Deserialize)]
#[serde(untagged)]
enum ConfigFile {
    List(Vec<PulsarConfig>),
    Table { pulsars: Vec<PulsarConfig> },
}

impl ConfigFile {
    fn into_pulsars(self) -> Vec<PulsarConfig> {
        match self {
            ConfigFile::List(p) | ConfigFile::Table { pulsars: p } => p,
        }
    }
}

/// Read and validate the pulsar configurations in `path`. The format is
/// chosen by the file extension (json, toml, yaml or yml).
pub fn read_pulsar_configs<P: AsRef<Path>>(
    path: P,
) -> Result<Vec1<PulsarConfig>, PulsarConfigError> {
    fn inner(path: &Path) -> Result<Vec1<PulsarConfig>, PulsarConfigError> {
        debug!("Reading pulsar configuration from {}", path.display());
        check_input_file(path)?;

        let ext = path
            .extension()
            .and_then(|os_str| os_str.to_str())
            .map(|s| s.to_lowercase());
        let mut buf = BufReader::new(File::open(path)?);
        let decoded: Result<ConfigFile, String> = match ext.as_deref() {
            Some("json") => serde_json::from_reader(buf).map_err(|e| e.to_string()),
            Some("yaml" | "yml") => serde_yaml::from_reader(buf).map_err(|e| e.to_string()),
            Some("toml") => {
                let mut contents = String::new();
                buf.read_to_string(&mut contents)?;
                toml::from_str(&contents).map_err(|e| e.to_string())
            }
            _ => {
                return Err(PulsarConfigError::UnknownFormat(path.to_path_buf()));
            }
        };
        let mut pulsars = decoded
            .map_err(|err| PulsarConfigError::Decode {
                file: path.display().to_string(),
                err,
            })?
            .into_pulsars();

        // Templates are relative to the configuration file.
        let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
        for p in pulsars.iter_mut() {
            if p.template.is_relative() {
                p.template = config_dir.join(&p.template);
            }
            trace!("{p:?}");
            p.validate()?;
        }

        Vec1::try_from_vec(pulsars).map_err(|_| PulsarConfigError::NoPulsars)
    }
    inner(path.as_ref())
}

#[derive(Error, Debug)]
pub enum PulsarConfigError {
    #[error("Pulsar configuration file {} doesn't have a recognised extension; use json, toml or yaml", .0.display())]
    UnknownFormat(PathBuf),

    #[error("Couldn't decode pulsar configuration from {file}:\n{err}")]
    Decode { file: String, err: String },

    #[error("The pulsar configuration lists no pulsars")]
    NoPulsars,

    #[error("A pulsar in the configuration has an empty name")]
    EmptyName,

    #[error("Pulsar {name} has an invalid DM ({dm}); it must be finite and non-negative")]
    InvalidDm { name: String, dm: f64 },

    #[error("Pulsar {0} has nchan = 0")]
    ZeroChannels(String),

    #[error("Pulsar {0} has nsub = 0")]
    ZeroSubints(String),

    #[error("The template for pulsar {name} isn't usable: {err}")]
    Template { name: String, err: FileCheckError },

    #[error(transparent)]
    FileCheck(#[from] FileCheckError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
