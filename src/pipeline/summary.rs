// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The execution summary written at the end of a pipeline run.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    process::Command,
};

use log::{info, warn};
use serde::{Deserialize, Serialize};

/// File counts for a single pulsar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulsarSummary {
    pub num_files_total: usize,
    pub num_files_success: usize,
    pub num_files_skip_exist: usize,
    pub num_files_failed: usize,

    /// The number of TOAs in the pulsar's tim file, if it could be counted.
    pub num_toas: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecSummary {
    pub psrchive_version: String,
    pub command_line: String,
    pub timestamp: String,

    /// Keyed by pulsar name.
    pub pulsars: BTreeMap<String, PulsarSummary>,
}

impl ExecSummary {
    pub fn new(psrchive_version: String, command_line: String) -> Self {
        Self {
            psrchive_version,
            command_line,
            timestamp: chrono::Local::now().to_rfc3339(),
            pulsars: BTreeMap::new(),
        }
    }

    /// Write the summary as pretty-printed JSON.
    pub fn write(&self, file: &Path) -> Result<(), std::io::Error> {
        let mut f = BufWriter::new(File::create(file)?);
        serde_json::to_writer_pretty(&mut f, self)?;
        writeln!(f)?;
        f.flush()?;
        info!("Wrote execution summary {}", file.display());
        Ok(())
    }
}

/// Ask PSRCHIVE for its version. "Unknown" is returned if that fails.
pub fn psrchive_version() -> String {
    match Command::new("psrchive").arg("--version").output() {
        Ok(output) if output.status.success() => {
            parse_psrchive_version(&String::from_utf8_lossy(&output.stdout))
        }
        _ => {
            warn!("Unable to get the PSRCHIVE version");
            "Unknown".to_string()
        }
    }
}

fn parse_psrchive_version(s: &str) -> String {
    let s = s.trim();
    s.strip_prefix("psrchive ").unwrap_or(s).trim().to_string()
}
