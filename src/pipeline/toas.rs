// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Generation and validation of TOA (tim) files.
//!
//! Measuring wideband TOAs is delegated to an external program. The program is
//! described by a command template whose placeholders are filled in per
//! pulsar:
//!
//! - `{metafile}`: the file listing the pulsar's reduced archives;
//! - `{template}`: the pulsar's template portrait;
//! - `{timfile}`: the tim file to write;
//! - `{dm}`: the pulsar's configured DM.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use log::trace;
use thiserror::Error;

use super::{
    config::PulsarConfig,
    exec::{run_logged, CommandRunner, CommandStatus, ExternalCommand},
};

/// Commands that may start a line of a tempo2 tim file without being a TOA.
const TIM_COMMANDS: &[&str] = &[
    "FORMAT", "MODE", "INCLUDE", "JUMP", "TIME", "EFAC", "EQUAD", "SKIP", "NOSKIP", "END",
    "PHASE", "TRACK", "INFO", "SIGMA", "FMAX", "FMIN", "EMAX", "EMIN",
];

/// Everything needed to time one pulsar.
#[derive(Debug, Clone, Copy)]
pub struct ToaRequest<'a> {
    pub pulsar: &'a PulsarConfig,
    pub metafile: &'a Path,
    pub timfile: &'a Path,
}

/// Something that turns reduced archives into TOAs.
pub trait ToaGenerator: Sync {
    /// The external program this generator needs, if any, so that its
    /// presence can be checked before any work starts.
    fn program(&self) -> Option<&str>;

    /// Write TOAs for the archives listed in `request.metafile` to
    /// `request.timfile`.
    fn generate(
        &self,
        request: &ToaRequest,
        runner: &dyn CommandRunner,
    ) -> Result<CommandStatus, ToaError>;
}

/// A [`ToaGenerator`] that runs a command built from a template.
#[derive(Debug, Clone)]
pub struct CommandToaGenerator {
    tokens: Vec<String>,
}

impl CommandToaGenerator {
    /// The template is split on whitespace before placeholders are filled in,
    /// so paths with spaces in them remain single arguments.
    pub fn new(template: &str) -> Result<Self, ToaError> {
        let tokens: Vec<String> = template.split_whitespace().map(|s| s.to_string()).collect();
        if tokens.is_empty() {
            return Err(ToaError::EmptyTemplate);
        }
        if tokens[0].contains('{') || tokens[0].contains('}') {
            return Err(ToaError::PlaceholderProgram(tokens[0].clone()));
        }
        Ok(Self { tokens })
    }

    pub fn command(&self, request: &ToaRequest) -> ExternalCommand {
        let metafile = request.metafile.display().to_string();
        let template = request.pulsar.template.display().to_string();
        let timfile = request.timfile.display().to_string();
        let dm = request.pulsar.dm.to_string();

        let mut tokens = self.tokens.iter().map(|t| {
            t.replace("{metafile}", &metafile)
                .replace("{template}", &template)
                .replace("{timfile}", &timfile)
                .replace("{dm}", &dm)
        });
        // There is always a program; the template isn't empty.
        let mut command = ExternalCommand::new(tokens.next().unwrap_or_default());
        for t in tokens {
            command = command.arg(t);
        }
        command
    }
}

impl ToaGenerator for CommandToaGenerator {
    fn program(&self) -> Option<&str> {
        self.tokens.first().map(|s| s.as_str())
    }

    fn generate(
        &self,
        request: &ToaRequest,
        runner: &dyn CommandRunner,
    ) -> Result<CommandStatus, ToaError> {
        let status = run_logged(runner, &self.command(request));
        match status {
            CommandStatus::Finished { .. } if !status.success() => {
                Err(ToaError::CommandFailed(request.pulsar.name.clone()))
            }
            _ => Ok(status),
        }
    }
}

/// Count the TOA lines of a tempo2-format tim file. Blank lines, comments and
/// tim commands (FORMAT, MODE, JUMP, ...) are not TOAs.
pub fn count_toas(timfile: &Path) -> Result<usize, std::io::Error> {
    let f = BufReader::new(File::open(timfile)?);
    let mut num_toas = 0;
    for line in f.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("C ") {
            continue;
        }
        let mut fields = trimmed.split_whitespace();
        let first = fields.next().unwrap_or_default();
        if TIM_COMMANDS.contains(&first.to_uppercase().as_str()) {
            continue;
        }
        // name, freq, MJD, error, site
        if fields.count() >= 4 {
            num_toas += 1;
        } else {
            trace!("Ignoring tim line '{trimmed}'");
        }
    }
    Ok(num_toas)
}

#[derive(Error, Debug)]
pub enum ToaError {
    #[error("The TOA command template is empty")]
    EmptyTemplate,

    #[error("The TOA command template must start with a program, not the placeholder '{0}'")]
    PlaceholderProgram(String),

    #[error("The TOA command for pulsar {0} failed")]
    CommandFailed(String),
}
