// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Running external programs.

use std::{
    fmt,
    process::Command,
    time::{Duration, Instant},
};

use log::{debug, error, info};

/// A program and its arguments. Arguments are handed to the program verbatim;
/// no shell is involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ExternalCommand {
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
            args: vec![],
        }
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl fmt::Display for ExternalCommand {
    /// Render the command as it would be typed into a shell, quoting any
    /// arguments with whitespace (or nothing) in them.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// What happened when a command was handed to a [`CommandRunner`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandStatus {
    /// The command wasn't run (dry run).
    Skipped,

    /// The command ran to completion. `code` is `None` if the program was
    /// killed by a signal.
    Finished { code: Option<i32>, duration: Duration },
}

impl CommandStatus {
    /// Did the command run and exit with code 0?
    pub fn success(&self) -> bool {
        matches!(self, CommandStatus::Finished { code: Some(0), .. })
    }
}

/// Something that can execute an [`ExternalCommand`].
pub trait CommandRunner: Sync {
    fn run(&self, command: &ExternalCommand) -> std::io::Result<CommandStatus>;
}

/// Runs commands as child processes, waiting for each to finish. Output of
/// the child goes straight to this program's stdout and stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner {
    pub dry_run: bool,
}

impl CommandRunner for ProcessRunner {
    fn run(&self, command: &ExternalCommand) -> std::io::Result<CommandStatus> {
        if self.dry_run {
            return Ok(CommandStatus::Skipped);
        }

        let start = Instant::now();
        let status = Command::new(&command.program)
            .args(&command.args)
            .status()?;
        Ok(CommandStatus::Finished {
            code: status.code(),
            duration: start.elapsed(),
        })
    }
}

/// Run `command` with `runner`, logging the command line and its result. A
/// command that can't be started, or that exits unsuccessfully, is logged as
/// an error; whether that matters is judged by the caller from the files left
/// behind.
pub(super) fn run_logged(runner: &dyn CommandRunner, command: &ExternalCommand) -> CommandStatus {
    info!("RUN $ {command}");
    match runner.run(command) {
        Ok(status @ CommandStatus::Skipped) => {
            debug!("Not running (dry run)");
            status
        }
        Ok(status @ CommandStatus::Finished { code, duration }) => {
            if status.success() {
                debug!("Finished in {:.3} s", duration.as_secs_f64());
            } else {
                match code {
                    Some(c) => error!(
                        "{} exited with status {c} after {:.3} s",
                        command.program,
                        duration.as_secs_f64()
                    ),
                    None => error!("{} was terminated by a signal", command.program),
                }
            }
            status
        }
        Err(e) => {
            error!("Error while executing command '{command}': {e}");
            CommandStatus::Finished {
                code: None,
                duration: Duration::ZERO,
            }
        }
    }
}
