// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

#[cfg(test)]
mod tests;

use std::{borrow::Cow, path::PathBuf};

use clap::Parser;
use itertools::Itertools;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::common::{display_warnings, InfoPrinter, Warn, ARG_FILE_HELP};
use crate::{
    constants::{DEFAULT_TOA_COMMAND, DEFAULT_ZAP_SCRIPT},
    pipeline::{
        read_pulsar_configs, CommandToaGenerator, PipelineError, PipelineParams,
        ProcessRunner, PulsarConfigError, ToaError,
    },
    ChimeWbError,
};

lazy_static::lazy_static! {
    static ref ZAP_SCRIPT_HELP: String =
        format!("The psrsh script used to convert and RFI-zap raw archives. Default: {DEFAULT_ZAP_SCRIPT}");

    static ref TOA_COMMAND_HELP: String =
        format!("The command that measures TOAs from a metafile of reduced archives. The placeholders {{metafile}}, {{template}}, {{timfile}} and {{dm}} are substituted for each pulsar. Default: '{DEFAULT_TOA_COMMAND}'");
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct RunArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    /// The directory containing the fold-mode archives.
    #[clap(short, long, parse(from_os_str), help_heading = "INPUT FILES")]
    pub(super) input_dir: Option<PathBuf>,

    /// A file listing the archives to process, one per line, relative to the
    /// input directory. If not given, each pulsar's archives are found by
    /// globbing the input directory.
    #[clap(short, long, parse(from_os_str), help_heading = "INPUT FILES")]
    pub(super) metafile: Option<PathBuf>,

    /// The pulsar configuration file (json, toml or yaml).
    #[clap(short, long, parse(from_os_str), help_heading = "INPUT FILES")]
    pub(super) config: Option<PathBuf>,

    /// The directory that reduced archives, metafiles, tim files and the
    /// execution summary are written to.
    #[clap(short, long, parse(from_os_str), help_heading = "OUTPUT FILES")]
    pub(super) output_dir: Option<PathBuf>,

    #[clap(long, help = ZAP_SCRIPT_HELP.as_str(), help_heading = "PROCESSING")]
    pub(super) zap_script: Option<String>,

    #[clap(long, help = TOA_COMMAND_HELP.as_str(), help_heading = "PROCESSING")]
    pub(super) toa_command: Option<String>,

    /// Reduce archives again even if their final products already exist.
    #[clap(long, help_heading = "PROCESSING")]
    #[serde(default)]
    pub(super) reprocess: bool,
}

impl RunArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified
    /// into a single struct. Where applicable, it will prefer CLI parameters
    /// over those in the file.
    ///
    /// This function should only ever merge arguments, and not try to make
    /// sense of them.
    pub(super) fn merge(self) -> Result<RunArgs, ChimeWbError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            // Read in the file arguments. Ensure all of the file args are
            // accounted for by pattern matching.
            let RunArgs {
                args_file: _,
                input_dir,
                metafile,
                config,
                output_dir,
                zap_script,
                toa_command,
                reprocess,
            } = unpack_arg_file!(arg_file);

            Ok(RunArgs {
                args_file: None,
                input_dir: cli_args.input_dir.or(input_dir),
                metafile: cli_args.metafile.or(metafile),
                config: cli_args.config.or(config),
                output_dir: cli_args.output_dir.or(output_dir),
                zap_script: cli_args.zap_script.or(zap_script),
                toa_command: cli_args.toa_command.or(toa_command),
                reprocess: cli_args.reprocess || reprocess,
            })
        } else {
            Ok(cli_args)
        }
    }

    fn parse(self) -> Result<(PipelineParams, CommandToaGenerator), RunArgsError> {
        debug!("{:#?}", self);

        let Self {
            args_file: _,
            input_dir,
            metafile,
            config,
            output_dir,
            zap_script,
            toa_command,
            reprocess,
        } = self;

        let input_dir = input_dir.ok_or(RunArgsError::MissingArgument("--input-dir"))?;
        let output_dir = output_dir.ok_or(RunArgsError::MissingArgument("--output-dir"))?;
        let config = config.ok_or(RunArgsError::MissingArgument("--config"))?;

        let pulsars = read_pulsar_configs(&config)?;
        let toa_command = toa_command.unwrap_or_else(|| DEFAULT_TOA_COMMAND.to_string());
        let toa_generator = CommandToaGenerator::new(&toa_command)?;
        let zap_script = zap_script.unwrap_or_else(|| DEFAULT_ZAP_SCRIPT.to_string());
        let command_line = std::env::args().join(" ");

        let params = PipelineParams::new(
            pulsars,
            &input_dir,
            &output_dir,
            metafile.as_deref(),
            zap_script,
            reprocess,
            command_line,
        )?;

        let mut printer = InfoPrinter::new("Pipeline set up".into());
        printer.push_block(vec![
            format!("Input directory:  {}", params.input_dir.display()).into(),
            format!("Output directory: {}", params.output_dir.display()).into(),
        ]);
        match (&params.input_files, &metafile) {
            (Some(files), Some(metafile)) => printer.push_line(
                format!("{} archives listed in {}", files.len(), metafile.display()).into(),
            ),
            _ => printer.push_line("Archives found by globbing the input directory".into()),
        }
        printer.push_line(format!("Zap script: {}", params.zap_script).into());
        printer.push_line(format!("TOA command: {toa_command}").into());
        let block: Vec<Cow<'static, str>> = params
            .pulsars
            .iter()
            .map(|p| {
                format!(
                    "{}: DM {} pc/cm^3, {} chans, {} subints, template {}",
                    p.name,
                    p.dm,
                    p.nchan,
                    p.nsub,
                    p.template.display()
                )
                .into()
            })
            .collect();
        printer.push_block(block);
        printer.display();

        if params.reprocess {
            "Reprocessing is on; existing products will be overwritten".warn();
        }
        if params.pulsars.iter().any(|p| p.zap_chans.trim().is_empty()) {
            "At least one pulsar has no channels to zap; paz will only rename its archives".warn();
        }
        display_warnings();

        Ok((params, toa_generator))
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), ChimeWbError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let (params, toa_generator) = self.parse()?;

        if dry_run {
            info!("Dry run -- external programs won't be run.");
        } else {
            params
                .check_programs(&toa_generator)
                .map_err(RunArgsError::from)?;
        }

        let runner = ProcessRunner { dry_run };
        let summary = params
            .run(&runner, &toa_generator, dry_run)
            .map_err(RunArgsError::from)?;
        let num_toas: usize = summary.pulsars.values().filter_map(|s| s.num_toas).sum();
        info!(
            "Processed {} pulsars; {} TOAs generated",
            summary.pulsars.len(),
            num_toas
        );
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub(super) enum RunArgsError {
    #[error("No {0} was specified")]
    MissingArgument(&'static str),

    #[error(transparent)]
    Toa(#[from] ToaError),

    #[error(transparent)]
    PulsarConfig(#[from] PulsarConfigError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
