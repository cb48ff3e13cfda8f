// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The wideband TOA pipeline.
//!
//! For each configured pulsar, every fold-mode archive is
//!
//! 1. converted and RFI-zapped with a `psrsh` script (`.zap`),
//! 2. scrunched in frequency and time with `pam`, installing the pulsar's DM
//!    (`.ftscr`),
//! 3. zapped again on a per-pulsar channel list with `paz` (`.pzap`).
//!
//! The fully reduced archives are listed in a metafile, TOAs are measured
//! from them and a JSON summary of the run is written to the output
//! directory.

mod config;
mod error;
mod exec;
#[cfg(feature = "fits")]
mod fits;
mod summary;
mod toas;

pub use config::{read_pulsar_configs, PulsarConfig, PulsarConfigError};
pub use error::PipelineError;
pub use exec::{CommandRunner, CommandStatus, ExternalCommand, ProcessRunner};
pub use summary::{psrchive_version, ExecSummary, PulsarSummary};
pub use toas::{count_toas, CommandToaGenerator, ToaError, ToaGenerator, ToaRequest};

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, error, info, warn};
use vec1::Vec1;

use crate::{
    constants::EXEC_SUMMARY_FILENAME,
    io::{
        check_input_file, check_read_dir, check_write_dir, find_program,
        get_all_matches_from_glob, glob_matches,
    },
    PROGRESS_BARS,
};
use exec::run_logged;

/// The PSRCHIVE programs run for every archive.
const PSRCHIVE_PROGRAMS: [&str; 3] = ["psrsh", "pam", "paz"];

/// The outcome of reducing a single archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOutcome {
    Success,
    SkippedExisting,
    Failed,
}

/// Parsed, validated parameters of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineParams {
    pub pulsars: Vec1<PulsarConfig>,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,

    /// Archives named by an input metafile. If `None`, each pulsar's archives
    /// are found by globbing the input directory.
    pub input_files: Option<Vec<PathBuf>>,

    /// The `psrsh` script used to convert and zap raw archives.
    pub zap_script: String,

    /// Reduce archives again even if their final product exists.
    pub reprocess: bool,

    /// The command line of this run, recorded in the summary (and in FITS
    /// headers, if enabled).
    pub command_line: String,
}

impl PipelineParams {
    /// Validate the directories and, if given, read the input metafile. The
    /// metafile lists one archive per line, relative to `input_dir`.
    pub fn new(
        pulsars: Vec1<PulsarConfig>,
        input_dir: &Path,
        output_dir: &Path,
        input_metafile: Option<&Path>,
        zap_script: String,
        reprocess: bool,
        command_line: String,
    ) -> Result<PipelineParams, PipelineError> {
        check_read_dir(input_dir).map_err(PipelineError::InputDir)?;
        check_write_dir(output_dir).map_err(PipelineError::OutputDir)?;
        let input_dir = input_dir.canonicalize()?;
        let output_dir = output_dir.canonicalize()?;

        let input_files = match input_metafile {
            Some(metafile) => Some(read_input_metafile(metafile, &input_dir)?),
            None => None,
        };

        Ok(PipelineParams {
            pulsars,
            input_dir,
            output_dir,
            input_files,
            zap_script,
            reprocess,
            command_line,
        })
    }

    /// Check that every external program the pipeline runs is on `PATH`.
    pub fn check_programs(&self, toa_generator: &dyn ToaGenerator) -> Result<(), PipelineError> {
        for program in PSRCHIVE_PROGRAMS.into_iter().chain(toa_generator.program()) {
            find_program(program).map_err(PipelineError::MissingProgram)?;
        }
        Ok(())
    }

    /// Reduce and time every pulsar. In a dry run, commands are only logged
    /// and nothing is written.
    pub fn run(
        &self,
        runner: &dyn CommandRunner,
        toa_generator: &dyn ToaGenerator,
        dry_run: bool,
    ) -> Result<ExecSummary, PipelineError> {
        let mut exec_summary = ExecSummary::new(psrchive_version(), self.command_line.clone());

        for pulsar in self.pulsars.iter() {
            info!("### Processing {} ###", pulsar.name);
            let summary = self.run_pulsar(pulsar, runner, toa_generator, dry_run)?;
            info!(
                "{}: {} archives, {} reduced, {} already reduced, {} failed",
                pulsar.name,
                summary.num_files_total,
                summary.num_files_success,
                summary.num_files_skip_exist,
                summary.num_files_failed
            );
            exec_summary.pulsars.insert(pulsar.name.clone(), summary);
        }

        if dry_run {
            info!("Dry run -- not writing the execution summary");
        } else {
            exec_summary.write(&self.output_dir.join(EXEC_SUMMARY_FILENAME))?;
        }
        Ok(exec_summary)
    }

    fn run_pulsar(
        &self,
        pulsar: &PulsarConfig,
        runner: &dyn CommandRunner,
        toa_generator: &dyn ToaGenerator,
        dry_run: bool,
    ) -> Result<PulsarSummary, PipelineError> {
        let input_files = self.pulsar_input_files(pulsar)?;
        let mut summary = PulsarSummary {
            num_files_total: input_files.len(),
            ..Default::default()
        };
        if input_files.is_empty() {
            warn!("No archives were found for {}", pulsar.name);
        }

        let pb = ProgressBar::with_draw_target(
            Some(input_files.len() as u64),
            if PROGRESS_BARS.load() {
                ProgressDrawTarget::stdout()
            } else {
                ProgressDrawTarget::hidden()
            },
        )
        .with_style(
            ProgressStyle::default_bar()
                .template("{msg:16}: [{wide_bar:.blue}] {pos:3}/{len:3} archives ({elapsed_precise}<{eta_precise})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        )
        .with_message(pulsar.name.clone());
        for ar_file in &input_files {
            match self.process_file(ar_file, pulsar, runner, dry_run) {
                FileOutcome::Success => summary.num_files_success += 1,
                FileOutcome::SkippedExisting => summary.num_files_skip_exist += 1,
                FileOutcome::Failed => summary.num_files_failed += 1,
            }
            pb.inc(1);
        }
        pb.finish();

        let metafile = self.output_dir.join(format!("{}.meta", pulsar.name));
        let timfile = self.output_dir.join(format!("{}.tim", pulsar.name));
        let num_reduced = if dry_run {
            summary.num_files_success
        } else {
            self.write_output_metafile(pulsar, &metafile)?
        };

        if !dry_run && timfile.is_file() {
            info!("File {} will be rewritten", timfile.display());
            std::fs::remove_file(&timfile)?;
        }
        let request = ToaRequest {
            pulsar,
            metafile: &metafile,
            timfile: &timfile,
        };
        match toa_generator.generate(&request, runner) {
            Ok(CommandStatus::Skipped) => (),
            Ok(_) => summary.num_toas = validate_tim_file(&timfile, num_reduced * pulsar.nsub),
            Err(e) => error!("{e}"),
        }

        Ok(summary)
    }

    /// The archives of `pulsar`, from the input metafile or the input
    /// directory.
    fn pulsar_input_files(&self, pulsar: &PulsarConfig) -> Result<Vec<PathBuf>, PipelineError> {
        let pattern = format!("{}.ar", pulsar.datafile_glob_prefix());
        match &self.input_files {
            Some(files) => {
                let mut matches = vec![];
                for f in files {
                    if glob_matches(&pattern, f)? {
                        matches.push(f.clone());
                    }
                }
                Ok(matches)
            }
            None => Ok(get_all_matches_from_glob(&format!(
                "{}/{pattern}",
                self.input_dir.display()
            ))?),
        }
    }

    fn process_file(
        &self,
        ar_file: &Path,
        pulsar: &PulsarConfig,
        runner: &dyn CommandRunner,
        dry_run: bool,
    ) -> FileOutcome {
        let prefix = match ar_file.file_stem().and_then(|s| s.to_str()) {
            Some(p) => p,
            None => {
                error!("Archive {} has an unusable name", ar_file.display());
                return FileOutcome::Failed;
            }
        };
        let out = |ext: &str| self.output_dir.join(format!("{prefix}.{ext}"));
        let (zap, ftscr, pzap) = (out("zap"), out("ftscr"), out("pzap"));

        if pzap.exists() && !self.reprocess {
            info!("--- Skipping {prefix} ... Output already exists. ---");
            return FileOutcome::SkippedExisting;
        }
        info!("--- Processing {prefix} ---");
        if let Err(e) = check_input_file(ar_file) {
            error!("{e}. Skipping file.");
            return FileOutcome::Failed;
        }

        let output_dir = self.output_dir.display().to_string();
        let zap_command = ExternalCommand::new("psrsh")
            .arg(self.zap_script.as_str())
            .arg("-e")
            .arg("zap")
            .arg("-O")
            .arg(output_dir.as_str())
            .arg(ar_file.display().to_string());
        let scrunch_command = ExternalCommand::new("pam")
            .arg("-e")
            .arg("ftscr")
            .arg("-u")
            .arg(output_dir.as_str())
            .arg("--setnchn")
            .arg(pulsar.nchan.to_string())
            .arg("--setnsub")
            .arg(pulsar.nsub.to_string())
            .arg("-d")
            .arg(pulsar.dm.to_string())
            .arg(zap.display().to_string());
        let mut pzap_command = ExternalCommand::new("paz");
        if !pulsar.zap_chans.trim().is_empty() {
            pzap_command = pzap_command.arg("-z").arg(pulsar.zap_chans.trim());
        }
        let pzap_command = pzap_command
            .arg("-e")
            .arg("pzap")
            .arg("-O")
            .arg(output_dir.as_str())
            .arg(ftscr.display().to_string());

        for (command, product) in [
            (zap_command, &zap),
            (scrunch_command, &ftscr),
            (pzap_command, &pzap),
        ] {
            run_logged(runner, &command);
            if dry_run {
                continue;
            }
            if let Err(e) = check_input_file(product) {
                error!("Error reading file {}: {e}. Skipping file.", product.display());
                return FileOutcome::Failed;
            }
        }

        #[cfg(feature = "fits")]
        if !dry_run {
            match fits::update_fits_header(&pzap, &self.command_line, 3) {
                Ok(()) => info!("Updated FITS header for {}", pzap.display()),
                Err(e) => error!("Failed to update FITS header for {}: {e}", pzap.display()),
            }
        }

        FileOutcome::Success
    }

    /// List every fully reduced archive of `pulsar` in `metafile`, one path
    /// per line. Returns the number of archives listed.
    fn write_output_metafile(
        &self,
        pulsar: &PulsarConfig,
        metafile: &Path,
    ) -> Result<usize, PipelineError> {
        let pzap_files = get_all_matches_from_glob(&format!(
            "{}/{}.pzap",
            self.output_dir.display(),
            pulsar.datafile_glob_prefix()
        ))?;

        info!("Creating meta file {}", metafile.display());
        let mut f = BufWriter::new(File::create(metafile)?);
        for pzap in &pzap_files {
            writeln!(f, "{}", pzap.display())?;
        }
        f.flush()?;
        Ok(pzap_files.len())
    }
}

/// Read a metafile of archive names relative to `input_dir`. Blank lines are
/// ignored; every named archive must be a readable file.
pub fn read_input_metafile(
    metafile: &Path,
    input_dir: &Path,
) -> Result<Vec<PathBuf>, PipelineError> {
    check_input_file(metafile)?;
    let f = BufReader::new(File::open(metafile)?);
    let mut files = vec![];
    for line in f.lines() {
        let line = line?;
        let name = line.trim();
        if name.is_empty() {
            continue;
        }
        let file = input_dir.join(name);
        check_input_file(&file).map_err(|err| PipelineError::MetafileEntry {
            metafile: metafile.to_path_buf(),
            line: name.to_string(),
            err,
        })?;
        files.push(file);
    }
    debug!("{} archives listed in {}", files.len(), metafile.display());
    Ok(files)
}

/// Count the TOAs in a freshly written tim file, warning if the count isn't
/// what was expected. `None` if the file can't be read.
fn validate_tim_file(timfile: &Path, num_expected: usize) -> Option<usize> {
    match count_toas(timfile) {
        Ok(n) => {
            if n == num_expected {
                info!("Successfully created {} ({n} TOAs)", timfile.display());
            } else {
                warn!(
                    "{} has {n} TOAs, but {num_expected} were expected",
                    timfile.display()
                );
            }
            Some(n)
        }
        Err(e) => {
            error!("Unable to validate {}: {e}", timfile.display());
            None
        }
    }
}
