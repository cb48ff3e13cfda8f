// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use clap::Parser;
use indoc::indoc;
use serial_test::serial;
use tempfile::TempDir;

use super::*;
use crate::pipeline::ToaGenerator;

struct Session {
    tmp_dir: TempDir,
    input: PathBuf,
    output: PathBuf,
    config: PathBuf,
}

fn get_session() -> Session {
    let tmp_dir = TempDir::new().unwrap();
    let input = tmp_dir.path().join("input");
    let output = tmp_dir.path().join("output");
    std::fs::create_dir(&input).unwrap();
    std::fs::create_dir(&output).unwrap();
    std::fs::write(input.join("CHIME_J0000+0000_beam_1_59000_00001.ar"), "raw").unwrap();
    std::fs::write(tmp_dir.path().join("J0000.spl"), "model").unwrap();
    let config = tmp_dir.path().join("pulsars.toml");
    std::fs::write(
        &config,
        indoc! {r#"
            [[pulsars]]
            name = "J0000+0000"
            dm = 12.5
            template = "J0000.spl"
            nchan = 64
            nsub = 2
            zap_chans = "0 1 63"
        "#},
    )
    .unwrap();
    Session {
        tmp_dir,
        input,
        output,
        config,
    }
}

fn as_string(p: &Path) -> String {
    p.display().to_string()
}

#[test]
fn test_cli_args_parse() {
    let args = RunArgs::parse_from([
        "run",
        "--input-dir",
        "in",
        "-o",
        "out",
        "--config",
        "pulsars.json",
        "--toa-command",
        "pptoas -d {metafile} -m {template} -o {timfile}",
        "--reprocess",
    ]);
    assert_eq!(args.input_dir, Some(PathBuf::from("in")));
    assert_eq!(args.output_dir, Some(PathBuf::from("out")));
    assert_eq!(args.config, Some(PathBuf::from("pulsars.json")));
    assert!(args.metafile.is_none());
    assert!(args.zap_script.is_none());
    assert!(args.reprocess);
}

#[test]
fn test_merge_prefers_cli_args() {
    let session = get_session();
    let arg_file = session.tmp_dir.path().join("args.toml");
    std::fs::write(
        &arg_file,
        format!(
            indoc! {r#"
                input_dir = "{}"
                output_dir = "/does/not/exist"
                config = "{}"
                zap_script = "file.psh"
                reprocess = true
            "#},
            as_string(&session.input),
            as_string(&session.config)
        ),
    )
    .unwrap();

    let output = as_string(&session.output);
    let args = RunArgs::parse_from([
        "run",
        &as_string(&arg_file),
        "--output-dir",
        &output,
    ])
    .merge()
    .unwrap();
    assert!(args.args_file.is_none());
    assert_eq!(args.input_dir.as_ref(), Some(&session.input));
    assert_eq!(args.output_dir.as_ref(), Some(&session.output));
    assert_eq!(args.zap_script.as_deref(), Some("file.psh"));
    assert!(args.reprocess);
    assert!(args.toa_command.is_none());
}

#[test]
fn test_merge_rejects_unknown_arg_file_type() {
    let session = get_session();
    let arg_file = session.tmp_dir.path().join("args.ini");
    std::fs::write(&arg_file, "input_dir = in").unwrap();
    let result = RunArgs::parse_from(["run", &as_string(&arg_file)]).merge();
    assert!(matches!(result, Err(ChimeWbError::ArgFile(_))));
}

#[test]
#[serial]
fn test_missing_arguments() {
    let session = get_session();
    let result = RunArgs::parse_from(["run", "-o", &as_string(&session.output)]).parse();
    assert!(matches!(
        result,
        Err(RunArgsError::MissingArgument("--input-dir"))
    ));

    let result = RunArgs::parse_from([
        "run",
        "-i",
        &as_string(&session.input),
        "-o",
        &as_string(&session.output),
    ])
    .parse();
    assert!(matches!(result, Err(RunArgsError::MissingArgument("--config"))));
}

#[test]
#[serial]
fn test_parse_applies_defaults() {
    let session = get_session();
    let (params, toa_generator) = RunArgs::parse_from([
        "run",
        "-i",
        &as_string(&session.input),
        "-o",
        &as_string(&session.output),
        "-c",
        &as_string(&session.config),
    ])
    .parse()
    .unwrap();
    assert_eq!(params.zap_script, DEFAULT_ZAP_SCRIPT);
    assert!(!params.reprocess);
    assert!(params.input_files.is_none());
    assert_eq!(params.pulsars[0].name, "J0000+0000");
    assert_eq!(
        toa_generator.program(),
        DEFAULT_TOA_COMMAND.split_whitespace().next()
    );
}

#[test]
#[serial]
fn test_bad_toa_command() {
    let session = get_session();
    let result = RunArgs::parse_from([
        "run",
        "-i",
        &as_string(&session.input),
        "-o",
        &as_string(&session.output),
        "-c",
        &as_string(&session.config),
        "--toa-command",
        "   ",
    ])
    .parse();
    assert!(matches!(result, Err(RunArgsError::Toa(_))));
}

#[test]
#[serial]
fn test_dry_run_writes_nothing() {
    let session = get_session();
    let args = RunArgs::parse_from([
        "run",
        "-i",
        &as_string(&session.input),
        "-o",
        &as_string(&session.output),
        "-c",
        &as_string(&session.config),
    ]);
    // The PSRCHIVE programs aren't needed in a dry run.
    args.run(true).unwrap();
    assert_eq!(std::fs::read_dir(&session.output).unwrap().count(), 0);
}
