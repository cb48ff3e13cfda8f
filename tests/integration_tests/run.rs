// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use indoc::indoc;
use tempfile::TempDir;

use crate::{chime_wbtoa, get_cmd_output};

struct Session {
    tmp_dir: TempDir,
    input: String,
    output: PathBuf,
    config: String,
}

fn get_session() -> Session {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let input = tmp_dir.path().join("input");
    let output = tmp_dir.path().join("output");
    std::fs::create_dir(&input).unwrap();
    std::fs::create_dir(&output).unwrap();
    for name in [
        "CHIME_J0000+0000_beam_1_59000_00001.ar",
        "CHIME_J0000+0000_beam_2_59001_00002.ar",
    ] {
        std::fs::write(input.join(name), "raw").unwrap();
    }
    std::fs::write(tmp_dir.path().join("J0000.spl"), "model").unwrap();
    let config = tmp_dir.path().join("pulsars.json");
    std::fs::write(
        &config,
        indoc! {r#"
            [
                {
                    "name": "J0000+0000",
                    "dm": 12.5,
                    "model_portrait": "J0000.spl",
                    "nchan": 64,
                    "nsub": 2,
                    "zap_chans": "0 1 63"
                }
            ]
        "#},
    )
    .unwrap();

    Session {
        input: input.display().to_string(),
        output,
        config: config.display().to_string(),
        tmp_dir,
    }
}

#[test]
fn test_run_dry_run_logs_commands() {
    let session = get_session();

    #[rustfmt::skip]
    let cmd = chime_wbtoa()
        .args([
            "run",
            "--input-dir", &session.input,
            "--output-dir", &session.output.display().to_string(),
            "--config", &session.config,
            "--dry-run",
        ])
        .ok();
    assert!(cmd.is_ok(), "run --dry-run failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert_eq!(stdout.matches("RUN $ psrsh").count(), 2, "{stdout}");
    assert_eq!(stdout.matches("RUN $ pam").count(), 2, "{stdout}");
    assert_eq!(stdout.matches("RUN $ paz").count(), 2, "{stdout}");
    // Nothing is written in a dry run.
    assert_eq!(std::fs::read_dir(&session.output).unwrap().count(), 0);
}

#[test]
fn test_run_from_arg_file_and_save_toml() {
    let session = get_session();
    let arg_file = session.tmp_dir.path().join("args.json");
    std::fs::write(
        &arg_file,
        format!(
            r#"{{ "input_dir": "{}", "config": "{}" }}"#,
            session.input, session.config
        ),
    )
    .unwrap();
    let saved = session.tmp_dir.path().join("saved.toml");

    #[rustfmt::skip]
    let cmd = chime_wbtoa()
        .args([
            "run", &arg_file.display().to_string(),
            "--output-dir", &session.output.display().to_string(),
            "--save-toml", &saved.display().to_string(),
            "--dry-run",
        ])
        .ok();
    assert!(cmd.is_ok(), "run failed: {}", cmd.err().unwrap());
    let saved = std::fs::read_to_string(saved).unwrap();
    assert!(saved.contains("input_dir"), "{saved}");
    assert!(saved.contains("output_dir"), "{saved}");
}

#[test]
fn test_run_without_config_fails() {
    let session = get_session();

    #[rustfmt::skip]
    let cmd = chime_wbtoa()
        .args([
            "run",
            "--input-dir", &session.input,
            "--output-dir", &session.output.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("--config"), "{stderr}");
}
