use anyhow::{anyhow, Result};

use std::path::Path;
use std::time::Duration;
use subprocess::{ExitStatus, Popen, PopenConfig, Redirection};

/// Result of building and running one test case under one compiler.
pub struct RunResult {
    /// The checksum line(s) the test binary printed.
    pub output: String,
    /// `true` if the build-and-run script exited with status zero.
    pub compilation: bool,
    /// `true` if the script finished inside the timeout.
    pub termination: bool,
}

/// Runs a build script against a test-case directory for a bounded number
/// of seconds.
///
/// # Arguments
/// - `script`: path to a script that compiles the artifact set in the
///   given directory and runs the resulting binary
/// - `case_dir`: directory holding the emitted test case
/// - `timeout`: seconds before we kill the script; defaults to 30
///
/// # Notes
/// We ignore stderr and return stdout. A hung compile and a hung test
/// binary both surface as `termination == false`.
pub fn run(script: &str, case_dir: &Path, timeout: Option<u64>) -> Result<RunResult> {
    let dir_arg = case_dir
        .to_str()
        .ok_or(anyhow!("Unable to coerce case directory into string."))?;

    let mut p = Popen::create(
        &[script, dir_arg],
        PopenConfig {
            stdout: Redirection::Pipe,
            ..Default::default()
        },
    )?;

    let mut communicator = p.communicate_start(None);
    communicator = communicator.limit_time(Duration::from_secs(timeout.unwrap_or(30)));
    let read = communicator.read_string();

    let output = (match read {
        Ok((res, _)) => res,
        Err(err) => err
            .capture
            .0
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()),
    })
    .ok_or(anyhow!("Unable to parse the output streams from process."))?;

    let (termination, compilation) = if let Some(exit_status) = p.poll() {
        match exit_status {
            ExitStatus::Exited(s) => (true, s == 0),
            _ => (true, false),
        }
    } else {
        p.terminate()?;
        (false, true)
    };

    Ok(RunResult {
        output,
        compilation,
        termination,
    })
}
