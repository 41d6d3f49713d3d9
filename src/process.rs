//! External process execution.
//!
//! Every platform tool the pipeline drives (`hdiutil`, `diskutil`,
//! `installer`, `pkgutil`, `codesign`, `pkgbuild`, `createinstallmedia`,
//! `ditto`, `chmod`, `umount`, `mount`) goes through [`run`] or
//! [`run_with_env`]. Commands are non-interactive, block the pipeline until
//! they exit, and report success via exit status only.

use crate::error::{Error, Result};
use tokio::process::Command;

/// Captured output of a finished external command.
#[derive(Debug)]
pub struct ProcessOutput {
    /// Captured stdout, decoded lossily
    pub stdout: String,
    /// Captured stderr, decoded lossily
    pub stderr: String,
}

/// Run an external command to completion, capturing stdout and stderr.
///
/// Non-zero exit becomes [`Error::CommandFailed`] carrying the full command
/// line, exit code, and trimmed stderr.
pub async fn run(argv: &[&str]) -> Result<ProcessOutput> {
    run_with_env(argv, &[]).await
}

/// Same as [`run`], with extra environment variables set on the child.
pub async fn run_with_env(argv: &[&str], env: &[(&str, &str)]) -> Result<ProcessOutput> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| Error::Generic("empty command line".into()))?;

    log::debug!("executing: {}", argv.join(" "));

    let mut command = Command::new(program);
    command.args(args);
    for (key, value) in env {
        command.env(key, value);
    }

    let output = command.output().await.map_err(|source| Error::CommandSpawn {
        command: (*program).to_string(),
        source,
    })?;

    if !output.status.success() {
        return Err(Error::CommandFailed {
            command: argv.join(" "),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(ProcessOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_command_line_is_rejected() {
        let result = run(&[]).await;
        assert!(matches!(result, Err(Error::Generic(_))));
    }

    #[tokio::test]
    async fn missing_program_surfaces_spawn_error() {
        let result = run(&["definitely-not-a-real-tool-5f2a"]).await;
        match result {
            Err(Error::CommandSpawn { command, .. }) => {
                assert_eq!(command, "definitely-not-a-real-tool-5f2a");
            }
            other => panic!("expected CommandSpawn, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn nonzero_exit_carries_code_and_stderr() {
        let result = run(&["sh", "-c", "echo boom >&2; exit 3"]).await;
        match result {
            Err(Error::CommandFailed { code, stderr, .. }) => {
                assert_eq!(code, 3);
                assert_eq!(stderr, "boom");
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stdout_is_captured() {
        let output = run(&["sh", "-c", "echo hello"]).await.unwrap();
        assert_eq!(output.stdout.trim(), "hello");
    }
}
