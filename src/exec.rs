//! External command execution.
//!
//! Every network or compression operation in this crate shells out to an
//! external tool. [`CommandRunner`] wraps the spawning, the environment
//! overlay, the captured output streams, and the failure diagnostics in one
//! place so the fetchers and the packager stay declarative.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

/// Captured result of one subprocess invocation. Not persisted.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit code; `-1` when the process was killed by a signal.
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

#[derive(Error, Debug)]
pub enum CommandError {
    /// The host refused to start the subprocess at all.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The subprocess ran and exited with a non-zero status.
    #[error("{diagnostic}")]
    Failed {
        program: String,
        cwd: PathBuf,
        code: i32,
        stdout: String,
        stderr: String,
        /// Pre-rendered message; detail depends on the runner's verbose flag.
        diagnostic: String,
    },
}

/// Spawns external tools with piped stdio and an environment overlay.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    verbose: bool,
}

impl CommandRunner {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Runs the command and fails on any non-zero exit status.
    ///
    /// `stdin` is the designated channel for secrets: it is written with a
    /// trailing newline and the stream is closed immediately, so the value
    /// never appears in the process argument list. Its content is redacted
    /// from failure diagnostics.
    pub fn run(
        &self,
        cwd: &Path,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
        stdin: Option<&str>,
    ) -> Result<ProcessOutput, CommandError> {
        let output = self.run_unchecked(cwd, program, args, env, stdin)?;
        if output.success() {
            Ok(output)
        } else {
            Err(self.failure(cwd, program, args, stdin.is_some(), output))
        }
    }

    /// Runs the command and reports the exit status through the returned
    /// [`ProcessOutput`] instead of failing. Only a spawn refusal is an error.
    pub fn run_unchecked(
        &self,
        cwd: &Path,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
        stdin: Option<&str>,
    ) -> Result<ProcessOutput, CommandError> {
        debug!(cwd = %cwd.display(), command = %render(program, args), "spawning");

        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(cwd)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in env {
            command.env(key, value);
        }

        let mut child = command.spawn().map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?;

        if let Some(input) = stdin {
            if let Some(mut pipe) = child.stdin.take() {
                // A child that exits without reading reports through its
                // status; a write error here carries no extra signal.
                let _ = writeln!(pipe, "{input}");
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|source| CommandError::Spawn {
                program: program.to_string(),
                source,
            })?;

        Ok(ProcessOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn failure(
        &self,
        cwd: &Path,
        program: &str,
        args: &[&str],
        secret_stdin: bool,
        output: ProcessOutput,
    ) -> CommandError {
        let diagnostic = if self.verbose {
            let mut text = String::from("\n==== command line failure ====\n");
            text.push_str(&format!("path        : {}\n", cwd.display()));
            text.push_str(&format!("command     : {}\n", render(program, args)));
            text.push_str(&format!("exit code   : {}\n", output.code));
            if secret_stdin {
                text.push_str("input       : **** redacted ****\n");
            }
            if !output.stdout.is_empty() {
                text.push_str(&format!("output      : {}", output.stdout));
            }
            if !output.stderr.is_empty() {
                text.push_str(&format!("error       : {}", output.stderr));
            }
            text.push_str("==============================\n");
            text
        } else {
            output.stderr.trim().to_string()
        };

        CommandError::Failed {
            program: program.to_string(),
            cwd: cwd.to_path_buf(),
            code: output.code,
            stdout: output.stdout,
            stderr: output.stderr,
            diagnostic,
        }
    }
}

fn render(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}
