//! Subprocess runner for the git binary.
//!
//! One process per operation, with a hard deadline: a git command that
//! outlives its timeout is killed and reported as such, so a hung remote
//! can never block a tally indefinitely.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitCmdError {
    #[error("git {args:?} timed out after {timeout:?}")]
    Timeout { args: Vec<String>, timeout: Duration },

    #[error("git {args:?} exited with {status}: {stderr}")]
    Failed {
        args: Vec<String>,
        status: i32,
        stderr: String,
    },

    #[error("failed to run git {args:?}: {source}")]
    Io {
        args: Vec<String>,
        #[source]
        source: std::io::Error,
    },
}

impl GitCmdError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// The stderr text of a failed command, if any.
    pub fn stderr(&self) -> &str {
        match self {
            Self::Failed { stderr, .. } => stderr,
            _ => "",
        }
    }
}

/// Run `git <args>` in `repo`, feeding `stdin_data` if given, with extra
/// environment variables and a hard deadline. Returns stdout on success.
pub fn run_git(
    repo: &Path,
    args: &[&str],
    stdin_data: Option<&[u8]>,
    envs: &[(&str, &str)],
    timeout: Duration,
) -> Result<Vec<u8>, GitCmdError> {
    let owned_args: Vec<String> = args.iter().map(|s| s.to_string()).collect();

    let mut cmd = Command::new("git");
    cmd.args(args)
        .current_dir(repo)
        .stdin(if stdin_data.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in envs {
        cmd.env(key, value);
    }

    let mut child = cmd.spawn().map_err(|source| GitCmdError::Io {
        args: owned_args.clone(),
        source,
    })?;

    if let Some(data) = stdin_data {
        if let Some(mut stdin) = child.stdin.take() {
            // A closed pipe here means the child already exited; its
            // status tells the real story below.
            let _ = stdin.write_all(data);
        }
    }

    // Drain stdout/stderr on threads so a chatty child cannot deadlock
    // against a full pipe while we poll for exit.
    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();
    let stdout_thread = thread::spawn(move || read_all(stdout_pipe));
    let stderr_thread = thread::spawn(move || read_all(stderr_pipe));

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait().map_err(|source| GitCmdError::Io {
            args: owned_args.clone(),
            source,
        })? {
            Some(status) => break status,
            None if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                let _ = stdout_thread.join();
                let _ = stderr_thread.join();
                return Err(GitCmdError::Timeout {
                    args: owned_args,
                    timeout,
                });
            }
            None => thread::sleep(Duration::from_millis(10)),
        }
    };

    let stdout = stdout_thread.join().unwrap_or_default();
    let stderr = stderr_thread.join().unwrap_or_default();

    if status.success() {
        Ok(stdout)
    } else {
        Err(GitCmdError::Failed {
            args: owned_args,
            status: status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
        })
    }
}

fn read_all<R: std::io::Read>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = std::io::Read::read_to_end(&mut pipe, &mut buf);
    }
    buf
}
