//! External tool invocation.
//!
//! Compression, encryption and image conversion are delegated to programs
//! found on the host (`lzma`, `bzip2`, `gzip`, `gpg`, ImageMagick). Every
//! invocation goes through [`CommandExecutor`] so the pipeline can be driven
//! by stubs and mocks in tests.

pub mod cipher;
pub mod compress;
pub mod convert;

use crate::error::{PipelineError, Result};
use camino::Utf8Path;
use log::debug;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;
use wait_timeout::ChildExt;

pub use cipher::{Encryptor, GpgEncryptor};
pub use compress::{CompressionAlgorithm, Compressor, ExternalCompressor};
pub use convert::{ImageMagickConverter, JpegConverter};

/// Upper bound for a single tool invocation (10 minutes).
const TOOL_TIMEOUT: Duration = Duration::from_secs(600);

/// Abstraction for running external commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor {
    /// Runs a command with arguments and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use prompt_extract::tools::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run("gpg", &["--version"])?;
    /// assert!(output.status.success());
    /// # Ok::<(), prompt_extract::error::PipelineError>(())
    /// ```
    fn run<'a>(&self, cmd: &str, args: &'a [&'a str]) -> Result<Output>;

    /// Returns `true` if `program` can be found on the search path.
    fn is_installed(&self, program: &str) -> bool;
}

/// Executes commands on the host system.
///
/// Standard output and standard error are captured; the tools invoked here
/// write their results to files, so both streams stay small. Commands that run
/// longer than ten minutes are killed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        debug!("running {cmd} {}", args.join(" "));
        let mut child = Command::new(cmd)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        match child.wait_timeout(TOOL_TIMEOUT)? {
            Some(status) => Ok(Output {
                status,
                stdout: join_drain(stdout)?,
                stderr: join_drain(stderr)?,
            }),
            None => {
                // Best effort: the process may already be gone.
                let _ = child.kill();
                let _ = child.wait();
                Err(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("{cmd} timed out after {} seconds", TOOL_TIMEOUT.as_secs()),
                )
                .into())
            }
        }
    }

    fn is_installed(&self, program: &str) -> bool {
        std::env::var_os("PATH")
            .is_some_and(|path| std::env::split_paths(&path).any(|dir| is_executable_in(&dir, program)))
    }
}

type Drain = Option<JoinHandle<std::io::Result<Vec<u8>>>>;

/// Read a child pipe to the end on its own thread so a chatty tool cannot
/// block on a full pipe.
fn drain(pipe: Option<impl Read + Send + 'static>) -> Drain {
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut bytes = Vec::new();
            pipe.read_to_end(&mut bytes)?;
            Ok(bytes)
        })
    })
}

fn join_drain(handle: Drain) -> Result<Vec<u8>> {
    let Some(handle) = handle else {
        return Ok(Vec::new());
    };
    let bytes = handle
        .join()
        .map_err(|_| std::io::Error::other("pipe reader panicked"))??;
    Ok(bytes)
}

fn is_executable_in(dir: &Path, program: &str) -> bool {
    let candidate = dir.join(program);
    if candidate.is_file() {
        return true;
    }
    cfg!(windows) && dir.join(format!("{program}.exe")).is_file()
}

/// Run `cmd args...` on behalf of `path`, turning spawn errors and unsuccessful
/// exits into [`PipelineError::ToolFailed`].
///
/// # Errors
///
/// Returns [`PipelineError::ToolFailed`] when the tool cannot be started or
/// exits with a non-zero status.
pub fn run_tool(
    executor: &dyn CommandExecutor,
    cmd: &str,
    args: &[&str],
    path: &Utf8Path,
) -> Result<()> {
    let output = executor.run(cmd, args).map_err(|err| PipelineError::ToolFailed {
        tool: cmd.to_owned(),
        path: path.to_owned(),
        message: err.to_string(),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = match stderr.trim() {
            "" => format!("exited with {}", output.status),
            text => text.to_owned(),
        };
        return Err(PipelineError::ToolFailed {
            tool: cmd.to_owned(),
            path: path.to_owned(),
            message,
        });
    }

    Ok(())
}
