//! Shared test utilities for the extractor crate.
//!
//! Available to unit tests and, through the `test-support` feature, to the
//! behaviour suites under `tests/`.

use crate::error::{PipelineError, Result};
use crate::png::{Chunk, ChunkType, PNG_SIGNATURE};
use crate::tools::CommandExecutor;
use camino::Utf8Path;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::Write;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g., "gpg").
    pub cmd: &'static str,
    /// The arguments to pass to the command.
    pub args: Vec<String>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

impl ExpectedCall {
    /// Expect `cmd args...` and answer with a successful exit.
    #[must_use]
    pub fn succeeding(cmd: &'static str, args: &[&str]) -> Self {
        Self {
            cmd,
            args: args.iter().map(|a| (*a).to_owned()).collect(),
            result: Ok(success_output()),
        }
    }

    /// Expect `cmd args...` and answer with a successful exit printing `stdout`.
    #[must_use]
    pub fn succeeding_with_stdout(cmd: &'static str, args: &[&str], stdout: &str) -> Self {
        let mut output = success_output();
        output.stdout = stdout.as_bytes().to_vec();
        Self {
            cmd,
            args: args.iter().map(|a| (*a).to_owned()).collect(),
            result: Ok(output),
        }
    }

    /// Expect the recipient preflight for `email` and list an ultimately
    /// trusted key.
    #[must_use]
    pub fn trusted_gpg_key(email: &str) -> Self {
        let listing = format!(
            "pub:u:255:22:0123456789ABCDEF:1700000000:::u:::scESC::::::23::0:\n\
             uid:u::::1700000000::HASH::<{email}>::::::::::0:\n"
        );
        Self::succeeding_with_stdout(
            "gpg",
            &["--batch", "--with-colons", "--list-keys", email],
            &listing,
        )
    }

    /// Expect `cmd args...` and answer with a failed exit carrying `stderr`.
    #[must_use]
    pub fn failing(cmd: &'static str, args: &[&str], stderr: &str) -> Self {
        Self {
            cmd,
            args: args.iter().map(|a| (*a).to_owned()).collect(),
            result: Ok(failure_output(stderr)),
        }
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records expected command invocations and returns predefined results,
/// allowing tests to verify command execution without side effects.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
    installed: Vec<String>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
            installed: Vec::new(),
        }
    }

    /// Report `programs` as installed; every other program is missing.
    #[must_use]
    pub fn with_installed(mut self, programs: &[&str]) -> Self {
        self.installed = programs.iter().map(|p| (*p).to_owned()).collect();
        self
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations, {} left",
            self.expected.borrow().len()
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        let Some(call) = self.expected.borrow_mut().pop_front() else {
            return Err(PipelineError::StubMismatch {
                message: format!("unexpected invocation of {cmd} {args:?}"),
            });
        };

        if call.cmd != cmd || call.args != args {
            return Err(PipelineError::StubMismatch {
                message: format!(
                    "expected {} {:?}, got {cmd} {args:?}",
                    call.cmd, call.args
                ),
            });
        }

        call.result
    }

    fn is_installed(&self, program: &str) -> bool {
        self.installed.iter().any(|p| p == program)
    }
}

/// Builder for small, valid RGB PNG images carrying textual chunks.
///
/// The produced stream contains `IHDR`, a `gAMA` chunk, the requested text
/// chunks, one `IDAT` with a deterministic gradient and `IEND`.
#[derive(Debug, Clone)]
pub struct PngFixture {
    width: u32,
    height: u32,
    texts: Vec<(ChunkType, String, Vec<u8>)>,
}

impl PngFixture {
    /// Start a fixture of the given size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            texts: Vec::new(),
        }
    }

    /// Add an uncompressed `tEXt` chunk.
    #[must_use]
    pub fn with_text(mut self, key: &str, text: &str) -> Self {
        self.texts.push((
            ChunkType::new(*b"tEXt"),
            key.to_owned(),
            text.as_bytes().to_vec(),
        ));
        self
    }

    /// Add a zlib-compressed `zTXt` chunk.
    #[must_use]
    pub fn with_ztxt(mut self, key: &str, text: &str) -> Self {
        let mut body = vec![0];
        body.extend(deflate(text.as_bytes()));
        self.texts
            .push((ChunkType::new(*b"zTXt"), key.to_owned(), body));
        self
    }

    /// Add a `zTXt` chunk whose body is not a zlib stream.
    #[must_use]
    pub fn with_malformed_ztxt(mut self, key: &str) -> Self {
        self.texts.push((
            ChunkType::new(*b"zTXt"),
            key.to_owned(),
            b"\0not zlib".to_vec(),
        ));
        self
    }

    /// Add an uncompressed international `iTXt` chunk.
    #[must_use]
    pub fn with_itxt(mut self, key: &str, text: &str) -> Self {
        let mut body = vec![0, 0, 0, 0];
        body.extend_from_slice(text.as_bytes());
        self.texts
            .push((ChunkType::new(*b"iTXt"), key.to_owned(), body));
        self
    }

    /// Encode the fixture.
    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        let mut out = PNG_SIGNATURE.to_vec();

        let mut header = Vec::with_capacity(13);
        header.extend_from_slice(&self.width.to_be_bytes());
        header.extend_from_slice(&self.height.to_be_bytes());
        header.extend_from_slice(&[8, 2, 0, 0, 0]);
        Chunk::new(ChunkType::new(*b"IHDR"), header).encode_into(&mut out);
        Chunk::new(ChunkType::new(*b"gAMA"), 45_455_u32.to_be_bytes().to_vec())
            .encode_into(&mut out);

        for (kind, key, body) in &self.texts {
            let mut data = key.as_bytes().to_vec();
            data.push(0);
            data.extend_from_slice(body);
            Chunk::new(*kind, data).encode_into(&mut out);
        }

        Chunk::new(ChunkType::new(*b"IDAT"), deflate(&self.scanlines())).encode_into(&mut out);
        Chunk::new(ChunkType::new(*b"IEND"), Vec::new()).encode_into(&mut out);
        out
    }

    /// Encode the fixture and write it to `path`.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while writing.
    pub fn write_to(&self, path: &Utf8Path) -> std::io::Result<()> {
        std::fs::write(path, self.build())
    }

    fn scanlines(&self) -> Vec<u8> {
        let mut raw = Vec::new();
        for y in 0..self.height {
            raw.push(0);
            for x in 0..self.width {
                raw.extend_from_slice(&[low_byte(x), low_byte(y), low_byte(x ^ y)]);
            }
        }
        raw
    }
}

/// Minimal baseline JPEG header (SOI, APP0, SOF0, EOI) for size probing.
#[must_use]
pub fn jpeg_fixture(width: u16, height: u16) -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8];
    out.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
    out.extend_from_slice(b"JFIF\0");
    out.extend_from_slice(&[1, 1, 0, 0, 1, 0, 1, 0, 0]);
    out.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08]);
    out.extend_from_slice(&height.to_be_bytes());
    out.extend_from_slice(&width.to_be_bytes());
    out.extend_from_slice(&[3, 1, 0x22, 0, 2, 0x11, 1, 3, 0x11, 1]);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

fn low_byte(value: u32) -> u8 {
    value.to_be_bytes()[3]
}

/// # Panics
///
/// Panics if the in-memory zlib stream cannot be finished, which only
/// happens on allocation failure.
fn deflate(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).expect("in-memory zlib stream");
    encoder.finish().expect("in-memory zlib stream")
}
