//! Shared helpers for the behaviour suites.
//!
//! Builds ComfyUI-style images in a temporary directory and runs the two
//! binaries against them with a controlled environment.
#![allow(dead_code, reason = "each behaviour suite uses a subset of the helpers")]

use camino::{Utf8Path, Utf8PathBuf};
use prompt_extract::test_utils::PngFixture;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Embedded `prompt` document of [`write_comfy_image`].
pub const PROMPT: &str = r#"{"3":{"class_type":"KSampler","inputs":{"seed":1234,"steps":20}}}"#;

/// Embedded `workflow` document of [`write_comfy_image`].
pub const WORKFLOW: &str = r#"{"last_node_id":9,"nodes":[]}"#;

/// A scratch directory with UTF-8 paths.
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    /// Create an empty scratch directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    /// Root of the scratch directory.
    pub fn root(&self) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.dir.path().to_path_buf()).expect("utf-8 temp path")
    }

    /// Path of `name` inside the scratch directory.
    pub fn path(&self, name: &str) -> Utf8PathBuf {
        self.root().join(name)
    }
}

/// Write `art.png` carrying [`PROMPT`] and [`WORKFLOW`] into `dir`.
pub fn write_comfy_image(dir: &Utf8Path) -> Utf8PathBuf {
    let path = dir.join("art.png");
    PngFixture::new(4, 3)
        .with_text("prompt", PROMPT)
        .with_text("workflow", WORKFLOW)
        .write_to(&path)
        .expect("write fixture image");
    path
}

/// Whether `program` can be started on this host.
pub fn tool_installed(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .stdin(std::process::Stdio::null())
        .output()
        .is_ok()
}

/// Run `binary` in `dir` with `args`, extra `env` and no inherited
/// recipient or log configuration.
pub fn run_binary(binary: &str, dir: &Utf8Path, args: &[String], env: &[(String, String)]) -> Output {
    let mut cmd = Command::new(binary);
    cmd.args(args)
        .current_dir(dir)
        .env_remove("PROMPT_EXTRACT_EMAIL")
        .env_remove("PROMPT_EXTRACT_LOG")
        .stdin(std::process::Stdio::null());
    for (key, value) in env {
        cmd.env(key, value);
    }
    cmd.output().unwrap_or_else(|err| panic!("failed to run {binary}: {err}"))
}

/// Assert the exit code of `output`, showing stderr on mismatch.
pub fn assert_exit_code(output: &Output, expected: i32) {
    assert_eq!(
        output.status.code(),
        Some(expected),
        "unexpected exit status, stdout: {}, stderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}
