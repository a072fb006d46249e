//! Companion decoder for documents written by `prompt-extract`.
//!
//! Takes exactly one `FILE.json.<ext>.gpg`, `FILE.json.gpg` or
//! `FILE.json.<ext>` path and restores `FILE.json` beside it.

use camino::Utf8PathBuf;
use clap::Parser;
use prompt_extract::decode::decode_file;
use prompt_extract::logging;
use prompt_extract::output::write_stderr_line;
use prompt_extract::tools::SystemCommandExecutor;

/// Restore a plain JSON document from its compressed and/or encrypted form.
#[derive(Parser, Debug)]
#[command(name = "prompt-extract-decode")]
#[command(version)]
#[command(
    about = "Restore a document written by prompt-extract",
    long_about = concat!(
        "Reverses the compression and encryption applied by prompt-extract.\n\n",
        "The layers are taken from the file name: FILE.json.lzma.gpg is ",
        "decrypted with gpg and then decompressed with lzma. The plain FILE.json ",
        "is written next to the input, which is left untouched."
    ),
    after_help = concat!(
        "Supported names:\n",
        "  FILE.json.{lzma,bz2,gz}.gpg\n",
        "  FILE.json.gpg\n",
        "  FILE.json.{lzma,bz2,gz}"
    )
)]
struct DecodeCli {
    /// Document to decode.
    #[arg(value_name = "FILE")]
    file: Utf8PathBuf,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    verbosity: u8,

    /// Only report warnings and errors.
    #[arg(short, long, conflicts_with = "verbosity")]
    quiet: bool,
}

fn main() {
    let cli = DecodeCli::parse();
    let mut stderr = std::io::stderr();
    if let Err(err) = logging::init(cli.verbosity, cli.quiet) {
        write_stderr_line(&mut stderr, format!("logging unavailable: {err}"));
    }

    if let Err(err) = decode_file(&SystemCommandExecutor, &cli.file) {
        write_stderr_line(&mut stderr, err);
        std::process::exit(1);
    }
}
