//! Tests for CLI parsing and default behaviours.

use super::*;
use clap::CommandFactory;
use rstest::rstest;

#[test]
fn cli_parses_defaults() {
    let cli = Cli::parse_from(["prompt-extract", "art.png"]);
    assert_eq!(cli.files, vec![Utf8PathBuf::from("art.png")]);
    assert_eq!(cli.quality.get(), 85);
    assert_eq!(cli.retention, RetentionMode::Ask);
    assert!(!cli.no_jpg);
    assert!(!cli.no_png);
    assert!(!cli.no_prompt);
    assert!(!cli.no_workflow);
    assert!(!cli.no_compress);
    assert!(!cli.no_encrypt);
    assert!(cli.email.is_none());
    assert!(cli.compression.is_none());
    assert_eq!(cli.stripped_suffix, "_no_prompt");
    assert!(!cli.dry_run);
    assert_eq!(cli.verbosity, 0);
    assert!(!cli.quiet);
}

#[test]
fn cli_requires_a_file() {
    let err = Cli::try_parse_from(["prompt-extract"]).expect_err("files are required");
    assert_eq!(err.exit_code(), 2);
}

#[rstest]
#[case::lowest("1", 1)]
#[case::short_flag("90", 90)]
#[case::highest("100", 100)]
fn cli_accepts_quality_in_range(#[case] raw: &str, #[case] expected: u8) {
    let cli = Cli::parse_from(["prompt-extract", "-Q", raw, "a.png"]);
    assert_eq!(cli.quality.get(), expected);
}

#[rstest]
#[case::zero("0")]
#[case::too_high("101")]
#[case::not_a_number("high")]
fn cli_rejects_quality_out_of_range(#[case] raw: &str) {
    let result = Cli::try_parse_from(["prompt-extract", "--quality", raw, "a.png"]);
    assert!(result.is_err(), "quality {raw} should be rejected");
}

#[rstest]
#[case::keep("keep", RetentionMode::Keep)]
#[case::remove("remove", RetentionMode::Remove)]
#[case::ask("ask", RetentionMode::Ask)]
fn cli_parses_retention(#[case] raw: &str, #[case] expected: RetentionMode) {
    let cli = Cli::parse_from(["prompt-extract", "-r", raw, "a.png"]);
    assert_eq!(cli.retention, expected);
}

#[rstest]
#[case::lzma("lzma", CompressionAlgorithm::Lzma)]
#[case::bzip2("bzip2", CompressionAlgorithm::Bzip2)]
#[case::gzip("gzip", CompressionAlgorithm::Gzip)]
fn cli_parses_compression(#[case] raw: &str, #[case] expected: CompressionAlgorithm) {
    let cli = Cli::parse_from(["prompt-extract", "-c", raw, "a.png"]);
    assert_eq!(cli.compression, Some(expected));
}

#[test]
fn cli_accepts_no_cypher_alias() {
    let cli = Cli::parse_from(["prompt-extract", "--no-cypher", "a.png"]);
    assert!(cli.no_encrypt);
}

#[test]
fn cli_collects_files_in_order() {
    let cli = Cli::parse_from(["prompt-extract", "b.png", "a.jpg", "c.png"]);
    assert_eq!(
        cli.files,
        vec![
            Utf8PathBuf::from("b.png"),
            Utf8PathBuf::from("a.jpg"),
            Utf8PathBuf::from("c.png"),
        ]
    );
}

#[test]
fn cli_counts_verbosity() {
    let cli = Cli::parse_from(["prompt-extract", "-vv", "a.png"]);
    assert_eq!(cli.verbosity, 2);
}

#[test]
fn cli_rejects_verbose_with_quiet() {
    let result = Cli::try_parse_from(["prompt-extract", "-v", "-q", "a.png"]);
    assert!(result.is_err());
}

#[test]
fn cli_parses_naming_flags() {
    let cli = Cli::parse_from([
        "prompt-extract",
        "--seed-in-name",
        "--size-in-name",
        "--stripped-suffix",
        "_clean",
        "--discard-intermediate",
        "a.png",
    ]);
    assert!(cli.seed_in_name);
    assert!(cli.size_in_name);
    assert!(cli.discard_intermediate);
    assert_eq!(cli.stripped_suffix, "_clean");
}

#[test]
fn default_matches_parser_defaults() {
    let parsed = Cli::parse_from(["prompt-extract", "a.png"]);
    let built = Cli {
        files: vec![Utf8PathBuf::from("a.png")],
        ..Cli::default()
    };
    assert_eq!(format!("{parsed:?}"), format!("{built:?}"));
}

#[test]
fn retention_help_states_removal_conditions() {
    let help = Cli::command().render_long_help().to_string();
    assert!(help.contains("succeeded"), "{help}");
    assert!(help.contains("its stripped PNG"), "{help}");
}
