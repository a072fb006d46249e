//! What happens to a source image once its outputs exist.
//!
//! A source is only ever a candidate for removal when every step for it
//! succeeded and a derivative preserving its pixels was written: the JPEG
//! rendition, or the stripped PNG when JPEG output is disabled.

use crate::error::{PipelineError, Result};
use camino::Utf8Path;
use clap::ValueEnum;
use log::{debug, info};
use std::cell::RefCell;
use std::fmt;
use std::io::{self, BufRead, Write};

/// Retention mode selected on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum RetentionMode {
    /// Never remove the source.
    Keep,
    /// Remove the source whenever it is safe to do so.
    Remove,
    /// Ask before removing each source.
    #[default]
    Ask,
}

impl fmt::Display for RetentionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Keep => "keep",
            Self::Remove => "remove",
            Self::Ask => "ask",
        })
    }
}

/// Answer to a removal question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Leave the source in place.
    Keep,
    /// Delete the source.
    Remove,
}

impl Decision {
    /// Interpret a line of user input: `y` or `yes` in any case removes,
    /// anything else keeps.
    ///
    /// # Examples
    ///
    /// ```
    /// use prompt_extract::retention::Decision;
    ///
    /// assert_eq!(Decision::from_answer(" YES\n"), Decision::Remove);
    /// assert_eq!(Decision::from_answer(""), Decision::Keep);
    /// ```
    #[must_use]
    pub fn from_answer(answer: &str) -> Self {
        let answer = answer.trim();
        if answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes") {
            Self::Remove
        } else {
            Self::Keep
        }
    }
}

/// Capability: decide whether to remove a source.
#[cfg_attr(test, mockall::automock)]
pub trait DecisionProvider {
    /// Decide the fate of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Io`] when the answer cannot be obtained.
    fn decide(&self, path: &Utf8Path) -> Result<Decision>;
}

/// Asks on a terminal: the question goes to `output`, the answer is one line
/// of `input`.
pub struct ConsolePrompt<R, W> {
    input: RefCell<R>,
    output: RefCell<W>,
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    /// Create a prompt over arbitrary streams.
    #[must_use]
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: RefCell::new(input),
            output: RefCell::new(output),
        }
    }
}

impl ConsolePrompt<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on stderr and read answers from stdin.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> DecisionProvider for ConsolePrompt<R, W> {
    fn decide(&self, path: &Utf8Path) -> Result<Decision> {
        {
            let mut output = self.output.borrow_mut();
            write!(output, "Remove {path}? [y/N] ")?;
            output.flush()?;
        }
        let mut answer = String::new();
        self.input.borrow_mut().read_line(&mut answer)?;
        Ok(Decision::from_answer(&answer))
    }
}

/// Non-interactive provider giving the same answer every time.
#[derive(Debug, Clone, Copy)]
pub struct FixedDecision(pub Decision);

impl DecisionProvider for FixedDecision {
    fn decide(&self, _path: &Utf8Path) -> Result<Decision> {
        Ok(self.0)
    }
}

/// Outcome of the derivative steps that gate removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Safeguards {
    /// A step of this file failed.
    pub any_failed: bool,
    /// JPEG output was enabled for the run.
    pub jpeg_enabled: bool,
    /// The JPEG rendition was written.
    pub jpeg_written: bool,
    /// The stripped PNG was written.
    pub stripped_written: bool,
}

impl Safeguards {
    /// Whether removing the source loses nothing.
    #[must_use]
    pub fn removal_eligible(self) -> bool {
        if self.any_failed {
            return false;
        }
        if self.jpeg_enabled {
            self.jpeg_written
        } else {
            self.stripped_written
        }
    }
}

/// What [`apply_retention`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionOutcome {
    /// The source was deleted.
    Removed,
    /// The source was left in place.
    Kept,
    /// The source could not be removed safely and was left in place.
    NotEligible,
}

/// Apply `mode` to `path` given the outcome of its derivative steps.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] if the provider fails or the file cannot be
/// deleted.
pub fn apply_retention(
    path: &Utf8Path,
    mode: RetentionMode,
    safeguards: Safeguards,
    provider: &dyn DecisionProvider,
) -> Result<RetentionOutcome> {
    if mode == RetentionMode::Keep {
        return Ok(RetentionOutcome::Kept);
    }
    if !safeguards.removal_eligible() {
        debug!("{path}: keeping source, no complete derivative ({safeguards:?})");
        return Ok(RetentionOutcome::NotEligible);
    }

    let decision = match mode {
        RetentionMode::Remove => Decision::Remove,
        RetentionMode::Ask => provider.decide(path)?,
        RetentionMode::Keep => Decision::Keep,
    };
    match decision {
        Decision::Keep => Ok(RetentionOutcome::Kept),
        Decision::Remove => {
            std::fs::remove_file(path).map_err(PipelineError::Io)?;
            info!("removed {path}");
            Ok(RetentionOutcome::Removed)
        }
    }
}

#[cfg(test)]
#[path = "retention_tests.rs"]
mod tests;
