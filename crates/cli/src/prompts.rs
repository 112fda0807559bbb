//! Interactive confirmation for destructive commands.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Result, bail};

/// Ask `question` on stderr and read a yes/no answer from stdin.
///
/// `force` skips the prompt. Without a terminal there is nobody to ask, so
/// the command is refused rather than guessed.
pub fn confirm(question: &str, force: bool) -> Result<bool> {
  if force {
    return Ok(true);
  }

  if !io::stdin().is_terminal() || !io::stderr().is_terminal() {
    bail!("refusing to continue without confirmation in non-interactive mode; pass --force");
  }

  let mut stderr = io::stderr().lock();
  write!(stderr, "{question} [y/N] ")?;
  stderr.flush()?;

  let mut answer = String::new();
  io::stdin().lock().read_line(&mut answer)?;
  Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
  matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
