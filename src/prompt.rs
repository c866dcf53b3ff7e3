//! Interactive input: master passwords and secret values.

use crate::error::{Error, Result};
use std::io::{self, BufRead, IsTerminal, Write};
use zeroize::Zeroizing;

/// Environment variable read before any password prompt.
pub const PASSWORD_ENV: &str = "SNOWPASS_PASSWORD";

/// Source of user input for keystore operations.
pub trait Prompter {
    /// Reads a password without echo.
    fn password(&mut self, prompt: &str) -> Result<Zeroizing<String>>;

    /// Reads one line of secret data.
    fn line(&mut self, prompt: &str) -> Result<Zeroizing<String>>;
}

/// Reads a password twice and requires both entries to match.
pub fn confirmed_password(prompter: &mut impl Prompter, prompt: &str) -> Result<Zeroizing<String>> {
    let first = prompter.password(prompt)?;
    if first.is_empty() {
        return Err(Error::EmptyInput("password"));
    }
    let second = prompter.password("Verify password: ")?;
    if first != second {
        return Err(Error::Mismatch("password"));
    }
    Ok(first)
}

/// Reads a secret value twice and requires both entries to match.
pub fn confirmed_data(prompter: &mut impl Prompter) -> Result<Zeroizing<String>> {
    let first = prompter.line("Enter data: ")?;
    if first.is_empty() {
        return Err(Error::EmptyInput("data"));
    }
    let second = prompter.line("Verify data: ")?;
    if first != second {
        return Err(Error::Mismatch("data"));
    }
    Ok(first)
}

/// Prompts on the controlling terminal.
///
/// Lookup order for passwords:
/// 1. `SNOWPASS_PASSWORD` environment variable
/// 2. one line from stdin when it is not a terminal
/// 3. interactive prompt without echo
#[derive(Debug, Default, Clone, Copy)]
pub struct Terminal;

impl Prompter for Terminal {
    fn password(&mut self, prompt: &str) -> Result<Zeroizing<String>> {
        //  SNOWPASS_PASSWORD="supersecret" snowpass get github_token from work
        if let Ok(pw) = std::env::var(PASSWORD_ENV) {
            if !pw.is_empty() {
                return Ok(Zeroizing::new(pw));
            }
        }

        //  printf '%s\n' "$PW" | snowpass get github_token from work
        if !io::stdin().is_terminal() {
            let mut buf = Zeroizing::new(String::new());
            io::stdin().lock().read_line(&mut buf)?;
            trim_newline(&mut buf);
            return Ok(buf);
        }

        Ok(Zeroizing::new(rpassword::prompt_password(prompt)?))
    }

    fn line(&mut self, prompt: &str) -> Result<Zeroizing<String>> {
        if io::stdin().is_terminal() {
            let mut stderr = io::stderr();
            write!(stderr, "{prompt}")?;
            stderr.flush()?;
        }

        let mut buf = Zeroizing::new(String::new());
        if io::stdin().lock().read_line(&mut buf)? == 0 {
            return Err(Error::EmptyInput("data"));
        }
        Ok(Zeroizing::new(buf.trim().to_string()))
    }
}

fn trim_newline(s: &mut String) {
    while s.ends_with('\n') || s.ends_with('\r') {
        s.pop();
    }
}

/// Replays canned answers; fails once they run out.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct Scripted {
    passwords: std::collections::VecDeque<String>,
    lines: std::collections::VecDeque<String>,
}

#[cfg(test)]
impl Scripted {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_password(mut self, pw: &str) -> Self {
        self.passwords.push_back(pw.to_string());
        self
    }

    pub(crate) fn with_line(mut self, line: &str) -> Self {
        self.lines.push_back(line.to_string());
        self
    }

    pub(crate) fn push_password(&mut self, pw: &str) {
        self.passwords.push_back(pw.to_string());
    }

    pub(crate) fn push_line(&mut self, line: &str) {
        self.lines.push_back(line.to_string());
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.passwords.is_empty() && self.lines.is_empty()
    }
}

#[cfg(test)]
impl Prompter for Scripted {
    fn password(&mut self, _prompt: &str) -> Result<Zeroizing<String>> {
        self.passwords
            .pop_front()
            .map(Zeroizing::new)
            .ok_or(Error::EmptyInput("password"))
    }

    fn line(&mut self, _prompt: &str) -> Result<Zeroizing<String>> {
        self.lines
            .pop_front()
            .map(Zeroizing::new)
            .ok_or(Error::EmptyInput("data"))
    }
}
