//! Optional external formatter run over the script after each write

use scribe_core::{Error, Result};
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatter {
    program: String,
    args: Vec<String>,
}

impl Formatter {
    /// `["prettier", "--write"]` - the script path is appended as last argument
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        if program.trim().is_empty() {
            return None;
        }
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    /// Whitespace-separated command line, e.g. `npx prettier --write`
    pub fn parse(command: &str) -> Option<Self> {
        let parts: Vec<String> = command.split_whitespace().map(str::to_string).collect();
        Self::from_command(&parts)
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn run(&self, path: &Path) -> Result<()> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .output()
            .map_err(|e| Error::format_failed(&self.command_line(), &e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::format_failed(
                &self.command_line(),
                stderr.trim().lines().next().unwrap_or("non-zero exit"),
            ));
        }
        Ok(())
    }
}
