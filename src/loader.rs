//! Program loading: newline-delimited instruction files into bounded
//! instruction memory.
//!
//! A blank line ends the program. Lines past the instruction-memory capacity
//! are dropped, and the drop is counted so truncation stays observable.

use std::io;
use std::path::Path;

use crate::process::MEMORY_SIZE;

/// A program ready to be spawned: bounded lines plus the truncation count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedProgram {
    pub lines: Vec<String>,
    /// Non-blank lines dropped because instruction memory was full.
    pub truncated: u32,
}

impl LoadedProgram {
    /// Build a program from raw lines (terminators already stripped).
    pub fn from_lines<I>(lines: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut kept = Vec::new();
        let mut truncated = 0u32;

        for line in lines {
            let line = line.as_ref().trim_end();
            if line.trim().is_empty() {
                break;
            }
            if kept.len() == MEMORY_SIZE {
                truncated += 1;
                continue;
            }
            kept.push(line.to_string());
        }

        Self {
            lines: kept,
            truncated,
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Load a program file from disk.
pub fn load_program(path: &Path) -> io::Result<LoadedProgram> {
    let contents = std::fs::read_to_string(path)?;
    Ok(LoadedProgram::from_lines(contents.lines()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_lines_in_order() {
        let program = LoadedProgram::from_lines(["assign x 1", "print x"]);
        assert_eq!(program.lines, vec!["assign x 1", "print x"]);
        assert_eq!(program.truncated, 0);
    }

    #[test]
    fn blank_line_ends_the_program() {
        let program = LoadedProgram::from_lines(["assign x 1", "", "print x"]);
        assert_eq!(program.lines, vec!["assign x 1"]);
        assert_eq!(program.truncated, 0);
    }

    #[test]
    fn counts_lines_past_capacity() {
        let lines: Vec<String> = (0..MEMORY_SIZE + 5)
            .map(|i| format!("assign x {i}"))
            .collect();
        let program = LoadedProgram::from_lines(&lines);
        assert_eq!(program.len(), MEMORY_SIZE);
        assert_eq!(program.truncated, 5);
    }

    #[test]
    fn trailing_whitespace_is_stripped() {
        let program = LoadedProgram::from_lines(["print x \r"]);
        assert_eq!(program.lines, vec!["print x"]);
    }
}
