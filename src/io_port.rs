//! Io capability port for the external byte world.
//!
//! The kernel never touches the terminal or filesystem directly; every side
//! effect goes through [`IoPort`]. `StdIo` binds the port to process stdio
//! and the real filesystem. `SimIo` is a deterministic in-memory
//! implementation for tests: scripted input lines, a `BTreeMap` filesystem,
//! and a captured output log.
//!
//! Invariants:
//! - File reads never panic; missing paths return `io::ErrorKind::NotFound`.
//! - Exhausted scripted input returns `io::ErrorKind::UnexpectedEof`.

use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::io::{self, BufRead};

/// Capability calls the interpreter needs from the outside world.
pub trait IoPort {
    /// Read one line of interactive input, without the line terminator.
    fn read_input_line(&mut self) -> io::Result<String>;

    /// Read the first line of a named file, without the line terminator.
    fn read_first_line(&mut self, path: &str) -> io::Result<String>;

    /// Read every line of a named file.
    fn read_all_lines(&mut self, path: &str) -> io::Result<Vec<String>>;

    /// Create or truncate a named file and write `data` verbatim.
    fn write_file(&mut self, path: &str, data: &str) -> io::Result<()>;

    /// Emit one line of output.
    fn emit(&mut self, text: &str);
}

/// Production port: stdin/stdout plus the real filesystem.
#[derive(Debug, Default)]
pub struct StdIo;

impl StdIo {
    pub fn new() -> Self {
        Self
    }
}

impl IoPort for StdIo {
    fn read_input_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        let n = io::stdin().lock().read_line(&mut line)?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "end of input",
            ));
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }

    fn read_first_line(&mut self, path: &str) -> io::Result<String> {
        let contents = fs::read_to_string(path)?;
        Ok(contents.lines().next().unwrap_or("").to_string())
    }

    fn read_all_lines(&mut self, path: &str) -> io::Result<Vec<String>> {
        let contents = fs::read_to_string(path)?;
        Ok(contents.lines().map(str::to_string).collect())
    }

    fn write_file(&mut self, path: &str, data: &str) -> io::Result<()> {
        fs::write(path, data)
    }

    fn emit(&mut self, text: &str) {
        println!("{text}");
    }
}

/// Deterministic in-memory port for tests.
#[derive(Clone, Debug, Default)]
pub struct SimIo {
    files: BTreeMap<String, String>,
    input: VecDeque<String>,
    output: Vec<String>,
}

impl SimIo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, replacing any previous contents.
    pub fn with_file(mut self, path: &str, contents: &str) -> Self {
        self.files.insert(path.to_string(), contents.to_string());
        self
    }

    /// Queue one line of scripted interactive input.
    pub fn push_input(&mut self, line: &str) {
        self.input.push_back(line.to_string());
    }

    /// Everything emitted so far, in order.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Current contents of a simulated file.
    pub fn file(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }
}

impl IoPort for SimIo {
    fn read_input_line(&mut self) -> io::Result<String> {
        self.input.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "scripted input exhausted")
        })
    }

    fn read_first_line(&mut self, path: &str) -> io::Result<String> {
        let contents = self
            .files
            .get(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "file not found"))?;
        Ok(contents.lines().next().unwrap_or("").to_string())
    }

    fn read_all_lines(&mut self, path: &str) -> io::Result<Vec<String>> {
        let contents = self
            .files
            .get(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "file not found"))?;
        Ok(contents.lines().map(str::to_string).collect())
    }

    fn write_file(&mut self, path: &str, data: &str) -> io::Result<()> {
        self.files.insert(path.to_string(), data.to_string());
        Ok(())
    }

    fn emit(&mut self, text: &str) {
        self.output.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_files_read_and_write() {
        let mut io = SimIo::new().with_file("notes.txt", "first\nsecond\n");

        assert_eq!(io.read_first_line("notes.txt").unwrap(), "first");
        assert_eq!(
            io.read_all_lines("notes.txt").unwrap(),
            vec!["first".to_string(), "second".to_string()]
        );

        io.write_file("out.txt", "payload").unwrap();
        assert_eq!(io.file("out.txt"), Some("payload"));
    }

    #[test]
    fn sim_missing_file_is_not_found() {
        let mut io = SimIo::new();
        let err = io.read_first_line("nope").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn sim_input_is_scripted_fifo() {
        let mut io = SimIo::new();
        io.push_input("alpha");
        io.push_input("beta");

        assert_eq!(io.read_input_line().unwrap(), "alpha");
        assert_eq!(io.read_input_line().unwrap(), "beta");
        assert_eq!(
            io.read_input_line().unwrap_err().kind(),
            io::ErrorKind::UnexpectedEof
        );
    }

    #[test]
    fn sim_empty_file_first_line_is_empty() {
        let mut io = SimIo::new().with_file("empty", "");
        assert_eq!(io.read_first_line("empty").unwrap(), "");
    }
}
