//! LS-8 program file format.
//!
//! A program file is plain text, one byte per line:
//! - A line starting with `0` or `1` is an instruction byte; its first
//!   8 characters are the byte in binary, anything after is ignored
//! - Every other line (blank, `#` comments) is skipped

use std::path::{Path, PathBuf};
use thiserror::Error;

/// A parsed program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramFile {
    /// Program bytes, in load order.
    pub bytes: Vec<u8>,
    /// Source line number (1-based) of each byte.
    pub lines: Vec<usize>,
}

impl ProgramFile {
    /// Create a new empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a byte read from `line`.
    pub fn push(&mut self, byte: u8, line: usize) {
        self.bytes.push(byte);
        self.lines.push(line);
    }

    /// Get the number of bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Source line of the byte loaded at `addr`, if the program covers it.
    pub fn source_line(&self, addr: u8) -> Option<usize> {
        self.lines.get(addr as usize).copied()
    }
}

/// Load a program file from disk.
pub fn load_program<P: AsRef<Path>>(path: P) -> Result<ProgramFile, LoadError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    parse_program(&source)
}

/// Parse program text.
pub fn parse_program(source: &str) -> Result<ProgramFile, LoadError> {
    let mut program = ProgramFile::new();

    for (line_num, line) in source.lines().enumerate() {
        if !line.starts_with(|c: char| c == '0' || c == '1') {
            continue;
        }

        let field: String = line.chars().take(8).collect();
        let byte = parse_binary(&field).ok_or_else(|| LoadError::Parse {
            line: line_num + 1,
            field: field.clone(),
        })?;

        program.push(byte, line_num + 1);
    }

    Ok(program)
}

/// Parse up to 8 binary digits. Anything else is rejected.
pub fn parse_binary(field: &str) -> Option<u8> {
    if field.is_empty() || field.len() > 8 || !field.bytes().all(|b| b == b'0' || b == b'1') {
        return None;
    }
    u8::from_str_radix(field, 2).ok()
}

/// Errors that can occur while loading a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("cannot read {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("parse error on line {line}: {field:?} is not an 8-bit binary literal")]
    Parse { line: usize, field: String },
}

impl LoadError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::Io { .. } => 2,
            LoadError::Parse { .. } => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let source = "\
# print8.ls8
10000010 # LDI R0,8
00000000
00001000

01000111 # PRN R0
00000000
00000001 # HLT
";
        let program = parse_program(source).unwrap();

        assert_eq!(
            program.bytes,
            vec![0b1000_0010, 0, 8, 0b0100_0111, 0, 0b0000_0001]
        );
        assert_eq!(program.lines, vec![2, 3, 4, 6, 7, 8]);
        assert_eq!(program.source_line(3), Some(6));
        assert_eq!(program.source_line(6), None);
    }

    #[test]
    fn test_only_first_eight_characters() {
        let program = parse_program("0000000110101010").unwrap();
        assert_eq!(program.bytes, vec![1]);
    }

    #[test]
    fn test_indented_lines_are_skipped() {
        let program = parse_program("  10000010\n\t00000001\n00000001").unwrap();
        assert_eq!(program.bytes, vec![1]);
    }

    #[test]
    fn test_malformed_field() {
        let err = parse_program("00000001\n1010x010\n").unwrap_err();
        assert_eq!(
            err,
            LoadError::Parse { line: 2, field: "1010x010".into() }
        );
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_inline_comment_inside_field() {
        assert!(parse_program("101 # five").is_err());
    }

    #[test]
    fn test_short_field() {
        assert_eq!(parse_program("101\n").unwrap().bytes, vec![5]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let program = parse_program("10000010\r\n00000001\r\n").unwrap();
        assert_eq!(program.bytes, vec![0b1000_0010, 1]);
    }

    #[test]
    fn test_parse_binary() {
        assert_eq!(parse_binary("11111111"), Some(255));
        assert_eq!(parse_binary("00000000"), Some(0));
        assert_eq!(parse_binary("+1111111"), None);
        assert_eq!(parse_binary("2"), None);
        assert_eq!(parse_binary(""), None);
        assert_eq!(parse_binary("111111111"), None);
    }

    #[test]
    fn test_missing_file() {
        let err = load_program("/nonexistent/program.ls8").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert_eq!(err.exit_code(), 2);
    }
}
