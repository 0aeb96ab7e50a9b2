//! Lines of source code.

use std::{
    fmt,
    io::{self, BufRead},
};

pub const FIRST_LINE: usize = 1;

/// One line of a source file, as found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalLine {
    pub text: String,
    pub file_name: String,
    pub line_number: usize,
}

impl PhysicalLine {
    /// The text before any `;` comment, without surrounding whitespace.
    pub fn code(&self) -> &str {
        let code = match self.text.split_once(';') {
            Some((code, _comment)) => code,
            None => &self.text,
        };
        code.trim()
    }

    /// Return whether the line holds nothing but whitespace or a comment.
    pub fn is_blank(&self) -> bool {
        self.code().is_empty()
    }

    pub fn location(&self) -> impl fmt::Display + '_ {
        Location(self)
    }
}

struct Location<'a>(&'a PhysicalLine);

impl fmt::Display for Location<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0.file_name, self.0.line_number)
    }
}

/// Read the lines of a source file, numbered from [`FIRST_LINE`].
pub fn physical_lines<R>(reader: R, file_name: &str) -> impl Iterator<Item = io::Result<PhysicalLine>>
where
    R: BufRead,
{
    let file_name = file_name.to_owned();
    reader.lines().zip(FIRST_LINE..).map(move |(line, line_number)| {
        line.map(|text| PhysicalLine {
            text,
            file_name: file_name.clone(),
            line_number,
        })
    })
}

/// Same as [`physical_lines`], skipping the blank ones.
pub fn code_lines<R>(reader: R, file_name: &str) -> impl Iterator<Item = io::Result<PhysicalLine>>
where
    R: BufRead,
{
    physical_lines(reader, file_name).filter(|line| !matches!(line, Ok(line) if line.is_blank()))
}
