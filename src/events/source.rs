// Rewindable event sources.
//
// `replay()` starts a fresh pass from the first line each time it is called.
// A file is re-opened per pass; stdin can only be read once, so it is
// buffered into a MemorySource up front.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Input path meaning standard input.
pub const STDIN: &str = "-";

pub type LineIter<'a> = Box<dyn Iterator<Item = Result<String>> + 'a>;

/// Anything that can yield the raw input lines more than once.
pub trait EventSource {
    fn replay(&self) -> Result<LineIter<'_>>;
}

/// Line-delimited JSON on disk.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl EventSource for FileSource {
    fn replay(&self) -> Result<LineIter<'_>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open input {}", self.path.display()))?;
        let path = self.path.display().to_string();
        let lines = BufReader::new(file).lines().map(move |line| {
            line.with_context(|| format!("Failed to read input {path}"))
        });
        Ok(Box::new(lines))
    }
}

/// Lines held in memory. Used for stdin and in tests.
pub struct MemorySource {
    lines: Vec<String>,
}

impl MemorySource {
    pub fn from_lines(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Drain a reader completely. A read failure is fatal.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let lines = BufReader::new(reader)
            .lines()
            .collect::<std::io::Result<Vec<_>>>()
            .context("Failed to read input stream")?;
        Ok(Self { lines })
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl EventSource for MemorySource {
    fn replay(&self) -> Result<LineIter<'_>> {
        Ok(Box::new(self.lines.iter().cloned().map(Ok)))
    }
}
