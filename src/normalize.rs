//! Dialect normalization.
//!
//! Rewrites dialect document separators (`--- !u!<tag> <class> &<id>`) into
//! standard YAML separators in a single forward pass. Every other line is
//! copied verbatim, so line count and order are preserved.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::domain::{InstanceIdPolicy, Separator, SeparatorError};

/// The standard YAML text produced by normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedStream {
    text: String,
    separators: Vec<Separator>,
}

impl NormalizedStream {
    /// The normalized text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consumes the stream, returning the normalized text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }

    /// The separators that were rewritten, in source order.
    ///
    /// These keep the instance IDs even when the rewritten lines drop them.
    #[must_use]
    pub fn separators(&self) -> &[Separator] {
        &self.separators
    }

    /// Returns `true` if the stream has no text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl AsRef<str> for NormalizedStream {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// Rewrites dialect separator lines into standard YAML.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    policy: InstanceIdPolicy,
}

impl Normalizer {
    /// Creates a normalizer with the given instance ID policy.
    #[must_use]
    pub const fn new(policy: InstanceIdPolicy) -> Self {
        Self { policy }
    }

    /// Normalizes the file at the given path.
    ///
    /// The file is closed before this returns, on both success and failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read, or if it
    /// contains a malformed separator line.
    pub fn normalize_path(&self, path: &Path) -> Result<NormalizedStream, Error> {
        let file = File::open(path).map_err(|io_error| match io_error.kind() {
            io::ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Error::Access {
                path: path.to_path_buf(),
                source: io_error,
            },
            _ => Error::Io(io_error),
        })?;

        let mut reader = BufReader::new(file);
        self.normalize_reader(&mut reader)
    }

    /// Normalizes text already held in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the text contains a malformed separator line.
    pub fn normalize_str(&self, text: &str) -> Result<NormalizedStream, Error> {
        self.normalize_reader(&mut text.as_bytes())
    }

    /// Normalizes a buffered reader line by line.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails (including invalid UTF-8) or if a
    /// separator line is malformed.
    pub fn normalize_reader<R: BufRead>(&self, reader: &mut R) -> Result<NormalizedStream, Error> {
        let mut stream = NormalizedStream::default();
        let mut line = String::new();
        let mut line_number = 0;

        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            line_number += 1;

            if !Separator::is_separator(&line) {
                stream.text.push_str(&line);
                continue;
            }

            let malformed = |source| Error::MalformedSeparator {
                line: line_number,
                source,
            };
            let separator = Separator::parse(&line).map_err(malformed)?;
            let rendered = separator.render(self.policy).map_err(malformed)?;

            tracing::debug!(
                index = stream.separators.len(),
                line = line_number,
                class = separator.class(),
                "rewrote document separator"
            );

            stream.text.push_str(&rendered);
            stream.text.push_str(terminator(&line));
            stream.separators.push(separator);
        }

        tracing::info!(
            lines = line_number,
            separators = stream.separators.len(),
            "normalized scene"
        );

        Ok(stream)
    }
}

/// Normalizes the file at the given path with the default policy.
///
/// # Errors
///
/// See [`Normalizer::normalize_path`].
pub fn normalize(path: &Path) -> Result<NormalizedStream, Error> {
    Normalizer::default().normalize_path(path)
}

/// The line terminator at the end of `line`, if any.
fn terminator(line: &str) -> &str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}

/// Errors that can occur while normalizing a scene.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input file does not exist.
    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The input file exists but cannot be opened.
    #[error("input file is not readable: {}", path.display())]
    Access {
        /// The path that could not be opened.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// Reading the input failed.
    #[error("failed to read input")]
    Io(#[from] io::Error),

    /// A separator line has too few fields.
    #[error("malformed document separator on line {line}")]
    MalformedSeparator {
        /// The 1-based line number.
        line: usize,
        /// What was wrong with the line.
        source: SeparatorError,
    },
}
