use serde::Serialize;
use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use thiserror::Error;

use super::allow_list;

pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
pub const MAX_FILENAME_LENGTH: usize = 255;
pub const SAMPLE_SIZE: usize = 2048;

/// Matched against the ASCII-lowercased sample, so entries must be lowercase.
const SUSPICIOUS_PATTERNS: [&str; 5] = [
    "<script",
    "javascript:",
    "vbscript:",
    "data:text/html",
    "data:application/x-javascript",
];

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("File size exceeds maximum limit of {}MB (got {} bytes)", megabytes(.max_size), .size)]
    FileTooLarge { size: u64, max_size: u64 },

    #[error("Filename too long. Maximum length is {max_length} characters")]
    FilenameTooLong { length: usize, max_length: usize },

    #[error("File type not allowed. Allowed types: {}", .allowed.join(", "))]
    ExtensionNotAllowed {
        extension: Option<String>,
        allowed: Vec<&'static str>,
    },

    #[error("File type not allowed. Detected: {}", .detected.as_deref().unwrap_or("none"))]
    MimeNotAllowed { detected: Option<String> },

    #[error("File contains suspicious content")]
    SuspiciousContent { marker: &'static str },

    #[error("Unable to read file content: {0}")]
    SampleUnreadable(#[source] io::Error),
}

fn megabytes(bytes: &u64) -> u64 {
    *bytes / (1024 * 1024)
}

/// Machine-readable rejection code returned alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectionReason {
    FileTooLarge,
    FilenameTooLong,
    ExtensionNotAllowed,
    MimeNotAllowed,
    SuspiciousContent,
    ValidationFailed,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::FileTooLarge => "FileTooLarge",
            RejectionReason::FilenameTooLong => "FilenameTooLong",
            RejectionReason::ExtensionNotAllowed => "ExtensionNotAllowed",
            RejectionReason::MimeNotAllowed => "MimeNotAllowed",
            RejectionReason::SuspiciousContent => "SuspiciousContent",
            RejectionReason::ValidationFailed => "ValidationFailed",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ValidationError {
    pub fn reason(&self) -> RejectionReason {
        match self {
            ValidationError::FileTooLarge { .. } => RejectionReason::FileTooLarge,
            ValidationError::FilenameTooLong { .. } => RejectionReason::FilenameTooLong,
            ValidationError::ExtensionNotAllowed { .. } => RejectionReason::ExtensionNotAllowed,
            ValidationError::MimeNotAllowed { .. } => RejectionReason::MimeNotAllowed,
            ValidationError::SuspiciousContent { .. } => RejectionReason::SuspiciousContent,
            ValidationError::SampleUnreadable(_) => RejectionReason::ValidationFailed,
        }
    }
}

/// A file presented for validation. Only the leading sample of the content
/// is held, never the full body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCandidate {
    pub filename: String,
    pub declared_size: u64,
    pub content_sample: Vec<u8>,
    pub content_type_hint: Option<String>,
}

impl UploadCandidate {
    pub fn new(filename: impl Into<String>, declared_size: u64, content_sample: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            declared_size,
            content_sample,
            content_type_hint: None,
        }
    }

    pub fn with_content_type_hint(mut self, hint: impl Into<String>) -> Self {
        self.content_type_hint = Some(hint.into());
        self
    }

    pub fn from_bytes(filename: impl Into<String>, data: &[u8]) -> Self {
        let sample_len = data.len().min(SAMPLE_SIZE);
        Self::new(filename, data.len() as u64, data[..sample_len].to_vec())
    }

    /// Samples `reader` without moving its position, so the same stream can
    /// be handed to persistence afterwards.
    pub fn from_reader<R: Read + Seek>(
        filename: impl Into<String>,
        declared_size: u64,
        reader: &mut R,
        sample_size: usize,
    ) -> Result<Self, ValidationError> {
        let sample = read_sample(reader, sample_size).map_err(ValidationError::SampleUnreadable)?;
        Ok(Self::new(filename, declared_size, sample))
    }
}

/// Reads up to `limit` bytes from the current position, then seeks back to
/// where the reader started. The position is restored even if the read fails.
pub fn read_sample<R: Read + Seek>(reader: &mut R, limit: usize) -> io::Result<Vec<u8>> {
    let start = reader.stream_position()?;

    let mut sample = Vec::with_capacity(limit);
    let read_result = Read::take(&mut *reader, limit as u64).read_to_end(&mut sample);

    reader.seek(SeekFrom::Start(start))?;
    read_result?;

    Ok(sample)
}

/// Lowercased extension of the final path component, including the dot.
/// Leading dots belong to the name, so `.pdf` and `..pdf` have no extension.
pub fn file_extension(filename: &str) -> Option<String> {
    let name = Path::new(filename).file_name()?.to_str()?;
    let (_, ext) = name.trim_start_matches('.').rsplit_once('.')?;
    Some(format!(".{}", ext.to_lowercase()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AcceptedUpload {
    pub mime_type: &'static str,
    pub extension: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileValidationConfig {
    pub max_file_size: u64,
    pub max_filename_length: usize,
    pub sample_size: usize,
}

impl Default for FileValidationConfig {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
            max_filename_length: MAX_FILENAME_LENGTH,
            sample_size: SAMPLE_SIZE,
        }
    }
}

/// Stateless upload check. Holds only numeric limits; the permitted types
/// come from the static allow-list.
#[derive(Debug, Clone)]
pub struct FileValidator {
    config: FileValidationConfig,
}

impl FileValidator {
    pub fn new(config: FileValidationConfig) -> Self {
        Self { config }
    }

    pub fn with_default_config() -> Self {
        Self::new(FileValidationConfig::default())
    }

    pub fn config(&self) -> &FileValidationConfig {
        &self.config
    }

    /// Runs every check in order and stops at the first failure.
    pub fn validate(&self, candidate: &UploadCandidate) -> Result<AcceptedUpload, ValidationError> {
        self.validate_size(candidate.declared_size)?;

        self.validate_filename(&candidate.filename)?;

        let extension = self.validate_extension(&candidate.filename)?;

        let mime_type = self.detect_mime_type(&candidate.filename, extension)?;

        self.check_suspicious_content(&candidate.content_sample)?;

        Ok(AcceptedUpload {
            mime_type,
            extension,
        })
    }

    fn validate_size(&self, size: u64) -> Result<(), ValidationError> {
        if size > self.config.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max_size: self.config.max_file_size,
            });
        }
        Ok(())
    }

    fn validate_filename(&self, filename: &str) -> Result<(), ValidationError> {
        let length = filename.chars().count();
        if length > self.config.max_filename_length {
            return Err(ValidationError::FilenameTooLong {
                length,
                max_length: self.config.max_filename_length,
            });
        }
        Ok(())
    }

    fn validate_extension(&self, filename: &str) -> Result<&'static str, ValidationError> {
        let extension = file_extension(filename);

        let allowed = extension
            .as_deref()
            .and_then(|ext| allow_list::mime_for_extension(ext))
            .and_then(allow_list::extension_for_mime);

        allowed.ok_or_else(|| ValidationError::ExtensionNotAllowed {
            extension,
            allowed: allow_list::allowed_extensions(),
        })
    }

    /// Filename-based guess first, then the allow-list's reverse table.
    /// Content bytes are not consulted.
    fn detect_mime_type(&self, filename: &str, extension: &str) -> Result<&'static str, ValidationError> {
        let guessed: Option<mime::Mime> = mime_guess::from_path(filename).first();

        let detected = match guessed {
            Some(mime) => Some(mime.essence_str().to_string()),
            None => allow_list::mime_for_extension(extension).map(str::to_string),
        };

        match detected.as_deref().and_then(allow_list::canonical_mime) {
            Some(mime_type) => Ok(mime_type),
            None => Err(ValidationError::MimeNotAllowed { detected }),
        }
    }

    fn check_suspicious_content(&self, sample: &[u8]) -> Result<(), ValidationError> {
        let sample = &sample[..sample.len().min(self.config.sample_size)];
        let lowered = sample.to_ascii_lowercase();

        for pattern in SUSPICIOUS_PATTERNS {
            let needle = pattern.as_bytes();
            if lowered.windows(needle.len()).any(|window| window == needle) {
                return Err(ValidationError::SuspiciousContent { marker: pattern });
            }
        }

        Ok(())
    }
}
