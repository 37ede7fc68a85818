//! File upload descriptors

use std::borrow::Cow;
use std::fmt;

use crate::error::{Result, WebProbeError};

/// Content of an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadContent {
    /// Raw bytes, sent as-is
    Bytes(Vec<u8>),
    /// Text, accepted only when it is pure ASCII
    Text(String),
}

impl UploadContent {
    /// The bytes to put on the wire
    ///
    /// # Errors
    ///
    /// Returns [`WebProbeError::TypeMismatch`] for non-ASCII text; encode it
    /// to bytes first.
    pub fn as_bytes(&self) -> Result<Cow<'_, [u8]>> {
        match self {
            Self::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
            Self::Text(text) if text.is_ascii() => Ok(Cow::Borrowed(text.as_bytes())),
            Self::Text(_) => Err(WebProbeError::TypeMismatch {
                expected: "bytes or ASCII text".into(),
                actual: "non-ASCII text (encode the content first)".into(),
            }),
        }
    }

    /// Whether there is nothing to send
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        match self {
            Self::Bytes(bytes) => bytes.is_empty(),
            Self::Text(text) => text.is_empty(),
        }
    }
}

impl From<Vec<u8>> for UploadContent {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for UploadContent {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<String> for UploadContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for UploadContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// A file to upload
///
/// Without content, the file is read from disk when the request is encoded
/// (relative to [`crate::config::TestAppConfig::relative_to`]).
///
/// # Examples
///
/// ```rust
/// use webprobe::forms::Upload;
///
/// let upload = Upload::with_content("notes.txt", "data").content_type("text/plain");
/// assert_eq!(upload.filename, "notes.txt");
/// assert_eq!(upload.to_string(), r#"<Upload "notes.txt">"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// File name reported to the application
    pub filename: String,
    /// File content, `None` to read `filename` from disk
    pub content: Option<UploadContent>,
    /// Explicit content type, guessed from the filename when absent
    pub content_type: Option<String>,
}

impl Upload {
    /// An upload whose content is read from disk
    #[must_use]
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: None,
            content_type: None,
        }
    }

    /// An upload with inline content
    #[must_use]
    pub fn with_content(filename: impl Into<String>, content: impl Into<UploadContent>) -> Self {
        Self {
            filename: filename.into(),
            content: Some(content.into()),
            content_type: None,
        }
    }

    /// Set the content type of the part
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Whether the upload names no file and carries no content
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filename.is_empty() && self.content.as_ref().is_none_or(UploadContent::is_empty)
    }
}

impl fmt::Display for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Upload \"{}\">", self.filename)
    }
}

/// A file field that currently holds an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadField {
    /// Field name
    pub name: String,
    /// The upload
    pub upload: Upload,
}

impl UploadField {
    /// Create an upload entry for `name`
    #[must_use]
    pub fn new(name: impl Into<String>, upload: Upload) -> Self {
        Self {
            name: name.into(),
            upload,
        }
    }
}
