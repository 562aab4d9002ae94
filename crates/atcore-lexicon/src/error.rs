//! Errors from blob-reference parsing and lexicon schema validation (§7).

use smol_str::SmolStr;

/// Errors from parsing a blob reference envelope out of arbitrary JSON, and
/// from running a schema against a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum LexiconError {
    /// The blob envelope was missing its `ref` field.
    #[error("blob reference missing `ref`")]
    #[diagnostic(code(atcore::lexicon::missing_ref))]
    MissingRef,
    /// The blob envelope was missing its `size` field.
    #[error("blob reference missing `size`")]
    #[diagnostic(code(atcore::lexicon::missing_size))]
    MissingSize,
    /// The blob envelope was missing its `$type` field.
    #[error("blob reference missing `$type`")]
    #[diagnostic(code(atcore::lexicon::missing_type))]
    MissingType,
    /// `$type` was present but not `"blob"`.
    #[error("invalid `$type`: {0}")]
    #[diagnostic(code(atcore::lexicon::invalid_type))]
    InvalidType(SmolStr),
    /// `ref` was present but not a valid CID link.
    #[error("invalid blob ref: {0}")]
    #[diagnostic(code(atcore::lexicon::invalid_ref))]
    InvalidRef(SmolStr),
    /// `mimeType` failed the MIME type grammar.
    #[error("invalid MIME type: {0}")]
    #[diagnostic(code(atcore::lexicon::invalid_mime_type))]
    InvalidMimeType(SmolStr),
    /// `size` was present but not a non-negative integer.
    #[error("invalid size")]
    #[diagnostic(code(atcore::lexicon::invalid_size))]
    InvalidSize,
    /// The blob's declared size exceeded a caller-supplied limit.
    #[error("blob size exceeds limit of {limit} bytes")]
    #[diagnostic(code(atcore::lexicon::size_exceeded))]
    SizeExceeded {
        /// The limit the blob was checked against.
        limit: usize,
    },
}

/// A single validation failure, with the property/index path to it (§4.11).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
#[error("{message} (at {})", format_path(path))]
pub struct ValidationError {
    /// Property names and `[i]` tokens locating the failure within the value.
    pub path: Vec<PathSegment>,
    /// Human-readable description of the failure.
    pub message: String,
}

/// One segment of a [`ValidationError`] path: a property name or an array index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Property(SmolStr),
    Index(usize),
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSegment::Property(name) => write!(f, "{name}"),
            PathSegment::Index(i) => write!(f, "[{i}]"),
        }
    }
}

fn format_path(path: &[PathSegment]) -> String {
    if path.is_empty() {
        return "<root>".to_string();
    }
    path.iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(".")
}
