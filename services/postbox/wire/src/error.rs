//! Letter protocol error types.

use smallvec::SmallVec;
use std::fmt;
use std::io;
use thiserror::Error;

/// Coarse classification of every protocol error.
///
/// Format and framing errors leave the stream desynchronized and are fatal for
/// the connection. Validation errors happen after framing succeeded, so the
/// stream can keep being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Bad leading marker or unparseable kind line
    Format,
    /// Missing delimiter, empty key or unterminated body
    Framing,
    /// Structurally valid letter with invalid content
    Validation,
}

impl ErrorClass {
    /// Whether the stream must be dropped after an error of this class
    pub fn is_fatal(self) -> bool {
        !matches!(self, ErrorClass::Validation)
    }
}

/// Kind line parse errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KindError {
    /// Category requires a variant and none (or more than one) was given
    #[error("missing letter kind variant for {category:?}")]
    MissingVariant {
        /// Category that requires a variant
        category: &'static str,
    },

    /// Category takes no variant but one was given
    #[error("letter kind {category:?} takes no variant, got {variant:?}")]
    UnexpectedVariant {
        /// Category without variants
        category: &'static str,
        /// Trailing segment found after the category
        variant: String,
    },

    /// Category is not part of the taxonomy
    #[error("unknown letter kind {0:?}")]
    UnknownCategory(String),
}

/// Decoding errors, tagged with the position where framing broke
#[derive(Error, Debug)]
pub enum DecodeError {
    /// First byte of the letter is not `=` (`None` when the stream was empty)
    #[error("invalid format: expected leading '=', found {}", display_marker(.found))]
    InvalidMarker {
        /// Byte found instead of the marker
        found: Option<u8>,
    },

    /// The source failed before the leading marker could be read
    #[error("invalid format: reading letter marker: {0}")]
    ReadingMarker(#[source] io::Error),

    /// The kind line could not be read up to its newline
    #[error("invalid format: reading kind line: {0}")]
    ReadingKind(#[source] io::Error),

    /// The kind line was read but is not a valid kind
    #[error("invalid format: {0}")]
    InvalidKind(#[from] KindError),

    /// Failed reading the key half of a param line
    #[error("reading param:{index} key: {source}")]
    ReadingParamKey {
        /// 1-based param index
        index: usize,
        /// Underlying read failure
        #[source]
        source: io::Error,
    },

    /// Failed reading the value half of a param line
    #[error("reading param:{index} value: {source}")]
    ReadingParamValue {
        /// 1-based param index
        index: usize,
        /// Key whose value was being read
        key: String,
        /// Underlying read failure
        #[source]
        source: io::Error,
    },

    /// Param line starts with `=`
    #[error("param:{index} key is empty")]
    EmptyParamKey {
        /// 1-based param index
        index: usize,
    },

    /// Body is not terminated by NUL
    #[error("reading body: {0}")]
    ReadingBody(#[source] io::Error),
}

fn display_marker(found: &Option<u8>) -> String {
    match found {
        Some(byte) => format!("{:?}", char::from(*byte)),
        None => "end of stream".to_string(),
    }
}

impl DecodeError {
    /// Error class of this decode failure
    pub fn class(&self) -> ErrorClass {
        match self {
            DecodeError::InvalidMarker { .. }
            | DecodeError::ReadingMarker(_)
            | DecodeError::ReadingKind(_)
            | DecodeError::InvalidKind(_) => ErrorClass::Format,
            DecodeError::ReadingParamKey { .. }
            | DecodeError::ReadingParamValue { .. }
            | DecodeError::EmptyParamKey { .. }
            | DecodeError::ReadingBody(_) => ErrorClass::Framing,
        }
    }

    /// 1-based index of the param line that failed, if any
    pub fn param_index(&self) -> Option<usize> {
        match self {
            DecodeError::ReadingParamKey { index, .. }
            | DecodeError::ReadingParamValue { index, .. }
            | DecodeError::EmptyParamKey { index } => Some(*index),
            _ => None,
        }
    }

    /// Underlying I/O error, if the failure came from the byte source
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            DecodeError::ReadingMarker(err)
            | DecodeError::ReadingKind(err)
            | DecodeError::ReadingBody(err)
            | DecodeError::ReadingParamKey { source: err, .. }
            | DecodeError::ReadingParamValue { source: err, .. } => Some(err),
            _ => None,
        }
    }
}

/// Structural validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Variant is not one of the enumerated values for its category
    #[error("letter kind {category:?} has invalid variant {value:?}")]
    InvalidVariant {
        /// Category of the letter
        category: &'static str,
        /// Offending variant as seen on the wire
        value: String,
    },

    /// A required param is absent
    #[error("missing param: {key}")]
    MissingParam {
        /// Name of the missing param
        key: String,
    },

    /// Body is required but empty
    #[error("letter body is empty")]
    BodyEmpty,
}

impl ValidationError {
    /// Error class, always [`ErrorClass::Validation`]
    pub fn class(&self) -> ErrorClass {
        ErrorClass::Validation
    }

    pub(crate) fn missing_param(key: &str) -> Self {
        ValidationError::MissingParam {
            key: key.to_string(),
        }
    }
}

/// Ordered collection of every validation error found in one letter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: SmallVec<[ValidationError; 2]>,
}

impl ValidationErrors {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error
    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Append an error if `check` failed
    pub fn record(&mut self, check: Result<(), ValidationError>) {
        if let Err(error) = check {
            self.push(error);
        }
    }

    /// True when the letter is valid
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of collected errors
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate errors in the order they were found
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// Borrow the errors as a slice
    pub fn as_slice(&self) -> &[ValidationError] {
        &self.errors
    }

    /// `Ok(())` when empty, otherwise `Err(self)`
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return write!(f, "no validation errors");
        }
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = smallvec::IntoIter<[ValidationError; 2]>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl FromIterator<ValidationError> for ValidationErrors {
    fn from_iter<I: IntoIterator<Item = ValidationError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}
