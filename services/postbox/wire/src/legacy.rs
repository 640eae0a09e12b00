//! Header-only message format that predates letters.
//!
//! A legacy message has no kind line; its type travels in the `type` header:
//!
//! ```text
//! type=error\n
//! subject=internal\n
//! \n
//! body\0
//! ```
//!
//! Header and body framing are identical to letters, so decoding reports the
//! same [`DecodeError`] variants.

use crate::decode::{read_body, read_params, Decode};
use crate::encode::{write_body_section, write_param_lines, ParamOrder};
use crate::error::{DecodeError, ValidationError, ValidationErrors};
use crate::source::ByteSource;
use crate::validate::ensure_body_not_empty_bytes;
use bytes::Bytes;
use std::collections::HashMap;
use std::io::{self, Write};
use tracing::trace;

/// Header carrying the message type
pub const TYPE_HEADER: &str = "type";
/// Header carrying the subject of an error message
pub const SUBJECT_HEADER: &str = "subject";

/// Type reported when the `type` header is absent
pub const TYPE_UNSPECIFIED: &str = "unspecified";
/// Chat message
pub const TYPE_MESSAGE: &str = "message";
/// Delivery receipt
pub const TYPE_RECEIPT: &str = "reciept";
/// Error report
pub const TYPE_ERROR: &str = "error";

/// Message in the header-only format
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyMessage {
    /// Headers, keys are unique and their order is irrelevant
    pub header: HashMap<String, String>,
    /// Raw body
    pub body: Bytes,
}

impl LegacyMessage {
    /// Empty message without a type
    pub fn new() -> Self {
        Self::default()
    }

    /// Error message with the given subject and an empty body
    pub fn error(subject: impl Into<String>) -> Self {
        Self::new()
            .with_header(TYPE_HEADER, TYPE_ERROR)
            .with_header(SUBJECT_HEADER, subject)
    }

    /// Add or replace a header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.header.insert(key.into(), value.into());
        self
    }

    /// Replace the body
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Value of the `type` header, [`TYPE_UNSPECIFIED`] when absent
    pub fn message_type(&self) -> &str {
        self.header
            .get(TYPE_HEADER)
            .map_or(TYPE_UNSPECIFIED, String::as_str)
    }

    /// Check the message against the rules of its type.
    ///
    /// `error` needs a `subject` header and a body, `message` needs a body.
    /// Every failing rule is reported.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match self.message_type() {
            TYPE_ERROR => {
                errors.record(self.ensure_contains_header(SUBJECT_HEADER));
                errors.record(ensure_body_not_empty_bytes(&self.body));
            }
            TYPE_MESSAGE => errors.record(ensure_body_not_empty_bytes(&self.body)),
            _ => {}
        }
        errors.into_result()
    }

    fn ensure_contains_header(&self, key: &str) -> Result<(), ValidationError> {
        if self.header.contains_key(key) {
            Ok(())
        } else {
            Err(ValidationError::missing_param(key))
        }
    }

    /// Write header lines in arbitrary order
    pub fn write_header<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        write_param_lines(writer, &self.header, ParamOrder::Arbitrary)
    }

    /// Write header lines in lexicographic key order
    pub fn write_header_sorted<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        write_param_lines(writer, &self.header, ParamOrder::Sorted)
    }

    /// Write the blank sentinel line, the body and its NUL terminator
    pub fn write_body<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        write_body_section(writer, &self.body)
    }

    /// Write the whole message with headers in the given order
    pub fn write_with<W: Write + ?Sized>(&self, writer: &mut W, order: ParamOrder) -> io::Result<()> {
        write_param_lines(writer, &self.header, order)?;
        self.write_body(writer)
    }
}

/// Decode one legacy message
pub fn read_legacy_message<S: ByteSource + ?Sized>(
    source: &mut S,
) -> Result<LegacyMessage, DecodeError> {
    let header = read_params(source)?;
    let body = read_body(source)?;

    trace!(headers = header.len(), body_len = body.len(), "decoded legacy message");

    Ok(LegacyMessage { header, body })
}

impl Decode for LegacyMessage {
    fn decode_from<S: ByteSource + ?Sized>(source: &mut S) -> Result<Self, DecodeError> {
        read_legacy_message(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::LetterReader;

    const HEADER1: &str = "header_name_1=some header value 1\n";
    const HEADER2: &str = "header_name_2=some header value 2\n";
    const HEADER3: &str = "header_name_3=\n";
    const BODY: &str = "# Title\nThis is example content of the message here.";

    fn decode(input: &str) -> Result<LegacyMessage, DecodeError> {
        let mut source = input.as_bytes();
        read_legacy_message(&mut source)
    }

    fn sample() -> LegacyMessage {
        LegacyMessage::new()
            .with_header("header_name_1", "some header value 1")
            .with_header("header_name_2", "some header value 2")
            .with_header("header_name_3", "")
            .with_body(BODY)
    }

    #[test]
    fn test_read_legacy_message() {
        let input = format!("{HEADER1}{HEADER2}{HEADER3}\n{BODY}\x00");
        assert_eq!(decode(&input).unwrap(), sample());

        let input = format!("\n{BODY}\x00");
        assert_eq!(
            decode(&input).unwrap(),
            LegacyMessage::new().with_body(BODY)
        );
    }

    #[test]
    fn test_read_legacy_message_errors() {
        let input = format!("{HEADER1}{HEADER2}{HEADER3}invalid_header\n{BODY}\x00");
        assert!(matches!(
            decode(&input),
            Err(DecodeError::ReadingParamKey { index: 4, .. })
        ));

        let input = format!("{HEADER1}{HEADER2}{HEADER3}=empty key name\n{BODY}\x00");
        assert!(matches!(
            decode(&input),
            Err(DecodeError::EmptyParamKey { index: 4 })
        ));

        let input = format!("{HEADER1}{HEADER2}{HEADER3}invalid_header=");
        assert!(matches!(
            decode(&input),
            Err(DecodeError::ReadingParamValue { index: 4, .. })
        ));

        let input = format!("{HEADER1}{HEADER2}{HEADER3}\n{BODY}");
        assert!(matches!(decode(&input), Err(DecodeError::ReadingBody(_))));
    }

    #[test]
    fn test_write_sorted() {
        let mut buf = Vec::new();
        let message = sample();
        message.write_header_sorted(&mut buf).unwrap();
        message.write_body(&mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            format!("{HEADER1}{HEADER2}{HEADER3}\n{BODY}\x00")
        );

        let mut buf = Vec::new();
        LegacyMessage::new()
            .with_body(BODY)
            .write_with(&mut buf, ParamOrder::Sorted)
            .unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), format!("\n{BODY}\x00"));
    }

    #[test]
    fn test_message_type() {
        assert_eq!(LegacyMessage::new().message_type(), TYPE_UNSPECIFIED);
        assert_eq!(LegacyMessage::error("internal").message_type(), TYPE_ERROR);
    }

    #[test]
    fn test_validate_untyped() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_error() {
        let message = LegacyMessage::new()
            .with_header(TYPE_HEADER, TYPE_ERROR)
            .with_body("123");
        let errors = message.validate().unwrap_err();
        assert_eq!(
            errors.as_slice(),
            &[ValidationError::MissingParam {
                key: SUBJECT_HEADER.to_string()
            }]
        );

        let errors = LegacyMessage::error("internal").validate().unwrap_err();
        assert_eq!(errors.as_slice(), &[ValidationError::BodyEmpty]);

        let errors = LegacyMessage::new()
            .with_header(TYPE_HEADER, TYPE_ERROR)
            .validate()
            .unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_validate_message() {
        let errors = LegacyMessage::new()
            .with_header(TYPE_HEADER, TYPE_MESSAGE)
            .validate()
            .unwrap_err();
        assert_eq!(errors.as_slice(), &[ValidationError::BodyEmpty]);
    }

    #[test]
    fn test_legacy_reader() {
        let stream: &[u8] = b"type=message\n\nhi\x00type=reciept\n\n\x00";
        let types: Vec<String> = LetterReader::legacy(stream)
            .map(|message| message.unwrap().message_type().to_string())
            .collect();
        assert_eq!(types, vec![TYPE_MESSAGE, TYPE_RECEIPT]);
    }
}
