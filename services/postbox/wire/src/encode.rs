//! Letter encoding.
//!
//! Nothing is escaped: a `=` in a key, a newline in a value or a NUL in the
//! body corrupts framing. Use [`Letter::is_wire_safe`] when fields come from
//! untrusted input.

use crate::letter::{Letter, BODY_END, LETTER_MARKER, LINE_END, PARAM_SEPARATOR};
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};

/// Order in which params are emitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamOrder {
    /// Lexicographic key order, byte-for-byte reproducible
    #[default]
    Sorted,
    /// Whatever order the map yields
    Arbitrary,
}

impl std::str::FromStr for ParamOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sorted" => Ok(ParamOrder::Sorted),
            "arbitrary" => Ok(ParamOrder::Arbitrary),
            other => Err(format!("unknown param order {other:?}")),
        }
    }
}

/// Params in emission order
fn ordered_params(
    params: &HashMap<String, String>,
    order: ParamOrder,
) -> Vec<(&String, &String)> {
    let mut lines: Vec<_> = params.iter().collect();
    if order == ParamOrder::Sorted {
        lines.sort_unstable_by(|a, b| a.0.cmp(b.0));
    }
    lines
}

pub(crate) fn write_param_lines<W: Write + ?Sized>(
    writer: &mut W,
    params: &HashMap<String, String>,
    order: ParamOrder,
) -> io::Result<()> {
    for (key, value) in ordered_params(params, order) {
        write_param_line(writer, key, value)?;
    }
    Ok(())
}

fn write_param_line<W: Write + ?Sized>(writer: &mut W, key: &str, value: &str) -> io::Result<()> {
    writer.write_all(key.as_bytes())?;
    writer.write_all(&[PARAM_SEPARATOR])?;
    writer.write_all(value.as_bytes())?;
    writer.write_all(&[LINE_END])
}

pub(crate) fn write_body_section<W: Write + ?Sized>(writer: &mut W, body: &[u8]) -> io::Result<()> {
    writer.write_all(&[LINE_END])?;
    writer.write_all(body)?;
    writer.write_all(&[BODY_END])
}

impl Letter {
    /// Write `=` and the kind line
    pub fn write_header<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&[LETTER_MARKER])?;
        write!(writer, "{}", self.kind)?;
        writer.write_all(&[LINE_END])
    }

    /// Write param lines in arbitrary order.
    ///
    /// Output differs between runs; use [`Letter::write_params_sorted`] for
    /// anything compared byte-for-byte.
    pub fn write_params<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        write_param_lines(writer, &self.params, ParamOrder::Arbitrary)
    }

    /// Write param lines in lexicographic key order
    pub fn write_params_sorted<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        write_param_lines(writer, &self.params, ParamOrder::Sorted)
    }

    /// Write the blank sentinel line, the body and its NUL terminator
    pub fn write_body<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        write_body_section(writer, &self.body)
    }

    /// Write the whole letter with params in the given order
    pub fn write_with<W: Write + ?Sized>(&self, writer: &mut W, order: ParamOrder) -> io::Result<()> {
        self.write_header(writer)?;
        write_param_lines(writer, &self.params, order)?;
        self.write_body(writer)
    }

    /// Write the whole letter, params in arbitrary order
    pub fn write<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        self.write_with(writer, ParamOrder::Arbitrary)
    }

    /// Write the whole letter, params sorted
    pub fn write_sorted<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        self.write_with(writer, ParamOrder::Sorted)
    }

    /// Exact encoded size in bytes
    pub fn encoded_len(&self) -> usize {
        let header = 1 + self.kind.to_string().len() + 1;
        let params: usize = self
            .params
            .iter()
            .map(|(key, value)| key.len() + 1 + value.len() + 1)
            .sum();
        header + params + 1 + self.body.len() + 1
    }

    /// Encode into a contiguous buffer
    pub fn to_bytes(&self, order: ParamOrder) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.put_into(&mut buf, order);
        buf.freeze()
    }

    fn put_into<B: BufMut>(&self, buf: &mut B, order: ParamOrder) {
        buf.put_u8(LETTER_MARKER);
        buf.put_slice(self.kind.to_string().as_bytes());
        buf.put_u8(LINE_END);
        for (key, value) in ordered_params(&self.params, order) {
            buf.put_slice(key.as_bytes());
            buf.put_u8(PARAM_SEPARATOR);
            buf.put_slice(value.as_bytes());
            buf.put_u8(LINE_END);
        }
        buf.put_u8(LINE_END);
        buf.put_slice(&self.body);
        buf.put_u8(BODY_END);
    }

    /// Encode into a contiguous buffer with params sorted
    pub fn to_bytes_sorted(&self) -> Bytes {
        self.to_bytes(ParamOrder::Sorted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::read_letter;
    use crate::kind::{ErrorVariant, Kind, StatusVariant, UserVariant};

    const BODY: &str = "# Title\nThis is example content of the letter here.";

    fn sample() -> Letter {
        Letter::new(Kind::Message)
            .with_param("header_name_2", "some header value 2")
            .with_param("header_name_1", "some header value 1")
            .with_param("header_name_3", "")
            .with_body(BODY)
    }

    #[test]
    fn test_write_header() {
        let mut buf = Vec::new();
        Letter::new(Kind::Error(ErrorVariant::AccessDenied))
            .write_header(&mut buf)
            .unwrap();
        assert_eq!(buf, b"=error.access_denied\n");
    }

    #[test]
    fn test_write_params_sorted() {
        let mut buf = Vec::new();
        sample().write_params_sorted(&mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "header_name_1=some header value 1\nheader_name_2=some header value 2\nheader_name_3=\n"
        );
    }

    #[test]
    fn test_write_params_arbitrary_has_every_line() {
        let mut buf = Vec::new();
        sample().write_params(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines: Vec<&str> = text.lines().collect();
        lines.sort();
        assert_eq!(
            lines,
            vec![
                "header_name_1=some header value 1",
                "header_name_2=some header value 2",
                "header_name_3=",
            ]
        );
    }

    #[test]
    fn test_write_body() {
        let mut buf = Vec::new();
        Letter::new(Kind::Reciept).write_body(&mut buf).unwrap();
        assert_eq!(buf, b"\n\x00");
    }

    #[test]
    fn test_write_sorted_full_letter() {
        let mut buf = Vec::new();
        sample().write_sorted(&mut buf).unwrap();
        let expected = format!(
            "=message\nheader_name_1=some header value 1\nheader_name_2=some header value 2\nheader_name_3=\n\n{}\x00",
            BODY
        );
        assert_eq!(buf, expected.as_bytes());
    }

    #[test]
    fn test_write_always_includes_header() {
        let mut buf = Vec::new();
        Letter::new(Kind::Undefined).write(&mut buf).unwrap();
        assert_eq!(buf, b"=undefined\n\n\x00");
    }

    #[test]
    fn test_encoded_len_matches_output() {
        let letter = sample();
        assert_eq!(letter.to_bytes_sorted().len(), letter.encoded_len());
        assert_eq!(
            letter.to_bytes(ParamOrder::Arbitrary).len(),
            letter.encoded_len()
        );
    }

    #[test]
    fn test_to_bytes_matches_writer() {
        let letter = sample().with_param("a", "first");
        let mut written = Vec::new();
        letter.write_sorted(&mut written).unwrap();
        assert_eq!(&letter.to_bytes_sorted()[..], &written[..]);
    }

    #[test]
    fn test_round_trip_sorted() {
        let letters = vec![
            sample(),
            Letter::error(ErrorVariant::Custom, "quota exceeded").with_param("code", "429"),
            Letter::new(Kind::User(UserVariant::LogIn))
                .with_param("user_id", "bob")
                .with_param("password", "p@ss=word"),
            Letter::new(Kind::Status(StatusVariant::Idle)),
            Letter::new(Kind::User(UserVariant::Other("promote".into()))),
            Letter::new(Kind::Message).with_body(vec![0xde, 0xad, b'\n', b'=']),
            Letter::error(ErrorVariant::Other("internal".into()), "x"),
            Letter::new(Kind::User(UserVariant::Other("log_in".into())))
                .with_param("user_id", "bob")
                .with_param("password", "pw"),
        ];

        for letter in letters {
            assert!(letter.is_wire_safe());
            let bytes = letter.to_bytes_sorted();
            let mut source: &[u8] = &bytes;
            let decoded = read_letter(&mut source).unwrap();
            assert_eq!(decoded, letter);
            assert!(source.is_empty());
        }
    }

    #[test]
    fn test_param_order_from_str() {
        assert_eq!("sorted".parse::<ParamOrder>().unwrap(), ParamOrder::Sorted);
        assert_eq!(
            "Arbitrary".parse::<ParamOrder>().unwrap(),
            ParamOrder::Arbitrary
        );
        assert!("random".parse::<ParamOrder>().is_err());
    }
}
