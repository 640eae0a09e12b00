//! Letter decoding.
//!
//! The decoder is a single forward pass over a [`ByteSource`]: every byte is
//! consumed exactly once and the only lookahead is the one-byte peek that
//! detects the blank line closing the params section.

use crate::error::DecodeError;
use crate::kind::Kind;
use crate::legacy::LegacyMessage;
use crate::letter::{Letter, BODY_END, LETTER_MARKER, LINE_END, PARAM_SEPARATOR};
use crate::source::{into_utf8, read_delimited, ByteSource};
use bytes::Bytes;
use std::collections::HashMap;
use std::io::{self, BufRead, ErrorKind};
use std::marker::PhantomData;
use tracing::{debug, trace};

/// Types that can be decoded from a byte source
pub trait Decode: Sized {
    /// Decode exactly one value, consuming its terminator
    fn decode_from<S: ByteSource + ?Sized>(source: &mut S) -> Result<Self, DecodeError>;
}

impl Decode for Letter {
    fn decode_from<S: ByteSource + ?Sized>(source: &mut S) -> Result<Self, DecodeError> {
        read_letter(source)
    }
}

/// Decode one letter.
///
/// ```text
/// Letter    := '=' KindLine '\n' ParamLine* '\n' Body NUL
/// KindLine  := Category | Category '.' Variant
/// ParamLine := Key '=' Value '\n'
/// ```
///
/// On error nothing is returned; the source is left wherever the failure
/// happened and should be treated as desynchronized.
pub fn read_letter<S: ByteSource + ?Sized>(source: &mut S) -> Result<Letter, DecodeError> {
    let kind = read_header(source)?;
    let params = read_params(source)?;
    let body = read_body(source)?;

    trace!(kind = %kind, params = params.len(), body_len = body.len(), "decoded letter");

    Ok(Letter { kind, params, body })
}

/// Read the `=` marker and the kind line
fn read_header<S: ByteSource + ?Sized>(source: &mut S) -> Result<Kind, DecodeError> {
    match source.read_byte() {
        Ok(Some(LETTER_MARKER)) => {}
        Ok(found) => return Err(DecodeError::InvalidMarker { found }),
        Err(err) => return Err(DecodeError::ReadingMarker(err)),
    }

    let line = read_delimited(source, LINE_END)
        .and_then(into_utf8)
        .map_err(DecodeError::ReadingKind)?;

    Ok(Kind::parse(&line)?)
}

/// Read param lines up to and including the blank sentinel line
pub(crate) fn read_params<S: ByteSource + ?Sized>(
    source: &mut S,
) -> Result<HashMap<String, String>, DecodeError> {
    let mut params = HashMap::new();
    let mut index = 1;

    loop {
        let next = source
            .peek_byte()
            .map_err(|source| DecodeError::ReadingParamKey { index, source })?;
        if next == Some(LINE_END) {
            source
                .read_byte()
                .map_err(|source| DecodeError::ReadingParamKey { index, source })?;
            break;
        }

        let key = read_param_key(source, index)?;
        let value = read_delimited(source, LINE_END)
            .and_then(into_utf8)
            .map_err(|source| DecodeError::ReadingParamValue {
                index,
                key: key.clone(),
                source,
            })?;

        trace!(index, key = %key, "decoded param");
        if let Some(previous) = params.insert(key, value) {
            trace!(index, previous = %previous, "param key repeated, keeping last value");
        }
        index += 1;
    }

    Ok(params)
}

fn read_param_key<S: ByteSource + ?Sized>(
    source: &mut S,
    index: usize,
) -> Result<String, DecodeError> {
    let raw = read_delimited(source, PARAM_SEPARATOR)
        .map_err(|source| DecodeError::ReadingParamKey { index, source })?;

    if raw.is_empty() {
        return Err(DecodeError::EmptyParamKey { index });
    }

    if raw.contains(&LINE_END) {
        return Err(DecodeError::ReadingParamKey {
            index,
            source: io::Error::new(
                ErrorKind::InvalidData,
                "param line has no '=' separator",
            ),
        });
    }

    into_utf8(raw).map_err(|source| DecodeError::ReadingParamKey { index, source })
}

/// Read the body through its NUL terminator
pub(crate) fn read_body<S: ByteSource + ?Sized>(source: &mut S) -> Result<Bytes, DecodeError> {
    read_delimited(source, BODY_END)
        .map(Bytes::from)
        .map_err(DecodeError::ReadingBody)
}

/// Decodes consecutive values from one stream.
///
/// A clean end of stream between two values ends iteration. The first decode
/// error poisons the reader: the stream is desynchronized, so no further
/// values are produced and the caller should drop the connection.
#[derive(Debug)]
pub struct LetterReader<R, T = Letter> {
    inner: R,
    poisoned: bool,
    decoded: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<R: BufRead> LetterReader<R> {
    /// Reader producing [`Letter`]s
    pub fn new(inner: R) -> Self {
        Self::with_inner(inner)
    }
}

impl<R: BufRead> LetterReader<R, LegacyMessage> {
    /// Reader producing header-only [`LegacyMessage`]s
    pub fn legacy(inner: R) -> Self {
        Self::with_inner(inner)
    }
}

impl<R: BufRead, T: Decode> LetterReader<R, T> {
    fn with_inner(inner: R) -> Self {
        Self {
            inner,
            poisoned: false,
            decoded: 0,
            _marker: PhantomData,
        }
    }

    /// Decode the next value, `Ok(None)` at end of stream or once poisoned
    pub fn next_letter(&mut self) -> Result<Option<T>, DecodeError> {
        if self.poisoned {
            return Ok(None);
        }

        match self.inner.peek_byte() {
            Ok(None) => return Ok(None),
            Ok(Some(_)) => {}
            Err(err) => {
                self.poisoned = true;
                return Err(DecodeError::ReadingMarker(err));
            }
        }

        match T::decode_from(&mut self.inner) {
            Ok(value) => {
                self.decoded += 1;
                Ok(Some(value))
            }
            Err(err) => {
                self.poisoned = true;
                debug!(
                    decoded = self.decoded,
                    class = ?err.class(),
                    param_index = ?err.param_index(),
                    "stream desynchronized: {}",
                    err
                );
                Err(err)
            }
        }
    }

    /// Number of values decoded so far
    pub fn decoded(&self) -> u64 {
        self.decoded
    }

    /// Whether a decode error stopped the reader
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Borrow the underlying source
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Recover the underlying source
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: BufRead, T: Decode> Iterator for LetterReader<R, T> {
    type Item = Result<T, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_letter().transpose()
    }
}
