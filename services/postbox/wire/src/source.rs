//! Buffered byte source consumed by the decoders.

use std::io::{self, BufRead, ErrorKind};

/// Pull-based byte source with one byte of lookahead.
///
/// Every [`BufRead`] is a byte source, so decoders accept sockets wrapped in a
/// `BufReader`, in-memory slices and `Cursor`s alike. Deadlines and
/// cancellation belong to the implementation; whatever error it returns is
/// passed through untouched.
pub trait ByteSource {
    /// Consume one byte, `None` at end of stream
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Look at the next byte without consuming it, `None` at end of stream
    fn peek_byte(&mut self) -> io::Result<Option<u8>>;

    /// Append bytes to `buf` through and including `delim`.
    ///
    /// Returns `false` when the stream ended before `delim` was found; the
    /// bytes read so far are still appended.
    fn read_through(&mut self, delim: u8, buf: &mut Vec<u8>) -> io::Result<bool>;
}

impl<R: BufRead + ?Sized> ByteSource for R {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = self.peek_byte()?;
        if byte.is_some() {
            self.consume(1);
        }
        Ok(byte)
    }

    fn peek_byte(&mut self) -> io::Result<Option<u8>> {
        loop {
            match self.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }

    fn read_through(&mut self, delim: u8, buf: &mut Vec<u8>) -> io::Result<bool> {
        let read = self.read_until(delim, buf)?;
        Ok(read > 0 && buf.last() == Some(&delim))
    }
}

/// Read through `delim` and return the bytes without it.
///
/// A stream that ends first yields an `UnexpectedEof` error naming the
/// missing delimiter.
pub(crate) fn read_delimited<S: ByteSource + ?Sized>(
    source: &mut S,
    delim: u8,
) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if !source.read_through(delim, &mut buf)? {
        return Err(io::Error::new(
            ErrorKind::UnexpectedEof,
            format!(
                "stream ended before {:?} delimiter ({} bytes read)",
                char::from(delim),
                buf.len()
            ),
        ));
    }
    buf.pop();
    Ok(buf)
}

/// Convert a delimited field to UTF-8, reporting bad bytes as `InvalidData`
pub(crate) fn into_utf8(bytes: Vec<u8>) -> io::Result<String> {
    String::from_utf8(bytes).map_err(|err| io::Error::new(ErrorKind::InvalidData, err))
}
