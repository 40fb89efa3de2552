//! Sequential byte cursors feeding the scanner.
//!
//! The scanner is written once against [`ByteSource`]. [`SliceSource`] walks
//! an in-memory buffer; [`ReaderSource`] pulls fixed-size chunks from any
//! [`std::io::Read`] into a reusable buffer. Because the scanner only ever
//! sees the byte sequence, both adapters produce identical token streams for
//! identical content no matter how reads are split.

use alloc::{string::String, vec::Vec};

use thiserror::Error;

/// Failure reported by a [`ByteSource`] while fetching more input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct SourceError {
    message: String,
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        use alloc::string::ToString;

        Self::new(err.to_string())
    }
}

/// A forward-only byte cursor with one byte of lookahead.
pub trait ByteSource {
    /// Returns the next byte without consuming it, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying source fails to produce more bytes.
    fn peek(&mut self) -> Result<Option<u8>, SourceError>;

    /// Consumes the byte most recently returned by [`peek`](Self::peek).
    fn bump(&mut self);

    /// Consumes bytes while `pred` holds, appending them to `out`. Returns the
    /// number of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying source fails to produce more bytes.
    fn take_while<F: Fn(u8) -> bool>(
        &mut self,
        out: &mut Vec<u8>,
        pred: F,
    ) -> Result<usize, SourceError> {
        let mut taken = 0;
        while let Some(b) = self.peek()? {
            if !pred(b) {
                break;
            }
            out.push(b);
            self.bump();
            taken += 1;
        }
        Ok(taken)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn peek(&mut self) -> Result<Option<u8>, SourceError> {
        (**self).peek()
    }

    fn bump(&mut self) {
        (**self).bump();
    }

    fn take_while<F: Fn(u8) -> bool>(
        &mut self,
        out: &mut Vec<u8>,
        pred: F,
    ) -> Result<usize, SourceError> {
        (**self).take_while(out, pred)
    }
}

/// A [`ByteSource`] over a complete in-memory document.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }
}

impl ByteSource for SliceSource<'_> {
    #[inline]
    fn peek(&mut self) -> Result<Option<u8>, SourceError> {
        Ok(self.bytes.get(self.pos).copied())
    }

    #[inline]
    fn bump(&mut self) {
        if self.pos < self.bytes.len() {
            self.pos += 1;
        }
    }

    fn take_while<F: Fn(u8) -> bool>(
        &mut self,
        out: &mut Vec<u8>,
        pred: F,
    ) -> Result<usize, SourceError> {
        let rest = &self.bytes[self.pos..];
        let n = rest.iter().position(|b| !pred(*b)).unwrap_or(rest.len());
        out.extend_from_slice(&rest[..n]);
        self.pos += n;
        Ok(n)
    }
}

/// A [`ByteSource`] that reads incrementally from an [`std::io::Read`].
///
/// Reads are issued only when the scanner needs a byte that is not yet
/// buffered; `Interrupted` reads are retried.
#[cfg(feature = "std")]
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    buf: Vec<u8>,
    pos: usize,
    len: usize,
    eof: bool,
    /// A read failure hit after `take_while` had already consumed bytes.
    deferred: Option<SourceError>,
}

#[cfg(feature = "std")]
impl<R: std::io::Read> ReaderSource<R> {
    /// Default number of bytes requested per `read` call.
    pub const DEFAULT_CHUNK_SIZE: usize = 8192;

    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, Self::DEFAULT_CHUNK_SIZE)
    }

    /// Reads at most `chunk_size` bytes per call. A size of zero is treated
    /// as one.
    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            buf: alloc::vec![0; chunk_size.max(1)],
            pos: 0,
            len: 0,
            eof: false,
            deferred: None,
        }
    }

    /// Returns the wrapped reader, discarding any buffered bytes.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn fill(&mut self) -> Result<(), SourceError> {
        if let Some(err) = self.deferred.take() {
            return Err(err);
        }
        while self.pos == self.len && !self.eof {
            match self.reader.read(&mut self.buf) {
                Ok(0) => self.eof = true,
                Ok(n) => {
                    self.pos = 0;
                    self.len = n;
                }
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}

#[cfg(feature = "std")]
impl<R: std::io::Read> ByteSource for ReaderSource<R> {
    #[inline]
    fn peek(&mut self) -> Result<Option<u8>, SourceError> {
        if self.pos == self.len {
            self.fill()?;
        }
        if self.pos < self.len {
            Ok(Some(self.buf[self.pos]))
        } else {
            Ok(None)
        }
    }

    #[inline]
    fn bump(&mut self) {
        if self.pos < self.len {
            self.pos += 1;
        }
    }

    fn take_while<F: Fn(u8) -> bool>(
        &mut self,
        out: &mut Vec<u8>,
        pred: F,
    ) -> Result<usize, SourceError> {
        let mut taken = 0;
        loop {
            if self.pos == self.len {
                if let Err(err) = self.fill() {
                    if taken == 0 {
                        return Err(err);
                    }
                    self.deferred = Some(err);
                    return Ok(taken);
                }
                if self.pos == self.len {
                    return Ok(taken);
                }
            }
            let rest = &self.buf[self.pos..self.len];
            let n = rest.iter().position(|b| !pred(*b)).unwrap_or(rest.len());
            out.extend_from_slice(&rest[..n]);
            self.pos += n;
            taken += n;
            if self.pos < self.len {
                return Ok(taken);
            }
        }
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use alloc::vec::Vec;
    use std::io;

    use super::*;

    /// Reader that hands out one byte per call and reports `Interrupted`
    /// every other call.
    struct Stuttering<'a> {
        data: &'a [u8],
        interrupt: bool,
    }

    impl io::Read for Stuttering<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            match self.data.split_first() {
                Some((b, rest)) if !buf.is_empty() => {
                    buf[0] = *b;
                    self.data = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    fn drain(mut src: impl ByteSource) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(b) = src.peek().unwrap() {
            out.push(b);
            src.bump();
        }
        out
    }

    #[test]
    fn slice_and_reader_yield_same_bytes() {
        let doc = br#"{"a": [1, 2]}"#;
        assert_eq!(drain(SliceSource::new(doc)), doc.to_vec());
        assert_eq!(
            drain(ReaderSource::with_chunk_size(&doc[..], 3)),
            doc.to_vec()
        );
    }

    #[test]
    fn reader_retries_interrupted_reads() {
        let src = ReaderSource::with_chunk_size(
            Stuttering {
                data: b"[true]",
                interrupt: false,
            },
            4,
        );
        assert_eq!(drain(src), b"[true]".to_vec());
    }

    #[test]
    fn take_while_crosses_chunk_boundaries() {
        let mut src = ReaderSource::with_chunk_size(&b"12345,"[..], 2);
        let mut out = Vec::new();
        let n = src.take_while(&mut out, |b| b.is_ascii_digit()).unwrap();
        assert_eq!(n, 5);
        assert_eq!(out, b"12345");
        assert_eq!(src.peek().unwrap(), Some(b','));
    }

    #[test]
    fn read_error_after_partial_take_is_deferred() {
        struct Flaky(bool);
        impl io::Read for Flaky {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if std::mem::replace(&mut self.0, true) {
                    return Err(io::Error::other("gone"));
                }
                buf[..2].copy_from_slice(b"12");
                Ok(2)
            }
        }
        let mut src = ReaderSource::new(Flaky(false));
        let mut out = Vec::new();
        assert_eq!(src.take_while(&mut out, |b| b.is_ascii_digit()).unwrap(), 2);
        assert_eq!(src.peek().unwrap_err().message(), "gone");
    }

    #[test]
    fn zero_chunk_size_reads_one_byte_at_a_time() {
        struct Sizes<'a> {
            data: &'a [u8],
            requested: Vec<usize>,
        }
        impl io::Read for Sizes<'_> {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                self.requested.push(buf.len());
                let n = self.data.len().min(buf.len());
                buf[..n].copy_from_slice(&self.data[..n]);
                self.data = &self.data[n..];
                Ok(n)
            }
        }
        let mut src = ReaderSource::with_chunk_size(
            Sizes {
                data: b"[1]",
                requested: Vec::new(),
            },
            0,
        );
        let mut out = Vec::new();
        while let Some(b) = src.peek().unwrap() {
            out.push(b);
            src.bump();
        }
        assert_eq!(out, b"[1]");
        assert_eq!(src.into_inner().requested, [1, 1, 1, 1]);
    }

    #[test]
    fn read_errors_surface() {
        struct Broken;
        impl io::Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("disk on fire"))
            }
        }
        let mut src = ReaderSource::new(Broken);
        let err = src.peek().unwrap_err();
        assert_eq!(err.message(), "disk on fire");
    }
}
