use alloc::vec::Vec;

/// Split `payload` into approximately equal-sized chunks.
///
/// # Panics
///
/// Panics if `parts` is zero.
#[must_use]
pub fn produce_chunks(payload: &[u8], parts: usize) -> Vec<&[u8]> {
    assert!(parts > 0);
    let chunk_size = payload.len().div_ceil(parts).max(1);
    payload.chunks(chunk_size).collect()
}

/// A reader that returns a fixed sequence of chunks, one per `read` call,
/// regardless of the size of the caller's buffer. Chunks longer than the
/// buffer are handed out over several calls.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct ChunkedReader<'a> {
    chunks: alloc::collections::VecDeque<&'a [u8]>,
}

#[cfg(feature = "std")]
impl<'a> ChunkedReader<'a> {
    #[must_use]
    pub fn new(chunks: impl IntoIterator<Item = &'a [u8]>) -> Self {
        Self {
            chunks: chunks.into_iter().filter(|c| !c.is_empty()).collect(),
        }
    }

    /// Splits `payload` with [`produce_chunks`].
    #[must_use]
    pub fn split(payload: &'a [u8], parts: usize) -> Self {
        Self::new(produce_chunks(payload, parts))
    }
}

#[cfg(feature = "std")]
impl std::io::Read for ChunkedReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let Some(chunk) = self.chunks.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            self.chunks.push_front(&chunk[n..]);
        }
        Ok(n)
    }
}
