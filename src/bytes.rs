use std::io::{self, ErrorKind, Read};

/// Append-only buffer of pending bytes fed by fixed-size reads from a reader.
///
/// Bytes are only ever removed from the front, either in bulk once a frame has been
/// consumed or one at a time while resynchronizing.
pub struct ByteSink<R>
where
    R: Read,
{
    reader: R,
    chunk_size: usize,
    num_read: usize,
    cache: Vec<u8>,
}

impl<R> ByteSink<R>
where
    R: Read,
{
    pub fn new(reader: R, chunk_size: usize) -> Self {
        ByteSink {
            reader,
            chunk_size: chunk_size.max(1),
            num_read: 0,
            cache: Vec::new(),
        }
    }

    /// Read at most one chunk from the reader and append it to the buffer.
    ///
    /// Returns the number of bytes appended; 0 means the reader is exhausted.
    ///
    /// # Errors
    /// Any ``std::io::Error`` other than [ErrorKind::Interrupted].
    pub fn fill(&mut self) -> Result<usize, io::Error> {
        let start = self.cache.len();
        self.cache.resize(start + self.chunk_size, 0);
        let n = loop {
            match self.reader.read(&mut self.cache[start..]) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.cache.truncate(start);
                    return Err(err);
                }
            }
        };
        self.cache.truncate(start + n);
        self.num_read += n;
        Ok(n)
    }

    /// Index of the first occurrence of `pattern` in the buffer.
    #[must_use]
    pub fn find(&self, pattern: &[u8]) -> Option<usize> {
        if pattern.is_empty() || self.cache.len() < pattern.len() {
            return None;
        }
        self.cache
            .windows(pattern.len())
            .position(|window| window == pattern)
    }

    /// True if the buffer front matches `prefix`, or the part of it that is buffered.
    #[must_use]
    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        let n = prefix.len().min(self.cache.len());
        n > 0 && self.cache[..n] == prefix[..n]
    }

    /// Remove `n` bytes from the front of the buffer.
    pub fn drop_front(&mut self, n: usize) {
        let n = n.min(self.cache.len());
        self.cache.drain(..n);
    }

    /// Drop everything except a trailing byte equal to the first byte of `marker`, which
    /// may be the start of a marker split across reads.
    ///
    /// Returns the number of bytes dropped.
    pub fn drop_all_but_marker_start(&mut self, marker: &[u8]) -> usize {
        let len = self.cache.len();
        let keep = match (self.cache.last(), marker.first()) {
            (Some(last), Some(first)) if marker.len() > 1 && last == first => 1,
            _ => 0,
        };
        self.drop_front(len - keep);
        len - keep
    }

    #[must_use]
    pub fn front(&self) -> Option<u8> {
        self.cache.first().copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.cache
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Stream offset of the first buffered byte.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.num_read - self.cache.len()
    }
}
