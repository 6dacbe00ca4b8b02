use std::io::Read;
use std::ops::Range;

use tracing::{debug, trace};

use crate::bytes::ByteSink;
use crate::integrity::Checksum;
use crate::Result;

/// Describes how frames of one log family are delimited and protected.
pub trait FrameFormat {
    /// Frame start marker.
    fn marker(&self) -> &[u8];

    /// Number of bytes, starting at the marker, required by [FrameFormat::frame_len].
    fn header_len(&self) -> usize;

    /// Total frame length, or `None` if the header describes an impossible frame.
    fn frame_len(&self, header: &[u8]) -> Option<usize>;

    fn checksum(&self) -> &dyn Checksum;

    /// Bytes of a `frame_len` frame covered by the checksum.
    fn checksum_span(&self, frame_len: usize) -> Range<usize>;

    /// Checksum value carried by `frame`.
    fn stored_checksum(&self, frame: &[u8]) -> u16;

    /// True if the checksum carried by `frame` matches the computed one.
    fn verify(&self, frame: &[u8]) -> bool {
        let span = self.checksum_span(frame.len());
        self.checksum().compute(&frame[span]) == self.stored_checksum(frame)
    }
}

/// A checksum validated frame, including marker and checksum bytes.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Stream offset of the first marker byte.
    pub offset: usize,
    pub data: Vec<u8>,
}

/// Outcome of a single scan over the currently buffered bytes.
#[derive(Debug)]
enum Scan {
    Frame(Frame),
    NeedMore,
}

/// Tracks scanning results.
#[derive(Debug, Default, Clone)]
pub struct ScanStats {
    /// Frames accepted.
    pub frames: usize,
    /// Runs of discarded bytes between accepted frames.
    pub resyncs: usize,
    /// Frames rejected because of a checksum mismatch.
    pub bad_checksums: usize,
    /// Total bytes discarded.
    pub discarded: usize,

    resyncing: bool,
}

impl ScanStats {
    fn discard(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        if !self.resyncing {
            self.resyncing = true;
            self.resyncs += 1;
        }
        self.discarded += n;
    }

    fn accept(&mut self) {
        self.frames += 1;
        self.resyncing = false;
    }
}

/// Locates checksum valid frames in a byte stream.
///
/// Bytes are pulled from the reader in fixed size chunks. A single chunk may yield
/// several frames, and a frame may span several chunks. After a checksum mismatch the
/// scanner drops bytes up to the next possible marker and resumes scanning, so the
/// frames following a corrupt one are not lost. The same applies at the end of the
/// stream to a frame that can no longer complete.
pub struct FrameScanner<R, F>
where
    R: Read,
    F: FrameFormat,
{
    sink: ByteSink<R>,
    format: F,
    stats: ScanStats,
    eof: bool,
    truncated: usize,
    done: bool,
}

impl<R, F> FrameScanner<R, F>
where
    R: Read,
    F: FrameFormat,
{
    pub fn new(reader: R, format: F, chunk_size: usize) -> Self {
        FrameScanner {
            sink: ByteSink::new(reader, chunk_size),
            format,
            stats: ScanStats::default(),
            eof: false,
            truncated: 0,
            done: false,
        }
    }

    #[must_use]
    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    #[must_use]
    pub fn format(&self) -> &F {
        &self.format
    }

    /// Length of the partial frame left at the end of the stream, once the reader
    /// is exhausted and no further frame could be found behind it.
    #[must_use]
    pub fn truncated(&self) -> usize {
        self.truncated
    }

    /// Scan for the next frame, reading more data as needed.
    ///
    /// Returns `Ok(None)` once the reader is exhausted.
    ///
    /// # Errors
    /// [crate::Error::Io] if reading fails.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            if let Scan::Frame(frame) = self.scan() {
                return Ok(Some(frame));
            }
            if !self.eof && self.sink.fill()? > 0 {
                continue;
            }
            self.eof = true;
            return Ok(self.drain());
        }
    }

    /// Resolve the pending bytes once the reader is exhausted.
    ///
    /// A pending frame can no longer complete, so its first byte is dropped and the
    /// rest is scanned again. If no frame is found the pending bytes are reported as
    /// truncated rather than discarded.
    fn drain(&mut self) -> Option<Frame> {
        if self.sink.is_empty() {
            return None;
        }
        let pending = self.sink.len();
        let stats = self.stats.clone();
        let first = self.format.marker()[0];
        while !self.sink.is_empty() {
            debug!(offset = self.sink.offset(), "incomplete frame at end of stream; resyncing");
            Self::resync(&mut self.sink, &mut self.stats, first);
            if let Scan::Frame(frame) = self.scan() {
                return Some(frame);
            }
        }
        self.stats = stats;
        self.truncated = pending;
        None
    }

    fn scan(&mut self) -> Scan {
        let marker = self.format.marker();
        loop {
            let Some(idx) = self.sink.find(marker) else {
                let n = self.sink.drop_all_but_marker_start(marker);
                self.stats.discard(n);
                return Scan::NeedMore;
            };
            self.stats.discard(idx);
            self.sink.drop_front(idx);

            let header_len = self.format.header_len();
            if self.sink.len() < header_len {
                return Scan::NeedMore;
            }
            let Some(frame_len) = self.format.frame_len(&self.sink.as_slice()[..header_len])
            else {
                debug!(offset = self.sink.offset(), "invalid frame length; resyncing");
                Self::resync(&mut self.sink, &mut self.stats, marker[0]);
                continue;
            };
            if self.sink.len() < frame_len {
                return Scan::NeedMore;
            }

            let dat = &self.sink.as_slice()[..frame_len];
            if self.format.verify(dat) {
                let frame = Frame {
                    offset: self.sink.offset(),
                    data: dat.to_vec(),
                };
                trace!(offset = frame.offset, len = frame_len, "frame");
                self.sink.drop_front(frame_len);
                self.stats.accept();
                return Scan::Frame(frame);
            }

            debug!(offset = self.sink.offset(), "bad checksum; resyncing");
            self.stats.bad_checksums += 1;
            Self::resync(&mut self.sink, &mut self.stats, marker[0]);
        }
    }

    /// Drop the front byte, then everything up to the next byte that could start a marker.
    fn resync(sink: &mut ByteSink<R>, stats: &mut ScanStats, first: u8) {
        let rest = sink.as_slice().get(1..).unwrap_or_default();
        let n = 1 + rest.iter().position(|&b| b == first).unwrap_or(rest.len());
        sink.drop_front(n);
        stats.discard(n);
    }
}

impl<R, F> Iterator for FrameScanner<R, F>
where
    R: Read,
    F: FrameFormat,
{
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
