// MIT/Apache2 License

//! Buffered, pull-based reading over a caller-supplied [`ByteSource`].
//!
//! Codecs never talk to a source directly. They hold a [`StreamBuffer`], which batches physical reads into
//! large chunks and can keep the very first chunk verbatim, so that a metadata block read during decode can
//! be written back byte-for-byte on save.

use std::{cmp, convert::TryFrom, io};

mod source;

pub use source::*;

/// Read-ahead used when no capacity is given.
pub const DEFAULT_CAPACITY: usize = 64 * 1024;

/// A read-ahead buffer sitting between a [`ByteSource`] and a codec.
///
/// The buffer does not own the source. It is created for one load or save and dropped when that operation
/// finishes.
pub struct StreamBuffer<'src> {
    source: &'src mut dyn ByteSource,
    // allocated on the first refill; its length is the capacity
    buffer: Vec<u8>,
    capacity: usize,
    // invariant: position <= used <= buffer.len()
    position: usize,
    used: usize,
    retain_requested: bool,
    retained: Option<Vec<u8>>,
    refilled: bool,
    started: bool,
}

impl<'src> StreamBuffer<'src> {
    /// Wrap a source with the default 64 KiB read-ahead.
    #[inline]
    pub fn new(source: &'src mut dyn ByteSource) -> Self {
        StreamBuffer {
            source,
            buffer: Vec::new(),
            capacity: DEFAULT_CAPACITY,
            position: 0,
            used: 0,
            retain_requested: false,
            retained: None,
            refilled: false,
            started: false,
        }
    }

    /// Wrap a source with a custom read-ahead capacity.
    #[inline]
    pub fn with_capacity(source: &'src mut dyn ByteSource, capacity: usize) -> crate::Result<Self> {
        if capacity == 0 {
            return Err(crate::InvalidArgument::ZeroCapacity.into());
        }

        let mut stream = StreamBuffer::new(source);
        stream.capacity = capacity;
        Ok(stream)
    }

    /// The read-ahead capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the underlying source can seek.
    #[inline]
    pub fn can_seek(&self) -> bool {
        self.source.can_seek()
    }

    #[inline]
    fn available(&self) -> usize {
        self.used - self.position
    }

    /// Pull the next physical chunk from the source into the buffer.
    fn refill(&mut self) -> crate::Result<usize> {
        if self.buffer.is_empty() {
            self.buffer = crate::util::zeroed_bytes(self.capacity)?;
        }

        self.position = 0;
        self.used = 0;
        let nread = cmp::min(
            self.source
                .read(ReadTarget::Buffer(&mut self.buffer[..]), false),
            self.capacity,
        );
        log::trace!("refilled stream buffer with {} bytes", nread);

        if !self.refilled {
            self.refilled = true;
            if self.retain_requested && nread > 0 {
                self.retained = Some(crate::util::try_to_vec(&self.buffer[..nread])?);
            }
        }

        self.used = nread;
        Ok(nread)
    }

    /// Read up to `dest.len()` bytes. Fewer bytes are returned only once the source is exhausted; after
    /// that, every call returns zero.
    ///
    /// `peek` is accepted for symmetry with the source interface, but the cursor always advances.
    pub fn read(&mut self, dest: &mut [u8], _peek: bool) -> crate::Result<usize> {
        self.started = true;

        let mut copied = 0;
        while copied < dest.len() {
            if self.available() == 0 && self.refill()? == 0 {
                break;
            }

            let n = cmp::min(self.available(), dest.len() - copied);
            dest[copied..copied + n].copy_from_slice(&self.buffer[self.position..self.position + n]);
            self.position += n;
            copied += n;
        }

        Ok(copied)
    }

    /// Read exactly `dest.len()` bytes, treating an early end of the source as truncated data.
    #[inline]
    pub fn read_exact_or_truncated(&mut self, dest: &mut [u8]) -> crate::Result {
        if self.read(dest, false)? == dest.len() {
            Ok(())
        } else {
            Err(crate::Error::Truncated)
        }
    }

    /// Move the stream forward by `n` bytes.
    ///
    /// Seekable sources are moved with one relative seek and the buffer is emptied, so the next read starts
    /// with a fresh physical read. The seek result is logged but not checked. Sources without seek are
    /// drained: first from the buffer, then by discarding reads on the source itself.
    pub fn skip(&mut self, n: usize) {
        self.started = true;

        if self.source.can_seek() {
            // the source cursor sits past whatever we have buffered but not handed out
            let ahead = self.available() as i64;
            let offset = i64::try_from(n).unwrap_or(i64::MAX).saturating_sub(ahead);
            self.position = 0;
            self.used = 0;

            if offset != 0 {
                match self.source.seek(offset, Whence::Current) {
                    Some(pos) => log::trace!("skipped {} bytes, source now at {}", n, pos),
                    None => log::warn!("seek of {} bytes failed; stream position is now unknown", offset),
                }
            }
            return;
        }

        let from_buffer = cmp::min(n, self.available());
        self.position += from_buffer;
        let mut remaining = n - from_buffer;
        if self.available() == 0 {
            self.position = 0;
            self.used = 0;
        }

        while remaining > 0 {
            match self.source.read(ReadTarget::Discard(remaining), false) {
                0 => break,
                discarded => remaining -= cmp::min(discarded, remaining),
            }
        }
    }

    /// Ask for the first physical chunk to be kept. Idempotent, and ignored once the stream has been read from
    /// or skipped.
    #[inline]
    pub fn keep_retained_chunk(&mut self) {
        if !self.started {
            self.retain_requested = true;
        }
    }

    /// The first physical chunk, if retention was requested in time and a refill has happened.
    #[inline]
    pub fn retained_chunk(&self) -> Option<&[u8]> {
        self.retained.as_deref()
    }

    /// Release the stream, keeping only the retained chunk.
    #[inline]
    pub fn into_retained_chunk(self) -> Option<Vec<u8>> {
        self.retained
    }
}

impl<'src> io::Read for StreamBuffer<'src> {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        StreamBuffer::read(self, buf, false).map_err(|e| match e {
            crate::Error::OutOfMemory => io::Error::from(io::ErrorKind::OutOfMemory),
            e => io::Error::new(io::ErrorKind::Other, e.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out a fixed byte sequence in scripted chunk sizes.
    struct Scripted {
        data: Vec<u8>,
        cursor: usize,
        chunks: Vec<usize>,
        seekable: bool,
        physical_reads: usize,
    }

    impl Scripted {
        fn new(data: Vec<u8>, chunks: Vec<usize>, seekable: bool) -> Self {
            Scripted {
                data,
                cursor: 0,
                chunks,
                seekable,
                physical_reads: 0,
            }
        }
    }

    impl ByteSource for Scripted {
        fn read(&mut self, target: ReadTarget<'_>, _peek: bool) -> usize {
            self.physical_reads += 1;
            let limit = if self.chunks.is_empty() {
                usize::MAX
            } else {
                self.chunks.remove(0)
            };
            let n = cmp::min(cmp::min(limit, target.len()), self.data.len() - self.cursor);
            if let ReadTarget::Buffer(buf) = target {
                buf[..n].copy_from_slice(&self.data[self.cursor..self.cursor + n]);
            }
            self.cursor += n;
            n
        }

        fn can_seek(&self) -> bool {
            self.seekable
        }

        fn seek(&mut self, offset: i64, whence: Whence) -> Option<u64> {
            assert_eq!(whence, Whence::Current);
            let target = self.cursor as i64 + offset;
            self.cursor = cmp::min(target.max(0) as usize, self.data.len());
            Some(self.cursor as u64)
        }

        fn header(&mut self, buf: &mut [u8]) -> usize {
            let n = cmp::min(buf.len(), self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            n
        }
    }

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_reconstructs_sequence_with_short_reads() {
        init();
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let mut src = Scripted::new(data.clone(), vec![1, 7, 3, 100, 2], false);
        let mut stream = StreamBuffer::with_capacity(&mut src, 64).unwrap();

        let mut out = Vec::new();
        for want in [5usize, 1, 63, 64, 200, 17].iter().cycle() {
            let mut chunk = vec![0u8; *want];
            let n = stream.read(&mut chunk, false).unwrap();
            out.extend_from_slice(&chunk[..n]);
            if n < *want {
                break;
            }
        }

        assert_eq!(out, data);
        let mut tail = [0u8; 4];
        assert_eq!(stream.read(&mut tail, false).unwrap(), 0);
    }

    #[test]
    fn test_skip_equivalence() {
        init();
        let data: Vec<u8> = (0..200u8).collect();

        let cases = [
            (0usize, 10usize, 5usize),
            (4, 3, 3),
            (30, 50, 20),
            (10, 5, 100),
            (150, 100, 20),
        ];
        for &(first, gap, k) in &cases {
            let mut seek_src = Scripted::new(data.clone(), vec![], true);
            let mut seeking = StreamBuffer::with_capacity(&mut seek_src, 32).unwrap();
            let mut plain_src = Scripted::new(data.clone(), vec![], false);
            let mut plain = StreamBuffer::with_capacity(&mut plain_src, 32).unwrap();

            let mut a = vec![0u8; first];
            let mut b = vec![0u8; first];
            seeking.read(&mut a, false).unwrap();
            plain.read(&mut b, false).unwrap();

            seeking.skip(gap);
            let mut discard = vec![0u8; gap];
            plain.read(&mut discard, false).unwrap();

            let mut a = vec![0u8; k];
            let mut b = vec![0u8; k];
            let na = seeking.read(&mut a, false).unwrap();
            let nb = plain.read(&mut b, false).unwrap();
            assert_eq!(na, nb);
            assert_eq!(a, b);
            if first + gap < data.len() {
                assert_eq!(a[0] as usize, first + gap);
            } else {
                assert_eq!(na, 0);
            }
        }
    }

    #[test]
    fn test_skip_past_end_of_memory() {
        init();
        let data: Vec<u8> = (0..10u8).collect();
        let mut seek_src = MemorySource::new(&data);
        let mut plain_src = MemorySource::unseekable(&data);
        let mut seeking = StreamBuffer::with_capacity(&mut seek_src, 4).unwrap();
        let mut plain = StreamBuffer::with_capacity(&mut plain_src, 4).unwrap();

        let mut head = [0u8; 2];
        seeking.read(&mut head, false).unwrap();
        plain.read(&mut head, false).unwrap();
        seeking.skip(100);
        plain.skip(100);

        let mut rest = [0u8; 8];
        assert_eq!(seeking.read(&mut rest, false).unwrap(), 0);
        assert_eq!(plain.read(&mut rest, false).unwrap(), 0);
    }

    #[test]
    fn test_seek_skip_empties_buffer() {
        let data: Vec<u8> = (0..100u8).collect();
        let mut src = Scripted::new(data, vec![], true);
        let mut stream = StreamBuffer::with_capacity(&mut src, 16).unwrap();
        let mut byte = [0u8; 1];
        stream.read(&mut byte, false).unwrap();
        stream.skip(2);
        assert_eq!(stream.available(), 0);
        stream.read(&mut byte, false).unwrap();
        assert_eq!(byte[0], 3);
        drop(stream);
        assert_eq!(src.physical_reads, 2);
    }

    #[test]
    fn test_unseekable_skip_discards_past_buffer() {
        let data: Vec<u8> = (0..100u8).collect();
        let mut src = Scripted::new(data, vec![], false);
        let mut stream = StreamBuffer::with_capacity(&mut src, 8).unwrap();
        let mut byte = [0u8; 1];
        stream.read(&mut byte, false).unwrap();
        stream.skip(50);
        stream.read(&mut byte, false).unwrap();
        assert_eq!(byte[0], 51);

        stream.skip(1000);
        assert_eq!(stream.read(&mut byte, false).unwrap(), 0);
    }

    #[test]
    fn test_retention_first_chunk_only() {
        let data: Vec<u8> = (0..40u8).collect();

        let mut src = Scripted::new(data.clone(), vec![10], false);
        let mut stream = StreamBuffer::with_capacity(&mut src, 16).unwrap();
        stream.keep_retained_chunk();
        stream.keep_retained_chunk();
        let mut buf = [0u8; 30];
        assert_eq!(stream.read(&mut buf, false).unwrap(), 30);
        assert_eq!(stream.retained_chunk(), Some(&data[..10]));

        let mut src = Scripted::new(data.clone(), vec![10], false);
        let mut stream = StreamBuffer::with_capacity(&mut src, 16).unwrap();
        stream.keep_retained_chunk();
        assert_eq!(stream.retained_chunk(), None);
        assert_eq!(stream.into_retained_chunk(), None);

        let mut src = Scripted::new(data, vec![], false);
        let mut stream = StreamBuffer::with_capacity(&mut src, 16).unwrap();
        stream.read(&mut buf[..1], false).unwrap();
        stream.keep_retained_chunk();
        stream.read(&mut buf, false).unwrap();
        assert_eq!(stream.retained_chunk(), None);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut src = MemorySource::new(&[]);
        assert!(matches!(
            StreamBuffer::with_capacity(&mut src, 0),
            Err(crate::Error::InvalidArgument(crate::InvalidArgument::ZeroCapacity))
        ));
    }

    #[test]
    fn test_ten_byte_scenario() {
        init();
        let data = [0u8, 1, 2, 3, 4, 5, 6, 7, 8, 9];
        let mut src = MemorySource::unseekable(&data);
        let mut stream = StreamBuffer::new(&mut src);

        let mut dest = [0u8; 5];
        assert_eq!(stream.read(&mut dest[..4], false).unwrap(), 4);
        assert_eq!(&dest[..4], &[0, 1, 2, 3]);
        stream.skip(3);
        assert_eq!(stream.read(&mut dest[..3], false).unwrap(), 3);
        assert_eq!(&dest[..3], &[7, 8, 9]);
        assert_eq!(stream.read(&mut dest, false).unwrap(), 0);
    }
}
