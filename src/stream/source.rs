// MIT/Apache2 License

//! The caller-supplied ends of a load or save: byte sources, byte sinks and the GDI+ stream delegates.

use std::{
    cmp,
    convert::TryFrom,
    fmt,
    io::{self, Read, Seek, SeekFrom, Write},
};

/// Where a physical read should put its bytes.
#[derive(Debug)]
pub enum ReadTarget<'a> {
    /// Copy the bytes into this buffer.
    Buffer(&'a mut [u8]),
    /// Consume and drop up to this many bytes.
    Discard(usize),
}

impl<'a> ReadTarget<'a> {
    /// The most bytes this read may produce.
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            ReadTarget::Buffer(buf) => buf.len(),
            ReadTarget::Discard(len) => *len,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The origin of a seek.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Whence {
    Start,
    Current,
    End,
}

/// A file, memory block or network stream that bytes are pulled from.
///
/// Implementations are driven synchronously on the caller's thread. They keep their own cursor; the
/// `StreamBuffer` on top of them only ever reads forwards and seeks relative to the current position.
pub trait ByteSource {
    /// Read up to `target.len()` bytes. Returns the number of bytes produced or discarded, and zero at the
    /// end of the source.
    ///
    /// `peek` is forwarded from callers for interface symmetry; implementations may ignore it.
    fn read(&mut self, target: ReadTarget<'_>, peek: bool) -> usize;

    /// Whether `seek` is available at all.
    #[inline]
    fn can_seek(&self) -> bool {
        false
    }

    /// Move the cursor, returning the new absolute position or `None` if the move failed.
    #[inline]
    fn seek(&mut self, _offset: i64, _whence: Whence) -> Option<u64> {
        None
    }

    /// Copy the first bytes of the source into `buf` without consuming them. Used to sniff magic bytes.
    fn header(&mut self, buf: &mut [u8]) -> usize;

    /// The total length of the source, if known.
    #[inline]
    fn size(&mut self) -> Option<u64> {
        None
    }

    /// Release the source. Called once, after the operation that used it has finished.
    #[inline]
    fn close(&mut self) {}
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    #[inline]
    fn read(&mut self, target: ReadTarget<'_>, peek: bool) -> usize {
        (**self).read(target, peek)
    }
    #[inline]
    fn can_seek(&self) -> bool {
        (**self).can_seek()
    }
    #[inline]
    fn seek(&mut self, offset: i64, whence: Whence) -> Option<u64> {
        (**self).seek(offset, whence)
    }
    #[inline]
    fn header(&mut self, buf: &mut [u8]) -> usize {
        (**self).header(buf)
    }
    #[inline]
    fn size(&mut self) -> Option<u64> {
        (**self).size()
    }
    #[inline]
    fn close(&mut self) {
        (**self).close()
    }
}

/// Something encoded bytes are pushed into.
pub trait ByteSink {
    /// Write some prefix of `bytes`, returning how many were accepted. Zero means the sink is full or broken.
    fn put(&mut self, bytes: &[u8]) -> usize;

    /// Write all of `bytes`.
    fn put_all(&mut self, mut bytes: &[u8]) -> crate::Result {
        while !bytes.is_empty() {
            match self.put(bytes) {
                0 => {
                    return Err(crate::Error::Io(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "sink stopped accepting bytes",
                    )))
                }
                n => bytes = &bytes[cmp::min(n, bytes.len())..],
            }
        }
        Ok(())
    }
}

impl ByteSink for Vec<u8> {
    #[inline]
    fn put(&mut self, bytes: &[u8]) -> usize {
        self.extend_from_slice(bytes);
        bytes.len()
    }
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    #[inline]
    fn put(&mut self, bytes: &[u8]) -> usize {
        (**self).put(bytes)
    }
}

/// A block of memory used as a source.
#[derive(Debug, Clone)]
pub struct MemorySource<'a> {
    data: &'a [u8],
    cursor: usize,
    seekable: bool,
}

impl<'a> MemorySource<'a> {
    /// A seekable source over `data`.
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        MemorySource {
            data,
            cursor: 0,
            seekable: true,
        }
    }

    /// A source over `data` that refuses to seek, like a pipe.
    #[inline]
    pub fn unseekable(data: &'a [u8]) -> Self {
        MemorySource {
            seekable: false,
            ..MemorySource::new(data)
        }
    }

    /// Current cursor position.
    #[inline]
    pub fn position(&self) -> usize {
        self.cursor
    }
}

impl<'a> ByteSource for MemorySource<'a> {
    fn read(&mut self, target: ReadTarget<'_>, _peek: bool) -> usize {
        let remaining = &self.data[cmp::min(self.cursor, self.data.len())..];
        let n = cmp::min(remaining.len(), target.len());
        if let ReadTarget::Buffer(buf) = target {
            buf[..n].copy_from_slice(&remaining[..n]);
        }
        self.cursor += n;
        n
    }

    #[inline]
    fn can_seek(&self) -> bool {
        self.seekable
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Option<u64> {
        if !self.seekable {
            return None;
        }

        let base = match whence {
            Whence::Start => 0,
            Whence::Current => self.cursor as i64,
            Whence::End => self.data.len() as i64,
        };
        // like `io::Cursor`, the cursor may sit past the end; reads there return nothing
        let target = usize::try_from(base.checked_add(offset)?).ok()?;
        self.cursor = target;
        Some(target as u64)
    }

    fn header(&mut self, buf: &mut [u8]) -> usize {
        let n = cmp::min(buf.len(), self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        n
    }

    #[inline]
    fn size(&mut self) -> Option<u64> {
        Some(self.data.len() as u64)
    }
}

/// A seekable `std::io` reader, usually a `File`, used as a source.
#[derive(Debug)]
pub struct IoSource<R> {
    inner: R,
}

impl<R: Read + Seek> IoSource<R> {
    #[inline]
    pub fn new(inner: R) -> Self {
        IoSource { inner }
    }

    #[inline]
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn read_some(&mut self, buf: &mut [u8]) -> usize {
        loop {
            match self.inner.read(buf) {
                Ok(n) => return n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::warn!("read from source failed: {}", e);
                    return 0;
                }
            }
        }
    }
}

impl<R: Read + Seek> ByteSource for IoSource<R> {
    fn read(&mut self, target: ReadTarget<'_>, _peek: bool) -> usize {
        match target {
            ReadTarget::Buffer(buf) => self.read_some(buf),
            ReadTarget::Discard(len) => {
                let mut scratch = [0u8; 4096];
                let mut discarded = 0;
                while discarded < len {
                    let want = cmp::min(scratch.len(), len - discarded);
                    match self.read_some(&mut scratch[..want]) {
                        0 => break,
                        n => discarded += n,
                    }
                }
                discarded
            }
        }
    }

    #[inline]
    fn can_seek(&self) -> bool {
        true
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Option<u64> {
        let from = match whence {
            Whence::Start => SeekFrom::Start(u64::try_from(offset).ok()?),
            Whence::Current => SeekFrom::Current(offset),
            Whence::End => SeekFrom::End(offset),
        };
        self.inner.seek(from).ok()
    }

    fn header(&mut self, buf: &mut [u8]) -> usize {
        let start = match self.inner.seek(SeekFrom::Current(0)) {
            Ok(start) => start,
            Err(_) => return 0,
        };
        let mut filled = 0;
        while filled < buf.len() {
            match self.read_some(&mut buf[filled..]) {
                0 => break,
                n => filled += n,
            }
        }
        if self.inner.seek(SeekFrom::Start(start)).is_err() {
            log::warn!("could not rewind source after reading its header");
        }
        filled
    }

    fn size(&mut self) -> Option<u64> {
        let here = self.inner.seek(SeekFrom::Current(0)).ok()?;
        let end = self.inner.seek(SeekFrom::End(0)).ok()?;
        self.inner.seek(SeekFrom::Start(here)).ok()?;
        Some(end)
    }
}

/// A `std::io` writer used as a sink.
#[derive(Debug)]
pub struct IoSink<W> {
    inner: W,
}

impl<W: Write> IoSink<W> {
    #[inline]
    pub fn new(inner: W) -> Self {
        IoSink { inner }
    }

    /// Flush and return the writer.
    #[inline]
    pub fn finish(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> ByteSink for IoSink<W> {
    fn put(&mut self, bytes: &[u8]) -> usize {
        loop {
            match self.inner.write(bytes) {
                Ok(n) => return n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::warn!("write to sink failed: {}", e);
                    return 0;
                }
            }
        }
    }
}

type GetHeaderFn<'a> = Box<dyn FnMut(&mut [u8]) -> usize + 'a>;
type GetBytesFn<'a> = Box<dyn FnMut(ReadTarget<'_>, bool) -> usize + 'a>;
type PutBytesFn<'a> = Box<dyn FnMut(&[u8]) -> usize + 'a>;
type SeekFn<'a> = Box<dyn FnMut(i64, Whence) -> Option<u64> + 'a>;
type CloseFn<'a> = Box<dyn FnMut() + 'a>;
type SizeFn<'a> = Box<dyn FnMut() -> Option<u64> + 'a>;

/// The callback set a client hands over instead of a filename: get-header, get-bytes, put-bytes, seek,
/// close and size. Only get-bytes is mandatory.
pub struct StreamDelegates<'a> {
    get_header: Option<GetHeaderFn<'a>>,
    get_bytes: GetBytesFn<'a>,
    put_bytes: Option<PutBytesFn<'a>>,
    seek: Option<SeekFn<'a>>,
    close: Option<CloseFn<'a>>,
    size: Option<SizeFn<'a>>,
}

impl<'a> StreamDelegates<'a> {
    /// Create a delegate set around the get-bytes callback.
    #[inline]
    pub fn new(get_bytes: impl FnMut(ReadTarget<'_>, bool) -> usize + 'a) -> Self {
        StreamDelegates {
            get_header: None,
            get_bytes: Box::new(get_bytes),
            put_bytes: None,
            seek: None,
            close: None,
            size: None,
        }
    }

    #[inline]
    pub fn with_header(mut self, get_header: impl FnMut(&mut [u8]) -> usize + 'a) -> Self {
        self.get_header = Some(Box::new(get_header));
        self
    }

    #[inline]
    pub fn with_put_bytes(mut self, put_bytes: impl FnMut(&[u8]) -> usize + 'a) -> Self {
        self.put_bytes = Some(Box::new(put_bytes));
        self
    }

    #[inline]
    pub fn with_seek(mut self, seek: impl FnMut(i64, Whence) -> Option<u64> + 'a) -> Self {
        self.seek = Some(Box::new(seek));
        self
    }

    #[inline]
    pub fn with_close(mut self, close: impl FnMut() + 'a) -> Self {
        self.close = Some(Box::new(close));
        self
    }

    #[inline]
    pub fn with_size(mut self, size: impl FnMut() -> Option<u64> + 'a) -> Self {
        self.size = Some(Box::new(size));
        self
    }
}

impl<'a> fmt::Debug for StreamDelegates<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamDelegates")
            .field("get_header", &self.get_header.is_some())
            .field("put_bytes", &self.put_bytes.is_some())
            .field("seek", &self.seek.is_some())
            .field("close", &self.close.is_some())
            .field("size", &self.size.is_some())
            .finish()
    }
}

impl<'a> ByteSource for StreamDelegates<'a> {
    #[inline]
    fn read(&mut self, target: ReadTarget<'_>, peek: bool) -> usize {
        (self.get_bytes)(target, peek)
    }

    #[inline]
    fn can_seek(&self) -> bool {
        self.seek.is_some()
    }

    #[inline]
    fn seek(&mut self, offset: i64, whence: Whence) -> Option<u64> {
        self.seek.as_mut().and_then(|seek| seek(offset, whence))
    }

    fn header(&mut self, buf: &mut [u8]) -> usize {
        match self.get_header {
            Some(ref mut get_header) => get_header(buf),
            None => 0,
        }
    }

    #[inline]
    fn size(&mut self) -> Option<u64> {
        self.size.as_mut().and_then(|size| size())
    }

    #[inline]
    fn close(&mut self) {
        if let Some(ref mut close) = self.close {
            close();
        }
    }
}

impl<'a> ByteSink for StreamDelegates<'a> {
    #[inline]
    fn put(&mut self, bytes: &[u8]) -> usize {
        match self.put_bytes {
            Some(ref mut put_bytes) => put_bytes(bytes),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_memory_source_discard_and_seek() {
        let data = [1u8, 2, 3, 4, 5];
        let mut src = MemorySource::new(&data);
        assert_eq!(src.read(ReadTarget::Discard(2), false), 2);
        let mut buf = [0u8; 8];
        assert_eq!(src.read(ReadTarget::Buffer(&mut buf), false), 3);
        assert_eq!(&buf[..3], &[3, 4, 5]);
        assert_eq!(src.seek(-4, Whence::Current), Some(1));
        assert_eq!(src.seek(-2, Whence::Current), None);
        assert_eq!(src.seek(10, Whence::Current), Some(11));
        assert_eq!(src.read(ReadTarget::Buffer(&mut buf), false), 0);
        assert_eq!(src.seek(0, Whence::End), Some(5));

        let mut pipe = MemorySource::unseekable(&data);
        assert!(!pipe.can_seek());
        assert_eq!(pipe.seek(1, Whence::Current), None);
    }

    #[test]
    fn test_header_does_not_consume() {
        let data = *b"BMxxxx";
        let mut src = IoSource::new(Cursor::new(data.to_vec()));
        let mut sig = [0u8; 2];
        assert_eq!(src.header(&mut sig), 2);
        assert_eq!(&sig, b"BM");
        let mut buf = [0u8; 3];
        assert_eq!(src.read(ReadTarget::Buffer(&mut buf), false), 3);
        assert_eq!(&buf, b"BMx");
        assert_eq!(src.size(), Some(6));
    }

    #[test]
    fn test_delegates_forward() {
        let data = [9u8; 4];
        let mut cursor = 0;
        let mut closed = false;
        let mut written = Vec::new();
        {
            let mut delegates = StreamDelegates::new(|target, _peek| {
                let n = cmp::min(target.len(), data.len() - cursor);
                if let ReadTarget::Buffer(buf) = target {
                    buf[..n].copy_from_slice(&data[cursor..cursor + n]);
                }
                cursor += n;
                n
            })
            .with_put_bytes(|bytes| {
                written.extend_from_slice(bytes);
                bytes.len()
            })
            .with_close(|| closed = true);

            assert!(!delegates.can_seek());
            assert_eq!(delegates.read(ReadTarget::Discard(3), false), 3);
            delegates.put_all(&[1, 2, 3]).unwrap();
            delegates.close();
        }
        assert_eq!(cursor, 3);
        assert!(closed);
        assert_eq!(written, vec![1, 2, 3]);
    }

    #[test]
    fn test_put_all_fails_on_full_sink() {
        let mut delegates = StreamDelegates::new(|_, _| 0);
        assert!(delegates.put_all(&[1]).is_err());
        assert!(delegates.put_all(&[]).is_ok());
    }
}
