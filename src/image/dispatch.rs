// MIT/Apache2 License

use super::{builtin_codecs, BitmapData, Codec, ImageFormat, ResourceLimits, PROBE_LEN};
use crate::stream::{
    ByteSink, ByteSource, IoSink, IoSource, StreamBuffer, StreamDelegates, DEFAULT_CAPACITY,
};
use std::{
    fmt,
    fs::File,
    io::{BufWriter, ErrorKind},
    path::Path,
    sync::Arc,
};

/// Picks a codec for each load or save and runs it over a freshly created stream.
///
/// Codecs added with [`with_codec`] are consulted before the built-in ones, so they can replace them.
///
/// [`with_codec`]: Dispatcher::with_codec
#[derive(Clone)]
pub struct Dispatcher {
    codecs: Vec<Arc<dyn Codec>>,
    limits: ResourceLimits,
    buffer_capacity: usize,
    retain_metadata: bool,
}

impl Default for Dispatcher {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("codecs", &self.codecs.len())
            .field("limits", &self.limits)
            .field("buffer_capacity", &self.buffer_capacity)
            .field("retain_metadata", &self.retain_metadata)
            .finish()
    }
}

impl Dispatcher {
    /// A dispatcher using the built-in codecs, no limits and the default read-ahead.
    #[inline]
    pub fn new() -> Self {
        Dispatcher {
            codecs: Vec::new(),
            limits: ResourceLimits::none(),
            buffer_capacity: DEFAULT_CAPACITY,
            retain_metadata: false,
        }
    }

    /// Add a codec, taking priority over the built-in ones for its format.
    #[inline]
    pub fn with_codec<C: Codec + 'static>(mut self, codec: C) -> Self {
        self.codecs.push(Arc::new(codec));
        self
    }

    #[inline]
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Read-ahead capacity for the stream buffer of each load. Zero makes every load fail.
    #[inline]
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Keep the first chunk of every loaded file as its metadata, whether or not the codec asks for it.
    #[inline]
    pub fn retain_metadata(mut self, retain: bool) -> Self {
        self.retain_metadata = retain;
        self
    }

    #[inline]
    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    fn codecs(&self) -> impl Iterator<Item = &dyn Codec> + '_ {
        self.codecs
            .iter()
            .map(|codec| &**codec)
            .chain(builtin_codecs().iter().map(|&codec| codec))
    }

    /// The codec that decodes `format`.
    pub fn decoder_for(&self, format: ImageFormat) -> crate::Result<&dyn Codec> {
        self.codecs()
            .find(|codec| codec.format() == format && codec.can_decode())
            .ok_or(crate::Error::UnsupportedFormat(Some(format)))
    }

    /// The codec that encodes `format`.
    pub fn encoder_for(&self, format: ImageFormat) -> crate::Result<&dyn Codec> {
        self.codecs()
            .find(|codec| codec.format() == format && codec.can_encode())
            .ok_or(crate::Error::UnsupportedFormat(Some(format)))
    }

    /// Recognize the format of `source` from its header, without consuming anything.
    pub fn probe(&self, source: &mut dyn ByteSource) -> crate::Result<ImageFormat> {
        let mut header = [0u8; PROBE_LEN];
        let len = source.header(&mut header).min(PROBE_LEN);
        ImageFormat::detect(&header[..len]).ok_or(crate::Error::UnsupportedFormat(None))
    }

    /// Decode one image from `source`.
    pub fn load(&self, source: &mut dyn ByteSource) -> crate::Result<BitmapData> {
        let format = self.probe(source)?;
        let codec = self.decoder_for(format)?;
        let retain = self.retain_metadata || codec.retains_first_chunk();
        log::debug!("Loading {:?} image (retain first chunk: {})", format, retain);

        let mut stream = StreamBuffer::with_capacity(source, self.buffer_capacity)?;
        if retain {
            stream.keep_retained_chunk();
        }

        let mut bitmap = codec.decode(&mut stream, &self.limits)?;
        bitmap.format = Some(format);
        if let Some(chunk) = stream.into_retained_chunk() {
            bitmap.metadata = Some(chunk);
        }
        Ok(bitmap)
    }

    /// Decode one image through client callbacks, then invoke their close callback.
    pub fn load_delegates(&self, mut delegates: StreamDelegates<'_>) -> crate::Result<BitmapData> {
        let result = self.load(&mut delegates);
        delegates.close();
        result
    }

    /// Decode the image stored in the file at `path`.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> crate::Result<BitmapData> {
        let path = path.as_ref();
        let file = File::open(path)?;
        log::debug!("Opened {} for loading", path.display());
        self.load(&mut IoSource::new(file))
    }

    /// Encode `bitmap` as `format` into `sink`.
    pub fn save(&self, bitmap: &BitmapData, format: ImageFormat, sink: &mut dyn ByteSink) -> crate::Result {
        let codec = self.encoder_for(format)?;
        log::debug!(
            "Saving {}x{} image as {:?}",
            bitmap.width(),
            bitmap.height(),
            format
        );
        codec.encode(bitmap, sink)
    }

    /// Encode `bitmap` as `format` into a new file at `path`.
    pub fn save_file<P: AsRef<Path>>(
        &self,
        bitmap: &BitmapData,
        format: ImageFormat,
        path: P,
    ) -> crate::Result {
        // fail before creating the file if nothing can encode this format
        self.encoder_for(format)?;

        let file = File::create(path.as_ref())?;
        let mut sink = IoSink::new(BufWriter::new(file));
        self.save(bitmap, format, &mut sink)?;
        sink.finish().map_err(|e| match e.kind() {
            ErrorKind::OutOfMemory => crate::Error::OutOfMemory,
            _ => crate::Error::Io(e),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        color::Argb,
        image::PixelFormat,
        stream::{MemorySource, ReadTarget},
        Error,
    };
    use std::cell::Cell;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// A codec that decodes anything into a 1x1 bitmap and asks for the first chunk.
    struct Recording;

    impl Codec for Recording {
        fn format(&self) -> ImageFormat {
            ImageFormat::Gif
        }

        fn retains_first_chunk(&self) -> bool {
            true
        }

        fn decode(&self, stream: &mut StreamBuffer<'_>, _limits: &ResourceLimits) -> crate::Result<BitmapData> {
            let mut signature = [0u8; 6];
            stream.read_exact_or_truncated(&mut signature)?;
            BitmapData::new(1, 1, PixelFormat::Argb32)
        }
    }

    fn sample_bmp() -> Vec<u8> {
        let mut bitmap = BitmapData::new(2, 2, PixelFormat::Rgb24).unwrap();
        bitmap.set_pixel(1, 1, Argb(0xFF40_8020)).unwrap();
        let mut out = Vec::new();
        Dispatcher::new().save(&bitmap, ImageFormat::Bmp, &mut out).unwrap();
        out
    }

    #[test]
    fn test_unknown_format() {
        init();
        let mut source = MemorySource::new(b"definitely not an image");
        assert!(matches!(
            Dispatcher::new().load(&mut source),
            Err(Error::UnsupportedFormat(None))
        ));
    }

    #[test]
    fn test_known_format_without_codec() {
        let mut source = MemorySource::new(b"\x89PNG\r\n\x1a\n");
        assert!(matches!(
            Dispatcher::new().load(&mut source),
            Err(Error::UnsupportedFormat(Some(ImageFormat::Png)))
        ));

        let bitmap = BitmapData::new(1, 1, PixelFormat::Rgb24).unwrap();
        let mut out = Vec::new();
        assert!(matches!(
            Dispatcher::new().save(&bitmap, ImageFormat::Jpeg, &mut out),
            Err(Error::UnsupportedFormat(Some(ImageFormat::Jpeg)))
        ));
    }

    #[test]
    fn test_codec_retention_becomes_metadata() {
        let data = b"GIF89a\x01\x00\x01\x00";
        let mut source = MemorySource::new(data);
        let dispatcher = Dispatcher::new().with_codec(Recording);
        let bitmap = dispatcher.load(&mut source).unwrap();
        assert_eq!(bitmap.format, Some(ImageFormat::Gif));
        assert_eq!(bitmap.metadata.as_deref(), Some(&data[..]));
    }

    #[test]
    fn test_forced_retention() {
        let data = sample_bmp();
        let mut source = MemorySource::new(&data);
        let plain = Dispatcher::new().load(&mut source).unwrap();
        assert_eq!(plain.metadata, None);

        let mut source = MemorySource::new(&data);
        let bitmap = Dispatcher::new()
            .retain_metadata(true)
            .with_buffer_capacity(16)
            .load(&mut source)
            .unwrap();
        assert_eq!(bitmap.metadata.as_deref(), Some(&data[..16]));
        assert_eq!(bitmap.pixel(1, 1), Some(Argb(0xFF40_8020)));
    }

    #[test]
    fn test_delegates_are_closed() {
        let data = sample_bmp();
        let cursor = Cell::new(0usize);
        let closed = Cell::new(false);

        let delegates = StreamDelegates::new(|target, _peek| {
            let start = cursor.get();
            let n = target.len().min(data.len() - start);
            if let ReadTarget::Buffer(buf) = target {
                buf[..n].copy_from_slice(&data[start..start + n]);
            }
            cursor.set(start + n);
            n
        })
        .with_header(|buf| {
            let n = buf.len().min(data.len());
            buf[..n].copy_from_slice(&data[..n]);
            n
        })
        .with_close(|| closed.set(true));

        let bitmap = Dispatcher::new().load_delegates(delegates).unwrap();
        assert!(closed.get());
        assert_eq!(bitmap.width(), 2);
    }

    #[test]
    fn test_zero_capacity_fails_load() {
        let data = sample_bmp();
        let mut source = MemorySource::new(&data);
        assert!(Dispatcher::new()
            .with_buffer_capacity(0)
            .load(&mut source)
            .is_err());
    }

    #[test]
    fn test_limits_forwarded() {
        let data = sample_bmp();
        let mut source = MemorySource::new(&data);
        let dispatcher = Dispatcher::new().with_limits(ResourceLimits::none().with_max_width(1));
        assert!(matches!(
            dispatcher.load(&mut source),
            Err(Error::LimitExceeded(_))
        ));
    }
}
