// MIT/Apache2 License

use super::{BitmapData, ImageFormat, ResourceLimits};
use crate::stream::{ByteSink, StreamBuffer};
use std::{fmt, sync::OnceLock};

/// A decoder and/or encoder for one image format.
///
/// Decoders pull bytes through a [`StreamBuffer`] and never see the source itself. Encoders push the whole
/// encoded file into a [`ByteSink`].
pub trait Codec: Send + Sync {
    /// The format this codec handles.
    fn format(&self) -> ImageFormat;

    /// Whether the first physical chunk of the file should be kept and attached to the decoded bitmap.
    #[inline]
    fn retains_first_chunk(&self) -> bool {
        false
    }

    #[inline]
    fn can_decode(&self) -> bool {
        true
    }

    #[inline]
    fn can_encode(&self) -> bool {
        false
    }

    /// Decode one image from the stream.
    fn decode(&self, stream: &mut StreamBuffer<'_>, limits: &ResourceLimits) -> crate::Result<BitmapData>;

    /// Encode `bitmap` into `sink`.
    fn encode(&self, bitmap: &BitmapData, sink: &mut dyn ByteSink) -> crate::Result {
        let _ = (bitmap, sink);
        Err(crate::Error::UnsupportedFormat(Some(self.format())))
    }
}

impl fmt::Debug for dyn Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("format", &self.format())
            .field("decode", &self.can_decode())
            .field("encode", &self.can_encode())
            .finish()
    }
}

/// The codecs compiled into this crate, built on first use.
pub fn builtin_codecs() -> &'static [&'static dyn Codec] {
    static BUILTIN: OnceLock<Vec<&'static dyn Codec>> = OnceLock::new();

    BUILTIN.get_or_init(|| {
        #[allow(unused_mut)]
        let mut codecs: Vec<&'static dyn Codec> = Vec::new();
        #[cfg(feature = "bmp")]
        codecs.push(&super::bmp::BmpCodec);
        log::debug!("Registered {} built-in image codecs", codecs.len());
        codecs
    })
}
