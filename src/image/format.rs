// MIT/Apache2 License

/// How many leading bytes [`ImageFormat::detect`] needs to recognize every format.
///
/// EMF keeps its signature at byte 40, which makes it the longest probe.
pub const PROBE_LEN: usize = 44;

/// The image formats GDI+ knows about.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Bmp,
    Png,
    Jpeg,
    Gif,
    Tiff,
    Icon,
    Wmf,
    Emf,
}

const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const PLACEABLE_WMF_MAGIC: [u8; 4] = [0xD7, 0xCD, 0xC6, 0x9A];

impl ImageFormat {
    /// Recognize a format from the leading bytes of a file. Returns `None` if nothing matches.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(b"BM") {
            return Some(ImageFormat::Bmp);
        }

        if data.starts_with(&PNG_MAGIC) {
            return Some(ImageFormat::Png);
        }

        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(ImageFormat::Gif);
        }

        if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
            return Some(ImageFormat::Tiff);
        }

        // ICONDIR: reserved zero, then type 1
        if data.starts_with(&[0x00, 0x00, 0x01, 0x00]) {
            return Some(ImageFormat::Icon);
        }

        // EMR_HEADER record, with the " EMF" signature inside it
        if data.len() >= PROBE_LEN && data[..4] == [0x01, 0, 0, 0] && data[40..44] == *b" EMF" {
            return Some(ImageFormat::Emf);
        }

        if data.starts_with(&PLACEABLE_WMF_MAGIC) {
            return Some(ImageFormat::Wmf);
        }

        // METAHEADER: memory or disk metafile, nine word header, version 1 or 3
        if data.len() >= 6
            && (data[..4] == [0x01, 0x00, 0x09, 0x00] || data[..4] == [0x02, 0x00, 0x09, 0x00])
            && (data[4..6] == [0x00, 0x01] || data[4..6] == [0x00, 0x03])
        {
            return Some(ImageFormat::Wmf);
        }

        None
    }

    /// Recognize a format from a file extension, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        match ext.as_str() {
            "bmp" | "dib" | "rle" => Some(ImageFormat::Bmp),
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" | "jpe" | "jfif" => Some(ImageFormat::Jpeg),
            "gif" => Some(ImageFormat::Gif),
            "tif" | "tiff" => Some(ImageFormat::Tiff),
            "ico" => Some(ImageFormat::Icon),
            "wmf" => Some(ImageFormat::Wmf),
            "emf" => Some(ImageFormat::Emf),
            _ => None,
        }
    }

    /// MIME type string, as GDI+ reports it for its codecs.
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Tiff => "image/tiff",
            ImageFormat::Icon => "image/x-icon",
            ImageFormat::Wmf => "image/x-wmf",
            ImageFormat::Emf => "image/x-emf",
        }
    }
}
