// MIT/Apache2 License

use super::ImageFormat;
use crate::{color::Argb, util, InvalidArgument};
use std::convert::TryFrom;

/// How the pixels of a bitmap are laid out in memory.
///
/// The values match the GDI+ `PixelFormat` constants. Multi-byte pixels are stored in little-endian order,
/// so a 32 bpp pixel is the bytes blue, green, red, alpha.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum PixelFormat {
    Indexed1 = 0x0003_0101,
    Indexed4 = 0x0003_0402,
    Indexed8 = 0x0003_0803,
    Rgb24 = 0x0002_1808,
    Rgb32 = 0x0002_2009,
    Argb32 = 0x0026_200A,
    /// 32 bpp ARGB with the color channels premultiplied by alpha.
    Pargb32 = 0x000E_200B,
}

const INDEXED_FLAG: u32 = 0x0001_0000;
const ALPHA_FLAG: u32 = 0x0004_0000;

impl PixelFormat {
    /// Bits used by one pixel.
    #[inline]
    pub fn bits_per_pixel(self) -> u32 {
        (self as u32 >> 8) & 0xFF
    }

    /// Whether pixels are indices into a palette.
    #[inline]
    pub fn is_indexed(self) -> bool {
        self as u32 & INDEXED_FLAG != 0
    }

    #[inline]
    pub fn has_alpha(self) -> bool {
        self as u32 & ALPHA_FLAG != 0
    }

    /// The indexed format holding `bits` per pixel, if there is one.
    #[inline]
    pub fn indexed(bits: u16) -> Option<Self> {
        match bits {
            1 => Some(PixelFormat::Indexed1),
            4 => Some(PixelFormat::Indexed4),
            8 => Some(PixelFormat::Indexed8),
            _ => None,
        }
    }

    /// Bytes per row for an image `width` pixels wide, rounded up to a multiple of four.
    ///
    /// Returns `None` if the stride does not fit in memory.
    #[inline]
    pub fn stride_for(self, width: u32) -> Option<usize> {
        let bits = u64::from(width) * u64::from(self.bits_per_pixel());
        let stride = ((bits + 31) / 32) * 4;
        usize::try_from(stride).ok()
    }
}

/// A color table for indexed pixel formats.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    /// GDI+ palette flags (`PaletteFlagsHasAlpha` and friends).
    pub flags: u32,
    pub entries: Vec<Argb>,
}

/// Palette flag: some entries are not fully opaque.
pub const PALETTE_HAS_ALPHA: u32 = 0x0001;
/// Palette flag: the entries form a grayscale ramp.
pub const PALETTE_GRAY_SCALE: u32 = 0x0002;

impl Palette {
    /// A palette built from `entries`, with flags derived from them.
    pub fn new(entries: Vec<Argb>) -> Self {
        let mut flags = 0;
        if entries.iter().any(|c| c.alpha() != 0xFF) {
            flags |= PALETTE_HAS_ALPHA;
        }
        if !entries.is_empty()
            && entries
                .iter()
                .all(|c| c.red() == c.green() && c.green() == c.blue())
        {
            flags |= PALETTE_GRAY_SCALE;
        }
        Palette { flags, entries }
    }

    /// The color for `index`; indices past the end read as opaque black.
    #[inline]
    pub fn get(&self, index: usize) -> Argb {
        self.entries.get(index).copied().unwrap_or(Argb::BLACK)
    }
}

/// A decoded image in memory: the generic pixel buffer every codec decodes into and encodes from.
#[derive(Debug, Clone, PartialEq)]
pub struct BitmapData {
    width: u32,
    height: u32,
    stride: usize,
    pixel_format: PixelFormat,
    /// Rows top to bottom, each `stride` bytes long.
    scan0: Vec<u8>,
    /// The color table. Indexed formats need one.
    pub palette: Option<Palette>,
    /// Horizontal and vertical resolution, in dots per inch.
    pub dpi: (f32, f32),
    /// The format the image was decoded from.
    pub format: Option<ImageFormat>,
    /// The first chunk of the encoded file, kept verbatim when the codec asked for it.
    pub metadata: Option<Vec<u8>>,
}

/// The resolution GDI+ assumes when a file doesn't say.
pub const DEFAULT_DPI: f32 = 96.0;

impl BitmapData {
    /// Allocate a zeroed bitmap.
    pub fn new(width: u32, height: u32, pixel_format: PixelFormat) -> crate::Result<Self> {
        if width == 0 || height == 0 {
            return Err(InvalidArgument::EmptyImage.into());
        }

        let stride = pixel_format
            .stride_for(width)
            .ok_or(crate::Error::OutOfMemory)?;
        let len = usize::try_from(height)
            .ok()
            .and_then(|height| stride.checked_mul(height))
            .ok_or(crate::Error::OutOfMemory)?;

        Ok(BitmapData {
            width,
            height,
            stride,
            pixel_format,
            scan0: util::zeroed_bytes(len)?,
            palette: None,
            dpi: (DEFAULT_DPI, DEFAULT_DPI),
            format: None,
            metadata: None,
        })
    }

    /// The size of the pixel buffer `new` would allocate, without allocating it.
    #[inline]
    pub fn buffer_len(width: u32, height: u32, pixel_format: PixelFormat) -> Option<u64> {
        let stride = pixel_format.stride_for(width)? as u64;
        stride.checked_mul(u64::from(height))
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    /// The raw pixel rows.
    #[inline]
    pub fn scan0(&self) -> &[u8] {
        &self.scan0
    }

    /// Row `y`, counting from the top.
    #[inline]
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride;
        self.scan0.get(start..start + self.stride)
    }

    #[inline]
    pub fn row_mut(&mut self, y: u32) -> Option<&mut [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride;
        self.scan0.get_mut(start..start + self.stride)
    }

    /// The color at `(x, y)`, resolving palette indices and premultiplication.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Argb> {
        if x >= self.width {
            return None;
        }
        let row = self.row(y)?;
        let x = x as usize;

        let color = match self.pixel_format {
            PixelFormat::Indexed1 => self.index_color(usize::from((row[x / 8] >> (7 - x % 8)) & 1)),
            PixelFormat::Indexed4 => {
                let byte = row[x / 2];
                let index = if x % 2 == 0 { byte >> 4 } else { byte & 0x0F };
                self.index_color(usize::from(index))
            }
            PixelFormat::Indexed8 => self.index_color(usize::from(row[x])),
            PixelFormat::Rgb24 => {
                let px = &row[x * 3..x * 3 + 3];
                Argb::opaque(px[2], px[1], px[0])
            }
            PixelFormat::Rgb32 => {
                let px = &row[x * 4..x * 4 + 4];
                Argb::opaque(px[2], px[1], px[0])
            }
            PixelFormat::Argb32 => {
                let px = &row[x * 4..x * 4 + 4];
                Argb::from_channels(px[3], px[2], px[1], px[0])
            }
            PixelFormat::Pargb32 => {
                let px = &row[x * 4..x * 4 + 4];
                let a = px[3];
                let unmultiply = |c: u8| {
                    if a == 0 {
                        0
                    } else {
                        ((u32::from(c) * 255 + u32::from(a) / 2) / u32::from(a)).min(255) as u8
                    }
                };
                Argb::from_channels(a, unmultiply(px[2]), unmultiply(px[1]), unmultiply(px[0]))
            }
        };

        Some(color)
    }

    /// Write the color at `(x, y)`. Indexed bitmaps cannot be written by color.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Argb) -> crate::Result {
        let format = self.pixel_format;
        if format.is_indexed() {
            return Err(InvalidArgument::UnsupportedPixelFormat.into());
        }
        if x >= self.width {
            return Err(InvalidArgument::OutOfRange.into());
        }
        let row = self.row_mut(y).ok_or(InvalidArgument::OutOfRange)?;
        let x = x as usize;
        let [a, r, g, b] = color.channels();

        match format {
            PixelFormat::Rgb24 => row[x * 3..x * 3 + 3].copy_from_slice(&[b, g, r]),
            PixelFormat::Rgb32 => row[x * 4..x * 4 + 4].copy_from_slice(&[b, g, r, 0xFF]),
            PixelFormat::Argb32 => row[x * 4..x * 4 + 4].copy_from_slice(&[b, g, r, a]),
            PixelFormat::Pargb32 => {
                let multiply = |c: u8| ((u32::from(c) * u32::from(a) + 127) / 255) as u8;
                row[x * 4..x * 4 + 4].copy_from_slice(&[multiply(b), multiply(g), multiply(r), a]);
            }
            PixelFormat::Indexed1 | PixelFormat::Indexed4 | PixelFormat::Indexed8 => {}
        }
        Ok(())
    }

    #[inline]
    fn index_color(&self, index: usize) -> Argb {
        match self.palette {
            Some(ref palette) => palette.get(index),
            None => Argb::BLACK,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_format_bits() {
        assert_eq!(PixelFormat::Indexed1.bits_per_pixel(), 1);
        assert_eq!(PixelFormat::Indexed8.bits_per_pixel(), 8);
        assert_eq!(PixelFormat::Rgb24.bits_per_pixel(), 24);
        assert_eq!(PixelFormat::Pargb32.bits_per_pixel(), 32);
        assert!(PixelFormat::Indexed4.is_indexed());
        assert!(!PixelFormat::Rgb32.is_indexed());
        assert!(PixelFormat::Argb32.has_alpha());
        assert!(PixelFormat::Pargb32.has_alpha());
        assert!(!PixelFormat::Rgb32.has_alpha());
    }

    #[test]
    fn test_stride_alignment() {
        assert_eq!(PixelFormat::Rgb24.stride_for(1), Some(4));
        assert_eq!(PixelFormat::Rgb24.stride_for(5), Some(16));
        assert_eq!(PixelFormat::Indexed1.stride_for(33), Some(8));
        assert_eq!(PixelFormat::Indexed4.stride_for(3), Some(4));
        assert_eq!(PixelFormat::Argb32.stride_for(3), Some(12));
    }

    #[test]
    fn test_empty_rejected() {
        assert!(BitmapData::new(0, 5, PixelFormat::Rgb24).is_err());
        assert!(BitmapData::new(5, 0, PixelFormat::Rgb24).is_err());
    }

    #[test]
    fn test_pixel_access() {
        let mut bitmap = BitmapData::new(3, 2, PixelFormat::Argb32).unwrap();
        bitmap.set_pixel(2, 1, Argb(0x8010_2030)).unwrap();
        assert_eq!(bitmap.pixel(2, 1), Some(Argb(0x8010_2030)));
        assert_eq!(bitmap.pixel(0, 0), Some(Argb::TRANSPARENT));
        assert_eq!(bitmap.pixel(3, 0), None);
        assert_eq!(bitmap.row(1).unwrap()[8..12], [0x30, 0x20, 0x10, 0x80]);

        let mut rgb = BitmapData::new(2, 2, PixelFormat::Rgb24).unwrap();
        rgb.set_pixel(1, 0, Argb(0x0011_2233)).unwrap();
        assert_eq!(rgb.pixel(1, 0), Some(Argb(0xFF11_2233)));
    }

    #[test]
    fn test_premultiplied_round_trip() {
        let mut bitmap = BitmapData::new(1, 1, PixelFormat::Pargb32).unwrap();
        bitmap.set_pixel(0, 0, Argb::from_channels(0x80, 0xFF, 0x00, 0x40)).unwrap();
        assert_eq!(bitmap.row(0).unwrap(), &[0x20, 0x00, 0x80, 0x80]);
        assert_eq!(
            bitmap.pixel(0, 0),
            Some(Argb::from_channels(0x80, 0xFF, 0x00, 0x40))
        );
    }

    #[test]
    fn test_indexed_lookup() {
        let mut bitmap = BitmapData::new(10, 1, PixelFormat::Indexed1).unwrap();
        bitmap.palette = Some(Palette::new(vec![Argb::BLACK, Argb::WHITE]));
        bitmap.row_mut(0).unwrap()[1] = 0b0100_0000;
        assert_eq!(bitmap.pixel(9, 0), Some(Argb::WHITE));
        assert_eq!(bitmap.pixel(8, 0), Some(Argb::BLACK));
        assert!(bitmap.set_pixel(0, 0, Argb::WHITE).is_err());

        let palette = bitmap.palette.as_ref().unwrap();
        assert_eq!(palette.flags, PALETTE_GRAY_SCALE);
        assert_eq!(palette.get(7), Argb::BLACK);
    }
}
