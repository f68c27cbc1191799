// MIT/Apache2 License

//! Windows bitmaps.
//!
//! Loading understands the core, info, V4 and V5 headers with 1, 4, 8, 16, 24 and 32 bits per pixel,
//! uncompressed or with bitfield masks. Saving always writes an info header.

use super::{BitmapData, Codec, ImageFormat, Palette, PixelFormat, ResourceLimits, DEFAULT_DPI};
use crate::{
    color::Argb,
    stream::{ByteSink, StreamBuffer},
    util, InvalidArgument,
};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::convert::TryFrom;

const FILE_HEADER_LEN: usize = 14;
const CORE_HEADER_LEN: u32 = 12;
const INFO_HEADER_LEN: u32 = 40;
const V5_HEADER_LEN: u32 = 124;

const BI_RGB: u32 = 0;
const BI_RLE8: u32 = 1;
const BI_RLE4: u32 = 2;
const BI_BITFIELDS: u32 = 3;
const BI_JPEG: u32 = 4;
const BI_PNG: u32 = 5;
const BI_ALPHABITFIELDS: u32 = 6;

const INCHES_PER_METER: f32 = 39.370_08;

/// The BMP codec.
#[derive(Debug, Copy, Clone, Default)]
pub struct BmpCodec;

/// Channel masks for 16 and 32 bpp pixels.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct Masks {
    red: u32,
    green: u32,
    blue: u32,
    alpha: u32,
}

impl Masks {
    const RGB555: Masks = Masks {
        red: 0x7C00,
        green: 0x03E0,
        blue: 0x001F,
        alpha: 0,
    };
}

/// Everything in the headers that decoding needs.
#[derive(Debug)]
struct Header {
    pixel_offset: u32,
    width: u32,
    height: u32,
    top_down: bool,
    bits: u16,
    compression: u32,
    masks: Option<Masks>,
    palette_len: usize,
    // RGBTRIPLE for core headers, RGBQUAD otherwise
    palette_entry_len: usize,
    dpi: (f32, f32),
    // bytes consumed from the start of the file once the headers and masks are read
    consumed: u64,
}

fn read_header(stream: &mut StreamBuffer<'_>) -> crate::Result<Header> {
    let mut file_header = [0u8; FILE_HEADER_LEN];
    stream.read_exact_or_truncated(&mut file_header)?;
    if &file_header[..2] != b"BM" {
        return Err(crate::Error::InvalidData("missing BM signature"));
    }
    let pixel_offset = (&file_header[10..]).read_u32::<LittleEndian>()?;

    let header_len = stream.read_u32::<LittleEndian>()?;
    match header_len {
        CORE_HEADER_LEN | INFO_HEADER_LEN | 52 | 56 | 108 | V5_HEADER_LEN => {}
        _ => return Err(crate::Error::InvalidData("unknown bitmap header size")),
    }

    let mut info = vec![0u8; header_len as usize - 4];
    stream.read_exact_or_truncated(&mut info)?;
    let mut r = &info[..];

    let (width, height, planes, bits) = if header_len == CORE_HEADER_LEN {
        let width = i32::from(r.read_u16::<LittleEndian>()?);
        let height = i32::from(r.read_u16::<LittleEndian>()?);
        (width, height, r.read_u16::<LittleEndian>()?, r.read_u16::<LittleEndian>()?)
    } else {
        (
            r.read_i32::<LittleEndian>()?,
            r.read_i32::<LittleEndian>()?,
            r.read_u16::<LittleEndian>()?,
            r.read_u16::<LittleEndian>()?,
        )
    };

    if planes != 1 {
        return Err(crate::Error::InvalidData("bitmap must have one color plane"));
    }
    if width <= 0 || height == 0 || height == i32::MIN {
        return Err(crate::Error::InvalidData("invalid bitmap dimensions"));
    }

    let mut compression = BI_RGB;
    let mut colors_used = 0;
    let mut dpi = (DEFAULT_DPI, DEFAULT_DPI);
    let mut masks = None;
    let mut consumed = (FILE_HEADER_LEN + 4 + info.len()) as u64;

    if header_len > CORE_HEADER_LEN {
        compression = r.read_u32::<LittleEndian>()?;
        let _image_size = r.read_u32::<LittleEndian>()?;
        let x_ppm = r.read_i32::<LittleEndian>()?;
        let y_ppm = r.read_i32::<LittleEndian>()?;
        colors_used = r.read_u32::<LittleEndian>()?;
        let _colors_important = r.read_u32::<LittleEndian>()?;

        if x_ppm > 0 && y_ppm > 0 {
            dpi = (
                x_ppm as f32 / INCHES_PER_METER,
                y_ppm as f32 / INCHES_PER_METER,
            );
        }

        match compression {
            BI_RGB => {}
            BI_BITFIELDS | BI_ALPHABITFIELDS => {
                let with_alpha = compression == BI_ALPHABITFIELDS;
                // plain info headers keep their masks just after the header
                let extra_len = match (header_len, with_alpha) {
                    (INFO_HEADER_LEN, true) => 16,
                    (INFO_HEADER_LEN, false) => 12,
                    _ => 0,
                };
                let mut extra = vec![0u8; extra_len];
                stream.read_exact_or_truncated(&mut extra)?;
                consumed += extra_len as u64;
                let mut m = if extra_len > 0 { &extra[..] } else { r };

                let red = m.read_u32::<LittleEndian>()?;
                let green = m.read_u32::<LittleEndian>()?;
                let blue = m.read_u32::<LittleEndian>()?;
                let alpha = if with_alpha || header_len >= 56 {
                    m.read_u32::<LittleEndian>()?
                } else {
                    0
                };
                masks = Some(Masks {
                    red,
                    green,
                    blue,
                    alpha,
                });
            }
            BI_RLE8 | BI_RLE4 => {
                return Err(crate::Error::InvalidData("compressed bitmaps are not supported"))
            }
            BI_JPEG | BI_PNG => {
                return Err(crate::Error::InvalidData("embedded JPEG or PNG data is not supported"))
            }
            _ => return Err(crate::Error::InvalidData("unknown bitmap compression")),
        }
    }

    match (bits, masks.is_some()) {
        (1, false) | (4, false) | (8, false) | (24, false) | (16, _) | (32, _) => {}
        _ => return Err(crate::Error::InvalidData("unsupported bit depth")),
    }

    let palette_len = if bits <= 8 {
        let max = 1usize << bits;
        match colors_used as usize {
            0 => max,
            n if n <= max => n,
            _ => return Err(crate::Error::InvalidData("palette is larger than the bit depth allows")),
        }
    } else {
        0
    };

    Ok(Header {
        pixel_offset,
        width: width as u32,
        height: height.unsigned_abs(),
        top_down: height < 0,
        bits,
        compression,
        masks,
        palette_len,
        palette_entry_len: if header_len == CORE_HEADER_LEN { 3 } else { 4 },
        dpi,
        consumed,
    })
}

impl Header {
    fn pixel_format(&self) -> PixelFormat {
        match self.bits {
            24 => PixelFormat::Rgb24,
            16 | 32 => match self.masks {
                Some(masks) if masks.alpha != 0 => PixelFormat::Argb32,
                _ => PixelFormat::Rgb32,
            },
            bits => PixelFormat::indexed(bits).unwrap_or(PixelFormat::Indexed8),
        }
    }

    /// Bytes per row in the file.
    fn file_stride(&self) -> Option<usize> {
        let bits = u64::from(self.width) * u64::from(self.bits);
        usize::try_from(((bits + 31) / 32) * 4).ok()
    }
}

/// Scale the bits selected by `mask` to eight bits.
#[inline]
fn channel(pixel: u32, mask: u32) -> Option<u8> {
    if mask == 0 {
        return None;
    }
    let shift = mask.trailing_zeros();
    let max = u64::from(mask >> shift);
    let value = u64::from((pixel & mask) >> shift);
    Some(((value * 255 + max / 2) / max) as u8)
}

fn unpack_masked(src: &[u8], dest: &mut [u8], width: usize, bits: u16, masks: Masks) {
    let bytes = usize::from(bits / 8);
    for x in 0..width {
        let px = &src[x * bytes..x * bytes + bytes];
        let pixel = if bytes == 2 {
            u32::from(u16::from_le_bytes([px[0], px[1]]))
        } else {
            u32::from_le_bytes([px[0], px[1], px[2], px[3]])
        };

        let out = &mut dest[x * 4..x * 4 + 4];
        out[0] = channel(pixel, masks.blue).unwrap_or(0);
        out[1] = channel(pixel, masks.green).unwrap_or(0);
        out[2] = channel(pixel, masks.red).unwrap_or(0);
        out[3] = channel(pixel, masks.alpha).unwrap_or(0xFF);
    }
}

impl Codec for BmpCodec {
    #[inline]
    fn format(&self) -> ImageFormat {
        ImageFormat::Bmp
    }

    #[inline]
    fn can_encode(&self) -> bool {
        true
    }

    fn decode(&self, stream: &mut StreamBuffer<'_>, limits: &ResourceLimits) -> crate::Result<BitmapData> {
        let header = read_header(stream)?;
        let pixel_format = header.pixel_format();
        log::debug!(
            "Decoding {}x{} bitmap, {} bpp, compression {}",
            header.width,
            header.height,
            header.bits,
            header.compression
        );

        let bytes = BitmapData::buffer_len(header.width, header.height, pixel_format)
            .ok_or(crate::Error::OutOfMemory)?;
        limits.check(header.width, header.height, bytes)?;

        let mut palette = None;
        let mut consumed = header.consumed;
        if header.palette_len > 0 {
            let mut table = vec![0u8; header.palette_len * header.palette_entry_len];
            stream.read_exact_or_truncated(&mut table)?;
            consumed += table.len() as u64;

            let entries = table
                .chunks_exact(header.palette_entry_len)
                .map(|entry| Argb::opaque(entry[2], entry[1], entry[0]))
                .collect();
            palette = Some(Palette::new(entries));
        }

        let offset = u64::from(header.pixel_offset);
        if offset > consumed {
            let gap = usize::try_from(offset - consumed)
                .map_err(|_| crate::Error::InvalidData("pixel data offset out of range"))?;
            stream.skip(gap);
        }

        let mut bitmap = BitmapData::new(header.width, header.height, pixel_format)?;
        bitmap.palette = palette;
        bitmap.dpi = header.dpi;
        bitmap.format = Some(ImageFormat::Bmp);

        let file_stride = header.file_stride().ok_or(crate::Error::OutOfMemory)?;
        let mut row = util::zeroed_bytes(file_stride)?;
        let masks = match (header.bits, header.masks) {
            (16, None) => Some(Masks::RGB555),
            (_, masks) => masks,
        };

        for i in 0..header.height {
            stream.read_exact_or_truncated(&mut row)?;
            let y = if header.top_down {
                i
            } else {
                header.height - 1 - i
            };
            let dest = bitmap
                .row_mut(y)
                .ok_or(crate::Error::InvalidData("row out of range"))?;

            match masks {
                Some(masks) => {
                    unpack_masked(&row, dest, header.width as usize, header.bits, masks)
                }
                None => {
                    let len = dest.len().min(row.len());
                    dest[..len].copy_from_slice(&row[..len]);
                }
            }
        }

        Ok(bitmap)
    }

    fn encode(&self, bitmap: &BitmapData, sink: &mut dyn ByteSink) -> crate::Result {
        let format = bitmap.pixel_format();
        let bits = format.bits_per_pixel() as u16;

        let palette: &[Argb] = if format.is_indexed() {
            match bitmap.palette {
                Some(ref palette) if !palette.entries.is_empty() => {
                    let max = 1usize << bits;
                    &palette.entries[..palette.entries.len().min(max)]
                }
                _ => return Err(InvalidArgument::UnsupportedPixelFormat.into()),
            }
        } else {
            &[]
        };

        // 32 bpp pixels are written unpremultiplied, with their alpha byte
        let stride = format
            .stride_for(bitmap.width())
            .ok_or(InvalidArgument::OutOfRange)?;
        let image_size = stride as u64 * u64::from(bitmap.height());
        let offset = (FILE_HEADER_LEN as u64) + u64::from(INFO_HEADER_LEN) + palette.len() as u64 * 4;
        let file_size = u32::try_from(offset + image_size).map_err(|_| InvalidArgument::OutOfRange)?;
        let width = i32::try_from(bitmap.width()).map_err(|_| InvalidArgument::OutOfRange)?;
        let height = i32::try_from(bitmap.height()).map_err(|_| InvalidArgument::OutOfRange)?;

        log::debug!(
            "Encoding {}x{} bitmap at {} bpp, {} bytes",
            width,
            height,
            bits,
            file_size
        );

        let mut out = Vec::new();
        out.try_reserve_exact(file_size as usize)?;

        out.extend_from_slice(b"BM");
        out.write_u32::<LittleEndian>(file_size)?;
        out.write_u32::<LittleEndian>(0)?;
        out.write_u32::<LittleEndian>(offset as u32)?;

        out.write_u32::<LittleEndian>(INFO_HEADER_LEN)?;
        out.write_i32::<LittleEndian>(width)?;
        out.write_i32::<LittleEndian>(height)?;
        out.write_u16::<LittleEndian>(1)?;
        out.write_u16::<LittleEndian>(bits)?;
        out.write_u32::<LittleEndian>(BI_RGB)?;
        out.write_u32::<LittleEndian>(image_size as u32)?;
        out.write_i32::<LittleEndian>((bitmap.dpi.0 * INCHES_PER_METER).round() as i32)?;
        out.write_i32::<LittleEndian>((bitmap.dpi.1 * INCHES_PER_METER).round() as i32)?;
        out.write_u32::<LittleEndian>(palette.len() as u32)?;
        out.write_u32::<LittleEndian>(0)?;

        for color in palette {
            out.extend_from_slice(&[color.blue(), color.green(), color.red(), 0]);
        }

        for y in (0..bitmap.height()).rev() {
            let row = bitmap
                .row(y)
                .ok_or(crate::Error::InvalidData("row out of range"))?;
            match format {
                PixelFormat::Rgb32 | PixelFormat::Argb32 | PixelFormat::Pargb32 => {
                    for x in 0..bitmap.width() {
                        let color = bitmap.pixel(x, y).unwrap_or(Argb::TRANSPARENT);
                        out.extend_from_slice(&[color.blue(), color.green(), color.red(), color.alpha()]);
                    }
                }
                _ => out.extend_from_slice(row),
            }
        }

        sink.put_all(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{stream::MemorySource, Error};

    /// A bitmap file with an info header, built by hand.
    fn info_file(width: i32, height: i32, bits: u16, compression: u32, extra: &[u8], pixels: &[u8]) -> Vec<u8> {
        let offset = 14 + 40 + extra.len() as u32;
        let mut out = Vec::new();
        out.extend_from_slice(b"BM");
        out.write_u32::<LittleEndian>(offset + pixels.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(offset).unwrap();
        out.write_u32::<LittleEndian>(40).unwrap();
        out.write_i32::<LittleEndian>(width).unwrap();
        out.write_i32::<LittleEndian>(height).unwrap();
        out.write_u16::<LittleEndian>(1).unwrap();
        out.write_u16::<LittleEndian>(bits).unwrap();
        out.write_u32::<LittleEndian>(compression).unwrap();
        out.write_u32::<LittleEndian>(pixels.len() as u32).unwrap();
        out.write_i32::<LittleEndian>(3780).unwrap();
        out.write_i32::<LittleEndian>(3780).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.extend_from_slice(extra);
        out.extend_from_slice(pixels);
        out
    }

    fn decode(data: &[u8]) -> crate::Result<BitmapData> {
        let mut source = MemorySource::new(data);
        let mut stream = StreamBuffer::new(&mut source);
        BmpCodec.decode(&mut stream, &ResourceLimits::none())
    }

    #[test]
    fn test_decode_24bpp_bottom_up() {
        // two rows of two pixels, each padded to eight bytes; the bottom row comes first
        let pixels = [
            0x00, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0, 0, // red, green
            0xFF, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0, 0, // blue, white
        ];
        let bitmap = decode(&info_file(2, 2, 24, BI_RGB, &[], &pixels)).unwrap();

        assert_eq!(bitmap.pixel_format(), PixelFormat::Rgb24);
        assert_eq!(bitmap.format, Some(ImageFormat::Bmp));
        assert_eq!(bitmap.pixel(0, 0), Some(Argb(0xFF00_00FF)));
        assert_eq!(bitmap.pixel(1, 0), Some(Argb::WHITE));
        assert_eq!(bitmap.pixel(0, 1), Some(Argb(0xFFFF_0000)));
        assert_eq!(bitmap.pixel(1, 1), Some(Argb(0xFF00_FF00)));
        assert!((bitmap.dpi.0 - 96.0).abs() < 0.1);
    }

    #[test]
    fn test_decode_top_down_paletted() {
        let palette = [0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0x00];
        let pixels = [0b1000_0000, 0, 0, 0, 0b0100_0000, 0, 0, 0];
        let mut data = info_file(2, -2, 1, BI_RGB, &palette, &pixels);
        // only two palette entries
        data[46] = 2;
        let bitmap = decode(&data).unwrap();

        assert_eq!(bitmap.pixel_format(), PixelFormat::Indexed1);
        assert_eq!(bitmap.palette.as_ref().unwrap().entries.len(), 2);
        assert_eq!(bitmap.pixel(0, 0), Some(Argb::WHITE));
        assert_eq!(bitmap.pixel(1, 0), Some(Argb::BLACK));
        assert_eq!(bitmap.pixel(1, 1), Some(Argb::WHITE));
    }

    #[test]
    fn test_decode_565_bitfields() {
        let mut masks = Vec::new();
        for mask in &[0xF800u32, 0x07E0, 0x001F] {
            masks.write_u32::<LittleEndian>(*mask).unwrap();
        }
        let pixels = [0x00, 0xF8, 0xE0, 0x07]; // red, green
        let bitmap = decode(&info_file(2, 1, 16, BI_BITFIELDS, &masks, &pixels)).unwrap();

        assert_eq!(bitmap.pixel_format(), PixelFormat::Rgb32);
        assert_eq!(bitmap.pixel(0, 0), Some(Argb(0xFFFF_0000)));
        assert_eq!(bitmap.pixel(1, 0), Some(Argb(0xFF00_FF00)));
    }

    #[test]
    fn test_default_555() {
        let pixels = [0x1F, 0x00, 0x00, 0x00];
        let bitmap = decode(&info_file(1, 1, 16, BI_RGB, &[], &pixels)).unwrap();
        assert_eq!(bitmap.pixel(0, 0), Some(Argb(0xFF00_00FF)));
    }

    #[test]
    fn test_pixel_offset_gap_is_skipped() {
        let mut data = info_file(1, 1, 32, BI_RGB, &[0xAA; 6], &[1, 2, 3, 4]);
        assert_eq!(data.len(), 14 + 40 + 6 + 4);
        let mut source = MemorySource::unseekable(&data);
        let mut stream = StreamBuffer::with_capacity(&mut source, 8).unwrap();
        let bitmap = BmpCodec.decode(&mut stream, &ResourceLimits::none()).unwrap();
        assert_eq!(bitmap.pixel(0, 0), Some(Argb::opaque(3, 2, 1)));

        data[10] = 0;
        assert!(decode(&data).is_ok());
    }

    #[test]
    fn test_rle_rejected() {
        let data = info_file(1, 1, 8, BI_RLE8, &[0; 1024], &[0, 0]);
        assert!(matches!(
            decode(&data),
            Err(Error::InvalidData("compressed bitmaps are not supported"))
        ));
    }

    #[test]
    fn test_truncated() {
        let data = info_file(4, 4, 24, BI_RGB, &[], &[0; 48]);
        assert!(matches!(decode(&data[..data.len() - 1]), Err(Error::Truncated)));
        assert!(matches!(decode(&data[..20]), Err(Error::Truncated)));
    }

    #[test]
    fn test_limits_checked_before_allocation() {
        let data = info_file(100_000, 100_000, 24, BI_RGB, &[], &[]);
        let mut source = MemorySource::new(&data);
        let mut stream = StreamBuffer::new(&mut source);
        let limits = ResourceLimits::none().with_max_pixels(1_000_000);
        assert!(matches!(
            BmpCodec.decode(&mut stream, &limits),
            Err(Error::LimitExceeded(_))
        ));
    }

    #[test]
    fn test_encode_then_decode() {
        let mut bitmap = BitmapData::new(3, 2, PixelFormat::Rgb24).unwrap();
        bitmap.set_pixel(0, 0, Argb(0xFF12_3456)).unwrap();
        bitmap.set_pixel(2, 1, Argb(0xFFAB_CDEF)).unwrap();

        let mut out = Vec::new();
        BmpCodec.encode(&bitmap, &mut out).unwrap();
        assert_eq!(&out[..2], b"BM");
        assert_eq!(out.len(), 14 + 40 + 2 * 12);

        let decoded = decode(&out).unwrap();
        assert_eq!(decoded.scan0(), bitmap.scan0());
    }

    #[test]
    fn test_encode_indexed_needs_palette() {
        let mut bitmap = BitmapData::new(4, 1, PixelFormat::Indexed4).unwrap();
        let mut out = Vec::new();
        assert!(BmpCodec.encode(&bitmap, &mut out).is_err());

        bitmap.palette = Some(Palette::new(vec![Argb::BLACK, Argb(0xFFFF_0000)]));
        bitmap.row_mut(0).unwrap()[0] = 0x01;
        BmpCodec.encode(&bitmap, &mut out).unwrap();
        let decoded = decode(&out).unwrap();
        assert_eq!(decoded.pixel_format(), PixelFormat::Indexed4);
        assert_eq!(decoded.pixel(1, 0), Some(Argb(0xFFFF_0000)));
        assert_eq!(decoded.pixel(0, 0), Some(Argb::BLACK));
    }
}
