// MIT/Apache2 License

use crate::intensity::Intensity;
use std::fmt;

/// A packed 32-bit color, laid out as `0xAARRGGBB` the way GDI+ stores it.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Argb(pub u32);

impl Argb {
    pub const TRANSPARENT: Argb = Argb(0x0000_0000);
    pub const BLACK: Argb = Argb(0xFF00_0000);
    pub const WHITE: Argb = Argb(0xFFFF_FFFF);

    /// Pack four 8-bit channels.
    #[inline]
    pub const fn from_channels(a: u8, r: u8, g: u8, b: u8) -> Argb {
        Argb((a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    /// An opaque color.
    #[inline]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Argb {
        Argb::from_channels(0xFF, r, g, b)
    }

    #[inline]
    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    #[inline]
    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub const fn blue(self) -> u8 {
        self.0 as u8
    }

    /// The channels in `[a, r, g, b]` order.
    #[inline]
    pub const fn channels(self) -> [u8; 4] {
        [self.alpha(), self.red(), self.green(), self.blue()]
    }
}

impl fmt::Debug for Argb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Argb({:#010x})", self.0)
    }
}

impl From<u32> for Argb {
    #[inline]
    fn from(packed: u32) -> Self {
        Argb(packed)
    }
}

impl From<Argb> for u32 {
    #[inline]
    fn from(argb: Argb) -> u32 {
        argb.0
    }
}

/// A four-element color with every channel normalized to `[0, 1]`. Channels are straight, not premultiplied.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Color {
    r: Intensity,
    g: Intensity,
    b: Intensity,
    a: Intensity,
}

impl Color {
    /// Creates a new color. This function returns `None` if any of the elements are NaN or outside of
    /// `[0, 1]`.
    #[inline]
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Option<Self> {
        Some(Self {
            r: Intensity::new(r)?,
            g: Intensity::new(g)?,
            b: Intensity::new(b)?,
            a: Intensity::new(a)?,
        })
    }

    /// Creates a new color, pulling every element into `[0, 1]`.
    #[inline]
    pub fn saturating(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            r: Intensity::saturating(r),
            g: Intensity::saturating(g),
            b: Intensity::saturating(b),
            a: Intensity::saturating(a),
        }
    }

    /// Gets the red element.
    #[inline]
    pub fn red(self) -> f32 {
        self.r.into_inner()
    }

    /// Gets the green element.
    #[inline]
    pub fn green(self) -> f32 {
        self.g.into_inner()
    }

    /// Gets the blue element.
    #[inline]
    pub fn blue(self) -> f32 {
        self.b.into_inner()
    }

    /// Gets the alpha element.
    #[inline]
    pub fn alpha(self) -> f32 {
        self.a.into_inner()
    }

    /// Clamp to u8's, in `(r, g, b, a)` order.
    #[inline]
    pub fn clamp_u8(self) -> (u8, u8, u8, u8) {
        let r = self.r.clamp_u8();
        let g = self.g.clamp_u8();
        let b = self.b.clamp_u8();
        let a = self.a.clamp_u8();
        (r, g, b, a)
    }

    /// Clamp to u16's, in `(r, g, b, a)` order.
    #[inline]
    pub fn clamp_u16(self) -> (u16, u16, u16, u16) {
        let r = self.r.clamp_u16();
        let g = self.g.clamp_u16();
        let b = self.b.clamp_u16();
        let a = self.a.clamp_u16();
        (r, g, b, a)
    }
}

impl From<Argb> for Color {
    #[inline]
    fn from(argb: Argb) -> Self {
        Self {
            r: Intensity::from_u8(argb.red()),
            g: Intensity::from_u8(argb.green()),
            b: Intensity::from_u8(argb.blue()),
            a: Intensity::from_u8(argb.alpha()),
        }
    }
}

impl From<Color> for Argb {
    #[inline]
    fn from(color: Color) -> Self {
        let (r, g, b, a) = color.clamp_u8();
        Argb::from_channels(a, r, g, b)
    }
}
