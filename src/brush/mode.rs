// MIT/Apache2 License

use crate::surface::Extend;

/// How a brush fills the area beyond its gradient line or texture.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum WrapMode {
    Tile = 0,
    TileFlipX = 1,
    TileFlipY = 2,
    TileFlipXY = 3,
    /// Not valid for linear gradients.
    Clamp = 4,
}

impl Default for WrapMode {
    #[inline]
    fn default() -> Self {
        WrapMode::Tile
    }
}

impl WrapMode {
    /// The backend extend mode that paints this wrap mode.
    ///
    /// A one-dimensional gradient cannot tell the flip axes apart, so every flipping mode reflects.
    #[inline]
    pub fn extend(self) -> Extend {
        match self {
            WrapMode::Tile => Extend::Repeat,
            WrapMode::TileFlipX | WrapMode::TileFlipY | WrapMode::TileFlipXY => Extend::Reflect,
            WrapMode::Clamp => Extend::None,
        }
    }
}

/// The direction of a linear gradient built from a rectangle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum LinearGradientMode {
    /// Left to right.
    Horizontal = 0,
    /// Top to bottom.
    Vertical = 1,
    /// Upper left to lower right.
    ForwardDiagonal = 2,
    /// Upper right to lower left.
    BackwardDiagonal = 3,
}

impl LinearGradientMode {
    /// The angle, in degrees, and whether it scales with the rectangle.
    #[inline]
    pub(crate) fn angle(self) -> (f32, bool) {
        match self {
            LinearGradientMode::Horizontal => (0.0, false),
            LinearGradientMode::Vertical => (90.0, false),
            LinearGradientMode::ForwardDiagonal => (45.0, true),
            LinearGradientMode::BackwardDiagonal => (135.0, true),
        }
    }
}
