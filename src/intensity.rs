// MIT/Apache2 License

use num_traits::{AsPrimitive, Bounded};
use ordered_float::NotNan;
use std::ops;

/// A range that goes from zero to one, defining how strong a single color channel is once it has been
/// normalized for the rendering backend. This type is essentially a wrapper around an `f32`, but with two
/// invariants:
///
/// * The inner value will always be between `0.0` and `1.0`.
/// * The inner value will never be `NaN`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Intensity {
    inner: NotNan<f32>,
}

impl Intensity {
    /// Create a new `Intensity`. If the inner value does not meet the invariants mentioned above, this function
    /// returns `None`.
    #[inline]
    pub fn new(inner: f32) -> Option<Intensity> {
        if inner < 0.0 || inner > 1.0 {
            None
        } else {
            NotNan::new(inner).ok().map(|inner| Intensity { inner })
        }
    }

    /// Create a new `Intensity`, pulling out-of-range values back to the nearest bound. `NaN` becomes zero.
    #[inline]
    pub fn saturating(inner: f32) -> Intensity {
        let inner = if inner.is_nan() {
            0.0
        } else {
            inner.max(0.0).min(1.0)
        };
        Intensity::new(inner).unwrap_or_default()
    }

    /// Normalize an 8-bit channel value.
    #[inline]
    pub fn from_u8(channel: u8) -> Intensity {
        Intensity::saturating(f32::from(channel) / 255.0)
    }

    /// Get the inner value of the `Intensity`.
    #[inline]
    pub fn into_inner(self) -> f32 {
        self.inner.into_inner()
    }

    /// Scale this value to the full range of a compatible integer type.
    #[inline]
    pub fn clamp<N: Bounded + Copy + ops::Sub + 'static>(self) -> N
    where
        f32: AsPrimitive<N> + From<N::Output>,
    {
        let bounds: f32 = (N::max_value() - N::min_value()).into();
        (bounds * self.into_inner()).round().as_()
    }

    /// Clamp this value to a `u8`.
    #[inline]
    pub fn clamp_u8(self) -> u8 {
        self.clamp()
    }

    /// Clamp this value to a `u16`.
    #[inline]
    pub fn clamp_u16(self) -> u16 {
        self.clamp()
    }
}

impl From<Intensity> for f32 {
    #[inline]
    fn from(i: Intensity) -> f32 {
        i.into_inner()
    }
}
