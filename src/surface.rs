// MIT/Apache2 License

use crate::gradient::ColorStop;
use lyon_geom::{Point, Transform};

/// How a gradient pattern is extended past the ends of its gradient line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Extend {
    /// Nothing is painted past the ends.
    None,
    /// The gradient repeats.
    Repeat,
    /// The gradient repeats, mirrored on every other period.
    Reflect,
    /// The end colors continue forever.
    Pad,
}

/// A gradient pattern under construction inside the rendering backend.
pub trait Pattern {
    /// Add a stop. Stops arrive in increasing offset order. Offsets outside `[0, 1]` may be clamped.
    fn add_color_stop(&mut self, stop: ColorStop);
    /// Set the extend mode.
    fn set_extend(&mut self, extend: Extend);
    /// Set the matrix mapping user space into pattern space.
    fn set_matrix(&mut self, matrix: &Transform<f32>);
}

/// Something that can be painted with patterns; otherwise known as the rendering backend.
///
/// Brushes only need the pattern primitives from it: create a linear gradient pattern, fill it in, and make
/// it the current paint source. Path filling and stroking stay on the backend's side.
pub trait Surface {
    /// The backend's pattern type.
    type Pattern: Pattern;

    /// Create a linear gradient pattern running from `start` to `end` in pattern space.
    fn create_linear_pattern(
        &mut self,
        start: Point<f32>,
        end: Point<f32>,
    ) -> crate::Result<Self::Pattern>;

    /// Use `pattern` as the paint source for subsequent drawing.
    fn set_source(&mut self, pattern: Self::Pattern) -> crate::Result;
}

impl<S: Surface + ?Sized> Surface for &mut S {
    type Pattern = S::Pattern;

    #[inline]
    fn create_linear_pattern(
        &mut self,
        start: Point<f32>,
        end: Point<f32>,
    ) -> crate::Result<Self::Pattern> {
        (**self).create_linear_pattern(start, end)
    }

    #[inline]
    fn set_source(&mut self, pattern: Self::Pattern) -> crate::Result {
        (**self).set_source(pattern)
    }
}
