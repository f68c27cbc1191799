// MIT/Apache2 License

//! Linear gradient brushes.

mod mode;

pub use mode::*;

use crate::{
    blend::{self, BlendFactor, PresetColor},
    color::Argb,
    gradient::{self, StopList},
    matrix::{Matrix, MatrixOrder},
    surface::{Pattern, Surface},
    InvalidArgument,
};
use lyon_geom::{Angle, Point, Rect, Size, Vector};

/// What the blend table reports before anything has been set.
const DEFAULT_BLEND: [BlendFactor; 1] = [BlendFactor::new(0.0, 1.0)];

/// How the colors progress along the gradient line. Holding at most one table makes blend factors and preset
/// colors mutually exclusive.
#[derive(Debug, Clone, PartialEq)]
enum ColorBlend {
    Default,
    Factors(Vec<BlendFactor>),
    Presets(Vec<PresetColor>),
}

/// A brush painting a linear color gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    colors: [Argb; 2],
    blend: ColorBlend,
    wrap_mode: WrapMode,
    transform: Matrix,
    rect: Rect<f32>,
    start: Point<f32>,
    end: Point<f32>,
}

impl LinearGradient {
    /// Create a gradient running from `start` to `end`.
    pub fn new(
        start: Point<f32>,
        end: Point<f32>,
        start_color: Argb,
        end_color: Argb,
        wrap_mode: WrapMode,
    ) -> crate::Result<Self> {
        check_wrap_mode(wrap_mode)?;
        if !start.x.is_finite() || !start.y.is_finite() || !end.x.is_finite() || !end.y.is_finite() {
            return Err(InvalidArgument::NotANumber.into());
        }
        if start == end {
            return Err(InvalidArgument::DegenerateGradient.into());
        }

        let origin = Point::new(start.x.min(end.x), start.y.min(end.y));
        let size = Size::new((end.x - start.x).abs(), (end.y - start.y).abs());

        Ok(Self::with_geometry(
            Rect::new(origin, size),
            start,
            end,
            [start_color, end_color],
            wrap_mode,
        ))
    }

    /// Create a gradient spanning `rect` in one of the four standard directions.
    #[inline]
    pub fn from_rect(
        rect: Rect<f32>,
        start_color: Argb,
        end_color: Argb,
        mode: LinearGradientMode,
        wrap_mode: WrapMode,
    ) -> crate::Result<Self> {
        let (degrees, scalable) = mode.angle();
        Self::from_rect_with_angle(rect, start_color, end_color, degrees, scalable, wrap_mode)
    }

    /// Create a gradient spanning `rect` at `degrees` clockwise from the positive x axis.
    ///
    /// The gradient line passes through the center of the rectangle, and is just long enough that the lines
    /// perpendicular to it through its ends touch the rectangle's corners. When `scalable` is set, the angle
    /// is measured in a unit square that is then stretched onto the rectangle, so 45 degrees always runs
    /// from the upper left corner to the lower right one.
    pub fn from_rect_with_angle(
        rect: Rect<f32>,
        start_color: Argb,
        end_color: Argb,
        degrees: f32,
        scalable: bool,
        wrap_mode: WrapMode,
    ) -> crate::Result<Self> {
        check_wrap_mode(wrap_mode)?;
        let (w, h) = (rect.size.width, rect.size.height);
        if !w.is_finite() || !h.is_finite() || !degrees.is_finite() {
            return Err(InvalidArgument::NotANumber.into());
        }
        if !(w > 0.0) || !(h > 0.0) {
            return Err(InvalidArgument::DegenerateGradient.into());
        }

        let (sin, cos) = Angle::degrees(degrees).sin_cos();
        let direction = if scalable {
            Vector::new(h * cos, w * sin)
        } else {
            Vector::new(cos, sin)
        };
        let direction = direction.normalize();
        let half_length = ((w * direction.x).abs() + (h * direction.y).abs()) / 2.0;
        let center = rect.center();

        Ok(Self::with_geometry(
            rect,
            center - direction * half_length,
            center + direction * half_length,
            [start_color, end_color],
            wrap_mode,
        ))
    }

    fn with_geometry(
        rect: Rect<f32>,
        start: Point<f32>,
        end: Point<f32>,
        colors: [Argb; 2],
        wrap_mode: WrapMode,
    ) -> Self {
        LinearGradient {
            colors,
            blend: ColorBlend::Default,
            wrap_mode,
            transform: Matrix::identity(),
            rect,
            start,
            end,
        }
    }

    /// The bounding rectangle of the gradient.
    #[inline]
    pub fn rectangle(&self) -> Rect<f32> {
        self.rect
    }

    /// The start and end points of the gradient line, in brush space.
    #[inline]
    pub fn line(&self) -> (Point<f32>, Point<f32>) {
        (self.start, self.end)
    }

    #[inline]
    pub fn colors(&self) -> [Argb; 2] {
        self.colors
    }

    #[inline]
    pub fn set_colors(&mut self, start_color: Argb, end_color: Argb) {
        self.colors = [start_color, end_color];
    }

    /// The blend table.
    ///
    /// Before any table is set this is the single entry `(0.0, 1.0)`. While preset colors are in effect it is
    /// empty.
    #[inline]
    pub fn blend(&self) -> &[BlendFactor] {
        match self.blend {
            ColorBlend::Default => &DEFAULT_BLEND,
            ColorBlend::Factors(ref table) => table,
            ColorBlend::Presets(_) => &[],
        }
    }

    /// The preset color table; empty unless one has been set since the last blend change.
    #[inline]
    pub fn preset_colors(&self) -> &[PresetColor] {
        match self.blend {
            ColorBlend::Presets(ref table) => table,
            _ => &[],
        }
    }

    /// Replace the blend table, discarding any preset colors. On failure the brush is unchanged.
    pub fn set_blend(&mut self, table: &[BlendFactor]) -> crate::Result {
        let table = blend::validated_blend(table)?;
        self.replace_blend(ColorBlend::Factors(table));
        Ok(())
    }

    /// Replace the preset colors, discarding any blend table. On failure the brush is unchanged.
    pub fn set_preset_colors(&mut self, table: &[PresetColor]) -> crate::Result {
        let table = blend::validated_presets(table)?;
        self.replace_blend(ColorBlend::Presets(table));
        Ok(())
    }

    /// Use a triangular blend peaking at `focus`.
    pub fn set_linear_blend(&mut self, focus: f32, scale: f32) -> crate::Result {
        let table = blend::linear_blend(focus, scale)?;
        self.replace_blend(ColorBlend::Factors(table));
        Ok(())
    }

    /// Use a bell-shaped blend peaking at `focus`.
    pub fn set_sigma_blend(&mut self, focus: f32, scale: f32) -> crate::Result {
        let table = blend::sigma_blend(focus, scale)?;
        self.replace_blend(ColorBlend::Factors(table));
        Ok(())
    }

    fn replace_blend(&mut self, blend: ColorBlend) {
        match blend {
            ColorBlend::Factors(ref table) => {
                log::debug!("Replacing gradient blend with {} factors", table.len())
            }
            ColorBlend::Presets(ref table) => {
                log::debug!("Replacing gradient blend with {} preset colors", table.len())
            }
            ColorBlend::Default => {}
        }
        self.blend = blend;
    }

    #[inline]
    pub fn wrap_mode(&self) -> WrapMode {
        self.wrap_mode
    }

    /// Set the wrap mode. `Clamp` is rejected.
    #[inline]
    pub fn set_wrap_mode(&mut self, wrap_mode: WrapMode) -> crate::Result {
        check_wrap_mode(wrap_mode)?;
        self.wrap_mode = wrap_mode;
        Ok(())
    }

    /// The brush transform, mapping brush space into user space.
    #[inline]
    pub fn transform(&self) -> &Matrix {
        &self.transform
    }

    /// Replace the brush transform. A singular matrix is rejected and the previous transform kept.
    #[inline]
    pub fn set_transform(&mut self, matrix: &Matrix) -> crate::Result {
        if !matrix.is_invertible() {
            return Err(InvalidArgument::SingularMatrix.into());
        }
        self.transform = *matrix;
        Ok(())
    }

    #[inline]
    pub fn reset_transform(&mut self) {
        self.transform = Matrix::identity();
    }

    /// Combine the brush transform with `matrix`.
    pub fn multiply_transform(&mut self, matrix: &Matrix, order: MatrixOrder) -> crate::Result {
        if !matrix.is_invertible() {
            return Err(InvalidArgument::SingularMatrix.into());
        }

        let mut combined = self.transform;
        combined.multiply(matrix, order);
        // products of invertible matrices can still overflow
        if !combined.is_invertible() {
            return Err(InvalidArgument::SingularMatrix.into());
        }
        self.transform = combined;
        Ok(())
    }

    #[inline]
    pub fn translate_transform(&mut self, dx: f32, dy: f32, order: MatrixOrder) -> crate::Result {
        let mut operand = Matrix::identity();
        operand.translate(dx, dy, MatrixOrder::Append);
        self.multiply_transform(&operand, order)
    }

    /// Scale the brush transform. A zero factor would make it singular, so it is rejected.
    #[inline]
    pub fn scale_transform(&mut self, sx: f32, sy: f32, order: MatrixOrder) -> crate::Result {
        let mut operand = Matrix::identity();
        operand.scale(sx, sy, MatrixOrder::Append);
        self.multiply_transform(&operand, order)
    }

    #[inline]
    pub fn rotate_transform(&mut self, degrees: f32, order: MatrixOrder) -> crate::Result {
        let mut operand = Matrix::identity();
        operand.rotate(degrees, MatrixOrder::Append);
        self.multiply_transform(&operand, order)
    }

    /// The color stops a backend pattern should use.
    ///
    /// Preset colors win when there are at least two, then a blend table of at least two entries, and
    /// otherwise the plain two color gradient.
    pub fn stops(&self) -> StopList {
        match self.blend {
            ColorBlend::Presets(ref table) if table.len() >= 2 => gradient::stops_from_presets(table),
            ColorBlend::Factors(ref table) if table.len() >= 2 => {
                gradient::stops_from_blend(self.colors, table)
            }
            _ => gradient::stops_from_two_colors(self.colors[0], self.colors[1]),
        }
    }

    /// Build the backend pattern for this brush and make it the surface's paint source.
    pub fn realize<S: Surface + ?Sized>(&self, surface: &mut S) -> crate::Result {
        // the pattern matrix maps user space back into brush space
        let inverse = self.transform.inverted()?;

        let mut pattern = surface.create_linear_pattern(self.start, self.end)?;
        for stop in &self.stops() {
            pattern.add_color_stop(*stop);
        }
        pattern.set_extend(self.wrap_mode.extend());
        pattern.set_matrix(inverse.as_transform());

        surface.set_source(pattern)
    }
}

#[inline]
fn check_wrap_mode(wrap_mode: WrapMode) -> crate::Result {
    if wrap_mode == WrapMode::Clamp {
        Err(InvalidArgument::ClampWrapMode.into())
    } else {
        Ok(())
    }
}
