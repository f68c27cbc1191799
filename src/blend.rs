// MIT/Apache2 License

//! Blend tables, and the two analytic blend shapes GDI+ can generate for a linear gradient.
//!
//! A blend table maps positions along the gradient line to how far the color has progressed from the first
//! endpoint color to the second. A preset table instead pins explicit colors to positions.

use crate::{color::Argb, InvalidArgument};
use libm::erff;
use std::f32::consts::SQRT_2;

/// Samples on each side of the peak in a sigma blend, counting the boundary point.
const SIGMA_SIDE_POINTS: usize = 255;

/// One entry of a blend table.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct BlendFactor {
    /// Where on the gradient line this entry sits.
    pub position: f32,
    /// How far the color has moved from the first color toward the second, in `[0, 1]`.
    pub factor: f32,
}

impl BlendFactor {
    #[inline]
    pub const fn new(position: f32, factor: f32) -> Self {
        BlendFactor { position, factor }
    }
}

/// One entry of a preset color table.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct PresetColor {
    pub position: f32,
    pub color: Argb,
}

impl PresetColor {
    #[inline]
    pub const fn new(position: f32, color: Argb) -> Self {
        PresetColor { position, color }
    }
}

/// Copy a caller's blend table, rejecting anything the stop builder cannot use.
pub(crate) fn validated_blend(table: &[BlendFactor]) -> crate::Result<Vec<BlendFactor>> {
    if table.len() < 2 {
        return Err(InvalidArgument::TooFewEntries.into());
    }
    for entry in table {
        if entry.position.is_nan() || entry.factor.is_nan() {
            return Err(InvalidArgument::NotANumber.into());
        }
        if entry.factor < 0.0 || entry.factor > 1.0 {
            return Err(InvalidArgument::OutOfRange.into());
        }
    }
    check_increasing(table.iter().map(|entry| entry.position))?;

    crate::util::try_to_vec(table)
}

/// Copy a caller's preset table.
pub(crate) fn validated_presets(table: &[PresetColor]) -> crate::Result<Vec<PresetColor>> {
    if table.len() < 2 {
        return Err(InvalidArgument::TooFewEntries.into());
    }
    if table.iter().any(|entry| entry.position.is_nan()) {
        return Err(InvalidArgument::NotANumber.into());
    }
    check_increasing(table.iter().map(|entry| entry.position))?;

    crate::util::try_to_vec(table)
}

fn check_increasing(positions: impl Iterator<Item = f32> + Clone) -> crate::Result {
    if positions.clone().zip(positions.skip(1)).all(|(a, b)| a < b) {
        Ok(())
    } else {
        Err(InvalidArgument::Unordered.into())
    }
}

fn check_unit(value: f32) -> crate::Result {
    if value.is_nan() {
        Err(InvalidArgument::NotANumber.into())
    } else if value < 0.0 || value > 1.0 {
        Err(InvalidArgument::OutOfRange.into())
    } else {
        Ok(())
    }
}

/// A triangular blend: zero at the ends of the line, `scale` at `focus`.
///
/// A focus of exactly 0 or 1 collapses the empty side, leaving a two-point table.
pub fn linear_blend(focus: f32, scale: f32) -> crate::Result<Vec<BlendFactor>> {
    check_unit(focus)?;
    check_unit(scale)?;

    let mut table = Vec::new();
    if focus == 0.0 {
        table.try_reserve_exact(2)?;
        table.push(BlendFactor::new(0.0, scale));
        table.push(BlendFactor::new(1.0, 0.0));
    } else if focus == 1.0 {
        table.try_reserve_exact(2)?;
        table.push(BlendFactor::new(0.0, 0.0));
        table.push(BlendFactor::new(1.0, scale));
    } else {
        table.try_reserve_exact(3)?;
        table.push(BlendFactor::new(0.0, 0.0));
        table.push(BlendFactor::new(focus, scale));
        table.push(BlendFactor::new(1.0, 0.0));
    }

    Ok(table)
}

/// A bell-shaped blend: rises from zero to `scale` at `focus` and falls back to zero, following the cumulative
/// distribution function of a normal distribution on each side.
///
/// Each side spans four standard deviations, so the visible rise completes within two standard deviations
/// of the focus. The table holds 511 points, or 256 when the focus sits on a boundary.
pub fn sigma_blend(focus: f32, scale: f32) -> crate::Result<Vec<BlendFactor>> {
    check_unit(focus)?;
    check_unit(scale)?;

    let boundary = focus == 0.0 || focus == 1.0;
    let count = if boundary {
        SIGMA_SIDE_POINTS + 1
    } else {
        SIGMA_SIDE_POINTS * 2 + 1
    };

    let mut table = Vec::new();
    table.try_reserve_exact(count)?;

    if focus == 0.0 {
        table.push(BlendFactor::new(0.0, scale));
        push_ramp(&mut table, 0.0, 1.0, scale, Ramp::Falling);
        table.push(BlendFactor::new(1.0, 0.0));
    } else if focus == 1.0 {
        table.push(BlendFactor::new(0.0, 0.0));
        push_ramp(&mut table, 0.0, 1.0, scale, Ramp::Rising);
        table.push(BlendFactor::new(1.0, scale));
    } else {
        table.push(BlendFactor::new(0.0, 0.0));
        push_ramp(&mut table, 0.0, focus, scale, Ramp::Rising);
        table.push(BlendFactor::new(focus, scale));
        push_ramp(&mut table, focus, 1.0, scale, Ramp::Falling);
        table.push(BlendFactor::new(1.0, 0.0));
    }

    Ok(table)
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Ramp {
    Rising,
    Falling,
}

/// Append the interior samples of one side of a sigma blend, strictly between `from` and `to`.
fn push_ramp(table: &mut Vec<BlendFactor>, from: f32, to: f32, scale: f32, ramp: Ramp) {
    let width = to - from;
    let sigma = width / 4.0;
    let mean = from + width / 2.0;
    let delta = width / SIGMA_SIDE_POINTS as f32;

    let cdf = |x: f32| 0.5 * (1.0 + erff((x - mean) / (sigma * SQRT_2)));
    let low = cdf(from);
    let span = cdf(to) - low;
    if !(span > 0.0) {
        return;
    }

    let mut last = from;
    for i in 1..SIGMA_SIDE_POINTS {
        let position = from + delta * i as f32;
        // ramps narrower than the float spacing cannot hold every sample
        if position <= last || position >= to {
            continue;
        }
        last = position;

        let progress = (cdf(position) - low) / span;
        let progress = match ramp {
            Ramp::Rising => progress,
            Ramp::Falling => 1.0 - progress,
        };
        let factor = (scale * progress).max(0.0).min(scale);
        table.push(BlendFactor::new(position, factor));
    }
}
