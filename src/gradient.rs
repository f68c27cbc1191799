// MIT/Apache2 License

//! Turning a brush's color description into the stops a backend gradient pattern consumes.

use crate::{
    blend::{BlendFactor, PresetColor},
    color::{Argb, Color},
};
use std::{cmp::Ordering, iter::FromIterator};
use tinyvec::TinyVec;

const EXPECTED_CSTOPS: usize = 3;

/// A color stop in a color gradient.
///
/// The offset is where the stop sits on the gradient line. It is usually in `[0, 1]`, but preset colors may
/// place it outside; backends clamp when they fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Color,
}

/// An ordered list of color stops, stored inline for the common small cases.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StopList {
    stops: TinyVec<[ColorStop; EXPECTED_CSTOPS]>,
}

impl StopList {
    /// Get a slice reference to the color stop values.
    #[inline]
    pub fn as_slice(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Creates an iterator over these values.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, ColorStop> {
        self.stops.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Tell if the offsets never decrease.
    #[inline]
    pub fn is_sorted(&self) -> bool {
        self.stops
            .windows(2)
            .all(|pair| pair[0].offset.partial_cmp(&pair[1].offset) != Some(Ordering::Greater))
    }
}

impl FromIterator<ColorStop> for StopList {
    #[inline]
    fn from_iter<I: IntoIterator<Item = ColorStop>>(iter: I) -> Self {
        StopList {
            stops: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a StopList {
    type Item = &'a ColorStop;
    type IntoIter = std::slice::Iter<'a, ColorStop>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.stops.iter()
    }
}

/// The plain two-stop gradient used when no blend or preset table has been set.
#[inline]
pub fn stops_from_two_colors(start: Argb, end: Argb) -> StopList {
    let stops = [
        ColorStop {
            offset: 0.0,
            color: start.into(),
        },
        ColorStop {
            offset: 1.0,
            color: end.into(),
        },
    ];
    stops.iter().copied().collect()
}

/// One stop per blend entry. Each stop sits at the entry's position; its color has progressed `factor` of the
/// way from `colors[0]` toward `colors[1]`.
pub fn stops_from_blend(colors: [Argb; 2], table: &[BlendFactor]) -> StopList {
    let start = colors[0].channels();
    let end = colors[1].channels();

    table
        .iter()
        .map(|entry| {
            let factor = entry.factor;
            let mix = |i: usize| {
                (f32::from(start[i]) * (1.0 - factor) + f32::from(end[i]) * factor) / 255.0
            };
            ColorStop {
                offset: entry.position,
                color: Color::saturating(mix(1), mix(2), mix(3), mix(0)),
            }
        })
        .collect()
}

/// One stop per preset entry, at its position verbatim.
pub fn stops_from_presets(table: &[PresetColor]) -> StopList {
    table
        .iter()
        .map(|entry| ColorStop {
            offset: entry.position,
            color: entry.color.into(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_two_colors() {
        let stops = stops_from_two_colors(Argb(0xFFFF_0000), Argb(0xFF00_00FF));
        assert_eq!(stops.len(), 2);
        assert_eq!(stops.as_slice()[0].offset, 0.0);
        assert_eq!(stops.as_slice()[0].color, Color::new(1.0, 0.0, 0.0, 1.0).unwrap());
        assert_eq!(stops.as_slice()[1].offset, 1.0);
        assert_eq!(stops.as_slice()[1].color, Color::new(0.0, 0.0, 1.0, 1.0).unwrap());
    }

    #[test]
    fn test_blend_uses_factor_not_position() {
        let table = [
            BlendFactor::new(0.0, 0.0),
            BlendFactor::new(0.2, 0.5),
            BlendFactor::new(1.0, 1.0),
        ];
        let stops = stops_from_blend([Argb(0xFF00_0000), Argb(0x00FF_FFFF)], &table);
        assert_eq!(stops.len(), 3);
        assert!(stops.is_sorted());

        let middle = stops.as_slice()[1];
        assert_eq!(middle.offset, 0.2);
        assert_relative_eq!(middle.color.red(), 127.5 / 255.0);
        assert_relative_eq!(middle.color.alpha(), 127.5 / 255.0);
        assert_eq!(stops.as_slice()[2].color, Color::from(Argb(0x00FF_FFFF)));
    }

    #[test]
    fn test_presets_keep_positions() {
        let table = [
            PresetColor::new(-0.5, Argb(0xFF10_2030)),
            PresetColor::new(1.5, Argb(0x8000_0000)),
        ];
        let stops = stops_from_presets(&table);
        let offsets: Vec<f32> = stops.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![-0.5, 1.5]);
        assert_eq!(Argb::from(stops.as_slice()[0].color), Argb(0xFF10_2030));
    }
}
