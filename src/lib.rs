// MIT/Apache2 License

//! The platform independent core of a GDI+ compatibility layer.
//!
//! Two halves live here. [`stream`] and [`image`] load and save images through client supplied byte
//! sources, buffering reads so that codecs can pull bytes in whatever sizes suit them. [`brush`], [`blend`]
//! and [`gradient`] turn a GDI+ linear gradient brush into the color stops, extend mode and matrix of a
//! backend gradient pattern; see [`Surface`].

#![forbid(unsafe_code)]

mod error;

pub mod blend;
pub mod brush;
pub mod color;
pub mod gradient;
pub mod image;
pub mod intensity;
pub mod matrix;
pub mod stream;
pub mod surface;

pub(crate) mod util;

pub use blend::{BlendFactor, PresetColor};
pub use brush::*;
pub use color::*;
pub use error::*;
pub use gradient::{ColorStop, StopList};
pub use intensity::*;
pub use matrix::*;
pub use surface::*;

#[doc(inline)]
pub use lyon_geom::{Point, Rect, Size};
