// MIT/Apache2 License

//! Loading and saving images.
//!
//! A [`Dispatcher`] recognizes the format of a source from its first bytes, picks a [`Codec`] for it and
//! decodes through a [`StreamBuffer`] into a [`BitmapData`]. Saving goes the other way, from a
//! [`BitmapData`] into a [`ByteSink`].
//!
//! [`StreamBuffer`]: crate::stream::StreamBuffer
//! [`ByteSink`]: crate::stream::ByteSink

mod bitmap;
mod codec;
mod dispatch;
mod format;
mod limits;

#[cfg(feature = "bmp")]
pub mod bmp;

pub use bitmap::*;
pub use codec::*;
pub use dispatch::*;
pub use format::*;
pub use limits::*;
