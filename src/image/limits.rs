// MIT/Apache2 License

use std::fmt;

/// Caps on what a decode may allocate. Every field is optional; `None` means unlimited.
///
/// Codecs check the parsed header against these before any pixel memory is reserved.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResourceLimits {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    /// Maximum total pixels (width times height).
    pub max_pixels: Option<u64>,
    /// Maximum bytes for the decoded pixel buffer.
    pub max_memory_bytes: Option<u64>,
}

impl ResourceLimits {
    /// No limits at all.
    #[inline]
    pub fn none() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_max_width(mut self, width: u32) -> Self {
        self.max_width = Some(width);
        self
    }

    #[inline]
    pub fn with_max_height(mut self, height: u32) -> Self {
        self.max_height = Some(height);
        self
    }

    #[inline]
    pub fn with_max_pixels(mut self, pixels: u64) -> Self {
        self.max_pixels = Some(pixels);
        self
    }

    #[inline]
    pub fn with_max_memory(mut self, bytes: u64) -> Self {
        self.max_memory_bytes = Some(bytes);
        self
    }

    /// Check an image's dimensions and the size of its pixel buffer.
    pub fn check(&self, width: u32, height: u32, bytes: u64) -> Result<(), LimitExceeded> {
        if let Some(max) = self.max_width {
            if width > max {
                return Err(LimitExceeded::Width { actual: width, max });
            }
        }
        if let Some(max) = self.max_height {
            if height > max {
                return Err(LimitExceeded::Height {
                    actual: height,
                    max,
                });
            }
        }
        if let Some(max) = self.max_pixels {
            let pixels = u64::from(width) * u64::from(height);
            if pixels > max {
                return Err(LimitExceeded::Pixels {
                    actual: pixels,
                    max,
                });
            }
        }
        if let Some(max) = self.max_memory_bytes {
            if bytes > max {
                return Err(LimitExceeded::Memory { actual: bytes, max });
            }
        }
        Ok(())
    }
}

/// Which limit rejected an image.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LimitExceeded {
    Width { actual: u32, max: u32 },
    Height { actual: u32, max: u32 },
    Pixels { actual: u64, max: u64 },
    Memory { actual: u64, max: u64 },
}

impl fmt::Display for LimitExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Width { actual, max } => write!(f, "width {} exceeds limit {}", actual, max),
            Self::Height { actual, max } => write!(f, "height {} exceeds limit {}", actual, max),
            Self::Pixels { actual, max } => {
                write!(f, "pixel count {} exceeds limit {}", actual, max)
            }
            Self::Memory { actual, max } => {
                write!(f, "pixel buffer of {} bytes exceeds limit {}", actual, max)
            }
        }
    }
}
