use serde::{Deserialize, Serialize};

use crate::error::IfsError;

/// Interleaved channel layout of an 8-bit pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channels {
    Rgb,
    Rgba,
}

impl Channels {
    /// Samples per pixel.
    pub fn count(self) -> usize {
        match self {
            Channels::Rgb => 3,
            Channels::Rgba => 4,
        }
    }

    pub fn from_count(count: u8) -> Option<Self> {
        match count {
            3 => Some(Channels::Rgb),
            4 => Some(Channels::Rgba),
            _ => None,
        }
    }
}

/// A fully decoded 8-bit image: `height × width × channels` samples in
/// row-major, channel-interleaved order.
///
/// The constructor guarantees the sample count matches the dimensions, so
/// every `PixelBuffer` in circulation is well formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: Channels,
    samples: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, channels: Channels, samples: Vec<u8>) -> Result<Self, IfsError> {
        let expected = sample_count(width, height, channels)?;
        if samples.len() != expected {
            return Err(IfsError::InvalidInput(format!(
                "{}x{} {:?} image needs {} samples, got {}",
                width,
                height,
                channels,
                expected,
                samples.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            samples,
        })
    }

    /// Build a buffer from nested rows of pixels, the shape image decoders
    /// usually hand out. Every row must have the same width and every pixel
    /// `channel_count` samples.
    pub fn from_rows<R, P>(rows: &[R], channel_count: u8) -> Result<Self, IfsError>
    where
        R: AsRef<[P]>,
        P: AsRef<[u8]>,
    {
        let channels = Channels::from_count(channel_count).ok_or_else(|| {
            IfsError::InvalidInput(format!("unsupported channel count {channel_count}, expected 3 or 4"))
        })?;
        let width = rows.first().map_or(0, |r| r.as_ref().len());
        let mut samples = Vec::with_capacity(rows.len() * width * channels.count());
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(IfsError::InvalidInput(format!(
                    "row {y} has {} pixels, row 0 has {width}",
                    row.len()
                )));
            }
            for (x, pixel) in row.iter().enumerate() {
                let pixel = pixel.as_ref();
                if pixel.len() != channels.count() {
                    return Err(IfsError::InvalidInput(format!(
                        "pixel ({x}, {y}) has {} samples, expected {}",
                        pixel.len(),
                        channels.count()
                    )));
                }
                samples.extend_from_slice(pixel);
            }
        }
        let width = u32::try_from(width).map_err(|_| IfsError::InvalidInput("image too wide".into()))?;
        let height = u32::try_from(rows.len()).map_err(|_| IfsError::InvalidInput("image too tall".into()))?;
        Self::new(width, height, channels, samples)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn channels(&self) -> Channels {
        self.channels
    }

    /// The flat sample stream in (row, column, channel) order.
    #[inline]
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<u8> {
        self.samples
    }

    /// Samples of the pixel at column `x`, row `y`, or `None` if out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let ch = self.channels.count();
        let start = (y as usize * self.width as usize + x as usize) * ch;
        Some(&self.samples[start..start + ch])
    }

    /// Iterate over scanlines, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.samples.chunks_exact(self.width as usize * self.channels.count())
    }
}

/// `width × height × channels`, rejecting empty images and sizes that do not
/// fit in memory.
pub(crate) fn sample_count(width: u32, height: u32, channels: Channels) -> Result<usize, IfsError> {
    if width == 0 || height == 0 {
        return Err(IfsError::InvalidInput(format!(
            "image dimensions must be non-zero, got {width}x{height}"
        )));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(channels.count()))
        .ok_or_else(|| IfsError::InvalidInput(format!("{width}x{height} image is too large")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_dimensions() {
        let err = PixelBuffer::new(0, 4, Channels::Rgb, Vec::new()).unwrap_err();
        assert!(matches!(err, IfsError::InvalidInput(_)));
    }

    #[test]
    fn rejects_sample_count_mismatch() {
        let err = PixelBuffer::new(2, 2, Channels::Rgba, vec![0; 12]).unwrap_err();
        assert!(err.to_string().contains("needs 16 samples"));
    }

    #[test]
    fn from_rows_flattens_row_major() {
        let img = PixelBuffer::from_rows(&[[[1u8, 2, 3], [4, 5, 6]], [[7, 8, 9], [10, 11, 12]]], 3).unwrap();
        assert_eq!((img.width(), img.height()), (2, 2));
        assert_eq!(img.samples(), &(1..=12).collect::<Vec<u8>>()[..]);
        assert_eq!(img.pixel(0, 1), Some(&[7u8, 8, 9][..]));
        assert_eq!(img.pixel(2, 0), None);
        assert_eq!(img.rows().count(), 2);
    }

    #[test]
    fn from_rows_rejects_unsupported_channels_and_ragged_rows() {
        let gray = vec![vec![vec![1u8, 2]]];
        assert!(matches!(PixelBuffer::from_rows(&gray, 2), Err(IfsError::InvalidInput(_))));

        let ragged = vec![vec![vec![0u8; 3]; 2], vec![vec![0u8; 3]; 1]];
        let err = PixelBuffer::from_rows(&ragged, 3).unwrap_err();
        assert!(err.to_string().contains("row 1"));

        let short_pixel = vec![vec![vec![0u8; 3], vec![0u8; 2]]];
        assert!(PixelBuffer::from_rows(&short_pixel, 3).is_err());
    }

    #[test]
    fn from_rows_rejects_empty_image() {
        let empty: Vec<Vec<[u8; 3]>> = Vec::new();
        assert!(matches!(PixelBuffer::from_rows(&empty, 3), Err(IfsError::InvalidInput(_))));
    }
}
