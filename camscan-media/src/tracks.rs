//! Video frames and the snapshot primitive

use crate::error::{MediaError, MediaResult};

/// Bytes per RGBA8 pixel
pub const RGBA_BYTES_PER_PIXEL: usize = 4;

/// Still frame pulled from a capture handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// RGBA8 pixel data, row-major
    pub data: Vec<u8>,
    /// Capture time in milliseconds since the Unix epoch
    pub timestamp: u64,
}

impl VideoFrame {
    /// Wrap RGBA8 data, checking its length against the dimensions
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> MediaResult<Self> {
        let expected = width as usize * height as usize * RGBA_BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(MediaError::InvalidFrameData {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            data,
            timestamp: now_millis(),
        })
    }

    /// Number of pixels
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// RGBA value at `(x, y)`
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * RGBA_BYTES_PER_PIXEL;
        let px = self.data.get(offset..offset + RGBA_BYTES_PER_PIXEL)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// A capture handle that can hand out the frame currently on screen
pub trait FrameSource {
    /// Copy the current frame at the delivered resolution
    fn grab_frame(&mut self) -> MediaResult<VideoFrame>;
}

pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_length_checked() {
        let err = VideoFrame::new(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(
            err,
            MediaError::InvalidFrameData {
                expected: 16,
                actual: 15
            }
        ));
    }

    #[test]
    fn test_pixel_lookup() {
        let mut data = vec![0u8; 2 * 2 * 4];
        data[12..16].copy_from_slice(&[1, 2, 3, 255]);
        let frame = VideoFrame::new(2, 2, data).unwrap();
        assert_eq!(frame.pixel_count(), 4);
        assert_eq!(frame.pixel(1, 1), Some([1, 2, 3, 255]));
        assert_eq!(frame.pixel(2, 0), None);
    }
}
