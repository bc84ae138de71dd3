use crate::error::{LomoError, LomoResult};

const PIXEL_STRIDE: usize = 4;

/// A CPU pixel surface: flat straight-alpha RGBA8, row-major.
///
/// The buffer length is always exactly `width * height * 4`. A surface with a
/// zero dimension is *empty*; effects treat it as a no-op.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Surface {
    /// Creates a transparent surface of the given dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width as usize) * (height as usize) * PIXEL_STRIDE;
        Self {
            width,
            height,
            data: vec![0u8; len],
        }
    }

    /// Wraps an existing RGBA8 buffer, validating its length.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> LomoResult<Self> {
        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(PIXEL_STRIDE))
            .ok_or_else(|| LomoError::validation("surface buffer size overflow"))?;
        if data.len() != expected_len {
            return Err(LomoError::validation(format!(
                "surface data must be width*height*4 bytes (expected {expected_len}, got {})",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// True when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consumes the surface, returning the raw buffer.
    pub fn into_rgba8(self) -> Vec<u8> {
        self.data
    }

    fn offset_of(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(((y as usize) * (self.width as usize) + (x as usize)) * PIXEL_STRIDE)
    }

    /// Reads one pixel; `None` out of range.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let i = self.offset_of(x, y)?;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Writes one pixel; out-of-range coordinates are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if let Some(i) = self.offset_of(x, y) {
            self.data[i..i + PIXEL_STRIDE].copy_from_slice(&rgba);
        }
    }

    /// Fills the whole surface with one color.
    pub fn fill(&mut self, rgba: [u8; 4]) {
        for px in self.data.chunks_exact_mut(PIXEL_STRIDE) {
            px.copy_from_slice(&rgba);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_transparent_and_sized() {
        let s = Surface::new(3, 2);
        assert_eq!(s.width(), 3);
        assert_eq!(s.height(), 2);
        assert_eq!(s.data().len(), 3 * 2 * 4);
        assert!(s.data().iter().all(|&b| b == 0));
        assert!(!s.is_empty());
    }

    #[test]
    fn from_rgba8_rejects_wrong_length() {
        let err = Surface::from_rgba8(2, 2, vec![0u8; 15]).unwrap_err();
        assert!(err.to_string().contains("width*height*4"));
    }

    #[test]
    fn from_rgba8_rejects_dimension_overflow() {
        let err = Surface::from_rgba8(u32::MAX, u32::MAX, Vec::new()).unwrap_err();
        assert!(err.to_string().contains("overflow"));
    }

    #[test]
    fn zero_dimension_is_empty() {
        assert!(Surface::new(0, 4).is_empty());
        assert!(Surface::new(4, 0).is_empty());
        assert!(Surface::from_rgba8(0, 4, Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn pixel_roundtrip_and_bounds() {
        let mut s = Surface::new(2, 2);
        s.set_pixel(1, 0, [10, 20, 30, 40]);
        assert_eq!(s.pixel(1, 0), Some([10, 20, 30, 40]));
        assert_eq!(s.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(s.pixel(2, 0), None);
        assert_eq!(s.pixel(0, 2), None);
        s.set_pixel(5, 5, [1, 1, 1, 1]);
        assert_eq!(s.data().iter().map(|&b| b as u32).sum::<u32>(), 100);
    }

    #[test]
    fn fill_covers_every_pixel() {
        let mut s = Surface::new(3, 3);
        s.fill([7, 8, 9, 255]);
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(s.pixel(x, y), Some([7, 8, 9, 255]));
            }
        }
    }
}
