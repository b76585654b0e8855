use image::RgbaImage;

/// Bytes per RGBA8 pixel.
pub const CHANNELS: usize = 4;

/// Decoded RGBA8 pixel data for one texture, stored row-major.
///
/// `ImageBuffer::default()` is the "never loaded" buffer: zero-sized with no
/// pixels. Anything built through [`ImageBuffer::from_raw`] or from an
/// `RgbaImage` upholds `pixels.len() == width * height * 4`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl ImageBuffer {
    /// Create a buffer of the given size with every pixel set to `color`.
    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * CHANNELS);
        for _ in 0..count {
            pixels.extend_from_slice(&color);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Wrap raw RGBA8 bytes. Returns `None` if the length does not match.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != width as usize * height as usize * CHANNELS {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Raw RGBA8 bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Whether the buffer holds decoded pixel data.
    pub fn is_loaded(&self) -> bool {
        !self.pixels.is_empty()
    }

    /// Bytes of row `y`, or `None` when out of range.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let stride = self.width as usize * CHANNELS;
        let start = y as usize * stride;
        self.pixels.get(start..start + stride)
    }

    /// The pixel at `(x, y)`, or `None` when out of range.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width {
            return None;
        }
        let row = self.row(y)?;
        let i = x as usize * CHANNELS;
        Some([row[i], row[i + 1], row[i + 2], row[i + 3]])
    }

    /// Convert into an `image` crate buffer for encoding.
    pub fn into_rgba_image(self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels)
    }
}

impl From<RgbaImage> for ImageBuffer {
    fn from(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unloaded() {
        let buf = ImageBuffer::default();
        assert!(!buf.is_loaded());
        assert_eq!(buf.dimensions(), (0, 0));
        assert!(buf.row(0).is_none());
    }

    #[test]
    fn from_raw_checks_length() {
        assert!(ImageBuffer::from_raw(2, 2, vec![0; 16]).is_some());
        assert!(ImageBuffer::from_raw(2, 2, vec![0; 15]).is_none());
        assert!(ImageBuffer::from_raw(3, 1, vec![0; 16]).is_none());
    }

    #[test]
    fn filled_and_pixel_access() {
        let buf = ImageBuffer::filled(3, 2, [1, 2, 3, 4]);
        assert!(buf.is_loaded());
        assert_eq!(buf.pixels().len(), 3 * 2 * 4);
        assert_eq!(buf.pixel(2, 1), Some([1, 2, 3, 4]));
        assert_eq!(buf.pixel(3, 0), None);
        assert_eq!(buf.pixel(0, 2), None);
        assert_eq!(buf.row(1).map(<[u8]>::len), Some(12));
    }

    #[test]
    fn rgba_image_conversion() {
        let img = RgbaImage::from_fn(4, 2, |x, y| image::Rgba([x as u8, y as u8, 0, 255]));
        let buf = ImageBuffer::from(img);
        assert_eq!(buf.dimensions(), (4, 2));
        assert_eq!(buf.pixel(3, 1), Some([3, 1, 0, 255]));

        let back = buf.into_rgba_image().expect("valid buffer");
        assert_eq!(back.get_pixel(3, 1), &image::Rgba([3, 1, 0, 255]));
    }
}
