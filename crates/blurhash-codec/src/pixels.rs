//! Pixel buffer abstraction consumed by the encoder and produced by the decoder.
//!
//! The codec reads pixels through [`PixelSource`] and writes them through
//! [`PixelSink`]. Coordinates are always relative to the view's own origin,
//! so a rectangular window into a larger image behaves exactly like a
//! standalone image holding the same pixels.
//!
//! Sinks backed by packed 4-byte pixels can expose their bytes through
//! [`PixelSink::packed_mut`]; the decoder then writes rows directly instead
//! of going through [`PixelSink::set_rgba`] per pixel. Both paths produce the
//! same bytes.

use crate::error::{BlurhashError, Result};

/// Byte layout of a single pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    /// Red, green, blue.
    Rgb,
    /// Red, green, blue, alpha.
    Rgba,
    /// Blue, green, red, alpha.
    Bgra,
}

impl PixelLayout {
    /// Bytes per pixel.
    #[inline]
    pub const fn channels(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba | Self::Bgra => 4,
        }
    }

    /// Byte offsets of the red, green and blue samples within a pixel.
    #[inline]
    const fn rgb_offsets(self) -> [usize; 3] {
        match self {
            Self::Rgb | Self::Rgba => [0, 1, 2],
            Self::Bgra => [2, 1, 0],
        }
    }

    const fn channel_order(self) -> Option<ChannelOrder> {
        match self {
            Self::Rgb => None,
            Self::Rgba => Some(ChannelOrder::Rgba),
            Self::Bgra => Some(ChannelOrder::Bgra),
        }
    }
}

/// Channel order of a packed 4-byte pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelOrder {
    /// Red, green, blue, alpha.
    Rgba,
    /// Blue, green, red, alpha.
    Bgra,
}

impl ChannelOrder {
    /// Arrange an RGBA quadruple in this byte order.
    #[inline]
    pub const fn arrange(self, [r, g, b, a]: [u8; 4]) -> [u8; 4] {
        match self {
            Self::Rgba => [r, g, b, a],
            Self::Bgra => [b, g, r, a],
        }
    }
}

/// Direct access to a packed 4-byte-per-pixel destination.
///
/// `data[0]` is the first byte of the view's top-left pixel; row `y` starts
/// at `y * stride`.
#[derive(Debug)]
pub struct PackedPixelsMut<'a> {
    /// Pixel bytes, starting at the view origin.
    pub data: &'a mut [u8],
    /// Distance in bytes between the starts of consecutive rows.
    pub stride: usize,
    /// Byte order of each pixel.
    pub order: ChannelOrder,
}

impl PackedPixelsMut<'_> {
    /// Whether a `width` x `height` region fits inside `data`.
    pub fn covers(&self, width: usize, height: usize) -> bool {
        if width == 0 || height == 0 {
            return true;
        }
        let row = match width.checked_mul(4) {
            Some(row) if row <= self.stride => row,
            _ => return false,
        };
        (height - 1)
            .checked_mul(self.stride)
            .and_then(|v| v.checked_add(row))
            .is_some_and(|needed| needed <= self.data.len())
    }
}

/// Read access to a rectangle of 8-bit RGB(A) pixels.
pub trait PixelSource {
    /// Width and height in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// The red, green and blue samples at `(x, y)`; alpha is never read.
    ///
    /// Coordinates are relative to the view origin and within
    /// [`dimensions`](Self::dimensions).
    fn rgb(&self, x: u32, y: u32) -> [u8; 3];
}

/// Write access to a rectangle of 8-bit RGB(A) pixels.
pub trait PixelSink {
    /// Width and height in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Store one pixel; sinks without alpha drop the fourth sample.
    fn set_rgba(&mut self, x: u32, y: u32, rgba: [u8; 4]);

    /// Expose the underlying bytes when they are packed 4-byte pixels.
    fn packed_mut(&mut self) -> Option<PackedPixelsMut<'_>> {
        None
    }
}

impl<T: PixelSource + ?Sized> PixelSource for &T {
    fn dimensions(&self) -> (u32, u32) {
        (**self).dimensions()
    }

    fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        (**self).rgb(x, y)
    }
}

/// Width, height, stride and layout shared by all buffer types here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Geometry {
    width: u32,
    height: u32,
    stride: usize,
    layout: PixelLayout,
}

impl Geometry {
    fn new(width: u32, height: u32, stride: usize, layout: PixelLayout) -> Result<Self> {
        let row = (width as usize)
            .checked_mul(layout.channels())
            .ok_or(BlurhashError::InvalidDimensions { width, height })?;
        if height > 1 && stride < row {
            return Err(BlurhashError::InvalidBuffer {
                expected: row,
                actual: stride,
            });
        }
        Ok(Self {
            width,
            height,
            stride,
            layout,
        })
    }

    /// Bytes needed to hold every pixel of the rectangle.
    fn required_len(&self) -> Result<usize> {
        if self.width == 0 || self.height == 0 {
            return Ok(0);
        }
        let row = self.width as usize * self.layout.channels();
        (self.height as usize - 1)
            .checked_mul(self.stride)
            .and_then(|v| v.checked_add(row))
            .ok_or(BlurhashError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })
    }

    fn check(&self, data_len: usize) -> Result<()> {
        let expected = self.required_len()?;
        if data_len < expected {
            return Err(BlurhashError::InvalidBuffer {
                expected,
                actual: data_len,
            });
        }
        Ok(())
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.stride + x as usize * self.layout.channels()
    }

    /// Byte offset and geometry of a sub-rectangle, if it lies inside.
    fn sub(&self, x: u32, y: u32, width: u32, height: u32) -> Option<(usize, Geometry)> {
        let fits_x = x.checked_add(width).is_some_and(|end| end <= self.width);
        let fits_y = y.checked_add(height).is_some_and(|end| end <= self.height);
        if !(fits_x && fits_y) {
            return None;
        }
        // An empty rectangle at the far edge would start past the data.
        let start = if width == 0 || height == 0 {
            0
        } else {
            self.offset(x, y)
        };
        Some((
            start,
            Geometry {
                width,
                height,
                ..*self
            },
        ))
    }

    #[inline]
    fn read_rgb(&self, data: &[u8], x: u32, y: u32) -> [u8; 3] {
        let base = self.offset(x, y);
        let [r, g, b] = self.layout.rgb_offsets();
        [data[base + r], data[base + g], data[base + b]]
    }

    #[inline]
    fn write_rgba(&self, data: &mut [u8], x: u32, y: u32, [r, g, b, a]: [u8; 4]) {
        let base = self.offset(x, y);
        match self.layout {
            PixelLayout::Rgb => data[base..base + 3].copy_from_slice(&[r, g, b]),
            PixelLayout::Rgba => data[base..base + 4].copy_from_slice(&[r, g, b, a]),
            PixelLayout::Bgra => data[base..base + 4].copy_from_slice(&[b, g, r, a]),
        }
    }
}

/// An owned, row-major pixel buffer.
///
/// # Examples
///
/// ```
/// use blurhash_codec::pixels::{ImageBuf, PixelLayout};
///
/// let mut img = ImageBuf::new(4, 2, PixelLayout::Rgba);
/// assert_eq!(img.as_bytes().len(), 4 * 2 * 4);
/// let mut view = img.view_mut();
/// let window = view.sub_view_mut(1, 0, 2, 2).unwrap();
/// assert_eq!(window.origin(), (1, 0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuf {
    geometry: Geometry,
    data: Vec<u8>,
}

impl ImageBuf {
    /// Allocate a zero-filled buffer with tightly packed rows.
    pub fn new(width: u32, height: u32, layout: PixelLayout) -> Self {
        let stride = width as usize * layout.channels();
        Self {
            geometry: Geometry {
                width,
                height,
                stride,
                layout,
            },
            data: vec![0; stride * height as usize],
        }
    }

    /// Wrap tightly packed pixel bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BlurhashError::InvalidBuffer`] unless `data` holds exactly
    /// `width * height` pixels.
    pub fn from_raw(width: u32, height: u32, layout: PixelLayout, data: Vec<u8>) -> Result<Self> {
        let stride = (width as usize)
            .checked_mul(layout.channels())
            .ok_or(BlurhashError::InvalidDimensions { width, height })?;
        let geometry = Geometry::new(width, height, stride, layout)?;
        let expected = geometry.required_len()?;
        if data.len() != expected {
            return Err(BlurhashError::InvalidBuffer {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { geometry, data })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.geometry.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.geometry.height
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.geometry.stride
    }

    /// Pixel layout.
    pub fn layout(&self) -> PixelLayout {
        self.geometry.layout
    }

    /// The bytes of the pixel at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let base = self.geometry.offset(x, y);
        self.data.get(base..base + self.layout().channels())
    }

    /// All pixel bytes, row by row.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Give up ownership of the pixel bytes.
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Borrow the whole buffer as a read-only view.
    pub fn view(&self) -> ImageView<'_> {
        ImageView {
            data: &self.data,
            geometry: self.geometry,
            origin: (0, 0),
        }
    }

    /// Borrow the whole buffer as a writable view.
    pub fn view_mut(&mut self) -> ImageViewMut<'_> {
        ImageViewMut {
            data: &mut self.data,
            geometry: self.geometry,
            origin: (0, 0),
        }
    }
}

impl PixelSource for ImageBuf {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        self.geometry.read_rgb(&self.data, x, y)
    }
}

impl PixelSink for ImageBuf {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn set_rgba(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        self.geometry.write_rgba(&mut self.data, x, y, rgba);
    }

    fn packed_mut(&mut self) -> Option<PackedPixelsMut<'_>> {
        let order = self.geometry.layout.channel_order()?;
        Some(PackedPixelsMut {
            data: &mut self.data,
            stride: self.geometry.stride,
            order,
        })
    }
}

/// A borrowed read-only rectangle of pixels.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    data: &'a [u8],
    geometry: Geometry,
    origin: (u32, u32),
}

impl<'a> ImageView<'a> {
    /// View tightly packed pixel bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BlurhashError::InvalidBuffer`] if `data` is too short.
    pub fn new(data: &'a [u8], width: u32, height: u32, layout: PixelLayout) -> Result<Self> {
        let stride = (width as usize)
            .checked_mul(layout.channels())
            .ok_or(BlurhashError::InvalidDimensions { width, height })?;
        Self::with_stride(data, width, height, stride, layout)
    }

    /// View pixel bytes whose rows are `stride` bytes apart.
    ///
    /// # Errors
    ///
    /// Returns [`BlurhashError::InvalidBuffer`] if `stride` is shorter than a
    /// row or `data` is too short for the rectangle.
    pub fn with_stride(
        data: &'a [u8],
        width: u32,
        height: u32,
        stride: usize,
        layout: PixelLayout,
    ) -> Result<Self> {
        let geometry = Geometry::new(width, height, stride, layout)?;
        geometry.check(data.len())?;
        Ok(Self {
            data,
            geometry,
            origin: (0, 0),
        })
    }

    /// A sub-rectangle of this view, or `None` if it does not fit.
    pub fn sub_view(&self, x: u32, y: u32, width: u32, height: u32) -> Option<ImageView<'a>> {
        let (start, geometry) = self.geometry.sub(x, y, width, height)?;
        let data: &'a [u8] = self.data;
        Some(ImageView {
            data: &data[start..],
            geometry,
            origin: (self.origin.0 + x, self.origin.1 + y),
        })
    }

    /// Position of this view's top-left pixel in the buffer it was cut from.
    pub fn origin(&self) -> (u32, u32) {
        self.origin
    }

    /// Pixel layout.
    pub fn layout(&self) -> PixelLayout {
        self.geometry.layout
    }
}

impl PixelSource for ImageView<'_> {
    fn dimensions(&self) -> (u32, u32) {
        (self.geometry.width, self.geometry.height)
    }

    fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        self.geometry.read_rgb(self.data, x, y)
    }
}

/// A borrowed writable rectangle of pixels.
#[derive(Debug)]
pub struct ImageViewMut<'a> {
    data: &'a mut [u8],
    geometry: Geometry,
    origin: (u32, u32),
}

impl<'a> ImageViewMut<'a> {
    /// View tightly packed pixel bytes for writing.
    ///
    /// # Errors
    ///
    /// Returns [`BlurhashError::InvalidBuffer`] if `data` is too short.
    pub fn new(data: &'a mut [u8], width: u32, height: u32, layout: PixelLayout) -> Result<Self> {
        let stride = (width as usize)
            .checked_mul(layout.channels())
            .ok_or(BlurhashError::InvalidDimensions { width, height })?;
        Self::with_stride(data, width, height, stride, layout)
    }

    /// View pixel bytes whose rows are `stride` bytes apart for writing.
    ///
    /// # Errors
    ///
    /// Returns [`BlurhashError::InvalidBuffer`] if `stride` is shorter than a
    /// row or `data` is too short for the rectangle.
    pub fn with_stride(
        data: &'a mut [u8],
        width: u32,
        height: u32,
        stride: usize,
        layout: PixelLayout,
    ) -> Result<Self> {
        let geometry = Geometry::new(width, height, stride, layout)?;
        geometry.check(data.len())?;
        Ok(Self {
            data,
            geometry,
            origin: (0, 0),
        })
    }

    /// Reborrow a sub-rectangle for writing, or `None` if it does not fit.
    pub fn sub_view_mut(
        &mut self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Option<ImageViewMut<'_>> {
        let (start, geometry) = self.geometry.sub(x, y, width, height)?;
        Some(ImageViewMut {
            data: &mut self.data[start..],
            geometry,
            origin: (self.origin.0 + x, self.origin.1 + y),
        })
    }

    /// Turn this view into a sub-rectangle of itself, keeping the full borrow.
    pub fn into_sub_view(self, x: u32, y: u32, width: u32, height: u32) -> Option<ImageViewMut<'a>> {
        let (start, geometry) = self.geometry.sub(x, y, width, height)?;
        let data = self.data;
        Some(ImageViewMut {
            data: &mut data[start..],
            geometry,
            origin: (self.origin.0 + x, self.origin.1 + y),
        })
    }

    /// Position of this view's top-left pixel in the buffer it was cut from.
    pub fn origin(&self) -> (u32, u32) {
        self.origin
    }

    /// Pixel layout.
    pub fn layout(&self) -> PixelLayout {
        self.geometry.layout
    }
}

impl PixelSource for ImageViewMut<'_> {
    fn dimensions(&self) -> (u32, u32) {
        (self.geometry.width, self.geometry.height)
    }

    fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        self.geometry.read_rgb(self.data, x, y)
    }
}

impl PixelSink for ImageViewMut<'_> {
    fn dimensions(&self) -> (u32, u32) {
        (self.geometry.width, self.geometry.height)
    }

    fn set_rgba(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        self.geometry.write_rgba(self.data, x, y, rgba);
    }

    fn packed_mut(&mut self) -> Option<PackedPixelsMut<'_>> {
        let order = self.geometry.layout.channel_order()?;
        Some(PackedPixelsMut {
            data: &mut *self.data,
            stride: self.geometry.stride,
            order,
        })
    }
}

#[cfg(feature = "image")]
mod image_support {
    use image::{DynamicImage, GenericImageView, Rgb, RgbImage, Rgba, RgbaImage};

    use super::{ChannelOrder, PackedPixelsMut, PixelSink, PixelSource};

    impl PixelSource for RgbImage {
        fn dimensions(&self) -> (u32, u32) {
            (self.width(), self.height())
        }

        fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
            self.get_pixel(x, y).0
        }
    }

    impl PixelSource for RgbaImage {
        fn dimensions(&self) -> (u32, u32) {
            (self.width(), self.height())
        }

        fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
            let [r, g, b, _] = self.get_pixel(x, y).0;
            [r, g, b]
        }
    }

    impl PixelSource for DynamicImage {
        fn dimensions(&self) -> (u32, u32) {
            GenericImageView::dimensions(self)
        }

        fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
            let [r, g, b, _] = self.get_pixel(x, y).0;
            [r, g, b]
        }
    }

    impl PixelSink for RgbImage {
        fn dimensions(&self) -> (u32, u32) {
            (self.width(), self.height())
        }

        fn set_rgba(&mut self, x: u32, y: u32, [r, g, b, _]: [u8; 4]) {
            self.put_pixel(x, y, Rgb([r, g, b]));
        }
    }

    impl PixelSink for RgbaImage {
        fn dimensions(&self) -> (u32, u32) {
            (self.width(), self.height())
        }

        fn set_rgba(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
            self.put_pixel(x, y, Rgba(rgba));
        }

        fn packed_mut(&mut self) -> Option<PackedPixelsMut<'_>> {
            let stride = self.width() as usize * 4;
            Some(PackedPixelsMut {
                data: &mut **self,
                stride,
                order: ChannelOrder::Rgba,
            })
        }
    }
}
