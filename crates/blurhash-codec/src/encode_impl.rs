//! BlurHash encoding: convert an image into a compact BlurHash string.
//!
//! The encoder projects the image onto a small grid of cosine basis
//! functions and quantizes the resulting components into base83 digits.
//! The projection is separable: every row is first reduced against the
//! horizontal cosines, and the row sums are then weighted by the vertical
//! cosines, so only one row of linearised pixels is held at a time.

use std::f64::consts::PI;

use crate::base83;
use crate::color::{linear_to_srgb, sign_pow, srgb_to_linear};
use crate::error::{BlurhashError, Result};
use crate::pixels::{ImageView, PixelLayout, PixelSource};
use crate::scratch::ScratchBuf;

/// Smallest component count per axis.
pub const MIN_COMPONENTS: u32 = 1;
/// Largest component count per axis.
pub const MAX_COMPONENTS: u32 = 9;

/// Fill `table` with `cos(PI * c * p / len)` laid out as `table[c * len + p]`.
pub(crate) fn fill_cosine_table(table: &mut [f64], len: usize) {
    let lenf = len as f64;
    for (c, row) in table.chunks_exact_mut(len).enumerate() {
        for (p, slot) in row.iter_mut().enumerate() {
            *slot = (PI * c as f64 * p as f64 / lenf).cos();
        }
    }
}

pub(crate) fn check_components(components_x: u32, components_y: u32) -> Result<()> {
    let range = MIN_COMPONENTS..=MAX_COMPONENTS;
    if range.contains(&components_x) && range.contains(&components_y) {
        Ok(())
    } else {
        Err(BlurhashError::InvalidComponents {
            x: components_x,
            y: components_y,
        })
    }
}

/// A reusable BlurHash encoder.
///
/// The encoder keeps its cosine tables and accumulators between calls and
/// only reallocates when a request needs more room than any before it. It is
/// meant for sequential reuse by one caller; give each worker its own.
///
/// # Examples
///
/// ```
/// use blurhash_codec::Encoder;
/// use blurhash_codec::pixels::{ImageBuf, PixelLayout};
///
/// let img = ImageBuf::new(16, 16, PixelLayout::Rgb);
/// let mut encoder = Encoder::new();
/// let hash = encoder.encode(4, 3, &img).unwrap();
/// assert_eq!(hash.len(), 4 + 2 * 4 * 3);
/// ```
#[derive(Debug, Default)]
pub struct Encoder {
    cos_x: ScratchBuf<f64>,
    cos_y: ScratchBuf<f64>,
    row: ScratchBuf<[f64; 3]>,
    row_sums: ScratchBuf<[f64; 3]>,
    factors: ScratchBuf<[f64; 3]>,
}

impl Encoder {
    /// Create an encoder with empty scratch buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode `image` with `components_x` by `components_y` components.
    ///
    /// # Errors
    ///
    /// Returns [`BlurhashError::InvalidComponents`] if either count is
    /// outside 1..=9 and [`BlurhashError::InvalidDimensions`] if the image
    /// is empty.
    pub fn encode<S: PixelSource + ?Sized>(
        &mut self,
        components_x: u32,
        components_y: u32,
        image: &S,
    ) -> Result<String> {
        check_components(components_x, components_y)?;

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(BlurhashError::InvalidDimensions { width, height });
        }

        let w = width as usize;
        let h = height as usize;
        let nx = components_x as usize;
        let ny = components_y as usize;

        let Self {
            cos_x,
            cos_y,
            row,
            row_sums,
            factors,
        } = self;

        let cos_x = cos_x.grow_to(nx * w);
        fill_cosine_table(cos_x, w);
        let cos_y = cos_y.grow_to(ny * h);
        fill_cosine_table(cos_y, h);

        let row = row.grow_to(w);
        let row_sums = row_sums.grow_to(nx);
        let factors = factors.grow_to(nx * ny);
        factors.fill([0.0; 3]);

        for y in 0..h {
            for (x, px) in row.iter_mut().enumerate() {
                let [r, g, b] = image.rgb(x as u32, y as u32);
                *px = [srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b)];
            }

            for (sum, cos_row) in row_sums.iter_mut().zip(cos_x.chunks_exact(w)) {
                let mut acc = [0.0f64; 3];
                for (px, &c) in row.iter().zip(cos_row) {
                    acc[0] += c * px[0];
                    acc[1] += c * px[1];
                    acc[2] += c * px[2];
                }
                *sum = acc;
            }

            for (j, factor_row) in factors.chunks_exact_mut(nx).enumerate() {
                let cy = cos_y[j * h + y];
                for (factor, sum) in factor_row.iter_mut().zip(row_sums.iter()) {
                    factor[0] += cy * sum[0];
                    factor[1] += cy * sum[1];
                    factor[2] += cy * sum[2];
                }
            }
        }

        let scale = 1.0 / (w as f64 * h as f64);
        for (k, factor) in factors.iter_mut().enumerate() {
            let normalisation = if k == 0 { 1.0 } else { 2.0 };
            for channel in factor.iter_mut() {
                *channel *= normalisation * scale;
            }
        }

        let hash = assemble(components_x, components_y, factors);
        tracing::trace!(
            width,
            height,
            components_x,
            components_y,
            hash = %hash,
            "encoded blurhash"
        );
        Ok(hash)
    }
}

/// Quantize the computed components into the hash string.
fn assemble(components_x: u32, components_y: u32, factors: &[[f64; 3]]) -> String {
    let mut hash = String::with_capacity(4 + 2 * factors.len());

    let size_flag = (components_x - 1) + (components_y - 1) * 9;
    base83::encode_into(&mut hash, size_flag as u64, 1);

    let (dc, ac) = match factors.split_first() {
        Some(split) => split,
        None => return hash,
    };

    let maximum_value = if ac.is_empty() {
        base83::encode_into(&mut hash, 0, 1);
        1.0
    } else {
        let actual_max = ac
            .iter()
            .flat_map(|c| c.iter())
            .fold(0.0f64, |max, v| max.max(v.abs()));
        let quant_max = (actual_max * 166.0 - 0.5).floor().clamp(0.0, 82.0) as u64;
        base83::encode_into(&mut hash, quant_max, 1);
        (quant_max as f64 + 1.0) / 166.0
    };

    base83::encode_into(&mut hash, encode_dc(dc), 4);
    for component in ac {
        base83::encode_into(&mut hash, encode_ac(component, maximum_value), 2);
    }
    hash
}

fn encode_dc(&[r, g, b]: &[f64; 3]) -> u64 {
    ((linear_to_srgb(r) as u64) << 16) | ((linear_to_srgb(g) as u64) << 8) | linear_to_srgb(b) as u64
}

fn encode_ac(component: &[f64; 3], maximum_value: f64) -> u64 {
    let [r, g, b] = component.map(|c| {
        (sign_pow(c / maximum_value, 0.5) * 9.0 + 9.5)
            .floor()
            .clamp(0.0, 18.0) as u64
    });
    let value = r * 19 * 19 + g * 19 + b;
    debug_assert!(value < 83 * 83);
    value
}

/// Encode `image` into a BlurHash string with a one-off [`Encoder`].
///
/// # Errors
///
/// See [`Encoder::encode`].
///
/// # Examples
///
/// ```
/// use blurhash_codec::encode;
/// use blurhash_codec::pixels::{ImageView, PixelLayout};
///
/// // A 2x2 red image
/// let pixels = [255, 0, 0, 255, 0, 0, 255, 0, 0, 255, 0, 0];
/// let view = ImageView::new(&pixels, 2, 2, PixelLayout::Rgb).unwrap();
/// let hash = encode(4, 3, &view).unwrap();
/// assert_eq!(hash.len(), 28);
/// ```
pub fn encode<S: PixelSource + ?Sized>(
    components_x: u32,
    components_y: u32,
    image: &S,
) -> Result<String> {
    Encoder::new().encode(components_x, components_y, image)
}

/// Encode tightly packed RGB bytes (3 bytes per pixel, row-major).
///
/// # Errors
///
/// Returns [`BlurhashError::InvalidBuffer`] if `pixels` is not exactly
/// `width * height * 3` bytes long, plus everything [`Encoder::encode`] returns.
///
/// # Examples
///
/// ```
/// use blurhash_codec::encode_rgb;
/// let pixels = vec![128u8; 4 * 4 * 3];
/// let hash = encode_rgb(&pixels, 4, 4, 1, 1).unwrap();
/// assert_eq!(hash.len(), 6);
/// ```
pub fn encode_rgb(
    pixels: &[u8],
    width: u32,
    height: u32,
    components_x: u32,
    components_y: u32,
) -> Result<String> {
    let view = ImageView::new(pixels, width, height, PixelLayout::Rgb)?;
    let expected = width as usize * height as usize * 3;
    if pixels.len() != expected {
        return Err(BlurhashError::InvalidBuffer {
            expected,
            actual: pixels.len(),
        });
    }
    encode(components_x, components_y, &view)
}
