//! BlurHash decoding: convert a BlurHash string back into pixels.
//!
//! The decoder parses the base83 fields, rebuilds the component grid, and
//! evaluates the cosine sum for every output pixel. Destinations that expose
//! packed 4-byte pixels are written row by row; anything else goes through
//! [`PixelSink::set_rgba`].

use crate::base83;
use crate::color::{linear_to_srgb, srgb_to_linear};
use crate::encode_impl::{check_components, fill_cosine_table};
use crate::error::{BlurhashError, InvalidHashKind, Result};
use crate::pixels::{ImageBuf, PixelLayout, PixelSink};
use crate::scratch::ScratchBuf;

/// Contrast factor that reproduces the encoded image as-is.
pub const DEFAULT_PUNCH: f64 = 1.0;

/// Extract the number of X and Y components from a BlurHash string.
///
/// # Errors
///
/// Returns [`BlurhashError::InvalidHash`] if the hash is shorter than six
/// characters, declares component counts outside 1..=9, or has a length that
/// does not match its declared counts. A size flag outside the alphabet is
/// reported as [`BlurhashError::InvalidInput`].
///
/// # Examples
///
/// ```
/// use blurhash_codec::components;
/// assert_eq!(components("LEHV6nWB2yk8pyo0adR*.7kCMdnj").unwrap(), (4, 3));
/// ```
pub fn components(hash: &str) -> Result<(u32, u32)> {
    let actual = hash.len();
    if actual < 6 {
        return Err(InvalidHashKind::TooShort { actual }.into());
    }

    let size_flag = base83::decode_range(hash, 0..1)?;
    let x = (size_flag % 9 + 1) as u32;
    let y = (size_flag / 9 + 1) as u32;
    if check_components(x, y).is_err() {
        return Err(InvalidHashKind::ComponentsOutOfRange { x, y }.into());
    }

    let expected = 4 + 2 * (x * y) as usize;
    if actual != expected {
        return Err(InvalidHashKind::LengthMismatch { expected, actual }.into());
    }
    Ok((x, y))
}

fn decode_dc(value: u64) -> [f64; 3] {
    [
        srgb_to_linear(((value >> 16) & 255) as u8),
        srgb_to_linear(((value >> 8) & 255) as u8),
        srgb_to_linear((value & 255) as u8),
    ]
}

fn decode_ac(value: u64, maximum_value: f64) -> [f64; 3] {
    let quant = [value / (19 * 19), (value / 19) % 19, value % 19];
    // sign_pow(n, 2.0) == n * |n|
    quant.map(|q| {
        let n = (q as f64 - 9.0) / 9.0;
        n * n.abs() * maximum_value
    })
}

/// A reusable BlurHash decoder.
///
/// Cosine tables and the decoded component grid live in scratch buffers that
/// grow to the largest request seen and are reused afterwards. Use one
/// decoder per thread.
///
/// # Examples
///
/// ```
/// use blurhash_codec::Decoder;
///
/// let mut decoder = Decoder::new();
/// for size in [8, 32, 16] {
///     let img = decoder.decode("LEHV6nWB2yk8pyo0adR*.7kCMdnj", size, size, 1.0).unwrap();
///     assert_eq!(img.as_bytes().len(), (size * size * 4) as usize);
/// }
/// ```
#[derive(Debug, Default)]
pub struct Decoder {
    cos_x: ScratchBuf<f64>,
    cos_y: ScratchBuf<f64>,
    colors: ScratchBuf<[f64; 3]>,
}

impl Decoder {
    /// Create a decoder with empty scratch buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `hash` into a new `width` x `height` RGBA image.
    ///
    /// `punch` scales the AC components; values above 1.0 exaggerate contrast.
    ///
    /// # Errors
    ///
    /// Returns [`BlurhashError::InvalidDimensions`] if either dimension is
    /// zero, and otherwise the errors of [`components`] or any
    /// [`BlurhashError::InvalidInput`] found in the hash body.
    pub fn decode(&mut self, hash: &str, width: u32, height: u32, punch: f64) -> Result<ImageBuf> {
        if width == 0 || height == 0 {
            return Err(BlurhashError::InvalidDimensions { width, height });
        }
        let mut img = ImageBuf::new(width, height, PixelLayout::Rgba);
        self.decode_into(&mut img, hash, punch)?;
        Ok(img)
    }

    /// Decode `hash` into an existing destination, filling all of it.
    ///
    /// Alpha is always written fully opaque.
    ///
    /// # Errors
    ///
    /// Same as [`Decoder::decode`], with the dimensions taken from `dst`.
    pub fn decode_into<D: PixelSink + ?Sized>(
        &mut self,
        dst: &mut D,
        hash: &str,
        punch: f64,
    ) -> Result<()> {
        let (width, height) = dst.dimensions();
        if width == 0 || height == 0 {
            return Err(BlurhashError::InvalidDimensions { width, height });
        }

        let (components_x, components_y) = components(hash).map_err(|err| {
            tracing::debug!(%err, "rejected blurhash");
            err
        })?;

        let quant_max = base83::decode_range(hash, 1..2)?;
        let maximum_value = (quant_max as f64 + 1.0) / 166.0 * punch;

        let w = width as usize;
        let h = height as usize;
        let nx = components_x as usize;
        let ny = components_y as usize;

        let Self {
            cos_x,
            cos_y,
            colors,
        } = self;

        let colors = colors.grow_to(nx * ny);
        colors[0] = decode_dc(base83::decode_range(hash, 2..6)?);
        for (k, color) in colors.iter_mut().enumerate().skip(1) {
            let start = 4 + 2 * k;
            *color = decode_ac(base83::decode_range(hash, start..start + 2)?, maximum_value);
        }

        let cos_x = cos_x.grow_to(nx * w);
        fill_cosine_table(cos_x, w);
        let cos_y = cos_y.grow_to(ny * h);
        fill_cosine_table(cos_y, h);

        let cos_x: &[f64] = cos_x;
        let cos_y: &[f64] = cos_y;
        let colors: &[[f64; 3]] = colors;
        let pixel = |x: usize, y: usize| -> [u8; 4] {
            let mut rgb = [0.0f64; 3];
            for (j, color_row) in colors.chunks_exact(nx).enumerate() {
                let cy = cos_y[j * h + y];
                for (i, color) in color_row.iter().enumerate() {
                    let basis = cos_x[i * w + x] * cy;
                    rgb[0] += color[0] * basis;
                    rgb[1] += color[1] * basis;
                    rgb[2] += color[2] * basis;
                }
            }
            [
                linear_to_srgb(rgb[0]),
                linear_to_srgb(rgb[1]),
                linear_to_srgb(rgb[2]),
                255,
            ]
        };

        if let Some(packed) = dst.packed_mut() {
            if packed.covers(w, h) {
                let order = packed.order;
                let stride = packed.stride;
                for y in 0..h {
                    let row = &mut packed.data[y * stride..y * stride + w * 4];
                    for (x, px) in row.chunks_exact_mut(4).enumerate() {
                        px.copy_from_slice(&order.arrange(pixel(x, y)));
                    }
                }
                return Ok(());
            }
            tracing::trace!(
                width,
                height,
                stride = packed.stride,
                "packed destination too small, using per-pixel writes"
            );
        }

        for y in 0..h {
            for x in 0..w {
                dst.set_rgba(x as u32, y as u32, pixel(x, y));
            }
        }
        Ok(())
    }
}

/// Decode `hash` into a new RGBA image with a one-off [`Decoder`].
///
/// # Errors
///
/// See [`Decoder::decode`].
///
/// # Examples
///
/// ```
/// use blurhash_codec::decode;
/// let img = decode("LEHV6nWB2yk8pyo0adR*.7kCMdnj", 32, 32, 1.0).unwrap();
/// assert_eq!(img.as_bytes().len(), 32 * 32 * 4);
/// ```
pub fn decode(hash: &str, width: u32, height: u32, punch: f64) -> Result<ImageBuf> {
    Decoder::new().decode(hash, width, height, punch)
}

/// Decode `hash` into an existing destination with a one-off [`Decoder`].
///
/// # Errors
///
/// See [`Decoder::decode_into`].
pub fn decode_into<D: PixelSink + ?Sized>(dst: &mut D, hash: &str, punch: f64) -> Result<()> {
    Decoder::new().decode_into(dst, hash, punch)
}

/// Decode `hash` into tightly packed RGB bytes (3 bytes per pixel, row-major).
///
/// # Errors
///
/// See [`Decoder::decode`].
///
/// # Examples
///
/// ```
/// use blurhash_codec::decode_rgb;
/// let pixels = decode_rgb("LEHV6nWB2yk8pyo0adR*.7kCMdnj", 8, 8, 1.0).unwrap();
/// assert_eq!(pixels.len(), 8 * 8 * 3);
/// ```
pub fn decode_rgb(hash: &str, width: u32, height: u32, punch: f64) -> Result<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(BlurhashError::InvalidDimensions { width, height });
    }
    let mut img = ImageBuf::new(width, height, PixelLayout::Rgb);
    Decoder::new().decode_into(&mut img, hash, punch)?;
    Ok(img.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode_impl;
    use crate::pixels::{PackedPixelsMut, PixelSource};

    const KNOWN_HASH: &str = "LEHV6nWB2yk8pyo0adR*.7kCMdnj";

    /// A destination that only supports per-pixel writes.
    struct SlowSink {
        width: u32,
        pixels: Vec<[u8; 4]>,
    }

    impl PixelSink for SlowSink {
        fn dimensions(&self) -> (u32, u32) {
            (self.width, self.pixels.len() as u32 / self.width)
        }

        fn set_rgba(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
            self.pixels[(y * self.width + x) as usize] = rgba;
        }
    }

    /// Advertises a packed buffer that is too short to hold the image.
    struct LyingSink {
        inner: SlowSink,
        bogus: Vec<u8>,
    }

    impl PixelSink for LyingSink {
        fn dimensions(&self) -> (u32, u32) {
            self.inner.dimensions()
        }

        fn set_rgba(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
            self.inner.set_rgba(x, y, rgba);
        }

        fn packed_mut(&mut self) -> Option<PackedPixelsMut<'_>> {
            Some(PackedPixelsMut {
                data: &mut self.bogus,
                stride: 4,
                order: crate::pixels::ChannelOrder::Rgba,
            })
        }
    }

    #[test]
    fn test_components_extraction() {
        assert_eq!(components(KNOWN_HASH).unwrap(), (4, 3));
    }

    #[test]
    fn test_components_too_short() {
        for hash in ["", "A", "ABCDE"] {
            assert_eq!(
                components(hash),
                Err(BlurhashError::InvalidHash(InvalidHashKind::TooShort {
                    actual: hash.len()
                }))
            );
        }
    }

    #[test]
    fn test_components_invalid_size_flag_char() {
        assert_eq!(
            components("&BCDEF"),
            Err(BlurhashError::InvalidInput {
                character: '&',
                index: 0
            })
        );
    }

    #[test]
    fn test_components_length_mismatch() {
        // '9' declares 1x2 components, which needs 8 characters.
        assert_eq!(
            components("900000"),
            Err(BlurhashError::InvalidHash(InvalidHashKind::LengthMismatch {
                expected: 8,
                actual: 6
            }))
        );
        assert_eq!(
            components("00000000"),
            Err(BlurhashError::InvalidHash(InvalidHashKind::LengthMismatch {
                expected: 6,
                actual: 8
            }))
        );
    }

    #[test]
    fn test_components_out_of_range() {
        // '}' is 81: x = 1, y = 10.
        assert_eq!(
            components("}00000000000000000000000"),
            Err(BlurhashError::InvalidHash(
                InvalidHashKind::ComponentsOutOfRange { x: 1, y: 10 }
            ))
        );
    }

    #[test]
    fn test_decode_output_size() {
        let img = decode(KNOWN_HASH, 32, 24, DEFAULT_PUNCH).unwrap();
        assert_eq!((img.width(), img.height()), (32, 24));
        assert_eq!(img.as_bytes().len(), 32 * 24 * 4);
        assert!(img.as_bytes().chunks(4).all(|px| px[3] == 255));
    }

    #[test]
    fn test_decode_invalid_dimensions() {
        for (w, h) in [(0, 32), (32, 0), (0, 0)] {
            assert_eq!(
                decode(KNOWN_HASH, w, h, 1.0).unwrap_err(),
                BlurhashError::InvalidDimensions {
                    width: w,
                    height: h
                }
            );
        }
    }

    #[test]
    fn test_decode_invalid_char_in_body() {
        assert_eq!(
            decode("L0000000000000 0000000000000", 32, 32, 1.0).unwrap_err(),
            BlurhashError::InvalidInput {
                character: ' ',
                index: 14
            }
        );
    }

    #[test]
    fn test_decode_oversized_dc_is_masked() {
        // "X000" overflows 24 bits; the channels are masked rather than
        // indexing past the lookup table.
        let img = decode("10X00000", 4, 4, 1.0).unwrap();
        assert_eq!(img.as_bytes().len(), 4 * 4 * 4);
    }

    #[test]
    fn test_decode_dc_only_is_uniform() {
        let hash = encode_impl::encode_rgb(&[200u8; 2 * 2 * 3], 2, 2, 1, 1).unwrap();
        let img = decode(&hash, 5, 3, 1.0).unwrap();
        for px in img.as_bytes().chunks(4) {
            assert_eq!(px, &[200, 200, 200, 255]);
        }
    }

    #[test]
    fn test_decode_punch_changes_output() {
        let normal = decode(KNOWN_HASH, 8, 8, 1.0).unwrap();
        let punched = decode(KNOWN_HASH, 8, 8, 2.0).unwrap();
        assert_ne!(normal, punched);
    }

    #[test]
    fn test_zero_punch_flattens_to_dc() {
        let img = decode(KNOWN_HASH, 6, 6, 0.0).unwrap();
        let first = img.pixel(0, 0).unwrap().to_vec();
        for px in img.as_bytes().chunks(4) {
            assert_eq!(px, first.as_slice());
        }
    }

    #[test]
    fn test_fallback_matches_packed_path() {
        let packed = decode(KNOWN_HASH, 13, 7, 1.0).unwrap();
        let mut slow = SlowSink {
            width: 13,
            pixels: vec![[0; 4]; 13 * 7],
        };
        decode_into(&mut slow, KNOWN_HASH, 1.0).unwrap();
        let slow_bytes: Vec<u8> = slow.pixels.iter().flatten().copied().collect();
        assert_eq!(packed.as_bytes(), slow_bytes.as_slice());
    }

    #[test]
    fn test_bgra_destination() {
        let rgba = decode(KNOWN_HASH, 6, 4, 1.0).unwrap();
        let mut bgra = ImageBuf::new(6, 4, PixelLayout::Bgra);
        decode_into(&mut bgra, KNOWN_HASH, 1.0).unwrap();
        for y in 0..4 {
            for x in 0..6 {
                assert_eq!(rgba.rgb(x, y), bgra.rgb(x, y));
            }
        }
    }

    #[test]
    fn test_short_packed_buffer_falls_back() {
        let mut sink = LyingSink {
            inner: SlowSink {
                width: 4,
                pixels: vec![[0; 4]; 16],
            },
            bogus: vec![0; 8],
        };
        decode_into(&mut sink, KNOWN_HASH, 1.0).unwrap();
        let expected = decode(KNOWN_HASH, 4, 4, 1.0).unwrap();
        let got: Vec<u8> = sink.inner.pixels.iter().flatten().copied().collect();
        assert_eq!(expected.as_bytes(), got.as_slice());
        assert!(sink.bogus.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_decode_rgb_matches_rgba() {
        let rgb = decode_rgb(KNOWN_HASH, 5, 5, 1.0).unwrap();
        let rgba = decode(KNOWN_HASH, 5, 5, 1.0).unwrap();
        let stripped: Vec<u8> = rgba
            .as_bytes()
            .chunks(4)
            .flat_map(|px| px[..3].iter().copied())
            .collect();
        assert_eq!(rgb, stripped);
    }

    #[test]
    fn test_decoder_reuse_matches_fresh() {
        let hashes = [
            KNOWN_HASH,
            "LFE.@D9F01_2%L%MIVD*9Goe-;WB",
            "KJG8_@Dgx]_4V?xuyE%NRj",
            "00TSUA",
        ];
        let mut decoder = Decoder::new();
        for _ in 0..3 {
            for hash in hashes {
                for (w, h) in [(32, 32), (3, 9), (17, 4)] {
                    assert_eq!(
                        decoder.decode(hash, w, h, 1.0).unwrap(),
                        decode(hash, w, h, 1.0).unwrap(),
                        "{hash} at {w}x{h}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_decode_ac_extremes() {
        let lo = decode_ac(0, 1.0);
        assert_eq!(lo, [-1.0, -1.0, -1.0]);
        let mid = decode_ac(9 * 361 + 9 * 19 + 9, 1.0);
        assert_eq!(mid, [0.0, 0.0, 0.0]);
        let hi = decode_ac(18 * 361 + 18 * 19 + 18, 0.5);
        assert_eq!(hi, [0.5, 0.5, 0.5]);
    }
}
