//! # blurhash-codec
//!
//! BlurHash encoding and decoding in pure Rust.
//!
//! [BlurHash](https://blurha.sh/) is a compact representation of a placeholder
//! for an image. This crate encodes any [`PixelSource`] into a hash string and
//! decodes a hash into any [`PixelSink`], using precomputed sRGB lookup tables
//! and reusable scratch buffers ([`Encoder`], [`Decoder`]) so repeated calls
//! do not reallocate.
//!
//! ## Quick Start
//!
//! ```
//! use blurhash_codec::{decode, encode_rgb};
//!
//! // Encode: image pixels -> BlurHash string
//! let pixels = vec![128u8; 4 * 4 * 3]; // 4x4 gray image
//! let hash = encode_rgb(&pixels, 4, 4, 4, 3).unwrap();
//!
//! // Decode: BlurHash string -> RGBA image
//! let decoded = decode(&hash, 32, 32, 1.0).unwrap();
//! assert_eq!(decoded.as_bytes().len(), 32 * 32 * 4);
//! ```
//!
//! ## Features
//!
//! - `image`: implements [`PixelSource`] and [`PixelSink`] for the `image`
//!   crate's `RgbImage` and `RgbaImage`, and [`PixelSource`] for
//!   `DynamicImage`.

pub mod base83;
pub mod color;
pub mod error;
pub mod pixels;
pub mod scratch;

mod decode_impl;
mod encode_impl;

// Re-export primary functions at crate root.
pub use color::{linear_to_srgb, sign_pow, srgb_to_linear};
pub use decode_impl::{components, decode, decode_into, decode_rgb, Decoder, DEFAULT_PUNCH};
pub use encode_impl::{encode, encode_rgb, Encoder, MAX_COMPONENTS, MIN_COMPONENTS};
pub use error::{BlurhashError, InvalidHashKind, Result};
pub use pixels::{ImageBuf, ImageView, ImageViewMut, PixelLayout, PixelSink, PixelSource};
