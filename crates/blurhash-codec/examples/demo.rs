//! BlurHash Demo - Encode and decode example
//!
//! Run with: cargo run -p blurhash-codec --example demo

use blurhash_codec::pixels::{ImageBuf, PixelLayout};
use blurhash_codec::{components, Decoder, Encoder, DEFAULT_PUNCH};

fn main() {
    println!("=== BlurHash Demo ===\n");

    // Top-left: dark, right edge: red, bottom edge: green, blue constant.
    let (width, height) = (64u32, 48u32);
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.push((x * 255 / (width - 1)) as u8);
            pixels.push((y * 255 / (height - 1)) as u8);
            pixels.push(128);
        }
    }
    let image = ImageBuf::from_raw(width, height, PixelLayout::Rgb, pixels)
        .expect("buffer matches dimensions");
    println!("1. Created a {width}x{height} gradient image");

    let mut encoder = Encoder::new();
    let hash = encoder.encode(4, 3, &image).expect("Failed to encode");
    println!("2. Encoded to BlurHash: {hash} ({} characters)", hash.len());

    // The same encoder can hash a window of the image without copying it.
    let window = image.view().sub_view(16, 12, 32, 24).expect("window fits");
    let window_hash = encoder.encode(3, 3, &window).expect("Failed to encode");
    println!("   Centre 32x24 window: {window_hash}\n");

    let (cx, cy) = components(&hash).expect("Failed to get components");
    println!("3. Extracted components from hash: {cx}x{cy}\n");

    let mut decoder = Decoder::new();
    for punch in [DEFAULT_PUNCH, 2.0] {
        let decoded = decoder
            .decode(&hash, 8, 8, punch)
            .expect("Failed to decode");
        let first = decoded.pixel(0, 0).expect("in bounds");
        let last = decoded.pixel(7, 7).expect("in bounds");
        println!(
            "4. Decoded to 8x8 with punch {punch}: first {:?}, last {:?}",
            &first[..3],
            &last[..3]
        );
    }

    println!("\n=== Demo Complete ===");
}
