//! Color space conversion between sRGB bytes and linear light.
//!
//! Both directions go through lookup tables that are built once per process
//! on first use (or eagerly through [`init`]) and never mutated afterwards.
//! The sRGB-to-linear table is exact over its 256-entry domain. The
//! linear-to-sRGB table quantizes linear light to [`LINEAR_TO_SRGB_LUT_SIZE`]
//! steps, which is fine enough that every byte survives a round trip through
//! linear space unchanged.

use std::sync::OnceLock;

/// Number of entries in the linear-to-sRGB lookup table. 4096 steps keep the
/// quantization error below half an output step everywhere on the curve.
pub const LINEAR_TO_SRGB_LUT_SIZE: usize = 4096;

struct ColorTables {
    to_linear: [f64; 256],
    to_srgb: [u8; LINEAR_TO_SRGB_LUT_SIZE],
}

static TABLES: OnceLock<ColorTables> = OnceLock::new();

fn srgb_to_linear_exact(value: u8) -> f64 {
    let v = value as f64 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb_exact(linear: f64) -> u8 {
    let v = linear.clamp(0.0, 1.0);
    let srgb = if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    };
    (srgb * 255.0 + 0.5).clamp(0.0, 255.0) as u8
}

fn tables() -> &'static ColorTables {
    TABLES.get_or_init(|| {
        let mut to_linear = [0.0f64; 256];
        for (i, slot) in to_linear.iter_mut().enumerate() {
            *slot = srgb_to_linear_exact(i as u8);
        }

        let mut to_srgb = [0u8; LINEAR_TO_SRGB_LUT_SIZE];
        let steps = (LINEAR_TO_SRGB_LUT_SIZE - 1) as f64;
        for (i, slot) in to_srgb.iter_mut().enumerate() {
            *slot = linear_to_srgb_exact(i as f64 / steps);
        }

        tracing::trace!(
            entries = LINEAR_TO_SRGB_LUT_SIZE,
            "built sRGB/linear lookup tables"
        );
        ColorTables { to_linear, to_srgb }
    })
}

/// Build the lookup tables now instead of on first conversion.
///
/// Calling this is optional and idempotent; it only moves the one-time cost
/// out of the first encode or decode.
pub fn init() {
    tables();
}

/// Convert an sRGB byte value (0..=255) to linear RGB (0.0..=1.0).
///
/// # Examples
///
/// ```
/// use blurhash_codec::color::srgb_to_linear;
/// assert_eq!(srgb_to_linear(0), 0.0);
/// assert!((srgb_to_linear(255) - 1.0).abs() < 1e-12);
/// ```
#[inline]
pub fn srgb_to_linear(value: u8) -> f64 {
    tables().to_linear[value as usize]
}

/// Convert a linear RGB value to an sRGB byte value (0..=255).
///
/// Values outside \[0.0, 1.0\] are clamped; NaN maps to 0.
///
/// # Examples
///
/// ```
/// use blurhash_codec::color::linear_to_srgb;
/// assert_eq!(linear_to_srgb(0.0), 0);
/// assert_eq!(linear_to_srgb(1.0), 255);
/// assert_eq!(linear_to_srgb(7.5), 255);
/// ```
#[inline]
pub fn linear_to_srgb(value: f64) -> u8 {
    let clamped = if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    };
    let index = (clamped * (LINEAR_TO_SRGB_LUT_SIZE - 1) as f64 + 0.5) as usize;
    tables().to_srgb[index.min(LINEAR_TO_SRGB_LUT_SIZE - 1)]
}

/// Compute `sign(value) * |value|^exp`.
///
/// # Examples
///
/// ```
/// use blurhash_codec::color::sign_pow;
/// assert!((sign_pow(4.0, 0.5) - 2.0).abs() < 1e-10);
/// assert!((sign_pow(-4.0, 0.5) + 2.0).abs() < 1e-10);
/// ```
#[inline]
pub fn sign_pow(value: f64, exp: f64) -> f64 {
    value.abs().powf(exp).copysign(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srgb_to_linear_boundary() {
        assert_eq!(srgb_to_linear(0), 0.0);
        assert!((srgb_to_linear(255) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_srgb_to_linear_known_values() {
        let val = srgb_to_linear(128);
        assert!((val - 0.215_860_5).abs() < 1e-6, "got {val}");
        // Linear segment of the curve.
        assert!((srgb_to_linear(10) - 10.0 / 255.0 / 12.92).abs() < 1e-12);
    }

    #[test]
    fn test_linear_to_srgb_clamp() {
        assert_eq!(linear_to_srgb(-0.5), 0);
        assert_eq!(linear_to_srgb(1.5), 255);
        assert_eq!(linear_to_srgb(f64::NAN), 0);
        assert_eq!(linear_to_srgb(f64::INFINITY), 255);
        assert_eq!(linear_to_srgb(f64::NEG_INFINITY), 0);
    }

    #[test]
    fn test_roundtrip_srgb_exact() {
        for i in 0..=255u8 {
            let back = linear_to_srgb(srgb_to_linear(i));
            assert_eq!(back, i, "roundtrip failed for {i}");
        }
    }

    #[test]
    fn test_lut_matches_closed_form_within_one() {
        for i in 0..=1000 {
            let v = i as f64 / 1000.0;
            let lut = linear_to_srgb(v) as i16;
            let exact = linear_to_srgb_exact(v) as i16;
            assert!((lut - exact).abs() <= 1, "v={v}: lut {lut}, exact {exact}");
        }
    }

    #[test]
    fn test_linear_to_srgb_threshold() {
        assert!(linear_to_srgb(0.003) < linear_to_srgb(0.004));
    }

    #[test]
    fn test_srgb_to_linear_monotonic() {
        let mut prev = srgb_to_linear(0);
        for i in 1..=255u8 {
            let curr = srgb_to_linear(i);
            assert!(curr > prev, "not monotonic at {i}: {prev} >= {curr}");
            prev = curr;
        }
    }

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
        assert_eq!(linear_to_srgb(1.0), 255);
    }

    #[test]
    fn test_sign_pow() {
        assert!((sign_pow(9.0, 0.5) - 3.0).abs() < 1e-10);
        assert!((sign_pow(-9.0, 0.5) + 3.0).abs() < 1e-10);
        assert!((sign_pow(-0.5, 2.0) + 0.25).abs() < 1e-12);
        assert_eq!(sign_pow(0.0, 2.0), 0.0);
    }
}
