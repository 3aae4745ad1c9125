//! Base83 encoding and decoding used by the BlurHash algorithm.
//!
//! The BlurHash format packs every field into digits of a custom
//! 83-character alphabet. Encoding is fixed-width: a value that needs fewer
//! digits is padded with the zero character, and a value that needs more is
//! truncated to its low-order digits. Callers own the range of what they encode.

use std::ops::Range;

use crate::error::{BlurhashError, Result};

/// The 83-character alphabet used by BlurHash base83 encoding.
pub const ALPHABET: &[u8; 83] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz#$%*+,-.:;=?@[]^_{|}~";

/// Marks bytes that are not part of the alphabet.
const INVALID: u8 = 255;

/// Lookup table mapping ASCII byte values to their base83 digit value.
const fn build_decode_lut() -> [u8; 128] {
    let mut lut = [INVALID; 128];
    let mut i = 0;
    while i < 83 {
        lut[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    lut
}

static DECODE_LUT: [u8; 128] = build_decode_lut();

#[inline]
fn digit(byte: u8) -> Option<u64> {
    match DECODE_LUT.get(byte as usize) {
        Some(&d) if d != INVALID => Some(d as u64),
        _ => None,
    }
}

/// The full character starting at `index`, or U+FFFD when `index` falls
/// inside a multi-byte sequence.
fn char_at(s: &str, index: usize) -> char {
    s.get(index..)
        .and_then(|rest| rest.chars().next())
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Decode a base83 string into an integer.
///
/// Leading zero digits contribute nothing, so `"01"` decodes to `1`.
///
/// # Errors
///
/// Returns [`BlurhashError::InvalidInput`] if the string contains a character
/// not in the alphabet, and [`BlurhashError::Base83Overflow`] if the value
/// does not fit in a `u64`.
///
/// # Examples
///
/// ```
/// use blurhash_codec::base83::decode;
/// assert_eq!(decode("0").unwrap(), 0);
/// assert_eq!(decode("~").unwrap(), 82);
/// assert_eq!(decode("01").unwrap(), 1);
/// ```
pub fn decode(base83_str: &str) -> Result<u64> {
    decode_range(base83_str, 0..base83_str.len())
}

/// Decode the digits in `range` of `s`.
///
/// Error offsets are relative to the start of `s`, not of the range, so a
/// bad character inside a hash field points at its position in the hash.
/// The caller guarantees `range` lies within `s`.
pub(crate) fn decode_range(s: &str, range: Range<usize>) -> Result<u64> {
    let start = range.start;
    let digits = s.as_bytes().get(range).unwrap_or_default();

    let mut value: u64 = 0;
    for (offset, &byte) in digits.iter().enumerate() {
        let d = digit(byte).ok_or_else(|| {
            let index = start + offset;
            BlurhashError::InvalidInput {
                character: char_at(s, index),
                index,
            }
        })?;
        value = value
            .checked_mul(83)
            .and_then(|v| v.checked_add(d))
            .ok_or(BlurhashError::Base83Overflow {
                length: digits.len(),
            })?;
    }
    Ok(value)
}

/// Encode an integer into a base83 string of exactly `length` characters.
///
/// Values needing more than `length` digits keep only their low-order
/// digits; the hash format relies on fixed-width fields.
///
/// # Examples
///
/// ```
/// use blurhash_codec::base83::encode;
/// assert_eq!(encode(0, 1), "0");
/// assert_eq!(encode(82, 1), "~");
/// assert_eq!(encode(1, 4), "0001");
/// ```
pub fn encode(value: u64, length: usize) -> String {
    let mut out = String::with_capacity(length);
    encode_into(&mut out, value, length);
    out
}

/// Append the fixed-width encoding of `value` to `out`.
pub fn encode_into(out: &mut String, value: u64, length: usize) {
    let start = out.len();
    out.extend(std::iter::repeat('0').take(length));

    // SAFETY: every byte written below comes from ALPHABET (ASCII), replacing
    // the ASCII '0' placeholders pushed above, so the string stays valid UTF-8.
    let bytes = unsafe { out.as_bytes_mut() };
    let mut remaining = value;
    for slot in bytes[start..].iter_mut().rev() {
        *slot = ALPHABET[(remaining % 83) as usize];
        remaining /= 83;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // (encoded, value) pairs that survive a fixed-width round trip.
    const VECTORS: &[(&str, u64)] = &[
        ("3", 3),
        ("A", 10),
        (":", 70),
        ("~", 82),
        ("01", 1),
        ("11", 84),
        ("33", 252),
        ("~$", 6869),
        ("%%%%%%", 255_172_974_336),
    ];

    #[test]
    fn test_decode_vectors() {
        for &(s, value) in VECTORS {
            assert_eq!(decode(s).unwrap(), value, "decode {s:?}");
        }
    }

    #[test]
    fn test_encode_vectors() {
        for &(s, value) in VECTORS {
            assert_eq!(encode(value, s.len()), s, "encode {value}");
        }
    }

    #[test]
    fn test_encode_with_padding() {
        assert_eq!(encode(0, 4), "0000");
        assert_eq!(encode(1, 4), "0001");
        assert_eq!(encode(255_172_974_336, 9), "000%%%%%%");
    }

    #[test]
    fn test_encode_truncates_to_low_digits() {
        assert_eq!(encode(255_172_974_336, 3), "%%%");
        assert_eq!(encode(83, 1), "0");
    }

    #[test]
    fn test_encode_into_appends() {
        let mut s = String::from("L");
        encode_into(&mut s, 82, 1);
        encode_into(&mut s, 84, 2);
        assert_eq!(s, "L~11");
    }

    #[test]
    fn test_encode_zero_length() {
        assert_eq!(encode(1234, 0), "");
    }

    #[test]
    fn test_decode_invalid_char() {
        assert_eq!(
            decode("&"),
            Err(BlurhashError::InvalidInput {
                character: '&',
                index: 0
            })
        );
        assert_eq!(
            decode("00 0"),
            Err(BlurhashError::InvalidInput {
                character: ' ',
                index: 2
            })
        );
    }

    #[test]
    fn test_decode_non_ascii() {
        assert_eq!(
            decode("0é"),
            Err(BlurhashError::InvalidInput {
                character: 'é',
                index: 1
            })
        );
    }

    #[test]
    fn test_decode_range_reports_absolute_index() {
        let err = decode_range("LEH!6n", 2..6).unwrap_err();
        assert_eq!(
            err,
            BlurhashError::InvalidInput {
                character: '!',
                index: 3
            }
        );
    }

    #[test]
    fn test_decode_range_inside_multibyte_char() {
        // "é" occupies bytes 1..3; a range starting at byte 2 hits a
        // continuation byte.
        let err = decode_range("0é00", 2..4).unwrap_err();
        assert_eq!(
            err,
            BlurhashError::InvalidInput {
                character: char::REPLACEMENT_CHARACTER,
                index: 2
            }
        );
    }

    #[test]
    fn test_decode_overflow() {
        // 83^10 < 2^64 < 83^11, so eleven '~' digits overflow.
        assert!(decode("~~~~~~~~~~").is_ok());
        assert_eq!(
            decode("~~~~~~~~~~~"),
            Err(BlurhashError::Base83Overflow { length: 11 })
        );
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode("").unwrap(), 0);
    }

    #[test]
    fn test_alphabet_completeness() {
        for (i, &ch) in ALPHABET.iter().enumerate() {
            let s = String::from(ch as char);
            assert_eq!(decode(&s).unwrap(), i as u64);
            assert_eq!(encode(i as u64, 1), s);
        }
    }

    #[test]
    fn test_every_two_digit_string_roundtrips() {
        for &a in ALPHABET.iter() {
            for &b in ALPHABET.iter() {
                let s = String::from_utf8(vec![a, b]).unwrap();
                assert_eq!(encode(decode(&s).unwrap(), 2), s);
            }
        }
    }
}
