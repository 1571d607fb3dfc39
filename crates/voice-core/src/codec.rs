//! G.711 μ-law/A-law codec with precomputed lookup tables.
//!
//! Grounded in `app/core/audio_processor.py::AudioProcessor`: decode via a
//! 256-entry LUT built once, encode via a lazily-built LUT indexed by
//! `sample + 32768`, and saturating (never wrapping) amplitude scale/mix.
//!
//! Per the decision recorded in the system specification's open questions,
//! the encode/decode tables here follow the canonical ITU-T G.711 bit layout
//! rather than transliterating the original Python, which has a latent
//! sign-handling edge case at the zero crossing.

use std::sync::OnceLock;

const BIAS: i16 = 0x84;
const CLIP: i16 = 32635;

fn ulaw_decode_table() -> &'static [i16; 256] {
    static TABLE: OnceLock<[i16; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0i16; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let byte = !(i as u8);
            let sign = byte & 0x80;
            let exponent = (byte >> 4) & 0x07;
            let mantissa = byte & 0x0F;
            let mut sample = ((mantissa as i32) << 3) + 0x84;
            sample <<= exponent as i32;
            sample -= 0x84;
            *entry = if sign != 0 { -(sample as i16) } else { sample as i16 };
        }
        table
    })
}

fn alaw_decode_table() -> &'static [i16; 256] {
    static TABLE: OnceLock<[i16; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0i16; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let byte = (i as u8) ^ 0x55;
            let sign = byte & 0x80;
            let exponent = (byte >> 4) & 0x07;
            let mantissa = byte & 0x0F;
            let mut sample = ((mantissa as i32) << 4) + 0x08;
            if exponent != 0 {
                sample += 0x100;
                sample <<= (exponent - 1) as i32;
            }
            *entry = if sign != 0 { -(sample as i16) } else { sample as i16 };
        }
        table
    })
}

/// Segment search: the decode table places segment `e` at
/// `[(BIAS<<e) - BIAS, ...]`, so the biased magnitude's bit length minus the
/// bit length of `BIAS` (8) gives the segment directly.
fn linear_to_ulaw_byte(sample: i16) -> u8 {
    let sign = if sample < 0 { 0x80u8 } else { 0 };
    let magnitude = (sample as i32).unsigned_abs().min(CLIP as u32) as i32 + BIAS as i32;
    let exponent = (8 - (magnitude as u16).leading_zeros() as i32).clamp(0, 7);
    let mantissa = (magnitude >> (exponent + 3)) & 0x0F;
    !((sign as i32 | (exponent << 4) | mantissa) as u8)
}

/// Sign bit set means negative, matching `alaw_decode_table`'s
/// `sign != 0 => -sample` convention. Segment 0 covers magnitude < 256
/// directly (`sample = (m<<4)+8`); segments >= 1 add the 0x108 offset the
/// decode table's `+ 0x100` (pre-shift) and `+ 0x08` (mantissa base) introduce.
fn linear_to_alaw_byte(sample: i16) -> u8 {
    let sign = if sample < 0 { 0x80u8 } else { 0 };
    let magnitude = (sample as i32).unsigned_abs().min(0x7FFF) as i32;
    let (exponent, mantissa) = if magnitude < 256 {
        (0, (magnitude >> 4) & 0x0F)
    } else {
        let exponent = (8 - (magnitude as u16).leading_zeros() as i32).clamp(1, 7);
        let mantissa = (((magnitude >> (exponent - 1)) - 0x108) >> 4) & 0x0F;
        (exponent, mantissa)
    };
    ((sign as i32 | (exponent << 4) | mantissa) as u8) ^ 0x55
}

fn ulaw_encode_table() -> &'static Vec<u8> {
    static TABLE: OnceLock<Vec<u8>> = OnceLock::new();
    TABLE.get_or_init(|| (-32768i32..32768).map(|v| linear_to_ulaw_byte(v as i16)).collect())
}

fn alaw_encode_table() -> &'static Vec<u8> {
    static TABLE: OnceLock<Vec<u8>> = OnceLock::new();
    TABLE.get_or_init(|| (-32768i32..32768).map(|v| linear_to_alaw_byte(v as i16)).collect())
}

pub struct Codec;

impl Codec {
    pub fn ulaw_to_linear16(input: &[u8]) -> Vec<i16> {
        let table = ulaw_decode_table();
        input.iter().map(|&b| table[b as usize]).collect()
    }

    pub fn alaw_to_linear16(input: &[u8]) -> Vec<i16> {
        let table = alaw_decode_table();
        input.iter().map(|&b| table[b as usize]).collect()
    }

    pub fn linear16_to_ulaw(input: &[i16]) -> Vec<u8> {
        let table = ulaw_encode_table();
        input.iter().map(|&s| table[s as i32 as usize + 32768]).collect()
    }

    pub fn linear16_to_alaw(input: &[i16]) -> Vec<u8> {
        let table = alaw_encode_table();
        input.iter().map(|&s| table[s as i32 as usize + 32768]).collect()
    }

    /// Root-mean-square amplitude over a linear16 buffer.
    pub fn rms(samples: &[i16]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        ((sum_sq / samples.len() as f64).sqrt()) as f32
    }

    pub fn peak(samples: &[i16]) -> i16 {
        samples.iter().map(|&s| s.unsigned_abs()).max().unwrap_or(0) as i16
    }

    /// Scales every sample by `factor`, saturating (not wrapping) at i16 bounds.
    pub fn scale(samples: &[i16], factor: f32) -> Vec<i16> {
        samples
            .iter()
            .map(|&s| ((s as f32) * factor).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16)
            .collect()
    }

    /// Additive mix, truncated to the shorter buffer, saturating at i16 bounds.
    pub fn add_saturating(a: &[i16], b: &[i16]) -> Vec<i16> {
        let len = a.len().min(b.len());
        (0..len)
            .map(|i| {
                let sum = a[i] as i32 + b[i] as i32;
                sum.clamp(i16::MIN as i32, i16::MAX as i32) as i16
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every ulaw byte code, decoded then re-encoded, must reproduce itself
    /// bitwise -- except 0x7F and 0xFF, which both decode to linear zero and
    /// so can't both survive the round trip (encoding zero deterministically
    /// picks one of the pair).
    #[test]
    fn ulaw_byte_round_trip_is_exact_except_zero_crossing_pair() {
        let decode = ulaw_decode_table();
        for byte in 0u16..256 {
            if byte == 0x7F || byte == 0xFF {
                continue;
            }
            let sample = decode[byte as usize];
            let re_encoded = linear_to_ulaw_byte(sample);
            assert_eq!(re_encoded, byte as u8, "byte={byte:#x} decoded={sample}");
        }
    }

    /// alaw has no zero-crossing alias (its minimum magnitude is 8, not 0),
    /// so every one of the 256 codes must round-trip exactly.
    #[test]
    fn alaw_byte_round_trip_is_exact() {
        let decode = alaw_decode_table();
        for byte in 0u16..256 {
            let sample = decode[byte as usize];
            let re_encoded = linear_to_alaw_byte(sample);
            assert_eq!(re_encoded, byte as u8, "byte={byte:#x} decoded={sample}");
        }
    }

    #[test]
    fn rms_of_empty_is_zero() {
        assert_eq!(Codec::rms(&[]), 0.0);
    }

    #[test]
    fn rms_of_constant_signal() {
        assert!((Codec::rms(&[100, 100, 100]) - 100.0).abs() < 1e-3);
    }

    #[test]
    fn scale_saturates_instead_of_wrapping() {
        let scaled = Codec::scale(&[30000], 2.0);
        assert_eq!(scaled[0], i16::MAX);
    }

    #[test]
    fn add_saturating_truncates_to_shorter() {
        let mixed = Codec::add_saturating(&[1, 2, 3], &[10, 20]);
        assert_eq!(mixed.len(), 2);
    }

    #[test]
    fn add_saturating_clips_at_bounds() {
        let mixed = Codec::add_saturating(&[30000], &[30000]);
        assert_eq!(mixed[0], i16::MAX);
    }
}
