//! Encoding tags and transcoding.
//!
//! The string engine stores host code units (UTF-8); [`transcode`] converts
//! raw byte buffers between the host encoding and the UTF-16/32 encodings in
//! either byte order.
//!
//! Strict mode reports [`Error::EncodingError`] on any invalid input.
//! Non-strict mode round-trips: an invalid UTF-8 byte maps into the
//! U+DC80–U+DCFF window (and back out to the original byte when encoding to
//! UTF-8), while invalid UTF-16/32 units pass through by value.

use crate::error::Error;
use crate::text::{utf16, utf32, utf8};

/// A supported transfer encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    /// The in-memory encoding of [`crate::text::Str`] (UTF-8).
    Host,
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
}

impl Encoding {
    /// Code-unit size in bytes.
    pub fn unit_size(self) -> usize {
        match self {
            Encoding::Host | Encoding::Utf8 => 1,
            Encoding::Utf16Le | Encoding::Utf16Be => 2,
            Encoding::Utf32Le | Encoding::Utf32Be => 4,
        }
    }

    fn resolve(self) -> Encoding {
        match self {
            Encoding::Host => Encoding::Utf8,
            other => other,
        }
    }
}

/// Decodes `bytes` under `enc` into codepoints.
///
/// Surrogate-window values survive decoding in non-strict mode.
fn decode_codepoints(enc: Encoding, bytes: &[u8], strict: bool) -> Result<Vec<u32>, Error> {
    let mut cps = Vec::new();
    match enc.resolve() {
        Encoding::Utf8 => {
            let mut rest = bytes;
            while !rest.is_empty() {
                let len = utf8::lead_to_seq_len(rest[0]).min(rest.len());
                if utf8::is_valid_sequence(&rest[..len]) {
                    let (cp, consumed) = utf8::decode(&rest[..len]).unwrap();
                    cps.push(cp);
                    rest = &rest[consumed..];
                } else if let Some((cp, consumed)) =
                    utf8::decode(&rest[..len]).filter(|&(cp, _)| (0xdc80..=0xdcff).contains(&cp))
                {
                    // A sequence already in the round-trip window survives
                    // decoding even though it is strictly invalid.
                    if strict {
                        return Err(Error::EncodingError);
                    }
                    cps.push(cp);
                    rest = &rest[consumed..];
                } else {
                    if strict {
                        return Err(Error::EncodingError);
                    }
                    // Park the raw byte in the round-trip window.
                    cps.push(0xdc00 | rest[0] as u32);
                    rest = &rest[1..];
                }
            }
        }
        Encoding::Utf16Le | Encoding::Utf16Be => {
            if bytes.len() % 2 != 0 {
                return Err(Error::EncodingError);
            }
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| {
                    if enc.resolve() == Encoding::Utf16Le {
                        u16::from_le_bytes([pair[0], pair[1]])
                    } else {
                        u16::from_be_bytes([pair[0], pair[1]])
                    }
                })
                .collect();
            let mut rest = &units[..];
            while !rest.is_empty() {
                let (cp, consumed) = utf16::decode(rest).unwrap();
                if consumed == 1 && strict && !utf16::is_valid_sequence(&rest[..1]) {
                    return Err(Error::EncodingError);
                }
                cps.push(cp);
                rest = &rest[consumed..];
            }
        }
        Encoding::Utf32Le | Encoding::Utf32Be => {
            if bytes.len() % 4 != 0 {
                return Err(Error::EncodingError);
            }
            for quad in bytes.chunks_exact(4) {
                let unit = if enc.resolve() == Encoding::Utf32Le {
                    u32::from_le_bytes([quad[0], quad[1], quad[2], quad[3]])
                } else {
                    u32::from_be_bytes([quad[0], quad[1], quad[2], quad[3]])
                };
                if !utf32::is_valid_codepoint(unit) {
                    if strict || unit > 0x10_ffff {
                        return Err(Error::EncodingError);
                    }
                }
                cps.push(unit);
            }
        }
        Encoding::Host => unreachable!(),
    }
    Ok(cps)
}

/// Encodes codepoints into bytes under `enc`.
fn encode_codepoints(enc: Encoding, cps: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(cps.len() * enc.unit_size());
    match enc.resolve() {
        Encoding::Utf8 => {
            let mut buf = [0u8; utf8::MAX_CP_LEN];
            for &cp in cps {
                if (0xdc80..=0xdcff).contains(&cp) {
                    // Unpark the raw byte captured during decoding.
                    out.push((cp & 0xff) as u8);
                } else {
                    let len = utf8::encode(cp, &mut buf);
                    out.extend_from_slice(&buf[..len]);
                }
            }
        }
        Encoding::Utf16Le | Encoding::Utf16Be => {
            let mut buf = [0u16; utf16::MAX_CP_LEN];
            for &cp in cps {
                let len = utf16::encode(cp, &mut buf);
                for &unit in &buf[..len] {
                    if enc.resolve() == Encoding::Utf16Le {
                        out.extend_from_slice(&unit.to_le_bytes());
                    } else {
                        out.extend_from_slice(&unit.to_be_bytes());
                    }
                }
            }
        }
        Encoding::Utf32Le | Encoding::Utf32Be => {
            for &cp in cps {
                if enc.resolve() == Encoding::Utf32Le {
                    out.extend_from_slice(&cp.to_le_bytes());
                } else {
                    out.extend_from_slice(&cp.to_be_bytes());
                }
            }
        }
        Encoding::Host => unreachable!(),
    }
    out
}

/// Converts `bytes` from `src_enc` to `dst_enc`.
///
/// When both resolve to the same encoding this is a plain copy.
pub fn transcode(
    src_enc: Encoding,
    bytes: &[u8],
    dst_enc: Encoding,
    strict: bool,
) -> Result<Vec<u8>, Error> {
    if src_enc.resolve() == dst_enc.resolve() {
        return Ok(bytes.to_vec());
    }
    let cps = decode_codepoints(src_enc, bytes, strict)?;
    Ok(encode_codepoints(dst_enc, &cps))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\u{24}\u{a2}\u{20ac}\u{24b62}";

    #[test]
    fn host_to_utf16be() {
        let out = transcode(Encoding::Host, SAMPLE.as_bytes(), Encoding::Utf16Be, true).unwrap();
        assert_eq!(
            out,
            [0x00, 0x24, 0x00, 0xa2, 0x20, 0xac, 0xd8, 0x52, 0xdf, 0x62]
        );
    }

    #[test]
    fn host_to_utf32le() {
        let out = transcode(Encoding::Host, SAMPLE.as_bytes(), Encoding::Utf32Le, true).unwrap();
        assert_eq!(
            out,
            [
                0x24, 0x00, 0x00, 0x00, 0xa2, 0x00, 0x00, 0x00, 0xac, 0x20, 0x00, 0x00, 0x62,
                0x4b, 0x02, 0x00
            ]
        );
    }

    #[test]
    fn same_encoding_is_a_copy() {
        let out = transcode(Encoding::Host, SAMPLE.as_bytes(), Encoding::Utf8, true).unwrap();
        assert_eq!(out, SAMPLE.as_bytes());
    }

    #[test]
    fn invalid_byte_round_trips_non_strict() {
        let broken = [0x61u8, 0xff, 0x62];
        assert_eq!(
            transcode(Encoding::Utf8, &broken, Encoding::Utf16Le, true),
            Err(Error::EncodingError)
        );
        let wide = transcode(Encoding::Utf8, &broken, Encoding::Utf16Le, false).unwrap();
        let back = transcode(Encoding::Utf16Le, &wide, Encoding::Utf8, false).unwrap();
        assert_eq!(back, broken);
    }
}
