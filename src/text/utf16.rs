//! UTF-16 codepoint traits.
//!
//! Free functions over `u16` code units, mirroring [`crate::text::utf8`].
//! Decode/encode are shape-only and accept unpaired surrogates in the
//! U+DC80–U+DCFF round-trip window; strict validation rejects every unpaired
//! half.

/// Maximum code units per codepoint.
pub const MAX_CP_LEN: usize = 2;

/// Returns `true` for a high (lead) surrogate.
#[inline]
pub fn is_lead_surrogate(unit: u16) -> bool {
    (0xd800..=0xdbff).contains(&unit)
}

/// Returns `true` for a low (trail) surrogate.
#[inline]
pub fn is_trail_surrogate(unit: u16) -> bool {
    (0xdc00..=0xdfff).contains(&unit)
}

/// Sequence length implied by a lead unit.
#[inline]
pub fn lead_to_seq_len(lead: u16) -> usize {
    if is_lead_surrogate(lead) {
        2
    } else {
        1
    }
}

/// Code units needed to encode `cp`.
#[inline]
pub fn cp_len(cp: u32) -> usize {
    if cp < 0x1_0000 {
        1
    } else {
        2
    }
}

/// Encodes `cp` into `out`, returning the number of units written.
///
/// Surrogate-window values are written as a single raw unit.
pub fn encode(cp: u32, out: &mut [u16]) -> usize {
    debug_assert!(cp <= 0x10_ffff);
    if cp < 0x1_0000 {
        out[0] = cp as u16;
        1
    } else {
        let bits = cp - 0x1_0000;
        out[0] = 0xd800 | (bits >> 10) as u16;
        out[1] = 0xdc00 | (bits & 0x3ff) as u16;
        2
    }
}

/// Decodes one sequence from the front of `units`.
///
/// A lead surrogate followed by a trail surrogate forms a supplementary
/// codepoint; any other unit decodes as itself (including unpaired
/// surrogates, for round-tripping).
pub fn decode(units: &[u16]) -> Option<(u32, usize)> {
    let lead = *units.first()?;
    if is_lead_surrogate(lead) {
        match units.get(1) {
            Some(&trail) if is_trail_surrogate(trail) => {
                let cp = 0x1_0000 + (((lead as u32 & 0x3ff) << 10) | (trail as u32 & 0x3ff));
                Some((cp, 2))
            }
            _ => Some((lead as u32, 1)),
        }
    } else {
        Some((lead as u32, 1))
    }
}

/// Strict validation of a single complete sequence.
pub fn is_valid_sequence(units: &[u16]) -> bool {
    match units.len() {
        1 => !is_lead_surrogate(units[0]) && !is_trail_surrogate(units[0]),
        2 => is_lead_surrogate(units[0]) && is_trail_surrogate(units[1]),
        _ => false,
    }
}

/// First occurrence of `cp` in `haystack`, as a unit index.
pub fn find_codepoint(haystack: &[u16], cp: u32) -> Option<usize> {
    let mut buf = [0u16; MAX_CP_LEN];
    let len = encode(cp, &mut buf);
    find_subsequence(haystack, &buf[..len])
}

/// First occurrence of `needle` in `haystack`, as a unit index.
pub fn find_subsequence(haystack: &[u16], needle: &[u16]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_reference_codepoints() {
        let mut buf = [0u16; 2];
        assert_eq!(encode(0x24, &mut buf), 1);
        assert_eq!(buf[0], 0x24);
        assert_eq!(encode(0x20ac, &mut buf), 1);
        assert_eq!(buf[0], 0x20ac);
        assert_eq!(encode(0x2_4b62, &mut buf), 2);
        assert_eq!(&buf, &[0xd852, 0xdf62]);
    }

    #[test]
    fn decode_pairs_and_singletons() {
        assert_eq!(decode(&[0xd852, 0xdf62]), Some((0x2_4b62, 2)));
        assert_eq!(decode(&[0x20ac]), Some((0x20ac, 1)));
        // Unpaired surrogate decodes as itself.
        assert_eq!(decode(&[0xdc80]), Some((0xdc80, 1)));
    }

    #[test]
    fn strict_validation() {
        assert!(is_valid_sequence(&[0x41]));
        assert!(is_valid_sequence(&[0xd852, 0xdf62]));
        assert!(!is_valid_sequence(&[0xd852]));
        assert!(!is_valid_sequence(&[0xdf62]));
    }
}
