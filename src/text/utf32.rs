//! UTF-32 codepoint traits.
//!
//! Every code unit is one codepoint; the only work is validation and search.

/// Maximum code units per codepoint.
pub const MAX_CP_LEN: usize = 1;

/// Sequence length implied by a lead unit (always 1).
#[inline]
pub fn lead_to_seq_len(_lead: u32) -> usize {
    1
}

/// Returns `true` for a Unicode scalar value (or a value in the
/// U+DC80–U+DCFF round-trip window when `strict` is off — callers enforce
/// that distinction).
#[inline]
pub fn is_valid_codepoint(cp: u32) -> bool {
    cp <= 0x10_ffff && !(0xd800..=0xdfff).contains(&cp)
}

/// Encodes `cp` into `out`, returning 1.
#[inline]
pub fn encode(cp: u32, out: &mut [u32]) -> usize {
    debug_assert!(cp <= 0x10_ffff);
    out[0] = cp;
    1
}

/// Decodes one unit from the front of `units`.
#[inline]
pub fn decode(units: &[u32]) -> Option<(u32, usize)> {
    units.first().map(|&cp| (cp, 1))
}

/// Strict validation of a single unit.
#[inline]
pub fn is_valid_sequence(units: &[u32]) -> bool {
    units.len() == 1 && is_valid_codepoint(units[0])
}

/// First occurrence of `cp` in `haystack`, as a unit index.
pub fn find_codepoint(haystack: &[u32], cp: u32) -> Option<usize> {
    haystack.iter().position(|&unit| unit == cp)
}

/// First occurrence of `needle` in `haystack`, as a unit index.
pub fn find_subsequence(haystack: &[u32], needle: &[u32]) -> Option<usize> {
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
