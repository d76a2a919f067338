//! E2E Scenarios: string engine.

use plinth::text::{Encoding, Str};

// ─────────────────────────────────────────────────────────────────────────────
// Scenario 1: move semantics — mutating a literal clones once, and from then
// on the buffer travels by move, never by copy.
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn scenario_buffer_moves_not_copies() {
    let mut s1 = Str::from_static("a");
    s1.replace_cp_at(0, 'b').unwrap();
    let owned_buffer = s1.as_ptr();
    let s2 = s1 + "c";
    assert_eq!(
        s2.as_ptr(),
        owned_buffer,
        "concatenation must steal the moved-in buffer"
    );
    assert_eq!(s2, "bc");
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario 2: c_str on an empty literal view hands out the shared static
// terminator, not an allocation.
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn scenario_empty_c_str_is_shared_static() {
    let mut empty_literal = Str::from_static("");
    let ptr = empty_literal.c_str();
    assert!(!ptr.is_owned());
    unsafe {
        assert_eq!(*ptr.as_ptr(), 0);
    }
    // Any other empty string reports the very same address.
    let other = Str::new();
    assert_eq!(other.c_str_ref().as_ptr(), empty_literal.c_str_ref().as_ptr());
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario 3: a full text round trip — build, edit, search, transcode.
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn scenario_build_edit_search_transcode() {
    let mut s = Str::with_inline();
    s += "price: ";
    s += '\u{20ac}';
    s += "42";
    assert_eq!(s.len_codepoints(), 10);

    // Swap the euro sign for a dollar sign (3 units → 1 unit).
    s.replace('\u{20ac}', '$');
    assert_eq!(s, "price: $42");

    let at = s.find('$').expect("dollar sign present");
    assert_eq!(at.codepoint_index(), 7);
    assert!(s.starts_with(&Str::from_static("price")));
    assert!(s.ends_with(&Str::from_static("42")));

    let wide = s.encode(Encoding::Utf16Le, false);
    assert_eq!(wide.len(), s.len_codepoints() * 2);
    assert_eq!(&wide[..4], &[b'p', 0, b'r', 0]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario 4: set_from feeding — a reader that needs several capacity
// doublings before its output fits.
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn scenario_set_from_reader() {
    let payload: Vec<u8> = (0..2_000u32).map(|n| b'a' + (n % 26) as u8).collect();
    let mut attempts = 0;
    let mut s = Str::new();
    s.set_from(|buf| {
        attempts += 1;
        if buf.len() < payload.len() {
            return buf.len(); // not enough room, grow and retry
        }
        buf[..payload.len()].copy_from_slice(&payload);
        payload.len()
    });
    assert!(attempts > 1, "the reader must have been retried");
    assert_eq!(s.len_units(), payload.len());
    assert_eq!(s.as_bytes(), &payload[..]);
}
