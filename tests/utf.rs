//! Integration tests for the codepoint traits and transcoding.

use plinth::text::{encoding, utf16, utf32, utf8, Encoding};
use plinth::Error;

#[test]
fn utf8_lengths_follow_the_lead_unit() {
    assert_eq!(utf8::lead_to_seq_len(b'a'), 1);
    assert_eq!(utf8::lead_to_seq_len(0xc2), 2);
    assert_eq!(utf8::lead_to_seq_len(0xe2), 3);
    assert_eq!(utf8::lead_to_seq_len(0xf0), 4);
    // Trail units report 1 so scans can resynchronize.
    assert_eq!(utf8::lead_to_seq_len(0x82), 1);
}

#[test]
fn utf8_rejects_malformed_sequences() {
    assert!(!utf8::is_valid_sequence(&[0xc2])); // truncated
    assert!(!utf8::is_valid_sequence(&[0xc2, 0x41])); // bad trail
    assert!(!utf8::is_valid_sequence(&[0xe0, 0x80, 0x80])); // overlong
    assert!(!utf8::is_valid_sequence(&[0xed, 0xb2, 0x80])); // surrogate
    assert!(utf8::is_valid(b"plain ascii"));
    assert!(utf8::is_valid("日本語".as_bytes()));
    assert!(!utf8::is_valid(&[0x61, 0xff, 0x62]));
}

#[test]
fn utf16_surrogate_pairing() {
    let mut buf = [0u16; 2];
    assert_eq!(utf16::encode(0x1_f600, &mut buf), 2);
    assert_eq!(utf16::decode(&buf), Some((0x1_f600, 2)));
    assert_eq!(utf16::lead_to_seq_len(buf[0]), 2);
    assert_eq!(utf16::lead_to_seq_len(0x20ac), 1);
    assert!(utf16::find_codepoint(&[0x24, 0xd852, 0xdf62], 0x2_4b62) == Some(1));
}

#[test]
fn utf32_is_identity_with_validation() {
    assert!(utf32::is_valid_sequence(&[0x10_ffff]));
    assert!(!utf32::is_valid_sequence(&[0x11_0000]));
    let mut buf = [0u32; 1];
    assert_eq!(utf32::encode(0x24, &mut buf), 1);
    assert_eq!(utf32::decode(&buf), Some((0x24, 1)));
}

#[test]
fn transcode_between_all_encodings() {
    let sample = "a\u{a2}\u{20ac}\u{24b62}";
    let utf16_le =
        encoding::transcode(Encoding::Utf8, sample.as_bytes(), Encoding::Utf16Le, true).unwrap();
    let utf32_be =
        encoding::transcode(Encoding::Utf16Le, &utf16_le, Encoding::Utf32Be, true).unwrap();
    let back = encoding::transcode(Encoding::Utf32Be, &utf32_be, Encoding::Utf8, true).unwrap();
    assert_eq!(back, sample.as_bytes());
}

#[test]
fn strict_transcode_reports_invalid_input() {
    let broken = [0xe2u8, 0x82]; // truncated three-unit sequence
    assert_eq!(
        encoding::transcode(Encoding::Utf8, &broken, Encoding::Utf32Le, true),
        Err(Error::EncodingError)
    );
    // Odd byte counts cannot form UTF-16 units.
    assert_eq!(
        encoding::transcode(Encoding::Utf16Be, &[0x00], Encoding::Utf8, false),
        Err(Error::EncodingError)
    );
}

#[test]
fn invalid_bytes_round_trip_through_the_surrogate_window() {
    let broken = [b'x', 0xfe, 0x80, b'y'];
    let wide = encoding::transcode(Encoding::Utf8, &broken, Encoding::Utf32Le, false).unwrap();
    // Each invalid byte parks in U+DC80..U+DCFF.
    let units: Vec<u32> = wide
        .chunks_exact(4)
        .map(|quad| u32::from_le_bytes([quad[0], quad[1], quad[2], quad[3]]))
        .collect();
    assert_eq!(units, [0x78, 0xdcfe, 0xdc80, 0x79]);
    let back = encoding::transcode(Encoding::Utf32Le, &wide, Encoding::Utf8, false).unwrap();
    assert_eq!(back, broken);
}
