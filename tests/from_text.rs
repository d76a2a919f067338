//! Integration tests for formatted parsing.

use plinth::text::Str;
use plinth::{from_text, Error};

#[test]
fn integer_bases_with_prefix() {
    assert_eq!(from_text::<u32>(&Str::from("0b10"), "#bdx"), Ok(2));
    assert_eq!(from_text::<u32>(&Str::from("0B101"), "#bdx"), Ok(5));
    assert_eq!(from_text::<u32>(&Str::from("0x10"), "#bdx"), Ok(16));
    assert_eq!(from_text::<u32>(&Str::from("0Xff"), "#bdx"), Ok(255));
    assert_eq!(from_text::<u32>(&Str::from("10"), "#bdx"), Ok(10));
}

#[test]
fn binary_only_format() {
    assert_eq!(from_text::<u32>(&Str::from("0b10"), "#b"), Ok(2));
    assert!(from_text::<u32>(&Str::from("10"), "#b").is_err());
    // Without the prefix marker, bare binary digits are accepted.
    assert_eq!(from_text::<u32>(&Str::from("10"), "b"), Ok(2));
}

#[test]
fn octal_prefix_forms() {
    assert_eq!(from_text::<u32>(&Str::from("017"), "#bdox"), Ok(15));
    assert_eq!(from_text::<u32>(&Str::from("0o17"), "#bdox"), Ok(15));
    assert_eq!(from_text::<u32>(&Str::from("0O17"), "#bdox"), Ok(15));
}

#[test]
fn signed_integers() {
    assert_eq!(from_text::<i32>(&Str::from("-128"), ""), Ok(-128));
    assert_eq!(from_text::<i32>(&Str::from("+128"), ""), Ok(128));
    assert_eq!(from_text::<i64>(&Str::from("-0x10"), "#x"), Ok(-16));
    assert_eq!(from_text::<i8>(&Str::from("-128"), "d"), Ok(i8::MIN));
    // Unsigned types refuse a sign outright.
    assert!(from_text::<u32>(&Str::from("-1"), "d").is_err());
}

#[test]
fn format_errors_are_syntactic() {
    let err = from_text::<u32>(&Str::from("1"), "q").unwrap_err();
    assert_eq!(err.error_name(), "syntax_error");
    let err = from_text::<u32>(&Str::from("1"), "bd").unwrap_err();
    assert_eq!(err.error_name(), "syntax_error");
}

#[test]
fn mismatched_input_is_an_error() {
    match from_text::<u32>(&Str::from("zz"), "d") {
        Err(Error::Syntax { description, .. }) => {
            assert_eq!(description, "input does not match the format");
        }
        other => panic!("expected a syntax error, got {other:?}"),
    }
}

#[test]
fn bool_round_trip() {
    assert_eq!(from_text::<bool>(&Str::from("true"), ""), Ok(true));
    assert_eq!(from_text::<bool>(&Str::from("false"), ""), Ok(false));
}

#[test]
fn strings_with_and_without_expression() {
    assert_eq!(
        from_text::<String>(&Str::from("anything at all"), ""),
        Ok(String::from("anything at all"))
    );
    assert_eq!(
        from_text::<Str>(&Str::from("abc123"), "[a-z]+[0-9]+"),
        Ok(Str::from("abc123"))
    );
    assert!(from_text::<Str>(&Str::from("123abc"), "[a-z]+[0-9]+").is_err());
}

#[test]
fn sequences_parse_elementwise() {
    assert_eq!(
        from_text::<Vec<u32>>(&Str::from("{1, 2, 3}"), ""),
        Ok(vec![1, 2, 3])
    );
    assert_eq!(
        from_text::<Vec<u32>>(&Str::from("{0x10, 0b1, 8}"), "#bdx"),
        Ok(vec![16, 1, 8])
    );
    assert_eq!(from_text::<Vec<u32>>(&Str::from("{}"), ""), Ok(vec![]));
    assert_eq!(
        from_text::<Vec<bool>>(&Str::from("{true, false}"), ""),
        Ok(vec![true, false])
    );
    assert!(from_text::<Vec<u32>>(&Str::from("{1, 2"), "").is_err());
}

#[test]
fn nested_sequences() {
    assert_eq!(
        from_text::<Vec<Vec<u32>>>(&Str::from("{{1, 2}, {3}}"), ""),
        Ok(vec![vec![1, 2], vec![3]])
    );
}
