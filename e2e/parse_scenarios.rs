//! E2E Scenarios: format compilation and typed parsing.

use plinth::text::parsers::{Parser, Regex};
use plinth::text::Str;
use plinth::from_text;

// ─────────────────────────────────────────────────────────────────────────────
// Scenario 1: the multi-base integer format — one format string accepts
// binary, decimal, and hexadecimal inputs, each through its own prefix.
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn scenario_multi_base_integers() {
    for (input, expected) in [("0b10", 2u32), ("0x10", 16), ("10", 10)] {
        assert_eq!(
            from_text::<u32>(&Str::from(input), "#bdx"),
            Ok(expected),
            "input {input}"
        );
    }
    // A single-base format accepts only that base.
    assert_eq!(from_text::<u32>(&Str::from("0b110"), "#b"), Ok(6));
    assert!(from_text::<u32>(&Str::from("6"), "#b").is_err());
    assert!(from_text::<u32>(&Str::from("0x6"), "#b").is_err());
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario 2: a log-line shaped expression compiled once and matched against
// several inputs.
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn scenario_expression_reuse() {
    let mut parser = Parser::new();
    let expr = Str::from("[a-z]+-[0-9]{3}(?:\\.[0-9]+)?");
    let first = Regex::new(&mut parser, &expr)
        .parse_with_no_captures()
        .expect("expression compiles");
    for ok in ["abc-123", "x-000.5", "queue-999.25"] {
        assert!(
            parser.run_full(first, &Str::from(ok)).is_some(),
            "should match {ok}"
        );
    }
    for bad in ["abc-12", "ABC-123", "abc-123.", "-123"] {
        assert!(
            parser.run_full(first, &Str::from(bad)).is_none(),
            "should not match {bad}"
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario 3: parsing structured values — sequences of mixed-base integers
// and nested sequences.
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn scenario_structured_values() {
    assert_eq!(
        from_text::<Vec<u32>>(&Str::from("{0b1, 0x20, 3}"), "#bdx"),
        Ok(vec![1, 32, 3])
    );
    assert_eq!(
        from_text::<Vec<bool>>(&Str::from("{false, true, false}"), ""),
        Ok(vec![false, true, false])
    );
    assert_eq!(
        from_text::<Vec<Vec<u32>>>(&Str::from("{{1}, {2, 3}}"), ""),
        Ok(vec![vec![1], vec![2, 3]])
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario 4: syntax errors carry the expression and a 1-based position.
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn scenario_error_reporting() {
    let mut parser = Parser::new();
    let expr = Str::from("ab{2,");
    let err = Regex::new(&mut parser, &expr)
        .parse_with_no_captures()
        .unwrap_err();
    match err {
        plinth::Error::Syntax {
            description,
            expression,
            char_index,
        } => {
            assert_eq!(description, "malformed repetition range");
            assert_eq!(expression, "ab{2,");
            assert!(char_index >= 1 && char_index <= 6);
        }
        other => panic!("expected a syntax error, got {other:?}"),
    }
}
