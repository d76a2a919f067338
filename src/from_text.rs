//! Formatted parsing of values out of text.
//!
//! [`from_text`] compiles a per-type capture format into a parser state
//! graph, matches it against the whole input, and converts the capture tree
//! into the requested type. Each type contributes an adapter: the adapter's
//! format phase may record state (say, which integer base was selected) that
//! its conversion phase needs afterwards.
//!
//! Integer formats: an optional leading `#` enables the `0b`/`0`/`0o`/`0x`
//! base prefixes, followed by any of the base letters `b`, `d`, `o`, `x`.
//! Several bases may only be combined under `#` (without prefixes the digits
//! would be ambiguous); `#` alone enables all four; no letters and no `#`
//! means plain decimal.

use crate::error::Error;
use crate::text::parsers::dynamic::{MatchCapture, Parser, StateHandle};
use crate::text::parsers::regex::{Regex, RegexCaptureFormat};
use crate::text::Str;

/// Types reconstructible from text through a capture format.
pub trait FromText: Sized {
    /// The stateful format/conversion adapter for this type.
    type Adapter: FromTextAdapter<Self> + Default;
}

/// Two-phase adapter: compile the format, then convert the capture.
pub trait FromTextAdapter<T> {
    /// Translates `format` into parser states, returning the entry state.
    fn format_to_parser_states(
        &mut self,
        format: &RegexCaptureFormat,
        parser: &mut Parser,
    ) -> Result<Option<StateHandle>, Error>;

    /// Builds the value from the whole-input capture.
    fn convert_capture(&self, capture0: &MatchCapture<'_>) -> Result<T, Error>;
}

/// Parses `src` as a `T` according to `format`.
pub fn from_text<T: FromText>(src: &Str, format: &str) -> Result<T, Error> {
    let mut parser = Parser::new();
    let capture_format = RegexCaptureFormat {
        expr: Str::from(format),
        vars: Vec::new(),
    };
    let mut adapter = T::Adapter::default();
    let first_state = adapter.format_to_parser_states(&capture_format, &mut parser)?;
    let result = parser.run_full(first_state, src).ok_or_else(|| Error::Syntax {
        description: "input does not match the format",
        expression: src.to_std_string(),
        char_index: 1,
    })?;
    adapter.convert_capture(&result.capture0(src))
}

// ─── bool ────────────────────────────────────────────────────────────────────

/// Adapter matching the literals `true` / `false`.
pub struct BoolAdapter {
    true_text: Str,
    false_text: Str,
}

impl Default for BoolAdapter {
    fn default() -> Self {
        BoolAdapter {
            true_text: Str::from_static("true"),
            false_text: Str::from_static("false"),
        }
    }
}

impl FromTextAdapter<bool> for BoolAdapter {
    fn format_to_parser_states(
        &mut self,
        format: &RegexCaptureFormat,
        parser: &mut Parser,
    ) -> Result<Option<StateHandle>, Error> {
        if !format.expr.is_empty() {
            return Err(Error::Syntax {
                description: "unexpected character in format string",
                expression: format.expr.to_std_string(),
                char_index: 1,
            });
        }
        let true_state = parser.create_string_state(self.true_text.clone());
        let false_state = parser.create_string_state(self.false_text.clone());
        parser.set_alternative(true_state, Some(false_state));
        Ok(Some(true_state))
    }

    fn convert_capture(&self, capture0: &MatchCapture<'_>) -> Result<bool, Error> {
        Ok(capture0.text() == self.true_text)
    }
}

impl FromText for bool {
    type Adapter = BoolAdapter;
}

// ─── integers ────────────────────────────────────────────────────────────────

/// Integer types the generic adapter can target.
pub trait IntScalar: Copy {
    /// Whether a sign group is parsed ahead of the digits.
    const SIGNED: bool;
    /// Narrows the digit accumulator, applying the sign.
    fn from_accumulator(value: u64, negative: bool) -> Self;
}

macro_rules! impl_int_scalar {
    (signed: $($t:ty),*) => {$(
        impl IntScalar for $t {
            const SIGNED: bool = true;
            #[inline]
            fn from_accumulator(value: u64, negative: bool) -> Self {
                let value = value as $t;
                if negative { value.wrapping_neg() } else { value }
            }
        }
    )*};
    (unsigned: $($t:ty),*) => {$(
        impl IntScalar for $t {
            const SIGNED: bool = false;
            #[inline]
            fn from_accumulator(value: u64, _negative: bool) -> Self {
                value as $t
            }
        }
    )*};
}

impl_int_scalar!(signed: i8, i16, i32, i64, isize);
impl_int_scalar!(unsigned: u8, u16, u32, u64, usize);

/// Adapter for the integer types; remembers between phases whether prefixes
/// were enabled and, if not, which single base the digits use.
pub struct IntAdapter<T> {
    prefix: bool,
    /// Shift width for bases 2/8/16, or 10 for decimal, when `#` is absent.
    unprefixed_base_or_shift: u32,
    marker: core::marker::PhantomData<T>,
}

impl<T> Default for IntAdapter<T> {
    fn default() -> Self {
        IntAdapter {
            prefix: false,
            unprefixed_base_or_shift: 0,
            marker: core::marker::PhantomData,
        }
    }
}

impl<T: IntScalar> IntAdapter<T> {
    /// `0[Bb]` prefix capture + binary digits capture.
    fn create_base2_states(&mut self, parser: &mut Parser) -> StateHandle {
        let digit = parser.create_codepoint_range_state('0', '1');
        let digits_rep = parser.create_repetition_group(Some(digit), 1, None);
        let digits_cap = parser.create_capture_group(Some(digits_rep));
        if self.prefix {
            let upper_b = parser.create_codepoint_state('B');
            let lower_b = parser.create_codepoint_state('b');
            parser.set_alternative(lower_b, Some(upper_b));
            let zero = parser.create_codepoint_state('0');
            parser.set_next(zero, Some(lower_b));
            let prefix_cap = parser.create_capture_group(Some(zero));
            parser.set_next(prefix_cap, Some(digits_cap));
            prefix_cap
        } else {
            self.unprefixed_base_or_shift = 1;
            digits_cap
        }
    }

    /// `0[Oo]?` prefix capture + octal digits capture. Unlike hexadecimal,
    /// the base letter is optional: a bare leading `0` selects octal.
    fn create_base8_states(&mut self, parser: &mut Parser) -> StateHandle {
        let digit = parser.create_codepoint_range_state('0', '7');
        let digits_rep = parser.create_repetition_group(Some(digit), 1, None);
        let digits_cap = parser.create_capture_group(Some(digits_rep));
        if self.prefix {
            let upper_o = parser.create_codepoint_state('O');
            let lower_o = parser.create_codepoint_state('o');
            parser.set_alternative(lower_o, Some(upper_o));
            let letter_rep = parser.create_repetition_group(Some(lower_o), 0, Some(1));
            let zero = parser.create_codepoint_state('0');
            parser.set_next(zero, Some(letter_rep));
            let prefix_cap = parser.create_capture_group(Some(zero));
            parser.set_next(prefix_cap, Some(digits_cap));
            prefix_cap
        } else {
            self.unprefixed_base_or_shift = 3;
            digits_cap
        }
    }

    /// Decimal digits capture; under `#`, an empty prefix capture keeps the
    /// group indices aligned with the prefixed bases.
    fn create_base10_states(&mut self, parser: &mut Parser) -> StateHandle {
        let digit = parser.create_codepoint_range_state('0', '9');
        let digits_rep = parser.create_repetition_group(Some(digit), 1, None);
        let digits_cap = parser.create_capture_group(Some(digits_rep));
        if self.prefix {
            let empty_prefix_cap = parser.create_capture_group(None);
            parser.set_next(empty_prefix_cap, Some(digits_cap));
            empty_prefix_cap
        } else {
            self.unprefixed_base_or_shift = 10;
            digits_cap
        }
    }

    /// `0[Xx]` prefix capture + hexadecimal digits capture.
    fn create_base16_states(&mut self, parser: &mut Parser) -> StateHandle {
        let upper_alpha = parser.create_codepoint_range_state('A', 'F');
        let lower_alpha = parser.create_codepoint_range_state('a', 'f');
        parser.set_alternative(lower_alpha, Some(upper_alpha));
        let num = parser.create_codepoint_range_state('0', '9');
        parser.set_alternative(num, Some(lower_alpha));
        let digits_rep = parser.create_repetition_group(Some(num), 1, None);
        let digits_cap = parser.create_capture_group(Some(digits_rep));
        if self.prefix {
            let upper_x = parser.create_codepoint_state('X');
            let lower_x = parser.create_codepoint_state('x');
            parser.set_alternative(lower_x, Some(upper_x));
            let zero = parser.create_codepoint_state('0');
            parser.set_next(zero, Some(lower_x));
            let prefix_cap = parser.create_capture_group(Some(zero));
            parser.set_next(prefix_cap, Some(digits_cap));
            prefix_cap
        } else {
            self.unprefixed_base_or_shift = 4;
            digits_cap
        }
    }
}

impl<T: IntScalar> FromTextAdapter<T> for IntAdapter<T> {
    fn format_to_parser_states(
        &mut self,
        format: &RegexCaptureFormat,
        parser: &mut Parser,
    ) -> Result<Option<StateHandle>, Error> {
        let cps: Vec<char> = format.expr.chars().collect();
        let mut itr = 0;
        if cps.first() == Some(&'#') {
            self.prefix = true;
            itr += 1;
        }
        let (mut add_base2, mut add_base8, mut add_base10, mut add_base16) =
            (false, false, false, false);
        let mut bases_seen = 0usize;
        while itr < cps.len() {
            if bases_seen > 0 && !self.prefix {
                return Err(Error::Syntax {
                    description: "prefix (#) required if multiple bases are specified",
                    expression: format.expr.to_std_string(),
                    char_index: itr + 1,
                });
            }
            match cps[itr] {
                'b' => add_base2 = true,
                'd' => add_base10 = true,
                'o' => add_base8 = true,
                'x' => add_base16 = true,
                _ => {
                    return Err(Error::Syntax {
                        description: "unexpected character",
                        expression: format.expr.to_std_string(),
                        char_index: itr + 1,
                    })
                }
            }
            bases_seen += 1;
            itr += 1;
        }
        if self.prefix && !add_base2 && !add_base8 && !add_base10 && !add_base16 {
            // Prefixed with no explicit base: allow all of them.
            add_base2 = true;
            add_base8 = true;
            add_base10 = true;
            add_base16 = true;
        } else if !add_base2 && !add_base8 && !add_base16 {
            // Unprefixed with no power-of-two base: plain decimal.
            add_base10 = true;
        }

        /* The bases chain as alternatives; octal must come ahead of decimal
        so its bare "0" prefix wins, and the prefixed bases ahead of both. */
        let mut first_base_cap_group: Option<StateHandle> = None;
        if add_base10 {
            let group = self.create_base10_states(parser);
            parser.set_alternative(group, first_base_cap_group);
            first_base_cap_group = Some(group);
        }
        if add_base8 {
            let group = self.create_base8_states(parser);
            parser.set_alternative(group, first_base_cap_group);
            first_base_cap_group = Some(group);
        }
        if add_base16 {
            let group = self.create_base16_states(parser);
            parser.set_alternative(group, first_base_cap_group);
            first_base_cap_group = Some(group);
        }
        if add_base2 {
            let group = self.create_base2_states(parser);
            parser.set_alternative(group, first_base_cap_group);
            first_base_cap_group = Some(group);
        }

        if T::SIGNED {
            let plus = parser.create_codepoint_state('+');
            let minus = parser.create_codepoint_state('-');
            parser.set_alternative(minus, Some(plus));
            let sign_rep = parser.create_repetition_group(Some(minus), 0, Some(1));
            let sign_cap = parser.create_capture_group(Some(sign_rep));
            parser.set_next(sign_cap, first_base_cap_group);
            Ok(Some(sign_cap))
        } else {
            // Unsigned types accept no sign at all.
            Ok(first_base_cap_group)
        }
    }

    fn convert_capture(&self, capture0: &MatchCapture<'_>) -> Result<T, Error> {
        let mut cap_group_index = 0;
        let mut negative = false;
        if T::SIGNED {
            if let Some(sign_cap) = capture0.capture_group(cap_group_index) {
                negative = sign_cap.text().chars().next() == Some('-');
            }
            cap_group_index += 1;
        }
        let base_or_shift = if self.prefix {
            let prefix_cap = capture0
                .capture_group(cap_group_index)
                .ok_or(Error::BadKey)?;
            cap_group_index += 1;
            match prefix_cap.text().chars().last() {
                Some('B') | Some('b') => 1,
                Some('0') | Some('O') | Some('o') => 3,
                Some('X') | Some('x') => 4,
                // No prefix matched: it must be base 10.
                _ => 10,
            }
        } else {
            self.unprefixed_base_or_shift
        };
        let digits_cap = capture0
            .capture_group(cap_group_index)
            .ok_or(Error::BadKey)?;
        let mut accumulator: u64 = 0;
        if base_or_shift == 10 {
            for cp in digits_cap.text().chars() {
                accumulator = accumulator
                    .wrapping_mul(10)
                    .wrapping_add((cp as u64).wrapping_sub('0' as u64));
            }
        } else {
            // Power-of-two base: shift and or.
            for cp in digits_cap.text().chars() {
                accumulator <<= base_or_shift;
                accumulator |= match cp {
                    '0'..='9' => cp as u64 - '0' as u64,
                    'a'..='f' => cp as u64 - 'a' as u64 + 10,
                    'A'..='F' => cp as u64 - 'A' as u64 + 10,
                    _ => 0,
                };
            }
        }
        Ok(T::from_accumulator(accumulator, negative))
    }
}

macro_rules! impl_from_text_int {
    ($($t:ty),*) => {$(
        impl FromText for $t {
            type Adapter = IntAdapter<$t>;
        }
    )*};
}

impl_from_text_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

// ─── strings ─────────────────────────────────────────────────────────────────

/// Adapter matching an arbitrary expression (default `.*`) and copying the
/// matched text.
#[derive(Default)]
pub struct StrAdapter;

impl StrAdapter {
    fn states(
        format: &RegexCaptureFormat,
        parser: &mut Parser,
    ) -> Result<Option<StateHandle>, Error> {
        if !format.expr.is_empty() {
            return Regex::new(parser, &format.expr).parse_with_no_captures();
        }
        // Default to any text at all.
        let any_cp = parser.create_codepoint_range_state('\0', char::MAX);
        let any_rep = parser.create_repetition_group(Some(any_cp), 0, None);
        Ok(Some(any_rep))
    }
}

impl FromTextAdapter<Str> for StrAdapter {
    fn format_to_parser_states(
        &mut self,
        format: &RegexCaptureFormat,
        parser: &mut Parser,
    ) -> Result<Option<StateHandle>, Error> {
        Self::states(format, parser)
    }

    fn convert_capture(&self, capture0: &MatchCapture<'_>) -> Result<Str, Error> {
        Ok(capture0.text())
    }
}

impl FromText for Str {
    type Adapter = StrAdapter;
}

/// Adapter delegating to [`StrAdapter`] and converting to `String`.
#[derive(Default)]
pub struct StringAdapter;

impl FromTextAdapter<String> for StringAdapter {
    fn format_to_parser_states(
        &mut self,
        format: &RegexCaptureFormat,
        parser: &mut Parser,
    ) -> Result<Option<StateHandle>, Error> {
        StrAdapter::states(format, parser)
    }

    fn convert_capture(&self, capture0: &MatchCapture<'_>) -> Result<String, Error> {
        Ok(capture0.text().to_std_string())
    }
}

impl FromText for String {
    type Adapter = StringAdapter;
}

// ─── sequences ───────────────────────────────────────────────────────────────

/// Adapter parsing `{elt, elt, …}` sequences; the capture format applies to
/// every element.
pub struct SequenceAdapter<T: FromText> {
    separator: Str,
    start_delim: Str,
    end_delim: Str,
    elt_adapter: T::Adapter,
}

impl<T: FromText> Default for SequenceAdapter<T> {
    fn default() -> Self {
        SequenceAdapter {
            separator: Str::from_static(", "),
            // Braces are quantifier syntax, so the delimiters arrive escaped.
            start_delim: Str::from_static("\\{"),
            end_delim: Str::from_static("\\}"),
            elt_adapter: T::Adapter::default(),
        }
    }
}

/// Compiles a capture-free expression into a `{1,1}` group (an empty
/// expression yields an empty group).
fn expr_to_group(parser: &mut Parser, expr: &Str) -> Result<StateHandle, Error> {
    let first_state = if expr.is_empty() {
        None
    } else {
        Regex::new(parser, expr).parse_with_no_captures()?
    };
    Ok(parser.create_repetition_group(first_state, 1, Some(1)))
}

impl<T: FromText> FromTextAdapter<Vec<T>> for SequenceAdapter<T> {
    fn format_to_parser_states(
        &mut self,
        format: &RegexCaptureFormat,
        parser: &mut Parser,
    ) -> Result<Option<StateHandle>, Error> {
        let elt_format = RegexCaptureFormat {
            expr: format.expr.clone(),
            vars: Vec::new(),
        };
        let elt_first_state = self.elt_adapter.format_to_parser_states(&elt_format, parser)?;

        let more_elt_cap_group = parser.create_capture_group(elt_first_state);
        let separator_first_state = expr_to_group(parser, &self.separator)?;
        parser.set_next(separator_first_state, Some(more_elt_cap_group));
        let more_elt_cap_rep_group =
            parser.create_repetition_group(Some(separator_first_state), 0, None);
        let first_elt_cap_group = parser.create_capture_group(elt_first_state);
        parser.set_next(first_elt_cap_group, Some(more_elt_cap_rep_group));
        let all_elt_rep_group = parser.create_repetition_group(Some(first_elt_cap_group), 0, Some(1));
        let end_first_state = expr_to_group(parser, &self.end_delim)?;
        parser.set_next(all_elt_rep_group, Some(end_first_state));
        let start_first_state = expr_to_group(parser, &self.start_delim)?;
        parser.set_next(start_first_state, Some(all_elt_rep_group));
        Ok(Some(start_first_state))
    }

    fn convert_capture(&self, capture0: &MatchCapture<'_>) -> Result<Vec<T>, Error> {
        let mut out = Vec::new();
        let all_elts = capture0.repetition_group(1).ok_or(Error::BadKey)?;
        if all_elts.is_empty() {
            return Ok(out);
        }
        let all_elts_group = all_elts.get(0).expect("non-empty repetition");
        let first_elt = all_elts_group.capture_group(0).ok_or(Error::BadKey)?;
        out.push(self.elt_adapter.convert_capture(&first_elt)?);
        if let Some(more_elts) = all_elts_group.repetition_group(0) {
            for occurrence_index in 0..more_elts.len() {
                let occurrence = more_elts.get(occurrence_index).expect("in bounds");
                let elt = occurrence.capture_group(0).ok_or(Error::BadKey)?;
                out.push(self.elt_adapter.convert_capture(&elt)?);
            }
        }
        Ok(out)
    }
}

impl<T: FromText> FromText for Vec<T> {
    type Adapter = SequenceAdapter<T>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_literals() {
        assert_eq!(from_text::<bool>(&Str::from("true"), ""), Ok(true));
        assert_eq!(from_text::<bool>(&Str::from("false"), ""), Ok(false));
        assert!(from_text::<bool>(&Str::from("yes"), "").is_err());
    }

    #[test]
    fn decimal_default() {
        assert_eq!(from_text::<u32>(&Str::from("42"), ""), Ok(42));
        assert_eq!(from_text::<i32>(&Str::from("-42"), "d"), Ok(-42));
        assert_eq!(from_text::<i32>(&Str::from("+7"), "d"), Ok(7));
    }

    #[test]
    fn multi_base_prefixed() {
        assert_eq!(from_text::<u32>(&Str::from("0b10"), "#bdx"), Ok(2));
        assert_eq!(from_text::<u32>(&Str::from("0x10"), "#bdx"), Ok(16));
        assert_eq!(from_text::<u32>(&Str::from("10"), "#bdx"), Ok(10));
    }

    #[test]
    fn single_base_unprefixed() {
        assert_eq!(from_text::<u32>(&Str::from("10"), "b"), Ok(2));
        assert_eq!(from_text::<u32>(&Str::from("ff"), "x"), Ok(255));
        assert_eq!(from_text::<u32>(&Str::from("17"), "o"), Ok(15));
    }

    #[test]
    fn octal_zero_prefix_beats_decimal() {
        assert_eq!(from_text::<u32>(&Str::from("017"), "#"), Ok(15));
        assert_eq!(from_text::<u32>(&Str::from("0o17"), "#"), Ok(15));
    }

    #[test]
    fn multiple_bases_require_prefix() {
        assert!(from_text::<u32>(&Str::from("10"), "bd").is_err());
    }

    #[test]
    fn str_matches_expression() {
        let parsed = from_text::<Str>(&Str::from("hello"), "[a-z]+").unwrap();
        assert_eq!(parsed, "hello");
        assert!(from_text::<Str>(&Str::from("HELLO"), "[a-z]+").is_err());
    }

    #[test]
    fn sequence_of_integers() {
        assert_eq!(
            from_text::<Vec<u32>>(&Str::from("{1, 2, 3}"), "d"),
            Ok(vec![1, 2, 3])
        );
        assert_eq!(from_text::<Vec<u32>>(&Str::from("{}"), "d"), Ok(vec![]));
        assert_eq!(from_text::<Vec<u32>>(&Str::from("{9}"), "d"), Ok(vec![9]));
    }
}
