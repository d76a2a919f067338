//! Capture-format compiler.
//!
//! Translates a format expression — literals, escapes, `.`, bracket
//! expressions, quantifiers `* + ? {m,n}`, alternation `|`, groups
//! (`(...)` capture, `(?:...)` non-capture, `(?.name='value';)` format
//! variables), and the `^`/`$` anchors — into states of a
//! [`Parser`](super::dynamic::Parser) graph.
//!
//! Structure of the compiler: a stack of subexpressions tracks the current
//! chain, its alternation branches, and their tails. A bracket expression or
//! non-capturing group compiles into a `{1,1}` repetition group wrapping an
//! alternative chain, so the whole construct acts as one state for the
//! quantifier that may follow it. [`Regex::parse_up_to_next_capture`] stops
//! at each capturing group and surrenders its format text to the caller,
//! which compiles the capture's interior with the matching type adapter.

use crate::error::Error;
use crate::text::parsers::dynamic::{Parser, StateHandle};
use crate::text::Str;

/// A `name = value` pair from a `(?.name='value';)` group.
#[derive(Clone, Debug)]
pub struct FormatVar {
    pub name: Str,
    pub value: Str,
}

/// What a capturing group asks of the value that will fill it.
#[derive(Clone, Debug, Default)]
pub struct RegexCaptureFormat {
    /// Format expression inside the group, without the parentheses.
    pub expr: Str,
    /// Format variables set ahead of the expression.
    pub vars: Vec<FormatVar>,
}

/// Outcome of [`Regex::parse_up_to_next_capture`].
pub enum ParseOutcome {
    /// Stopped at capturing group number `.0`; its format was written to the
    /// supplied [`RegexCaptureFormat`].
    Capture(u32),
    /// The expression is exhausted; `.0` is the graph's entry state.
    End(Option<StateHandle>),
}

/// One nesting level: the chain being built, its alternation state, and the
/// branch tails that must eventually be joined to whatever follows.
#[derive(Default)]
struct Subexpression {
    first_state: Option<StateHandle>,
    curr_alternative_first_state: Option<StateHandle>,
    curr_state: Option<StateHandle>,
    alternative_last_states: Vec<StateHandle>,
    /// The `{1,1}` repetition group this level compiles into, for
    /// non-capturing groups.
    group_shell: Option<StateHandle>,
}

impl Subexpression {
    fn with_shell(shell: StateHandle) -> Subexpression {
        Subexpression {
            group_shell: Some(shell),
            ..Subexpression::default()
        }
    }

    /// Appends `new_state` to the chain.
    fn push_next(&mut self, parser: &mut Parser, new_state: Option<StateHandle>) {
        if let Some(curr) = self.curr_state {
            parser.set_next(curr, new_state);
        } else {
            self.first_state = new_state;
            self.curr_alternative_first_state = new_state;
        }
        self.curr_state = new_state;
    }

    /// Starts a new alternation branch at `new_state`.
    fn push_alternative(&mut self, parser: &mut Parser, new_state: Option<StateHandle>) {
        if let Some(curr) = self.curr_state {
            self.alternative_last_states.push(curr);
            if let Some(branch_head) = self.curr_alternative_first_state {
                parser.set_alternative(branch_head, new_state);
            }
        } else {
            self.first_state = new_state;
        }
        self.curr_state = new_state;
        self.curr_alternative_first_state = new_state;
    }

    /// Joins every branch tail to `next_state`. The tail list survives so a
    /// later re-termination (a quantifier wrapping the chain) can move the
    /// joins.
    fn terminate_with_next_state(&mut self, parser: &mut Parser, next_state: Option<StateHandle>) {
        if let Some(curr) = self.curr_state.take() {
            self.alternative_last_states.push(curr);
        }
        for &tail in &self.alternative_last_states {
            parser.set_next(tail, next_state);
        }
    }
}

/// Compiler over one format expression.
pub struct Regex<'p> {
    parser: &'p mut Parser,
    /// Decoded expression, for cursor-based scanning.
    cps: Vec<char>,
    itr: usize,
    expr_text: String,
    next_capture_index: u32,
    begin_alternative: bool,
    subexpr_stack: Vec<Subexpression>,
    /// Chain position just before the current state, so a quantifier can
    /// re-point its predecessors at the new repetition group.
    prev_subexpr: Subexpression,
}

impl<'p> Regex<'p> {
    /// Prepares to compile `expr` into `parser`.
    pub fn new(parser: &'p mut Parser, expr: &Str) -> Regex<'p> {
        Regex {
            parser,
            cps: expr.chars().collect(),
            itr: 0,
            expr_text: expr.to_std_string(),
            next_capture_index: 0,
            begin_alternative: false,
            subexpr_stack: vec![Subexpression::default()],
            prev_subexpr: Subexpression::default(),
        }
    }

    fn syntax_error<T>(&self, description: &'static str) -> Result<T, Error> {
        Err(Error::Syntax {
            description,
            expression: self.expr_text.clone(),
            // The first character is 1, to human beings.
            char_index: self.itr + 1,
        })
    }

    /// Compiles the whole expression, rejecting capturing groups.
    pub fn parse_with_no_captures(mut self) -> Result<Option<StateHandle>, Error> {
        match self.parse_up_to_next_capture(None)? {
            ParseOutcome::Capture(_) => {
                self.syntax_error("capturing groups not supported in this expression")
            }
            ParseOutcome::End(first_state) => Ok(first_state),
        }
    }

    /// Compiles states up to the next capturing group, or to the end.
    ///
    /// With `capture_format` absent, merely encountering a capturing group
    /// reports `Capture(0)` so the caller can reject it.
    pub fn parse_up_to_next_capture(
        &mut self,
        mut capture_format: Option<&mut RegexCaptureFormat>,
    ) -> Result<ParseOutcome, Error> {
        let mut escape = false;
        while self.itr < self.cps.len() {
            let cp = self.cps[self.itr];
            self.itr += 1;
            if escape {
                escape = false;
                let state = self.parser.create_codepoint_state(cp);
                self.push_state(Some(state));
                continue;
            }
            match cp {
                '.' => {
                    let state = self
                        .parser
                        .create_codepoint_range_state('\0', char::MAX);
                    self.push_state(Some(state));
                }
                '[' => {
                    if self.itr >= self.cps.len() {
                        return self.syntax_error("unexpected end of bracket expression");
                    }
                    let shell = self.parser.create_repetition_group(None, 1, Some(1));
                    self.push_state(Some(shell));
                    if self.cps[self.itr] == '^' {
                        self.itr += 1;
                        if self.itr >= self.cps.len() {
                            return self
                                .syntax_error("unexpected end of negative bracket expression");
                        }
                        self.parse_negative_bracket_expression(shell)?;
                    } else {
                        self.parse_positive_bracket_expression(shell)?;
                    }
                }
                '\\' => escape = true,
                '(' => {
                    if let Some(capture_index) = self.parse_group(capture_format.as_deref_mut())? {
                        return Ok(ParseOutcome::Capture(capture_index));
                    }
                }
                ')' => self.end_group()?,
                '*' => self.set_curr_state_repetitions(0, None)?,
                '+' => self.set_curr_state_repetitions(1, None)?,
                '?' => self.set_curr_state_repetitions(0, Some(1))?,
                '{' => {
                    let (min, max) = self.parse_repetition_range()?;
                    self.set_curr_state_repetitions(min, max)?;
                }
                '|' => self.begin_alternative = true,
                '^' => {
                    let state = self.parser.create_begin_state();
                    self.push_state(Some(state));
                }
                '$' => {
                    let state = self.parser.create_end_state();
                    self.push_state(Some(state));
                }
                other => {
                    let state = self.parser.create_codepoint_state(other);
                    self.push_state(Some(state));
                }
            }
        }
        if escape || self.begin_alternative {
            return self.syntax_error("unexpected final state");
        }
        if self.subexpr_stack.len() != 1 {
            return self.syntax_error("mismatched parentheses");
        }
        let first_state = self.subexpr_stack[0].first_state;
        Ok(ParseOutcome::End(first_state))
    }

    /// Handles `(` — a group modifier, a format-variable group, or a
    /// capturing group. Returns the capture index for captures, `None`
    /// otherwise.
    fn parse_group(
        &mut self,
        capture_format: Option<&mut RegexCaptureFormat>,
    ) -> Result<Option<u32>, Error> {
        if self.itr >= self.cps.len() {
            return self.syntax_error("unexpected end of group");
        }
        if self.cps[self.itr] == '?' {
            self.itr += 1;
            if self.itr >= self.cps.len() {
                return self.syntax_error("unexpected end of group modifier");
            }
            match self.cps[self.itr] {
                ':' => {
                    self.itr += 1;
                    // Non-capturing group: a {1,1} shell whose contents are
                    // collected by a fresh subexpression until ')'.
                    let shell = self.parser.create_repetition_group(None, 1, Some(1));
                    self.push_state(Some(shell));
                    self.subexpr_stack.push(Subexpression::with_shell(shell));
                    return Ok(None);
                }
                '.' => {
                    let Some(capture_format) = capture_format else {
                        // The caller only wants to know a capture is here.
                        return Ok(Some(0));
                    };
                    self.parse_format_vars(capture_format)?;
                    if self.itr < self.cps.len() && self.cps[self.itr] == ')' {
                        // Pure variable group; nothing is captured.
                        self.itr += 1;
                        return Ok(None);
                    }
                    return self.finish_capture_group(Some(capture_format));
                }
                _ => return self.syntax_error("unsupported group modifier"),
            }
        }
        match capture_format {
            Some(capture_format) => self.finish_capture_group(Some(capture_format)),
            None => Ok(Some(0)),
        }
    }

    /// Parses the `name='value'[, name='value']…;` list of a `(?.` group.
    fn parse_format_vars(&mut self, capture_format: &mut RegexCaptureFormat) -> Result<(), Error> {
        loop {
            // Consume the '.' (first round) or ','.
            self.itr += 1;
            let name_begin = self.itr;
            while self.itr < self.cps.len() && self.cps[self.itr] != '=' {
                self.itr += 1;
            }
            if self.itr >= self.cps.len() {
                return self
                    .syntax_error("expected \u{201c}=\u{201d} for \u{201c}?.var='value';\u{201d} group modifier");
            }
            let name: String = self.cps[name_begin..self.itr].iter().collect();
            self.itr += 1;
            if self.itr >= self.cps.len() {
                return self.syntax_error("unexpected end of \u{201c}?.var='value';\u{201d} group modifier");
            }
            if self.cps[self.itr] != '\'' {
                return self.syntax_error(
                    "expected single quote for value of \u{201c}?.var='value';\u{201d} group modifier",
                );
            }
            self.itr += 1;
            let mut value = String::new();
            let mut escape = false;
            let mut closed = false;
            while self.itr < self.cps.len() {
                let cp = self.cps[self.itr];
                self.itr += 1;
                if escape {
                    value.push(cp);
                    escape = false;
                } else if cp == '\\' {
                    escape = true;
                } else if cp == '\'' {
                    closed = true;
                    break;
                } else {
                    value.push(cp);
                }
            }
            if !closed || self.itr >= self.cps.len() {
                return self.syntax_error("unexpected end of \u{201c}?.var='value';\u{201d} group modifier");
            }
            capture_format.vars.push(FormatVar {
                name: Str::from(name),
                value: Str::from(value),
            });
            if self.cps[self.itr] != ',' {
                break;
            }
        }
        if self.cps[self.itr] != ';' {
            return self.syntax_error(
                "expected \u{201c},\u{201d} or \u{201c};\u{201d} after value of \u{201c}?.var='value';\u{201d} group modifier",
            );
        }
        self.itr += 1;
        Ok(())
    }

    /// Reads the capture's format expression up to the closing parenthesis
    /// and hands out the next capture index.
    fn finish_capture_group(
        &mut self,
        capture_format: Option<&mut RegexCaptureFormat>,
    ) -> Result<Option<u32>, Error> {
        let expr_begin = self.itr;
        let mut escape = false;
        while self.itr < self.cps.len() {
            if escape {
                escape = false;
            } else {
                let cp = self.cps[self.itr];
                if cp == '\\' {
                    escape = true;
                } else if cp == ')' {
                    break;
                }
            }
            self.itr += 1;
        }
        if self.itr >= self.cps.len() {
            return self.syntax_error("unterminated capturing group");
        }
        if let Some(capture_format) = capture_format {
            let expr: String = self.cps[expr_begin..self.itr].iter().collect();
            capture_format.expr = Str::from(expr);
        }
        // Consume the closing parenthesis as part of the capture.
        self.itr += 1;
        let index = self.next_capture_index;
        self.next_capture_index += 1;
        Ok(Some(index))
    }

    /// Handles `)`: closes the innermost non-capturing group.
    fn end_group(&mut self) -> Result<(), Error> {
        if self.subexpr_stack.len() <= 1 {
            return self.syntax_error("mismatched parentheses");
        }
        let mut done = self.subexpr_stack.pop().expect("stack checked above");
        // Branch tails end the group's occurrence.
        done.terminate_with_next_state(self.parser, None);
        let shell = done.group_shell.expect("only shell groups are stacked");
        self.parser.set_group_first(shell, done.first_state);
        self.prev_subexpr = Subexpression::default();
        Ok(())
    }

    /// Parses `{m}`, `{m,}`, or `{m,n}` after the opening brace.
    fn parse_repetition_range(&mut self) -> Result<(u16, Option<u16>), Error> {
        let mut empty = true;
        let mut min: u16 = 0;
        let mut has_comma = false;
        let mut max_value: u16 = 0;
        let mut max_seen = false;
        while self.itr < self.cps.len() {
            let cp = self.cps[self.itr];
            if !cp.is_ascii_digit() {
                break;
            }
            min = min.wrapping_mul(10).wrapping_add(cp as u16 - b'0' as u16);
            empty = false;
            self.itr += 1;
        }
        if self.itr < self.cps.len() && self.cps[self.itr] == ',' {
            has_comma = true;
            self.itr += 1;
            while self.itr < self.cps.len() {
                let cp = self.cps[self.itr];
                if !cp.is_ascii_digit() {
                    break;
                }
                max_value = max_value
                    .wrapping_mul(10)
                    .wrapping_add(cp as u16 - b'0' as u16);
                empty = false;
                max_seen = true;
                self.itr += 1;
            }
        }
        if self.itr >= self.cps.len() || self.cps[self.itr] != '}' || empty {
            return self.syntax_error("malformed repetition range");
        }
        self.itr += 1;
        let max = if !has_comma {
            Some(min) // {m} is exactly m
        } else if max_seen {
            Some(max_value)
        } else {
            None // {m,} is unbounded
        };
        Ok((min, max))
    }

    /// Builds the alternative chain of a `[...]` expression under `shell`.
    fn parse_positive_bracket_expression(&mut self, shell: StateHandle) -> Result<(), Error> {
        let first_cp = self.cps[self.itr];
        self.itr += 1;
        let head = self.parser.create_codepoint_state(first_cp);
        let mut last_alternative = head;
        let mut last_range_state = head;
        let mut forming_range = false;
        let mut escape = false;
        while self.itr < self.cps.len() {
            let cp = self.cps[self.itr];
            self.itr += 1;
            if cp == ']' && !escape {
                if forming_range {
                    // The dash did not start a range after all; match it.
                    let dash = self.parser.create_codepoint_state('-');
                    self.parser.set_alternative(last_alternative, Some(dash));
                }
                self.parser.set_group_first(shell, Some(head));
                return Ok(());
            }
            if forming_range {
                forming_range = false;
                // Extend the previous codepoint state into a range.
                self.parser.convert_to_range(last_range_state, cp);
                continue;
            }
            if escape {
                escape = false;
            } else if cp == '-' {
                forming_range = true;
                continue;
            } else if cp == '\\' {
                escape = true;
                continue;
            }
            let state = self.parser.create_codepoint_state(cp);
            self.parser.set_alternative(last_alternative, Some(state));
            last_alternative = state;
            last_range_state = state;
        }
        self.syntax_error("unexpected end of bracket expression")
    }

    /// Builds the complement-range alternative chain of a `[^...]`
    /// expression under `shell`.
    fn parse_negative_bracket_expression(&mut self, shell: StateHandle) -> Result<(), Error> {
        let first_excluded = self.cps[self.itr] as u32;
        self.itr += 1;
        let mut next_range_begin = first_excluded + 1;
        // First alternative: everything below the first excluded codepoint.
        let head = match self.make_range_state(0, first_excluded.wrapping_sub(1)) {
            Some(state) => state,
            // Excluding U+0000 leaves no low range; park a never-matching
            // state as the chain head.
            None => self.parser.create_codepoint_range_state('\u{1}', '\0'),
        };
        let mut last_alternative = head;
        let mut forming_range = false;
        let mut escape = false;
        while self.itr < self.cps.len() {
            let cp = self.cps[self.itr] as u32;
            self.itr += 1;
            if cp == ']' as u32 && !escape {
                if forming_range {
                    // The dash was literal: exclude it as well.
                    if let Some(state) = self.make_range_state(next_range_begin, '-' as u32 - 1) {
                        self.parser.set_alternative(last_alternative, Some(state));
                        last_alternative = state;
                    }
                    next_range_begin = '-' as u32 + 1;
                }
                // Close the complement with everything above the last
                // excluded codepoint.
                if let Some(state) = self.make_range_state(next_range_begin, char::MAX as u32) {
                    self.parser.set_alternative(last_alternative, Some(state));
                }
                self.parser.set_group_first(shell, Some(head));
                return Ok(());
            }
            if forming_range {
                forming_range = false;
                next_range_begin = cp + 1;
                continue;
            }
            if escape {
                escape = false;
            } else if cp == '-' as u32 {
                forming_range = true;
                continue;
            } else if cp == '\\' as u32 {
                escape = true;
                continue;
            }
            if cp > next_range_begin {
                // A gap between excluded codepoints becomes an alternative.
                if let Some(state) = self.make_range_state(next_range_begin, cp - 1) {
                    self.parser.set_alternative(last_alternative, Some(state));
                    last_alternative = state;
                }
            }
            next_range_begin = cp + 1;
        }
        self.syntax_error("unexpected end of bracket expression")
    }

    /// Range state over `[lo, hi]`, clamped around the surrogate block;
    /// `None` when the clamped range is empty.
    fn make_range_state(&mut self, lo: u32, hi: u32) -> Option<StateHandle> {
        let lo = if (0xd800..=0xdfff).contains(&lo) { 0xe000 } else { lo };
        let hi = if (0xd800..=0xdfff).contains(&hi) { 0xd7ff } else { hi };
        if lo > hi || lo > char::MAX as u32 {
            return None;
        }
        let hi = hi.min(char::MAX as u32);
        let lo = char::from_u32(lo)?;
        let hi = char::from_u32(hi)?;
        Some(self.parser.create_codepoint_range_state(lo, hi))
    }

    /// Links `new_state` into the current subexpression, honoring a pending
    /// alternation.
    fn push_state(&mut self, new_state: Option<StateHandle>) {
        if self.begin_alternative {
            self.begin_alternative = false;
            self.prev_subexpr = Subexpression::default();
            let top = self.subexpr_stack.last_mut().expect("stack never empty");
            top.push_alternative(self.parser, new_state);
            return;
        }
        // Track the predecessor as its own mini-subexpression, so a later
        // quantifier can re-point it at the repetition group it creates.
        self.prev_subexpr = Subexpression::default();
        let top = self.subexpr_stack.last_mut().expect("stack never empty");
        if let Some(prev_state) = top.curr_state {
            self.prev_subexpr.push_next(self.parser, Some(prev_state));
        }
        let top = self.subexpr_stack.last_mut().expect("stack never empty");
        top.push_next(self.parser, new_state);
    }

    /// Applies a quantifier to the current state, wrapping it in a
    /// repetition group unless it already is one.
    fn set_curr_state_repetitions(&mut self, min: u16, max: Option<u16>) -> Result<(), Error> {
        let top = self.subexpr_stack.last_mut().expect("stack never empty");
        let Some(curr) = top.curr_state else {
            return self.syntax_error("expression cannot start with ?*+{");
        };
        if self.parser.is_repetition(curr) {
            // Bracket shells and non-capturing groups are already groups;
            // just adjust the bounds.
            self.parser.set_repetition_bounds(curr, min, max);
            return Ok(());
        }
        let group = self.parser.create_repetition_group(Some(curr), min, max);
        // Whatever pointed at the bare state must point at the group now.
        self.prev_subexpr
            .terminate_with_next_state(self.parser, Some(group));
        let top = self.subexpr_stack.last_mut().expect("stack never empty");
        if top.first_state == Some(curr) {
            top.first_state = Some(group);
        }
        if top.curr_alternative_first_state == Some(curr) {
            top.curr_alternative_first_state = Some(group);
        }
        top.curr_state = Some(group);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(expr: &str) -> (Parser, Option<StateHandle>) {
        let mut parser = Parser::new();
        let expr = Str::from(expr);
        let first = Regex::new(&mut parser, &expr)
            .parse_with_no_captures()
            .expect("expression compiles");
        (parser, first)
    }

    fn matches(expr: &str, input: &str) -> bool {
        let (parser, first) = compile(expr);
        parser.run_full(first, &Str::from(input)).is_some()
    }

    #[test]
    fn literal_chain() {
        assert!(matches("abc", "abc"));
        assert!(!matches("abc", "abx"));
        assert!(!matches("abc", "abcd"));
    }

    #[test]
    fn quantifiers() {
        assert!(matches("ab*c", "ac"));
        assert!(matches("ab*c", "abbbc"));
        assert!(matches("ab+c", "abc"));
        assert!(!matches("ab+c", "ac"));
        assert!(matches("ab?c", "ac"));
        assert!(matches("ab{2,3}c", "abbc"));
        assert!(!matches("ab{2,3}c", "abc"));
        assert!(!matches("ab{2,3}c", "abbbbc"));
        assert!(matches("ab{2}c", "abbc"));
        assert!(!matches("ab{2}c", "abbbc"));
    }

    #[test]
    fn alternation_spans_to_the_end() {
        assert!(matches("ab|cd", "ab"));
        assert!(matches("ab|cd", "cd"));
        assert!(!matches("ab|cd", "ad"));
    }

    #[test]
    fn bracket_expressions() {
        assert!(matches("[abc]x", "bx"));
        assert!(!matches("[abc]x", "dx"));
        assert!(matches("[a-z]+", "hello"));
        assert!(!matches("[a-z]+", "Hello"));
        // Trailing dash is literal.
        assert!(matches("[a-]", "-"));
    }

    #[test]
    fn negative_bracket_expressions() {
        assert!(matches("[^a-z]", "A"));
        assert!(!matches("[^a-z]", "q"));
        assert!(matches("[^abc]+", "xyz"));
        assert!(!matches("[^abc]+", "xbz"));
    }

    #[test]
    fn non_capturing_group_with_quantifier() {
        assert!(matches("(?:ab)+", "ababab"));
        assert!(!matches("(?:ab)+", "aba"));
        assert!(matches("x(?:ab|cd)*y", "xabcdaby"));
        assert!(matches("x(?:ab|cd)*y", "xy"));
    }

    #[test]
    fn anchors() {
        assert!(matches("^a$", "a"));
        assert!(!matches("^a$", "ab"));
    }

    #[test]
    fn escapes() {
        assert!(matches(r"a\*b", "a*b"));
        assert!(matches(r"\[x\]", "[x]"));
        assert!(matches(r"[a\]]+", "a]a"));
    }

    #[test]
    fn format_vars_are_collected() {
        let mut parser = Parser::new();
        let expr = Str::from("(?.width='3',fill='0';)x");
        let mut regex = Regex::new(&mut parser, &expr);
        let mut format = RegexCaptureFormat::default();
        match regex.parse_up_to_next_capture(Some(&mut format)).unwrap() {
            ParseOutcome::End(_) => {}
            ParseOutcome::Capture(_) => panic!("variable group is not a capture"),
        }
        assert_eq!(format.vars.len(), 2);
        assert_eq!(format.vars[0].name, "width");
        assert_eq!(format.vars[0].value, "3");
        assert_eq!(format.vars[1].name, "fill");
        assert_eq!(format.vars[1].value, "0");
    }

    #[test]
    fn capture_group_surrenders_its_format() {
        let mut parser = Parser::new();
        let expr = Str::from("a(#bdx)b");
        let mut regex = Regex::new(&mut parser, &expr);
        let mut format = RegexCaptureFormat::default();
        match regex.parse_up_to_next_capture(Some(&mut format)).unwrap() {
            ParseOutcome::Capture(index) => assert_eq!(index, 0),
            ParseOutcome::End(_) => panic!("expected a capture"),
        }
        assert_eq!(format.expr, "#bdx");
    }

    #[test]
    fn capture_rejected_without_format() {
        let mut parser = Parser::new();
        let expr = Str::from("(x)");
        let err = Regex::new(&mut parser, &expr)
            .parse_with_no_captures()
            .unwrap_err();
        assert_eq!(err.error_name(), "syntax_error");
    }

    #[test]
    fn unterminated_bracket_is_a_syntax_error() {
        let mut parser = Parser::new();
        let expr = Str::from("[abc");
        let err = Regex::new(&mut parser, &expr)
            .parse_with_no_captures()
            .unwrap_err();
        assert_eq!(err.error_name(), "syntax_error");
    }
}
