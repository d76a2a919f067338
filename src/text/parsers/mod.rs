//! Format parsing: the NFA state graph and the capture-format compiler.

pub mod dynamic;
pub mod regex;

pub use dynamic::{MatchCapture, MatchResult, Parser, RepetitionView, StateHandle};
pub use regex::{FormatVar, ParseOutcome, Regex, RegexCaptureFormat};
