//! The binary boundary's own error type, plus coloured diagnostic rendering
//! for parse/runtime errors surfaced from the library.
//!
//! Nothing inside the library returns `Result` for language-level failures —
//! those are `Value::Error`/`Node::Error` sentinels, since the original
//! interpreter treats a malformed program as ordinary output rather than a
//! process failure. `CliError` only covers failures that happen before the
//! interpreter ever runs: the file named on the command line doesn't exist,
//! or isn't valid UTF-8.

use colored::Colorize;

use crate::position::{render_marker, Span};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("could not read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not valid UTF-8")]
    InvalidUtf8 { path: String },
}

const ERROR_COLOR: (u8, u8, u8) = (0xFF, 0x39, 0x6E);
pub const PROMPT_COLOR: (u8, u8, u8) = (0x34, 0xD3, 0xDE);

fn colorize(message: &str) -> String {
    let (r, g, b) = ERROR_COLOR;
    message.truecolor(r, g, b).to_string()
}

/// Render a runtime error. `Value::Error` carries no source span (the
/// evaluator doesn't thread one through), so this only colours the tag the
/// message already carries ("Runtime ERROR: ...").
pub fn format_runtime_error(message: &str) -> String {
    colorize(message)
}

/// Render a parse error (`Node::Error`'s message is bare; this adds the tag
/// and the caret marker, since the parser does keep a span per failure).
pub fn format_parse_error(source: &str, message: &str, span: &Span) -> String {
    let marker = render_marker(source, span);
    format!("{}\n{}", colorize(&format!("Parse ERROR: {message}")), marker)
}
