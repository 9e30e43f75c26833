use std::rc::Rc;

/// A point in a source file: byte index plus 0-based line/column.
///
/// Line and column are kept 0-based internally and rendered 1-based, the
/// same split the original interpreter this language was modeled on used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub file_name: Rc<str>,
    pub index: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn start(file_name: Rc<str>) -> Self {
        Self {
            file_name,
            index: 0,
            line: 0,
            column: 0,
        }
    }

    /// Advance past a single character, accounting for newlines.
    pub fn advance(&mut self, ch: char) {
        self.index += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
    }

    pub fn advance_by(&mut self, text: &str) {
        for ch in text.chars() {
            self.advance(ch);
        }
    }
}

/// A half-open range of source positions covering a token or AST node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Render the source line containing `span.start`, followed by a caret
/// marker under the offending column:
///
/// ```text
/// 3:    for i <- 1 to n:
///       ----^-
/// ```
pub fn render_marker(source: &str, span: &Span) -> String {
    let Some(line_text) = source.lines().nth(span.start.line) else {
        return String::new();
    };
    let line_no = span.start.line + 1;
    let gutter = format!("{line_no}:    ");
    let mut out = String::new();
    out.push_str(&gutter);
    out.push_str(line_text);
    out.push('\n');
    out.push_str(&" ".repeat(gutter.len()));
    out.push_str(&"-".repeat(span.start.column));
    out.push('^');
    out.push('-');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_tracks_line_and_column() {
        let mut pos = Position::start(Rc::from("test"));
        pos.advance_by("ab\ncd");
        assert_eq!(pos.line, 1);
        assert_eq!(pos.column, 2);
        assert_eq!(pos.index, 5);
    }

    #[test]
    fn marker_points_at_column() {
        let source = "x <- 1\ny <- 2\n";
        let pos = Position {
            file_name: Rc::from("t"),
            index: 7,
            line: 1,
            column: 2,
        };
        let marker = render_marker(source, &Span::new(pos.clone(), pos));
        assert!(marker.contains("2:    y <- 2"));
        assert!(marker.ends_with("--^-"));
    }
}
