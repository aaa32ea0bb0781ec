//! Comment-block discovery and line tokenization.
//!
//! A file is scanned for `/** ... */` blocks (`**/` is the customary closer).
//! Each block is exposed as a lazy iterator of [`Line`]s with the `*` marker
//! stripped. Malformed markers are passed through as plain text.

/// Columns a tab expands to when normalizing indentation.
const TAB_WIDTH: usize = 4;

/// One `/** ... */` comment block.
#[derive(Debug, Clone, Copy)]
pub struct Block<'a> {
    /// Text between the opener and the closer
    pub body: &'a str,
    /// 1-based source line of the `/**` opener
    pub line: usize,
}

impl<'a> Block<'a> {
    /// Iterate the block's logical lines. Restartable: each call starts over.
    pub fn lines(&self) -> Lines<'a> {
        Lines {
            inner: self.body.split('\n'),
            line: self.line,
            first: true,
        }
    }
}

/// A logical line of a comment block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line<'a> {
    /// Leading whitespace (after the marker) in columns
    pub indent: usize,
    /// Content with leading and trailing whitespace removed
    pub text: &'a str,
    /// 1-based source line
    pub line: usize,
}

impl Line<'_> {
    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }
}

/// Lazy line iterator over one block.
pub struct Lines<'a> {
    inner: std::str::Split<'a, char>,
    line: usize,
    first: bool,
}

impl<'a> Iterator for Lines<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Line<'a>> {
        let raw = self.inner.next()?;
        let line = self.line;
        self.line += 1;

        // Text after `/**` on the opening line is its own logical line.
        if std::mem::take(&mut self.first) {
            return Some(normalize(raw.trim_start(), line));
        }
        Some(normalize(strip_marker(raw), line))
    }
}

/// Find every comment block in `source`, in order.
pub fn blocks(source: &str) -> Vec<Block<'_>> {
    let mut out = Vec::new();
    let mut rest = source;
    let mut offset = 0;

    while let Some(start) = rest.find("/**") {
        let body_start = start + 3;
        let after = &rest[body_start..];
        // `/**/` is an empty ordinary comment, not a doc block
        if after.starts_with('/') {
            offset += body_start + 1;
            rest = &rest[body_start + 1..];
            continue;
        }
        let line = line_number(source, offset + start);
        match after.find("*/") {
            Some(end) => {
                let mut body = &after[..end];
                // `**/` closer: drop the extra star
                body = body.strip_suffix('*').unwrap_or(body);
                out.push(Block { body, line });
                let consumed = body_start + end + 2;
                offset += consumed;
                rest = &rest[consumed..];
            }
            None => {
                // Unterminated final block runs to end of file
                out.push(Block { body: after, line });
                break;
            }
        }
    }
    out
}

/// Remove the leading ` * ` marker from a continuation line.
fn strip_marker(raw: &str) -> &str {
    let trimmed = raw.trim_start();
    match trimmed.strip_prefix('*') {
        // exactly one separating space belongs to the marker
        Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
        None => raw,
    }
}

fn normalize(text: &str, line: usize) -> Line<'_> {
    let mut indent = 0;
    for c in text.chars() {
        match c {
            ' ' => indent += 1,
            '\t' => indent += TAB_WIDTH,
            _ => break,
        }
    }
    Line {
        indent,
        text: text.trim(),
        line,
    }
}

fn line_number(source: &str, byte_offset: usize) -> usize {
    source[..byte_offset].matches('\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(block: &Block<'a>) -> Vec<&'a str> {
        block.lines().map(|l| l.text).collect()
    }

    #[test]
    fn finds_blocks_with_both_closers() {
        let src = "/**\n * class tty\n **/\n\ncode();\n/**\n * tty.isatty(fd) -> Boolean\n*/\n";
        let found = blocks(src);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].line, 1);
        assert_eq!(found[1].line, 6);
        assert_eq!(texts(&found[0]), vec!["", "class tty", ""]);
        assert_eq!(texts(&found[1]), vec!["", "tty.isatty(fd) -> Boolean", ""]);
    }

    #[test]
    fn opener_line_text_is_kept() {
        let src = "/** section: Errors\n * class ReferenceError\n **/";
        let found = blocks(src);
        assert_eq!(texts(&found[0])[0], "section: Errors");
        assert_eq!(texts(&found[0])[1], "class ReferenceError");
    }

    #[test]
    fn indentation_is_measured_after_marker() {
        let src = "/**\n * prose\n *     var x = 1;\n *\tindented\n */";
        let block = blocks(src)[0];
        let lines: Vec<Line> = block.lines().collect();
        assert_eq!(lines[1].indent, 0);
        assert_eq!(lines[2].indent, 4);
        assert_eq!(lines[2].text, "var x = 1;");
        assert_eq!(lines[3].indent, TAB_WIDTH);
        assert_eq!(lines[3].line, 4);
    }

    #[test]
    fn missing_marker_passes_through() {
        let src = "/**\n plain text without a star\n */";
        let block = blocks(src)[0];
        let lines: Vec<Line> = block.lines().collect();
        assert_eq!(lines[1].text, "plain text without a star");
    }

    #[test]
    fn unterminated_block_runs_to_eof() {
        let src = "x\n/**\n * new Foo()\n";
        let found = blocks(src);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 2);
        assert!(texts(&found[0]).contains(&"new Foo()"));
    }

    #[test]
    fn empty_comment_is_not_a_block() {
        assert!(blocks("/**/ code();").is_empty());
    }

    #[test]
    fn lines_are_restartable() {
        let block = blocks("/**\n * a\n * b\n */")[0];
        assert_eq!(texts(&block), texts(&block));
    }
}
