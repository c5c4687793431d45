//! Index-pair tokenizer over an immutable text buffer.
//!
//! Nothing here copies text. The tokenizer moves a cursor through the buffer
//! and exposes the `(start, end)` byte range of the last marked token or line;
//! callers append those ranges to a [`Tokens`] set they own.

use std::ops::Range;

/// Flat list of `(start, end)` byte ranges into one text buffer.
///
/// Built append-only during a parse, immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens {
    indices: Vec<usize>,
}

impl Tokens {
    /// Empty set with room for `count` ranges.
    pub fn with_capacity(count: usize) -> Self {
        Self {
            indices: Vec::with_capacity(2 * count),
        }
    }

    pub fn push(&mut self, start: usize, end: usize) {
        debug_assert!(start <= end, "token range {start}..{end} is inverted");
        self.indices.push(start);
        self.indices.push(end);
    }

    /// Number of ranges.
    pub fn count(&self) -> usize {
        self.indices.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn start(&self, i: usize) -> usize {
        self.indices[2 * i]
    }

    pub fn end(&self, i: usize) -> usize {
        self.indices[2 * i + 1]
    }

    pub fn range(&self, i: usize) -> Range<usize> {
        self.start(i)..self.end(i)
    }

    /// The text of range `i` within `data`.
    pub fn slice<'a>(&self, data: &'a str, i: usize) -> &'a str {
        slice(data, self.start(i), self.end(i))
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (usize, usize)> + '_ {
        self.indices.chunks_exact(2).map(|pair| (pair[0], pair[1]))
    }
}

/// Borrow `data[start..end]`, clamping to the buffer and to char boundaries.
///
/// Fixed-width offsets are byte based and may fall inside a multi-byte
/// character; the range is narrowed instead of panicking.
pub fn slice(data: &str, start: usize, end: usize) -> &str {
    let len = data.len();
    let mut start = start.min(len);
    let mut end = end.min(len);
    while start < end && !data.is_char_boundary(start) {
        start += 1;
    }
    while end > start && !data.is_char_boundary(end) {
        end -= 1;
    }
    if start >= end {
        return "";
    }
    &data[start..end]
}

/// Cursor over a text buffer that marks tokens and lines.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    data: &'a str,
    bytes: &'a [u8],
    position: usize,
    line_number: usize,
    token_start: usize,
    token_end: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(data: &'a str) -> Self {
        Self {
            data,
            bytes: data.as_bytes(),
            position: 0,
            line_number: 1,
            token_start: 0,
            token_end: 0,
        }
    }

    pub fn data(&self) -> &'a str {
        self.data
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// 1-based line number of the cursor.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn is_eof(&self) -> bool {
        self.position >= self.bytes.len()
    }

    /// Byte under the cursor.
    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.position).copied()
    }

    /// True when the cursor sits at the first byte of a line.
    pub fn at_line_start(&self) -> bool {
        self.position == 0 || self.bytes.get(self.position - 1) == Some(&b'\n')
    }

    pub fn token_start(&self) -> usize {
        self.token_start
    }

    pub fn token_end(&self) -> usize {
        self.token_end
    }

    /// Text of the last marked token or line.
    pub fn token(&self) -> &'a str {
        slice(self.data, self.token_start, self.token_end)
    }

    /// Append the last marked range to `tokens`.
    pub fn push_token(&self, tokens: &mut Tokens) {
        tokens.push(self.token_start, self.token_end);
    }

    /// Skip a run of spaces and tabs.
    pub fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t') = self.peek() {
            self.position += 1;
        }
    }

    /// Skip whitespace including line breaks.
    pub fn skip_blank(&mut self) {
        while let Some(b) = self.peek() {
            match b {
                b' ' | b'\t' | b'\r' => self.position += 1,
                b'\n' => {
                    self.position += 1;
                    self.line_number += 1;
                }
                _ => break,
            }
        }
    }

    /// Skip to the end of the current line, leaving the `\n` in place.
    pub fn skip_comment(&mut self) {
        while let Some(b) = self.peek() {
            if b == b'\n' {
                break;
            }
            self.position += 1;
        }
    }

    /// Mark the rest of the current line and step past its terminator.
    ///
    /// The marked range excludes `\n` and a preceding `\r`.
    pub fn mark_line(&mut self) {
        let start = self.position;
        while let Some(b) = self.peek() {
            if b == b'\n' {
                break;
            }
            self.position += 1;
        }
        let mut end = self.position;
        if end > start && self.bytes[end - 1] == b'\r' {
            end -= 1;
        }
        if !self.is_eof() {
            self.position += 1;
            self.line_number += 1;
        }
        self.token_start = start;
        self.token_end = end;
    }

    /// Mark the next whitespace-delimited token on the current line.
    ///
    /// A token opening with `'` or `"` runs to the matching quote that is
    /// followed by whitespace or the end of the buffer; the quotes are not
    /// part of the marked range. An unterminated quote ends at the line end.
    pub fn mark_token(&mut self) {
        self.skip_whitespace();
        match self.peek() {
            Some(quote @ (b'\'' | b'"')) => self.mark_quoted(quote),
            _ => {
                let start = self.position;
                while let Some(b) = self.peek() {
                    if b.is_ascii_whitespace() {
                        break;
                    }
                    self.position += 1;
                }
                self.token_start = start;
                self.token_end = self.position;
            }
        }
    }

    fn mark_quoted(&mut self, quote: u8) {
        self.position += 1;
        let start = self.position;
        loop {
            match self.peek() {
                None => {
                    self.token_start = start;
                    self.token_end = self.position;
                    return;
                }
                Some(b'\n') => {
                    let mut end = self.position;
                    if end > start && self.bytes[end - 1] == b'\r' {
                        end -= 1;
                    }
                    self.token_start = start;
                    self.token_end = end;
                    return;
                }
                Some(b) if b == quote => {
                    let closes = self
                        .bytes
                        .get(self.position + 1)
                        .map_or(true, |next| next.is_ascii_whitespace());
                    if closes {
                        self.token_start = start;
                        self.token_end = self.position;
                        self.position += 1;
                        return;
                    }
                    self.position += 1;
                }
                Some(_) => self.position += 1,
            }
        }
    }

    /// Mark a semicolon-delimited text field starting at the cursor.
    ///
    /// The cursor must be on the opening `;` at the start of a line. The
    /// content excludes both delimiters and the newline before the closing
    /// `;`. An unterminated field runs to the end of the buffer.
    pub fn mark_text_field(&mut self) {
        debug_assert_eq!(self.peek(), Some(b';'));
        self.position += 1;
        let start = self.position;
        loop {
            self.skip_comment();
            if self.is_eof() {
                self.token_start = start;
                self.token_end = self.position;
                return;
            }
            self.position += 1;
            self.line_number += 1;
            if self.peek() == Some(b';') {
                let mut end = self.position - 1;
                if end > start && self.bytes[end - 1] == b'\r' {
                    end -= 1;
                }
                self.token_start = start;
                self.token_end = end;
                self.position += 1;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens_of(input: &str) -> Vec<&str> {
        let mut tokenizer = Tokenizer::new(input);
        let mut out = Vec::new();
        loop {
            tokenizer.skip_blank();
            if tokenizer.is_eof() {
                break;
            }
            tokenizer.mark_token();
            out.push(tokenizer.token());
        }
        out
    }

    #[test]
    fn unquoted_tokens() {
        assert_eq!(tokens_of("a  bb\tccc\n dd"), vec!["a", "bb", "ccc", "dd"]);
    }

    #[test]
    fn quoted_tokens_exclude_quotes() {
        assert_eq!(
            tokens_of("'hello world' \"x y\" z"),
            vec!["hello world", "x y", "z"]
        );
    }

    #[test]
    fn embedded_quote_does_not_close() {
        assert_eq!(tokens_of("'it's fine' next"), vec!["it's fine", "next"]);
    }

    #[test]
    fn unterminated_quote_ends_at_buffer_end() {
        let mut tokenizer = Tokenizer::new("'open ended");
        tokenizer.mark_token();
        assert_eq!(tokenizer.token(), "open ended");
        assert!(tokenizer.is_eof());
    }

    #[test]
    fn unterminated_quote_ends_at_line_end() {
        assert_eq!(tokens_of("'open\r\nnext"), vec!["open", "next"]);
    }

    #[test]
    fn lines_tolerate_crlf() {
        let mut tokenizer = Tokenizer::new("first\r\nsecond\nthird");
        let mut lines = Tokens::with_capacity(3);
        while !tokenizer.is_eof() {
            tokenizer.mark_line();
            tokenizer.push_token(&mut lines);
        }
        assert_eq!(lines.count(), 3);
        let data = tokenizer.data();
        assert_eq!(lines.slice(data, 0), "first");
        assert_eq!(lines.slice(data, 1), "second");
        assert_eq!(lines.slice(data, 2), "third");
        assert_eq!(tokenizer.line_number(), 3);
    }

    #[test]
    fn text_field() {
        let input = ";line one\nline two\n;\nafter";
        let mut tokenizer = Tokenizer::new(input);
        tokenizer.mark_text_field();
        assert_eq!(tokenizer.token(), "line one\nline two");
        tokenizer.skip_blank();
        tokenizer.mark_token();
        assert_eq!(tokenizer.token(), "after");
    }

    #[test]
    fn unterminated_text_field() {
        let mut tokenizer = Tokenizer::new(";dangling\ntext");
        tokenizer.mark_text_field();
        assert_eq!(tokenizer.token(), "dangling\ntext");
        assert!(tokenizer.is_eof());
    }

    #[test]
    fn slice_clamps_to_char_boundaries() {
        let data = "aé b";
        assert_eq!(slice(data, 0, 2), "a");
        assert_eq!(slice(data, 2, 10), " b");
        assert_eq!(slice(data, 10, 20), "");
    }

    #[test]
    fn token_iteration() {
        let mut tokens = Tokens::with_capacity(2);
        tokens.push(0, 1);
        tokens.push(2, 5);
        assert_eq!(tokens.iter().collect::<Vec<_>>(), vec![(0, 1), (2, 5)]);
        assert_eq!(tokens.range(1), 2..5);
    }
}
