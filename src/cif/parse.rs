//! CIF/STAR text parser.
//!
//! Parses CIF or STAR text into an untyped [`Document`]. Values are never
//! copied: each loop column and each group of `_tag value` pairs becomes a
//! [`Category`] whose fields hold byte ranges into the input. Handles all
//! value forms: unquoted, single/double-quoted, and semicolon text fields.

use log::{debug, trace, warn};

use crate::dom::{split_tag, Block, Category, Document, Field, FieldKind};
use crate::error::DecodeError;
use crate::text::tokenizer::{slice, Tokenizer, Tokens};

/// Parse a CIF/STAR text string into a [`Document`].
///
/// An empty input is an empty document. A loop whose value count is not a
/// multiple of its column count fails with [`DecodeError::TruncatedData`].
pub fn parse(input: &str) -> Result<Document<'_>, DecodeError> {
    Parser::new(input).parse_document()
}

// ---------------------------------------------------------------------------
// Token classification
// ---------------------------------------------------------------------------

/// A classified token; ranges index into the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    DataBlock(usize, usize),
    LoopStart,
    SaveStart(usize, usize),
    SaveEnd,
    Tag(usize, usize),
    Val(usize, usize),
    Eof,
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len() && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

fn classify_unquoted(data: &str, start: usize, end: usize) -> Token {
    let s = slice(data, start, end);
    if starts_with_ignore_case(s, "data_") {
        Token::DataBlock(start + 5, end)
    } else if s.eq_ignore_ascii_case("loop_") {
        Token::LoopStart
    } else if starts_with_ignore_case(s, "save_") {
        if s.len() == 5 {
            Token::SaveEnd
        } else {
            Token::SaveStart(start + 5, end)
        }
    } else if s.starts_with('_') {
        Token::Tag(start, end)
    } else {
        Token::Val(start, end)
    }
}

// ---------------------------------------------------------------------------
// Structure parsing
// ---------------------------------------------------------------------------

struct Parser<'a> {
    tokenizer: Tokenizer<'a>,
    pending: Option<Token>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            tokenizer: Tokenizer::new(input),
            pending: None,
        }
    }

    fn data(&self) -> &'a str {
        self.tokenizer.data()
    }

    fn text(&self, start: usize, end: usize) -> &'a str {
        slice(self.data(), start, end)
    }

    fn next(&mut self) -> Token {
        if let Some(t) = self.pending.take() {
            return t;
        }
        self.scan_token()
    }

    fn push_back(&mut self, token: Token) {
        debug_assert!(self.pending.is_none());
        self.pending = Some(token);
    }

    fn scan_token(&mut self) -> Token {
        let tokenizer = &mut self.tokenizer;
        loop {
            tokenizer.skip_blank();
            let at_line_start = tokenizer.at_line_start();
            match tokenizer.peek() {
                None => return Token::Eof,
                Some(b'#') => tokenizer.skip_comment(),
                Some(b';') if at_line_start => {
                    tokenizer.mark_text_field();
                    return Token::Val(tokenizer.token_start(), tokenizer.token_end());
                }
                Some(b'\'' | b'"') => {
                    tokenizer.mark_token();
                    return Token::Val(tokenizer.token_start(), tokenizer.token_end());
                }
                Some(_) => {
                    tokenizer.mark_token();
                    return classify_unquoted(
                        tokenizer.data(),
                        tokenizer.token_start(),
                        tokenizer.token_end(),
                    );
                }
            }
        }
    }

    fn parse_document(&mut self) -> Result<Document<'a>, DecodeError> {
        let mut blocks = Vec::new();
        loop {
            match self.next() {
                Token::Eof => break,
                Token::DataBlock(start, end) => {
                    let name = self.text(start, end);
                    blocks.push(self.parse_block(name, false)?);
                }
                other => trace!("skipping {other:?} before first data block"),
            }
        }
        debug!("parsed CIF document with {} block(s)", blocks.len());
        Ok(Document { blocks })
    }

    fn parse_block(&mut self, name: &str, is_frame: bool) -> Result<Block<'a>, DecodeError> {
        let mut block = Block::new(name);
        let mut pairs: Vec<((usize, usize), (usize, usize))> = Vec::new();

        loop {
            let token = self.next();
            match token {
                Token::Eof | Token::DataBlock(..) => {
                    self.push_back(token);
                    break;
                }
                Token::LoopStart => {
                    if let Some(category) = self.parse_loop()? {
                        block.categories.push(category);
                    }
                }
                Token::SaveStart(start, end) => {
                    let frame_name = self.text(start, end);
                    let frame = self.parse_block(frame_name, true)?;
                    block.frames.push(frame);
                }
                Token::SaveEnd if is_frame => break,
                Token::SaveEnd => trace!("stray save_ in block {name}"),
                Token::Tag(tag_start, tag_end) => match self.next() {
                    Token::Val(start, end) => pairs.push(((tag_start, tag_end), (start, end))),
                    other => {
                        trace!("tag {} has no value", self.text(tag_start, tag_end));
                        self.push_back(other);
                    }
                },
                Token::Val(start, end) => trace!("stray value {:?}", self.text(start, end)),
            }
        }

        block.categories.extend(self.pair_categories(&pairs)?);
        debug!(
            "block {} has {} categories and {} save frame(s)",
            block.name,
            block.categories.len(),
            block.frames.len()
        );
        Ok(block)
    }

    /// Group `_category.field value` pairs into one-row categories, keeping
    /// first-appearance order.
    fn pair_categories(
        &self,
        pairs: &[((usize, usize), (usize, usize))],
    ) -> Result<Vec<Category<'a>>, DecodeError> {
        let mut groups: Vec<(&'a str, Vec<Field<'a>>)> = Vec::new();
        for &((tag_start, tag_end), (start, end)) in pairs {
            let (category, field) = split_tag(self.text(tag_start, tag_end));
            let mut tokens = Tokens::with_capacity(1);
            tokens.push(start, end);
            let field = Field::from_tokens(field, FieldKind::Str, self.data(), tokens);
            match groups
                .iter_mut()
                .find(|(name, _)| name.eq_ignore_ascii_case(category))
            {
                Some((_, fields)) => fields.push(field),
                None => groups.push((category, vec![field])),
            }
        }
        groups
            .into_iter()
            .map(|(name, fields)| Category::new(name, 1, fields))
            .collect()
    }

    fn parse_loop(&mut self) -> Result<Option<Category<'a>>, DecodeError> {
        let mut tags = Vec::new();
        let mut values = Tokens::default();

        // Collect tags
        loop {
            match self.next() {
                Token::Tag(start, end) => tags.push(self.text(start, end)),
                other => {
                    self.push_back(other);
                    break;
                }
            }
        }

        // Collect values
        loop {
            match self.next() {
                Token::Val(start, end) => values.push(start, end),
                other => {
                    self.push_back(other);
                    break;
                }
            }
        }

        let Some(first) = tags.first() else {
            warn!(
                "loop_ without tags near line {}; {} value(s) ignored",
                self.tokenizer.line_number(),
                values.count()
            );
            return Ok(None);
        };
        let (category, _) = split_tag(first);

        let columns = tags.len();
        let count = values.count();
        if count % columns != 0 {
            return Err(DecodeError::TruncatedData {
                context: format!("loop _{category}"),
                expected: (count / columns + 1) * columns,
                found: count,
            });
        }
        let rows = count / columns;

        let mut field_tokens: Vec<Tokens> = (0..columns).map(|_| Tokens::with_capacity(rows)).collect();
        for (i, (start, end)) in values.iter().enumerate() {
            field_tokens[i % columns].push(start, end);
        }

        let fields = tags
            .iter()
            .zip(field_tokens)
            .map(|(&tag, tokens)| {
                let (tag_category, field) = split_tag(tag);
                let name = if tag_category.eq_ignore_ascii_case(category) {
                    field
                } else {
                    tag.strip_prefix('_').unwrap_or(tag)
                };
                Field::from_tokens(name, FieldKind::Str, self.data(), tokens)
            })
            .collect();

        trace!("loop _{category}: {columns} column(s), {rows} row(s)");
        Category::new(category, rows, fields).map(Some)
    }
}
