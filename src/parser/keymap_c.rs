//! Layer table extraction from keymap.c source text.
//!
//! The extractor works on either raw keymap.c text or preprocessor output. It
//! lexes just enough C to find the `keymaps` initializer and split it into
//! layers and keycodes:
//!
//! ```c
//! const uint16_t PROGMEM keymaps[][MATRIX_ROWS][MATRIX_COLS] = {
//!     [_BASE] = LAYOUT_ortho_4x4( /* base */
//!         KC_A, KC_B, LT(1, KC_SPC), ...
//!     ),
//!     { { KC_A, KC_B }, { KC_C, KC_D } },   // matrix form, e.g. after cpp
//! };
//! ```
//!
//! Comments, whitespace and preprocessor directives are dropped; keycodes that
//! are macro calls are kept as written (minus whitespace). Nothing is expanded.

use crate::error::{ConversionError, ConversionResult};
use crate::models::ExtractedLayer;

/// Identifier that names the layer table.
const TABLE_NAME: &str = "keymaps";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    /// Identifier or number
    Word,
    /// String or character literal
    Literal,
    /// Any other single character
    Punct,
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    kind: TokenKind,
    text: &'a str,
    line: usize,
}

impl Token<'_> {
    fn is(&self, c: char) -> bool {
        self.kind == TokenKind::Punct && self.text.len() == c.len_utf8() && self.text.starts_with(c)
    }

    fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Word && self.text == word
    }

    fn closer(&self) -> Option<char> {
        if self.kind != TokenKind::Punct {
            return None;
        }
        match self.text {
            "{" => Some('}'),
            "(" => Some(')'),
            "[" => Some(']'),
            _ => None,
        }
    }

    fn is_closer(&self) -> bool {
        self.is('}') || self.is(')') || self.is(']')
    }
}

/// Extracts the layers of the `keymaps` table in declaration order.
///
/// # Errors
///
/// - `KeymapStructureNotFound` if there is no `keymaps = { ... }` definition
///   or it declares no layers
/// - `MalformedLayer` for unbalanced brackets, unterminated literals or
///   comments, empty entries between commas, and layers without keycodes
pub fn extract_layers(source: &str) -> ConversionResult<Vec<ExtractedLayer>> {
    let tokens = Lexer::new(source).tokenize()?;
    let (open, close) = find_table(&tokens)?;

    let elements = split_top_level(&tokens[open + 1..close])
        .map_err(|reason| malformed(TABLE_NAME, reason))?;

    let layers = elements
        .into_iter()
        .filter(|element| !element.is_empty())
        .enumerate()
        .map(|(index, element)| parse_layer(index, element))
        .collect::<ConversionResult<Vec<_>>>()?;

    if layers.is_empty() {
        return Err(ConversionError::KeymapStructureNotFound(format!(
            "the {TABLE_NAME} table on line {} declares no layers",
            tokens[open].line
        )));
    }

    Ok(layers)
}

fn malformed(layer: &str, reason: impl Into<String>) -> ConversionError {
    ConversionError::MalformedLayer {
        layer: layer.to_string(),
        reason: reason.into(),
    }
}

/// Finds the braces of the first `keymaps ... = { ... }` definition.
///
/// Returns the token indices of the opening and closing brace.
fn find_table(tokens: &[Token<'_>]) -> ConversionResult<(usize, usize)> {
    for (start, token) in tokens.iter().enumerate() {
        if !token.is_word(TABLE_NAME) {
            continue;
        }

        // Skip array bounds, qualifiers and attributes up to the '='
        let mut depth = 0usize;
        for idx in start + 1..tokens.len() {
            let tok = &tokens[idx];
            if tok.is('(') || tok.is('[') {
                depth += 1;
            } else if tok.is(')') || tok.is(']') {
                depth = depth.saturating_sub(1);
            } else if depth == 0 && tok.is('=') {
                if tokens.get(idx + 1).is_some_and(|next| next.is('{')) {
                    let close = closing_index(tokens, idx + 1)
                        .map_err(|reason| malformed(TABLE_NAME, reason))?;
                    return Ok((idx + 1, close));
                }
                break;
            } else if depth == 0 && (tok.is(';') || tok.is('{') || tok.is(',')) {
                break;
            }
        }
    }

    Err(ConversionError::KeymapStructureNotFound(format!(
        "no `{TABLE_NAME}` layer table definition found"
    )))
}

/// Parses one table element: `[designator] = LAYOUT(...)`, `LAYOUT(...)` or `{ ... }`.
fn parse_layer(index: usize, element: &[Token<'_>]) -> ConversionResult<ExtractedLayer> {
    let mut name = index.to_string();
    let mut rest = element;

    if rest.first().is_some_and(|tok| tok.is('[')) {
        let close = closing_index(rest, 0).map_err(|reason| malformed(&name, reason))?;
        let designator = join_tokens(&rest[1..close]);
        if designator.is_empty() {
            return Err(malformed(&name, "empty layer designator"));
        }
        name = designator;

        if !rest.get(close + 1).is_some_and(|tok| tok.is('=')) {
            return Err(malformed(&name, "expected '=' after layer designator"));
        }
        rest = &rest[close + 2..];
    }

    let Some(first) = rest.first() else {
        return Err(malformed(&name, "missing layer definition"));
    };

    let (layout, body) = if first.is('{') {
        let close = closing_index(rest, 0).map_err(|reason| malformed(&name, reason))?;
        if close != rest.len() - 1 {
            return Err(malformed(
                &name,
                format!("unexpected tokens after layer on line {}", rest[close].line),
            ));
        }
        (None, &rest[1..close])
    } else if first.kind == TokenKind::Word && rest.get(1).is_some_and(|tok| tok.is('(')) {
        let close = closing_index(rest, 1).map_err(|reason| malformed(&name, reason))?;
        if close != rest.len() - 1 {
            return Err(malformed(
                &name,
                format!("unexpected tokens after {}(...) on line {}", first.text, rest[close].line),
            ));
        }
        (Some(first.text.to_string()), &rest[2..close])
    } else {
        return Err(malformed(
            &name,
            format!(
                "expected a layout macro or brace group on line {}, found '{}'",
                first.line, first.text
            ),
        ));
    };

    let mut keycodes = Vec::new();
    collect_keycodes(body, &mut keycodes).map_err(|reason| malformed(&name, reason))?;

    if keycodes.is_empty() {
        return Err(malformed(&name, "layer has no keycodes"));
    }

    Ok(ExtractedLayer {
        name,
        layout,
        keycodes,
    })
}

/// Splits a layer body on top-level commas, flattening nested brace groups.
///
/// A trailing comma is allowed; an empty entry anywhere else is an error.
fn collect_keycodes(tokens: &[Token<'_>], keycodes: &mut Vec<String>) -> Result<(), String> {
    let pieces = split_top_level(tokens)?;
    let last = pieces.len() - 1;

    for (idx, piece) in pieces.into_iter().enumerate() {
        if piece.is_empty() {
            if idx == last {
                continue;
            }
            return Err(format!("empty keycode after {} entries", keycodes.len()));
        }

        if piece[0].is('{') && closing_index(piece, 0)? == piece.len() - 1 {
            collect_keycodes(&piece[1..piece.len() - 1], keycodes)?;
        } else {
            keycodes.push(join_tokens(piece));
        }
    }

    Ok(())
}

/// Returns the index of the bracket closing the one at `open`.
fn closing_index(tokens: &[Token<'_>], open: usize) -> Result<usize, String> {
    let mut expected: Vec<(char, usize)> = Vec::new();

    for (idx, tok) in tokens.iter().enumerate().skip(open) {
        if let Some(closer) = tok.closer() {
            expected.push((closer, tok.line));
        } else if tok.is_closer() {
            match expected.pop() {
                Some((closer, _)) if tok.is(closer) => {
                    if expected.is_empty() {
                        return Ok(idx);
                    }
                }
                Some((closer, _)) => {
                    return Err(format!(
                        "expected '{}' but found '{}' on line {}",
                        closer, tok.text, tok.line
                    ));
                }
                None => {
                    return Err(format!("unexpected '{}' on line {}", tok.text, tok.line));
                }
            }
        }
    }

    match expected.first() {
        Some((closer, line)) => Err(format!(
            "unbalanced brackets: missing '{}' for the bracket opened on line {}",
            closer, line
        )),
        None => Err("missing opening bracket".to_string()),
    }
}

/// Splits tokens on commas that are not nested in any bracket.
fn split_top_level<'s, 'a>(tokens: &'s [Token<'a>]) -> Result<Vec<&'s [Token<'a>]>, String> {
    let mut pieces = Vec::new();
    let mut expected: Vec<char> = Vec::new();
    let mut start = 0;

    for (idx, tok) in tokens.iter().enumerate() {
        if let Some(closer) = tok.closer() {
            expected.push(closer);
        } else if tok.is_closer() {
            match expected.pop() {
                Some(closer) if tok.is(closer) => {}
                _ => return Err(format!("unexpected '{}' on line {}", tok.text, tok.line)),
            }
        } else if expected.is_empty() && tok.is(',') {
            pieces.push(&tokens[start..idx]);
            start = idx + 1;
        }
    }

    if let Some(closer) = expected.last() {
        return Err(format!("unbalanced brackets: missing '{closer}'"));
    }

    pieces.push(&tokens[start..]);
    Ok(pieces)
}

/// Rebuilds a keycode from its tokens without whitespace.
///
/// A single space is kept between adjacent words so `unsigned int` stays two words.
fn join_tokens(tokens: &[Token<'_>]) -> String {
    let mut out = String::new();
    let mut prev_word = false;

    for tok in tokens {
        let word = tok.kind != TokenKind::Punct;
        if word && prev_word {
            out.push(' ');
        }
        out.push_str(tok.text);
        prev_word = word;
    }

    out
}

/// Minimal C lexer: words, literals and single-character punctuation.
struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    /// Only whitespace seen since the last newline
    line_start: bool,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            line: 1,
            line_start: true,
        }
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn tokenize(mut self) -> ConversionResult<Vec<Token<'a>>> {
        let mut tokens = Vec::new();

        while let Some(byte) = self.peek(0) {
            match byte {
                b'\n' => {
                    self.line += 1;
                    self.line_start = true;
                    self.pos += 1;
                }
                b' ' | b'\t' | b'\r' | 0x0b | 0x0c => self.pos += 1,
                b'#' if self.line_start => self.skip_directive()?,
                b'/' if self.peek(1) == Some(b'/') => self.skip_line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.skip_block_comment()?,
                b'"' | b'\'' => {
                    tokens.push(self.literal(byte)?);
                    self.line_start = false;
                }
                _ if is_word_byte(byte) => {
                    tokens.push(self.word());
                    self.line_start = false;
                }
                _ => {
                    let len = self.src[self.pos..].chars().next().map_or(1, char::len_utf8);
                    tokens.push(Token {
                        kind: TokenKind::Punct,
                        text: &self.src[self.pos..self.pos + len],
                        line: self.line,
                    });
                    self.pos += len;
                    self.line_start = false;
                }
            }
        }

        Ok(tokens)
    }

    fn word(&mut self) -> Token<'a> {
        let start = self.pos;
        let numeric = self.bytes[start].is_ascii_digit();

        while let Some(byte) = self.peek(0) {
            if is_word_byte(byte) || (numeric && byte == b'.') {
                self.pos += 1;
            } else {
                break;
            }
        }

        Token {
            kind: TokenKind::Word,
            text: &self.src[start..self.pos],
            line: self.line,
        }
    }

    fn literal(&mut self, quote: u8) -> ConversionResult<Token<'a>> {
        let start = self.pos;
        let line = self.line;
        self.pos += 1;

        loop {
            match self.peek(0) {
                Some(b'\\') => self.pos += 2,
                Some(byte) if byte == quote => {
                    self.pos += 1;
                    break;
                }
                Some(b'\n') | None => {
                    return Err(malformed(
                        TABLE_NAME,
                        format!("unterminated literal starting on line {line}"),
                    ));
                }
                Some(_) => self.pos += 1,
            }
        }

        Ok(Token {
            kind: TokenKind::Literal,
            text: &self.src[start..self.pos.min(self.src.len())],
            line,
        })
    }

    fn skip_line_comment(&mut self) {
        while let Some(byte) = self.peek(0) {
            if byte == b'\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) -> ConversionResult<()> {
        let line = self.line;
        self.pos += 2;

        while let Some(byte) = self.peek(0) {
            if byte == b'*' && self.peek(1) == Some(b'/') {
                self.pos += 2;
                return Ok(());
            }
            if byte == b'\n' {
                self.line += 1;
            }
            self.pos += 1;
        }

        Err(malformed(
            TABLE_NAME,
            format!("unterminated comment starting on line {line}"),
        ))
    }

    /// Skips a preprocessor directive including backslash continuations.
    fn skip_directive(&mut self) -> ConversionResult<()> {
        while let Some(byte) = self.peek(0) {
            match byte {
                b'\n' => {
                    let continued = self.src[..self.pos].trim_end_matches('\r').ends_with('\\');
                    if !continued {
                        return Ok(());
                    }
                    self.line += 1;
                    self.pos += 1;
                }
                b'/' if self.peek(1) == Some(b'*') => self.skip_block_comment()?,
                b'/' if self.peek(1) == Some(b'/') => {
                    self.skip_line_comment();
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }

        Ok(())
    }
}

fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$'
}
