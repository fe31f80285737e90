//! Small hand-written lexer for call arguments.
//!
//! Breaks the text between a call's parentheses into `Token`s. Bracketed
//! groups come out whole; the object and list helpers below re-lex their
//! contents on demand.
//
//  Lexical items (informal):
//
//      Keyword  ::= any run of non-space chars up to , = ( ) { }  (absorbs attached [...])
//      String   ::= '"' .. '"' | "'" .. "'" | '`' .. '`'   (backslash escapes)
//      Func     ::= '(' ')' '=>' '{' stmt (';' stmt)* '}'
//      Groups   ::= '(' .. ')' | '[' .. ']' | '{' .. '}'   (balanced, string aware)
//      Symbols  ::= ',' | '='

use std::iter::Peekable;
use std::str::Chars;

use crate::error::{CompileError, ErrorKind, Result};
use crate::model::{BodyLine, Location, Token, TokenKind};

#[derive(Clone)]
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    location: Location,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str, origin: Location) -> Self {
        Self {
            chars: src.chars().peekable(),
            location: origin,
        }
    }

    fn next_char(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.location = self.location.advance(c);
        Some(c)
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.next_char();
            } else {
                break;
            }
        }
    }

    fn error(&self, message: impl Into<String>, at: Location) -> CompileError {
        CompileError::new(ErrorKind::Syntax, message, at)
    }

    fn read_string(&mut self, quote: char, start: Location) -> Result<String> {
        let mut txt = String::new();
        while let Some(c) = self.next_char() {
            match c {
                '\\' => match self.next_char() {
                    Some('n') => txt.push('\n'),
                    Some('t') => txt.push('\t'),
                    Some('r') => txt.push('\r'),
                    Some('b') => txt.push('\u{8}'),
                    Some('f') => txt.push('\u{c}'),
                    Some('u') => txt.push(self.read_unicode_escape(start)?),
                    Some(escaped) => txt.push(escaped),
                    None => break,
                },
                c if c == quote => return Ok(txt),
                c => txt.push(c),
            }
        }
        Err(self.error("String literal was never closed", start))
    }

    /// Four hex digits following `\u`.
    fn read_unicode_escape(&mut self, start: Location) -> Result<char> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self.next_char().and_then(|c| c.to_digit(16));
            match digit {
                Some(d) => code = code * 16 + d,
                None => return Err(self.error("Invalid \\u escape in string literal", start)),
            }
        }
        char::from_u32(code)
            .ok_or_else(|| self.error("Invalid \\u escape in string literal", start))
    }

    /// Copies a quoted span into `buf` as written; the opening quote is
    /// already in `buf`.
    fn copy_string(&mut self, quote: char, start: Location, buf: &mut String) -> Result<()> {
        let mut escaped = false;
        while let Some(c) = self.next_char() {
            buf.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                return Ok(());
            }
        }
        Err(self.error("String literal was never closed", start))
    }

    /// Reads a balanced group whose opening char was already consumed.
    fn read_group(&mut self, open: char, start: Location) -> Result<String> {
        let mut buf = String::new();
        buf.push(open);
        let mut stack = vec![closing(open)];
        while let Some(c) = self.next_char() {
            let at = self.location;
            buf.push(c);
            match c {
                '"' | '\'' | '`' => self.copy_string(c, at, &mut buf)?,
                '(' | '[' | '{' => stack.push(closing(c)),
                ')' | ']' | '}' => {
                    if stack.pop() != Some(c) {
                        return Err(self.error(format!("Unexpected '{c}'"), self.location));
                    }
                    if stack.is_empty() {
                        return Ok(buf);
                    }
                }
                _ => {}
            }
        }
        Err(self.error(format!("'{open}' was never closed"), start))
    }

    /// `(` already consumed. Either an arrow function or a plain round group.
    fn read_round(&mut self, start: Location) -> Result<Token> {
        let params = self.read_group('(', start)?;

        let mut ahead = self.chars.clone();
        while ahead.next_if(|c| c.is_whitespace()).is_some() {}
        if ahead.next() != Some('=') || ahead.next() != Some('>') {
            return Ok(Token::new(TokenKind::ParenRound, params, start));
        }

        self.skip_whitespace();
        self.next_char();
        self.next_char();
        self.skip_whitespace();
        let body_start = self.location;
        if self.next_char() != Some('{') {
            return Err(self.error("Expected '{' after '=>'", body_start));
        }
        let body = self.read_group('{', body_start)?;
        let lines = split_top_level(&body[1..body.len() - 1], ';', body_start.advance('{'))
            .into_iter()
            .filter_map(|(part, at)| {
                let (text, location) = trim_located(&part, at);
                (!text.is_empty()).then(|| BodyLine {
                    text: text.to_string(),
                    location,
                })
            })
            .collect();
        Ok(Token::func(format!("{params} => {body}"), lines, start))
    }

    fn read_keyword(&mut self, first: char) -> Result<String> {
        let mut kw = String::new();
        kw.push(first);
        while let Some(c) = self.peek_char() {
            match c {
                '[' => {
                    let start = self.location;
                    self.next_char();
                    kw.push_str(&self.read_group('[', start)?);
                }
                c if c.is_whitespace() || matches!(c, ',' | '=' | '(' | ')' | '{' | '}') => break,
                c => {
                    kw.push(c);
                    self.next_char();
                }
            }
        }
        Ok(kw)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();

        let start = self.location;
        let ch = self.next_char()?;

        let tok_res = match ch {
            '"' | '\'' | '`' => self
                .read_string(ch, start)
                .map(|s| Token::new(TokenKind::String, s, start)),
            '(' => self.read_round(start),
            '[' => self
                .read_group('[', start)
                .map(|s| Token::new(TokenKind::ParenSquare, s, start)),
            '{' => self
                .read_group('{', start)
                .map(|s| Token::new(TokenKind::ParenCurly, s, start)),
            ',' => Ok(Token::new(TokenKind::Comma, ",", start)),
            '=' => Ok(Token::new(TokenKind::Assign, "=", start)),
            ')' | ']' | '}' => Err(self.error(format!("Unexpected '{ch}'"), start)),
            c => self
                .read_keyword(c)
                .map(|s| Token::new(TokenKind::Keyword, s, start)),
        };

        Some(tok_res)
    }
}

fn closing(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Splits `text` at every `sep` that is outside strings and brackets.
/// Each part comes with the location of its first character, `text`
/// itself starting at `origin`.
pub fn split_top_level(text: &str, sep: char, origin: Location) -> Vec<(String, Location)> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut start = origin;
    let mut location = origin;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in text.chars() {
        location = location.advance(c);
        if let Some(q) = quote {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                parts.push((std::mem::take(&mut current), start));
                start = location;
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    parts.push((current, start));
    parts
}

/// `part` without surrounding whitespace, and where what is left begins.
fn trim_located(part: &str, at: Location) -> (&str, Location) {
    let rest = part.trim_start();
    let skipped = &part[..part.len() - rest.len()];
    (rest.trim_end(), skipped.chars().fold(at, Location::advance))
}

/// Byte index of the first top-level `target`, if any.
fn find_top_level(text: &str, target: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            c if c == target && depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Lexes `text` expecting exactly one token.
pub fn single_token(text: &str, origin: Location) -> Result<Token> {
    let mut tokens = Lexer::new(text, origin).collect::<Result<Vec<_>>>()?;
    match tokens.len() {
        1 => Ok(tokens.remove(0)),
        0 => Err(CompileError::new(ErrorKind::Syntax, "Expected a value", origin)),
        _ => Err(CompileError::syntax(
            format!("Unexpected token '{}'", tokens[1].text),
            &tokens[1],
        )),
    }
}

/// Positional and named arguments of one call.
pub type CallArgs = (Vec<Token>, Vec<(String, Token)>);

/// Lexes the inside of a call's parentheses.
pub fn parse_call_args(text: &str, origin: Location) -> Result<CallArgs> {
    let tokens = Lexer::new(text, origin).collect::<Result<Vec<_>>>()?;
    let mut positional = Vec::new();
    let mut named: Vec<(String, Token)> = Vec::new();

    let mut iter = tokens.into_iter().peekable();
    while let Some(tok) = iter.next() {
        if tok.kind == TokenKind::Comma {
            return Err(CompileError::syntax("Unexpected ','", &tok));
        }

        let assign = match tok.kind {
            TokenKind::Keyword => iter.next_if(|t| t.kind == TokenKind::Assign),
            _ => None,
        };
        if let Some(assign) = assign {
            let value = iter
                .next()
                .filter(|t| !matches!(t.kind, TokenKind::Comma | TokenKind::Assign))
                .ok_or_else(|| CompileError::syntax("Expected value after '='", &assign))?;
            named.push((tok.text, value));
        } else if tok.kind == TokenKind::Assign {
            return Err(CompileError::syntax("Unexpected '='", &tok));
        } else {
            if !named.is_empty() {
                return Err(CompileError::syntax(
                    "Positional argument follows keyword argument",
                    &tok,
                ));
            }
            positional.push(tok);
        }

        match iter.next() {
            None => break,
            Some(t) if t.kind == TokenKind::Comma => {}
            Some(t) => return Err(CompileError::syntax("Expected ','", &t)),
        }
    }

    Ok((positional, named))
}

/// Entries of a `{key: value, ...}` token, in source order.
pub fn parse_object(token: &Token) -> Result<Vec<(String, Token)>> {
    let inner = strip_delimiters(token, '{', '}')?;
    let mut entries = Vec::new();
    for (entry, at) in split_top_level(inner, ',', token.location.advance('{')) {
        if entry.trim().is_empty() {
            continue;
        }
        let colon = find_top_level(&entry, ':').ok_or_else(|| {
            CompileError::syntax(
                format!("Expected ':' in object entry '{}'", entry.trim()),
                token,
            )
        })?;
        let key = unquote(entry[..colon].trim());
        if key.is_empty() {
            return Err(CompileError::syntax("Empty key in object", token));
        }
        let value_at = entry[..=colon].chars().fold(at, Location::advance);
        let value = single_token(&entry[colon + 1..], value_at)?;
        entries.push((key, value));
    }
    Ok(entries)
}

/// Items of a `[a, b, ...]` token, in source order.
pub fn parse_list(token: &Token) -> Result<Vec<Token>> {
    let inner = strip_delimiters(token, '[', ']')?;
    split_top_level(inner, ',', token.location.advance('['))
        .into_iter()
        .filter(|(item, _)| !item.trim().is_empty())
        .map(|(item, at)| single_token(&item, at))
        .collect()
}

fn strip_delimiters(token: &Token, open: char, close: char) -> Result<&str> {
    token
        .text
        .strip_prefix(open)
        .and_then(|s| s.strip_suffix(close))
        .ok_or_else(|| CompileError::syntax(format!("Expected '{open}...{close}'"), token))
}

fn unquote(key: &str) -> String {
    for q in ['"', '\''] {
        if let Some(inner) = key.strip_prefix(q).and_then(|s| s.strip_suffix(q)) {
            return inner.to_string();
        }
    }
    key.to_string()
}
