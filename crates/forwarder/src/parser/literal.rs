//! Parser for the actor runtime's inspected-term notation.
//!
//! The live/manager processes dump their statistics packets the way their
//! runtime prints terms, which is close to (but not) JSON:
//!
//! - maps: `%{key: value}`, `%{"key" => value}`, `#{key => value}`
//! - structs: `%Relay.Statistic.Packet{relay: "r-1", ...}` (name dropped)
//! - lists `[1, 2]`, keyword lists `[a: 1, b: 2]` and tuples `{:ok, 1}`
//! - JSON-style objects `{"key": value}`
//! - atoms `:ok`, `:"quoted atom"`, aliases `Relay.Session`
//! - binaries `<<"bytes">>`, opaque handles `#PID<0.42.0>`
//! - numbers with `_` separators, `true` / `false` / `nil`
//!
//! Everything is converted into a [`serde_json::Value`] tree. Atoms and
//! opaque handles become strings, tuples become arrays and non-string map
//! keys are rendered to their JSON text.

use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Nesting limit, protects the stack against hostile input.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} at byte {position}")]
pub struct LiteralError {
    pub position: usize,
    pub reason: String,
}

/// Parse one leading term and report how many bytes it consumed.
///
/// Anything after the term is left alone, which is what log lines need:
/// the payload is usually followed by more free text.
pub fn parse_prefix(input: &str) -> Result<(Value, usize), LiteralError> {
    let mut parser = Parser::new(input);
    let value = parser.parse_value()?;
    Ok((value, parser.pos))
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            depth: 0,
        }
    }

    fn error(&self, reason: &str) -> LiteralError {
        LiteralError {
            position: self.pos,
            reason: reason.to_string(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn starts_with(&self, token: &str) -> bool {
        self.bytes[self.pos..].starts_with(token.as_bytes())
    }

    fn skip_ws(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), LiteralError> {
        self.skip_ws();
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", byte as char)))
        }
    }

    fn enter(&mut self) -> Result<(), LiteralError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn parse_value(&mut self) -> Result<Value, LiteralError> {
        self.skip_ws();
        let b = self.peek().ok_or_else(|| self.error("unexpected end of input"))?;

        match b {
            b'%' => {
                self.pos += 1;
                if self.peek() != Some(b'{') {
                    // struct name, discarded
                    self.take_while(is_alias_byte);
                }
                self.expect(b'{')?;
                self.parse_map_body(b'}')
            }
            b'#' => {
                if self.peek_at(1) == Some(b'{') {
                    self.pos += 2;
                    self.parse_map_body(b'}')
                } else {
                    self.parse_opaque()
                }
            }
            b'{' => {
                self.pos += 1;
                self.skip_ws();
                let start = self.pos;
                if self.peek() != Some(b'}') && self.try_keyword_key()?.is_some() {
                    self.pos = start;
                    return self.parse_map_body(b'}');
                }
                self.pos = start;
                self.parse_sequence(b'}')
            }
            b'[' => {
                self.pos += 1;
                self.parse_list()
            }
            b'<' if self.peek_at(1) == Some(b'<') => self.parse_binary(),
            b'"' => self.parse_string().map(Value::String),
            b':' => self.parse_atom(),
            b'-' | b'+' | b'0'..=b'9' => self.parse_number(),
            b if is_ident_start(b) => self.parse_word(),
            _ => Err(self.error("unexpected character")),
        }
    }

    fn parse_map_body(&mut self, close: u8) -> Result<Value, LiteralError> {
        self.enter()?;
        let mut map = Map::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b) if b == close => {
                    self.pos += 1;
                    break;
                }
                None => return Err(self.error("unterminated map")),
                _ => {}
            }

            let key = match self.try_keyword_key()? {
                Some(key) => key,
                None => {
                    let key = self.parse_value()?;
                    self.skip_ws();
                    if !self.starts_with("=>") {
                        return Err(self.error("expected '=>' after map key"));
                    }
                    self.pos += 2;
                    key_to_string(key)
                }
            };

            let value = self.parse_value()?;
            map.insert(key, value);

            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b) if b == close => {}
                _ => return Err(self.error("expected ',' or end of map")),
            }
        }
        self.leave();
        Ok(Value::Object(map))
    }

    /// `key: value` and `"key": value` shorthand. Rewinds when absent.
    fn try_keyword_key(&mut self) -> Result<Option<String>, LiteralError> {
        let start = self.pos;
        let quoted = self.peek() == Some(b'"');
        let key = match self.peek() {
            Some(b'"') => self.parse_string()?,
            Some(b) if is_ident_start(b) => {
                let word = self.take_while(is_ident_byte);
                if matches!(self.peek(), Some(b'?') | Some(b'!')) {
                    self.pos += 1;
                    format!("{}{}", word, self.bytes[self.pos - 1] as char)
                } else {
                    word.to_string()
                }
            }
            _ => return Ok(None),
        };

        // `a::b` is not a keyword, but `"a":1` is
        let is_keyword = self.peek() == Some(b':')
            && (quoted || self.peek_at(1).map_or(true, |b| b.is_ascii_whitespace()));
        if is_keyword {
            self.pos += 1;
            Ok(Some(key))
        } else {
            self.pos = start;
            Ok(None)
        }
    }

    fn parse_list(&mut self) -> Result<Value, LiteralError> {
        self.skip_ws();
        let start = self.pos;
        // keyword lists read as objects
        if self.peek() != Some(b']') && self.try_keyword_key()?.is_some() {
            self.pos = start;
            return self.parse_map_body(b']');
        }
        self.pos = start;
        self.parse_sequence(b']')
    }

    fn parse_sequence(&mut self, close: u8) -> Result<Value, LiteralError> {
        self.enter()?;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b) if b == close => {
                    self.pos += 1;
                    break;
                }
                None => return Err(self.error("unterminated sequence")),
                _ => {}
            }

            items.push(self.parse_value()?);

            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b) if b == close => {}
                // improper list tail: [a | b]
                Some(b'|') => self.pos += 1,
                _ => return Err(self.error("expected ',' or end of sequence")),
            }
        }
        self.leave();
        Ok(Value::Array(items))
    }

    fn parse_binary(&mut self) -> Result<Value, LiteralError> {
        self.pos += 2;
        self.skip_ws();
        if self.peek() == Some(b'"') {
            let text = self.parse_string()?;
            self.skip_ws();
            if !self.starts_with(">>") {
                return Err(self.error("unterminated binary"));
            }
            self.pos += 2;
            return Ok(Value::String(text));
        }

        let mut bytes = Vec::new();
        loop {
            self.skip_ws();
            if self.starts_with(">>") {
                self.pos += 2;
                break;
            }
            match self.parse_number()? {
                Value::Number(n) => bytes.push(Value::Number(n)),
                _ => return Err(self.error("invalid binary segment")),
            }
            self.skip_ws();
            if self.peek() == Some(b',') {
                self.pos += 1;
            }
        }
        Ok(Value::Array(bytes))
    }

    /// `#PID<0.42.0>`, `#Reference<0.1.2.3>` and friends, kept verbatim.
    fn parse_opaque(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        self.pos += 1;
        self.take_while(is_alias_byte);
        if self.peek() != Some(b'<') {
            return Err(self.error("unknown '#' term"));
        }
        let mut nesting = 0usize;
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'<' => nesting += 1,
                b'>' => {
                    nesting -= 1;
                    if nesting == 0 {
                        return Ok(Value::String(self.src[start..self.pos].to_string()));
                    }
                }
                _ => {}
            }
        }
        Err(self.error("unterminated opaque term"))
    }

    fn parse_string(&mut self) -> Result<String, LiteralError> {
        // opening quote
        self.pos += 1;
        let src = self.src;
        let mut out = String::new();
        let mut chars = src[self.pos..].char_indices();
        while let Some((offset, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos += offset + 1;
                    return Ok(out);
                }
                '\\' => {
                    let (_, escaped) = chars
                        .next()
                        .ok_or_else(|| self.error("unterminated escape"))?;
                    out.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '0' => '\0',
                        other => other,
                    });
                }
                other => out.push(other),
            }
        }
        Err(self.error("unterminated string"))
    }

    fn parse_atom(&mut self) -> Result<Value, LiteralError> {
        self.pos += 1;
        match self.peek() {
            Some(b'"') => self.parse_string().map(Value::String),
            Some(b) if is_ident_start(b) => {
                let mut atom = self.take_while(is_alias_byte).to_string();
                if matches!(self.peek(), Some(b'?') | Some(b'!')) {
                    atom.push(self.bytes[self.pos] as char);
                    self.pos += 1;
                }
                Ok(Value::String(atom))
            }
            _ => Err(self.error("invalid atom")),
        }
    }

    fn parse_number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        if matches!(self.peek(), Some(b'-') | Some(b'+')) {
            self.pos += 1;
        }
        let body = self.take_while(|b| b.is_ascii_digit() || matches!(b, b'_' | b'.' | b'e' | b'E'));
        if body.is_empty() {
            self.pos = start;
            return Err(self.error("invalid number"));
        }
        // exponent sign
        if body.ends_with(|c| c == 'e' || c == 'E') && matches!(self.peek(), Some(b'-') | Some(b'+')) {
            self.pos += 1;
            self.take_while(|b| b.is_ascii_digit());
        }

        let text: String = self.src[start..self.pos].chars().filter(|c| *c != '_').collect();
        let text = text.trim_start_matches('+');

        if let Ok(n) = text.parse::<i64>() {
            return Ok(Value::Number(n.into()));
        }
        if let Ok(n) = text.parse::<u64>() {
            return Ok(Value::Number(n.into()));
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| LiteralError {
                position: start,
                reason: "invalid number".to_string(),
            })
    }

    fn parse_word(&mut self) -> Result<Value, LiteralError> {
        let word = self.take_while(is_alias_byte);
        Ok(match word {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            "nil" | "null" => Value::Null,
            alias => Value::String(alias.to_string()),
        })
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if pred(b) {
                self.pos += 1;
            } else {
                break;
            }
        }
        &self.src[start..self.pos]
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_alias_byte(b: u8) -> bool {
    is_ident_byte(b) || b == b'.'
}

fn key_to_string(key: Value) -> String {
    match key {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
