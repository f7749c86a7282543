//! Tokenizer for the text format.

use std::fmt;

use crate::util::{Error, Result};

/// Numeric literal, kept as source text so each property type can parse it
/// at its own precision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Number<'a> {
    pub text: &'a str,
    /// Contains a `.` or an exponent
    pub is_float: bool,
}

/// Token kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum Token<'a> {
    Eof,
    Ident(&'a str),
    Str(String),
    Number(Number<'a>),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Colon,
    Equals,
    Comma,
    /// Contextual keyword `as`
    As,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Eof => f.write_str("end of input"),
            Token::Ident(s) => write!(f, "identifier '{}'", s),
            Token::Str(s) => write!(f, "string {:?}", s),
            Token::Number(n) => write!(f, "number {}", n.text),
            Token::LBrace => f.write_str("'{'"),
            Token::RBrace => f.write_str("'}'"),
            Token::LBracket => f.write_str("'['"),
            Token::RBracket => f.write_str("']'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::Colon => f.write_str("':'"),
            Token::Equals => f.write_str("'='"),
            Token::Comma => f.write_str("','"),
            Token::As => f.write_str("'as'"),
        }
    }
}

/// Token with its 1-based source position.
#[derive(Clone, Debug, PartialEq)]
pub struct Spanned<'a> {
    pub token: Token<'a>,
    pub line: usize,
    pub column: usize,
}

/// Characters allowed after the first character of an identifier.
#[inline]
pub fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

#[inline]
fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Streaming tokenizer over UTF-8 source.
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a lexer positioned at the start of `src`.
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Current line (1-based).
    #[inline]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Tokenize the whole input, ending with [`Token::Eof`].
    pub fn tokenize(src: &'a str) -> Result<Vec<Spanned<'a>>> {
        let mut lexer = Self::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token()?;
            let done = tok.token == Token::Eof;
            out.push(tok);
            if done {
                return Ok(out);
            }
        }
    }

    #[inline]
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    #[inline]
    fn peek_second(&self) -> Option<char> {
        let mut it = self.src[self.pos..].chars();
        it.next();
        it.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, line: usize, column: usize, msg: impl Into<String>) -> Error {
        Error::syntax(line, column, msg)
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Produce the next token.
    pub fn next_token(&mut self) -> Result<Spanned<'a>> {
        self.skip_trivia();
        let (line, column) = (self.line, self.column);
        let spanned = |token| Spanned {
            token,
            line,
            column,
        };

        let Some(c) = self.peek() else {
            return Ok(spanned(Token::Eof));
        };

        let punct = match c {
            '{' => Some(Token::LBrace),
            '}' => Some(Token::RBrace),
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            ':' => Some(Token::Colon),
            '=' => Some(Token::Equals),
            ',' => Some(Token::Comma),
            _ => None,
        };
        if let Some(token) = punct {
            self.bump();
            return Ok(spanned(token));
        }

        if c == '"' {
            return Ok(spanned(self.lex_string(line, column)?));
        }

        let starts_number = c.is_ascii_digit()
            || (matches!(c, '-' | '.')
                && self.peek_second().is_some_and(|n| n.is_ascii_digit() || n == '.'));
        if starts_number {
            return Ok(spanned(self.lex_number(line, column)?));
        }

        if is_ident_start(c) || c == '-' {
            let start = self.pos;
            self.bump();
            while self.peek().is_some_and(is_ident_char) {
                self.bump();
            }
            let text = &self.src[start..self.pos];
            let token = if text == "as" {
                Token::As
            } else {
                Token::Ident(text)
            };
            return Ok(spanned(token));
        }

        Err(self.error(line, column, format!("unexpected character '{}'", c)))
    }

    fn lex_string(&mut self, line: usize, column: usize) -> Result<Token<'a>> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error(line, column, "unterminated string")),
                Some('"') => return Ok(Token::Str(out)),
                Some('\\') => {
                    let (el, ec) = (self.line, self.column);
                    let escaped = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some('\'') => '\'',
                        Some(other) => {
                            return Err(self.error(el, ec, format!("unknown escape '\\{}'", other)))
                        }
                        None => return Err(self.error(line, column, "unterminated string")),
                    };
                    out.push(escaped);
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn lex_number(&mut self, line: usize, column: usize) -> Result<Token<'a>> {
        let start = self.pos;
        let mut is_float = false;
        let mut digits = 0usize;

        if self.peek() == Some('-') {
            self.bump();
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                digits += 1;
                self.bump();
            } else if c == '.' && !is_float {
                is_float = true;
                self.bump();
            } else {
                break;
            }
        }
        if digits == 0 {
            return Err(self.error(line, column, "number has no digits"));
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            is_float = true;
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            let mut exp_digits = 0;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                exp_digits += 1;
                self.bump();
            }
            if exp_digits == 0 {
                return Err(self.error(line, column, "exponent has no digits"));
            }
        }
        if let Some(c) = self.peek() {
            if is_ident_char(c) {
                return Err(self.error(
                    self.line,
                    self.column,
                    format!("malformed number '{}{}'", &self.src[start..self.pos], c),
                ));
            }
        }
        Ok(Token::Number(Number {
            text: &self.src[start..self.pos],
            is_float,
        }))
    }
}
