//! PGN tokenizer.
//!
//! Splits PGN text into tag pairs and movetext tokens. The lexer never fails:
//! text it cannot make sense of comes out as [`Token::Invalid`] so the game
//! parser can skip just the game that contains it.

use crate::game::GameResult;
use crate::nag::Nag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `[Name "value"]`
    Tag { name: String, value: String },
    /// `12.` or `12...`
    MoveNumber(u32),
    San(String),
    /// `$n`, or a suffix glyph such as `!?` already mapped to its code.
    Nag(u8),
    /// `{...}` or `; ...` comment text, untrimmed.
    Comment(String),
    VariationStart,
    VariationEnd,
    Result(GameResult),
    Invalid(String),
}

/// Token iterator over PGN text. [`Lexer::line`] reports the line of the last token.
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: u32,
    token_line: u32,
    queued: Vec<Token>,
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '{' | '}' | '(' | ')' | '[' | ']' | ';' | '$' | '"')
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            token_line: 1,
            queued: Vec::new(),
        }
    }

    /// 1-based line the most recently returned token started on.
    pub fn line(&self) -> u32 {
        self.token_line
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn at_line_start(&self) -> bool {
        self.pos == 0 || self.src[..self.pos].ends_with('\n')
    }

    fn take_while(&mut self, mut pred: impl FnMut(char) -> bool) -> &'a str {
        let src = self.src;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
        &src[start..self.pos]
    }

    fn skip_whitespace(&mut self) {
        loop {
            self.take_while(char::is_whitespace);
            // `%` in the first column escapes the whole line.
            if self.peek() == Some('%') && self.at_line_start() {
                self.take_while(|c| c != '\n');
            } else {
                break;
            }
        }
    }

    fn read_tag(&mut self) -> Token {
        let start = self.pos;
        self.take_while(|c| c.is_whitespace() && c != '\n');
        let name = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
        self.take_while(|c| c.is_whitespace() && c != '\n');

        if name.is_empty() || self.peek() != Some('"') {
            return self.invalid_line(start);
        }
        self.bump();

        let mut value = String::new();
        loop {
            let Some(c) = self.peek().filter(|&c| c != '\n') else {
                return self.invalid_line(start);
            };
            self.bump();
            match c {
                '"' => break,
                '\\' => match self.peek() {
                    Some(escaped @ ('"' | '\\')) => {
                        self.bump();
                        value.push(escaped);
                    }
                    _ => value.push('\\'),
                },
                c => value.push(c),
            }
        }

        self.take_while(|c| c.is_whitespace() && c != '\n');
        if self.peek() != Some(']') {
            return self.invalid_line(start);
        }
        self.bump();

        Token::Tag {
            name: name.to_string(),
            value,
        }
    }

    /// Consume the rest of the line and report it as unrecognized.
    fn invalid_line(&mut self, start: usize) -> Token {
        self.take_while(|c| c != '\n');
        Token::Invalid(format!("[{}", self.src[start..self.pos].trim_end()))
    }

    fn read_nag(&mut self) -> Token {
        let digits = self.take_while(|c| c.is_ascii_digit());
        match digits.parse::<u8>() {
            Ok(code) => Token::Nag(code),
            Err(_) => Token::Invalid(format!("${}", digits)),
        }
    }

    /// Classify a run of non-delimiter characters, queueing any extra tokens
    /// (e.g. `12.e4!` yields a move number, a SAN token and a NAG).
    fn classify_word(&mut self, word: &str) -> Option<Token> {
        if let Some(result) = GameResult::from_marker(word) {
            return Some(Token::Result(result));
        }

        let is_castling = word.starts_with("0-0");
        let digits = word.len() - word.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits > 0 && !is_castling {
            let number = word[..digits].parse::<u32>().ok();
            let rest = word[digits..].trim_start_matches('.');
            let rest_tokens = classify_san(rest);
            return match number {
                Some(n) => {
                    self.queue(rest_tokens);
                    Some(Token::MoveNumber(n))
                }
                None => Some(Token::Invalid(word.to_string())),
            };
        }

        let mut tokens = classify_san(word);
        if tokens.is_empty() {
            return None;
        }
        let first = tokens.remove(0);
        self.queue(tokens);
        Some(first)
    }

    fn queue(&mut self, tokens: Vec<Token>) {
        // Stored reversed so `pop` yields them in order.
        self.queued.extend(tokens.into_iter().rev());
    }
}

/// Split a SAN word into the move and its annotation glyph. Check markers stay
/// with the move, and the glyph may sit on either side of them (`Nf3!+`, `Nf3+!`).
fn classify_san(word: &str) -> Vec<Token> {
    let core = word.trim_end_matches(['!', '?', '+', '#']);
    let suffix = &word[core.len()..];
    let glyph: String = suffix.chars().filter(|c| matches!(c, '!' | '?')).collect();
    let check: String = suffix.chars().filter(|c| matches!(c, '+' | '#')).collect();

    let mut tokens = Vec::with_capacity(2);
    // A run of dots (`1 ... e5`) carries no information.
    if !core.is_empty() && !core.chars().all(|c| c == '.') {
        tokens.push(Token::San(format!("{}{}", core, check)));
    }
    if !glyph.is_empty() {
        match Nag::from_glyph(&glyph) {
            Some(nag) => tokens.push(Token::Nag(nag.code())),
            None => tokens.push(Token::Invalid(glyph)),
        }
    }
    tokens
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if let Some(token) = self.queued.pop() {
            return Some(token);
        }

        loop {
            self.skip_whitespace();
            self.token_line = self.line;
            let c = self.bump()?;
            let token = match c {
                '[' => self.read_tag(),
                '{' => {
                    let text = self.take_while(|c| c != '}');
                    self.bump();
                    Token::Comment(text.to_string())
                }
                ';' => Token::Comment(self.take_while(|c| c != '\n').to_string()),
                '(' => Token::VariationStart,
                ')' => Token::VariationEnd,
                '$' => self.read_nag(),
                ']' | '}' | '"' => Token::Invalid(c.to_string()),
                _ => {
                    let src = self.src;
                    let start = self.pos - c.len_utf8();
                    self.take_while(|c| !is_delimiter(c));
                    let word = &src[start..self.pos];
                    match self.classify_word(word) {
                        Some(token) => token,
                        None => continue,
                    }
                }
            };
            return Some(token);
        }
    }
}
