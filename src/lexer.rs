use crate::error::{Span, TallyError};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Number,
    Print,
    Assign,
    Operator,
    Newline,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Number => "NUMBER",
            TokenKind::Print => "PRINT",
            TokenKind::Assign => "ASSIGN",
            TokenKind::Operator => "OPERATOR",
            TokenKind::Newline => "NEWLINE",
            TokenKind::Eof => "EOF",
        };
        write!(f, "{}", name)
    }
}

/// A lexical unit. `value` holds the identifier name, the digits of a number
/// or the operator symbol; other kinds carry none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: Option<String>,
    pub line: usize,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, value: Option<String>, line: usize, span: Span) -> Self {
        Self {
            kind,
            value,
            line,
            span,
        }
    }

    pub fn is_operator(&self) -> bool {
        self.kind == TokenKind::Operator
    }

    /// Operator symbol, if this is an operator token.
    pub fn operator(&self) -> Option<char> {
        if self.is_operator() {
            self.value.as_deref().and_then(|v| v.chars().next())
        } else {
            None
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}({}) @{}", self.kind, value, self.line),
            None => write!(f, "{} @{}", self.kind, self.line),
        }
    }
}

const PRINT_KEYWORD: &str = "print";

/// Produces tokens on demand from an immutable source.
pub struct Lexer {
    source: Vec<char>,
    current: usize,
    line: usize,
    finished: bool,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            current: 0,
            line: 1,
            finished: false,
        }
    }

    pub fn next_token(&mut self) -> Result<Token, TallyError> {
        self.skip_whitespace();

        let start = self.current;
        let c = match self.peek() {
            Some(c) => c,
            None => {
                return Ok(Token::new(
                    TokenKind::Eof,
                    None,
                    self.line,
                    Span::single(start),
                ))
            }
        };

        match c {
            c if c.is_ascii_alphabetic() => Ok(self.word()),
            c if c.is_ascii_digit() => Ok(self.number()),
            '=' => Ok(self.single(TokenKind::Assign, None)),
            '+' | '-' | '*' | '/' => Ok(self.single(TokenKind::Operator, Some(c.to_string()))),
            '\n' => {
                let token = self.single(TokenKind::Newline, None);
                self.line += 1;
                Ok(token)
            }
            _ => Err(TallyError::lex_error(
                Span::single(start),
                self.line,
                format!("Unexpected character: found {}", c),
            )
            .with_help("Only letters, digits, '=', '+', '-', '*', '/' and newlines are allowed.")),
        }
    }

    /// Collects the whole stream, ending with `EOF`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, TallyError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\r')) {
            self.current += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.current).copied()
    }

    fn single(&mut self, kind: TokenKind, value: Option<String>) -> Token {
        let start = self.current;
        self.current += 1;
        Token::new(kind, value, self.line, Span::new(start, self.current))
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> String {
        let start = self.current;
        while self.peek().is_some_and(&predicate) {
            self.current += 1;
        }
        self.source[start..self.current].iter().collect()
    }

    fn word(&mut self) -> Token {
        let start = self.current;
        let text = self.take_while(|c| c.is_ascii_alphabetic());
        let span = Span::new(start, self.current);

        if text == PRINT_KEYWORD {
            Token::new(TokenKind::Print, None, self.line, span)
        } else {
            Token::new(TokenKind::Identifier, Some(text), self.line, span)
        }
    }

    fn number(&mut self) -> Token {
        let start = self.current;
        let digits = self.take_while(|c| c.is_ascii_digit());
        Token::new(
            TokenKind::Number,
            Some(digits),
            self.line,
            Span::new(start, self.current),
        )
    }
}

/// Yields every token up to and including the first `EOF`, or the first error.
impl Iterator for Lexer {
    type Item = Result<Token, TallyError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_token();
        match &result {
            Ok(token) if token.kind != TokenKind::Eof => {}
            _ => self.finished = true,
        }
        Some(result)
    }
}
