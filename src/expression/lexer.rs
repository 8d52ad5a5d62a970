// Expression Tokenizer
// Converts raw expression text into a typed token stream

use std::fmt;

use thiserror::Error;

/// Binary and unary operator symbols, longest spellings first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    StrictEq, // ===
    StrictNe, // !==
    Le,       // <=
    Ge,       // >=
    Eq,       // ==
    Ne,       // !=
    And,      // &&
    Or,       // ||
    Gt,       // >
    Lt,       // <
    Not,      // !
    Plus,     // +
    Minus,    // -
    Star,     // *
    Slash,    // /
    Percent,  // %
}

impl Op {
    pub fn symbol(&self) -> &'static str {
        match self {
            Op::StrictEq => "===",
            Op::StrictNe => "!==",
            Op::Le => "<=",
            Op::Ge => ">=",
            Op::Eq => "==",
            Op::Ne => "!=",
            Op::And => "&&",
            Op::Or => "||",
            Op::Gt => ">",
            Op::Lt => "<",
            Op::Not => "!",
            Op::Plus => "+",
            Op::Minus => "-",
            Op::Star => "*",
            Op::Slash => "/",
            Op::Percent => "%",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Token types for card template expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Dotted-path identifier; dots, hyphens and brackets stay inside
    /// the token, segmentation happens in the resolver.
    Identifier(String),
    /// String literal with backslash escapes already resolved.
    String(String),
    Number(f64),
    Bool(bool),
    Null,
    Op(Op),
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(s) => write!(f, "{}", s),
            Token::String(s) => write!(f, "'{}'", s),
            Token::Number(n) => write!(f, "{}", n),
            Token::Bool(b) => write!(f, "{}", b),
            Token::Null => write!(f, "null"),
            Token::Op(op) => write!(f, "{}", op),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

/// Lexer error: the offending character and its character offset.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("unexpected character '{ch}' at offset {offset}")]
pub struct LexError {
    pub ch: char,
    pub offset: usize,
}

/// Tokenizer for expression text. Whitespace separates tokens and is
/// otherwise ignored.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    /// Tokenize the entire input.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }

        let Some(c) = self.peek() else {
            return Ok(None);
        };

        // Operators, longest match first
        if let Some(op) = self.match_operator() {
            return Ok(Some(Token::Op(op)));
        }

        match c {
            '(' => {
                self.pos += 1;
                Ok(Some(Token::LParen))
            }
            ')' => {
                self.pos += 1;
                Ok(Some(Token::RParen))
            }
            '"' | '\'' => Ok(Some(self.read_string())),
            '0'..='9' => Ok(Some(self.read_number())),
            '.' if matches!(self.peek_at(1), Some(d) if d.is_ascii_digit()) => {
                Ok(Some(self.read_number()))
            }
            c if c.is_ascii_alphabetic() || c == '_' => Ok(Some(self.read_identifier())),
            other => Err(LexError {
                ch: other,
                offset: self.pos,
            }),
        }
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn match_operator(&mut self) -> Option<Op> {
        let c0 = self.peek_at(0);
        let c1 = self.peek_at(1);
        let c2 = self.peek_at(2);

        let three = match (c0, c1, c2) {
            (Some('='), Some('='), Some('=')) => Some(Op::StrictEq),
            (Some('!'), Some('='), Some('=')) => Some(Op::StrictNe),
            _ => None,
        };
        if let Some(op) = three {
            self.pos += 3;
            return Some(op);
        }

        let two = match (c0, c1) {
            (Some('<'), Some('=')) => Some(Op::Le),
            (Some('>'), Some('=')) => Some(Op::Ge),
            (Some('='), Some('=')) => Some(Op::Eq),
            (Some('!'), Some('=')) => Some(Op::Ne),
            (Some('&'), Some('&')) => Some(Op::And),
            (Some('|'), Some('|')) => Some(Op::Or),
            _ => None,
        };
        if let Some(op) = two {
            self.pos += 2;
            return Some(op);
        }

        let one = match c0 {
            Some('>') => Some(Op::Gt),
            Some('<') => Some(Op::Lt),
            Some('!') => Some(Op::Not),
            Some('+') => Some(Op::Plus),
            Some('-') => Some(Op::Minus),
            Some('*') => Some(Op::Star),
            Some('/') => Some(Op::Slash),
            Some('%') => Some(Op::Percent),
            _ => None,
        };
        if one.is_some() {
            self.pos += 1;
        }
        one
    }

    /// Read a `"` or `'` delimited string. A backslash escapes the
    /// following character literally (the backslash is dropped, the
    /// next character copied as-is, including the closing quote). An
    /// unterminated string consumes to end of input without erroring.
    fn read_string(&mut self) -> Token {
        let quote = self.chars[self.pos];
        self.pos += 1;

        let mut value = String::new();
        while let Some(ch) = self.peek() {
            if ch == '\\' {
                if let Some(next) = self.peek_at(1) {
                    value.push(next);
                }
                self.pos += 2;
                continue;
            }
            if ch == quote {
                self.pos += 1;
                break;
            }
            value.push(ch);
            self.pos += 1;
        }

        Token::String(value)
    }

    /// Read a run of digits, dots and underscores. Underscores are
    /// visual digit grouping and are stripped before conversion. A run
    /// that fails numeric conversion (e.g. `1.2.3`) becomes NaN rather
    /// than an error.
    fn read_number(&mut self) -> Token {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.' || c == '_') {
            self.pos += 1;
        }

        let raw: String = self.chars[start..self.pos]
            .iter()
            .filter(|&&c| c != '_')
            .collect();
        Token::Number(raw.parse::<f64>().unwrap_or(f64::NAN))
    }

    fn read_identifier(&mut self) -> Token {
        let start = self.pos;
        self.pos += 1;
        while matches!(
            self.peek(),
            Some(c) if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '[' | ']')
        ) {
            self.pos += 1;
        }

        let ident: String = self.chars[start..self.pos].iter().collect();
        match ident.as_str() {
            "true" => Token::Bool(true),
            "false" => Token::Bool(false),
            "null" => Token::Null,
            _ => Token::Identifier(ident),
        }
    }
}
