/// A token produced by the lexer.
///
/// Lexeme tokens are a view into the source buffer: they never own text, the
/// lexeme is recovered with [`Token::lexeme`]. Error tokens carry a fixed
/// message instead of a span.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Token {
    Lexeme {
        kind: Kind,
        start: usize,
        length: usize,
        line: usize,
    },
    Error {
        message: &'static str,
        line: usize,
    },
}

impl Token {
    pub fn kind(&self) -> Kind {
        match self {
            Token::Lexeme { kind, .. } => *kind,
            Token::Error { .. } => Kind::Error,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Token::Lexeme { line, .. } | Token::Error { line, .. } => *line,
        }
    }

    /// The slice of `source` this token covers, or the message for error tokens.
    pub fn lexeme<'a>(&self, source: &'a str) -> &'a str {
        match self {
            Token::Lexeme { start, length, .. } => &source[*start..*start + *length],
            Token::Error { message, .. } => *message,
        }
    }
}

/// Every kind of token the lexer can produce.
///
/// The discriminants index the parse rule table, so the order here and the
/// order of `parser::RULES` must agree.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[repr(u8)]
pub enum Kind {
    // Single-character tokens
    LParen = 0,      // (
    RParen = 1,      // )
    LBrace = 2,      // {
    RBrace = 3,      // }
    Comma = 4,       // ,
    Dot = 5,         // .
    Minus = 6,       // -
    Plus = 7,        // +
    Semicolon = 8,   // ;
    Slash = 9,       // /
    Star = 10,       // *

    // One or two character tokens
    Bang = 11,         // !
    BangEqual = 12,    // !=
    Equal = 13,        // =
    EqualEqual = 14,   // ==
    Greater = 15,      // >
    GreaterEqual = 16, // >=
    Less = 17,         // <
    LessEqual = 18,    // <=

    // Literals
    Identifier = 19,
    String = 20,
    Number = 21,

    // Keywords
    And = 22,
    Class = 23,
    Else = 24,
    False = 25,
    Fun = 26,
    For = 27,
    If = 28,
    Nil = 29,
    Or = 30,
    Print = 31,
    Return = 32,
    Super = 33,
    This = 34,
    True = 35,
    Var = 36,
    While = 37,

    Error = 38,
    EOF = 39,
}

impl Kind {
    pub const COUNT: usize = Kind::EOF as usize + 1;
}
