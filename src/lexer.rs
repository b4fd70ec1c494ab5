use crate::token::{Kind, Token};

/// On-demand scanner over an immutable source buffer.
///
/// Tokens are produced one at a time by [`Lexer::scan_token`]; nothing is
/// buffered and the lexer cannot be rewound.
pub struct Lexer<'a> {
    source_code: &'a str,
    bytes: &'a [u8],
    start: usize,
    current: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            source_code: input,
            bytes: input.as_bytes(),
            start: 0,
            current: 0,
            line: 1,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source_code
    }

    /// Skips whitespace and comments, then returns exactly one token.
    ///
    /// Once the end of input is reached every further call returns `EOF`.
    pub fn scan_token(&mut self) -> Token {
        self.skip_whitespace();
        self.start = self.current;

        if self.is_eof() {
            return self.create_token(Kind::EOF);
        }

        let ch = self.advance();

        if is_alpha(ch) {
            return self.identifier();
        }
        if ch.is_ascii_digit() {
            return self.number();
        }

        match ch {
            b'(' => self.create_token(Kind::LParen),
            b')' => self.create_token(Kind::RParen),
            b'{' => self.create_token(Kind::LBrace),
            b'}' => self.create_token(Kind::RBrace),
            b';' => self.create_token(Kind::Semicolon),
            b',' => self.create_token(Kind::Comma),
            b'.' => self.create_token(Kind::Dot),
            b'-' => self.create_token(Kind::Minus),
            b'+' => self.create_token(Kind::Plus),
            b'/' => self.create_token(Kind::Slash),
            b'*' => self.create_token(Kind::Star),
            b'!' => {
                let kind = if self.matches(b'=') { Kind::BangEqual } else { Kind::Bang };
                self.create_token(kind)
            }
            b'=' => {
                let kind = if self.matches(b'=') { Kind::EqualEqual } else { Kind::Equal };
                self.create_token(kind)
            }
            b'<' => {
                let kind = if self.matches(b'=') { Kind::LessEqual } else { Kind::Less };
                self.create_token(kind)
            }
            b'>' => {
                let kind = if self.matches(b'=') { Kind::GreaterEqual } else { Kind::Greater };
                self.create_token(kind)
            }
            b'"' => self.string(),
            _ => {
                // Swallow the rest of a multi-byte character so it is reported once.
                while is_continuation(self.at()) {
                    self.current += 1;
                }
                self.error_token("Unexpected character")
            }
        }
    }

    fn at(&self) -> u8 {
        self.bytes.get(self.current).copied().unwrap_or(b'\0')
    }

    fn peek_next(&self) -> u8 {
        self.bytes.get(self.current + 1).copied().unwrap_or(b'\0')
    }

    fn advance(&mut self) -> u8 {
        let ch = self.at();
        self.current += 1;
        ch
    }

    fn matches(&mut self, expected: u8) -> bool {
        if self.is_eof() || self.at() != expected {
            return false;
        }
        self.current += 1;
        true
    }

    fn is_eof(&self) -> bool {
        self.current >= self.bytes.len()
    }

    fn create_token(&self, kind: Kind) -> Token {
        Token::Lexeme {
            kind,
            start: self.start,
            length: self.current - self.start,
            line: self.line,
        }
    }

    fn error_token(&self, message: &'static str) -> Token {
        Token::Error {
            message,
            line: self.line,
        }
    }

    fn skip_whitespace(&mut self) {
        loop {
            match self.at() {
                b' ' | b'\r' | b'\t' => {
                    self.advance();
                }
                b'\n' => {
                    self.line += 1;
                    self.advance();
                }
                b'/' if self.peek_next() == b'/' => {
                    while self.at() != b'\n' && !self.is_eof() {
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    fn string(&mut self) -> Token {
        while self.at() != b'"' && !self.is_eof() {
            if self.at() == b'\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_eof() {
            return self.error_token("Unterminated string.");
        }

        // The closing quote.
        self.advance();
        self.create_token(Kind::String)
    }

    fn number(&mut self) -> Token {
        while self.at().is_ascii_digit() {
            self.advance();
        }

        // A fractional part needs at least one digit after the dot.
        if self.at() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.at().is_ascii_digit() {
                self.advance();
            }
        }

        self.create_token(Kind::Number)
    }

    fn identifier(&mut self) -> Token {
        while is_alpha(self.at()) || self.at().is_ascii_digit() {
            self.advance();
        }
        let kind = self.identifier_kind();
        self.create_token(kind)
    }

    /// Keyword recognition as a small trie: branch on the first one or two
    /// bytes, then compare the remaining suffix.
    fn identifier_kind(&self) -> Kind {
        let lexeme = &self.bytes[self.start..self.current];
        match lexeme[0] {
            b'a' => self.check_keyword(1, "nd", Kind::And),
            b'c' => self.check_keyword(1, "lass", Kind::Class),
            b'e' => self.check_keyword(1, "lse", Kind::Else),
            b'f' if lexeme.len() > 1 => match lexeme[1] {
                b'a' => self.check_keyword(2, "lse", Kind::False),
                b'o' => self.check_keyword(2, "r", Kind::For),
                b'u' => self.check_keyword(2, "n", Kind::Fun),
                _ => Kind::Identifier,
            },
            b'i' => self.check_keyword(1, "f", Kind::If),
            b'n' => self.check_keyword(1, "il", Kind::Nil),
            b'o' => self.check_keyword(1, "r", Kind::Or),
            b'p' => self.check_keyword(1, "rint", Kind::Print),
            b'r' => self.check_keyword(1, "eturn", Kind::Return),
            b's' => self.check_keyword(1, "uper", Kind::Super),
            b't' if lexeme.len() > 1 => match lexeme[1] {
                b'h' => self.check_keyword(2, "is", Kind::This),
                b'r' => self.check_keyword(2, "ue", Kind::True),
                _ => Kind::Identifier,
            },
            b'v' => self.check_keyword(1, "ar", Kind::Var),
            b'w' => self.check_keyword(1, "hile", Kind::While),
            _ => Kind::Identifier,
        }
    }

    fn check_keyword(&self, offset: usize, rest: &str, kind: Kind) -> Kind {
        if &self.bytes[self.start + offset..self.current] == rest.as_bytes() {
            kind
        } else {
            Kind::Identifier
        }
    }
}

fn is_alpha(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_continuation(ch: u8) -> bool {
    ch & 0b1100_0000 == 0b1000_0000
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<Kind> {
        let mut lexer = Lexer::new(source);
        let mut kinds = Vec::new();
        loop {
            let token = lexer.scan_token();
            kinds.push(token.kind());
            if token.kind() == Kind::EOF {
                return kinds;
            }
        }
    }

    #[test]
    fn scans_arithmetic() {
        assert_eq!(
            kinds("(1 + 2.5) * -3 / 4"),
            vec![
                Kind::LParen,
                Kind::Number,
                Kind::Plus,
                Kind::Number,
                Kind::RParen,
                Kind::Star,
                Kind::Minus,
                Kind::Number,
                Kind::Slash,
                Kind::Number,
                Kind::EOF,
            ]
        );
    }

    #[test]
    fn two_character_operators() {
        assert_eq!(
            kinds("! != = == < <= > >="),
            vec![
                Kind::Bang,
                Kind::BangEqual,
                Kind::Equal,
                Kind::EqualEqual,
                Kind::Less,
                Kind::LessEqual,
                Kind::Greater,
                Kind::GreaterEqual,
                Kind::EOF,
            ]
        );
    }

    #[test]
    fn keywords_match_lookup_table() {
        let table = [
            ("and", Kind::And),
            ("class", Kind::Class),
            ("else", Kind::Else),
            ("false", Kind::False),
            ("for", Kind::For),
            ("fun", Kind::Fun),
            ("if", Kind::If),
            ("nil", Kind::Nil),
            ("or", Kind::Or),
            ("print", Kind::Print),
            ("return", Kind::Return),
            ("super", Kind::Super),
            ("this", Kind::This),
            ("true", Kind::True),
            ("var", Kind::Var),
            ("while", Kind::While),
        ];
        for (word, kind) in table {
            assert_eq!(kinds(word), vec![kind, Kind::EOF], "keyword {word}");
        }
    }

    #[test]
    fn near_keywords_are_identifiers() {
        for word in ["an", "andy", "f", "fa", "fort", "t", "th", "thisx", "_var", "classy", "x1"] {
            assert_eq!(kinds(word), vec![Kind::Identifier, Kind::EOF], "word {word}");
        }
    }

    #[test]
    fn number_does_not_take_trailing_dot() {
        let source = "12.";
        let mut lexer = Lexer::new(source);
        let number = lexer.scan_token();
        assert_eq!(number.kind(), Kind::Number);
        assert_eq!(number.lexeme(source), "12");
        assert_eq!(lexer.scan_token().kind(), Kind::Dot);
        assert_eq!(lexer.scan_token().kind(), Kind::EOF);
    }

    #[test]
    fn fractional_number_is_one_token() {
        let source = "3.1415";
        let mut lexer = Lexer::new(source);
        assert_eq!(lexer.scan_token().lexeme(source), "3.1415");
    }

    #[test]
    fn comments_and_newlines_advance_line() {
        let mut lexer = Lexer::new("// first\n\n  1 // trailing\n2");
        let one = lexer.scan_token();
        assert_eq!(one.kind(), Kind::Number);
        assert_eq!(one.line(), 3);
        let two = lexer.scan_token();
        assert_eq!(two.line(), 4);
    }

    #[test]
    fn bare_slash_at_end_is_slash() {
        assert_eq!(kinds("4 /"), vec![Kind::Number, Kind::Slash, Kind::EOF]);
    }

    #[test]
    fn strings_track_embedded_newlines() {
        let source = "\"a\nb\" 1";
        let mut lexer = Lexer::new(source);
        let string = lexer.scan_token();
        assert_eq!(string.kind(), Kind::String);
        assert_eq!(string.lexeme(source), "\"a\nb\"");
        assert_eq!(lexer.scan_token().line(), 2);
    }

    #[test]
    fn unterminated_string_is_error_token() {
        let mut lexer = Lexer::new("\"never closed");
        assert_eq!(
            lexer.scan_token(),
            Token::Error {
                message: "Unterminated string.",
                line: 1
            }
        );
    }

    #[test]
    fn unexpected_character_reported_once() {
        let mut lexer = Lexer::new("@ é 1");
        assert_eq!(lexer.scan_token().lexeme(""), "Unexpected character");
        assert_eq!(lexer.scan_token().kind(), Kind::Error);
        assert_eq!(lexer.scan_token().kind(), Kind::Number);
    }

    #[test]
    fn eof_is_sticky() {
        let mut lexer = Lexer::new("  ");
        assert_eq!(lexer.scan_token().kind(), Kind::EOF);
        assert_eq!(lexer.scan_token().kind(), Kind::EOF);
    }
}
