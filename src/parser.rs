use crate::token::{Kind, Token};

/// Binding power, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    None,
    Assignment, // =
    Or,         // or
    And,        // and
    Equality,   // == !=
    Comparison, // < > <= >=
    Term,       // + -
    Factor,     // * /
    Unary,      // ! -
    Call,       // . ()
    Primary,
}

impl Precedence {
    /// The next tighter level; `Primary` is its own successor.
    pub fn next(self) -> Precedence {
        use Precedence::*;
        match self {
            None => Assignment,
            Assignment => Or,
            Or => And,
            And => Equality,
            Equality => Comparison,
            Comparison => Term,
            Term => Factor,
            Factor => Unary,
            Unary => Call,
            Call => Primary,
            Primary => Primary,
        }
    }
}

/// The handler a rule dispatches to. The compiler matches on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFn {
    Grouping,
    Unary,
    Binary,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseRule {
    pub prefix: Option<ParseFn>,
    pub infix: Option<ParseFn>,
    pub precedence: Precedence,
}

const fn rule(prefix: Option<ParseFn>, infix: Option<ParseFn>, precedence: Precedence) -> ParseRule {
    ParseRule {
        prefix,
        infix,
        precedence,
    }
}

const NONE: ParseRule = rule(None, None, Precedence::None);

/// Indexed by `Kind as usize`.
static RULES: [ParseRule; Kind::COUNT] = [
    rule(Some(ParseFn::Grouping), None, Precedence::Call), // LParen
    NONE,                                                   // RParen
    NONE,                                                   // LBrace
    NONE,                                                   // RBrace
    NONE,                                                   // Comma
    rule(None, None, Precedence::Call),                     // Dot
    rule(Some(ParseFn::Unary), Some(ParseFn::Binary), Precedence::Term), // Minus
    rule(None, Some(ParseFn::Binary), Precedence::Term),    // Plus
    NONE,                                                   // Semicolon
    rule(None, Some(ParseFn::Binary), Precedence::Factor),  // Slash
    rule(None, Some(ParseFn::Binary), Precedence::Factor),  // Star
    NONE,                                                   // Bang
    rule(None, None, Precedence::Equality),                 // BangEqual
    NONE,                                                   // Equal
    rule(None, None, Precedence::Equality),                 // EqualEqual
    rule(None, None, Precedence::Comparison),               // Greater
    rule(None, None, Precedence::Comparison),               // GreaterEqual
    rule(None, None, Precedence::Comparison),               // Less
    rule(None, None, Precedence::Comparison),               // LessEqual
    NONE,                                                   // Identifier
    NONE,                                                   // String
    rule(Some(ParseFn::Number), None, Precedence::None),    // Number
    rule(None, None, Precedence::And),                      // And
    NONE,                                                   // Class
    NONE,                                                   // Else
    NONE,                                                   // False
    NONE,                                                   // Fun
    NONE,                                                   // For
    NONE,                                                   // If
    NONE,                                                   // Nil
    rule(None, None, Precedence::Or),                       // Or
    NONE,                                                   // Print
    NONE,                                                   // Return
    NONE,                                                   // Super
    NONE,                                                   // This
    NONE,                                                   // True
    NONE,                                                   // Var
    NONE,                                                   // While
    NONE,                                                   // Error
    NONE,                                                   // EOF
];

pub fn get_rule(kind: Kind) -> &'static ParseRule {
    &RULES[kind as usize]
}

/// Token window and error flags of one compile call.
#[derive(Debug)]
pub struct Parser {
    pub(crate) current: Token,
    pub(crate) previous: Token,
    pub(crate) had_error: bool,
    pub(crate) panic_mode: bool,
}

impl Parser {
    pub fn new() -> Self {
        let start = Token::Lexeme {
            kind: Kind::EOF,
            start: 0,
            length: 0,
            line: 1,
        };
        Self {
            current: start,
            previous: start,
            had_error: false,
            panic_mode: false,
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_is_ordered() {
        assert!(Precedence::None < Precedence::Assignment);
        assert!(Precedence::Term < Precedence::Factor);
        assert!(Precedence::Factor < Precedence::Unary);
        assert!(Precedence::Call < Precedence::Primary);
        assert_eq!(Precedence::Term.next(), Precedence::Factor);
        assert_eq!(Precedence::Primary.next(), Precedence::Primary);
    }

    #[test]
    fn arithmetic_rules() {
        assert_eq!(get_rule(Kind::Plus).infix, Some(ParseFn::Binary));
        assert_eq!(get_rule(Kind::Plus).prefix, None);
        assert_eq!(get_rule(Kind::Minus).prefix, Some(ParseFn::Unary));
        assert_eq!(get_rule(Kind::Star).precedence, Precedence::Factor);
        assert_eq!(get_rule(Kind::Slash).precedence, Precedence::Factor);
        assert_eq!(get_rule(Kind::Number).prefix, Some(ParseFn::Number));
        assert_eq!(get_rule(Kind::LParen).prefix, Some(ParseFn::Grouping));
    }

    #[test]
    fn stop_tokens_have_no_binding_power() {
        for kind in [Kind::RParen, Kind::EOF, Kind::Error, Kind::Semicolon, Kind::Number] {
            assert_eq!(get_rule(kind).precedence, Precedence::None, "{kind:?}");
            assert_eq!(get_rule(kind).infix, None, "{kind:?}");
        }
    }
}
