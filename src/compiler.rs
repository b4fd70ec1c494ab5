use crate::bytecode::{Chunk, OpCode};
use crate::error::{CompileError, Diagnostic, Location};
use crate::lexer::Lexer;
use crate::parser::{get_rule, ParseFn, Parser, Precedence};
use crate::token::{Kind, Token};
use crate::types::Value;
use crate::vm::STACK_MAX;

/// Deepest chain of nested `parse_precedence` calls a single expression may
/// open. Every nested operand keeps at most one value live on the VM stack,
/// so `1 + (1 + (...))` at this depth still fits in `STACK_MAX` slots.
pub const MAX_NESTING: usize = 2 * STACK_MAX;

/// Compiles a single expression into a chunk.
pub fn compile(source: &str) -> Result<Chunk, CompileError> {
    Compiler::new(source).compile()
}

/// Single-pass Pratt compiler: parses by precedence and emits bytecode as it
/// goes, without building a syntax tree.
pub struct Compiler<'a> {
    lexer: Lexer<'a>,
    parser: Parser,
    chunk: Chunk,
    diagnostics: Vec<Diagnostic>,
    depth: usize,
}

impl<'a> Compiler<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source),
            parser: Parser::new(),
            chunk: Chunk::new(),
            diagnostics: Vec::new(),
            depth: 0,
        }
    }

    pub fn compile(mut self) -> Result<Chunk, CompileError> {
        tracing::debug!(bytes = self.lexer.source().len(), "compiling");

        self.advance();
        self.expression();
        self.consume(Kind::EOF, "Expect end of expression.");
        self.emit_op(OpCode::Return);

        if self.parser.had_error {
            tracing::debug!(errors = self.diagnostics.len(), "compile failed");
            return Err(CompileError {
                diagnostics: self.diagnostics,
            });
        }

        tracing::debug!(
            code = self.chunk.len(),
            constants = self.chunk.constants().len(),
            "compiled chunk"
        );
        Ok(self.chunk)
    }

    fn advance(&mut self) {
        self.parser.previous = self.parser.current;

        loop {
            self.parser.current = self.lexer.scan_token();
            match self.parser.current {
                Token::Error { message, .. } => self.error_at_current(message),
                Token::Lexeme { .. } => break,
            }
        }
    }

    fn consume(&mut self, kind: Kind, message: &str) {
        if self.parser.current.kind() == kind {
            self.advance();
            return;
        }
        self.error_at_current(message);
    }

    fn error_at_current(&mut self, message: &str) {
        self.error_at(self.parser.current, message);
    }

    fn error(&mut self, message: &str) {
        self.error_at(self.parser.previous, message);
    }

    /// Records a diagnostic unless one was already reported in this call.
    ///
    /// There is no synchronization point, so panic mode lasts until the end
    /// of the compile call.
    fn error_at(&mut self, token: Token, message: &str) {
        if self.parser.panic_mode {
            return;
        }
        self.parser.panic_mode = true;
        self.parser.had_error = true;

        let location = match token {
            Token::Error { .. } => Location::Unknown,
            Token::Lexeme { kind: Kind::EOF, .. } => Location::End,
            Token::Lexeme { .. } => Location::At(token.lexeme(self.lexer.source()).to_string()),
        };
        self.diagnostics
            .push(Diagnostic::new(token.line(), location, message));
    }

    fn emit_byte(&mut self, byte: u8) {
        let line = self.parser.previous.line();
        self.chunk.write(byte, line);
    }

    fn emit_op(&mut self, op: OpCode) {
        self.emit_byte(op.into());
    }

    fn emit_constant(&mut self, value: Value) {
        let index = self.make_constant(value);
        self.emit_op(OpCode::Constant);
        self.emit_byte(index);
    }

    fn make_constant(&mut self, value: Value) -> u8 {
        let index = self.chunk.add_constant(value);
        // The operand is a single byte.
        match u8::try_from(index) {
            Ok(index) => index,
            Err(_) => {
                self.error("Too many constants in one chunk.");
                0
            }
        }
    }

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    /// Parses any expression whose operators bind at least as tightly as
    /// `precedence`.
    fn parse_precedence(&mut self, precedence: Precedence) {
        if self.depth >= MAX_NESTING {
            self.error_at_current("Expression nested too deeply.");
            return;
        }
        self.depth += 1;
        self.parse_operand(precedence);
        self.depth -= 1;
    }

    fn parse_operand(&mut self, precedence: Precedence) {
        self.advance();
        let Some(prefix) = get_rule(self.parser.previous.kind()).prefix else {
            self.error("Expected expression.");
            return;
        };
        self.apply(prefix);

        while precedence <= get_rule(self.parser.current.kind()).precedence {
            self.advance();
            let Some(infix) = get_rule(self.parser.previous.kind()).infix else {
                self.error("Unsupported operator.");
                return;
            };
            self.apply(infix);
        }
    }

    fn apply(&mut self, handler: ParseFn) {
        match handler {
            ParseFn::Grouping => self.grouping(),
            ParseFn::Unary => self.unary(),
            ParseFn::Binary => self.binary(),
            ParseFn::Number => self.number(),
        }
    }

    fn grouping(&mut self) {
        self.expression();
        self.consume(Kind::RParen, "Expected ')' after expression.");
    }

    fn unary(&mut self) {
        let operator = self.parser.previous.kind();

        self.parse_precedence(Precedence::Unary);

        if operator == Kind::Minus {
            self.emit_op(OpCode::Negate);
        }
    }

    fn binary(&mut self) {
        let operator = self.parser.previous.kind();

        // The left operand is already on the stack; compile the right one.
        let rule = get_rule(operator);
        self.parse_precedence(rule.precedence.next());

        match operator {
            Kind::Plus => self.emit_op(OpCode::Add),
            Kind::Minus => self.emit_op(OpCode::Subtract),
            Kind::Star => self.emit_op(OpCode::Multiply),
            Kind::Slash => self.emit_op(OpCode::Divide),
            _ => {}
        }
    }

    fn number(&mut self) {
        let lexeme = self.parser.previous.lexeme(self.lexer.source());
        match lexeme.parse::<f64>() {
            Ok(n) => self.emit_constant(Value::Number(n)),
            Err(_) => self.error("Invalid number literal."),
        }
    }
}
