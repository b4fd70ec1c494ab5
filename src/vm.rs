use crate::bytecode::{Chunk, OpCode};
use crate::compiler::compile;
use crate::error::{InterpretError, RuntimeError, RuntimeErrorKind};
use crate::types::Value;

/// Capacity of the operand stack.
pub const STACK_MAX: usize = 256;

/// Called by the dispatch loop before each instruction.
///
/// This is the seam for tracing and for an optimizing backend; the default
/// does nothing.
pub trait ExecutionHook {
    fn before_instruction(&mut self, _chunk: &Chunk, _ip: usize, _stack: &[Value]) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHook;

impl ExecutionHook for NoopHook {}

/// Stack machine executing one chunk at a time.
#[derive(Debug)]
pub struct VM<H: ExecutionHook = NoopHook> {
    ip: usize,
    stack: [Value; STACK_MAX],
    stack_top: usize,
    hook: H,
}

impl VM {
    pub fn new() -> Self {
        Self::with_hook(NoopHook)
    }
}

impl Default for VM {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ExecutionHook> VM<H> {
    pub fn with_hook(hook: H) -> Self {
        VM {
            ip: 0,
            stack: [Value::default(); STACK_MAX],
            stack_top: 0,
            hook,
        }
    }

    pub fn hook(&self) -> &H {
        &self.hook
    }

    pub fn into_hook(self) -> H {
        self.hook
    }

    /// Compiles `source` and runs it, yielding the value of the expression.
    pub fn interpret(&mut self, source: &str) -> Result<Value, InterpretError> {
        self.reset_stack();
        let chunk = compile(source)?;
        let value = self.interpret_chunk(&chunk)?;
        Ok(value)
    }

    /// Runs an already compiled chunk from its first instruction.
    pub fn interpret_chunk(&mut self, chunk: &Chunk) -> Result<Value, RuntimeError> {
        self.reset_stack();
        self.ip = 0;
        let result = self.run(chunk);
        match &result {
            Ok(value) => tracing::debug!(%value, "interpret ok"),
            Err(err) => tracing::debug!(%err, "interpret failed"),
        }
        result
    }

    /// Live portion of the operand stack, bottom first.
    pub fn stack(&self) -> &[Value] {
        &self.stack[..self.stack_top]
    }

    fn reset_stack(&mut self) {
        self.stack_top = 0;
    }

    fn run(&mut self, chunk: &Chunk) -> Result<Value, RuntimeError> {
        loop {
            self.hook
                .before_instruction(chunk, self.ip, &self.stack[..self.stack_top]);

            let offset = self.ip;
            let byte = self.read_byte(chunk)?;
            let instruction = OpCode::try_from(byte)
                .map_err(|byte| self.error(chunk, offset, RuntimeErrorKind::UnknownOpcode(byte)))?;

            match instruction {
                OpCode::Constant => {
                    let index = self.read_byte(chunk)? as usize;
                    let constant = chunk
                        .constant(index)
                        .ok_or_else(|| self.error(chunk, offset, RuntimeErrorKind::InvalidConstant(index)))?;
                    self.push(chunk, offset, constant)?;
                }
                OpCode::Negate => {
                    let operand = self.pop(chunk, offset)?;
                    self.push(chunk, offset, Value::Number(-operand.as_number()))?;
                }
                OpCode::Add => self.binary_op(chunk, offset, |a, b| a + b)?,
                OpCode::Subtract => self.binary_op(chunk, offset, |a, b| a - b)?,
                OpCode::Multiply => self.binary_op(chunk, offset, |a, b| a * b)?,
                OpCode::Divide => self.binary_op(chunk, offset, |a, b| a / b)?,
                OpCode::Return => return self.pop(chunk, offset),
            }
        }
    }

    fn read_byte(&mut self, chunk: &Chunk) -> Result<u8, RuntimeError> {
        let byte = chunk
            .code()
            .get(self.ip)
            .copied()
            .ok_or_else(|| self.error(chunk, self.ip.saturating_sub(1), RuntimeErrorKind::MissingReturn))?;
        self.ip += 1;
        Ok(byte)
    }

    /// Pops the right operand, then the left one, and pushes `left op right`.
    fn binary_op(&mut self, chunk: &Chunk, offset: usize, op: fn(f64, f64) -> f64) -> Result<(), RuntimeError> {
        let right = self.pop(chunk, offset)?;
        let left = self.pop(chunk, offset)?;
        self.push(chunk, offset, Value::Number(op(left.as_number(), right.as_number())))
    }

    fn push(&mut self, chunk: &Chunk, offset: usize, value: Value) -> Result<(), RuntimeError> {
        if self.stack_top >= STACK_MAX {
            return Err(self.error(chunk, offset, RuntimeErrorKind::StackOverflow));
        }
        self.stack[self.stack_top] = value;
        self.stack_top += 1;
        Ok(())
    }

    fn pop(&mut self, chunk: &Chunk, offset: usize) -> Result<Value, RuntimeError> {
        if self.stack_top == 0 {
            return Err(self.error(chunk, offset, RuntimeErrorKind::StackUnderflow));
        }
        self.stack_top -= 1;
        Ok(self.stack[self.stack_top])
    }

    fn error(&self, chunk: &Chunk, offset: usize, kind: RuntimeErrorKind) -> RuntimeError {
        RuntimeError::new(chunk.line_at(offset), kind)
    }
}
