//! A single-pass bytecode compiler and stack virtual machine for Lox
//! arithmetic expressions.
//!
//! Source text flows through the [`lexer`] one token at a time into the
//! [`compiler`], which parses by precedence and writes instructions straight
//! into a [`bytecode::Chunk`]. The [`vm`] then executes the chunk.
//!
//! ```
//! use loxvm::{Value, VM};
//!
//! let mut vm = VM::new();
//! assert_eq!(vm.interpret("(1 + 2) * 3").unwrap(), Value::Number(9.0));
//! ```

pub mod bytecode;
pub mod compiler;
pub mod config;
pub mod debug;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod types;
pub mod vm;

pub use bytecode::{Chunk, OpCode};
pub use compiler::compile;
pub use error::{CompileError, Diagnostic, InterpretError, InterpretResult, LoxError, RuntimeError};
pub use types::Value;
pub use vm::{ExecutionHook, VM};
