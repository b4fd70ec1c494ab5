use crate::bytecode::{Chunk, OpCode};
use crate::types::Value;
use crate::vm::ExecutionHook;
use std::io;

/// Renders a whole chunk, one instruction per line, under a `== name ==` header.
pub fn disassemble_chunk(chunk: &Chunk, name: &str) -> String {
    let mut out = format!("== {} ==\n", name);
    let mut offset = 0;
    while offset < chunk.len() {
        offset = disassemble_instruction(chunk, offset, &mut out);
    }
    out
}

/// Appends the instruction at `offset` to `out` and returns the offset of the
/// next instruction.
pub fn disassemble_instruction(chunk: &Chunk, offset: usize, out: &mut String) -> usize {
    out.push_str(&format!("{:04} ", offset));

    let line = chunk.line_at(offset);
    if offset > 0 && line.is_some() && line == chunk.line_at(offset - 1) {
        out.push_str("   | ");
    } else {
        match line {
            Some(line) => out.push_str(&format!("{:>4} ", line)),
            None => out.push_str("   ? "),
        }
    }

    let Some(&byte) = chunk.code().get(offset) else {
        out.push_str("<end>\n");
        return offset + 1;
    };
    match OpCode::try_from(byte) {
        Ok(OpCode::Constant) => constant_instruction(chunk, offset, out),
        Ok(op) => simple_instruction(op, offset, out),
        Err(byte) => {
            out.push_str(&format!("Unknown opcode {}\n", byte));
            offset + 1
        }
    }
}

fn simple_instruction(op: OpCode, offset: usize, out: &mut String) -> usize {
    out.push_str(op.name());
    out.push('\n');
    offset + 1
}

fn constant_instruction(chunk: &Chunk, offset: usize, out: &mut String) -> usize {
    let name = OpCode::Constant.name();
    let text = match chunk.code().get(offset + 1) {
        Some(&index) => {
            let value = chunk
                .constant(index as usize)
                .map(|v| format!("'{}'", v.debug_repr()))
                .unwrap_or_else(|| "<missing>".to_string());
            format!("{:<12} ({:02}) {:>8}\n", name, index, value)
        }
        None => format!("{:<12} <truncated>\n", name),
    };
    out.push_str(&text);
    offset + 2
}

/// Renders the live operand stack, `[]` when empty.
pub fn format_stack(stack: &[Value]) -> String {
    if stack.is_empty() {
        return "          []".to_string();
    }
    let cells: String = stack.iter().map(|value| format!("[ {} ]", value)).collect();
    format!("          {}", cells)
}

/// Writes the stack and the upcoming instruction before every dispatch.
pub struct TraceHook<W: io::Write> {
    out: W,
}

impl<W: io::Write> TraceHook<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: io::Write> ExecutionHook for TraceHook<W> {
    fn before_instruction(&mut self, chunk: &Chunk, ip: usize, stack: &[Value]) {
        let mut line = format_stack(stack);
        line.push('\n');
        if ip < chunk.len() {
            disassemble_instruction(chunk, ip, &mut line);
        }
        // Tracing is best effort; a closed pipe must not abort execution.
        let _ = self.out.write_all(line.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::vm::VM;
    use pretty_assertions::assert_eq;

    #[test]
    fn disassembles_compiled_chunk() {
        let chunk = compile("-1 + 2\n* 3").unwrap();
        assert_eq!(
            disassemble_chunk(&chunk, "code"),
            "== code ==\n\
             0000    1 OP_CONSTANT  (00) '1.000000'\n\
             0002    | OP_NEGATE\n\
             0003    | OP_CONSTANT  (01) '2.000000'\n\
             0005    2 OP_CONSTANT  (02) '3.000000'\n\
             0007    | OP_MULTIPLY\n\
             0008    | OP_ADD\n\
             0009    | OP_RETURN\n"
        );
    }

    #[test]
    fn unknown_opcode_advances_one() {
        let mut chunk = Chunk::new();
        chunk.write(42, 1);
        chunk.write_op(OpCode::Return, 1);
        let mut out = String::new();
        assert_eq!(disassemble_instruction(&chunk, 0, &mut out), 1);
        assert_eq!(out, "0000    1 Unknown opcode 42\n");
    }

    #[test]
    fn offset_past_the_end() {
        let chunk = compile("1").unwrap();
        let mut out = String::new();
        assert_eq!(disassemble_instruction(&chunk, 7, &mut out), 8);
        assert_eq!(out, "0007    ? <end>\n");
    }

    #[test]
    fn truncated_constant_operand() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Constant, 1);
        let mut out = String::new();
        assert_eq!(disassemble_instruction(&chunk, 0, &mut out), 2);
        assert_eq!(out, "0000    1 OP_CONSTANT  <truncated>\n");
    }

    #[test]
    fn stack_rendering() {
        assert_eq!(format_stack(&[]), "          []");
        assert_eq!(
            format_stack(&[Value::from(1.0), Value::from(2.5)]),
            "          [ 1 ][ 2.5 ]"
        );
    }

    #[test]
    fn trace_hook_records_execution() {
        let mut vm = VM::with_hook(TraceHook::new(Vec::new()));
        vm.interpret("1 + 2").unwrap();
        let trace = String::from_utf8(vm.into_hook().into_inner()).unwrap();
        let lines: Vec<&str> = trace.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "          []");
        assert_eq!(lines[1], "0000    1 OP_CONSTANT  (00) '1.000000'");
        assert_eq!(lines[6], "          [ 3 ]");
        assert_eq!(lines[7], "0005    | OP_RETURN");
    }
}
