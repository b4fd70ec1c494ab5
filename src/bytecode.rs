use crate::types::Value;
use serde::{Deserialize, Serialize};

/// One-byte instruction tags. `Constant` is followed by a one-byte pool index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    Constant = 0,
    Return = 1,
    Negate = 2,
    Add = 3,
    Subtract = 4,
    Multiply = 5,
    Divide = 6,
}

impl OpCode {
    pub fn name(self) -> &'static str {
        match self {
            OpCode::Constant => "OP_CONSTANT",
            OpCode::Return => "OP_RETURN",
            OpCode::Negate => "OP_NEGATE",
            OpCode::Add => "OP_ADD",
            OpCode::Subtract => "OP_SUBTRACT",
            OpCode::Multiply => "OP_MULTIPLY",
            OpCode::Divide => "OP_DIVIDE",
        }
    }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0 => Ok(OpCode::Constant),
            1 => Ok(OpCode::Return),
            2 => Ok(OpCode::Negate),
            3 => Ok(OpCode::Add),
            4 => Ok(OpCode::Subtract),
            5 => Ok(OpCode::Multiply),
            6 => Ok(OpCode::Divide),
            other => Err(other),
        }
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> Self {
        op as u8
    }
}

/// A run of consecutive instruction bytes attributed to the same source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRun {
    pub line: usize,
    pub count: usize,
}

/// Run-length encoded mapping from instruction offset to source line.
///
/// Append-only: runs are never edited except by extending the last one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineTable {
    runs: Vec<LineRun>,
}

impl LineTable {
    pub fn append(&mut self, line: usize) {
        match self.runs.last_mut() {
            Some(run) if run.line == line => run.count += 1,
            _ => self.runs.push(LineRun { line, count: 1 }),
        }
    }

    pub fn resolve(&self, offset: usize) -> Option<usize> {
        let mut seen = 0;
        for run in &self.runs {
            seen += run.count;
            if seen > offset {
                return Some(run.line);
            }
        }
        None
    }

    /// Number of offsets covered, i.e. the decoded length.
    pub fn len(&self) -> usize {
        self.runs.iter().map(|run| run.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn runs(&self) -> &[LineRun] {
        &self.runs
    }
}

/// A compiled unit of bytecode: instructions, constant pool and line table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    code: Vec<u8>,
    constants: Vec<Value>,
    lines: LineTable,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, byte: u8, line: usize) {
        self.code.push(byte);
        self.lines.append(line);
    }

    pub fn write_op(&mut self, op: OpCode, line: usize) {
        self.write(op.into(), line);
    }

    /// Returns the index of `value` in the pool, adding it only if no equal
    /// value is already present.
    pub fn add_constant(&mut self, value: Value) -> usize {
        if let Some(pos) = self.constants.iter().position(|&x| x == value) {
            pos
        } else {
            self.constants.push(value);
            self.constants.len() - 1
        }
    }

    pub fn line_at(&self, offset: usize) -> Option<usize> {
        self.lines.resolve(offset)
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    pub fn constant(&self, index: usize) -> Option<Value> {
        self.constants.get(index).copied()
    }

    pub fn lines(&self) -> &LineTable {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn opcode_bytes_round_trip() {
        for byte in 0..=6u8 {
            let op = OpCode::try_from(byte).unwrap();
            assert_eq!(u8::from(op), byte);
        }
        assert_eq!(OpCode::try_from(7), Err(7));
        assert_eq!(OpCode::try_from(255), Err(255));
    }

    #[test]
    fn add_constant_deduplicates() {
        let mut chunk = Chunk::new();
        assert_eq!(chunk.add_constant(Value::from(1.0)), 0);
        assert_eq!(chunk.add_constant(Value::from(2.0)), 1);
        assert_eq!(chunk.add_constant(Value::from(1.0)), 0);
        assert_eq!(chunk.constants(), &[Value::from(1.0), Value::from(2.0)]);
    }

    #[test]
    fn lines_are_run_length_encoded() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Constant, 1);
        chunk.write(0, 1);
        chunk.write_op(OpCode::Negate, 1);
        chunk.write_op(OpCode::Return, 3);

        assert_eq!(
            chunk.lines().runs(),
            &[LineRun { line: 1, count: 3 }, LineRun { line: 3, count: 1 }]
        );
        assert_eq!(chunk.lines().len(), chunk.len());
        assert_eq!(chunk.line_at(0), Some(1));
        assert_eq!(chunk.line_at(2), Some(1));
        assert_eq!(chunk.line_at(3), Some(3));
        assert_eq!(chunk.line_at(4), None);
    }

    #[test]
    fn repeated_line_after_gap_starts_new_run() {
        let mut lines = LineTable::default();
        lines.append(1);
        lines.append(2);
        lines.append(1);
        assert_eq!(lines.runs().len(), 3);
        assert_eq!(lines.resolve(2), Some(1));
    }

    #[test]
    fn empty_chunk_has_no_lines() {
        let chunk = Chunk::new();
        assert!(chunk.is_empty());
        assert!(chunk.lines().is_empty());
        assert_eq!(chunk.line_at(0), None);
    }
}
