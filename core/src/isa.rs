//! Instruction set model: opcodes, term kinds, and the on-disk instruction
//! record shape shared by the translator and the machine.

use serde::{Deserialize, Serialize};

/// The full opcode set understood by the control unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpcodeType {
    Nop,
    Add,
    Mod,
    Swap,
    Dup,
    Eq,
    Di,
    Ei,
    Omit,
    Read,
    Store,
    Load,
    Push,
    Jmp,
    Zjmp,
    Call,
    Ret,
    Halt,
}

impl OpcodeType {
    /// Canonical uppercase name, used on the wire.
    pub fn name(self) -> &'static str {
        match self {
            Self::Nop => "NOP",
            Self::Add => "ADD",
            Self::Mod => "MOD",
            Self::Swap => "SWAP",
            Self::Dup => "DUP",
            Self::Eq => "EQ",
            Self::Di => "DI",
            Self::Ei => "EI",
            Self::Omit => "OMIT",
            Self::Read => "READ",
            Self::Store => "STORE",
            Self::Load => "LOAD",
            Self::Push => "PUSH",
            Self::Jmp => "JMP",
            Self::Zjmp => "ZJMP",
            Self::Call => "CALL",
            Self::Ret => "RET",
            Self::Halt => "HALT",
        }
    }

    /// Whether this opcode carries a single integer parameter.
    pub fn has_param(self) -> bool {
        matches!(self, Self::Push | Self::Jmp | Self::Zjmp | Self::Call)
    }

    pub fn from_name(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "NOP" => Self::Nop,
            "ADD" => Self::Add,
            "MOD" => Self::Mod,
            "SWAP" => Self::Swap,
            "DUP" => Self::Dup,
            "EQ" => Self::Eq,
            "DI" => Self::Di,
            "EI" => Self::Ei,
            "OMIT" => Self::Omit,
            "READ" => Self::Read,
            "STORE" => Self::Store,
            "LOAD" => Self::Load,
            "PUSH" => Self::Push,
            "JMP" => Self::Jmp,
            "ZJMP" => Self::Zjmp,
            "CALL" => Self::Call,
            "RET" => Self::Ret,
            "HALT" => Self::Halt,
            _ => return None,
        })
    }
}

/// Parameter of a not-yet-linked opcode. Every variant but `Const` must be
/// resolved to `Const` before the program is handed to the control unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeParam {
    /// A final literal value.
    Const(i64),
    /// A term index, to be rewritten to an absolute instruction address.
    Addr(usize),
    /// An offset relative to the emission point, to be rewritten to an
    /// absolute instruction address.
    AddrRel(isize),
    /// Placeholder assigned during codegen before the term's target term is
    /// known.
    Undefined,
}

/// A pre-link opcode, as produced directly by the code generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub op: OpcodeType,
    pub param: Option<OpcodeParam>,
}

impl Opcode {
    pub fn bare(op: OpcodeType) -> Self {
        Self { op, param: None }
    }

    pub fn with_param(op: OpcodeType, param: OpcodeParam) -> Self {
        Self {
            op,
            param: Some(param),
        }
    }
}

/// A fully linked opcode: the only form the control unit ever executes or
/// that is written to disk. `OpcodeParam::Undefined`/`Addr`/`AddrRel` cannot
/// reach this type — the fix-up pass in `codegen` is the sole producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkedOpcode {
    pub op: OpcodeType,
    pub arg: Option<i64>,
}

/// On-disk instruction record: `{"index":N,"command":"ADD","arg":N?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructionRecord {
    pub index: usize,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arg: Option<i64>,
}

impl From<(usize, LinkedOpcode)> for InstructionRecord {
    fn from((index, opcode): (usize, LinkedOpcode)) -> Self {
        Self {
            index,
            command: opcode.op.name().to_string(),
            arg: opcode.arg,
        }
    }
}

impl InstructionRecord {
    /// Decode back to a `LinkedOpcode`, accepting the command name
    /// case-insensitively.
    pub fn to_linked(&self) -> Option<LinkedOpcode> {
        let op = OpcodeType::from_name(&self.command)?;
        Some(LinkedOpcode { op, arg: self.arg })
    }
}

/// Grammatical role of a source term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermType {
    Di,
    Ei,
    Dup,
    Add,
    Omit,
    Swap,
    Drop,
    Over,
    Eq,
    Read,
    Variable,
    Allot,
    Store,
    Load,
    If,
    Else,
    Then,
    Print,
    Def,
    Ret,
    DefIntr,
    While,
    Endwhile,
    Call,
    String,
    Entrypoint,
}

impl TermType {
    /// Reserved-word mapping, used by the lexer to tag known words. `Swap`,
    /// `Drop`, `Over`, and `Print` are real term kinds but are not reachable
    /// through any source keyword — `Swap` is only ever emitted internally by
    /// the string print-loop codegen, and the others have no lexical form at
    /// all, matching the reference compiler's reserved-word table exactly.
    pub fn from_reserved_word(word: &str) -> Option<Self> {
        Some(match word {
            "di" => Self::Di,
            "ei" => Self::Ei,
            "dup" => Self::Dup,
            "+" => Self::Add,
            "omit" => Self::Omit,
            "=" => Self::Eq,
            "read" => Self::Read,
            "variable" => Self::Variable,
            "allot" => Self::Allot,
            "!" => Self::Store,
            "@" => Self::Load,
            "if" => Self::If,
            "else" => Self::Else,
            "then" => Self::Then,
            ":" => Self::Def,
            ";" => Self::Ret,
            "interrupt" => Self::DefIntr,
            "while" => Self::While,
            "endwhile" => Self::Endwhile,
            _ => return None,
        })
    }
}

/// One lexical term in the source, annotated across the analysis passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminal {
    pub word_number: usize,
    pub term_type: Option<TermType>,
    pub word: String,
    pub converted: bool,
    pub operand: Option<usize>,
}

impl Terminal {
    pub fn new(word_number: usize, word: impl Into<String>) -> Self {
        let word = word.into();
        let term_type = TermType::from_reserved_word(&word);
        Self {
            word_number,
            term_type,
            word,
            converted: false,
            operand: None,
        }
    }
}
