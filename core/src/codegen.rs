//! Per-term lowering, string-literal materialization, interrupt-vector
//! placement, and address fix-up.

use crate::analyzer::TranslationContext;
use crate::isa::{LinkedOpcode, Opcode, OpcodeParam, OpcodeType, TermType, Terminal};

/// Partitions terms (after the entrypoint) into the interrupt-handler body
/// and the ordinary program, and sets the entrypoint's jump target so it
/// skips the interrupt region. Terms are `terms[0]` (entrypoint) followed by
/// the original source terms.
pub fn handle_interruption_vectors(terms: &[Terminal]) -> Vec<Terminal> {
    let mut is_interrupt = false;
    let mut interrupt_ret: usize = 1;
    let mut interrupt_proc = Vec::new();
    let mut ordinary = Vec::new();

    for term in &terms[1..] {
        if term.term_type == Some(TermType::DefIntr) {
            is_interrupt = true;
        }
        if term.term_type == Some(TermType::Ret) {
            if is_interrupt {
                interrupt_proc.push(term.clone());
                interrupt_ret = interrupt_proc.len() + 1;
            } else {
                ordinary.push(term.clone());
            }
            is_interrupt = false;
            continue;
        }
        if is_interrupt {
            interrupt_proc.push(term.clone());
        } else {
            ordinary.push(term.clone());
        }
    }

    let mut entrypoint = terms[0].clone();
    entrypoint.operand = Some(interrupt_ret);

    let mut result = vec![entrypoint];
    result.extend(interrupt_proc);
    result.extend(ordinary);
    result
}

/// The print-loop opcode count emitted by `emit_string`, used to compute the
/// back-jump offset by construction rather than as a magic constant.
const STRING_LOOP_LEN: isize = 13;

fn emit_string(term: &Terminal, ctx: &mut TranslationContext) -> Vec<Opcode> {
    if term.converted {
        return Vec::new();
    }
    let start = ctx.string_address;
    let content = &term.word[2..term.word.len() - 1];
    for ch in content.chars() {
        ctx.data_memory[ctx.string_address as usize] = ch as i64;
        ctx.string_address += 1;
    }
    ctx.data_memory[ctx.string_address as usize] = 0;
    ctx.string_address += 1;

    vec![
        Opcode::with_param(OpcodeType::Push, OpcodeParam::Const(start)),
        Opcode::bare(OpcodeType::Dup),
        Opcode::bare(OpcodeType::Load),
        Opcode::bare(OpcodeType::Dup),
        Opcode::with_param(OpcodeType::Push, OpcodeParam::Const(0)),
        Opcode::bare(OpcodeType::Omit),
        Opcode::with_param(OpcodeType::Push, OpcodeParam::Const(0)),
        Opcode::bare(OpcodeType::Eq),
        Opcode::bare(OpcodeType::Swap),
        Opcode::with_param(OpcodeType::Push, OpcodeParam::Const(1)),
        Opcode::bare(OpcodeType::Add),
        Opcode::bare(OpcodeType::Swap),
        Opcode::with_param(
            OpcodeType::Zjmp,
            OpcodeParam::AddrRel(-(STRING_LOOP_LEN - 2)),
        ),
    ]
}

/// Lowers a single term to zero or more pre-link opcodes, rewriting
/// `Undefined` params to `Addr(operand)` when the term carries a resolved
/// operand.
fn codegen_opcodes(term: &Terminal, ctx: &mut TranslationContext) -> Vec<Opcode> {
    let mut opcodes = match term.term_type {
        Some(TermType::Add) => Some(vec![Opcode::bare(OpcodeType::Add)]),
        Some(TermType::Di) => Some(vec![Opcode::bare(OpcodeType::Di)]),
        Some(TermType::Ei) => Some(vec![Opcode::bare(OpcodeType::Ei)]),
        Some(TermType::Dup) => Some(vec![Opcode::bare(OpcodeType::Dup)]),
        Some(TermType::Omit) => Some(vec![Opcode::bare(OpcodeType::Omit)]),
        Some(TermType::Eq) => Some(vec![Opcode::bare(OpcodeType::Eq)]),
        Some(TermType::Read) => Some(vec![Opcode::bare(OpcodeType::Read)]),
        Some(TermType::Variable) => Some(Vec::new()),
        Some(TermType::Allot) => Some(Vec::new()),
        Some(TermType::Store) => Some(vec![Opcode::bare(OpcodeType::Store)]),
        Some(TermType::Load) => Some(vec![Opcode::bare(OpcodeType::Load)]),
        Some(TermType::If) => Some(vec![Opcode::with_param(
            OpcodeType::Zjmp,
            OpcodeParam::Undefined,
        )]),
        Some(TermType::Else) => Some(vec![Opcode::with_param(
            OpcodeType::Jmp,
            OpcodeParam::Undefined,
        )]),
        Some(TermType::Then) => Some(Vec::new()),
        Some(TermType::Def) => Some(vec![Opcode::with_param(
            OpcodeType::Jmp,
            OpcodeParam::Undefined,
        )]),
        Some(TermType::Ret) => Some(vec![Opcode::bare(OpcodeType::Ret)]),
        Some(TermType::DefIntr) => Some(Vec::new()),
        Some(TermType::While) => Some(Vec::new()),
        Some(TermType::Endwhile) => Some(vec![Opcode::with_param(
            OpcodeType::Zjmp,
            OpcodeParam::Undefined,
        )]),
        Some(TermType::Call) => Some(vec![Opcode::with_param(
            OpcodeType::Call,
            OpcodeParam::Undefined,
        )]),
        Some(TermType::Entrypoint) => Some(vec![Opcode::with_param(
            OpcodeType::Jmp,
            OpcodeParam::Undefined,
        )]),
        _ => None,
    };

    if let (Some(operand), Some(ops)) = (term.operand, opcodes.as_mut()) {
        for opcode in ops.iter_mut() {
            if opcode.param == Some(OpcodeParam::Undefined) {
                opcode.param = Some(OpcodeParam::Addr(operand));
            }
        }
    }

    match opcodes {
        Some(ops) => ops,
        None => {
            if term.term_type == Some(TermType::String) {
                emit_string(term, ctx)
            } else if term.converted {
                Vec::new()
            } else {
                literal_opcode(term)
            }
        }
    }
}

/// An unresolved, unconverted term is a numeric literal: `PUSH <value>`.
fn literal_opcode(term: &Terminal) -> Vec<Opcode> {
    let value: i64 = term.word.parse().unwrap_or(0);
    vec![Opcode::with_param(OpcodeType::Push, OpcodeParam::Const(value))]
}

/// Converts term-index (`Addr`) and emission-relative (`AddrRel`) params to
/// absolute instruction addresses, then appends the trailing `HALT`.
pub fn fetch_opcode_addresses(term_opcodes: Vec<Vec<Opcode>>) -> Vec<LinkedOpcode> {
    let mut pref_sum = vec![0usize];
    for ops in &term_opcodes {
        let last = *pref_sum.last().unwrap();
        pref_sum.push(last + ops.len());
    }

    let mut result = Vec::new();
    for ops in term_opcodes {
        for opcode in ops {
            let arg = match opcode.param {
                Some(OpcodeParam::Const(v)) => Some(v),
                Some(OpcodeParam::Addr(term_index)) => Some(pref_sum[term_index] as i64),
                Some(OpcodeParam::AddrRel(rel)) => Some((result.len() as isize + rel) as i64),
                Some(OpcodeParam::Undefined) => {
                    unreachable!("undefined opcode param reached fix-up")
                }
                None => None,
            };
            result.push(LinkedOpcode { op: opcode.op, arg });
        }
    }
    result.push(LinkedOpcode {
        op: OpcodeType::Halt,
        arg: None,
    });
    result
}

/// Lowers every term (after interrupt-vector placement) and fixes up
/// addresses, producing the final linked program.
pub fn terms_to_opcodes(terms: &[Terminal], ctx: &mut TranslationContext) -> Vec<LinkedOpcode> {
    let placed = handle_interruption_vectors(terms);
    let term_opcodes: Vec<Vec<Opcode>> = placed.iter().map(|t| codegen_opcodes(t, ctx)).collect();
    fetch_opcode_addresses(term_opcodes)
}
