//! Two-input combinational ALU.

use crate::isa::OpcodeType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOpcode {
    IncA,
    IncB,
    DecA,
    DecB,
    Add,
    Eq,
}

/// Maps the subset of opcodes that run through the ALU. Every other opcode
/// returns `None`, meaning the control unit dispatches it directly instead
/// of routing it through `Alu::calc`.
pub fn opcode_to_alu_opcode(op: OpcodeType) -> Option<AluOpcode> {
    match op {
        OpcodeType::Add => Some(AluOpcode::Add),
        OpcodeType::Eq => Some(AluOpcode::Eq),
        _ => None,
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Alu {
    pub src_a: i64,
    pub src_b: i64,
    pub result: i64,
}

impl Alu {
    pub fn set_details(&mut self, src_a: i64, src_b: i64) {
        self.src_a = src_a;
        self.src_b = src_b;
    }

    /// Combinational compute, latched into `result` — a distinct tick from
    /// the register write that later reads it via `TopSource::Alu`.
    pub fn calc(&mut self, op: AluOpcode) {
        self.result = match op {
            AluOpcode::IncA => self.src_a + 1,
            AluOpcode::IncB => self.src_b + 1,
            AluOpcode::DecA => self.src_a - 1,
            AluOpcode::DecB => self.src_b - 1,
            AluOpcode::Add => self.src_a + self.src_b,
            AluOpcode::Eq => (self.src_a == self.src_b) as i64,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_add_and_eq_map_to_the_alu() {
        assert_eq!(opcode_to_alu_opcode(OpcodeType::Add), Some(AluOpcode::Add));
        assert_eq!(opcode_to_alu_opcode(OpcodeType::Eq), Some(AluOpcode::Eq));
        for op in [
            OpcodeType::Nop,
            OpcodeType::Dup,
            OpcodeType::Swap,
            OpcodeType::Push,
            OpcodeType::Halt,
        ] {
            assert_eq!(opcode_to_alu_opcode(op), None);
        }
    }

    #[test]
    fn add_and_eq_compute_correctly() {
        let mut alu = Alu::default();
        alu.set_details(2, 3);
        alu.calc(AluOpcode::Add);
        assert_eq!(alu.result, 5);
        alu.calc(AluOpcode::Eq);
        assert_eq!(alu.result, 0);
        alu.set_details(7, 7);
        alu.calc(AluOpcode::Eq);
        assert_eq!(alu.result, 1);
    }
}
