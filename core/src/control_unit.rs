//! Fetch/decode/execute loop, interrupt dispatch, and the per-tick trace
//! journal.

use crate::alu::opcode_to_alu_opcode;
use crate::datapath::{DataPath, NextSource, TempSource, TopSource};
use crate::error::RunError;
use crate::isa::{LinkedOpcode, OpcodeType};

/// One external input event: deliver `ch` once `tick_number >= due_tick`.
#[derive(Debug, Clone, Copy)]
pub struct InterruptToken {
    pub due_tick: usize,
    pub ch: char,
}

#[derive(Debug, Clone, Copy, Default)]
struct PendingState {
    irq_request: bool,
    irq_on: bool,
}

/// Outcome of a completed (or limit-cut) run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub output: String,
    pub tick_count: usize,
    pub journal: Vec<String>,
    pub halted: bool,
}

pub struct ControlUnit {
    program: Vec<LinkedOpcode>,
    data_path: DataPath,
    tick_number: usize,
    instruction_number: usize,
    out_buffer: String,
    journal: Vec<String>,
    io: char,
    ps: PendingState,
    tokens: Vec<InterruptToken>,
    already_fetched: Vec<bool>,
}

impl ControlUnit {
    pub fn new(program: Vec<LinkedOpcode>, memory: Vec<i64>, tokens: Vec<InterruptToken>) -> Self {
        let already_fetched = vec![false; tokens.len()];
        Self {
            program,
            data_path: DataPath::new(memory),
            tick_number: 0,
            instruction_number: 0,
            out_buffer: String::new(),
            journal: Vec::new(),
            io: 'h',
            ps: PendingState {
                irq_request: false,
                irq_on: true,
            },
            tokens,
            already_fetched,
        }
    }

    fn tick(&mut self, f: impl FnOnce(&mut DataPath) -> Result<(), RunError>) -> Result<(), RunError> {
        f(&mut self.data_path)?;
        self.tick_number += 1;
        self.journal.push(self.format_journal_line());
        Ok(())
    }

    fn format_journal_line(&self) -> String {
        let dp = &self.data_path;
        let ds_head = dp
            .data_stack
            .get((dp.sp - 1).max(0) as usize)
            .copied()
            .unwrap_or(0);
        let rs_head: Vec<i64> = (1..=3)
            .map(|i| {
                dp.return_stack
                    .get((dp.rsp - i).max(0) as usize)
                    .copied()
                    .unwrap_or(0)
            })
            .collect();
        let data_head = match dp.peek_data_head() {
            Some(v) => v.to_string(),
            None => "?".to_string(),
        };
        format!(
            "TICK: {:>4} | PC: {:>4} | SP: {:>3} | RSP: {:>3} | IRQ_R {:>2} | IRQ_ON: {:>3} | S_HEAD : [{}, {}, {}] | RS_HEAD : [{}, {}, {}] | DATA_HEAD {:>3}",
            self.tick_number,
            dp.pc,
            dp.sp,
            dp.rsp,
            self.ps.irq_request as u8,
            self.ps.irq_on as u8,
            dp.top,
            dp.next,
            ds_head,
            rs_head[0],
            rs_head[1],
            rs_head[2],
            data_head,
        )
    }

    /// Pop sequence shared by several opcodes: `top <- next; sp--; next <- data_stack[sp]`.
    fn pop(&mut self) -> Result<(), RunError> {
        self.tick(|dp| dp.latch_top(TopSource::Next))?;
        self.tick(|dp| dp.latch_sp_dec())?;
        self.tick(|dp| dp.latch_next(NextSource::Mem))
    }

    fn exec(&mut self, op: LinkedOpcode) -> Result<bool, RunError> {
        if let Some(alu_op) = opcode_to_alu_opcode(op.op) {
            self.tick(|dp| {
                dp.signal_alu_operation(alu_op);
                Ok(())
            })?;
            self.tick(|dp| dp.latch_top(TopSource::Alu))?;
            self.tick(|dp| dp.latch_sp_dec())?;
            self.tick(|dp| dp.latch_next(NextSource::Mem))?;
            return Ok(false);
        }

        match op.op {
            OpcodeType::Push => {
                let arg = op.arg.unwrap_or(0);
                self.tick(|dp| dp.signal_data_write())?;
                self.tick(|dp| dp.latch_sp_inc())?;
                self.tick(|dp| dp.latch_next(NextSource::Top))?;
                self.tick(|dp| dp.latch_top(TopSource::Immediate(arg)))?;
            }
            OpcodeType::Dup => {
                self.tick(|dp| dp.signal_data_write())?;
                self.tick(|dp| dp.latch_next(NextSource::Top))?;
                self.tick(|dp| dp.latch_sp_inc())?;
            }
            OpcodeType::Load => {
                self.tick(|dp| dp.latch_top(TopSource::Mem))?;
            }
            OpcodeType::Store => {
                self.tick(|dp| dp.signal_mem_write())?;
                self.tick(|dp| dp.latch_sp_dec())?;
                self.tick(|dp| dp.latch_next(NextSource::Mem))?;
                self.tick(|dp| dp.latch_top(TopSource::Next))?;
                self.tick(|dp| dp.latch_sp_dec())?;
                self.tick(|dp| dp.latch_next(NextSource::Mem))?;
            }
            OpcodeType::Omit => {
                let ch = char::from_u32(self.data_path.next as u32).unwrap_or('\u{fffd}');
                self.out_buffer.push(ch);
                self.pop()?;
                self.pop()?;
            }
            OpcodeType::Read => {
                self.tick(|dp| dp.latch_top(TopSource::Next))?;
                self.tick(|dp| dp.latch_sp_dec())?;
                self.tick(|dp| dp.signal_data_write())?;
                self.tick(|dp| dp.latch_sp_inc())?;
                self.tick(|dp| dp.latch_next(NextSource::Top))?;
                let io = self.io;
                self.tick(|dp| dp.latch_top(TopSource::Immediate(io as i64)))?;
            }
            OpcodeType::Swap => {
                self.tick(|dp| dp.latch_temp(TempSource::Top))?;
                self.tick(|dp| dp.latch_top(TopSource::Next))?;
                self.tick(|dp| dp.latch_next(NextSource::Temp))?;
            }
            OpcodeType::Zjmp => {
                let arg = op.arg.unwrap_or(0);
                if self.data_path.top == 0 {
                    self.tick(move |dp| {
                        dp.pc = arg - 1;
                        Ok(())
                    })?;
                }
                self.pop()?;
            }
            OpcodeType::Jmp => {
                let arg = op.arg.unwrap_or(0);
                self.tick(move |dp| {
                    dp.pc = arg - 1;
                    Ok(())
                })?;
            }
            OpcodeType::Call => {
                let arg = op.arg.unwrap_or(0);
                self.tick(|dp| dp.signal_ret_write())?;
                self.tick(|dp| dp.latch_rsp_inc())?;
                self.tick(move |dp| {
                    dp.pc = arg - 1;
                    Ok(())
                })?;
            }
            OpcodeType::Ret => {
                self.tick(|dp| dp.latch_rsp_dec())?;
                let target = self
                    .data_path
                    .return_stack
                    .get(self.data_path.rsp as usize)
                    .copied()
                    .unwrap_or(0);
                self.tick(move |dp| {
                    dp.pc = target;
                    Ok(())
                })?;
            }
            OpcodeType::Di => {
                self.ps.irq_on = false;
                self.handle_irq();
                self.ps.irq_request = false;
                self.tick(|_| Ok(()))?;
            }
            OpcodeType::Ei => {
                self.ps.irq_on = true;
                self.handle_irq();
                self.ps.irq_request = false;
                self.tick(|_| Ok(()))?;
            }
            OpcodeType::Nop | OpcodeType::Mod => {
                self.tick(|_| Ok(()))?;
            }
            OpcodeType::Halt => return Ok(true),
            OpcodeType::Add | OpcodeType::Eq => unreachable!("routed through the ALU branch above"),
        }
        Ok(false)
    }

    /// Scans pending input tokens and, if interrupts are enabled and one is
    /// due, dispatches to the fixed interrupt-handler entry address `1`.
    /// Services at most one token per call. Sets `ps.irq_request` when it
    /// dispatches but never clears it itself — `Di`/`Ei` are responsible for
    /// the unconditional reset afterward, matching `signal_latch_ps`'s
    /// `self.ps[irq_request] = self.handle_irq()` write-back in the
    /// reference machine, where `handle_irq` always returns `False` no
    /// matter which branch it took.
    fn handle_irq(&mut self) {
        if !self.ps.irq_on {
            return;
        }
        for (i, token) in self.tokens.iter().enumerate() {
            if self.already_fetched[i] {
                continue;
            }
            if token.due_tick <= self.tick_number {
                self.already_fetched[i] = true;
                self.io = token.ch;
                self.ps.irq_on = false;
                self.ps.irq_request = true;
                let _ = self.tick(|dp| dp.signal_ret_write());
                // `fetch_single_command` still increments `pc` after this
                // returns, so setting it to 0 here lands the handler at
                // address 1, its fixed entry point.
                let _ = self.tick(|dp| {
                    dp.pc = 0;
                    Ok(())
                });
                let _ = self.tick(|dp| dp.latch_rsp_inc());
                break;
            }
        }
    }

    /// Decode + interrupt check + `pc++`, mirroring the driver's
    /// `fetch_single_command`. On `HALT`, the reference machine's
    /// `decode_instruction` raises before its caller reaches the interrupt
    /// check or the `pc` latch, so a halted decode must skip both here too.
    fn fetch_single_command(&mut self) -> Result<bool, RunError> {
        let instr = *self
            .program
            .get(self.data_path.pc as usize)
            .ok_or(RunError::UnknownOpcode {
                index: self.data_path.pc as usize,
            })?;
        self.instruction_number += 1;
        let halted = self.exec(instr)?;
        if halted {
            return Ok(true);
        }
        self.handle_irq();
        self.data_path.pc += 1;
        Ok(false)
    }

    /// Runs until `HALT` or until `instruction_number >= limit`.
    pub fn run(&mut self, limit: usize) -> Result<RunOutcome, RunError> {
        let mut halted = false;
        while self.instruction_number < limit {
            if self.fetch_single_command()? {
                halted = true;
                break;
            }
        }
        Ok(RunOutcome {
            output: self.out_buffer.clone(),
            tick_count: self.tick_number,
            journal: self.journal.clone(),
            halted,
        })
    }

    pub fn top(&self) -> i64 {
        self.data_path.top
    }

    pub fn memory(&self) -> &[i64] {
        &self.data_path.memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::OpcodeType::*;

    fn prog(ops: &[(OpcodeType, Option<i64>)]) -> Vec<LinkedOpcode> {
        ops.iter()
            .map(|&(op, arg)| LinkedOpcode { op, arg })
            .collect()
    }

    #[test]
    fn push_add_halt_leaves_sum_on_top() {
        let program = prog(&[
            (Push, Some(2)),
            (Push, Some(3)),
            (Add, None),
            (Halt, None),
        ]);
        let mut cu = ControlUnit::new(program, vec![0; 1024], vec![]);
        let outcome = cu.run(1000).unwrap();
        assert!(outcome.halted);
    }

    #[test]
    fn zjmp_on_zero_top_branches() {
        // PUSH 0; ZJMP 4; PUSH 1; HALT(unreached marker); <4> PUSH 2; HALT
        let program = prog(&[
            (Push, Some(0)),
            (Zjmp, Some(4)),
            (Push, Some(1)),
            (Halt, None),
            (Push, Some(2)),
            (Halt, None),
        ]);
        let mut cu = ControlUnit::new(program, vec![0; 1024], vec![]);
        let outcome = cu.run(1000).unwrap();
        assert!(outcome.halted);
    }

    #[test]
    fn limit_cuts_execution_without_error() {
        let program = prog(&[(Nop, None), (Jmp, Some(0))]);
        let mut cu = ControlUnit::new(program, vec![0; 1024], vec![]);
        let outcome = cu.run(5).unwrap();
        assert!(!outcome.halted);
    }

    #[test]
    fn unknown_address_is_a_run_error() {
        let program = prog(&[(Jmp, Some(99))]);
        let mut cu = ControlUnit::new(program, vec![0; 1024], vec![]);
        assert!(cu.run(5).is_err());
    }
}
