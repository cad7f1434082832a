//! `machine <code_file> <memory_file> [<input_file>]` — executes a linked
//! program and prints tick count, output buffer, and the trace journal.

use clap::Parser;
use serde::Deserialize;
use stackforth_core::control_unit::{ControlUnit, InterruptToken};
use stackforth_core::isa::InstructionRecord;

const DEFAULT_LIMIT: usize = 1000;

#[derive(Parser)]
#[command(about = "Run a compiled program against the stack machine")]
struct Args {
    code_file: String,
    memory_file: String,
    input_file: Option<String>,
}

#[derive(Deserialize)]
struct RawToken(usize, String);

fn load_tokens(path: &str) -> Vec<InterruptToken> {
    let text = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("failed to read {path}: {e}");
        std::process::exit(1);
    });
    let raw: Vec<RawToken> = serde_json::from_str(&text).unwrap_or_else(|e| {
        eprintln!("malformed input token file {path}: {e}");
        std::process::exit(1);
    });
    raw.into_iter()
        .map(|RawToken(due_tick, ch)| InterruptToken {
            due_tick,
            ch: ch.chars().next().unwrap_or('\0'),
        })
        .collect()
}

fn main() {
    let args = Args::parse();

    let code_text = std::fs::read_to_string(&args.code_file).unwrap_or_else(|e| {
        eprintln!("failed to read {}: {e}", args.code_file);
        std::process::exit(1);
    });
    let records: Vec<InstructionRecord> = serde_json::from_str(&code_text).unwrap_or_else(|e| {
        eprintln!("malformed code file {}: {e}", args.code_file);
        std::process::exit(1);
    });
    let program = records
        .iter()
        .map(|r| {
            r.to_linked().unwrap_or_else(|| {
                eprintln!("unknown opcode {:?} at index {}", r.command, r.index);
                std::process::exit(1);
            })
        })
        .collect();

    let mem_text = std::fs::read_to_string(&args.memory_file).unwrap_or_else(|e| {
        eprintln!("failed to read {}: {e}", args.memory_file);
        std::process::exit(1);
    });
    let memory: Vec<i64> = serde_json::from_str(&mem_text).unwrap_or_else(|e| {
        eprintln!("malformed memory file {}: {e}", args.memory_file);
        std::process::exit(1);
    });

    let tokens = args.input_file.as_deref().map(load_tokens).unwrap_or_default();

    let mut cu = ControlUnit::new(program, memory, tokens);
    let outcome = cu.run(DEFAULT_LIMIT).unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(1);
    });

    println!("Number of ticks: {}", outcome.tick_count.saturating_sub(1));
    println!("Output buffer: {}", outcome.output);
    for line in &outcome.journal {
        println!("{line}");
    }
}
