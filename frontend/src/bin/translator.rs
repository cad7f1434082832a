//! `translator <source> <target_code> <target_memory>` — compiles a source
//! file to a linked instruction-record file and a data-memory image.

use clap::Parser;
use stackforth_core::isa::InstructionRecord;
use stackforth_core::translate::translate;

#[derive(Parser)]
#[command(about = "Compile a source program to a linked instruction stream and memory image")]
struct Args {
    source: String,
    target_code: String,
    target_memory: String,
}

fn write_code(path: &str, records: &[InstructionRecord]) -> std::io::Result<()> {
    let lines: Vec<String> = records
        .iter()
        .map(|r| serde_json::to_string(r).expect("instruction record serializes"))
        .collect();
    std::fs::write(path, format!("[{}]", lines.join(",\n ")))
}

fn write_memory(path: &str, memory: &[i64]) -> std::io::Result<()> {
    let values: Vec<String> = memory.iter().map(i64::to_string).collect();
    std::fs::write(path, format!("[{}]", values.join(", ")))
}

fn main() {
    let args = Args::parse();
    let source = std::fs::read_to_string(&args.source).unwrap_or_else(|e| {
        eprintln!("failed to read {}: {e}", args.source);
        std::process::exit(1);
    });

    let translated = translate(&source).unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(1);
    });

    let records: Vec<InstructionRecord> = translated
        .program
        .into_iter()
        .enumerate()
        .map(InstructionRecord::from)
        .collect();

    if let Err(e) = write_code(&args.target_code, &records) {
        eprintln!("failed to write {}: {e}", args.target_code);
        std::process::exit(1);
    }
    if let Err(e) = write_memory(&args.target_memory, &translated.data_memory) {
        eprintln!("failed to write {}: {e}", args.target_memory);
        std::process::exit(1);
    }
}
