//! End-to-end translate-then-run scenarios exercised through the public API,
//! mirroring the teacher's black-box `tests/*_test.rs` layout.

use stackforth_core::control_unit::{ControlUnit, InterruptToken};
use stackforth_core::translate::translate;

fn run(source: &str, limit: usize, tokens: Vec<InterruptToken>) -> (ControlUnit, stackforth_core::control_unit::RunOutcome) {
    let translated = translate(source).expect("translation succeeds");
    let mut cu = ControlUnit::new(translated.program, translated.data_memory, tokens);
    let outcome = cu.run(limit).expect("run succeeds");
    (cu, outcome)
}

#[test]
fn add_of_two_literals() {
    // A `:`-definition's own JMP skips its body until called.
    let (cu, outcome) = run(": main 2 3 + ; main", 1000, vec![]);
    assert!(outcome.halted);
    assert_eq!(cu.top(), 5);
    assert!(outcome.output.is_empty());
}

#[test]
fn dot_quote_string_prints_its_content() {
    let (_, outcome) = run(": main \". hi\" ; main", 1000, vec![]);
    assert!(outcome.halted);
    assert_eq!(outcome.output, "hi");
}

#[test]
fn variable_store_then_load_round_trips() {
    let (cu, outcome) = run("variable x 5 x ! x @", 1000, vec![]);
    assert!(outcome.halted);
    assert_eq!(cu.memory()[0], 5);
    assert_eq!(cu.top(), 5);
}

#[test]
fn if_else_then_takes_the_false_branch() {
    let (cu, outcome) = run("0 if 1 else 2 then", 1000, vec![]);
    assert!(outcome.halted);
    assert_eq!(cu.top(), 2);
}

#[test]
fn if_else_then_takes_the_true_branch() {
    let (cu, outcome) = run("1 if 1 else 2 then", 1000, vec![]);
    assert!(outcome.halted);
    assert_eq!(cu.top(), 1);
}

#[test]
fn while_endwhile_counts_down_to_zero() {
    let (cu, outcome) = run("3 while -1 + dup 0 = endwhile", 1000, vec![]);
    assert!(outcome.halted);
    assert_eq!(cu.top(), 0);
}

#[test]
fn nested_function_call_returns_to_the_right_place() {
    // `main` calls `helper`, which doubles top via ADD, then control must
    // resume at `main`'s own trailing `+` rather than falling off the end.
    let (cu, outcome) = run(": helper dup + ; : main 10 helper 1 + ; main", 1000, vec![]);
    assert!(outcome.halted);
    assert_eq!(cu.top(), 21);
}

#[test]
fn interrupt_handler_output_is_appended_to_main_output() {
    // The interrupt body is introduced by `interrupt <discarded-name> ... ;`
    // — the term right after `interrupt` is consumed the same way a
    // function name is consumed after `:`, so it must be a throwaway word,
    // not the first real opcode of the handler.
    let source = "interrupt bang \". !\" ; \". hi\"";
    let tokens = vec![InterruptToken { due_tick: 5, ch: 'a' }];
    let (_, outcome) = run(source, 1000, tokens);
    assert!(outcome.halted);
    assert!(outcome.output.contains('!'));
    assert!(outcome.output.contains("hi"));

    // IRQ_R must flip from 0 to 1 exactly once, at the service boundary.
    let irq_r_values: Vec<char> = outcome
        .journal
        .iter()
        .filter_map(|line| line.split("IRQ_R ").nth(1))
        .filter_map(|rest| rest.trim_start().chars().next())
        .collect();
    assert!(irq_r_values.contains(&'1'), "interrupt never serviced");
    let transitions = irq_r_values
        .windows(2)
        .filter(|w| w[0] == '0' && w[1] == '1')
        .count();
    assert_eq!(transitions, 1);
}

#[test]
fn run_is_deterministic_for_fixed_inputs() {
    let source = ": main 1 2 + 3 + ; main";
    let tokens = vec![InterruptToken { due_tick: 3, ch: 'x' }];
    let (_, first) = run(source, 500, tokens.clone());
    let (_, second) = run(source, 500, tokens);
    assert_eq!(first.output, second.output);
    assert_eq!(first.tick_count, second.tick_count);
    assert_eq!(first.journal, second.journal);
}

#[test]
fn instruction_limit_cuts_execution_silently() {
    let source = ": main 1 2 + ; main";
    let translated = translate(source).unwrap();
    let mut cu = ControlUnit::new(translated.program, translated.data_memory, vec![]);
    let outcome = cu.run(1).expect("limit cutoff is not an error");
    assert!(!outcome.halted);
}

#[test]
fn unmatched_if_is_rejected_before_codegen() {
    assert!(translate("1 if 2").is_err());
}

#[test]
fn unmatched_definition_is_rejected_before_codegen() {
    assert!(translate(": main 1 2 +").is_err());
}

#[test]
fn reference_to_an_unknown_word_is_a_link_error() {
    assert!(translate(": main nosuchword ;").is_err());
}
