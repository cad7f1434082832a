//! Five ordered semantic-analysis passes that annotate a term stream with
//! resolved operands before code generation.

use std::collections::HashMap;

use crate::error::TranslateError;
use crate::isa::{TermType, Terminal};

/// State accumulated across the analysis and code-generation passes for a
/// single `translate()` call. Replaces the module-level mutable globals of
/// the reference compiler.
#[derive(Debug, Default)]
pub struct TranslationContext {
    pub variables: HashMap<String, i64>,
    pub functions: HashMap<String, usize>,
    pub var_address: i64,
    pub data_memory: Vec<i64>,
    pub string_address: i64,
}

impl TranslationContext {
    pub fn new() -> Self {
        Self {
            data_memory: vec![0; crate::datapath::MEMORY_SIZE],
            ..Default::default()
        }
    }
}

/// Pass 1: every `WHILE` must be closed by a matching `ENDWHILE`; sets each
/// `ENDWHILE`'s operand to its opening `WHILE`'s word number.
pub fn validate_loops(terms: &mut [Terminal]) -> Result<(), TranslateError> {
    let mut nested = Vec::new();
    for i in 0..terms.len() {
        match terms[i].term_type {
            Some(TermType::While) => nested.push(terms[i].word_number),
            Some(TermType::Endwhile) => {
                let open = nested.pop().ok_or_else(|| TranslateError::Parse {
                    word_number: terms[i].word_number,
                    message: "endwhile with no matching while".to_string(),
                })?;
                terms[i].operand = Some(open);
            }
            _ => {}
        }
    }
    if let Some(word_number) = nested.pop() {
        return Err(TranslateError::Parse {
            word_number,
            message: "while not closed by endwhile".to_string(),
        });
    }
    Ok(())
}

/// Pass 2: discovers `:`/`interrupt` ... `;` definitions, binding each
/// function/interrupt name to the term index just past its header, and each
/// opening `:`/`interrupt`'s own operand to the term index just past its
/// matching `;` — that is what its `JMP(UNDEFINED)` needs to skip the body.
pub fn fetch_ret_addresses(
    terms: &mut [Terminal],
    ctx: &mut TranslationContext,
) -> Result<(), TranslateError> {
    let mut open_defs: Vec<usize> = Vec::new();
    for i in 0..terms.len() {
        match terms[i].term_type {
            Some(TermType::Def) | Some(TermType::DefIntr) => {
                open_defs.push(i);
                if let Some(name_term) = terms.get_mut(i + 1) {
                    ctx.functions
                        .insert(name_term.word.clone(), terms[i].word_number + 1);
                    name_term.converted = true;
                }
            }
            Some(TermType::Ret) => {
                let opener = open_defs.pop().ok_or_else(|| TranslateError::Parse {
                    word_number: terms[i].word_number,
                    message: "; with no matching : or interrupt".to_string(),
                })?;
                terms[opener].operand = Some(terms[i].word_number + 1);
            }
            _ => {}
        }
    }
    if let Some(opener) = open_defs.pop() {
        return Err(TranslateError::Parse {
            word_number: terms[opener].word_number,
            message: ": or interrupt not closed by ;".to_string(),
        });
    }
    Ok(())
}

/// Pass 3: binds `variable` declarations (and any trailing `allot`) to
/// sequential data-memory addresses.
pub fn fetch_vars(terms: &mut [Terminal], ctx: &mut TranslationContext) {
    let mut i = 0;
    while i < terms.len() {
        if terms[i].term_type == Some(TermType::Variable) {
            if let Some(name_term) = terms.get_mut(i + 1) {
                ctx.variables.insert(name_term.word.clone(), ctx.var_address);
                name_term.converted = true;
            }
            ctx.var_address += 1;
            if i + 3 < terms.len() && terms[i + 3].term_type == Some(TermType::Allot) {
                let allot_size: i64 = terms[i + 2].word.parse().unwrap_or(0);
                terms[i + 2].converted = true;
                ctx.var_address += allot_size;
            }
        }
        i += 1;
    }
}

/// Pass 4: rewrites unresolved identifiers that name a known variable into a
/// numeric-literal word, then rewrites any still-unresolved identifier that
/// names a known function into a `CALL` term.
pub fn create_bindings(terms: &mut [Terminal], ctx: &TranslationContext) {
    for term in terms.iter_mut() {
        if term.term_type.is_none() && !term.converted {
            if let Some(addr) = ctx.variables.get(&term.word) {
                term.word = addr.to_string();
            }
        }
    }
    for term in terms.iter_mut() {
        if term.term_type.is_none() && !term.converted {
            if let Some(&addr) = ctx.functions.get(&term.word) {
                term.operand = Some(addr);
                term.term_type = Some(TermType::Call);
                term.word = "call".to_string();
            }
        }
    }
}

/// Pass 5: binds `if`/`else`/`then` nesting.
pub fn fetch_if_statement(terms: &mut [Terminal]) -> Result<(), TranslateError> {
    let mut nested: Vec<usize> = Vec::new();
    for i in 0..terms.len() {
        match terms[i].term_type {
            Some(TermType::If) | Some(TermType::Else) => nested.push(i),
            Some(TermType::Then) => {
                let last = nested.pop().ok_or_else(|| TranslateError::Parse {
                    word_number: terms[i].word_number,
                    message: "then with no matching if".to_string(),
                })?;
                if terms[last].term_type == Some(TermType::Else) {
                    let else_idx = last;
                    let if_idx = nested.pop().ok_or_else(|| TranslateError::Parse {
                        word_number: terms[i].word_number,
                        message: "else with no matching if".to_string(),
                    })?;
                    terms[else_idx].operand = Some(terms[i].word_number + 1);
                    let else_word_number = terms[else_idx].word_number;
                    terms[if_idx].operand = Some(else_word_number + 1);
                } else {
                    terms[last].operand = Some(terms[i].word_number + 1);
                }
            }
            _ => {}
        }
    }
    if !nested.is_empty() {
        return Err(TranslateError::Parse {
            word_number: terms[nested[0]].word_number,
            message: "if not closed by then".to_string(),
        });
    }
    Ok(())
}

/// Resolves every unresolved term to either a variable/function reference or
/// a runtime `LinkError`; runs after all five passes above.
pub fn validate_resolved(terms: &[Terminal]) -> Result<(), TranslateError> {
    for term in terms {
        if term.term_type.is_none() && !term.converted && term.word.parse::<i64>().is_err() {
            return Err(TranslateError::Link {
                word_number: term.word_number,
                word: term.word.clone(),
            });
        }
    }
    Ok(())
}

/// Runs all five analysis passes in the mandated order.
pub fn validate_terms(
    terms: &mut [Terminal],
    ctx: &mut TranslationContext,
) -> Result<(), TranslateError> {
    validate_loops(terms)?;
    fetch_ret_addresses(terms, ctx)?;
    fetch_vars(terms, ctx);
    create_bindings(terms, ctx);
    fetch_if_statement(terms)?;
    validate_resolved(terms)?;
    Ok(())
}
