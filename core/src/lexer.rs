//! Shell-quote tokenizer turning source text into an ordered term stream.

use crate::error::TranslateError;
use crate::isa::{TermType, Terminal};

/// Splits `source`, tags reserved words, rewrites dot-quote string literals,
/// and prepends the synthetic entrypoint term.
pub fn stream_to_terms(source: &str) -> Result<Vec<Terminal>, TranslateError> {
    let flattened = source.replace('\n', " ");
    let words = shlex::split(&flattened).ok_or_else(|| TranslateError::Lex {
        message: "unterminated string literal".to_string(),
    })?;

    let mut terms = vec![Terminal {
        word_number: 0,
        term_type: Some(TermType::Entrypoint),
        word: String::new(),
        converted: false,
        operand: None,
    }];

    for (i, word) in words.into_iter().filter(|w| !w.is_empty()).enumerate() {
        let word_number = i + 1;
        if let Some(rest) = word.strip_prefix(". ") {
            terms.push(Terminal {
                word_number,
                term_type: Some(TermType::String),
                word: format!(".\"{rest}\""),
                converted: false,
                operand: None,
            });
        } else {
            terms.push(Terminal::new(word_number, word));
        }
    }

    Ok(terms)
}
