pub mod alu;
pub mod analyzer;
pub mod codegen;
pub mod control_unit;
pub mod datapath;
pub mod error;
pub mod isa;
pub mod lexer;
pub mod translate;

pub mod prelude {
    pub use crate::control_unit::{ControlUnit, InterruptToken, RunOutcome};
    pub use crate::error::{RunError, TranslateError};
    pub use crate::isa::InstructionRecord;
    pub use crate::translate::{translate, Translated};
}
