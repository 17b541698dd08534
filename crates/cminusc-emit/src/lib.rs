pub mod asm;
pub mod context;
pub mod emitter;
pub mod error;

pub use asm::AsmWriter;
pub use context::{EmitContext, FunctionInfo, LocalVariable};
pub use emitter::emit_program;
pub use error::{EmitError, EmitResult};
