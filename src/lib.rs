#[macro_use]
extern crate lazy_static;

pub mod script_compiler;

pub use script_compiler::{CompilerError, ScriptCompiler};
