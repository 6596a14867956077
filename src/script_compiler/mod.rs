// Scene Script Compiler Module
// Lowers authored visual-script event trees to the flat bytecode the
// runtime engine executes, resolving symbolic references to numeric indices
// and backpatching forward jump addresses.

pub mod codegen;
pub mod commands;
pub mod error;
pub mod event;
pub mod output;
pub mod project;
pub mod symbols;

pub use codegen::{Branch, ScriptCodeGen};
pub use commands::{CommandKind, CommandSet, ResolvedArgs};
pub use error::CompilerError;
pub use event::{ArgValue, ScriptEvent};
pub use output::{OutputBuffer, PatchSite};
pub use project::{BuildReport, CompiledScript, Project, ScriptKind, UnitFailure, UnitId};
pub use symbols::SymbolTables;

/// Main compiler structure. Holds the command catalogue; each compiled unit
/// gets its own fresh output buffer and symbol context.
pub struct ScriptCompiler {
    commands: CommandSet,
}

impl Default for ScriptCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptCompiler {
    /// Create a compiler with the built-in command catalogue.
    pub fn new() -> Self {
        ScriptCompiler {
            commands: commands::STANDARD_COMMANDS.clone(),
        }
    }

    /// Create a compiler with a caller-supplied catalogue (projects may
    /// register additional commands).
    pub fn with_commands(commands: CommandSet) -> Self {
        ScriptCompiler { commands }
    }

    pub fn commands(&self) -> &CommandSet {
        &self.commands
    }

    /// Compile one script (one compilation unit) against its entity tables.
    /// On error no partial bytecode is returned for the unit.
    pub fn compile_script(
        &self,
        events: &[ScriptEvent],
        symbols: SymbolTables,
    ) -> Result<Vec<u8>, CompilerError> {
        let mut codegen = ScriptCodeGen::new(symbols, self.commands.clone());
        codegen.compile_events(events)?;
        let bytecode = codegen.finish()?;
        log::info!("compiled script: {} bytes", bytecode.len());
        Ok(bytecode)
    }
}
