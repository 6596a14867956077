// Event Lowering Engine
//
// Walks an authored event tree depth-first, left-to-right, and appends the
// linear instruction stream for it to an output buffer. Leaf commands are
// resolved (identifiers -> numeric indices) and handed to their registered
// emitter; conditional commands emit their test opcode and then run the
// address-backpatching algorithm over their child branches.
//
// Backpatch correctness rests on one rule: a patched address is always the
// buffer length at the moment of patching, never arithmetic over branch
// sizes. That is what makes nested conditionals and variable-length branch
// bodies correct without precomputing anything.

use crate::script_compiler::commands::{
    direction_value, operator_value, CommandKind, CommandSet, ResolvedArgs, OP_END, OP_JUMP,
};
use crate::script_compiler::error::CompilerError;
use crate::script_compiler::event::{ArgValue, ScriptEvent, FALSE_BRANCH, TRUE_BRANCH};
use crate::script_compiler::output::OutputBuffer;
use crate::script_compiler::symbols::SymbolTables;
use log::debug;

/// A conditional branch body: either an already-built event list, or a
/// deferred producer that emits instructions itself when invoked. Both are
/// lowered at the current cursor position.
pub enum Branch<'a> {
    Events(&'a [ScriptEvent]),
    Emit(Box<dyn FnOnce(&mut ScriptCodeGen) -> Result<(), CompilerError> + 'a>),
}

/// Code generation state for one compilation unit.
pub struct ScriptCodeGen {
    output: OutputBuffer,
    symbols: SymbolTables,
    commands: CommandSet,
}

impl ScriptCodeGen {
    pub fn new(symbols: SymbolTables, commands: CommandSet) -> Self {
        ScriptCodeGen {
            output: OutputBuffer::new(),
            symbols,
            commands,
        }
    }

    pub fn output(&self) -> &OutputBuffer {
        &self.output
    }

    /// Direct buffer access for deferred branch producers.
    pub fn buffer_mut(&mut self) -> &mut OutputBuffer {
        &mut self.output
    }

    pub fn symbols(&self) -> &SymbolTables {
        &self.symbols
    }

    /// Lower an ordered event sequence in place.
    pub fn compile_events(&mut self, events: &[ScriptEvent]) -> Result<(), CompilerError> {
        for event in events {
            self.compile_event(event)?;
        }
        Ok(())
    }

    /// Lower a single event: exhaustive dispatch on its registered kind.
    pub fn compile_event(&mut self, event: &ScriptEvent) -> Result<(), CompilerError> {
        debug!(
            "compiling {} (id {:?}) at 0x{:04x}",
            event.command,
            event.id,
            self.output.len()
        );
        let command = self
            .commands
            .lookup(&event.command)
            .ok_or_else(|| CompilerError::UnknownCommand(event.command.clone()))?;
        match command.kind {
            CommandKind::Leaf(emit) => {
                let args = self.resolve_args(event)?;
                emit(&args, &mut self.output)
            }
            CommandKind::Conditional(emit_test) => {
                let args = self.resolve_args(event)?;
                emit_test(&args, &mut self.output)?;
                // The test opcode's branch-target operand comes next; the
                // algorithm reserves and patches it.
                let true_events = event.branch(TRUE_BRANCH);
                let false_events = event.branch(FALSE_BRANCH);
                self.compile_conditional(Branch::Events(true_events), Branch::Events(false_events))
            }
        }
    }

    /// Lower an if/else construct. Assumes the conditional test opcode and
    /// its condition operands were just emitted, with the branch-target
    /// operand as the next two slots. Layout:
    ///
    /// ```text
    /// [test opcode ...]  [true addr]      <- patched in step 4
    /// <false branch code>
    /// [JUMP]             [end addr]       <- patched in step 6
    /// <true branch code>                  <- true addr lands here
    /// <continuation>                      <- end addr lands here
    /// ```
    ///
    /// Exactly two patch sites are created and resolved per construct. Empty
    /// branches need no special case: the jumps still land correctly.
    pub fn compile_conditional(
        &mut self,
        true_branch: Branch<'_>,
        false_branch: Branch<'_>,
    ) -> Result<(), CompilerError> {
        let true_site = self.output.reserve_placeholder();

        self.lower_branch(false_branch)?;

        self.output.push(OP_JUMP);
        let end_site = self.output.reserve_placeholder();

        let true_target = self.output.len();
        self.output.patch(true_site, true_target)?;

        self.lower_branch(true_branch)?;

        let end_target = self.output.len();
        self.output.patch(end_site, end_target)?;

        debug!(
            "conditional lowered: true branch at 0x{:04x}, continuation at 0x{:04x}",
            true_target, end_target
        );
        Ok(())
    }

    fn lower_branch(&mut self, branch: Branch<'_>) -> Result<(), CompilerError> {
        match branch {
            Branch::Events(events) => self.compile_events(events),
            Branch::Emit(produce) => produce(self),
        }
    }

    /// Resolve every identifier argument through the symbol tables. Variable
    /// resolution is the only hard failure; missing music and scene ids
    /// default to 0 with a content warning, missing sprites default to 0
    /// silently, and missing actors resolve to the player slot.
    fn resolve_args(&self, event: &ScriptEvent) -> Result<ResolvedArgs, CompilerError> {
        let mut resolved = ResolvedArgs::new(&event.command);
        for (name, value) in &event.args {
            let number = match value {
                ArgValue::Number(n) => *n,
                ArgValue::Bool(b) => *b as i32,
                ArgValue::Variable(variable) => self.symbols.variable_index(variable)? as i32,
                ArgValue::Actor(actor_id) => self.symbols.actor_index(actor_id) as i32,
                ArgValue::Music(music_id) => match self.symbols.music_index(music_id) {
                    Some(index) => index as i32,
                    None => {
                        log::warn!(
                            "music track '{}' not found, defaulting to track 0",
                            music_id
                        );
                        0
                    }
                },
                ArgValue::Sprite(sprite_id) => self.symbols.sprite_index(sprite_id) as i32,
                ArgValue::Scene(scene_id) => match self.symbols.scene_index(scene_id) {
                    Some(index) => index as i32,
                    None => {
                        log::warn!("scene '{}' not found, defaulting to scene 0", scene_id);
                        0
                    }
                },
                ArgValue::Direction(direction) => {
                    direction_value(direction).ok_or_else(|| {
                        CompilerError::InvalidArgument(event.command.clone(), name.clone())
                    })? as i32
                }
                ArgValue::Operator(operator) => {
                    operator_value(operator).ok_or_else(|| {
                        CompilerError::InvalidArgument(event.command.clone(), name.clone())
                    })? as i32
                }
            };
            resolved.insert(name, number);
        }
        Ok(resolved)
    }

    /// Terminate the unit and hand back the finished bytecode. Fails if any
    /// patch site was reserved but never resolved.
    pub fn finish(mut self) -> Result<Vec<u8>, CompilerError> {
        self.output.push(OP_END);
        self.output.finalize()
    }
}

#[cfg(test)]
#[path = "codegen_tests.rs"]
mod tests;
