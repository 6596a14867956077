// Script Command Catalogue
//
// Named opcode constants for the runtime instruction set, plus the
// command-to-emitter table the lowering engine dispatches through. Each
// emitter receives fully resolved numeric arguments and appends its opcode
// and fixed-width operands contiguously; it never resolves identifiers
// itself and never touches patch sites.
//
// Encoding conventions: opcodes are one byte; variable slots and jump
// targets are big-endian 16-bit words; every other operand (entity indices,
// coordinates, frame counts, operators, directions) is one byte.

use crate::script_compiler::error::CompilerError;
use crate::script_compiler::output::OutputBuffer;
use indexmap::IndexMap;

/// Halt script execution. Appended at the end of every compiled unit.
pub const OP_END: u8 = 0x00;

/// Display a text box. Operand: text index (u16).
pub const OP_TEXT: u8 = 0x01;

/// Unconditional jump. Operand: absolute buffer offset (u16).
pub const OP_JUMP: u8 = 0x02;

/// Jump when a variable is truthy. Operands: variable (u16), target (u16).
pub const OP_IF_TRUE: u8 = 0x03;

/// Jump when a variable is falsy. Operands: variable (u16), target (u16).
pub const OP_IF_FALSE: u8 = 0x04;

/// Jump when a comparison holds. Operands: variable (u16), operator (u8),
/// value (u8), target (u16).
pub const OP_IF_VALUE: u8 = 0x05;

/// Operand: variable (u16).
pub const OP_SET_TRUE: u8 = 0x06;

/// Operand: variable (u16).
pub const OP_SET_FALSE: u8 = 0x07;

/// Operands: variable (u16), value (u8).
pub const OP_SET_VALUE: u8 = 0x08;

/// Operands: destination variable (u16), source variable (u16).
pub const OP_COPY_VALUE: u8 = 0x09;

/// Operand: variable (u16).
pub const OP_INC_VALUE: u8 = 0x0A;

/// Operand: variable (u16).
pub const OP_DEC_VALUE: u8 = 0x0B;

/// Operand: frames (u8).
pub const OP_WAIT: u8 = 0x0C;

/// Select the actor later actor commands apply to. Operand: actor (u8).
pub const OP_ACTOR_SET_ACTIVE: u8 = 0x0D;

/// Operands: x (u8), y (u8).
pub const OP_ACTOR_SET_POSITION: u8 = 0x0E;

/// Operand: direction (u8).
pub const OP_ACTOR_SET_DIRECTION: u8 = 0x0F;

/// Operand: sprite sheet (u8).
pub const OP_ACTOR_SET_SPRITE: u8 = 0x10;

/// Operand: emote (u8).
pub const OP_ACTOR_EMOTE: u8 = 0x11;

/// Operands: track (u8), loop flag (u8).
pub const OP_MUSIC_PLAY: u8 = 0x12;

pub const OP_MUSIC_STOP: u8 = 0x13;

/// Operands: scene (u8), x (u8), y (u8), direction (u8), fade speed (u8).
pub const OP_SWITCH_SCENE: u8 = 0x14;

/// Operand: frames (u8).
pub const OP_CAMERA_SHAKE: u8 = 0x15;

pub const OP_SHOW_SPRITES: u8 = 0x16;

pub const OP_HIDE_SPRITES: u8 = 0x17;

/// Map an authored direction name to its runtime bitmask value.
pub fn direction_value(direction: &str) -> Option<u8> {
    match direction {
        "down" => Some(1),
        "left" => Some(2),
        "right" => Some(4),
        "up" => Some(8),
        _ => None,
    }
}

/// Map an authored comparison operator to its runtime encoding.
pub fn operator_value(operator: &str) -> Option<u8> {
    match operator {
        "==" => Some(1),
        "!=" => Some(2),
        "<" => Some(3),
        ">" => Some(4),
        "<=" => Some(5),
        ">=" => Some(6),
        _ => None,
    }
}

/// Arguments of one event after symbol resolution, keyed by argument name.
/// Accessors enforce operand width and report the offending command and
/// argument on failure.
#[derive(Debug, Clone)]
pub struct ResolvedArgs {
    command: String,
    values: IndexMap<String, i32>,
}

impl ResolvedArgs {
    pub fn new(command: &str) -> Self {
        ResolvedArgs {
            command: command.to_string(),
            values: IndexMap::new(),
        }
    }

    pub fn insert(&mut self, name: &str, value: i32) {
        self.values.insert(name.to_string(), value);
    }

    fn get(&self, name: &str) -> Result<i32, CompilerError> {
        self.values.get(name).copied().ok_or_else(|| {
            CompilerError::InvalidArgument(self.command.clone(), name.to_string())
        })
    }

    pub fn get_u8(&self, name: &str) -> Result<u8, CompilerError> {
        let value = self.get(name)?;
        u8::try_from(value).map_err(|_| {
            CompilerError::InvalidArgument(self.command.clone(), name.to_string())
        })
    }

    pub fn get_u16(&self, name: &str) -> Result<u16, CompilerError> {
        let value = self.get(name)?;
        u16::try_from(value).map_err(|_| {
            CompilerError::InvalidArgument(self.command.clone(), name.to_string())
        })
    }

    /// Missing optional flags read as 0.
    pub fn get_flag(&self, name: &str) -> u8 {
        match self.values.get(name) {
            Some(&value) if value != 0 => 1,
            _ => 0,
        }
    }
}

/// Emitter signature shared by leaf commands and conditional test emitters.
pub type EmitFn = fn(&ResolvedArgs, &mut OutputBuffer) -> Result<(), CompilerError>;

/// How the lowering engine treats a command.
#[derive(Clone, Copy)]
pub enum CommandKind {
    /// Emit opcode + operands, done.
    Leaf(EmitFn),
    /// Emit the test opcode + condition operands; the engine then lowers the
    /// event's true/false child branches with the backpatching algorithm.
    Conditional(EmitFn),
}

#[derive(Clone, Copy)]
pub struct Command {
    pub kind: CommandKind,
}

/// Registry mapping command identifiers to emitters. The engine holds one
/// per compiler; callers may extend it with project-specific commands.
#[derive(Clone)]
pub struct CommandSet {
    commands: IndexMap<&'static str, Command>,
}

impl CommandSet {
    pub fn empty() -> Self {
        CommandSet {
            commands: IndexMap::new(),
        }
    }

    pub fn register(&mut self, name: &'static str, kind: CommandKind) {
        self.commands.insert(name, Command { kind });
    }

    pub fn lookup(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The built-in catalogue. A representative subset of the full engine
    /// instruction set; the container build registers the rest.
    pub fn standard() -> Self {
        let mut set = CommandSet::empty();
        set.register("END", CommandKind::Leaf(emit_end));
        set.register("TEXT", CommandKind::Leaf(emit_text));
        set.register("WAIT", CommandKind::Leaf(emit_wait));
        set.register("SET_TRUE", CommandKind::Leaf(emit_set_true));
        set.register("SET_FALSE", CommandKind::Leaf(emit_set_false));
        set.register("SET_VALUE", CommandKind::Leaf(emit_set_value));
        set.register("COPY_VALUE", CommandKind::Leaf(emit_copy_value));
        set.register("INC_VALUE", CommandKind::Leaf(emit_inc_value));
        set.register("DEC_VALUE", CommandKind::Leaf(emit_dec_value));
        set.register("IF_TRUE", CommandKind::Conditional(emit_if_true_test));
        set.register("IF_FALSE", CommandKind::Conditional(emit_if_false_test));
        set.register("IF_VALUE", CommandKind::Conditional(emit_if_value_test));
        set.register("ACTOR_SET_ACTIVE", CommandKind::Leaf(emit_actor_set_active));
        set.register(
            "ACTOR_SET_POSITION",
            CommandKind::Leaf(emit_actor_set_position),
        );
        set.register(
            "ACTOR_SET_DIRECTION",
            CommandKind::Leaf(emit_actor_set_direction),
        );
        set.register("ACTOR_SET_SPRITE", CommandKind::Leaf(emit_actor_set_sprite));
        set.register("ACTOR_EMOTE", CommandKind::Leaf(emit_actor_emote));
        set.register("MUSIC_PLAY", CommandKind::Leaf(emit_music_play));
        set.register("MUSIC_STOP", CommandKind::Leaf(emit_music_stop));
        set.register("SWITCH_SCENE", CommandKind::Leaf(emit_switch_scene));
        set.register("CAMERA_SHAKE", CommandKind::Leaf(emit_camera_shake));
        set.register("SHOW_SPRITES", CommandKind::Leaf(emit_show_sprites));
        set.register("HIDE_SPRITES", CommandKind::Leaf(emit_hide_sprites));
        set
    }
}

impl Default for CommandSet {
    fn default() -> Self {
        Self::standard()
    }
}

lazy_static! {
    /// Shared read-only instance of the built-in catalogue.
    pub static ref STANDARD_COMMANDS: CommandSet = CommandSet::standard();
}

fn emit_end(_args: &ResolvedArgs, out: &mut OutputBuffer) -> Result<(), CompilerError> {
    out.push(OP_END);
    Ok(())
}

fn emit_text(args: &ResolvedArgs, out: &mut OutputBuffer) -> Result<(), CompilerError> {
    out.push(OP_TEXT);
    out.push_word(args.get_u16("index")?);
    Ok(())
}

fn emit_wait(args: &ResolvedArgs, out: &mut OutputBuffer) -> Result<(), CompilerError> {
    out.push(OP_WAIT);
    out.push(args.get_u8("frames")?);
    Ok(())
}

fn emit_set_true(args: &ResolvedArgs, out: &mut OutputBuffer) -> Result<(), CompilerError> {
    out.push(OP_SET_TRUE);
    out.push_word(args.get_u16("variable")?);
    Ok(())
}

fn emit_set_false(args: &ResolvedArgs, out: &mut OutputBuffer) -> Result<(), CompilerError> {
    out.push(OP_SET_FALSE);
    out.push_word(args.get_u16("variable")?);
    Ok(())
}

fn emit_set_value(args: &ResolvedArgs, out: &mut OutputBuffer) -> Result<(), CompilerError> {
    out.push(OP_SET_VALUE);
    out.push_word(args.get_u16("variable")?);
    out.push(args.get_u8("value")?);
    Ok(())
}

fn emit_copy_value(args: &ResolvedArgs, out: &mut OutputBuffer) -> Result<(), CompilerError> {
    out.push(OP_COPY_VALUE);
    out.push_word(args.get_u16("variable")?);
    out.push_word(args.get_u16("source")?);
    Ok(())
}

fn emit_inc_value(args: &ResolvedArgs, out: &mut OutputBuffer) -> Result<(), CompilerError> {
    out.push(OP_INC_VALUE);
    out.push_word(args.get_u16("variable")?);
    Ok(())
}

fn emit_dec_value(args: &ResolvedArgs, out: &mut OutputBuffer) -> Result<(), CompilerError> {
    out.push(OP_DEC_VALUE);
    out.push_word(args.get_u16("variable")?);
    Ok(())
}

fn emit_if_true_test(args: &ResolvedArgs, out: &mut OutputBuffer) -> Result<(), CompilerError> {
    out.push(OP_IF_TRUE);
    out.push_word(args.get_u16("variable")?);
    Ok(())
}

fn emit_if_false_test(args: &ResolvedArgs, out: &mut OutputBuffer) -> Result<(), CompilerError> {
    out.push(OP_IF_FALSE);
    out.push_word(args.get_u16("variable")?);
    Ok(())
}

fn emit_if_value_test(args: &ResolvedArgs, out: &mut OutputBuffer) -> Result<(), CompilerError> {
    out.push(OP_IF_VALUE);
    out.push_word(args.get_u16("variable")?);
    out.push(args.get_u8("operator")?);
    out.push(args.get_u8("value")?);
    Ok(())
}

fn emit_actor_set_active(args: &ResolvedArgs, out: &mut OutputBuffer) -> Result<(), CompilerError> {
    out.push(OP_ACTOR_SET_ACTIVE);
    out.push(args.get_u8("actor")?);
    Ok(())
}

fn emit_actor_set_position(
    args: &ResolvedArgs,
    out: &mut OutputBuffer,
) -> Result<(), CompilerError> {
    out.push(OP_ACTOR_SET_POSITION);
    out.push(args.get_u8("x")?);
    out.push(args.get_u8("y")?);
    Ok(())
}

fn emit_actor_set_direction(
    args: &ResolvedArgs,
    out: &mut OutputBuffer,
) -> Result<(), CompilerError> {
    out.push(OP_ACTOR_SET_DIRECTION);
    out.push(args.get_u8("direction")?);
    Ok(())
}

fn emit_actor_set_sprite(args: &ResolvedArgs, out: &mut OutputBuffer) -> Result<(), CompilerError> {
    out.push(OP_ACTOR_SET_SPRITE);
    out.push(args.get_u8("sprite")?);
    Ok(())
}

fn emit_actor_emote(args: &ResolvedArgs, out: &mut OutputBuffer) -> Result<(), CompilerError> {
    out.push(OP_ACTOR_EMOTE);
    out.push(args.get_u8("emote")?);
    Ok(())
}

fn emit_music_play(args: &ResolvedArgs, out: &mut OutputBuffer) -> Result<(), CompilerError> {
    out.push(OP_MUSIC_PLAY);
    out.push(args.get_u8("music")?);
    out.push(args.get_flag("loop"));
    Ok(())
}

fn emit_music_stop(_args: &ResolvedArgs, out: &mut OutputBuffer) -> Result<(), CompilerError> {
    out.push(OP_MUSIC_STOP);
    Ok(())
}

fn emit_switch_scene(args: &ResolvedArgs, out: &mut OutputBuffer) -> Result<(), CompilerError> {
    out.push(OP_SWITCH_SCENE);
    out.push(args.get_u8("scene")?);
    out.push(args.get_u8("x")?);
    out.push(args.get_u8("y")?);
    out.push(args.get_u8("direction")?);
    out.push(args.get_u8("fade_speed")?);
    Ok(())
}

fn emit_camera_shake(args: &ResolvedArgs, out: &mut OutputBuffer) -> Result<(), CompilerError> {
    out.push(OP_CAMERA_SHAKE);
    out.push(args.get_u8("frames")?);
    Ok(())
}

fn emit_show_sprites(_args: &ResolvedArgs, out: &mut OutputBuffer) -> Result<(), CompilerError> {
    out.push(OP_SHOW_SPRITES);
    Ok(())
}

fn emit_hide_sprites(_args: &ResolvedArgs, out: &mut OutputBuffer) -> Result<(), CompilerError> {
    out.push(OP_HIDE_SPRITES);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_set_knows_builtin_commands() {
        let set = CommandSet::standard();
        assert!(set.lookup("SET_TRUE").is_some());
        assert!(set.lookup("IF_TRUE").is_some());
        assert!(set.lookup("NO_SUCH_COMMAND").is_none());
    }

    #[test]
    fn direction_and_operator_encodings() {
        assert_eq!(direction_value("up"), Some(8));
        assert_eq!(direction_value("sideways"), None);
        assert_eq!(operator_value("=="), Some(1));
        assert_eq!(operator_value(">="), Some(6));
        assert_eq!(operator_value("~"), None);
    }

    #[test]
    fn resolved_args_enforce_operand_width() {
        let mut args = ResolvedArgs::new("WAIT");
        args.insert("frames", 300);
        assert_eq!(
            args.get_u8("frames"),
            Err(CompilerError::InvalidArgument(
                "WAIT".to_string(),
                "frames".to_string()
            ))
        );
        assert_eq!(args.get_u16("frames"), Ok(300));
    }

    #[test]
    fn missing_argument_is_reported_with_command_context() {
        let args = ResolvedArgs::new("SET_VALUE");
        assert_eq!(
            args.get_u16("variable"),
            Err(CompilerError::InvalidArgument(
                "SET_VALUE".to_string(),
                "variable".to_string()
            ))
        );
    }
}
