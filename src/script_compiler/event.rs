// Script Event Model
//
// Authored behavior arrives as ordered trees of script events. Each event
// names a command, carries named arguments, and (for branching commands)
// holds named child branches. Trees are produced by the editor and are
// read-only inputs here; the compiler never mutates them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Child branch names used by conditional commands.
pub const TRUE_BRANCH: &str = "true";
pub const FALSE_BRANCH: &str = "false";

/// One authored step of script logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptEvent {
    /// Editor-assigned event id, kept for diagnostics.
    #[serde(default)]
    pub id: Option<String>,
    pub command: String,
    #[serde(default)]
    pub args: IndexMap<String, ArgValue>,
    #[serde(default)]
    pub children: IndexMap<String, Vec<ScriptEvent>>,
}

impl ScriptEvent {
    pub fn new(command: &str) -> Self {
        ScriptEvent {
            id: None,
            command: command.to_string(),
            args: IndexMap::new(),
            children: IndexMap::new(),
        }
    }

    pub fn with_arg(mut self, name: &str, value: ArgValue) -> Self {
        self.args.insert(name.to_string(), value);
        self
    }

    pub fn with_branch(mut self, name: &str, events: Vec<ScriptEvent>) -> Self {
        self.children.insert(name.to_string(), events);
        self
    }

    pub fn branch(&self, name: &str) -> &[ScriptEvent] {
        self.children.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Argument payload. Identifier-carrying variants record which entity table
/// resolves them, so lowering dispatches exhaustively on kind instead of
/// guessing from the raw value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ArgValue {
    Number(i32),
    Bool(bool),
    Variable(String),
    Actor(String),
    Music(String),
    Sprite(String),
    Scene(String),
    Direction(String),
    Operator(String),
}
