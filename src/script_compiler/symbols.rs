// Symbol Resolution
//
// Maps authoring-time identifiers (actor ids, music ids, sprite ids,
// variable names) to the numeric indices the bytecode carries as operands.
// Position within each table IS the runtime index, so table order must match
// the order the engine sees at load time.
//
// The error policy is deliberately asymmetric: a missing sprite or music
// track degrades to a default the runtime can tolerate, while a missing
// variable means the script references state that no longer exists, which is
// a hard compilation failure.

use crate::script_compiler::error::CompilerError;

/// Actor id that always resolves to index 0 (the player).
pub const PLAYER_ACTOR_ID: &str = "player";

/// Actor id used by editor scripts to mean "the actor this script runs on",
/// which is also slot 0 at runtime.
pub const SELF_ACTOR_ID: &str = "$self$";

/// Read-only entity tables for one compilation unit. Actors are scoped to
/// the unit's scene; the other tables are project-wide.
#[derive(Debug, Clone, Default)]
pub struct SymbolTables {
    pub actors: Vec<String>,
    pub music: Vec<String>,
    pub sprites: Vec<String>,
    pub scenes: Vec<String>,
    pub variables: Vec<String>,
}

impl SymbolTables {
    /// Resolve an actor id to its 1-based scene slot. Slot 0 is reserved for
    /// the player/self, so an id absent from the scene also yields 0 by
    /// construction rather than an error.
    pub fn actor_index(&self, actor_id: &str) -> u16 {
        if actor_id == PLAYER_ACTOR_ID || actor_id == SELF_ACTOR_ID {
            return 0;
        }
        match self.actors.iter().position(|id| id == actor_id) {
            Some(position) => (position + 1) as u16,
            None => 0,
        }
    }

    /// Resolve a music id to its track slot. Absence is not an error here;
    /// callers decide whether to warn and what default to substitute.
    pub fn music_index(&self, music_id: &str) -> Option<usize> {
        self.music.iter().position(|id| id == music_id)
    }

    /// Resolve a sprite id, defaulting to sheet 0 when absent.
    pub fn sprite_index(&self, sprite_id: &str) -> usize {
        self.sprites
            .iter()
            .position(|id| id == sprite_id)
            .unwrap_or(0)
    }

    /// Resolve a scene id. Same policy as music: the caller checks.
    pub fn scene_index(&self, scene_id: &str) -> Option<usize> {
        self.scenes.iter().position(|id| id == scene_id)
    }

    /// Resolve a variable name to its global slot. This is the only hard
    /// failure path in the resolver.
    pub fn variable_index(&self, variable: &str) -> Result<u16, CompilerError> {
        match self.variables.iter().position(|name| name == variable) {
            Some(position) => Ok(position as u16),
            None => Err(CompilerError::VariableNotFound(variable.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> SymbolTables {
        SymbolTables {
            actors: vec!["a1".to_string(), "a2".to_string()],
            music: vec!["theme".to_string(), "battle".to_string()],
            sprites: vec!["hero".to_string(), "slime".to_string()],
            scenes: vec!["intro".to_string()],
            variables: vec!["health".to_string(), "score".to_string()],
        }
    }

    #[test]
    fn actor_indices_are_one_based_with_player_at_zero() {
        let tables = tables();
        assert_eq!(tables.actor_index("a1"), 1);
        assert_eq!(tables.actor_index("a2"), 2);
        assert_eq!(tables.actor_index(PLAYER_ACTOR_ID), 0);
        assert_eq!(tables.actor_index(SELF_ACTOR_ID), 0);
    }

    #[test]
    fn missing_actor_resolves_to_player_slot() {
        assert_eq!(tables().actor_index("nobody"), 0);
    }

    #[test]
    fn music_lookup_reports_absence() {
        let tables = tables();
        assert_eq!(tables.music_index("battle"), Some(1));
        assert_eq!(tables.music_index("missing"), None);
    }

    #[test]
    fn missing_sprite_defaults_to_sheet_zero() {
        let tables = tables();
        assert_eq!(tables.sprite_index("slime"), 1);
        assert_eq!(tables.sprite_index("missing"), 0);
    }

    #[test]
    fn variable_lookup_fails_hard_when_absent() {
        let tables = tables();
        assert_eq!(tables.variable_index("score"), Ok(1));
        assert_eq!(
            tables.variable_index("undefined_var"),
            Err(CompilerError::VariableNotFound("undefined_var".to_string()))
        );
    }

    #[test]
    fn resolution_is_idempotent() {
        let tables = tables();
        assert_eq!(tables.actor_index("a2"), tables.actor_index("a2"));
        assert_eq!(
            tables.variable_index("health"),
            tables.variable_index("health")
        );
    }
}
