// Project Model and Build
//
// The authoring tool stores a project as JSON: global variable, music and
// sprite tables plus scenes, each scene carrying its actors and scripts.
// Every script (scene script, per-actor script) is an independent
// compilation unit with its own output buffer and symbol context, so a
// failure in one unit never touches its siblings. Entity tables are frozen
// before the build starts and read-only throughout.

use crate::script_compiler::error::CompilerError;
use crate::script_compiler::event::ScriptEvent;
use crate::script_compiler::symbols::SymbolTables;
use crate::script_compiler::ScriptCompiler;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(default)]
    pub music: Vec<MusicTrack>,
    #[serde(default)]
    pub sprites: Vec<SpriteSheet>,
    #[serde(default)]
    pub scenes: Vec<Scene>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicTrack {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpriteSheet {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub actors: Vec<Actor>,
    #[serde(default)]
    pub script: Vec<ScriptEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    #[serde(default)]
    pub script: Vec<ScriptEvent>,
}

impl Project {
    /// Entity tables for units belonging to one scene. Actor order follows
    /// the scene's actor list; the other tables follow project order, which
    /// is the order the runtime engine sees.
    pub fn symbol_tables_for(&self, scene: &Scene) -> SymbolTables {
        SymbolTables {
            actors: scene.actors.iter().map(|a| a.id.clone()).collect(),
            music: self.music.iter().map(|t| t.id.clone()).collect(),
            sprites: self.sprites.iter().map(|s| s.id.clone()).collect(),
            scenes: self.scenes.iter().map(|s| s.id.clone()).collect(),
            variables: self.variables.clone(),
        }
    }
}

/// Which script within a scene a unit came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptKind {
    Scene,
    Actor,
}

/// Identity of one compilation unit, sufficient for the editor to point at
/// the offending script when a build fails.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitId {
    pub scene_id: String,
    pub kind: ScriptKind,
    pub actor_id: Option<String>,
}

impl UnitId {
    pub fn scene(scene_id: &str) -> Self {
        UnitId {
            scene_id: scene_id.to_string(),
            kind: ScriptKind::Scene,
            actor_id: None,
        }
    }

    pub fn actor(scene_id: &str, actor_id: &str) -> Self {
        UnitId {
            scene_id: scene_id.to_string(),
            kind: ScriptKind::Actor,
            actor_id: Some(actor_id.to_string()),
        }
    }

    /// Stable stem for output filenames.
    pub fn file_stem(&self) -> String {
        match &self.actor_id {
            Some(actor_id) => format!("{}__{}", self.scene_id, actor_id),
            None => self.scene_id.clone(),
        }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.actor_id {
            Some(actor_id) => write!(f, "scene '{}' actor '{}' script", self.scene_id, actor_id),
            None => write!(f, "scene '{}' script", self.scene_id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledScript {
    pub unit: UnitId,
    pub bytecode: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct UnitFailure {
    pub unit: UnitId,
    pub error: CompilerError,
}

/// Outcome of a full project build: every unit either compiled or failed,
/// independently.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub compiled: Vec<CompiledScript>,
    pub failures: Vec<UnitFailure>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

impl ScriptCompiler {
    /// Compile every script in the project. Units are compiled in
    /// deterministic project order; a failing unit is recorded with its
    /// identity and the build moves on to its siblings.
    pub fn compile_project(&self, project: &Project) -> BuildReport {
        let mut report = BuildReport::default();
        for scene in &project.scenes {
            let tables = project.symbol_tables_for(scene);

            let unit = UnitId::scene(&scene.id);
            self.compile_unit(&mut report, unit, &scene.script, tables.clone());

            for actor in &scene.actors {
                let unit = UnitId::actor(&scene.id, &actor.id);
                self.compile_unit(&mut report, unit, &actor.script, tables.clone());
            }
        }
        log::info!(
            "project build: {} scripts compiled, {} failed",
            report.compiled.len(),
            report.failures.len()
        );
        report
    }

    fn compile_unit(
        &self,
        report: &mut BuildReport,
        unit: UnitId,
        events: &[ScriptEvent],
        tables: SymbolTables,
    ) {
        match self.compile_script(events, tables) {
            Ok(bytecode) => {
                log::debug!("{}: {} bytes", unit, bytecode.len());
                report.compiled.push(CompiledScript { unit, bytecode });
            }
            Err(error) => {
                log::debug!("{}: failed: {}", unit, error);
                report.failures.push(UnitFailure { unit, error });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script_compiler::commands::OP_END;
    use crate::script_compiler::event::ArgValue;

    fn project_with_bad_actor_script() -> Project {
        Project {
            name: "test".to_string(),
            variables: vec!["health".to_string()],
            music: Vec::new(),
            sprites: Vec::new(),
            scenes: vec![Scene {
                id: "intro".to_string(),
                name: String::new(),
                actors: vec![Actor {
                    id: "a1".to_string(),
                    script: vec![ScriptEvent::new("SET_TRUE")
                        .with_arg("variable", ArgValue::Variable("gone".to_string()))],
                }],
                script: vec![ScriptEvent::new("SET_TRUE")
                    .with_arg("variable", ArgValue::Variable("health".to_string()))],
            }],
        }
    }

    #[test]
    fn failing_unit_does_not_affect_siblings() {
        let compiler = ScriptCompiler::new();
        let report = compiler.compile_project(&project_with_bad_actor_script());

        assert_eq!(report.compiled.len(), 1);
        assert_eq!(report.compiled[0].unit, UnitId::scene("intro"));
        assert_eq!(*report.compiled[0].bytecode.last().unwrap(), OP_END);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].unit, UnitId::actor("intro", "a1"));
        assert_eq!(
            report.failures[0].error,
            CompilerError::VariableNotFound("gone".to_string())
        );
    }

    #[test]
    fn unit_ids_render_for_diagnostics() {
        assert_eq!(UnitId::scene("intro").to_string(), "scene 'intro' script");
        assert_eq!(
            UnitId::actor("intro", "a1").to_string(),
            "scene 'intro' actor 'a1' script"
        );
        assert_eq!(UnitId::actor("intro", "a1").file_stem(), "intro__a1");
    }

    #[test]
    fn empty_script_compiles_to_terminator_only() {
        let compiler = ScriptCompiler::new();
        let bytecode = compiler
            .compile_script(&[], SymbolTables::default())
            .unwrap();
        assert_eq!(bytecode, vec![OP_END]);
    }
}
