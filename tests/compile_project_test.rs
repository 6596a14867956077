// End-to-end project compilation: authored JSON in, per-unit bytecode out.

use scenescript::script_compiler::commands::{
    OP_END, OP_IF_TRUE, OP_JUMP, OP_MUSIC_PLAY, OP_SET_TRUE, OP_TEXT,
};
use scenescript::script_compiler::{Project, ScriptCompiler, UnitId};
use test_log::test;

const PROJECT_JSON: &str = r#"{
    "name": "demo",
    "variables": ["door_open", "coins"],
    "music": [
        { "id": "theme", "name": "Main Theme" },
        { "id": "cave", "name": "Cave" }
    ],
    "sprites": [
        { "id": "hero" },
        { "id": "npc" }
    ],
    "scenes": [
        {
            "id": "village",
            "name": "Village",
            "script": [
                {
                    "command": "MUSIC_PLAY",
                    "args": {
                        "music": { "type": "music", "value": "theme" },
                        "loop": { "type": "bool", "value": true }
                    }
                }
            ],
            "actors": [
                {
                    "id": "guard",
                    "script": [
                        {
                            "command": "IF_TRUE",
                            "args": {
                                "variable": { "type": "variable", "value": "door_open" }
                            },
                            "children": {
                                "true": [
                                    {
                                        "command": "TEXT",
                                        "args": { "index": { "type": "number", "value": 1 } }
                                    }
                                ],
                                "false": [
                                    {
                                        "command": "SET_TRUE",
                                        "args": {
                                            "variable": { "type": "variable", "value": "door_open" }
                                        }
                                    }
                                ]
                            }
                        }
                    ]
                }
            ]
        },
        {
            "id": "cave_entrance",
            "script": [],
            "actors": []
        }
    ]
}"#;

fn load_project() -> Project {
    serde_json::from_str(PROJECT_JSON).unwrap()
}

#[test]
fn project_build_compiles_every_unit() {
    let compiler = ScriptCompiler::new();
    let report = compiler.compile_project(&load_project());

    assert!(report.is_success());
    assert_eq!(report.compiled.len(), 3);
    assert_eq!(report.compiled[0].unit, UnitId::scene("village"));
    assert_eq!(report.compiled[1].unit, UnitId::actor("village", "guard"));
    assert_eq!(report.compiled[2].unit, UnitId::scene("cave_entrance"));

    // Every unit is terminated for the runtime.
    for script in &report.compiled {
        assert_eq!(*script.bytecode.last().unwrap(), OP_END);
    }
}

#[test]
fn scene_script_resolves_music_by_project_order() {
    let compiler = ScriptCompiler::new();
    let report = compiler.compile_project(&load_project());

    let scene = &report.compiled[0];
    // MUSIC_PLAY track 0 ("theme"), loop on, then the terminator.
    assert_eq!(scene.bytecode, vec![OP_MUSIC_PLAY, 0x00, 0x01, OP_END]);
}

#[test]
fn actor_conditional_lowered_with_patched_jumps() {
    let compiler = ScriptCompiler::new();
    let report = compiler.compile_project(&load_project());

    let guard = &report.compiled[1];
    // 0: IF_TRUE, 1-2: variable 0, 3-4: true addr, 5: SET_TRUE (false
    // branch), 6-7: variable, 8: JUMP, 9-10: end addr, 11: TEXT, 12-13:
    // index, 14: END.
    assert_eq!(
        guard.bytecode,
        vec![
            OP_IF_TRUE, 0x00, 0x00, 0x00, 0x0B, OP_SET_TRUE, 0x00, 0x00, OP_JUMP, 0x00, 0x0E,
            OP_TEXT, 0x00, 0x01, OP_END
        ]
    );
}

#[test]
fn project_build_is_deterministic() {
    let compiler = ScriptCompiler::new();
    let project = load_project();
    let first = compiler.compile_project(&project);
    let second = compiler.compile_project(&project);

    assert_eq!(first.compiled.len(), second.compiled.len());
    for (a, b) in first.compiled.iter().zip(second.compiled.iter()) {
        assert_eq!(a.unit, b.unit);
        assert_eq!(a.bytecode, b.bytecode);
    }
}
