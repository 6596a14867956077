// scenescript - visual-script-to-bytecode compiler
// Compiles project files to per-script engine bytecode

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use scenescript::script_compiler::{Project, ScriptCompiler};

fn main() {
    // Initialize logging
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        process::exit(1);
    }

    let mut input_file = "";
    let mut output_dir = String::new();
    let mut verbose = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-o" | "--output" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: -o requires a directory");
                    process::exit(1);
                }
                output_dir = args[i + 1].clone();
                i += 2;
            }
            "-v" | "--verbose" => {
                verbose = true;
                i += 1;
            }
            "-h" | "--help" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option '{}'", arg);
                print_usage(&args[0]);
                process::exit(1);
            }
            _ => {
                if input_file.is_empty() {
                    input_file = &args[i];
                } else {
                    eprintln!("Error: Multiple input files specified");
                    process::exit(1);
                }
                i += 1;
            }
        }
    }

    if input_file.is_empty() {
        eprintln!("Error: No project file specified");
        print_usage(&args[0]);
        process::exit(1);
    }

    if output_dir.is_empty() {
        output_dir = Path::new(input_file)
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("build")
            .to_string_lossy()
            .into_owned();
    }

    // Read project file
    let source = match fs::read_to_string(input_file) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("Error reading '{}': {}", input_file, err);
            process::exit(1);
        }
    };

    let project: Project = match serde_json::from_str(&source) {
        Ok(project) => project,
        Err(err) => {
            eprintln!("Error parsing '{}': {}", input_file, err);
            process::exit(1);
        }
    };

    if let Err(err) = fs::create_dir_all(&output_dir) {
        eprintln!("Error creating output directory '{}': {}", output_dir, err);
        process::exit(1);
    }

    if verbose {
        println!(
            "Compiling {} ({} scenes) -> {}",
            input_file,
            project.scenes.len(),
            output_dir
        );
    }

    let compiler = ScriptCompiler::new();
    let report = compiler.compile_project(&project);

    for script in &report.compiled {
        let mut path = PathBuf::from(&output_dir);
        path.push(format!("{}.bin", script.unit.file_stem()));
        if let Err(err) = fs::write(&path, &script.bytecode) {
            eprintln!("Error writing '{}': {}", path.display(), err);
            process::exit(1);
        }
        if verbose {
            println!(
                "  {} -> {} ({} bytes)",
                script.unit,
                path.display(),
                script.bytecode.len()
            );
        }
    }

    if !report.is_success() {
        for failure in &report.failures {
            eprintln!("Compilation error in {}: {}", failure.unit, failure.error);
        }
        process::exit(1);
    }

    if verbose {
        println!("Successfully compiled {} scripts", report.compiled.len());
    }
}

fn print_usage(program_name: &str) {
    println!("Usage: {} [options] <project.json>", program_name);
    println!();
    println!("Options:");
    println!("  -o, --output <dir>     Output directory (default: <project dir>/build)");
    println!("  -v, --verbose          Verbose output");
    println!("  -h, --help             Show this help message");
    println!();
    println!("Writes one .bin bytecode file per compiled script, named");
    println!("<scene id>.bin for scene scripts and <scene id>__<actor id>.bin");
    println!("for actor scripts.");
}
