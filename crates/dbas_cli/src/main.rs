//! The `dbas` command.
//!
//! A thin driver over `dbas-compile`: every subcommand runs the pipeline,
//! prints diagnostics to stderr, and exits 1 on any compilation or
//! toolchain error. `build` and `run` write the generated unit into a
//! scratch directory and hand it to the Go toolchain; `emit` prints the
//! generated source to stdout; `check` stops after analysis (optionally
//! reporting diagnostics as JSON lines for editor integration).

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode, Stdio};

use clap::{Parser, Subcommand};

use dbas_compile::compile::{compile_file, CompileOptions, CompileOutput};

#[derive(Parser)]
#[command(name = "dbas")]
#[command(about = "A modernized BASIC dialect that compiles to Go", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a program and build an executable with the Go toolchain
    Build {
        /// Name of the output executable (defaults to the source stem)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Annotate emitted statements with source line numbers
        #[arg(short, long)]
        debug: bool,
        /// Informational diagnostics on stderr
        #[arg(short, long)]
        verbose: bool,
        /// The .dbas source file
        file: PathBuf,
    },
    /// Compile, build, and run; stdin/stdout/stderr are forwarded
    Run {
        #[arg(short, long)]
        debug: bool,
        #[arg(short, long)]
        verbose: bool,
        file: PathBuf,
    },
    /// Compile and print the generated Go source to stdout
    Emit {
        #[arg(short, long)]
        debug: bool,
        #[arg(short, long)]
        verbose: bool,
        file: PathBuf,
    },
    /// Compile without generating output; report diagnostics only
    Check {
        /// Print diagnostics as JSON lines on stdout
        #[arg(long)]
        json: bool,
        file: PathBuf,
    },
    /// Print the version banner
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Commands::Build { output, debug, verbose, file } => cmd_build(output, debug, verbose, &file),
        Commands::Run { debug, verbose, file } => cmd_run(debug, verbose, &file),
        Commands::Emit { debug, verbose, file } => cmd_emit(debug, verbose, &file),
        Commands::Check { json, file } => cmd_check(json, &file),
        Commands::Version => {
            println!("dbas {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
    }
}

/// Prints warnings and errors to stderr; true when compilation succeeded.
fn report(output: &CompileOutput) -> bool {
    for warning in &output.warnings {
        eprintln!("{}", warning);
    }
    for error in &output.errors {
        eprintln!("{}", error);
    }
    output.succeeded()
}

fn note(verbose: bool, message: &str) {
    if verbose {
        eprintln!("dbas: {}", message);
    }
}

fn compile(file: &Path, debug: bool, verbose: bool) -> Option<CompileOutput> {
    note(verbose, &format!("compiling {}", file.display()));
    let output = compile_file(file, &CompileOptions { debug });
    if !report(&output) {
        return None;
    }
    note(verbose, &format!("generated {} bytes of Go", output.go_source.len()));
    Some(output)
}

fn cmd_emit(debug: bool, verbose: bool, file: &Path) -> ExitCode {
    match compile(file, debug, verbose) {
        Some(output) => {
            print!("{}", output.go_source);
            ExitCode::SUCCESS
        }
        None => ExitCode::FAILURE,
    }
}

fn cmd_check(json: bool, file: &Path) -> ExitCode {
    let output = dbas_compile::check_file(file);
    if json {
        for diag in output.warnings.iter().chain(output.errors.iter()) {
            match serde_json::to_string(diag) {
                Ok(line) => println!("{}", line),
                Err(e) => eprintln!("dbas: cannot serialize diagnostic: {}", e),
            }
        }
        if output.succeeded() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    } else if report(&output) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Writes the generated unit into a scratch directory and invokes
/// `go build`. Returns the built executable path (inside `dir`).
fn go_build(go_source: &str, dir: &Path, output: &Path, verbose: bool) -> Result<(), String> {
    let main_go = dir.join("main.go");
    std::fs::write(&main_go, go_source).map_err(|e| format!("cannot write {}: {}", main_go.display(), e))?;

    let mod_file = dir.join("go.mod");
    std::fs::write(&mod_file, "module dbasprogram\n\ngo 1.21\n")
        .map_err(|e| format!("cannot write {}: {}", mod_file.display(), e))?;

    note(verbose, &format!("go build -o {}", output.display()));
    let status = Command::new("go")
        .arg("build")
        .arg("-o")
        .arg(output)
        .current_dir(dir)
        .status()
        .map_err(|e| format!("cannot invoke the go toolchain: {}", e))?;
    if !status.success() {
        return Err("go build failed".to_string());
    }
    Ok(())
}

fn cmd_build(output: Option<PathBuf>, debug: bool, verbose: bool, file: &Path) -> ExitCode {
    let compiled = match compile(file, debug, verbose) {
        Some(c) => c,
        None => return ExitCode::FAILURE,
    };
    let output = output.unwrap_or_else(|| {
        let stem = file.file_stem().map(|s| s.to_os_string()).unwrap_or_else(|| "a.out".into());
        PathBuf::from(stem)
    });
    let output = absolute(&output);

    let dir = match tempfile::tempdir() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("driver error: cannot create build directory: {}", e);
            return ExitCode::FAILURE;
        }
    };
    match go_build(&compiled.go_source, dir.path(), &output, verbose) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("driver error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_run(debug: bool, verbose: bool, file: &Path) -> ExitCode {
    let compiled = match compile(file, debug, verbose) {
        Some(c) => c,
        None => return ExitCode::FAILURE,
    };
    let dir = match tempfile::tempdir() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("driver error: cannot create build directory: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let exe = dir.path().join("program");
    if let Err(e) = go_build(&compiled.go_source, dir.path(), &exe, verbose) {
        eprintln!("driver error: {}", e);
        return ExitCode::FAILURE;
    }

    let status = Command::new(&exe)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status();
    match status {
        Ok(status) => ExitCode::from(status.code().unwrap_or(1).clamp(0, 255) as u8),
        Err(e) => {
            eprintln!("driver error: cannot run {}: {}", exe.display(), e);
            ExitCode::FAILURE
        }
    }
}

/// `go build -o` runs from the scratch directory, so relative output paths
/// are resolved against the invocation directory first.
fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map(|cwd| cwd.join(path)).unwrap_or_else(|_| path.to_path_buf())
    }
}
