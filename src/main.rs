//! tppc: T++ compiler command line.
//!
//! Usage:
//!   tppc [OPTIONS] <FILE>
//!
//! Examples:
//!   tppc fatorial.tpp -t              # scope tree and symbols
//!   tppc fatorial.tpp -a --dot ast.dot
//!   tppc fatorial.tpp -g -o fatorial.ll
//!   tppc fatorial.tpp -r              # build with llvm-as/llc/clang and run

use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::Parser;
use log::{debug, info};

use tppc::{
    ast::ast::AstNode,
    backend::backend_by_name,
    check_program,
    errors::errors::{Error, ErrorTip},
    generate_module, parse_source,
    toolchain::Toolchain,
    CompileOptions,
};

/// T++ compiler
///
/// Checks a T++ source file and lowers it to LLVM IR.
#[derive(Parser, Debug)]
#[command(name = "tppc")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Source file
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Print the syntax tree
    #[arg(short, long)]
    ast: bool,

    /// Write the syntax tree as Graphviz DOT
    #[arg(long, value_name = "PATH")]
    dot: Option<PathBuf>,

    /// Print the scope tree and symbol table
    #[arg(short = 't', long)]
    symbols: bool,

    /// Generate the IR module
    #[arg(short = 'g', long)]
    codegen: bool,

    /// Generate, build and run the program (implies --codegen)
    #[arg(short, long)]
    run: bool,

    /// Output path of the IR module
    #[arg(short, long, value_name = "PATH", default_value = "module.ll")]
    output: PathBuf,

    /// Backend writing the module (text or llvm)
    #[arg(long, default_value = "text")]
    backend: String,

    /// Assembler turning textual IR into bitcode
    #[arg(long, default_value = "llvm-as")]
    assembler: String,

    /// Static compiler turning bitcode into an object file
    #[arg(long, default_value = "llc")]
    llc: String,

    /// Linker producing the executable
    #[arg(long, default_value = "clang")]
    linker: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

const EXIT_INPUT: u8 = 1;
const EXIT_SEMANTIC: u8 = 2;
const EXIT_CODEGEN: u8 = 3;
const EXIT_BACKEND: u8 = 4;

fn display_error(error: &Error) {
    if let ErrorTip::None = error.get_tip() {
        println!("[ERRO] {}: {}", error.get_error_name(), error);
    } else {
        println!(
            "[ERRO] {}: {} ({})",
            error.get_error_name(),
            error,
            error.get_tip()
        );
    }
}

fn write_dot(tree: &AstNode, path: &Path) -> Result<(), u8> {
    fs::write(path, tree.to_dot()).map_err(|err| {
        println!("[ERRO] não foi possível escrever '{}': {}", path.display(), err);
        EXIT_INPUT
    })?;
    info!("wrote {}", path.display());
    Ok(())
}

fn compile(args: &Args) -> Result<(), u8> {
    let source = fs::read_to_string(&args.file).map_err(|err| {
        println!("[ERRO] não foi possível ler '{}': {}", args.file.display(), err);
        EXIT_INPUT
    })?;
    info!("compiling {}", args.file.display());

    let parsed = parse_source(&source);
    for error in &parsed.errors {
        display_error(error);
    }
    if !parsed.is_ok() {
        return Err(EXIT_INPUT);
    }

    if args.ast || args.dot.is_some() {
        let tree = AstNode::from(&parsed.program);
        if args.ast {
            print!("{}", tree.render());
        }
        if let Some(path) = &args.dot {
            write_dot(&tree, path)?;
        }
    }

    let ctx = check_program(&parsed.program);
    for diagnostic in ctx.diagnostics.messages() {
        println!("{}", diagnostic);
    }
    if args.symbols {
        print!("{}", ctx.scopes);
    }

    if !(args.codegen || args.run) {
        return Ok(());
    }
    if ctx.is_fatal() {
        println!("[ERRO] geração de código não realizada: corrija os erros acima");
        return Err(EXIT_SEMANTIC);
    }

    let options = CompileOptions::for_path(&args.file);
    let module = generate_module(&parsed.program, &ctx, &options).map_err(|err| {
        println!("[ERRO] erro interno do gerador de código: {}", err);
        EXIT_CODEGEN
    })?;

    let backend = backend_by_name(&args.backend).map_err(|err| {
        println!("[ERRO] {}", err);
        EXIT_BACKEND
    })?;
    backend.emit(&module, &args.output).map_err(|err| {
        println!("[ERRO] {}", err);
        EXIT_BACKEND
    })?;

    if args.run {
        let toolchain = Toolchain {
            assembler: args.assembler.clone(),
            llc: args.llc.clone(),
            linker: args.linker.clone(),
        };
        let executable = toolchain.build_executable(&args.output).map_err(|err| {
            println!("[ERRO] {}", err);
            EXIT_BACKEND
        })?;
        let status = toolchain.run(&executable).map_err(|err| {
            println!("[ERRO] {}", err);
            EXIT_BACKEND
        })?;
        debug!("program exited with {}", status);
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match compile(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}
