use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use gsx_analyzer::{Analysis, ComponentInfo};
use gsx_lexer::{Diagnostics, FileId, Lexer, TokenKind};
use gsx_parser::File;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gsx")]
#[command(about = "GSX: check and inspect terminal UI component files")]
#[command(version)]
struct Cli {
    /// Log pipeline stages to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lex, parse, and analyze a .gsx file and report diagnostics
    Check {
        /// Input .gsx file
        path: PathBuf,

        /// Print diagnostics as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Print the token stream of a .gsx file
    Tokens {
        /// Input .gsx file
        path: PathBuf,
    },

    /// Print a per-component summary of the analyzed file
    Ast {
        /// Input .gsx file
        path: PathBuf,

        /// Dump the analyzed file and summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Check { path, json } => cmd_check(&path, json),
        Command::Tokens { path } => cmd_tokens(&path),
        Command::Ast { path, json } => cmd_ast(&path, json),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_source(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(source) => {
            debug!(path = %path.display(), bytes = source.len(), "read source");
            source
        }
        Err(e) => {
            eprintln!("Error reading {}: {e}", path.display());
            std::process::exit(1);
        }
    }
}

fn file_name(path: &Path) -> String {
    path.display().to_string()
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    for d in diagnostics {
        eprintln!("{d}");
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("Error encoding JSON: {e}");
            std::process::exit(1);
        }
    }
}

/// Parse and analyze, or report the parse failure and exit.
fn analyze(path: &Path, json: bool) -> (File, Analysis) {
    let source = read_source(path);
    match gsx_analyzer::analyze_source(&file_name(path), &source) {
        Ok(result) => result,
        Err(diagnostics) => {
            if json {
                print_json(&diagnostics);
            } else {
                print_diagnostics(&diagnostics);
            }
            std::process::exit(1);
        }
    }
}

fn cmd_check(path: &Path, json: bool) {
    let (_, analysis) = analyze(path, json);

    if json {
        print_json(&analysis.diagnostics);
    } else {
        print_diagnostics(&analysis.diagnostics);
    }

    if analysis.has_errors() {
        std::process::exit(1);
    }
    if !json {
        eprintln!("OK: {}", path.display());
    }
}

fn cmd_tokens(path: &Path) {
    let source = read_source(path);
    let mut lexer = Lexer::new(FileId::new(file_name(path)), &source);

    loop {
        let token = lexer.next_token();
        println!(
            "{}:{} {} {:?}",
            token.span.line,
            token.span.column,
            token.kind,
            token.text()
        );
        if token.kind == TokenKind::Eof {
            break;
        }
    }

    let diagnostics = lexer.diagnostics();
    print_diagnostics(&diagnostics);
    if diagnostics.has_errors() {
        std::process::exit(1);
    }
}

#[derive(Serialize)]
struct AstDump<'a> {
    file: &'a File,
    components: &'a [ComponentInfo],
    diagnostics: &'a Diagnostics,
}

fn cmd_ast(path: &Path, json: bool) {
    let (file, analysis) = analyze(path, json);

    if json {
        print_json(&AstDump {
            file: &file,
            components: &analysis.components,
            diagnostics: &analysis.diagnostics,
        });
    } else {
        println!("package {}", file.package);
        for import in &file.imports {
            match &import.alias {
                Some(alias) => println!("import {alias} {:?}", import.path),
                None => println!("import {:?}", import.path),
            }
        }
        for info in &analysis.components {
            print_component(info);
        }
        print_diagnostics(&analysis.diagnostics);
    }

    if analysis.has_errors() {
        std::process::exit(1);
    }
}

fn print_component(info: &ComponentInfo) {
    let children = if info.accepts_children { "yes" } else { "no" };
    println!("component {} (accepts children: {children})", info.name);

    for binding in &info.let_bindings {
        let used = if binding.used { "used" } else { "unused" };
        println!("  let {} ({used})", binding.name);
    }
    for r in &info.named_refs {
        let kind = match r.kind() {
            gsx_analyzer::RefKind::Single => "single",
            gsx_analyzer::RefKind::List => "list",
            gsx_analyzer::RefKind::Map => "map",
        };
        match (&r.key_expr, r.key_type) {
            (Some(key), Some(ty)) => {
                println!("  ref {} <{}> {kind} key={key} ({})", r.name, r.tag, ty.as_go())
            }
            _ => println!("  ref {} <{}> {kind}", r.name, r.tag),
        }
    }
    for var in &info.state_vars {
        match &var.init_expr {
            Some(init) => println!("  state {} {} = {init}", var.name, var.ty),
            None => println!("  state {} {} (param)", var.name, var.ty),
        }
    }
    for binding in &info.state_bindings {
        let attribute = match binding.attribute {
            gsx_analyzer::BoundAttribute::Text => "text",
            gsx_analyzer::BoundAttribute::Class => "class",
        };
        let explicit = if binding.explicit_deps { " (deps)" } else { "" };
        println!(
            "  bind {}.{attribute} <- {}{explicit}",
            binding.element_name,
            binding.state_vars.join(", ")
        );
    }
}
