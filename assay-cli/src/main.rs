//! Assay CLI: check static assertions in assay IR files.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Input/assembly error
//! - 2: Verification failure
//! - 3: At least one assertion produced a diagnostic

mod commands;
mod logger;

use std::process;

fn main() {
    let mut args: Vec<String> = std::env::args().collect();

    let before = args.len();
    args.retain(|a| a != "-v" && a != "--verbose");
    logger::init_with_level(logger::LogLevel::from_verbose(args.len() != before));

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "check" => commands::check(&args[2..]),
        "verify" => commands::verify(&args[2..]),
        "fmt" => commands::fmt(&args[2..]),
        "--help" | "-h" | "help" => {
            print_usage();
            process::exit(0);
        }
        other => {
            eprintln!("error: unknown command '{other}'");
            eprintln!();
            print_usage();
            process::exit(1);
        }
    };

    if let Err(code) = result {
        process::exit(code);
    }
}

fn print_usage() {
    eprintln!("Usage: assay <command> [args] [-v|--verbose]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  check <input.air> [--limit N]   Evaluate every assertion");
    eprintln!("  verify <input.air>              Assemble and verify only");
    eprintln!("  fmt <input.air>                 Print the canonical text form");
}
