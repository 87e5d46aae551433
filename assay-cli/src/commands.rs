//! CLI command implementations.

use std::fs;

use assay_common::Module;
use assay_vm::EvalConfig;
use tracing::{debug, info};

/// Assemble, verify and evaluate every assertion of a .air file.
pub fn check(args: &[String]) -> Result<(), i32> {
    if args.is_empty() {
        eprintln!("error: check requires an input file");
        eprintln!("Usage: assay check <input.air> [--limit N]");
        return Err(1);
    }

    let input = &args[0];
    let config = parse_config(&args[1..])?;
    let module = read_module(input)?;
    verify_module(&module)?;

    info!(
        file = %input,
        assertions = module.assertions.len(),
        limit = config.instruction_limit,
        "checking assertions"
    );

    let results = assay_vm::check_module(&module, config);
    let total = results.len();
    let mut passed = 0;
    for (assertion, result) in module.assertions.iter().zip(&results) {
        match result {
            Ok(report) => match &report.diagnostic {
                None => passed += 1,
                Some(diagnostic) => eprint!("{}", diagnostic.render(input)),
            },
            Err(e) => eprintln!("{input}:{}: error: malformed module: {e}", assertion.loc),
        }
    }

    let failed = total - passed;
    println!("{total} assertions: {passed} passed, {failed} failed");
    if failed > 0 {
        Err(3)
    } else {
        Ok(())
    }
}

/// Assemble and verify a .air file.
pub fn verify(args: &[String]) -> Result<(), i32> {
    if args.is_empty() {
        eprintln!("error: verify requires an input file");
        eprintln!("Usage: assay verify <input.air>");
        return Err(1);
    }

    let input = &args[0];
    let module = read_module(input)?;
    verify_module(&module)?;
    println!(
        "OK: {input} ({} functions, {} assertions)",
        module.functions.len(),
        module.assertions.len()
    );
    Ok(())
}

/// Print the canonical text form of a .air file.
pub fn fmt(args: &[String]) -> Result<(), i32> {
    if args.is_empty() {
        eprintln!("error: fmt requires an input file");
        eprintln!("Usage: assay fmt <input.air>");
        return Err(1);
    }

    let module = read_module(&args[0])?;
    print!("{}", assay_assembler::disassemble(&module));
    Ok(())
}

// ---- Helpers ----

/// Read and assemble a text file.
fn read_module(path: &str) -> Result<Module, i32> {
    let text = fs::read_to_string(path).map_err(|e| {
        eprintln!("error: cannot read '{path}': {e}");
        1
    })?;

    let module = assay_assembler::assemble(&text).map_err(|e| {
        eprintln!("error: {path}: {e}");
        1
    })?;
    debug!(file = %path, functions = module.functions.len(), "read module");
    Ok(module)
}

fn verify_module(module: &Module) -> Result<(), i32> {
    assay_verifier::verify(module).map_err(|errors| {
        for e in &errors {
            eprintln!("error: {e}");
        }
        2
    })
}

/// Parse the --limit flag from arguments.
fn parse_config(args: &[String]) -> Result<EvalConfig, i32> {
    let mut config = EvalConfig::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--limit" => {
                let Some(value) = args.get(i + 1) else {
                    eprintln!("error: --limit requires a value");
                    return Err(1);
                };
                let limit = value.parse().map_err(|_| {
                    eprintln!("error: invalid --limit '{value}'");
                    1
                })?;
                config = config.with_instruction_limit(limit);
                i += 2;
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                return Err(1);
            }
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn limit_defaults_to_512() {
        let config = parse_config(&[]).unwrap();
        assert_eq!(config.instruction_limit, 512);
    }

    #[test]
    fn limit_flag_overrides_default() {
        let config = parse_config(&strings(&["--limit", "40"])).unwrap();
        assert_eq!(config.instruction_limit, 40);
    }

    #[test]
    fn bad_limit_is_input_error() {
        assert_eq!(parse_config(&strings(&["--limit"])).unwrap_err(), 1);
        assert_eq!(parse_config(&strings(&["--limit", "-3"])).unwrap_err(), 1);
        assert_eq!(parse_config(&strings(&["--frob"])).unwrap_err(), 1);
    }
}
