//! Punto de entrada ("driver").
//!
//! Este módulo orquesta las diferentes fases del proceso de
//! compilación y expone una CLI: lectura del archivo fuente,
//! derivación de la ruta de salida (extensión reemplazada por `.ll`)
//! y serialización del módulo. Todo diagnóstico fatal termina el
//! proceso con estado distinto de cero.

use anyhow::Context;
use clap::{crate_version, Arg};
use fnlang::{error::Diagnostics, lex::Lexer, lowering, parse, source};

use std::{fs, path::Path, process};

fn main() -> anyhow::Result<()> {
    // Parsing de CLI
    let args = clap::App::new("FnLang compiler")
        .version(crate_version!())
        .arg(
            Arg::new("output")
                .short('o')
                .takes_value(true)
                .value_name("FILE")
                .help("Output file ('-' for stdout)"),
        )
        .arg(
            Arg::new("input")
                .required(true)
                .value_name("INPUT")
                .help("Source file"),
        )
        .get_matches();

    let input = args.value_of("input").expect("input is required");
    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to read source file: {}", input))?;

    // Lexer y parser avanzan entrelazados; el primer error es fatal
    let (start, stream) = source::consume(&text, input);
    let (ast, warnings) = match parse::parse(Lexer::new(start, stream)) {
        Ok(parsed) => parsed,
        Err(diagnostics) => {
            eprint!("{}", diagnostics);
            process::exit(1);
        }
    };

    if !warnings.is_empty() {
        eprint!("{}", Diagnostics::from(warnings).kind("warning"));
    }

    // Descenso a IR; las fallas de verificación no son fatales
    let (module, verifier_warnings) = match lowering::lower(ast, input) {
        Ok(lowered) => lowered,
        Err(error) => {
            eprintln!("error: {}", error);
            process::exit(1);
        }
    };

    for warning in &verifier_warnings {
        eprintln!("warning: {}", warning);
    }

    match args.value_of("output") {
        Some("-") => print!("{}", module),

        Some(path) => {
            module
                .write_to_file(Path::new(path))
                .with_context(|| format!("Failed to emit IR to file: {}", path))?;
        }

        None => {
            let path = Path::new(input).with_extension("ll");
            module
                .write_to_file(&path)
                .with_context(|| format!("Failed to emit IR to file: {}", path.display()))?;
        }
    }

    Ok(())
}
