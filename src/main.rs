mod ast;
mod builtins;
mod config;
mod env;
mod error;
mod eval;
mod highlighter;
mod lexer;
mod parser;
mod value;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use clap::Parser;
use error::{report, Subsystem};
use eval::Interp;
use highlighter::OcrHelper;
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};

/// OCR Exam Reference Language interpreter
#[derive(Parser, Debug)]
#[command(name = "ocrpi")]
#[command(version = config::VERSION)]
#[command(about = "A tree-walking interpreter for the OCR Exam Reference Language")]
struct CliArgs {
    /// Script file to execute (optional - if not provided, starts REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,
}

fn main() {
    let args = CliArgs::parse();
    match args.script {
        Some(path) => std::process::exit(run_script(&path)),
        None => repl(),
    }
}

/// Run a source file through the full pipeline, returning the process
/// exit code: 0 on success, otherwise the failing subsystem's code.
fn run_script(path: &Path) -> i32 {
    match path.extension().and_then(OsStr::to_str) {
        Some("ocr") => {}
        // Reserved for a future lex/parse/check/compile pipeline.
        Some("ocrx") => {
            report("Extended mode not supported yet!");
            return Subsystem::Main.exit_code();
        }
        _ => {
            report(&format!("Unknown file extension! ({})", path.display()));
            return Subsystem::Main.exit_code();
        }
    }

    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            report(&format!("Can't read {}: {}", path.display(), e));
            return Subsystem::Main.exit_code();
        }
    };

    let parsed = parser::parse(lexer::lex(&source));
    if !parsed.errors.is_empty() {
        for err in &parsed.errors {
            report(&err.to_string());
        }
        return Subsystem::Parser.exit_code();
    }

    let mut interp = Interp::new();
    match interp.run(&parsed.program) {
        Ok(()) => 0,
        Err(fault) => {
            report(&fault.to_string());
            fault.subsystem().exit_code()
        }
    }
}

/// Interactive session. Declarations persist across lines; a lone
/// expression statement echoes its value.
fn repl() {
    let rl_config = Config::builder().auto_add_history(true).build();
    let mut rl = match Editor::with_config(rl_config) {
        Ok(rl) => rl,
        Err(e) => {
            report(&format!("Failed to initialize REPL: {e}"));
            std::process::exit(Subsystem::Main.exit_code());
        }
    };
    rl.set_helper(Some(OcrHelper::new()));

    let history_file = ".ocrpi_history";
    let _ = rl.load_history(history_file);

    println!("{}", config::WELCOME_MESSAGE);
    println!("{}", config::WELCOME_SUBTITLE);
    println!("{}", config::WELCOME_FOOTER);

    let mut interp = Interp::new();
    loop {
        match rl.readline("ocr> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                run_line(&mut interp, line);
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(err) => {
                report(&format!("{err}"));
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
}

/// Parse and run one REPL line. The line's source and AST intentionally
/// leak: captured function declarations must stay valid for the rest of
/// the session.
fn run_line(interp: &mut Interp<'static>, line: String) {
    let source: &'static str = Box::leak(line.into_boxed_str());
    let parsed = parser::parse(lexer::lex(source));
    if !parsed.errors.is_empty() {
        for err in &parsed.errors {
            report(&err.to_string());
        }
        return;
    }
    let program: &'static ast::Program<'static> = Box::leak(Box::new(parsed.program));

    if let [ast::Decl::Stmt(ast::Stmt::Expr(expr))] = program.decls.as_slice() {
        match interp.eval_expression(expr) {
            Ok(value) => println!("=> {value}"),
            Err(fault) => report(&fault.to_string()),
        }
        return;
    }

    if let Err(fault) = interp.run(program) {
        report(&fault.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn script(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).expect("create script");
        file.write_all(contents.as_bytes()).expect("write script");
        path
    }

    #[test]
    fn test_run_script_success() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = script(&dir, "ok.ocr", "print(\"hi\")");
        assert_eq!(run_script(&path), 0);
    }

    #[test]
    fn test_unknown_extension_is_a_main_fault() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = script(&dir, "prog.txt", "print(1)");
        assert_eq!(run_script(&path), Subsystem::Main.exit_code());
    }

    #[test]
    fn test_extended_mode_is_a_main_fault() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = script(&dir, "prog.ocrx", "print(1)");
        assert_eq!(run_script(&path), Subsystem::Main.exit_code());
    }

    #[test]
    fn test_missing_file_is_a_main_fault() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.ocr");
        assert_eq!(run_script(&path), Subsystem::Main.exit_code());
    }

    #[test]
    fn test_parse_errors_stop_before_evaluation() {
        let dir = tempfile::tempdir().expect("tempdir");
        // The print would run if the evaluator were invoked; the parse
        // error must win with the Parser exit code.
        let path = script(&dir, "broken.ocr", "global x 3\nprint(1)");
        assert_eq!(run_script(&path), Subsystem::Parser.exit_code());
    }

    #[test]
    fn test_runtime_fault_uses_interpreter_code() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = script(&dir, "div.ocr", "print(1 / 0)");
        assert_eq!(run_script(&path), Subsystem::Interpreter.exit_code());
    }

    #[test]
    fn test_native_fault_uses_native_lib_code() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = script(&dir, "native.ocr", "typeof()");
        assert_eq!(run_script(&path), Subsystem::NativeLib.exit_code());
    }
}
