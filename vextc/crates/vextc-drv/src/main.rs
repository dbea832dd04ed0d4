//! vextc - batch-mode command line front end.
//!
//! Reads Vext source from a file argument or stdin, compiles it, runs it
//! when the compile is clean, and prints a single JSON document:
//!
//! ```text
//! { "success": bool, "errors": [...], "output": string?, "tokens": [...]? }
//! ```
//!
//! Exit code 0 when compilation and execution succeed, 1 otherwise. The
//! long-running editor sidecar (streaming mode) lives outside this binary.

use std::io::Read;
use std::process::ExitCode;

use anyhow::{Context, Result};
use serde_json::{json, Value as Json};
use vextc_drv::Engine;
use vextc_lex::TokenKind;
use vextc_util::Diagnostic;

struct Options {
    file: Option<String>,
    run: bool,
    emit_tokens: bool,
    emit_code: bool,
}

fn main() -> ExitCode {
    match try_main() {
        Ok(success) => {
            if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> Result<bool> {
    let options = parse_args()?;

    let source = match &options.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read '{}'", path))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            buffer
        }
    };

    let engine = Engine::new();
    let compiled = engine.compile(&source);

    let mut errors: Vec<Json> = compiled.diagnostics.iter().map(diagnostic_json).collect();
    let mut output = None;
    let mut success = compiled.is_success();

    if success && options.run {
        let run = engine.run(&compiled.instructions);
        errors.extend(run.diagnostics.iter().map(diagnostic_json));
        success = run.is_success();
        output = Some(run.stdout);
    }

    let mut document = json!({
        "success": success,
        "errors": errors,
    });
    if let Some(output) = output {
        document["output"] = json!(output);
    }
    if options.emit_tokens {
        let tokens: Vec<Json> = compiled
            .tokens
            .iter()
            .map(|t| {
                json!({
                    "kind": kind_name(t.kind),
                    "text": t.text,
                    "line": t.line,
                    "startCol": t.start_col,
                    "endCol": t.end_col,
                })
            })
            .collect();
        document["tokens"] = json!(tokens);
    }
    if options.emit_code {
        let code: Vec<String> = compiled
            .instructions
            .iter()
            .enumerate()
            .map(|(i, instr)| format!("{:4}: {}", i, instr))
            .collect();
        document["code"] = json!(code);
    }

    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(success)
}

fn parse_args() -> Result<Options> {
    let mut options = Options {
        file: None,
        run: true,
        emit_tokens: false,
        emit_code: false,
    };

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--no-run" => options.run = false,
            "--emit-tokens" => options.emit_tokens = true,
            "--emit-code" => options.emit_code = true,
            "--help" | "-h" => {
                println!("usage: vextc [--no-run] [--emit-tokens] [--emit-code] [file]");
                println!("reads from stdin when no file is given");
                std::process::exit(0);
            }
            other if !other.starts_with('-') => {
                anyhow::ensure!(options.file.is_none(), "multiple input files given");
                options.file = Some(other.to_string());
            }
            other => anyhow::bail!("unknown option '{}'", other),
        }
    }

    Ok(options)
}

fn diagnostic_json(diag: &Diagnostic) -> Json {
    json!({
        "message": diag.message,
        "severity": diag.severity.to_string(),
        "startLine": diag.start_line,
        "startCol": diag.start_col,
        "endLine": diag.end_line,
        "endCol": diag.end_col,
    })
}

fn kind_name(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Identifier => "identifier",
        TokenKind::Keyword => "keyword",
        TokenKind::String => "string",
        TokenKind::Numeric => "numeric",
        TokenKind::Operator => "operator",
        TokenKind::Punctuation => "punctuation",
        TokenKind::Comment => "comment",
        TokenKind::Boolean => "boolean",
        TokenKind::Eof => "eof",
        TokenKind::Unknown => "unknown",
    }
}
