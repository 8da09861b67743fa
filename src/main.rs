use std::{
    fs::File,
    io::{self, IsTerminal, Read},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::Context;
use rustyline::{error::ReadlineError, DefaultEditor};
use schemer::{is_balanced, Config, EvaluationContext};

fn print_results(context: &mut EvaluationContext, source: &str) -> Result<(), schemer::SchemeError> {
    let values = context.evaluate_str(source)?;
    let rendered = EvaluationContext::render(&values);
    if !rendered.is_empty() {
        println!("{}", rendered);
    }
    Ok(())
}

fn run_files(context: &mut EvaluationContext, paths: &[PathBuf]) -> anyhow::Result<()> {
    // Every file must be readable before any of them runs
    for path in paths {
        File::open(path).with_context(|| format!("cannot read {}", path.display()))?;
    }

    for path in paths {
        let values = context.load_file(path)
            .with_context(|| format!("while evaluating {}", path.display()))?;
        let rendered = EvaluationContext::render(&values);
        if !rendered.is_empty() {
            println!("{}", rendered);
        }
    }
    Ok(())
}

fn run_batch(context: &mut EvaluationContext) -> anyhow::Result<()> {
    let mut source = String::new();
    io::stdin().read_to_string(&mut source).context("cannot read standard input")?;
    print_results(context, &source)?;
    Ok(())
}

fn run_repl(context: &mut EvaluationContext) -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new().context("cannot start the line editor")?;
    let mut counter = 1usize;
    let mut pending = String::new();

    loop {
        let prompt = if pending.is_empty() {
            format!("[{}] schemer> ", counter)
        } else {
            format!("[{}]   ... > ", counter)
        };

        let line = match editor.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                pending.clear();
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(error) => return Err(error.into()),
        };

        if !pending.is_empty() {
            pending.push('\n');
        }
        pending.push_str(&line);

        // Keep reading while parentheses are still open
        match is_balanced(&pending) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(error) => {
                eprintln!("Error: {}", error);
                pending.clear();
                continue;
            }
        }

        let source = std::mem::take(&mut pending);
        if source.trim().is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(source.as_str());

        if let Err(error) = print_results(context, &source) {
            eprintln!("Error: {}", error);
        }
        counter += 1;
    }

    Ok(())
}

fn run() -> anyhow::Result<()> {
    let config = Config::from_env();
    let mut context = EvaluationContext::with_config(&config).context("cannot load the library")?;

    let paths = std::env::args_os().skip(1).map(PathBuf::from).collect::<Vec<_>>();
    if !paths.is_empty() {
        run_files(&mut context, &paths)
    } else if config.interactive || io::stdin().is_terminal() {
        run_repl(&mut context)
    } else {
        run_batch(&mut context)
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {:#}", error);
            ExitCode::FAILURE
        }
    }
}
