use std::{fs, path::Path};

use itertools::Itertools;

use crate::{
    builtin::bind_builtins,
    config::Config,
    error::SchemeError,
    frame::Frame,
    interpreter::evaluate,
    parser::parse,
    trace::debug_trace,
    value::{EvaluationResult, Value},
};

fn load_error(path: &Path, reason: impl ToString) -> SchemeError {
    SchemeError::Load {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

fn evaluate_all(program: &Value, frame: &Frame) -> Result<Vec<Value>, SchemeError> {
    program.to_vec("program")?
        .iter()
        .map(|expression| evaluate(expression, frame))
        .collect()
}

/// Reads, parses and evaluates a source file in `frame`.
pub(crate) fn run_file(path: &Path, frame: &Frame) -> Result<Vec<Value>, SchemeError> {
    debug_trace!("loading {}", path.display());

    let source = fs::read_to_string(path).map_err(|error| load_error(path, error))?;
    evaluate_all(&parse(&source)?, frame)
}

/// An evaluation context owns the global frame and evaluates top-level expressions in it.
///
/// Every context is independent; definitions made through one are invisible to another.
/// A failing expression does not roll back the effects of whatever ran before it.
pub struct EvaluationContext {
    frame: Frame,
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluationContext {
    pub fn new() -> Self {
        let frame = Frame::root();
        bind_builtins(&frame);

        Self { frame }
    }

    /// Builds a context and evaluates the library directory named by `config`, if any.
    pub fn with_config(config: &Config) -> Result<Self, SchemeError> {
        let mut context = Self::new();
        if let Some(library) = &config.library {
            context.load_library(library)?;
        }
        Ok(context)
    }

    /// Evaluates every `*.scm` file of `directory`, in name order.
    pub fn load_library<P: AsRef<Path>>(&mut self, directory: P) -> Result<(), SchemeError> {
        let directory = directory.as_ref();
        let entries = fs::read_dir(directory).map_err(|error| load_error(directory, error))?;

        let files = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|extension| extension == "scm"))
            .sorted()
            .collect_vec();

        for path in files {
            run_file(&path, &self.frame)?;
        }
        Ok(())
    }

    pub fn global_frame(&self) -> &Frame {
        &self.frame
    }

    /// Evaluates a single top-level expression.
    pub fn evaluate(&mut self, expression: &Value) -> EvaluationResult {
        evaluate(expression, &self.frame)
    }

    /// Evaluates each element of `program` in order, stopping at the first error.
    ///
    /// # Panics
    ///
    /// `program` must be a proper list, as produced by [`parse`].
    pub fn evaluate_program(&mut self, program: &Value) -> Result<Vec<Value>, SchemeError> {
        assert!(program.is_list(), "a program must be a proper list of expressions");
        evaluate_all(program, &self.frame)
    }

    pub fn evaluate_str(&mut self, source: &str) -> Result<Vec<Value>, SchemeError> {
        let program = parse(source)?;
        self.evaluate_program(&program)
    }

    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<Vec<Value>, SchemeError> {
        run_file(path.as_ref(), &self.frame)
    }

    /// Renders results one per line, leaving out `Void`.
    pub fn render(values: &[Value]) -> String {
        values.iter()
            .filter(|value| !value.is_void())
            .join("\n")
    }
}

impl Drop for EvaluationContext {
    fn drop(&mut self) {
        // Closures bound globally capture the global frame; clearing it breaks those cycles
        self.frame.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn scratch_directory(name: &str) -> anyhow::Result<PathBuf> {
        let directory = std::env::temp_dir().join(format!("schemer-{}-{}", name, std::process::id()));
        if directory.exists() {
            fs::remove_dir_all(&directory)?;
        }
        fs::create_dir_all(&directory)?;
        Ok(directory)
    }

    #[test]
    fn render_skips_void() -> anyhow::Result<()> {
        let mut context = EvaluationContext::new();
        let values = context.evaluate_str("(define x 2) x \"s\" (begin) '(1 . 2)")?;
        assert_eq!(EvaluationContext::render(&values), "2\n\"s\"\n(1 . 2)");
        Ok(())
    }

    #[test]
    fn contexts_are_isolated() -> anyhow::Result<()> {
        let mut first = EvaluationContext::new();
        let mut second = EvaluationContext::new();
        first.evaluate_str("(define only-here 1)")?;
        assert_eq!(
            second.evaluate_str("only-here"),
            Err(SchemeError::UnboundVariable("only-here".to_owned()))
        );
        Ok(())
    }

    #[test]
    fn evaluate_single_expression() -> anyhow::Result<()> {
        let mut context = EvaluationContext::new();
        let expression = Value::list([Value::symbol("+"), Value::Int(1), Value::Int(2)]);
        assert_eq!(context.evaluate(&expression)?, Value::Int(3));
        Ok(())
    }

    #[test]
    #[should_panic]
    fn program_must_be_a_list() {
        let _ = EvaluationContext::new().evaluate_program(&Value::Int(1));
    }

    #[test]
    fn load_file_and_load_primitive() -> anyhow::Result<()> {
        let directory = scratch_directory("load")?;
        let path = directory.join("square.scm");
        fs::write(&path, "(define (square x) (* x x))\n(square 3)\n")?;

        let mut context = EvaluationContext::new();
        assert_eq!(context.load_file(&path)?, vec![Value::Void, Value::Int(9)]);

        let mut context = EvaluationContext::new();
        let source = format!("(let ((unused 0)) (load \"{}\")) (square 4)", path.display());
        assert_eq!(context.evaluate_str(&source)?, vec![Value::Void, Value::Int(16)]);

        fs::remove_dir_all(&directory)?;
        Ok(())
    }

    #[test]
    fn missing_files_fail_to_load() {
        let mut context = EvaluationContext::new();
        assert!(matches!(
            context.load_file("/definitely/not/here.scm"),
            Err(SchemeError::Load { .. })
        ));
        assert!(matches!(
            context.evaluate_str("(load \"/definitely/not/here.scm\")"),
            Err(SchemeError::Load { .. })
        ));
        assert!(matches!(context.evaluate_str("(load 5)"), Err(SchemeError::TypeError { .. })));
    }

    #[test]
    fn library_is_loaded_in_name_order() -> anyhow::Result<()> {
        let directory = scratch_directory("library")?;
        fs::write(directory.join("a.scm"), "(define base 10)")?;
        fs::write(directory.join("b.scm"), "(define (add-base x) (+ x base))")?;
        fs::write(directory.join("notes.txt"), "not scheme (")?;

        let config = Config::default().with_library(&directory);
        let mut context = EvaluationContext::with_config(&config)?;
        assert_eq!(context.evaluate_str("(add-base 5)")?, vec![Value::Int(15)]);

        fs::remove_dir_all(&directory)?;
        Ok(())
    }
}
