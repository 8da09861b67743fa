use std::rc::Rc;

use itertools::Itertools;

use crate::{
    error::{Arity, SchemeError},
    frame::Frame,
    trace::debug_trace,
    value::{Closure, EvaluationResult, Formals, Value},
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum LetKind {
    /// `let`: inits see only the outer frame
    Parallel,
    /// `let*`: each init sees the bindings before it
    Sequential,
    /// `letrec`: inits see every binding of the form
    Recursive,
}

impl LetKind {
    fn form(&self) -> &'static str {
        match self {
            Self::Parallel => "let",
            Self::Sequential => "let*",
            Self::Recursive => "letrec",
        }
    }
}

impl Closure {
    fn evaluate(&self, values: Vec<Value>) -> EvaluationResult {
        let environment = Frame::new(&self.environment);

        match &self.formals {
            Formals::Fixed(parameters) => {
                // A fixed parameter list must receive exactly as many values
                if parameters.len() != values.len() {
                    return Err(SchemeError::ArityMismatch {
                        procedure: None,
                        expected: Arity::Exactly(parameters.len()),
                        given: values.len(),
                    })
                }
                for (parameter, value) in parameters.iter().zip(values) {
                    environment.bind(parameter.clone(), value);
                }
            }
            Formals::Variadic(parameter) => environment.bind(parameter.clone(), Value::list(values)),
        }

        evaluate(&self.body, &environment)
    }
}

/// Applies an already evaluated procedure to already evaluated arguments.
pub fn apply(procedure: &Value, values: Vec<Value>, frame: &Frame) -> EvaluationResult {
    debug_trace!("apply {} to {} argument(s)", procedure, values.len());

    match procedure {
        Value::Primitive(primitive) => (primitive.function)(values, frame),
        Value::Closure(closure) => closure.evaluate(values),
        other => Err(SchemeError::not_a_procedure(other)),
    }
}

/// Applies `procedure` where the result is used as a value, so `Void` is rejected.
pub(crate) fn apply_operand(procedure: &Value, values: Vec<Value>, frame: &Frame) -> EvaluationResult {
    match apply(procedure, values, frame)? {
        Value::Void => Err(SchemeError::VoidOperand),
        value => Ok(value),
    }
}

/// Evaluates `expression` in `frame`.
///
/// # Panics
///
/// Closures, primitives and `Void` cannot be written in source code. Finding one in
/// expression position means the tree did not come from the parser, which is a bug.
pub fn evaluate(expression: &Value, frame: &Frame) -> EvaluationResult {
    debug_trace!("evaluate {}", expression);

    match expression {
        Value::Int(_) | Value::Double(_) | Value::Str(_) | Value::Bool(_) => Ok(expression.clone()),
        Value::Symbol(name) => frame.lookup(name),
        Value::Null => Err(SchemeError::NoProcedure),
        Value::Pair(pair) => evaluate_combination(&pair.0, &pair.1, frame),
        Value::Void | Value::Closure(_) | Value::Primitive(_) => {
            panic!("found {} in expression position; only parsed syntax can be evaluated", expression.type_name())
        }
    }
}

/// Evaluates an expression whose value is about to be used, rejecting `Void`.
fn evaluate_operand(expression: &Value, frame: &Frame) -> EvaluationResult {
    match evaluate(expression, frame)? {
        Value::Void => Err(SchemeError::VoidOperand),
        value => Ok(value),
    }
}

fn evaluate_combination(first: &Value, rest: &Value, frame: &Frame) -> EvaluationResult {
    // Keywords are checked before `first` is evaluated, so special forms
    // cannot be shadowed by bindings
    if let Value::Symbol(keyword) = first {
        match &**keyword {
            "if" => return evaluate_if(&form_arguments("if", rest)?, frame),
            "quote" => return evaluate_quote(&form_arguments("quote", rest)?),
            "let" => return evaluate_let(&form_arguments("let", rest)?, frame, LetKind::Parallel),
            "let*" => return evaluate_let(&form_arguments("let*", rest)?, frame, LetKind::Sequential),
            "letrec" => return evaluate_let(&form_arguments("letrec", rest)?, frame, LetKind::Recursive),
            "define" => return evaluate_define(&form_arguments("define", rest)?, frame),
            "lambda" => return evaluate_lambda(&form_arguments("lambda", rest)?, frame),
            "and" => return evaluate_and(&form_arguments("and", rest)?, frame),
            "or" => return evaluate_or(&form_arguments("or", rest)?, frame),
            "cond" => return evaluate_cond(&form_arguments("cond", rest)?, frame),
            "set!" => return evaluate_set_bang(&form_arguments("set!", rest)?, frame),
            "begin" => return evaluate_begin(&form_arguments("begin", rest)?, frame),
            _ => {}
        }
    }

    let procedure = evaluate_operand(first, frame)?;
    if !procedure.is_procedure() {
        return Err(SchemeError::not_a_procedure(&procedure))
    }

    let values = rest.to_vec("application")?
        .iter()
        .map(|argument| evaluate_operand(argument, frame))
        .collect::<Result<Vec<_>, _>>()?;

    apply(&procedure, values, frame)
}

fn form_arguments(form: &str, rest: &Value) -> Result<Vec<Value>, SchemeError> {
    rest.to_vec(form)
        .map_err(|_| SchemeError::malformed(form, "arguments must form a proper list."))
}

fn expect_arguments(form: &str, arguments: &[Value], count: usize) -> Result<(), SchemeError> {
    if arguments.len() != count {
        return Err(SchemeError::arity(form, Arity::Exactly(count), arguments.len()))
    }
    Ok(())
}

fn evaluate_if(arguments: &[Value], frame: &Frame) -> EvaluationResult {
    expect_arguments("if", arguments, 3)?;

    if evaluate_operand(&arguments[0], frame)?.is_truthy() {
        evaluate(&arguments[1], frame)
    } else {
        evaluate(&arguments[2], frame)
    }
}

fn evaluate_quote(arguments: &[Value]) -> EvaluationResult {
    expect_arguments("quote", arguments, 1)?;
    Ok(arguments[0].clone())
}

fn parse_let_binding(form: &str, binding: &Value) -> Result<(Rc<str>, Value), SchemeError> {
    // Each binding is a two element list of a symbol and an init expression
    let parts = binding.to_vec(form)
        .ok()
        .filter(|parts| parts.len() == 2)
        .ok_or_else(|| SchemeError::malformed(form, "each binding must be a proper list of length 2."))?;

    match &parts[0] {
        Value::Symbol(name) => Ok((name.clone(), parts[1].clone())),
        other => Err(SchemeError::malformed(form, format!("cannot bind to `{}` of type {}.", other, other.type_name()))),
    }
}

/// Evaluates `let`, `let*` and `letrec`.
///
/// A `letrec` closure captures the frame that binds it, which forms an `Rc` cycle. A
/// `letrec` evaluated inside a procedure body leaks that frame on every call.
fn evaluate_let(arguments: &[Value], frame: &Frame, kind: LetKind) -> EvaluationResult {
    // The first argument is the list of bindings and the second is the body, which
    // is evaluated in a child frame holding the bindings

    let form = kind.form();
    expect_arguments(form, arguments, 2)?;

    let bindings = arguments[0].to_vec(form)
        .map_err(|_| SchemeError::malformed(form, "the first argument should be a proper list of bindings."))?
        .iter()
        .map(|binding| parse_let_binding(form, binding))
        .collect::<Result<Vec<_>, _>>()?;

    if kind != LetKind::Sequential {
        if let Some(name) = bindings.iter().map(|(name, _)| name).duplicates().next() {
            return Err(SchemeError::DuplicateBinding(name.to_string()))
        }
    }

    let body_frame = match kind {
        LetKind::Parallel => {
            let values = bindings.iter()
                .map(|(_, init)| evaluate_operand(init, frame))
                .collect::<Result<Vec<_>, _>>()?;

            let child = Frame::new(frame);
            for ((name, _), value) in bindings.iter().zip(values) {
                child.bind(name.clone(), value);
            }
            child
        }
        LetKind::Sequential => {
            if bindings.is_empty() {
                Frame::new(frame)
            } else {
                let mut current = frame.clone();
                for (name, init) in &bindings {
                    let value = evaluate_operand(init, &current)?;
                    current = Frame::new(&current);
                    current.bind(name.clone(), value);
                }
                current
            }
        }
        LetKind::Recursive => {
            let child = Frame::new(frame);
            for (name, _) in &bindings {
                child.bind(name.clone(), Value::Void);
            }
            for (name, init) in &bindings {
                let value = evaluate_operand(init, &child)?;
                child.bind(name.clone(), value);
            }
            child
        }
    };

    evaluate(&arguments[1], &body_frame)
}

fn parse_formals(formals: &Value) -> Result<Formals, SchemeError> {
    // Formals are a single symbol capturing every argument, or a proper list of distinct symbols

    if let Value::Symbol(name) = formals {
        return Ok(Formals::Variadic(name.clone()))
    }

    let parameters = formals.to_vec("lambda")
        .map_err(|_| SchemeError::InvalidFormals(format!("`{}` is neither a symbol nor a proper list", formals)))?
        .iter()
        .map(|formal| match formal {
            Value::Symbol(name) => Ok(name.clone()),
            other => Err(SchemeError::InvalidFormals(format!("`{}` is not a symbol", other))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(name) = parameters.iter().duplicates().next() {
        return Err(SchemeError::InvalidFormals(format!("`{}` appears more than once", name)))
    }

    Ok(Formals::Fixed(parameters))
}

fn make_closure(formals: &Value, body: &Value, frame: &Frame) -> EvaluationResult {
    Ok(Value::Closure(Rc::new(Closure {
        formals: parse_formals(formals)?,
        body: body.clone(),
        environment: frame.clone(),
    })))
}

fn evaluate_lambda(arguments: &[Value], frame: &Frame) -> EvaluationResult {
    expect_arguments("lambda", arguments, 2)?;
    make_closure(&arguments[0], &arguments[1], frame)
}

fn evaluate_define(arguments: &[Value], frame: &Frame) -> EvaluationResult {
    // A define either binds a symbol to the value of an expression, or is the
    // shorthand `(define (name . formals) body)` for binding a lambda

    if !frame.is_root() {
        return Err(SchemeError::malformed("define", "`define` can only be called from the top level."))
    }
    expect_arguments("define", arguments, 2)?;

    match &arguments[0] {
        Value::Symbol(name) => {
            let value = evaluate_operand(&arguments[1], frame)?;
            frame.bind(name.clone(), value);
        }
        Value::Pair(signature) => {
            let name = signature.0.as_symbol()
                .ok_or_else(|| SchemeError::malformed("define", "the procedure name must be a symbol."))?;
            let closure = make_closure(&signature.1, &arguments[1], frame)?;
            frame.bind(name.clone(), closure);
        }
        other => {
            return Err(SchemeError::malformed("define", format!("cannot define `{}` of type {}.", other, other.type_name())))
        }
    }

    Ok(Value::Void)
}

fn evaluate_and(arguments: &[Value], frame: &Frame) -> EvaluationResult {
    // Returns the first false value, or the last value when none is false

    let mut result = Value::Bool(true);
    for argument in arguments {
        result = evaluate_operand(argument, frame)?;
        if !result.is_truthy() {
            return Ok(result)
        }
    }
    Ok(result)
}

fn evaluate_or(arguments: &[Value], frame: &Frame) -> EvaluationResult {
    // Returns the first value which is not false

    for argument in arguments {
        let value = evaluate_operand(argument, frame)?;
        if value.is_truthy() {
            return Ok(value)
        }
    }
    Ok(Value::Bool(false))
}

fn evaluate_cond(arguments: &[Value], frame: &Frame) -> EvaluationResult {
    let clauses = arguments.iter()
        .map(|clause| clause.to_vec("cond")
            .ok()
            .filter(|parts| parts.len() == 2)
            .ok_or_else(|| SchemeError::malformed("cond", "each clause must be a proper list of length 2.")))
        .collect::<Result<Vec<_>, _>>()?;

    let is_else = |test: &Value| matches!(test, Value::Symbol(name) if &**name == "else");
    if let Some(position) = clauses.iter().position(|clause| is_else(&clause[0])) {
        if position + 1 != clauses.len() {
            return Err(SchemeError::malformed("cond", "`else` is only allowed in the last clause."))
        }
    }

    for clause in &clauses {
        if is_else(&clause[0]) || evaluate_operand(&clause[0], frame)?.is_truthy() {
            return evaluate(&clause[1], frame)
        }
    }

    Ok(Value::Void)
}

fn evaluate_set_bang(arguments: &[Value], frame: &Frame) -> EvaluationResult {
    expect_arguments("set!", arguments, 2)?;

    let name = arguments[0].as_symbol()
        .ok_or_else(|| SchemeError::malformed("set!", "`set!` expects a symbol as the first argument."))?;

    let value = evaluate_operand(&arguments[1], frame)?;
    if !frame.set_bang(name, value) {
        return Err(SchemeError::UnboundVariable(name.to_string()))
    }

    Ok(Value::Void)
}

fn evaluate_begin(arguments: &[Value], frame: &Frame) -> EvaluationResult {
    let mut result = Value::Void;
    for argument in arguments {
        result = evaluate(argument, frame)?;
    }
    Ok(result)
}
