use std::path::Path;

use itertools::Itertools;

use crate::{
    context::run_file,
    error::{Arity, SchemeError},
    frame::Frame,
    interpreter::{apply, apply_operand},
    value::{EvaluationResult, Primitive, PrimitiveFn, Value},
};

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Double(f64),
}

impl Number {
    fn from_value(procedure: &str, value: &Value) -> Result<Self, SchemeError> {
        match value {
            Value::Int(value) => Ok(Self::Int(*value)),
            Value::Double(value) => Ok(Self::Double(*value)),
            other => Err(SchemeError::type_error(procedure, "a number", other)),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Self::Int(value) => value as f64,
            Self::Double(value) => value,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Self::Int(value) => value == 0,
            Self::Double(value) => value == 0.0,
        }
    }
}

impl From<Number> for Value {
    fn from(number: Number) -> Self {
        match number {
            Number::Int(value) => Value::Int(value),
            Number::Double(value) => Value::Double(value),
        }
    }
}

fn expect_arity(procedure: &str, values: &[Value], arity: Arity) -> Result<(), SchemeError> {
    if !arity.accepts(values.len()) {
        return Err(SchemeError::arity(procedure, arity, values.len()))
    }
    Ok(())
}

fn values_to_numbers(procedure: &str, values: &[Value]) -> Result<Vec<Number>, SchemeError> {
    values.iter()
        .map(|value| Number::from_value(procedure, value))
        .collect()
}

/// Folds the operands starting from `initial`. The accumulator stays an integer until
/// a double operand shows up or `int_op` reports a non-integral result by returning
/// `Ok(None)`; from then on it stays a double.
fn arithmetic_fold(
    procedure: &str,
    initial: Number,
    operands: &[Number],
    int_op: impl Fn(i64, i64) -> Result<Option<i64>, SchemeError>,
    double_op: impl Fn(f64, f64) -> f64,
) -> Result<Number, SchemeError> {
    operands.iter().try_fold(initial, |accumulator, operand| {
        Ok(match (accumulator, *operand) {
            (Number::Int(a), Number::Int(b)) => match int_op(a, b)? {
                Some(result) => Number::Int(result),
                None => Number::Double(double_op(a as f64, b as f64)),
            },
            (a, b) => Number::Double(double_op(a.as_f64(), b.as_f64())),
        })
    })
    .map_err(|error: SchemeError| match error {
        SchemeError::Overflow { .. } => SchemeError::Overflow { procedure: procedure.to_owned() },
        other => other,
    })
}

fn overflow() -> SchemeError {
    SchemeError::Overflow { procedure: String::new() }
}

fn builtin_add(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    let numbers = values_to_numbers("+", &values)?;
    arithmetic_fold("+", Number::Int(0), &numbers, |a, b| a.checked_add(b).map(Some).ok_or_else(overflow), |a, b| a + b)
        .map(Value::from)
}

fn builtin_mul(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    let numbers = values_to_numbers("*", &values)?;
    arithmetic_fold("*", Number::Int(1), &numbers, |a, b| a.checked_mul(b).map(Some).ok_or_else(overflow), |a, b| a * b)
        .map(Value::from)
}

fn builtin_sub(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    let numbers = values_to_numbers("-", &values)?;

    // A single operand is negated
    let (initial, operands) = match numbers.split_first() {
        Some((only, [])) => (Number::Int(0), std::slice::from_ref(only)),
        Some((first, rest)) => (*first, rest),
        None => return Err(SchemeError::arity("-", Arity::AtLeast(1), 0)),
    };

    arithmetic_fold("-", initial, operands, |a, b| a.checked_sub(b).map(Some).ok_or_else(overflow), |a, b| a - b)
        .map(Value::from)
}

fn builtin_div(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    let numbers = values_to_numbers("/", &values)?;

    // A single operand gives its reciprocal
    let (initial, operands) = match numbers.split_first() {
        Some((only, [])) => (Number::Int(1), std::slice::from_ref(only)),
        Some((first, rest)) => (*first, rest),
        None => return Err(SchemeError::arity("/", Arity::AtLeast(1), 0)),
    };

    if operands.iter().any(|operand| operand.is_zero()) {
        return Err(SchemeError::DivideByZero)
    }

    let divide = |a: i64, b: i64| match a.checked_rem(b) {
        Some(0) => a.checked_div(b).map(Some).ok_or_else(overflow),
        Some(_) => Ok(None),
        None => Err(overflow()),
    };
    arithmetic_fold("/", initial, operands, divide, |a, b| a / b)
        .map(Value::from)
}

fn builtin_compare_impl<F: Fn(f64, f64) -> bool, G: Fn(i64, i64) -> bool>(numbers: &[Number], int_op: G, double_op: F) -> bool {
    numbers.iter()
        .tuple_windows()
        .all(|(a, b)| match (a, b) {
            (Number::Int(a), Number::Int(b)) => int_op(*a, *b),
            (a, b) => double_op(a.as_f64(), b.as_f64()),
        })
}

fn builtin_compare<F: Fn(f64, f64) -> bool, G: Fn(i64, i64) -> bool>(procedure: &str, values: Vec<Value>, int_op: G, double_op: F) -> EvaluationResult {
    expect_arity(procedure, &values, Arity::AtLeast(2))?;
    let numbers = values_to_numbers(procedure, &values)?;
    Ok(Value::Bool(builtin_compare_impl(&numbers, int_op, double_op)))
}

fn builtin_equal(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    builtin_compare("=", values, |a, b| a == b, |a, b| a == b)
}

fn builtin_less(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    builtin_compare("<", values, |a, b| a < b, |a, b| a < b)
}

fn builtin_less_eq(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    builtin_compare("<=", values, |a, b| a <= b, |a, b| a <= b)
}

fn builtin_greater(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    builtin_compare(">", values, |a, b| a > b, |a, b| a > b)
}

fn builtin_greater_eq(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    builtin_compare(">=", values, |a, b| a >= b, |a, b| a >= b)
}

fn builtin_floor(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    expect_arity("floor", &values, Arity::Exactly(1))?;
    match &values[0] {
        Value::Int(value) => Ok(Value::Int(*value)),
        // `i64::MAX as f64` rounds up to 2^63, which is already out of range
        Value::Double(value) if value.is_finite() && (i64::MIN as f64..i64::MAX as f64).contains(&value.floor())
            => Ok(Value::Int(value.floor() as i64)),
        Value::Double(_) => Err(SchemeError::Overflow { procedure: "floor".to_owned() }),
        other => Err(SchemeError::type_error("floor", "a number", other)),
    }
}

fn builtin_eq(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    // Atoms, symbols and strings compare by value. Pairs and procedures are never `eq?`,
    // not even to themselves, since cells carry no identity here
    expect_arity("eq?", &values, Arity::Exactly(2))?;
    let result = match (&values[0], &values[1]) {
        (Value::Symbol(a), Value::Symbol(b)) | (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Double(a), Value::Double(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Null, Value::Null) => true,
        _ => false,
    };
    Ok(Value::Bool(result))
}

fn builtin_not(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    expect_arity("not", &values, Arity::Exactly(1))?;
    Ok(Value::Bool(!values[0].is_truthy()))
}

fn predicate(procedure: &str, values: &[Value], test: impl Fn(&Value) -> bool) -> EvaluationResult {
    expect_arity(procedure, values, Arity::Exactly(1))?;
    Ok(Value::Bool(test(&values[0])))
}

fn builtin_is_null(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    predicate("null?", &values, Value::is_null)
}

fn builtin_is_pair(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    predicate("pair?", &values, |value| matches!(value, Value::Pair(_)))
}

fn builtin_is_list(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    predicate("list?", &values, Value::is_list)
}

fn builtin_is_integer(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    predicate("integer?", &values, |value| match value {
        Value::Int(_) => true,
        Value::Double(value) => value.floor() == *value,
        _ => false,
    })
}

fn builtin_is_double(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    predicate("double?", &values, |value| matches!(value, Value::Double(_)))
}

fn builtin_is_boolean(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    predicate("boolean?", &values, |value| matches!(value, Value::Bool(_)))
}

fn builtin_is_symbol(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    predicate("symbol?", &values, |value| matches!(value, Value::Symbol(_)))
}

fn builtin_is_string(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    predicate("string?", &values, |value| matches!(value, Value::Str(_)))
}

fn builtin_is_procedure(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    predicate("procedure?", &values, Value::is_procedure)
}

fn builtin_cons(mut values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    expect_arity("cons", &values, Arity::Exactly(2))?;
    let cdr = values.pop().unwrap_or(Value::Null);
    let car = values.pop().unwrap_or(Value::Null);
    Ok(Value::cons(car, cdr))
}

fn builtin_car(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    expect_arity("car", &values, Arity::Exactly(1))?;
    values[0].car("car")
}

fn builtin_cdr(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    expect_arity("cdr", &values, Arity::Exactly(1))?;
    values[0].cdr("cdr")
}

fn builtin_list(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    Ok(Value::list(values))
}

fn builtin_length(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    expect_arity("length", &values, Arity::Exactly(1))?;
    let length = values[0].length("length")?;
    i64::try_from(length)
        .map(Value::Int)
        .map_err(|_| SchemeError::Overflow { procedure: "length".to_owned() })
}

fn builtin_reverse(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    expect_arity("reverse", &values, Arity::Exactly(1))?;
    values[0].reversed("reverse")
}

fn builtin_append(mut values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    // Every argument but the last is copied; the last one becomes the shared tail
    let Some(tail) = values.pop() else { return Ok(Value::Null) };

    values.iter()
        .rev()
        .try_fold(tail, |tail, list| Ok(Value::list_with_tail(list.to_vec("append")?, tail)))
}

fn builtin_apply(values: Vec<Value>, frame: &Frame) -> EvaluationResult {
    expect_arity("apply", &values, Arity::Exactly(2))?;

    let procedure = &values[0];
    if !procedure.is_procedure() {
        return Err(SchemeError::type_error("apply", "a procedure", procedure))
    }
    let arguments = values[1].to_vec("apply")
        .map_err(|_| SchemeError::type_error("apply", "a list of arguments", &values[1]))?;

    apply(procedure, arguments, frame)
}

fn expect_procedure<'v>(procedure: &str, value: &'v Value) -> Result<&'v Value, SchemeError> {
    if !value.is_procedure() {
        return Err(SchemeError::type_error(procedure, "a procedure", value))
    }
    Ok(value)
}

fn builtin_map(values: Vec<Value>, frame: &Frame) -> EvaluationResult {
    expect_arity("map", &values, Arity::Exactly(2))?;
    let function = expect_procedure("map", &values[0])?;

    let mapped = values[1].to_vec("map")?
        .into_iter()
        .map(|value| apply_operand(function, vec![value], frame))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::list(mapped))
}

fn builtin_filter(values: Vec<Value>, frame: &Frame) -> EvaluationResult {
    expect_arity("filter", &values, Arity::Exactly(2))?;
    let function = expect_procedure("filter", &values[0])?;

    let mut kept = Vec::new();
    for value in values[1].to_vec("filter")? {
        if apply_operand(function, vec![value.clone()], frame)?.is_truthy() {
            kept.push(value);
        }
    }
    Ok(Value::list(kept))
}

fn builtin_reduce(values: Vec<Value>, frame: &Frame) -> EvaluationResult {
    expect_arity("reduce", &values, Arity::Exactly(3))?;
    let function = expect_procedure("reduce", &values[0])?;

    values[1].to_vec("reduce")?
        .into_iter()
        .try_fold(values[2].clone(), |accumulator, value| apply_operand(function, vec![accumulator, value], frame))
}

fn builtin_load(values: Vec<Value>, frame: &Frame) -> EvaluationResult {
    expect_arity("load", &values, Arity::Exactly(1))?;
    let Value::Str(path) = &values[0] else {
        return Err(SchemeError::type_error("load", "a file path string", &values[0]))
    };

    run_file(Path::new(&**path), &frame.root_frame())?;
    Ok(Value::Void)
}

const BUILTINS: &[(&str, PrimitiveFn)] = &[
    ("+", builtin_add),
    ("-", builtin_sub),
    ("*", builtin_mul),
    ("/", builtin_div),
    ("=", builtin_equal),
    ("<", builtin_less),
    ("<=", builtin_less_eq),
    (">", builtin_greater),
    (">=", builtin_greater_eq),
    ("floor", builtin_floor),

    ("eq?", builtin_eq),
    ("not", builtin_not),
    ("null?", builtin_is_null),
    ("pair?", builtin_is_pair),
    ("list?", builtin_is_list),
    ("integer?", builtin_is_integer),
    ("double?", builtin_is_double),
    ("boolean?", builtin_is_boolean),
    ("symbol?", builtin_is_symbol),
    ("string?", builtin_is_string),
    ("procedure?", builtin_is_procedure),

    ("cons", builtin_cons),
    ("car", builtin_car),
    ("cdr", builtin_cdr),
    ("list", builtin_list),
    ("length", builtin_length),
    ("reverse", builtin_reverse),
    ("append", builtin_append),

    ("apply", builtin_apply),
    ("map", builtin_map),
    ("filter", builtin_filter),
    ("reduce", builtin_reduce),
    ("load", builtin_load),
];

/// Binds every primitive into `frame`, which should be the global frame.
pub(crate) fn bind_builtins(frame: &Frame) {
    for (name, function) in BUILTINS {
        frame.bind(*name, Value::Primitive(Primitive { name: *name, function: *function }));
    }
}
