use schemer::{Arity, EvaluationContext, EvaluationResult, Frame, Primitive, SchemeError, Value};

fn string_length(values: Vec<Value>, _frame: &Frame) -> EvaluationResult {
    match values.as_slice() {
        [Value::Str(text)] => Ok(Value::Int(text.chars().count() as i64)),
        [other] => Err(SchemeError::type_error("string-length", "a string", other)),
        _ => Err(SchemeError::arity("string-length", Arity::Exactly(1), values.len())),
    }
}

fn main() -> anyhow::Result<()> {
    let program = [
        "(define (spam) (* eggs 3))",
        "(spam)",
        "(define eggs 20)",
        "(spam)",
        "(string-length \"schemer\")",
        "(map string-length '(\"a\" \"bc\"))",
    ];

    let mut context = EvaluationContext::new();
    context.global_frame().bind(
        "string-length",
        Value::Primitive(Primitive { name: "string-length", function: string_length }),
    );

    for source in program {
        match context.evaluate_str(source) {
            Ok(values) => println!("{}: {}", source, EvaluationContext::render(&values)),
            Err(err) => println!("{}: {}", source, err),
        }
    }

    let expression = Value::list([Value::symbol("spam")]);
    println!("(spam) as a value: {}", context.evaluate(&expression)?);

    Ok(())
}
