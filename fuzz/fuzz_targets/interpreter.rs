#![no_main]

use core::fmt;

use itertools::Itertools;
use libfuzzer_sys::{arbitrary::Arbitrary, fuzz_target};

// Primitives, literals and variable references
#[derive(Arbitrary, Debug)]
enum SchemeAtom {
    Add, Sub, Mul, Div,
    True, False, Empty,
    Greater, GreaterEq,
    Less, LessEq, NumEq, Eq,
    Floor, Not,

    List, Cons, Car, Cdr, Length,
    Reverse, Append, Apply,
    Map, Filter, Reduce,

    Identifier(u8),
    Integer(i64),
    Double(f64),
}

impl fmt::Display for SchemeAtom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            SchemeAtom::Add => "+",
            SchemeAtom::Sub => "-",
            SchemeAtom::Mul => "*",
            SchemeAtom::Div => "/",
            SchemeAtom::True => "#t",
            SchemeAtom::False => "#f",
            SchemeAtom::Empty => "'()",
            SchemeAtom::Greater => ">",
            SchemeAtom::GreaterEq => ">=",
            SchemeAtom::Less => "<",
            SchemeAtom::LessEq => "<=",
            SchemeAtom::NumEq => "=",
            SchemeAtom::Eq => "eq?",
            SchemeAtom::Floor => "floor",
            SchemeAtom::Not => "not",
            SchemeAtom::List => "list",
            SchemeAtom::Cons => "cons",
            SchemeAtom::Car => "car",
            SchemeAtom::Cdr => "cdr",
            SchemeAtom::Length => "length",
            SchemeAtom::Reverse => "reverse",
            SchemeAtom::Append => "append",
            SchemeAtom::Apply => "apply",
            SchemeAtom::Map => "map",
            SchemeAtom::Filter => "filter",
            SchemeAtom::Reduce => "reduce",
            // A handful of names so definitions and references collide
            SchemeAtom::Identifier(index) => return write!(f, "v{}", index % 8),
            SchemeAtom::Integer(value) => return write!(f, "{}", value),
            SchemeAtom::Double(value) if value.is_finite() => return write!(f, "{:?}", value),
            SchemeAtom::Double(_) => "0.5",
        })
    }
}

#[derive(Arbitrary, Debug)]
enum SchemeCommand {
    If(Vec<SchemeCommand>),
    Quote(Vec<SchemeCommand>),
    Let(Vec<SchemeCommand>),
    LetStar(Vec<SchemeCommand>),
    Letrec(Vec<SchemeCommand>),
    Define(Vec<SchemeCommand>),
    Lambda(Vec<SchemeCommand>),
    And(Vec<SchemeCommand>),
    Or(Vec<SchemeCommand>),
    Cond(Vec<SchemeCommand>),
    Set(Vec<SchemeCommand>),
    Begin(Vec<SchemeCommand>),
    Application(Vec<SchemeCommand>),

    Atom(SchemeAtom),
}

fn stringify_arguments(values: &[SchemeCommand]) -> String {
    values.iter()
        .map(SchemeCommand::to_string)
        .join(" ")
}

impl fmt::Display for SchemeCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (keyword, args) = match self {
            SchemeCommand::Atom(atom) => return atom.fmt(f),
            SchemeCommand::Application(args) => return write!(f, "({})", stringify_arguments(args)),
            SchemeCommand::If(args) => ("if", args),
            SchemeCommand::Quote(args) => ("quote", args),
            SchemeCommand::Let(args) => ("let", args),
            SchemeCommand::LetStar(args) => ("let*", args),
            SchemeCommand::Letrec(args) => ("letrec", args),
            SchemeCommand::Define(args) => ("define", args),
            SchemeCommand::Lambda(args) => ("lambda", args),
            SchemeCommand::And(args) => ("and", args),
            SchemeCommand::Or(args) => ("or", args),
            SchemeCommand::Cond(args) => ("cond", args),
            SchemeCommand::Set(args) => ("set!", args),
            SchemeCommand::Begin(args) => ("begin", args),
        };

        write!(f, "({} {})", keyword, stringify_arguments(args))
    }
}

fuzz_target!(|commands: Vec<SchemeCommand>| {
    let mut context = schemer::EvaluationContext::new();

    for command in commands {
        let _ = context.evaluate_str(&command.to_string());
    }
});
