use core::fmt;

use crate::value::Value;

/// How many arguments a procedure or special form accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, given: usize) -> bool {
        match self {
            Self::Exactly(expected) => given == *expected,
            Self::AtLeast(minimum) => given >= *minimum,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(expected) => write!(f, "{}", expected),
            Self::AtLeast(minimum) => write!(f, "at least {}", minimum),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemeError {
    #[error("Syntax Error: {0}")]
    Syntax(String),

    #[error("Arity Mismatch: `{}` expects {expected} argument(s); {given} given", .procedure.as_deref().unwrap_or("#<procedure>"))]
    ArityMismatch {
        procedure: Option<String>,
        expected: Arity,
        given: usize,
    },

    #[error("Frame Error: Unbound variable `{0}`.")]
    UnboundVariable(String),

    #[error("Evaluation Error: Missing procedure; probably `()`.")]
    NoProcedure,

    #[error("Evaluation Error: Tried to apply a value which is not a procedure; found `{0}`.")]
    NotAProcedure(String),

    #[error("Value Error: `{operation}` expected a proper list; found a value of type {found}.")]
    NotAList { operation: String, found: &'static str },

    #[error("Value Error: `{procedure}` expected a Pair; found a value of type {found}.")]
    NotAPair { procedure: String, found: &'static str },

    #[error("Evaluation Error: Formal parameters invalid: {0}.")]
    InvalidFormals(String),

    #[error("Evaluation Error: Malformed `{form}`: {reason}")]
    MalformedSpecialForm { form: String, reason: String },

    #[error("Type Error: `{procedure}` expected {expected}; found `{found}` of type {found_type}.")]
    TypeError {
        procedure: String,
        expected: String,
        found: String,
        found_type: &'static str,
    },

    #[error("Math Error: Division by zero.")]
    DivideByZero,

    #[error("Evaluation Error: Duplicate identifier in `let`: `{0}`.")]
    DuplicateBinding(String),

    #[error("Evaluation Error: A definition or other non-value was used as an operand.")]
    VoidOperand,

    #[error("Math Error: Integer overflow in `{procedure}`.")]
    Overflow { procedure: String },

    #[error("Load Error: Could not load `{path}`: {reason}")]
    Load { path: String, reason: String },
}

impl SchemeError {
    pub fn arity(procedure: &str, expected: Arity, given: usize) -> Self {
        Self::ArityMismatch {
            procedure: Some(procedure.to_owned()),
            expected,
            given,
        }
    }

    pub fn malformed(form: &str, reason: impl Into<String>) -> Self {
        Self::MalformedSpecialForm {
            form: form.to_owned(),
            reason: reason.into(),
        }
    }

    pub fn type_error(procedure: &str, expected: &str, found: &Value) -> Self {
        Self::TypeError {
            procedure: procedure.to_owned(),
            expected: expected.to_owned(),
            found: found.to_string(),
            found_type: found.type_name(),
        }
    }

    pub fn not_a_procedure(found: &Value) -> Self {
        Self::NotAProcedure(found.to_string())
    }

    pub fn not_a_list(operation: &str, found: &Value) -> Self {
        Self::NotAList {
            operation: operation.to_owned(),
            found: found.type_name(),
        }
    }

    pub fn not_a_pair(procedure: &str, found: &Value) -> Self {
        Self::NotAPair {
            procedure: procedure.to_owned(),
            found: found.type_name(),
        }
    }

    /// Stable name of the error kind, independent of the message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Syntax(_) => "Syntax",
            Self::ArityMismatch { .. } => "ArityMismatch",
            Self::UnboundVariable(_) => "UnboundVariable",
            Self::NoProcedure => "NoProcedure",
            Self::NotAProcedure(_) => "NotAProcedure",
            Self::NotAList { .. } => "NotAList",
            Self::NotAPair { .. } => "NotAPair",
            Self::InvalidFormals(_) => "InvalidFormals",
            Self::MalformedSpecialForm { .. } => "MalformedSpecialForm",
            Self::TypeError { .. } => "TypeError",
            Self::DivideByZero => "DivideByZero",
            Self::DuplicateBinding(_) => "DuplicateBinding",
            Self::VoidOperand => "VoidOperand",
            Self::Overflow { .. } => "Overflow",
            Self::Load { .. } => "Load",
        }
    }
}
