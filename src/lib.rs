mod builtin;
mod config;
mod context;
mod error;
mod frame;
mod interpreter;
mod parser;
mod trace;
mod value;

#[cfg(test)]
mod test_utils;

pub use config::Config;
pub use context::EvaluationContext;
pub use error::{Arity, SchemeError};
pub use frame::Frame;
pub use interpreter::{apply, evaluate};
pub use parser::{is_balanced, parse};
pub use value::{Closure, EvaluationResult, Formals, Primitive, PrimitiveFn, Value};
