//! The component-script subset evaluated by the preview sandbox
//!
//! Scripts are parsed into a small tree ([`ast`]) and walked directly. Code
//! the evaluator does not model is kept as opaque source text and surfaces as
//! placeholders in the rendered output rather than as errors.

pub mod ast;
mod evaluator;
pub mod parser;
mod value;

pub use evaluator::{evaluate, MAX_CALL_DEPTH};
pub use parser::{parse, ParseError};
pub use value::{Closure, Value};
