//! Color tokens: detection, swatch values and rewriting

pub mod color;
pub mod scanner;
pub mod substitute;
pub mod tailwind;

pub use color::Color;
pub use scanner::{scan, ColorToken, TokenKind};
pub use substitute::{substitute, substitute_text, Substitution, SubstitutionReport};
