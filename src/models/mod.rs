pub mod nlp;
pub mod redaction;
pub mod span;
pub mod transcript;

pub use nlp::*;
pub use redaction::*;
pub use span::*;
pub use transcript::*;
