//! PGN reading: tokenizer, SAN resolution and game assembly.

pub mod lexer;
pub mod parser;
pub mod san;

pub use parser::{load_from_file, parse_all, PgnCollection, PgnError, SkipReason, SkippedGame};
pub use san::{parse_san, SanError};
