//! GCode Parser
//!
//! Clean, fast parsing of GCode with minimal allocations.
//! Focused solely on tokenization and word extraction.

pub mod ast;
pub mod lexer;

pub use ast::{Comment, ParsedLine, Word, WordLine};
pub use lexer::{tokenize_line, Token, TokenKind};

/// Parse a single line of GCode into structured data
///
/// This is the main entry point for parsing. It tokenizes the line
/// and constructs the word-level representation the replay engine
/// consumes.
pub fn parse_line(line: &str) -> ParsedLine {
    let tokens = lexer::tokenize_line(line);
    ast::tokens_to_parsed_line(tokens, line)
}
