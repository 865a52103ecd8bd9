//! Abstract Syntax Tree for GCode
//!
//! Clean, minimal types representing parsed GCode structure.
//! No machine semantics - pure data representation.

use crate::parser::lexer::{Token, TokenKind};

/// A parsed line of GCode
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    /// A line carrying at least one word, with an optional comment
    Words(WordLine),
    /// A comment-only line
    Comment(Comment),
    /// An empty or whitespace-only line
    Empty,
}

/// The semantic content of one program line
#[derive(Debug, Clone, PartialEq)]
pub struct WordLine {
    /// Ordered letter+value words (e.g. G1, X10, F1500)
    pub words: Vec<Word>,
    /// Optional trailing comment
    pub comment: Option<Comment>,
    /// Raw line text as it appeared in the program
    pub raw: String,
}

/// A single word like "X10.5" or "G1"
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Word {
    /// Word letter (e.g. 'X', 'G', 'F'), always uppercase
    pub letter: char,
    /// Numeric value following the letter
    pub value: f64,
}

/// A comment (semicolon or parenthetical)
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// Comment text (without the delimiters)
    pub text: String,
}

/// Convert tokens into a parsed line
pub fn tokens_to_parsed_line(tokens: Vec<Token>, raw: &str) -> ParsedLine {
    if tokens.is_empty() {
        return ParsedLine::Empty;
    }

    let words: Vec<Word> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Word)
        .filter_map(|t| parse_word_token(&t.text))
        .collect();

    let comment = tokens
        .iter()
        .find(|t| t.kind == TokenKind::Comment)
        .map(|t| Comment {
            text: extract_comment_text(&t.text),
        });

    if words.is_empty() {
        return match comment {
            Some(comment) => ParsedLine::Comment(comment),
            None => ParsedLine::Empty,
        };
    }

    ParsedLine::Words(WordLine {
        words,
        comment,
        raw: raw.to_string(),
    })
}

/// Parse a word token like "X10.5" into a Word
///
/// Words with an unparsable or missing value are dropped; the machine
/// model treats them as absent from the line.
fn parse_word_token(text: &str) -> Option<Word> {
    if text.len() < 2 {
        return None;
    }

    let mut chars = text.chars();
    let letter = chars.next()?;

    if !letter.is_ascii_alphabetic() {
        return None;
    }

    let value = chars.collect::<String>().parse::<f64>().ok()?;

    Some(Word { letter, value })
}

/// Extract comment text, removing delimiters
fn extract_comment_text(text: &str) -> String {
    if let Some(stripped) = text.strip_prefix(';') {
        stripped.to_string()
    } else if text.starts_with('(') && text.ends_with(')') {
        text[1..text.len() - 1].to_string()
    } else {
        text.to_string()
    }
}
