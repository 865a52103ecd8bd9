//! GCode Lexer
//!
//! Fast, simple tokenization of GCode lines into letter+number words.
//! Packed lines without spaces ("G1X10Y-2.5") split at each letter.

/// Token types in GCode
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    /// A word like "G1", "X10.5", "F1500"
    Word,
    /// Comment (semicolon or parenthetical)
    Comment,
}

/// A token with its text content
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

type CharStream<'a> = std::iter::Peekable<std::str::CharIndices<'a>>;

/// Tokenize a line of GCode into tokens
pub fn tokenize_line(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();

    while let Some((start, ch)) = chars.next() {
        if ch.is_whitespace() {
            continue;
        }

        if ch == ';' {
            // Semicolon comment runs to the end of the line
            tokens.push(Token {
                kind: TokenKind::Comment,
                text: line[start..].to_string(),
            });
            break;
        }

        let token = if ch == '(' {
            Some(scan_paren_comment(line, start, &mut chars))
        } else if ch.is_ascii_alphabetic() {
            Some(scan_word(line, start, &mut chars))
        } else {
            // Anything else is not word-address input; the raw line is
            // still visible to the denylist upstream
            None
        };

        if let Some(token) = token {
            tokens.push(token);
        }
    }

    tokens
}

/// Scan a parenthetical comment, tolerating a missing close paren
fn scan_paren_comment(line: &str, start: usize, chars: &mut CharStream<'_>) -> Token {
    let mut end = line.len();
    for (idx, ch) in chars.by_ref() {
        if ch == ')' {
            end = idx + 1;
            break;
        }
    }
    Token {
        kind: TokenKind::Comment,
        text: line[start..end].to_string(),
    }
}

/// Scan one letter-address word: a letter, then number characters up
/// to the next letter
fn scan_word(line: &str, start: usize, chars: &mut CharStream<'_>) -> Token {
    let mut end = start + 1;
    while let Some(&(idx, ch)) = chars.peek() {
        if ch.is_ascii_digit() || ch == '.' || ch == '-' || ch == '+' {
            end = idx + 1;
            chars.next();
        } else {
            break;
        }
    }

    let mut text = line[start..end].to_string();
    text.make_ascii_uppercase();
    Token {
        kind: TokenKind::Word,
        text,
    }
}
