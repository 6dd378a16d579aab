//! Shell-like splitting of a raw command line into tokens.
//!
//! Purely lexical: no option or argument semantics are applied here.

/// Tokens of a (possibly partial) command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenizedLine {
    pub tokens: Vec<String>,
    /// The line ended in unquoted whitespace (or was empty), so the next
    /// character would start a new token.
    pub trailing_separator: bool,
}

/// Split `input` on unquoted whitespace, stripping single/double quotes.
pub fn tokenize(input: &str) -> Vec<String> {
    tokenize_prefix(input).tokens
}

/// Like [`tokenize`], also reporting whether the line ends between tokens.
pub fn tokenize_prefix(input: &str) -> TokenizedLine {
    let mut tokens = Vec::new();
    // `None` until something (even an empty quoted span) starts a token.
    let mut current: Option<String> = None;
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            c if c.is_whitespace() => {
                if let Some(token) = current.take() {
                    tokens.push(token);
                }
            }
            '\\' => {
                if let Some(next) = chars.next() {
                    current.get_or_insert_with(String::new).push(next);
                }
            }
            '"' | '\'' => {
                let quote = ch;
                let token = current.get_or_insert_with(String::new);
                while let Some(c) = chars.next() {
                    if c == quote {
                        break;
                    }
                    if c == '\\' {
                        match chars.peek() {
                            Some(&next) if next == quote || next == '\\' => {
                                token.push(next);
                                chars.next();
                            }
                            _ => token.push(c),
                        }
                        continue;
                    }
                    token.push(c);
                }
            }
            c => current.get_or_insert_with(String::new).push(c),
        }
    }

    let trailing_separator = current.is_none();
    if let Some(token) = current {
        tokens.push(token);
    }

    TokenizedLine {
        tokens,
        trailing_separator,
    }
}
