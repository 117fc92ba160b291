//! Shell-style word splitting.
//!
//! Splits a single command-line string into words the way a POSIX shell
//! would, without any expansion: whitespace separates words, single quotes
//! are literal, double quotes allow backslash escapes, and a backslash
//! outside quotes escapes the next character.

use crate::error::LexError;

/// Splits `input` into shell words.
///
/// # Examples
///
/// ```
/// use invocation_options::split;
///
/// let words = split(r#"render "as table" --sort='a b' x\ y"#).unwrap();
/// assert_eq!(words, vec!["render", "as table", "--sort=a b", "x y"]);
/// ```
///
/// # Errors
///
/// Returns [`LexError::UnterminatedQuote`] for an unclosed quote and
/// [`LexError::TrailingEscape`] when the input ends with a lone backslash.
pub fn split(input: &str) -> Result<Vec<String>, LexError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        match ch {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(LexError::UnterminatedQuote('\'')),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\' | '$' | '`')) => current.push(c),
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            }
                            None => return Err(LexError::UnterminatedQuote('"')),
                        },
                        Some(c) => current.push(c),
                        None => return Err(LexError::UnterminatedQuote('"')),
                    }
                }
            }
            '\\' => {
                in_word = true;
                let Some(next) = chars.next() else {
                    return Err(LexError::TrailingEscape);
                };
                current.push(next);
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }

    if in_word {
        words.push(current);
    }

    Ok(words)
}

/// Splits on runs of whitespace only, with no quote handling.
pub fn split_whitespace(input: &str) -> Vec<String> {
    input.split_whitespace().map(String::from).collect()
}

/// Joins words into a string that [`split`] turns back into the same words.
///
/// # Examples
///
/// ```
/// use invocation_options::{join, split};
///
/// let words = vec!["echo".to_string(), "it's here".to_string(), String::new()];
/// let line = join(&words);
/// assert_eq!(split(&line).unwrap(), words);
/// ```
pub fn join<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(|w| quote(w.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote(word: &str) -> String {
    if word.is_empty() {
        return "''".to_string();
    }
    let plain = word
        .chars()
        .all(|c| !c.is_whitespace() && !matches!(c, '\'' | '"' | '\\'));
    if plain {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', r"'\''"))
}
