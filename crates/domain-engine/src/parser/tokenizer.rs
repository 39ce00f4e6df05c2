//! Shell-like tokenizer for filter text.
//!
//! Whitespace separates words, `"` quotes a word that contains separators and
//! `\` escapes the next character. The characters `: > < = ! " ; ( )` are
//! punctuation: outside quotes each one always forms a token of its own.
//!
//! Inside quotes a backslash only escapes `"` and `\`; before any other
//! character it is kept, so `"50\%"` stays `50\%`.

use crate::error::{ParseError, ParseResult};

const QUOTE: char = '"';
const ESCAPE: char = '\\';

/// Characters that always form a token of their own outside quotes.
pub const PUNCTUATION: [char; 9] = [':', '>', '<', '=', '!', '"', ';', '(', ')'];

/// Returns true for punctuation characters.
pub fn is_punctuation(c: char) -> bool {
    PUNCTUATION.contains(&c)
}

/// A word of filter text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The text with quotes and escapes removed.
    pub text: String,
    /// True if any part of the token was quoted.
    pub quoted: bool,
    /// Character offset where the token starts.
    pub position: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, quoted: bool, position: usize) -> Self {
        Self {
            text: text.into(),
            quoted,
            position,
        }
    }

    /// Returns true if this is the unquoted symbol `symbol`.
    ///
    /// Quoted tokens never act as punctuation or operators.
    pub fn is(&self, symbol: &str) -> bool {
        !self.quoted && self.text == symbol
    }
}

/// Where an escaped character returns to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resume {
    Word,
    Quoted { opened_at: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Separator,
    Word,
    Quoted { opened_at: usize },
    Escaped { at: usize, prior: Resume },
}

/// Lazy tokenizer over filter text.
///
/// Yields `Ok(token)` until the input is exhausted. An unterminated quote or
/// a trailing escape yields a single `Err`, after which the iterator is done.
///
/// # Example
///
/// ```
/// use domain_engine_rs::parser::Tokenizer;
///
/// let words: Vec<String> = Tokenizer::new(r#"Name: "John Doe" (a|b)"#)
///     .map(|token| token.unwrap().text)
///     .collect();
/// assert_eq!(words, vec!["Name", ":", "John Doe", "(", "a|b", ")"]);
/// ```
pub struct Tokenizer {
    chars: Vec<char>,
    position: usize,
    finished: bool,
}

impl Tokenizer {
    /// Creates a new tokenizer for the given input string.
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            position: 0,
            finished: false,
        }
    }

    /// Tokenizes the whole input.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::NoClosingQuotation`] or
    /// [`ParseError::NoEscapedCharacter`] if the input ends inside a quote or
    /// right after an escape.
    pub fn tokenize(input: &str) -> ParseResult<Vec<Token>> {
        Tokenizer::new(input).collect()
    }

    /// Peeks at the next character without consuming it.
    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    /// Consumes the next character.
    fn advance(&mut self) {
        self.position += 1;
    }

    fn next_token(&mut self) -> ParseResult<Option<Token>> {
        let mut state = State::Separator;
        let mut text = String::new();
        let mut quoted = false;
        let mut start = self.position;

        loop {
            let Some(c) = self.peek() else {
                return match state {
                    State::Separator => Ok(None),
                    State::Word => Ok(Some(Token::new(text, quoted, start))),
                    State::Quoted { opened_at } => {
                        Err(ParseError::NoClosingQuotation { position: opened_at })
                    }
                    State::Escaped { at, .. } => Err(ParseError::NoEscapedCharacter { position: at }),
                };
            };

            match state {
                State::Separator => {
                    if c.is_whitespace() {
                        self.advance();
                        continue;
                    }
                    start = self.position;
                    self.advance();
                    if c == QUOTE {
                        quoted = true;
                        state = State::Quoted { opened_at: start };
                    } else if c == ESCAPE {
                        state = State::Escaped {
                            at: start,
                            prior: Resume::Word,
                        };
                    } else if is_punctuation(c) {
                        return Ok(Some(Token::new(c.to_string(), false, start)));
                    } else {
                        text.push(c);
                        state = State::Word;
                    }
                }
                State::Word => {
                    if c.is_whitespace() {
                        self.advance();
                        return Ok(Some(Token::new(text, quoted, start)));
                    }
                    if c == QUOTE {
                        self.advance();
                        quoted = true;
                        state = State::Quoted {
                            opened_at: self.position - 1,
                        };
                    } else if c == ESCAPE {
                        self.advance();
                        state = State::Escaped {
                            at: self.position - 1,
                            prior: Resume::Word,
                        };
                    } else if is_punctuation(c) {
                        // left for the next token
                        return Ok(Some(Token::new(text, quoted, start)));
                    } else {
                        self.advance();
                        text.push(c);
                    }
                }
                State::Quoted { opened_at } => {
                    self.advance();
                    if c == QUOTE {
                        state = State::Word;
                    } else if c == ESCAPE {
                        state = State::Escaped {
                            at: self.position - 1,
                            prior: Resume::Quoted { opened_at },
                        };
                    } else {
                        text.push(c);
                    }
                }
                State::Escaped { prior, .. } => {
                    self.advance();
                    match prior {
                        Resume::Word => state = State::Word,
                        Resume::Quoted { opened_at } => {
                            if c != QUOTE && c != ESCAPE {
                                text.push(ESCAPE);
                            }
                            state = State::Quoted { opened_at };
                        }
                    }
                    text.push(c);
                }
            }
        }
    }
}

impl Iterator for Tokenizer {
    type Item = ParseResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_token() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
