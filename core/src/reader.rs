//! Cursor-based reader over raw command input.
//!
//! Argument parsers consume input through a [`StringReader`], which tracks
//! the byte cursor so that parse errors can point at the exact position
//! where input stopped making sense.

use crate::error::ParseError;

/// Token separator between command path steps.
pub const ARGUMENT_SEPARATOR: char = ' ';

/// Reads command input left to right.
///
/// # Examples
///
/// ```
/// use command_tree_core::StringReader;
///
/// let mut reader = StringReader::new("give 64 \"diamond sword\"");
/// assert_eq!(reader.read_unquoted(), "give");
/// reader.skip();
/// assert_eq!(reader.read_int().unwrap(), 64);
/// reader.skip();
/// assert_eq!(reader.read_string().unwrap(), "diamond sword");
/// assert!(!reader.can_read());
/// ```
#[derive(Debug, Clone)]
pub struct StringReader<'a> {
    input: &'a str,
    cursor: usize,
}

impl<'a> StringReader<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, cursor: 0 }
    }

    /// Creates a reader positioned at `cursor`.
    pub fn at(input: &'a str, cursor: usize) -> Self {
        Self {
            input,
            cursor: cursor.min(input.len()),
        }
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.input.len());
    }

    /// Returns the text that has not been consumed yet.
    pub fn remaining(&self) -> &'a str {
        &self.input[self.cursor..]
    }

    /// Returns the text consumed so far.
    pub fn consumed(&self) -> &'a str {
        &self.input[..self.cursor]
    }

    pub fn can_read(&self) -> bool {
        self.cursor < self.input.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Advances past the next character.
    pub fn skip(&mut self) {
        if let Some(c) = self.peek() {
            self.cursor += c.len_utf8();
        }
    }

    pub fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.skip();
        }
    }

    /// Returns `true` if `c` may appear in an unquoted word.
    pub fn is_allowed_in_unquoted(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+')
    }

    /// Reads a run of unquoted-word characters (possibly empty).
    pub fn read_unquoted(&mut self) -> &'a str {
        let start = self.cursor;
        while self.peek().is_some_and(Self::is_allowed_in_unquoted) {
            self.skip();
        }
        &self.input[start..self.cursor]
    }

    /// Reads everything up to the next separator or the end of input.
    pub fn read_until_separator(&mut self) -> &'a str {
        let start = self.cursor;
        while self.peek().is_some_and(|c| c != ARGUMENT_SEPARATOR) {
            self.skip();
        }
        &self.input[start..self.cursor]
    }

    /// Consumes the rest of the input.
    pub fn read_remaining(&mut self) -> &'a str {
        let rest = self.remaining();
        self.cursor = self.input.len();
        rest
    }

    /// Reads a quoted string, processing `\` escapes.
    pub fn read_quoted(&mut self) -> Result<String, ParseError> {
        let Some(quote) = self.peek().filter(|c| is_quote(*c)) else {
            return Err(ParseError::new("Expected quote to start a string", self));
        };
        self.skip();

        let mut result = String::new();
        let mut escaped = false;
        while let Some(c) = self.peek() {
            self.skip();
            if escaped {
                if c == quote || c == '\\' {
                    result.push(c);
                    escaped = false;
                } else {
                    self.cursor -= c.len_utf8();
                    return Err(ParseError::new(
                        format!("Invalid escape sequence '{c}' in quoted string"),
                        self,
                    ));
                }
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                return Ok(result);
            } else {
                result.push(c);
            }
        }

        Err(ParseError::new("Unclosed quoted string", self))
    }

    /// Reads a quoted string, or an unquoted word when no quote is present.
    pub fn read_string(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Some(c) if is_quote(c) => self.read_quoted(),
            _ => Ok(self.read_unquoted().to_string()),
        }
    }

    pub fn read_int(&mut self) -> Result<i64, ParseError> {
        let start = self.cursor;
        let raw = self.read_number_chars();
        if raw.is_empty() {
            return Err(ParseError::new("Expected integer", self));
        }
        raw.parse::<i64>().map_err(|_| {
            self.cursor = start;
            ParseError::new(format!("Invalid integer '{raw}'"), self)
        })
    }

    pub fn read_float(&mut self) -> Result<f64, ParseError> {
        let start = self.cursor;
        let raw = self.read_number_chars();
        if raw.is_empty() {
            return Err(ParseError::new("Expected float", self));
        }
        raw.parse::<f64>().map_err(|_| {
            self.cursor = start;
            ParseError::new(format!("Invalid float '{raw}'"), self)
        })
    }

    pub fn read_bool(&mut self) -> Result<bool, ParseError> {
        let start = self.cursor;
        let raw = self.read_unquoted();
        match raw {
            "" => Err(ParseError::new("Expected bool", self)),
            "true" => Ok(true),
            "false" => Ok(false),
            other => {
                self.cursor = start;
                Err(ParseError::new(
                    format!("Invalid bool, expected true or false but found '{other}'"),
                    self,
                ))
            }
        }
    }

    fn read_number_chars(&mut self) -> &'a str {
        let start = self.cursor;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || c == '.' || c == '-')
        {
            self.skip();
        }
        &self.input[start..self.cursor]
    }
}

fn is_quote(c: char) -> bool {
    c == '"' || c == '\''
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_quoted_with_escapes() {
        let mut reader = StringReader::new(r#""say \"hi\"" rest"#);
        assert_eq!(reader.read_quoted().unwrap(), r#"say "hi""#);
        assert_eq!(reader.remaining(), " rest");
    }

    #[test]
    fn test_unclosed_quote_is_error() {
        let mut reader = StringReader::new("\"never ends");
        let err = reader.read_quoted().unwrap_err();
        assert_eq!(err.message(), "Unclosed quoted string");
        assert_eq!(err.cursor(), 11);
    }

    #[test]
    fn test_read_int_resets_cursor_on_garbage() {
        let mut reader = StringReader::new("1-2");
        let err = reader.read_int().unwrap_err();
        assert_eq!(err.cursor(), 0);
        assert!(err.message().contains("1-2"));
    }

    #[test]
    fn test_read_bool() {
        let mut reader = StringReader::new("false");
        assert!(!reader.read_bool().unwrap());

        let mut reader = StringReader::new("maybe");
        assert!(reader.read_bool().is_err());
    }

    #[test]
    fn test_read_until_separator() {
        let mut reader = StringReader::new("foo:bar baz");
        assert_eq!(reader.read_until_separator(), "foo:bar");
        assert_eq!(reader.peek(), Some(' '));
    }
}
