//! Built-in argument parsers.
//!
//! Constructors return concrete parser types that plug into
//! [`Token::argument`](crate::Token::argument):
//!
//! ```
//! use command_tree_core::{StringReader, Token, arguments};
//! use command_tree_core::ArgumentParser;
//!
//! let amount = arguments::integer_between(1, 64);
//! let mut reader = StringReader::new("65");
//! let err = amount.parse(&mut reader).unwrap_err();
//! assert_eq!(err.message(), "Integer must not be more than 64, found 65");
//!
//! let token = Token::argument("amount", amount);
//! assert_eq!(token.usage(), "<amount>");
//! ```

use crate::context::ArgValue;
use crate::error::ParseError;
use crate::reader::StringReader;
use crate::token::ArgumentParser;

/// A single unquoted word.
#[derive(Debug, Clone, Copy, Default)]
pub struct Word;

/// A quoted string, or a single word when unquoted.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuotedString;

/// Everything up to the end of the input.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyString;

/// A bounded 64-bit integer.
#[derive(Debug, Clone, Copy)]
pub struct Integer {
    pub min: i64,
    pub max: i64,
}

/// A bounded 64-bit float.
#[derive(Debug, Clone, Copy)]
pub struct Float {
    pub min: f64,
    pub max: f64,
}

/// `true` or `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Boolean;

/// One of a fixed, case-sensitive set of words.
#[derive(Debug, Clone)]
pub struct Choice {
    values: Vec<String>,
}

pub fn word() -> Word {
    Word
}

pub fn string() -> QuotedString {
    QuotedString
}

pub fn greedy_string() -> GreedyString {
    GreedyString
}

pub fn integer() -> Integer {
    integer_between(i64::MIN, i64::MAX)
}

pub fn integer_min(min: i64) -> Integer {
    integer_between(min, i64::MAX)
}

pub fn integer_between(min: i64, max: i64) -> Integer {
    Integer { min, max }
}

pub fn float() -> Float {
    float_between(f64::MIN, f64::MAX)
}

pub fn float_min(min: f64) -> Float {
    float_between(min, f64::MAX)
}

pub fn float_between(min: f64, max: f64) -> Float {
    Float { min, max }
}

pub fn boolean() -> Boolean {
    Boolean
}

pub fn choice<I, S>(values: I) -> Choice
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Choice {
        values: values.into_iter().map(Into::into).collect(),
    }
}

impl ArgumentParser for Word {
    fn parse(&self, reader: &mut StringReader<'_>) -> Result<ArgValue, ParseError> {
        let word = reader.read_unquoted();
        if word.is_empty() {
            return Err(ParseError::new("Expected word", reader));
        }
        Ok(ArgValue::String(word.to_string()))
    }

    fn type_name(&self) -> String {
        "word".into()
    }
}

impl ArgumentParser for QuotedString {
    fn parse(&self, reader: &mut StringReader<'_>) -> Result<ArgValue, ParseError> {
        let start = reader.cursor();
        let value = reader.read_string()?;
        if value.is_empty() && reader.cursor() == start {
            return Err(ParseError::new("Expected string", reader));
        }
        Ok(ArgValue::String(value))
    }

    fn type_name(&self) -> String {
        "string".into()
    }
}

impl ArgumentParser for GreedyString {
    fn parse(&self, reader: &mut StringReader<'_>) -> Result<ArgValue, ParseError> {
        let text = reader.read_remaining();
        if text.is_empty() {
            return Err(ParseError::new("Expected text", reader));
        }
        Ok(ArgValue::String(text.to_string()))
    }

    fn type_name(&self) -> String {
        "greedy_string".into()
    }
}

impl ArgumentParser for Integer {
    fn parse(&self, reader: &mut StringReader<'_>) -> Result<ArgValue, ParseError> {
        let start = reader.cursor();
        let value = reader.read_int()?;
        if value < self.min {
            reader.set_cursor(start);
            return Err(ParseError::new(
                format!("Integer must not be less than {}, found {value}", self.min),
                reader,
            ));
        }
        if value > self.max {
            reader.set_cursor(start);
            return Err(ParseError::new(
                format!("Integer must not be more than {}, found {value}", self.max),
                reader,
            ));
        }
        Ok(ArgValue::Int(value))
    }

    fn type_name(&self) -> String {
        "integer".into()
    }
}

impl ArgumentParser for Float {
    fn parse(&self, reader: &mut StringReader<'_>) -> Result<ArgValue, ParseError> {
        let start = reader.cursor();
        let value = reader.read_float()?;
        if value < self.min {
            reader.set_cursor(start);
            return Err(ParseError::new(
                format!("Float must not be less than {}, found {value}", self.min),
                reader,
            ));
        }
        if value > self.max {
            reader.set_cursor(start);
            return Err(ParseError::new(
                format!("Float must not be more than {}, found {value}", self.max),
                reader,
            ));
        }
        Ok(ArgValue::Float(value))
    }

    fn type_name(&self) -> String {
        "float".into()
    }
}

impl ArgumentParser for Boolean {
    fn parse(&self, reader: &mut StringReader<'_>) -> Result<ArgValue, ParseError> {
        reader.read_bool().map(ArgValue::Bool)
    }

    fn suggestions(&self) -> Vec<String> {
        vec!["true".into(), "false".into()]
    }

    fn type_name(&self) -> String {
        "boolean".into()
    }
}

impl Choice {
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

impl ArgumentParser for Choice {
    fn parse(&self, reader: &mut StringReader<'_>) -> Result<ArgValue, ParseError> {
        let start = reader.cursor();
        let raw = reader.read_unquoted();
        if self.values.iter().any(|v| v == raw) {
            return Ok(ArgValue::String(raw.to_string()));
        }
        reader.set_cursor(start);
        Err(ParseError::new(
            format!("Invalid value '{raw}', expected one of: {}", self.values.join(", ")),
            reader,
        ))
    }

    fn suggestions(&self) -> Vec<String> {
        self.values.clone()
    }

    fn type_name(&self) -> String {
        format!("choice({})", self.values.join("|"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(parser: &dyn ArgumentParser, input: &str) -> Result<(ArgValue, usize), ParseError> {
        let mut reader = StringReader::new(input);
        let value = parser.parse(&mut reader)?;
        Ok((value, reader.cursor()))
    }

    #[test]
    fn test_word_stops_at_space() {
        let (value, cursor) = parse(&word(), "sword of doom").unwrap();
        assert_eq!(value, ArgValue::String("sword".into()));
        assert_eq!(cursor, 5);
    }

    #[test]
    fn test_word_rejects_empty() {
        let err = parse(&word(), "").unwrap_err();
        assert_eq!(err.message(), "Expected word");
    }

    #[test]
    fn test_quoted_string_allows_spaces() {
        let (value, _) = parse(&string(), "\"hello world\" tail").unwrap();
        assert_eq!(value.as_str(), Some("hello world"));

        // An explicitly empty quoted string is a value.
        let (value, cursor) = parse(&string(), "\"\"").unwrap();
        assert_eq!(value.as_str(), Some(""));
        assert_eq!(cursor, 2);
    }

    #[test]
    fn test_greedy_takes_everything() {
        let (value, _) = parse(&greedy_string(), "hello there world").unwrap();
        assert_eq!(value.as_str(), Some("hello there world"));
        assert!(parse(&greedy_string(), "").is_err());
    }

    #[test]
    fn test_integer_bounds() {
        let parser = integer_between(1, 10);
        assert_eq!(parse(&parser, "7").unwrap().0, ArgValue::Int(7));

        let err = parse(&parser, "0").unwrap_err();
        assert_eq!(err.message(), "Integer must not be less than 1, found 0");
        assert_eq!(err.cursor(), 0);

        assert!(parse(&integer_min(5), "4").is_err());
        assert_eq!(parse(&integer(), "abc").unwrap_err().message(), "Expected integer");
    }

    #[test]
    fn test_float_parses_and_bounds() {
        assert_eq!(parse(&float(), "2.5").unwrap().0, ArgValue::Float(2.5));
        assert!(parse(&float_between(0.0, 1.0), "1.5").is_err());
        assert!(parse(&float_min(0.0), "-0.5").is_err());
    }

    #[test]
    fn test_choice() {
        let parser = choice(["vanilla", "chocolate"]);
        assert_eq!(parse(&parser, "vanilla").unwrap().0.as_str(), Some("vanilla"));

        let err = parse(&parser, "Vanilla").unwrap_err();
        assert!(err.message().starts_with("Invalid value 'Vanilla'"));
        assert_eq!(parser.suggestions(), vec!["vanilla", "chocolate"]);
    }
}
