use sqlparser::{
    dialect::PostgreSqlDialect,
    tokenizer::{Token, Tokenizer},
};

use crate::core::{CompileError, ErrorKind};

/// A datatype condition this compiler understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `equals("<text>")`: the value must be exactly `<text>`.
    Equals(String),
}

/// Parse a datatype condition such as `equals("NA")`.
///
/// The condition must be a call of `equals` with a single quoted argument;
/// whitespace between tokens is ignored.
pub fn parse_condition(condition: &str) -> Result<Condition, CompileError> {
    let unsupported = || {
        CompileError::new(
            ErrorKind::UnsupportedCondition,
            format!("nulltypes can only use 'equals', but found '{}'", condition),
        )
    };

    let dialect = PostgreSqlDialect {};
    let tokens = Tokenizer::new(&dialect, condition)
        .tokenize()
        .map_err(|_| unsupported())?
        .into_iter()
        .filter(|token| !matches!(token, Token::Whitespace(_) | Token::EOF))
        .collect::<Vec<_>>();

    match tokens.as_slice() {
        [Token::Word(function), Token::LParen, argument, Token::RParen]
            if function.quote_style.is_none() && function.value == "equals" =>
        {
            match argument {
                Token::Word(word) if word.quote_style == Some('"') => {
                    Ok(Condition::Equals(word.value.clone()))
                }
                Token::SingleQuotedString(text) => Ok(Condition::Equals(text.clone())),
                _ => Err(unsupported()),
            }
        }
        _ => Err(unsupported()),
    }
}
