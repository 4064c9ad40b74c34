//! Disambiguator: rewrites the raw token stream into an explicit one.
//!
//! Mathematical notation drops operators that programming notation spells
//! out: `2x` means `2*x`, `x2` means `x^2`, `2(x+1)` means `2*(x+1)`. This
//! pass walks adjacent token pairs and inserts the implied operator so the
//! parser only ever sees fully explicit streams. With
//! `explicit_parsing_only` set the same pair table produces a
//! `MissingOperator` error instead of an insertion.

use crate::symbolic::errors::ParseError;
use crate::symbolic::lexer::{Token, TokenKind};
use crate::symbolic::settings::SymbolicSettings;
use log::debug;

/// What a token contributes on the left edge of a juxtaposition.
fn ends_a_value(t: &Token) -> bool {
    matches!(t.kind, TokenKind::Number | TokenKind::Identifier)
        || (t.kind == TokenKind::Punctuation && t.text == ")")
}

/// Operator implied between two adjacent tokens, if any.
///
/// value-like followed by a name, a function or an opening parenthesis
/// implies multiplication; value-like followed by a number implies
/// exponentiation (`x2` is `x^2`).
fn implied_operator(left: &Token, right: &Token) -> Option<&'static str> {
    if !ends_a_value(left) {
        return None;
    }
    match right.kind {
        TokenKind::Identifier | TokenKind::Keyword => Some("*"),
        TokenKind::Punctuation if right.text == "(" => Some("*"),
        TokenKind::Number => Some("^"),
        _ => None,
    }
}

/// Inserts the implied operators, or rejects juxtaposition in explicit mode.
/// An empty stream is rejected here so the parser always has a first token.
pub fn insert_implicit_operators(
    tokens: Vec<Token>,
    settings: &SymbolicSettings,
) -> Result<Vec<Token>, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::EmptyInput);
    }
    let mut result: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if let Some(prev) = result.last() {
            if let Some(op) = implied_operator(prev, &token) {
                if settings.explicit_parsing_only {
                    return Err(ParseError::MissingOperator {
                        left: prev.text.clone(),
                        right: token.text.clone(),
                    });
                }
                debug!(
                    "implicit '{}' inserted between '{}' and '{}'",
                    op, prev.text, token.text
                );
                result.push(Token::new(TokenKind::Operator, op, token.pos));
            }
        }
        result.push(token);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::lexer::tokenize;

    fn disambiguated(input: &str) -> Vec<String> {
        insert_implicit_operators(tokenize(input).unwrap(), &SymbolicSettings::default())
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_number_variable_multiplies() {
        assert_eq!(disambiguated("2x"), vec!["2", "*", "x"]);
    }

    #[test]
    fn test_variable_number_exponentiates() {
        assert_eq!(disambiguated("x2"), vec!["x", "^", "2"]);
    }

    #[test]
    fn test_number_parenthesis_multiplies() {
        assert_eq!(disambiguated("2(x+1)"), vec!["2", "*", "(", "x", "+", "1", ")"]);
    }

    #[test]
    fn test_closing_parenthesis_chains() {
        assert_eq!(
            disambiguated("(x+1)(x+2)"),
            vec!["(", "x", "+", "1", ")", "*", "(", "x", "+", "2", ")"]
        );
    }

    #[test]
    fn test_number_function_multiplies() {
        assert_eq!(disambiguated("2sin(x)"), vec!["2", "*", "sin", "(", "x", ")"]);
    }

    #[test]
    fn test_keyword_left_inserts_nothing() {
        // "sin(" is a call, not a product
        assert_eq!(disambiguated("sin(x)"), vec!["sin", "(", "x", ")"]);
    }

    #[test]
    fn test_explicit_stream_is_untouched() {
        assert_eq!(disambiguated("2 * x + 1"), vec!["2", "*", "x", "+", "1"]);
    }

    #[test]
    fn test_explicit_mode_rejects_juxtaposition() {
        let settings = SymbolicSettings {
            explicit_parsing_only: true,
            ..Default::default()
        };
        let err = insert_implicit_operators(tokenize("2x").unwrap(), &settings).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingOperator {
                left: "2".to_string(),
                right: "x".to_string()
            }
        );
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let err =
            insert_implicit_operators(vec![], &SymbolicSettings::default()).unwrap_err();
        assert_eq!(err, ParseError::EmptyInput);
    }
}
