//! Lexer: raw text to a flat token stream.
//!
//! Tokens carry their source position so later stages can report where a
//! problem is. Whitespace separates tokens and is otherwise dropped. The
//! lexer knows nothing about precedence or juxtaposition; it only classifies
//! characters. Implicit-operator insertion lives in the disambiguator.

use crate::symbolic::errors::ParseError;

/// Coarse token classes consumed by the disambiguator and parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Numeric literal: integer, decimal or scientific
    Number,
    /// Free variable name
    Identifier,
    /// Recognized function name (sin, ln, derivative, ...)
    Keyword,
    /// Parentheses and comma
    Punctuation,
    /// Arithmetic, relational and boolean operators
    Operator,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Byte offset of the first character in the source string
    pub pos: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: &str, pos: usize) -> Token {
        Token {
            kind,
            text: text.to_string(),
            pos,
        }
    }
}

/// Function names the parser understands, canonical spellings and synonyms
/// alike. A lexed identifier found here becomes a Keyword token.
pub const KEYWORDS: &[&str] = &[
    "sin", "cos", "tg", "tan", "ctg", "cot", "sec", "csc", "cosec", "arcsin", "asin", "arccos",
    "acos", "arctg", "atan", "arctan", "arcctg", "acot", "arccot", "arcsec", "asec", "arccsc",
    "acsc", "sh", "sinh", "ch", "cosh", "th", "tanh", "cth", "coth", "arsh", "asinh", "arsinh",
    "arch", "acosh", "arcosh", "arth", "atanh", "artanh", "arcth", "acoth", "arcoth", "exp", "ln",
    "log", "sqrt", "abs", "sign", "signum", "derivative", "integral", "limit", "piecewise",
    "provided",
];

/// Word operators become Operator tokens even though they lex like names.
const WORD_OPERATORS: &[&str] = &["and", "or"];

/// Multi-character operators, tried before their single-character prefixes.
const COMPOUND_OPERATORS: &[&str] = &[">=", "<=", "=>"];

const SINGLE_OPERATORS: &[char] = &['+', '-', '*', '/', '^', '!', '=', '>', '<'];

/// Tokenizes input text. Fails only on a character no rule matches.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            if i < chars.len() && chars[i] == '.' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit())
            {
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            // exponent part only when a digit actually follows, so "2e" stays
            // a number next to the constant e
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                let mut j = i + 1;
                if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    i = j;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let text: String = chars[start..i].iter().collect();
            tokens.push(Token::new(TokenKind::Number, &text, start));
            continue;
        }
        if c.is_alphabetic() || c == '_' {
            let start = i;
            i += 1;
            // a bare digit after a name starts a new Number token ("x2" is
            // x ^ 2); digits belong to the name only behind an underscore,
            // so indexed variables like n_12 stay whole
            while i < chars.len() {
                let ch = chars[i];
                if ch.is_alphabetic() || ch == '_' {
                    i += 1;
                } else if ch.is_ascii_digit() && chars[i - 1] == '_' {
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                } else {
                    break;
                }
            }
            let text: String = chars[start..i].iter().collect();
            let kind = if WORD_OPERATORS.contains(&text.as_str()) {
                TokenKind::Operator
            } else if KEYWORDS.contains(&text.as_str()) {
                TokenKind::Keyword
            } else {
                TokenKind::Identifier
            };
            tokens.push(Token::new(kind, &text, start));
            continue;
        }
        if c == '(' || c == ')' || c == ',' {
            tokens.push(Token::new(TokenKind::Punctuation, &c.to_string(), i));
            i += 1;
            continue;
        }
        if let Some(op) = COMPOUND_OPERATORS
            .iter()
            .find(|op| chars[i..].starts_with(&op.chars().collect::<Vec<_>>()[..]))
        {
            tokens.push(Token::new(TokenKind::Operator, op, i));
            i += op.len();
            continue;
        }
        if SINGLE_OPERATORS.contains(&c) {
            tokens.push(Token::new(TokenKind::Operator, &c.to_string(), i));
            i += 1;
            continue;
        }
        return Err(ParseError::Lex {
            character: c,
            position: i,
        });
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<String> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(texts("x + 2*sin(y)"), vec!["x", "+", "2", "*", "sin", "(", "y", ")"]);
    }

    #[test]
    fn test_whitespace_is_dropped() {
        assert_eq!(texts("  x\t+\n1 "), vec!["x", "+", "1"]);
    }

    #[test]
    fn test_number_forms() {
        assert_eq!(texts("3 3.5 2e10 1.5e-3"), vec!["3", "3.5", "2e10", "1.5e-3"]);
    }

    #[test]
    fn test_trailing_e_is_not_an_exponent() {
        // "2e" juxtaposes the number 2 with the constant e
        assert_eq!(texts("2e"), vec!["2", "e"]);
        assert_eq!(texts("2e+x"), vec!["2", "e", "+", "x"]);
    }

    #[test]
    fn test_digit_after_name_starts_a_number() {
        assert_eq!(texts("x2"), vec!["x", "2"]);
        assert_eq!(texts("x2y"), vec!["x", "2", "y"]);
    }

    #[test]
    fn test_underscore_indexed_names_stay_whole() {
        assert_eq!(texts("n_1 + n_12"), vec!["n_1", "+", "n_12"]);
        assert_eq!(texts("n_2x"), vec!["n_2x"]);
    }

    #[test]
    fn test_compound_operators_win_over_prefixes() {
        assert_eq!(texts("x >= 1"), vec!["x", ">=", "1"]);
        assert_eq!(texts("x <= 1"), vec!["x", "<=", "1"]);
        assert_eq!(texts("a => b"), vec!["a", "=>", "b"]);
        assert_eq!(texts("x = 1"), vec!["x", "=", "1"]);
    }

    #[test]
    fn test_keyword_classification() {
        let tokens = tokenize("sin(x) and y").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Keyword);
        assert_eq!(tokens[2].kind, TokenKind::Identifier);
        assert_eq!(tokens[4].kind, TokenKind::Operator); // "and"
        assert_eq!(tokens[5].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("ab + 12").unwrap();
        assert_eq!(tokens[0].pos, 0);
        assert_eq!(tokens[1].pos, 3);
        assert_eq!(tokens[2].pos, 5);
    }

    #[test]
    fn test_unknown_character_is_an_error() {
        assert_eq!(
            tokenize("x # y"),
            Err(ParseError::Lex {
                character: '#',
                position: 2
            })
        );
    }
}
