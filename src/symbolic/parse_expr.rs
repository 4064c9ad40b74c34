//! Parser: explicit token stream to an expression tree.
//!
//! A recursive-descent parser whose rule nesting mirrors the [`Priority`]
//! ladder, loosest first:
//!
//! ```text
//! statement      := implication
//! implication    := disjunction ("=>" implication)?          right-assoc
//! disjunction    := conjunction ("or" conjunction)*          left-assoc
//! conjunction    := relation ("and" relation)*               left-assoc
//! relation       := additive (("="|">"|">="|"<"|"<=") additive)?   no chaining
//! additive       := multiplicative (("+"|"-") multiplicative)*     left-assoc
//! multiplicative := unary (("*"|"/") unary)*                 left-assoc
//! unary          := "-" unary | power
//! power          := postfix ("^" unary)?                     right-assoc
//! postfix        := primary "!"*
//! primary        := number | identifier | keyword "(" args ")" | "(" statement ")"
//! ```
//!
//! Unary minus builds `Mul(-1, x)` rather than a dedicated node, and integer
//! literals become exact rationals so later rewriting folds them without
//! rounding.
//!
//! # Example
//! ```rust, ignore
//! use RustedAlgebra::symbolic::symbolic_engine::Expr;
//! let parsed_expression = Expr::parse_expression("x^2.3 * log(2, x+y)");
//! println!("parsed_expression {}", parsed_expression);
//! ```

use crate::symbolic::disambiguator::insert_implicit_operators;
use crate::symbolic::errors::ParseError;
use crate::symbolic::lexer::{Token, TokenKind, tokenize};
use crate::symbolic::numeric::Number;
use crate::symbolic::settings::SymbolicSettings;
use crate::symbolic::symbolic_engine::Expr;
use log::info;
use num::BigInt;
use num::BigRational;
use std::str::FromStr;

struct TokenParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenParser {
    fn new(tokens: Vec<Token>) -> TokenParser {
        TokenParser { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    /// Consumes the next token when it is the given operator.
    fn eat_operator(&mut self, op: &str) -> bool {
        if matches!(self.peek(), Some(t) if t.kind == TokenKind::Operator && t.text == op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_punctuation(&mut self, p: &str) -> bool {
        if matches!(self.peek(), Some(t) if t.kind == TokenKind::Punctuation && t.text == p) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn found_text(&self) -> String {
        self.peek()
            .map(|t| t.text.clone())
            .unwrap_or_else(|| "end of input".to_string())
    }

    fn syntax_error(&self, expected: &[&str], context: &'static str) -> ParseError {
        ParseError::Syntax {
            expected: expected.iter().map(|s| s.to_string()).collect(),
            context,
            found: self.found_text(),
        }
    }

    fn expect_punctuation(&mut self, p: &'static str, context: &'static str) -> Result<(), ParseError> {
        if self.eat_punctuation(p) {
            Ok(())
        } else {
            Err(self.syntax_error(&[p], context))
        }
    }

    fn parse_statement(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_disjunction()?;
        if self.eat_operator("=>") {
            // right-associative
            let right = self.parse_statement()?;
            return Ok(Expr::Implies(left.boxed(), right.boxed()));
        }
        Ok(left)
    }

    fn parse_disjunction(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_conjunction()?;
        while self.eat_operator("or") {
            let right = self.parse_conjunction()?;
            left = Expr::Or(left.boxed(), right.boxed());
        }
        Ok(left)
    }

    fn parse_conjunction(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_relation()?;
        while self.eat_operator("and") {
            let right = self.parse_relation()?;
            left = Expr::And(left.boxed(), right.boxed());
        }
        Ok(left)
    }

    /// Relations do not chain: `a < b < c` leaves `< c` as trailing input.
    fn parse_relation(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_additive()?;
        for (op, build) in [
            ("=", Expr::Equals as fn(Box<Expr>, Box<Expr>) -> Expr),
            (">=", Expr::GreaterOrEq),
            ("<=", Expr::LessOrEq),
            (">", Expr::Greater),
            ("<", Expr::Less),
        ] {
            if self.eat_operator(op) {
                let right = self.parse_additive()?;
                return Ok(build(left.boxed(), right.boxed()));
            }
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            if self.eat_operator("+") {
                let right = self.parse_multiplicative()?;
                left = Expr::Add(left.boxed(), right.boxed());
            } else if self.eat_operator("-") {
                let right = self.parse_multiplicative()?;
                left = Expr::Sub(left.boxed(), right.boxed());
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            if self.eat_operator("*") {
                let right = self.parse_unary()?;
                left = Expr::Mul(left.boxed(), right.boxed());
            } else if self.eat_operator("/") {
                let right = self.parse_unary()?;
                left = Expr::Div(left.boxed(), right.boxed());
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.eat_operator("-") {
            let inner = self.parse_unary()?;
            return Ok(-inner);
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_postfix()?;
        if self.eat_operator("^") {
            // exponent may itself start with unary minus: x^-2
            let exp = self.parse_unary()?;
            return Ok(Expr::Pow(base.boxed(), exp.boxed()));
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut e = self.parse_primary()?;
        while self.eat_operator("!") {
            e = Expr::Factorial(e.boxed());
        }
        Ok(e)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = match self.peek() {
            Some(t) => t.clone(),
            None => {
                return Err(self.syntax_error(
                    &["number", "identifier", "function", "("],
                    "primary expression",
                ));
            }
        };
        match token.kind {
            TokenKind::Number => {
                self.advance();
                Ok(Expr::Num(parse_number_literal(&token.text)?))
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(Expr::Var(token.text))
            }
            TokenKind::Keyword => {
                self.advance();
                self.parse_call(&token.text)
            }
            TokenKind::Punctuation if token.text == "(" => {
                self.advance();
                let inner = self.parse_statement()?;
                self.expect_punctuation(")", "parenthesized expression")?;
                Ok(inner)
            }
            _ => Err(self.syntax_error(
                &["number", "identifier", "function", "("],
                "primary expression",
            )),
        }
    }

    fn parse_call(&mut self, name: &str) -> Result<Expr, ParseError> {
        self.expect_punctuation("(", "function call")?;
        let mut args = vec![self.parse_statement()?];
        while self.eat_punctuation(",") {
            args.push(self.parse_statement()?);
        }
        self.expect_punctuation(")", "function call")?;
        build_call(name, args, self)
    }
}

/// Integer literals become exact rationals; anything with a decimal point or
/// an exponent stays a float.
fn parse_number_literal(text: &str) -> Result<Number, ParseError> {
    if text.contains('.') || text.contains('e') || text.contains('E') {
        text.parse::<f64>()
            .map(Number::real)
            .map_err(|_| ParseError::Syntax {
                expected: vec!["number".to_string()],
                context: "numeric literal",
                found: text.to_string(),
            })
    } else {
        BigInt::from_str(text)
            .map(|n| Number::Rational(BigRational::from_integer(n)))
            .map_err(|_| ParseError::Syntax {
                expected: vec!["number".to_string()],
                context: "numeric literal",
                found: text.to_string(),
            })
    }
}

fn unary_arg(mut args: Vec<Expr>, name: &'static str, p: &TokenParser) -> Result<Expr, ParseError> {
    if args.len() == 1 {
        Ok(args.remove(0))
    } else {
        Err(ParseError::Syntax {
            expected: vec!["1 argument".to_string()],
            context: name,
            found: format!("{} arguments before '{}'", args.len(), p.found_text()),
        })
    }
}

/// The bound variable of derivative/integral/limit must literally be a
/// variable token.
fn bound_variable(arg: Expr, context: &'static str) -> Result<String, ParseError> {
    match arg {
        Expr::Var(name) => Ok(name),
        other => Err(ParseError::Syntax {
            expected: vec!["variable".to_string()],
            context,
            found: other.to_string(),
        }),
    }
}

fn integer_order(arg: Expr, context: &'static str) -> Result<i64, ParseError> {
    match &arg {
        Expr::Num(v) => {
            if let Some(n) = v.as_integer() {
                return Ok(n);
            }
        }
        _ => {}
    }
    Err(ParseError::Syntax {
        expected: vec!["integer".to_string()],
        context,
        found: arg.to_string(),
    })
}

fn build_call(name: &str, mut args: Vec<Expr>, p: &TokenParser) -> Result<Expr, ParseError> {
    let e = match name {
        "sin" => Expr::sin(unary_arg(args, "sin", p)?.boxed()),
        "cos" => Expr::cos(unary_arg(args, "cos", p)?.boxed()),
        "tg" | "tan" => Expr::tg(unary_arg(args, "tg", p)?.boxed()),
        "ctg" | "cot" => Expr::ctg(unary_arg(args, "ctg", p)?.boxed()),
        "sec" => Expr::sec(unary_arg(args, "sec", p)?.boxed()),
        "csc" | "cosec" => Expr::csc(unary_arg(args, "csc", p)?.boxed()),
        "arcsin" | "asin" => Expr::arcsin(unary_arg(args, "arcsin", p)?.boxed()),
        "arccos" | "acos" => Expr::arccos(unary_arg(args, "arccos", p)?.boxed()),
        "arctg" | "atan" | "arctan" => Expr::arctg(unary_arg(args, "arctg", p)?.boxed()),
        "arcctg" | "acot" | "arccot" => Expr::arcctg(unary_arg(args, "arcctg", p)?.boxed()),
        "arcsec" | "asec" => Expr::arcsec(unary_arg(args, "arcsec", p)?.boxed()),
        "arccsc" | "acsc" => Expr::arccsc(unary_arg(args, "arccsc", p)?.boxed()),
        "sh" | "sinh" => Expr::sh(unary_arg(args, "sh", p)?.boxed()),
        "ch" | "cosh" => Expr::ch(unary_arg(args, "ch", p)?.boxed()),
        "th" | "tanh" => Expr::th(unary_arg(args, "th", p)?.boxed()),
        "cth" | "coth" => Expr::cth(unary_arg(args, "cth", p)?.boxed()),
        "arsh" | "asinh" | "arsinh" => Expr::arsh(unary_arg(args, "arsh", p)?.boxed()),
        "arch" | "acosh" | "arcosh" => Expr::arch(unary_arg(args, "arch", p)?.boxed()),
        "arth" | "atanh" | "artanh" => Expr::arth(unary_arg(args, "arth", p)?.boxed()),
        "arcth" | "acoth" | "arcoth" => Expr::arcth(unary_arg(args, "arcth", p)?.boxed()),
        "exp" => Expr::Exp(unary_arg(args, "exp", p)?.boxed()),
        "ln" => Expr::Ln(unary_arg(args, "ln", p)?.boxed()),
        "abs" => Expr::Abs(unary_arg(args, "abs", p)?.boxed()),
        "sign" | "signum" => Expr::Signum(unary_arg(args, "sign", p)?.boxed()),
        "sqrt" => {
            let x = unary_arg(args, "sqrt", p)?;
            Expr::Pow(
                x.boxed(),
                Expr::Num(Number::int(1) / Number::int(2)).boxed(),
            )
        }
        "log" => match args.len() {
            // single argument defaults the base to 10
            1 => Expr::Log(Expr::int(10).boxed(), args.remove(0).boxed()),
            2 => {
                let antilog = args.pop().unwrap();
                let base = args.pop().unwrap();
                Expr::Log(base.boxed(), antilog.boxed())
            }
            n => {
                return Err(ParseError::Syntax {
                    expected: vec!["1 or 2 arguments".to_string()],
                    context: "log",
                    found: format!("{} arguments", n),
                });
            }
        },
        "derivative" | "integral" | "limit" => {
            if args.len() != 3 {
                return Err(ParseError::Syntax {
                    expected: vec!["3 arguments".to_string()],
                    context: "derivative/integral/limit",
                    found: format!("{} arguments", args.len()),
                });
            }
            let order = integer_order(args.pop().unwrap(), "derivative/integral/limit")?;
            let var = bound_variable(args.pop().unwrap(), "derivative/integral/limit")?;
            let body = args.pop().unwrap().boxed();
            match name {
                "derivative" => Expr::Derivative(body, var, order),
                "integral" => Expr::Integral(body, var, order),
                _ => Expr::Limit(body, var, order),
            }
        }
        "piecewise" => {
            if args.is_empty() || args.len() % 2 != 0 {
                return Err(ParseError::Syntax {
                    expected: vec!["an even number of arguments".to_string()],
                    context: "piecewise",
                    found: format!("{} arguments", args.len()),
                });
            }
            let cases = args
                .chunks(2)
                .map(|pair| (pair[0].clone(), pair[1].clone()))
                .collect();
            Expr::Piecewise(cases)
        }
        "provided" => {
            if args.len() != 2 {
                return Err(ParseError::Syntax {
                    expected: vec!["2 arguments".to_string()],
                    context: "provided",
                    found: format!("{} arguments", args.len()),
                });
            }
            let pred = args.pop().unwrap();
            let value = args.pop().unwrap();
            Expr::Provided(value.boxed(), pred.boxed())
        }
        other => {
            return Err(ParseError::Syntax {
                expected: vec!["known function".to_string()],
                context: "function call",
                found: other.to_string(),
            });
        }
    };
    Ok(e)
}

impl Expr {
    /// Full pipeline with explicit settings: lexer, disambiguator, parser,
    /// trailing-input check.
    pub fn try_parse_with(input: &str, settings: &SymbolicSettings) -> Result<Expr, ParseError> {
        let tokens = tokenize(input)?;
        let tokens = insert_implicit_operators(tokens, settings)?;
        let mut parser = TokenParser::new(tokens);
        let expr = parser.parse_statement()?;
        if parser.peek().is_some() {
            return Err(parser.syntax_error(&["end of input"], "statement"));
        }
        Ok(expr)
    }

    /// Full pipeline with default settings.
    pub fn try_parse(input: &str) -> Result<Expr, ParseError> {
        Expr::try_parse_with(input, &SymbolicSettings::default())
    }

    /// Panicking convenience wrapper for literal inputs known to be valid.
    pub fn parse_expression(input: &str) -> Expr {
        match Expr::try_parse(input) {
            Ok(expr) => {
                info!("parsed '{}' into {}", input, expr);
                expr
            }
            Err(e) => panic!("failed to parse '{}': {}", input, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_ladder() {
        assert_eq!(
            Expr::parse_expression("1 + 2 * x"),
            Expr::int(1) + Expr::int(2) * Expr::Var("x".to_string())
        );
        assert_eq!(
            Expr::parse_expression("2 * x ^ 3"),
            Expr::int(2) * Expr::Var("x".to_string()).pow(Expr::int(3))
        );
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(
            Expr::parse_expression("1 - 2 - 3"),
            (Expr::int(1) - Expr::int(2)) - Expr::int(3)
        );
        assert_eq!(
            Expr::parse_expression("8 / 4 / 2"),
            (Expr::int(8) / Expr::int(4)) / Expr::int(2)
        );
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(
            Expr::parse_expression("2 ^ 3 ^ 2"),
            Expr::int(2).pow(Expr::int(3).pow(Expr::int(2)))
        );
    }

    #[test]
    fn test_unary_minus_is_mul_by_minus_one() {
        assert_eq!(
            Expr::parse_expression("-x"),
            Expr::int(-1) * Expr::Var("x".to_string())
        );
        // binds tighter than subtraction
        assert_eq!(
            Expr::parse_expression("1 - -x"),
            Expr::int(1) - (Expr::int(-1) * Expr::Var("x".to_string()))
        );
    }

    #[test]
    fn test_negative_exponent() {
        assert_eq!(
            Expr::parse_expression("x^-2"),
            Expr::Var("x".to_string()).pow(Expr::int(-1) * Expr::int(2))
        );
    }

    #[test]
    fn test_integer_literals_are_exact() {
        assert_eq!(Expr::parse_expression("7"), Expr::int(7));
        assert_eq!(Expr::parse_expression("2.5"), Expr::real(2.5));
        assert_eq!(Expr::parse_expression("1e3"), Expr::real(1000.0));
    }

    #[test]
    fn test_function_synonyms_collapse() {
        assert_eq!(
            Expr::parse_expression("tan(x)"),
            Expr::parse_expression("tg(x)")
        );
        assert_eq!(
            Expr::parse_expression("asin(x)"),
            Expr::parse_expression("arcsin(x)")
        );
        assert_eq!(
            Expr::parse_expression("signum(x)"),
            Expr::parse_expression("sign(x)")
        );
    }

    #[test]
    fn test_log_arities() {
        assert_eq!(
            Expr::parse_expression("log(x)"),
            Expr::Log(
                Expr::int(10).boxed(),
                Expr::Var("x".to_string()).boxed()
            )
        );
        assert_eq!(
            Expr::parse_expression("log(2, x)"),
            Expr::Log(Expr::int(2).boxed(), Expr::Var("x".to_string()).boxed())
        );
    }

    #[test]
    fn test_sqrt_desugars_to_pow() {
        assert_eq!(
            Expr::parse_expression("sqrt(x)"),
            Expr::Var("x".to_string()).pow(Expr::Num(Number::int(1) / Number::int(2)))
        );
    }

    #[test]
    fn test_factorial_postfix() {
        assert_eq!(
            Expr::parse_expression("x!"),
            Expr::Factorial(Expr::Var("x".to_string()).boxed())
        );
        assert_eq!(
            Expr::parse_expression("3! + 1"),
            Expr::Factorial(Expr::int(3).boxed()) + Expr::int(1)
        );
    }

    #[test]
    fn test_higher_order_nodes() {
        assert_eq!(
            Expr::parse_expression("derivative(x^2, x, 1)"),
            Expr::Derivative(
                Expr::Var("x".to_string()).pow(Expr::int(2)).boxed(),
                "x".to_string(),
                1
            )
        );
        assert_eq!(
            Expr::parse_expression("integral(x, x, 2)"),
            Expr::Integral(Expr::Var("x".to_string()).boxed(), "x".to_string(), 2)
        );
    }

    #[test]
    fn test_derivative_requires_variable() {
        let err = Expr::try_parse("derivative(x^2, 3, 1)").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn test_piecewise_and_provided() {
        assert_eq!(
            Expr::parse_expression("piecewise(1, x > 0, 0, x <= 0)"),
            Expr::Piecewise(vec![
                (
                    Expr::int(1),
                    Expr::Greater(Expr::Var("x".to_string()).boxed(), Expr::int(0).boxed())
                ),
                (
                    Expr::int(0),
                    Expr::LessOrEq(Expr::Var("x".to_string()).boxed(), Expr::int(0).boxed())
                ),
            ])
        );
        assert_eq!(
            Expr::parse_expression("provided(1/x, x > 0)"),
            Expr::Provided(
                (Expr::int(1) / Expr::Var("x".to_string())).boxed(),
                Expr::Greater(Expr::Var("x".to_string()).boxed(), Expr::int(0).boxed()).boxed()
            )
        );
    }

    #[test]
    fn test_statement_operators() {
        assert_eq!(
            Expr::parse_expression("(x > 0) and (x < 5)"),
            Expr::And(
                Expr::Greater(Expr::Var("x".to_string()).boxed(), Expr::int(0).boxed()).boxed(),
                Expr::Less(Expr::Var("x".to_string()).boxed(), Expr::int(5).boxed()).boxed()
            )
        );
        // implication is right-associative
        assert_eq!(
            Expr::parse_expression("a = 1 => b = 2 => c = 3"),
            Expr::Implies(
                Expr::Equals(Expr::Var("a".to_string()).boxed(), Expr::int(1).boxed()).boxed(),
                Expr::Implies(
                    Expr::Equals(Expr::Var("b".to_string()).boxed(), Expr::int(2).boxed())
                        .boxed(),
                    Expr::Equals(Expr::Var("c".to_string()).boxed(), Expr::int(3).boxed())
                        .boxed()
                )
                .boxed()
            )
        );
    }

    #[test]
    fn test_relations_do_not_chain() {
        assert!(Expr::try_parse("1 < x < 5").is_err());
    }

    #[test]
    fn test_implicit_multiplication_round_trip() {
        assert_eq!(
            Expr::parse_expression("2x"),
            Expr::parse_expression("2*x")
        );
        assert_eq!(
            Expr::parse_expression("x2"),
            Expr::parse_expression("x^2")
        );
        assert_eq!(
            Expr::parse_expression("2(x+1)"),
            Expr::parse_expression("2*(x+1)")
        );
    }

    #[test]
    fn test_trailing_input_is_an_error() {
        assert!(Expr::try_parse("x + 1 )").is_err());
        let err = Expr::try_parse("(x + 1").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn test_display_round_trip() {
        for src in [
            "x + 1 * 2",
            "(x + 1) * 2",
            "2 ^ x ^ 2",
            "sin(x) / cos(x)",
            "(x > 0) and (x < 5)",
            "derivative(x ^ 2, x, 1)",
        ] {
            let e = Expr::parse_expression(src);
            assert_eq!(Expr::parse_expression(&format!("{}", e)), e);
        }
    }
}
