#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// number tower shared by every expression: exact rationals, floats and
/// complex values, with NaN as the "undefined" data value
/// ________________________________________________________________________________________________________________________________
pub mod numeric;
///____________________________________________________________________________________________________________________________
/// error taxonomy of the parse pipeline and the engine
pub mod errors;
/// engine configuration knobs, passed explicitly instead of global state
pub mod settings;
///____________________________________________________________________________________________________________________________
/// the text -> expression pipeline: lexer, implicit-operator disambiguator
/// and recursive-descent parser
///# Example
/// ```
/// use RustedAlgebra::symbolic::symbolic_engine::Expr;
/// // implicit operators are understood: 2x is 2*x, x2 is x^2
/// let parsed_expression = Expr::parse_expression("2x + sin(x^2)");
/// assert_eq!(parsed_expression, Expr::parse_expression("2*x + sin(x^2)"));
/// println!(" parsed_expression {}", parsed_expression);
/// ```
pub mod lexer;
pub mod disambiguator;
pub mod parse_expr;
///____________________________________________________________________________________________________________________________
/// # Symbolic engine
/// a module
/// 1) turns a String expression into a symbolic expression
/// 2) differentiates symbolic expressions analytically
/// 3) turns a symbolic expression into a string expression for printing and control results
///# Example#
/// ```
/// use RustedAlgebra::symbolic::symbolic_engine::Expr;
/// let input = "x^3 + sin(x) * x";
/// // here you've got symbolic expression
/// let parsed_expression = Expr::parse_expression(input);
/// println!(" parsed_expression {}", parsed_expression);
/// // return vec of all arguments
/// let all = parsed_expression.all_arguments_are_variables();
/// println!("all arguments are variables {:?}", all);
/// // differentiate with respect to x
/// let df_dx = parsed_expression.differentiate("x").unwrap();
/// println!("df_dx = {}", df_dx);
/// // evaluate both at a point
/// let value = parsed_expression.eval_expression(vec!["x"], &[2.0]);
/// let slope = df_dx.eval_expression(vec!["x"], &[2.0]);
/// println!("f(2) = {}, f'(2) = {}", value, slope);
/// ```
/// ________________________________________________________________________________________________________________________________________________
pub mod symbolic_engine;
pub mod symbolic_engine_derivatives;
pub mod symbolic_simplify;
///________________________________________________________________________________________________________________________________________________
///
/// solve equations, inequalities and boolean statements over one unknown by
/// reduction to set algebra
/// Example#
/// ```
/// use RustedAlgebra::symbolic::symbolic_engine::Expr;
/// use RustedAlgebra::symbolic::solver::StatementSolver;
/// // statement with a relational and a boolean layer
/// let statement = Expr::parse_expression("(x > 0) and (x < 5)");
/// let mut solver = StatementSolver::new(statement, "x");
/// solver.loglevel = Some("off".to_string());
/// let solution = solver.solve().unwrap();
/// // open interval (0, 5)
/// println!("solution set: {}", solution);
/// assert_eq!(format!("{}", solution), "(0, 5)");
/// ```
pub mod sets;
pub mod solver;
