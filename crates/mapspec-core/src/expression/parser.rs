//! Compute expression parser
//!
//! A recursive descent parser producing an [`Expr`] tree. Identifiers are
//! checked against the bounded scope here, so evaluation never has to deal
//! with names it does not know.
//!
//! Two limits keep parsing and evaluation off the end of the stack: the
//! nesting of parenthesised sub-expressions and unary operators, and the
//! height of the finished tree, which also grows with every binary operator
//! and member step of a flat chain.
//!
//! Copyright (c) 2025 Mapspec Team
//! Licensed under the Apache-2.0 license

use super::ast::*;
use super::error::ExpressionError;
use std::iter::Peekable;
use std::str::Chars;

/// Longest accepted expression source, in bytes
pub const MAX_EXPRESSION_LENGTH: usize = 4096;

/// Deepest accepted nesting of sub-expressions
pub const MAX_NESTING_DEPTH: usize = 64;

/// Tallest accepted expression tree, counting operators and member steps
pub const MAX_TREE_DEPTH: usize = 128;

type ParseResult<T> = std::result::Result<T, ExpressionError>;

/// A parsed sub-expression and the height of its tree
struct Parsed {
    expr: Expr,
    height: usize,
}

impl Parsed {
    fn leaf(expr: Expr) -> Self {
        Self { expr, height: 1 }
    }

    /// One level above the tallest child
    fn node(expr: Expr, children: &[usize]) -> ParseResult<Self> {
        let height = children.iter().copied().max().unwrap_or(0) + 1;
        if height > MAX_TREE_DEPTH {
            return Err(ExpressionError::Limit {
                message: format!("expression tree deeper than {} levels", MAX_TREE_DEPTH),
            });
        }
        Ok(Self { expr, height })
    }
}

/// Compute expression parser
pub struct Parser<'a> {
    /// Input string being parsed
    input: &'a str,
    /// Character iterator
    chars: Peekable<Chars<'a>>,
    /// Current byte offset in input
    position: usize,
    /// Current nesting depth
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given input
    pub fn new(input: &'a str) -> ParseResult<Self> {
        if input.trim().is_empty() {
            return Err(ExpressionError::parse("Empty expression", 0, input));
        }
        if input.len() > MAX_EXPRESSION_LENGTH {
            return Err(ExpressionError::Limit {
                message: format!(
                    "expression is {} bytes, maximum is {}",
                    input.len(),
                    MAX_EXPRESSION_LENGTH
                ),
            });
        }

        Ok(Self {
            input,
            chars: input.chars().peekable(),
            position: 0,
            depth: 0,
        })
    }

    /// Parse the whole input into an expression tree
    pub fn parse(mut self) -> ParseResult<Expr> {
        let parsed = self.parse_expression()?;
        self.skip_whitespace();

        match self.current_char() {
            None => Ok(parsed.expr),
            Some(ch) => Err(ExpressionError::syntax(
                "Unexpected trailing input",
                self.position,
                vec!["operator".to_string(), "end of input".to_string()],
                ch.to_string(),
            )),
        }
    }

    fn enter(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(ExpressionError::Limit {
                message: format!("nesting deeper than {} levels", MAX_NESTING_DEPTH),
            });
        }
        Ok(())
    }

    fn parse_expression(&mut self) -> ParseResult<Parsed> {
        self.enter()?;
        let parsed = self.parse_conditional();
        self.depth -= 1;
        parsed
    }

    /// Parse `test ? consequent : alternate`
    fn parse_conditional(&mut self) -> ParseResult<Parsed> {
        let test = self.parse_nullish()?;

        self.skip_whitespace();
        if self.current_char() == Some('?') && !matches!(self.peek_char(), Some('?') | Some('.')) {
            self.advance();
            let consequent = self.parse_expression()?;
            self.skip_whitespace();
            self.expect_char(':')?;
            let alternate = self.parse_expression()?;
            let heights = [test.height, consequent.height, alternate.height];
            return Parsed::node(
                Expr::Conditional {
                    test: Box::new(test.expr),
                    consequent: Box::new(consequent.expr),
                    alternate: Box::new(alternate.expr),
                },
                &heights,
            );
        }

        Ok(test)
    }

    /// Parse `a ?? b`
    fn parse_nullish(&mut self) -> ParseResult<Parsed> {
        let mut expr = self.parse_logical_or()?;

        while self.match_operator("??") {
            let right = self.parse_logical_or()?;
            expr = binary(expr, BinaryOperator::Nullish, right)?;
        }

        Ok(expr)
    }

    /// Parse logical OR expression
    fn parse_logical_or(&mut self) -> ParseResult<Parsed> {
        let mut expr = self.parse_logical_and()?;

        while self.match_operator("||") {
            let right = self.parse_logical_and()?;
            expr = binary(expr, BinaryOperator::Or, right)?;
        }

        Ok(expr)
    }

    /// Parse logical AND expression
    fn parse_logical_and(&mut self) -> ParseResult<Parsed> {
        let mut expr = self.parse_equality()?;

        while self.match_operator("&&") {
            let right = self.parse_equality()?;
            expr = binary(expr, BinaryOperator::And, right)?;
        }

        Ok(expr)
    }

    /// Parse equality/inequality expressions
    fn parse_equality(&mut self) -> ParseResult<Parsed> {
        let mut expr = self.parse_comparison()?;

        loop {
            let operator = if self.match_operator("===") {
                BinaryOperator::StrictEqual
            } else if self.match_operator("!==") {
                BinaryOperator::StrictNotEqual
            } else if self.match_operator("==") {
                BinaryOperator::Equal
            } else if self.match_operator("!=") {
                BinaryOperator::NotEqual
            } else {
                break;
            };
            let right = self.parse_comparison()?;
            expr = binary(expr, operator, right)?;
        }

        Ok(expr)
    }

    /// Parse comparison expressions
    fn parse_comparison(&mut self) -> ParseResult<Parsed> {
        let mut expr = self.parse_additive()?;

        loop {
            let operator = if self.match_operator("<=") {
                BinaryOperator::LessThanOrEqual
            } else if self.match_operator(">=") {
                BinaryOperator::GreaterThanOrEqual
            } else if self.match_operator("<") {
                BinaryOperator::LessThan
            } else if self.match_operator(">") {
                BinaryOperator::GreaterThan
            } else {
                break;
            };
            let right = self.parse_additive()?;
            expr = binary(expr, operator, right)?;
        }

        Ok(expr)
    }

    fn parse_additive(&mut self) -> ParseResult<Parsed> {
        let mut expr = self.parse_multiplicative()?;

        loop {
            let operator = if self.match_operator("+") {
                BinaryOperator::Add
            } else if self.match_operator("-") {
                BinaryOperator::Subtract
            } else {
                break;
            };
            let right = self.parse_multiplicative()?;
            expr = binary(expr, operator, right)?;
        }

        Ok(expr)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Parsed> {
        let mut expr = self.parse_unary()?;

        loop {
            let operator = if self.match_operator("*") {
                BinaryOperator::Multiply
            } else if self.match_operator("/") {
                BinaryOperator::Divide
            } else if self.match_operator("%") {
                BinaryOperator::Remainder
            } else {
                break;
            };
            let right = self.parse_unary()?;
            expr = binary(expr, operator, right)?;
        }

        Ok(expr)
    }

    /// Parse unary expressions
    fn parse_unary(&mut self) -> ParseResult<Parsed> {
        self.skip_whitespace();

        let operator = match self.current_char() {
            Some('!') => UnaryOperator::Not,
            Some('-') => UnaryOperator::Negate,
            _ => return self.parse_postfix(),
        };
        self.advance();

        self.enter()?;
        let operand = self.parse_unary();
        self.depth -= 1;
        let operand = operand?;

        Parsed::node(
            Expr::Unary {
                operator,
                operand: Box::new(operand.expr),
            },
            &[operand.height],
        )
    }

    /// Parse member access, indexing and calls following a primary
    fn parse_postfix(&mut self) -> ParseResult<Parsed> {
        let mut expr = self.parse_primary()?;

        loop {
            self.skip_whitespace();
            let next = self.peek_char();
            match self.current_char() {
                Some('?') if next == Some('.') => {
                    self.advance();
                    self.advance();
                    let property = self.parse_property_name()?;
                    expr = member(expr, property, true)?;
                }
                Some('.') => {
                    self.advance();
                    let property = self.parse_property_name()?;
                    expr = member(expr, property, false)?;
                }
                Some('[') => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.skip_whitespace();
                    self.expect_char(']')?;
                    let heights = [expr.height, index.height];
                    expr = Parsed::node(
                        Expr::Index {
                            base: Box::new(expr.expr),
                            index: Box::new(index.expr),
                        },
                        &heights,
                    )?;
                }
                Some('(') => {
                    let name = match &expr.expr {
                        Expr::Member { property, .. } => property.clone(),
                        Expr::Variable(variable) => variable.name().to_string(),
                        _ => "expression".to_string(),
                    };
                    return Err(ExpressionError::NotCallable { name });
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Parse primary expressions
    fn parse_primary(&mut self) -> ParseResult<Parsed> {
        self.skip_whitespace();

        match self.current_char() {
            Some('(') => {
                self.advance();
                let expr = self.parse_expression()?;
                self.skip_whitespace();
                self.expect_char(')')?;
                Ok(expr)
            }
            Some('[') => {
                self.advance();
                let (items, height) = self.parse_list(']')?;
                Parsed::node(Expr::Array(items), &[height])
            }
            Some('\'') | Some('"') => {
                let value = self.parse_quoted_string()?;
                Ok(Parsed::leaf(Expr::Literal(Literal::String(value))))
            }
            Some(ch) if ch.is_ascii_digit() => {
                let number = self.parse_number()?;
                Ok(Parsed::leaf(Expr::Literal(Literal::Number(number))))
            }
            Some(ch) if is_identifier_start(ch) => {
                let start = self.position;
                let ident = self.parse_identifier()?;
                let literal = match ident.as_str() {
                    "true" => Some(Literal::Boolean(true)),
                    "false" => Some(Literal::Boolean(false)),
                    "null" => Some(Literal::Null),
                    "undefined" => Some(Literal::Undefined),
                    _ => None,
                };
                match literal {
                    Some(literal) => Ok(Parsed::leaf(Expr::Literal(literal))),
                    None => self.parse_identifier_reference(ident, start),
                }
            }
            Some(ch) => Err(ExpressionError::syntax(
                "Unexpected character in expression",
                self.position,
                vec![
                    "(".to_string(),
                    "[".to_string(),
                    "'".to_string(),
                    "\"".to_string(),
                    "digit".to_string(),
                    "identifier".to_string(),
                ],
                ch.to_string(),
            )),
            None => Err(ExpressionError::parse(
                "Unexpected end of input",
                self.position,
                self.input,
            )),
        }
    }

    /// Resolve an identifier against the bounded scope
    fn parse_identifier_reference(&mut self, ident: String, start: usize) -> ParseResult<Parsed> {
        self.skip_whitespace();
        let is_call = self.current_char() == Some('(');

        if let Some(function) = Function::from_name(&ident) {
            if !is_call {
                return Err(ExpressionError::syntax(
                    format!("Function `{}` must be called", ident),
                    self.position,
                    vec!["(".to_string()],
                    self.found(),
                ));
            }
            self.advance();
            let (args, height) = self.parse_list(')')?;
            let (min, max) = function.arity();
            if args.len() < min || args.len() > max {
                return Err(ExpressionError::Arity {
                    function: function.name().to_string(),
                    expected: max,
                    got: args.len(),
                });
            }
            return Parsed::node(Expr::Call { function, args }, &[height]);
        }

        match ScopeVariable::from_name(&ident) {
            Some(variable) if is_call => Err(ExpressionError::NotCallable {
                name: variable.name().to_string(),
            }),
            Some(variable) => Ok(Parsed::leaf(Expr::Variable(variable))),
            None => Err(ExpressionError::UnknownIdentifier {
                name: ident,
                position: start,
            }),
        }
    }

    /// Parse comma separated expressions up to the closing character,
    /// returning them with the height of the tallest
    fn parse_list(&mut self, close: char) -> ParseResult<(Vec<Expr>, usize)> {
        let mut items = Vec::new();
        let mut height = 0;

        self.skip_whitespace();
        if self.current_char() == Some(close) {
            self.advance();
            return Ok((items, height));
        }

        loop {
            let item = self.parse_expression()?;
            height = height.max(item.height);
            items.push(item.expr);
            self.skip_whitespace();

            if self.current_char() == Some(',') {
                self.advance();
                self.skip_whitespace();
            } else {
                break;
            }
        }

        self.expect_char(close)?;
        Ok((items, height))
    }

    /// Parse a property name after `.`; keywords are allowed here
    fn parse_property_name(&mut self) -> ParseResult<String> {
        self.skip_whitespace();
        if self.current_char().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            let mut digits = String::new();
            while let Some(ch) = self.current_char().filter(|c| c.is_ascii_digit()) {
                digits.push(ch);
                self.advance();
            }
            return Ok(digits);
        }
        self.parse_identifier()
    }

    /// Parse an identifier
    fn parse_identifier(&mut self) -> ParseResult<String> {
        let mut identifier = String::new();

        if !self.current_char().map(is_identifier_start).unwrap_or(false) {
            return Err(ExpressionError::syntax(
                "Expected identifier",
                self.position,
                vec!["letter, _ or $".to_string()],
                self.found(),
            ));
        }

        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' || ch == '$' {
                identifier.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Ok(identifier)
    }

    /// Parse a quoted string
    fn parse_quoted_string(&mut self) -> ParseResult<String> {
        let quote_char = match self.advance() {
            Some(ch) => ch,
            None => {
                return Err(ExpressionError::parse(
                    "Expected string literal",
                    self.position,
                    self.input,
                ))
            }
        };

        let mut string = String::new();
        let mut escaped = false;

        while let Some(ch) = self.current_char() {
            if escaped {
                match ch {
                    'n' => string.push('\n'),
                    'r' => string.push('\r'),
                    't' => string.push('\t'),
                    '\\' => string.push('\\'),
                    '\'' => string.push('\''),
                    '"' => string.push('"'),
                    _ => {
                        string.push('\\');
                        string.push(ch);
                    }
                }
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote_char {
                self.advance(); // consume closing quote
                return Ok(string);
            } else {
                string.push(ch);
            }
            self.advance();
        }

        Err(ExpressionError::parse(
            "Unterminated string literal",
            self.position,
            self.input,
        ))
    }

    /// Parse a number
    fn parse_number(&mut self) -> ParseResult<f64> {
        let mut number_str = String::new();

        while let Some(ch) = self.current_char().filter(|c| c.is_ascii_digit()) {
            number_str.push(ch);
            self.advance();
        }

        // Decimal part
        if self.current_char() == Some('.')
            && self.peek_char().map(|c| c.is_ascii_digit()).unwrap_or(false)
        {
            number_str.push('.');
            self.advance();

            while let Some(ch) = self.current_char().filter(|c| c.is_ascii_digit()) {
                number_str.push(ch);
                self.advance();
            }
        }

        // Exponent part
        if let Some(ch) = self.current_char().filter(|c| *c == 'e' || *c == 'E') {
            number_str.push(ch);
            self.advance();

            if let Some(sign) = self.current_char().filter(|c| *c == '+' || *c == '-') {
                number_str.push(sign);
                self.advance();
            }

            while let Some(ch) = self.current_char().filter(|c| c.is_ascii_digit()) {
                number_str.push(ch);
                self.advance();
            }
        }

        number_str.parse().map_err(|_| {
            ExpressionError::parse(
                format!("Invalid number: {}", number_str),
                self.position,
                self.input,
            )
        })
    }

    /// Match and consume an operator, skipping leading whitespace
    fn match_operator(&mut self, op: &str) -> bool {
        self.skip_whitespace();
        let remaining: String = self.chars.clone().take(op.chars().count()).collect();
        if remaining != op {
            return false;
        }

        // `a | b`-style single characters are not operators of their doubled form
        let follow = self.chars.clone().nth(op.chars().count());
        let ambiguous = match op {
            "==" | "!=" => follow == Some('='),
            "<" | ">" => follow == Some('='),
            "+" | "-" | "*" | "/" | "%" => follow == Some('='),
            _ => false,
        };
        if ambiguous {
            return false;
        }

        for _ in 0..op.chars().count() {
            self.advance();
        }
        true
    }

    /// Skip whitespace characters
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Get current character without advancing
    fn current_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    /// Get next character without advancing
    fn peek_char(&mut self) -> Option<char> {
        let mut clone = self.chars.clone();
        clone.next();
        clone.peek().copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        self.position += ch.len_utf8();
        Some(ch)
    }

    fn found(&mut self) -> String {
        self.current_char()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "EOF".to_string())
    }

    /// Expect a specific character
    fn expect_char(&mut self, expected: char) -> ParseResult<()> {
        match self.current_char() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            Some(ch) => Err(ExpressionError::syntax(
                format!("Expected '{}'", expected),
                self.position,
                vec![expected.to_string()],
                ch.to_string(),
            )),
            None => Err(ExpressionError::parse(
                format!("Expected '{}' but reached end of input", expected),
                self.position,
                self.input,
            )),
        }
    }
}

fn binary(left: Parsed, operator: BinaryOperator, right: Parsed) -> ParseResult<Parsed> {
    let heights = [left.height, right.height];
    Parsed::node(
        Expr::Binary {
            left: Box::new(left.expr),
            operator,
            right: Box::new(right.expr),
        },
        &heights,
    )
}

fn member(base: Parsed, property: String, optional: bool) -> ParseResult<Parsed> {
    let height = base.height;
    Parsed::node(
        Expr::Member {
            base: Box::new(base.expr),
            property,
            optional,
        },
        &[height],
    )
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}
