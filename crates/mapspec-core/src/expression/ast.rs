//! Abstract syntax tree for compute expressions
//!
//! Every identifier is resolved against the bounded scope while parsing, so an
//! `Expr` can only ever reference the input document and registered functions.
//!
//! Copyright (c) 2025 Mapspec Team
//! Licensed under the Apache-2.0 license

use crate::mapping::converter::BuiltinConverter;
use std::fmt;

/// Parsed compute expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    Literal(Literal),
    /// Scope variable (`src`, `borrower`, `loan`, `property`)
    Variable(ScopeVariable),
    /// Array literal
    Array(Vec<Expr>),
    /// Property access (`base.property`, `base?.property`)
    Member {
        base: Box<Expr>,
        property: String,
        optional: bool,
    },
    /// Computed access (`base[index]`)
    Index { base: Box<Expr>, index: Box<Expr> },
    /// Call of a registered function
    Call { function: Function, args: Vec<Expr> },
    /// Unary operation
    Unary {
        operator: UnaryOperator,
        operand: Box<Expr>,
    },
    /// Binary operation
    Binary {
        left: Box<Expr>,
        operator: BinaryOperator,
        right: Box<Expr>,
    },
    /// Conditional (`test ? consequent : alternate`)
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

/// Variables available to every expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeVariable {
    /// The whole input document
    Src,
    /// `src.borrower`, or an empty object
    Borrower,
    /// `src.loan`, or an empty object
    Loan,
    /// `src.property`, or an empty object
    Property,
}

impl ScopeVariable {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "src" => Some(Self::Src),
            "borrower" => Some(Self::Borrower),
            "loan" => Some(Self::Loan),
            "property" => Some(Self::Property),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Src => "src",
            Self::Borrower => "borrower",
            Self::Loan => "loan",
            Self::Property => "property",
        }
    }
}

/// Functions callable from expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    /// `get(path)`: alias-aware path lookup against the input document
    Get,
    /// A built-in converter called directly
    Converter(BuiltinConverter),
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "get" {
            return Some(Self::Get);
        }
        BuiltinConverter::from_name(name).map(Self::Converter)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Converter(converter) => converter.name(),
        }
    }

    /// Accepted argument counts (inclusive)
    pub fn arity(&self) -> (usize, usize) {
        match self {
            Self::Get => (1, 1),
            Self::Converter(BuiltinConverter::Now) => (0, 0),
            Self::Converter(_) => (0, 1),
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And,
    Or,
    Nullish,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Negate,
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Remainder => "%",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::StrictEqual => "===",
            Self::StrictNotEqual => "!==",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::And => "&&",
            Self::Or => "||",
            Self::Nullish => "??",
        };
        write!(f, "{}", symbol)
    }
}

impl Expr {
    /// Nesting depth of the tree, used by tests and diagnostics
    pub fn depth(&self) -> usize {
        match self {
            Expr::Literal(_) | Expr::Variable(_) => 1,
            Expr::Array(items) => 1 + items.iter().map(Expr::depth).max().unwrap_or(0),
            Expr::Member { base, .. } => 1 + base.depth(),
            Expr::Index { base, index } => 1 + base.depth().max(index.depth()),
            Expr::Call { args, .. } => 1 + args.iter().map(Expr::depth).max().unwrap_or(0),
            Expr::Unary { operand, .. } => 1 + operand.depth(),
            Expr::Binary { left, right, .. } => 1 + left.depth().max(right.depth()),
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => 1 + test.depth().max(consequent.depth()).max(alternate.depth()),
        }
    }
}
