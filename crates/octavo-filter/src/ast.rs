//! Abstract syntax tree for filter expressions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed filter: one or more `;`-separated expressions.
///
/// The grammar admits several statements so that the evaluator can reject
/// the surplus with a precise error instead of a generic parse failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub exprs: Vec<Expr>,
}

impl Program {
    /// The default selection: entries cited somewhere in the corpus.
    pub fn cited() -> Program {
        Program {
            exprs: vec![Expr::Ident("cited".to_string())],
        }
    }
}

/// A single expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Bool(bool),
    Num(f64),
    Str(String),
    /// Set literal; every element must evaluate to a string.
    Set(Vec<Expr>),
    Ident(String),
    Not(Box<Expr>),
    /// Flattened `and`/`or` chain. All operands are evaluated; there is
    /// no short-circuiting.
    Logical { op: LogicalOp, operands: Vec<Expr> },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// A comparison chain. Chains longer than one comparator parse but do
    /// not evaluate.
    Compare {
        left: Box<Expr>,
        comparisons: Vec<(CompareOp, Expr)>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    /// `|`: set union.
    Union,
    /// `&`: set intersection.
    Intersect,
    /// `%`: case-insensitive regular-expression search.
    Matches,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => write!(f, "and"),
            LogicalOp::Or => write!(f, "or"),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Union => write!(f, "|"),
            BinaryOp::Intersect => write!(f, "&"),
            BinaryOp::Matches => write!(f, "%"),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::In => "in",
            CompareOp::NotIn => "not in",
        };
        write!(f, "{symbol}")
    }
}
