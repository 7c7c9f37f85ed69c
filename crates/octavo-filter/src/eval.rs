//! Tree-walking evaluation of filter programs against bibliography entries.

use crate::ast::{BinaryOp, CompareOp, Expr, LogicalOp, Program};
use crate::error::{Error, Result};
use octavo_bibdata::BibEntry;
use regex::RegexBuilder;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Everything an expression can see while evaluating.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// The candidate entry.
    pub entry: &'a BibEntry,
    /// The document owning the listing under evaluation.
    pub document: &'a str,
    /// Documents whose citations reference this entry.
    pub cited_in: &'a BTreeSet<String>,
}

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Num(f64),
    Str(String),
    Set(BTreeSet<String>),
}

impl Value {
    /// Coerce to a truth value: the boolean itself, non-zero, or non-empty.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Num(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Set(s) => !s.is_empty(),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::Set(_) => "set",
        }
    }
}

/// Evaluate a program against one entry.
///
/// The program must hold exactly one expression. Callers coerce the result
/// with [`Value::truthy`].
pub fn evaluate(program: &Program, context: &EvalContext<'_>) -> Result<Value> {
    if program.exprs.len() != 1 {
        return Err(Error::MultipleStatements {
            count: program.exprs.len(),
        });
    }
    eval_expr(&program.exprs[0], context)
}

fn eval_expr(expr: &Expr, ctx: &EvalContext<'_>) -> Result<Value> {
    match expr {
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Num(n) => Ok(Value::Num(*n)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Set(elements) => {
            let mut set = BTreeSet::new();
            for element in elements {
                match eval_expr(element, ctx)? {
                    Value::Str(s) => {
                        set.insert(s);
                    }
                    other => {
                        return Err(Error::SetElement {
                            found: other.type_name(),
                        });
                    }
                }
            }
            Ok(Value::Set(set))
        }
        Expr::Ident(name) => Ok(lookup(name, ctx)),
        Expr::Not(inner) => Ok(Value::Bool(!eval_expr(inner, ctx)?.truthy())),
        Expr::Logical { op, operands } => {
            // Every operand is evaluated before combining; an error in a
            // later operand surfaces even when the earlier ones already
            // decide the outcome.
            let mut values = Vec::with_capacity(operands.len());
            for operand in operands {
                values.push(eval_expr(operand, ctx)?.truthy());
            }
            let result = match op {
                LogicalOp::And => values.iter().all(|v| *v),
                LogicalOp::Or => values.iter().any(|v| *v),
            };
            Ok(Value::Bool(result))
        }
        Expr::Binary { left, op, right } => {
            let lhs = eval_expr(left, ctx)?;
            let rhs = eval_expr(right, ctx)?;
            eval_binary(*op, lhs, rhs)
        }
        Expr::Compare { left, comparisons } => {
            if comparisons.len() != 1 {
                return Err(Error::ChainedComparison {
                    count: comparisons.len(),
                });
            }
            let (op, right) = &comparisons[0];
            let lhs = eval_expr(left, ctx)?;
            let rhs = eval_expr(right, ctx)?;
            compare(*op, &lhs, &rhs)
        }
    }
}

/// Identifier resolution.
///
/// `type` and `key` fold to lowercase; `author` and `editor` join person
/// names with `" and "`; any other name reads the entry field of that name,
/// defaulting to the empty string.
fn lookup(name: &str, ctx: &EvalContext<'_>) -> Value {
    match name {
        "type" => Value::Str(ctx.entry.entry_type.to_lowercase()),
        "key" => Value::Str(ctx.entry.key.to_lowercase()),
        "cited" => Value::Bool(!ctx.cited_in.is_empty()),
        "docname" => Value::Str(ctx.document.to_string()),
        "docnames" => Value::Set(ctx.cited_in.clone()),
        "author" | "editor" => Value::Str(ctx.entry.joined_names(name).unwrap_or_default()),
        field => Value::Str(ctx.entry.field(field).unwrap_or_default().to_string()),
    }
}

fn eval_binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value> {
    match op {
        BinaryOp::Matches => match (lhs, rhs) {
            (Value::Str(haystack), Value::Str(pattern)) => {
                let regex = RegexBuilder::new(&pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|err| Error::InvalidRegex {
                        pattern: pattern.clone(),
                        message: err.to_string(),
                    })?;
                Ok(Value::Bool(regex.is_match(&haystack)))
            }
            (lhs, rhs) => Err(mismatch_values(op.to_string(), &lhs, &rhs)),
        },
        BinaryOp::Union => match (lhs, rhs) {
            (Value::Set(a), Value::Set(b)) => Ok(Value::Set(a.union(&b).cloned().collect())),
            (lhs, rhs) => Err(mismatch_values(op.to_string(), &lhs, &rhs)),
        },
        BinaryOp::Intersect => match (lhs, rhs) {
            (Value::Set(a), Value::Set(b)) => {
                Ok(Value::Set(a.intersection(&b).cloned().collect()))
            }
            (lhs, rhs) => Err(mismatch_values(op.to_string(), &lhs, &rhs)),
        },
    }
}

fn compare(op: CompareOp, lhs: &Value, rhs: &Value) -> Result<Value> {
    let result = match op {
        CompareOp::Eq => values_equal(lhs, rhs),
        CompareOp::Ne => !values_equal(lhs, rhs),
        CompareOp::In => membership(lhs, rhs)?,
        CompareOp::NotIn => !membership(lhs, rhs)?,
        CompareOp::Lt => match (lhs, rhs) {
            (Value::Set(a), Value::Set(b)) => a.is_subset(b) && a != b,
            _ => natural_ordering(op, lhs, rhs)? == Ordering::Less,
        },
        CompareOp::Le => match (lhs, rhs) {
            (Value::Set(a), Value::Set(b)) => a.is_subset(b),
            _ => natural_ordering(op, lhs, rhs)? != Ordering::Greater,
        },
        CompareOp::Gt => match (lhs, rhs) {
            (Value::Set(a), Value::Set(b)) => b.is_subset(a) && a != b,
            _ => natural_ordering(op, lhs, rhs)? == Ordering::Greater,
        },
        CompareOp::Ge => match (lhs, rhs) {
            (Value::Set(a), Value::Set(b)) => b.is_subset(a),
            _ => natural_ordering(op, lhs, rhs)? != Ordering::Less,
        },
    };
    Ok(Value::Bool(result))
}

/// Equality across different value types is `false`, never an error.
fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Num(a), Value::Num(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Set(a), Value::Set(b)) => a == b,
        _ => false,
    }
}

/// `needle in haystack`: substring search on strings, element lookup on
/// sets. A non-string needle is never an element of a set.
fn membership(needle: &Value, haystack: &Value) -> Result<bool> {
    match haystack {
        Value::Str(s) => match needle {
            Value::Str(n) => Ok(s.contains(n.as_str())),
            other => Err(Error::TypeMismatch {
                operation: "in".to_string(),
                left: other.type_name(),
                right: "string",
            }),
        },
        Value::Set(set) => match needle {
            Value::Str(n) => Ok(set.contains(n)),
            _ => Ok(false),
        },
        other => Err(Error::TypeMismatch {
            operation: "in".to_string(),
            left: needle.type_name(),
            right: other.type_name(),
        }),
    }
}

fn natural_ordering(op: CompareOp, lhs: &Value, rhs: &Value) -> Result<Ordering> {
    match (lhs, rhs) {
        (Value::Num(a), Value::Num(b)) => a
            .partial_cmp(b)
            .ok_or_else(|| mismatch_values(op.to_string(), lhs, rhs)),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
        _ => Err(mismatch_values(op.to_string(), lhs, rhs)),
    }
}

fn mismatch_values(operation: String, lhs: &Value, rhs: &Value) -> Error {
    Error::TypeMismatch {
        operation,
        left: lhs.type_name(),
        right: rhs.type_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_filter;

    fn entry() -> BibEntry {
        BibEntry::new("Article", "Smith2009")
            .with_field("year", "2009")
            .with_field("title", "A Study of Things")
            .with_person("author", "John Smith")
            .with_person("author", "Jane Doe")
    }

    fn run(source: &str, entry: &BibEntry, document: &str, cited_in: &[&str]) -> Result<Value> {
        let program = parse_filter(source)?;
        let cited: BTreeSet<String> = cited_in.iter().map(|s| s.to_string()).collect();
        evaluate(
            &program,
            &EvalContext {
                entry,
                document,
                cited_in: &cited,
            },
        )
    }

    fn selects(source: &str, entry: &BibEntry, document: &str, cited_in: &[&str]) -> bool {
        run(source, entry, document, cited_in).unwrap().truthy()
    }

    #[test]
    fn test_type_and_key_fold_to_lowercase() {
        let entry = entry();
        assert!(selects("type == \"article\"", &entry, "intro", &[]));
        assert!(selects("key == \"smith2009\"", &entry, "intro", &[]));
        assert!(!selects("key == \"Smith2009\"", &entry, "intro", &[]));
    }

    #[test]
    fn test_cited_and_docnames() {
        let entry = entry();
        assert!(!selects("cited", &entry, "intro", &[]));
        assert!(selects("cited", &entry, "intro", &["ch1"]));
        assert!(selects("docname == 'intro'", &entry, "intro", &[]));
        assert!(selects("'ch1' in docnames", &entry, "intro", &["ch1", "ch2"]));
        assert!(selects(
            "docnames & {'ch1'}",
            &entry,
            "intro",
            &["ch1", "ch2"]
        ));
        assert!(!selects("docnames & {'ch9'}", &entry, "intro", &["ch1"]));
    }

    #[test]
    fn test_author_joins_names() {
        let entry = entry();
        assert!(selects(
            "author == 'John Smith and Jane Doe'",
            &entry,
            "intro",
            &[]
        ));
    }

    #[test]
    fn test_missing_field_is_empty_string() {
        let entry = entry();
        assert!(selects("note == ''", &entry, "intro", &[]));
        assert!(!selects("note", &entry, "intro", &[]));
        assert!(selects("year", &entry, "intro", &[]));
    }

    #[test]
    fn test_matches_is_case_insensitive_search() {
        let entry = entry();
        assert!(selects("author % 'smith'", &entry, "intro", &[]));
        assert!(selects("title % '^a study'", &entry, "intro", &[]));
        assert!(!selects("title % '^study'", &entry, "intro", &[]));
    }

    #[test]
    fn test_matches_requires_strings() {
        let entry = entry();
        let err = run("1 % 'x'", &entry, "intro", &[]).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
        let err = run("title % 2", &entry, "intro", &[]).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_invalid_regex_reported() {
        let entry = entry();
        let err = run("title % '('", &entry, "intro", &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidRegex { .. }));
    }

    #[test]
    fn test_logical_operators_do_not_short_circuit() {
        let entry = entry();
        let err = run("true or (1 % 2)", &entry, "intro", &[]).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
        let err = run("false and (1 % 2)", &entry, "intro", &[]).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_cross_type_equality_is_false() {
        let entry = entry();
        // `year` reads as a string, so comparing against a number is not
        // an error for == and !=.
        assert!(!selects("year == 2009", &entry, "intro", &[]));
        assert!(selects("year != 2009", &entry, "intro", &[]));
        assert!(selects("year == '2009'", &entry, "intro", &[]));
    }

    #[test]
    fn test_cross_type_ordering_is_an_error() {
        let entry = entry();
        let err = run("year < 2010", &entry, "intro", &[]).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_chained_comparison_rejected() {
        let entry = entry();
        let err = run("1 < 2 < 3", &entry, "intro", &[]).unwrap_err();
        assert_eq!(err, Error::ChainedComparison { count: 2 });
    }

    #[test]
    fn test_multiple_statements_rejected() {
        let entry = entry();
        let err = run("cited; cited", &entry, "intro", &[]).unwrap_err();
        assert_eq!(err, Error::MultipleStatements { count: 2 });
    }

    #[test]
    fn test_membership() {
        let entry = entry();
        assert!(selects("'smith' in key", &entry, "intro", &[]));
        assert!(!selects("'Smith' in key", &entry, "intro", &[]));
        assert!(selects("'xyz' not in key", &entry, "intro", &[]));
        assert!(selects("key in {'smith2009', 'other'}", &entry, "intro", &[]));
        assert!(!selects("2009 in {'2009'}", &entry, "intro", &[]));
        let err = run("1 in 'abc'", &entry, "intro", &[]).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_set_comparison_is_subset() {
        let entry = entry();
        assert!(selects("{'a'} <= {'a', 'b'}", &entry, "intro", &[]));
        assert!(selects("{'a'} < {'a', 'b'}", &entry, "intro", &[]));
        assert!(!selects("{'a'} < {'a'}", &entry, "intro", &[]));
        assert!(selects("{'a', 'b'} >= {'b'}", &entry, "intro", &[]));
        assert!(!selects("{'a'} <= {'b'}", &entry, "intro", &[]));
    }

    #[test]
    fn test_set_elements_must_be_strings() {
        let entry = entry();
        let err = run("{1} <= {'a'}", &entry, "intro", &[]).unwrap_err();
        assert_eq!(err, Error::SetElement { found: "number" });
    }

    #[test]
    fn test_set_union_and_intersection() {
        let entry = entry();
        assert!(selects(
            "{'a'} | {'b'} == {'a', 'b'}",
            &entry,
            "intro",
            &[]
        ));
        assert!(selects(
            "{'a', 'b'} & {'b', 'c'} == {'b'}",
            &entry,
            "intro",
            &[]
        ));
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let entry = entry();
        let program = parse_filter("type == 'article' and author % 'smith'").unwrap();
        let cited = BTreeSet::new();
        let ctx = EvalContext {
            entry: &entry,
            document: "intro",
            cited_in: &cited,
        };
        let first = evaluate(&program, &ctx).unwrap();
        let second = evaluate(&program, &ctx).unwrap();
        assert_eq!(first, second);
    }
}
