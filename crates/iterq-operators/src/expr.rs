//! Simple predicate expressions over JSON elements.
//!
//! Supports expressions of the form `field OP literal` where
//! OP ∈ {==, !=, <, <=, >, >=} and `field` is a dotted path.

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

use iterq_core::{Error, Result};

use crate::callback::Predicate;
use crate::json::{field, json_cmp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn as_str(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

/// Parsed `field OP literal` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub path: String,
    pub op: CmpOp,
    pub literal: Value,
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.path, self.op.as_str(), self.literal)
    }
}

impl Expr {
    /// Parse a predicate like `age > 18` or `name == "Alice"`.
    ///
    /// The literal is read as JSON when it parses as JSON, otherwise as a
    /// bare string.
    pub fn parse(expr: &str) -> Result<Self> {
        // Two-character operators first so `<=` is not read as `<`.
        let ops = [
            ("==", CmpOp::Eq),
            ("!=", CmpOp::Ne),
            ("<=", CmpOp::Le),
            (">=", CmpOp::Ge),
            ("<", CmpOp::Lt),
            (">", CmpOp::Gt),
        ];

        for (token, op) in ops {
            if let Some(pos) = expr.find(token) {
                let path = expr[..pos].trim();
                let lit = expr[pos + token.len()..].trim();
                if path.is_empty() || lit.is_empty() {
                    break;
                }
                let literal =
                    serde_json::from_str(lit).unwrap_or_else(|_| Value::String(lit.to_string()));
                return Ok(Expr {
                    path: path.to_string(),
                    op,
                    literal,
                });
            }
        }

        Err(Error::invalid_argument(
            "expr",
            format!("unparseable predicate '{}'", expr),
        ))
    }

    /// Evaluate against one element. Missing fields and nulls never match.
    pub fn eval(&self, element: &Value) -> bool {
        let value = match field(element, &self.path) {
            None | Some(Value::Null) => return false,
            Some(v) => v,
        };

        if !same_kind(value, &self.literal) {
            return self.op == CmpOp::Ne;
        }

        let ord = json_cmp(value, &self.literal);
        match self.op {
            CmpOp::Eq => ord == Ordering::Equal && value_eq(value, &self.literal),
            CmpOp::Ne => !(ord == Ordering::Equal && value_eq(value, &self.literal)),
            CmpOp::Lt => ord == Ordering::Less,
            CmpOp::Le => ord != Ordering::Greater,
            CmpOp::Gt => ord == Ordering::Greater,
            CmpOp::Ge => ord != Ordering::Less,
        }
    }
}

fn same_kind(a: &Value, b: &Value) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

// json_cmp treats objects as equal; equality needs a structural check.
fn value_eq(a: &Value, b: &Value) -> bool {
    use iterq_core::equality::KeyEq;
    a.key_eq(b)
}

impl Predicate<Value> for Expr {
    fn test(&self, item: &Value, _index: usize) -> Result<bool> {
        Ok(self.eval(item))
    }
}
