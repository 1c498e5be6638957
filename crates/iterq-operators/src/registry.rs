//! Name → constructor table over type-erased JSON sequences.
//!
//! Constructors validate their arguments when called and return a lazy
//! sequence; nothing is pulled until the caller consumes the result. The
//! registry is populated explicitly: [`Registry::with_builtins`] first, then
//! [`Registry::register`] calls in program order, a later registration
//! replacing an earlier one of the same name.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map as JsonMap, Value};

use iterq_core::compare::Direction;
use iterq_core::config::QueryConfig;
use iterq_core::equality::KeyEquality;
use iterq_core::{Error, Result};

use crate::expr::Expr;
use crate::ext::SequenceExt;
use crate::json::{field, json_cmp};
use crate::sort::{Ordered, SortLevel};
use crate::source::empty;
use crate::traits::BoxedSequence;

pub type JsonSeq = BoxedSequence<Value>;

/// Arguments handed to an operator constructor.
#[derive(Debug, Clone, Copy)]
pub struct StepArgs<'a> {
    pub args: &'a Value,
    pub config: &'a QueryConfig,
}

impl<'a> StepArgs<'a> {
    pub fn new(args: &'a Value, config: &'a QueryConfig) -> Self {
        Self { args, config }
    }

    pub fn get(&self, name: &str) -> Option<&'a Value> {
        match self.args {
            Value::Object(map) => map.get(name).filter(|v| !v.is_null()),
            _ => None,
        }
    }

    pub fn str(&self, name: &str) -> Result<&'a str> {
        match self.get(name) {
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(Error::invalid_argument(name, "String expected")),
            None => Err(Error::invalid_argument(name, "Missing argument")),
        }
    }

    pub fn opt_str(&self, name: &str) -> Result<Option<&'a str>> {
        match self.get(name) {
            None => Ok(None),
            Some(_) => self.str(name).map(Some),
        }
    }

    /// A count: non-number is TypeKind; negative or non-finite is RangeKind.
    /// Fractions truncate.
    pub fn count(&self, name: &str) -> Result<usize> {
        match self.get(name) {
            Some(value) => parse_count(name, value),
            None => Err(Error::invalid_argument(name, "Missing argument")),
        }
    }

    pub fn opt_count(&self, name: &str) -> Result<Option<usize>> {
        self.get(name).map(|v| parse_count(name, v)).transpose()
    }
}

fn parse_count(name: &str, value: &Value) -> Result<usize> {
    if let Some(n) = value.as_u64() {
        return usize::try_from(n).map_err(|_| Error::out_of_range(name, "Count too large"));
    }
    let Some(f) = value.as_f64() else {
        return Err(Error::invalid_argument(name, "Number expected"));
    };
    if !f.is_finite() || f < 0.0 {
        return Err(Error::out_of_range(name, "Non-negative finite number expected"));
    }
    Ok(f.trunc() as usize)
}

pub type OperatorFn = Arc<dyn Fn(JsonSeq, StepArgs<'_>) -> Result<JsonSeq> + Send + Sync>;

#[derive(Clone, Default)]
pub struct Registry {
    ops: BTreeMap<String, OperatorFn>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("ops", &self.ops.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("filter", filter_op);
        registry.register("select", select_op);
        registry.register("take", |s: JsonSeq, a: StepArgs<'_>| {
            Ok(s.take(a.count("count")?).boxed())
        });
        registry.register("skip", |s: JsonSeq, a: StepArgs<'_>| {
            Ok(s.skip(a.count("count")?).boxed())
        });
        registry.register("take_while", |s: JsonSeq, a: StepArgs<'_>| {
            let expr = Expr::parse(a.str("expr")?)?;
            Ok(s.take_while(move |v| expr.eval(v)).boxed())
        });
        registry.register("skip_while", |s: JsonSeq, a: StepArgs<'_>| {
            let expr = Expr::parse(a.str("expr")?)?;
            Ok(s.skip_while(move |v| expr.eval(v)).boxed())
        });
        registry.register("distinct", distinct_op);
        registry.register("order_by", order_by_op);
        registry.register("group_by", group_by_op);
        registry.register("page_by", page_by_op);
        registry.register("reverse", |s: JsonSeq, _: StepArgs<'_>| Ok(s.reverse().boxed()));
        registry.register("default_if_empty", |s: JsonSeq, a: StepArgs<'_>| {
            let value = a.get("value").cloned().unwrap_or(Value::Null);
            Ok(s.default_if_empty(value).boxed())
        });
        registry.register("flatten", flatten_op);
        registry
    }

    /// Add or replace `name`. Returns true when an earlier entry was replaced.
    pub fn register<F>(&mut self, name: impl Into<String>, op: F) -> bool
    where
        F: Fn(JsonSeq, StepArgs<'_>) -> Result<JsonSeq> + Send + Sync + 'static,
    {
        let name = name.into();
        let replaced = self.ops.insert(name.clone(), Arc::new(op)).is_some();
        crate::metrics::emit_registered(&name, replaced);
        replaced
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ops.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Result<&OperatorFn> {
        self.ops
            .get(name)
            .ok_or_else(|| Error::invalid_argument(name, "Unknown operator"))
    }

    /// Wrap `source` in operator `name`. Argument errors surface here.
    pub fn apply(&self, name: &str, source: JsonSeq, args: StepArgs<'_>) -> Result<JsonSeq> {
        let op = self.get(name)?;
        op(source, args)
    }

    /// Run the constructor against an empty source to validate arguments
    /// without touching real input.
    pub fn check(&self, name: &str, args: StepArgs<'_>) -> Result<()> {
        self.apply(name, empty::<Value>().boxed(), args).map(|_| ())
    }
}

fn lookup_path(value: &Value, path: &str) -> Value {
    field(value, path).cloned().unwrap_or(Value::Null)
}

fn filter_op(source: JsonSeq, args: StepArgs<'_>) -> Result<JsonSeq> {
    let expr = Expr::parse(args.str("expr")?)?;
    Ok(crate::filter::Filter::new(source, expr).boxed())
}

fn select_op(source: JsonSeq, args: StepArgs<'_>) -> Result<JsonSeq> {
    let fields: Vec<String> = match args.get("fields") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_owned)
                    .ok_or_else(|| Error::invalid_argument("fields", "String list expected"))
            })
            .collect::<Result<_>>()?,
        Some(Value::String(s)) => s.split(',').map(|f| f.trim().to_owned()).collect(),
        _ => return Err(Error::invalid_argument("fields", "String list expected")),
    };
    Ok(source
        .map(move |v| {
            let mut out = JsonMap::new();
            for path in &fields {
                out.insert(path.clone(), lookup_path(&v, path));
            }
            Value::Object(out)
        })
        .boxed())
}

fn distinct_op(source: JsonSeq, args: StepArgs<'_>) -> Result<JsonSeq> {
    match args.opt_str("key")? {
        Some(key) => {
            let key = key.to_owned();
            Ok(source.distinct_by(move |v| lookup_path(v, &key)).boxed())
        }
        None => Ok(source.distinct_with(KeyEquality).boxed()),
    }
}

fn order_by_op(source: JsonSeq, args: StepArgs<'_>) -> Result<JsonSeq> {
    let keys = match args.get("keys") {
        Some(Value::Array(items)) => items.clone(),
        Some(single @ (Value::String(_) | Value::Object(_))) => vec![single.clone()],
        _ => return Err(Error::invalid_argument("keys", "Sort key list expected")),
    };
    let mut levels = keys.iter().map(sort_level);
    let first = levels
        .next()
        .ok_or_else(|| Error::invalid_argument("keys", "At least one sort key expected"))??;
    let mut ordered = Ordered::new(source, first);
    for level in levels {
        ordered = ordered.then_by_level(level?);
    }
    Ok(ordered.boxed())
}

fn sort_level(spec: &Value) -> Result<SortLevel<Value>> {
    let (path, descending) = match spec {
        Value::String(path) => (path.clone(), false),
        Value::Object(map) => {
            let path = match map.get("key") {
                Some(Value::String(path)) => path.clone(),
                _ => return Err(Error::invalid_argument("keys.key", "String expected")),
            };
            let descending = match map.get("descending") {
                None | Some(Value::Null) => false,
                Some(Value::Bool(b)) => *b,
                Some(_) => {
                    return Err(Error::invalid_argument("keys.descending", "Boolean expected"))
                }
            };
            (path, descending)
        }
        _ => return Err(Error::invalid_argument("keys", "Sort key expected")),
    };
    let direction = if descending {
        Direction::Descending
    } else {
        Direction::Ascending
    };
    Ok(SortLevel::by_key(
        move |v: &Value| lookup_path(v, &path),
        json_cmp,
        direction,
    ))
}

fn group_by_op(source: JsonSeq, args: StepArgs<'_>) -> Result<JsonSeq> {
    let key = args.str("key")?.to_owned();
    Ok(source
        .group_by(move |v| lookup_path(v, &key))
        .map(|g| {
            serde_json::json!({
                "key": g.key().clone(),
                "items": g.elements().to_vec(),
            })
        })
        .boxed())
}

fn page_by_op(source: JsonSeq, args: StepArgs<'_>) -> Result<JsonSeq> {
    let size = args
        .opt_count("size")?
        .unwrap_or(args.config.default_page_size);
    Ok(source
        .page_by(size)?
        .map(|p| {
            serde_json::json!({
                "page": p.page(),
                "offset": p.offset(),
                "items": p.elements().to_vec(),
            })
        })
        .boxed())
}

/// Array fields expand to their items, null or missing fields to nothing,
/// anything else to itself.
fn flatten_op(source: JsonSeq, args: StepArgs<'_>) -> Result<JsonSeq> {
    let path = args.opt_str("field")?.unwrap_or(".").to_owned();
    Ok(source
        .flat_map(move |v| match field(&v, &path) {
            Some(Value::Array(items)) => items.clone(),
            None | Some(Value::Null) => Vec::new(),
            Some(other) => vec![other.clone()],
        })
        .boxed())
}
