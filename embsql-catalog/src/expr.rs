//! A small stack-based bytecode for column default expressions.

use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use embsql_core::{Error, LogicalType, Result, Value};
use itertools::Itertools;

// Using the exact type to avoid an allocation
pub type FunctionArgs<'a> = std::vec::Drain<'a, Value>;

/// State an expression may observe while it is evaluated.
/// One context is created per inserted row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalContext {
    now: NaiveDateTime,
}

impl EvalContext {
    /// A context for an insertion happening right now.
    #[inline]
    pub fn now() -> Self {
        Self::at(Utc::now().naive_utc())
    }

    #[inline]
    pub fn at(now: NaiveDateTime) -> Self {
        Self { now }
    }

    #[inline]
    pub fn timestamp(&self) -> NaiveDateTime {
        self.now
    }
}

pub trait ScalarFunction: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// The number of arguments this function takes.
    fn arity(&self) -> usize;

    fn return_type(&self) -> LogicalType;

    fn invoke(&self, ctx: &EvalContext, args: FunctionArgs<'_>) -> Result<Value>;
}

#[derive(Debug)]
struct Now;

impl ScalarFunction for Now {
    #[inline]
    fn name(&self) -> &'static str {
        "now"
    }

    #[inline]
    fn arity(&self) -> usize {
        0
    }

    #[inline]
    fn return_type(&self) -> LogicalType {
        LogicalType::Timestamp
    }

    #[inline]
    fn invoke(&self, ctx: &EvalContext, _args: FunctionArgs<'_>) -> Result<Value> {
        Ok(Value::Timestamp(ctx.timestamp()))
    }
}

/// Look up a builtin scalar function by name.
pub fn builtin(name: &str) -> Option<Arc<dyn ScalarFunction>> {
    match name.to_lowercase().as_str() {
        "now" | "current_timestamp" => Some(Arc::new(Now)),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub enum ExprOp {
    Push(Value),
    Call { function: Arc<dyn ScalarFunction> },
    Return,
}

#[derive(Debug, Clone)]
pub struct Expr {
    pretty: Box<str>,
    ty: LogicalType,
    ops: Box<[ExprOp]>,
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pretty)
    }
}

impl Expr {
    #[inline]
    pub fn null() -> Self {
        Self::literal(Value::Null)
    }

    #[inline]
    pub fn literal(value: impl Into<Value>) -> Self {
        let value = value.into();
        Self {
            pretty: format!("{value}").into(),
            ty: value.ty(),
            ops: Box::new([ExprOp::Push(value), ExprOp::Return]),
        }
    }

    /// `now()`
    pub fn now() -> Self {
        Self {
            pretty: "now()".into(),
            ty: LogicalType::Timestamp,
            ops: Box::new([ExprOp::Call { function: Arc::new(Now) }, ExprOp::Return]),
        }
    }

    pub fn call(
        function: Arc<dyn ScalarFunction>,
        args: impl IntoIterator<Item = Value>,
    ) -> Result<Self> {
        let args = args.into_iter().collect::<Vec<_>>();
        if args.len() != function.arity() {
            return Err(Error::Configuration(format!(
                "function `{}` takes {} argument(s) but {} were supplied",
                function.name(),
                function.arity(),
                args.len()
            )));
        }

        let pretty = format!("{}({})", function.name(), args.iter().format(", "));
        let ty = function.return_type();
        let mut ops = args.into_iter().map(ExprOp::Push).collect::<Vec<_>>();
        ops.push(ExprOp::Call { function });
        ops.push(ExprOp::Return);
        Ok(Self { pretty: pretty.into(), ty, ops: ops.into_boxed_slice() })
    }

    /// The type of the value this expression produces.
    #[inline]
    pub fn logical_type(&self) -> LogicalType {
        self.ty
    }

    #[inline]
    pub fn as_literal(&self) -> Option<&Value> {
        match self.ops.as_ref() {
            [ExprOp::Push(value), ExprOp::Return] => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn ops(&self) -> &[ExprOp] {
        self.ops.as_ref()
    }

    pub fn eval(&self, ctx: &EvalContext) -> Result<Value> {
        let mut stack = Vec::with_capacity(self.ops.len());
        for op in &self.ops[..] {
            match op {
                ExprOp::Push(value) => stack.push(value.clone()),
                ExprOp::Call { function } => {
                    let base = stack.len().checked_sub(function.arity()).ok_or_else(|| {
                        Error::Type(format!("not enough arguments on the stack for `{}`", self))
                    })?;
                    let value = function.invoke(ctx, stack.drain(base..))?;
                    stack.push(value);
                }
                ExprOp::Return => {
                    return stack.pop().ok_or_else(|| {
                        Error::Type(format!("expression `{self}` returned without a value"))
                    });
                }
            }
        }

        Err(Error::Type(format!("expression `{self}` did not return")))
    }
}
