use std::fmt;

use embsql_core::{Error, LogicalType, Name, Result, Value};

use crate::expr::{EvalContext, Expr};

#[derive(Debug, Clone)]
pub struct Column {
    name: Name,
    ty: LogicalType,
    is_nullable: bool,
    is_primary_key: bool,
    is_auto_increment: bool,
    default: Option<ColumnDefault>,
}

impl Column {
    /// A non-nullable column with no default.
    pub fn new(name: impl Into<Name>, ty: LogicalType) -> Self {
        Self {
            name: name.into(),
            ty,
            is_nullable: false,
            is_primary_key: false,
            is_auto_increment: false,
            default: None,
        }
    }

    #[inline]
    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }

    #[inline]
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    #[inline]
    pub fn auto_increment(mut self) -> Self {
        self.is_auto_increment = true;
        self
    }

    #[inline]
    pub fn with_default(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }

    #[inline]
    pub fn name(&self) -> &Name {
        &self.name
    }

    #[inline]
    pub fn logical_type(&self) -> LogicalType {
        self.ty
    }

    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.is_nullable
    }

    #[inline]
    pub fn is_primary_key(&self) -> bool {
        self.is_primary_key
    }

    #[inline]
    pub fn is_auto_increment(&self) -> bool {
        self.is_auto_increment
    }

    #[inline]
    pub fn default(&self) -> Option<&ColumnDefault> {
        self.default.as_ref()
    }
}

/// An expression producing the value of a column when an insert leaves it unset.
///
/// The expression is evaluated once per inserted row, so `now()` observes the insertion time
/// rather than the time the schema was defined.
#[derive(Debug, Clone)]
pub struct ColumnDefault {
    expr: Expr,
    ty: LogicalType,
}

impl ColumnDefault {
    /// Fails if `expr` cannot produce a value of type `ty`.
    pub fn new(expr: Expr, ty: LogicalType) -> Result<Self> {
        if let Some(value) = expr.as_literal() {
            return Self::literal(value.clone(), ty);
        }

        if expr.logical_type() != ty {
            return Err(Error::Configuration(format!(
                "default expression `{expr}` of type {} does not match column type {ty}",
                expr.logical_type()
            )));
        }

        Ok(Self { expr, ty })
    }

    /// Fails if `value` does not fit in `ty`.
    pub fn literal(value: impl Into<Value>, ty: LogicalType) -> Result<Self> {
        let value = value.into().coerce(ty).map_err(|err| {
            Error::Configuration(format!("invalid default for column of type {ty}: {err}"))
        })?;
        Ok(Self { expr: Expr::literal(value), ty })
    }

    /// `DEFAULT CURRENT_TIMESTAMP`
    pub fn current_timestamp() -> Self {
        Self { expr: Expr::now(), ty: LogicalType::Timestamp }
    }

    #[inline]
    pub fn logical_type(&self) -> LogicalType {
        self.ty
    }

    #[inline]
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Evaluate the default for a single row.
    pub fn resolve(&self, ctx: &EvalContext) -> Result<Value> {
        let value = self.expr.eval(ctx)?;
        Ok(value.coerce(self.ty)?)
    }
}

impl fmt::Display for ColumnDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.expr.fmt(f)
    }
}
