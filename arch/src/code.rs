use crate::error::Error;
use crate::op::Op;
use indexmap::IndexMap;
use std::fmt;

/// Symbolic operand resolved at link time.
///
/// `scope` names the owner (a function signature), `label` a position or a
/// constant inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pub scope: String,
    pub label: String,
}

impl Reference {
    pub fn new(scope: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            label: label.into(),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.scope, self.label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Constant(i32),
    Reference(Reference),
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Constant(value)
    }
}

impl From<Reference> for Value {
    fn from(reference: Reference) -> Self {
        Value::Reference(reference)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Constant(value) => write!(f, "{value}"),
            Value::Reference(reference) => write!(f, "{reference}"),
        }
    }
}

/// One instruction whose operands may still be symbolic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    pub op: Op,
    pub values: IndexMap<String, Value>,
}

impl Code {
    pub fn new(op: Op) -> Self {
        Self {
            op,
            values: IndexMap::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.values.values().filter_map(|v| match v {
            Value::Reference(reference) => Some(reference),
            Value::Constant(_) => None,
        })
    }

    /// Replace every reference by the value `lookup` gives for it.
    pub fn resolve<F>(&self, lookup: F) -> Result<IndexMap<String, i32>, Error>
    where
        F: Fn(&Reference) -> Option<i32>,
    {
        self.values
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    Value::Constant(value) => *value,
                    Value::Reference(reference) => lookup(reference)
                        .ok_or_else(|| Error::UndefinedReference(reference.clone()))?,
                };
                Ok((name.clone(), value))
            })
            .collect()
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.op)?;
        for (name, value) in &self.values {
            write!(f, " {name}={value}")?;
        }
        Ok(())
    }
}

/// Build a [`Code`] for an [`Op`] of the standard set.
///
/// ```ignore
/// code!(LdaAtFp, offset = -1)
/// ```
#[macro_export]
macro_rules! code {
    ($op:ident) => {
        $crate::code::Code::new($crate::op::Op::$op)
    };
    ($op:ident, $($name:ident = $value:expr),+ $(,)?) => {
        $crate::code::Code::new($crate::op::Op::$op)$(.with(stringify!($name), $value))+
    };
}
